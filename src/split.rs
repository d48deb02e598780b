// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Division of a movement total among participants.
//!
//! Percentages are fractions of one (`0.5` is half). Allocation stores percentages, and exact
//! amounts verbatim when the split was entered by amount; currency shares are derived at
//! settlement time by [`settle`].

use crate::error::{LedgerError, Result};
use crate::models::{Allocation, ParticipantRef, Weights};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;

/// Accepted drift of a percentage sum: 0.01 percentage points.
pub fn percentage_tolerance() -> Decimal {
    Decimal::new(1, 4)
}

pub fn round_currency(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn allocate(
    total: Decimal,
    participants: &[ParticipantRef],
    weights: &Weights,
) -> Result<Vec<Allocation>> {
    if total <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(total));
    }
    if participants.is_empty() {
        return Err(LedgerError::validation(
            "participants",
            "at least one participant is required",
        ));
    }
    let mut seen = HashSet::new();
    for p in participants {
        if !seen.insert(*p) {
            return Err(LedgerError::validation(
                "participants",
                format!("{} is listed more than once", p),
            ));
        }
    }

    match weights {
        Weights::Equitable => {
            let share = Decimal::ONE / Decimal::from(participants.len());
            Ok(participants
                .iter()
                .map(|p| Allocation {
                    participant: *p,
                    percentage: share,
                    amount: None,
                })
                .collect())
        }
        Weights::Percentages(pcts) => {
            check_arity(participants, pcts)?;
            for (i, pct) in pcts.iter().enumerate() {
                if *pct < Decimal::ZERO || *pct > Decimal::ONE {
                    return Err(LedgerError::validation(
                        format!("participants[{}].percentage", i),
                        format!("{} is outside 0..=1", pct),
                    ));
                }
            }
            let sum: Decimal = pcts.iter().sum();
            if (sum - Decimal::ONE).abs() > percentage_tolerance() {
                return Err(LedgerError::PercentageSumInvalid { actual: sum });
            }
            Ok(participants
                .iter()
                .zip(pcts)
                .map(|(p, pct)| Allocation {
                    participant: *p,
                    percentage: *pct,
                    amount: None,
                })
                .collect())
        }
        Weights::Amounts(amounts) => {
            check_arity(participants, amounts)?;
            for (i, amount) in amounts.iter().enumerate() {
                if *amount < Decimal::ZERO {
                    return Err(LedgerError::validation(
                        format!("participants[{}].amount", i),
                        format!("{} is negative", amount),
                    ));
                }
                if amount.normalize().scale() > 2 {
                    return Err(LedgerError::validation(
                        format!("participants[{}].amount", i),
                        format!("{} has more than two decimals", amount),
                    ));
                }
            }
            let sum: Decimal = amounts.iter().sum();
            if sum != total {
                return Err(LedgerError::AmountSumInvalid {
                    expected: total,
                    actual: sum,
                });
            }
            Ok(participants
                .iter()
                .zip(amounts)
                .map(|(p, amount)| Allocation {
                    participant: *p,
                    percentage: *amount / total,
                    amount: Some(*amount),
                })
                .collect())
        }
    }
}

fn check_arity(participants: &[ParticipantRef], weights: &[Decimal]) -> Result<()> {
    if participants.len() != weights.len() {
        return Err(LedgerError::validation(
            "participants",
            format!(
                "{} participants but {} weights",
                participants.len(),
                weights.len()
            ),
        ));
    }
    Ok(())
}

/// Currency share of every allocation, in input order.
///
/// Stored exact amounts win over percentages. Percentage shares are rounded to cents and the last
/// percentage-based participant takes whatever remains, so the shares add up to `total` whenever
/// the percentages cover all of it.
pub fn settle(total: Decimal, allocations: &[Allocation]) -> Vec<(ParticipantRef, Decimal)> {
    let last_pct = allocations.iter().rposition(|a| a.amount.is_none());
    let covered: Decimal = allocations.iter().map(|a| a.percentage).sum();
    let absorbs = (covered - Decimal::ONE).abs() <= percentage_tolerance();

    let mut out = Vec::with_capacity(allocations.len());
    let mut assigned = Decimal::ZERO;
    for (i, a) in allocations.iter().enumerate() {
        let share = match a.amount {
            Some(exact) => exact,
            None if absorbs && Some(i) == last_pct => continue,
            None => round_currency(total * a.percentage),
        };
        assigned += share;
        out.push((a.participant, share));
    }
    if let Some(i) = last_pct.filter(|_| absorbs) {
        out.insert(i, (allocations[i].participant, total - assigned));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    const M1: ParticipantRef = ParticipantRef::Member(1);
    const M2: ParticipantRef = ParticipantRef::Member(2);
    const C1: ParticipantRef = ParticipantRef::Contact(1);

    #[test]
    fn fifty_fifty_between_member_and_contact() {
        let allocs = allocate(
            dec("100000"),
            &[M1, C1],
            &Weights::Percentages(vec![dec("0.5"), dec("0.5")]),
        )
        .unwrap();
        assert_eq!(allocs[0].percentage, dec("0.5"));
        assert_eq!(allocs[1].percentage, dec("0.5"));
        let settled = settle(dec("100000"), &allocs);
        assert_eq!(settled, vec![(M1, dec("50000")), (C1, dec("50000"))]);
    }

    #[test]
    fn exact_amounts_are_kept_verbatim() {
        let allocs = allocate(
            dec("720000"),
            &[M1, C1],
            &Weights::Amounts(vec![dec("620000"), dec("100000")]),
        )
        .unwrap();
        assert_eq!(allocs[0].amount, Some(dec("620000")));
        assert_eq!(allocs[1].amount, Some(dec("100000")));
        let settled = settle(dec("720000"), &allocs);
        assert_eq!(settled[0].1 + settled[1].1, dec("720000"));
    }

    #[test]
    fn equitable_three_way_last_absorbs_remainder() {
        let allocs = allocate(dec("100000"), &[M1, M2, C1], &Weights::Equitable).unwrap();
        let third = Decimal::ONE / Decimal::from(3);
        assert!(allocs.iter().all(|a| a.percentage == third));
        let settled = settle(dec("100000"), &allocs);
        assert_eq!(
            settled,
            vec![
                (M1, dec("33333.33")),
                (M2, dec("33333.33")),
                (C1, dec("33333.34")),
            ]
        );
    }

    #[test]
    fn equitable_sums_for_awkward_totals() {
        for (total, n) in [("10.00", 3), ("0.05", 2), ("99999.99", 7), ("1", 6)] {
            let people: Vec<_> = (1..=n).map(ParticipantRef::Member).collect();
            let allocs = allocate(dec(total), &people, &Weights::Equitable).unwrap();
            let sum: Decimal = settle(dec(total), &allocs).iter().map(|(_, a)| *a).sum();
            assert_eq!(sum, dec(total), "total {} over {}", total, n);
        }
    }

    #[test]
    fn percentage_sum_outside_tolerance_is_rejected() {
        let err = allocate(
            dec("100"),
            &[M1, M2],
            &Weights::Percentages(vec![dec("0.5"), dec("0.4")]),
        )
        .unwrap_err();
        match err {
            LedgerError::PercentageSumInvalid { actual } => assert_eq!(actual, dec("0.9")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn percentage_sum_within_tolerance_is_accepted() {
        allocate(
            dec("100"),
            &[M1, M2, C1],
            &Weights::Percentages(vec![dec("0.3333"), dec("0.3333"), dec("0.3333")]),
        )
        .unwrap();
    }

    #[test]
    fn amount_sum_must_be_exact() {
        let err = allocate(
            dec("720000"),
            &[M1, C1],
            &Weights::Amounts(vec![dec("620000"), dec("99999.99")]),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::AmountSumInvalid { .. }));
    }

    #[test]
    fn duplicate_participant_is_rejected() {
        let err = allocate(dec("10"), &[M1, M1], &Weights::Equitable).unwrap_err();
        assert_eq!(err.field(), Some("participants"));
    }

    #[test]
    fn weight_count_must_match() {
        let err = allocate(
            dec("10"),
            &[M1, M2],
            &Weights::Percentages(vec![Decimal::ONE]),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn partial_percentages_do_not_absorb() {
        // Allocations that do not cover the whole total (legacy rows) settle by rounding only.
        let allocs = vec![Allocation {
            participant: M1,
            percentage: dec("0.25"),
            amount: None,
        }];
        assert_eq!(settle(dec("10.01"), &allocs), vec![(M1, dec("2.50"))]);
    }
}
