// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-kind validation shared by movements and templates. Nothing here writes.

use crate::authz::{check_account, check_payment_method};
use crate::directory::Directory;
use crate::error::{LedgerError, Result, not_found};
use crate::identity::{self, Identity};
use crate::models::{Allocation, MovementKind, ParticipantRef, SplitInput, StoredKind};
use crate::split;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

pub(crate) fn check_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    check_cents(amount)
}

/// Currency amounts carry at most two decimals.
pub(crate) fn check_cents(amount: Decimal) -> Result<()> {
    if amount.normalize().scale() > 2 {
        return Err(LedgerError::validation(
            "amount",
            format!("{} has more than two decimals", amount),
        ));
    }
    Ok(())
}

pub(crate) fn check_description(description: &str) -> Result<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(LedgerError::validation("description", "must not be empty"));
    }
    Ok(description.to_string())
}

pub(crate) fn check_category(
    dir: &dyn Directory,
    conn: &Connection,
    household_id: i64,
    category_id: i64,
) -> Result<()> {
    let category = dir
        .category(conn, category_id)?
        .filter(|c| c.household_id == household_id)
        .ok_or(not_found("category"))?;
    if !category.active {
        return Err(LedgerError::validation(
            "category_id",
            format!("category '{}' is inactive", category.name),
        ));
    }
    Ok(())
}

/// Validates `kind` for a movement (or template) of `amount` in `household_id` and returns the
/// storable form, with split participants allocated.
pub(crate) fn validate_kind(
    dir: &dyn Directory,
    conn: &Connection,
    household_id: i64,
    amount: Decimal,
    kind: &MovementKind,
) -> Result<StoredKind> {
    check_amount(amount)?;
    match kind {
        MovementKind::Household {
            payer,
            category_id,
            payment_method_id,
        } => {
            identity::resolve(dir, conn, household_id, ParticipantRef::Member(*payer))?;
            check_category(dir, conn, household_id, *category_id)?;
            check_payment_method(dir, conn, household_id, *payer, *payment_method_id)?;
            Ok(MovementKind::Household {
                payer: *payer,
                category_id: *category_id,
                payment_method_id: *payment_method_id,
            })
        }
        MovementKind::Split {
            payer,
            category_id,
            payment_method_id,
            participants,
        } => {
            let payer_id = identity::resolve(dir, conn, household_id, *payer)?;
            check_category(dir, conn, household_id, *category_id)?;
            check_payer_payment_method(dir, conn, household_id, &payer_id, *payment_method_id)?;
            if payer_id.is_member() && payment_method_id.is_none() {
                return Err(LedgerError::validation(
                    "payment_method_id",
                    "required when a member pays",
                ));
            }
            let allocations = allocate_participants(dir, conn, household_id, amount, participants)?;
            Ok(MovementKind::Split {
                payer: *payer,
                category_id: *category_id,
                payment_method_id: *payment_method_id,
                participants: allocations,
            })
        }
        MovementKind::Loan {
            direction,
            payer,
            counterparty,
            payment_method_id,
            receiver_account_id,
        } => {
            let payer_id = identity::resolve(dir, conn, household_id, *payer)?;
            let counterparty_id = identity::resolve(dir, conn, household_id, *counterparty)?;
            if payer_id.same_party(&counterparty_id) {
                debug!(payer = %payer, counterparty = %counterparty, "loan between the same party");
                return Err(LedgerError::SamePartyInvalid);
            }
            check_payer_payment_method(dir, conn, household_id, &payer_id, *payment_method_id)?;
            match (counterparty_id.reference, receiver_account_id) {
                (ParticipantRef::Member(user_id), Some(account_id)) => {
                    check_account(dir, conn, household_id, user_id, *account_id)?;
                }
                (ParticipantRef::Member(_), None) => {
                    return Err(LedgerError::validation(
                        "receiver_account_id",
                        "required when the counterparty is a member",
                    ));
                }
                (ParticipantRef::Contact(_), Some(_)) => {
                    return Err(LedgerError::validation(
                        "receiver_account_id",
                        "contacts have no accounts",
                    ));
                }
                (ParticipantRef::Contact(_), None) => {}
            }
            Ok(MovementKind::Loan {
                direction: *direction,
                payer: *payer,
                counterparty: *counterparty,
                payment_method_id: *payment_method_id,
                receiver_account_id: *receiver_account_id,
            })
        }
        MovementKind::Income {
            member,
            account_id,
            income_type,
        } => {
            identity::resolve(dir, conn, household_id, ParticipantRef::Member(*member))?;
            check_account(dir, conn, household_id, *member, *account_id)?;
            Ok(MovementKind::Income {
                member: *member,
                account_id: *account_id,
                income_type: *income_type,
            })
        }
    }
}

/// Contacts have no payment methods; a member's optional one must be usable by them.
fn check_payer_payment_method(
    dir: &dyn Directory,
    conn: &Connection,
    household_id: i64,
    payer: &Identity,
    payment_method_id: Option<i64>,
) -> Result<()> {
    match (payer.reference, payment_method_id) {
        (ParticipantRef::Contact(_), Some(_)) => Err(LedgerError::validation(
            "payment_method_id",
            "must be omitted when a contact pays",
        )),
        (ParticipantRef::Member(user_id), Some(pm)) => {
            check_payment_method(dir, conn, household_id, user_id, pm)?;
            Ok(())
        }
        (_, None) => Ok(()),
    }
}

fn allocate_participants(
    dir: &dyn Directory,
    conn: &Connection,
    household_id: i64,
    amount: Decimal,
    input: &SplitInput,
) -> Result<Vec<Allocation>> {
    // A linked contact and its user are one person and cannot both hold a share.
    let mut seen = HashSet::new();
    for p in &input.participants {
        let resolved = identity::resolve(dir, conn, household_id, *p)?;
        if !seen.insert(resolved.canonical) {
            return Err(LedgerError::validation(
                "participants",
                format!("{} is listed more than once", resolved.display_name),
            ));
        }
    }
    split::allocate(amount, &input.participants, &input.weights)
}
