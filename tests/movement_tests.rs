// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::*;
use homeledger::LedgerError;
use homeledger::audit::AuditAction;
use homeledger::directory::{AccountLookup, SqliteDirectory};
use homeledger::models::ParticipantRef::{Contact as C, Member as M};
use homeledger::models::{
    IncomeType, LoanDirection, MovementFilter, MovementKind, MovementType, NewMovement, Weights,
};

#[test]
fn household_expense_is_recorded_and_audited() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let m = ledger
        .create_movement(&mut conn, ANA, CASA, household_expense("150000", "2025-03-04"))
        .unwrap();
    assert_eq!(m.movement_type(), MovementType::Household);
    assert_eq!(m.created_by, ANA);

    let back = ledger.get_movement(&conn, BEN, m.id).unwrap();
    assert_eq!(back.amount, dec("150000"));
    assert_eq!(back.description, "Groceries");
    assert_eq!(env.audit.actions(), vec![AuditAction::MovementCreated]);
}

#[test]
fn amounts_must_be_positive_with_two_decimals() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    for bad in ["0", "-5"] {
        let err = ledger
            .create_movement(&mut conn, ANA, CASA, household_expense(bad, "2025-03-04"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)), "{bad}: {err:?}");
    }
    let err = ledger
        .create_movement(&mut conn, ANA, CASA, household_expense("10.005", "2025-03-04"))
        .unwrap_err();
    assert_eq!(err.field(), Some("amount"));
    assert!(env.audit.actions().is_empty());
}

#[test]
fn outsiders_cannot_record_or_read() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let err = ledger
        .create_movement(&mut conn, DAN, CASA, household_expense("10", "2025-03-04"))
        .unwrap_err();
    assert_eq!(err.kind(), "not_authorized");

    let m = ledger
        .create_movement(&mut conn, ANA, CASA, household_expense("10", "2025-03-04"))
        .unwrap();
    let err = ledger.get_movement(&conn, DAN, m.id).unwrap_err();
    assert_eq!(err.kind(), "not_authorized");
}

#[test]
fn household_payer_needs_a_usable_payment_method() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let with_method = |payer, pm| NewMovement {
        kind: MovementKind::Household {
            payer,
            category_id: MERCADO,
            payment_method_id: pm,
        },
        ..household_expense("10", "2025-03-04")
    };

    // Shared by its owner with the household.
    ledger
        .create_movement(&mut conn, BEN, CASA, with_method(BEN, ANA_DEBIT_SHARED))
        .unwrap();
    // Someone else's private card.
    let err = ledger
        .create_movement(&mut conn, BEN, CASA, with_method(BEN, ANA_VISA))
        .unwrap_err();
    assert_eq!(err.kind(), "not_authorized");
    // Another household's card.
    let err = ledger
        .create_movement(&mut conn, ANA, CASA, with_method(ANA, DAN_VISA))
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
    // Inactive.
    let err = ledger
        .create_movement(&mut conn, BEN, CASA, with_method(BEN, BEN_CASH_INACTIVE))
        .unwrap_err();
    assert_eq!(err.field(), Some("payment_method_id"));
}

#[test]
fn inactive_category_is_rejected() {
    let mut conn = seeded();
    let env = Env::default();
    let mut input = household_expense("10", "2025-03-04");
    input.kind = MovementKind::Household {
        payer: ANA,
        category_id: OLD_CATEGORY,
        payment_method_id: ANA_VISA,
    };
    let err = env
        .ledger()
        .create_movement(&mut conn, ANA, CASA, input)
        .unwrap_err();
    assert_eq!(err.field(), Some("category_id"));
}

#[test]
fn blank_description_is_rejected() {
    let mut conn = seeded();
    let env = Env::default();
    let mut input = household_expense("10", "2025-03-04");
    input.description = "   ".into();
    let err = env
        .ledger()
        .create_movement(&mut conn, ANA, CASA, input)
        .unwrap_err();
    assert_eq!(err.field(), Some("description"));
}

#[test]
fn loan_between_the_same_person_is_rejected_in_every_form() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let loan = |payer, counterparty, account| NewMovement {
        date: date("2025-03-05"),
        amount: dec("20000"),
        description: "Loan".into(),
        kind: MovementKind::Loan {
            direction: LoanDirection::Lend,
            payer,
            counterparty,
            payment_method_id: None,
            receiver_account_id: account,
        },
    };
    for (payer, counterparty) in [
        (M(BEN), M(BEN)),
        (M(BEN), C(BEN_CONTACT)),
        (C(BEN_CONTACT), M(BEN)),
        (C(PEDRO), C(PEDRO)),
    ] {
        for account in [None, Some(BEN_SAVINGS)] {
            let err = ledger
                .create_movement(&mut conn, ANA, CASA, loan(payer, counterparty, account))
                .unwrap_err();
            assert!(
                matches!(err, LedgerError::SamePartyInvalid),
                "{payer} -> {counterparty}: {err:?}"
            );
        }
    }
}

#[test]
fn loan_receiver_account_follows_the_counterparty() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let loan = |counterparty, account| NewMovement {
        date: date("2025-03-05"),
        amount: dec("20000"),
        description: "Loan".into(),
        kind: MovementKind::Loan {
            direction: LoanDirection::Lend,
            payer: M(ANA),
            counterparty,
            payment_method_id: Some(ANA_DEBIT_SHARED),
            receiver_account_id: account,
        },
    };

    let err = ledger
        .create_movement(&mut conn, ANA, CASA, loan(M(BEN), None))
        .unwrap_err();
    assert_eq!(err.field(), Some("receiver_account_id"));

    // Only the counterparty's own account receives.
    let err = ledger
        .create_movement(&mut conn, ANA, CASA, loan(M(BEN), Some(ANA_SAVINGS)))
        .unwrap_err();
    assert_eq!(err.kind(), "not_authorized");

    let err = ledger
        .create_movement(&mut conn, ANA, CASA, loan(C(PEDRO), Some(BEN_SAVINGS)))
        .unwrap_err();
    assert_eq!(err.field(), Some("receiver_account_id"));

    ledger
        .create_movement(&mut conn, ANA, CASA, loan(M(BEN), Some(BEN_SAVINGS)))
        .unwrap();
    ledger
        .create_movement(&mut conn, ANA, CASA, loan(C(PEDRO), None))
        .unwrap();
}

#[test]
fn contact_payer_cannot_name_a_payment_method() {
    let mut conn = seeded();
    let env = Env::default();
    let input = NewMovement {
        date: date("2025-03-05"),
        amount: dec("500"),
        description: "Repaid".into(),
        kind: MovementKind::Loan {
            direction: LoanDirection::Repay,
            payer: C(PEDRO),
            counterparty: M(ANA),
            payment_method_id: Some(ANA_VISA),
            receiver_account_id: Some(ANA_SAVINGS),
        },
    };
    let err = env
        .ledger()
        .create_movement(&mut conn, ANA, CASA, input)
        .unwrap_err();
    assert_eq!(err.field(), Some("payment_method_id"));
}

#[test]
fn income_goes_to_the_members_own_account() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let income = |member, account| NewMovement {
        date: date("2025-03-01"),
        amount: dec("3000000"),
        description: "Salary".into(),
        kind: MovementKind::Income {
            member,
            account_id: account,
            income_type: IncomeType::Salary,
        },
    };

    let err = ledger
        .create_movement(&mut conn, ANA, CASA, income(BEN, ANA_SAVINGS))
        .unwrap_err();
    assert_eq!(err.kind(), "not_authorized");

    ledger
        .create_movement(&mut conn, BEN, CASA, income(BEN, BEN_SAVINGS))
        .unwrap();
    let balance = SqliteDirectory.balance(&conn, BEN_SAVINGS).unwrap().unwrap();
    assert_eq!(balance, dec("3000000"));
}

#[test]
fn type_cannot_change_on_update() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let m = ledger
        .create_movement(&mut conn, ANA, CASA, household_expense("10", "2025-03-04"))
        .unwrap();
    let as_income = NewMovement {
        kind: MovementKind::Income {
            member: ANA,
            account_id: ANA_SAVINGS,
            income_type: IncomeType::OtherIncome,
        },
        ..household_expense("10", "2025-03-04")
    };
    let err = ledger
        .update_movement(&mut conn, ANA, m.id, as_income)
        .unwrap_err();
    assert_eq!(err.field(), Some("type"));
}

#[test]
fn only_creator_or_owner_edits_and_deletes() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let ben_method = |amount| NewMovement {
        kind: MovementKind::Household {
            payer: BEN,
            category_id: MERCADO,
            payment_method_id: BEN_DEBIT,
        },
        ..household_expense(amount, "2025-03-04")
    };
    let m = ledger
        .create_movement(&mut conn, BEN, CASA, ben_method("10"))
        .unwrap();

    let err = ledger
        .update_movement(&mut conn, CARO, m.id, ben_method("12"))
        .unwrap_err();
    assert_eq!(err.kind(), "not_authorized");
    let err = ledger.delete_movement(&mut conn, CARO, m.id).unwrap_err();
    assert_eq!(err.kind(), "not_authorized");

    let updated = ledger
        .update_movement(&mut conn, ANA, m.id, ben_method("12"))
        .unwrap();
    assert_eq!(updated.amount, dec("12"));
    ledger.delete_movement(&mut conn, BEN, m.id).unwrap();
    assert_eq!(ledger.get_movement(&conn, BEN, m.id).unwrap_err().kind(), "not_found");
}

#[test]
fn list_filters_and_orders_newest_first() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    for (amount, on) in [("10", "2025-02-27"), ("20", "2025-03-02"), ("30", "2025-03-09")] {
        ledger
            .create_movement(&mut conn, ANA, CASA, household_expense(amount, on))
            .unwrap();
    }
    let list = ledger
        .list_movements(
            &conn,
            BEN,
            CASA,
            &MovementFilter {
                from: Some(date("2025-03-01")),
                ..Default::default()
            },
        )
        .unwrap();
    let amounts: Vec<_> = list.items.iter().map(|m| m.amount).collect();
    assert_eq!(amounts, vec![dec("30"), dec("20")]);
    assert_eq!(list.total, dec("50"));

    let none = ledger
        .list_movements(
            &conn,
            BEN,
            CASA,
            &MovementFilter {
                movement_type: Some(MovementType::Loan),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(none.items.is_empty());
}

#[test]
fn split_requires_payment_method_when_a_member_pays() {
    let mut conn = seeded();
    let env = Env::default();
    let err = env
        .ledger()
        .create_movement(
            &mut conn,
            ANA,
            CASA,
            split("100", M(ANA), None, vec![M(ANA), C(PEDRO)], Weights::Equitable),
        )
        .unwrap_err();
    assert_eq!(err.field(), Some("payment_method_id"));
}
