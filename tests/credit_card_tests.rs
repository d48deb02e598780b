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
use homeledger::models::NewCreditCardPayment;

fn payment(card: i64, amount: &str, source: i64) -> NewCreditCardPayment {
    NewCreditCardPayment {
        credit_card_id: card,
        amount: dec(amount),
        date: date("2025-03-15"),
        source_account_id: source,
        notes: Some("  March statement ".into()),
    }
}

#[test]
fn payment_is_recorded_and_lowers_the_source_balance() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let p = ledger
        .create_credit_card_payment(&mut conn, ANA, CASA, payment(ANA_VISA, "250000", ANA_SAVINGS))
        .unwrap();
    assert_eq!(p.notes.as_deref(), Some("March statement"));
    assert_eq!(
        SqliteDirectory.balance(&conn, ANA_SAVINGS).unwrap(),
        Some(dec("750000"))
    );
    let listed = ledger.list_credit_card_payments(&conn, BEN, CASA).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(env.audit.actions(), vec![AuditAction::CreditCardPaymentCreated]);
}

#[test]
fn checks_fail_in_a_fixed_order() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let mut pay = |actor, input| {
        ledger
            .create_credit_card_payment(&mut conn, actor, CASA, input)
            .unwrap_err()
    };

    // Everything wrong at once: the amount is reported first.
    let err = pay(ANA, payment(999, "0", ANA_CHECKING));
    assert!(matches!(err, LedgerError::InvalidAmount(_)), "{err:?}");

    let err = pay(ANA, payment(999, "10", ANA_CHECKING));
    assert!(matches!(err, LedgerError::CreditCardNotFound), "{err:?}");

    let err = pay(ANA, payment(ANA_DEBIT_SHARED, "10", ANA_CHECKING));
    assert!(matches!(err, LedgerError::NotACreditCard), "{err:?}");

    let err = pay(ANA, payment(DAN_VISA, "10", ANA_CHECKING));
    assert_eq!(err.kind(), "not_authorized");

    let err = pay(ANA, payment(ANA_VISA, "10", ANA_CHECKING));
    assert!(matches!(err, LedgerError::SourceMustBeSavings), "{err:?}");

    let err = pay(ANA, payment(ANA_VISA, "10", DAN_SAVINGS));
    assert_eq!(err.kind(), "not_authorized");

    let err = pay(DAN, payment(ANA_VISA, "10", ANA_SAVINGS));
    assert_eq!(err.kind(), "not_authorized");
}

#[test]
fn only_creator_or_owner_deletes_a_payment() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let p = ledger
        .create_credit_card_payment(&mut conn, BEN, CASA, payment(ANA_VISA, "100", BEN_SAVINGS))
        .unwrap();
    let err = ledger
        .delete_credit_card_payment(&mut conn, CARO, p.id)
        .unwrap_err();
    assert_eq!(err.kind(), "not_authorized");
    ledger.delete_credit_card_payment(&mut conn, ANA, p.id).unwrap();
    assert!(ledger.list_credit_card_payments(&conn, ANA, CASA).unwrap().is_empty());
}
