// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::*;
use homeledger::LedgerError;
use homeledger::audit::AuditAction;
use homeledger::models::{MovementKind, NewTemplate, TemplatePatch};

fn rent_template(amount: &str, category_id: i64) -> NewTemplate {
    NewTemplate {
        name: "Rent".into(),
        amount: dec(amount),
        day_of_month: 5,
        auto_generate: false,
        kind: MovementKind::Household {
            payer: ANA,
            category_id,
            payment_method_id: ANA_DEBIT_SHARED,
        },
    }
}

fn budget_of(conn: &rusqlite::Connection, env: &Env, month: &str, category_id: i64) -> Option<String> {
    env.ledger()
        .list_budgets(conn, ANA, CASA, month)
        .unwrap()
        .into_iter()
        .find(|b| b.category_id == category_id)
        .map(|b| b.amount.to_string())
}

#[test]
fn budget_cannot_go_below_active_templates() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    ledger
        .create_template(&mut conn, ANA, CASA, rent_template("800000", SERVICIOS), date("2025-03-01"))
        .unwrap();
    let err = ledger
        .set_budget(&mut conn, ANA, CASA, SERVICIOS, "2025-03", dec("500000"))
        .unwrap_err();
    match err {
        LedgerError::BudgetBelowTemplates { floor, requested } => {
            assert_eq!(floor, dec("800000"));
            assert_eq!(requested, dec("500000"));
        }
        other => panic!("unexpected {other:?}"),
    }
    ledger
        .set_budget(&mut conn, ANA, CASA, SERVICIOS, "2025-03", dec("900000"))
        .unwrap();
    assert_eq!(budget_of(&conn, &env, "2025-03", SERVICIOS).as_deref(), Some("900000"));
}

#[test]
fn negative_budget_is_rejected_and_zero_is_fine() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let err = ledger
        .set_budget(&mut conn, ANA, CASA, MERCADO, "2025-03", dec("-1"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
    ledger
        .set_budget(&mut conn, ANA, CASA, MERCADO, "2025-03", dec("0"))
        .unwrap();
}

#[test]
fn budget_amounts_stop_at_cents() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let err = ledger
        .set_budget(&mut conn, ANA, CASA, MERCADO, "2025-03", dec("100.005"))
        .unwrap_err();
    assert_eq!(err.field(), Some("amount"));
    assert_eq!(budget_of(&conn, &env, "2025-03", MERCADO), None);
    ledger
        .set_budget(&mut conn, ANA, CASA, MERCADO, "2025-03", dec("100.50"))
        .unwrap();
}

#[test]
fn creating_a_template_raises_the_current_budget() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    ledger
        .set_budget(&mut conn, ANA, CASA, SERVICIOS, "2025-03", dec("100000"))
        .unwrap();
    ledger
        .create_template(&mut conn, ANA, CASA, rent_template("800000", SERVICIOS), date("2025-03-20"))
        .unwrap();
    assert_eq!(budget_of(&conn, &env, "2025-03", SERVICIOS).as_deref(), Some("800000"));
}

#[test]
fn deactivating_keeps_the_budget_and_reactivating_raises_it_again() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let t = ledger
        .create_template(&mut conn, ANA, CASA, rent_template("800000", SERVICIOS), date("2025-03-01"))
        .unwrap();
    let off = TemplatePatch {
        active: Some(false),
        ..Default::default()
    };
    ledger
        .update_template(&mut conn, ANA, t.id, off, date("2025-04-01"))
        .unwrap();
    assert_eq!(budget_of(&conn, &env, "2025-03", SERVICIOS).as_deref(), Some("800000"));

    // With the template off the floor is gone.
    ledger
        .set_budget(&mut conn, ANA, CASA, SERVICIOS, "2025-04", dec("100"))
        .unwrap();
    let on = TemplatePatch {
        active: Some(true),
        ..Default::default()
    };
    ledger
        .update_template(&mut conn, ANA, t.id, on, date("2025-04-02"))
        .unwrap();
    assert_eq!(budget_of(&conn, &env, "2025-04", SERVICIOS).as_deref(), Some("800000"));
}

#[test]
fn movements_raise_the_budget_of_their_month() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    ledger
        .create_template(&mut conn, ANA, CASA, rent_template("300", MERCADO), date("2025-03-01"))
        .unwrap();
    assert_eq!(budget_of(&conn, &env, "2025-06", MERCADO), None);
    ledger
        .create_movement(&mut conn, ANA, CASA, household_expense("20", "2025-06-10"))
        .unwrap();
    assert_eq!(budget_of(&conn, &env, "2025-06", MERCADO).as_deref(), Some("300"));
}

#[test]
fn copy_from_previous_month_respects_the_floor_and_is_repeatable() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    ledger
        .set_budget(&mut conn, ANA, CASA, MERCADO, "2025-02", dec("400"))
        .unwrap();
    ledger
        .set_budget(&mut conn, ANA, CASA, SERVICIOS, "2025-02", dec("50"))
        .unwrap();
    ledger
        .create_template(&mut conn, ANA, CASA, rent_template("120", SERVICIOS), date("2025-01-15"))
        .unwrap();

    for _ in 0..2 {
        let copied = ledger
            .copy_budgets_from_previous_month(&mut conn, ANA, CASA, "2025-03")
            .unwrap();
        assert_eq!(copied.len(), 2);
        assert_eq!(budget_of(&conn, &env, "2025-03", MERCADO).as_deref(), Some("400"));
        assert_eq!(budget_of(&conn, &env, "2025-03", SERVICIOS).as_deref(), Some("120"));
    }
    assert!(env.audit.actions().contains(&AuditAction::BudgetsCopied));
}

#[test]
fn copy_into_january_reads_december() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    ledger
        .set_budget(&mut conn, ANA, CASA, MERCADO, "2024-12", dec("75"))
        .unwrap();
    ledger
        .copy_budgets_from_previous_month(&mut conn, ANA, CASA, "2025-01")
        .unwrap();
    assert_eq!(budget_of(&conn, &env, "2025-01", MERCADO).as_deref(), Some("75"));
}

#[test]
fn report_counts_household_and_split_spending() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    ledger
        .set_budget(&mut conn, ANA, CASA, MERCADO, "2025-03", dec("1000"))
        .unwrap();
    ledger
        .create_movement(&mut conn, ANA, CASA, household_expense("150", "2025-03-04"))
        .unwrap();
    ledger
        .create_movement(&mut conn, ANA, CASA, household_expense("99", "2025-04-01"))
        .unwrap();

    let report = ledger.budget_report(&conn, BEN, CASA, "2025-03").unwrap();
    let mercado = report.iter().find(|l| l.category_id == MERCADO).unwrap();
    assert_eq!(mercado.spent, dec("150"));
    assert_eq!(mercado.remaining(), Some(dec("850")));
    let servicios = report.iter().find(|l| l.category_id == SERVICIOS).unwrap();
    assert_eq!(servicios.budget, None);
    assert!(report.iter().all(|l| l.category_id != OLD_CATEGORY));
}

#[test]
fn invalid_month_is_a_validation_error() {
    let mut conn = seeded();
    let env = Env::default();
    let err = env
        .ledger()
        .set_budget(&mut conn, ANA, CASA, MERCADO, "2025-13", dec("1"))
        .unwrap_err();
    assert_eq!(err.field(), Some("month"));
}
