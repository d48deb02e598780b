// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::*;
use homeledger::ledger::instantiate;
use homeledger::models::ParticipantRef::{Contact as C, Member as M};
use homeledger::models::{MovementKind, NewTemplate, SplitInput, TemplatePatch, Weights};
use rusqlite::params;

fn template(name: &str, day: u32, auto: bool) -> NewTemplate {
    NewTemplate {
        name: name.into(),
        amount: dec("1200"),
        day_of_month: day,
        auto_generate: auto,
        kind: MovementKind::Household {
            payer: ANA,
            category_id: SERVICIOS,
            payment_method_id: ANA_DEBIT_SHARED,
        },
    }
}

fn exact_split_template() -> NewTemplate {
    NewTemplate {
        name: "Internet".into(),
        amount: dec("90"),
        day_of_month: 10,
        auto_generate: true,
        kind: MovementKind::Split {
            payer: M(ANA),
            category_id: SERVICIOS,
            payment_method_id: Some(ANA_VISA),
            participants: SplitInput {
                participants: vec![M(ANA), C(PEDRO)],
                weights: Weights::Amounts(vec![dec("60"), dec("30")]),
            },
        },
    }
}

#[test]
fn day_of_month_is_clamped_to_short_months() {
    let mut conn = seeded();
    let env = Env::default();
    let t = env
        .ledger()
        .create_template(&mut conn, ANA, CASA, template("Rent", 31, true), date("2025-01-01"))
        .unwrap();
    assert_eq!(instantiate(&t, "2025-02").unwrap().date, date("2025-02-28"));
    assert_eq!(instantiate(&t, "2024-02").unwrap().date, date("2024-02-29"));
    assert_eq!(instantiate(&t, "2025-04").unwrap().date, date("2025-04-30"));
    assert_eq!(instantiate(&t, "2025-05").unwrap().date, date("2025-05-31"));
    assert_eq!(instantiate(&t, "2025-05").unwrap().description, "Rent");
}

#[test]
fn template_fields_are_validated() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let err = ledger
        .create_template(&mut conn, ANA, CASA, template("  ", 5, false), date("2025-01-01"))
        .unwrap_err();
    assert_eq!(err.field(), Some("name"));
    let err = ledger
        .create_template(&mut conn, ANA, CASA, template("Rent", 0, false), date("2025-01-01"))
        .unwrap_err();
    assert_eq!(err.field(), Some("day_of_month"));
}

#[test]
fn generate_creates_each_due_template_once() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let rent = ledger
        .create_template(&mut conn, ANA, CASA, template("Rent", 5, true), date("2025-01-01"))
        .unwrap();
    ledger
        .create_template(&mut conn, ANA, CASA, template("Manual", 5, false), date("2025-01-01"))
        .unwrap();

    let first = ledger.generate_due(&mut conn, BEN, CASA, "2025-03").unwrap();
    assert_eq!(first.created.len(), 1);
    let m = &first.created[0];
    assert_eq!(m.template_id, Some(rent.id));
    assert_eq!(m.created_by, ANA);
    assert_eq!(m.date, date("2025-03-05"));

    let second = ledger.generate_due(&mut conn, BEN, CASA, "2025-03").unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.skipped, vec![rent.id]);

    let april = ledger.generate_due(&mut conn, BEN, CASA, "2025-04").unwrap();
    assert_eq!(april.created.len(), 1);
}

#[test]
fn a_template_that_no_longer_validates_does_not_stop_the_others() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();

    let broken = ledger
        .create_template(&mut conn, ANA, CASA, template("Gym", 3, true), date("2025-01-01"))
        .unwrap();
    ledger
        .create_template(&mut conn, ANA, CASA, exact_split_template(), date("2025-01-01"))
        .unwrap();
    conn.execute(
        "UPDATE payment_methods SET active=0 WHERE id=?1",
        params![ANA_DEBIT_SHARED],
    )
    .unwrap();

    let report = ledger.generate_due(&mut conn, ANA, CASA, "2025-03").unwrap();
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, broken.id);

    // The generated split keeps its exact amounts.
    let split = &report.created[0];
    assert_eq!(split.share_of(C(PEDRO)), Some(dec("30")));
}

#[test]
fn exact_amount_split_template_keeps_its_total() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let t = ledger
        .create_template(&mut conn, ANA, CASA, exact_split_template(), date("2025-01-01"))
        .unwrap();
    let patch = TemplatePatch {
        amount: Some(dec("100")),
        ..Default::default()
    };
    let err = ledger
        .update_template(&mut conn, ANA, t.id, patch, date("2025-01-02"))
        .unwrap_err();
    assert_eq!(err.field(), Some("amount"));

    let rename = TemplatePatch {
        name: Some("Fiber".into()),
        ..Default::default()
    };
    let t = ledger
        .update_template(&mut conn, ANA, t.id, rename, date("2025-01-02"))
        .unwrap();
    assert_eq!(t.name, "Fiber");
}

#[test]
fn only_creator_or_owner_changes_a_template() {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    let mut input = template("Phone", 12, false);
    input.kind = MovementKind::Household {
        payer: BEN,
        category_id: SERVICIOS,
        payment_method_id: BEN_DEBIT,
    };
    let t = ledger
        .create_template(&mut conn, BEN, CASA, input, date("2025-01-01"))
        .unwrap();

    let err = ledger.delete_template(&mut conn, CARO, t.id).unwrap_err();
    assert_eq!(err.kind(), "not_authorized");
    ledger.delete_template(&mut conn, ANA, t.id).unwrap();
    assert!(ledger.list_templates(&conn, BEN, CASA).unwrap().is_empty());
}
