// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::*;
use homeledger::commands::{Session, exporter};
use homeledger::config::Config;
use homeledger::models::ParticipantRef::{Contact as C, Member as M};
use homeledger::models::Weights;
use homeledger::{Ledger, cli};
use rusqlite::Connection;
use serde_json::json;
use tempfile::tempdir;

fn with_movements() -> Connection {
    let mut conn = seeded();
    let env = Env::default();
    let ledger = env.ledger();
    ledger
        .create_movement(&mut conn, ANA, CASA, household_expense("150000", "2025-03-04"))
        .unwrap();
    ledger
        .create_movement(
            &mut conn,
            ANA,
            CASA,
            split(
                "100000",
                M(ANA),
                Some(ANA_VISA),
                vec![M(ANA), C(PEDRO)],
                Weights::Percentages(vec![dec("0.5"), dec("0.5")]),
            ),
        )
        .unwrap();
    conn
}

fn export(conn: &Connection, actor: i64, format: &str, out: &str) {
    let env = Env::default();
    let actor = actor.to_string();
    let matches = cli::build_cli().get_matches_from([
        "homeledger",
        "--as",
        &actor,
        "--household",
        "1",
        "--db",
        "unused.sqlite",
        "export",
        "movements",
        "--format",
        format,
        "--out",
        out,
    ]);
    let config = Config::from_matches(&matches).unwrap();
    let session = Session::new(&config, Ledger::new(&env.dir, &env.audit));
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(conn, &session, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_movements_writes_pretty_json_oldest_first() {
    let conn = with_movements();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    export(&conn, ANA, "json", &out_str);

    let contents = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(
        parsed,
        json!([
            {
                "date": "2025-03-04",
                "type": "HOUSEHOLD",
                "description": "Groceries",
                "amount": "150000",
                "payer": "Ana",
                "category": "Mercado",
                "my_share": null
            },
            {
                "date": "2025-03-10",
                "type": "SPLIT",
                "description": "Dinner",
                "amount": "100000",
                "payer": "Ana",
                "category": "Mercado",
                "my_share": "50000"
            }
        ])
    );
}

#[test]
fn export_movements_csv_leaves_out_foreign_splits() {
    let conn = with_movements();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    export(&conn, CARO, "csv", &out_str);

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        ["date", "type", "description", "amount", "payer", "category", "my_share"]
    );
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][1], "HOUSEHOLD");
    assert_eq!(&rows[0][6], "");
}
