// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use homeledger::audit::{AuditAction, AuditEvent, AuditSink, SqliteAuditSink};
use homeledger::db;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn sqlite_sink_drains_queued_events_on_drop() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    let conn = db::open_or_init(&path).unwrap();

    {
        let sink = SqliteAuditSink::spawn(&path).unwrap();
        for entity_id in 1..=3 {
            sink.log_async(AuditEvent::new(
                1,
                1,
                AuditAction::MovementCreated,
                entity_id,
                json!({ "amount": "10" }),
            ));
        }
    }

    let rows: Vec<(String, i64)> = conn
        .prepare("SELECT action, entity_id FROM audit_log ORDER BY id")
        .unwrap()
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(
        rows,
        vec![
            ("movement_created".to_string(), 1),
            ("movement_created".to_string(), 2),
            ("movement_created".to_string(), 3),
        ]
    );
}
