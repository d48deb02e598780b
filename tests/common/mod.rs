// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use chrono::NaiveDate;
use homeledger::Ledger;
use homeledger::audit::{AuditAction, AuditEvent, AuditSink};
use homeledger::db;
use homeledger::directory::SqliteDirectory;
use homeledger::models::{MovementKind, NewMovement, ParticipantRef, SplitInput, Weights};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::Mutex;

pub const ANA: i64 = 1;
pub const BEN: i64 = 2;
pub const CARO: i64 = 3;
pub const DAN: i64 = 4;
pub const EVE: i64 = 5;

pub const CASA: i64 = 1;
pub const OTHER: i64 = 2;

pub const PEDRO: i64 = 1;
pub const BEN_CONTACT: i64 = 2;
pub const ZOE: i64 = 3;
pub const EVE_CONTACT: i64 = 4;
pub const OLD_FRIEND: i64 = 5;

pub const ANA_SAVINGS: i64 = 1;
pub const ANA_CHECKING: i64 = 2;
pub const BEN_SAVINGS: i64 = 3;
pub const DAN_SAVINGS: i64 = 4;

pub const ANA_VISA: i64 = 1;
pub const ANA_DEBIT_SHARED: i64 = 2;
pub const BEN_DEBIT: i64 = 3;
pub const DAN_VISA: i64 = 4;
pub const BEN_CASH_INACTIVE: i64 = 5;

pub const MERCADO: i64 = 1;
pub const SERVICIOS: i64 = 2;
pub const OLD_CATEGORY: i64 = 3;
pub const DAN_FOOD: i64 = 4;

/// Two households. Casa: Ana (owner), Ben and Caro; contacts Pedro, a contact linked to Ben,
/// Eve's contact (Eve is registered but not a member yet) and an inactive one. Other: Dan.
pub fn seeded() -> Connection {
    let conn = db::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO users(id,name,email) VALUES
            (1,'Ana','ana@example.com'),
            (2,'Ben','ben@example.com'),
            (3,'Caro','caro@example.com'),
            (4,'Dan','dan@example.com'),
            (5,'Eve','eve@example.com');
        INSERT INTO households(id,name) VALUES (1,'Casa'),(2,'Other');
        INSERT INTO household_members(household_id,user_id,role) VALUES
            (1,1,'owner'),(1,2,'member'),(1,3,'member'),(2,4,'owner');
        INSERT INTO contacts(id,household_id,name,email,active,linked_user_id) VALUES
            (1,1,'Pedro','pedro@example.com',1,NULL),
            (2,1,'Benny','ben@example.com',1,2),
            (3,2,'Zoe',NULL,1,NULL),
            (4,1,'Eve','eve@example.com',1,NULL),
            (5,1,'Old friend',NULL,0,NULL);
        INSERT INTO accounts(id,household_id,owner_id,name,type,initial_balance) VALUES
            (1,1,1,'Ana Savings','savings','1000000'),
            (2,1,1,'Ana Checking','checking','50000'),
            (3,1,2,'Ben Savings','savings','0'),
            (4,2,4,'Dan Savings','savings','0');
        INSERT INTO payment_methods(id,household_id,owner_id,name,type,shared_with_household,active) VALUES
            (1,1,1,'Ana Visa','credit',0,1),
            (2,1,1,'Ana Debit','debit',1,1),
            (3,1,2,'Ben Debit','debit',0,1),
            (4,2,4,'Dan Visa','credit',0,1),
            (5,1,2,'Ben Cash','cash',0,0);
        INSERT INTO categories(id,household_id,name,active) VALUES
            (1,1,'Mercado',1),
            (2,1,'Servicios',1),
            (3,1,'Old',0),
            (4,2,'Food',1);
        "#,
    )
    .unwrap();
    conn
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    pub events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    pub fn actions(&self) -> Vec<AuditAction> {
        self.events.lock().unwrap().iter().map(|e| e.action).collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn log_async(&self, event: AuditEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub struct Env {
    pub dir: SqliteDirectory,
    pub audit: RecordingAuditSink,
}

impl Env {
    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.dir, &self.audit)
    }
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn household_expense(amount: &str, on: &str) -> NewMovement {
    NewMovement {
        date: date(on),
        amount: dec(amount),
        description: "Groceries".into(),
        kind: MovementKind::Household {
            payer: ANA,
            category_id: MERCADO,
            payment_method_id: ANA_VISA,
        },
    }
}

pub fn split(
    amount: &str,
    payer: ParticipantRef,
    payment_method_id: Option<i64>,
    participants: Vec<ParticipantRef>,
    weights: Weights,
) -> NewMovement {
    NewMovement {
        date: date("2025-03-10"),
        amount: dec(amount),
        description: "Dinner".into(),
        kind: MovementKind::Split {
            payer,
            category_id: MERCADO,
            payment_method_id,
            participants: SplitInput {
                participants,
                weights,
            },
        },
    }
}
