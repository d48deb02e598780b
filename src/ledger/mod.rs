// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The movement ledger: movements, credit-card payments, recurring templates, budgets and
//! household membership.
//!
//! Every mutating operation runs validation, authorization, allocation, persistence and budget
//! recomputation inside one immediate SQLite transaction; the audit event is emitted after
//! commit.

mod budgets;
mod credit_cards;
mod members;
mod movements;
mod store;
mod templates;
mod validate;

pub use budgets::BudgetLine;
pub(crate) use budgets::template_floor;
pub use templates::{GenerationReport, instantiate};

use crate::audit::{AuditEvent, AuditSink};
use crate::directory::Directory;
use crate::error::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Entry point to the ledger operations. Holds only the collaborators; all state lives in the
/// connection handed to each call.
#[derive(Clone, Copy)]
pub struct Ledger<'a> {
    dir: &'a dyn Directory,
    audit: &'a dyn AuditSink,
}

impl<'a> Ledger<'a> {
    pub fn new(dir: &'a dyn Directory, audit: &'a dyn AuditSink) -> Self {
        Self { dir, audit }
    }

    pub fn directory(&self) -> &'a dyn Directory {
        self.dir
    }

    fn emit(&self, event: AuditEvent) {
        self.audit.log_async(event);
    }
}

/// Takes the write lock up front so concurrent writers serialize instead of failing at commit.
fn begin(conn: &mut Connection) -> Result<Transaction<'_>> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}
