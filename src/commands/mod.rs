// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod cards;
pub mod categories;
pub mod doctor;
pub mod exporter;
pub mod household;
pub mod movements;
pub mod templates;

use crate::authz::{Action, Resource, authorize};
use crate::config::Config;
use crate::ledger::Ledger;
use anyhow::Result;
use rusqlite::Connection;

/// Who is acting, where, and through which ledger.
pub struct Session<'a> {
    pub config: &'a Config,
    pub ledger: Ledger<'a>,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a Config, ledger: Ledger<'a>) -> Self {
        Self { config, ledger }
    }

    pub fn actor(&self) -> Result<i64> {
        self.config.actor()
    }

    pub fn household(&self, conn: &Connection) -> Result<i64> {
        self.config.household(self.ledger.directory(), conn)
    }

    /// For the bootstrap commands that write outside the ledger.
    pub fn require_member(&self, conn: &Connection, household_id: i64) -> Result<i64> {
        let actor = self.actor()?;
        authorize(
            self.ledger.directory(),
            conn,
            actor,
            household_id,
            Action::Create,
            Resource::Household,
        )?;
        Ok(actor)
    }
}
