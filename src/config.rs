// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings resolved from global flags and their `HOMELEDGER_*` environment variables.

use crate::db;
use crate::directory::Directory;
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use rusqlite::Connection;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub actor: Option<i64>,
    pub household: Option<i64>,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_matches(m: &ArgMatches) -> Result<Self> {
        let db_path = match m.get_one::<String>("db") {
            Some(p) => PathBuf::from(p.trim()),
            None => db::default_db_path()?,
        };
        Ok(Self {
            db_path,
            actor: m.get_one::<i64>("as").copied(),
            household: m.get_one::<i64>("household").copied(),
            log_level: log_level(m.get_one::<String>("log-level").map(String::as_str))?,
        })
    }

    pub fn actor(&self) -> Result<i64> {
        self.actor
            .ok_or_else(|| anyhow!("No acting user; pass --as USER_ID or set HOMELEDGER_USER"))
    }

    /// The explicit household, else the acting user's first household.
    pub fn household(&self, dir: &dyn Directory, conn: &Connection) -> Result<i64> {
        if let Some(id) = self.household {
            return Ok(id);
        }
        let actor = self.actor()?;
        dir.user_household_id(conn, actor)?.with_context(|| {
            format!(
                "User {} belongs to no household; pass --household or create one",
                actor
            )
        })
    }
}

fn log_level(s: Option<&str>) -> Result<LevelFilter> {
    let s = s.unwrap_or("warn");
    LevelFilter::from_str(s.trim()).with_context(|| format!("Invalid log level '{}'", s))
}
