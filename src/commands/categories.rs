// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

pub fn handle(conn: &Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    let household_id = s.household(conn)?;
    s.require_member(conn, household_id)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let group_id = match sub.get_one::<String>("group").map(|g| g.trim()) {
                Some(group) => Some(group_id(conn, household_id, group)?),
                None => None,
            };
            conn.execute(
                "INSERT INTO categories(household_id, group_id, name) VALUES (?1, ?2, ?3)",
                params![household_id, group_id, name],
            )?;
            println!("Added category '{}' (id {})", name, conn.last_insert_rowid());
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.name, g.name FROM categories c
                 LEFT JOIN category_groups g ON g.id=c.group_id
                 WHERE c.household_id=?1 AND c.active=1 ORDER BY g.name, c.name",
            )?;
            let rows = stmt.query_map(params![household_id], |r| {
                Ok(vec![
                    r.get::<_, i64>(0)?.to_string(),
                    r.get::<_, String>(1)?,
                    r.get::<_, Option<String>>(2)?.unwrap_or_default(),
                ])
            })?;
            let data = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            println!("{}", pretty_table(&["Id", "Category", "Group"], data));
        }
        _ => {}
    }
    Ok(())
}

/// Finds the group by name, creating it on first use.
fn group_id(conn: &Connection, household_id: i64, name: &str) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM category_groups WHERE household_id=?1 AND name=?2",
            params![household_id, name],
            |r| r.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO category_groups(household_id, name) VALUES (?1, ?2)",
        params![household_id, name],
    )?;
    Ok(conn.last_insert_rowid())
}
