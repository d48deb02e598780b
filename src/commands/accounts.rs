// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::models::{AccountType, PaymentMethodType};
use crate::utils::{fmt_money, parse_decimal, pretty_table};
use anyhow::{Result, anyhow, bail};
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    let household_id = s.household(conn)?;
    let actor = s.require_member(conn, household_id)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let typ: AccountType = sub
                .get_one::<String>("type")
                .unwrap()
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let initial = parse_decimal(sub.get_one::<String>("initial").unwrap())?;
            conn.execute(
                "INSERT INTO accounts(household_id, owner_id, name, type, initial_balance)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![household_id, actor, name, typ, initial.to_string()],
            )?;
            println!(
                "Added account '{}' ({}, id {})",
                name,
                typ,
                conn.last_insert_rowid()
            );
        }
        Some(("list", _)) => {
            let dir = s.ledger.directory();
            let mut stmt = conn.prepare(
                "SELECT a.id, a.name, a.type, u.name FROM accounts a JOIN users u ON u.id=a.owner_id
                 WHERE a.household_id=?1 ORDER BY a.name",
            )?;
            let rows = stmt
                .query_map(params![household_id], |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let mut data = Vec::new();
            for (id, name, typ, owner) in rows {
                let balance = dir.balance(conn, id)?.unwrap_or_default();
                data.push(vec![id.to_string(), name, typ, owner, fmt_money(&balance)]);
            }
            println!(
                "{}",
                pretty_table(&["Id", "Name", "Type", "Owner", "Balance"], data)
            );
        }
        _ => {}
    }
    Ok(())
}

pub fn handle_payment_methods(
    conn: &Connection,
    s: &Session<'_>,
    m: &clap::ArgMatches,
) -> Result<()> {
    let household_id = s.household(conn)?;
    let actor = s.require_member(conn, household_id)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let typ: PaymentMethodType = sub
                .get_one::<String>("type")
                .unwrap()
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let shared = sub.get_flag("shared");
            if s
                .ledger
                .directory()
                .payment_method_name_exists(conn, actor, name)?
            {
                bail!("You already have a payment method named '{}'", name);
            }
            conn.execute(
                "INSERT INTO payment_methods(household_id, owner_id, name, type, shared_with_household)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![household_id, actor, name, typ, shared],
            )?;
            println!(
                "Added payment method '{}' ({}{}, id {})",
                name,
                typ,
                if shared { ", shared" } else { "" },
                conn.last_insert_rowid()
            );
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.name, p.type, u.name, p.shared_with_household, p.active
                 FROM payment_methods p JOIN users u ON u.id=p.owner_id
                 WHERE p.household_id=?1 ORDER BY p.name",
            )?;
            let rows = stmt.query_map(params![household_id], |r| {
                Ok(vec![
                    r.get::<_, i64>(0)?.to_string(),
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    if r.get::<_, bool>(4)? { "yes" } else { "no" }.to_string(),
                    if r.get::<_, bool>(5)? { "yes" } else { "no" }.to_string(),
                ])
            })?;
            let data = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            println!(
                "{}",
                pretty_table(&["Id", "Name", "Type", "Owner", "Shared", "Active"], data)
            );
        }
        _ => {}
    }
    Ok(())
}
