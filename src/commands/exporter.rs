// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::identity::display_name_of;
use crate::models::MovementFilter;
use crate::utils::parse_date;
use anyhow::{Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::json;

pub fn handle(conn: &Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("movements", sub)) => export_movements(conn, s, sub),
        _ => Ok(()),
    }
}

/// Writes the movements visible to the acting user, oldest first, with their own share of each
/// split.
fn export_movements(conn: &Connection, s: &Session<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let actor = s.actor()?;
    let household_id = s.household(conn)?;
    let filter = MovementFilter {
        from: sub.get_one::<String>("from").map(|d| parse_date(d)).transpose()?,
        to: sub.get_one::<String>("to").map(|d| parse_date(d)).transpose()?,
        ..Default::default()
    };
    let mut list = s.ledger.list_movements(conn, actor, household_id, &filter)?;
    list.items.reverse();

    let dir = s.ledger.directory();
    let mut rows = Vec::with_capacity(list.items.len());
    for m in &list.items {
        let category: Option<String> = match m.kind.category_id() {
            Some(id) => conn
                .query_row("SELECT name FROM categories WHERE id=?1", params![id], |r| r.get(0))
                .optional()?,
            None => None,
        };
        rows.push((
            m.date.to_string(),
            m.movement_type().to_string(),
            m.description.clone(),
            m.amount.to_string(),
            display_name_of(dir, conn, m.kind.payer())?,
            category,
            s.ledger
                .my_share(conn, m, actor)?
                .map(|d| d.normalize().to_string()),
        ));
    }

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date", "type", "description", "amount", "payer", "category", "my_share",
            ])?;
            for (d, t, desc, amt, payer, cat, share) in rows {
                wtr.write_record([
                    d,
                    t,
                    desc,
                    amt,
                    payer,
                    cat.unwrap_or_default(),
                    share.unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows
                .into_iter()
                .map(|(d, t, desc, amt, payer, cat, share)| {
                    json!({
                        "date": d, "type": t, "description": desc, "amount": amt,
                        "payer": payer, "category": cat, "my_share": share
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    println!("Exported {} movements to {}", list.items.len(), out);
    Ok(())
}
