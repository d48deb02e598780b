// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::template_floor;
use crate::split::percentage_tolerance;
use crate::utils::{decimal_col, opt_decimal_col, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Consistency checks over the whole database; each finding is one `[issue, detail]` row.
pub fn findings(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // Budgets stored below what their category's active templates add up to
    let mut stmt = conn.prepare(
        "SELECT b.household_id, b.category_id, c.name, b.month, b.amount
         FROM monthly_budgets b JOIN categories c ON c.id=b.category_id
         ORDER BY b.household_id, b.month, c.name",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let household_id: i64 = r.get(0)?;
        let category_id: i64 = r.get(1)?;
        let name: String = r.get(2)?;
        let month: String = r.get(3)?;
        let amount = decimal_col(r, 4)?;
        let floor = template_floor(conn, household_id, category_id)?;
        if amount < floor {
            rows.push(vec![
                "budget_below_templates".into(),
                format!("{} {}: {} < {}", month, name, amount, floor),
            ]);
        }
    }

    // Splits whose stored percentages no longer add up to the whole
    let mut stmt = conn.prepare(
        "SELECT m.id, p.percentage FROM movements m
         LEFT JOIN movement_participants p ON p.movement_id=m.id
         WHERE m.type='SPLIT' ORDER BY m.id, p.position",
    )?;
    let mut cur = stmt.query([])?;
    let mut sums: BTreeMap<i64, Decimal> = BTreeMap::new();
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        *sums.entry(id).or_default() += opt_decimal_col(r, 1)?.unwrap_or_default();
    }
    for (id, sum) in sums {
        if (sum - Decimal::ONE).abs() > percentage_tolerance() {
            rows.push(vec!["split_shares".into(), format!("movement {}: {}", id, sum)]);
        }
    }

    // Payment methods whose owner has left the household
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name FROM payment_methods p
         LEFT JOIN household_members m ON m.household_id=p.household_id AND m.user_id=p.owner_id
         WHERE p.active=1 AND m.user_id IS NULL ORDER BY p.id",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        rows.push(vec![
            "payment_method_owner_left".into(),
            format!("{} ({})", name, id),
        ]);
    }

    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = findings(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
