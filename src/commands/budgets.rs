// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::utils::{fmt_money, id_for_category, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &mut Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, s, sub)?,
        Some(("list", sub)) => list(conn, s, sub)?,
        Some(("copy", sub)) => {
            let household_id = s.household(conn)?;
            let month = sub.get_one::<String>("month").unwrap();
            let copied = s
                .ledger
                .copy_budgets_from_previous_month(conn, s.actor()?, household_id, month)?;
            println!("Copied {} budget(s) into {}", copied.len(), month);
        }
        Some(("report", sub)) => report(conn, s, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &mut Connection, s: &Session<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = s.household(conn)?;
    let cat = sub.get_one::<String>("category").unwrap();
    let category_id = id_for_category(conn, household_id, cat)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let month = sub.get_one::<String>("month").unwrap();
    let b = s
        .ledger
        .set_budget(conn, s.actor()?, household_id, category_id, month, amount)?;
    println!("Budget set for {} / {} = {}", b.month, cat, fmt_money(&b.amount));
    Ok(())
}

fn list(conn: &Connection, s: &Session<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = s.household(conn)?;
    let month = sub.get_one::<String>("month").unwrap();
    let budgets = s.ledger.list_budgets(conn, s.actor()?, household_id, month)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budgets)? {
        return Ok(());
    }
    let mut data = Vec::with_capacity(budgets.len());
    for b in &budgets {
        let name: String = conn.query_row(
            "SELECT name FROM categories WHERE id=?1",
            params![b.category_id],
            |r| r.get(0),
        )?;
        data.push(vec![b.month.clone(), name, fmt_money(&b.amount)]);
    }
    println!("{}", pretty_table(&["Month", "Category", "Amount"], data));
    Ok(())
}

fn report(conn: &Connection, s: &Session<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = s.household(conn)?;
    let month = sub.get_one::<String>("month").unwrap();
    let lines = s.ledger.budget_report(conn, s.actor()?, household_id, month)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &lines)? {
        return Ok(());
    }
    let data = lines
        .iter()
        .map(|l| {
            vec![
                l.category.clone(),
                l.budget.map(|b| fmt_money(&b)).unwrap_or_else(|| "-".into()),
                fmt_money(&l.floor),
                fmt_money(&l.spent),
                l.remaining().map(|r| fmt_money(&r)).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Category", "Budget", "Templates", "Spent", "Remaining"], data)
    );
    Ok(())
}
