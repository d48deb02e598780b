// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use super::movements::kind_from_matches;
use crate::models::{NewTemplate, RecurringTemplate, TemplatePatch};
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    let today = Utc::now().date_naive();
    match m.subcommand() {
        Some(("add", add)) => {
            let Some((kind_name, sub)) = add.subcommand() else {
                return Ok(());
            };
            let actor = s.actor()?;
            let household_id = s.household(conn)?;
            let input = NewTemplate {
                name: sub.get_one::<String>("name").unwrap().to_string(),
                amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
                day_of_month: *sub.get_one::<u32>("day").unwrap(),
                auto_generate: sub.get_flag("auto"),
                kind: kind_from_matches(conn, household_id, kind_name, sub)?,
            };
            let t = s
                .ledger
                .create_template(conn, actor, household_id, input, today)?;
            println!("Added template '{}' (id {})", t.name, t.id);
        }
        Some(("list", sub)) => {
            let household_id = s.household(conn)?;
            let templates = s.ledger.list_templates(conn, s.actor()?, household_id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &templates)? {
                println!("{}", table(&templates));
            }
        }
        Some(("edit", sub)) => {
            let patch = TemplatePatch {
                name: sub.get_one::<String>("name").cloned(),
                amount: sub
                    .get_one::<String>("amount")
                    .map(|a| parse_decimal(a))
                    .transpose()?,
                day_of_month: sub.get_one::<u32>("day").copied(),
                auto_generate: sub.get_one::<bool>("auto").copied(),
                active: None,
            };
            patch_template(conn, s, sub, patch, today)?;
        }
        Some(("activate", sub)) => {
            let patch = TemplatePatch {
                active: Some(true),
                ..Default::default()
            };
            patch_template(conn, s, sub, patch, today)?;
        }
        Some(("deactivate", sub)) => {
            let patch = TemplatePatch {
                active: Some(false),
                ..Default::default()
            };
            patch_template(conn, s, sub, patch, today)?;
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            s.ledger.delete_template(conn, s.actor()?, id)?;
            println!("Deleted template {}", id);
        }
        Some(("generate", sub)) => {
            let household_id = s.household(conn)?;
            let month = sub.get_one::<String>("month").unwrap();
            let report = s.ledger.generate_due(conn, s.actor()?, household_id, month)?;
            for m in &report.created {
                println!(
                    "Created movement {} on {} ({})",
                    m.id,
                    m.date,
                    fmt_money(&m.amount)
                );
            }
            for (id, reason) in &report.failed {
                println!("Template {} skipped: {}", id, reason);
            }
            println!(
                "{}: {} created, {} already present, {} failed",
                report.month,
                report.created.len(),
                report.skipped.len(),
                report.failed.len()
            );
        }
        _ => {}
    }
    Ok(())
}

fn patch_template(
    conn: &mut Connection,
    s: &Session<'_>,
    sub: &clap::ArgMatches,
    patch: TemplatePatch,
    today: chrono::NaiveDate,
) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let t = s.ledger.update_template(conn, s.actor()?, id, patch, today)?;
    println!(
        "Template {} '{}': {} on day {}, {}",
        t.id,
        t.name,
        fmt_money(&t.amount),
        t.day_of_month,
        if t.active { "active" } else { "inactive" }
    );
    Ok(())
}

fn table(templates: &[RecurringTemplate]) -> comfy_table::Table {
    let rows = templates
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.name.clone(),
                t.kind.movement_type().to_string(),
                fmt_money(&t.amount),
                t.day_of_month.to_string(),
                t.kind
                    .category_id()
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
                if t.auto_generate { "yes" } else { "no" }.to_string(),
                if t.active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    pretty_table(
        &["Id", "Name", "Type", "Amount", "Day", "Category", "Auto", "Active"],
        rows,
    )
}
