// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::directory::Directory;
use crate::identity::display_name_of;
use crate::ledger::Ledger;
use crate::models::{
    IncomeType, LoanDirection, Movement, MovementFilter, MovementKind, MovementType, NewMovement,
    ParticipantRef, SplitInput, Weights,
};
use crate::utils::{
    fmt_money, id_for_account, id_for_category, id_for_payment_method, maybe_print_json,
    parse_date, parse_decimal, parse_percentage, pretty_table,
};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

pub fn handle(conn: &mut Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, s, sub)?,
        Some(("edit", sub)) => edit(conn, s, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            s.ledger.delete_movement(conn, s.actor()?, id)?;
            println!("Deleted movement {}", id);
        }
        Some(("show", sub)) => show(conn, s, sub)?,
        Some(("list", sub)) => list(conn, s, sub)?,
        _ => {}
    }
    Ok(())
}

pub(crate) fn participant(s: &str) -> Result<ParticipantRef> {
    s.parse::<ParticipantRef>().map_err(|e| anyhow!(e))
}

/// Participants plus the weights given by `--percent` or `--share`; neither means equal parts.
fn split_input(sub: &clap::ArgMatches) -> Result<Option<SplitInput>> {
    let Some(who) = sub.get_many::<String>("participant") else {
        return Ok(None);
    };
    let participants = who.map(|w| participant(w)).collect::<Result<Vec<_>>>()?;
    let weights = if let Some(pcts) = sub.get_many::<String>("percent") {
        Weights::Percentages(pcts.map(|p| parse_percentage(p)).collect::<Result<_>>()?)
    } else if let Some(shares) = sub.get_many::<String>("share") {
        Weights::Amounts(shares.map(|a| parse_decimal(a)).collect::<Result<_>>()?)
    } else {
        Weights::Equitable
    };
    Ok(Some(SplitInput {
        participants,
        weights,
    }))
}

/// Builds the payload of a `household|split|loan|income` subcommand. Categories, accounts and
/// payment methods may be given by id or by name.
pub(crate) fn kind_from_matches(
    conn: &Connection,
    household_id: i64,
    kind: &str,
    sub: &clap::ArgMatches,
) -> Result<MovementKind> {
    let payment_method = |sub: &clap::ArgMatches| -> Result<Option<i64>> {
        sub.get_one::<String>("payment-method")
            .map(|p| id_for_payment_method(conn, household_id, p))
            .transpose()
    };
    let kind = match kind {
        "household" => MovementKind::Household {
            payer: *sub.get_one::<i64>("payer").unwrap(),
            category_id: id_for_category(conn, household_id, sub.get_one::<String>("category").unwrap())?,
            payment_method_id: id_for_payment_method(
                conn,
                household_id,
                sub.get_one::<String>("payment-method").unwrap(),
            )?,
        },
        "split" => MovementKind::Split {
            payer: participant(sub.get_one::<String>("payer").unwrap())?,
            category_id: id_for_category(conn, household_id, sub.get_one::<String>("category").unwrap())?,
            payment_method_id: payment_method(sub)?,
            participants: split_input(sub)?.unwrap_or(SplitInput {
                participants: Vec::new(),
                weights: Weights::Equitable,
            }),
        },
        "loan" => MovementKind::Loan {
            direction: sub
                .get_one::<String>("direction")
                .unwrap()
                .parse::<LoanDirection>()
                .map_err(|e| anyhow!(e))?,
            payer: participant(sub.get_one::<String>("payer").unwrap())?,
            counterparty: participant(sub.get_one::<String>("counterparty").unwrap())?,
            payment_method_id: payment_method(sub)?,
            receiver_account_id: sub
                .get_one::<String>("receiver-account")
                .map(|a| id_for_account(conn, household_id, a))
                .transpose()?,
        },
        "income" => MovementKind::Income {
            member: *sub.get_one::<i64>("member").unwrap(),
            account_id: id_for_account(conn, household_id, sub.get_one::<String>("account").unwrap())?,
            income_type: sub
                .get_one::<String>("income-type")
                .unwrap()
                .parse::<IncomeType>()
                .map_err(|e| anyhow!(e))?,
        },
        other => return Err(anyhow!("Unknown movement kind '{}'", other)),
    };
    Ok(kind)
}

fn add(conn: &mut Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    let Some((kind_name, sub)) = m.subcommand() else {
        return Ok(());
    };
    let actor = s.actor()?;
    let household_id = s.household(conn)?;
    let input = NewMovement {
        date: parse_date(sub.get_one::<String>("date").unwrap())?,
        amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
        description: sub.get_one::<String>("description").unwrap().to_string(),
        kind: kind_from_matches(conn, household_id, kind_name, sub)?,
    };
    let movement = s.ledger.create_movement(conn, actor, household_id, input)?;
    println!(
        "Recorded {} {} on {} (id {})",
        movement.movement_type(),
        fmt_money(&movement.amount),
        movement.date,
        movement.id
    );
    if movement.movement_type() == MovementType::Split {
        print_shares(conn, s.ledger.directory(), &movement)?;
    }
    Ok(())
}

fn edit(conn: &mut Connection, s: &Session<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let actor = s.actor()?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let existing = s.ledger.movement_for_edit(conn, actor, id)?;
    let mut input = NewMovement {
        date: existing.date,
        amount: existing.amount,
        description: existing.description.clone(),
        kind: existing.kind.to_input(),
    };
    if let Some(d) = sub.get_one::<String>("date") {
        input.date = parse_date(d)?;
    }
    if let Some(a) = sub.get_one::<String>("amount") {
        input.amount = parse_decimal(a)?;
    }
    if let Some(d) = sub.get_one::<String>("description") {
        input.description = d.to_string();
    }
    if let Some(split) = split_input(sub)? {
        match &mut input.kind {
            MovementKind::Split { participants, .. } => *participants = split,
            _ => return Err(anyhow!("Movement {} is not a split", id)),
        }
    } else if let MovementKind::Split { participants, .. } = &mut input.kind {
        // Exact amounts stop adding up once the total changes; keep the stored proportions.
        if input.amount != existing.amount {
            if let Weights::Amounts(_) = participants.weights {
                participants.weights = Weights::Percentages(
                    existing.participants().iter().map(|a| a.percentage).collect(),
                );
            }
        }
    }
    let movement = s.ledger.update_movement(conn, actor, id, input)?;
    println!("Updated movement {}", movement.id);
    if movement.movement_type() == MovementType::Split {
        print_shares(conn, s.ledger.directory(), &movement)?;
    }
    Ok(())
}

fn print_shares(conn: &Connection, dir: &dyn Directory, movement: &Movement) -> Result<()> {
    let mut rows = Vec::new();
    for a in movement.participants() {
        let owed = movement.share_of(a.participant).unwrap_or_default();
        rows.push(vec![
            display_name_of(dir, conn, a.participant)?,
            crate::utils::fmt_percent(&a.percentage),
            fmt_money(&owed),
        ]);
    }
    println!("{}", pretty_table(&["Participant", "Share", "Amount"], rows));
    Ok(())
}

#[derive(Serialize)]
struct MovementView {
    #[serde(flatten)]
    movement: Movement,
    payer_name: String,
    category: Option<String>,
    my_share: Option<rust_decimal::Decimal>,
}

fn view(conn: &Connection, ledger: &Ledger<'_>, actor: i64, movement: Movement) -> Result<MovementView> {
    let dir = ledger.directory();
    let payer_name = display_name_of(dir, conn, movement.kind.payer())?;
    let category = match movement.kind.category_id() {
        Some(id) => conn
            .query_row("SELECT name FROM categories WHERE id=?1", params![id], |r| r.get(0))
            .optional()?,
        None => None,
    };
    let my_share = ledger.my_share(conn, &movement, actor)?;
    Ok(MovementView {
        movement,
        payer_name,
        category,
        my_share,
    })
}

fn show(conn: &Connection, s: &Session<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let actor = s.actor()?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let movement = s.ledger.get_movement(conn, actor, id)?;
    let dir = s.ledger.directory();
    let v = view(conn, &s.ledger, actor, movement)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &v)? {
        return Ok(());
    }
    let m = &v.movement;
    let rows = vec![
        vec!["Id".into(), m.id.to_string()],
        vec!["Date".into(), m.date.to_string()],
        vec!["Type".into(), m.movement_type().to_string()],
        vec!["Description".into(), m.description.clone()],
        vec!["Amount".into(), fmt_money(&m.amount)],
        vec!["Payer".into(), v.payer_name.clone()],
        vec!["Category".into(), v.category.clone().unwrap_or_default()],
    ];
    println!("{}", pretty_table(&["Field", "Value"], rows));
    if m.movement_type() == MovementType::Split {
        print_shares(conn, dir, m)?;
    }
    Ok(())
}

fn list(conn: &Connection, s: &Session<'_>, sub: &clap::ArgMatches) -> Result<()> {
    let actor = s.actor()?;
    let household_id = s.household(conn)?;
    let filter = MovementFilter {
        category_id: sub
            .get_one::<String>("category")
            .map(|c| id_for_category(conn, household_id, c))
            .transpose()?,
        from: sub.get_one::<String>("from").map(|d| parse_date(d)).transpose()?,
        to: sub.get_one::<String>("to").map(|d| parse_date(d)).transpose()?,
        payer: sub.get_one::<String>("payer").map(|p| participant(p)).transpose()?,
        movement_type: sub
            .get_one::<String>("type")
            .map(|t| t.parse::<MovementType>().map_err(|e| anyhow!(e)))
            .transpose()?,
    };
    let list = s.ledger.list_movements(conn, actor, household_id, &filter)?;
    let views = list
        .items
        .into_iter()
        .map(|m| view(conn, &s.ledger, actor, m))
        .collect::<Result<Vec<_>>>()?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &views)? {
        return Ok(());
    }
    let rows: Vec<Vec<String>> = views
        .iter()
        .map(|v| {
            vec![
                v.movement.id.to_string(),
                v.movement.date.to_string(),
                v.movement.movement_type().to_string(),
                v.movement.description.clone(),
                v.payer_name.clone(),
                v.category.clone().unwrap_or_default(),
                fmt_money(&v.movement.amount),
                v.my_share.map(|d| fmt_money(&d)).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Date", "Type", "Description", "Payer", "Category", "Amount", "My share"],
            rows
        )
    );
    println!("Total: {}", fmt_money(&list.total));
    Ok(())
}
