// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Session;
use crate::models::NewCreditCardPayment;
use crate::utils::{
    fmt_money, id_for_account, id_for_payment_method, maybe_print_json, parse_date,
    parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("pay", sub)) => {
            let household_id = s.household(conn)?;
            let input = NewCreditCardPayment {
                credit_card_id: id_for_payment_method(
                    conn,
                    household_id,
                    sub.get_one::<String>("card").unwrap(),
                )?,
                amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
                date: parse_date(sub.get_one::<String>("date").unwrap())?,
                source_account_id: id_for_account(
                    conn,
                    household_id,
                    sub.get_one::<String>("from").unwrap(),
                )?,
                notes: sub.get_one::<String>("notes").cloned(),
            };
            let p = s
                .ledger
                .create_credit_card_payment(conn, s.actor()?, household_id, input)?;
            println!(
                "Paid {} to card {} from account {} (id {})",
                fmt_money(&p.amount),
                p.credit_card_id,
                p.source_account_id,
                p.id
            );
        }
        Some(("list", sub)) => {
            let household_id = s.household(conn)?;
            let payments = s
                .ledger
                .list_credit_card_payments(conn, s.actor()?, household_id)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &payments)? {
                let rows = payments
                    .iter()
                    .map(|p| {
                        vec![
                            p.id.to_string(),
                            p.date.to_string(),
                            p.credit_card_id.to_string(),
                            p.source_account_id.to_string(),
                            fmt_money(&p.amount),
                            p.notes.clone().unwrap_or_default(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Date", "Card", "From", "Amount", "Notes"], rows)
                );
            }
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            s.ledger.delete_credit_card_payment(conn, s.actor()?, id)?;
            println!("Deleted credit card payment {}", id);
        }
        _ => {}
    }
    Ok(())
}
