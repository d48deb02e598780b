// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Session, accounts, categories};
use crate::models::Role;
use crate::utils::pretty_table;
use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, OptionalExtension, params};

pub fn handle_users(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let email = sub
                .get_one::<String>("email")
                .map(|e| e.trim().to_lowercase());
            conn.execute(
                "INSERT INTO users(name, email) VALUES (?1, ?2)",
                params![name, email],
            )
            .with_context(|| format!("Add user '{}'", name))?;
            println!("Added user '{}' (id {})", name, conn.last_insert_rowid());
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare("SELECT id, name, email FROM users ORDER BY id")?;
            let rows = stmt.query_map([], |r| {
                Ok(vec![
                    r.get::<_, i64>(0)?.to_string(),
                    r.get::<_, String>(1)?,
                    r.get::<_, Option<String>>(2)?.unwrap_or_default(),
                ])
            })?;
            let data = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            println!("{}", pretty_table(&["Id", "Name", "Email"], data));
        }
        _ => {}
    }
    Ok(())
}

pub fn handle(conn: &mut Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = s.ledger.create_household(conn, s.actor()?, name)?;
            println!("Created household '{}' (id {})", name.trim(), id);
        }
        Some(("member", sub)) => member(conn, s, sub)?,
        Some(("contact", sub)) => contact(conn, s, sub)?,
        Some(("account", sub)) => accounts::handle(conn, s, sub)?,
        Some(("card", sub)) => accounts::handle_payment_methods(conn, s, sub)?,
        Some(("category", sub)) => categories::handle(conn, s, sub)?,
        _ => {}
    }
    Ok(())
}

fn role_of(sub: &clap::ArgMatches) -> Result<Role> {
    sub.get_one::<String>("role")
        .unwrap()
        .parse::<Role>()
        .map_err(|e| anyhow!(e))
}

fn member(conn: &mut Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    let actor = s.actor()?;
    let household_id = s.household(conn)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let user_id = *sub.get_one::<i64>("user").unwrap();
            let role = role_of(sub)?;
            let linked = s
                .ledger
                .add_member(conn, actor, household_id, user_id, role)?;
            println!("Added user {} as {}", user_id, role);
            if !linked.is_empty() {
                println!("Linked contacts: {:?}", linked);
            }
        }
        Some(("role", sub)) => {
            let user_id = *sub.get_one::<i64>("user").unwrap();
            let role = role_of(sub)?;
            s.ledger
                .set_member_role(conn, actor, household_id, user_id, role)?;
            println!("User {} is now {}", user_id, role);
        }
        Some(("rm", sub)) => {
            let user_id = *sub.get_one::<i64>("user").unwrap();
            s.ledger.remove_member(conn, actor, household_id, user_id)?;
            println!("Removed user {} from household {}", user_id, household_id);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, m.role, m.joined_at FROM household_members m
                 JOIN users u ON u.id=m.user_id WHERE m.household_id=?1 ORDER BY u.name",
            )?;
            let rows = stmt.query_map(params![household_id], |r| {
                Ok(vec![
                    r.get::<_, i64>(0)?.to_string(),
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ])
            })?;
            let data = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            println!("{}", pretty_table(&["Id", "Name", "Role", "Joined"], data));
        }
        _ => {}
    }
    Ok(())
}

fn contact(conn: &Connection, s: &Session<'_>, m: &clap::ArgMatches) -> Result<()> {
    let household_id = s.household(conn)?;
    s.require_member(conn, household_id)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let email = sub
                .get_one::<String>("email")
                .map(|e| e.trim().to_lowercase());
            let phone = sub.get_one::<String>("phone").map(|p| p.trim().to_string());
            // A contact whose email belongs to a member is that member from the start.
            let linked: Option<i64> = match &email {
                Some(e) => conn
                    .query_row(
                        "SELECT u.id FROM users u JOIN household_members m ON m.user_id=u.id
                         WHERE m.household_id=?1 AND lower(u.email)=?2",
                        params![household_id, e],
                        |r| r.get(0),
                    )
                    .optional()?,
                None => None,
            };
            conn.execute(
                "INSERT INTO contacts(household_id, name, email, phone, linked_user_id)
                 VALUES (?1,?2,?3,?4,?5)",
                params![household_id, name, email, phone, linked],
            )?;
            println!("Added contact '{}' (id {})", name, conn.last_insert_rowid());
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, active, linked_user_id FROM contacts
                 WHERE household_id=?1 ORDER BY name",
            )?;
            let rows = stmt.query_map(params![household_id], |r| {
                Ok(vec![
                    r.get::<_, i64>(0)?.to_string(),
                    r.get::<_, String>(1)?,
                    r.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    if r.get::<_, bool>(3)? { "yes" } else { "no" }.to_string(),
                    r.get::<_, Option<i64>>(4)?
                        .map(|u| format!("member:{}", u))
                        .unwrap_or_default(),
                ])
            })?;
            let data = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            println!(
                "{}",
                pretty_table(&["Id", "Name", "Email", "Active", "Linked"], data)
            );
        }
        _ => {}
    }
    Ok(())
}
