// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Homeledger", "homeledger"));

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("homeledger.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create directory {}", parent.display()))?;
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    conn.busy_timeout(Duration::from_secs(5))?;
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get(0))?;
    init_schema(&mut conn)?;
    tracing::debug!(path = %path.display(), journal_mode = %mode, "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS households(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS household_members(
        household_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        role TEXT NOT NULL CHECK(role IN ('owner','member')),
        joined_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY(household_id, user_id),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_members_user ON household_members(user_id);

    CREATE TABLE IF NOT EXISTS contacts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        active INTEGER NOT NULL DEFAULT 1,
        linked_user_id INTEGER,
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(linked_user_id) REFERENCES users(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        owner_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('savings','checking','cash','other')),
        initial_balance TEXT NOT NULL DEFAULT '0',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(owner_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS payment_methods(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        owner_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('cash','debit','credit','other')),
        shared_with_household INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        UNIQUE(owner_id, name),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(owner_id) REFERENCES users(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS category_groups(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(household_id, name),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        group_id INTEGER,
        name TEXT NOT NULL,
        active INTEGER NOT NULL DEFAULT 1,
        UNIQUE(household_id, name),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(group_id) REFERENCES category_groups(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS recurring_templates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('HOUSEHOLD','SPLIT','LOAN','INCOME')),
        amount TEXT NOT NULL,
        day_of_month INTEGER NOT NULL CHECK(day_of_month BETWEEN 1 AND 31),
        auto_generate INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        category_id INTEGER,
        payer_user_id INTEGER,
        payer_contact_id INTEGER,
        counterparty_user_id INTEGER,
        counterparty_contact_id INTEGER,
        payment_method_id INTEGER,
        account_id INTEGER,
        loan_direction TEXT,
        income_type TEXT,
        created_by INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_templates_category ON recurring_templates(category_id, active);

    CREATE TABLE IF NOT EXISTS template_participants(
        template_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        user_id INTEGER,
        contact_id INTEGER,
        percentage TEXT NOT NULL,
        amount TEXT,
        PRIMARY KEY(template_id, position),
        FOREIGN KEY(template_id) REFERENCES recurring_templates(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS movements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('HOUSEHOLD','SPLIT','LOAN','INCOME')),
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category_id INTEGER,
        payer_user_id INTEGER,
        payer_contact_id INTEGER,
        counterparty_user_id INTEGER,
        counterparty_contact_id INTEGER,
        payment_method_id INTEGER,
        account_id INTEGER,
        loan_direction TEXT,
        income_type TEXT,
        template_id INTEGER,
        created_by INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL,
        FOREIGN KEY(payment_method_id) REFERENCES payment_methods(id) ON DELETE SET NULL,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE SET NULL,
        FOREIGN KEY(template_id) REFERENCES recurring_templates(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_movements_household_date ON movements(household_id, date);

    CREATE TABLE IF NOT EXISTS movement_participants(
        movement_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        user_id INTEGER,
        contact_id INTEGER,
        percentage TEXT NOT NULL,
        amount TEXT,
        PRIMARY KEY(movement_id, position),
        FOREIGN KEY(movement_id) REFERENCES movements(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS monthly_budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        month TEXT NOT NULL,
        amount TEXT NOT NULL,
        UNIQUE(household_id, category_id, month),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS credit_card_payments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        credit_card_id INTEGER NOT NULL,
        source_account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        notes TEXT,
        created_by INTEGER NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(credit_card_id) REFERENCES payment_methods(id) ON DELETE CASCADE,
        FOREIGN KEY(source_account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );

    -- Append-only; written by the background audit writer
    CREATE TABLE IF NOT EXISTS audit_log(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        occurred_at TEXT NOT NULL,
        actor_id INTEGER NOT NULL,
        household_id INTEGER,
        action TEXT NOT NULL,
        entity_id INTEGER NOT NULL,
        detail TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}
