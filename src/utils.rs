// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, Row, params};
use rusqlite::types::Type;
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Reads `50%` as `0.5`; a bare number is taken as a fraction already.
pub fn parse_percentage(s: &str) -> Result<Decimal> {
    let s = s.trim();
    match s.strip_suffix('%') {
        Some(pct) => Ok(parse_decimal(pct)? / Decimal::ONE_HUNDRED),
        None => parse_decimal(s),
    }
}

/// First day of a `YYYY-MM` month.
pub fn month_start(month: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").map_err(|_| {
        LedgerError::validation("month", format!("'{}' is not a YYYY-MM month", month))
    })
}

pub fn parse_month(s: &str) -> crate::Result<String> {
    let start = month_start(s)?;
    Ok(month_of(start))
}

pub fn month_of(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn previous_month(month: &str) -> crate::Result<String> {
    let start = month_start(month)?;
    let prev = start
        .pred_opt()
        .ok_or_else(|| LedgerError::validation("month", "no month precedes this one"))?;
    Ok(month_of(prev))
}

pub fn month_end(month: &str) -> crate::Result<NaiveDate> {
    let start = month_start(month)?;
    let (y, m) = if start.month() == 12 {
        (start.year() + 1, 1)
    } else {
        (start.year(), start.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| LedgerError::validation("month", format!("'{}' is out of range", month)))
}

/// Date of `day` within `month`, clamped to the month's last day (31 -> 30 Apr, 28/29 Feb).
pub fn day_in_month(month: &str, day: u32) -> crate::Result<NaiveDate> {
    let end = month_end(month)?;
    let day = day.clamp(1, end.day());
    Ok(end.with_day(day).unwrap_or(end))
}

/// Numeric keys are taken as ids; anything else is matched by name within the household.
fn id_by_name(
    conn: &Connection,
    table: &str,
    entity: &str,
    household_id: i64,
    key: &str,
) -> Result<i64> {
    let key = key.trim();
    if let Ok(id) = key.parse::<i64>() {
        return Ok(id);
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT id FROM {} WHERE household_id=?1 AND lower(name)=lower(?2) ORDER BY id",
        table
    ))?;
    let ids = stmt
        .query_map(params![household_id, key], |r| r.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    match ids.as_slice() {
        [id] => Ok(*id),
        [] => bail!("No {} named '{}'", entity, key),
        _ => bail!("More than one {} is named '{}'; use its id", entity, key),
    }
}

pub fn id_for_category(conn: &Connection, household_id: i64, key: &str) -> Result<i64> {
    id_by_name(conn, "categories", "category", household_id, key)
}

pub fn id_for_account(conn: &Connection, household_id: i64, key: &str) -> Result<i64> {
    id_by_name(conn, "accounts", "account", household_id, key)
}

pub fn id_for_payment_method(conn: &Connection, household_id: i64, key: &str) -> Result<i64> {
    id_by_name(conn, "payment_methods", "payment method", household_id, key)
}

pub fn decimal_col<I: rusqlite::RowIndex + Copy>(r: &Row<'_>, idx: I) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

pub fn opt_decimal_col<I: rusqlite::RowIndex + Copy>(
    r: &Row<'_>,
    idx: I,
) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = r.get(idx)?;
    s.map(|s| {
        s.parse::<Decimal>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
    })
    .transpose()
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d)
}

pub fn fmt_percent(fraction: &Decimal) -> String {
    format!("{:.2}%", (*fraction * Decimal::ONE_HUNDRED).round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
