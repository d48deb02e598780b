// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly category budgets and the template floor they may never drop below.

use super::{Ledger, begin};
use crate::audit::{AuditAction, AuditEvent};
use crate::authz::{Action, Resource, authorize};
use crate::error::{LedgerError, Result};
use crate::ledger::validate::{check_category, check_cents};
use crate::models::MonthlyBudget;
use crate::utils::{decimal_col, parse_month, previous_month};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

/// One row of a month's budget report.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetLine {
    pub category_id: i64,
    pub category: String,
    pub budget: Option<Decimal>,
    /// Sum of the category's active templates.
    pub floor: Decimal,
    /// HOUSEHOLD and SPLIT movements of the month.
    pub spent: Decimal,
}

impl BudgetLine {
    pub fn remaining(&self) -> Option<Decimal> {
        self.budget.map(|b| b - self.spent)
    }
}

/// Sum of the amounts of every active template targeting `category_id`.
pub(crate) fn template_floor(conn: &Connection, household_id: i64, category_id: i64) -> Result<Decimal> {
    let mut stmt = conn.prepare_cached(
        "SELECT amount FROM recurring_templates
         WHERE household_id=?1 AND category_id=?2 AND active=1",
    )?;
    let mut rows = stmt.query(params![household_id, category_id])?;
    let mut floor = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        floor += decimal_col(r, 0)?;
    }
    Ok(floor)
}

pub(crate) fn budget_amount(
    conn: &Connection,
    household_id: i64,
    category_id: i64,
    month: &str,
) -> Result<Option<Decimal>> {
    let amount = conn
        .query_row(
            "SELECT amount FROM monthly_budgets WHERE household_id=?1 AND category_id=?2 AND month=?3",
            params![household_id, category_id, month],
            |r| decimal_col(r, 0),
        )
        .optional()?;
    Ok(amount)
}

fn upsert_budget(
    conn: &Connection,
    household_id: i64,
    category_id: i64,
    month: &str,
    amount: Decimal,
) -> Result<()> {
    conn.execute(
        "INSERT INTO monthly_budgets(household_id, category_id, month, amount) VALUES (?1,?2,?3,?4)
         ON CONFLICT(household_id, category_id, month) DO UPDATE SET amount=excluded.amount",
        params![household_id, category_id, month, amount.to_string()],
    )?;
    Ok(())
}

/// Lifts the month's budget to the template floor when it sits below it. Never lowers a budget.
/// Returns the new amount when something changed.
pub(crate) fn raise_to_floor(
    conn: &Connection,
    household_id: i64,
    category_id: i64,
    month: &str,
) -> Result<Option<Decimal>> {
    let floor = template_floor(conn, household_id, category_id)?;
    if floor.is_zero() {
        return Ok(None);
    }
    let current = budget_amount(conn, household_id, category_id, month)?;
    if current.is_some_and(|b| b >= floor) {
        return Ok(None);
    }
    upsert_budget(conn, household_id, category_id, month, floor)?;
    debug!(category_id, month, from = ?current, to = %floor, "budget raised to template floor");
    Ok(Some(floor))
}

fn budgets_of_month(conn: &Connection, household_id: i64, month: &str) -> Result<Vec<MonthlyBudget>> {
    let mut stmt = conn.prepare_cached(
        "SELECT b.category_id, b.amount FROM monthly_budgets b
         JOIN categories c ON c.id=b.category_id
         WHERE b.household_id=?1 AND b.month=?2 ORDER BY c.name",
    )?;
    let rows = stmt.query_map(params![household_id, month], |r| {
        Ok(MonthlyBudget {
            household_id,
            category_id: r.get(0)?,
            month: month.to_string(),
            amount: decimal_col(r, 1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

impl Ledger<'_> {
    /// Sets a category's budget for `month` (`YYYY-MM`). Rejected below the template floor.
    pub fn set_budget(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        category_id: i64,
        month: &str,
        amount: Decimal,
    ) -> Result<MonthlyBudget> {
        let month = parse_month(month)?;
        if amount < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        check_cents(amount)?;
        let tx = begin(conn)?;
        authorize(self.dir, &tx, actor, household_id, Action::Edit, Resource::Household)?;
        check_category(self.dir, &tx, household_id, category_id)?;
        let floor = template_floor(&tx, household_id, category_id)?;
        if amount < floor {
            return Err(LedgerError::BudgetBelowTemplates {
                floor,
                requested: amount,
            });
        }
        upsert_budget(&tx, household_id, category_id, &month, amount)?;
        tx.commit()?;

        info!(household_id, category_id, month = %month, amount = %amount, "budget set");
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::BudgetSet,
            category_id,
            json!({ "month": month, "amount": amount }),
        ));
        Ok(MonthlyBudget {
            household_id,
            category_id,
            month,
            amount,
        })
    }

    pub fn list_budgets(
        &self,
        conn: &Connection,
        actor: i64,
        household_id: i64,
        month: &str,
    ) -> Result<Vec<MonthlyBudget>> {
        let month = parse_month(month)?;
        authorize(self.dir, conn, actor, household_id, Action::Read, Resource::Household)?;
        budgets_of_month(conn, household_id, &month)
    }

    /// Copies every budget of the month before `month` into `month`, overwriting what is there.
    /// Categories without a prior budget are skipped; a copied amount below the current template
    /// floor is raised to it. Applying twice yields the same budgets.
    pub fn copy_budgets_from_previous_month(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        month: &str,
    ) -> Result<Vec<MonthlyBudget>> {
        let month = parse_month(month)?;
        let prev = previous_month(&month)?;
        let tx = begin(conn)?;
        authorize(self.dir, &tx, actor, household_id, Action::Edit, Resource::Household)?;

        let mut copied = Vec::new();
        for b in budgets_of_month(&tx, household_id, &prev)? {
            let floor = template_floor(&tx, household_id, b.category_id)?;
            let amount = b.amount.max(floor);
            upsert_budget(&tx, household_id, b.category_id, &month, amount)?;
            copied.push(MonthlyBudget {
                household_id,
                category_id: b.category_id,
                month: month.clone(),
                amount,
            });
        }
        tx.commit()?;

        info!(household_id, from = %prev, to = %month, count = copied.len(), "budgets copied");
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::BudgetsCopied,
            household_id,
            json!({ "from": prev, "to": month, "count": copied.len() }),
        ));
        Ok(copied)
    }

    /// Budget, template floor and spending per active category for `month`.
    pub fn budget_report(
        &self,
        conn: &Connection,
        actor: i64,
        household_id: i64,
        month: &str,
    ) -> Result<Vec<BudgetLine>> {
        let month = parse_month(month)?;
        authorize(self.dir, conn, actor, household_id, Action::Read, Resource::Household)?;

        let mut cats = conn.prepare(
            "SELECT id, name FROM categories WHERE household_id=?1 AND active=1 ORDER BY name",
        )?;
        let cats = cats
            .query_map(params![household_id], |r| {
                Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut spent_stmt = conn.prepare(
            "SELECT amount FROM movements
             WHERE household_id=?1 AND category_id=?2 AND type IN ('HOUSEHOLD','SPLIT')
               AND substr(date,1,7)=?3",
        )?;
        let mut lines = Vec::with_capacity(cats.len());
        for (category_id, category) in cats {
            let mut spent = Decimal::ZERO;
            let mut rows = spent_stmt.query(params![household_id, category_id, month])?;
            while let Some(r) = rows.next()? {
                spent += decimal_col(r, 0)?;
            }
            lines.push(BudgetLine {
                category_id,
                category,
                budget: budget_amount(conn, household_id, category_id, &month)?,
                floor: template_floor(conn, household_id, category_id)?,
                spent,
            });
        }
        Ok(lines)
    }
}
