// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurring movement templates. An active template with a category contributes its amount to
//! that category's budget floor.

use super::store::{KIND_COLUMNS, KindColumns, read_participants, write_participants};
use super::validate::{check_amount, validate_kind};
use super::{Ledger, begin, budgets};
use crate::audit::{AuditAction, AuditEvent};
use crate::authz::{Action, Resource, authorize};
use crate::error::{LedgerError, Result, not_found};
use crate::models::{
    Allocation, Movement, MovementKind, MovementType, NewMovement, NewTemplate, RecurringTemplate,
    TemplatePatch,
};
use crate::utils::{day_in_month, decimal_col, month_of, parse_month};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

/// Outcome of one [`Ledger::generate_due`] run.
#[derive(Debug, Default, Serialize)]
pub struct GenerationReport {
    pub month: String,
    pub created: Vec<Movement>,
    /// Templates already generated for the month.
    pub skipped: Vec<i64>,
    /// Templates that no longer validate, with the reason.
    pub failed: Vec<(i64, String)>,
}

fn select_sql() -> String {
    format!(
        "SELECT id, household_id, name, type, amount, day_of_month, auto_generate, active,
         created_by, {} FROM recurring_templates",
        KIND_COLUMNS
    )
}

/// A template row before its participants are attached.
struct TemplateRow {
    id: i64,
    household_id: i64,
    name: String,
    movement_type: MovementType,
    amount: Decimal,
    day_of_month: u32,
    auto_generate: bool,
    active: bool,
    created_by: i64,
    cols: KindColumns,
}

fn template_row(r: &Row<'_>) -> rusqlite::Result<TemplateRow> {
    Ok(TemplateRow {
        id: r.get(0)?,
        household_id: r.get(1)?,
        name: r.get(2)?,
        movement_type: r.get(3)?,
        amount: decimal_col(r, 4)?,
        day_of_month: r.get(5)?,
        auto_generate: r.get(6)?,
        active: r.get(7)?,
        created_by: r.get(8)?,
        cols: KindColumns::read(r, 9)?,
    })
}

impl TemplateRow {
    fn into_template(self, conn: &Connection) -> Result<RecurringTemplate> {
        let participants = if self.movement_type == MovementType::Split {
            read_participants(conn, "template_participants", "template_id", self.id)?
        } else {
            Vec::new()
        };
        Ok(RecurringTemplate {
            id: self.id,
            household_id: self.household_id,
            name: self.name,
            amount: self.amount,
            day_of_month: self.day_of_month,
            auto_generate: self.auto_generate,
            active: self.active,
            created_by: self.created_by,
            kind: self.cols.into_kind(self.movement_type, participants)?,
        })
    }
}

pub(crate) fn load_template(conn: &Connection, template_id: i64) -> Result<Option<RecurringTemplate>> {
    let row = conn
        .query_row(
            &format!("{} WHERE id=?1", select_sql()),
            params![template_id],
            template_row,
        )
        .optional()?;
    row.map(|r| r.into_template(conn)).transpose()
}

fn templates_where(
    conn: &Connection,
    clause: &str,
    household_id: i64,
) -> Result<Vec<RecurringTemplate>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE household_id=?1 {} ORDER BY day_of_month, name",
        select_sql(),
        clause
    ))?;
    let rows = stmt
        .query_map(params![household_id], template_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(|r| r.into_template(conn)).collect()
}

fn check_template_fields(name: &str, day_of_month: u32) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::validation("name", "must not be empty"));
    }
    if !(1..=31).contains(&day_of_month) {
        return Err(LedgerError::validation(
            "day_of_month",
            format!("{} is not a day of the month", day_of_month),
        ));
    }
    Ok(name.to_string())
}

fn has_exact_amounts(participants: &[Allocation]) -> bool {
    participants.iter().any(|a| a.amount.is_some())
}

/// The movement a template stands for in `month` (`YYYY-MM`), dated on its day of month clamped
/// to the month's length.
pub fn instantiate(template: &RecurringTemplate, month: &str) -> Result<NewMovement> {
    let date = day_in_month(&parse_month(month)?, template.day_of_month)?;
    let kind = template.kind.to_input();
    Ok(NewMovement {
        date,
        amount: template.amount,
        description: template.name.clone(),
        kind,
    })
}

impl Ledger<'_> {
    /// Stores a template and raises its category's budget for the month of `as_of` to the new
    /// template floor.
    pub fn create_template(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        input: NewTemplate,
        as_of: NaiveDate,
    ) -> Result<RecurringTemplate> {
        let name = check_template_fields(&input.name, input.day_of_month)?;
        let tx = begin(conn)?;
        authorize(self.dir, &tx, actor, household_id, Action::Create, Resource::Household)?;
        let kind = validate_kind(self.dir, &tx, household_id, input.amount, &input.kind)?;
        let cols = KindColumns::of(&kind);
        tx.execute(
            &format!(
                "INSERT INTO recurring_templates(household_id, name, type, amount, day_of_month,
                 auto_generate, active, created_by, {})
                 VALUES (?1,?2,?3,?4,?5,?6,1,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
                KIND_COLUMNS
            ),
            params![
                household_id,
                name,
                kind.movement_type(),
                input.amount.to_string(),
                input.day_of_month,
                input.auto_generate,
                actor,
                cols.category_id,
                cols.payer_user_id,
                cols.payer_contact_id,
                cols.counterparty_user_id,
                cols.counterparty_contact_id,
                cols.payment_method_id,
                cols.account_id,
                cols.loan_direction,
                cols.income_type,
            ],
        )?;
        let id = tx.last_insert_rowid();
        if let MovementKind::Split { participants, .. } = &kind {
            write_participants(&tx, "template_participants", "template_id", id, participants)?;
        }
        if let Some(category_id) = kind.category_id() {
            budgets::raise_to_floor(&tx, household_id, category_id, &month_of(as_of))?;
        }
        tx.commit()?;

        info!(template_id = id, household_id, name = %name, amount = %input.amount, "template created");
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::TemplateCreated,
            id,
            json!({ "name": name, "amount": input.amount, "category_id": kind.category_id() }),
        ));
        Ok(RecurringTemplate {
            id,
            household_id,
            name,
            amount: input.amount,
            day_of_month: input.day_of_month,
            auto_generate: input.auto_generate,
            active: true,
            created_by: actor,
            kind,
        })
    }

    /// Applies `patch`. Activating a template or raising its amount pushes the category's budget
    /// for the month of `as_of` up to the new floor; deactivating never lowers a budget.
    pub fn update_template(
        &self,
        conn: &mut Connection,
        actor: i64,
        template_id: i64,
        patch: TemplatePatch,
        as_of: NaiveDate,
    ) -> Result<RecurringTemplate> {
        let tx = begin(conn)?;
        let mut template = load_template(&tx, template_id)?.ok_or(not_found("template"))?;
        authorize(
            self.dir,
            &tx,
            actor,
            template.household_id,
            Action::Edit,
            Resource::Owned {
                entity: "template",
                created_by: template.created_by,
            },
        )?;

        if let Some(amount) = patch.amount {
            check_amount(amount)?;
            if let MovementKind::Split { participants, .. } = &template.kind {
                if amount != template.amount && has_exact_amounts(participants) {
                    return Err(LedgerError::validation(
                        "amount",
                        "split by exact amounts; recreate the template to change its total",
                    ));
                }
            }
            template.amount = amount;
        }
        if let Some(name) = patch.name {
            template.name = name;
        }
        if let Some(day) = patch.day_of_month {
            template.day_of_month = day;
        }
        template.name = check_template_fields(&template.name, template.day_of_month)?;
        if let Some(auto_generate) = patch.auto_generate {
            template.auto_generate = auto_generate;
        }
        if let Some(active) = patch.active {
            template.active = active;
        }

        tx.execute(
            "UPDATE recurring_templates SET name=?2, amount=?3, day_of_month=?4, auto_generate=?5,
             active=?6 WHERE id=?1",
            params![
                template_id,
                template.name,
                template.amount.to_string(),
                template.day_of_month,
                template.auto_generate,
                template.active,
            ],
        )?;
        if let Some(category_id) = template.kind.category_id().filter(|_| template.active) {
            budgets::raise_to_floor(&tx, template.household_id, category_id, &month_of(as_of))?;
        }
        tx.commit()?;

        info!(template_id, active = template.active, amount = %template.amount, "template updated");
        self.emit(AuditEvent::new(
            actor,
            template.household_id,
            AuditAction::TemplateUpdated,
            template_id,
            json!({ "amount": template.amount, "active": template.active }),
        ));
        Ok(template)
    }

    /// Budgets already raised by the template stay where they are.
    pub fn delete_template(&self, conn: &mut Connection, actor: i64, template_id: i64) -> Result<()> {
        let tx = begin(conn)?;
        let template = load_template(&tx, template_id)?.ok_or(not_found("template"))?;
        authorize(
            self.dir,
            &tx,
            actor,
            template.household_id,
            Action::Delete,
            Resource::Owned {
                entity: "template",
                created_by: template.created_by,
            },
        )?;
        tx.execute("DELETE FROM recurring_templates WHERE id=?1", params![template_id])?;
        tx.commit()?;

        info!(template_id, household_id = template.household_id, "template deleted");
        self.emit(AuditEvent::new(
            actor,
            template.household_id,
            AuditAction::TemplateDeleted,
            template_id,
            json!({ "name": template.name }),
        ));
        Ok(())
    }

    pub fn list_templates(
        &self,
        conn: &Connection,
        actor: i64,
        household_id: i64,
    ) -> Result<Vec<RecurringTemplate>> {
        authorize(self.dir, conn, actor, household_id, Action::Read, Resource::Household)?;
        templates_where(conn, "", household_id)
    }

    /// Creates this month's movement for every active auto-generating template that has none yet.
    /// Each template commits on its own; one that no longer validates is reported and skipped.
    pub fn generate_due(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        month: &str,
    ) -> Result<GenerationReport> {
        let month = parse_month(month)?;
        authorize(self.dir, conn, actor, household_id, Action::Create, Resource::Household)?;
        let due = templates_where(conn, "AND active=1 AND auto_generate=1", household_id)?;

        let mut report = GenerationReport {
            month: month.clone(),
            ..Default::default()
        };
        for template in due {
            let tx = begin(conn)?;
            let already: Option<i64> = tx
                .query_row(
                    "SELECT id FROM movements WHERE template_id=?1 AND substr(date,1,7)=?2 LIMIT 1",
                    params![template.id, month],
                    |r| r.get(0),
                )
                .optional()?;
            if already.is_some() {
                report.skipped.push(template.id);
                continue;
            }
            let input = instantiate(&template, &month)?;
            match self.insert_movement(&tx, template.created_by, household_id, &input, Some(template.id)) {
                Ok(movement) => {
                    tx.commit()?;
                    self.emit(AuditEvent::new(
                        actor,
                        household_id,
                        AuditAction::MovementCreated,
                        movement.id,
                        json!({ "type": movement.movement_type(), "amount": movement.amount, "template_id": template.id }),
                    ));
                    report.created.push(movement);
                }
                Err(e) if matches!(e, LedgerError::Storage(_)) => return Err(e),
                Err(e) => {
                    warn!(template_id = template.id, error = %e, "template not generated");
                    report.failed.push((template.id, e.to_string()));
                }
            }
        }
        info!(
            household_id,
            month = %month,
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "templates generated"
        );
        Ok(report)
    }
}
