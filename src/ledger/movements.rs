// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::store::{KIND_COLUMNS, KindColumns, read_participants, write_participants};
use super::validate::{check_description, validate_kind};
use super::{Ledger, begin, budgets};
use crate::audit::{AuditAction, AuditEvent};
use crate::authz::{Action, Resource, authorize};
use crate::error::{LedgerError, Result, not_found};
use crate::identity::canonical_of;
use crate::models::{
    Movement, MovementFilter, MovementKind, MovementList, MovementType, NewMovement,
    ParticipantRef,
};
use crate::utils::{decimal_col, month_of};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info};

fn select_sql() -> String {
    format!(
        "SELECT id, household_id, type, amount, date, description, created_by, template_id, {}
         FROM movements",
        KIND_COLUMNS
    )
}

/// A movement row before its participants are attached.
struct MovementRow {
    id: i64,
    household_id: i64,
    movement_type: MovementType,
    amount: Decimal,
    date: NaiveDate,
    description: String,
    created_by: i64,
    template_id: Option<i64>,
    cols: KindColumns,
}

fn movement_row(r: &Row<'_>) -> rusqlite::Result<MovementRow> {
    Ok(MovementRow {
        id: r.get(0)?,
        household_id: r.get(1)?,
        movement_type: r.get(2)?,
        amount: decimal_col(r, 3)?,
        date: r.get(4)?,
        description: r.get(5)?,
        created_by: r.get(6)?,
        template_id: r.get(7)?,
        cols: KindColumns::read(r, 8)?,
    })
}

impl MovementRow {
    fn into_movement(self, conn: &Connection) -> Result<Movement> {
        let participants = if self.movement_type == MovementType::Split {
            read_participants(conn, "movement_participants", "movement_id", self.id)?
        } else {
            Vec::new()
        };
        Ok(Movement {
            id: self.id,
            household_id: self.household_id,
            date: self.date,
            amount: self.amount,
            description: self.description,
            created_by: self.created_by,
            template_id: self.template_id,
            kind: self.cols.into_kind(self.movement_type, participants)?,
        })
    }
}

pub(crate) fn load_movement(conn: &Connection, movement_id: i64) -> Result<Option<Movement>> {
    let row = conn
        .query_row(
            &format!("{} WHERE id=?1", select_sql()),
            params![movement_id],
            movement_row,
        )
        .optional()?;
    row.map(|r| r.into_movement(conn)).transpose()
}

/// Whether `who` is the payer or holds a share of the split, comparing canonical identities.
fn has_stake(
    ledger: &Ledger<'_>,
    conn: &Connection,
    movement: &Movement,
    who: ParticipantRef,
) -> Result<bool> {
    if canonical_of(ledger.dir, conn, movement.kind.payer())? == who {
        return Ok(true);
    }
    for a in movement.participants() {
        if canonical_of(ledger.dir, conn, a.participant)? == who {
            return Ok(true);
        }
    }
    Ok(false)
}

impl Ledger<'_> {
    /// Validates and inserts one movement on an open transaction. Raises the category's budget to
    /// its template floor for the movement's month. No audit.
    pub(crate) fn insert_movement(
        &self,
        conn: &Connection,
        actor: i64,
        household_id: i64,
        input: &NewMovement,
        template_id: Option<i64>,
    ) -> Result<Movement> {
        let description = check_description(&input.description)?;
        let kind = validate_kind(self.dir, conn, household_id, input.amount, &input.kind)?;
        let cols = KindColumns::of(&kind);
        conn.execute(
            &format!(
                "INSERT INTO movements(household_id, type, amount, date, description, template_id,
                 created_by, {})
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
                KIND_COLUMNS
            ),
            params![
                household_id,
                kind.movement_type(),
                input.amount.to_string(),
                input.date,
                description,
                template_id,
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
        let id = conn.last_insert_rowid();
        if let MovementKind::Split { participants, .. } = &kind {
            write_participants(conn, "movement_participants", "movement_id", id, participants)?;
        }
        if let Some(category_id) = kind.category_id() {
            budgets::raise_to_floor(conn, household_id, category_id, &month_of(input.date))?;
        }
        Ok(Movement {
            id,
            household_id,
            date: input.date,
            amount: input.amount,
            description,
            created_by: actor,
            template_id,
            kind,
        })
    }

    pub fn create_movement(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        input: NewMovement,
    ) -> Result<Movement> {
        let tx = begin(conn)?;
        authorize(self.dir, &tx, actor, household_id, Action::Create, Resource::Household)?;
        let movement = self.insert_movement(&tx, actor, household_id, &input, None)?;
        tx.commit()?;

        info!(
            movement_id = movement.id,
            household_id,
            r#type = %movement.movement_type(),
            amount = %movement.amount,
            "movement created"
        );
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::MovementCreated,
            movement.id,
            json!({ "type": movement.movement_type(), "amount": movement.amount }),
        ));
        Ok(movement)
    }

    /// Replaces a movement's values. The type is fixed at creation.
    pub fn update_movement(
        &self,
        conn: &mut Connection,
        actor: i64,
        movement_id: i64,
        input: NewMovement,
    ) -> Result<Movement> {
        let tx = begin(conn)?;
        let existing = load_movement(&tx, movement_id)?.ok_or(not_found("movement"))?;
        let household_id = existing.household_id;
        authorize(
            self.dir,
            &tx,
            actor,
            household_id,
            Action::Edit,
            Resource::Owned {
                entity: "movement",
                created_by: existing.created_by,
            },
        )?;
        let new_type = input.kind.movement_type();
        if new_type != existing.movement_type() {
            return Err(LedgerError::validation(
                "type",
                format!(
                    "a {} movement cannot become {}; delete it and create a new one",
                    existing.movement_type(),
                    new_type
                ),
            ));
        }

        let description = check_description(&input.description)?;
        let kind = validate_kind(self.dir, &tx, household_id, input.amount, &input.kind)?;
        let cols = KindColumns::of(&kind);
        tx.execute(
            "UPDATE movements SET amount=?2, date=?3, description=?4, category_id=?5,
                payer_user_id=?6, payer_contact_id=?7, counterparty_user_id=?8,
                counterparty_contact_id=?9, payment_method_id=?10, account_id=?11,
                loan_direction=?12, income_type=?13, updated_at=datetime('now')
             WHERE id=?1",
            params![
                movement_id,
                input.amount.to_string(),
                input.date,
                description,
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
        if let MovementKind::Split { participants, .. } = &kind {
            write_participants(&tx, "movement_participants", "movement_id", movement_id, participants)?;
        }
        if let Some(category_id) = kind.category_id() {
            budgets::raise_to_floor(&tx, household_id, category_id, &month_of(input.date))?;
        }
        tx.commit()?;

        let movement = Movement {
            id: movement_id,
            household_id,
            date: input.date,
            amount: input.amount,
            description,
            created_by: existing.created_by,
            template_id: existing.template_id,
            kind,
        };
        info!(movement_id, household_id, amount = %movement.amount, "movement updated");
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::MovementUpdated,
            movement_id,
            json!({ "from": existing.amount, "to": movement.amount }),
        ));
        Ok(movement)
    }

    /// Removes a movement and its participants. Balances are derived, so nothing else moves;
    /// budgets are never lowered.
    pub fn delete_movement(&self, conn: &mut Connection, actor: i64, movement_id: i64) -> Result<()> {
        let tx = begin(conn)?;
        let existing = load_movement(&tx, movement_id)?.ok_or(not_found("movement"))?;
        authorize(
            self.dir,
            &tx,
            actor,
            existing.household_id,
            Action::Delete,
            Resource::Owned {
                entity: "movement",
                created_by: existing.created_by,
            },
        )?;
        tx.execute("DELETE FROM movements WHERE id=?1", params![movement_id])?;
        tx.commit()?;

        info!(movement_id, household_id = existing.household_id, "movement deleted");
        self.emit(AuditEvent::new(
            actor,
            existing.household_id,
            AuditAction::MovementDeleted,
            movement_id,
            json!({ "type": existing.movement_type(), "amount": existing.amount }),
        ));
        Ok(())
    }

    pub fn get_movement(&self, conn: &Connection, actor: i64, movement_id: i64) -> Result<Movement> {
        let movement = load_movement(conn, movement_id)?.ok_or(not_found("movement"))?;
        authorize(
            self.dir,
            conn,
            actor,
            movement.household_id,
            Action::Read,
            Resource::Owned {
                entity: "movement",
                created_by: movement.created_by,
            },
        )?;
        if movement.movement_type() == MovementType::Split
            && !has_stake(self, conn, &movement, ParticipantRef::Member(actor))?
        {
            debug!(movement_id, actor, "split hidden: no stake");
            return Err(not_found("movement"));
        }
        Ok(movement)
    }

    /// Loads a movement the actor may edit: its creator or a household owner, stake or not.
    pub fn movement_for_edit(&self, conn: &Connection, actor: i64, movement_id: i64) -> Result<Movement> {
        let movement = load_movement(conn, movement_id)?.ok_or(not_found("movement"))?;
        authorize(
            self.dir,
            conn,
            actor,
            movement.household_id,
            Action::Edit,
            Resource::Owned {
                entity: "movement",
                created_by: movement.created_by,
            },
        )?;
        Ok(movement)
    }

    /// The actor's settled share of a split. Shares held through a linked contact count.
    pub fn my_share(&self, conn: &Connection, movement: &Movement, actor: i64) -> Result<Option<Decimal>> {
        let me = ParticipantRef::Member(actor);
        for (participant, amount) in crate::split::settle(movement.amount, movement.participants()) {
            if canonical_of(self.dir, conn, participant)? == me {
                return Ok(Some(amount));
            }
        }
        Ok(None)
    }

    /// The actor's view of a household's movements, newest first, with their total.
    ///
    /// SPLIT movements only show up for their payer and participants.
    pub fn list_movements(
        &self,
        conn: &Connection,
        actor: i64,
        household_id: i64,
        filter: &MovementFilter,
    ) -> Result<MovementList> {
        authorize(self.dir, conn, actor, household_id, Action::Read, Resource::Household)?;

        let mut sql = format!("{} WHERE household_id=?", select_sql());
        let mut args: Vec<Value> = vec![Value::Integer(household_id)];
        if let Some(category_id) = filter.category_id {
            sql.push_str(" AND category_id=?");
            args.push(Value::Integer(category_id));
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND date>=?");
            args.push(Value::Text(from.to_string()));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND date<=?");
            args.push(Value::Text(to.to_string()));
        }
        match filter.payer {
            Some(ParticipantRef::Member(id)) => {
                sql.push_str(
                    " AND (payer_user_id=? OR payer_contact_id IN
                        (SELECT id FROM contacts WHERE linked_user_id=?))",
                );
                args.push(Value::Integer(id));
                args.push(Value::Integer(id));
            }
            Some(ParticipantRef::Contact(id)) => {
                sql.push_str(" AND payer_contact_id=?");
                args.push(Value::Integer(id));
            }
            None => {}
        }
        if let Some(t) = filter.movement_type {
            sql.push_str(" AND type=?");
            args.push(Value::Text(t.as_str().to_string()));
        }
        sql.push_str(" ORDER BY date DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args), movement_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let me = ParticipantRef::Member(actor);
        let mut items = Vec::with_capacity(rows.len());
        let mut total = Decimal::ZERO;
        for row in rows {
            let movement = row.into_movement(conn)?;
            if movement.movement_type() == MovementType::Split
                && !has_stake(self, conn, &movement, me)?
            {
                debug!(movement_id = movement.id, actor, "split hidden: no stake");
                continue;
            }
            total += movement.amount;
            items.push(movement);
        }
        Ok(MovementList { items, total })
    }
}
