// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Row mapping shared by movements and templates, which persist the same kind payload.

use crate::models::{
    Allocation, IncomeType, LoanDirection, MovementKind, MovementType, ParticipantRef, StoredKind,
};
use crate::utils::{decimal_col, opt_decimal_col};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

/// The flat column set a [`StoredKind`] is spread over.
#[derive(Debug, Default)]
pub(crate) struct KindColumns {
    pub category_id: Option<i64>,
    pub payer_user_id: Option<i64>,
    pub payer_contact_id: Option<i64>,
    pub counterparty_user_id: Option<i64>,
    pub counterparty_contact_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    pub account_id: Option<i64>,
    pub loan_direction: Option<LoanDirection>,
    pub income_type: Option<IncomeType>,
}

/// Column list matching [`KindColumns::read`], in order.
pub(crate) const KIND_COLUMNS: &str = "category_id, payer_user_id, payer_contact_id, \
     counterparty_user_id, counterparty_contact_id, payment_method_id, account_id, \
     loan_direction, income_type";

impl KindColumns {
    pub fn of(kind: &StoredKind) -> Self {
        let (payer_user_id, payer_contact_id) = kind.payer().columns();
        let mut cols = KindColumns {
            category_id: kind.category_id(),
            payer_user_id,
            payer_contact_id,
            payment_method_id: kind.payment_method_id(),
            account_id: kind.account_id(),
            ..Default::default()
        };
        match kind {
            MovementKind::Loan {
                direction,
                counterparty,
                ..
            } => {
                (cols.counterparty_user_id, cols.counterparty_contact_id) = counterparty.columns();
                cols.loan_direction = Some(*direction);
            }
            MovementKind::Income { income_type, .. } => cols.income_type = Some(*income_type),
            _ => {}
        }
        cols
    }

    /// Reads the nine kind columns starting at `start`.
    pub fn read(r: &Row<'_>, start: usize) -> rusqlite::Result<Self> {
        Ok(KindColumns {
            category_id: r.get(start)?,
            payer_user_id: r.get(start + 1)?,
            payer_contact_id: r.get(start + 2)?,
            counterparty_user_id: r.get(start + 3)?,
            counterparty_contact_id: r.get(start + 4)?,
            payment_method_id: r.get(start + 5)?,
            account_id: r.get(start + 6)?,
            loan_direction: r.get(start + 7)?,
            income_type: r.get(start + 8)?,
        })
    }

    pub fn into_kind(
        self,
        movement_type: MovementType,
        participants: Vec<Allocation>,
    ) -> rusqlite::Result<StoredKind> {
        let payer = ParticipantRef::from_columns(self.payer_user_id, self.payer_contact_id)
            .ok_or_else(|| corrupt("payer"))?;
        let kind = match movement_type {
            MovementType::Household => MovementKind::Household {
                payer: payer.member_id().ok_or_else(|| corrupt("payer_user_id"))?,
                category_id: self.category_id.ok_or_else(|| corrupt("category_id"))?,
                payment_method_id: self
                    .payment_method_id
                    .ok_or_else(|| corrupt("payment_method_id"))?,
            },
            MovementType::Split => MovementKind::Split {
                payer,
                category_id: self.category_id.ok_or_else(|| corrupt("category_id"))?,
                payment_method_id: self.payment_method_id,
                participants,
            },
            MovementType::Loan => MovementKind::Loan {
                direction: self.loan_direction.ok_or_else(|| corrupt("loan_direction"))?,
                payer,
                counterparty: ParticipantRef::from_columns(
                    self.counterparty_user_id,
                    self.counterparty_contact_id,
                )
                .ok_or_else(|| corrupt("counterparty"))?,
                payment_method_id: self.payment_method_id,
                receiver_account_id: self.account_id,
            },
            MovementType::Income => MovementKind::Income {
                member: payer.member_id().ok_or_else(|| corrupt("payer_user_id"))?,
                account_id: self.account_id.ok_or_else(|| corrupt("account_id"))?,
                income_type: self.income_type.ok_or_else(|| corrupt("income_type"))?,
            },
            MovementType::CreditCardPayment => return Err(corrupt("type")),
        };
        Ok(kind)
    }
}

fn corrupt(column: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        Type::Null,
        format!("stored row has no usable {}", column).into(),
    )
}

/// `table` is `movement_participants` or `template_participants`, keyed by `owner_col`.
pub(crate) fn write_participants(
    conn: &Connection,
    table: &str,
    owner_col: &str,
    owner_id: i64,
    allocations: &[Allocation],
) -> rusqlite::Result<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE {}=?1", table, owner_col),
        params![owner_id],
    )?;
    let mut stmt = conn.prepare_cached(&format!(
        "INSERT INTO {}({}, position, user_id, contact_id, percentage, amount)
         VALUES (?1,?2,?3,?4,?5,?6)",
        table, owner_col
    ))?;
    for (position, a) in allocations.iter().enumerate() {
        let (user_id, contact_id) = a.participant.columns();
        stmt.execute(params![
            owner_id,
            position as i64,
            user_id,
            contact_id,
            a.percentage.to_string(),
            a.amount.map(|d| d.to_string()),
        ])?;
    }
    Ok(())
}

pub(crate) fn read_participants(
    conn: &Connection,
    table: &str,
    owner_col: &str,
    owner_id: i64,
) -> rusqlite::Result<Vec<Allocation>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT user_id, contact_id, percentage, amount FROM {} WHERE {}=?1 ORDER BY position",
        table, owner_col
    ))?;
    let rows = stmt.query_map(params![owner_id], |r| {
        let participant = ParticipantRef::from_columns(r.get(0)?, r.get(1)?)
            .ok_or_else(|| corrupt("participant"))?;
        Ok(Allocation {
            participant,
            percentage: decimal_col(r, 2)?,
            amount: opt_decimal_col(r, 3)?,
        })
    })?;
    rows.collect()
}
