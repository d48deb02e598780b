// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Payments against a credit card, funded from a savings account.

use super::validate::check_amount;
use super::{Ledger, begin};
use crate::audit::{AuditAction, AuditEvent};
use crate::authz::{Action, Resource, authorize};
use crate::error::{LedgerError, Result, forbidden, not_found};
use crate::models::{AccountType, CreditCardPayment, NewCreditCardPayment, PaymentMethodType};
use crate::utils::decimal_col;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::json;
use tracing::{debug, info};

const SELECT: &str = "SELECT id, household_id, credit_card_id, source_account_id, amount, date,
     notes, created_by FROM credit_card_payments";

fn payment_row(r: &Row<'_>) -> rusqlite::Result<CreditCardPayment> {
    Ok(CreditCardPayment {
        id: r.get(0)?,
        household_id: r.get(1)?,
        credit_card_id: r.get(2)?,
        source_account_id: r.get(3)?,
        amount: decimal_col(r, 4)?,
        date: r.get(5)?,
        notes: r.get(6)?,
        created_by: r.get(7)?,
    })
}

impl Ledger<'_> {
    /// Checks run in a fixed order and the first failure wins: amount, card existence, card type,
    /// card household, then the source account.
    pub fn create_credit_card_payment(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        input: NewCreditCardPayment,
    ) -> Result<CreditCardPayment> {
        check_amount(input.amount)?;
        let tx = begin(conn)?;

        let card = self
            .dir
            .payment_method(&tx, input.credit_card_id)?
            .ok_or(LedgerError::CreditCardNotFound)?;
        if card.r#type != PaymentMethodType::Credit {
            return Err(LedgerError::NotACreditCard);
        }
        let member = self.dir.member_role(&tx, household_id, actor)?.is_some();
        if !member || card.household_id != household_id {
            debug!(actor, card = card.id, card_household = card.household_id, "card outside household");
            return Err(forbidden("credit card"));
        }
        let source = self
            .dir
            .account(&tx, input.source_account_id)?
            .filter(|a| a.r#type == AccountType::Savings)
            .ok_or(LedgerError::SourceMustBeSavings)?;
        if source.household_id != household_id {
            return Err(forbidden("account"));
        }

        let notes = input
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        tx.execute(
            "INSERT INTO credit_card_payments(household_id, credit_card_id, source_account_id,
             amount, date, notes, created_by) VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                household_id,
                card.id,
                source.id,
                input.amount.to_string(),
                input.date,
                notes,
                actor,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(payment_id = id, household_id, card = card.id, amount = %input.amount, "credit card payment recorded");
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::CreditCardPaymentCreated,
            id,
            json!({ "credit_card_id": card.id, "source_account_id": source.id, "amount": input.amount }),
        ));
        Ok(CreditCardPayment {
            id,
            household_id,
            credit_card_id: card.id,
            source_account_id: source.id,
            amount: input.amount,
            date: input.date,
            notes,
            created_by: actor,
        })
    }

    /// Creator or household owner only. The source account's balance is derived, so removing the
    /// record is all there is to undo.
    pub fn delete_credit_card_payment(&self, conn: &mut Connection, actor: i64, payment_id: i64) -> Result<()> {
        let tx = begin(conn)?;
        let payment = tx
            .query_row(&format!("{} WHERE id=?1", SELECT), params![payment_id], payment_row)
            .optional()?
            .ok_or(not_found("credit card payment"))?;
        authorize(
            self.dir,
            &tx,
            actor,
            payment.household_id,
            Action::Delete,
            Resource::Owned {
                entity: "credit card payment",
                created_by: payment.created_by,
            },
        )?;
        tx.execute("DELETE FROM credit_card_payments WHERE id=?1", params![payment_id])?;
        tx.commit()?;

        info!(payment_id, household_id = payment.household_id, "credit card payment deleted");
        self.emit(AuditEvent::new(
            actor,
            payment.household_id,
            AuditAction::CreditCardPaymentDeleted,
            payment_id,
            json!({ "credit_card_id": payment.credit_card_id, "amount": payment.amount }),
        ));
        Ok(())
    }

    /// Newest first.
    pub fn list_credit_card_payments(
        &self,
        conn: &Connection,
        actor: i64,
        household_id: i64,
    ) -> Result<Vec<CreditCardPayment>> {
        authorize(self.dir, conn, actor, household_id, Action::Read, Resource::Household)?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE household_id=?1 ORDER BY date DESC, id DESC",
            SELECT
        ))?;
        let rows = stmt.query_map(params![household_id], payment_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
