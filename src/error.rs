// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error taxonomy of the ledger core.
//!
//! `NotFound` and `NotAuthorized` render the same message for the same entity; only
//! [`LedgerError::kind`] tells them apart.

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    #[error("participant percentages must sum to 100%, got {}%", as_percent(.actual))]
    PercentageSumInvalid { actual: Decimal },

    #[error("participant amounts must sum to {expected}, got {actual}")]
    AmountSumInvalid { expected: Decimal, actual: Decimal },

    #[error("payer and counterparty must be different people")]
    SamePartyInvalid,

    #[error("{entity} not found or not accessible")]
    NotFound { entity: &'static str },

    #[error("{entity} not found or not accessible")]
    NotAuthorized { entity: &'static str },

    #[error("credit card not found")]
    CreditCardNotFound,

    #[error("payment method is not a credit card")]
    NotACreditCard,

    #[error("source account must be a savings account")]
    SourceMustBeSavings,

    #[error("budget {requested} is below the recurring template total {floor}")]
    BudgetBelowTemplates { floor: Decimal, requested: Decimal },

    #[error("{0}")]
    InvalidState(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl LedgerError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable snake_case identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Validation { .. } => "validation_error",
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::PercentageSumInvalid { .. } => "percentage_sum_invalid",
            LedgerError::AmountSumInvalid { .. } => "amount_sum_invalid",
            LedgerError::SamePartyInvalid => "same_party_invalid",
            LedgerError::NotFound { .. } => "not_found",
            LedgerError::NotAuthorized { .. } => "not_authorized",
            LedgerError::CreditCardNotFound => "credit_card_not_found",
            LedgerError::NotACreditCard => "not_a_credit_card",
            LedgerError::SourceMustBeSavings => "source_must_be_savings",
            LedgerError::BudgetBelowTemplates { .. } => "budget_below_templates",
            LedgerError::InvalidState(_) => "invalid_state",
            LedgerError::Storage(_) => "storage",
        }
    }

    /// The input field a form should highlight, when the error is tied to one.
    pub fn field(&self) -> Option<&str> {
        match self {
            LedgerError::Validation { field, .. } => Some(field),
            LedgerError::InvalidAmount(_)
            | LedgerError::AmountSumInvalid { .. }
            | LedgerError::BudgetBelowTemplates { .. } => Some("amount"),
            LedgerError::PercentageSumInvalid { .. } => Some("participants"),
            LedgerError::SamePartyInvalid => Some("counterparty"),
            LedgerError::CreditCardNotFound | LedgerError::NotACreditCard => {
                Some("credit_card_id")
            }
            LedgerError::SourceMustBeSavings => Some("source_account_id"),
            _ => None,
        }
    }
}

fn as_percent(fraction: &Decimal) -> Decimal {
    *fraction * Decimal::ONE_HUNDRED
}

pub(crate) fn not_found(entity: &'static str) -> LedgerError {
    LedgerError::NotFound { entity }
}

pub(crate) fn forbidden(entity: &'static str) -> LedgerError {
    LedgerError::NotAuthorized { entity }
}
