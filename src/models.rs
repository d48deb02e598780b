// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a fieldless enum persisted as a fixed TEXT token.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $(t if t.eq_ignore_ascii_case($text) => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    )),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: String| FromSqlError::Other(e.into()))
            }
        }
    };
}

text_enum!(Role {
    Owner => "owner",
    Member => "member",
});

text_enum!(AccountType {
    Savings => "savings",
    Checking => "checking",
    Cash => "cash",
    Other => "other",
});

text_enum!(PaymentMethodType {
    Cash => "cash",
    Debit => "debit",
    Credit => "credit",
    Other => "other",
});

text_enum!(MovementType {
    Household => "HOUSEHOLD",
    Split => "SPLIT",
    Loan => "LOAN",
    Income => "INCOME",
    CreditCardPayment => "CREDIT_CARD_PAYMENT",
});

text_enum!(LoanDirection {
    Lend => "LEND",
    Repay => "REPAY",
});

text_enum!(
    /// Reporting subtag of an income; it never changes validation.
    IncomeType {
        Salary => "salary",
        Bonus => "bonus",
        Reimbursement => "reimbursement",
        Gift => "gift",
        SavingsWithdrawal => "savings_withdrawal",
        OtherIncome => "other_income",
    }
);

/// Who a movement refers to: a registered household member (by user id) or a household contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRef {
    Member(i64),
    Contact(i64),
}

impl ParticipantRef {
    pub fn member_id(&self) -> Option<i64> {
        match self {
            ParticipantRef::Member(id) => Some(*id),
            ParticipantRef::Contact(_) => None,
        }
    }

    pub fn contact_id(&self) -> Option<i64> {
        match self {
            ParticipantRef::Member(_) => None,
            ParticipantRef::Contact(id) => Some(*id),
        }
    }

    /// Splits into the `(user_id, contact_id)` column pair used by the schema.
    pub fn columns(&self) -> (Option<i64>, Option<i64>) {
        (self.member_id(), self.contact_id())
    }

    pub fn from_columns(user_id: Option<i64>, contact_id: Option<i64>) -> Option<Self> {
        match (user_id, contact_id) {
            (Some(id), None) => Some(ParticipantRef::Member(id)),
            (None, Some(id)) => Some(ParticipantRef::Contact(id)),
            _ => None,
        }
    }
}

impl fmt::Display for ParticipantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParticipantRef::Member(id) => write!(f, "member:{}", id),
            ParticipantRef::Contact(id) => write!(f, "contact:{}", id),
        }
    }
}

impl FromStr for ParticipantRef {
    type Err = String;

    /// Accepts `member:ID`, `m:ID`, `contact:ID` or `c:ID`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("Invalid participant '{}', expected member:ID or contact:ID", s))?;
        let id: i64 = id
            .trim()
            .parse()
            .map_err(|_| format!("Invalid participant id in '{}'", s))?;
        match kind.trim().to_ascii_lowercase().as_str() {
            "member" | "m" => Ok(ParticipantRef::Member(id)),
            "contact" | "c" => Ok(ParticipantRef::Contact(id)),
            _ => Err(format!(
                "Invalid participant '{}', expected member:ID or contact:ID",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub household_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: bool,
    /// Set once the contact has been matched to a registered user by email.
    pub linked_user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub household_id: i64,
    pub owner_id: i64,
    pub name: String,
    pub r#type: AccountType,
    pub initial_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub household_id: i64,
    pub owner_id: i64,
    pub name: String,
    pub r#type: PaymentMethodType,
    pub shared_with_household: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub household_id: i64,
    pub group_id: Option<i64>,
    pub name: String,
    pub active: bool,
}

/// One participant's stake in a split: always a percentage (fraction of 1), plus the amount that
/// was typed in when the split was entered by exact amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub participant: ParticipantRef,
    pub percentage: Decimal,
    pub amount: Option<Decimal>,
}

/// How a split total is divided, chosen per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weights {
    Equitable,
    Percentages(Vec<Decimal>),
    Amounts(Vec<Decimal>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitInput {
    pub participants: Vec<ParticipantRef>,
    pub weights: Weights,
}

/// The per-type payload of a movement. `S` is the split representation: a [`SplitInput`] on the
/// way in, the finalized `Vec<Allocation>` once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind<S = SplitInput> {
    Household {
        payer: i64,
        category_id: i64,
        payment_method_id: i64,
    },
    Split {
        payer: ParticipantRef,
        category_id: i64,
        payment_method_id: Option<i64>,
        participants: S,
    },
    Loan {
        direction: LoanDirection,
        payer: ParticipantRef,
        counterparty: ParticipantRef,
        payment_method_id: Option<i64>,
        receiver_account_id: Option<i64>,
    },
    Income {
        member: i64,
        account_id: i64,
        income_type: IncomeType,
    },
}

pub type StoredKind = MovementKind<Vec<Allocation>>;

impl SplitInput {
    /// The input that allocates to `allocations` again: exact amounts when they were entered,
    /// percentages otherwise.
    pub fn from_allocations(allocations: &[Allocation]) -> Self {
        let participants = allocations.iter().map(|a| a.participant).collect();
        let weights = if allocations.iter().any(|a| a.amount.is_some()) {
            Weights::Amounts(allocations.iter().map(|a| a.amount.unwrap_or_default()).collect())
        } else {
            Weights::Percentages(allocations.iter().map(|a| a.percentage).collect())
        };
        SplitInput {
            participants,
            weights,
        }
    }
}

impl StoredKind {
    /// Back to input form, for edits and template instantiation.
    pub fn to_input(&self) -> MovementKind {
        match self {
            MovementKind::Household {
                payer,
                category_id,
                payment_method_id,
            } => MovementKind::Household {
                payer: *payer,
                category_id: *category_id,
                payment_method_id: *payment_method_id,
            },
            MovementKind::Split {
                payer,
                category_id,
                payment_method_id,
                participants,
            } => MovementKind::Split {
                payer: *payer,
                category_id: *category_id,
                payment_method_id: *payment_method_id,
                participants: SplitInput::from_allocations(participants),
            },
            MovementKind::Loan {
                direction,
                payer,
                counterparty,
                payment_method_id,
                receiver_account_id,
            } => MovementKind::Loan {
                direction: *direction,
                payer: *payer,
                counterparty: *counterparty,
                payment_method_id: *payment_method_id,
                receiver_account_id: *receiver_account_id,
            },
            MovementKind::Income {
                member,
                account_id,
                income_type,
            } => MovementKind::Income {
                member: *member,
                account_id: *account_id,
                income_type: *income_type,
            },
        }
    }
}

impl<S> MovementKind<S> {
    pub fn movement_type(&self) -> MovementType {
        match self {
            MovementKind::Household { .. } => MovementType::Household,
            MovementKind::Split { .. } => MovementType::Split,
            MovementKind::Loan { .. } => MovementType::Loan,
            MovementKind::Income { .. } => MovementType::Income,
        }
    }

    pub fn category_id(&self) -> Option<i64> {
        match self {
            MovementKind::Household { category_id, .. }
            | MovementKind::Split { category_id, .. } => Some(*category_id),
            MovementKind::Loan { .. } | MovementKind::Income { .. } => None,
        }
    }

    pub fn payer(&self) -> ParticipantRef {
        match self {
            MovementKind::Household { payer, .. } => ParticipantRef::Member(*payer),
            MovementKind::Split { payer, .. } | MovementKind::Loan { payer, .. } => *payer,
            MovementKind::Income { member, .. } => ParticipantRef::Member(*member),
        }
    }

    pub fn payment_method_id(&self) -> Option<i64> {
        match self {
            MovementKind::Household {
                payment_method_id, ..
            } => Some(*payment_method_id),
            MovementKind::Split {
                payment_method_id, ..
            }
            | MovementKind::Loan {
                payment_method_id, ..
            } => *payment_method_id,
            MovementKind::Income { .. } => None,
        }
    }

    /// The account money lands in: the income destination or the loan receiver account.
    pub fn account_id(&self) -> Option<i64> {
        match self {
            MovementKind::Loan {
                receiver_account_id,
                ..
            } => *receiver_account_id,
            MovementKind::Income { account_id, .. } => Some(*account_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovement {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub kind: MovementKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub household_id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub created_by: i64,
    pub template_id: Option<i64>,
    pub kind: StoredKind,
}

impl Movement {
    pub fn movement_type(&self) -> MovementType {
        self.kind.movement_type()
    }

    pub fn participants(&self) -> &[Allocation] {
        match &self.kind {
            MovementKind::Split { participants, .. } => participants,
            _ => &[],
        }
    }

    /// The settled amount owed by the exact participant `who` on a split, `None` when they hold
    /// no share. `Ledger::my_share` also follows linked contacts.
    pub fn share_of(&self, who: ParticipantRef) -> Option<Decimal> {
        crate::split::settle(self.amount, self.participants())
            .into_iter()
            .find(|(p, _)| *p == who)
            .map(|(_, amount)| amount)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub category_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub payer: Option<ParticipantRef>,
    pub movement_type: Option<MovementType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MovementList {
    pub items: Vec<Movement>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub amount: Decimal,
    pub day_of_month: u32,
    pub auto_generate: bool,
    pub kind: MovementKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub id: i64,
    pub household_id: i64,
    pub name: String,
    pub amount: Decimal,
    pub day_of_month: u32,
    pub auto_generate: bool,
    pub active: bool,
    pub created_by: i64,
    pub kind: StoredKind,
}

/// Partial update of a template; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub day_of_month: Option<u32>,
    pub auto_generate: Option<bool>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub household_id: i64,
    pub category_id: i64,
    pub month: String, // YYYY-MM
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCreditCardPayment {
    pub credit_card_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub source_account_id: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditCardPayment {
    pub id: i64,
    pub household_id: i64,
    pub credit_card_id: i64,
    pub source_account_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_by: i64,
}
