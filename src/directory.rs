// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Lookups the ledger needs from the household, contact, account and payment-method stores.
//!
//! Each method is handed the connection of the unit of work in progress (usually an open
//! transaction), so reads made while validating a write see the same snapshot the write commits
//! against. Test doubles are free to ignore it.

use crate::error::Result;
use crate::models::{
    Account, AccountType, Category, Contact, PaymentMethod, PaymentMethodType, Role, User,
};
use crate::utils::decimal_col;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

pub trait HouseholdDirectory {
    fn user(&self, conn: &Connection, user_id: i64) -> Result<Option<User>>;

    /// The household a user acts in by default (the first one they joined).
    fn user_household_id(&self, conn: &Connection, user_id: i64) -> Result<Option<i64>>;

    /// `None` when the user is not a member of the household.
    fn member_role(&self, conn: &Connection, household_id: i64, user_id: i64)
    -> Result<Option<Role>>;

    fn count_owners(&self, conn: &Connection, household_id: i64) -> Result<i64>;

    fn add_member(&self, conn: &Connection, household_id: i64, user_id: i64, role: Role)
    -> Result<()>;

    fn set_member_role(
        &self,
        conn: &Connection,
        household_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<()>;

    fn remove_member(&self, conn: &Connection, household_id: i64, user_id: i64) -> Result<()>;
}

pub trait ContactDirectory {
    fn contact(&self, conn: &Connection, contact_id: i64) -> Result<Option<Contact>>;

    /// Unlinked contacts come first.
    fn find_contact_by_email(
        &self,
        conn: &Connection,
        household_id: i64,
        email: &str,
    ) -> Result<Option<Contact>>;

    fn link_contact(&self, conn: &Connection, contact_id: i64, user_id: i64) -> Result<()>;
}

pub trait AccountLookup {
    fn account(&self, conn: &Connection, account_id: i64) -> Result<Option<Account>>;

    /// Derived balance; `None` when the account does not exist.
    fn balance(&self, conn: &Connection, account_id: i64) -> Result<Option<Decimal>>;
}

pub trait PaymentMethodLookup {
    fn payment_method(&self, conn: &Connection, id: i64) -> Result<Option<PaymentMethod>>;

    fn payment_method_household(&self, conn: &Connection, id: i64) -> Result<Option<i64>>;

    fn payment_method_name_exists(&self, conn: &Connection, owner_id: i64, name: &str)
    -> Result<bool>;
}

pub trait CategoryLookup {
    fn category(&self, conn: &Connection, category_id: i64) -> Result<Option<Category>>;
}

/// Everything the ledger resolves identities and ownership through.
pub trait Directory:
    HouseholdDirectory + ContactDirectory + AccountLookup + PaymentMethodLookup + CategoryLookup
{
}

impl<T> Directory for T where
    T: HouseholdDirectory + ContactDirectory + AccountLookup + PaymentMethodLookup + CategoryLookup
{
}

/// Directory backed by the ledger's own SQLite tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDirectory;

impl HouseholdDirectory for SqliteDirectory {
    fn user(&self, conn: &Connection, user_id: i64) -> Result<Option<User>> {
        Ok(conn
            .query_row(
                "SELECT id, name, email FROM users WHERE id=?1",
                params![user_id],
                |r| {
                    Ok(User {
                        id: r.get(0)?,
                        name: r.get(1)?,
                        email: r.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    fn user_household_id(&self, conn: &Connection, user_id: i64) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT household_id FROM household_members WHERE user_id=?1
                 ORDER BY joined_at, household_id LIMIT 1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn member_role(
        &self,
        conn: &Connection,
        household_id: i64,
        user_id: i64,
    ) -> Result<Option<Role>> {
        Ok(conn
            .query_row(
                "SELECT role FROM household_members WHERE household_id=?1 AND user_id=?2",
                params![household_id, user_id],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn count_owners(&self, conn: &Connection, household_id: i64) -> Result<i64> {
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM household_members WHERE household_id=?1 AND role='owner'",
            params![household_id],
            |r| r.get(0),
        )?)
    }

    fn add_member(
        &self,
        conn: &Connection,
        household_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO household_members(household_id, user_id, role) VALUES (?1,?2,?3)",
            params![household_id, user_id, role],
        )?;
        Ok(())
    }

    fn set_member_role(
        &self,
        conn: &Connection,
        household_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<()> {
        conn.execute(
            "UPDATE household_members SET role=?3 WHERE household_id=?1 AND user_id=?2",
            params![household_id, user_id, role],
        )?;
        Ok(())
    }

    fn remove_member(&self, conn: &Connection, household_id: i64, user_id: i64) -> Result<()> {
        conn.execute(
            "DELETE FROM household_members WHERE household_id=?1 AND user_id=?2",
            params![household_id, user_id],
        )?;
        Ok(())
    }
}

const CONTACT_COLUMNS: &str = "id, household_id, name, email, phone, active, linked_user_id";

fn contact_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: r.get(0)?,
        household_id: r.get(1)?,
        name: r.get(2)?,
        email: r.get(3)?,
        phone: r.get(4)?,
        active: r.get(5)?,
        linked_user_id: r.get(6)?,
    })
}

impl ContactDirectory for SqliteDirectory {
    fn contact(&self, conn: &Connection, contact_id: i64) -> Result<Option<Contact>> {
        Ok(conn
            .query_row(
                &format!("SELECT {} FROM contacts WHERE id=?1", CONTACT_COLUMNS),
                params![contact_id],
                contact_row,
            )
            .optional()?)
    }

    fn find_contact_by_email(
        &self,
        conn: &Connection,
        household_id: i64,
        email: &str,
    ) -> Result<Option<Contact>> {
        Ok(conn
            .query_row(
                &format!(
                    "SELECT {} FROM contacts WHERE household_id=?1 AND lower(email)=lower(?2)
                     ORDER BY linked_user_id IS NOT NULL, id LIMIT 1",
                    CONTACT_COLUMNS
                ),
                params![household_id, email.trim()],
                contact_row,
            )
            .optional()?)
    }

    fn link_contact(&self, conn: &Connection, contact_id: i64, user_id: i64) -> Result<()> {
        conn.execute(
            "UPDATE contacts SET linked_user_id=?2 WHERE id=?1",
            params![contact_id, user_id],
        )?;
        Ok(())
    }
}

impl AccountLookup for SqliteDirectory {
    fn account(&self, conn: &Connection, account_id: i64) -> Result<Option<Account>> {
        Ok(conn
            .query_row(
                "SELECT id, household_id, owner_id, name, type, initial_balance
                 FROM accounts WHERE id=?1",
                params![account_id],
                |r| {
                    Ok(Account {
                        id: r.get(0)?,
                        household_id: r.get(1)?,
                        owner_id: r.get(2)?,
                        name: r.get(3)?,
                        r#type: r.get::<_, AccountType>(4)?,
                        initial_balance: decimal_col(r, 5)?,
                    })
                },
            )
            .optional()?)
    }

    fn balance(&self, conn: &Connection, account_id: i64) -> Result<Option<Decimal>> {
        let Some(account) = self.account(conn, account_id)? else {
            return Ok(None);
        };
        let mut balance = account.initial_balance;

        // Income and loans received land in the account.
        let mut stmt = conn.prepare_cached(
            "SELECT amount FROM movements WHERE account_id=?1 AND type IN ('INCOME','LOAN')",
        )?;
        let mut rows = stmt.query(params![account_id])?;
        while let Some(r) = rows.next()? {
            balance += decimal_col(r, 0)?;
        }

        let mut stmt = conn
            .prepare_cached("SELECT amount FROM credit_card_payments WHERE source_account_id=?1")?;
        let mut rows = stmt.query(params![account_id])?;
        while let Some(r) = rows.next()? {
            balance -= decimal_col(r, 0)?;
        }
        Ok(Some(balance))
    }
}

impl PaymentMethodLookup for SqliteDirectory {
    fn payment_method(&self, conn: &Connection, id: i64) -> Result<Option<PaymentMethod>> {
        Ok(conn
            .query_row(
                "SELECT id, household_id, owner_id, name, type, shared_with_household, active
                 FROM payment_methods WHERE id=?1",
                params![id],
                |r| {
                    Ok(PaymentMethod {
                        id: r.get(0)?,
                        household_id: r.get(1)?,
                        owner_id: r.get(2)?,
                        name: r.get(3)?,
                        r#type: r.get::<_, PaymentMethodType>(4)?,
                        shared_with_household: r.get(5)?,
                        active: r.get(6)?,
                    })
                },
            )
            .optional()?)
    }

    fn payment_method_household(&self, conn: &Connection, id: i64) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT household_id FROM payment_methods WHERE id=?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn payment_method_name_exists(
        &self,
        conn: &Connection,
        owner_id: i64,
        name: &str,
    ) -> Result<bool> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM payment_methods WHERE owner_id=?1 AND lower(name)=lower(?2)",
            params![owner_id, name.trim()],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }
}

impl CategoryLookup for SqliteDirectory {
    fn category(&self, conn: &Connection, category_id: i64) -> Result<Option<Category>> {
        Ok(conn
            .query_row(
                "SELECT id, household_id, group_id, name, active FROM categories WHERE id=?1",
                params![category_id],
                |r| {
                    Ok(Category {
                        id: r.get(0)?,
                        household_id: r.get(1)?,
                        group_id: r.get(2)?,
                        name: r.get(3)?,
                        active: r.get(4)?,
                    })
                },
            )
            .optional()?)
    }
}
