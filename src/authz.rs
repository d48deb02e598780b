// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Membership, role and ownership checks run before every mutation.
//!
//! These checks are authoritative: callers may pre-filter choices for display, but nothing here
//! trusts that filtering.

use crate::directory::Directory;
use crate::error::{LedgerError, Result, forbidden, not_found};
use crate::models::{Account, PaymentMethod, Role};
use rusqlite::Connection;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Edit,
    Delete,
}

/// What an action touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Household-wide data: membership is enough.
    Household,
    /// A record someone created: movement, template, credit-card payment.
    Owned {
        entity: &'static str,
        created_by: i64,
    },
}

/// Returns the actor's role when the action is allowed.
pub fn authorize(
    dir: &dyn Directory,
    conn: &Connection,
    actor: i64,
    household_id: i64,
    action: Action,
    resource: Resource,
) -> Result<Role> {
    // Outsiders get the same error as for a missing record.
    let outsider = match resource {
        Resource::Household => forbidden("household"),
        Resource::Owned { entity, .. } => forbidden(entity),
    };
    let role = dir
        .member_role(conn, household_id, actor)?
        .ok_or(outsider)?;
    match (action, resource) {
        (Action::Edit | Action::Delete, Resource::Owned { entity, created_by })
            if created_by != actor && role != Role::Owner =>
        {
            debug!(actor, created_by, entity, "edit refused: not creator or owner");
            Err(forbidden(entity))
        }
        _ => Ok(role),
    }
}

pub fn require_owner(
    dir: &dyn Directory,
    conn: &Connection,
    actor: i64,
    household_id: i64,
) -> Result<()> {
    match dir.member_role(conn, household_id, actor)? {
        Some(Role::Owner) => Ok(()),
        _ => Err(forbidden("household")),
    }
}

/// A payment method is usable by `payer` when the payer owns it, or when it is shared with the
/// household and its owner still belongs there.
pub fn check_payment_method(
    dir: &dyn Directory,
    conn: &Connection,
    household_id: i64,
    payer: i64,
    payment_method_id: i64,
) -> Result<PaymentMethod> {
    let pm = dir
        .payment_method(conn, payment_method_id)?
        .filter(|pm| pm.household_id == household_id)
        .ok_or(not_found("payment method"))?;
    let usable = pm.owner_id == payer
        || (pm.shared_with_household
            && dir.member_role(conn, household_id, pm.owner_id)?.is_some());
    if !usable {
        debug!(payer, payment_method_id, owner = pm.owner_id, "payment method not usable");
        return Err(forbidden("payment method"));
    }
    if !pm.active {
        return Err(LedgerError::validation(
            "payment_method_id",
            format!("payment method '{}' is inactive", pm.name),
        ));
    }
    Ok(pm)
}

/// Accounts are never shared: only the owner may route money through one.
pub fn check_account(
    dir: &dyn Directory,
    conn: &Connection,
    household_id: i64,
    owner: i64,
    account_id: i64,
) -> Result<Account> {
    let account = dir
        .account(conn, account_id)?
        .filter(|a| a.household_id == household_id)
        .ok_or(not_found("account"))?;
    if account.owner_id != owner {
        debug!(owner, account_id, actual_owner = account.owner_id, "account not owned");
        return Err(forbidden("account"));
    }
    Ok(account)
}

/// Rejects a role change or removal that would leave the household without an owner.
/// `new_role` is `None` for a removal.
pub fn ensure_owner_remains(
    dir: &dyn Directory,
    conn: &Connection,
    household_id: i64,
    user_id: i64,
    new_role: Option<Role>,
) -> Result<()> {
    let current = dir
        .member_role(conn, household_id, user_id)?
        .ok_or(not_found("member"))?;
    if current == Role::Owner
        && new_role != Some(Role::Owner)
        && dir.count_owners(conn, household_id)? <= 1
    {
        return Err(LedgerError::InvalidState(
            "a household must keep at least one owner".into(),
        ));
    }
    Ok(())
}
