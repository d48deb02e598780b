// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Household membership: the part of member management the ledger depends on.

use super::{Ledger, begin};
use crate::audit::{AuditAction, AuditEvent};
use crate::authz::{ensure_owner_remains, require_owner};
use crate::error::{LedgerError, Result, not_found};
use crate::models::Role;
use rusqlite::{Connection, params};
use serde_json::json;
use tracing::info;

impl Ledger<'_> {
    /// Creates a household with `creator` as its first owner.
    pub fn create_household(&self, conn: &mut Connection, creator: i64, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::validation("name", "must not be empty"));
        }
        let tx = begin(conn)?;
        self.dir.user(&tx, creator)?.ok_or(not_found("user"))?;
        tx.execute("INSERT INTO households(name) VALUES (?1)", params![name])?;
        let household_id = tx.last_insert_rowid();
        self.dir.add_member(&tx, household_id, creator, Role::Owner)?;
        tx.commit()?;

        info!(household_id, creator, "household created");
        self.emit(AuditEvent::new(
            creator,
            household_id,
            AuditAction::MemberAdded,
            creator,
            json!({ "role": Role::Owner, "household": name }),
        ));
        Ok(household_id)
    }

    /// Owners add members. Contacts of the household carrying the new member's email get linked
    /// to them, so they resolve to the member from then on. Returns the linked contact ids.
    pub fn add_member(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<Vec<i64>> {
        let tx = begin(conn)?;
        require_owner(self.dir, &tx, actor, household_id)?;
        let user = self.dir.user(&tx, user_id)?.ok_or(not_found("user"))?;
        if self.dir.member_role(&tx, household_id, user_id)?.is_some() {
            return Err(LedgerError::InvalidState(format!(
                "{} is already a member",
                user.name
            )));
        }
        self.dir.add_member(&tx, household_id, user_id, role)?;

        let mut linked = Vec::new();
        if let Some(email) = user.email.as_deref() {
            while let Some(contact) = self
                .dir
                .find_contact_by_email(&tx, household_id, email)?
                .filter(|c| c.linked_user_id.is_none())
            {
                self.dir.link_contact(&tx, contact.id, user_id)?;
                linked.push(contact.id);
            }
        }
        tx.commit()?;

        info!(household_id, user_id, role = %role, linked = linked.len(), "member added");
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::MemberAdded,
            user_id,
            json!({ "role": role, "linked_contacts": linked }),
        ));
        Ok(linked)
    }

    pub fn set_member_role(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        user_id: i64,
        role: Role,
    ) -> Result<()> {
        let tx = begin(conn)?;
        require_owner(self.dir, &tx, actor, household_id)?;
        ensure_owner_remains(self.dir, &tx, household_id, user_id, Some(role))?;
        self.dir.set_member_role(&tx, household_id, user_id, role)?;
        tx.commit()?;

        info!(household_id, user_id, role = %role, "member role changed");
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::MemberRoleChanged,
            user_id,
            json!({ "role": role }),
        ));
        Ok(())
    }

    /// Owners remove anyone; members may only leave themselves. The last owner stays.
    pub fn remove_member(
        &self,
        conn: &mut Connection,
        actor: i64,
        household_id: i64,
        user_id: i64,
    ) -> Result<()> {
        let tx = begin(conn)?;
        if actor != user_id {
            require_owner(self.dir, &tx, actor, household_id)?;
        }
        ensure_owner_remains(self.dir, &tx, household_id, user_id, None)?;
        self.dir.remove_member(&tx, household_id, user_id)?;
        tx.commit()?;

        info!(household_id, user_id, "member removed");
        self.emit(AuditEvent::new(
            actor,
            household_id,
            AuditAction::MemberRemoved,
            user_id,
            json!({}),
        ));
        Ok(())
    }
}
