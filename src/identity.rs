// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::directory::Directory;
use crate::error::{LedgerError, Result, not_found};
use crate::models::ParticipantRef;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Member,
    Contact,
}

/// A participant reference resolved within one household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub kind: IdentityKind,
    /// The reference as the caller supplied it.
    pub reference: ParticipantRef,
    /// Who the reference really denotes: a contact linked to a registered user is that user.
    pub canonical: ParticipantRef,
    pub display_name: String,
    pub household_id: i64,
}

impl Identity {
    pub fn id(&self) -> i64 {
        match self.reference {
            ParticipantRef::Member(id) | ParticipantRef::Contact(id) => id,
        }
    }

    pub fn is_member(&self) -> bool {
        self.kind == IdentityKind::Member
    }

    pub fn same_party(&self, other: &Identity) -> bool {
        self.canonical == other.canonical
    }
}

/// Resolves `reference` inside `household_id`. Anything outside that household is `NotFound`.
pub fn resolve(
    dir: &dyn Directory,
    conn: &Connection,
    household_id: i64,
    reference: ParticipantRef,
) -> Result<Identity> {
    match reference {
        ParticipantRef::Member(user_id) => {
            if dir.member_role(conn, household_id, user_id)?.is_none() {
                return Err(not_found("member"));
            }
            let user = dir.user(conn, user_id)?.ok_or(not_found("member"))?;
            Ok(Identity {
                kind: IdentityKind::Member,
                reference,
                canonical: reference,
                display_name: user.name,
                household_id,
            })
        }
        ParticipantRef::Contact(contact_id) => {
            let contact = dir
                .contact(conn, contact_id)?
                .filter(|c| c.household_id == household_id)
                .ok_or(not_found("contact"))?;
            if !contact.active {
                return Err(LedgerError::validation(
                    "participant",
                    format!("contact '{}' is inactive", contact.name),
                ));
            }
            let (canonical, display_name) = match contact.linked_user_id {
                Some(user_id) => {
                    let name = dir
                        .user(conn, user_id)?
                        .map(|u| u.name)
                        .unwrap_or(contact.name);
                    (ParticipantRef::Member(user_id), name)
                }
                None => (reference, contact.name),
            };
            Ok(Identity {
                kind: IdentityKind::Contact,
                reference,
                canonical,
                display_name,
                household_id,
            })
        }
    }
}

/// Canonical form of a reference without the household checks of [`resolve`]; used when reading
/// back rows that were validated on write.
pub fn canonical_of(
    dir: &dyn Directory,
    conn: &Connection,
    reference: ParticipantRef,
) -> Result<ParticipantRef> {
    match reference {
        ParticipantRef::Member(_) => Ok(reference),
        ParticipantRef::Contact(id) => Ok(dir
            .contact(conn, id)?
            .and_then(|c| c.linked_user_id)
            .map(ParticipantRef::Member)
            .unwrap_or(reference)),
    }
}

pub fn display_name_of(
    dir: &dyn Directory,
    conn: &Connection,
    reference: ParticipantRef,
) -> Result<String> {
    let name = match reference {
        ParticipantRef::Member(id) => dir.user(conn, id)?.map(|u| u.name),
        ParticipantRef::Contact(id) => match dir.contact(conn, id)? {
            Some(c) => match c.linked_user_id {
                Some(uid) => dir.user(conn, uid)?.map(|u| u.name).or(Some(c.name)),
                None => Some(c.name),
            },
            None => None,
        },
    };
    Ok(name.unwrap_or_else(|| reference.to_string()))
}
