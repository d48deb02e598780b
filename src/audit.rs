// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fire-and-forget audit trail. Sinks never block the caller and never report failure.

use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::Serialize;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    MovementCreated,
    MovementUpdated,
    MovementDeleted,
    TemplateCreated,
    TemplateUpdated,
    TemplateDeleted,
    BudgetSet,
    BudgetsCopied,
    CreditCardPaymentCreated,
    CreditCardPaymentDeleted,
    MemberAdded,
    MemberRoleChanged,
    MemberRemoved,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::MovementCreated => "movement_created",
            AuditAction::MovementUpdated => "movement_updated",
            AuditAction::MovementDeleted => "movement_deleted",
            AuditAction::TemplateCreated => "template_created",
            AuditAction::TemplateUpdated => "template_updated",
            AuditAction::TemplateDeleted => "template_deleted",
            AuditAction::BudgetSet => "budget_set",
            AuditAction::BudgetsCopied => "budgets_copied",
            AuditAction::CreditCardPaymentCreated => "credit_card_payment_created",
            AuditAction::CreditCardPaymentDeleted => "credit_card_payment_deleted",
            AuditAction::MemberAdded => "member_added",
            AuditAction::MemberRoleChanged => "member_role_changed",
            AuditAction::MemberRemoved => "member_removed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub occurred_at: DateTime<Utc>,
    pub actor_id: i64,
    pub household_id: Option<i64>,
    pub action: AuditAction,
    pub entity_id: i64,
    pub detail: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        actor_id: i64,
        household_id: i64,
        action: AuditAction,
        entity_id: i64,
        detail: serde_json::Value,
    ) -> Self {
        Self {
            occurred_at: Utc::now(),
            actor_id,
            household_id: Some(household_id),
            action,
            entity_id,
            detail,
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn log_async(&self, event: AuditEvent);
}

/// Emits each event on the `audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn log_async(&self, event: AuditEvent) {
        info!(
            target: "audit",
            actor = event.actor_id,
            household = ?event.household_id,
            action = event.action.as_str(),
            entity_id = event.entity_id,
            detail = %event.detail,
            "audit event"
        );
    }
}

/// Appends events to the `audit_log` table from a background thread with its own connection.
pub struct SqliteAuditSink {
    sender: Option<Sender<AuditEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl SqliteAuditSink {
    pub fn spawn(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Open audit DB at {}", path.display()))?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let (sender, receiver) = mpsc::channel::<AuditEvent>();
        let worker = std::thread::Builder::new()
            .name("audit-writer".into())
            .spawn(move || {
                for event in receiver {
                    if let Err(e) = write_event(&conn, &event) {
                        warn!(error = %e, action = event.action.as_str(), "audit write failed");
                    }
                }
            })
            .context("Spawn audit writer")?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }
}

fn write_event(conn: &Connection, event: &AuditEvent) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO audit_log(occurred_at, actor_id, household_id, action, entity_id, detail)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            event.occurred_at.to_rfc3339(),
            event.actor_id,
            event.household_id,
            event.action.as_str(),
            event.entity_id,
            event.detail.to_string(),
        ],
    )?;
    Ok(())
}

impl AuditSink for SqliteAuditSink {
    fn log_async(&self, event: AuditEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(e) = sender.send(event) {
            warn!(action = e.0.action.as_str(), "audit writer gone, event dropped");
        }
    }
}

impl Drop for SqliteAuditSink {
    // Closing the channel lets the writer drain what is queued and exit.
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("audit writer panicked");
            }
        }
    }
}
