//! Append-only audit trail of lifecycle events.
//!
//! The trail is observability, not game state. Sinks are infallible from the
//! caller's point of view; a sink that cannot write logs the loss and moves
//! on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

use crate::game::entities::{GameId, UserId};

/// One audit event.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuditEntry {
    pub game_id: GameId,
    pub user_id: Option<UserId>,
    pub event: String,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(game_id: GameId, user_id: Option<UserId>, event: &str) -> Self {
        Self {
            game_id,
            user_id,
            event: event.to_string(),
            detail: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Sink for audit events.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(&self, entry: AuditEntry);
}

/// Discards every event. Default for deployments that do not keep a trail.
#[derive(Clone, Copy, Default)]
pub struct NoopAuditLog;

#[async_trait]
impl AuditLog for NoopAuditLog {
    async fn append(&self, _entry: AuditEntry) {}
}

/// Writes events to the `audit_log` table.
#[derive(Clone)]
pub struct PgAuditLog {
    pool: Arc<PgPool>,
}

impl PgAuditLog {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn append(&self, entry: AuditEntry) {
        let result = sqlx::query(
            "INSERT INTO audit_log (game_id, user_id, event, detail, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.game_id)
        .bind(entry.user_id)
        .bind(&entry.event)
        .bind(&entry.detail)
        .bind(entry.created_at)
        .execute(self.pool.as_ref())
        .await;

        if let Err(error) = result {
            log::error!(
                "failed to append audit event {:?} for game {}: {error}",
                entry.event,
                entry.game_id
            );
        }
    }
}

/// Collects events in memory so tests can assert on the trail.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn events_for(&self, game_id: GameId) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.game_id == game_id)
            .map(|e| e.event)
            .collect()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}
