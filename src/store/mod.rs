//! Event and credit persistence.
//!
//! The console treats persistence as a collaborator behind [`EventStore`]:
//! event records, per-event participant snapshots, user balances, and an
//! append-only credit transaction log. Two implementations ship here: an
//! in-memory store for tests and demos, and a JSONL-backed local store.
//!
//! Payout application is a sequence of independent per-user
//! read-modify-write operations, not a transaction: a failure partway
//! leaves a prefix credited. Re-running is safe because users who already
//! carry an "Event Prize" transaction for the event are skipped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{EventId, EventRecord, Participant, ParticipantId};
use crate::reconcile::{PayoutInstruction, PRIZE_CONCEPT};

mod jsonl;
mod memory;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event not found: {0}")]
    EventNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only credit transaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub user_id: ParticipantId,
    pub event_id: EventId,
    pub concept: String,
    pub quantity: u32,
    pub date: DateTime<Utc>,
}

impl TransactionRecord {
    /// Ledger row for one payout instruction applied to an event. The
    /// stores go through this so the persisted record can't drift from
    /// the reconciler's instruction shape.
    pub fn from_instruction(event_id: &EventId, instruction: PayoutInstruction) -> Self {
        Self {
            user_id: instruction.user_id,
            event_id: event_id.clone(),
            concept: instruction.concept,
            quantity: instruction.quantity,
            date: instruction.date,
        }
    }
}

/// Outcome of one payout batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutReport {
    /// Users credited in this run.
    pub credited: Vec<ParticipantId>,

    /// Users skipped because a prize transaction for this event already
    /// existed (earlier run) or the payout amount was zero.
    pub skipped: Vec<ParticipantId>,

    pub total_credited: u64,
}

/// Split a payout mapping into entries still owed and entries to skip,
/// based on the event's existing transaction log. Zero amounts are
/// skipped outright; so is any user already credited for this event.
pub(crate) fn split_pending_payouts(
    payouts: &BTreeMap<ParticipantId, u32>,
    existing: &[TransactionRecord],
) -> (Vec<(ParticipantId, u32)>, Vec<ParticipantId>) {
    let mut pending = Vec::new();
    let mut skipped = Vec::new();

    for (user, amount) in payouts {
        let already_paid = existing
            .iter()
            .any(|tx| tx.concept == PRIZE_CONCEPT && &tx.user_id == user);
        if *amount == 0 || already_paid {
            skipped.push(user.clone());
        } else {
            pending.push((user.clone(), *amount));
        }
    }

    (pending, skipped)
}

/// Persistence collaborator for events, rankings, and credits.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a new event record.
    async fn create_event(&self, event: EventRecord) -> Result<EventId, StoreError>;

    /// Replace an existing event record.
    async fn update_event(&self, event: EventRecord) -> Result<(), StoreError>;

    async fn delete_event(&self, id: &EventId) -> Result<(), StoreError>;

    async fn get_event(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError>;

    /// All event records, newest first.
    async fn list_events(&self) -> Result<Vec<EventRecord>, StoreError>;

    /// Record or replace a participant snapshot row for an event.
    async fn upsert_participant(
        &self,
        event_id: &EventId,
        participant: Participant,
    ) -> Result<(), StoreError>;

    /// Participant snapshot for ranking: everyone who played at least one
    /// match (the ordered-range query the backing database serves).
    async fn fetch_ranking(&self, event_id: &EventId) -> Result<Vec<Participant>, StoreError>;

    async fn balance(&self, user: &ParticipantId) -> Result<u64, StoreError>;

    /// Transaction log entries for an event.
    async fn transactions(&self, event_id: &EventId) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Credit each user: read balance, write balance + amount, append one
    /// transaction record. Users already credited for this event are
    /// skipped, so a partially failed batch can be re-run.
    async fn apply_payouts(
        &self,
        event_id: &EventId,
        payouts: &BTreeMap<ParticipantId, u32>,
    ) -> Result<PayoutReport, StoreError>;
}
