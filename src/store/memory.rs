//! In-memory store for tests and demos.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    split_pending_payouts, EventStore, PayoutReport, StoreError, TransactionRecord,
};
use crate::models::{EventId, EventRecord, Participant, ParticipantId};
use crate::reconcile::payout_instructions;

#[derive(Debug, Default)]
struct Inner {
    events: BTreeMap<EventId, EventRecord>,
    participants: BTreeMap<EventId, Vec<Participant>>,
    balances: BTreeMap<ParticipantId, u64>,
    transactions: Vec<TransactionRecord>,
}

/// Everything behind one lock; fine for a single authoring session.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user balance (test setup).
    pub async fn set_balance(&self, user: impl Into<ParticipantId>, balance: u64) {
        self.inner.write().await.balances.insert(user.into(), balance);
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, event: EventRecord) -> Result<EventId, StoreError> {
        let id = event.id.clone();
        self.inner.write().await.events.insert(id.clone(), event);
        Ok(id)
    }

    async fn update_event(&self, event: EventRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.events.contains_key(&event.id) {
            return Err(StoreError::EventNotFound(event.id.to_string()));
        }
        inner.events.insert(event.id.clone(), event);
        Ok(())
    }

    async fn delete_event(&self, id: &EventId) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.events.remove(id);
        inner.participants.remove(id);
        Ok(())
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.inner.read().await.events.get(id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<EventRecord>, StoreError> {
        let mut events: Vec<EventRecord> =
            self.inner.read().await.events.values().cloned().collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn upsert_participant(
        &self,
        event_id: &EventId,
        participant: Participant,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let roster = inner.participants.entry(event_id.clone()).or_default();
        match roster.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => roster.push(participant),
        }
        Ok(())
    }

    async fn fetch_ranking(&self, event_id: &EventId) -> Result<Vec<Participant>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .participants
            .get(event_id)
            .map(|roster| {
                roster
                    .iter()
                    .filter(|p| p.matches_played >= 1)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn balance(&self, user: &ParticipantId) -> Result<u64, StoreError> {
        Ok(*self.inner.read().await.balances.get(user).unwrap_or(&0))
    }

    async fn transactions(&self, event_id: &EventId) -> Result<Vec<TransactionRecord>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .transactions
            .iter()
            .filter(|tx| &tx.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn apply_payouts(
        &self,
        event_id: &EventId,
        payouts: &BTreeMap<ParticipantId, u32>,
    ) -> Result<PayoutReport, StoreError> {
        let mut inner = self.inner.write().await;
        let existing: Vec<TransactionRecord> = inner
            .transactions
            .iter()
            .filter(|tx| &tx.event_id == event_id)
            .cloned()
            .collect();
        let (pending, skipped) = split_pending_payouts(payouts, &existing);
        let pending: BTreeMap<ParticipantId, u32> = pending.into_iter().collect();

        let mut report = PayoutReport {
            skipped,
            ..Default::default()
        };
        for instruction in payout_instructions(&pending, Utc::now()) {
            let balance = inner.balances.entry(instruction.user_id.clone()).or_insert(0);
            *balance += instruction.quantity as u64;
            report.total_credited += instruction.quantity as u64;
            report.credited.push(instruction.user_id.clone());
            inner
                .transactions
                .push(TransactionRecord::from_instruction(event_id, instruction));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::PRIZE_CONCEPT;
    use pretty_assertions::assert_eq;

    fn make_event(title: &str) -> EventRecord {
        EventRecord::new("es", title, Utc::now())
    }

    #[tokio::test]
    async fn test_event_crud() {
        let store = MemoryStore::new();
        let mut event = make_event("Copa");
        let id = store.create_event(event.clone()).await.unwrap();

        let fetched = store.get_event(&id).await.unwrap().unwrap();
        assert_eq!(fetched.title("es"), Some("Copa"));

        event.event_entry = 25;
        store.update_event(event).await.unwrap();
        let fetched = store.get_event(&id).await.unwrap().unwrap();
        assert_eq!(fetched.event_entry, 25);

        store.delete_event(&id).await.unwrap();
        assert!(store.get_event(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_event() {
        let store = MemoryStore::new();
        let err = store.update_event(make_event("ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn test_fetch_ranking_filters_idle() {
        let store = MemoryStore::new();
        let id = store.create_event(make_event("Copa")).await.unwrap();

        store
            .upsert_participant(&id, Participant::new("played").with_record(2, 3))
            .await
            .unwrap();
        store
            .upsert_participant(&id, Participant::new("idle"))
            .await
            .unwrap();

        let ranking = store.fetch_ranking(&id).await.unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].id.as_str(), "played");
    }

    #[tokio::test]
    async fn test_upsert_participant_replaces() {
        let store = MemoryStore::new();
        let id = store.create_event(make_event("Copa")).await.unwrap();

        store
            .upsert_participant(&id, Participant::new("a").with_record(1, 1))
            .await
            .unwrap();
        store
            .upsert_participant(&id, Participant::new("a").with_record(5, 6))
            .await
            .unwrap();

        let ranking = store.fetch_ranking(&id).await.unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].victories, 5);
    }

    #[tokio::test]
    async fn test_apply_payouts_credits_and_logs() {
        let store = MemoryStore::new();
        let id = store.create_event(make_event("Copa")).await.unwrap();
        store.set_balance("a", 10).await;

        let mut payouts = BTreeMap::new();
        payouts.insert(ParticipantId::from("a"), 100u32);
        payouts.insert(ParticipantId::from("b"), 50u32);

        let report = store.apply_payouts(&id, &payouts).await.unwrap();
        assert_eq!(report.credited.len(), 2);
        assert_eq!(report.total_credited, 150);

        assert_eq!(store.balance(&"a".into()).await.unwrap(), 110);
        assert_eq!(store.balance(&"b".into()).await.unwrap(), 50);

        let log = store.transactions(&id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|tx| tx.concept == PRIZE_CONCEPT));
    }

    #[tokio::test]
    async fn test_apply_payouts_rerun_does_not_double_pay() {
        let store = MemoryStore::new();
        let id = store.create_event(make_event("Copa")).await.unwrap();

        let mut payouts = BTreeMap::new();
        payouts.insert(ParticipantId::from("a"), 100u32);

        store.apply_payouts(&id, &payouts).await.unwrap();
        let report = store.apply_payouts(&id, &payouts).await.unwrap();

        assert!(report.credited.is_empty());
        assert_eq!(report.skipped, vec![ParticipantId::from("a")]);
        assert_eq!(store.balance(&"a".into()).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_apply_payouts_resume_pays_remainder() {
        // Simulate a partial first run by crediting only "a" up front.
        let store = MemoryStore::new();
        let id = store.create_event(make_event("Copa")).await.unwrap();

        let mut first = BTreeMap::new();
        first.insert(ParticipantId::from("a"), 100u32);
        store.apply_payouts(&id, &first).await.unwrap();

        let mut full = BTreeMap::new();
        full.insert(ParticipantId::from("a"), 100u32);
        full.insert(ParticipantId::from("b"), 50u32);
        let report = store.apply_payouts(&id, &full).await.unwrap();

        assert_eq!(report.credited, vec![ParticipantId::from("b")]);
        assert_eq!(store.balance(&"a".into()).await.unwrap(), 100);
        assert_eq!(store.balance(&"b".into()).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_payouts_scoped_per_event() {
        let store = MemoryStore::new();
        let first = store.create_event(make_event("Copa")).await.unwrap();
        let second = store.create_event(make_event("Liga")).await.unwrap();

        let mut payouts = BTreeMap::new();
        payouts.insert(ParticipantId::from("a"), 100u32);

        store.apply_payouts(&first, &payouts).await.unwrap();
        let report = store.apply_payouts(&second, &payouts).await.unwrap();

        // Prize for one event does not block the same user in another.
        assert_eq!(report.credited.len(), 1);
        assert_eq!(store.balance(&"a".into()).await.unwrap(), 200);
    }
}
