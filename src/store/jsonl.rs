//! JSONL-backed local store.
//!
//! One directory, four files. Each line is one JSON object:
//!
//! - `events.jsonl`: event records, rewritten whole on change
//! - `participants.jsonl`: ranking snapshot rows tagged with their event
//! - `balances.jsonl`: one balance row per user, rewritten whole
//! - `transactions.jsonl`: append-only credit log

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    split_pending_payouts, EventStore, PayoutReport, StoreError, TransactionRecord,
};
use crate::models::{EventId, EventRecord, Participant, ParticipantId};
use crate::reconcile::payout_instructions;

const EVENTS_FILE: &str = "events.jsonl";
const PARTICIPANTS_FILE: &str = "participants.jsonl";
const BALANCES_FILE: &str = "balances.jsonl";
const TRANSACTIONS_FILE: &str = "transactions.jsonl";

/// JSONL file writer.
struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single row to the file.
    fn append(&self, row: &T) -> Result<(), StoreError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(row)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!("Appended row to {:?}", self.path);
        Ok(())
    }

    /// Write rows, replacing the entire file.
    fn write_all(&self, rows: &[T]) -> Result<usize, StoreError> {
        self.ensure_dir()?;

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for row in rows {
            let json = serde_json::to_string(row)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        debug!("Wrote {} rows to {:?}", count, self.path);

        Ok(count)
    }
}

/// JSONL file reader.
struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Read all rows from the file. Missing file reads as empty;
    /// unparseable lines are skipped with a warning.
    fn read_all(&self) -> Result<Vec<T>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut rows = Vec::new();
        let mut line_num = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        line_num, self.path, e
                    );
                }
            }
        }

        Ok(rows)
    }
}

/// Ranking snapshot row, tagged with its event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantRow {
    event_id: EventId,
    #[serde(flatten)]
    participant: Participant,
}

/// One balance row per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceRow {
    user_id: ParticipantId,
    balance: u64,
}

/// Local JSONL store rooted at a data directory.
///
/// Reads go straight to disk; writes are serialized behind one lock so
/// rewrite-whole files never interleave.
pub struct JsonlStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    fn events_writer(&self) -> JsonlWriter<EventRecord> {
        JsonlWriter::new(self.dir.join(EVENTS_FILE))
    }

    fn events_reader(&self) -> JsonlReader<EventRecord> {
        JsonlReader::new(self.dir.join(EVENTS_FILE))
    }

    fn participants_writer(&self) -> JsonlWriter<ParticipantRow> {
        JsonlWriter::new(self.dir.join(PARTICIPANTS_FILE))
    }

    fn participants_reader(&self) -> JsonlReader<ParticipantRow> {
        JsonlReader::new(self.dir.join(PARTICIPANTS_FILE))
    }

    fn balances_writer(&self) -> JsonlWriter<BalanceRow> {
        JsonlWriter::new(self.dir.join(BALANCES_FILE))
    }

    fn balances_reader(&self) -> JsonlReader<BalanceRow> {
        JsonlReader::new(self.dir.join(BALANCES_FILE))
    }

    fn transactions_writer(&self) -> JsonlWriter<TransactionRecord> {
        JsonlWriter::new(self.dir.join(TRANSACTIONS_FILE))
    }

    fn transactions_reader(&self) -> JsonlReader<TransactionRecord> {
        JsonlReader::new(self.dir.join(TRANSACTIONS_FILE))
    }

    fn read_balances(&self) -> Result<BTreeMap<ParticipantId, u64>, StoreError> {
        let mut balances = BTreeMap::new();
        // Later rows win, so a rewrite interrupted mid-append still resolves.
        for row in self.balances_reader().read_all()? {
            balances.insert(row.user_id, row.balance);
        }
        Ok(balances)
    }

    fn write_balances(&self, balances: &BTreeMap<ParticipantId, u64>) -> Result<(), StoreError> {
        let rows: Vec<BalanceRow> = balances
            .iter()
            .map(|(user_id, balance)| BalanceRow {
                user_id: user_id.clone(),
                balance: *balance,
            })
            .collect();
        self.balances_writer().write_all(&rows)?;
        Ok(())
    }
}

#[async_trait]
impl EventStore for JsonlStore {
    async fn create_event(&self, event: EventRecord) -> Result<EventId, StoreError> {
        let _guard = self.write_lock.lock().await;
        let id = event.id.clone();
        let mut events = self.events_reader().read_all()?;
        events.retain(|e: &EventRecord| e.id != id);
        events.push(event);
        self.events_writer().write_all(&events)?;
        info!("Created event {}", id);
        Ok(id)
    }

    async fn update_event(&self, event: EventRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.events_reader().read_all()?;
        let slot = events
            .iter_mut()
            .find(|e: &&mut EventRecord| e.id == event.id)
            .ok_or_else(|| StoreError::EventNotFound(event.id.to_string()))?;
        *slot = event;
        self.events_writer().write_all(&events)?;
        Ok(())
    }

    async fn delete_event(&self, id: &EventId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.events_reader().read_all()?;
        events.retain(|e: &EventRecord| &e.id != id);
        self.events_writer().write_all(&events)?;

        let mut rows = self.participants_reader().read_all()?;
        rows.retain(|r| &r.event_id != id);
        self.participants_writer().write_all(&rows)?;
        Ok(())
    }

    async fn get_event(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        let events = self.events_reader().read_all()?;
        Ok(events.into_iter().find(|e| &e.id == id))
    }

    async fn list_events(&self) -> Result<Vec<EventRecord>, StoreError> {
        let mut events = self.events_reader().read_all()?;
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn upsert_participant(
        &self,
        event_id: &EventId,
        participant: Participant,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self.participants_reader().read_all()?;
        rows.retain(|r| !(&r.event_id == event_id && r.participant.id == participant.id));
        rows.push(ParticipantRow {
            event_id: event_id.clone(),
            participant,
        });
        self.participants_writer().write_all(&rows)?;
        Ok(())
    }

    async fn fetch_ranking(&self, event_id: &EventId) -> Result<Vec<Participant>, StoreError> {
        let rows = self.participants_reader().read_all()?;
        Ok(rows
            .into_iter()
            .filter(|r| &r.event_id == event_id && r.participant.matches_played >= 1)
            .map(|r| r.participant)
            .collect())
    }

    async fn balance(&self, user: &ParticipantId) -> Result<u64, StoreError> {
        Ok(*self.read_balances()?.get(user).unwrap_or(&0))
    }

    async fn transactions(&self, event_id: &EventId) -> Result<Vec<TransactionRecord>, StoreError> {
        let all = self.transactions_reader().read_all()?;
        Ok(all.into_iter().filter(|tx| &tx.event_id == event_id).collect())
    }

    async fn apply_payouts(
        &self,
        event_id: &EventId,
        payouts: &BTreeMap<ParticipantId, u32>,
    ) -> Result<PayoutReport, StoreError> {
        let _guard = self.write_lock.lock().await;

        let existing: Vec<TransactionRecord> = self
            .transactions_reader()
            .read_all()?
            .into_iter()
            .filter(|tx| &tx.event_id == event_id)
            .collect();
        let (pending, skipped) = split_pending_payouts(payouts, &existing);
        let pending: BTreeMap<ParticipantId, u32> = pending.into_iter().collect();

        let mut report = PayoutReport {
            skipped,
            ..Default::default()
        };
        let tx_writer = self.transactions_writer();
        let mut balances = self.read_balances()?;

        // Per-user credit order: balance first, transaction log second.
        // A crash between the two leaves the log behind the balance, so
        // that user may be paid again on resume; a crash after the log
        // write is fully recoverable.
        for instruction in payout_instructions(&pending, Utc::now()) {
            let entry = balances.entry(instruction.user_id.clone()).or_insert(0);
            *entry += instruction.quantity as u64;
            self.write_balances(&balances)?;
            report.total_credited += instruction.quantity as u64;
            report.credited.push(instruction.user_id.clone());
            tx_writer.append(&TransactionRecord::from_instruction(event_id, instruction))?;
        }

        info!(
            "Applied payouts for event {} ({} credited, {} skipped)",
            event_id,
            report.credited.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}
