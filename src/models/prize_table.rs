//! Prize table: an ordered mapping from rank-range keys to reward amounts.
//!
//! This is the editable structure behind the "Qoins to distribute" section
//! of event authoring. Entries keep the key text as the operator typed it
//! and their declaration order; `sorted_entries` derives the display/payout
//! ordering without rewriting storage.
//!
//! Identity is the formatted key text, so `"5-5"` and `"5"` address the
//! same entry while a reversed span like `"16-5"` stays distinct from
//! `"5-16"` (never re-normalized, matching the persisted form).

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::range_key::{RangeKey, RangeKeyError};

/// One row of the prize table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeEntry {
    pub key: RangeKey,
    pub amount: u32,
}

/// Ordered mapping from rank-range key to reward amount.
///
/// Serializes as a JSON map (the persisted `prices` sub-document).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrizeTable {
    entries: Vec<PrizeEntry>,
}

/// Lenient amount coercion, decided once for every prize mutation: the
/// leading run of ASCII digits after trimming, anything else is 0.
/// Oversized input saturates instead of wrapping.
pub fn parse_amount_lenient(raw: &str) -> u32 {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return 0;
    }
    digits
        .parse::<u64>()
        .map(|v| v.min(u32::MAX as u64) as u32)
        .unwrap_or(u32::MAX)
}

impl PrizeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[PrizeEntry] {
        &self.entries
    }

    fn position_of(&self, key: &RangeKey) -> Option<usize> {
        let text = key.to_string();
        self.entries.iter().position(|e| e.key.to_string() == text)
    }

    /// Amount for a key, if present.
    pub fn get(&self, key_text: &str) -> Option<u32> {
        let key: RangeKey = key_text.parse().ok()?;
        self.position_of(&key).map(|i| self.entries[i].amount)
    }

    /// Upsert an entry. An existing key keeps its declaration position.
    pub fn set(&mut self, key_text: &str, amount: u32) -> Result<(), RangeKeyError> {
        let key: RangeKey = key_text.parse()?;
        match self.position_of(&key) {
            Some(i) => self.entries[i].amount = amount,
            None => self.entries.push(PrizeEntry { key, amount }),
        }
        Ok(())
    }

    /// Upsert with the lenient amount coercion applied to raw operator input.
    pub fn set_lenient(&mut self, key_text: &str, raw_amount: &str) -> Result<(), RangeKeyError> {
        self.set(key_text, parse_amount_lenient(raw_amount))
    }

    /// Replace `old` with `new`, carrying the given amount.
    ///
    /// The removal happens before the insert even when the texts are equal,
    /// so rekeying to the same key only replaces the amount. The rekeyed
    /// entry moves to the end of declaration order, as a remove-then-insert
    /// implies. Both keys are parsed before anything mutates, so a
    /// malformed key on either side fails with the table untouched.
    pub fn rekey(&mut self, old: &str, new: &str, amount: u32) -> Result<(), RangeKeyError> {
        let old_key: RangeKey = old.parse()?;
        let new_key: RangeKey = new.parse()?;
        if let Some(i) = self.position_of(&old_key) {
            self.entries.remove(i);
        }
        match self.position_of(&new_key) {
            Some(i) => self.entries[i].amount = amount,
            None => self.entries.push(PrizeEntry {
                key: new_key,
                amount,
            }),
        }
        Ok(())
    }

    /// Remove an entry; absent or malformed keys are a no-op.
    pub fn remove(&mut self, key_text: &str) {
        if let Ok(key) = key_text.parse::<RangeKey>() {
            if let Some(i) = self.position_of(&key) {
                self.entries.remove(i);
            }
        }
    }

    /// Append a single-rank entry one past the highest covered rank,
    /// or rank 1 when the table is empty. The new key can never collide:
    /// its rank strictly exceeds every existing `high()`.
    pub fn append_next(&mut self, amount: u32) {
        let next_rank = self
            .entries
            .iter()
            .map(|e| e.key.high())
            .max()
            .map(|h| h + 1)
            .unwrap_or(1);
        self.entries.push(PrizeEntry {
            key: RangeKey::single(next_rank),
            amount,
        });
    }

    /// Entries under the display ordering (descending by upper bound,
    /// declaration order on ties). The reconciler walks this same order.
    pub fn sorted_entries(&self) -> Vec<(RangeKey, u32)> {
        let mut sorted: Vec<(RangeKey, u32)> =
            self.entries.iter().map(|e| (e.key, e.amount)).collect();
        sorted.sort_by(|a, b| RangeKey::compare_for_display(&a.0, &b.0));
        sorted
    }

    /// Total amount promised across all covered positions.
    pub fn total_committed(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.amount as u64 * (e.key.high() - e.key.low() + 1) as u64)
            .sum()
    }
}

impl Serialize for PrizeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key.to_string(), &entry.amount)?;
        }
        map.end()
    }
}

struct PrizeTableVisitor;

impl<'de> Visitor<'de> for PrizeTableVisitor {
    type Value = PrizeTable;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of range keys to amounts")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = PrizeTable::new();
        while let Some((key, amount)) = access.next_entry::<String, u32>()? {
            table.set(&key, amount).map_err(serde::de::Error::custom)?;
        }
        Ok(table)
    }
}

impl<'de> Deserialize<'de> for PrizeTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PrizeTableVisitor)
    }
}
