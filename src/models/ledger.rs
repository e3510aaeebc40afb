//! Per-locale ordered entry ledgers.
//!
//! Both the free-text prize descriptions (`appStringPrizes`) and the
//! instructions-to-participate list share one contract: entries are
//! addressed by index within a locale, removal shifts later indices down,
//! and a locale emptied by removal disappears from the mapping entirely.
//! `LocaleLedger` implements that contract once, generic over entry type.
//!
//! Index addressing means any external reference to "the Nth entry" is
//! stale after a removal and must be re-derived from current state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from ledger mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("locale {0:?} has no entries")]
    UnknownLocale(String),

    #[error("index {index} out of range for locale {locale:?} (len {len})")]
    IndexOutOfRange {
        locale: String,
        index: usize,
        len: usize,
    },
}

/// A free-text prize row shown in the app: placement label plus prize text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringPrize {
    pub title: String,
    pub prize: String,
}

/// Which field of a [`StringPrize`] to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrizeField {
    Title,
    Prize,
}

impl StringPrize {
    pub fn set_field(&mut self, field: PrizeField, value: String) {
        match field {
            PrizeField::Title => self.title = value,
            PrizeField::Prize => self.prize = value,
        }
    }
}

/// Ordered per-locale entry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleLedger<T> {
    entries: BTreeMap<String, Vec<T>>,
}

impl<T> Default for LocaleLedger<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

/// Free-text prize descriptions per locale.
pub type StringPrizeLedger = LocaleLedger<StringPrize>;

/// Participation instructions per locale.
pub type InstructionLedger = LocaleLedger<String>;

impl<T> LocaleLedger<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// No locales at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.entries.contains_key(locale)
    }

    /// Locales that currently have entries.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Entries for a locale, if any.
    pub fn entries(&self, locale: &str) -> Option<&[T]> {
        self.entries.get(locale).map(|v| v.as_slice())
    }

    /// Append an entry, creating the locale sequence if absent.
    pub fn push_entry(&mut self, locale: &str, entry: T) {
        self.entries.entry(locale.to_string()).or_default().push(entry);
    }

    /// Append a default entry (the "add row" button during authoring).
    pub fn add_entry(&mut self, locale: &str)
    where
        T: Default,
    {
        self.push_entry(locale, T::default());
    }

    /// Apply `f` to the entry at `index` in `locale`.
    pub fn update_entry(
        &mut self,
        locale: &str,
        index: usize,
        f: impl FnOnce(&mut T),
    ) -> Result<(), LedgerError> {
        let seq = self
            .entries
            .get_mut(locale)
            .ok_or_else(|| LedgerError::UnknownLocale(locale.to_string()))?;
        let len = seq.len();
        let entry = seq.get_mut(index).ok_or(LedgerError::IndexOutOfRange {
            locale: locale.to_string(),
            index,
            len,
        })?;
        f(entry);
        Ok(())
    }

    /// Remove the entry at `index`, shifting later entries down.
    /// A locale left empty is deleted from the mapping.
    pub fn remove_entry(&mut self, locale: &str, index: usize) -> Result<T, LedgerError> {
        let seq = self
            .entries
            .get_mut(locale)
            .ok_or_else(|| LedgerError::UnknownLocale(locale.to_string()))?;
        if index >= seq.len() {
            return Err(LedgerError::IndexOutOfRange {
                locale: locale.to_string(),
                index,
                len: seq.len(),
            });
        }
        let removed = seq.remove(index);
        if seq.is_empty() {
            self.entries.remove(locale);
        }
        Ok(removed)
    }
}

impl StringPrizeLedger {
    /// Update one field of a prize row (the form binds title and prize
    /// text boxes separately).
    pub fn update_field(
        &mut self,
        locale: &str,
        index: usize,
        field: PrizeField,
        value: String,
    ) -> Result<(), LedgerError> {
        self.update_entry(locale, index, |entry| entry.set_field(field, value))
    }
}
