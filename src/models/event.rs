//! Persisted event record.
//!
//! Wire names are camelCase to match the stored event sub-document
//! (`prices`, `appStringPrizes`, `instructionsToParticipate`,
//! `participantNumber`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ids::{EntityId, EventId};
use super::ledger::{InstructionLedger, StringPrizeLedger};
use super::presets::{resolve_preset, PresetError};
use super::prize_table::PrizeTable;

/// Reward multipliers applied to in-event earnings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardMultipliers {
    pub xq: f64,
    pub qoins: f64,
}

impl Default for RewardMultipliers {
    fn default() -> Self {
        Self { xq: 1.0, qoins: 1.0 }
    }
}

/// A timed community event as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Content-hash identifier (title + creation timestamp).
    pub id: EventId,

    /// Per-locale titles.
    #[serde(rename = "title")]
    pub titles: BTreeMap<String, String>,

    /// Per-locale descriptions.
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,

    /// Per-locale description headings.
    #[serde(default)]
    pub descriptions_title: BTreeMap<String, String>,

    #[serde(default)]
    pub streamer_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streamer_channel_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streamer_photo: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_platform_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord_link: Option<String>,

    #[serde(default)]
    pub platform: String,

    #[serde(default)]
    pub game: String,

    /// Numeric prize table (range key text -> amount).
    #[serde(default)]
    pub prices: PrizeTable,

    /// Free-text prize descriptions per locale.
    #[serde(default)]
    pub app_string_prizes: StringPrizeLedger,

    /// Participation instructions per locale.
    #[serde(default)]
    pub instructions_to_participate: InstructionLedger,

    /// Preset tier the prize table was derived from; 0 when custom.
    #[serde(default)]
    pub participant_number: u32,

    /// Entry cost in credits.
    #[serde(default)]
    pub event_entry: u32,

    /// Accept join requests automatically instead of reviewing them.
    #[serde(default)]
    pub accept_all_users: bool,

    #[serde(default)]
    pub featured: bool,

    /// Head-to-head match event (ranking driven by victories).
    #[serde(default)]
    pub is_matches_event: bool,

    #[serde(default)]
    pub custom_rewards_multipliers: RewardMultipliers,

    /// Whether the event is currently running.
    #[serde(default)]
    pub active: bool,

    /// Scheduled start, absent for templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl EventRecord {
    /// Create a new event with an auto-generated ID from the given title
    /// (stored under `locale`) and the creation time.
    pub fn new(locale: &str, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let title = title.into();
        let id = EntityId::generate(&[&title, &created_at.timestamp_millis().to_string()]);
        let mut titles = BTreeMap::new();
        titles.insert(locale.to_string(), title);

        Self {
            id,
            titles,
            descriptions: BTreeMap::new(),
            descriptions_title: BTreeMap::new(),
            streamer_name: String::new(),
            streamer_channel_link: None,
            streamer_photo: None,
            streaming_platform_image: None,
            sponsor_image: None,
            background_image: None,
            discord_link: None,
            platform: String::new(),
            game: String::new(),
            prices: PrizeTable::new(),
            app_string_prizes: StringPrizeLedger::new(),
            instructions_to_participate: InstructionLedger::new(),
            participant_number: 0,
            event_entry: 0,
            accept_all_users: true,
            featured: false,
            is_matches_event: false,
            custom_rewards_multipliers: RewardMultipliers::default(),
            active: false,
            scheduled_at: None,
            created_at,
        }
    }

    /// Builder method to set the streamer name.
    pub fn with_streamer(mut self, name: impl Into<String>) -> Self {
        self.streamer_name = name.into();
        self
    }

    /// Builder method to set platform and game.
    pub fn with_game(mut self, platform: impl Into<String>, game: impl Into<String>) -> Self {
        self.platform = platform.into();
        self.game = game.into();
        self
    }

    /// Builder method to set the prize table.
    pub fn with_prizes(mut self, prices: PrizeTable) -> Self {
        self.prices = prices;
        self
    }

    /// Builder method to set the scheduled start.
    pub fn with_schedule(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// Title for a locale, if set.
    pub fn title(&self, locale: &str) -> Option<&str> {
        self.titles.get(locale).map(|s| s.as_str())
    }

    pub fn set_title(&mut self, locale: &str, value: impl Into<String>) {
        self.titles.insert(locale.to_string(), value.into());
    }

    pub fn set_description(&mut self, locale: &str, value: impl Into<String>) {
        self.descriptions.insert(locale.to_string(), value.into());
    }

    /// Select a participant-count tier: records the tier and replaces the
    /// prize table wholesale with the canonical preset (no merge).
    pub fn apply_preset(&mut self, tier: u32) -> Result<(), PresetError> {
        let preset = resolve_preset(tier)?;
        self.participant_number = tier;
        self.prices = preset;
        Ok(())
    }
}
