//! Canonical prize presets keyed by participant-count tier.
//!
//! Selecting a tier during authoring replaces the working prize table
//! wholesale; tier 0 means "custom, start empty".

use thiserror::Error;

use super::prize_table::PrizeTable;

/// Tiers with a canonical prize table.
pub const PRESET_TIERS: [u32; 3] = [0, 16, 32];

/// Errors from preset resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    #[error("no prize preset for tier {0} (known tiers: 0, 16, 32)")]
    UnknownTier(u32),
}

/// Whether a tier has a canonical preset.
pub fn is_preset_tier(tier: u32) -> bool {
    PRESET_TIERS.contains(&tier)
}

/// Resolve a participant-count tier to its canonical prize table.
///
/// Pure; callers replace their working table with the result (no merge).
pub fn resolve_preset(tier: u32) -> Result<PrizeTable, PresetError> {
    let rows: &[(&str, u32)] = match tier {
        0 => &[],
        16 => &[
            ("1", 100),
            ("2", 75),
            ("3", 50),
            ("4", 25),
            ("5-16", 15),
            ("17-100", 10),
        ],
        32 => &[
            ("1", 200),
            ("2", 150),
            ("3", 100),
            ("4", 50),
            ("5-8", 25),
            ("9-16", 15),
            ("17-100", 10),
        ],
        other => return Err(PresetError::UnknownTier(other)),
    };

    let mut table = PrizeTable::new();
    for (key, amount) in rows {
        // Keys above are literals; parse cannot fail.
        table
            .set(key, *amount)
            .expect("preset keys are well-formed");
    }
    Ok(table)
}
