//! Ranking reconciliation.
//!
//! Turns a raw participant snapshot into a final ranking and walks it
//! against a prize table to produce per-user payouts:
//! - `build_ranking`: filter and order participants
//! - `compute_payouts`: position-by-position prize assignment
//! - `validate_disjoint`: opt-in strict check that prize spans don't overlap
//! - `payout_instructions`: ledger entries for the credit collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{Participant, ParticipantId, PrizeTable};

/// Ledger concept attached to every prize credit.
pub const PRIZE_CONCEPT: &str = "Event Prize";

/// Two prize ranges cover a common position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("prize ranges {first} and {second} overlap")]
pub struct OverlapError {
    pub first: String,
    pub second: String,
}

/// Ranking score for one participant.
///
/// Credits earned so far plus the 0..=1 win rate. Credits dominate; the
/// rate breaks ties among equal-credit participants. `None` when the
/// participant played no matches.
pub fn ranking_score(participant: &Participant) -> Option<f64> {
    participant
        .win_rate()
        .map(|rate| participant.credits_earned as f64 + rate)
}

/// Filter and order a raw snapshot into the final ranking.
///
/// Participants with no matches played are dropped; the rest sort
/// descending by `ranking_score`. The sort is stable, so snapshot order
/// decides exact-score ties and every participant lands on a distinct
/// position.
pub fn build_ranking(participants: &[Participant]) -> Vec<Participant> {
    let mut ranked: Vec<Participant> = participants
        .iter()
        .filter(|p| p.matches_played >= 1)
        .cloned()
        .collect();
    ranked.sort_by(|a, b| {
        let sa = ranking_score(a).unwrap_or(0.0);
        let sb = ranking_score(b).unwrap_or(0.0);
        sb.total_cmp(&sa)
    });
    ranked
}

/// Strict-mode validation: every pair of prize ranges must be disjoint.
///
/// `compute_payouts` is first-match-wins and stays well-defined either
/// way, but overlapping ranges almost always mean an authoring mistake,
/// so callers can run this before reconciliation.
pub fn validate_disjoint(table: &PrizeTable) -> Result<(), OverlapError> {
    let entries = table.sorted_entries();
    for (i, (a, _)) in entries.iter().enumerate() {
        for (b, _) in entries.iter().skip(i + 1) {
            if a.overlaps(b) {
                return Err(OverlapError {
                    first: a.to_string(),
                    second: b.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Compute the payout owed to each ranked participant.
///
/// Walks positions 1..=N in ranking order; each position gets the amount
/// of the first entry (in `sorted_entries` order) whose range contains it,
/// or 0 when no range covers it. Pure: identical inputs produce identical
/// mappings.
pub fn compute_payouts(
    ranking: &[Participant],
    table: &PrizeTable,
) -> BTreeMap<ParticipantId, u32> {
    let entries = table.sorted_entries();
    let mut payouts = BTreeMap::new();

    for (index, participant) in ranking.iter().enumerate() {
        let position = index as u32 + 1;
        let amount = entries
            .iter()
            .find(|(key, _)| key.contains(position))
            .map(|(_, amount)| *amount)
            .unwrap_or(0);
        payouts.insert(participant.id.clone(), amount);
    }

    payouts
}

/// One credit-ledger entry to hand to the balance collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutInstruction {
    pub user_id: ParticipantId,
    pub quantity: u32,
    pub concept: String,
    pub date: DateTime<Utc>,
}

/// Ledger instructions for every nonzero payout.
pub fn payout_instructions(
    payouts: &BTreeMap<ParticipantId, u32>,
    date: DateTime<Utc>,
) -> Vec<PayoutInstruction> {
    payouts
        .iter()
        .filter(|(_, amount)| **amount > 0)
        .map(|(id, amount)| PayoutInstruction {
            user_id: id.clone(),
            quantity: *amount,
            concept: PRIZE_CONCEPT.to_string(),
            date,
        })
        .collect()
}
