//! Bulk distribution rows.
//!
//! The manual-override path: an operator downloads a participant template,
//! fills in amounts in a spreadsheet, and uploads it back. File parsing is
//! a collaborator concern; this module works on already-parsed rows and
//! produces the same `id -> amount` shape the reconciler emits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Participant, ParticipantId};

/// One parsed spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Amount to credit (the operator-filled column).
    pub metric: u32,
}

/// Build a payout mapping from uploaded rows.
///
/// Rows with a zero metric are dropped; a duplicated id keeps the last
/// row's amount (map-insert semantics).
pub fn payouts_from_rows(rows: &[ImportRow]) -> BTreeMap<ParticipantId, u32> {
    rows.iter()
        .filter(|row| row.metric > 0)
        .map(|row| (ParticipantId::from(row.id.as_str()), row.metric))
        .collect()
}

/// Rows for the downloadable participant template, best performers first.
///
/// The metric column is pre-filled with credits earned so operators see
/// current standings while assigning amounts.
pub fn template_rows(participants: &[Participant]) -> Vec<ImportRow> {
    let mut rows: Vec<ImportRow> = participants
        .iter()
        .map(|p| ImportRow {
            id: p.id.as_str().to_string(),
            name: p.user_name.clone().unwrap_or_default(),
            email: p.email.clone().unwrap_or_default(),
            metric: p.credits_earned,
        })
        .collect();
    rows.sort_by(|a, b| b.metric.cmp(&a.metric));
    rows
}
