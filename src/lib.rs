//! # Event Console
//!
//! A local admin console engine for community gaming events: prize table
//! authoring, localized prize and instruction copy, ranking reconciliation,
//! and payout of prize credits.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (events, prize tables, range keys,
//!   locale ledgers, participants)
//! - **reconcile**: Ranking order, prize coverage, and payout computation
//! - **distribute**: Bulk spreadsheet-style distribution rows
//! - **store**: Persistence (in-memory and JSONL-backed)
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod config;
pub mod distribute;
pub mod models;
pub mod reconcile;
pub mod store;

pub use models::*;
