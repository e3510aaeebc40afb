//! Core data models for the event console.

mod event;
mod ids;
mod ledger;
mod participant;
mod presets;
mod prize_table;
mod range_key;

pub use event::*;
pub use ids::*;
pub use ledger::*;
pub use participant::*;
pub use presets::*;
pub use prize_table::*;
pub use range_key::*;
