pub mod events;
pub mod payouts;
