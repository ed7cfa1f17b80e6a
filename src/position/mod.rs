//! Position ledger: balances, cost basis, PnL and persistence

pub mod ledger;
pub mod store;
pub mod types;

pub use ledger::Position;
pub use store::{JsonFileStore, MemoryStore};
pub use types::{PositionState, PositionSummary, UnrealizedPnl};
