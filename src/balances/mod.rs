//! Balance cache: per-account, per-asset balances

mod manager;
mod state;

pub use manager::*;
pub use state::*;
