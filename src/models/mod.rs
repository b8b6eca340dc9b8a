//! Domain models shared by the asset and balance caches

mod account;
mod asset;
mod balance;
mod delta;

pub use account::*;
pub use asset::*;
pub use balance::*;
pub use delta::*;
