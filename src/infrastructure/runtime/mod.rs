//! Runtime infrastructure - Tokio runtime bridge for async operations

mod bridge;
pub mod lookup;
mod worker;

pub use bridge::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
pub use lookup::{BalanceLookup, LookupOptions};
pub use worker::run_async_worker;
