//! Domain models for token lookups
//!
//! Pure logic with no I/O: query classification, amount formatting,
//! input debouncing and the lookup state machine.

pub mod amount;
pub mod debounce;
pub mod lookup;
pub mod query;

pub use amount::{format_units, parse_raw_balance};
pub use debounce::Debouncer;
pub use lookup::{
    DisplayRow, LookupError, LookupOutcome, LookupState, RequestId, RequestTracker,
    TokenBalanceEntry, TokenMetadata,
};
pub use query::{get_address, is_address, is_valid_ens_name, parse_address, QueryKind};
