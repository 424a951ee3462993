//! Lookup results, errors and the UI-facing lookup state machine

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::amount::format_units;

/// Errors surfaced to the user by a lookup or a wallet action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// Input is neither an address nor an ENS name; no request was made
    #[error("Invalid address or ENS name: {0}")]
    InvalidQuery(String),
    /// Name is well-formed but resolves to nothing
    #[error("Could not resolve {0}")]
    UnresolvableName(String),
    /// Any network or API failure, including a single failed metadata fetch
    #[error("Request failed: {0}")]
    RemoteFailure(String),
    /// No wallet endpoint, or the wallet refused authorization
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),
}

impl LookupError {
    pub fn kind(&self) -> &'static str {
        match self {
            LookupError::InvalidQuery(_) => "invalid query",
            LookupError::UnresolvableName(_) => "unresolvable name",
            LookupError::RemoteFailure(_) => "remote failure",
            LookupError::WalletUnavailable(_) => "wallet unavailable",
        }
    }
}

/// One (contract, raw balance) pair as returned by the indexing API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalanceEntry {
    pub contract: Address,
    pub raw_balance: U256,
}

/// Display metadata for a token contract. Every field may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub decimals: Option<u8>,
    pub logo: Option<String>,
}

/// A balance joined with its token metadata, ready to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub contract: String,
    pub symbol: String,
    pub name: Option<String>,
    pub decimals: u8,
    pub raw_balance: String,
    pub balance: String,
    pub logo: Option<String>,
    #[serde(skip)]
    pub is_zero: bool,
}

impl DisplayRow {
    pub fn new(entry: &TokenBalanceEntry, metadata: &TokenMetadata) -> Self {
        let contract = entry.contract.to_checksum(None);
        let decimals = metadata.decimals.unwrap_or(0);
        let symbol = metadata
            .symbol
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| short_addr(&contract));

        Self {
            symbol,
            name: metadata.name.clone().filter(|s| !s.trim().is_empty()),
            decimals,
            raw_balance: entry.raw_balance.to_string(),
            balance: format_units(entry.raw_balance, decimals),
            logo: metadata.logo.clone().filter(|s| !s.trim().is_empty()),
            is_zero: entry.raw_balance.is_zero(),
            contract,
        }
    }
}

/// Successful lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub query: String,
    pub address: Address,
    /// ENS name the address was resolved from, if any
    pub resolved_from: Option<String>,
    pub rows: Vec<DisplayRow>,
    pub fetched_at: DateTime<Local>,
}

/// Monotonic token attached to every lookup request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Issues request ids and remembers the latest one
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: u64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestId {
        self.latest += 1;
        RequestId(self.latest)
    }

    pub fn latest(&self) -> Option<RequestId> {
        (self.latest > 0).then_some(RequestId(self.latest))
    }

    /// Only the most recently issued request may update the screen
    pub fn is_current(&self, id: RequestId) -> bool {
        id.0 == self.latest
    }
}

/// What the results area is showing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LookupState {
    #[default]
    Idle,
    Loading {
        request: RequestId,
        query: String,
    },
    Success(LookupOutcome),
    Failure {
        query: String,
        error: LookupError,
    },
}

impl LookupState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LookupState::Loading { .. })
    }

    pub fn rows(&self) -> &[DisplayRow] {
        match self {
            LookupState::Success(outcome) => &outcome.rows,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&LookupError> {
        match self {
            LookupState::Failure { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub fn short_addr(value: &str) -> String {
    let value = value.trim();
    if value.len() <= 10 {
        return value.to_string();
    }
    let start: String = value.chars().take(6).collect();
    let end: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("{}..{}", start, end)
}
