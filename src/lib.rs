//! ERC-20 token indexer: look up the token holdings of an address or ENS name.
//!
//! Layers:
//! - `domain` - query classification, amounts, debouncing, lookup state
//! - `infrastructure` - indexing API client, wallet connectors, Tokio runtime bridge
//! - `app` / `ui` - terminal state machine and ratatui rendering

pub mod app;
pub mod config;
pub mod domain;
pub mod export;
pub mod infrastructure;
pub mod ui;
