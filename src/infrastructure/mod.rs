//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - The token indexing API client (Alchemy JSON-RPC, ENS over `eth_call`)
//! - Wallet connectors built on alloy providers
//! - Shared alloy HTTP provider setup
//! - Tokio runtime bridge for async operations

pub mod indexer;
pub mod rpc;
pub mod runtime;
pub mod wallet;

pub use indexer::{AlchemyClient, IndexingApi};
pub use runtime::{BalanceLookup, LookupOptions, RuntimeBridge, RuntimeCommand, RuntimeEvent};
pub use wallet::{NoWalletConnector, RpcWalletConnector, WalletConnector, WalletSession};
