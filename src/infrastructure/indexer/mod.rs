//! Remote token indexing API
//!
//! The lookup workflow only talks to [`IndexingApi`]; the Alchemy client is
//! the production implementation and tests plug in their own.

mod alchemy;
pub mod ens;

use alloy_primitives::Address;
use anyhow::Result;

use crate::domain::{TokenBalanceEntry, TokenMetadata};

pub use alchemy::AlchemyClient;

/// Operations the balance lookup consumes from the indexing service
#[async_trait::async_trait]
pub trait IndexingApi: Send + Sync + 'static {
    /// Resolve an ENS name; `None` when nothing is registered
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>>;

    /// All ERC-20 balances held by `owner`, in API order
    async fn get_token_balances(&self, owner: Address) -> Result<Vec<TokenBalanceEntry>>;

    /// Symbol, decimals and logo of a token contract
    async fn get_token_metadata(&self, contract: Address) -> Result<TokenMetadata>;

    /// Endpoint display name (never includes credentials)
    fn endpoint_name(&self) -> String;
}
