//! Balance resolution workflow
//!
//! classify -> resolve name -> fetch balances -> fetch metadata (concurrent)
//! -> join by contract. Any failure aborts the whole lookup.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use chrono::Local;
use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::domain::{
    DisplayRow, LookupError, LookupOutcome, QueryKind, TokenBalanceEntry, TokenMetadata,
};
use crate::infrastructure::indexer::IndexingApi;

#[derive(Debug, Clone)]
pub struct LookupOptions {
    /// Upper bound for every single remote call
    pub request_timeout: Duration,
    pub hide_zero_balances: bool,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            hide_zero_balances: false,
        }
    }
}

pub struct BalanceLookup {
    api: Arc<dyn IndexingApi>,
    options: LookupOptions,
}

impl BalanceLookup {
    pub fn new(api: Arc<dyn IndexingApi>, options: LookupOptions) -> Self {
        Self { api, options }
    }

    /// Run one full lookup for a raw user query
    pub async fn resolve(&self, query: &str) -> Result<LookupOutcome, LookupError> {
        let query = query.trim().to_string();

        let (address, resolved_from) = match QueryKind::classify(&query)? {
            QueryKind::Address(address) => (address, None),
            QueryKind::Name(name) => {
                let resolved = self
                    .bounded("resolve name", self.api.resolve_name(&name))
                    .await?;
                match resolved {
                    Some(address) if !address.is_zero() => {
                        debug!(name = %name, address = %address, "name resolved");
                        (address, Some(name))
                    }
                    _ => return Err(LookupError::UnresolvableName(name)),
                }
            }
        };

        info!(query = %query, address = %address, "fetching token balances");

        let balances = self
            .bounded("fetch token balances", self.api.get_token_balances(address))
            .await?;

        let contracts = distinct_contracts(&balances);
        let metadata = self.fetch_metadata(&contracts).await?;

        let mut rows = assemble_rows(&balances, metadata)?;
        if self.options.hide_zero_balances {
            rows.retain(|row| !row.is_zero);
        }

        info!(query = %query, tokens = rows.len(), "lookup complete");

        Ok(LookupOutcome {
            query,
            address,
            resolved_from,
            rows,
            fetched_at: Local::now(),
        })
    }

    /// Fetch metadata for every contract concurrently.
    ///
    /// Output has one record per input contract, in input order, regardless of
    /// completion order. The first failure aborts the batch.
    pub async fn fetch_metadata(
        &self,
        contracts: &[Address],
    ) -> Result<Vec<(Address, TokenMetadata)>, LookupError> {
        let calls = contracts.iter().map(|&contract| async move {
            let metadata = self
                .bounded("fetch token metadata", self.api.get_token_metadata(contract))
                .await?;
            Ok::<_, LookupError>((contract, metadata))
        });
        try_join_all(calls).await
    }

    async fn bounded<T>(
        &self,
        what: &str,
        call: impl Future<Output = anyhow::Result<T>>,
    ) -> Result<T, LookupError> {
        match tokio::time::timeout(self.options.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!("{} failed: {:#}", what, err);
                Err(LookupError::RemoteFailure(format!("{}: {:#}", what, err)))
            }
            Err(_) => {
                warn!("{} timed out", what);
                Err(LookupError::RemoteFailure(format!(
                    "{}: timed out after {}s",
                    what,
                    self.options.request_timeout.as_secs_f32()
                )))
            }
        }
    }
}

/// Contracts in first-seen order, without duplicates
pub fn distinct_contracts(balances: &[TokenBalanceEntry]) -> Vec<Address> {
    let mut seen = HashSet::new();
    balances
        .iter()
        .map(|entry| entry.contract)
        .filter(|contract| seen.insert(*contract))
        .collect()
}

/// Join balances with metadata by contract address, keeping balance order
pub fn assemble_rows(
    balances: &[TokenBalanceEntry],
    metadata: Vec<(Address, TokenMetadata)>,
) -> Result<Vec<DisplayRow>, LookupError> {
    let by_contract: HashMap<Address, TokenMetadata> = metadata.into_iter().collect();
    balances
        .iter()
        .map(|entry| {
            by_contract
                .get(&entry.contract)
                .map(|meta| DisplayRow::new(entry, meta))
                .ok_or_else(|| {
                    LookupError::RemoteFailure(format!(
                        "no metadata for {}",
                        entry.contract.to_checksum(None)
                    ))
                })
        })
        .collect()
}
