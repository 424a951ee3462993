//! Test doubles for the indexing API and the wallet

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Result};

use erc20_indexer::domain::{LookupError, TokenBalanceEntry, TokenMetadata};
use erc20_indexer::infrastructure::{IndexingApi, WalletConnector};

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn balance(contract: Address, raw: u64) -> TokenBalanceEntry {
    TokenBalanceEntry {
        contract,
        raw_balance: U256::from(raw),
    }
}

pub fn meta(symbol: &str, decimals: u8) -> TokenMetadata {
    TokenMetadata {
        symbol: Some(symbol.to_string()),
        name: Some(format!("{} Token", symbol)),
        decimals: Some(decimals),
        logo: None,
    }
}

/// In-memory indexing API with call counters, per-call delays and failures
#[derive(Default)]
pub struct MockIndexer {
    pub names: HashMap<String, Address>,
    pub balances: HashMap<Address, Vec<TokenBalanceEntry>>,
    pub metadata: HashMap<Address, TokenMetadata>,
    pub metadata_delays: HashMap<Address, Duration>,
    pub failing_metadata: HashSet<Address>,
    pub balance_delay: Option<Duration>,
    pub fail_balances: bool,
    pub resolve_calls: AtomicUsize,
    pub balance_calls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    /// Metadata contracts in completion order
    pub completed_metadata: Mutex<Vec<Address>>,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str, address: Address) -> Self {
        self.names.insert(name.to_string(), address);
        self
    }

    pub fn with_balances(mut self, owner: Address, entries: Vec<TokenBalanceEntry>) -> Self {
        self.balances.insert(owner, entries);
        self
    }

    pub fn with_token(mut self, contract: Address, metadata: TokenMetadata) -> Self {
        self.metadata.insert(contract, metadata);
        self
    }

    pub fn with_metadata_delay(mut self, contract: Address, delay: Duration) -> Self {
        self.metadata_delays.insert(contract, delay);
        self
    }

    pub fn with_failing_metadata(mut self, contract: Address) -> Self {
        self.failing_metadata.insert(contract);
        self
    }

    pub fn with_balance_delay(mut self, delay: Duration) -> Self {
        self.balance_delay = Some(delay);
        self
    }

    pub fn failing_balances(mut self) -> Self {
        self.fail_balances = true;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
            + self.balance_calls.load(Ordering::SeqCst)
            + self.metadata_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IndexingApi for MockIndexer {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.names.get(name).copied())
    }

    async fn get_token_balances(&self, owner: Address) -> Result<Vec<TokenBalanceEntry>> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.balance_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_balances {
            return Err(anyhow!("HTTP 503 Service Unavailable"));
        }
        Ok(self.balances.get(&owner).cloned().unwrap_or_default())
    }

    async fn get_token_metadata(&self, contract: Address) -> Result<TokenMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.metadata_delays.get(&contract) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_metadata.contains(&contract) {
            return Err(anyhow!("metadata unavailable for {}", contract));
        }
        if let Ok(mut done) = self.completed_metadata.lock() {
            done.push(contract);
        }
        Ok(self.metadata.get(&contract).cloned().unwrap_or_default())
    }

    fn endpoint_name(&self) -> String {
        "mock".to_string()
    }
}

/// Counters shared between a [`MockWallet`] and the test
#[derive(Default)]
pub struct WalletProbe {
    pub active: AtomicBool,
    pub activations: AtomicUsize,
    pub deactivations: AtomicUsize,
}

/// Wallet that grants or refuses access on demand
pub struct MockWallet {
    pub response: Result<Vec<Address>, LookupError>,
    pub probe: Arc<WalletProbe>,
}

impl MockWallet {
    pub fn granting(accounts: Vec<Address>) -> Self {
        Self {
            response: Ok(accounts),
            probe: Arc::default(),
        }
    }

    pub fn refusing() -> Self {
        Self {
            response: Err(LookupError::WalletUnavailable(
                "request rejected in wallet".to_string(),
            )),
            probe: Arc::default(),
        }
    }

    pub fn probe(&self) -> Arc<WalletProbe> {
        Arc::clone(&self.probe)
    }
}

#[async_trait::async_trait]
impl WalletConnector for MockWallet {
    async fn activate(&self) -> Result<Vec<Address>, LookupError> {
        self.probe.activations.fetch_add(1, Ordering::SeqCst);
        let response = self.response.clone();
        self.probe.active.store(response.is_ok(), Ordering::SeqCst);
        response
    }

    async fn deactivate(&self) {
        self.probe.deactivations.fetch_add(1, Ordering::SeqCst);
        self.probe.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.probe.active.load(Ordering::SeqCst)
    }

    fn describe(&self) -> String {
        "mock-wallet".to_string()
    }
}
