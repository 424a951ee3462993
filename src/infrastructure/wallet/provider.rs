//! Wallet connector over a wallet's JSON-RPC endpoint
//!
//! Desktop wallets (Frame, Rabby desktop, a local signer node) expose the same
//! `eth_requestAccounts` flow an injected browser provider does.

use std::sync::atomic::{AtomicBool, Ordering};

use alloy::primitives::Address;
use alloy::providers::Provider;
use alloy::transports::TransportError;
use anyhow::{Context, Result};
use tracing::debug;

use crate::domain::LookupError;
use crate::infrastructure::rpc::{self, error_code, HttpFillProvider, METHOD_NOT_FOUND};
use crate::infrastructure::wallet::WalletConnector;

/// EIP-1193 "user rejected the request"
const USER_REJECTED: i64 = 4001;

pub struct RpcWalletConnector {
    provider: HttpFillProvider,
    endpoint: String,
    active: AtomicBool,
}

impl RpcWalletConnector {
    pub fn new(endpoint: &str) -> Result<Self> {
        let provider = rpc::connect_http(endpoint).context("Invalid wallet RPC URL")?;
        Ok(Self::with_provider(provider, endpoint))
    }

    pub fn with_provider(provider: HttpFillProvider, endpoint: &str) -> Self {
        Self {
            provider,
            endpoint: endpoint.to_string(),
            active: AtomicBool::new(false),
        }
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, TransportError> {
        match self
            .provider
            .raw_request::<_, Vec<Address>>("eth_requestAccounts".into(), ())
            .await
        {
            Err(err) if error_code(&err) == Some(METHOD_NOT_FOUND) => {
                debug!(endpoint = %self.endpoint, "eth_requestAccounts unsupported, using eth_accounts");
                self.provider.get_accounts().await
            }
            other => other,
        }
    }
}

#[async_trait::async_trait]
impl WalletConnector for RpcWalletConnector {
    async fn activate(&self) -> Result<Vec<Address>, LookupError> {
        let accounts = self.request_accounts().await.map_err(|err| {
            let reason = match error_code(&err) {
                Some(USER_REJECTED) => "request rejected in wallet".to_string(),
                _ => format!("{} ({})", err, self.endpoint),
            };
            LookupError::WalletUnavailable(reason)
        })?;
        self.active.store(!accounts.is_empty(), Ordering::SeqCst);
        Ok(accounts)
    }

    async fn deactivate(&self) {
        // Wallet RPC has no revoke call; forgetting the grant is enough here
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
