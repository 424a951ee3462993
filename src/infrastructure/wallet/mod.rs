//! Wallet session management
//!
//! The session only tracks whether a wallet has authorized us and which
//! accounts it exposed. Authorization itself is delegated to a
//! [`WalletConnector`].

mod provider;

use alloy_primitives::Address;
use tracing::{info, warn};

use crate::domain::LookupError;

pub use provider::RpcWalletConnector;

/// External wallet capable of authorizing this client
#[async_trait::async_trait]
pub trait WalletConnector: Send + Sync + 'static {
    /// Ask the wallet for access; returns the authorized accounts
    async fn activate(&self) -> Result<Vec<Address>, LookupError>;

    /// Drop the authorization
    async fn deactivate(&self);

    /// Whether the connector currently holds an authorization
    fn is_active(&self) -> bool;

    /// Endpoint display name
    fn describe(&self) -> String;
}

/// Connector used when no wallet endpoint is configured
#[derive(Debug, Default)]
pub struct NoWalletConnector;

#[async_trait::async_trait]
impl WalletConnector for NoWalletConnector {
    async fn activate(&self) -> Result<Vec<Address>, LookupError> {
        Err(LookupError::WalletUnavailable(
            "no wallet endpoint configured (set wallet_rpc)".to_string(),
        ))
    }

    async fn deactivate(&self) {}

    fn is_active(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WalletState {
    #[default]
    Disconnected,
    Connected {
        accounts: Vec<Address>,
    },
}

/// Connected/disconnected state over a connector
pub struct WalletSession {
    connector: Box<dyn WalletConnector>,
    state: WalletState,
}

impl WalletSession {
    pub fn new(connector: Box<dyn WalletConnector>) -> Self {
        Self {
            connector,
            state: WalletState::Disconnected,
        }
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    /// Connected only while the connector still holds the grant
    pub fn is_connected(&self) -> bool {
        matches!(self.state, WalletState::Connected { .. }) && self.connector.is_active()
    }

    pub fn accounts(&self) -> &[Address] {
        match &self.state {
            WalletState::Connected { accounts } => accounts,
            WalletState::Disconnected => &[],
        }
    }

    pub fn describe(&self) -> String {
        self.connector.describe()
    }

    /// Request authorization. On failure the session stays disconnected.
    pub async fn connect(&mut self) -> Result<&[Address], LookupError> {
        match self.connector.activate().await {
            Ok(accounts) if !accounts.is_empty() => {
                info!(
                    wallet = %self.connector.describe(),
                    accounts = accounts.len(),
                    "wallet connected"
                );
                self.state = WalletState::Connected { accounts };
                Ok(self.accounts())
            }
            Ok(_) => {
                self.state = WalletState::Disconnected;
                Err(LookupError::WalletUnavailable(
                    "wallet exposed no accounts".to_string(),
                ))
            }
            Err(err) => {
                warn!(wallet = %self.connector.describe(), "wallet connect failed: {}", err);
                self.state = WalletState::Disconnected;
                Err(err)
            }
        }
    }

    /// Tear the session down; always ends disconnected
    pub async fn disconnect(&mut self) {
        self.connector.deactivate().await;
        self.state = WalletState::Disconnected;
        info!(wallet = %self.connector.describe(), "wallet disconnected");
    }
}
