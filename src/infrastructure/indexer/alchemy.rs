//! Alchemy JSON-RPC client (token API + ENS over `eth_call`)

use std::fmt::Debug;

use alloy::providers::Provider;
use alloy_primitives::{Address, Bytes};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ApiEndpoint;
use crate::domain::{parse_raw_balance, TokenBalanceEntry, TokenMetadata};
use crate::infrastructure::indexer::ens::{self, EthCall};
use crate::infrastructure::indexer::IndexingApi;
use crate::infrastructure::rpc::{self, HttpFillProvider};

/// `alchemy_getTokenBalances` result
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenBalancesResponse {
    #[serde(default)]
    token_balances: Vec<RawTokenBalance>,
    #[serde(default)]
    page_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenBalance {
    contract_address: String,
    #[serde(default)]
    token_balance: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// `alchemy_getTokenMetadata` result
#[derive(Debug, Deserialize)]
pub(crate) struct TokenMetadataResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    decimals: Option<u64>,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct CallRequest {
    to: Address,
    data: Bytes,
}

/// Token indexing client for Alchemy's enhanced JSON-RPC endpoint
pub struct AlchemyClient {
    provider: HttpFillProvider,
    endpoint: ApiEndpoint,
}

impl AlchemyClient {
    pub fn new(endpoint: ApiEndpoint) -> Result<Self> {
        let provider = rpc::connect_http(&endpoint.url)
            .with_context(|| format!("Invalid indexing API URL for {}", endpoint.display))?;
        Ok(Self::with_provider(provider, endpoint))
    }

    /// Client over an already built provider
    pub fn with_provider(provider: HttpFillProvider, endpoint: ApiEndpoint) -> Self {
        Self { provider, endpoint }
    }

    async fn request<P, R>(&self, method: &'static str, params: P) -> Result<R>
    where
        P: Serialize + Clone + Debug + Send + Sync + Unpin,
        R: DeserializeOwned + Debug + Send + Sync + Unpin + 'static,
    {
        debug!(method, endpoint = %self.endpoint.display, "rpc request");
        self.provider
            .raw_request(method.into(), params)
            .await
            .with_context(|| format!("{} request failed", method))
    }
}

#[async_trait::async_trait]
impl EthCall for AlchemyClient {
    async fn call(&self, to: Address, data: Vec<u8>) -> Result<Bytes> {
        let call = CallRequest {
            to,
            data: data.into(),
        };
        self.request("eth_call", (call, "latest")).await
    }
}

#[async_trait::async_trait]
impl IndexingApi for AlchemyClient {
    async fn resolve_name(&self, name: &str) -> Result<Option<Address>> {
        ens::resolve_name(self, name).await
    }

    async fn get_token_balances(&self, owner: Address) -> Result<Vec<TokenBalanceEntry>> {
        let response: TokenBalancesResponse = self
            .request("alchemy_getTokenBalances", (owner, "erc20"))
            .await?;
        decode_token_balances(response)
    }

    async fn get_token_metadata(&self, contract: Address) -> Result<TokenMetadata> {
        let response: TokenMetadataResponse = self
            .request("alchemy_getTokenMetadata", (contract,))
            .await?;
        decode_token_metadata(response)
            .with_context(|| format!("Bad metadata for {}", contract.to_checksum(None)))
    }

    fn endpoint_name(&self) -> String {
        self.endpoint.display.clone()
    }
}

pub(crate) fn decode_token_balances(
    response: TokenBalancesResponse,
) -> Result<Vec<TokenBalanceEntry>> {
    if response.page_key.is_some() {
        warn!("token balance list truncated to the first page");
    }

    response
        .token_balances
        .into_iter()
        .map(|raw| {
            let contract: Address = raw
                .contract_address
                .parse()
                .with_context(|| format!("Invalid contract address: {}", raw.contract_address))?;
            let raw_balance = match (&raw.token_balance, &raw.error) {
                (Some(value), _) => parse_raw_balance(value)?,
                (None, err) => {
                    if let Some(err) = err {
                        warn!(contract = %contract, error = %err, "balance unavailable, showing zero");
                    }
                    Default::default()
                }
            };
            Ok(TokenBalanceEntry {
                contract,
                raw_balance,
            })
        })
        .collect()
}

pub(crate) fn decode_token_metadata(response: TokenMetadataResponse) -> Result<TokenMetadata> {
    let decimals = response
        .decimals
        .map(|d| u8::try_from(d).with_context(|| format!("decimals out of range: {}", d)))
        .transpose()?;
    Ok(TokenMetadata {
        symbol: response.symbol,
        name: response.name,
        decimals,
        logo: response.logo,
    })
}
