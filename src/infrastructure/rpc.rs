//! Shared alloy HTTP provider setup

use alloy::network::Ethereum;
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, ProviderBuilder, RootProvider,
};
use alloy::transports::TransportError;
use anyhow::{Context, Result};

pub type HttpFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// JSON-RPC "method not found"
pub const METHOD_NOT_FOUND: i64 = -32601;

pub fn connect_http(url: &str) -> Result<HttpFillProvider> {
    let rpc_url = url.parse().context("Invalid RPC URL")?;
    Ok(ProviderBuilder::new().connect_http(rpc_url))
}

/// JSON-RPC error code carried by a failed request, if the server sent one
pub fn error_code(err: &TransportError) -> Option<i64> {
    err.as_error_resp().map(|payload| payload.code)
}
