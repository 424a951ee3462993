use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const API_KEY_ENV: &str = "ALCHEMY_API_KEY";

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub network: Option<String>,
    pub rpc_url: Option<String>,
    pub wallet_rpc: Option<String>,
    pub debounce_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub hide_zero_balances: bool,
}

/// Networks served by the indexing API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    EthMainnet,
    EthSepolia,
    PolygonMainnet,
    ArbMainnet,
    OptMainnet,
    BaseMainnet,
}

impl Network {
    pub const ALL: [Network; 6] = [
        Network::EthMainnet,
        Network::EthSepolia,
        Network::PolygonMainnet,
        Network::ArbMainnet,
        Network::OptMainnet,
        Network::BaseMainnet,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Network::EthMainnet => "eth-mainnet",
            Network::EthSepolia => "eth-sepolia",
            Network::PolygonMainnet => "polygon-mainnet",
            Network::ArbMainnet => "arb-mainnet",
            Network::OptMainnet => "opt-mainnet",
            Network::BaseMainnet => "base-mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Network::ALL
            .into_iter()
            .find(|network| network.slug() == wanted)
            .with_context(|| {
                let known: Vec<&str> = Network::ALL.iter().map(Network::slug).collect();
                format!("Unknown network '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Where to send indexing API requests. `url` may embed the API key;
/// `display` never does.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub url: String,
    pub display: String,
}

impl fmt::Debug for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiEndpoint")
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

impl ApiEndpoint {
    pub fn alchemy(network: Network, api_key: &str) -> Self {
        let host = format!("https://{}.g.alchemy.com/v2", network.slug());
        Self {
            url: format!("{}/{}", host, api_key),
            display: format!("{}/…", host),
        }
    }

    pub fn custom(url: &str) -> Self {
        let url = normalize_http_endpoint(url);
        Self {
            display: url.clone(),
            url,
        }
    }
}

/// Values given on the command line, which win over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub network: Option<String>,
    pub rpc_url: Option<String>,
    pub wallet_rpc: Option<String>,
    pub debounce_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub hide_zero_balances: bool,
}

/// Effective runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub network: Network,
    pub endpoint: ApiEndpoint,
    pub wallet_rpc: Option<String>,
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub hide_zero_balances: bool,
}

impl Settings {
    /// Merge CLI overrides, environment and config file (in that order of precedence)
    pub fn resolve(config: Config, overrides: Overrides, env_api_key: Option<String>) -> Result<Self> {
        let network = match overrides.network.or(config.network) {
            Some(value) => value.parse()?,
            None => Network::default(),
        };

        let rpc_url = non_empty(overrides.rpc_url).or_else(|| non_empty(config.rpc_url));
        let endpoint = match rpc_url {
            Some(url) => ApiEndpoint::custom(&url),
            None => {
                let Some(api_key) = non_empty(env_api_key).or_else(|| non_empty(config.api_key))
                else {
                    bail!(
                        "No API key configured: set {} or `api_key` in {}",
                        API_KEY_ENV,
                        config_path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| "config.toml".to_string())
                    );
                };
                ApiEndpoint::alchemy(network, &api_key)
            }
        };

        let wallet_rpc = non_empty(overrides.wallet_rpc)
            .or_else(|| non_empty(config.wallet_rpc))
            .map(|url| normalize_http_endpoint(&url));

        let debounce_ms = overrides
            .debounce_ms
            .or(config.debounce_ms)
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        let timeout_secs = overrides
            .request_timeout_secs
            .or(config.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1);

        Ok(Self {
            network,
            endpoint,
            wallet_rpc,
            debounce: Duration::from_millis(debounce_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            hide_zero_balances: overrides.hide_zero_balances || config.hide_zero_balances,
        })
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match parse(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), "ignoring malformed config: {:#}", err);
            Config::default()
        }
    }
}

pub fn parse(content: &str) -> Result<Config> {
    toml::from_str::<Config>(content).context("Invalid config.toml")
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("ERC20_INDEXER_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("erc20-indexer").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("erc20-indexer").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "erc20-indexer", "erc20-indexer")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("erc20-indexer"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("erc20-indexer"));
    }
    directories::ProjectDirs::from("io", "erc20-indexer", "erc20-indexer")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_dir() -> PathBuf {
    data_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
