use std::env;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x1195Cf65f83B3A5768F3C496D3A05AD6412c64B7";
pub const DEFAULT_EXPLORER_BASE_URL: &str = "https://explorer.linea.build/api";
/// Roughly one hour of blocks at a two second block time.
pub const DEFAULT_BLOCK_WINDOW_SIZE: u64 = 1800;
pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierThresholds {
    /// Counts strictly above this are `High`.
    pub high: usize,
    /// Counts strictly above this (and not above `high`) are `Medium`.
    pub medium: usize,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: 80,
            medium: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub contract_address: String,
    pub explorer_base_url: Url,
    pub block_window_size: u64,
    pub tier_thresholds: TierThresholds,
    pub page_size: usize,
}

impl ClassifierConfig {
    pub fn new(contract_address: impl Into<String>, explorer_base_url: Url) -> Self {
        Self {
            contract_address: contract_address.into(),
            explorer_base_url,
            block_window_size: DEFAULT_BLOCK_WINDOW_SIZE,
            tier_thresholds: TierThresholds::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Timeout and retry budget for every outbound call.
#[derive(Debug, Clone, Copy)]
pub struct RequestPolicy {
    pub timeout: Duration,
    pub max_retries: usize,
    pub backoff_base_ms: u64,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 1,
            backoff_base_ms: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub eth_rpc_url: Url,
    pub http_bind_addr: String,
    pub classifier: ClassifierConfig,
    pub request_policy: RequestPolicy,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing ETH_RPC_URL env var")]
    MissingEthRpcUrl,
    #[error("invalid ETH_RPC_URL {0:?}: {1}")]
    InvalidEthRpcUrl(String, url::ParseError),
    #[error("invalid EXPLORER_BASE_URL {0:?}: {1}")]
    InvalidExplorerUrl(String, url::ParseError),
    #[error("invalid value for {name}: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("tier thresholds must satisfy medium < high (medium={medium}, high={high})")]
    InvalidThresholds { medium: usize, high: usize },
    #[error("PULSE_CONTRACT_ADDRESS must not be empty")]
    EmptyContractAddress,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_rpc_url = env::var("ETH_RPC_URL").map_err(|_| ConfigError::MissingEthRpcUrl)?;
        let eth_rpc_url = parse_rpc_url(&raw_rpc_url)?;
        let http_bind_addr = env::var("HTTP_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

        let contract_address = env::var("PULSE_CONTRACT_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_CONTRACT_ADDRESS.to_string());
        if contract_address.trim().is_empty() {
            return Err(ConfigError::EmptyContractAddress);
        }

        let raw_url =
            env::var("EXPLORER_BASE_URL").unwrap_or_else(|_| DEFAULT_EXPLORER_BASE_URL.to_string());
        let explorer_base_url =
            Url::parse(&raw_url).map_err(|e| ConfigError::InvalidExplorerUrl(raw_url.clone(), e))?;

        let tier_thresholds = TierThresholds {
            high: parse_var("TIER_HIGH_THRESHOLD", TierThresholds::default().high)?,
            medium: parse_var("TIER_MEDIUM_THRESHOLD", TierThresholds::default().medium)?,
        };
        validate_thresholds(tier_thresholds)?;

        let mut classifier = ClassifierConfig::new(contract_address.trim(), explorer_base_url);
        classifier.block_window_size = parse_var("BLOCK_WINDOW_SIZE", DEFAULT_BLOCK_WINDOW_SIZE)?;
        classifier.tier_thresholds = tier_thresholds;

        let defaults = RequestPolicy::default();
        let request_policy = RequestPolicy {
            timeout: Duration::from_secs(parse_var(
                "REQUEST_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            max_retries: parse_var("REQUEST_MAX_RETRIES", defaults.max_retries)?,
            backoff_base_ms: defaults.backoff_base_ms,
        };

        Ok(Self {
            eth_rpc_url,
            http_bind_addr,
            classifier,
            request_policy,
        })
    }
}

pub fn validate_thresholds(thresholds: TierThresholds) -> Result<(), ConfigError> {
    if thresholds.medium >= thresholds.high {
        return Err(ConfigError::InvalidThresholds {
            medium: thresholds.medium,
            high: thresholds.high,
        });
    }
    Ok(())
}

fn parse_rpc_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEthRpcUrl(raw.to_string(), e))
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_number(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_number<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        })
}
