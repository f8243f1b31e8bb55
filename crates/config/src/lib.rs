//! Exchange configuration
//!
//! Loaded once at startup from a YAML file; see `config.yaml` at the
//! repository root for the default layout.

use serde::{Deserialize, Serialize};

pub mod parser;

pub use parser::load_config;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub markets: Vec<MarketConfig>,
    #[serde(default)]
    pub users: Vec<UserConfig>,
    #[serde(default)]
    pub settlement: SettlementConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub id: u64,
    /// Settlement account address.
    pub address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettlementConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rpc_url: default_rpc_url(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_rpc_url() -> String {
    "http://localhost:7545".to_string()
}

/// Check a loaded configuration, returning a list of problems.
pub fn validate_config(config: &Config) -> Vec<String> {
    let mut problems = Vec::new();

    if config.markets.is_empty() {
        problems.push("at least one market must be configured".to_string());
    }
    let mut symbols: Vec<_> = config.markets.iter().map(|m| &m.symbol).collect();
    symbols.sort();
    symbols.dedup();
    if symbols.len() != config.markets.len() {
        problems.push("market symbols must be unique".to_string());
    }

    let mut ids: Vec<_> = config.users.iter().map(|u| u.id).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != config.users.len() {
        problems.push("user ids must be unique".to_string());
    }

    if config.settlement.enabled && config.settlement.rpc_url.is_empty() {
        problems.push("settlement.rpc_url is required when settlement is enabled".to_string());
    }

    problems
}
