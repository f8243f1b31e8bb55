use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::Config;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {path:?}"))?;

    let config: Config =
        serde_yaml::from_str(&content).with_context(|| "failed to parse YAML configuration")?;

    info!(
        ?path,
        markets = config.markets.len(),
        users = config.users.len(),
        "configuration loaded"
    );
    Ok(config)
}
