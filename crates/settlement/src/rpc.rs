//! JSON-RPC transfer client
//!
//! Submits `eth_sendTransaction` against a dev node with unlocked
//! accounts (Ganache-style). Gas is pinned to the 21000 of a plain
//! value transfer; the node picks the gas price and nonce.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::error::SettlementError;
use crate::{Result, Settler};

const TRANSFER_GAS: &str = "0x5208"; // 21000

pub struct RpcSettler {
    client: reqwest::Client,
    url: String,
    next_request_id: AtomicU64,
}

impl RpcSettler {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_request_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl Settler for RpcSettler {
    async fn transfer(&self, from: &str, to: &str, amount_wei: u128) -> Result<()> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": request_id,
            "method": "eth_sendTransaction",
            "params": [{
                "from": from,
                "to": to,
                "value": format!("{amount_wei:#x}"),
                "gas": TRANSFER_GAS,
            }],
        });

        let response: Value = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.get("error") {
            return Err(SettlementError::Rpc(err.to_string()));
        }
        let tx_hash = response
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or_default();
        debug!(tx_hash, from, to, amount_wei, "transfer submitted");
        Ok(())
    }
}
