//! Trade settlement for the exchange
//!
//! Each match moves value from the ask-side user to the bid-side user
//! through an Ethereum dev node. The engine treats settlement as
//! submit-and-forget: a failed transfer is logged by the caller and
//! never reverses the match.

pub mod error;
pub mod rpc;

pub use error::SettlementError;
pub use rpc::RpcSettler;

use async_trait::async_trait;
use tracing::debug;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, SettlementError>;

/// Outbound value-transfer hook, invoked once per match.
///
/// `from` and `to` are hex account addresses; `amount_wei` is the
/// filled size truncated to whole wei.
#[async_trait]
pub trait Settler: Send + Sync {
    async fn transfer(&self, from: &str, to: &str, amount_wei: u128) -> Result<()>;
}

/// Settler used when settlement is disabled. Accepts every transfer.
pub struct NoopSettler;

#[async_trait]
impl Settler for NoopSettler {
    async fn transfer(&self, from: &str, to: &str, amount_wei: u128) -> Result<()> {
        debug!(from, to, amount_wei, "settlement disabled, dropping transfer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_settler_accepts() {
        let settler = NoopSettler;
        assert!(settler.transfer("0xaa", "0xbb", 10).await.is_ok());
    }
}
