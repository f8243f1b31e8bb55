//! Settlement error types

use thiserror::Error;

/// Errors from the value-transfer path
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The RPC endpoint could not be reached or answered garbage
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node accepted the request but returned an error object
    #[error("rpc: {0}")]
    Rpc(String),
}
