pub mod rpc;
pub mod simulated;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ChainConfig;

pub use rpc::RpcContractClient;
pub use simulated::SimulatedContract;

/// Contract message that stores a 32-byte digest.
pub const STORE_METHOD: &str = "store_verified_resume_data";
pub const HASH_ARGUMENT: &str = "hash";

/// Outcome of a contract execution as reported by the chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractReceipt {
    pub is_success: bool,
    #[serde(default)]
    pub extrinsic_hash: String,
    #[serde(default)]
    pub block_hash: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub dispatch_error: Option<serde_json::Value>,
}

impl ContractReceipt {
    /// A readable reason for an unsuccessful receipt.
    pub fn failure_reason(&self) -> String {
        match (&self.error_message, &self.dispatch_error) {
            (Some(msg), Some(dispatch)) => format!("{msg} (dispatch error: {dispatch})"),
            (Some(msg), None) => msg.clone(),
            (None, Some(dispatch)) => format!("dispatch error: {dispatch}"),
            (None, None) => "extrinsic failed without an error message".to_string(),
        }
    }
}

#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Record `digest` on-chain. `Err` means the call could not be made at
    /// all; a made-but-failed call comes back as a receipt with
    /// `is_success == false`.
    async fn store_hash(&self, digest: &[u8; 32]) -> Result<ContractReceipt, String>;
}

pub fn build_contract_client(config: &ChainConfig) -> Result<Arc<dyn ContractClient>, String> {
    if config.simulate {
        tracing::warn!("CHAIN_SIMULATE is set, contract calls are simulated");
        return Ok(Arc::new(SimulatedContract::new()));
    }
    Ok(Arc::new(RpcContractClient::new(config.clone())?))
}

/// `0x`-prefixed lowercase hex, the form the chain tooling expects.
pub fn to_hex(digest: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(digest))
}
