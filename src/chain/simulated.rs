use async_trait::async_trait;

use super::{to_hex, ContractClient, ContractReceipt};

/// Transaction hash returned by the stubbed store handler.
pub const PLACEHOLDER_TX_HASH: &str =
    "0xef2e65640216c75332aac88cfd8beb1892b9150e3adbcf24c2ff2166c2d04dcb";

/// Stand-in for the contract when no chain is reachable. Always succeeds
/// with the placeholder transaction hash; the block hash echoes the digest.
pub struct SimulatedContract;

impl SimulatedContract {
    pub fn new() -> Self {
        SimulatedContract
    }
}

impl Default for SimulatedContract {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractClient for SimulatedContract {
    async fn store_hash(&self, digest: &[u8; 32]) -> Result<ContractReceipt, String> {
        tracing::info!("Simulated contract call for digest {}", to_hex(digest));
        Ok(ContractReceipt {
            is_success: true,
            extrinsic_hash: PLACEHOLDER_TX_HASH.to_string(),
            block_hash: to_hex(digest),
            error_message: None,
            dispatch_error: None,
        })
    }
}
