use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{to_hex, ContractClient, ContractReceipt, HASH_ARGUMENT, STORE_METHOD};
use crate::config::{ChainConfig, ChainSigner};
use crate::crypto;

/// Executes contract messages through a JSON-RPC signing gateway that sits
/// in front of the chain node and holds the signing keys.
///
/// Request: `contracts_execute` with the contract address, message name,
/// named arguments, a signer reference and network. Response `result` is a
/// [`ContractReceipt`]; JSON-RPC `error` objects become `Err`.
pub struct RpcContractClient {
    client: reqwest::Client,
    config: ChainConfig,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<ContractReceipt>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcContractClient {
    pub fn new(config: ChainConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            // Inclusion in a block can take a while.
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self { client, config })
    }

    /// Names the signing key without revealing it. The gateway holds the
    /// keys; a mnemonic is identified by the hex SHA-256 of its phrase.
    fn signer(&self) -> Value {
        match &self.config.signer {
            ChainSigner::DevAccount(account) => json!({ "account": account }),
            ChainSigner::Mnemonic(mnemonic) => {
                json!({ "key_id": to_hex(&crypto::sha256(mnemonic.expose().as_bytes())) })
            }
        }
    }
}

#[async_trait]
impl ContractClient for RpcContractClient {
    async fn store_hash(&self, digest: &[u8; 32]) -> Result<ContractReceipt, String> {
        let mut args = Map::new();
        args.insert(HASH_ARGUMENT.to_string(), Value::String(to_hex(digest)));

        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "contracts_execute",
            "params": {
                "network": self.config.env.as_str(),
                "contract": &self.config.contract_address,
                "message": STORE_METHOD,
                "args": args,
                "signer": self.signer(),
            }
        });

        tracing::debug!(
            "Calling {STORE_METHOD} on {} ({})",
            self.config.contract_address,
            self.config.env.as_str()
        );

        let resp = self
            .client
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("RPC request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body: String = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(512)
                .collect();
            return Err(format!("RPC endpoint returned {}: {body}", status.as_u16()));
        }

        let body: RpcResponse = resp
            .json()
            .await
            .map_err(|e| format!("Invalid RPC response: {e}"))?;

        match (body.result, body.error) {
            (_, Some(err)) => Err(match err.data {
                Some(data) => format!("RPC error {}: {} ({data})", err.code, err.message),
                None => format!("RPC error {}: {}", err.code, err.message),
            }),
            (Some(receipt), None) => Ok(receipt),
            (None, None) => Err("RPC response carried neither result nor error".to_string()),
        }
    }
}
