use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const VERIFICATION_STATUS_CONFIRMED_ONCHAIN: &str = "CONFIRMED_ONCHAIN";

/// An employment record owned by the product. The processor reads it and
/// only ever writes the on-chain confirmation fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobHistory {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub verifier_email: Option<String>,
    #[serde(default)]
    pub verification_message: Option<String>,
    #[serde(default)]
    pub verification_status: Option<String>,
    #[serde(default)]
    pub onchain_confirmation_tx_hash: Option<String>,
    #[serde(default)]
    pub onchain_confirmation_block_hash: Option<String>,
    #[serde(default)]
    pub onchain_confirmed_at: Option<String>,
    #[serde(default)]
    pub onchain_data_hash: Option<String>,
}

impl JobHistory {
    /// The verifier address, if present and not blank.
    pub fn verifier_email(&self) -> Option<&str> {
        self.verifier_email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Fields written back after the digest has been anchored on-chain.
#[derive(Debug, Clone, PartialEq)]
pub struct OnchainConfirmation {
    pub tx_hash: String,
    pub block_hash: String,
    /// Same text as the snapshot's `confirmation_timestamp`.
    pub confirmed_at: String,
    pub data_hash: String,
}

impl OnchainConfirmation {
    pub fn to_document(&self) -> Value {
        json!({
            "verification_status": VERIFICATION_STATUS_CONFIRMED_ONCHAIN,
            "onchain_confirmation_tx_hash": self.tx_hash,
            "onchain_confirmation_block_hash": self.block_hash,
            "onchain_confirmed_at": self.confirmed_at,
            "onchain_data_hash": self.data_hash,
        })
    }

    pub fn apply(&self, job: &mut JobHistory) {
        job.verification_status = Some(VERIFICATION_STATUS_CONFIRMED_ONCHAIN.to_string());
        job.onchain_confirmation_tx_hash = Some(self.tx_hash.clone());
        job.onchain_confirmation_block_hash = Some(self.block_hash.clone());
        job.onchain_confirmed_at = Some(self.confirmed_at.clone());
        job.onchain_data_hash = Some(self.data_hash.clone());
    }
}
