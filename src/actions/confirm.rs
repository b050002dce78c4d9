use chrono::Utc;

use super::context::ActionContext;
use super::snapshot::{self, ConfirmationSnapshot};
use crate::chain::to_hex;
use crate::error::ActionError;
use crate::models::OnchainConfirmation;

/// Anchor a job-history snapshot on-chain and record the receipt on the
/// job-history record.
pub async fn confirm_employment(
    ctx: &ActionContext,
    job_history_id: &str,
) -> Result<String, ActionError> {
    let job = ctx.db.get_job_history(job_history_id).await?;

    let confirmed_at = Utc::now();
    let snapshot = ConfirmationSnapshot::new(&job, confirmed_at);
    let digest = snapshot.digest();
    let digest_hex = to_hex(&digest);

    tracing::info!("Submitting digest {digest_hex} for job history {job_history_id}");

    let receipt = ctx
        .contract
        .store_hash(&digest)
        .await
        .map_err(ActionError::Chain)?;

    if !receipt.is_success {
        return Err(ActionError::Chain(receipt.failure_reason()));
    }

    let confirmation = OnchainConfirmation {
        tx_hash: receipt.extrinsic_hash.clone(),
        block_hash: receipt.block_hash.clone(),
        confirmed_at: snapshot::format_timestamp(confirmed_at),
        data_hash: digest_hex,
    };

    // The digest is already on-chain here; a failed write-back fails the
    // action but cannot undo the extrinsic.
    if let Err(e) = ctx.db.record_confirmation(job_history_id, &confirmation).await {
        tracing::error!(
            "Digest anchored in {} but job history {job_history_id} was not updated: {e}",
            receipt.extrinsic_hash
        );
        return Err(e.into());
    }

    Ok(format!(
        "Employment confirmed on-chain: tx {} in block {}",
        receipt.extrinsic_hash, receipt.block_hash
    ))
}
