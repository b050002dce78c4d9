use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::actions::{self, context::ActionContext};
use crate::chain::{self, ContractClient};
use crate::config::Config;
use crate::db::{AppwriteDatabase, Database};
use crate::email::{self, Mailer};
use crate::error::{ActionError, InvocationError};
use crate::models::{ActionUpdate, ServerAction};

/// Most actions claimed by one invocation.
pub const MAX_ACTIONS_PER_RUN: usize = 5;

/// Byte budget of the `last_error` field.
pub const MAX_ERROR_BYTES: usize = 2048;

/// JSON body reported for every invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
}

impl RunSummary {
    pub fn success(message: impl Into<String>, processed: usize, failed: usize) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            processed: Some(processed),
            failed: Some(failed),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: "failure".to_string(),
            message: message.into(),
            processed: None,
            failed: None,
        }
    }
}

enum ItemOutcome {
    Completed,
    Failed,
    Skipped,
}

/// Claims a batch of pending server actions and runs them one at a time.
pub struct Processor {
    ctx: ActionContext,
}

impl Processor {
    pub fn new(
        db: Arc<dyn Database>,
        mailer: Option<Arc<dyn Mailer>>,
        contract: Arc<dyn ContractClient>,
    ) -> Self {
        Self {
            ctx: ActionContext {
                db,
                mailer,
                contract,
            },
        }
    }

    /// Wire up the real backend, mailer and contract clients.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let db = AppwriteDatabase::new(config.backend.clone())?;

        let mailer = match &config.email {
            Some(email_config) => Some(email::build_mailer(email_config)?),
            None => {
                tracing::warn!(
                    "No email transport configured, {} actions will fail",
                    actions::SEND_VERIFICATION_EMAIL
                );
                None
            }
        };

        let contract = chain::build_contract_client(&config.chain)?;

        Ok(Self::new(Arc::new(db), mailer, contract))
    }

    /// One invocation: fetch, then claim/dispatch/finalize each item in order.
    /// Only a failed fetch fails the invocation.
    pub async fn run(&self) -> Result<RunSummary, InvocationError> {
        let mut pending = self
            .ctx
            .db
            .list_pending_actions(MAX_ACTIONS_PER_RUN)
            .await
            .map_err(InvocationError::Fetch)?;

        // The store is asked for this already; enforce it regardless.
        pending.sort_by_key(|a| a.created_at);
        pending.truncate(MAX_ACTIONS_PER_RUN);

        if pending.is_empty() {
            tracing::info!("No pending server actions found");
            return Ok(RunSummary::success("No pending actions to process.", 0, 0));
        }

        tracing::info!("Found {} pending action(s) to process", pending.len());

        let mut processed = 0;
        let mut failed = 0;
        for action in pending {
            match self.process(action).await {
                ItemOutcome::Completed => processed += 1,
                ItemOutcome::Failed => failed += 1,
                ItemOutcome::Skipped => {}
            }
        }

        let message = format!("Run finished. Processed: {processed}, Failed: {failed}.");
        tracing::info!("{message}");
        Ok(RunSummary::success(message, processed, failed))
    }

    async fn process(&self, mut action: ServerAction) -> ItemOutcome {
        tracing::info!(
            triggered_by = action.triggered_by.as_deref().unwrap_or("-"),
            "Processing action {} (type={}, attempts={})",
            action.id,
            action.action_type,
            action.attempts
        );

        let claim = ActionUpdate::Claim {
            attempts: action.attempts + 1,
            last_attempt_at: Utc::now(),
        };
        if let Err(e) = self.ctx.db.update_action(&action.id, &claim).await {
            tracing::error!("Failed to claim action {}, skipping: {e}", action.id);
            return ItemOutcome::Skipped;
        }
        claim.apply(&mut action);

        match actions::execute(&self.ctx, &action).await {
            Ok(details) => {
                let update = ActionUpdate::Completed { details };
                match self.ctx.db.update_action(&action.id, &update).await {
                    Ok(()) => {
                        tracing::info!("Action {} completed successfully", action.id);
                    }
                    Err(e) => {
                        tracing::error!(
                            "Action {} succeeded but could not be marked completed: {e}",
                            action.id
                        );
                    }
                }
                ItemOutcome::Completed
            }
            Err(err) => {
                let error = failure_message(&action.id, &err);
                tracing::error!(
                    action_id = %action.id,
                    triggered_by = action.triggered_by.as_deref().unwrap_or("-"),
                    category = err.category(),
                    error = ?err,
                    "{error}"
                );

                let update = ActionUpdate::Failed { error };
                if let Err(e) = self.ctx.db.update_action(&action.id, &update).await {
                    tracing::error!(
                        "CRITICAL: failed to mark action {} as failed, it stays processing: {e}",
                        action.id
                    );
                }
                ItemOutcome::Failed
            }
        }
    }
}

/// The `last_error` text for a failed action, within the field's byte budget.
pub fn failure_message(action_id: &str, err: &ActionError) -> String {
    let full = format!(
        "Error processing action {action_id}: {err}. Type: {}",
        err.category()
    );
    truncate_bytes(&full, MAX_ERROR_BYTES).to_string()
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a
/// character.
pub fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Build a processor from fresh configuration and run it once. A
/// configuration problem is reported before anything is fetched or claimed.
pub async fn invoke<F>(build: F) -> Result<RunSummary, InvocationError>
where
    F: FnOnce() -> Result<Processor, String>,
{
    let processor = build().map_err(|e| {
        tracing::error!("Error: {e}");
        InvocationError::Config(e)
    })?;
    processor.run().await
}

/// The production builder: read the environment and wire real clients.
pub fn from_env() -> Result<Processor, String> {
    let config = Config::from_env()?;
    Processor::from_config(&config)
}
