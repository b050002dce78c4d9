pub mod confirm;
pub mod context;
pub mod email;
pub mod snapshot;

use crate::error::ActionError;
use crate::models::{JobHistoryPayload, ServerAction};

use context::ActionContext;

pub const SEND_VERIFICATION_EMAIL: &str = "SEND_VERIFICATION_EMAIL";
pub const CONFIRM_EMPLOYMENT: &str = "CONFIRM_EMPLOYMENT";

/// The closed set of action types the processor knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    SendVerificationEmail,
    ConfirmEmployment,
}

impl ActionKind {
    pub fn parse(tag: &str) -> Result<Self, ActionError> {
        match tag {
            SEND_VERIFICATION_EMAIL => Ok(ActionKind::SendVerificationEmail),
            CONFIRM_EMPLOYMENT => Ok(ActionKind::ConfirmEmployment),
            "" => Err(ActionError::UnknownActionType("(missing)".to_string())),
            other => Err(ActionError::UnknownActionType(other.to_string())),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ActionKind::SendVerificationEmail => SEND_VERIFICATION_EMAIL,
            ActionKind::ConfirmEmployment => CONFIRM_EMPLOYMENT,
        }
    }
}

/// Run one claimed action. Returns the human-readable result summary.
pub async fn execute(ctx: &ActionContext, action: &ServerAction) -> Result<String, ActionError> {
    let kind = ActionKind::parse(&action.action_type)?;
    let job_history_id = job_history_id(kind, action.payload.as_deref())?;

    tracing::info!(
        "Executing {} for job_history_id: {job_history_id}",
        kind.tag()
    );

    match kind {
        ActionKind::SendVerificationEmail => {
            email::send_verification_email(ctx, action, &job_history_id).await
        }
        ActionKind::ConfirmEmployment => confirm::confirm_employment(ctx, &job_history_id).await,
    }
}

/// Pull the referenced job-history id out of an action payload.
pub fn job_history_id(kind: ActionKind, payload: Option<&str>) -> Result<String, ActionError> {
    let raw = payload
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ActionError::MalformedPayload(format!("Payload is missing for {} action", kind.tag()))
        })?;

    let parsed: JobHistoryPayload = serde_json::from_str(raw)
        .map_err(|e| ActionError::MalformedPayload(format!("Payload is not valid JSON: {e}")))?;

    parsed
        .job_history_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            ActionError::MalformedPayload("'job_history_id' not found in payload".to_string())
        })
}
