use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// A queued unit of work as stored in the server actions collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerAction {
    #[serde(rename = "$id")]
    pub id: String,
    pub status: ActionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_type: String,
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attempts: i64,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default)]
    pub action_result_details: Option<String>,
    #[serde(default)]
    pub triggered_by: Option<String>,
}

/// The store sends attributes that were never set as explicit `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Processing => "processing",
            ActionStatus::Completed => "completed",
            ActionStatus::Failed => "failed",
        }
    }
}

/// A state transition written back onto a server action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionUpdate {
    Claim {
        attempts: i64,
        last_attempt_at: DateTime<Utc>,
    },
    Completed {
        details: String,
    },
    Failed {
        error: String,
    },
}

impl ActionUpdate {
    pub fn status(&self) -> ActionStatus {
        match self {
            ActionUpdate::Claim { .. } => ActionStatus::Processing,
            ActionUpdate::Completed { .. } => ActionStatus::Completed,
            ActionUpdate::Failed { .. } => ActionStatus::Failed,
        }
    }

    /// The partial document sent to the store. Only the fields this
    /// transition owns are present.
    pub fn to_document(&self) -> Value {
        match self {
            ActionUpdate::Claim {
                attempts,
                last_attempt_at,
            } => json!({
                "status": self.status().as_str(),
                "attempts": attempts,
                "last_attempt_at": last_attempt_at.to_rfc3339(),
            }),
            ActionUpdate::Completed { details } => json!({
                "status": self.status().as_str(),
                "last_error": null,
                "action_result_details": details,
            }),
            ActionUpdate::Failed { error } => json!({
                "status": self.status().as_str(),
                "last_error": error,
            }),
        }
    }

    /// Apply the transition to an in-memory copy of the action.
    pub fn apply(&self, action: &mut ServerAction) {
        action.status = self.status();
        match self {
            ActionUpdate::Claim {
                attempts,
                last_attempt_at,
            } => {
                action.attempts = *attempts;
                action.last_attempt_at = Some(*last_attempt_at);
            }
            ActionUpdate::Completed { details } => {
                action.last_error = None;
                action.action_result_details = Some(details.clone());
            }
            ActionUpdate::Failed { error } => {
                action.last_error = Some(error.clone());
            }
        }
    }
}

/// The payload shape shared by both action types.
#[derive(Debug, Clone, Deserialize)]
pub struct JobHistoryPayload {
    #[serde(default)]
    pub job_history_id: Option<String>,
}
