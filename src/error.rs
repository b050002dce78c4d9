use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::processor::RunSummary;

/// Failure talking to the document store.
#[derive(Debug)]
pub enum DbError {
    NotFound(String),
    Api { status: u16, message: String },
    Transport(String),
    Decode(String),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            DbError::Api { status, message } => write!(f, "Backend error ({status}): {message}"),
            DbError::Transport(msg) => write!(f, "Backend unreachable: {msg}"),
            DbError::Decode(msg) => write!(f, "Unexpected backend response: {msg}"),
        }
    }
}

impl std::error::Error for DbError {}

/// Why a single server action failed. Every variant is fatal for that item
/// and none is retried within an invocation.
#[derive(Debug)]
pub enum ActionError {
    MalformedPayload(String),
    NotFound(String),
    InvalidRecord(String),
    EmailNotConfigured,
    Delivery(String),
    Chain(String),
    UnknownActionType(String),
    Database(DbError),
}

impl ActionError {
    pub fn category(&self) -> &'static str {
        match self {
            ActionError::MalformedPayload(_) => "MalformedPayload",
            ActionError::NotFound(_) => "NotFound",
            ActionError::InvalidRecord(_) => "InvalidRecord",
            ActionError::EmailNotConfigured => "Configuration",
            ActionError::Delivery(_) => "DeliveryError",
            ActionError::Chain(_) => "ChainError",
            ActionError::UnknownActionType(_) => "UnknownActionType",
            ActionError::Database(_) => "DatabaseError",
        }
    }
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::MalformedPayload(msg) => write!(f, "Malformed payload: {msg}"),
            ActionError::NotFound(msg) => write!(f, "Record not found: {msg}"),
            ActionError::InvalidRecord(msg) => write!(f, "{msg}"),
            ActionError::EmailNotConfigured => {
                write!(f, "Email delivery is not configured (set EMAIL_API_KEY or SMTP_*)")
            }
            ActionError::Delivery(msg) => write!(f, "Email delivery failed: {msg}"),
            ActionError::Chain(msg) => write!(f, "Contract call failed: {msg}"),
            ActionError::UnknownActionType(tag) => write!(f, "Unknown action_type: {tag}"),
            ActionError::Database(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<DbError> for ActionError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => ActionError::NotFound(msg),
            other => ActionError::Database(other),
        }
    }
}

/// Failures that abort a whole invocation before any item is touched.
#[derive(Debug)]
pub enum InvocationError {
    Config(String),
    Fetch(DbError),
}

impl std::fmt::Display for InvocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvocationError::Config(msg) => write!(f, "Configuration error: {msg}"),
            InvocationError::Fetch(err) => write!(f, "Failed to fetch pending actions: {err}"),
        }
    }
}

impl std::error::Error for InvocationError {}

impl InvocationError {
    /// The failure body reported to the caller. Configuration details stay in
    /// the logs.
    pub fn summary(&self) -> RunSummary {
        match self {
            InvocationError::Config(_) => RunSummary::failure("Configuration error."),
            InvocationError::Fetch(err) => RunSummary::failure(format!("Database error: {err}")),
        }
    }
}

impl IntoResponse for InvocationError {
    fn into_response(self) -> Response {
        tracing::error!("Invocation failed: {self}");
        (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(self.summary())).into_response()
    }
}
