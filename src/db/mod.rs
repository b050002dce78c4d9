pub mod appwrite;

use async_trait::async_trait;

use crate::error::DbError;
use crate::models::{ActionUpdate, JobHistory, OnchainConfirmation, ServerAction};

pub use appwrite::AppwriteDatabase;

/// The document store as seen by the processor.
///
/// `update_action` is a plain write, not a compare-and-swap: two processors
/// that list the same pending item can both claim it.
#[async_trait]
pub trait Database: Send + Sync {
    /// Oldest-first `pending` actions, at most `limit` of them.
    async fn list_pending_actions(&self, limit: usize) -> Result<Vec<ServerAction>, DbError>;

    async fn update_action(&self, id: &str, update: &ActionUpdate) -> Result<(), DbError>;

    /// Returns `DbError::NotFound` when the record does not exist.
    async fn get_job_history(&self, id: &str) -> Result<JobHistory, DbError>;

    async fn record_confirmation(
        &self,
        id: &str,
        confirmation: &OnchainConfirmation,
    ) -> Result<(), DbError>;
}
