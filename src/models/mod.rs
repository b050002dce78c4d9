pub mod job_history;
pub mod server_action;

pub use job_history::{JobHistory, OnchainConfirmation};
pub use server_action::{ActionStatus, ActionUpdate, JobHistoryPayload, ServerAction};
