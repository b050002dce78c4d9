use std::sync::Arc;

use crate::chain::ContractClient;
use crate::db::Database;
use crate::email::Mailer;

/// Collaborators shared by every action in one invocation.
#[derive(Clone)]
pub struct ActionContext {
    pub db: Arc<dyn Database>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub contract: Arc<dyn ContractClient>,
}
