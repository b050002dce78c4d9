use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::InvocationError;
use crate::processor::{self, Processor, RunSummary};

pub type SharedState = Arc<AppState>;

/// Produces a processor for one invocation, re-reading configuration each
/// time.
pub type ProcessorBuilder = Arc<dyn Fn() -> Result<Processor, String> + Send + Sync>;

pub struct AppState {
    pub server: ServerConfig,
    pub build_processor: ProcessorBuilder,
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(server: ServerConfig, build_processor: ProcessorBuilder) -> Self {
        Self {
            server,
            build_processor,
            run_lock: Mutex::new(()),
        }
    }

    /// Run one invocation. Invocations started by this process never overlap;
    /// other processes polling the same collection are not coordinated with.
    pub async fn invoke(&self) -> Result<RunSummary, InvocationError> {
        let _guard = self.run_lock.lock().await;
        let span = tracing::info_span!("invocation", id = %Uuid::now_v7());
        let build = self.build_processor.clone();
        processor::invoke(move || build())
            .instrument(span)
            .await
    }
}
