#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use zeroid_actions::chain::{ContractClient, ContractReceipt};
use zeroid_actions::config::{Secret, ServerConfig};
use zeroid_actions::db::Database;
use zeroid_actions::email::{Mailer, OutgoingEmail};
use zeroid_actions::error::DbError;
use zeroid_actions::models::{
    ActionStatus, ActionUpdate, JobHistory, OnchainConfirmation, ServerAction,
};
use zeroid_actions::processor::Processor;
use zeroid_actions::state::ProcessorBuilder;

// ── In-memory document store ────────────────────────────────────

#[derive(Default)]
struct Store {
    actions: Vec<ServerAction>,
    jobs: HashMap<String, JobHistory>,
    updates: Vec<(String, ActionUpdate)>,
    confirmations: Vec<(String, OnchainConfirmation)>,
    list_calls: usize,
    last_limit: Option<usize>,
}

/// A document store kept in memory. Failure switches let tests exercise the
/// error paths of each call.
#[derive(Default)]
pub struct MemoryDatabase {
    store: Mutex<Store>,
    pub fail_list: Mutex<bool>,
    pub fail_claim_for: Mutex<Vec<String>>,
    pub fail_finalize_for: Mutex<Vec<String>>,
    pub fail_confirmation: Mutex<bool>,
    /// Return everything from `list_pending_actions`, ignoring status and
    /// limit, in insertion order.
    pub unfiltered_list: Mutex<bool>,
}

impl MemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_action(&self, action: ServerAction) {
        self.store.lock().unwrap().actions.push(action);
    }

    pub fn insert_job(&self, job: JobHistory) {
        self.store.lock().unwrap().jobs.insert(job.id.clone(), job);
    }

    pub fn action(&self, id: &str) -> ServerAction {
        self.store
            .lock()
            .unwrap()
            .actions
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .expect("action exists")
    }

    pub fn job(&self, id: &str) -> JobHistory {
        self.store.lock().unwrap().jobs.get(id).cloned().expect("job exists")
    }

    pub fn updates(&self) -> Vec<(String, ActionUpdate)> {
        self.store.lock().unwrap().updates.clone()
    }

    pub fn confirmations(&self) -> Vec<(String, OnchainConfirmation)> {
        self.store.lock().unwrap().confirmations.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.store.lock().unwrap().list_calls
    }

    pub fn last_limit(&self) -> Option<usize> {
        self.store.lock().unwrap().last_limit
    }

    /// Set an action's status from outside, as an operator would.
    pub fn reset_status(&self, id: &str, status: ActionStatus) {
        let mut store = self.store.lock().unwrap();
        if let Some(action) = store.actions.iter_mut().find(|a| a.id == id) {
            action.status = status;
        }
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn list_pending_actions(&self, limit: usize) -> Result<Vec<ServerAction>, DbError> {
        if *self.fail_list.lock().unwrap() {
            return Err(DbError::Transport("connection refused".to_string()));
        }
        let unfiltered = *self.unfiltered_list.lock().unwrap();

        let mut store = self.store.lock().unwrap();
        store.list_calls += 1;
        store.last_limit = Some(limit);

        if unfiltered {
            return Ok(store.actions.clone());
        }

        let mut pending: Vec<ServerAction> = store
            .actions
            .iter()
            .filter(|a| a.status == ActionStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|a| a.created_at);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn update_action(&self, id: &str, update: &ActionUpdate) -> Result<(), DbError> {
        let fail = match update {
            ActionUpdate::Claim { .. } => self.fail_claim_for.lock().unwrap().contains(&id.to_string()),
            _ => self.fail_finalize_for.lock().unwrap().contains(&id.to_string()),
        };
        if fail {
            return Err(DbError::Api {
                status: 503,
                message: format!("update document {id}: service unavailable"),
            });
        }

        let mut store = self.store.lock().unwrap();
        let action = store
            .actions
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DbError::NotFound(format!("action {id}")))?;
        update.apply(action);
        store.updates.push((id.to_string(), update.clone()));
        Ok(())
    }

    async fn get_job_history(&self, id: &str) -> Result<JobHistory, DbError> {
        self.store
            .lock()
            .unwrap()
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("job history {id}: Document not found")))
    }

    async fn record_confirmation(
        &self,
        id: &str,
        confirmation: &OnchainConfirmation,
    ) -> Result<(), DbError> {
        if *self.fail_confirmation.lock().unwrap() {
            return Err(DbError::Api {
                status: 500,
                message: "write rejected".to_string(),
            });
        }
        let mut store = self.store.lock().unwrap();
        let job = store
            .jobs
            .get_mut(id)
            .ok_or_else(|| DbError::NotFound(format!("job history {id}")))?;
        confirmation.apply(job);
        store.confirmations.push((id.to_string(), confirmation.clone()));
        Ok(())
    }
}

// ── Mailer ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    pub fail_with: Mutex<Option<String>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, String> {
        self.sent.lock().unwrap().push(email.clone());
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(Some(format!("msg-{}", self.sent.lock().unwrap().len()))),
        }
    }
}

// ── Contract ────────────────────────────────────────────────────

pub struct FakeContract {
    digests: Mutex<Vec<[u8; 32]>>,
    pub receipt: Mutex<Result<ContractReceipt, String>>,
}

impl FakeContract {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            digests: Mutex::new(Vec::new()),
            receipt: Mutex::new(Ok(ContractReceipt {
                is_success: true,
                extrinsic_hash: "0xtx".to_string(),
                block_hash: "0xblock".to_string(),
                error_message: None,
                dispatch_error: None,
            })),
        })
    }

    pub fn digests(&self) -> Vec<[u8; 32]> {
        self.digests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractClient for FakeContract {
    async fn store_hash(&self, digest: &[u8; 32]) -> Result<ContractReceipt, String> {
        self.digests.lock().unwrap().push(*digest);
        self.receipt.lock().unwrap().clone()
    }
}

// ── Fixtures ────────────────────────────────────────────────────

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 15, 16, 53, 46).unwrap()
}

/// A pending action created `minutes` after the base time.
pub fn pending_action(id: &str, action_type: &str, payload: Option<Value>, minutes: i64) -> ServerAction {
    ServerAction {
        id: id.to_string(),
        status: ActionStatus::Pending,
        action_type: action_type.to_string(),
        payload: payload.map(|p| p.to_string()),
        attempts: 0,
        created_at: base_time() + Duration::minutes(minutes),
        last_attempt_at: None,
        last_error: None,
        action_result_details: None,
        triggered_by: None,
    }
}

pub fn job(id: &str, verifier_email: Option<&str>) -> JobHistory {
    JobHistory {
        id: id.to_string(),
        candidate_id: Some("6824fe1700103f4978f3".to_string()),
        company_name: Some("Initech".to_string()),
        job_title: Some("Engineer".to_string()),
        start_date: Some("2021-01-04".to_string()),
        end_date: Some("2024-06-28".to_string()),
        description: Some("Built the TPS report pipeline".to_string()),
        verifier_email: verifier_email.map(str::to_string),
        verification_message: Some("Please verify my time at Initech".to_string()),
        verification_status: Some("VERIFICATION_SENT".to_string()),
        ..Default::default()
    }
}

pub fn payload(job_history_id: &str) -> Option<Value> {
    Some(json!({ "job_history_id": job_history_id }))
}

pub struct Harness {
    pub db: Arc<MemoryDatabase>,
    pub mailer: Arc<RecordingMailer>,
    pub contract: Arc<FakeContract>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            db: MemoryDatabase::new(),
            mailer: RecordingMailer::new(),
            contract: FakeContract::new(),
        }
    }

    pub fn processor(&self) -> Processor {
        Processor::new(
            self.db.clone(),
            Some(self.mailer.clone()),
            self.contract.clone(),
        )
    }

    pub fn processor_without_mailer(&self) -> Processor {
        Processor::new(self.db.clone(), None, self.contract.clone())
    }

    pub fn builder(&self) -> ProcessorBuilder {
        let db = self.db.clone();
        let mailer = self.mailer.clone();
        let contract = self.contract.clone();
        Arc::new(move || -> Result<Processor, String> {
            Ok(Processor::new(
                db.clone(),
                Some(mailer.clone()),
                contract.clone(),
            ))
        })
    }
}

// ── HTTP ────────────────────────────────────────────────────────

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn run(&self, token: Option<&str>) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url("/run"));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.expect("run request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn server_config(trigger_token: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        log_level: "warn".to_string(),
        trigger_token: trigger_token.map(Secret::new),
        schedule_secs: None,
    }
}

/// Spawn the HTTP surface on a random port.
pub async fn spawn_app(server: ServerConfig, builder: ProcessorBuilder) -> TestApp {
    let (app, _state) = zeroid_actions::build_app(server, builder);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
    }
}
