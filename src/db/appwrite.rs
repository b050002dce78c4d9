use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Database;
use crate::config::BackendConfig;
use crate::error::DbError;
use crate::models::{ActionStatus, ActionUpdate, JobHistory, OnchainConfirmation, ServerAction};

/// Document store client speaking the Appwrite databases REST API.
pub struct AppwriteDatabase {
    client: reqwest::Client,
    config: BackendConfig,
}

#[derive(Debug, Deserialize)]
struct DocumentList<T> {
    #[serde(default)]
    total: u64,
    documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl AppwriteDatabase {
    pub fn new(config: BackendConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self { client, config })
    }

    fn documents_url(&self, collection_id: &str) -> Result<Url, DbError> {
        let raw = format!(
            "{}/databases/{}/collections/{}/documents",
            self.config.endpoint, self.config.database_id, collection_id
        );
        Url::parse(&raw).map_err(|e| DbError::Transport(format!("Invalid API_ENDPOINT: {e}")))
    }

    fn document_url(&self, collection_id: &str, document_id: &str) -> Result<Url, DbError> {
        let mut url = self.documents_url(collection_id)?;
        url.path_segments_mut()
            .map_err(|_| DbError::Transport("API_ENDPOINT cannot be a base URL".to_string()))?
            .push(document_id);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Appwrite-Project", &self.config.project_id)
            .header("X-Appwrite-Key", self.config.api_key.expose())
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<reqwest::Response, DbError> {
        let resp = req
            .send()
            .await
            .map_err(|e| DbError::Transport(format!("{what}: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => match err.kind {
                Some(kind) => format!("{} ({kind})", err.message),
                None => err.message,
            },
            Err(_) => body.chars().take(512).collect(),
        };

        if status == reqwest::StatusCode::NOT_FOUND {
            Err(DbError::NotFound(format!("{what}: {message}")))
        } else {
            Err(DbError::Api {
                status: status.as_u16(),
                message: format!("{what}: {message}"),
            })
        }
    }

    async fn patch_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<(), DbError> {
        let url = self.document_url(collection_id, document_id)?;
        let req = self
            .request(Method::PATCH, url)
            .json(&json!({ "data": data }));
        self.send(req, &format!("update document {document_id}"))
            .await?;
        Ok(())
    }
}

/// Appwrite 1.5+ serializes each query as a JSON object.
fn pending_queries(limit: usize) -> [String; 3] {
    [
        json!({ "method": "equal", "attribute": "status", "values": [ActionStatus::Pending.as_str()] })
            .to_string(),
        json!({ "method": "orderAsc", "attribute": "$createdAt" }).to_string(),
        json!({ "method": "limit", "values": [limit] }).to_string(),
    ]
}

#[async_trait]
impl Database for AppwriteDatabase {
    async fn list_pending_actions(&self, limit: usize) -> Result<Vec<ServerAction>, DbError> {
        let mut url = self.documents_url(&self.config.server_actions_collection_id)?;
        {
            let mut pairs = url.query_pairs_mut();
            for query in pending_queries(limit) {
                pairs.append_pair("queries[]", &query);
            }
        }

        let resp = self
            .send(self.request(Method::GET, url), "list pending actions")
            .await?;
        let list: DocumentList<ServerAction> = resp
            .json()
            .await
            .map_err(|e| DbError::Decode(format!("server actions: {e}")))?;

        tracing::debug!(
            "Listed {} pending action(s) of {} total",
            list.documents.len(),
            list.total
        );
        Ok(list.documents)
    }

    async fn update_action(&self, id: &str, update: &ActionUpdate) -> Result<(), DbError> {
        self.patch_document(
            &self.config.server_actions_collection_id,
            id,
            update.to_document(),
        )
        .await
    }

    async fn get_job_history(&self, id: &str) -> Result<JobHistory, DbError> {
        let url = self.document_url(&self.config.job_history_collection_id, id)?;
        let resp = self
            .send(self.request(Method::GET, url), &format!("job history {id}"))
            .await?;
        resp.json()
            .await
            .map_err(|e| DbError::Decode(format!("job history {id}: {e}")))
    }

    async fn record_confirmation(
        &self,
        id: &str,
        confirmation: &OnchainConfirmation,
    ) -> Result<(), DbError> {
        self.patch_document(
            &self.config.job_history_collection_id,
            id,
            confirmation.to_document(),
        )
        .await
    }
}
