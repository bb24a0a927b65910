//! Backend REST boundary.
//!
//! Every read is a GET with query-string parameters; query execution is a
//! POST with a JSON body. Responses arrive in the conventional envelope
//! `{ success, message, data }`. A 401 is session expiry: the stored
//! credential is dropped so the caller can fall back to the login entry
//! point instead of retrying forever.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use ringlog::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::poller::SnapshotFetcher;
use crate::store::{now_ms, Snapshot};
use crate::workbench::{KvStore, QueryExecutor};

/// Hard ceiling on any single backend call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Key-value entry holding the session credential.
pub const SESSION_KEY: &str = "pulseboard.session";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend did not answer within [`REQUEST_TIMEOUT`]. Kept
    /// distinct from other transport failures so callers can present it
    /// differently.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// The backend rejected our session. Local credentials have already
    /// been cleared when this is returned.
    #[error("session expired")]
    Unauthorized,
    /// Non-2xx status or a `success: false` envelope.
    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
    },
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

/// The conventional backend envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn KvStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, store: Arc<dyn KvStore>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            store,
        }
    }

    pub async fn get_json<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(map_transport)?;

        self.unwrap_envelope(response).await
    }

    pub async fn post_json<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(map_transport)?;

        self.unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned + Default>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            return Err(ClientError::Api {
                message: format!("backend returned {status}"),
                status: Some(status.as_u16()),
            });
        }

        let envelope: Envelope<T> = response.json().await.map_err(map_transport)?;

        if !envelope.success {
            // a 2xx carrying success:false is a server-reported failure,
            // propagated like any transport error with the server's message
            return Err(ClientError::Api {
                message: envelope.message.unwrap_or_else(|| "failed".to_string()),
                status: Some(status.as_u16()),
            });
        }

        envelope.data.ok_or_else(|| ClientError::Api {
            message: "response missing data".to_string(),
            status: Some(status.as_u16()),
        })
    }

    fn expire_session(&self) {
        if let Err(e) = self.store.remove(SESSION_KEY) {
            warn!("failed to clear session credential: {e}");
        }
    }
}

fn map_transport(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(REQUEST_TIMEOUT)
    } else {
        ClientError::Transport(e)
    }
}

#[async_trait]
impl SnapshotFetcher for ApiClient {
    /// Retrieve the current reading of the target's metric set. Nulls in
    /// the payload surface as NaN here and collapse to zero during the
    /// sanitize pass.
    async fn fetch(&self, target: &str) -> anyhow::Result<Snapshot> {
        let raw: BTreeMap<String, Option<f64>> = self
            .get_json("/api/metrics/snapshot", &[("target", target)])
            .await?;

        let values = raw
            .into_iter()
            .map(|(name, value)| (name, value.unwrap_or(f64::NAN)))
            .collect();

        Ok(Snapshot::new(now_ms(), values))
    }
}

#[async_trait]
impl QueryExecutor for ApiClient {
    async fn execute(&self, query: &str) -> Result<Value, ClientError> {
        self.post_json("/api/query", &json!({ "query": query })).await
    }
}
