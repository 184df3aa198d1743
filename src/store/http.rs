//! HTTP record store client. Talks to the league's blob store over
//! GET/POST/DELETE with a static shared-secret bearer token, retrying
//! transient failures with exponential backoff.

use super::{RecordStore, StoreError, StoredDocument};
use crate::config::Config;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl HttpStore {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url,
            token,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.store_url.clone(),
            config.store_token.clone(),
            Duration::from_secs(config.store_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, StoreError> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.timeout),
            ..Default::default()
        };
        let url = self.url(path);

        retry(backoff, || {
            let request = {
                let mut builder = self
                    .client
                    .request(method.clone(), url.clone())
                    .bearer_auth(&self.token);
                if let Some(body) = &body {
                    builder = builder.json(body);
                }
                builder
            };
            async move {
                let response = request.send().await.map_err(|e| {
                    backoff::Error::transient(StoreError::NetworkError(e.to_string()))
                })?;

                let status = response.status();
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    return Err(backoff::Error::transient(StoreError::HttpError {
                        status: status.as_u16(),
                        message: "Transient store error".to_string(),
                    }));
                }
                Ok(response)
            }
        })
        .await
    }
}

#[async_trait]
impl RecordStore for HttpStore {
    async fn read(&self, path: &str) -> Result<Option<StoredDocument>, StoreError> {
        debug!("Reading {}", path);
        let response = self.send(Method::GET, path, None).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::HttpError {
                status: status.as_u16(),
                message: "Read failed".to_string(),
            });
        }
        let envelope = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| StoreError::ParseError(e.to_string()))?;
        let revision = envelope
            .get("revision")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::ParseError("Missing revision field".to_string()))?
            .to_string();
        let body = envelope
            .get("body")
            .cloned()
            .ok_or_else(|| StoreError::ParseError("Missing body field".to_string()))?;
        Ok(Some(StoredDocument { body, revision }))
    }

    async fn write(
        &self,
        path: &str,
        body: serde_json::Value,
        change_description: &str,
        expected_revision: Option<&str>,
    ) -> Result<String, StoreError> {
        debug!("Writing {} ({})", path, change_description);
        let payload = serde_json::json!({
            "body": body,
            "change_description": change_description,
            "expected_revision": expected_revision,
        });
        let response = self.send(Method::POST, path, Some(payload)).await?;
        let status = response.status();
        if status == StatusCode::CONFLICT {
            warn!("Revision conflict writing {}", path);
            return Err(StoreError::Conflict {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(StoreError::HttpError {
                status: status.as_u16(),
                message: "Write failed".to_string(),
            });
        }
        let envelope = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| StoreError::ParseError(e.to_string()))?;
        envelope
            .get("revision")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| StoreError::ParseError("Missing revision field".to_string()))
    }

    async fn delete(&self, path: &str, change_description: &str) -> Result<(), StoreError> {
        debug!("Deleting {} ({})", path, change_description);
        let payload = serde_json::json!({ "change_description": change_description });
        let response = self.send(Method::DELETE, path, Some(payload)).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND || status.is_success() {
            return Ok(());
        }
        Err(StoreError::HttpError {
            status: status.as_u16(),
            message: "Delete failed".to_string(),
        })
    }
}
