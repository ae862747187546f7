//! Listing a provider's models over its OpenAI-compatible `models` endpoint.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::Provider;

/// Path used when a provider has no `models_endpoint`.
pub const DEFAULT_MODELS_ENDPOINT: &str = "v1/models";

/// Bound on the whole request, connect to body.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can occur while listing models.
#[derive(Debug, Error)]
pub enum ModelFetchError {
    #[error("Invalid models URL from '{base}' and '{endpoint}': {reason}")]
    InvalidUrl {
        base: String,
        endpoint: String,
        reason: String,
    },

    #[error("Model listing timed out after {}ms", .duration.as_millis())]
    Timeout { duration: Duration },

    #[error("Request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("'{url}' returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Malformed model list from '{url}': {reason}")]
    MalformedBody { url: String, reason: String },
}

impl ModelFetchError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Request { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(default)]
    id: Option<String>,
}

/// Builds the models URL: `endpoint` (or `v1/models`) joined onto the origin
/// of `api_base_url`. An absolute `endpoint` is used as is.
pub fn models_url(api_base_url: &str, endpoint: Option<&str>) -> Result<Url, ModelFetchError> {
    let endpoint = endpoint
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_MODELS_ENDPOINT);
    let invalid = |reason: String| ModelFetchError::InvalidUrl {
        base: api_base_url.to_string(),
        endpoint: endpoint.to_string(),
        reason,
    };

    let base = Url::parse(api_base_url.trim()).map_err(|e| invalid(e.to_string()))?;
    let origin = base.origin();
    if !origin.is_tuple() {
        return Err(invalid("base URL has no origin".to_string()));
    }

    let origin = Url::parse(&origin.ascii_serialization()).map_err(|e| invalid(e.to_string()))?;
    origin.join(endpoint).map_err(|e| invalid(e.to_string()))
}

/// HTTP client for model listing.
#[derive(Debug, Clone)]
pub struct ModelFetcher {
    client: Client,
    timeout: Duration,
}

impl ModelFetcher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            timeout,
        }
    }

    /// Fetch the model ids served at `api_base_url`.
    ///
    /// Empty ids are dropped; the rest keep response order.
    pub async fn fetch(
        &self,
        api_base_url: &str,
        api_key: Option<&str>,
        models_endpoint: Option<&str>,
    ) -> Result<Vec<String>, ModelFetchError> {
        let url = models_url(api_base_url, models_endpoint)?;
        tracing::debug!(url = %url, "Fetching provider models");

        match timeout(self.timeout, self.do_fetch(url, api_key)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Model listing timed out");
                Err(ModelFetchError::Timeout {
                    duration: self.timeout,
                })
            }
        }
    }

    /// Fetch using a provider's own base URL, key and endpoint override.
    pub async fn fetch_for(&self, provider: &Provider) -> Result<Vec<String>, ModelFetchError> {
        self.fetch(
            &provider.api_base_url,
            Some(provider.api_key.as_str()),
            provider.models_endpoint.as_deref(),
        )
        .await
    }

    async fn do_fetch(&self, url: Url, api_key: Option<&str>) -> Result<Vec<String>, ModelFetchError> {
        let url_str = url.to_string();

        let mut builder = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| ModelFetchError::Request {
            url: url_str.clone(),
            source: e,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ModelFetchError::Request {
            url: url_str.clone(),
            source: e,
        })?;

        if !status.is_success() {
            return Err(ModelFetchError::Status {
                url: url_str,
                status: status.as_u16(),
                body,
            });
        }

        let list: ModelList =
            serde_json::from_str(&body).map_err(|e| ModelFetchError::MalformedBody {
                url: url_str.clone(),
                reason: e.to_string(),
            })?;

        let models: Vec<String> = list
            .data
            .into_iter()
            .filter_map(|entry| entry.id)
            .filter(|id| !id.is_empty())
            .collect();

        tracing::info!(url = %url_str, count = models.len(), "Fetched provider models");
        Ok(models)
    }
}

impl Default for ModelFetcher {
    fn default() -> Self {
        Self::new()
    }
}
