//! Outbound REST helper for the dealer backend service.
//!
//! Failures never propagate out of [`RestClient::get`] / [`RestClient::post`]:
//! they are logged and collapse to `None`, which callers treat as "no data".
//! [`RestClient::try_post`] keeps the distinction for callers that report it.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub mod sentiment;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("network error calling {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Thin JSON-over-HTTP client bound to one base URL.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct RestClient {
    base_url: String,
    http: Client,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url + endpoint`, then `?k=v&k=v` for every param in order.
    /// Values are appended verbatim (no percent-encoding).
    pub fn request_url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.base_url, endpoint);
        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    /// GET `endpoint` and decode the body as JSON, or `None` on any failure.
    pub async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Option<Value> {
        let url = self.request_url(endpoint, params);
        self.fetch_json(&url).await
    }

    /// GET an absolute URL and decode the body as JSON, or `None` on any failure.
    pub async fn fetch_json(&self, url: &str) -> Option<Value> {
        tracing::info!(url = %url, "GET from upstream");
        match self.send_json(self.http.get(url), url).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "upstream GET failed");
                None
            }
        }
    }

    /// POST a JSON body to `endpoint`, or `None` on any failure.
    pub async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Option<Value> {
        self.try_post(endpoint, body).await.ok()
    }

    /// POST a JSON body to `endpoint`, keeping the failure reason.
    pub async fn try_post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<Value, UpstreamError> {
        let url = self.request_url(endpoint, &[]);
        tracing::info!(url = %url, "POST to upstream");
        let result = self.send_json(self.http.post(&url).json(body), &url).await;
        match &result {
            Ok(value) => tracing::debug!(response = %value, "upstream POST answered"),
            Err(e) => tracing::warn!(error = %e, "upstream POST failed"),
        }
        result
    }

    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<Value, UpstreamError> {
        let response = request.send().await.map_err(|source| UpstreamError::Network {
            url: url.to_string(),
            source,
        })?;

        response
            .json::<Value>()
            .await
            .map_err(|source| UpstreamError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

/// Python-style truthiness of a JSON reply: `null`, `false`, `0`, `""`,
/// `[]` and `{}` are all "nothing came back".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
