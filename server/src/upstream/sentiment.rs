use reqwest::Url;
use serde::Deserialize;

use super::{RestClient, UpstreamError};

/// Label used when the analyzer gives no usable answer.
pub const DEFAULT_SENTIMENT: &str = "neutral";

/// Reply of the sentiment analyzer: `{"sentiment": "positive"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SentimentResponse {
    #[serde(default)]
    pub sentiment: Option<String>,
}

impl SentimentResponse {
    pub fn label(&self) -> &str {
        self.sentiment
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SENTIMENT)
    }
}

/// Client for the external sentiment analyzer (`GET {base}analyze/{text}`).
#[derive(Clone, Debug)]
pub struct SentimentClient {
    rest: RestClient,
}

impl SentimentClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            rest: RestClient::new(base_url),
        }
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            rest: RestClient::with_client(base_url, http),
        }
    }

    /// The review text goes in as one percent-encoded path segment.
    pub fn analyze_url(&self, text: &str) -> Result<Url, UpstreamError> {
        let base = self.rest.base_url();
        let mut url = Url::parse(base).map_err(|e| UpstreamError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .push("analyze")
            .push(text);
        Ok(url)
    }

    /// Classify `text`. Never fails: on any error the response carries no
    /// sentiment and [`SentimentResponse::label`] falls back to neutral.
    pub async fn analyze(&self, text: &str) -> SentimentResponse {
        let url = match self.analyze_url(text) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "cannot build sentiment request");
                return SentimentResponse::default();
            }
        };

        match self.rest.fetch_json(url.as_str()).await {
            Some(body) => serde_json::from_value(body).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "unexpected sentiment reply");
                SentimentResponse::default()
            }),
            None => SentimentResponse::default(),
        }
    }
}
