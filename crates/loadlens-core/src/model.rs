//! Remote suggestion model.
//!
//! [`SuggestionModel`] abstracts whatever produces model-backed
//! suggestions for one snapshot. The canonical implementation posts the
//! snapshot to a configured HTTP endpoint and normalizes whatever comes
//! back; the cancellation token is honored at every await point so a torn
//! down pipeline never waits on the wire.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::InferenceError;
use crate::metrics::MetricSnapshot;
use crate::normalize::normalize;
use crate::suggest::Suggestion;

/// Default remote request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A strategy that turns one snapshot into model-backed suggestions.
#[async_trait]
pub trait SuggestionModel: Send + Sync {
    /// Short label for logs and diagnostics.
    fn label(&self) -> &str;

    /// Produce suggestions for `snapshot`, honoring `cancel`.
    ///
    /// Every failure mode is recoverable; the caller substitutes rule
    /// output and carries on.
    async fn infer(
        &self,
        snapshot: &MetricSnapshot,
        cancel: CancellationToken,
    ) -> Result<Vec<Suggestion>, InferenceError>;
}

/// Shared HTTP client for remote calls.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, InferenceError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("loadlens/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

/// HTTP inference endpoint: `POST {url}` with `{"metrics": <snapshot>}`.
pub struct RemoteModel {
    client: reqwest::Client,
    url: String,
    label: String,
}

impl RemoteModel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let url = url.into();
        Ok(Self {
            client: http_client(timeout)?,
            label: format!("remote model at {url}"),
            url,
        })
    }
}

#[async_trait]
impl SuggestionModel for RemoteModel {
    fn label(&self) -> &str {
        &self.label
    }

    async fn infer(
        &self,
        snapshot: &MetricSnapshot,
        cancel: CancellationToken,
    ) -> Result<Vec<Suggestion>, InferenceError> {
        let request = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "metrics": snapshot }))
            .send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
            r = request => r?,
        };
        if !response.status().is_success() {
            return Err(InferenceError::Status(response.status().as_u16()));
        }
        let payload = tokio::select! {
            _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
            p = response.json::<Value>() => p?,
        };
        Ok(normalize(&payload)?)
    }
}
