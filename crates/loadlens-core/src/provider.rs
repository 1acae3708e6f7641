//! Provider-backed telemetry.
//!
//! Instead of walking synthetic values, this mode polls an external
//! telemetry provider: one endpoint for current readings, one for a
//! server-side prediction. The provider answers with a `status` payload
//! while it is still warming up; until real data arrives the previous
//! reading is retained. Channels the provider never reports are zero.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::InferenceError;
use crate::metrics::{unix_ms_now, MetricSnapshot};
use crate::model::SuggestionModel;
use crate::source::{MetricSource, SourceInfo};
use crate::suggest::{Priority, Suggestion};

/// Detail text attached to every provider recommendation.
const RECOMMENDATION_DETAIL: &str = "AI-generated optimization recommendation.";

static PROVIDER_INFO: SourceInfo = SourceInfo {
    name: "telemetry_provider",
    description: "Current readings polled from an external telemetry provider",
    synthetic: false,
};

/// Map a provider metrics payload onto the canonical channel set.
///
/// Returns `None` while the provider is warming up (payload carries a
/// `status` field) or when the payload is not an object. The provider
/// reports cpu_usage, memory_usage and battery_percent; disk, network and
/// temperature have no provider-side equivalent and read as zero.
pub fn map_system_payload(payload: &Value, captured_unix_ms: u64) -> Option<MetricSnapshot> {
    let map = payload.as_object()?;
    if map.contains_key("status") {
        return None;
    }
    let field = |key: &str| map.get(key).and_then(Value::as_f64).unwrap_or(0.0);
    Some(MetricSnapshot {
        cpu: field("cpu_usage"),
        ram: field("memory_usage"),
        disk: 0.0,
        network: 0.0,
        temperature: 0.0,
        power: field("battery_percent"),
        captured_unix_ms,
    })
}

/// Map a provider prediction payload into suggestions.
///
/// The prediction is usable once `user_state` is present; each entry of
/// `recommendations` becomes one suggestion with a fixed detail text and
/// the priority taken from the `confidence` field.
pub fn map_prediction(payload: &Value) -> Result<Vec<Suggestion>, InferenceError> {
    if payload.get("user_state").and_then(Value::as_str).is_none_or(str::is_empty) {
        return Err(InferenceError::Payload("prediction not ready".into()));
    }
    let priority = Priority::from_label(payload.get("confidence").and_then(Value::as_str));
    let recommendations = payload
        .get("recommendations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let out: Vec<Suggestion> = recommendations
        .iter()
        .filter_map(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(|text| Suggestion::new(text, RECOMMENDATION_DETAIL, priority))
        .collect();
    if out.is_empty() {
        return Err(InferenceError::Payload("prediction carries no recommendations".into()));
    }
    Ok(out)
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}

/// Metric source polling the provider's current-readings endpoint.
pub struct ProviderSource {
    client: reqwest::Client,
    url: String,
    current: MetricSnapshot,
}

impl ProviderSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            url: join(base_url, "client-system"),
            current: MetricSnapshot::initial(unix_ms_now()),
        }
    }

    async fn fetch(&self) -> Result<Value, InferenceError> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl MetricSource for ProviderSource {
    fn info(&self) -> &SourceInfo {
        &PROVIDER_INFO
    }

    async fn sample(&mut self) -> MetricSnapshot {
        match self.fetch().await {
            Ok(payload) => {
                let now = unix_ms_now().max(self.current.captured_unix_ms);
                match map_system_payload(&payload, now) {
                    Some(snapshot) => self.current = snapshot,
                    None => log::debug!("telemetry provider warming up, retaining previous reading"),
                }
            }
            Err(err) => {
                log::debug!("telemetry provider unreachable, retaining previous reading: {err}");
            }
        }
        self.current.clone()
    }
}

/// Suggestion model backed by the provider's prediction endpoint.
pub struct ProviderModel {
    client: reqwest::Client,
    url: String,
    label: String,
}

impl ProviderModel {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        let url = join(base_url, "predicted");
        Self { client, label: format!("provider prediction at {url}"), url }
    }
}

#[async_trait]
impl SuggestionModel for ProviderModel {
    fn label(&self) -> &str {
        &self.label
    }

    async fn infer(
        &self,
        _snapshot: &MetricSnapshot,
        cancel: CancellationToken,
    ) -> Result<Vec<Suggestion>, InferenceError> {
        // The provider predicts from its own server-side window; the local
        // snapshot is not sent.
        let request = self.client.get(&self.url).send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
            r = request => r?.error_for_status()?,
        };
        let payload = tokio::select! {
            _ = cancel.cancelled() => return Err(InferenceError::Cancelled),
            p = response.json::<Value>() => p?,
        };
        map_prediction(&payload)
    }
}
