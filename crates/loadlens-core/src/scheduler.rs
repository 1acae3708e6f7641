//! Pipeline orchestration.
//!
//! One task owns everything mutable: the source, the history, the active
//! advice, the substitution journal, and the inference gate. Sampling runs
//! every tick; remote inference runs on a coarser cadence with at most one
//! call in flight. Consumers observe the pipeline through a watch channel
//! and can never mutate it.
//!
//! The inference gate is an explicit state machine, `Idle` or
//! `AwaitingRemote`, transitioned only by the loop. In-flight calls report
//! back over a single-slot channel tagged with a sequence number; a
//! completion that does not match the awaited sequence is discarded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::InferenceError;
use crate::history::{HistoryBuffer, HistoryPoint, DEFAULT_CAPACITY};
use crate::metrics::{unix_ms_now, MetricSnapshot};
use crate::model::{http_client, RemoteModel, SuggestionModel, DEFAULT_TIMEOUT};
use crate::provider::{ProviderModel, ProviderSource};
use crate::rules;
use crate::source::{MetricSource, SyntheticSource};
use crate::suggest::{Advice, ModelSource, Suggestion};

/// How many substitutions the journal retains.
const SUBSTITUTION_LOG_CAP: usize = 16;

/// Pipeline tuning and endpoint configuration.
///
/// With no URL configured the pipeline runs fully local: synthetic
/// readings, rules every tick, zero network calls. `remote_url` enables
/// model inference every `inference_every`-th tick. `provider_url` takes
/// precedence over both the synthetic source and `remote_url`: readings
/// and predictions are then polled from the provider.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Sampling tick period.
    pub sample_period: Duration,
    /// Remote inference runs every K-th tick.
    pub inference_every: u64,
    /// History points retained.
    pub history_capacity: usize,
    /// Remote request timeout.
    pub remote_timeout: Duration,
    /// Inference endpoint receiving `POST {"metrics": ...}`.
    pub remote_url: Option<String>,
    /// Base URL of an external telemetry provider.
    pub provider_url: Option<String>,
    /// Seed for the synthetic walk; random when absent.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_secs(1),
            inference_every: 5,
            history_capacity: DEFAULT_CAPACITY,
            remote_timeout: DEFAULT_TIMEOUT,
            remote_url: None,
            provider_url: None,
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Provider-backed preset: both provider endpoints polled every 3 s.
    pub fn for_provider(base_url: impl Into<String>) -> Self {
        Self {
            sample_period: Duration::from_secs(3),
            inference_every: 1,
            provider_url: Some(base_url.into()),
            ..Self::default()
        }
    }
}

/// One fallback substitution, kept for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Substitution {
    pub at_unix_ms: u64,
    pub reason: String,
}

/// Read-only pipeline state published to consumers once per tick.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineView {
    /// Sampling ticks completed so far.
    pub tick: u64,
    /// Latest reading.
    pub snapshot: MetricSnapshot,
    /// Full history content, oldest first.
    pub history: Vec<HistoryPoint>,
    /// Active suggestions with provenance.
    pub advice: Advice,
    /// Whether a remote call is currently in flight.
    pub awaiting_remote: bool,
    /// Recent fallback substitutions, oldest first.
    pub substitutions: Vec<Substitution>,
}

/// Inference gate. Only the pipeline loop transitions it.
enum InferenceGate {
    Idle,
    AwaitingRemote {
        seq: u64,
        /// The snapshot the in-flight call was issued for; fallback
        /// substitution on failure evaluates the rules against it.
        sent: MetricSnapshot,
        token: CancellationToken,
    },
}

/// Result of one in-flight call, reported back to the loop.
struct Completion {
    seq: u64,
    outcome: Result<Vec<Suggestion>, InferenceError>,
}

/// Mutable state owned by the pipeline loop.
struct CycleState {
    tick: u64,
    latest: MetricSnapshot,
    history: HistoryBuffer,
    advice: Advice,
    gate: InferenceGate,
    next_seq: u64,
    substitutions: VecDeque<Substitution>,
}

/// The telemetry and suggestion pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    source: Box<dyn MetricSource>,
    model: Option<Arc<dyn SuggestionModel>>,
    views: watch::Sender<PipelineView>,
}

impl Pipeline {
    /// Build a pipeline from configuration, resolving source and model.
    pub fn new(config: PipelineConfig) -> Result<Self, InferenceError> {
        let (source, model): (Box<dyn MetricSource>, Option<Arc<dyn SuggestionModel>>) =
            if let Some(base) = &config.provider_url {
                let client = http_client(config.remote_timeout)?;
                (
                    Box::new(ProviderSource::new(client.clone(), base)),
                    Some(Arc::new(ProviderModel::new(client, base))),
                )
            } else {
                let source = match config.seed {
                    Some(seed) => SyntheticSource::with_seed(seed),
                    None => SyntheticSource::new(),
                };
                let model: Option<Arc<dyn SuggestionModel>> = match &config.remote_url {
                    Some(url) => Some(Arc::new(RemoteModel::new(url.clone(), config.remote_timeout)?)),
                    None => None,
                };
                (Box::new(source), model)
            };
        Ok(Self::from_parts(config, source, model))
    }

    /// Build a pipeline from explicit parts.
    pub fn from_parts(
        config: PipelineConfig,
        source: Box<dyn MetricSource>,
        model: Option<Arc<dyn SuggestionModel>>,
    ) -> Self {
        let now = unix_ms_now();
        let initial = MetricSnapshot::initial(now);
        let advice = Advice {
            suggestions: rules::evaluate(&initial),
            source: ModelSource::Fallback,
            last_inference_unix_ms: now,
        };
        let (views, _) = watch::channel(PipelineView {
            tick: 0,
            snapshot: initial,
            history: Vec::new(),
            advice,
            awaiting_remote: false,
            substitutions: Vec::new(),
        });
        Self { config, source, model, views }
    }

    /// Subscribe to published pipeline views.
    pub fn subscribe(&self) -> watch::Receiver<PipelineView> {
        self.views.subscribe()
    }

    /// Run until `cancel` fires.
    ///
    /// Snapshot production, history mutation, and fallback evaluation all
    /// complete within one tick; the only suspension points are the ticker
    /// and the in-flight call, which lives in its own task.
    pub async fn run(mut self, cancel: CancellationToken) {
        let every = self.config.inference_every.max(1);
        let mut ticker = tokio::time::interval(self.config.sample_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick completes immediately; consume it so
        // tick 1 lands one full period after startup.
        ticker.tick().await;

        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(1);
        let seed_view = self.views.borrow().clone();
        let mut state = CycleState {
            tick: 0,
            latest: seed_view.snapshot,
            history: HistoryBuffer::new(self.config.history_capacity),
            advice: seed_view.advice,
            gate: InferenceGate::Idle,
            next_seq: 1,
            substitutions: VecDeque::new(),
        };

        match &self.model {
            Some(model) => log::info!(
                "pipeline started: source {}, {} every {} ticks",
                self.source.name(),
                model.label(),
                every
            ),
            None => log::info!(
                "pipeline started: source {}, rule fallback every tick",
                self.source.name()
            ),
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    if let InferenceGate::AwaitingRemote { token, .. } = &state.gate {
                        token.cancel();
                    }
                    log::info!("pipeline stopped after {} ticks", state.tick);
                    break;
                }
                Some(done) = done_rx.recv() => {
                    self.on_completion(&mut state, done);
                }
                _ = ticker.tick() => {
                    self.on_tick(&mut state, every, &done_tx, &cancel).await;
                }
            }
        }
    }

    async fn on_tick(
        &mut self,
        state: &mut CycleState,
        every: u64,
        done_tx: &mpsc::Sender<Completion>,
        cancel: &CancellationToken,
    ) {
        state.tick += 1;
        let snapshot = self.source.sample().await;
        state.latest = snapshot.clone();
        state.history.append(HistoryPoint::from_snapshot(&snapshot));

        match &self.model {
            None => {
                // Fully local mode: rules every tick, no cadence.
                state.advice = Advice {
                    suggestions: rules::evaluate(&snapshot),
                    source: ModelSource::Fallback,
                    last_inference_unix_ms: unix_ms_now(),
                };
            }
            Some(model) => {
                if state.tick % every == 0 {
                    match &state.gate {
                        InferenceGate::AwaitingRemote { seq, .. } => {
                            log::debug!(
                                "tick {}: call #{seq} still in flight, skipping this cycle",
                                state.tick
                            );
                        }
                        InferenceGate::Idle => {
                            let seq = state.next_seq;
                            state.next_seq += 1;
                            let token = cancel.child_token();
                            state.gate = InferenceGate::AwaitingRemote {
                                seq,
                                sent: snapshot.clone(),
                                token: token.clone(),
                            };
                            log::debug!("tick {}: issuing call #{seq}", state.tick);
                            let model = Arc::clone(model);
                            let tx = done_tx.clone();
                            tokio::spawn(async move {
                                let outcome = model.infer(&snapshot, token).await;
                                let _ = tx.send(Completion { seq, outcome }).await;
                            });
                        }
                    }
                }
            }
        }
        self.publish(state);
    }

    fn on_completion(&self, state: &mut CycleState, done: Completion) {
        let (awaited, sent) = match &state.gate {
            InferenceGate::AwaitingRemote { seq, sent, .. } => (*seq, sent.clone()),
            InferenceGate::Idle => {
                log::debug!("discarding stray completion #{}", done.seq);
                return;
            }
        };
        if done.seq != awaited {
            log::debug!("discarding stale completion #{} (awaiting #{awaited})", done.seq);
            return;
        }
        state.gate = InferenceGate::Idle;

        let now = unix_ms_now();
        match done.outcome {
            Ok(suggestions) => {
                log::debug!("call #{awaited} accepted with {} suggestions", suggestions.len());
                state.advice = Advice {
                    suggestions,
                    source: ModelSource::Remote,
                    last_inference_unix_ms: now,
                };
            }
            Err(InferenceError::Cancelled) => {
                // A cancelled call's result never mutates advice.
                log::debug!("call #{awaited} cancelled, result discarded");
                return;
            }
            Err(err) => {
                log::warn!("call #{awaited} unusable, substituting rule fallback: {err}");
                state.substitutions.push_back(Substitution {
                    at_unix_ms: now,
                    reason: err.to_string(),
                });
                while state.substitutions.len() > SUBSTITUTION_LOG_CAP {
                    state.substitutions.pop_front();
                }
                state.advice = Advice {
                    suggestions: rules::evaluate(&sent),
                    source: ModelSource::Fallback,
                    last_inference_unix_ms: now,
                };
            }
        }
        self.publish(state);
    }

    fn publish(&self, state: &CycleState) {
        self.views.send_replace(PipelineView {
            tick: state.tick,
            snapshot: state.latest.clone(),
            history: state.history.snapshot(),
            advice: state.advice.clone(),
            awaiting_remote: matches!(state.gate, InferenceGate::AwaitingRemote { .. }),
            substitutions: state.substitutions.iter().cloned().collect(),
        });
    }
}
