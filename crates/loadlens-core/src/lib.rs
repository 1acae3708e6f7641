//! # loadlens-core
//!
//! **Watch your machine think about its own load.**
//!
//! `loadlens-core` is a telemetry pipeline: it samples a set of metric
//! channels every tick, keeps a bounded history, and maintains a set of
//! optimization suggestions produced either by a remote model or by a
//! deterministic rule fallback. The remote side is optional and untrusted:
//! absent, slow, or invalid model output never stalls the pipeline, it
//! just falls back to the rules.
//!
//! ## Quick Start
//!
//! ```no_run
//! use loadlens_core::{Pipeline, PipelineConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     // No endpoints configured: synthetic readings, rules every tick.
//!     let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//!     let mut views = pipeline.subscribe();
//!     let cancel = CancellationToken::new();
//!     tokio::spawn(pipeline.run(cancel.clone()));
//!
//!     views.changed().await.unwrap();
//!     let view = views.borrow().clone();
//!     println!("tick {}: cpu {:.1}%, {} suggestions", view.tick, view.snapshot.cpu,
//!         view.advice.suggestions.len());
//!     cancel.cancel();
//! }
//! ```
//!
//! ## Architecture
//!
//! Source → History → Scheduler → published view
//!
//! One task owns all mutable state. Sampling runs every tick; remote
//! inference runs every K-th tick with at most one call in flight, and
//! any unusable result is substituted with rule output over the snapshot
//! that was sent. Consumers (CLI, HTTP server) observe the pipeline
//! through a watch channel and stay strictly read-only.

pub mod error;
pub mod history;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod recorder;
pub mod rules;
pub mod scheduler;
pub mod source;
pub mod suggest;

pub use error::InferenceError;
pub use history::{HistoryBuffer, HistoryPoint, clock_label, DEFAULT_CAPACITY};
pub use metrics::{Channel, ChannelBounds, MetricSnapshot, round1, step_value, unix_ms_now};
pub use model::{RemoteModel, SuggestionModel, DEFAULT_TIMEOUT};
pub use normalize::{normalize, NormalizeError};
pub use provider::{ProviderModel, ProviderSource};
pub use recorder::{RecorderConfig, RecordingMeta, RecordingWriter};
pub use scheduler::{Pipeline, PipelineConfig, PipelineView, Substitution};
pub use source::{MetricSource, SourceInfo, SyntheticSource};
pub use suggest::{Advice, ModelSource, Priority, Suggestion};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
