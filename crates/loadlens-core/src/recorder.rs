//! Session recording for offline analysis.
//!
//! Captures a bounded pipeline run to disk: one CSV row per published
//! view plus session metadata. Recording sits entirely outside the
//! pipeline; it observes views and never influences scheduling.
//!
//! # Storage Format
//!
//! Each recording is a directory containing:
//! - `session.json`: metadata (id, timing, source, cycle counts, tags)
//! - `samples.csv`: per-tick rows (tick, timestamp, channels, provenance)

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduler::PipelineView;
use crate::suggest::ModelSource;

// ---------------------------------------------------------------------------
// Recording metadata (session.json)
// ---------------------------------------------------------------------------

/// Recording metadata written to session.json when a recording finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingMeta {
    pub version: u32,
    pub id: String,
    pub started_at: String,
    pub ended_at: String,
    pub duration_ms: u64,
    pub source: String,
    pub ticks: u64,
    /// Ticks recorded while remote output was active.
    pub remote_ticks: u64,
    /// Ticks recorded while rule output was active.
    pub fallback_ticks: u64,
    pub tags: HashMap<String, String>,
    pub note: Option<String>,
    pub loadlens_version: String,
}

// ---------------------------------------------------------------------------
// Recorder config
// ---------------------------------------------------------------------------

/// Configuration for one recording.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Name of the metric source feeding the pipeline (for the directory
    /// name and metadata).
    pub source: String,
    pub output_dir: PathBuf,
    pub tags: HashMap<String, String>,
    pub note: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            source: "synthetic_walk".to_string(),
            output_dir: PathBuf::from("recordings"),
            tags: HashMap::new(),
            note: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Recording writer
// ---------------------------------------------------------------------------

/// Handles incremental file I/O for one recording.
pub struct RecordingWriter {
    recording_dir: PathBuf,
    csv_writer: BufWriter<File>,
    ticks: u64,
    remote_ticks: u64,
    fallback_ticks: u64,
    started_at: SystemTime,
    started_instant: Instant,
    recording_id: String,
    config: RecorderConfig,
}

impl RecordingWriter {
    /// Create the recording directory and CSV, ready for rows.
    pub fn new(config: RecorderConfig) -> std::io::Result<Self> {
        let recording_id = Uuid::new_v4().to_string();
        let started_at = SystemTime::now();

        let ts = started_at.duration_since(UNIX_EPOCH).unwrap_or_default();
        let dir_name = format!("{}-{}", format_iso8601_compact(ts), config.source);
        let recording_dir = config.output_dir.join(&dir_name);
        fs::create_dir_all(&recording_dir)?;

        let csv_file = File::create(recording_dir.join("samples.csv"))?;
        let mut csv_writer = BufWriter::new(csv_file);
        writeln!(
            csv_writer,
            "tick,captured_unix_ms,cpu,ram,disk,network,temperature,power,model_source,suggestions"
        )?;
        csv_writer.flush()?;

        Ok(Self {
            recording_dir,
            csv_writer,
            ticks: 0,
            remote_ticks: 0,
            fallback_ticks: 0,
            started_at,
            started_instant: Instant::now(),
            recording_id,
            config,
        })
    }

    /// Record one published view as a CSV row.
    pub fn write_view(&mut self, view: &PipelineView) -> std::io::Result<()> {
        let snap = &view.snapshot;
        writeln!(
            self.csv_writer,
            "{},{},{},{},{},{},{},{},{},{}",
            view.tick,
            snap.captured_unix_ms,
            snap.cpu,
            snap.ram,
            snap.disk,
            snap.network,
            snap.temperature,
            snap.power,
            view.advice.source,
            view.advice.suggestions.len()
        )?;
        self.csv_writer.flush()?;

        self.ticks += 1;
        match view.advice.source {
            ModelSource::Remote => self.remote_ticks += 1,
            ModelSource::Fallback => self.fallback_ticks += 1,
        }
        Ok(())
    }

    /// Finalize the recording, writing session.json.
    pub fn finish(mut self) -> std::io::Result<PathBuf> {
        self.csv_writer.flush()?;

        let ended_at = SystemTime::now();
        let duration = self.started_instant.elapsed();

        let meta = RecordingMeta {
            version: 1,
            id: self.recording_id,
            started_at: format_iso8601(
                self.started_at.duration_since(UNIX_EPOCH).unwrap_or_default(),
            ),
            ended_at: format_iso8601(ended_at.duration_since(UNIX_EPOCH).unwrap_or_default()),
            duration_ms: duration.as_millis() as u64,
            source: self.config.source.clone(),
            ticks: self.ticks,
            remote_ticks: self.remote_ticks,
            fallback_ticks: self.fallback_ticks,
            tags: self.config.tags.clone(),
            note: self.config.note.clone(),
            loadlens_version: crate::VERSION.to_string(),
        };

        let json = serde_json::to_string_pretty(&meta).map_err(std::io::Error::other)?;
        fs::write(self.recording_dir.join("session.json"), json)?;

        Ok(self.recording_dir.clone())
    }

    /// The recording directory path.
    pub fn recording_dir(&self) -> &Path {
        &self.recording_dir
    }

    /// Rows written so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Elapsed time since the recording started.
    pub fn elapsed(&self) -> Duration {
        self.started_instant.elapsed()
    }
}

// ---------------------------------------------------------------------------
// Timestamp helpers
// ---------------------------------------------------------------------------

/// Full ISO-8601 timestamp, e.g. `2026-08-23T01:30:00Z`.
fn format_iso8601(since_epoch: Duration) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(since_epoch.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Compact ISO-8601 timestamp for directory names, e.g. `2026-08-23T013000Z`.
fn format_iso8601_compact(since_epoch: Duration) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(since_epoch.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}{min:02}{sec:02}Z")
}

/// Seconds since the Unix epoch to (year, month, day, hour, minute, second)
/// UTC, via the civil-from-days algorithm. No leap seconds.
fn secs_to_utc(secs: u64) -> (i64, u32, u32, u32, u32, u32) {
    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;

    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097) as u64;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe as i64 + era * 400 + i64::from(month <= 2);

    (year, month, day, (rem / 3_600) as u32, ((rem / 60) % 60) as u32, (rem % 60) as u32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricSnapshot;
    use crate::suggest::{Advice, Priority, Suggestion};

    fn view(tick: u64, source: ModelSource) -> PipelineView {
        PipelineView {
            tick,
            snapshot: MetricSnapshot::initial(tick * 1000),
            history: Vec::new(),
            advice: Advice {
                suggestions: vec![Suggestion::new("t", "d", Priority::Low)],
                source,
                last_inference_unix_ms: tick * 1000,
            },
            awaiting_remote: false,
            substitutions: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Timestamp tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_format_iso8601_epoch() {
        assert_eq!(format_iso8601(Duration::from_secs(0)), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_format_iso8601_compact_epoch() {
        assert_eq!(format_iso8601_compact(Duration::from_secs(0)), "1970-01-01T000000Z");
    }

    #[test]
    fn test_secs_to_utc_known_dates() {
        // 2000-01-01 00:00:00 UTC
        assert_eq!(secs_to_utc(946_684_800), (2000, 1, 1, 0, 0, 0));
        // 2024-02-29 12:00:00 UTC (leap day)
        assert_eq!(secs_to_utc(1_709_208_000), (2024, 2, 29, 12, 0, 0));
    }

    // -----------------------------------------------------------------------
    // RecordingWriter tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_writer_creates_directory_and_files() {
        let tmp = tempfile::tempdir().unwrap();
        let config = RecorderConfig {
            output_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };

        let writer = RecordingWriter::new(config).unwrap();
        let dir = writer.recording_dir().to_path_buf();
        assert!(dir.exists());
        assert!(dir.join("samples.csv").exists());

        let result_dir = writer.finish().unwrap();
        assert!(result_dir.join("session.json").exists());
    }

    #[test]
    fn test_writer_records_rows_and_counts() {
        let tmp = tempfile::tempdir().unwrap();
        let config = RecorderConfig {
            output_dir: tmp.path().to_path_buf(),
            ..Default::default()
        };

        let mut writer = RecordingWriter::new(config).unwrap();
        writer.write_view(&view(1, ModelSource::Fallback)).unwrap();
        writer.write_view(&view(2, ModelSource::Fallback)).unwrap();
        writer.write_view(&view(3, ModelSource::Remote)).unwrap();
        assert_eq!(writer.ticks(), 3);

        let dir = writer.recording_dir().to_path_buf();
        let result_dir = writer.finish().unwrap();

        let csv = std::fs::read_to_string(dir.join("samples.csv")).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "tick,captured_unix_ms,cpu,ram,disk,network,temperature,power,model_source,suggestions"
        );
        assert_eq!(lines.len(), 4); // header + 3 rows
        assert!(lines[1].starts_with("1,1000,34,"));
        assert!(lines[3].contains("remote"));

        let meta: RecordingMeta =
            serde_json::from_str(&std::fs::read_to_string(result_dir.join("session.json")).unwrap())
                .unwrap();
        assert_eq!(meta.version, 1);
        assert_eq!(meta.ticks, 3);
        assert_eq!(meta.remote_ticks, 1);
        assert_eq!(meta.fallback_ticks, 2);
        assert_eq!(meta.source, "synthetic_walk");
    }

    #[test]
    fn test_writer_keeps_tags_and_note() {
        let tmp = tempfile::tempdir().unwrap();
        let mut tags = HashMap::new();
        tags.insert("host".to_string(), "bench-3".to_string());

        let config = RecorderConfig {
            output_dir: tmp.path().to_path_buf(),
            tags,
            note: Some("overnight idle run".to_string()),
            ..Default::default()
        };

        let writer = RecordingWriter::new(config).unwrap();
        let dir = writer.finish().unwrap();

        let meta: RecordingMeta =
            serde_json::from_str(&std::fs::read_to_string(dir.join("session.json")).unwrap())
                .unwrap();
        assert_eq!(meta.tags.get("host").unwrap(), "bench-3");
        assert_eq!(meta.note.unwrap(), "overnight idle run");
    }
}
