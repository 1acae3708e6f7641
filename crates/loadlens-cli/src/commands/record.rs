//! `loadlens record`: record a pipeline run to disk for offline analysis.

use std::io::Write;
use std::path::PathBuf;

use loadlens_core::{Pipeline, RecorderConfig, RecordingWriter};
use tokio_util::sync::CancellationToken;

/// Flags for the record command.
pub struct RecordCommandConfig<'a> {
    pub duration: Option<&'a str>,
    pub output: Option<&'a str>,
    pub tags: &'a [String],
    pub note: Option<&'a str>,
    pub remote_url: Option<&'a str>,
    pub provider_url: Option<&'a str>,
    pub period: Option<&'a str>,
    pub every: Option<u64>,
    pub seed: Option<u64>,
}

pub fn run(config: RecordCommandConfig<'_>) {
    let pipeline_config = super::pipeline_config(
        config.remote_url,
        config.provider_url,
        config.period,
        config.every,
        config.seed,
    );
    let max_duration = config.duration.map(super::parse_duration);
    let tag_map = super::parse_tags(config.tags);
    let output_dir = config.output.map_or_else(|| PathBuf::from("recordings"), PathBuf::from);

    let source = if pipeline_config.provider_url.is_some() {
        "provider".to_string()
    } else {
        "synthetic_walk".to_string()
    };
    let recorder_config = RecorderConfig {
        source,
        output_dir,
        tags: tag_map,
        note: config.note.map(str::to_string),
    };

    let mut writer = match RecordingWriter::new(recorder_config) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error creating recording: {e}");
            std::process::exit(1);
        }
    };

    println!("Recording pipeline run");
    println!("  Mode:      {}", super::describe_config(&pipeline_config));
    match max_duration {
        Some(d) => println!("  Duration:  {}s", d.as_secs()),
        None => println!("  Duration:  until Ctrl+C"),
    }
    println!("  Period:    {}ms", pipeline_config.sample_period.as_millis());
    println!("  Output:    {}", writer.recording_dir().display());
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async move {
        let pipeline = match Pipeline::new(pipeline_config) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error building pipeline: {e}");
                std::process::exit(1);
            }
        };
        let mut rx = pipeline.subscribe();
        let cancel = CancellationToken::new();

        let signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.cancel();
            }
        });
        if let Some(d) = max_duration {
            let timed = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(d).await;
                timed.cancel();
            });
        }

        let handle = tokio::spawn(pipeline.run(cancel.clone()));
        let mut had_write_error = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = rx.borrow_and_update().clone();
                    if let Err(e) = writer.write_view(&view) {
                        eprintln!("\nError writing sample: {e}");
                        had_write_error = true;
                        break;
                    }
                    print!(
                        "\r  Ticks: {:<8} Elapsed: {:.1}s",
                        writer.ticks(),
                        writer.elapsed().as_secs_f64()
                    );
                    let _ = std::io::stdout().flush();
                }
            }
        }

        cancel.cancel();
        let _ = handle.await;

        println!();
        println!();
        if had_write_error {
            eprintln!("Recording stopped due to write error.");
        }

        match writer.finish() {
            Ok(dir) => {
                println!("Recording saved to {}", dir.display());
                println!("  session.json   metadata and tick counters");
                println!("  samples.csv    one row per recorded tick");
            }
            Err(e) => {
                eprintln!("Error finalizing recording: {e}");
                std::process::exit(1);
            }
        }
    });
}
