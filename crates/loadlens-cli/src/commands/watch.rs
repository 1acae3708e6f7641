//! `loadlens watch`: live line-per-tick console view of the pipeline.

use loadlens_core::{ModelSource, Pipeline, PipelineView};
use tokio_util::sync::CancellationToken;

/// Flags for the watch command.
pub struct WatchCommandConfig<'a> {
    pub remote_url: Option<&'a str>,
    pub provider_url: Option<&'a str>,
    pub period: Option<&'a str>,
    pub every: Option<u64>,
    pub history: usize,
    pub timeout: &'a str,
    pub seed: Option<u64>,
    pub duration: Option<&'a str>,
    pub json: bool,
}

pub fn run(config: WatchCommandConfig<'_>) {
    let mut pipeline_config = super::pipeline_config(
        config.remote_url,
        config.provider_url,
        config.period,
        config.every,
        config.seed,
    );
    pipeline_config.history_capacity = config.history;
    pipeline_config.remote_timeout = super::parse_duration(config.timeout);
    let max_duration = config.duration.map(super::parse_duration);

    if !config.json {
        println!(
            "Loadlens v{} ({})",
            loadlens_core::VERSION,
            super::describe_config(&pipeline_config)
        );
        match max_duration {
            Some(d) => println!("Watching for {:.0}s.", d.as_secs_f64()),
            None => println!("Press Ctrl+C to stop."),
        }
        println!();
    }

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
        let mut printer = TickPrinter::new();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = rx.borrow_and_update().clone();
                    if config.json {
                        if let Ok(line) = serde_json::to_string(&view) {
                            println!("{line}");
                        }
                    } else {
                        printer.print(&view);
                    }
                }
            }
        }
        let _ = handle.await;
    });
}

/// Prints tick lines, and the suggestion set whenever it changes.
struct TickPrinter {
    last_source: Option<ModelSource>,
    last_titles: Vec<String>,
    last_substitution_ms: u64,
}

impl TickPrinter {
    fn new() -> Self {
        Self { last_source: None, last_titles: Vec::new(), last_substitution_ms: 0 }
    }

    fn print(&mut self, view: &PipelineView) {
        let s = &view.snapshot;
        println!(
            "tick {:>4}  cpu {:>5.1}%  ram {:>5.1}%  disk {:>5.1}%  net {:>5.1}%  temp {:>5.1}°C  power {:>6.1}W  [{}]",
            view.tick, s.cpu, s.ram, s.disk, s.network, s.temperature, s.power, view.advice.source
        );

        if let Some(sub) = view.substitutions.last() {
            if sub.at_unix_ms > self.last_substitution_ms {
                self.last_substitution_ms = sub.at_unix_ms;
                println!("      substituted rule fallback: {}", sub.reason);
            }
        }

        let titles: Vec<String> =
            view.advice.suggestions.iter().map(|s| s.title.clone()).collect();
        if self.last_source != Some(view.advice.source) || self.last_titles != titles {
            self.last_source = Some(view.advice.source);
            self.last_titles = titles;
            for suggestion in &view.advice.suggestions {
                println!("      [{}] {}", suggestion.priority, suggestion.title);
                println!("            {}", suggestion.detail);
            }
        }
    }
}
