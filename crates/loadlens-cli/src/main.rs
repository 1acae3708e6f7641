//! CLI for loadlens: watch your machine think about its own load.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "loadlens")]
#[command(about = "loadlens: watch your machine think about its own load")]
#[command(version = loadlens_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and print one line per sampling tick
    Watch {
        /// Inference endpoint receiving POST {"metrics": ...}
        #[arg(long)]
        remote_url: Option<String>,

        /// Base URL of an external telemetry provider (replaces the
        /// synthetic source; implies a 3s period and inference every tick)
        #[arg(long)]
        provider_url: Option<String>,

        /// Sampling period, e.g. "1s", "250ms" (default: 1s, provider: 3s)
        #[arg(long)]
        period: Option<String>,

        /// Run remote inference every K-th tick (default: 5, provider: 1)
        #[arg(long)]
        every: Option<u64>,

        /// History points retained
        #[arg(long, default_value = "24")]
        history: usize,

        /// Remote request timeout, e.g. "10s"
        #[arg(long, default_value = "10s")]
        timeout: String,

        /// Seed for the synthetic walk; random when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this long, e.g. "2m" (default: until Ctrl+C)
        #[arg(long)]
        duration: Option<String>,

        /// Print each published view as a JSON line (pipe-friendly)
        #[arg(long)]
        json: bool,
    },

    /// Evaluate the suggestion rules once against a reading and exit
    Suggest {
        /// CPU utilization, percent
        #[arg(long)]
        cpu: Option<f64>,

        /// RAM utilization, percent
        #[arg(long)]
        ram: Option<f64>,

        /// Disk activity, percent
        #[arg(long)]
        disk: Option<f64>,

        /// Network activity, percent
        #[arg(long)]
        network: Option<f64>,

        /// Package temperature, degrees Celsius
        #[arg(long)]
        temperature: Option<f64>,

        /// Power draw, watts
        #[arg(long)]
        power: Option<f64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record a pipeline run to disk for offline analysis
    Record {
        /// Maximum recording duration, e.g. "5m", "30s" (default: until Ctrl+C)
        #[arg(long)]
        duration: Option<String>,

        /// Output directory (default: ./recordings/)
        #[arg(long)]
        output: Option<String>,

        /// Metadata tags as key:value pairs
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Recording note stored in session.json
        #[arg(long)]
        note: Option<String>,

        /// Inference endpoint receiving POST {"metrics": ...}
        #[arg(long)]
        remote_url: Option<String>,

        /// Base URL of an external telemetry provider
        #[arg(long)]
        provider_url: Option<String>,

        /// Sampling period, e.g. "1s", "250ms" (default: 1s, provider: 3s)
        #[arg(long)]
        period: Option<String>,

        /// Run remote inference every K-th tick (default: 5, provider: 1)
        #[arg(long)]
        every: Option<u64>,

        /// Seed for the synthetic walk; random when omitted
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Start the HTTP telemetry server over a running pipeline
    Server {
        /// Port to listen on
        #[arg(long, default_value = "8017")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Inference endpoint receiving POST {"metrics": ...}
        #[arg(long)]
        remote_url: Option<String>,

        /// Base URL of an external telemetry provider
        #[arg(long)]
        provider_url: Option<String>,

        /// Sampling period, e.g. "1s", "250ms" (default: 1s, provider: 3s)
        #[arg(long)]
        period: Option<String>,

        /// Run remote inference every K-th tick (default: 5, provider: 1)
        #[arg(long)]
        every: Option<u64>,

        /// Seed for the synthetic walk; random when omitted
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            remote_url,
            provider_url,
            period,
            every,
            history,
            timeout,
            seed,
            duration,
            json,
        } => commands::watch::run(commands::watch::WatchCommandConfig {
            remote_url: remote_url.as_deref(),
            provider_url: provider_url.as_deref(),
            period: period.as_deref(),
            every,
            history,
            timeout: &timeout,
            seed,
            duration: duration.as_deref(),
            json,
        }),
        Commands::Suggest { cpu, ram, disk, network, temperature, power, json } => {
            commands::suggest::run(cpu, ram, disk, network, temperature, power, json)
        }
        Commands::Record {
            duration,
            output,
            tags,
            note,
            remote_url,
            provider_url,
            period,
            every,
            seed,
        } => commands::record::run(commands::record::RecordCommandConfig {
            duration: duration.as_deref(),
            output: output.as_deref(),
            tags: &tags,
            note: note.as_deref(),
            remote_url: remote_url.as_deref(),
            provider_url: provider_url.as_deref(),
            period: period.as_deref(),
            every,
            seed,
        }),
        Commands::Server { port, host, remote_url, provider_url, period, every, seed } => {
            commands::server::run(
                &host,
                port,
                remote_url.as_deref(),
                provider_url.as_deref(),
                period.as_deref(),
                every,
                seed,
            )
        }
    }
}
