//! `loadlens suggest`: evaluate the fallback rules once and exit.

use loadlens_core::rules;
use loadlens_core::{Channel, MetricSnapshot, unix_ms_now};

#[allow(clippy::too_many_arguments)]
pub fn run(
    cpu: Option<f64>,
    ram: Option<f64>,
    disk: Option<f64>,
    network: Option<f64>,
    temperature: Option<f64>,
    power: Option<f64>,
    json: bool,
) {
    let mut snapshot = MetricSnapshot::initial(unix_ms_now());
    let overrides = [
        (Channel::Cpu, cpu),
        (Channel::Ram, ram),
        (Channel::Disk, disk),
        (Channel::Network, network),
        (Channel::Temperature, temperature),
        (Channel::Power, power),
    ];
    for (channel, value) in overrides {
        if let Some(v) = value {
            snapshot.set(channel, v);
        }
    }

    if !snapshot.in_bounds() {
        eprintln!("Note: reading lies outside the declared channel bounds.");
    }

    let suggestions = rules::evaluate(&snapshot);

    if json {
        let out = serde_json::json!({
            "metrics": snapshot,
            "suggestions": suggestions,
        });
        match serde_json::to_string_pretty(&out) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error serializing output: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!(
        "Reading: cpu {:.1}%  ram {:.1}%  disk {:.1}%  net {:.1}%  temp {:.1}°C  power {:.1}W",
        snapshot.cpu,
        snapshot.ram,
        snapshot.disk,
        snapshot.network,
        snapshot.temperature,
        snapshot.power
    );
    println!();
    let n = suggestions.len();
    println!("{n} suggestion{}:", if n == 1 { "" } else { "s" });
    for suggestion in &suggestions {
        println!("  [{}] {}", suggestion.priority, suggestion.title);
        println!("        {}", suggestion.detail);
    }
}
