pub mod record;
pub mod server;
pub mod suggest;
pub mod watch;

use std::collections::HashMap;
use std::time::Duration;

use loadlens_core::PipelineConfig;

/// Parse a duration string like "5m", "30s", "1h", "100ms".
/// A bare number is taken as seconds.
pub fn parse_duration(s: &str) -> Duration {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else {
        (s, 1000)
    };

    let value: u64 = numeric.trim().parse().unwrap_or_else(|_| {
        eprintln!("Invalid duration: {s}");
        std::process::exit(1);
    });

    Duration::from_millis(value * multiplier)
}

/// Parse `key:value` tag arguments, warning about malformed ones.
pub fn parse_tags(tags: &[String]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for tag in tags {
        if let Some((k, v)) = tag.split_once(':') {
            map.insert(k.to_string(), v.to_string());
        } else {
            eprintln!("Warning: ignoring malformed tag '{tag}' (expected key:value)");
        }
    }
    map
}

/// Resolve a pipeline configuration from the shared command flags.
///
/// A provider URL switches to the provider preset (3s period, inference
/// every tick); explicit `--period` and `--every` still override it.
pub fn pipeline_config(
    remote_url: Option<&str>,
    provider_url: Option<&str>,
    period: Option<&str>,
    every: Option<u64>,
    seed: Option<u64>,
) -> PipelineConfig {
    let mut config = match provider_url {
        Some(base) => PipelineConfig::for_provider(base),
        None => PipelineConfig::default(),
    };
    config.remote_url = remote_url.map(str::to_string);
    if let Some(p) = period {
        config.sample_period = parse_duration(p);
    }
    if let Some(k) = every {
        config.inference_every = k;
    }
    config.seed = seed;
    config
}

/// One human-readable line describing where readings and advice come from.
pub fn describe_config(config: &PipelineConfig) -> String {
    match (&config.provider_url, &config.remote_url) {
        (Some(base), _) => format!("provider {base}, predictions every tick"),
        (None, Some(url)) => {
            format!("synthetic walk, remote {url} every {} ticks", config.inference_every.max(1))
        }
        (None, None) => "synthetic walk, rule fallback every tick".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // parse_duration tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_duration_suffixes() {
        assert_eq!(parse_duration("100ms"), Duration::from_millis(100));
        assert_eq!(parse_duration("30s"), Duration::from_secs(30));
        assert_eq!(parse_duration("5m"), Duration::from_secs(300));
        assert_eq!(parse_duration("1h"), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_duration_bare_number_is_seconds() {
        assert_eq!(parse_duration("2"), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_duration_trims_whitespace() {
        assert_eq!(parse_duration(" 30s "), Duration::from_secs(30));
    }

    // -----------------------------------------------------------------------
    // parse_tags tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_tags_key_value() {
        let tags = vec!["host:laptop".to_string(), "run:nightly".to_string()];
        let map = parse_tags(&tags);
        assert_eq!(map.get("host").map(String::as_str), Some("laptop"));
        assert_eq!(map.get("run").map(String::as_str), Some("nightly"));
    }

    #[test]
    fn test_parse_tags_skips_malformed() {
        let tags = vec!["no-colon".to_string(), "ok:yes".to_string()];
        let map = parse_tags(&tags);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("ok"));
    }

    #[test]
    fn test_parse_tags_value_may_contain_colon() {
        let tags = vec!["url:http://example".to_string()];
        let map = parse_tags(&tags);
        assert_eq!(map.get("url").map(String::as_str), Some("http://example"));
    }

    // -----------------------------------------------------------------------
    // pipeline_config tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_pipeline_config_defaults() {
        let config = pipeline_config(None, None, None, None, None);
        assert_eq!(config.sample_period, Duration::from_secs(1));
        assert_eq!(config.inference_every, 5);
        assert!(config.remote_url.is_none());
        assert!(config.provider_url.is_none());
    }

    #[test]
    fn test_pipeline_config_provider_preset() {
        let config = pipeline_config(None, Some("http://127.0.0.1:9"), None, None, None);
        assert_eq!(config.sample_period, Duration::from_secs(3));
        assert_eq!(config.inference_every, 1);
        assert_eq!(config.provider_url.as_deref(), Some("http://127.0.0.1:9"));
    }

    #[test]
    fn test_pipeline_config_explicit_overrides_win() {
        let config =
            pipeline_config(None, Some("http://127.0.0.1:9"), Some("500ms"), Some(4), Some(7));
        assert_eq!(config.sample_period, Duration::from_millis(500));
        assert_eq!(config.inference_every, 4);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_describe_config_modes() {
        let local = pipeline_config(None, None, None, None, None);
        assert!(describe_config(&local).contains("rule fallback"));

        let remote = pipeline_config(Some("http://m/infer"), None, None, None, None);
        assert!(describe_config(&remote).contains("every 5 ticks"));

        let provider = pipeline_config(None, Some("http://p"), None, None, None);
        assert!(describe_config(&provider).contains("provider"));
    }
}
