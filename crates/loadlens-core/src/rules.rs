//! Deterministic rule fallback.
//!
//! Threshold predicates evaluated in fixed order against one snapshot.
//! Every firing predicate appends one suggestion; when none fire the
//! result is a single low-priority "all clear" entry, so the output is
//! never empty. No randomness, no state: identical input, identical
//! output.

use crate::metrics::MetricSnapshot;
use crate::suggest::{Priority, Suggestion};

/// Evaluate the rule set against one snapshot.
pub fn evaluate(snapshot: &MetricSnapshot) -> Vec<Suggestion> {
    let mut out = Vec::new();

    if snapshot.cpu > 72.0 {
        out.push(Suggestion::new(
            "Shift heavy tasks to low-demand windows",
            "Predicted CPU saturation risk in the next 8-10 min. Delay non-critical batch jobs.",
            Priority::High,
        ));
    }
    if snapshot.ram > 78.0 {
        out.push(Suggestion::new(
            "Trim memory-intensive services",
            "LSTM detects likely memory pressure. Restart stale workers or lower in-memory cache limits.",
            Priority::High,
        ));
    }
    if snapshot.temperature > 73.0 {
        out.push(Suggestion::new(
            "Reduce thermal load",
            "Thermal trend is rising. Lower concurrency by 15% and prioritize short-running jobs.",
            Priority::Medium,
        ));
    }
    if snapshot.power > 130.0 && snapshot.cpu < 48.0 {
        out.push(Suggestion::new(
            "Investigate power inefficiency",
            "Power draw is high compared to compute load. Check background daemons and fan curve profile.",
            Priority::Medium,
        ));
    }

    if out.is_empty() {
        out.push(Suggestion::new(
            "Keep current operating profile",
            "Model confidence indicates stable performance. No immediate optimization action is required.",
            Priority::Low,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(cpu: f64, ram: f64, temperature: f64, power: f64) -> MetricSnapshot {
        let mut snap = MetricSnapshot::initial(0);
        snap.cpu = cpu;
        snap.ram = ram;
        snap.temperature = temperature;
        snap.power = power;
        snap
    }

    #[test]
    fn test_quiet_snapshot_yields_single_low_entry() {
        let out = evaluate(&MetricSnapshot::initial(0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Low);
        assert_eq!(out[0].title, "Keep current operating profile");
    }

    #[test]
    fn test_cpu_pressure_fires_high() {
        let out = evaluate(&snapshot_with(80.0, 40.0, 50.0, 70.0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::High);
        assert_eq!(out[0].title, "Shift heavy tasks to low-demand windows");
    }

    #[test]
    fn test_thresholds_are_strict() {
        // Exactly at each threshold nothing fires.
        let out = evaluate(&snapshot_with(72.0, 78.0, 73.0, 130.0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].priority, Priority::Low);
    }

    #[test]
    fn test_multiple_predicates_fire_in_fixed_order() {
        let out = evaluate(&snapshot_with(90.0, 90.0, 80.0, 70.0));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].title, "Shift heavy tasks to low-demand windows");
        assert_eq!(out[1].title, "Trim memory-intensive services");
        assert_eq!(out[2].title, "Reduce thermal load");
    }

    #[test]
    fn test_power_rule_requires_low_cpu() {
        let busy = evaluate(&snapshot_with(60.0, 40.0, 50.0, 150.0));
        assert_eq!(busy.len(), 1);
        assert_eq!(busy[0].priority, Priority::Low);

        let idle = evaluate(&snapshot_with(30.0, 40.0, 50.0, 150.0));
        assert_eq!(idle.len(), 1);
        assert_eq!(idle[0].title, "Investigate power inefficiency");
        assert_eq!(idle[0].priority, Priority::Medium);
    }

    #[test]
    fn test_identical_input_identical_output() {
        let snap = snapshot_with(85.0, 85.0, 85.0, 150.0);
        assert_eq!(evaluate(&snap), evaluate(&snap));
    }
}
