use crate::store::{TelemetryRecord, TelemetryStore};
use latmon_common::{MetricsReport, RegionStats};

/// Aggregate per-region statistics for every requested region, in request
/// order. Regions with no telemetry (unknown name, or an empty store) map to
/// `None`; duplicate names collapse to one report entry.
///
/// Pure function of its inputs: no I/O, no store mutation, only per-call
/// state, so any number of calls may run concurrently against one store.
pub fn compute_stats(store: &TelemetryStore, regions: &[String], threshold_ms: i64) -> MetricsReport {
    let mut report = MetricsReport::new();
    for region in regions {
        let records = store.lookup(region);
        if records.is_empty() {
            report.insert(region.clone(), None);
        } else {
            report.insert(region.clone(), Some(region_stats(records, threshold_ms)));
        }
    }
    report
}

fn region_stats(records: &[TelemetryRecord], threshold_ms: i64) -> RegionStats {
    let n = records.len() as f64;
    let mut latencies: Vec<f64> = records.iter().map(|r| r.latency_ms).collect();
    // Store records are always finite, so total_cmp is a plain numeric sort.
    latencies.sort_by(f64::total_cmp);

    let avg_latency = latencies.iter().sum::<f64>() / n;
    let p95_latency = percentile(&latencies, 95.0);
    let avg_uptime = records.iter().map(|r| r.uptime_pct).sum::<f64>() / n;
    let threshold = threshold_ms as f64;
    let breaches = records.iter().filter(|r| r.latency_ms > threshold).count() as u64;

    RegionStats {
        avg_latency: round2(avg_latency),
        p95_latency: round2(p95_latency),
        avg_uptime: round2(avg_uptime),
        breaches,
    }
}

/// Linear-interpolation percentile over an ascending-sorted, non-empty slice.
///
/// Computes the zero-indexed virtual rank `p/100 * (n - 1)` and interpolates
/// between the neighbouring order statistics by the fractional part. A single
/// element is its own percentile for every `p`. Returns 0 for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let fraction = rank - lo as f64;
    sorted[lo] + fraction * (sorted[hi] - sorted[lo])
}

/// Round to 2 decimal places, half away from zero.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
