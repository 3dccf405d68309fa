use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One raw entry as it appears in the data source, before validation.
///
/// `latency_ms` and `uptime_pct` stay untyped here because source files mix
/// numbers with numeric strings and occasionally carry garbage; parsing is the
/// store's job. `uptime` is accepted as a legacy spelling of `uptime_pct`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub region: String,
    #[serde(default)]
    pub latency_ms: Option<serde_json::Value>,
    #[serde(default, alias = "uptime")]
    pub uptime_pct: Option<serde_json::Value>,
}

/// One validated telemetry observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Region label as it appeared in the source; the store indexes by the
    /// lowercased form, so this field is informational.
    pub region: String,
    pub latency_ms: f64,
    pub uptime_pct: f64,
}

/// Immutable, in-memory collection of telemetry records, grouped by region.
///
/// Built once at startup and never mutated afterwards, so it can be shared
/// across concurrent queries without locking.
#[derive(Debug, Default)]
pub struct TelemetryStore {
    /// Records grouped by lowercased region label.
    regions: HashMap<String, Vec<TelemetryRecord>>,
    record_count: usize,
    dropped_count: usize,
}

impl TelemetryStore {
    /// Build a store from raw source entries.
    ///
    /// Entries whose latency (or uptime, when present) does not parse as a
    /// valid measurement are discarded and counted; this is a data-quality
    /// filter, not an error. A missing uptime field defaults to 0.0.
    pub fn build(raw_records: Vec<RawRecord>) -> Self {
        let mut store = Self::default();

        for raw in raw_records {
            let latency_ms = match raw.latency_ms.as_ref().and_then(parse_latency) {
                Some(v) => v,
                None => {
                    store.dropped_count += 1;
                    continue;
                }
            };
            let uptime_pct = match raw.uptime_pct.as_ref() {
                None => 0.0,
                Some(value) => match parse_number(value) {
                    Some(v) => v,
                    None => {
                        store.dropped_count += 1;
                        continue;
                    }
                },
            };

            store
                .regions
                .entry(raw.region.to_lowercase())
                .or_default()
                .push(TelemetryRecord { region: raw.region, latency_ms, uptime_pct });
            store.record_count += 1;
        }

        store
    }

    /// Load a store from a JSON file containing an array of raw records.
    ///
    /// A missing or unreadable file yields a valid-but-empty store rather
    /// than an error, so a deployment without data keeps serving (degraded)
    /// responses.
    pub fn load_from_file(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "telemetry source unavailable, starting with empty store");
                return Self::default();
            }
        };

        match serde_json::from_str::<Vec<RawRecord>>(&contents) {
            Ok(raw_records) => Self::build(raw_records),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "telemetry source unparsable, starting with empty store");
                Self::default()
            }
        }
    }

    /// All records for the given region, matched case-insensitively.
    /// Returns an empty slice for unknown regions.
    pub fn lookup(&self, region: &str) -> &[TelemetryRecord] {
        self.regions
            .get(&region.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `true` when no record survived loading (source missing, corrupt, or
    /// entirely filtered out). The query path stays usable; every region
    /// simply aggregates as absent.
    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Number of records that survived the data-quality filter.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of source entries discarded for unparsable measurements.
    pub fn dropped_count(&self) -> usize {
        self.dropped_count
    }
}

/// Parse a latency value: a finite, non-negative number, given either as a
/// JSON number or a numeric string. Anything else is `None`.
fn parse_latency(value: &serde_json::Value) -> Option<f64> {
    parse_number(value).filter(|v| *v >= 0.0)
}

fn parse_number(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
