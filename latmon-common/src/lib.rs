use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Upper bound on the number of region names a single metrics request may carry.
pub const MAX_REGIONS_PER_REQUEST: usize = 1_024;

/// Error types for Latmon operations
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatmonError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("HTTP {0}: {1}")]
    HttpError(u16, String),

    #[error("Request exceeds maximum of {0} regions")]
    TooManyRegions(usize),
}

/// JSON error envelope returned by the server for all error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Result type for Latmon operations
pub type Result<T> = std::result::Result<T, LatmonError>;

/// Body of `POST /api/metrics`: the regions to aggregate over and the latency
/// threshold against which breaches are counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRequest {
    pub regions: Vec<String>,
    pub threshold_ms: i64,
}

/// Aggregate statistics for one region.
///
/// The three floating statistics are rounded to 2 decimal places, half away
/// from zero. `breaches` counts records whose latency strictly exceeds the
/// request threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub avg_latency: f64,
    pub p95_latency: f64,
    pub avg_uptime: f64,
    pub breaches: u64,
}

/// Response of `POST /api/metrics`: one entry per requested region name, in
/// request order. A region with no telemetry maps to `None` (JSON `null`);
/// duplicate names in the request collapse to a single entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsReport {
    entries: Vec<(String, Option<RegionStats>)>,
}

impl MetricsReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, keeping the position of an existing entry with the
    /// same name (the mapping is keyed by name, so a duplicate overwrites).
    pub fn insert(&mut self, region: impl Into<String>, stats: Option<RegionStats>) {
        let region = region.into();
        match self.entries.iter_mut().find(|(name, _)| *name == region) {
            Some(entry) => entry.1 = stats,
            None => self.entries.push((region, stats)),
        }
    }

    /// Look up an entry by its exact (case-sensitive) request spelling.
    /// Outer `None` = region was never requested; inner `None` = requested
    /// but no telemetry exists for it.
    pub fn get(&self, region: &str) -> Option<&Option<RegionStats>> {
        self.entries
            .iter()
            .find(|(name, _)| name == region)
            .map(|(_, stats)| stats)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion (request) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Option<RegionStats>)> {
        self.entries.iter().map(|(name, stats)| (name.as_str(), stats))
    }
}

// A plain HashMap would lose the caller's request order over the wire, so the
// report serializes as a JSON object from its insertion-ordered entries.
impl Serialize for MetricsReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, stats) in &self.entries {
            map.serialize_entry(name, stats)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MetricsReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ReportVisitor;

        impl<'de> Visitor<'de> for ReportVisitor {
            type Value = MetricsReport;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of region name to stats or null")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut report = MetricsReport::new();
                while let Some((name, stats)) =
                    access.next_entry::<String, Option<RegionStats>>()?
                {
                    report.insert(name, stats);
                }
                Ok(report)
            }
        }

        deserializer.deserialize_map(ReportVisitor)
    }
}
