/// Metric definitions for TLS handshake logs and the per-algorithm result map.
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How the raw numeric token is interpreted before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Integer,
    Float,
}

/// The metrics pulled out of a TLS handshake timing log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    UserTime,
    MemoryMb,
    TaskClock,
    PageFaults,
    ContextSwitches,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::UserTime,
        MetricKind::MemoryMb,
        MetricKind::TaskClock,
        MetricKind::PageFaults,
        MetricKind::ContextSwitches,
    ];

    /// Stable identifier used in summaries.
    pub fn key(self) -> &'static str {
        match self {
            MetricKind::UserTime => "user_time",
            MetricKind::MemoryMb => "memory_mb",
            MetricKind::TaskClock => "task_clock",
            MetricKind::PageFaults => "page_faults",
            MetricKind::ContextSwitches => "context_switches",
        }
    }

    /// Substring that marks the log line carrying this metric.
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::UserTime => "User time",
            MetricKind::MemoryMb => "Maximum resident set size",
            MetricKind::TaskClock => "Task-clock",
            MetricKind::PageFaults => "Page-faults",
            MetricKind::ContextSwitches => "Context-switches",
        }
    }

    pub fn cast(self) -> Cast {
        match self {
            MetricKind::UserTime | MetricKind::TaskClock => Cast::Float,
            MetricKind::MemoryMb | MetricKind::PageFaults | MetricKind::ContextSwitches => {
                Cast::Integer
            }
        }
    }

    /// Multiplier applied after casting. Memory is logged in KB, charted in MB.
    pub fn scale(self) -> f64 {
        match self {
            MetricKind::MemoryMb => 1.0 / 1024.0,
            _ => 1.0,
        }
    }

    pub fn chart_title(self) -> &'static str {
        match self {
            MetricKind::UserTime => "TLS Handshake Time",
            MetricKind::MemoryMb => "Memory Usage (TLS Handshake)",
            MetricKind::TaskClock => "Task Clock (TLS Handshake)",
            MetricKind::PageFaults => "Page Faults (TLS Handshake)",
            MetricKind::ContextSwitches => "Context Switches (TLS Handshake)",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            MetricKind::UserTime => "User Time (s)",
            MetricKind::MemoryMb => "Memory (MB)",
            MetricKind::TaskClock => "Clock Ticks",
            MetricKind::PageFaults => "Page Faults",
            MetricKind::ContextSwitches => "Count",
        }
    }

    /// Output file stem for this metric's chart.
    pub fn file_stem(self) -> &'static str {
        match self {
            MetricKind::UserTime => "tls_user_time",
            MetricKind::MemoryMb => "tls_memory",
            MetricKind::TaskClock => "tls_task_clock",
            MetricKind::PageFaults => "tls_page_faults",
            MetricKind::ContextSwitches => "tls_context_switches",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A single value read from one log line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    pub value: f64,
    pub label: String,
    pub source: PathBuf,
}

/// The TLS metrics found for one algorithm.
///
/// A metric that could not be extracted is simply absent from the map.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlgorithmMetrics {
    pub algorithm: String,
    values: BTreeMap<MetricKind, MetricSample>,
}

impl AlgorithmMetrics {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            values: BTreeMap::new(),
        }
    }

    /// Record the outcome of an extraction. `None` leaves the metric absent.
    pub fn set(&mut self, kind: MetricKind, sample: Option<MetricSample>) {
        match sample {
            Some(s) => {
                self.values.insert(kind, s);
            }
            None => {
                self.values.remove(&kind);
            }
        }
    }

    pub fn get(&self, kind: MetricKind) -> Option<&MetricSample> {
        self.values.get(&kind)
    }

    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        self.get(kind).map(|s| s.value)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, &MetricSample)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }
}
