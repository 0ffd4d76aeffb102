/// Run summary: JSON file written next to the charts and a plain-text table
/// for the terminal.
///
/// The JSON file is written atomically (temp file in the same directory, then
/// rename) so a reader never sees a partial document.
use crate::metrics::{AlgorithmMetrics, MetricKind};
use crate::stats::TrialSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Keygen statistics for one algorithm.
#[derive(Debug, Clone, Serialize)]
pub struct KeygenEntry {
    pub algorithm: String,
    pub source: PathBuf,
    #[serde(flatten)]
    pub summary: TrialSummary,
}

/// TLS metrics for one algorithm. Missing metrics are omitted.
#[derive(Debug, Clone, Serialize)]
pub struct TlsEntry {
    pub algorithm: String,
    pub source: PathBuf,
    pub metrics: BTreeMap<MetricKind, f64>,
}

impl TlsEntry {
    pub fn from_metrics(source: &Path, metrics: &AlgorithmMetrics) -> Self {
        Self {
            algorithm: metrics.algorithm.clone(),
            source: source.to_path_buf(),
            metrics: metrics.iter().map(|(k, s)| (k, s.value)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    Written,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartRecord {
    pub name: String,
    pub status: ChartStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub keygen: Vec<KeygenEntry>,
    pub tls: Vec<TlsEntry>,
    pub charts: Vec<ChartRecord>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            keygen: Vec::new(),
            tls: Vec::new(),
            charts: Vec::new(),
        }
    }

    pub fn charts_with(&self, status: ChartStatus) -> usize {
        self.charts.iter().filter(|c| c.status == status).count()
    }

    /// Atomically write the summary as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), SummaryError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SummaryError::Serialize { source: e })?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SummaryError::Write {
            path: dir.to_path_buf(),
            source: e,
        })?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| SummaryError::Write {
                path: tmp.path().to_path_buf(),
                source: e,
            })?;
        tmp.persist(path).map_err(|e| SummaryError::Write {
            path: path.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }

    /// Render the human-readable summary printed at the end of a run.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Key generation (ms)");
        if self.keygen.is_empty() {
            let _ = writeln!(out, "  no benchmark data");
        }
        for entry in &self.keygen {
            let s = &entry.summary.overall;
            let _ = writeln!(
                out,
                "  {:<10} mean {:>10.3}  std {:>9}  min {:>10.3}  max {:>10.3}  n={}",
                entry.algorithm,
                s.mean,
                fmt_std(s.std_dev),
                s.min,
                s.max,
                s.count
            );
            for op in &entry.summary.operations {
                let _ = writeln!(
                    out,
                    "    {:<8} mean {:>10.3}  n={}",
                    op.operation, op.stats.mean, op.stats.count
                );
            }
        }

        let _ = writeln!(out, "TLS handshake");
        if self.tls.is_empty() {
            let _ = writeln!(out, "  no TLS data");
        }
        for entry in &self.tls {
            let cols: Vec<String> = MetricKind::ALL
                .iter()
                .map(|k| match entry.metrics.get(k) {
                    Some(v) => format!("{}={v:.2}", k.key()),
                    None => format!("{}=-", k.key()),
                })
                .collect();
            let _ = writeln!(out, "  {:<10} {}", entry.algorithm, cols.join("  "));
        }

        let _ = writeln!(
            out,
            "Charts: {} written, {} skipped, {} failed",
            self.charts_with(ChartStatus::Written),
            self.charts_with(ChartStatus::Skipped),
            self.charts_with(ChartStatus::Failed)
        );
        out
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

fn fmt_std(std_dev: f64) -> String {
    if std_dev.is_finite() {
        format!("{std_dev:.3}")
    } else {
        "n/a".to_string()
    }
}

/// Errors from writing the summary file.
#[derive(Debug)]
pub enum SummaryError {
    Serialize {
        source: serde_json::Error,
    },
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryError::Serialize { source } => {
                write!(f, "failed to serialize summary: {source}")
            }
            SummaryError::Write { path, source } => {
                write!(f, "failed to write summary {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SummaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SummaryError::Serialize { source } => Some(source),
            SummaryError::Write { source, .. } => Some(source),
        }
    }
}
