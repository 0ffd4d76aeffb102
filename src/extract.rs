/// Metric extraction from semi-structured benchmark logs.
///
/// A metric line is any line containing a fixed label; its value is the first
/// numeric token on that line, wherever it sits. The match is deliberately
/// loose because the logs come from several tools (`/usr/bin/time -v`,
/// `perf stat`) whose column layout differs.
use crate::metrics::{Cast, MetricKind, MetricSample};
use regex::Regex;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Digits, optionally followed by a fractional part.
static NUMERIC_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Find the value for `label` in the log at `path`.
///
/// Scans lines in file order; the first line that contains `label` and also
/// carries a numeric token wins. Labelled lines without a number are skipped.
pub fn extract_metric(
    path: &Path,
    label: &str,
    cast: Cast,
    scale: f64,
) -> Result<MetricSample, ExtractError> {
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            ExtractError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let reader = std::io::BufReader::new(file);

    let mut saw_label = false;
    for line in reader.split(b'\n') {
        let line = line.map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        // Tool output is not guaranteed to be UTF-8.
        let line = String::from_utf8_lossy(&line);
        if !line.contains(label) {
            continue;
        }
        saw_label = true;
        if let Some(value) = parse_token(&line, cast) {
            return Ok(MetricSample {
                value: value * scale,
                label: label.to_string(),
                source: path.to_path_buf(),
            });
        }
    }

    if saw_label {
        Err(ExtractError::UnparseableLine {
            path: path.to_path_buf(),
            label: label.to_string(),
        })
    } else {
        Err(ExtractError::LabelNotFound {
            path: path.to_path_buf(),
            label: label.to_string(),
        })
    }
}

/// Extract one of the known TLS metrics, folding every failure into `None`.
///
/// A missing file is logged as a warning; an absent or unparseable label is
/// an ordinary gap in the data and only logged at debug level.
pub fn extract_known(path: &Path, kind: MetricKind) -> Option<MetricSample> {
    match extract_metric(path, kind.label(), kind.cast(), kind.scale()) {
        Ok(sample) => {
            tracing::debug!(
                metric = %kind,
                value = sample.value,
                path = %path.display(),
                "extracted metric"
            );
            Some(sample)
        }
        Err(e) => {
            report_missing(&e, Some(kind));
            None
        }
    }
}

/// Log an extraction failure at the level its kind deserves.
pub fn report_missing(err: &ExtractError, kind: Option<MetricKind>) {
    let metric = kind.map(MetricKind::key).unwrap_or("-");
    match err {
        ExtractError::MissingFile { path } => {
            tracing::warn!(path = %path.display(), metric, "missing log file");
        }
        ExtractError::Io { .. } => {
            tracing::warn!(error = %err, metric, "failed to read log file");
        }
        ExtractError::LabelNotFound { .. } | ExtractError::UnparseableLine { .. } => {
            tracing::debug!(error = %err, metric, "metric not present in log");
        }
    }
}

/// Pull the first numeric token from `line` and cast it.
///
/// For an integer cast the fractional part of the token is dropped. Any token
/// the regex matches parses as `f64`, however many digits it has.
fn parse_token(line: &str, cast: Cast) -> Option<f64> {
    let value = NUMERIC_TOKEN.find(line)?.as_str().parse::<f64>().ok()?;
    match cast {
        Cast::Float => Some(value),
        Cast::Integer => Some(value.trunc()),
    }
}

/// Reasons an extraction yields no value.
#[derive(Debug)]
pub enum ExtractError {
    /// The log file does not exist (yet).
    MissingFile { path: PathBuf },
    /// No line contains the label.
    LabelNotFound { path: PathBuf, label: String },
    /// Lines contain the label but none carries a number.
    UnparseableLine { path: PathBuf, label: String },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::MissingFile { path } => write!(f, "missing file: {}", path.display()),
            ExtractError::LabelNotFound { path, label } => {
                write!(f, "label {label:?} not found in {}", path.display())
            }
            ExtractError::UnparseableLine { path, label } => {
                write!(
                    f,
                    "label {label:?} in {} has no numeric value",
                    path.display()
                )
            }
            ExtractError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
