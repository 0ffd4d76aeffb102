/// Repeated-trial CSV loading.
///
/// The benchmark programs write one row per trial:
///
/// ```text
/// operation,time_ms
/// keygen,0.123
/// keygen,0.119
/// ```
///
/// Only the timing column is required. The `operation` column, when present,
/// is carried along so results can be broken down per operation.
use std::path::{Path, PathBuf};

/// Name of the timing column every benchmark CSV must carry.
pub const TIME_COLUMN: &str = "time_ms";

/// Optional column naming the benchmarked operation.
pub const OPERATION_COLUMN: &str = "operation";

/// One trial row.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub operation: Option<String>,
    /// `None` when the cell was blank or not a finite number.
    pub time: Option<f64>,
}

/// The rows of one benchmark CSV, in file order.
#[derive(Debug, Clone)]
pub struct TrialTable {
    pub source: PathBuf,
    pub records: Vec<TrialRecord>,
}

impl TrialTable {
    pub fn new(source: impl Into<PathBuf>, records: Vec<TrialRecord>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
impl TrialTable {
    /// Build a table from bare timing values, without operations.
    pub fn from_times(source: impl Into<PathBuf>, times: &[f64]) -> Self {
        let records = times
            .iter()
            .map(|&t| TrialRecord {
                operation: None,
                time: Some(t),
            })
            .collect();
        Self::new(source, records)
    }
}

/// Load a benchmark CSV, requiring `column` to be present in the header.
pub fn load_trials(path: &Path, column: &str) -> Result<TrialTable, TrialError> {
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TrialError::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            TrialError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| TrialError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?
        .clone();

    let time_idx = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| TrialError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;
    let op_idx = headers.iter().position(|h| h == OPERATION_COLUMN);

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| TrialError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        // Header is line 1.
        let line = i + 2;
        let cell = row.get(time_idx).unwrap_or("");
        let time = if cell.is_empty() {
            None
        } else {
            let v: f64 = cell.parse().map_err(|_| TrialError::MalformedValue {
                path: path.to_path_buf(),
                line,
                value: cell.to_string(),
            })?;
            v.is_finite().then_some(v)
        };
        let operation = op_idx
            .and_then(|idx| row.get(idx))
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        records.push(TrialRecord { operation, time });
    }

    tracing::debug!(
        path = %path.display(),
        rows = records.len(),
        "loaded trial table"
    );
    Ok(TrialTable::new(path, records))
}

/// Errors from loading a trial table. None of them abort a report run.
#[derive(Debug)]
pub enum TrialError {
    MissingFile {
        path: PathBuf,
    },
    MissingColumn {
        path: PathBuf,
        column: String,
    },
    MalformedValue {
        path: PathBuf,
        line: usize,
        value: String,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for TrialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrialError::MissingFile { path } => write!(f, "missing file: {}", path.display()),
            TrialError::MissingColumn { path, column } => {
                write!(f, "'{column}' column missing in {}", path.display())
            }
            TrialError::MalformedValue { path, line, value } => {
                write!(
                    f,
                    "non-numeric value {value:?} at {}:{line}",
                    path.display()
                )
            }
            TrialError::Csv { path, source } => {
                write!(f, "failed to parse CSV {}: {source}", path.display())
            }
            TrialError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for TrialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrialError::Csv { source, .. } => Some(source),
            TrialError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
