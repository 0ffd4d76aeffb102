//! Summary statistics over repeated-trial timings.
//!
//! The aggregator normalizes the whole timing column once (see
//! [`UnitNormalizer::normalize_batch`]) and then reduces it to mean, sample
//! standard deviation, min, max and count. A single trial has no spread, so
//! its standard deviation is NaN rather than zero; renderers decide how to
//! show that.

use crate::normalize::UnitNormalizer;
use crate::trials::TrialTable;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SummaryStats {
    pub mean: f64,
    /// Sample standard deviation (n − 1). NaN for a single value.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl SummaryStats {
    /// Reduce `values`. Returns `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let std_dev = if n < 2 {
            f64::NAN
        } else {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            mean,
            std_dev,
            min,
            max,
            count: n,
        })
    }
}

/// Stats for one operation within a table (e.g. `encaps`).
#[derive(Debug, Clone, Serialize)]
pub struct OperationStats {
    pub operation: String,
    pub stats: SummaryStats,
}

/// Aggregated result for one trial table.
#[derive(Debug, Clone, Serialize)]
pub struct TrialSummary {
    pub overall: SummaryStats,
    /// Per-operation breakdown in order of first appearance. Empty when the
    /// table has no operation column.
    pub operations: Vec<OperationStats>,
    /// Whether the column was rescaled from seconds.
    pub converted: bool,
}

/// Normalize and reduce a trial table.
///
/// Rows without a timing value are ignored. Returns `None` when no row has
/// one; such a table contributes nothing to rankings or charts.
pub fn aggregate(table: &TrialTable, normalizer: &UnitNormalizer) -> Option<TrialSummary> {
    let present: Vec<(Option<&str>, f64)> = table
        .records
        .iter()
        .filter_map(|r| r.time.map(|t| (r.operation.as_deref(), t)))
        .collect();
    if table.is_empty() {
        tracing::debug!(path = %table.source.display(), "trial table has no rows");
        return None;
    }
    if present.is_empty() {
        tracing::debug!(
            path = %table.source.display(),
            rows = table.len(),
            "trial table has no timing values"
        );
        return None;
    }

    let mut values: Vec<f64> = present.iter().map(|(_, t)| *t).collect();
    let context = table.source.display().to_string();
    let converted = normalizer.normalize_batch(&mut values, &context);

    let overall = SummaryStats::from_values(&values)?;

    let mut order: Vec<&str> = Vec::new();
    for (op, _) in &present {
        if let Some(op) = op {
            if !order.contains(op) {
                order.push(*op);
            }
        }
    }
    let operations = order
        .into_iter()
        .filter_map(|name| {
            let op_values: Vec<f64> = present
                .iter()
                .zip(&values)
                .filter(|((op, _), _)| *op == Some(name))
                .map(|(_, v)| *v)
                .collect();
            SummaryStats::from_values(&op_values).map(|stats| OperationStats {
                operation: name.to_string(),
                stats,
            })
        })
        .collect();

    Some(TrialSummary {
        overall,
        operations,
        converted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trials::TrialRecord;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_seconds_scale_column_converted_before_stats() {
        let table = TrialTable::from_times("kyber.csv", &[0.0005, 0.0006, 0.0007]);
        let summary = aggregate(&table, &UnitNormalizer::default()).unwrap();
        let s = summary.overall;
        assert!(summary.converted);
        assert!(approx(s.mean, 0.6));
        assert!(approx(s.min, 0.5));
        assert!(approx(s.max, 0.7));
        assert_eq!(s.count, 3);
        assert!(approx(s.std_dev, 0.1));
    }

    #[test]
    fn test_single_row_std_is_nan() {
        let table = TrialTable::from_times("rsa.csv", &[2.0]);
        let summary = aggregate(&table, &UnitNormalizer::default()).unwrap();
        let s = summary.overall;
        assert!(s.std_dev.is_nan());
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 2.0);
        assert_eq!(s.count, 1);
        assert!(!summary.converted);
    }

    #[test]
    fn test_empty_table_yields_none() {
        let table = TrialTable::new("empty.csv", Vec::new());
        assert!(aggregate(&table, &UnitNormalizer::default()).is_none());
    }

    #[test]
    fn test_table_of_blank_cells_yields_none() {
        let table = TrialTable::new(
            "blank.csv",
            vec![
                TrialRecord {
                    operation: Some("keygen".to_string()),
                    time: None,
                },
                TrialRecord {
                    operation: None,
                    time: None,
                },
            ],
        );
        assert!(aggregate(&table, &UnitNormalizer::default()).is_none());
    }

    #[test]
    fn test_sample_std_uses_n_minus_one() {
        let s = SummaryStats::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(s.mean, 5.0));
        // Population std is 2.0; sample std is sqrt(32 / 7).
        assert!(approx(s.std_dev, (32.0f64 / 7.0).sqrt()));
    }

    #[test]
    fn test_from_values_empty() {
        assert!(SummaryStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_operation_breakdown_in_first_appearance_order() {
        let rec = |op: &str, t: f64| TrialRecord {
            operation: Some(op.to_string()),
            time: Some(t),
        };
        let table = TrialTable::new(
            "kyber.csv",
            vec![
                rec("encaps", 2.0),
                rec("decaps", 4.0),
                rec("encaps", 4.0),
                rec("decaps", 6.0),
            ],
        );
        let summary = aggregate(&table, &UnitNormalizer::default()).unwrap();
        assert_eq!(summary.overall.count, 4);
        assert!(approx(summary.overall.mean, 4.0));
        let names: Vec<&str> = summary
            .operations
            .iter()
            .map(|o| o.operation.as_str())
            .collect();
        assert_eq!(names, vec!["encaps", "decaps"]);
        assert!(approx(summary.operations[0].stats.mean, 3.0));
        assert!(approx(summary.operations[1].stats.mean, 5.0));
    }

    #[test]
    fn test_operation_breakdown_uses_normalized_values() {
        let rec = |op: &str, t: f64| TrialRecord {
            operation: Some(op.to_string()),
            time: Some(t),
        };
        let table = TrialTable::new("ecdh.csv", vec![rec("derive", 0.0002), rec("derive", 0.0004)]);
        let summary = aggregate(&table, &UnitNormalizer::default()).unwrap();
        assert!(summary.converted);
        assert!(approx(summary.operations[0].stats.mean, 0.3));
    }

    #[test]
    fn test_no_operation_column_gives_empty_breakdown() {
        let table = TrialTable::from_times("x.csv", &[3.0, 4.0]);
        let summary = aggregate(&table, &UnitNormalizer::default()).unwrap();
        assert!(summary.operations.is_empty());
    }

    #[test]
    fn test_nan_std_serializes_as_null() {
        let s = SummaryStats::from_values(&[2.0]).unwrap();
        let json = serde_json::to_value(s).unwrap();
        assert!(json["std_dev"].is_null());
        assert_eq!(json["count"], 1);
    }
}
