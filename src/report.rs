//! Report orchestration: per-algorithm extraction and aggregation, then one
//! chart per metric.
//!
//! Every input problem (missing file, missing column, unreadable value) is
//! handled where it is detected and only removes that algorithm from the
//! affected chart. The only fatal condition is an output directory that
//! cannot be created.

use crate::chart::{
    publish_bars, publish_stats, ChartOutcome, ChartRenderer, Palette, RenderError,
};
use crate::config::{AlgorithmConfig, ReportConfig};
use crate::extract;
use crate::metrics::{AlgorithmMetrics, MetricKind};
use crate::normalize::UnitNormalizer;
use crate::stats::{self, SummaryStats};
use crate::summary::{ChartRecord, ChartStatus, KeygenEntry, RunSummary, TlsEntry};
use crate::trials::{self, TrialError};
use std::path::PathBuf;

pub const KEYGEN_CHART_STEM: &str = "keygen_benchmark";
const KEYGEN_TITLE: &str = "EVP Benchmark: Avg Key Generation Time with Std Dev";
const KEYGEN_Y_LABEL: &str = "Key Generation Time (ms)";

/// Run the whole report against `config`, drawing with `renderer`.
pub fn run(config: &ReportConfig, renderer: &dyn ChartRenderer) -> Result<RunSummary, ReportError> {
    let plots_dir = &config.output.plots_dir;
    std::fs::create_dir_all(plots_dir).map_err(|e| ReportError::OutputDir {
        path: plots_dir.clone(),
        source: e,
    })?;

    let normalizer = UnitNormalizer::new(&config.normalization);
    let palette = Palette::from_algorithms(&config.algorithms);
    let mut summary = RunSummary::new();

    // --- Keygen benchmark summary ---
    for algo in &config.algorithms {
        if let Some(entry) = collect_keygen(algo, &normalizer) {
            summary.keygen.push(entry);
        }
    }
    let keygen_stats: Vec<(String, SummaryStats)> = summary
        .keygen
        .iter()
        .map(|e| (e.algorithm.clone(), e.summary.overall))
        .collect();
    let outcome = publish_stats(
        renderer,
        plots_dir,
        KEYGEN_CHART_STEM,
        KEYGEN_TITLE,
        KEYGEN_Y_LABEL,
        &keygen_stats,
        &palette,
    );
    summary.charts.push(chart_record(KEYGEN_CHART_STEM, outcome));

    // --- TLS metrics summary ---
    let mut tls: Vec<AlgorithmMetrics> = Vec::new();
    for algo in &config.algorithms {
        if let Some(metrics) = collect_tls(algo, &normalizer) {
            summary
                .tls
                .push(TlsEntry::from_metrics(&algo.tls_log_path, &metrics));
            tls.push(metrics);
        }
    }
    for kind in MetricKind::ALL {
        let entries: Vec<(String, Option<f64>)> = tls
            .iter()
            .map(|m| (m.algorithm.clone(), m.value(kind)))
            .collect();
        let outcome = publish_bars(
            renderer,
            plots_dir,
            kind.file_stem(),
            kind.chart_title(),
            kind.y_label(),
            &entries,
            &palette,
        );
        summary.charts.push(chart_record(kind.file_stem(), outcome));
    }

    if let Some(path) = config.summary_path() {
        match summary.write_json(&path) {
            Ok(()) => tracing::info!(path = %path.display(), "saved summary"),
            Err(e) => tracing::warn!(error = %e, "failed to write summary"),
        }
    }

    Ok(summary)
}

/// Load and aggregate one algorithm's benchmark CSV.
fn collect_keygen(algo: &AlgorithmConfig, normalizer: &UnitNormalizer) -> Option<KeygenEntry> {
    let path = &algo.csv_path;
    let table = match trials::load_trials(path, trials::TIME_COLUMN) {
        Ok(t) => t,
        Err(TrialError::MissingFile { .. }) => {
            tracing::warn!(
                algorithm = %algo.name,
                path = %path.display(),
                "missing benchmark CSV"
            );
            return None;
        }
        Err(e) => {
            tracing::warn!(algorithm = %algo.name, error = %e, "skipping benchmark CSV");
            return None;
        }
    };

    match stats::aggregate(&table, normalizer) {
        Some(summary) => Some(KeygenEntry {
            algorithm: algo.name.clone(),
            source: path.clone(),
            summary,
        }),
        None => {
            tracing::warn!(
                algorithm = %algo.name,
                path = %path.display(),
                "benchmark CSV has no timing values"
            );
            None
        }
    }
}

/// Extract every TLS metric for one algorithm.
///
/// An absent log yields `None` with a single diagnostic rather than one per
/// metric.
fn collect_tls(algo: &AlgorithmConfig, normalizer: &UnitNormalizer) -> Option<AlgorithmMetrics> {
    let path = &algo.tls_log_path;
    if !path.exists() {
        tracing::warn!(
            algorithm = %algo.name,
            path = %path.display(),
            "missing TLS log"
        );
        return None;
    }

    let mut metrics = AlgorithmMetrics::new(algo.name.clone());
    for kind in MetricKind::ALL {
        let mut sample = extract::extract_known(path, kind);
        if kind == MetricKind::UserTime {
            if let Some(s) = sample.as_mut() {
                s.value = normalizer.normalize_sample(s.value, &algo.name);
            }
        }
        metrics.set(kind, sample);
    }
    if metrics.is_empty() {
        tracing::warn!(
            algorithm = %algo.name,
            path = %path.display(),
            "TLS log has no recognized metrics"
        );
    }
    Some(metrics)
}

fn chart_record(name: &str, outcome: Result<ChartOutcome, RenderError>) -> ChartRecord {
    match outcome {
        Ok(ChartOutcome::Written(path)) => ChartRecord {
            name: name.to_string(),
            status: ChartStatus::Written,
            path: Some(path),
        },
        Ok(ChartOutcome::Skipped) => ChartRecord {
            name: name.to_string(),
            status: ChartStatus::Skipped,
            path: None,
        },
        Err(e) => {
            tracing::warn!(chart = name, error = %e, "failed to render chart");
            ChartRecord {
                name: name.to_string(),
                status: ChartStatus::Failed,
                path: None,
            }
        }
    }
}

/// Fatal report errors.
#[derive(Debug)]
pub enum ReportError {
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
impl ReportError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            ReportError::OutputDir { path, .. } => path,
        }
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::OutputDir { path, source } => {
                write!(
                    f,
                    "cannot create output directory {}: {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::OutputDir { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{BarChart, StatsChart};
    use crate::render::SvgRenderer;
    use crate::test_support::count_diagnostics;
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingRenderer {
        bars: RefCell<Vec<(PathBuf, BarChart)>>,
        stats: RefCell<Vec<(PathBuf, StatsChart)>>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn extension(&self) -> &str {
            "svg"
        }

        fn render_bars(&self, chart: &BarChart, path: &Path) -> Result<(), RenderError> {
            self.bars
                .borrow_mut()
                .push((path.to_path_buf(), chart.clone()));
            Ok(())
        }

        fn render_stats(&self, chart: &StatsChart, path: &Path) -> Result<(), RenderError> {
            self.stats
                .borrow_mut()
                .push((path.to_path_buf(), chart.clone()));
            Ok(())
        }
    }

    struct FailingRenderer;

    impl ChartRenderer for FailingRenderer {
        fn extension(&self) -> &str {
            "svg"
        }

        fn render_bars(&self, _chart: &BarChart, path: &Path) -> Result<(), RenderError> {
            Err(RenderError::Draw {
                path: path.to_path_buf(),
                detail: "backend unavailable".to_string(),
            })
        }

        fn render_stats(&self, _chart: &StatsChart, path: &Path) -> Result<(), RenderError> {
            Err(RenderError::Draw {
                path: path.to_path_buf(),
                detail: "backend unavailable".to_string(),
            })
        }
    }

    fn algo(root: &Path, name: &str, color: &str) -> AlgorithmConfig {
        AlgorithmConfig {
            name: name.to_string(),
            csv_path: root.join(format!("{name}.csv")),
            tls_log_path: root.join(format!("{name}_tls_time.log")),
            display_color: color.to_string(),
        }
    }

    fn config_for(root: &Path, algorithms: Vec<AlgorithmConfig>) -> ReportConfig {
        let mut config = ReportConfig {
            algorithms,
            ..ReportConfig::default()
        };
        config.output.plots_dir = root.join("plots");
        config
    }

    fn write(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_full_run_with_partial_data() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let kyber = algo(root, "Kyber", "blue");
        let rsa = algo(root, "RSA", "purple");
        let ecdh = algo(root, "ECDH", "red");

        write(
            &kyber.csv_path,
            "operation,time_ms\nencaps,0.0005\ndecaps,0.0006\nencaps,0.0007\n",
        );
        write(&rsa.csv_path, "operation,time_ms\nkeygen,40.0\nkeygen,60.0\n");
        // ECDH has a CSV with the wrong column and no TLS log.
        write(&ecdh.csv_path, "operation,elapsed\nderive,1.0\n");

        write(
            &kyber.tls_log_path,
            "User time (seconds): 0.0004\nMaximum resident set size (kbytes): 20480\nPage-faults: 900\n",
        );
        write(
            &rsa.tls_log_path,
            "User time (seconds): 0.452381\nTask-clock: 15.5 msec\n",
        );

        let config = config_for(root, vec![kyber, rsa, ecdh]);
        let renderer = RecordingRenderer::default();
        let summary = run(&config, &renderer).unwrap();

        // Keygen: ECDH skipped, Kyber converted to ms and ranked first.
        let algos: Vec<&str> = summary.keygen.iter().map(|k| k.algorithm.as_str()).collect();
        assert_eq!(algos, vec!["Kyber", "RSA"]);
        assert!((summary.keygen[0].summary.overall.mean - 0.6).abs() < 1e-9);
        let stats_charts = renderer.stats.borrow();
        assert_eq!(stats_charts.len(), 1);
        assert_eq!(
            stats_charts[0].0,
            root.join("plots").join("keygen_benchmark.svg")
        );
        let order: Vec<&str> = stats_charts[0]
            .1
            .bars
            .iter()
            .map(|b| b.category.as_str())
            .collect();
        assert_eq!(order, vec!["Kyber", "RSA"]);

        // TLS: context switches absent everywhere, so that chart is skipped.
        let bars = renderer.bars.borrow();
        let stems: Vec<String> = bars
            .iter()
            .map(|(p, _)| p.file_stem().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            stems,
            vec!["tls_user_time", "tls_memory", "tls_task_clock", "tls_page_faults"]
        );
        let user_time = &bars[0].1.bars;
        assert_eq!(user_time.len(), 2);
        assert!((user_time[0].value - 0.4).abs() < 1e-9);
        assert_eq!(user_time[1].value, 0.452381);
        let memory = &bars[1].1.bars;
        assert_eq!(memory.len(), 1);
        assert_eq!(memory[0].category, "Kyber");
        assert_eq!(memory[0].value, 20.0);

        let skipped: Vec<&str> = summary
            .charts
            .iter()
            .filter(|c| c.status == ChartStatus::Skipped)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(skipped, vec!["tls_context_switches"]);
        assert!(root.join("plots").join("summary.json").exists());
    }

    #[test]
    fn test_no_data_at_all_skips_every_chart() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let config = config_for(root, vec![algo(root, "Kyber", "blue")]);
        let renderer = RecordingRenderer::default();
        let summary = run(&config, &renderer).unwrap();
        assert!(renderer.bars.borrow().is_empty());
        assert!(renderer.stats.borrow().is_empty());
        assert_eq!(summary.charts_with(ChartStatus::Skipped), 6);
        assert!(summary.keygen.is_empty());
        assert!(summary.tls.is_empty());
    }

    #[test]
    fn test_missing_tls_log_warns_once_per_algorithm() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let kyber = algo(root, "Kyber", "blue");
        let normalizer = UnitNormalizer::default();
        let (metrics, counter) = count_diagnostics(|| collect_tls(&kyber, &normalizer));
        assert!(metrics.is_none());
        assert_eq!(counter.warnings(), 1);
    }

    #[test]
    fn test_render_failure_is_not_fatal() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let rsa = algo(root, "RSA", "purple");
        write(&rsa.csv_path, "operation,time_ms\nkeygen,40.0\n");
        write(&rsa.tls_log_path, "Page-faults: 12\n");
        let config = config_for(root, vec![rsa]);
        let summary = run(&config, &FailingRenderer).unwrap();
        assert_eq!(summary.charts_with(ChartStatus::Failed), 2);
        assert_eq!(summary.charts_with(ChartStatus::Skipped), 4);
    }

    #[test]
    fn test_uncreatable_output_dir_is_fatal() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        write(&blocker, "not a directory");
        let mut config = config_for(dir.path(), Vec::new());
        config.output.plots_dir = blocker.join("plots");
        let err = run(&config, &RecordingRenderer::default()).unwrap_err();
        assert_eq!(err.path(), blocker.join("plots").as_path());
        assert!(err.to_string().contains("cannot create output directory"));
    }

    #[test]
    fn test_run_with_svg_renderer_writes_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let ecdsa = algo(root, "ECDSA", "orange");
        write(&ecdsa.csv_path, "operation,time_ms\nkeygen,2.0\n");
        write(
            &ecdsa.tls_log_path,
            "Context-switches: 7\nUser time (seconds): 0.02\n",
        );
        let config = config_for(root, vec![ecdsa]);
        let renderer = SvgRenderer::new(config.output.width, config.output.height);
        let summary = run(&config, &renderer).unwrap();

        let plots = root.join("plots");
        assert!(plots.join("keygen_benchmark.svg").exists());
        assert!(plots.join("tls_context_switches.svg").exists());
        assert!(plots.join("tls_user_time.svg").exists());
        assert!(!plots.join("tls_memory.svg").exists());
        assert_eq!(summary.charts_with(ChartStatus::Written), 3);
        // Single trial: spread is undefined, not zero.
        assert!(summary.keygen[0].summary.overall.std_dev.is_nan());
    }

    #[test]
    fn test_summary_disabled() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut config = config_for(root, Vec::new());
        config.output.summary_file = PathBuf::new();
        run(&config, &RecordingRenderer::default()).unwrap();
        assert!(!root.join("plots").join("summary.json").exists());
    }
}
