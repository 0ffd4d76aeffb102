/// Chart assembly: what reaches the renderer and in what order.
///
/// Missing and non-finite values never reach a renderer, and a chart with no
/// remaining entries is skipped rather than drawn empty.
use crate::config::AlgorithmConfig;
use crate::stats::SummaryStats;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Colour used for categories with no configured colour.
pub const FALLBACK_COLOR: &str = "gray";

/// One bar of a plain value chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub category: String,
    pub value: f64,
    pub color: String,
}

/// A comparative chart of one scalar per category.
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

/// One bar of a summary-statistics chart.
#[derive(Debug, Clone)]
pub struct StatsBar {
    pub category: String,
    pub stats: SummaryStats,
    pub color: String,
}

/// A comparative chart of means with spread and range annotations.
#[derive(Debug, Clone)]
pub struct StatsChart {
    pub title: String,
    pub y_label: String,
    pub bars: Vec<StatsBar>,
}

/// Draws charts to image files.
pub trait ChartRenderer {
    /// File extension of produced images, without the dot.
    fn extension(&self) -> &str;

    fn render_bars(&self, chart: &BarChart, path: &Path) -> Result<(), RenderError>;

    fn render_stats(&self, chart: &StatsChart, path: &Path) -> Result<(), RenderError>;
}

/// Category → display colour, from the algorithm table.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    colors: HashMap<String, String>,
}

impl Palette {
    pub fn from_algorithms(algorithms: &[AlgorithmConfig]) -> Self {
        Self {
            colors: algorithms
                .iter()
                .map(|a| (a.name.clone(), a.display_color.clone()))
                .collect(),
        }
    }

    pub fn color_for(&self, category: &str) -> &str {
        self.colors
            .get(category)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }
}

/// Drop missing and non-finite entries, keeping insertion order.
pub fn filter_values(entries: &[(String, Option<f64>)]) -> Vec<(String, f64)> {
    entries
        .iter()
        .filter_map(|(k, v)| match v {
            Some(v) if v.is_finite() => Some((k.clone(), *v)),
            _ => None,
        })
        .collect()
}

/// Order categories by ascending mean.
///
/// Entries with a non-finite mean are dropped. The sort is stable, so equal
/// means keep their insertion order.
pub fn rank_by_mean(entries: &[(String, SummaryStats)]) -> Vec<(String, SummaryStats)> {
    let mut ranked: Vec<(String, SummaryStats)> = entries
        .iter()
        .filter(|(_, s)| s.mean.is_finite())
        .cloned()
        .collect();
    ranked.sort_by(|a, b| a.1.mean.total_cmp(&b.1.mean));
    ranked
}

/// What happened to one chart.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Written(PathBuf),
    /// No category had data.
    Skipped,
}

/// Where a chart named `stem` is written.
pub fn chart_path(dir: &Path, stem: &str, renderer: &dyn ChartRenderer) -> PathBuf {
    dir.join(format!("{stem}.{}", renderer.extension()))
}

/// Filter `entries` and render them as a bar chart, or skip if none remain.
pub fn publish_bars(
    renderer: &dyn ChartRenderer,
    dir: &Path,
    stem: &str,
    title: &str,
    y_label: &str,
    entries: &[(String, Option<f64>)],
    palette: &Palette,
) -> Result<ChartOutcome, RenderError> {
    let kept = filter_values(entries);
    if kept.is_empty() {
        tracing::warn!(chart = title, "skipping chart, no valid data");
        return Ok(ChartOutcome::Skipped);
    }

    let chart = BarChart {
        title: title.to_string(),
        y_label: y_label.to_string(),
        bars: kept
            .into_iter()
            .map(|(category, value)| Bar {
                color: palette.color_for(&category).to_string(),
                category,
                value,
            })
            .collect(),
    };
    let path = chart_path(dir, stem, renderer);
    renderer.render_bars(&chart, &path)?;
    tracing::info!(path = %path.display(), "saved chart");
    Ok(ChartOutcome::Written(path))
}

/// Rank `entries` by mean and render them as a stats chart, or skip if none
/// remain.
pub fn publish_stats(
    renderer: &dyn ChartRenderer,
    dir: &Path,
    stem: &str,
    title: &str,
    y_label: &str,
    entries: &[(String, SummaryStats)],
    palette: &Palette,
) -> Result<ChartOutcome, RenderError> {
    let ranked = rank_by_mean(entries);
    if ranked.is_empty() {
        tracing::warn!(chart = title, "skipping chart, no benchmark data");
        return Ok(ChartOutcome::Skipped);
    }

    let chart = StatsChart {
        title: title.to_string(),
        y_label: y_label.to_string(),
        bars: ranked
            .into_iter()
            .map(|(category, stats)| StatsBar {
                color: palette.color_for(&category).to_string(),
                category,
                stats,
            })
            .collect(),
    };
    let path = chart_path(dir, stem, renderer);
    renderer.render_stats(&chart, &path)?;
    tracing::info!(path = %path.display(), "saved chart");
    Ok(ChartOutcome::Written(path))
}

/// Errors from drawing a chart.
#[derive(Debug)]
pub enum RenderError {
    Draw { path: PathBuf, detail: String },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Draw { path, detail } => {
                write!(f, "failed to draw chart {}: {detail}", path.display())
            }
        }
    }
}

impl std::error::Error for RenderError {}
