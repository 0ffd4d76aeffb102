//! SVG bar-chart renderer built on plotters.

use crate::chart::{BarChart, ChartRenderer, RenderError, StatsChart};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

const FONT: &str = "sans-serif";

/// Renders charts as SVG files of a fixed pixel size.
pub struct SvgRenderer {
    width: u32,
    height: u32,
}

impl SvgRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn draw_bars(&self, chart: &BarChart, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let n = chart.bars.len();
        let labels: Vec<&str> = chart.bars.iter().map(|b| b.category.as_str()).collect();
        let y_top = axis_top(chart.bars.iter().map(|b| b.value));

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT, 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_top)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(n + 1)
            .x_label_formatter(&|x| category_label(x, &labels))
            .y_desc(chart.y_label.as_str())
            .draw()?;

        ctx.draw_series(
            chart
                .bars
                .iter()
                .enumerate()
                .map(|(i, bar)| bar_rect(i, bar.value, parse_color(&bar.color).filled())),
        )?;
        ctx.draw_series(
            chart
                .bars
                .iter()
                .enumerate()
                .map(|(i, bar)| bar_rect(i, bar.value, BLACK.stroke_width(1))),
        )?;

        let value_style = annotation_style();
        ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
            EmptyElement::at((SegmentValue::CenterOf(i), bar.value))
                + Text::new(format!("{:.2}", bar.value), (0, -2), value_style.clone())
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_stats(&self, chart: &StatsChart, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let n = chart.bars.len();
        let labels: Vec<&str> = chart.bars.iter().map(|b| b.category.as_str()).collect();
        let y_top = axis_top(chart.bars.iter().map(|b| upper_whisker(b.stats.mean, b.stats.std_dev)));

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, (FONT, 24))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((0..n).into_segmented(), 0f64..y_top)?;

        ctx.configure_mesh()
            .disable_x_mesh()
            .x_labels(n + 1)
            .x_label_formatter(&|x| category_label(x, &labels))
            .y_desc(chart.y_label.as_str())
            .draw()?;

        ctx.draw_series(
            chart
                .bars
                .iter()
                .enumerate()
                .map(|(i, bar)| bar_rect(i, bar.stats.mean, parse_color(&bar.color).filled())),
        )?;
        ctx.draw_series(
            chart
                .bars
                .iter()
                .enumerate()
                .map(|(i, bar)| bar_rect(i, bar.stats.mean, BLACK.stroke_width(1))),
        )?;

        // A NaN spread (single trial) collapses the error bar to nothing.
        let spread: Vec<(usize, f64, f64)> = chart
            .bars
            .iter()
            .enumerate()
            .filter(|(_, b)| b.stats.std_dev.is_finite())
            .map(|(i, b)| {
                let lo = (b.stats.mean - b.stats.std_dev).max(0.0);
                (i, lo, b.stats.mean + b.stats.std_dev)
            })
            .collect();
        ctx.draw_series(spread.iter().map(|&(i, lo, hi)| {
            PathElement::new(
                vec![(SegmentValue::CenterOf(i), lo), (SegmentValue::CenterOf(i), hi)],
                BLACK.stroke_width(1),
            )
        }))?;
        ctx.draw_series(spread.iter().flat_map(|&(i, lo, hi)| {
            [lo, hi].into_iter().map(move |y| {
                EmptyElement::at((SegmentValue::CenterOf(i), y))
                    + PathElement::new(vec![(-6, 0), (6, 0)], BLACK.stroke_width(1))
            })
        }))?;

        let note_style = annotation_style();
        ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
            let s = &bar.stats;
            EmptyElement::at((SegmentValue::CenterOf(i), upper_whisker(s.mean, s.std_dev)))
                + Text::new(format!("min: {:.1} ms", s.min), (0, -4), note_style.clone())
                + Text::new(format!("max: {:.1} ms", s.max), (0, -18), note_style.clone())
        }))?;

        root.present()?;
        Ok(())
    }
}

impl ChartRenderer for SvgRenderer {
    fn extension(&self) -> &str {
        "svg"
    }

    fn render_bars(&self, chart: &BarChart, path: &Path) -> Result<(), RenderError> {
        self.draw_bars(chart, path).map_err(|e| RenderError::Draw {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    fn render_stats(&self, chart: &StatsChart, path: &Path) -> Result<(), RenderError> {
        self.draw_stats(chart, path).map_err(|e| RenderError::Draw {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

fn bar_rect(
    i: usize,
    value: f64,
    style: ShapeStyle,
) -> Rectangle<(SegmentValue<usize>, f64)> {
    let mut rect = Rectangle::new(
        [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), value)],
        style,
    );
    rect.set_margin(0, 0, 15, 15);
    rect
}

fn annotation_style() -> TextStyle<'static> {
    TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom))
}

fn category_label(x: &SegmentValue<usize>, labels: &[&str]) -> String {
    match x {
        SegmentValue::CenterOf(i) => labels.get(*i).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}

fn upper_whisker(mean: f64, std_dev: f64) -> f64 {
    if std_dev.is_finite() {
        mean + std_dev
    } else {
        mean
    }
}

/// Headroom above the tallest bar for annotations. Never returns an empty
/// range, even when every value is zero.
fn axis_top(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0f64, f64::max);
    if max > 0.0 {
        max * 1.25
    } else {
        1.0
    }
}

/// Map a configured colour name or `#rrggbb` to an RGB value.
fn parse_color(name: &str) -> RGBColor {
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            if let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) {
                return RGBColor(r, g, b);
            }
        }
    }
    match name.to_ascii_lowercase().as_str() {
        "blue" => RGBColor(0, 0, 255),
        "green" => RGBColor(0, 128, 0),
        "orange" => RGBColor(255, 165, 0),
        "purple" => RGBColor(128, 0, 128),
        "red" => RGBColor(255, 0, 0),
        "black" => RGBColor(0, 0, 0),
        "cyan" => RGBColor(0, 255, 255),
        "magenta" => RGBColor(255, 0, 255),
        "brown" => RGBColor(165, 42, 42),
        _ => RGBColor(128, 128, 128),
    }
}
