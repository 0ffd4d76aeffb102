mod chart;
mod config;
mod extract;
mod metrics;
mod normalize;
mod render;
mod report;
mod stats;
mod summary;
#[cfg(test)]
mod test_support;
mod trials;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Compare post-quantum and classical crypto benchmarks: pull timing,
/// memory and scheduling metrics out of benchmark logs and CSVs, summarize
/// them, and draw one comparative bar chart per metric.
#[derive(Parser, Debug)]
#[command(name = "pqc-bench-report", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "bench-report.toml")]
    config: PathBuf,

    /// Chart output directory (overrides config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Do not write the JSON summary
    #[arg(long)]
    no_summary: bool,

    /// Print the resolved config and exit
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (per-metric extraction details)
    #[arg(short, long)]
    verbose: bool,

    /// Only warnings and errors, no summary table
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let mut config = match config::ReportConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(dir) = cli.output_dir {
        config.output.plots_dir = dir;
    }
    if cli.no_summary {
        config.output.summary_file = PathBuf::new();
    }
    config.expand_paths();

    if cli.dry_run {
        match toml::to_string_pretty(&config) {
            Ok(s) => print!("{s}"),
            Err(e) => {
                eprintln!("error: failed to render config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let renderer = render::SvgRenderer::new(config.output.width, config.output.height);
    match report::run(&config, &renderer) {
        Ok(summary) => {
            if !cli.quiet {
                print!("{}", summary.to_text());
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
