use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from bench-report.toml.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output: OutputConfig,
    pub normalization: NormalizationConfig,
    pub algorithms: Vec<AlgorithmConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub plots_dir: PathBuf,
    /// Relative to `plots_dir`. Empty disables the JSON summary.
    pub summary_file: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Thresholds for the seconds → milliseconds heuristic.
///
/// These are guesses about what upstream producers emit, not measured
/// constants, so they live in config rather than in code.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// A single user-time sample below this is taken to be in seconds.
    pub user_time_threshold: f64,
    /// A `time_ms` column whose mean is below this is taken to be in seconds.
    pub batch_mean_threshold: f64,
    pub factor: f64,
}

/// One benchmarked algorithm and where its data lives.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AlgorithmConfig {
    pub name: String,
    pub csv_path: PathBuf,
    pub tls_log_path: PathBuf,
    #[serde(default = "default_color")]
    pub display_color: String,
}

fn default_color() -> String {
    "gray".to_string()
}

// --- Default implementations ---

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig::default(),
            normalization: NormalizationConfig::default(),
            algorithms: default_algorithms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            plots_dir: PathBuf::from("results/plots"),
            summary_file: PathBuf::from("summary.json"),
            width: 1000,
            height: 600,
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            user_time_threshold: 0.001,
            batch_mean_threshold: 1.0,
            factor: 1000.0,
        }
    }
}

fn default_algorithms() -> Vec<AlgorithmConfig> {
    [
        ("Kyber", "kyber", "benchmark_kyber", "blue"),
        ("Dilithium", "dilithium", "benchmark_dilithium", "green"),
        ("ECDSA", "classical_ecdsa", "benchmark_ecdsa", "orange"),
        ("RSA", "classical_rsa", "benchmark_rsa", "purple"),
        ("ECDH", "classical_ecdh", "benchmark_ecdh", "red"),
    ]
    .into_iter()
    .map(|(name, dir, stem, color)| AlgorithmConfig {
        name: name.to_string(),
        csv_path: PathBuf::from(format!("results/{dir}/{stem}.csv")),
        tls_log_path: PathBuf::from(format!("results/{dir}/{stem}_tls_time.log")),
        display_color: color.to_string(),
    })
    .collect()
}

impl ReportConfig {
    /// Load config from a TOML file.
    ///
    /// A missing file is not an error: the built-in defaults describe the
    /// standard `results/` layout produced by the benchmark programs.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        Self::from_toml(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse config from TOML text and validate it.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ReportConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let n = &self.normalization;
        for (field, value) in [
            ("normalization.user_time_threshold", n.user_time_threshold),
            ("normalization.batch_mean_threshold", n.batch_mean_threshold),
            ("normalization.factor", n.factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    detail: format!("{field} must be a positive finite number, got {value}"),
                });
            }
        }
        if self.output.width == 0 || self.output.height == 0 {
            return Err(ConfigError::Invalid {
                detail: "output.width and output.height must be non-zero".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for algo in &self.algorithms {
            if algo.name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    detail: "algorithm name must not be empty".to_string(),
                });
            }
            if !seen.insert(algo.name.as_str()) {
                return Err(ConfigError::Invalid {
                    detail: format!("duplicate algorithm name: {}", algo.name),
                });
            }
        }
        Ok(())
    }

    /// Expand `~/` prefixes in every configured path.
    pub fn expand_paths(&mut self) {
        self.output.plots_dir = expand_home(&self.output.plots_dir);
        for algo in &mut self.algorithms {
            algo.csv_path = expand_home(&algo.csv_path);
            algo.tls_log_path = expand_home(&algo.tls_log_path);
        }
    }

    /// Where the JSON summary goes, if enabled.
    pub fn summary_path(&self) -> Option<PathBuf> {
        if self.output.summary_file.as_os_str().is_empty() {
            None
        } else {
            Some(self.output.plots_dir.join(&self.output.summary_file))
        }
    }
}

/// Replace a leading `~` component with the user's home directory.
///
/// Paths without the prefix, or with no resolvable home, are returned as-is.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Errors from loading the report configuration.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid {
        detail: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {source}", path.display())
            }
            ConfigError::Invalid { detail } => write!(f, "invalid config: {detail}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}
