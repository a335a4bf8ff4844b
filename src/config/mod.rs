//! Configuration management.

use crate::models::{Category, Lexicon};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Extension of the append-only round log.
pub const DATA_EXT: &str = "dat";
/// Extension of the rendered chart artifact.
pub const CHART_EXT: &str = "svg";

/// Main configuration for lexmon.
#[derive(Debug, Clone)]
pub struct LexmonConfig {
    /// Name of the remote resource to monitor (appended to `base_url`).
    pub resource: String,
    /// Base URL of the remote source.
    pub base_url: String,
    /// Sampling period in seconds.
    pub period_secs: f64,
    /// Path of the append-only round log. Defaults to `<resource>.dat`.
    pub log_path: Option<PathBuf>,
    /// Path of the rendered chart. Defaults to `<resource>.svg`.
    pub chart_path: Option<PathBuf>,
    /// Listen address of the status server.
    pub listen_addr: String,
    /// Maximum number of retained series samples.
    pub series_capacity: usize,
    /// Alert threshold drawn on the chart (the "safe level").
    pub alert_threshold: u64,
    /// Fetch and retry tuning.
    pub fetch: FetchConfig,
    /// Keyword categories, in scoring order.
    pub categories: Vec<CategorySpec>,
}

/// Fetch and retry tuning for the sampling workers and the lister.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-attempt request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Fixed backoff between attempts in milliseconds.
    pub backoff_ms: u64,
    /// Maximum fetch attempts per item before the worker reports a skip.
    pub max_attempts: u32,
    /// Round deadline in seconds. `None` derives it from the period.
    pub round_timeout_secs: Option<f64>,
    /// Charset assumed for item bodies that do not declare one.
    pub fallback_charset: String,
    /// Regex extracting item handles from the listing page. The first
    /// capture group is used when present, the whole match otherwise.
    pub item_pattern: String,
    /// Optional regex resolving the listing page from the resource's
    /// landing page (two-stage listing). `None` lists directly.
    pub resolve_pattern: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            connect_timeout_ms: 3_000,
            backoff_ms: 2_000,
            max_attempts: 5,
            round_timeout_secs: None,
            fallback_charset: "windows-1251".to_string(),
            item_pattern: r#"href="(/post/[0-9]+[^"]*)""#.to_string(),
            resolve_pattern: None,
        }
    }
}

/// One keyword category as configured.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorySpec {
    /// Display label.
    pub label: String,
    /// Keyword substrings (matched case-insensitively).
    pub keywords: Vec<String>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Resource name.
    pub resource: Option<String>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Sampling period in seconds.
    pub period_secs: Option<f64>,
    /// Round log path.
    pub log_path: Option<String>,
    /// Chart path.
    pub chart_path: Option<String>,
    /// Listen address.
    pub listen_addr: Option<String>,
    /// Series capacity.
    pub series_capacity: Option<usize>,
    /// Alert threshold.
    pub alert_threshold: Option<u64>,
    /// Fetch section.
    pub fetch: Option<ConfigFileFetch>,
    /// Lexicon categories.
    #[serde(default)]
    pub lexicon: Vec<CategorySpec>,
}

/// Fetch section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileFetch {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Retry backoff in milliseconds.
    pub backoff_ms: Option<u64>,
    /// Maximum attempts per item.
    pub max_attempts: Option<u32>,
    /// Round deadline in seconds.
    pub round_timeout_secs: Option<f64>,
    /// Fallback charset.
    pub fallback_charset: Option<String>,
    /// Item-handle regex.
    pub item_pattern: Option<String>,
    /// Listing-resolution regex.
    pub resolve_pattern: Option<String>,
}

impl Default for LexmonConfig {
    fn default() -> Self {
        Self {
            resource: "typical-press".to_string(),
            base_url: "https://example.com/".to_string(),
            period_secs: 30.0,
            log_path: None,
            chart_path: None,
            listen_addr: "0.0.0.0:8080".to_string(),
            series_capacity: crate::series::DEFAULT_CAPACITY,
            alert_threshold: 10,
            fetch: FetchConfig::default(),
            categories: Vec::new(),
        }
    }
}

impl LexmonConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::operation("read_config_file", e))?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| Error::operation("parse_config_file", e))?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/lexmon/` on macOS)
    /// 2. XDG config dir (`~/.config/lexmon/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("lexmon").join("config.toml");
        if platform_config.exists()
            && let Ok(config) = Self::load_from_file(&platform_config)
        {
            return config;
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("lexmon")
            .join("config.toml");
        if xdg_config.exists()
            && let Ok(config) = Self::load_from_file(&xdg_config)
        {
            return config;
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `LexmonConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(resource) = file.resource {
            config.resource = resource;
        }
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(period_secs) = file.period_secs {
            config.period_secs = period_secs;
        }
        config.log_path = file.log_path.map(PathBuf::from);
        config.chart_path = file.chart_path.map(PathBuf::from);
        if let Some(listen_addr) = file.listen_addr {
            config.listen_addr = listen_addr;
        }
        if let Some(capacity) = file.series_capacity {
            config.series_capacity = capacity.max(1);
        }
        if let Some(threshold) = file.alert_threshold {
            config.alert_threshold = threshold;
        }
        if let Some(fetch) = file.fetch {
            if let Some(v) = fetch.timeout_ms {
                config.fetch.timeout_ms = v;
            }
            if let Some(v) = fetch.connect_timeout_ms {
                config.fetch.connect_timeout_ms = v;
            }
            if let Some(v) = fetch.backoff_ms {
                config.fetch.backoff_ms = v;
            }
            if let Some(v) = fetch.max_attempts {
                config.fetch.max_attempts = v.max(1);
            }
            if let Some(v) = fetch.round_timeout_secs {
                config.fetch.round_timeout_secs = Some(v);
            }
            if let Some(v) = fetch.fallback_charset {
                config.fetch.fallback_charset = v;
            }
            if let Some(v) = fetch.item_pattern {
                config.fetch.item_pattern = v;
            }
            if let Some(v) = fetch.resolve_pattern {
                config.fetch.resolve_pattern = Some(v);
            }
        }
        config.categories = file.lexicon;

        config
    }

    /// Applies environment variable overrides.
    ///
    /// `HOST` and `PORT` override the listen address; `LEXMON_*` variables
    /// override the sampling knobs.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("LEXMON_RESOURCE")
            && !v.trim().is_empty()
        {
            self.resource = v;
        }
        if let Ok(v) = std::env::var("LEXMON_BASE_URL")
            && !v.trim().is_empty()
        {
            self.base_url = v;
        }
        if let Ok(v) = std::env::var("LEXMON_PERIOD_SECS")
            && let Ok(parsed) = v.parse::<f64>()
        {
            self.period_secs = parsed;
        }
        if let Ok(v) = std::env::var("LEXMON_LOG_PATH")
            && !v.trim().is_empty()
        {
            self.log_path = Some(PathBuf::from(v));
        }

        let host = std::env::var("HOST").unwrap_or_default();
        let port = std::env::var("PORT").unwrap_or_default();
        if !host.is_empty() || !port.is_empty() {
            let port = if port.is_empty() { "8080" } else { &port };
            self.listen_addr = format!("{host}:{port}");
        }

        self
    }

    /// Sets the resource name.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Sets the sampling period in seconds.
    #[must_use]
    pub const fn with_period_secs(mut self, period_secs: f64) -> Self {
        self.period_secs = period_secs;
        self
    }

    /// Sets the round log path.
    #[must_use]
    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Sets the status server listen address.
    #[must_use]
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    /// The effective round log path (`<resource>.dat` unless overridden).
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.log_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.{DATA_EXT}", self.resource)))
    }

    /// The effective chart path (`<resource>.svg` unless overridden).
    #[must_use]
    pub fn chart_path(&self) -> PathBuf {
        self.chart_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.{CHART_EXT}", self.resource)))
    }

    /// The effective round deadline.
    #[must_use]
    pub fn round_timeout(&self) -> std::time::Duration {
        let secs = self
            .fetch
            .round_timeout_secs
            .unwrap_or(self.period_secs)
            .max(0.1);
        std::time::Duration::from_secs_f64(secs)
    }

    /// Builds the immutable process-lifetime lexicon.
    ///
    /// Falls back to a small built-in lexicon when no categories are
    /// configured, so a bare `lexmon run` still produces a useful chart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a configured category is invalid.
    pub fn build_lexicon(&self) -> Result<Lexicon> {
        if self.categories.is_empty() {
            return Lexicon::new(vec![
                Category::new("incidents", ["outage", "down", "failure", "crash"])?,
                Category::new("maintenance", ["maintenance", "upgrade", "migration"])?,
            ]);
        }

        let categories = self
            .categories
            .iter()
            .map(|spec| Category::new(spec.label.clone(), spec.keywords.clone()))
            .collect::<Result<Vec<_>>>()?;
        Lexicon::new(categories)
    }
}
