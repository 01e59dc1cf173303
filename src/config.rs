//! TOML configuration.
//!
//! Every section is optional; a missing key takes the value the hosted
//! Harmony web app uses. See `config/harmony.example.toml`.

use anyhow::{Context, Result};
use harmony_core::import_url::HARMONY_APP_URL;
use harmony_core::options::{ResultsOptions, Threshold};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub results: ResultsConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub snapshots: SnapshotConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Base of import URLs; must end with `/`.
    #[serde(default = "default_app_url")]
    pub url: String,
    /// Origin used when building share links.
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: default_app_url(),
            origin: default_origin(),
        }
    }
}

fn default_app_url() -> String {
    HARMONY_APP_URL.to_string()
}
fn default_origin() -> String {
    "https://harmonydata.ac.uk".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_base")]
    pub base_url: String,
    #[serde(default = "default_match_path")]
    pub match_path: String,
    #[serde(default = "default_examples_path")]
    pub examples_path: String,
    #[serde(default = "default_models_path")]
    pub models_path: String,
    #[serde(default = "default_version_path")]
    pub version_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            match_path: default_match_path(),
            examples_path: default_examples_path(),
            models_path: default_models_path(),
            version_path: default_version_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.harmonydata.ac.uk".to_string()
}
fn default_match_path() -> String {
    "/text/match".to_string()
}
fn default_examples_path() -> String {
    "/text/examples".to_string()
}
fn default_models_path() -> String {
    "/info/models".to_string()
}
fn default_version_path() -> String {
    "/info/version".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

/// Defaults for [`ResultsOptions`] when the CLI flags leave them unset.
#[derive(Debug, Deserialize, Clone)]
pub struct ResultsConfig {
    #[serde(default = "default_threshold")]
    pub threshold: [u8; 2],
    #[serde(default)]
    pub intra_instrument: bool,
    #[serde(default)]
    pub search_term: String,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            intra_instrument: false,
            search_term: String::new(),
        }
    }
}

fn default_threshold() -> [u8; 2] {
    [70, 100]
}

impl ResultsConfig {
    pub fn to_options(&self) -> Result<ResultsOptions> {
        Ok(ResultsOptions {
            threshold: Threshold::try_from(self.threshold)?,
            search_term: self.search_term.clone(),
            intra_instrument: self.intra_instrument,
            ..Default::default()
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_export_path")]
    pub path: PathBuf,
    /// Include the raw lower-triangular "Matrix" sheet.
    #[serde(default = "default_true")]
    pub matrix_sheet: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: default_export_path(),
            matrix_sheet: true,
        }
    }
}

fn default_export_path() -> PathBuf {
    PathBuf::from(crate::export::DEFAULT_FILE_NAME)
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_history_path")]
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
        }
    }
}

fn default_history_path() -> PathBuf {
    PathBuf::from("./data/history.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_dir")]
    pub dir: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            dir: default_snapshot_dir(),
        }
    }
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("./data/harmonisations")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Configuration with every default, used when no file is present.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate results
    config
        .results
        .to_options()
        .context("results.threshold is invalid")?;

    // Validate api
    if config.api.timeout_secs == 0 {
        anyhow::bail!("api.timeout_secs must be > 0");
    }
    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://")
    {
        anyhow::bail!("api.base_url must be an http(s) URL");
    }

    // Validate app
    if !config.app.url.ends_with('/') {
        anyhow::bail!("app.url must end with '/'");
    }

    Ok(())
}
