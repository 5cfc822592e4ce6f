//! Application configuration for storypulse.
//!
//! User config lives at `~/.storypulse/storypulse.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorypulseError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "storypulse.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".storypulse";

// ---------------------------------------------------------------------------
// Config structs (matching storypulse.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Data and artifact locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Crawl parameters.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Training parameters.
    #[serde(default)]
    pub model: ModelConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for per-target raw CSV files.
    #[serde(default = "default_raw_data_dir")]
    pub raw_data_dir: String,

    /// Directory for the modeling-ready table.
    #[serde(default = "default_processed_data_dir")]
    pub processed_data_dir: String,

    /// Directory for serialized model artifacts.
    #[serde(default = "default_models_dir")]
    pub models_dir: String,

    /// Path to the articles database.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data_dir: default_raw_data_dir(),
            processed_data_dir: default_processed_data_dir(),
            models_dir: default_models_dir(),
            db_path: default_db_path(),
        }
    }
}

fn default_raw_data_dir() -> String {
    "data/raw".into()
}
fn default_processed_data_dir() -> String {
    "data/processed".into()
}
fn default_models_dir() -> String {
    "models".into()
}
fn default_db_path() -> String {
    "data/articles.db".into()
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Tag listing base URL; archive pages live at
    /// `{base_url}/{tag}/archive/{year}/{MM}/{DD}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Topical tags to crawl.
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,

    /// Years to crawl, one target per (tag, year).
    #[serde(default = "default_years")]
    pub years: Vec<i32>,

    /// Cap on stories taken from a single day's archive page.
    #[serde(default = "default_max_stories_per_day")]
    pub max_stories_per_day: usize,

    /// Mandatory delay after every page fetch, in seconds.
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,

    /// Cooldown between crawl targets, in seconds. Larger than the
    /// per-page delay.
    #[serde(default = "default_target_cooldown_secs")]
    pub target_cooldown_secs: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tags: default_tags(),
            years: default_years(),
            max_stories_per_day: default_max_stories_per_day(),
            request_delay_secs: default_request_delay_secs(),
            target_cooldown_secs: default_target_cooldown_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://medium.com/tag".into()
}
fn default_tags() -> Vec<String> {
    vec!["business".into(), "technology".into(), "ai".into()]
}
fn default_years() -> Vec<i32> {
    (2020..=2025).collect()
}
fn default_max_stories_per_day() -> usize {
    20
}
fn default_request_delay_secs() -> u64 {
    2
}
fn default_target_cooldown_secs() -> u64 {
    5
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Clap count above which an article is labeled high-engagement.
    #[serde(default = "default_clap_threshold")]
    pub clap_threshold: i64,

    /// Fraction of rows held out for evaluation.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Seed for the train/test split shuffle.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            clap_threshold: default_clap_threshold(),
            test_fraction: default_test_fraction(),
            seed: default_seed(),
        }
    }
}

fn default_clap_threshold() -> i64 {
    500
}
fn default_test_fraction() -> f64 {
    0.2
}
fn default_seed() -> u64 {
    42
}

// ---------------------------------------------------------------------------
// Fetch policy (runtime, injected into the fetcher)
// ---------------------------------------------------------------------------

/// Explicit retry/pacing policy injected into the fetcher, so tests can
/// substitute a deterministic one.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Maximum fetch attempts per URL, including the first.
    pub max_attempts: u32,
    /// HTTP status codes considered transient and retried.
    pub retry_statuses: Vec<u16>,
    /// Base backoff; attempt `n` sleeps `backoff_base * 2^(n-1)`.
    pub backoff_base: Duration,
    /// Per-request timeout ceiling.
    pub timeout: Duration,
    /// Mandatory delay observed after every page fetch.
    pub request_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_statuses: vec![500, 502, 503, 504],
            backoff_base: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            request_delay: Duration::from_secs(2),
        }
    }
}

impl From<&AppConfig> for FetchPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            request_delay: Duration::from_secs(config.scrape.request_delay_secs),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.storypulse/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StorypulseError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.storypulse/storypulse.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StorypulseError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| StorypulseError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| StorypulseError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| StorypulseError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| StorypulseError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
