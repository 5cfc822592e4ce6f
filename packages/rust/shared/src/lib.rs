//! Shared types, error model, and configuration for storypulse.
//!
//! This crate is the foundation depended on by all other storypulse crates.
//! It provides:
//! - [`StorypulseError`] — the unified error type
//! - Domain types ([`StoryRecord`], [`ArticleRow`], [`CrawlTarget`])
//! - Configuration ([`AppConfig`], [`FetchPolicy`], config loading)
//! - [`parse_count`] — the single engagement-count normalizer

pub mod config;
pub mod counts;
pub mod csv;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchPolicy, ModelConfig, PathsConfig, ScrapeConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use counts::parse_count;
pub use error::{Result, StorypulseError};
pub use types::{
    ArchiveDay, ArticleRow, CSV_HEADER, CrawlTarget, FOLLOWERS_UNKNOWN, StoryRecord, TITLE_MISSING,
};
