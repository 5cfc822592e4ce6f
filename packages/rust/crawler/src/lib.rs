//! Acquisition subsystem: rate-limited fetching, archive page parsing,
//! batched append-only persistence, and per-target day scheduling.

pub mod fetch;
pub mod parse;
pub mod scheduler;
pub mod sink;

pub use fetch::Fetcher;
pub use parse::ArchivePageParser;
pub use scheduler::{CrawlScheduler, TargetOutcome, days_in_month};
pub use sink::{BATCH_SIZE, RecordSink};
