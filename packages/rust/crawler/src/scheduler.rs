//! Per-target crawl scheduler.
//!
//! Enumerates every calendar day of one (tag, year) target, drives
//! fetch → parse → sink for each day, and finalizes the sink when the
//! target completes. Day failures are logged and skipped; nothing short
//! of an unwritable raw file aborts a target.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use url::Url;

use storypulse_shared::{ArchiveDay, CrawlTarget, Result, StorypulseError};

use crate::fetch::Fetcher;
use crate::parse::ArchivePageParser;
use crate::sink::RecordSink;

/// Days in `month` of `year` under the simplified calendar rule used for
/// archive enumeration: February has 29 days iff `year % 4 == 0`. This
/// deliberately ignores the century/400-year corrections; changing it
/// would change which historical dates get crawled.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if year % 4 == 0 {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Summary of one completed target crawl.
#[derive(Debug, Clone)]
pub struct TargetOutcome {
    /// The per-target raw CSV file.
    pub csv_path: PathBuf,
    /// Days whose archive page was fetched and parsed.
    pub days_fetched: usize,
    /// Days skipped after a terminal fetch failure.
    pub days_failed: usize,
    /// Records appended across the whole target.
    pub records: usize,
}

/// Sequential day-by-day crawler for (tag, year) targets.
pub struct CrawlScheduler {
    fetcher: Fetcher,
    parser: ArchivePageParser,
    base_url: String,
    day_quota: usize,
    raw_dir: PathBuf,
}

impl CrawlScheduler {
    pub fn new(
        fetcher: Fetcher,
        base_url: impl Into<String>,
        day_quota: usize,
        raw_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            parser: ArchivePageParser::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            day_quota,
            raw_dir: raw_dir.into(),
        }
    }

    /// Path of the raw CSV for `target`.
    pub fn csv_path(&self, target: &CrawlTarget) -> PathBuf {
        self.raw_dir.join(format!("{}.csv", target.file_stem()))
    }

    /// Crawl every day of the target's year into its raw file.
    ///
    /// Each fetch failure skips that day only. The mandatory pacing delay
    /// is observed after every day regardless of outcome.
    pub async fn run(&self, target: &CrawlTarget) -> Result<TargetOutcome> {
        let csv_path = self.csv_path(target);
        let mut sink = RecordSink::open(&csv_path)?;

        info!(
            target = %target,
            quota = self.day_quota,
            file = %csv_path.display(),
            "starting target crawl"
        );

        let mut days_fetched = 0usize;
        let mut days_failed = 0usize;
        let mut records = 0usize;

        for month in 1..=12u32 {
            for day in 1..=days_in_month(target.year, month) {
                let url = self.archive_url(target, month, day)?;

                match self.fetcher.fetch(&url).await {
                    Ok(body) => {
                        let date = ArchiveDay::new(target.year, month, day);
                        let entries = self.parser.parse(&body, date, self.day_quota);
                        for entry in entries {
                            sink.append(entry)?;
                            records += 1;
                        }
                        days_fetched += 1;
                    }
                    Err(e) => {
                        warn!(%url, error = %e, "day fetch failed, skipping");
                        days_failed += 1;
                    }
                }

                self.fetcher.pace().await;
            }
        }

        sink.finalize()?;

        let outcome = TargetOutcome {
            csv_path,
            days_fetched,
            days_failed,
            records,
        };

        info!(
            target = %target,
            days_fetched = outcome.days_fetched,
            days_failed = outcome.days_failed,
            records = outcome.records,
            "target crawl complete"
        );

        Ok(outcome)
    }

    /// Build the archive URL for one day:
    /// `{base}/{tag}/archive/{year}/{MM}/{DD}`.
    fn archive_url(&self, target: &CrawlTarget, month: u32, day: u32) -> Result<Url> {
        let raw = format!(
            "{}/{}/archive/{}/{:02}/{:02}",
            self.base_url, target.tag, target.year, month, day
        );
        Url::parse(&raw).map_err(|e| StorypulseError::Network(format!("bad archive URL {raw}: {e}")))
    }
}

/// Count data rows (excluding the header) in a raw CSV file.
pub fn data_row_count(path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path).map_err(|e| StorypulseError::io(path, e))?;
    Ok(content.lines().skip(1).filter(|l| !l.is_empty()).count())
}
