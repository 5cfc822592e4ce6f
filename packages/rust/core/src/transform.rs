//! Feature transformation: raw article rows → modeling-ready table.
//!
//! The orchestrator only depends on the [`FeatureTransformer`] trait;
//! [`EngagementTransformer`] is the stock implementation.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use storypulse_shared::{ArticleRow, Result, StorypulseError, TITLE_MISSING, csv};

/// Header of the modeling-ready table. The followers column is dropped:
/// it only ever holds the acquisition-time sentinel.
const PROCESSED_HEADER: &str = "date,title,claps,responses,author_name,reading_time_mins";

/// File name of the modeling-ready table.
const PROCESSED_FILE: &str = "articles_processed.csv";

/// Cleans and normalizes loaded rows into a persisted modeling-ready table.
pub trait FeatureTransformer {
    fn transform(&self, rows: &[ArticleRow]) -> Result<TransformOutcome>;
}

/// Result of one transform stage.
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    /// Location of the modeling-ready table.
    pub path: PathBuf,
    /// Rows written.
    pub rows_kept: usize,
    /// Rows discarded as unusable.
    pub rows_dropped: usize,
}

/// Stock transformer: drops the followers column and rows whose title is
/// blank or the missing-title sentinel, then writes the processed CSV.
pub struct EngagementTransformer {
    processed_dir: PathBuf,
}

impl EngagementTransformer {
    pub fn new(processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed_dir: processed_dir.into(),
        }
    }
}

impl FeatureTransformer for EngagementTransformer {
    fn transform(&self, rows: &[ArticleRow]) -> Result<TransformOutcome> {
        std::fs::create_dir_all(&self.processed_dir)
            .map_err(|e| StorypulseError::io(&self.processed_dir, e))?;
        let path = self.processed_dir.join(PROCESSED_FILE);

        let mut out = String::with_capacity(rows.len() * 64);
        out.push_str(PROCESSED_HEADER);
        out.push('\n');

        let mut rows_kept = 0usize;
        let mut rows_dropped = 0usize;

        for row in rows {
            // Both the acquisition-time sentinel and genuinely blank
            // titles carry no signal for a title-based model.
            if row.title.trim().is_empty() || row.title == TITLE_MISSING {
                rows_dropped += 1;
                continue;
            }
            out.push_str(&csv::write_row(&[
                &row.date,
                &row.title,
                &row.claps.to_string(),
                &row.responses.to_string(),
                &row.author_name,
                &row.reading_time_mins.to_string(),
            ]));
            out.push('\n');
            rows_kept += 1;
        }

        write_atomic(&path, &out)?;

        info!(
            path = %path.display(),
            rows_kept,
            rows_dropped,
            "transform stage complete"
        );

        Ok(TransformOutcome {
            path,
            rows_kept,
            rows_dropped,
        })
    }
}

/// Write via a temp file + rename so a crash never leaves a half-written
/// processed table behind.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut file = std::fs::File::create(&tmp).map_err(|e| StorypulseError::io(&tmp, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| StorypulseError::io(&tmp, e))?;
    }
    std::fs::rename(&tmp, path).map_err(|e| StorypulseError::io(path, e))
}
