//! Core domain types for storypulse.

use serde::{Deserialize, Serialize};

use crate::csv::write_row;

/// Header row of every per-target raw CSV file.
pub const CSV_HEADER: &str = "date,title,claps,responses,author_name,followers,reading_time_mins";

/// Sentinel written to the `followers` column at acquisition time; the
/// count is unknown until downstream enrichment, which is out of scope.
pub const FOLLOWERS_UNKNOWN: &str = "N/A";

/// Sentinel title for stories whose heading is absent.
pub const TITLE_MISSING: &str = "-";

// ---------------------------------------------------------------------------
// CrawlTarget
// ---------------------------------------------------------------------------

/// One (tag, year) unit of crawling work, processed independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrawlTarget {
    /// Topical tag the archive pages belong to.
    pub tag: String,
    /// Calendar year to enumerate.
    pub year: i32,
}

impl CrawlTarget {
    pub fn new(tag: impl Into<String>, year: i32) -> Self {
        Self {
            tag: tag.into(),
            year,
        }
    }

    /// File stem for this target's raw CSV (`<tag>_<year>`).
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.tag, self.year)
    }

    /// Enumerate targets tag-major, year-minor, so resumption is predictable.
    pub fn enumerate(tags: &[String], years: &[i32]) -> Vec<Self> {
        let mut targets = Vec::with_capacity(tags.len() * years.len());
        for tag in tags {
            for &year in years {
                targets.push(Self::new(tag.clone(), year));
            }
        }
        targets
    }
}

impl std::fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tag, self.year)
    }
}

// ---------------------------------------------------------------------------
// ArchiveDay
// ---------------------------------------------------------------------------

/// One enumerated archive day, kept verbatim as (year, month, day).
///
/// The archive enumerates days under a simplified calendar (February has
/// 29 days iff `year % 4 == 0`), which produces days a validating date
/// type cannot represent (Feb 29 of century years). The label carries the
/// enumerated values through to the raw file unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl ArchiveDay {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

impl std::fmt::Display for ArchiveDay {
    /// `MM/DD/YYYY`, the raw-file date format.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:02}/{:04}", self.month, self.day, self.year)
    }
}

// ---------------------------------------------------------------------------
// StoryRecord
// ---------------------------------------------------------------------------

/// One article observation extracted from an archive page.
///
/// `claps` and `responses` are kept as raw extracted strings at this layer
/// (they may still contain abbreviations like `1.2K`); normalization to
/// integers happens when rows cross into the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Archive day the story appeared under.
    pub date: ArchiveDay,
    /// Story title, `-` when absent.
    pub title: String,
    /// Raw clap count text.
    pub claps: String,
    /// Raw response count text.
    pub responses: String,
    /// Author handle from the profile path segment.
    pub author_name: String,
    /// Always [`FOLLOWERS_UNKNOWN`] at acquisition time.
    pub followers: String,
    /// Raw reading-time estimate text.
    pub reading_time_mins: String,
}

impl StoryRecord {
    /// Whether the title needs quoting in the flat-file format.
    pub fn title_needs_quoting(&self) -> bool {
        self.title.contains(',')
    }

    /// Format as one raw CSV data row (no trailing newline).
    /// Dates are `MM/DD/YYYY`; only a comma in the title triggers quoting.
    pub fn csv_line(&self) -> String {
        write_row(&[
            &self.date.to_string(),
            &self.title,
            &self.claps,
            &self.responses,
            &self.author_name,
            &self.followers,
            &self.reading_time_mins,
        ])
    }
}

// ---------------------------------------------------------------------------
// ArticleRow
// ---------------------------------------------------------------------------

/// A normalized article row loaded back from the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRow {
    /// Archive date as stored (`MM/DD/YYYY`).
    pub date: String,
    pub title: String,
    pub claps: i64,
    pub responses: i64,
    pub author_name: String,
    pub followers: String,
    pub reading_time_mins: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> StoryRecord {
        StoryRecord {
            date: ArchiveDay::new(2024, 3, 7),
            title: title.into(),
            claps: "1.2K".into(),
            responses: "14".into(),
            author_name: "jdoe".into(),
            followers: FOLLOWERS_UNKNOWN.into(),
            reading_time_mins: "6".into(),
        }
    }

    #[test]
    fn csv_line_formats_date_mm_dd_yyyy() {
        let line = record("Plain title").csv_line();
        assert_eq!(line, "03/07/2024,Plain title,1.2K,14,jdoe,N/A,6");
    }

    #[test]
    fn archive_day_keeps_days_outside_the_real_calendar() {
        // Feb 29 of a century year exists under the simplified rule.
        assert_eq!(ArchiveDay::new(1900, 2, 29).to_string(), "02/29/1900");
        assert_eq!(ArchiveDay::new(2100, 2, 29).to_string(), "02/29/2100");
        assert_eq!(ArchiveDay::new(2024, 12, 5).to_string(), "12/05/2024");
    }

    #[test]
    fn csv_line_quotes_title_with_comma() {
        let rec = record("Hello, world");
        assert!(rec.title_needs_quoting());
        let line = rec.csv_line();
        assert!(line.starts_with("03/07/2024,\"Hello, world\","));
    }

    #[test]
    fn target_enumeration_is_tag_major() {
        let targets = CrawlTarget::enumerate(
            &["a".to_string(), "b".to_string()],
            &[2023, 2024],
        );
        let order: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
        assert_eq!(order, vec!["a/2023", "a/2024", "b/2023", "b/2024"]);
    }

    #[test]
    fn target_file_stem() {
        let t = CrawlTarget::new("business", 2022);
        assert_eq!(t.file_stem(), "business_2022");
    }

    #[test]
    fn record_roundtrips_through_json() {
        let rec = record("Serde check");
        let json = serde_json::to_string(&rec).expect("serialize");
        let parsed: StoryRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, rec);
    }
}
