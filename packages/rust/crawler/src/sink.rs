//! Incremental record sink: batched, append-only CSV persistence.
//!
//! Entries buffer in memory and flush to the per-target file in whole
//! batches, so abrupt termination loses at most one unflushed batch.
//! Re-opening an existing file appends after prior content without
//! rewriting the header, which makes partially crawled targets resumable.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use storypulse_shared::{CSV_HEADER, Result, StoryRecord, StorypulseError};

/// Records buffered before a durable flush.
pub const BATCH_SIZE: usize = 5;

/// Append-only sink for one crawl target's records.
pub struct RecordSink {
    path: PathBuf,
    buffer: Vec<StoryRecord>,
    flushed_batches: usize,
}

impl RecordSink {
    /// Open the sink for `path`, creating the file with a header row if it
    /// does not exist yet. An existing file is left untouched.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorypulseError::io(parent, e))?;
        }

        if !path.exists() {
            std::fs::write(&path, format!("{CSV_HEADER}\n"))
                .map_err(|e| StorypulseError::io(&path, e))?;
            debug!(?path, "created raw file with header");
        }

        Ok(Self {
            path,
            buffer: Vec::with_capacity(BATCH_SIZE),
            flushed_batches: 0,
        })
    }

    /// The file this sink appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of batches flushed so far.
    pub fn flushed_batches(&self) -> usize {
        self.flushed_batches
    }

    /// Buffer one record, flushing when the batch reaches capacity.
    pub fn append(&mut self, record: StoryRecord) -> Result<()> {
        self.buffer.push(record);
        if self.buffer.len() >= BATCH_SIZE {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush any remaining partial batch and consume the sink.
    pub fn finalize(mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(())
    }

    /// Append the whole buffered batch in one write, then clear it.
    fn flush(&mut self) -> Result<()> {
        let mut lines = String::new();
        for record in &self.buffer {
            lines.push_str(&record.csv_line());
            lines.push('\n');
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StorypulseError::io(&self.path, e))?;
        file.write_all(lines.as_bytes())
            .map_err(|e| StorypulseError::io(&self.path, e))?;

        debug!(path = ?self.path, records = self.buffer.len(), "flushed batch");
        self.buffer.clear();
        self.flushed_batches += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storypulse_shared::{ArchiveDay, FOLLOWERS_UNKNOWN};

    fn record(n: usize) -> StoryRecord {
        StoryRecord {
            date: ArchiveDay::new(2023, 1, 1),
            title: format!("Story {n}"),
            claps: "10".into(),
            responses: "1".into(),
            author_name: format!("author{n}"),
            followers: FOLLOWERS_UNKNOWN.into(),
            reading_time_mins: "4".into(),
        }
    }

    fn line_count(path: &Path) -> usize {
        std::fs::read_to_string(path).unwrap().lines().count()
    }

    #[test]
    fn twelve_appends_make_flushes_of_5_5_2() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("business_2023.csv");
        let mut sink = RecordSink::open(&path).unwrap();

        for n in 0..10 {
            sink.append(record(n)).unwrap();
        }
        assert_eq!(sink.flushed_batches(), 2);
        assert_eq!(line_count(&path), 1 + 10); // header + two full batches

        for n in 10..12 {
            sink.append(record(n)).unwrap();
        }
        // Partial batch still buffered.
        assert_eq!(sink.flushed_batches(), 2);
        assert_eq!(line_count(&path), 1 + 10);

        sink.finalize().unwrap();
        assert_eq!(line_count(&path), 1 + 12);

        // Order preserved end to end.
        let content = std::fs::read_to_string(&path).unwrap();
        let authors: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(4).unwrap())
            .collect();
        let expected: Vec<String> = (0..12).map(|n| format!("author{n}")).collect();
        assert_eq!(authors, expected);
    }

    #[test]
    fn finalize_with_empty_buffer_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let sink = RecordSink::open(&path).unwrap();
        sink.finalize().unwrap();
        assert_eq!(line_count(&path), 1); // header only
    }

    #[test]
    fn reopening_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.csv");

        let mut first = RecordSink::open(&path).unwrap();
        for n in 0..3 {
            first.append(record(n)).unwrap();
        }
        first.finalize().unwrap();
        assert_eq!(line_count(&path), 1 + 3);

        let mut second = RecordSink::open(&path).unwrap();
        for n in 3..7 {
            second.append(record(n)).unwrap();
        }
        second.finalize().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let headers = content
            .lines()
            .filter(|l| l.starts_with("date,title"))
            .count();
        assert_eq!(headers, 1);
        assert_eq!(line_count(&path), 1 + 7);
    }

    #[test]
    fn quoted_title_survives_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quoted.csv");
        let mut sink = RecordSink::open(&path).unwrap();

        let mut rec = record(0);
        rec.title = "Commas, everywhere".into();
        sink.append(rec).unwrap();
        sink.finalize().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"Commas, everywhere\""));
    }
}
