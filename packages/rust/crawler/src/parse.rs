//! Archive page parser.
//!
//! Extracts a bounded list of story entries from one day's archive page
//! markup. Parsing is tolerant by contract: a story missing a required
//! sub-element is silently skipped, a missing optional field gets its
//! documented default, and the page as a whole never fails.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use storypulse_shared::{ArchiveDay, FOLLOWERS_UNKNOWN, StoryRecord, TITLE_MISSING};

/// Parser over one day's archive page. Selectors are compiled once.
pub struct ArchivePageParser {
    story: Selector,
    author_box: Selector,
    author_link: Selector,
    reading_time: Selector,
    heading: Selector,
    claps_button: Selector,
    responses_link: Selector,
}

impl Default for ArchivePageParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchivePageParser {
    pub fn new() -> Self {
        // Selector strings are static and known-valid.
        Self {
            story: Selector::parse("div.streamItem.streamItem--postPreview.js-streamItem")
                .unwrap(),
            author_box: Selector::parse("div.postMetaInline.u-floatLeft.u-sm-maxWidthFullWidth")
                .unwrap(),
            author_link: Selector::parse("a").unwrap(),
            reading_time: Selector::parse("span.readingTime").unwrap(),
            heading: Selector::parse("h3").unwrap(),
            claps_button: Selector::parse(
                "button.button.button--chromeless.u-baseColor--buttonNormal.js-multirecommendCountButton.u-disablePointerEvents",
            )
            .unwrap(),
            responses_link: Selector::parse("a.button.button--chromeless.u-baseColor--buttonNormal")
                .unwrap(),
        }
    }

    /// Extract story records from the first `quota` story elements of
    /// `html`, in page order.
    ///
    /// The quota bounds the candidate window, not the yield: malformed
    /// entries inside the window are skipped and reduce the result.
    /// Omissions are per-entry skips, never page failures.
    pub fn parse(&self, html: &str, date: ArchiveDay, quota: usize) -> Vec<StoryRecord> {
        let doc = Html::parse_document(html);

        let mut records = Vec::new();
        for story in doc.select(&self.story).take(quota) {
            match self.extract_story(&story, date) {
                Some(record) => records.push(record),
                None => debug!(%date, "skipping malformed story entry"),
            }
        }
        records
    }

    /// Extract one story, or `None` when a required field is absent.
    ///
    /// Required: the author/metadata block, its profile link, and the
    /// reading-time attribute. Title, claps, and responses fall back to
    /// their documented defaults.
    fn extract_story(&self, story: &ElementRef<'_>, date: ArchiveDay) -> Option<StoryRecord> {
        // Without the metadata block the story cannot be attributed.
        let author_box = story.select(&self.author_box).next()?;

        let author_href = author_box
            .select(&self.author_link)
            .next()
            .and_then(|a| a.value().attr("href"))?;
        let author_name = author_handle(author_href);

        // Missing reading time marks the entry malformed; skip it.
        let reading_time_mins = author_box
            .select(&self.reading_time)
            .next()
            .and_then(|span| span.value().attr("title"))
            .and_then(|title| title.split_whitespace().next())
            .map(str::to_string)?;

        let title = story
            .select(&self.heading)
            .next()
            .map(|h| {
                element_text(&h)
                    .replace(['\n', '\t'], " ")
                    .trim()
                    .to_string()
            })
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| TITLE_MISSING.to_string());

        let claps = story
            .select(&self.claps_button)
            .next()
            .map(|b| element_text(&b).replace(',', ""))
            .unwrap_or_else(|| "0".to_string());

        let responses = story
            .select(&self.responses_link)
            .next()
            .and_then(|a| element_text(&a).split_whitespace().next().map(str::to_string))
            .unwrap_or_else(|| "0".to_string());

        Some(StoryRecord {
            date,
            title,
            claps,
            responses,
            author_name,
            followers: FOLLOWERS_UNKNOWN.to_string(),
            reading_time_mins,
        })
    }
}

/// Collect and trim an element's visible text.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Author handle: last `@`-delimited segment of the profile href, with
/// surrounding slashes stripped (`https://medium.com/@jdoe/` → `jdoe`).
fn author_handle(href: &str) -> String {
    href.rsplit('@')
        .next()
        .unwrap_or(href)
        .trim_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHOR_BOX: &str = r#"
        <div class="postMetaInline u-floatLeft u-sm-maxWidthFullWidth">
          <a href="https://medium.com/@HANDLE">Author</a>
          <span class="readingTime" title="READ min read"></span>
        </div>"#;

    fn story_html(handle: &str, read_mins: &str, title: Option<&str>, claps: Option<&str>) -> String {
        let author = AUTHOR_BOX
            .replace("HANDLE", handle)
            .replace("READ", read_mins);
        let title = title
            .map(|t| format!("<h3>{t}</h3>"))
            .unwrap_or_default();
        let claps = claps
            .map(|c| {
                format!(
                    r#"<button class="button button--chromeless u-baseColor--buttonNormal js-multirecommendCountButton u-disablePointerEvents">{c}</button>"#
                )
            })
            .unwrap_or_default();
        format!(
            r#"<div class="streamItem streamItem--postPreview js-streamItem">
                 {author}{title}{claps}
                 <a class="button button--chromeless u-baseColor--buttonNormal">8 responses</a>
               </div>"#
        )
    }

    fn day() -> ArchiveDay {
        ArchiveDay::new(2024, 2, 29)
    }

    #[test]
    fn extracts_full_story() {
        let html = story_html("jdoe", "6", Some("A Story About Rust"), Some("1.2K"));
        let parser = ArchivePageParser::new();
        let records = parser.parse(&html, day(), 20);

        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.author_name, "jdoe");
        assert_eq!(rec.reading_time_mins, "6");
        assert_eq!(rec.title, "A Story About Rust");
        assert_eq!(rec.claps, "1.2K");
        assert_eq!(rec.responses, "8");
        assert_eq!(rec.followers, "N/A");
    }

    #[test]
    fn skips_entries_without_author_box_preserving_order() {
        // 5 stories; #2 and #4 lack the metadata block entirely.
        let orphan = r#"<div class="streamItem streamItem--postPreview js-streamItem">
            <h3>Unattributable</h3></div>"#;
        let html = format!(
            "{}{orphan}{}{orphan}{}",
            story_html("first", "3", Some("One"), None),
            story_html("second", "4", Some("Three"), None),
            story_html("third", "5", Some("Five"), None),
        );

        let records = ArchivePageParser::new().parse(&html, day(), 20);
        assert_eq!(records.len(), 3);
        let authors: Vec<&str> = records.iter().map(|r| r.author_name.as_str()).collect();
        assert_eq!(authors, vec!["first", "second", "third"]);
    }

    #[test]
    fn missing_reading_time_skips_entry() {
        let html = r#"<div class="streamItem streamItem--postPreview js-streamItem">
            <div class="postMetaInline u-floatLeft u-sm-maxWidthFullWidth">
              <a href="/@jdoe">Author</a>
            </div>
            <h3>No reading time</h3></div>"#;
        let records = ArchivePageParser::new().parse(html, day(), 20);
        assert!(records.is_empty());
    }

    #[test]
    fn defaults_apply_for_optional_fields() {
        let html = story_html("jdoe", "2", None, None);
        let records = ArchivePageParser::new().parse(&html, day(), 20);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "-");
        assert_eq!(records[0].claps, "0");
    }

    #[test]
    fn title_newlines_and_tabs_normalize() {
        let html = story_html("jdoe", "2", Some("Line\none\ttwo"), None);
        let records = ArchivePageParser::new().parse(&html, day(), 20);
        assert_eq!(records[0].title, "Line one two");
    }

    #[test]
    fn claps_commas_stripped_at_parse() {
        let html = story_html("jdoe", "2", Some("T"), Some("1,234"));
        let records = ArchivePageParser::new().parse(&html, day(), 20);
        assert_eq!(records[0].claps, "1234");
    }

    #[test]
    fn quota_caps_entry_count() {
        let mut html = String::new();
        for i in 0..8 {
            html.push_str(&story_html(&format!("author{i}"), "2", Some("T"), None));
        }
        let records = ArchivePageParser::new().parse(&html, day(), 5);
        assert_eq!(records.len(), 5);
        assert_eq!(records[4].author_name, "author4");
    }

    #[test]
    fn quota_window_counts_malformed_entries() {
        // 4 entries without a metadata block, then 2 valid ones.
        let orphan = r#"<div class="streamItem streamItem--postPreview js-streamItem">
            <h3>Unattributable</h3></div>"#;
        let mut html = orphan.repeat(4);
        html.push_str(&story_html("late1", "2", Some("T"), None));
        html.push_str(&story_html("late2", "2", Some("T"), None));

        // A window covering only the malformed run yields nothing; the
        // parser must not scan past it looking for survivors.
        let records = ArchivePageParser::new().parse(&html, day(), 4);
        assert!(records.is_empty());

        // Extending the window by one admits the first valid entry.
        let records = ArchivePageParser::new().parse(&html, day(), 5);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].author_name, "late1");
    }

    #[test]
    fn author_handle_extraction() {
        assert_eq!(author_handle("https://medium.com/@jdoe"), "jdoe");
        assert_eq!(author_handle("https://medium.com/@jdoe/"), "jdoe");
        assert_eq!(author_handle("/@jdoe"), "jdoe");
    }
}
