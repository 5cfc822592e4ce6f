//! Engagement-count normalization.
//!
//! Counts arrive from archive pages as free text: plain integers,
//! thousands-separated (`1,234`), or K-abbreviated (`1.2K`). Everything
//! funnels through [`parse_count`] with a fully enumerated mapping and a
//! zero fallback — this function never errors.

/// Normalize a raw engagement-count string to a non-negative integer.
///
/// Recognized forms:
/// - plain integers (`"312"` → 312)
/// - thousands separators (`"1,234"` → 1234)
/// - K suffix, either case, with an optional decimal (`"1.2K"` → 1200)
///
/// Anything unparseable, and any negative result, maps to 0.
pub fn parse_count(raw: &str) -> i64 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return 0;
    }

    let lower = cleaned.to_ascii_lowercase();
    let value = if let Some(prefix) = lower.strip_suffix('k') {
        prefix.parse::<f64>().map(|v| (v * 1000.0) as i64)
    } else {
        // Accept already-numeric floats too ("12.0"), truncating.
        lower.parse::<f64>().map(|v| v as i64)
    };

    value.unwrap_or(0).max(0)
}
