use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

const WORDS_PER_MINUTE: u32 = 238;
const MAX_READ_TIME_MINUTES: u32 = 90;

static TAG_RE: OnceLock<Regex> = OnceLock::new();

/// Replace markup tags with spaces so word boundaries survive.
pub fn strip_markup(content: &str) -> String {
    let re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
    re.replace_all(content, " ").into_owned()
}

pub fn word_count(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Estimated reading time in whole minutes, clamped to [1, 90]. Items
/// without content read as 1 minute.
pub fn read_time_minutes(content: Option<&str>) -> u32 {
    let words = match content {
        Some(c) if !c.trim().is_empty() => word_count(&strip_markup(c)),
        _ => return 1,
    };
    words
        .div_ceil(WORDS_PER_MINUTE)
        .clamp(1, MAX_READ_TIME_MINUTES)
}

/// Whole days between `created_at` and `now`, never negative.
pub fn days_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    (now - created_at).num_days().max(0) as u32
}
