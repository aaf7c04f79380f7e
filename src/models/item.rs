use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One saved bookmark, as fetched from Karakeep at the start of a run.
/// Immutable for the lifetime of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub archived: bool,
    pub favourited: bool,
}

impl Item {
    /// Display title, falling back to the URL for untitled bookmarks.
    pub fn display_title(&self) -> &str {
        match &self.title {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.url,
        }
    }

    pub fn content_len(&self) -> usize {
        self.content.as_deref().map(str::len).unwrap_or(0)
    }
}

/// Item paired with a priority score. Used transiently for ranking,
/// never persisted or handed downstream.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ScoredItem {
    pub item: Item,
    pub score: f64,
}

/// Item enriched by the summarization stage.
#[derive(Debug, Clone, Serialize)]
pub struct SummarizedItem {
    #[serde(flatten)]
    pub item: Item,
    pub ai_summary: String,
    pub days_ago: u32,
    pub read_time_minutes: u32,
}
