use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Item, SummarizedItem};

/// Output of the section selection engine: six mutually exclusive
/// sections, not yet summarized. The union of item ids across all
/// sections contains no duplicates.
#[derive(Debug, Clone, Default)]
pub struct SelectedSections {
    pub recently_saved: Vec<Item>,
    pub buried_treasure: Vec<Item>,
    pub this_month_last_year: Vec<Item>,
    pub tag_roundup: Option<TagCluster>,
    pub random_pick: Option<Item>,
    pub from_the_archives: Option<Item>,
    pub total_unread: usize,
}

impl SelectedSections {
    /// Count of items across all sections, for logging.
    pub fn selected_count(&self) -> usize {
        self.recently_saved.len()
            + self.buried_treasure.len()
            + self.this_month_last_year.len()
            + self.tag_roundup.as_ref().map(|c| c.items.len()).unwrap_or(0)
            + self.random_pick.iter().count()
            + self.from_the_archives.iter().count()
    }

    /// Per-section counts as plain data, for the logging layer.
    pub fn counts(&self) -> SectionCounts {
        SectionCounts {
            recently_saved: self.recently_saved.len(),
            buried_treasure: self.buried_treasure.len(),
            this_month_last_year: self.this_month_last_year.len(),
            tag_roundup: self.tag_roundup.as_ref().map(|c| c.items.len()).unwrap_or(0),
            random_pick: self.random_pick.is_some(),
            from_the_archives: self.from_the_archives.is_some(),
        }
    }
}

/// A tag shared by several selected items, before synthesis.
#[derive(Debug, Clone)]
pub struct TagCluster {
    pub tag: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SectionCounts {
    pub recently_saved: usize,
    pub buried_treasure: usize,
    pub this_month_last_year: usize,
    pub tag_roundup: usize,
    pub random_pick: bool,
    pub from_the_archives: bool,
}

/// AI synthesis of a tag cluster.
#[derive(Debug, Clone, Serialize)]
pub struct TagSynthesis {
    pub overview: String,
    pub key_insights: Vec<String>,
    pub standout: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagRoundup {
    pub tag: String,
    pub items: Vec<SummarizedItem>,
    pub synthesis: TagSynthesis,
}

#[derive(Debug, Clone, Serialize)]
pub struct DigestStats {
    pub total_unread: usize,
    pub generated_at: DateTime<Utc>,
}

/// The complete per-run output, handed to rendering and then discarded.
#[derive(Debug, Clone, Serialize)]
pub struct Digest {
    pub recently_saved: Vec<SummarizedItem>,
    pub buried_treasure: Vec<SummarizedItem>,
    pub this_month_last_year: Vec<SummarizedItem>,
    pub tag_roundup: Option<TagRoundup>,
    pub random_pick: Option<SummarizedItem>,
    pub from_the_archives: Option<SummarizedItem>,
    pub stats: DigestStats,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.recently_saved.is_empty()
            && self.buried_treasure.is_empty()
            && self.this_month_last_year.is_empty()
            && self.tag_roundup.is_none()
            && self.random_pick.is_none()
            && self.from_the_archives.is_none()
    }
}
