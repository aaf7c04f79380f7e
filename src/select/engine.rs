use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::models::{Item, ScoredItem, SelectedSections, TagCluster};

/// Inputs to one selection run. All three pools are expected to be
/// pre-filtered for content sufficiency; `total_unread` carries the raw
/// unread count for the digest stats.
#[derive(Debug, Default)]
pub struct SelectionInput {
    pub unread: Vec<Item>,
    pub month_last_year: Vec<Item>,
    pub archived: Vec<Item>,
    pub total_unread: usize,
}

/// Partitions items into the six digest sections.
///
/// Sections are filled in a fixed priority order, and an item claimed by
/// one section is removed from candidacy for every later one. Sampling
/// is uniform on purpose; the engine favors variety across runs over
/// any fixed ranking.
#[derive(Debug, Clone)]
pub struct SectionSelector {
    pub section_size: usize,
    pub tag_min_items: usize,
    pub tag_item_cap: usize,
    pub recency_days: i64,
}

impl Default for SectionSelector {
    fn default() -> Self {
        Self {
            section_size: 3,
            tag_min_items: 3,
            tag_item_cap: 5,
            recency_days: 30,
        }
    }
}

impl SectionSelector {
    pub fn select<R: Rng>(
        &self,
        input: SelectionInput,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SelectedSections {
        let cutoff = now - Duration::days(self.recency_days);
        let mut used: HashSet<String> = HashSet::new();

        let recently_saved = sample_unused(
            &input.unread,
            &mut used,
            self.section_size,
            rng,
            |item| item.created_at > cutoff,
        );

        let buried_treasure = sample_unused(
            &input.unread,
            &mut used,
            self.section_size,
            rng,
            |item| item.created_at <= cutoff,
        );

        let this_month_last_year = sample_unused(
            &input.month_last_year,
            &mut used,
            self.section_size,
            rng,
            |_| true,
        );

        let tag_roundup = self.pick_tag_cluster(&input.unread, &mut used, rng);

        let random_pick = pick_one(&input.unread, &mut used, rng);
        let from_the_archives = pick_one(&input.archived, &mut used, rng);

        SelectedSections {
            recently_saved,
            buried_treasure,
            this_month_last_year,
            tag_roundup,
            random_pick,
            from_the_archives,
            total_unread: input.total_unread,
        }
    }

    /// Group still-unused items by tag and pick one qualifying tag
    /// uniformly at random. A tag qualifies with at least
    /// `tag_min_items` items; its list is capped at `tag_item_cap`.
    fn pick_tag_cluster<R: Rng>(
        &self,
        pool: &[Item],
        used: &mut HashSet<String>,
        rng: &mut R,
    ) -> Option<TagCluster> {
        let mut by_tag: HashMap<&str, Vec<&Item>> = HashMap::new();
        for item in pool.iter().filter(|i| !used.contains(&i.id)) {
            let mut seen: HashSet<&str> = HashSet::new();
            for tag in &item.tags {
                // Source tag lists may carry duplicates.
                if seen.insert(tag.as_str()) {
                    by_tag.entry(tag.as_str()).or_default().push(item);
                }
            }
        }

        let mut qualifying: Vec<&str> = by_tag
            .iter()
            .filter(|(_, items)| items.len() >= self.tag_min_items)
            .map(|(tag, _)| *tag)
            .collect();
        // Deterministic candidate order so a seeded rng reproduces runs.
        qualifying.sort_unstable();

        let tag = *qualifying.choose(rng)?;
        let mut items: Vec<Item> = by_tag
            .remove(tag)
            .unwrap_or_default()
            .into_iter()
            .take(self.tag_item_cap)
            .cloned()
            .collect();
        items.shuffle(rng);

        for item in &items {
            used.insert(item.id.clone());
        }

        Some(TagCluster {
            tag: tag.to_string(),
            items,
        })
    }
}

/// Uniform sample of up to `n` matching, still-unused items. Claims the
/// chosen ids.
fn sample_unused<R, P>(
    pool: &[Item],
    used: &mut HashSet<String>,
    n: usize,
    rng: &mut R,
    predicate: P,
) -> Vec<Item>
where
    R: Rng,
    P: Fn(&Item) -> bool,
{
    let mut candidates: Vec<&Item> = pool
        .iter()
        .filter(|item| !used.contains(&item.id) && predicate(item))
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(n);

    for item in &candidates {
        used.insert(item.id.clone());
    }
    candidates.into_iter().cloned().collect()
}

/// One still-unused item chosen uniformly at random, or `None`.
fn pick_one<R: Rng>(pool: &[Item], used: &mut HashSet<String>, rng: &mut R) -> Option<Item> {
    let candidates: Vec<&Item> = pool.iter().filter(|i| !used.contains(&i.id)).collect();
    let chosen = candidates.choose(rng)?;
    used.insert(chosen.id.clone());
    Some((*chosen).clone())
}

/// Priority score for the historical top-N selection mode: older items
/// score higher, matching priority tags and substantial content add
/// fixed bonuses.
#[allow(dead_code)]
pub fn priority_score(item: &Item, now: DateTime<Utc>, priority_tags: &[String]) -> f64 {
    let age_days = (now - item.created_at).num_days().max(0) as f64;
    let mut score = (age_days + 1.0).ln() * 10.0;

    if item
        .tags
        .iter()
        .any(|tag| priority_tags.iter().any(|p| p.eq_ignore_ascii_case(tag)))
    {
        score += 20.0;
    }

    let len = item.content_len();
    if len > 500 {
        score += 5.0;
    }
    if len > 2000 {
        score += 3.0;
    }

    score
}

/// Rank items by descending priority score.
#[allow(dead_code)]
pub fn rank_by_priority(
    items: Vec<Item>,
    now: DateTime<Utc>,
    priority_tags: &[String],
) -> Vec<ScoredItem> {
    let mut scored: Vec<ScoredItem> = items
        .into_iter()
        .map(|item| {
            let score = priority_score(&item, now, priority_tags);
            ScoredItem { item, score }
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}
