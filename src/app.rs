use chrono::Utc;

use crate::ai::{bounded_map, provider_from_config, DigestSummarizer};
use crate::config::Config;
use crate::error::Result;
use crate::models::{Digest, Item, SelectedSections};
use crate::select::{filter_sufficient, SectionSelector, SelectionInput};
use crate::services::{KarakeepClient, ListFilter};

/// One digest run: retrieval → filter → selection → content enrichment →
/// summarization. Built once from config, used once.
pub struct DigestPipeline {
    client: KarakeepClient,
    summarizer: DigestSummarizer,
    selector: SectionSelector,
    min_content_len: usize,
    concurrency: usize,
}

impl DigestPipeline {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let client = KarakeepClient::new(
            config.karakeep_url.clone().unwrap_or_default(),
            config.karakeep_token.clone().unwrap_or_default(),
        );

        let provider = provider_from_config(config)?;
        tracing::info!(provider = provider.name(), "completion provider selected");
        let summarizer = DigestSummarizer::new(provider, config.concurrency);

        let selector = SectionSelector {
            section_size: config.section_size,
            tag_item_cap: config.tag_item_cap,
            recency_days: config.recency_days,
            ..SectionSelector::default()
        };

        Ok(Self {
            client,
            summarizer,
            selector,
            min_content_len: config.min_content_len,
            concurrency: config.concurrency,
        })
    }

    pub async fn run(&self) -> Result<Digest> {
        let now = Utc::now();

        let unread = self.client.fetch_all(&ListFilter::unread()).await?;
        let month_last_year = self
            .client
            .fetch_all(&ListFilter::same_month_last_year(now))
            .await?;
        let archived = self.client.fetch_all(&ListFilter::archived()).await?;

        let total_unread = unread.len();
        tracing::info!(
            unread = total_unread,
            month_last_year = month_last_year.len(),
            archived = archived.len(),
            "retrieved bookmarks"
        );

        let input = SelectionInput {
            unread: filter_sufficient(unread, self.min_content_len),
            month_last_year: filter_sufficient(month_last_year, self.min_content_len),
            archived: filter_sufficient(archived, self.min_content_len),
            total_unread,
        };

        let sections = self.selector.select(input, now, &mut rand::rng());
        let counts = sections.counts();
        tracing::info!(
            recently_saved = counts.recently_saved,
            buried_treasure = counts.buried_treasure,
            this_month_last_year = counts.this_month_last_year,
            tag_roundup = counts.tag_roundup,
            random_pick = counts.random_pick,
            from_the_archives = counts.from_the_archives,
            total_selected = sections.selected_count(),
            "sections selected"
        );

        let sections = self.enrich_content(sections).await;
        Ok(self.summarizer.summarize_sections(sections, now).await)
    }

    /// Best-effort refetch of full content for selected items missing
    /// it, for read-time accuracy. Failures leave items as they were.
    async fn enrich_content(&self, mut sections: SelectedSections) -> SelectedSections {
        sections.recently_saved = self.enrich_list(sections.recently_saved).await;
        sections.buried_treasure = self.enrich_list(sections.buried_treasure).await;
        sections.this_month_last_year = self.enrich_list(sections.this_month_last_year).await;
        if let Some(mut cluster) = sections.tag_roundup.take() {
            cluster.items = self.enrich_list(cluster.items).await;
            sections.tag_roundup = Some(cluster);
        }
        if let Some(item) = sections.random_pick.take() {
            sections.random_pick = Some(self.enrich_item(item).await);
        }
        if let Some(item) = sections.from_the_archives.take() {
            sections.from_the_archives = Some(self.enrich_item(item).await);
        }
        sections
    }

    async fn enrich_list(&self, items: Vec<Item>) -> Vec<Item> {
        bounded_map(items, self.concurrency, |item| self.enrich_item(item)).await
    }

    async fn enrich_item(&self, mut item: Item) -> Item {
        if needs_content(&item) {
            if let Some(content) = self.client.fetch_content(&item.id).await {
                item.content = Some(content);
            }
        }
        item
    }
}

fn needs_content(item: &Item) -> bool {
    item.content.as_deref().map(str::trim).unwrap_or("").is_empty()
}
