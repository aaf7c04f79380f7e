use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Digest, DigestStats, Item, SelectedSections, SummarizedItem, TagRoundup};

use super::parse::parse_json_response;
use super::pool::bounded_map;
use super::prompt::{
    fill, truncate_middle, ITEM_SUMMARY_MAX_TOKENS, ITEM_SUMMARY_TEMPLATE, MAX_CONTENT_CHARS,
};
use super::provider::CompletionProvider;
use super::readtime;
use super::synthesizer::synthesize;

#[derive(Debug, Deserialize)]
struct ItemSummaryResponse {
    summary: String,
}

/// Turns selected sections into a complete digest. Per-item generation
/// failures degrade to fallback text; once selection has succeeded this
/// stage always produces a digest.
pub struct DigestSummarizer {
    provider: Arc<dyn CompletionProvider>,
    concurrency: usize,
}

impl DigestSummarizer {
    pub fn new(provider: Arc<dyn CompletionProvider>, concurrency: usize) -> Self {
        Self {
            provider,
            concurrency,
        }
    }

    pub async fn summarize_sections(
        &self,
        sections: SelectedSections,
        now: DateTime<Utc>,
    ) -> Digest {
        let recently_saved = self.summarize_list(sections.recently_saved, now).await;
        let buried_treasure = self.summarize_list(sections.buried_treasure, now).await;
        let this_month_last_year = self
            .summarize_list(sections.this_month_last_year, now)
            .await;

        let tag_roundup = match sections.tag_roundup {
            Some(cluster) => {
                let synthesis =
                    synthesize(self.provider.as_ref(), &cluster.tag, &cluster.items).await;
                let items = self.summarize_list(cluster.items, now).await;
                Some(TagRoundup {
                    tag: cluster.tag,
                    items,
                    synthesis,
                })
            }
            None => None,
        };

        let random_pick = match sections.random_pick {
            Some(item) => Some(self.summarize_item(item, now).await),
            None => None,
        };
        let from_the_archives = match sections.from_the_archives {
            Some(item) => Some(self.summarize_item(item, now).await),
            None => None,
        };

        Digest {
            recently_saved,
            buried_treasure,
            this_month_last_year,
            tag_roundup,
            random_pick,
            from_the_archives,
            stats: DigestStats {
                total_unread: sections.total_unread,
                generated_at: now,
            },
        }
    }

    async fn summarize_list(&self, items: Vec<Item>, now: DateTime<Utc>) -> Vec<SummarizedItem> {
        bounded_map(items, self.concurrency, |item| {
            self.summarize_item(item, now)
        })
        .await
    }

    async fn summarize_item(&self, item: Item, now: DateTime<Utc>) -> SummarizedItem {
        let ai_summary = match self.generate_summary(&item).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(id = %item.id, error = %e, "summarization failed, using fallback");
                fallback_summary(&item)
            }
        };

        let days_ago = readtime::days_ago(item.created_at, now);
        let read_time_minutes = readtime::read_time_minutes(item.content.as_deref());

        SummarizedItem {
            item,
            ai_summary,
            days_ago,
            read_time_minutes,
        }
    }

    async fn generate_summary(&self, item: &Item) -> Result<String> {
        let body = item
            .content
            .as_deref()
            .or(item.summary.as_deref())
            .unwrap_or_default();
        if body.trim().is_empty() {
            return Err(AppError::CompletionApi("nothing to summarize".to_string()));
        }

        let text = readtime::strip_markup(body);
        let prompt = fill(
            ITEM_SUMMARY_TEMPLATE,
            &[
                ("title", item.display_title()),
                ("content", &truncate_middle(&text, MAX_CONTENT_CHARS)),
            ],
        );

        let raw = self
            .provider
            .complete(&prompt, ITEM_SUMMARY_MAX_TOKENS)
            .await?;
        let parsed: ItemSummaryResponse = parse_json_response(&raw)
            .map_err(|e| AppError::CompletionApi(format!("malformed summary response: {e}")))?;

        if parsed.summary.trim().is_empty() {
            return Err(AppError::CompletionApi(
                "summary response was empty".to_string(),
            ));
        }
        Ok(parsed.summary)
    }
}

/// Locally-derived substitute used when generation fails: the stored
/// summary, else the title, else a placeholder.
pub fn fallback_summary(item: &Item) -> String {
    if let Some(summary) = &item.summary {
        if !summary.trim().is_empty() {
            return summary.clone();
        }
    }
    if let Some(title) = &item.title {
        if !title.trim().is_empty() {
            return title.clone();
        }
    }
    "No summary available.".to_string()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::models::TagCluster;

    use super::*;

    enum StubBehavior {
        Fail,
        Respond(String),
    }

    struct StubProvider {
        behavior: StubBehavior,
    }

    #[async_trait]
    impl CompletionProvider for StubProvider {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            match &self.behavior {
                StubBehavior::Fail => Err(AppError::CompletionApi("stub outage".to_string())),
                StubBehavior::Respond(text) => Ok(text.clone()),
            }
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn item(id: &str, summary: Option<&str>, title: Option<&str>) -> Item {
        Item {
            id: id.into(),
            url: format!("https://example.com/{id}"),
            title: title.map(Into::into),
            content: Some("<p>some words here</p>".repeat(20)),
            summary: summary.map(Into::into),
            tags: vec!["x".into()],
            created_at: Utc::now() - chrono::Duration::days(3),
            archived: false,
            favourited: false,
        }
    }

    fn sections_with_everything() -> SelectedSections {
        SelectedSections {
            recently_saved: vec![item("r1", Some("stored one"), Some("Title R1"))],
            buried_treasure: vec![item("b1", None, Some("Title B1"))],
            this_month_last_year: vec![item("m1", None, None)],
            tag_roundup: Some(TagCluster {
                tag: "x".into(),
                items: vec![
                    item("t1", None, Some("Tagged One")),
                    item("t2", None, Some("Tagged Two")),
                    item("t3", None, Some("Tagged Three")),
                ],
            }),
            random_pick: Some(item("p1", Some("stored pick"), None)),
            from_the_archives: Some(item("a1", None, Some("Archive Find"))),
            total_unread: 42,
        }
    }

    #[tokio::test]
    async fn total_outage_still_produces_a_full_digest() {
        let summarizer = DigestSummarizer::new(
            Arc::new(StubProvider {
                behavior: StubBehavior::Fail,
            }),
            5,
        );
        let digest = summarizer
            .summarize_sections(sections_with_everything(), Utc::now())
            .await;

        // Fallback preference: stored summary, then title.
        assert_eq!(digest.recently_saved[0].ai_summary, "stored one");
        assert_eq!(digest.buried_treasure[0].ai_summary, "Title B1");
        assert_eq!(
            digest.random_pick.as_ref().unwrap().ai_summary,
            "stored pick"
        );
        assert_eq!(
            digest.from_the_archives.as_ref().unwrap().ai_summary,
            "Archive Find"
        );

        let roundup = digest.tag_roundup.as_ref().unwrap();
        assert!(roundup.items.iter().all(|i| !i.ai_summary.is_empty()));
        assert!(roundup.synthesis.overview.contains("\"x\""));
        assert_eq!(roundup.synthesis.key_insights.len(), 3);

        assert_eq!(digest.stats.total_unread, 42);
    }

    #[tokio::test]
    async fn fenced_response_is_parsed() {
        let summarizer = DigestSummarizer::new(
            Arc::new(StubProvider {
                behavior: StubBehavior::Respond(
                    "```json\n{\"summary\": \"Crisp take.\"}\n```".to_string(),
                ),
            }),
            5,
        );
        let digest = summarizer
            .summarize_sections(
                SelectedSections {
                    recently_saved: vec![item("r1", None, Some("T"))],
                    total_unread: 1,
                    ..Default::default()
                },
                Utc::now(),
            )
            .await;

        assert_eq!(digest.recently_saved[0].ai_summary, "Crisp take.");
    }

    #[tokio::test]
    async fn non_json_response_falls_back() {
        let summarizer = DigestSummarizer::new(
            Arc::new(StubProvider {
                behavior: StubBehavior::Respond("Sure, happy to help!".to_string()),
            }),
            5,
        );
        let digest = summarizer
            .summarize_sections(
                SelectedSections {
                    recently_saved: vec![item("r1", Some("stored"), None)],
                    total_unread: 1,
                    ..Default::default()
                },
                Utc::now(),
            )
            .await;

        assert_eq!(digest.recently_saved[0].ai_summary, "stored");
    }

    #[tokio::test]
    async fn enrichment_fields_are_derived() {
        let summarizer = DigestSummarizer::new(
            Arc::new(StubProvider {
                behavior: StubBehavior::Fail,
            }),
            5,
        );
        let digest = summarizer
            .summarize_sections(
                SelectedSections {
                    recently_saved: vec![item("r1", Some("s"), None)],
                    total_unread: 1,
                    ..Default::default()
                },
                Utc::now(),
            )
            .await;

        let entry = &digest.recently_saved[0];
        assert_eq!(entry.days_ago, 3);
        assert!(entry.read_time_minutes >= 1);
    }

    #[test]
    fn fallback_prefers_summary_then_title_then_placeholder() {
        assert_eq!(
            fallback_summary(&item("a", Some("stored"), Some("Title"))),
            "stored"
        );
        assert_eq!(fallback_summary(&item("a", None, Some("Title"))), "Title");
        assert_eq!(
            fallback_summary(&item("a", Some("  "), None)),
            "No summary available."
        );
    }
}
