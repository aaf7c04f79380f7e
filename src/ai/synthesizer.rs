use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Item, TagSynthesis};

use super::parse::parse_json_response;
use super::prompt::{fill, truncate_middle, TAG_SYNTHESIS_MAX_TOKENS, TAG_SYNTHESIS_TEMPLATE};
use super::provider::CompletionProvider;

// Per-item slice of the combined prompt; the cluster shares one budget.
const PER_ITEM_PROMPT_CHARS: usize = 1500;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    overview: String,
    #[serde(default)]
    key_insights: Vec<String>,
    #[serde(default)]
    standout: String,
}

/// Synthesize a tag cluster into one overview. Falls back to a
/// deterministic local synthesis on any generation or parse failure.
pub async fn synthesize(
    provider: &dyn CompletionProvider,
    tag: &str,
    items: &[Item],
) -> TagSynthesis {
    match try_synthesize(provider, tag, items).await {
        Ok(synthesis) => synthesis,
        Err(e) => {
            tracing::warn!(tag, error = %e, "tag synthesis failed, using fallback");
            fallback_synthesis(tag, items)
        }
    }
}

async fn try_synthesize(
    provider: &dyn CompletionProvider,
    tag: &str,
    items: &[Item],
) -> Result<TagSynthesis> {
    let listing = items
        .iter()
        .map(|item| {
            let body = item
                .content
                .as_deref()
                .or(item.summary.as_deref())
                .unwrap_or("(no content)");
            format!(
                "- {}\n{}",
                item.display_title(),
                truncate_middle(body, PER_ITEM_PROMPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = fill(
        TAG_SYNTHESIS_TEMPLATE,
        &[
            ("tag", tag),
            ("count", &items.len().to_string()),
            ("items", &listing),
        ],
    );

    let raw = provider.complete(&prompt, TAG_SYNTHESIS_MAX_TOKENS).await?;
    let parsed: SynthesisResponse = parse_json_response(&raw)
        .map_err(|e| AppError::CompletionApi(format!("malformed synthesis response: {e}")))?;

    if parsed.overview.trim().is_empty() {
        return Err(AppError::CompletionApi(
            "synthesis response had an empty overview".to_string(),
        ));
    }

    Ok(TagSynthesis {
        overview: parsed.overview,
        key_insights: parsed.key_insights,
        standout: parsed.standout,
    })
}

/// Local synthesis used when generation fails: count + tag overview,
/// first three titles as insights, first item as the standout.
pub fn fallback_synthesis(tag: &str, items: &[Item]) -> TagSynthesis {
    TagSynthesis {
        overview: format!(
            "A roundup of {} saved links tagged \"{}\".",
            items.len(),
            tag
        ),
        key_insights: items
            .iter()
            .take(3)
            .map(|item| item.display_title().to_string())
            .collect(),
        standout: items
            .first()
            .map(|item| format!("Start with \"{}\".", item.display_title()))
            .unwrap_or_default(),
    }
}
