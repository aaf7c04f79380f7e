pub const ITEM_SUMMARY_MAX_TOKENS: u32 = 300;
pub const TAG_SYNTHESIS_MAX_TOKENS: u32 = 500;

/// Content beyond this length is trimmed from the middle so the prompt
/// keeps both the introduction and the conclusion.
pub const MAX_CONTENT_CHARS: usize = 8000;
const TRUNCATION_MARKER: &str = "\n\n[... trimmed ...]\n\n";

pub const ITEM_SUMMARY_TEMPLATE: &str = r#"You summarize saved web articles for a personal reading digest.
Write 2-3 sentences capturing what the article covers and why it is worth reading.
Respond with JSON only, in this exact shape:
{"summary": "..."}

Title: {{title}}

Content:
{{content}}"#;

pub const TAG_SYNTHESIS_TEMPLATE: &str = r#"You synthesize a group of saved web articles sharing the tag "{{tag}}" into one overview for a personal reading digest.
Respond with JSON only, in this exact shape:
{"overview": "...", "keyInsights": ["...", "..."], "standout": "..."}

overview: 2-3 sentences on the common thread across the articles.
keyInsights: 2-4 short takeaways spanning the group.
standout: one sentence naming the single most worthwhile article.

Articles ({{count}}):
{{items}}"#;

/// Substitute `{{name}}` placeholders.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{{{name}}}}}"), value);
    }
    out
}

/// Cap `text` at `max_chars`, keeping a prefix and a suffix of roughly
/// equal size around a marker instead of cutting the tail off.
pub fn truncate_middle(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
    let head = keep / 2;
    let tail = keep - head;

    let prefix: String = text.chars().take(head).collect();
    let suffix_rev: Vec<char> = text.chars().rev().take(tail).collect();
    let suffix: String = suffix_rev.into_iter().rev().collect();

    format!("{prefix}{TRUNCATION_MARKER}{suffix}")
}
