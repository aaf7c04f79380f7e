use crate::models::{Digest, SummarizedItem, TagRoundup};

use super::item_meta;

/// Render the digest as a self-contained HTML email body.
pub fn render_html(digest: &Digest) -> String {
    let mut out = String::with_capacity(8 * 1024);

    out.push_str("<!DOCTYPE html><html><body style=\"font-family: Georgia, serif; max-width: 640px; margin: 0 auto; padding: 16px; color: #222;\">\n");
    out.push_str(&format!(
        "<h1 style=\"font-size: 22px;\">Your reading digest</h1>\n<p style=\"color: #666;\">{} · {} unread links waiting</p>\n",
        digest.stats.generated_at.format("%-d %B %Y"),
        digest.stats.total_unread
    ));

    if digest.is_empty() {
        out.push_str("<p>Nothing to surface this time. You're all caught up!</p>\n");
        out.push_str("</body></html>\n");
        return out;
    }

    render_section(&mut out, "Recently Saved", &digest.recently_saved);
    render_section(&mut out, "Buried Treasure", &digest.buried_treasure);
    render_section(&mut out, "This Month, Last Year", &digest.this_month_last_year);

    if let Some(roundup) = &digest.tag_roundup {
        render_roundup(&mut out, roundup);
    }

    if let Some(entry) = &digest.random_pick {
        render_section(&mut out, "Random Pick", std::slice::from_ref(entry));
    }
    if let Some(entry) = &digest.from_the_archives {
        render_section(&mut out, "From the Archives", std::slice::from_ref(entry));
    }

    out.push_str("</body></html>\n");
    out
}

fn render_section(out: &mut String, title: &str, entries: &[SummarizedItem]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!(
        "<h2 style=\"font-size: 18px; border-bottom: 1px solid #ddd; padding-bottom: 4px;\">{}</h2>\n",
        escape(title)
    ));
    for entry in entries {
        render_item(out, entry);
    }
}

fn render_item(out: &mut String, entry: &SummarizedItem) {
    out.push_str("<div style=\"margin-bottom: 16px;\">\n");
    out.push_str(&format!(
        "<a href=\"{}\" style=\"font-size: 16px; color: #1a0dab;\">{}</a>\n",
        escape(&entry.item.url),
        escape(entry.item.display_title())
    ));
    out.push_str(&format!(
        "<p style=\"margin: 4px 0;\">{}</p>\n",
        escape(&entry.ai_summary)
    ));
    out.push_str(&format!(
        "<p style=\"margin: 0; font-size: 12px; color: #999;\">{}</p>\n",
        escape(&item_meta(entry))
    ));
    out.push_str("</div>\n");
}

fn render_roundup(out: &mut String, roundup: &TagRoundup) {
    out.push_str(&format!(
        "<h2 style=\"font-size: 18px; border-bottom: 1px solid #ddd; padding-bottom: 4px;\">Tag Roundup: {}</h2>\n",
        escape(&roundup.tag)
    ));
    out.push_str(&format!(
        "<p>{}</p>\n",
        escape(&roundup.synthesis.overview)
    ));

    if !roundup.synthesis.key_insights.is_empty() {
        out.push_str("<ul>\n");
        for insight in &roundup.synthesis.key_insights {
            out.push_str(&format!("<li>{}</li>\n", escape(insight)));
        }
        out.push_str("</ul>\n");
    }
    if !roundup.synthesis.standout.is_empty() {
        out.push_str(&format!(
            "<p><em>{}</em></p>\n",
            escape(&roundup.synthesis.standout)
        ));
    }

    for entry in &roundup.items {
        render_item(out, entry);
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
