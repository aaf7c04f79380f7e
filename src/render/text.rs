use crate::models::{Digest, SummarizedItem, TagRoundup};

use super::item_meta;

const WRAP_WIDTH: usize = 78;

/// Render the digest as a plain-text email body.
pub fn render_text(digest: &Digest) -> String {
    let mut out = String::with_capacity(4 * 1024);

    out.push_str(&format!(
        "YOUR READING DIGEST\n{} · {} unread links waiting\n\n",
        digest.stats.generated_at.format("%-d %B %Y"),
        digest.stats.total_unread
    ));

    if digest.is_empty() {
        out.push_str("Nothing to surface this time. You're all caught up!\n");
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

    out
}

fn render_section(out: &mut String, title: &str, entries: &[SummarizedItem]) {
    if entries.is_empty() {
        return;
    }
    heading(out, title);
    for entry in entries {
        render_item(out, entry);
    }
}

fn render_item(out: &mut String, entry: &SummarizedItem) {
    out.push_str(&format!("* {}\n", entry.item.display_title()));
    out.push_str(&format!("  {}\n", entry.item.url));
    out.push_str(&textwrap::indent(
        &textwrap::fill(&entry.ai_summary, WRAP_WIDTH - 2),
        "  ",
    ));
    out.push_str(&format!("\n  ({})\n\n", item_meta(entry)));
}

fn render_roundup(out: &mut String, roundup: &TagRoundup) {
    heading(out, &format!("Tag Roundup: {}", roundup.tag));
    out.push_str(&textwrap::fill(&roundup.synthesis.overview, WRAP_WIDTH));
    out.push_str("\n\n");

    for insight in &roundup.synthesis.key_insights {
        out.push_str(&format!("- {}\n", insight));
    }
    if !roundup.synthesis.key_insights.is_empty() {
        out.push('\n');
    }
    if !roundup.synthesis.standout.is_empty() {
        out.push_str(&textwrap::fill(&roundup.synthesis.standout, WRAP_WIDTH));
        out.push_str("\n\n");
    }

    for entry in &roundup.items {
        render_item(out, entry);
    }
}

fn heading(out: &mut String, title: &str) {
    out.push_str(&format!("{}\n{}\n\n", title, "-".repeat(title.len())));
}
