mod html;
mod text;

pub use html::render_html;
pub use text::render_text;

use crate::models::SummarizedItem;

/// "saved 12 days ago · 4 min read", shared by both renderings.
fn item_meta(entry: &SummarizedItem) -> String {
    let saved = match entry.days_ago {
        0 => "saved today".to_string(),
        1 => "saved yesterday".to_string(),
        n => format!("saved {n} days ago"),
    };
    format!("{saved} · {} min read", entry.read_time_minutes)
}
