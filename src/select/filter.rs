use crate::models::Item;

/// Keep only items with enough extractable text to summarize: either the
/// content body or the stored summary must reach `min_len` characters.
/// Order-preserving and side-effect free.
pub fn filter_sufficient(items: Vec<Item>, min_len: usize) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| {
            item.content_len() >= min_len
                || item.summary.as_deref().map(str::len).unwrap_or(0) >= min_len
        })
        .collect()
}
