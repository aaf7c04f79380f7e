mod engine;
mod filter;

pub use engine::{priority_score, rank_by_priority, SectionSelector, SelectionInput};
pub use filter::filter_sufficient;
