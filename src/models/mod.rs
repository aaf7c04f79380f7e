mod digest;
mod item;

pub use digest::{
    Digest, DigestStats, SectionCounts, SelectedSections, TagCluster, TagRoundup, TagSynthesis,
};
pub use item::{Item, ScoredItem, SummarizedItem};
