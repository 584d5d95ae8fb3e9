//! Clip-level similarity matching for reelindex.
//!
//! Expands a source video into its clip vectors, fans out one query per
//! clip against a target index, and merges the results into a single
//! deduplicated ranking.

pub mod matcher;
pub mod store;

pub use matcher::{SimilarityMatcher, FANOUT_TOP_K, SCOPE_CLIP, SOURCE_EXPANSION_TOP_K};
pub use store::{DynVectorStore, VectorQuery, VectorStore};
