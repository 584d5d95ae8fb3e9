//! Metadata ingestion for reelindex.
//!
//! Wires the hashtag classifier to video collaborators: a scheduler claims
//! eligible videos, generates and persists classified metadata under a
//! concurrency cap, and hands each persisted video to the embedding-storage
//! step.

pub mod collaborators;
pub mod embedding;
pub mod scheduler;

pub use collaborators::{
    IndexingStatus, IngestObserver, MetadataGenerator, MetadataStore, NoopObserver,
};
pub use embedding::{EmbeddingSink, EmbeddingStorage, RetryPolicy, StoreOutcome, StoreReceipt};
pub use scheduler::{
    cooldown_from_config, IngestCandidate, IngestSummary, MetadataIngestionScheduler,
    DEFAULT_PASS_COOLDOWN,
};
