use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed dimensionality of the vector store in this deployment.
pub const EMBEDDING_DIM: usize = 1024;

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Identifier of a video on the hosting platform.
///
/// These are opaque platform-assigned strings, not UUIDs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an index on the hosting platform.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexId(pub String);

impl IndexId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for IndexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Classified Metadata
// =============================================================================

/// Categorical metadata derived from model-produced hashtags.
///
/// Exactly six fixed keys. Each value is either empty or a comma-and-space
/// joined ordered list of tokens. A token assigned to one category never
/// appears in another category for the same input. `source` is always empty
/// from the classifier; it is reserved for an external enrichment step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedMetadata {
    pub source: String,
    pub sector: String,
    pub emotions: String,
    pub brands: String,
    pub locations: String,
    pub demographics: String,
}

impl ClassifiedMetadata {
    /// True when every field is empty.
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
            && self.sector.is_empty()
            && self.emotions.is_empty()
            && self.brands.is_empty()
            && self.locations.is_empty()
            && self.demographics.is_empty()
    }

    /// Number of populated categories among the five classifier-owned keys.
    pub fn category_count(&self) -> usize {
        [
            &self.sector,
            &self.emotions,
            &self.brands,
            &self.locations,
            &self.demographics,
        ]
        .iter()
        .filter(|v| !v.is_empty())
        .count()
    }
}

// =============================================================================
// Ingestion Lifecycle
// =============================================================================

/// Lifecycle state of a video within the metadata-ingestion pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Observed but not yet scheduled.
    NotStarted,
    /// Claimed by a running ingestion group.
    Processing,
    /// Metadata generated, classified, and persisted.
    Processed,
    /// Excluded by the eligibility predicate (existing metadata or
    /// still indexing upstream).
    SkippedHasMetadata,
    /// Generation, classification, or persistence failed. Not terminal
    /// across passes: failed ids become eligible again.
    Failed,
}

impl ProcessingStatus {
    /// True once the current pass can take no further action on the id.
    pub fn is_settled(&self) -> bool {
        !matches!(
            self,
            ProcessingStatus::NotStarted | ProcessingStatus::Processing
        )
    }
}

/// Per-video processing record owned by the ingestion scheduler.
///
/// Created when a video is first observed. Records are only ever
/// transitioned, never deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoProcessingRecord {
    pub video_id: VideoId,
    pub status: ProcessingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoProcessingRecord {
    pub fn new(video_id: VideoId) -> Self {
        let now = Utc::now();
        Self {
            video_id,
            status: ProcessingStatus::NotStarted,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, refreshing the update timestamp.
    pub fn transition(&mut self, status: ProcessingStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// Vector Matches
// =============================================================================

/// Metadata stored alongside a vector, linking it back to its owning
/// video and index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetadata {
    pub tl_video_id: Option<String>,
    pub tl_index_id: Option<String>,
    pub scope: Option<String>,
}

/// A single result returned by the vector-store collaborator.
///
/// `score` is an orderable real number; higher means more similar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f64,
    /// Absent when the query did not ask for metadata.
    pub metadata: Option<MatchMetadata>,
    pub values: Option<Vec<f32>>,
}

/// Granularity of the embeddings behind a similarity result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Derived from clip-level (sub-segment) embeddings.
    Clip,
}

/// The deduplicated, ranked verdict for one target video.
///
/// Derived by the similarity matcher; never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarMatch {
    pub video_id: VideoId,
    pub score: f64,
    pub kind: MatchKind,
    pub metadata: MatchMetadata,
}

// =============================================================================
// Tests
// =============================================================================
