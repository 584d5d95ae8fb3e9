use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::VideoId;

/// Events emitted by the metadata-ingestion pipeline.
///
/// One event is emitted per completed unit of work so observers see
/// streaming progress rather than batch-level updates. Consumed by UI
/// progress widgets and the event log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum IngestEvent {
    /// The eligibility predicate excluded the video from processing.
    VideoSkipped { video_id: VideoId, reason: String },

    /// Metadata was classified and persisted for the video.
    MetadataPersisted {
        video_id: VideoId,
        category_count: usize,
    },

    /// Generation, classification, or persistence failed for the video.
    VideoFailed { video_id: VideoId, reason: String },

    /// The downstream embedding-storage step succeeded.
    EmbeddingStored { video_id: VideoId, attempts: u32 },

    /// The downstream embedding-storage step exhausted its attempts.
    EmbeddingStoreFailed {
        video_id: VideoId,
        attempts: u32,
        message: Option<String>,
    },
}

impl IngestEvent {
    /// The video this event concerns.
    pub fn video_id(&self) -> &VideoId {
        match self {
            IngestEvent::VideoSkipped { video_id, .. }
            | IngestEvent::MetadataPersisted { video_id, .. }
            | IngestEvent::VideoFailed { video_id, .. }
            | IngestEvent::EmbeddingStored { video_id, .. }
            | IngestEvent::EmbeddingStoreFailed { video_id, .. } => video_id,
        }
    }
}

/// A timestamped event delivered to ingestion observers, tagged with the
/// scheduling pass that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub pass_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: IngestEvent,
}

impl ProgressUpdate {
    pub fn new(pass_id: Uuid, event: IngestEvent) -> Self {
        Self {
            pass_id,
            timestamp: Utc::now(),
            event,
        }
    }
}
