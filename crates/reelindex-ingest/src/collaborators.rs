//! Collaborator contracts consumed by the ingestion scheduler.
//!
//! Each trait has a deterministic mock implementation alongside it so that
//! the scheduler (and dependent crates) can be tested without the network
//! backends. Production code supplies HTTP-backed implementations.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use reelindex_core::error::{ReelError, Result};
use reelindex_core::events::ProgressUpdate;
use reelindex_core::types::{ClassifiedMetadata, IndexId, VideoId};

/// Produces raw hashtag text and clip embeddings for a video.
///
/// Backed by the video-understanding model in production. Errors are
/// upstream failures; malformed embedding payloads are data-shape failures.
pub trait MetadataGenerator: Send + Sync {
    /// Generate raw hashtag text for the video.
    fn generate(
        &self,
        video_id: &VideoId,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Fetch the video's clip embedding segments.
    fn clip_embeddings(
        &self,
        video_id: &VideoId,
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

/// Persists classified metadata for a video.
pub trait MetadataStore: Send + Sync {
    /// Persist the metadata record. Returns `false` when the backend
    /// rejects the write; expected negative outcomes never error.
    fn persist(
        &self,
        video_id: &VideoId,
        index_id: &IndexId,
        metadata: &ClassifiedMetadata,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// Reports whether a video is still being ingested upstream.
pub trait IndexingStatus: Send + Sync {
    fn is_indexing(
        &self,
        video_id: &VideoId,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// Receives one update per completed unit of ingestion work.
///
/// Invoked from scheduler worker tasks, decoupled from group boundaries,
/// so observers see streaming progress.
pub trait IngestObserver: Send + Sync {
    fn on_progress(&self, update: ProgressUpdate);
}

/// Observer that discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl IngestObserver for NoopObserver {
    fn on_progress(&self, _update: ProgressUpdate) {}
}

/// Observer that records every update for later inspection.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

impl IngestObserver for CollectingObserver {
    fn on_progress(&self, update: ProgressUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }
}

// ---------------------------------------------------------------------------
// MockGenerator - scripted hashtag text and embeddings for testing
// ---------------------------------------------------------------------------

/// Mock generator with scripted responses per video id.
///
/// Unscripted ids get a fixed default hashtag string. Tracks every call and
/// the peak number of concurrent `generate` calls, which makes the
/// scheduler's concurrency bound directly assertable.
pub struct MockGenerator {
    hashtags: Mutex<HashMap<VideoId, String>>,
    embeddings: Mutex<HashMap<VideoId, Vec<Vec<f32>>>>,
    failing: Mutex<HashSet<VideoId>>,
    calls: Mutex<Vec<VideoId>>,
    current: AtomicUsize,
    peak: AtomicUsize,
    delay: Duration,
}

impl MockGenerator {
    const DEFAULT_HASHTAGS: &'static str = "#tech #exciting";
    const DEFAULT_SEGMENT: [f32; 4] = [0.1, 0.2, 0.3, 0.4];

    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Each `generate` call holds its concurrency slot for `delay`, making
    /// overlap between workers observable.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            hashtags: Mutex::new(HashMap::new()),
            embeddings: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay,
        }
    }

    /// Script the hashtag text returned for a video.
    pub fn script(&self, video_id: &VideoId, hashtags: &str) {
        if let Ok(mut map) = self.hashtags.lock() {
            map.insert(video_id.clone(), hashtags.to_string());
        }
    }

    /// Script the clip embedding segments returned for a video.
    pub fn script_embeddings(&self, video_id: &VideoId, segments: Vec<Vec<f32>>) {
        if let Ok(mut map) = self.embeddings.lock() {
            map.insert(video_id.clone(), segments);
        }
    }

    /// Make `generate` fail for a video.
    pub fn fail(&self, video_id: &VideoId) {
        if let Ok(mut set) = self.failing.lock() {
            set.insert(video_id.clone());
        }
    }

    /// Stop failing for all videos.
    pub fn clear_failures(&self) {
        if let Ok(mut set) = self.failing.lock() {
            set.clear();
        }
    }

    /// All video ids passed to `generate`, in call order.
    pub fn calls(&self) -> Vec<VideoId> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Highest number of `generate` calls observed in flight at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataGenerator for MockGenerator {
    async fn generate(&self, video_id: &VideoId) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(video_id.clone());
        }

        let in_flight = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(in_flight, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.current.fetch_sub(1, Ordering::SeqCst);

        let failing = self
            .failing
            .lock()
            .map(|set| set.contains(video_id))
            .unwrap_or(false);
        if failing {
            return Err(ReelError::Upstream(format!(
                "generation failed for {}",
                video_id
            )));
        }

        let scripted = self
            .hashtags
            .lock()
            .ok()
            .and_then(|map| map.get(video_id).cloned());
        Ok(scripted.unwrap_or_else(|| Self::DEFAULT_HASHTAGS.to_string()))
    }

    async fn clip_embeddings(&self, video_id: &VideoId) -> Result<Vec<Vec<f32>>> {
        let scripted = self
            .embeddings
            .lock()
            .ok()
            .and_then(|map| map.get(video_id).cloned());
        Ok(scripted.unwrap_or_else(|| vec![Self::DEFAULT_SEGMENT.to_vec()]))
    }
}

// ---------------------------------------------------------------------------
// MockMetadataStore - in-memory persistence for testing
// ---------------------------------------------------------------------------

/// Mock metadata store recording every persisted record.
#[derive(Debug, Default)]
pub struct MockMetadataStore {
    persisted: Mutex<Vec<(VideoId, ClassifiedMetadata)>>,
    rejecting: Mutex<HashSet<VideoId>>,
}

impl MockMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `persist` return `false` for a video.
    pub fn reject(&self, video_id: &VideoId) {
        if let Ok(mut set) = self.rejecting.lock() {
            set.insert(video_id.clone());
        }
    }

    /// Number of persist calls recorded for a video.
    pub fn persist_count(&self, video_id: &VideoId) -> usize {
        self.persisted
            .lock()
            .map(|p| p.iter().filter(|(id, _)| id == video_id).count())
            .unwrap_or(0)
    }

    /// The metadata most recently persisted for a video.
    pub fn persisted_metadata(&self, video_id: &VideoId) -> Option<ClassifiedMetadata> {
        self.persisted.lock().ok().and_then(|p| {
            p.iter()
                .rev()
                .find(|(id, _)| id == video_id)
                .map(|(_, meta)| meta.clone())
        })
    }
}

impl MetadataStore for MockMetadataStore {
    async fn persist(
        &self,
        video_id: &VideoId,
        _index_id: &IndexId,
        metadata: &ClassifiedMetadata,
    ) -> Result<bool> {
        let rejected = self
            .rejecting
            .lock()
            .map(|set| set.contains(video_id))
            .unwrap_or(false);
        if rejected {
            return Ok(false);
        }
        if let Ok(mut persisted) = self.persisted.lock() {
            persisted.push((video_id.clone(), metadata.clone()));
        }
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// MockIndexingStatus - scripted upstream status for testing
// ---------------------------------------------------------------------------

/// Mock status collaborator: ids marked indexing report `true`.
#[derive(Debug, Default)]
pub struct MockIndexingStatus {
    indexing: Mutex<HashSet<VideoId>>,
}

impl MockIndexingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_indexing(&self, video_id: &VideoId) {
        if let Ok(mut set) = self.indexing.lock() {
            set.insert(video_id.clone());
        }
    }
}

impl IndexingStatus for MockIndexingStatus {
    async fn is_indexing(&self, video_id: &VideoId) -> Result<bool> {
        Ok(self
            .indexing
            .lock()
            .map(|set| set.contains(video_id))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_generator_defaults_and_scripts() {
        let generator = MockGenerator::new();
        let id = VideoId::new("v1");

        let text = generator.generate(&id).await.unwrap();
        assert_eq!(text, "#tech #exciting");

        generator.script(&id, "#male #adidas");
        let text = generator.generate(&id).await.unwrap();
        assert_eq!(text, "#male #adidas");

        assert_eq!(generator.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_generator_failure() {
        let generator = MockGenerator::new();
        let id = VideoId::new("v1");
        generator.fail(&id);
        assert!(generator.generate(&id).await.is_err());

        generator.clear_failures();
        assert!(generator.generate(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_store_records_and_rejects() {
        let store = MockMetadataStore::new();
        let id = VideoId::new("v1");
        let index = IndexId::new("idx");
        let meta = ClassifiedMetadata {
            sector: "tech".to_string(),
            ..Default::default()
        };

        assert!(store.persist(&id, &index, &meta).await.unwrap());
        assert_eq!(store.persist_count(&id), 1);
        assert_eq!(store.persisted_metadata(&id).unwrap().sector, "tech");

        store.reject(&id);
        assert!(!store.persist(&id, &index, &meta).await.unwrap());
        assert_eq!(store.persist_count(&id), 1);
    }

    #[tokio::test]
    async fn test_mock_indexing_status() {
        let status = MockIndexingStatus::new();
        let id = VideoId::new("v1");
        assert!(!status.is_indexing(&id).await.unwrap());
        status.mark_indexing(&id);
        assert!(status.is_indexing(&id).await.unwrap());
    }

    #[test]
    fn test_collecting_observer() {
        use reelindex_core::events::IngestEvent;
        use uuid::Uuid;

        let observer = CollectingObserver::new();
        observer.on_progress(ProgressUpdate::new(
            Uuid::new_v4(),
            IngestEvent::MetadataPersisted {
                video_id: VideoId::new("v1"),
                category_count: 3,
            },
        ));
        assert_eq!(observer.updates().len(), 1);
    }
}
