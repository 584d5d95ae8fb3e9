//! Concurrency-bounded, idempotent metadata-ingestion scheduler.
//!
//! Drives `generate → classify → persist` across many videos in consecutive
//! groups of at most `limit` concurrent tasks, with per-item failure
//! isolation. Each video id is claimed exactly once: processed ids are never
//! revisited, and a cooldown window after each pass suppresses re-entrant
//! passes triggered by external refresh events.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use reelindex_classify::classify;
use reelindex_core::config::IngestConfig;
use reelindex_core::error::{ReelError, Result};
use reelindex_core::events::{IngestEvent, ProgressUpdate};
use reelindex_core::types::{IndexId, ProcessingStatus, VideoId, VideoProcessingRecord};

use crate::collaborators::{IndexingStatus, IngestObserver, MetadataGenerator, MetadataStore};
use crate::embedding::{EmbeddingSink, EmbeddingStorage};

/// Cooldown after a completed pass during which new passes are suppressed.
pub const DEFAULT_PASS_COOLDOWN: Duration = Duration::from_secs(2);

/// Cooldown duration taken from configuration.
pub fn cooldown_from_config(config: &IngestConfig) -> Duration {
    Duration::from_secs(config.cooldown_secs)
}

/// Metadata fields whose presence excludes a video from ingestion.
const EXISTING_METADATA_FIELDS: [&str; 6] = [
    "source",
    "sector",
    "topic_category",
    "emotions",
    "brands",
    "locations",
];

/// One video offered to a scheduling pass, with its currently known
/// metadata document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestCandidate {
    pub video_id: VideoId,
    pub index_id: IndexId,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl IngestCandidate {
    pub fn new(video_id: VideoId, index_id: IndexId) -> Self {
        Self {
            video_id,
            index_id,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// True when any excluding field is already populated with a non-empty
    /// string in the known metadata.
    fn has_existing_metadata(&self) -> bool {
        EXISTING_METADATA_FIELDS.iter().any(|field| {
            self.metadata
                .get(field)
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.is_empty())
        })
    }
}

/// Aggregate result of one scheduling pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub pass_id: Uuid,
    /// True when the pass was suppressed by the re-entrancy guard and did
    /// no work.
    pub suppressed: bool,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestSummary {
    fn suppressed(pass_id: Uuid) -> Self {
        Self {
            pass_id,
            suppressed: true,
            processed: 0,
            skipped: 0,
            failed: 0,
        }
    }
}

/// Re-entrancy gate: one running pass at a time, plus a cooldown window.
#[derive(Debug, Default)]
struct PassGate {
    running: bool,
    last_completed: Option<Instant>,
}

/// Terminal result of one in-flight ingestion item.
enum ItemOutcome {
    Persisted,
    Failed { reason: String },
}

/// Orchestrates the hashtag classifier across a set of videos under a
/// concurrency cap, tracking per-id lifecycle state.
pub struct MetadataIngestionScheduler<G, S, I, K>
where
    G: MetadataGenerator + 'static,
    S: MetadataStore + 'static,
    I: IndexingStatus + 'static,
    K: EmbeddingSink + 'static,
{
    generator: Arc<G>,
    store: Arc<S>,
    status: Arc<I>,
    embedding: Arc<EmbeddingStorage<K>>,
    observer: Arc<dyn IngestObserver>,
    cooldown: Duration,
    records: Mutex<HashMap<VideoId, VideoProcessingRecord>>,
    processed: Mutex<HashSet<VideoId>>,
    in_flight: Mutex<HashSet<VideoId>>,
    gate: Mutex<PassGate>,
}

impl<G, S, I, K> MetadataIngestionScheduler<G, S, I, K>
where
    G: MetadataGenerator + 'static,
    S: MetadataStore + 'static,
    I: IndexingStatus + 'static,
    K: EmbeddingSink + 'static,
{
    pub fn new(
        generator: Arc<G>,
        store: Arc<S>,
        status: Arc<I>,
        embedding: EmbeddingStorage<K>,
        observer: Arc<dyn IngestObserver>,
        cooldown: Duration,
    ) -> Self {
        Self {
            generator,
            store,
            status,
            embedding: Arc::new(embedding),
            observer,
            cooldown,
            records: Mutex::new(HashMap::new()),
            processed: Mutex::new(HashSet::new()),
            in_flight: Mutex::new(HashSet::new()),
            gate: Mutex::new(PassGate::default()),
        }
    }

    /// Run one pass with the limit taken from configuration.
    pub async fn run_with_config(
        &self,
        candidates: &[IngestCandidate],
        config: &IngestConfig,
    ) -> Result<IngestSummary> {
        self.run(candidates, config.concurrency_limit).await
    }

    /// Run one scheduling pass over the candidates with at most `limit`
    /// ingestion operations in flight at any instant.
    ///
    /// Returns a suppressed summary when another pass is running or the
    /// cooldown window from the previous pass has not elapsed.
    pub async fn run(&self, candidates: &[IngestCandidate], limit: usize) -> Result<IngestSummary> {
        let pass_id = Uuid::new_v4();
        if !self.try_begin_pass()? {
            debug!(pass_id = %pass_id, "Scheduling pass suppressed by re-entrancy guard");
            return Ok(IngestSummary::suppressed(pass_id));
        }

        let result = self.run_pass(pass_id, candidates, limit.max(1)).await;
        let finish = self.finish_pass();
        let summary = result?;
        finish?;
        Ok(summary)
    }

    /// Current lifecycle status of a video, if it has been observed.
    pub fn status(&self, video_id: &VideoId) -> Option<ProcessingStatus> {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.get(video_id).map(|r| r.status))
    }

    /// Snapshot of every processing record.
    pub fn records(&self) -> Vec<VideoProcessingRecord> {
        self.records
            .lock()
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn run_pass(
        &self,
        pass_id: Uuid,
        candidates: &[IngestCandidate],
        limit: usize,
    ) -> Result<IngestSummary> {
        info!(
            pass_id = %pass_id,
            candidates = candidates.len(),
            limit,
            "Starting ingestion pass"
        );

        let mut processed = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        // Eligibility is evaluated once per pass per id.
        let mut eligible: Vec<&IngestCandidate> = Vec::new();
        for candidate in candidates {
            let video_id = &candidate.video_id;
            self.observe(video_id)?;

            if self.lock_processed()?.contains(video_id)
                || self.lock_in_flight()?.contains(video_id)
            {
                debug!(video_id = %video_id, "Already claimed or settled; passing over");
                continue;
            }

            if candidate.has_existing_metadata() {
                self.mark_skipped(pass_id, video_id, "existing metadata")?;
                skipped += 1;
                continue;
            }

            match self.status.is_indexing(video_id).await {
                Ok(true) => {
                    self.mark_skipped(pass_id, video_id, "still indexing upstream")?;
                    skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    let reason = format!("indexing status check failed: {}", e);
                    self.mark_failed(pass_id, video_id, &reason)?;
                    failed += 1;
                    continue;
                }
            }

            eligible.push(candidate);
        }

        // Consecutive groups of at most `limit` tasks; each group settles
        // fully before the next one starts.
        for group in eligible.chunks(limit) {
            let mut tasks: JoinSet<(VideoId, ItemOutcome)> = JoinSet::new();

            for candidate in group {
                if !self.claim(&candidate.video_id)? {
                    continue;
                }

                let generator = Arc::clone(&self.generator);
                let store = Arc::clone(&self.store);
                let embedding = Arc::clone(&self.embedding);
                let observer = Arc::clone(&self.observer);
                let video_id = candidate.video_id.clone();
                let index_id = candidate.index_id.clone();

                tasks.spawn(async move {
                    let outcome = process_item(
                        generator.as_ref(),
                        store.as_ref(),
                        embedding.as_ref(),
                        observer.as_ref(),
                        pass_id,
                        &video_id,
                        &index_id,
                    )
                    .await;
                    (video_id, outcome)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((video_id, ItemOutcome::Persisted)) => {
                        self.settle_processed(&video_id)?;
                        processed += 1;
                    }
                    Ok((video_id, ItemOutcome::Failed { reason })) => {
                        self.settle_failed(pass_id, &video_id, &reason)?;
                        failed += 1;
                    }
                    Err(e) => {
                        warn!(error = %e, "Ingestion task aborted before settling");
                    }
                }
            }
        }

        info!(
            pass_id = %pass_id,
            processed,
            skipped,
            failed,
            "Ingestion pass complete"
        );

        Ok(IngestSummary {
            pass_id,
            suppressed: false,
            processed,
            skipped,
            failed,
        })
    }

    fn try_begin_pass(&self) -> Result<bool> {
        let mut gate = self
            .gate
            .lock()
            .map_err(|e| ReelError::Internal(format!("pass gate lock poisoned: {}", e)))?;
        if gate.running {
            return Ok(false);
        }
        if let Some(completed) = gate.last_completed {
            if completed.elapsed() < self.cooldown {
                return Ok(false);
            }
        }
        gate.running = true;
        Ok(true)
    }

    fn finish_pass(&self) -> Result<()> {
        let mut gate = self
            .gate
            .lock()
            .map_err(|e| ReelError::Internal(format!("pass gate lock poisoned: {}", e)))?;
        gate.running = false;
        gate.last_completed = Some(Instant::now());
        Ok(())
    }

    /// Create the processing record when a video is first observed.
    fn observe(&self, video_id: &VideoId) -> Result<()> {
        let mut records = self.lock_records()?;
        records
            .entry(video_id.clone())
            .or_insert_with(|| VideoProcessingRecord::new(video_id.clone()));
        Ok(())
    }

    /// Atomically claim a video id for processing. Returns false if some
    /// other operation already holds the claim.
    fn claim(&self, video_id: &VideoId) -> Result<bool> {
        {
            let mut in_flight = self.lock_in_flight()?;
            if !in_flight.insert(video_id.clone()) {
                return Ok(false);
            }
        }
        self.transition(video_id, ProcessingStatus::Processing)?;
        debug!(video_id = %video_id, "Claimed for ingestion");
        Ok(true)
    }

    fn settle_processed(&self, video_id: &VideoId) -> Result<()> {
        self.lock_in_flight()?.remove(video_id);
        self.lock_processed()?.insert(video_id.clone());
        self.transition(video_id, ProcessingStatus::Processed)
    }

    /// Failed ids leave the in-flight set but are not added to the
    /// processed set: they become eligible again on the next pass.
    fn settle_failed(&self, pass_id: Uuid, video_id: &VideoId, reason: &str) -> Result<()> {
        warn!(video_id = %video_id, reason, "Ingestion item failed");
        self.lock_in_flight()?.remove(video_id);
        self.transition(video_id, ProcessingStatus::Failed)?;
        self.observer.on_progress(ProgressUpdate::new(
            pass_id,
            IngestEvent::VideoFailed {
                video_id: video_id.clone(),
                reason: reason.to_string(),
            },
        ));
        Ok(())
    }

    fn mark_skipped(&self, pass_id: Uuid, video_id: &VideoId, reason: &str) -> Result<()> {
        debug!(video_id = %video_id, reason, "Excluded by eligibility predicate");
        self.lock_processed()?.insert(video_id.clone());
        self.transition(video_id, ProcessingStatus::SkippedHasMetadata)?;
        self.observer.on_progress(ProgressUpdate::new(
            pass_id,
            IngestEvent::VideoSkipped {
                video_id: video_id.clone(),
                reason: reason.to_string(),
            },
        ));
        Ok(())
    }

    fn mark_failed(&self, pass_id: Uuid, video_id: &VideoId, reason: &str) -> Result<()> {
        warn!(video_id = %video_id, reason, "Excluding candidate after collaborator error");
        self.transition(video_id, ProcessingStatus::Failed)?;
        self.observer.on_progress(ProgressUpdate::new(
            pass_id,
            IngestEvent::VideoFailed {
                video_id: video_id.clone(),
                reason: reason.to_string(),
            },
        ));
        Ok(())
    }

    fn transition(&self, video_id: &VideoId, status: ProcessingStatus) -> Result<()> {
        let mut records = self.lock_records()?;
        records
            .entry(video_id.clone())
            .or_insert_with(|| VideoProcessingRecord::new(video_id.clone()))
            .transition(status);
        Ok(())
    }

    fn lock_records(&self) -> Result<MutexGuard<'_, HashMap<VideoId, VideoProcessingRecord>>> {
        self.records
            .lock()
            .map_err(|e| ReelError::Internal(format!("records lock poisoned: {}", e)))
    }

    fn lock_processed(&self) -> Result<MutexGuard<'_, HashSet<VideoId>>> {
        self.processed
            .lock()
            .map_err(|e| ReelError::Internal(format!("processed set lock poisoned: {}", e)))
    }

    fn lock_in_flight(&self) -> Result<MutexGuard<'_, HashSet<VideoId>>> {
        self.in_flight
            .lock()
            .map_err(|e| ReelError::Internal(format!("in-flight set lock poisoned: {}", e)))
    }
}

/// One ingestion item: generate, classify, persist, then the downstream
/// embedding-storage step. Single attempt, fail-fast; retries exist only
/// inside the embedding step.
async fn process_item<G, S, K>(
    generator: &G,
    store: &S,
    embedding: &EmbeddingStorage<K>,
    observer: &dyn IngestObserver,
    pass_id: Uuid,
    video_id: &VideoId,
    index_id: &IndexId,
) -> ItemOutcome
where
    G: MetadataGenerator,
    S: MetadataStore,
    K: EmbeddingSink,
{
    let text = match generator.generate(video_id).await {
        Ok(text) => text,
        Err(e) => {
            return ItemOutcome::Failed {
                reason: format!("metadata generation failed: {}", e),
            }
        }
    };
    if text.trim().is_empty() {
        return ItemOutcome::Failed {
            reason: "generator returned empty hashtag text".to_string(),
        };
    }

    let metadata = classify(&text);

    match store.persist(video_id, index_id, &metadata).await {
        Ok(true) => {}
        Ok(false) => {
            return ItemOutcome::Failed {
                reason: "metadata store rejected the write".to_string(),
            }
        }
        Err(e) => {
            return ItemOutcome::Failed {
                reason: format!("metadata persistence failed: {}", e),
            }
        }
    }

    info!(
        video_id = %video_id,
        categories = metadata.category_count(),
        "Metadata persisted"
    );
    observer.on_progress(ProgressUpdate::new(
        pass_id,
        IngestEvent::MetadataPersisted {
            video_id: video_id.clone(),
            category_count: metadata.category_count(),
        },
    ));

    let outcome = embedding
        .store_video(generator, video_id, index_id, &metadata)
        .await;
    if outcome.success {
        observer.on_progress(ProgressUpdate::new(
            pass_id,
            IngestEvent::EmbeddingStored {
                video_id: video_id.clone(),
                attempts: outcome.attempts,
            },
        ));
    } else {
        observer.on_progress(ProgressUpdate::new(
            pass_id,
            IngestEvent::EmbeddingStoreFailed {
                video_id: video_id.clone(),
                attempts: outcome.attempts,
                message: outcome.message,
            },
        ));
    }

    ItemOutcome::Persisted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{
        CollectingObserver, MockGenerator, MockIndexingStatus, MockMetadataStore,
    };
    use crate::embedding::{MockSink, RetryPolicy};
    use serde_json::json;

    struct Harness {
        generator: Arc<MockGenerator>,
        store: Arc<MockMetadataStore>,
        status: Arc<MockIndexingStatus>,
        observer: Arc<CollectingObserver>,
        scheduler:
            MetadataIngestionScheduler<MockGenerator, MockMetadataStore, MockIndexingStatus, MockSink>,
    }

    fn make_harness(cooldown: Duration) -> Harness {
        make_harness_with(cooldown, MockGenerator::new(), MockSink::new())
    }

    fn make_harness_with(cooldown: Duration, generator: MockGenerator, sink: MockSink) -> Harness {
        let generator = Arc::new(generator);
        let store = Arc::new(MockMetadataStore::new());
        let status = Arc::new(MockIndexingStatus::new());
        let observer = Arc::new(CollectingObserver::new());
        let embedding = EmbeddingStorage::new(
            sink,
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::ZERO,
            },
        );
        let scheduler = MetadataIngestionScheduler::new(
            Arc::clone(&generator),
            Arc::clone(&store),
            Arc::clone(&status),
            embedding,
            Arc::clone(&observer) as Arc<dyn IngestObserver>,
            cooldown,
        );
        Harness {
            generator,
            store,
            status,
            observer,
            scheduler,
        }
    }

    fn candidates(ids: &[&str]) -> Vec<IngestCandidate> {
        ids.iter()
            .map(|id| IngestCandidate::new(VideoId::new(*id), IndexId::new("idx")))
            .collect()
    }

    fn persisted_events(observer: &CollectingObserver) -> Vec<VideoId> {
        observer
            .updates()
            .into_iter()
            .filter_map(|u| match u.event {
                IngestEvent::MetadataPersisted { video_id, .. } => Some(video_id),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_run_processes_all_candidates() {
        let h = make_harness(Duration::ZERO);
        let videos = candidates(&["v1", "v2", "v3"]);

        let summary = h.scheduler.run(&videos, 2).await.unwrap();
        assert!(!summary.suppressed);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.failed, 0);

        for id in ["v1", "v2", "v3"] {
            let video_id = VideoId::new(id);
            assert_eq!(
                h.scheduler.status(&video_id),
                Some(ProcessingStatus::Processed)
            );
            assert_eq!(h.store.persist_count(&video_id), 1);
        }
        assert_eq!(persisted_events(&h.observer).len(), 3);
    }

    #[tokio::test]
    async fn test_classified_metadata_is_persisted() {
        let h = make_harness(Duration::ZERO);
        let video_id = VideoId::new("v1");
        h.generator
            .script(&video_id, "#male #tech #exciting #newyork #adidas");

        h.scheduler.run(&candidates(&["v1"]), 10).await.unwrap();

        let meta = h.store.persisted_metadata(&video_id).unwrap();
        assert_eq!(meta.demographics, "male");
        assert_eq!(meta.sector, "tech");
        assert_eq!(meta.emotions, "exciting");
        assert_eq!(meta.locations, "newyork");
        assert_eq!(meta.brands, "adidas");
    }

    #[tokio::test]
    async fn test_existing_metadata_is_skipped_and_never_generated() {
        let h = make_harness(Duration::ZERO);
        let mut videos = candidates(&["v1", "v2"]);
        videos[0] = videos[0].clone().with_metadata(json!({"sector": "tech"}));

        let summary = h.scheduler.run(&videos, 10).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 1);

        let skipped = VideoId::new("v1");
        assert_eq!(
            h.scheduler.status(&skipped),
            Some(ProcessingStatus::SkippedHasMetadata)
        );
        assert!(!h.generator.calls().contains(&skipped));
        assert_eq!(h.store.persist_count(&skipped), 0);
    }

    #[tokio::test]
    async fn test_topic_category_field_also_excludes() {
        let h = make_harness(Duration::ZERO);
        let videos = vec![IngestCandidate::new(VideoId::new("v1"), IndexId::new("idx"))
            .with_metadata(json!({"topic_category": "sports"}))];

        let summary = h.scheduler.run(&videos, 10).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(h.generator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_metadata_fields_do_not_exclude() {
        let h = make_harness(Duration::ZERO);
        let videos = vec![IngestCandidate::new(VideoId::new("v1"), IndexId::new("idx"))
            .with_metadata(json!({"sector": "", "emotions": ""}))];

        let summary = h.scheduler.run(&videos, 10).await.unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn test_indexing_videos_are_skipped() {
        let h = make_harness(Duration::ZERO);
        let indexing = VideoId::new("v1");
        h.status.mark_indexing(&indexing);

        let summary = h.scheduler.run(&candidates(&["v1", "v2"]), 10).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(
            h.scheduler.status(&indexing),
            Some(ProcessingStatus::SkippedHasMetadata)
        );
        assert!(!h.generator.calls().contains(&indexing));
    }

    #[tokio::test]
    async fn test_failures_are_isolated_from_siblings() {
        let h = make_harness(Duration::ZERO);
        h.generator.fail(&VideoId::new("v1"));
        h.store.reject(&VideoId::new("v2"));

        let summary = h
            .scheduler
            .run(&candidates(&["v1", "v2", "v3"]), 10)
            .await
            .unwrap();
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.processed, 1);

        assert_eq!(
            h.scheduler.status(&VideoId::new("v1")),
            Some(ProcessingStatus::Failed)
        );
        assert_eq!(
            h.scheduler.status(&VideoId::new("v2")),
            Some(ProcessingStatus::Failed)
        );
        assert_eq!(
            h.scheduler.status(&VideoId::new("v3")),
            Some(ProcessingStatus::Processed)
        );
        // The failed generation never reached the store.
        assert_eq!(h.store.persist_count(&VideoId::new("v1")), 0);
    }

    #[tokio::test]
    async fn test_empty_hashtag_text_fails_the_item() {
        let h = make_harness(Duration::ZERO);
        let video_id = VideoId::new("v1");
        h.generator.script(&video_id, "   ");

        let summary = h.scheduler.run(&candidates(&["v1"]), 10).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert_eq!(h.scheduler.status(&video_id), Some(ProcessingStatus::Failed));
        assert_eq!(h.store.persist_count(&video_id), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_limit() {
        let h = make_harness_with(
            Duration::ZERO,
            MockGenerator::with_delay(Duration::from_millis(20)),
            MockSink::new(),
        );
        let ids: Vec<String> = (0..12).map(|i| format!("v{}", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let summary = h.scheduler.run(&candidates(&id_refs), 3).await.unwrap();
        assert_eq!(summary.processed, 12);
        assert_eq!(h.generator.calls().len(), 12);
        assert!(
            h.generator.peak_concurrency() <= 3,
            "peak concurrency {} exceeded limit",
            h.generator.peak_concurrency()
        );
    }

    #[tokio::test]
    async fn test_processed_ids_are_never_revisited() {
        let h = make_harness(Duration::ZERO);
        let videos = candidates(&["v1", "v2"]);

        let first = h.scheduler.run(&videos, 10).await.unwrap();
        assert_eq!(first.processed, 2);
        let calls_after_first = h.generator.calls().len();

        let second = h.scheduler.run(&videos, 10).await.unwrap();
        assert!(!second.suppressed);
        assert_eq!(second.processed, 0);
        assert_eq!(second.skipped, 0);
        assert_eq!(h.generator.calls().len(), calls_after_first);
        assert_eq!(h.store.persist_count(&VideoId::new("v1")), 1);
    }

    #[tokio::test]
    async fn test_failed_ids_become_eligible_again() {
        let h = make_harness(Duration::ZERO);
        let video_id = VideoId::new("v1");
        h.generator.fail(&video_id);

        let first = h.scheduler.run(&candidates(&["v1"]), 10).await.unwrap();
        assert_eq!(first.failed, 1);

        h.generator.clear_failures();
        let second = h.scheduler.run(&candidates(&["v1"]), 10).await.unwrap();
        assert_eq!(second.processed, 1);
        assert_eq!(h.scheduler.status(&video_id), Some(ProcessingStatus::Processed));
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_immediate_second_pass() {
        let h = make_harness(Duration::from_secs(60));
        let videos = candidates(&["v1"]);

        let first = h.scheduler.run(&videos, 10).await.unwrap();
        assert!(!first.suppressed);
        assert_eq!(first.processed, 1);

        let second = h.scheduler.run(&videos, 10).await.unwrap();
        assert!(second.suppressed);
        assert_eq!(second.processed, 0);
    }

    #[tokio::test]
    async fn test_embedding_retry_reports_attempts() {
        let h = make_harness_with(
            Duration::ZERO,
            MockGenerator::new(),
            MockSink::failing_times(2),
        );

        let summary = h.scheduler.run(&candidates(&["v1"]), 10).await.unwrap();
        assert_eq!(summary.processed, 1);

        let stored_attempts: Vec<u32> = h
            .observer
            .updates()
            .into_iter()
            .filter_map(|u| match u.event {
                IngestEvent::EmbeddingStored { attempts, .. } => Some(attempts),
                _ => None,
            })
            .collect();
        assert_eq!(stored_attempts, vec![3]);
    }

    #[tokio::test]
    async fn test_embedding_exhaustion_does_not_fail_the_item() {
        let h = make_harness_with(
            Duration::ZERO,
            MockGenerator::new(),
            MockSink::failing_times(10),
        );

        let summary = h.scheduler.run(&candidates(&["v1"]), 10).await.unwrap();
        // Metadata persisted; only the downstream embedding step failed.
        assert_eq!(summary.processed, 1);
        assert_eq!(
            h.scheduler.status(&VideoId::new("v1")),
            Some(ProcessingStatus::Processed)
        );

        let failures: Vec<u32> = h
            .observer
            .updates()
            .into_iter()
            .filter_map(|u| match u.event {
                IngestEvent::EmbeddingStoreFailed { attempts, .. } => Some(attempts),
                _ => None,
            })
            .collect();
        assert_eq!(failures, vec![3]);
    }

    #[tokio::test]
    async fn test_zero_limit_is_clamped_to_one() {
        let h = make_harness(Duration::ZERO);
        let summary = h.scheduler.run(&candidates(&["v1", "v2"]), 0).await.unwrap();
        assert_eq!(summary.processed, 2);
    }

    #[tokio::test]
    async fn test_run_with_config_uses_configured_limit() {
        let h = make_harness(Duration::ZERO);
        let config = reelindex_core::config::IngestConfig::default();
        assert_eq!(cooldown_from_config(&config), Duration::from_secs(2));

        let summary = h
            .scheduler
            .run_with_config(&candidates(&["v1", "v2"]), &config)
            .await
            .unwrap();
        assert_eq!(summary.processed, 2);
    }

    #[tokio::test]
    async fn test_records_are_created_for_all_observed_videos() {
        let h = make_harness(Duration::ZERO);
        let mut videos = candidates(&["v1", "v2"]);
        videos[1] = videos[1].clone().with_metadata(json!({"brands": "nike"}));

        h.scheduler.run(&videos, 10).await.unwrap();
        let records = h.scheduler.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.status.is_settled()));
    }
}
