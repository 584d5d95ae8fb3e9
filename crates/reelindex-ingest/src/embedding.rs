//! Embedding-storage step with bounded linear-backoff retry.
//!
//! Runs after a video's metadata persists successfully: fetches the video's
//! clip embedding segments, pools them into a single vector, and upserts it
//! into the vector store. The step reports a structured [`StoreOutcome`]
//! instead of erroring so the scheduler can record partial failure without
//! exception-based control flow.

use std::time::Duration;

use reelindex_core::config::EmbeddingConfig;
use reelindex_core::error::{ReelError, Result};
use reelindex_core::types::{ClassifiedMetadata, IndexId, VideoId};
use tracing::{debug, warn};

use crate::collaborators::MetadataGenerator;

/// Raw response from the embedding sink for a single upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreReceipt {
    pub success: bool,
    pub message: Option<String>,
}

impl StoreReceipt {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// Final result of the embedding-storage step after retries.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOutcome {
    pub success: bool,
    /// Attempts made against the sink. Zero when the step failed before
    /// reaching the sink (missing or malformed embedding data).
    pub attempts: u32,
    pub message: Option<String>,
}

impl StoreOutcome {
    fn succeeded(attempts: u32) -> Self {
        Self {
            success: true,
            attempts,
            message: None,
        }
    }

    fn failed(attempts: u32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            attempts,
            message: Some(message.into()),
        }
    }
}

/// Destination for video embeddings (the vector store's upsert surface).
pub trait EmbeddingSink: Send + Sync {
    fn store(
        &self,
        video_id: &VideoId,
        index_id: &IndexId,
        embedding: &[f32],
        metadata: &ClassifiedMetadata,
    ) -> impl std::future::Future<Output = Result<StoreReceipt>> + Send;
}

/// Bounded retry with linearly increasing delay: attempt `n` (1-based)
/// waits `n * base_delay` before the next try.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            max_attempts: config.max_store_attempts.max(1),
            base_delay: Duration::from_millis(config.store_base_delay_ms),
        }
    }
}

/// The embedding-storage step: fetch, pool, upsert with retry.
pub struct EmbeddingStorage<K: EmbeddingSink> {
    sink: K,
    policy: RetryPolicy,
}

impl<K: EmbeddingSink> EmbeddingStorage<K> {
    pub fn new(sink: K, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    pub fn with_defaults(sink: K) -> Self {
        Self::new(sink, RetryPolicy::default())
    }

    /// Store the pooled clip embedding for a video. Never errors: every
    /// failure mode is captured in the returned outcome.
    pub async fn store_video<G: MetadataGenerator>(
        &self,
        generator: &G,
        video_id: &VideoId,
        index_id: &IndexId,
        metadata: &ClassifiedMetadata,
    ) -> StoreOutcome {
        let segments = match generator.clip_embeddings(video_id).await {
            Ok(segments) => segments,
            Err(e) => return StoreOutcome::failed(0, format!("embedding fetch failed: {}", e)),
        };

        let pooled = match mean_pool(&segments) {
            Ok(pooled) => pooled,
            Err(e) => return StoreOutcome::failed(0, e.to_string()),
        };

        let mut last_message = None;
        for attempt in 1..=self.policy.max_attempts {
            match self.sink.store(video_id, index_id, &pooled, metadata).await {
                Ok(receipt) if receipt.success => {
                    debug!(video_id = %video_id, attempt, "Embedding stored");
                    return StoreOutcome::succeeded(attempt);
                }
                Ok(receipt) => {
                    last_message = receipt
                        .message
                        .or_else(|| Some("embedding store rejected the upsert".to_string()));
                }
                Err(e) => {
                    last_message = Some(e.to_string());
                }
            }

            if attempt < self.policy.max_attempts {
                let delay = self.policy.base_delay * attempt;
                warn!(
                    video_id = %video_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Embedding store attempt failed; retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }

        warn!(
            video_id = %video_id,
            attempts = self.policy.max_attempts,
            "Embedding store exhausted all attempts"
        );
        StoreOutcome::failed(
            self.policy.max_attempts,
            last_message.unwrap_or_else(|| "embedding store failed".to_string()),
        )
    }
}

/// Pool clip segments into a single video-level vector by element-wise mean.
///
/// All segments must share one dimensionality; empty or ragged input is a
/// data-shape failure.
fn mean_pool(segments: &[Vec<f32>]) -> Result<Vec<f32>> {
    let Some(first) = segments.first() else {
        return Err(ReelError::DataShape(
            "no embedding segments returned for video".to_string(),
        ));
    };
    if first.is_empty() {
        return Err(ReelError::DataShape(
            "embedding segment has zero dimensions".to_string(),
        ));
    }

    let dim = first.len();
    let mut pooled = vec![0.0f32; dim];
    for segment in segments {
        if segment.len() != dim {
            return Err(ReelError::DataShape(format!(
                "ragged embedding segments: expected {} dimensions, got {}",
                dim,
                segment.len()
            )));
        }
        for (acc, value) in pooled.iter_mut().zip(segment) {
            *acc += value;
        }
    }

    let count = segments.len() as f32;
    for value in &mut pooled {
        *value /= count;
    }
    Ok(pooled)
}

// ---------------------------------------------------------------------------
// MockSink - scripted failures for testing the retry policy
// ---------------------------------------------------------------------------

/// Mock sink that fails a fixed number of initial calls, then succeeds.
#[derive(Debug, Default)]
pub struct MockSink {
    fail_first: u32,
    reject_instead_of_error: bool,
    calls: std::sync::atomic::AtomicU32,
    stored: std::sync::Mutex<Vec<(VideoId, Vec<f32>)>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` calls with an upstream error.
    pub fn failing_times(n: u32) -> Self {
        Self {
            fail_first: n,
            ..Default::default()
        }
    }

    /// Reject (success=false) the first `n` calls instead of erroring.
    pub fn rejecting_times(n: u32) -> Self {
        Self {
            fail_first: n,
            reject_instead_of_error: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<(VideoId, Vec<f32>)> {
        self.stored.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl EmbeddingSink for MockSink {
    async fn store(
        &self,
        video_id: &VideoId,
        _index_id: &IndexId,
        embedding: &[f32],
        _metadata: &ClassifiedMetadata,
    ) -> Result<StoreReceipt> {
        let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        if call <= self.fail_first {
            if self.reject_instead_of_error {
                return Ok(StoreReceipt::rejected("upsert rejected"));
            }
            return Err(ReelError::Upstream("vector store unavailable".to_string()));
        }
        if let Ok(mut stored) = self.stored.lock() {
            stored.push((video_id.clone(), embedding.to_vec()));
        }
        Ok(StoreReceipt::ok())
    }
}
