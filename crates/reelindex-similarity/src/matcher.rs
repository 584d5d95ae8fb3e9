//! Clip-level similarity matching between two indexed videos.
//!
//! The matcher first expands the source video into its clip vectors with a
//! zero-vector filtered query, then fans out one similarity query per clip
//! against the target index, and finally merges the per-clip results into a
//! deduplicated, descending ranking.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info};

use reelindex_core::config::SimilarityConfig;
use reelindex_core::error::{ReelError, Result};
use reelindex_core::types::{IndexId, MatchKind, SimilarMatch, VectorMatch, VideoId};

use crate::store::{DynVectorStore, VectorQuery};

/// Metadata scope tag carried by clip-level vectors.
pub const SCOPE_CLIP: &str = "clip";

/// How many clip vectors the source expansion may return.
pub const SOURCE_EXPANSION_TOP_K: usize = 100;

/// How many matches each per-clip fan-out query requests.
pub const FANOUT_TOP_K: usize = 5;

/// Finds videos in a target index similar to a source video, clip by clip.
///
/// The index holding the source video's clip vectors is fixed at
/// construction; the target index varies per call.
pub struct SimilarityMatcher {
    store: Arc<dyn DynVectorStore>,
    source_index: IndexId,
    source_top_k: usize,
    fanout_top_k: usize,
}

impl SimilarityMatcher {
    pub fn new(store: Arc<dyn DynVectorStore>, source_index: IndexId) -> Self {
        Self {
            store,
            source_index,
            source_top_k: SOURCE_EXPANSION_TOP_K,
            fanout_top_k: FANOUT_TOP_K,
        }
    }

    pub fn with_config(
        store: Arc<dyn DynVectorStore>,
        source_index: IndexId,
        config: &SimilarityConfig,
    ) -> Self {
        Self {
            store,
            source_index,
            source_top_k: config.source_top_k,
            fanout_top_k: config.fanout_top_k,
        }
    }

    /// Rank videos in `target_index` by similarity to `source_video`.
    ///
    /// Returns an empty ranking when the source has no clip vectors. Any
    /// fan-out query failure fails the whole call; partial rankings are
    /// never returned.
    pub async fn find_similar(
        &self,
        source_video: &VideoId,
        target_index: &IndexId,
    ) -> Result<Vec<SimilarMatch>> {
        if source_video.is_empty() {
            return Err(ReelError::Validation(
                "source video id must not be empty".to_string(),
            ));
        }
        if self.source_index.is_empty() || target_index.is_empty() {
            return Err(ReelError::Validation(
                "index ids must not be empty".to_string(),
            ));
        }

        let clips = self.expand_source(source_video).await?;
        if clips.is_empty() {
            debug!(video_id = %source_video, "No clip vectors found for source video");
            return Ok(Vec::new());
        }

        // Reject shape problems before spawning any fan-out work.
        let mut vectors = Vec::with_capacity(clips.len());
        for clip in &clips {
            let values = clip.values.clone().ok_or_else(|| {
                ReelError::DataShape(format!(
                    "clip vector {} returned without values",
                    clip.id
                ))
            })?;
            vectors.push(values);
        }

        let mut tasks: JoinSet<(usize, Result<Vec<VectorMatch>>)> = JoinSet::new();
        for (position, vector) in vectors.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            let index = target_index.to_string();
            let top_k = self.fanout_top_k;
            tasks.spawn(async move {
                let result = store
                    .dyn_query(
                        VectorQuery::new(index, vector, top_k).with_filter("scope", SCOPE_CLIP),
                    )
                    .await;
                (position, result)
            });
        }

        // Collect in completion order, then restore clip order so the
        // merge (and its tie-breaking) stays deterministic.
        let mut per_clip: Vec<Option<Vec<VectorMatch>>> = vec![None; clips.len()];
        let mut first_error: Option<ReelError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, Ok(matches))) => per_clip[position] = Some(matches),
                Ok((_, Err(e))) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error
                        .get_or_insert(ReelError::Internal(format!("fan-out task aborted: {}", e)));
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let merged: Vec<VectorMatch> = per_clip.into_iter().flatten().flatten().collect();
        let ranking = merge_and_rank(merged);
        info!(
            source_video = %source_video,
            clips = clips.len(),
            matches = ranking.len(),
            "Similarity matching complete"
        );
        Ok(ranking)
    }

    /// Fetch the source video's clip vectors with a zero-vector query so
    /// selection is fully filter-driven.
    async fn expand_source(&self, source_video: &VideoId) -> Result<Vec<VectorMatch>> {
        let query = VectorQuery::new(
            self.source_index.to_string(),
            vec![0.0; self.store.dyn_dimensions()],
            self.source_top_k,
        )
        .with_filter("tl_video_id", source_video.to_string())
        .with_filter("scope", SCOPE_CLIP)
        .with_values();

        self.store.dyn_query(query).await
    }
}

/// Collapse per-clip matches into one ranking: drop matches without a
/// video id, keep the best score per video (ties keep the earlier match),
/// sort descending.
fn merge_and_rank(matches: Vec<VectorMatch>) -> Vec<SimilarMatch> {
    let mut best: HashMap<String, SimilarMatch> = HashMap::new();
    for m in matches {
        let Some(metadata) = m.metadata else {
            continue;
        };
        let Some(video_id) = metadata.tl_video_id.clone() else {
            continue;
        };
        let candidate = SimilarMatch {
            video_id: VideoId::new(&video_id),
            score: m.score,
            kind: MatchKind::Clip,
            metadata,
        };
        match best.get(&video_id) {
            Some(existing) if existing.score >= candidate.score => {}
            _ => {
                best.insert(video_id, candidate);
            }
        }
    }

    let mut ranking: Vec<SimilarMatch> = best.into_values().collect();
    ranking.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranking
}
