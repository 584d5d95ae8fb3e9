//! Vector store abstraction used by the similarity matcher.
//!
//! `VectorStore` is the generic contract; `DynVectorStore` is its
//! object-safe mirror so the matcher can hold a boxed store without
//! being generic itself.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use reelindex_core::error::{ReelError, Result};
use reelindex_core::types::{MatchMetadata, VectorMatch, EMBEDDING_DIM};

/// One similarity query against a named index.
#[derive(Clone, Debug)]
pub struct VectorQuery {
    pub index: String,
    pub vector: Vec<f32>,
    /// Exact-match metadata filter; all entries must hold.
    pub filter: HashMap<String, String>,
    pub top_k: usize,
    pub include_metadata: bool,
    pub include_values: bool,
}

impl VectorQuery {
    pub fn new(index: impl Into<String>, vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            index: index.into(),
            vector,
            filter: HashMap::new(),
            top_k,
            include_metadata: true,
            include_values: false,
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }

    pub fn with_values(mut self) -> Self {
        self.include_values = true;
        self
    }
}

/// Backend holding embedding vectors, queryable by similarity.
pub trait VectorStore: Send + Sync {
    fn query(
        &self,
        query: VectorQuery,
    ) -> impl std::future::Future<Output = Result<Vec<VectorMatch>>> + Send;

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Object-safe mirror of [`VectorStore`] for boxed dispatch.
pub trait DynVectorStore: Send + Sync {
    fn dyn_query(
        &self,
        query: VectorQuery,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<VectorMatch>>> + Send + '_>>;

    fn dyn_dimensions(&self) -> usize;
}

impl<T: VectorStore> DynVectorStore for T {
    fn dyn_query(
        &self,
        query: VectorQuery,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<VectorMatch>>> + Send + '_>>
    {
        Box::pin(self.query(query))
    }

    fn dyn_dimensions(&self) -> usize {
        self.dimensions()
    }
}

/// One record seeded into the in-memory mock store.
#[derive(Clone, Debug)]
pub struct MockEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: MatchMetadata,
    /// Fixed score returned for this entry when the query vector is all
    /// zeros, where cosine similarity is undefined.
    pub zero_query_score: f64,
}

/// In-memory vector store for tests: exact-match filtering, cosine
/// scoring, descending sort, top-k truncation.
pub struct MockVectorStore {
    entries: RwLock<HashMap<String, Vec<MockEntry>>>,
    query_count: AtomicUsize,
}

impl MockVectorStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            query_count: AtomicUsize::new(0),
        }
    }

    pub fn seed(&self, index: impl Into<String>, entry: MockEntry) {
        if let Ok(mut entries) = self.entries.write() {
            entries.entry(index.into()).or_default().push(entry);
        }
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    fn matches_filter(entry: &MockEntry, filter: &HashMap<String, String>) -> bool {
        filter.iter().all(|(key, value)| match key.as_str() {
            "tl_video_id" => entry
                .metadata
                .tl_video_id
                .as_deref()
                .is_some_and(|v| v == value),
            "tl_index_id" => entry
                .metadata
                .tl_index_id
                .as_deref()
                .is_some_and(|v| v == value),
            "scope" => entry.metadata.scope.as_deref().is_some_and(|v| v == value),
            _ => false,
        })
    }

    fn score(entry: &MockEntry, query: &[f32]) -> f64 {
        if query.iter().all(|v| *v == 0.0) {
            return entry.zero_query_score;
        }
        cosine_similarity(&entry.vector, query)
    }
}

impl Default for MockVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore for MockVectorStore {
    async fn query(&self, query: VectorQuery) -> Result<Vec<VectorMatch>> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        let entries = self
            .entries
            .read()
            .map_err(|e| ReelError::Internal(format!("mock store lock poisoned: {}", e)))?;

        let mut matches: Vec<VectorMatch> = entries
            .get(&query.index)
            .map(|index| {
                index
                    .iter()
                    .filter(|entry| Self::matches_filter(entry, &query.filter))
                    .map(|entry| VectorMatch {
                        id: entry.id.clone(),
                        score: Self::score(entry, &query.vector),
                        metadata: if query.include_metadata {
                            Some(entry.metadata.clone())
                        } else {
                            None
                        },
                        values: if query.include_values {
                            Some(entry.vector.clone())
                        } else {
                            None
                        },
                    })
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(query.top_k);
        Ok(matches)
    }
}

/// Mock store whose every query fails, for error-propagation tests.
pub struct FailingVectorStore;

impl VectorStore for FailingVectorStore {
    async fn query(&self, _query: VectorQuery) -> Result<Vec<VectorMatch>> {
        Err(ReelError::Upstream("vector backend unavailable".to_string()))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
