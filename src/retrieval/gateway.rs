//! Retrieval gateway
//!
//! Single entry point from a query to supporting passages. One embedding
//! call and one nearest-neighbour call per query; no retries, no caching.
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::errors::{BridgeError, ErrorKind, Result};
use crate::providers::{Embedder, IndexHit, VectorIndex};
use crate::retrieval::types::{
    KnowledgeStats, RetrievalOutcome, RetrievedPassage, SearchParams, TopicRetrieval, MAX_TOP_K,
};

/// Converts queries into ranked supporting context
pub struct RetrievalGateway {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    default_params: SearchParams,
}

impl RetrievalGateway {
    /// Create new gateway with default parameters
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            default_params: SearchParams::default(),
        }
    }

    /// Create with custom default parameters
    pub fn with_params(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        params: SearchParams,
    ) -> Self {
        Self {
            embedder,
            index,
            default_params: params,
        }
    }

    /// Get default search parameters
    pub fn default_params(&self) -> &SearchParams {
        &self.default_params
    }

    /// Retrieve with the gateway's default parameters
    pub async fn retrieve_default(&self, query: &str) -> RetrievalOutcome {
        let params = self.default_params.clone();
        self.retrieve(query, params.top_k, params.min_score).await
    }

    /// Retrieve up to `top_k` passages scoring at least `min_score`.
    ///
    /// Never returns an error: collaborator failures become
    /// `succeeded = false` with `RetrievalUnavailable`, rejected input becomes
    /// `InvalidQuery` and nothing external is called.
    pub async fn retrieve(&self, query: &str, top_k: usize, min_score: f32) -> RetrievalOutcome {
        let started = Instant::now();
        let query = query.trim();

        let top_k = match validate_params(query, top_k, min_score) {
            Ok(k) => k,
            Err(e) => {
                debug!(error = %e, "retrieval request rejected");
                return RetrievalOutcome::failure(
                    query,
                    ErrorKind::InvalidQuery,
                    e.to_string(),
                    started.elapsed(),
                );
            }
        };

        match self.search(query, top_k).await {
            Ok(hits) => {
                let passages = rank_hits(hits, top_k, min_score);
                debug!(count = passages.len(), top_k, "retrieval complete");
                RetrievalOutcome::success(query, passages, started.elapsed())
            }
            Err(e) => {
                warn!(error = %e, "retrieval collaborator failed");
                RetrievalOutcome::failure(
                    query,
                    ErrorKind::RetrievalUnavailable,
                    e.to_string(),
                    started.elapsed(),
                )
            }
        }
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<IndexHit>> {
        let vector = self.embedder.embed(query).await?;
        self.index.search(&vector, top_k).await
    }

    /// Retrieve and combine context as a single string, empty on failure
    pub async fn retrieve_context(&self, query: &str, top_k: usize) -> String {
        let outcome = self.retrieve(query, top_k, self.default_params.min_score).await;
        outcome.combined_context
    }

    /// Retrieve passages for a topic grouped by source document
    pub async fn retrieve_by_topic(&self, topic: &str, top_k: usize) -> Result<TopicRetrieval> {
        let outcome = self.retrieve(topic, top_k, self.default_params.min_score).await;

        if !outcome.succeeded {
            let message = outcome.error.clone().unwrap_or_default();
            return Err(match outcome.error_kind {
                Some(ErrorKind::InvalidQuery) => BridgeError::InvalidInput(message),
                _ => BridgeError::VectorSearchError(message),
            });
        }

        Ok(TopicRetrieval::from_outcome(topic, &outcome))
    }

    /// All stored chunks of one source, in index order
    pub async fn search_by_source(&self, source: &str, limit: usize) -> Result<Vec<RetrievedPassage>> {
        if source.trim().is_empty() {
            return Err(BridgeError::InvalidInput("source must not be empty".to_string()));
        }

        let hits = self.index.chunks_by_source(source.trim(), limit).await?;
        Ok(hits.into_iter().map(passage_from_hit).collect())
    }

    /// Knowledge base statistics
    pub async fn statistics(&self) -> Result<KnowledgeStats> {
        Ok(KnowledgeStats {
            total_chunks: self.index.count().await?,
        })
    }
}

/// Check query and parameters; returns the effective `top_k`
fn validate_params(query: &str, top_k: usize, min_score: f32) -> Result<usize> {
    if query.is_empty() {
        return Err(BridgeError::InvalidInput("query must not be empty".to_string()));
    }
    if top_k == 0 {
        return Err(BridgeError::InvalidInput("top_k must be positive".to_string()));
    }
    if min_score.is_nan() || min_score < 0.0 {
        return Err(BridgeError::InvalidInput(format!(
            "min_score must be >= 0, got {}",
            min_score
        )));
    }
    Ok(top_k.min(MAX_TOP_K))
}

/// Filter by score and order by descending relevance.
///
/// The sort is stable, so equal scores keep the index's own order.
pub(crate) fn rank_hits(hits: Vec<IndexHit>, top_k: usize, min_score: f32) -> Vec<RetrievedPassage> {
    let mut passages: Vec<RetrievedPassage> = hits
        .into_iter()
        .filter(|hit| hit.score.is_finite() && hit.score >= min_score)
        .map(passage_from_hit)
        .collect();

    // Scores are finite here; partial_cmp treats -0.0 and 0.0 as equal
    passages.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    passages.truncate(top_k);
    passages
}

fn passage_from_hit(hit: IndexHit) -> RetrievedPassage {
    RetrievedPassage {
        text: hit.text,
        source_id: hit.source,
        relevance_score: hit.score,
        chunk_index: hit.chunk_index,
    }
}
