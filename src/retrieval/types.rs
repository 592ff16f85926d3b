//! Retrieval data model
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ErrorKind;

/// Hard cap on candidates requested from the index
pub const MAX_TOP_K: usize = 50;

/// Separator placed between passage texts in the combined context
pub const CONTEXT_DELIMITER: &str = "\n\n";

/// Search parameters for retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of passages to return
    pub top_k: usize,
    /// Passages scoring below this are discarded
    pub min_score: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: 0.0,
        }
    }
}

/// One supporting passage, ranked by relevance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub source_id: String,
    pub relevance_score: f32,
    pub chunk_index: i64,
}

/// Result of one retrieval; never mutated after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    pub query: String,
    pub passages: Vec<RetrievedPassage>,
    pub combined_context: String,
    pub succeeded: bool,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl RetrievalOutcome {
    /// Successful retrieval; the combined context follows passage order
    pub fn success(query: &str, passages: Vec<RetrievedPassage>, elapsed: Duration) -> Self {
        let combined_context = passages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER);

        Self {
            query: query.to_string(),
            passages,
            combined_context,
            succeeded: true,
            error_kind: None,
            error: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Failed retrieval with no passages
    pub fn failure(query: &str, kind: ErrorKind, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            query: query.to_string(),
            passages: Vec::new(),
            combined_context: String::new(),
            succeeded: false,
            error_kind: Some(kind),
            error: Some(error.into()),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Whether fan-out may start from this outcome
    pub fn is_usable(&self) -> bool {
        self.succeeded && !self.passages.is_empty()
    }

    /// `(source, score)` pairs in rank order
    pub fn sources(&self) -> Vec<(&str, f32)> {
        self.passages
            .iter()
            .map(|p| (p.source_id.as_str(), p.relevance_score))
            .collect()
    }
}

/// Passages from one source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceGroup {
    pub source_id: String,
    pub passages: Vec<RetrievedPassage>,
}

/// Topic retrieval grouped by source, sources in first-appearance order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicRetrieval {
    pub topic: String,
    pub groups: Vec<SourceGroup>,
    pub total_sources: usize,
    pub total_chunks: usize,
}

impl TopicRetrieval {
    pub fn from_outcome(topic: &str, outcome: &RetrievalOutcome) -> Self {
        let mut groups: Vec<SourceGroup> = Vec::new();

        for passage in &outcome.passages {
            match groups.iter_mut().find(|g| g.source_id == passage.source_id) {
                Some(group) => group.passages.push(passage.clone()),
                None => groups.push(SourceGroup {
                    source_id: passage.source_id.clone(),
                    passages: vec![passage.clone()],
                }),
            }
        }

        Self {
            topic: topic.to_string(),
            total_sources: groups.len(),
            total_chunks: outcome.passages.len(),
            groups,
        }
    }
}

/// Knowledge base size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub total_chunks: u64,
}
