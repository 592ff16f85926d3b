//! Qdrant-backed vector index
//!
//! Read-only view over one collection. Each point carries the chunk text and
//! its document identity in the payload:
//! `{ "text": str, "source": str, "chunk_index": int }`.

use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        condition::ConditionOneOf, r#match::MatchValue, value::Kind,
        with_payload_selector::SelectorOptions, Condition, FieldCondition, Filter, Match,
        ScrollPoints, SearchPoints, Value as QdrantValue, WithPayloadSelector,
    },
};
use std::collections::HashMap;

use crate::errors::{BridgeError, Result};
use crate::providers::{IndexHit, VectorIndex};

const TEXT_FIELD: &str = "text";
const SOURCE_FIELD: &str = "source";
const CHUNK_FIELD: &str = "chunk_index";
const LEGACY_CHUNK_FIELD: &str = "chunk_id";

/// Vector index over a Qdrant collection
pub struct QdrantIndex {
    client: QdrantClient,
    collection: String,
}

impl QdrantIndex {
    /// Connect to a Qdrant instance; no request is made until first use
    pub fn connect(url: &str, collection: &str) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .map_err(|e| BridgeError::VectorSearchError(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    /// Collection this index reads from
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn payload_selector() -> Option<WithPayloadSelector> {
        Some(WithPayloadSelector {
            selector_options: Some(SelectorOptions::Enable(true)),
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        let response = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector: vector.to_vec(),
                limit: k as u64,
                with_payload: Self::payload_selector(),
                ..Default::default()
            })
            .await
            .map_err(|e| BridgeError::VectorSearchError(format!("Failed to search points: {}", e)))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| hit_from_payload(&point.payload, point.score))
            .collect())
    }

    async fn chunks_by_source(&self, source: &str, limit: usize) -> Result<Vec<IndexHit>> {
        let filter = Filter {
            must: vec![Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: SOURCE_FIELD.to_string(),
                    r#match: Some(Match {
                        match_value: Some(MatchValue::Keyword(source.to_string())),
                    }),
                    ..Default::default()
                })),
            }],
            ..Default::default()
        };

        let response = self
            .client
            .scroll(&ScrollPoints {
                collection_name: self.collection.clone(),
                filter: Some(filter),
                limit: Some(limit as u32),
                with_payload: Self::payload_selector(),
                ..Default::default()
            })
            .await
            .map_err(|e| BridgeError::VectorSearchError(format!("Failed to scroll points: {}", e)))?;

        Ok(response
            .result
            .into_iter()
            .map(|point| hit_from_payload(&point.payload, 0.0))
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| BridgeError::VectorSearchError(format!("Failed to get collection info: {}", e)))?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }
}

fn hit_from_payload(payload: &HashMap<String, QdrantValue>, score: f32) -> IndexHit {
    let chunk_index = payload
        .get(CHUNK_FIELD)
        .or_else(|| payload.get(LEGACY_CHUNK_FIELD))
        .and_then(value_as_i64)
        .unwrap_or(0);

    IndexHit {
        text: payload.get(TEXT_FIELD).and_then(value_as_string).unwrap_or_default(),
        source: payload
            .get(SOURCE_FIELD)
            .and_then(value_as_string)
            .unwrap_or_else(|| "unknown".to_string()),
        chunk_index,
        score,
    }
}

fn value_as_string(value: &QdrantValue) -> Option<String> {
    match value.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

fn value_as_i64(value: &QdrantValue) -> Option<i64> {
    match value.kind.as_ref()? {
        Kind::IntegerValue(i) => Some(*i),
        Kind::DoubleValue(f) => Some(*f as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(entries: Vec<(&str, QdrantValue)>) -> HashMap<String, QdrantValue> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_hit_from_full_payload() {
        let payload = payload(vec![
            ("text", QdrantValue::from("Early signs include...".to_string())),
            ("source", QdrantValue::from("cdc_guide.pdf".to_string())),
            ("chunk_index", QdrantValue::from(7_i64)),
        ]);

        let hit = hit_from_payload(&payload, 0.91);
        assert_eq!(hit.text, "Early signs include...");
        assert_eq!(hit.source, "cdc_guide.pdf");
        assert_eq!(hit.chunk_index, 7);
        assert_eq!(hit.score, 0.91);
    }

    #[test]
    fn test_hit_from_legacy_chunk_field() {
        let payload = payload(vec![
            ("text", QdrantValue::from("x".to_string())),
            ("chunk_id", QdrantValue::from(3_i64)),
        ]);

        let hit = hit_from_payload(&payload, 0.5);
        assert_eq!(hit.chunk_index, 3);
        assert_eq!(hit.source, "unknown");
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        let index = QdrantIndex::connect("http://localhost:6334", "knowledge").unwrap();
        assert_eq!(index.collection(), "knowledge");
    }

    #[tokio::test]
    #[ignore] // Integration test - requires Qdrant
    async fn test_count_integration() {
        let index = QdrantIndex::connect("http://localhost:6334", "knowledge").unwrap();
        assert!(index.count().await.is_ok());
    }
}
