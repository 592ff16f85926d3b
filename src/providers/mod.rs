//! External collaborators
//!
//! The core consumes four capabilities through these traits: embedding,
//! nearest-neighbour search, text completion and image synthesis. Concrete
//! clients are built once by the caller and injected as `Arc<dyn ...>`.

pub mod image;
pub mod local_embed;
pub mod ollama;
pub mod qdrant;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub use image::{HttpImageSynthesizer, ImageRequest};
pub use local_embed::LocalEmbedder;
pub use ollama::{CompletionOptions, OllamaClient};
pub use qdrant::QdrantIndex;

/// One raw hit as returned by the vector index, in index order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexHit {
    pub text: String,
    pub source: String,
    pub chunk_index: i64,
    pub score: f32,
}

/// `embed(text) -> vector`
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// `search(vector, k) -> ranked hits` over one configured index
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<IndexHit>>;

    /// All stored chunks of one source document, up to `limit`
    async fn chunks_by_source(&self, source: &str, limit: usize) -> Result<Vec<IndexHit>>;

    /// Number of chunks stored in the index
    async fn count(&self) -> Result<u64>;
}

/// `complete(prompt) -> text`
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}

/// `synthesize(prompt) -> image bytes`
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &ImageRequest) -> Result<Bytes>;
}
