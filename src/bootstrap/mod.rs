//! Bootstrap for spectrum-bridge
//!
//! Builds every external collaborator once from configuration and injects
//! them into the gateway and scheduler. Nothing downstream reads config.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::enrichment::{Illustrator, Simplifier, StoryGenerator};
use crate::errors::{BridgeError, Result};
use crate::providers::local_embed::DEFAULT_MODEL_ID;
use crate::providers::{Embedder, HttpImageSynthesizer, LocalEmbedder, OllamaClient, QdrantIndex};
use crate::retrieval::{RetrievalGateway, SearchParams};
use crate::scheduler::{FanOutScheduler, FanOutSettings};

/// Service readiness
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    Ready,
    OllamaNotRunning,
}

/// Fully wired pipeline
pub struct Pipeline {
    pub scheduler: FanOutScheduler,
    pub gateway: Arc<RetrievalGateway>,
}

/// Collaborator factory
pub struct Bootstrap {
    config: Config,
    ollama: Arc<OllamaClient>,
}

impl Bootstrap {
    /// Create bootstrap; builds the Ollama client but contacts nothing
    pub fn new(config: Config) -> Result<Self> {
        let ollama = OllamaClient::with_config(
            &config.ollama_url(),
            &config.services.generation_model,
            &config.services.embedding_model,
            Some(Duration::from_secs(config.services.request_timeout_sec)),
        )?;

        Ok(Self {
            config,
            ollama: Arc::new(ollama),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check that the generation service answers
    pub async fn check(&self) -> BootstrapStatus {
        if self.ollama.health_check().await {
            BootstrapStatus::Ready
        } else {
            BootstrapStatus::OllamaNotRunning
        }
    }

    fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        match self.config.services.embedding_backend.as_str() {
            "ollama" => Ok(self.ollama.clone()),
            "local" => {
                // Ollama-style tags are not hub ids
                let model_id = if self.config.services.embedding_model.contains('/') {
                    self.config.services.embedding_model.as_str()
                } else {
                    DEFAULT_MODEL_ID
                };
                tracing::info!(model = model_id, "loading local embedding model");
                Ok(Arc::new(LocalEmbedder::new(model_id)?))
            }
            other => Err(BridgeError::ConfigError(format!(
                "Unknown embedding backend: {}",
                other
            ))),
        }
    }

    /// Build the retrieval gateway alone
    pub fn gateway(&self) -> Result<Arc<RetrievalGateway>> {
        let index = QdrantIndex::connect(
            &self.config.services.qdrant_url,
            &self.config.services.collection,
        )?;

        let params = SearchParams {
            top_k: self.config.retrieval.top_k,
            min_score: self.config.retrieval.min_score,
        };

        Ok(Arc::new(RetrievalGateway::with_params(
            self.embedder()?,
            Arc::new(index),
            params,
        )))
    }

    /// Build gateway, producers and scheduler
    pub fn pipeline(&self) -> Result<Pipeline> {
        let gateway = self.gateway()?;

        let synthesizer = HttpImageSynthesizer::new(&self.config.services.image_endpoint, None)?;
        let mut illustrator = Illustrator::new(Arc::new(synthesizer));
        if let Some(dir) = self.config.image_output_dir() {
            illustrator = illustrator.with_output_dir(dir);
        }

        let scheduler = FanOutScheduler::new(
            gateway.clone(),
            FanOutSettings::from(&self.config.scheduler),
        )
        .with_producer(Arc::new(Simplifier::new(self.ollama.clone())))
        .with_producer(Arc::new(StoryGenerator::new(self.ollama.clone())))
        .with_producer(Arc::new(illustrator));

        Ok(Pipeline { scheduler, gateway })
    }
}
