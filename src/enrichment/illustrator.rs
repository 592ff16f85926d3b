//! Illustration producer
//!
//! Enhances the scene prompt, asks the synthesizer for an image and
//! optionally writes it as a PNG under the configured directory.

use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::enrichment::adapter::EnrichmentProducer;
use crate::enrichment::types::{TaskInput, TaskName, TaskPayload};
use crate::errors::{BridgeError, Result};
use crate::providers::{ImageRequest, ImageSynthesizer};

const PROMPT_SUFFIX: &str = ", high quality, professional, educational, detailed, vibrant";
const NEGATIVE_PROMPT: &str = "watermark, text, signature, blurry, ugly, low quality";

pub struct Illustrator {
    synthesizer: Arc<dyn ImageSynthesizer>,
    output_dir: Option<PathBuf>,
}

impl Illustrator {
    pub fn new(synthesizer: Arc<dyn ImageSynthesizer>) -> Self {
        Self {
            synthesizer,
            output_dir: None,
        }
    }

    /// Save generated images under `dir`
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    async fn save(&self, dir: &Path, prompt: &str, bytes: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(image_file_name(prompt, &Local::now().format("%Y%m%d_%H%M%S").to_string()));
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(path = %path.display(), "saved image");
        Ok(path)
    }
}

/// `<timestamp>_<first 30 prompt chars, alphanumerics only>.png`
pub fn image_file_name(prompt: &str, timestamp: &str) -> String {
    let safe: String = prompt
        .chars()
        .take(30)
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    format!("{}_{}.png", timestamp, safe.trim().replace(' ', "_"))
}

#[async_trait]
impl EnrichmentProducer for Illustrator {
    fn task(&self) -> TaskName {
        TaskName::Image
    }

    async fn produce(&self, input: &TaskInput) -> Result<TaskPayload> {
        let prompt = match input {
            TaskInput::Prompt { prompt } => prompt,
            other => {
                return Err(BridgeError::ProducerError(format!(
                    "image expects a prompt, got {:?}",
                    other
                )))
            }
        };

        let request = ImageRequest::new(format!("{}{}", prompt, PROMPT_SUFFIX))
            .with_negative_prompt(NEGATIVE_PROMPT);
        let bytes = self.synthesizer.synthesize(&request).await?;

        let path = match &self.output_dir {
            Some(dir) => Some(self.save(dir, prompt, &bytes).await?),
            None => None,
        };

        Ok(TaskPayload::Image {
            prompt: prompt.clone(),
            byte_len: bytes.len(),
            path,
            bytes,
        })
    }
}
