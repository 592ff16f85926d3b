//! HTTP image synthesis client
//!
//! Posts a generation request to a diffusion server and returns the encoded
//! image bytes exactly as served.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{BridgeError, Result};
use crate::providers::ImageSynthesizer;

/// Request timeout; CPU diffusion is slow
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Generation parameters sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub guidance_scale: f32,
    pub width: u32,
    pub height: u32,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            steps: 15,
            guidance_scale: 7.5,
            width: 512,
            height: 512,
        }
    }

    pub fn with_negative_prompt(mut self, negative: impl Into<String>) -> Self {
        self.negative_prompt = negative.into();
        self
    }
}

/// Image synthesizer reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpImageSynthesizer {
    client: Client,
    endpoint: String,
}

impl HttpImageSynthesizer {
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .map_err(BridgeError::HttpError)?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageSynthesizer for HttpImageSynthesizer {
    async fn synthesize(&self, request: &ImageRequest) -> Result<Bytes> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| BridgeError::ImageApiError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BridgeError::ImageApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::ImageApiError(format!("Failed to read image: {}", e)))?;

        if body.is_empty() {
            return Err(BridgeError::ImageApiError("Empty image returned".to_string()));
        }

        Ok(body)
    }
}
