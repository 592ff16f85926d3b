//! Shared fakes for pipeline integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use spectrum_bridge::enrichment::{EnrichmentProducer, TaskInput, TaskName, TaskPayload};
use spectrum_bridge::errors::{BridgeError, Result};
use spectrum_bridge::providers::{
    CompletionOptions, Embedder, ImageRequest, ImageSynthesizer, IndexHit, TextGenerator,
    VectorIndex,
};
use spectrum_bridge::{FanOutScheduler, FanOutSettings, RetrievalGateway};

/// Fixed-size embedding, optionally refusing every call
pub struct FakeEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl FakeEmbedder {
    pub fn up() -> Self {
        Self { calls: AtomicUsize::new(0), fail: false }
    }

    pub fn down() -> Self {
        Self { calls: AtomicUsize::new(0), fail: true }
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(BridgeError::EmbeddingError("connection refused".to_string()));
        }
        Ok(vec![0.1, 0.2, 0.3])
    }
}

/// Index that returns the same hits for every search
pub struct FakeIndex {
    pub hits: Vec<IndexHit>,
    pub calls: AtomicUsize,
}

impl FakeIndex {
    pub fn with_passages(count: usize) -> Self {
        let hits = (0..count)
            .map(|i| IndexHit {
                text: format!("Regression can appear between 15 and 24 months. Passage {}.", i),
                source: format!("guide_{}.pdf", i),
                chunk_index: i as i64,
                score: 0.9 - i as f32 * 0.1,
            })
            .collect();
        Self { hits, calls: AtomicUsize::new(0) }
    }

    pub fn empty() -> Self {
        Self::with_passages(0)
    }
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn search(&self, _vector: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(k).cloned().collect())
    }

    async fn chunks_by_source(&self, source: &str, limit: usize) -> Result<Vec<IndexHit>> {
        Ok(self
            .hits
            .iter()
            .filter(|h| h.source == source)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.hits.len() as u64)
    }
}

/// How a [`DelayedProducer`] behaves after its delay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

/// Producer that sleeps, then succeeds, fails or panics
pub struct DelayedProducer {
    pub task: TaskName,
    pub delay: Duration,
    pub behaviour: Behaviour,
    pub calls: AtomicUsize,
    pub finished: AtomicUsize,
}

impl DelayedProducer {
    pub fn new(task: TaskName, delay: Duration, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            task,
            delay,
            behaviour,
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        })
    }

    pub fn ok(task: TaskName, delay_ms: u64) -> Arc<Self> {
        Self::new(task, Duration::from_millis(delay_ms), Behaviour::Succeed)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentProducer for DelayedProducer {
    fn task(&self) -> TaskName {
        self.task
    }

    async fn produce(&self, input: &TaskInput) -> Result<TaskPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);

        match self.behaviour {
            Behaviour::Succeed => Ok(payload_for(self.task, input)),
            Behaviour::Fail => Err(BridgeError::GenerationApiError(format!(
                "{} backend returned 500",
                self.task
            ))),
            Behaviour::Panic => panic!("{} producer crashed", self.task),
        }
    }
}

fn payload_for(task: TaskName, input: &TaskInput) -> TaskPayload {
    match (task, input) {
        (TaskName::Simplify, TaskInput::Context { text }) => {
            let simplified = "Some kids stop using words they knew. Doctors can help.".to_string();
            TaskPayload::Simplified {
                metrics: spectrum_bridge::enrichment::ReadabilityMetrics::measure(&simplified),
                simplified_text: simplified,
                original_text: text.clone(),
                reading_level: Default::default(),
            }
        }
        (TaskName::Story, TaskInput::Situation { situation, personalization }) => TaskPayload::Story {
            title: "A New Day".to_string(),
            story: "I am going to a new place.".to_string(),
            situation: situation.clone(),
            child_name: personalization.child_name().to_string(),
            reading_level: personalization.reading_level,
            full_text: "Title: A New Day\nI am going to a new place.".to_string(),
        },
        (_, input) => TaskPayload::Image {
            prompt: format!("{:?}", input),
            byte_len: 4,
            path: None,
            bytes: Bytes::from_static(b"\x89PNG"),
        },
    }
}

/// Text generator replying with a fixed string
pub struct CannedGenerator(pub String);

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Image synthesizer that is always unreachable
pub struct OfflineSynthesizer;

#[async_trait]
impl ImageSynthesizer for OfflineSynthesizer {
    async fn synthesize(&self, _request: &ImageRequest) -> Result<Bytes> {
        Err(BridgeError::ImageApiError("service unavailable".to_string()))
    }
}

pub fn gateway(embedder: Arc<FakeEmbedder>, index: Arc<FakeIndex>) -> Arc<RetrievalGateway> {
    Arc::new(RetrievalGateway::new(embedder, index))
}

/// Scheduler over a healthy gateway with `passages` hits
pub fn scheduler(passages: usize, settings: FanOutSettings) -> FanOutScheduler {
    FanOutScheduler::new(
        gateway(Arc::new(FakeEmbedder::up()), Arc::new(FakeIndex::with_passages(passages))),
        settings,
    )
}

pub fn settings_ms(simplify: u64, story: u64, image: u64) -> FanOutSettings {
    FanOutSettings {
        simplify_timeout: Duration::from_millis(simplify),
        story_timeout: Duration::from_millis(story),
        image_timeout: Duration::from_millis(image),
        ..FanOutSettings::default()
    }
}
