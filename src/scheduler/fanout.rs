//! Fan-out scheduler with bounded concurrency
//!
//! Retrieval runs first and gates everything else. Enrichment tasks then run
//! as spawned tokio tasks behind a semaphore, each with its own timeout that
//! starts at submission. Results are collected in completion order, and the
//! scheduler always waits for every submitted task before aggregating.

use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::aggregator::{aggregate, AggregateReport, ReportMeta, TaskResults};
use crate::config::SchedulerConfig;
use crate::enrichment::{
    adapter, cues, truncate_context, EnrichmentProducer, EnrichmentResult, EnrichmentTask,
    TaskInput, TaskName,
};
use crate::errors::ErrorKind;
use crate::retrieval::{RetrievalGateway, RetrievalOutcome};
use crate::scheduler::request::ProcessRequest;
use crate::scheduler::state::{RequestEvent, RequestState};

/// Per-task budgets and pool sizing
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutSettings {
    pub simplify_timeout: Duration,
    pub story_timeout: Duration,
    pub image_timeout: Duration,
    /// Character budget for the simplifier's context
    pub max_context_chars: usize,
    /// Optional cap on concurrent producers
    pub max_workers: Option<usize>,
}

impl Default for FanOutSettings {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for FanOutSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            simplify_timeout: config.simplify_timeout(),
            story_timeout: config.story_timeout(),
            image_timeout: config.image_timeout(),
            max_context_chars: config.max_context_chars,
            max_workers: config.max_workers,
        }
    }
}

impl FanOutSettings {
    pub fn timeout_for(&self, task: TaskName) -> Duration {
        match task {
            TaskName::Simplify => self.simplify_timeout,
            TaskName::Story => self.story_timeout,
            TaskName::Image => self.image_timeout,
        }
    }

    /// Pool size for `task_count` tasks: one worker per task, capped
    pub fn pool_size(&self, task_count: usize) -> usize {
        let size = match self.max_workers {
            Some(cap) => task_count.min(cap),
            None => task_count,
        };
        size.max(1)
    }
}

/// Runs one request end to end
///
/// Holds only injected collaborator handles; nothing is shared between
/// `process` calls.
pub struct FanOutScheduler {
    gateway: Arc<RetrievalGateway>,
    producers: BTreeMap<TaskName, Arc<dyn EnrichmentProducer>>,
    settings: FanOutSettings,
}

impl FanOutScheduler {
    /// Create new scheduler with no producers registered
    pub fn new(gateway: Arc<RetrievalGateway>, settings: FanOutSettings) -> Self {
        Self {
            gateway,
            producers: BTreeMap::new(),
            settings,
        }
    }

    /// Register a producer under the task it serves
    pub fn with_producer(mut self, producer: Arc<dyn EnrichmentProducer>) -> Self {
        self.producers.insert(producer.task(), producer);
        self
    }

    pub fn settings(&self) -> &FanOutSettings {
        &self.settings
    }

    pub fn gateway(&self) -> &RetrievalGateway {
        &self.gateway
    }

    /// Task kinds with a registered producer
    pub fn registered_tasks(&self) -> Vec<TaskName> {
        self.producers.keys().copied().collect()
    }

    /// Process one request into its aggregate report
    pub async fn process(&self, request: &ProcessRequest) -> AggregateReport {
        let started = Instant::now();
        let mut state = RequestState::Pending;

        advance(&mut state, RequestEvent::Start);
        let retrieval = self.gateway.retrieve_default(&request.question).await;

        if !retrieval.is_usable() {
            advance(&mut state, RequestEvent::RetrievalFailed);
            let report = aggregate(retrieval, TaskResults::new(), ReportMeta::new(started.elapsed()));
            warn!(
                request_id = %report.request_id,
                kind = ?report.failure_kind,
                reason = report.failure_reason.as_deref().unwrap_or(""),
                "request short-circuited before fan-out"
            );
            return report;
        }

        advance(&mut state, RequestEvent::RetrievalReady);
        let tasks = self.build_tasks(request, &retrieval);
        info!(
            passages = retrieval.passages.len(),
            tasks = tasks.len(),
            "fanning out"
        );

        let results = self.run_tasks(tasks).await;

        advance(&mut state, RequestEvent::TasksJoined);
        let report = aggregate(retrieval, results, ReportMeta::new(started.elapsed()));
        advance(&mut state, RequestEvent::Classified(report.overall_status));

        info!(
            request_id = %report.request_id,
            status = %report.overall_status,
            completed = report.tasks_completed.len(),
            elapsed_ms = report.total_elapsed_ms,
            "request finished"
        );
        report
    }

    /// Derive each task's input slice
    pub fn build_tasks(&self, request: &ProcessRequest, retrieval: &RetrievalOutcome) -> Vec<EnrichmentTask> {
        request
            .effective_tasks()
            .into_iter()
            .map(|name| {
                let input = match name {
                    TaskName::Simplify => TaskInput::Context {
                        text: truncate_context(
                            &retrieval.combined_context,
                            self.settings.max_context_chars,
                        ),
                    },
                    TaskName::Story => TaskInput::Situation {
                        situation: cues::situation_for(&request.question),
                        personalization: request.personalization.clone().unwrap_or_default(),
                    },
                    TaskName::Image => TaskInput::Prompt {
                        prompt: cues::image_prompt_for(&request.question),
                    },
                };
                EnrichmentTask::new(name, input)
            })
            .collect()
    }

    /// Run tasks concurrently and join them all, in completion order
    pub async fn run_tasks(&self, tasks: Vec<EnrichmentTask>) -> TaskResults {
        let pool = Arc::new(Semaphore::new(self.settings.pool_size(tasks.len())));
        let mut pending = FuturesUnordered::new();

        for task in tasks {
            let name = task.name;
            let budget = self.settings.timeout_for(name);

            let Some(producer) = self.producers.get(&name).cloned() else {
                warn!(task = %name, "no producer registered");
                pending.push(
                    futures_util::future::ready(EnrichmentResult::failure(
                        name,
                        ErrorKind::ProducerError,
                        format!("No producer registered for {}", name),
                        Duration::ZERO,
                    ))
                    .boxed(),
                );
                continue;
            };

            let permits = pool.clone();
            let handle = tokio::spawn(async move {
                // Permit held for the producer's lifetime, including after a timeout
                let _permit = permits.acquire_owned().await;
                adapter::run(task, producer).await
            });

            // The deadline is fixed here, at submission
            let deadline = tokio::time::timeout(budget, handle);
            debug!(task = %name, budget_ms = budget.as_millis() as u64, "submitted");

            pending.push(
                async move {
                    match deadline.await {
                        Ok(Ok(result)) => result,
                        Ok(Err(join_error)) => EnrichmentResult::failure(
                            name,
                            ErrorKind::ProducerError,
                            format!("producer task aborted: {}", join_error),
                            budget,
                        ),
                        // Dropping the handle detaches the producer; its result is discarded
                        Err(_) => {
                            warn!(task = %name, budget_ms = budget.as_millis() as u64, "task timed out");
                            EnrichmentResult::timed_out(name, budget)
                        }
                    }
                }
                .boxed(),
            );
        }

        let mut results = TaskResults::new();
        while let Some(result) = pending.next().await {
            info!(
                task = %result.task_name,
                succeeded = result.succeeded,
                elapsed_ms = result.elapsed_ms,
                "task finished"
            );
            results.insert(result);
        }
        results
    }
}

fn advance(state: &mut RequestState, event: RequestEvent) {
    match state.transition(event) {
        Ok(next) => {
            debug!(from = state.display_name(), to = next.display_name(), "request state");
            *state = next;
        }
        Err(e) => warn!(error = %e, "ignored request event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::{Personalization, ReadingLevel, TaskPayload};
    use crate::errors::Result;
    use crate::providers::{Embedder, IndexHit, VectorIndex};
    use async_trait::async_trait;

    struct NullEmbedder;

    #[async_trait]
    impl Embedder for NullEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 3])
        }
    }

    struct EmptyIndex;

    #[async_trait]
    impl VectorIndex for EmptyIndex {
        async fn search(&self, _vector: &[f32], _k: usize) -> Result<Vec<IndexHit>> {
            Ok(Vec::new())
        }

        async fn chunks_by_source(&self, _source: &str, _limit: usize) -> Result<Vec<IndexHit>> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<u64> {
            Ok(0)
        }
    }

    struct Immediate;

    #[async_trait]
    impl EnrichmentProducer for Immediate {
        fn task(&self) -> TaskName {
            TaskName::Simplify
        }

        async fn produce(&self, input: &TaskInput) -> Result<TaskPayload> {
            Ok(TaskPayload::Image {
                prompt: format!("{:?}", input),
                byte_len: 0,
                path: None,
                bytes: bytes::Bytes::new(),
            })
        }
    }

    fn scheduler(settings: FanOutSettings) -> FanOutScheduler {
        let gateway = RetrievalGateway::new(Arc::new(NullEmbedder), Arc::new(EmptyIndex));
        FanOutScheduler::new(Arc::new(gateway), settings)
    }

    fn outcome(context: &str) -> RetrievalOutcome {
        RetrievalOutcome::success(
            "q",
            vec![crate::retrieval::RetrievedPassage {
                text: context.to_string(),
                source_id: "s".to_string(),
                relevance_score: 0.9,
                chunk_index: 0,
            }],
            Duration::ZERO,
        )
    }

    #[test]
    fn test_pool_size() {
        let mut settings = FanOutSettings::default();
        assert_eq!(settings.pool_size(3), 3);
        assert_eq!(settings.pool_size(0), 1);
        settings.max_workers = Some(2);
        assert_eq!(settings.pool_size(3), 2);
        assert_eq!(settings.pool_size(1), 1);
    }

    #[test]
    fn test_settings_from_config() {
        let settings = FanOutSettings::default();
        assert_eq!(settings.timeout_for(TaskName::Image), Duration::from_secs(60));
        assert_eq!(settings.max_context_chars, 1000);
    }

    #[test]
    fn test_build_tasks_derives_inputs() {
        let settings = FanOutSettings {
            max_context_chars: 5,
            ..FanOutSettings::default()
        };
        let request = ProcessRequest::new("Going to the doctor")
            .with_task(TaskName::Story)
            .with_task(TaskName::Image)
            .with_personalization(Personalization {
                child_name: Some("Ava".to_string()),
                reading_level: ReadingLevel::Grade3,
            });

        let tasks = scheduler(settings).build_tasks(&request, &outcome("abcdefghij"));

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].input, TaskInput::Context { text: "abcde".to_string() });
        assert!(!tasks[0].optional);
        match &tasks[1].input {
            TaskInput::Situation { situation, personalization } => {
                assert_eq!(situation, "going to the doctor");
                assert_eq!(personalization.child_name(), "Ava");
            }
            other => panic!("unexpected input {:?}", other),
        }
        assert_eq!(
            tasks[2].input,
            TaskInput::Prompt {
                prompt: "doctor meeting with child and parent, medical office".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_producer_yields_one_failure() {
        let sched = scheduler(FanOutSettings::default()).with_producer(Arc::new(Immediate));
        assert_eq!(sched.registered_tasks(), vec![TaskName::Simplify]);

        let request = ProcessRequest::new("q").with_task(TaskName::Story);
        let tasks = sched.build_tasks(&request, &outcome("ctx"));
        let results = sched.run_tasks(tasks).await;

        assert_eq!(results.len(), 2);
        assert!(results.get(TaskName::Simplify).unwrap().succeeded);
        let story = results.get(TaskName::Story).unwrap();
        assert!(!story.succeeded);
        assert_eq!(story.error_kind, Some(ErrorKind::ProducerError));
    }

    #[tokio::test]
    async fn test_empty_index_short_circuits() {
        let sched = scheduler(FanOutSettings::default()).with_producer(Arc::new(Immediate));
        let report = sched.process(&ProcessRequest::new("asdkj##")).await;

        assert!(report.is_failed());
        assert_eq!(report.failure_kind, Some(ErrorKind::EmptyRetrieval));
        assert!(report.results.is_empty());
        assert!(report.tasks_completed.is_empty());
    }
}
