//! Producer adapter boundary
//!
//! Every producer is driven through [`run`], which times the call and turns
//! errors and panics into a failed [`EnrichmentResult`]. Nothing escapes.

use async_trait::async_trait;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::errors::{ErrorKind, Result};
use crate::enrichment::types::{EnrichmentResult, EnrichmentTask, TaskInput, TaskName, TaskPayload};

/// One enrichment capability
#[async_trait]
pub trait EnrichmentProducer: Send + Sync {
    /// Task kind this producer serves
    fn task(&self) -> TaskName;

    /// Produce the payload for one input
    async fn produce(&self, input: &TaskInput) -> Result<TaskPayload>;
}

/// Run a producer to completion, capturing every failure mode
pub async fn run(task: EnrichmentTask, producer: Arc<dyn EnrichmentProducer>) -> EnrichmentResult {
    let started = Instant::now();
    let name = task.name;

    let outcome = AssertUnwindSafe(producer.produce(&task.input))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(payload)) => EnrichmentResult::success(name, payload, started.elapsed()),
        Ok(Err(e)) => {
            tracing::warn!(task = %name, error = %e, "producer failed");
            EnrichmentResult::failure(name, ErrorKind::ProducerError, e.to_string(), started.elapsed())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(task = %name, panic = %message, "producer panicked");
            EnrichmentResult::failure(
                name,
                ErrorKind::ProducerError,
                format!("producer panicked: {}", message),
                started.elapsed(),
            )
        }
    }
}

/// Truncate to at most `max_chars` characters, never splitting a char
pub fn truncate_context(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
