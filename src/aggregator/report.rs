//! Aggregate report types

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use crate::enrichment::{EnrichmentResult, TaskName, TaskPayload};
use crate::errors::ErrorKind;
use crate::retrieval::RetrievalOutcome;

/// Overall request classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    /// Retrieval usable and every submitted task succeeded
    Success,
    /// Retrieval usable but some task failed or timed out
    Partial,
    /// Retrieval failed or returned nothing; no task ran
    Failed,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverallStatus::Success => "SUCCESS",
            OverallStatus::Partial => "PARTIAL",
            OverallStatus::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Task results keyed by name, kept in insertion (completion) order
///
/// Serializes as a JSON object whose key order is the completion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskResults(Vec<EnrichmentResult>);

impl TaskResults {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a result; a repeated task name replaces the earlier entry in place
    pub fn insert(&mut self, result: EnrichmentResult) -> Option<EnrichmentResult> {
        match self.0.iter_mut().find(|r| r.task_name == result.task_name) {
            Some(slot) => Some(std::mem::replace(slot, result)),
            None => {
                self.0.push(result);
                None
            }
        }
    }

    pub fn get(&self, name: TaskName) -> Option<&EnrichmentResult> {
        self.0.iter().find(|r| r.task_name == name)
    }

    pub fn contains(&self, name: TaskName) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichmentResult> {
        self.0.iter()
    }

    /// Task names in insertion order
    pub fn names(&self) -> Vec<TaskName> {
        self.0.iter().map(|r| r.task_name).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<EnrichmentResult> for TaskResults {
    fn from_iter<I: IntoIterator<Item = EnrichmentResult>>(iter: I) -> Self {
        let mut results = TaskResults::new();
        for result in iter {
            results.insert(result);
        }
        results
    }
}

impl Serialize for TaskResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for result in &self.0 {
            map.serialize_entry(&result.task_name, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TaskResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ResultsVisitor;

        impl<'de> Visitor<'de> for ResultsVisitor {
            type Value = TaskResults;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of task name to result")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut results = TaskResults::new();
                while let Some((_name, result)) = access.next_entry::<TaskName, EnrichmentResult>()? {
                    results.insert(result);
                }
                Ok(results)
            }
        }

        deserializer.deserialize_map(ResultsVisitor)
    }
}

/// Identity and timing stamped on a report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMeta {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total_elapsed: Duration,
}

impl ReportMeta {
    /// Fresh id, stamped now
    pub fn new(total_elapsed: Duration) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            total_elapsed,
        }
    }
}

/// Final, immutable result of one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub retrieval: RetrievalOutcome,
    pub results: TaskResults,
    /// Successful tasks, in the order they finished
    pub tasks_completed: Vec<TaskName>,
    pub overall_status: OverallStatus,
    pub failure_kind: Option<ErrorKind>,
    pub failure_reason: Option<String>,
    pub total_elapsed_ms: u64,
}

impl AggregateReport {
    pub fn is_success(&self) -> bool {
        self.overall_status == OverallStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.overall_status == OverallStatus::Failed
    }

    pub fn result(&self, name: TaskName) -> Option<&EnrichmentResult> {
        self.results.get(name)
    }

    /// Results that failed or timed out
    pub fn failed_tasks(&self) -> Vec<&EnrichmentResult> {
        self.results.iter().filter(|r| !r.succeeded).collect()
    }

    pub fn simplified_text(&self) -> Option<&str> {
        match self.payload(TaskName::Simplify)? {
            TaskPayload::Simplified { simplified_text, .. } => Some(simplified_text),
            _ => None,
        }
    }

    /// `(title, story)` when the story task succeeded
    pub fn story(&self) -> Option<(&str, &str)> {
        match self.payload(TaskName::Story)? {
            TaskPayload::Story { title, story, .. } => Some((title, story)),
            _ => None,
        }
    }

    /// `(prompt, saved path)` when the image task succeeded
    pub fn image(&self) -> Option<(&str, Option<&Path>)> {
        match self.payload(TaskName::Image)? {
            TaskPayload::Image { prompt, path, .. } => Some((prompt, path.as_deref())),
            _ => None,
        }
    }

    fn payload(&self, name: TaskName) -> Option<&TaskPayload> {
        self.results
            .get(name)
            .filter(|r| r.succeeded)
            .and_then(|r| r.payload.as_ref())
    }
}
