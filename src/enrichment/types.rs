//! Enrichment task and result types
//!
//! Core types for one unit of fan-out work and its outcome.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::enrichment::readability::ReadabilityMetrics;
use crate::errors::{BridgeError, ErrorKind};

/// Enrichment task kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskName {
    /// Grade-level simplification of the retrieved context (mandatory)
    Simplify,
    /// Personalized social story
    Story,
    /// Illustrative image
    Image,
}

impl TaskName {
    /// Every kind, in submission order
    pub const ALL: [TaskName; 3] = [TaskName::Simplify, TaskName::Story, TaskName::Image];

    /// Whether this task runs on every request
    pub fn is_mandatory(&self) -> bool {
        matches!(self, TaskName::Simplify)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::Simplify => "simplify",
            TaskName::Story => "story",
            TaskName::Image => "image",
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskName {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simplify" | "simplification" => Ok(TaskName::Simplify),
            "story" | "social_story" => Ok(TaskName::Story),
            "image" => Ok(TaskName::Image),
            other => Err(BridgeError::InvalidInput(format!("Unknown task: {}", other))),
        }
    }
}

/// Target reading level for generated text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingLevel {
    #[default]
    #[serde(rename = "grade_2")]
    Grade2,
    #[serde(rename = "grade_3")]
    Grade3,
    #[serde(rename = "grade_4")]
    Grade4,
}

impl ReadingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingLevel::Grade2 => "grade_2",
            ReadingLevel::Grade3 => "grade_3",
            ReadingLevel::Grade4 => "grade_4",
        }
    }

    /// Sentence-length guidance handed to the story prompt
    pub fn language_guide(&self) -> &'static str {
        match self {
            ReadingLevel::Grade2 => "Use very simple words (5-8 words per sentence)",
            ReadingLevel::Grade3 => "Use simple words (8-12 words per sentence)",
            ReadingLevel::Grade4 => "Use clear language (10-15 words per sentence)",
        }
    }
}

impl fmt::Display for ReadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingLevel {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "grade_2" | "2" => Ok(ReadingLevel::Grade2),
            "grade_3" | "3" => Ok(ReadingLevel::Grade3),
            "grade_4" | "4" => Ok(ReadingLevel::Grade4),
            other => Err(BridgeError::InvalidInput(format!("Unknown reading level: {}", other))),
        }
    }
}

/// Optional per-request personalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personalization {
    pub child_name: Option<String>,
    #[serde(default)]
    pub reading_level: ReadingLevel,
}

impl Personalization {
    /// Name used in stories; "the child" when unset
    pub fn child_name(&self) -> &str {
        self.child_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("the child")
    }
}

/// Input slice handed to one producer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskInput {
    /// Retrieved context, already truncated to the character budget
    Context { text: String },
    /// Situation derived from the question, plus personalization
    Situation {
        situation: String,
        personalization: Personalization,
    },
    /// Image description derived from the question
    Prompt { prompt: String },
}

/// One unit of enrichment work; lives for a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentTask {
    pub name: TaskName,
    pub input: TaskInput,
    /// Whether the request may still succeed without this task
    pub optional: bool,
}

impl EnrichmentTask {
    pub fn new(name: TaskName, input: TaskInput) -> Self {
        Self {
            name,
            input,
            optional: !name.is_mandatory(),
        }
    }
}

/// Task-specific output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskPayload {
    Simplified {
        simplified_text: String,
        original_text: String,
        reading_level: ReadingLevel,
        metrics: ReadabilityMetrics,
    },
    Story {
        title: String,
        story: String,
        situation: String,
        child_name: String,
        reading_level: ReadingLevel,
        full_text: String,
    },
    Image {
        prompt: String,
        byte_len: usize,
        path: Option<PathBuf>,
        #[serde(skip)]
        bytes: Bytes,
    },
}

/// Result of one enrichment task; produced exactly once per task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub task_name: TaskName,
    pub succeeded: bool,
    pub payload: Option<TaskPayload>,
    pub elapsed_ms: u64,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
}

impl EnrichmentResult {
    /// Create successful result
    pub fn success(task_name: TaskName, payload: TaskPayload, elapsed: Duration) -> Self {
        Self {
            task_name,
            succeeded: true,
            payload: Some(payload),
            elapsed_ms: elapsed.as_millis() as u64,
            error_kind: None,
            error: None,
        }
    }

    /// Create failed result
    pub fn failure(
        task_name: TaskName,
        kind: ErrorKind,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            task_name,
            succeeded: false,
            payload: None,
            elapsed_ms: elapsed.as_millis() as u64,
            error_kind: Some(kind),
            error: Some(error.into()),
        }
    }

    /// Create result for a task that outlived its budget
    pub fn timed_out(task_name: TaskName, budget: Duration) -> Self {
        Self::failure(
            task_name,
            ErrorKind::Timeout,
            format!("{} did not finish within {}ms", task_name, budget.as_millis()),
            budget,
        )
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}
