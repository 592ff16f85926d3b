use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::enrichment::{Personalization, TaskName};

/// Caller request: a question plus the optional tasks to run alongside
/// simplification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub question: String,
    #[serde(default)]
    pub task_selection: BTreeSet<TaskName>,
    #[serde(default)]
    pub personalization: Option<Personalization>,
}

impl ProcessRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            task_selection: BTreeSet::new(),
            personalization: None,
        }
    }

    pub fn with_task(mut self, task: TaskName) -> Self {
        self.task_selection.insert(task);
        self
    }

    pub fn with_personalization(mut self, personalization: Personalization) -> Self {
        self.personalization = Some(personalization);
        self
    }

    /// Tasks that will actually run; mandatory tasks are always included
    pub fn effective_tasks(&self) -> BTreeSet<TaskName> {
        TaskName::ALL
            .iter()
            .copied()
            .filter(|t| t.is_mandatory() || self.task_selection.contains(t))
            .collect()
    }
}
