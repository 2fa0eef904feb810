//! Task set: the compiler's output

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Task;
use super::types::{Complexity, TaskId, TaskType, Tier};

/// How the set was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerMode {
    #[default]
    Full,
    /// Minimal schema + CRUD plan produced after a template failure
    Fallback,
}

impl CompilerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerMode::Full => "full",
            CompilerMode::Fallback => "fallback",
        }
    }
}

/// Counts recorded by the enrichment pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnrichmentStats {
    pub enriched: usize,
    pub failed: usize,
    pub not_enriched: usize,
    pub cancelled: bool,
}

/// Aggregate view over a task set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total_tasks: usize,
    pub by_tier: BTreeMap<Tier, usize>,
    pub by_type: BTreeMap<TaskType, usize>,
    pub overall_complexity: Complexity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_tasks: Option<usize>,
}

/// Provenance of a task set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskSetMetadata {
    pub source_title: String,
    pub mode: CompilerMode,
    pub references_expanded: bool,
    /// Line count of the schema text the plan was generated against
    pub schema_lines: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentStats>,
}

/// An ordered, dependency-consistent set of tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSet {
    pub id: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
    pub summary: TaskSummary,
    pub metadata: TaskSetMetadata,
}

impl TaskSet {
    /// Get task by ID
    pub fn get_task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks of a given type, in generation order
    pub fn tasks_of_type(&self, task_type: TaskType) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.task_type == task_type).collect()
    }

    /// Tasks not yet completed whose dependencies are all completed
    pub fn ready_tasks(&self, completed: &[TaskId]) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| !completed.contains(&t.id) && t.is_ready(completed))
            .collect()
    }

    /// Number of tasks carrying enrichment guidance
    pub fn enriched_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.enrichment.is_enriched()).count()
    }
}
