//! Task entity
//!
//! A single self-contained development task with its fully inlined
//! specification, dependencies and classification.

use serde::{Deserialize, Serialize};

use super::payload::TaskPayload;
use super::types::{Complexity, ExecutionMode, TaskId, TaskType, Tier};
use crate::domain::document::Priority;

/// What a task must accomplish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpecification {
    pub objective: String,
    pub context: String,
    /// Fully inlined requirement lines
    pub requirements: Vec<String>,
    pub payload: TaskPayload,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technical_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edge_cases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_notes: Vec<String>,
}

impl TaskSpecification {
    pub fn new(objective: impl Into<String>, context: impl Into<String>, payload: TaskPayload) -> Self {
        Self {
            objective: objective.into(),
            context: context.into(),
            requirements: Vec::new(),
            payload,
            technical_notes: Vec::new(),
            edge_cases: Vec::new(),
            security_notes: Vec::new(),
        }
    }
}

/// Implementation guidance attached by the enrichment pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Guidance {
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_tier: Option<Tier>,
}

/// Enrichment state of a task
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum EnrichmentStatus {
    #[default]
    NotEnriched,
    Enriched { guidance: Guidance },
    Failed { reason: String },
    Skipped,
}

impl EnrichmentStatus {
    pub fn is_enriched(&self) -> bool {
        matches!(self, EnrichmentStatus::Enriched { .. })
    }
}

/// A generated development task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub tier: Tier,
    pub module: String,
    pub priority: Priority,
    pub dependencies: Vec<TaskId>,
    pub specification: TaskSpecification,
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_cases: Option<Vec<String>>,
    pub estimated_complexity: Complexity,
    pub tags: Vec<String>,
    pub execution_mode: ExecutionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_requirement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default)]
    pub enrichment: EnrichmentStatus,
}

impl Task {
    /// Create a task; tier and complexity are placeholders until classified
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        task_type: TaskType,
        module: impl Into<String>,
        specification: TaskSpecification,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            task_type,
            tier: Tier::T2,
            module: module.into(),
            priority: Priority::Medium,
            dependencies: Vec::new(),
            specification,
            acceptance_criteria: Vec::new(),
            test_cases: None,
            estimated_complexity: Complexity::Simple,
            tags: Vec::new(),
            execution_mode: ExecutionMode::CodeGeneration,
            related_entity: None,
            related_requirement: None,
            route: None,
            enrichment: EnrichmentStatus::NotEnriched,
        }
    }

    /// Add a dependency, ignoring duplicates and self-references
    pub fn with_dependency(mut self, id: TaskId) -> Self {
        self.add_dependency(id);
        self
    }

    /// Add multiple dependencies
    pub fn with_dependencies(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        for id in ids {
            self.add_dependency(id);
        }
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.related_entity = Some(entity.into());
        self
    }

    pub fn with_requirement(mut self, requirement_id: impl Into<String>) -> Self {
        self.related_requirement = Some(requirement_id.into());
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_criteria(mut self, criteria: Vec<String>) -> Self {
        self.acceptance_criteria = criteria;
        self
    }

    pub fn with_test_cases(mut self, cases: Vec<String>) -> Self {
        self.test_cases = Some(cases);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Append a dependency if absent; returns whether it was added
    pub fn add_dependency(&mut self, id: TaskId) -> bool {
        if id == self.id || self.dependencies.contains(&id) {
            return false;
        }
        self.dependencies.push(id);
        true
    }

    /// Check if this task is ready to execute (all dependencies met)
    pub fn is_ready(&self, completed: &[TaskId]) -> bool {
        self.dependencies.iter().all(|dep| completed.contains(dep))
    }

    /// Whether the related entity matches, ignoring ASCII case
    pub fn concerns_entity(&self, entity: &str) -> bool {
        self.related_entity
            .as_deref()
            .is_some_and(|e| e.eq_ignore_ascii_case(entity))
    }
}
