//! Task classification enums and the task identifier

use serde::{Deserialize, Serialize};

/// Closed set of task types emitted in a task set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    DatabaseMigration,
    ApiCrud,
    ApiCustom,
    UiList,
    UiForm,
    UiDetail,
    UiModal,
    UiDashboard,
    UiReport,
    Validation,
    BusinessLogic,
    Workflow,
    Integration,
    Test,
    Documentation,
    EnvironmentSetup,
    ServiceLayer,
    ApiClient,
    E2eFlow,
    TestSetup,
    PageComposition,
    RouteConfig,
    Navigation,
}

impl TaskType {
    pub const ALL: [TaskType; 23] = [
        TaskType::DatabaseMigration,
        TaskType::ApiCrud,
        TaskType::ApiCustom,
        TaskType::UiList,
        TaskType::UiForm,
        TaskType::UiDetail,
        TaskType::UiModal,
        TaskType::UiDashboard,
        TaskType::UiReport,
        TaskType::Validation,
        TaskType::BusinessLogic,
        TaskType::Workflow,
        TaskType::Integration,
        TaskType::Test,
        TaskType::Documentation,
        TaskType::EnvironmentSetup,
        TaskType::ServiceLayer,
        TaskType::ApiClient,
        TaskType::E2eFlow,
        TaskType::TestSetup,
        TaskType::PageComposition,
        TaskType::RouteConfig,
        TaskType::Navigation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::DatabaseMigration => "database-migration",
            TaskType::ApiCrud => "api-crud",
            TaskType::ApiCustom => "api-custom",
            TaskType::UiList => "ui-list",
            TaskType::UiForm => "ui-form",
            TaskType::UiDetail => "ui-detail",
            TaskType::UiModal => "ui-modal",
            TaskType::UiDashboard => "ui-dashboard",
            TaskType::UiReport => "ui-report",
            TaskType::Validation => "validation",
            TaskType::BusinessLogic => "business-logic",
            TaskType::Workflow => "workflow",
            TaskType::Integration => "integration",
            TaskType::Test => "test",
            TaskType::Documentation => "documentation",
            TaskType::EnvironmentSetup => "environment-setup",
            TaskType::ServiceLayer => "service-layer",
            TaskType::ApiClient => "api-client",
            TaskType::E2eFlow => "e2e-flow",
            TaskType::TestSetup => "test-setup",
            TaskType::PageComposition => "page-composition",
            TaskType::RouteConfig => "route-config",
            TaskType::Navigation => "navigation",
        }
    }

    /// Screen-level UI tasks
    pub fn is_ui(&self) -> bool {
        matches!(
            self,
            TaskType::UiList
                | TaskType::UiForm
                | TaskType::UiDetail
                | TaskType::UiModal
                | TaskType::UiDashboard
                | TaskType::UiReport
        )
    }

    /// Server endpoint and client tasks
    pub fn is_api(&self) -> bool {
        matches!(self, TaskType::ApiCrud | TaskType::ApiCustom | TaskType::ApiClient)
    }

    /// Whether a task of this type must sit downstream of its entity's migration
    pub fn requires_entity_migration(&self) -> bool {
        self.is_api() || self.is_ui() || *self == TaskType::ServiceLayer
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution tier, from mechanical (T1) to architecture-level (T4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    T1,
    T2,
    T3,
    T4,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::T1, Tier::T2, Tier::T3, Tier::T4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::T1 => "T1",
            Tier::T2 => "T2",
            Tier::T3 => "T3",
            Tier::T4 => "T4",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal complexity estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Complexity {
    Trivial,
    #[default]
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

impl Complexity {
    /// 1 (trivial) through 5 (very complex)
    pub fn ordinal(&self) -> u8 {
        match self {
            Complexity::Trivial => 1,
            Complexity::Simple => 2,
            Complexity::Moderate => 3,
            Complexity::Complex => 4,
            Complexity::VeryComplex => 5,
        }
    }

    /// Bucket an average ordinal score
    pub fn from_average(average: f64) -> Self {
        if average < 1.5 {
            Complexity::Trivial
        } else if average < 2.5 {
            Complexity::Simple
        } else if average < 3.5 {
            Complexity::Moderate
        } else if average < 4.5 {
            Complexity::Complex
        } else {
            Complexity::VeryComplex
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Trivial => "trivial",
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
            Complexity::VeryComplex => "very-complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a task gets done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    #[default]
    CodeGeneration,
    Manual,
    /// Already satisfied by prior provisioning
    Skip,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::CodeGeneration => "code-generation",
            ExecutionMode::Manual => "manual",
            ExecutionMode::Skip => "skip",
        }
    }
}

/// Task identifier, rendered as `TASK-001`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(u32);

impl TaskId {
    pub fn new(sequence: u32) -> Self {
        Self(sequence)
    }

    /// Position in generation order, starting at 1
    pub fn sequence(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TASK-{:03}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.strip_prefix("TASK-")
            .and_then(|n| n.parse::<u32>().ok())
            .map(TaskId)
            .ok_or_else(|| format!("invalid task id '{}'", s))
    }
}

impl TryFrom<String> for TaskId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_serde_matches_as_str() {
        for task_type in TaskType::ALL {
            let json = serde_json::to_string(&task_type).unwrap();
            assert_eq!(json, format!("\"{}\"", task_type.as_str()));
        }
    }

    #[test]
    fn test_migration_families() {
        assert!(TaskType::ApiCrud.requires_entity_migration());
        assert!(TaskType::UiForm.requires_entity_migration());
        assert!(TaskType::ServiceLayer.requires_entity_migration());
        assert!(!TaskType::PageComposition.requires_entity_migration());
        assert!(!TaskType::Validation.requires_entity_migration());
    }

    #[test]
    fn test_complexity_buckets() {
        assert_eq!(Complexity::from_average(1.0), Complexity::Trivial);
        assert_eq!(Complexity::from_average(1.5), Complexity::Simple);
        assert_eq!(Complexity::from_average(2.6), Complexity::Moderate);
        assert_eq!(Complexity::from_average(3.5), Complexity::Complex);
        assert_eq!(Complexity::from_average(4.5), Complexity::VeryComplex);
    }

    #[test]
    fn test_task_id_format_and_parse() {
        let id = TaskId::new(7);
        assert_eq!(id.to_string(), "TASK-007");
        assert_eq!("TASK-007".parse::<TaskId>().unwrap(), id);
        assert_eq!(TaskId::new(1234).to_string(), "TASK-1234");
        assert!("JOB-1".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_task_id_serializes_as_string() {
        let json = serde_json::to_string(&TaskId::new(12)).unwrap();
        assert_eq!(json, "\"TASK-012\"");
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sequence(), 12);
    }
}
