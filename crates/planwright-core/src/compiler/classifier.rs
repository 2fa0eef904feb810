//! Tier and complexity classifier
//!
//! Both come from fixed per-family tables, never from the task's content.
//! T4 is not assigned here; only enrichment guidance can raise a task to it.

use crate::domain::task::{Complexity, Task, TaskType, Tier};

pub fn tier_for(task_type: TaskType) -> Tier {
    match task_type {
        TaskType::DatabaseMigration
        | TaskType::UiList
        | TaskType::UiDetail
        | TaskType::UiModal
        | TaskType::UiDashboard
        | TaskType::UiReport
        | TaskType::EnvironmentSetup => Tier::T1,
        TaskType::Workflow | TaskType::E2eFlow | TaskType::Integration => Tier::T3,
        TaskType::ApiCrud
        | TaskType::ApiCustom
        | TaskType::UiForm
        | TaskType::Validation
        | TaskType::BusinessLogic
        | TaskType::Test
        | TaskType::Documentation
        | TaskType::ServiceLayer
        | TaskType::ApiClient
        | TaskType::TestSetup
        | TaskType::PageComposition
        | TaskType::RouteConfig
        | TaskType::Navigation => Tier::T2,
    }
}

pub fn complexity_for(task_type: TaskType) -> Complexity {
    match task_type {
        TaskType::Workflow | TaskType::E2eFlow | TaskType::Integration => Complexity::Complex,
        TaskType::UiForm
        | TaskType::ServiceLayer
        | TaskType::PageComposition
        | TaskType::BusinessLogic => Complexity::Moderate,
        TaskType::Documentation => Complexity::Trivial,
        _ => Complexity::Simple,
    }
}

/// Stamp tier and complexity on every task
pub fn classify(tasks: &mut [Task]) {
    for task in tasks.iter_mut() {
        task.tier = tier_for(task.task_type);
        task.estimated_complexity = complexity_for(task.task_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_table() {
        assert_eq!(tier_for(TaskType::DatabaseMigration), Tier::T1);
        assert_eq!(tier_for(TaskType::UiForm), Tier::T2);
        assert_eq!(tier_for(TaskType::UiList), Tier::T1);
        assert_eq!(tier_for(TaskType::ApiCrud), Tier::T2);
        assert_eq!(tier_for(TaskType::Workflow), Tier::T3);
        assert_eq!(tier_for(TaskType::E2eFlow), Tier::T3);
        assert_eq!(tier_for(TaskType::EnvironmentSetup), Tier::T1);
        assert_eq!(tier_for(TaskType::TestSetup), Tier::T2);
        assert!(TaskType::ALL.iter().all(|t| tier_for(*t) != Tier::T4));
    }

    #[test]
    fn test_complexity_table() {
        assert_eq!(complexity_for(TaskType::DatabaseMigration), Complexity::Simple);
        assert_eq!(complexity_for(TaskType::Workflow), Complexity::Complex);
        assert_eq!(complexity_for(TaskType::UiForm), Complexity::Moderate);
        assert_eq!(complexity_for(TaskType::UiList), Complexity::Simple);
    }
}
