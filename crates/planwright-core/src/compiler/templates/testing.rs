//! Per-entity test coverage template

use super::{MODULE_TESTING, ids_where, plural};
use crate::compiler::context::IdCounter;
use crate::domain::document::Entity;
use crate::domain::task::payload::TestPayload;
use crate::domain::task::{ExecutionMode, Task, TaskPayload, TaskSpecification, TaskType};

fn coverage(entity: &Entity) -> TestPayload {
    let mut unit = vec![
        format!("{} service create/update/delete paths", entity.name),
        format!("Required-field checks for {}", entity.name),
    ];
    unit.extend(
        entity
            .unique_fields()
            .map(|f| format!("Duplicate `{}` is rejected", f.name)),
    );
    let mut integration = vec![
        format!("All five /api/{} endpoints against a real database", entity.route_segment()),
        "Pagination and sorting of the list endpoint".to_string(),
        "401 for unauthenticated requests".to_string(),
    ];
    if entity.is_soft_delete {
        integration.push("Deleted rows disappear from list and get".to_string());
    }
    let e2e = vec![format!(
        "Create, edit and delete a {} through the UI",
        entity.name
    )];

    TestPayload {
        entity: entity.name.clone(),
        unit,
        integration,
        e2e,
    }
}

/// Manual test task for one entity, downstream of its CRUD tasks
pub fn entity_test_task(ids: &mut IdCounter, entity: &Entity, prior: &[Task]) -> Task {
    let payload = coverage(entity);
    let mut spec = TaskSpecification::new(
        format!("Cover {} with unit, integration and E2E tests", entity.name),
        format!("Test plan for the `{}` table and its endpoints.", entity.table_name),
        TaskPayload::Testing(payload.clone()),
    );
    spec.requirements
        .extend(payload.unit.iter().map(|c| format!("Unit: {}", c)));
    spec.requirements
        .extend(payload.integration.iter().map(|c| format!("Integration: {}", c)));
    spec.requirements
        .extend(payload.e2e.iter().map(|c| format!("E2E: {}", c)));

    let crud = ids_where(prior, |t| {
        t.task_type == TaskType::ApiCrud && t.concerns_entity(&entity.name)
    });

    Task::new(
        ids.mint(),
        format!("Test {}", plural(&entity.name)),
        TaskType::Test,
        MODULE_TESTING,
        spec,
    )
    .with_entity(&entity.name)
    .with_mode(ExecutionMode::Manual)
    .with_dependencies(crud)
    .with_criteria(vec![
        "Every listed scenario has a passing test".to_string(),
        "Tests run in CI without manual setup".to_string(),
    ])
    .with_tags(["testing"])
}
