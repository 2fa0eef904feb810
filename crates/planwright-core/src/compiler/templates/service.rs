//! Service-layer template

use super::{MODULE_SERVICES, pascal_case, see};
use crate::compiler::context::{GenerationContext, IdCounter};
use crate::domain::document::{Entity, Priority, RuleKind};
use crate::domain::task::payload::{ServiceMethod, ServicePayload};
use crate::domain::task::{Task, TaskId, TaskPayload, TaskSpecification, TaskType};

pub fn service_name(entity: &str) -> String {
    format!("{}Service", pascal_case(entity))
}

fn methods(entity: &Entity) -> Vec<ServiceMethod> {
    let name = pascal_case(&entity.name);
    let unique_checks = |verb: &str| -> Vec<String> {
        entity
            .unique_fields()
            .map(|f| format!("Check uniqueness of `{}` before {}", f.name, verb))
            .collect()
    };

    let mut create_notes = unique_checks("insert");
    if entity.is_auditable {
        create_notes.push("Stamp created_at and created_by".to_string());
    }
    let mut update_notes = unique_checks("update");
    if entity.is_auditable {
        update_notes.push("Stamp updated_at and updated_by".to_string());
    }
    let delete_notes = if entity.is_soft_delete {
        vec!["Set deleted_at and deleted_by; never remove the row".to_string()]
    } else {
        vec!["Surface foreign-key violations as a conflict, not a 500".to_string()]
    };
    let mut list_notes = vec!["Apply pagination and sorting in the query".to_string()];
    if entity.is_soft_delete {
        list_notes.push("Filter out soft-deleted rows".to_string());
    }

    vec![
        ServiceMethod {
            name: "create".to_string(),
            inputs: vec![format!("Create{}Input", name)],
            output: name.clone(),
            notes: create_notes,
        },
        ServiceMethod {
            name: "list".to_string(),
            inputs: vec!["ListParams { page, page_size, sort_by, sort_order }".to_string()],
            output: format!("Page<{}>", name),
            notes: list_notes,
        },
        ServiceMethod {
            name: "get".to_string(),
            inputs: vec!["id".to_string()],
            output: format!("Option<{}>", name),
            notes: Vec::new(),
        },
        ServiceMethod {
            name: "update".to_string(),
            inputs: vec!["id".to_string(), format!("Update{}Input", name)],
            output: name.clone(),
            notes: update_notes,
        },
        ServiceMethod {
            name: "delete".to_string(),
            inputs: vec!["id".to_string()],
            output: "()".to_string(),
            notes: delete_notes,
        },
    ]
}

/// One service task per entity
///
/// Outbound relationships become collaborator services named in the payload;
/// they are not task dependencies.
pub fn service_task(
    ctx: &GenerationContext<'_>,
    ids: &mut IdCounter,
    entity: &Entity,
    environment: Option<TaskId>,
) -> Task {
    let mut collaborators: Vec<String> = ctx
        .outbound_relationships(&entity.name)
        .filter(|r| !r.target_entity.eq_ignore_ascii_case(&entity.name))
        .map(|r| service_name(&r.target_entity))
        .collect();
    collaborators.dedup();

    let payload = ServicePayload {
        service_name: service_name(&entity.name),
        methods: methods(entity),
        collaborators: collaborators.clone(),
    };

    let mut spec = TaskSpecification::new(
        format!("Implement {} with business logic for {}", payload.service_name, entity.name),
        format!(
            "Sits between the {} endpoints and the `{}` table.",
            entity.name, entity.table_name
        ),
        TaskPayload::Service(payload.clone()),
    );
    for method in &payload.methods {
        spec.requirements.push(format!(
            "{}({}) -> {}",
            method.name,
            method.inputs.join(", "),
            method.output
        ));
        spec.requirements.extend(method.notes.iter().cloned());
    }
    for collaborator in &collaborators {
        spec.requirements
            .push(format!("Resolve related records through {}", collaborator));
    }

    // Calculation and constraint rules of requirements that involve this entity
    let mut rule_ids: Vec<&str> = Vec::new();
    for (requirement, rule) in ctx.document.rules() {
        let involved = requirement.entities.iter().any(|e| entity.is_named(e));
        if involved
            && matches!(rule.kind, RuleKind::Calculation | RuleKind::Constraint)
            && !rule_ids.contains(&rule.id.as_str())
        {
            rule_ids.push(&rule.id);
        }
    }
    spec.requirements.extend(rule_ids.iter().map(|id| see(id)));
    spec.technical_notes
        .push("Run multi-step writes in a single transaction".to_string());
    spec.edge_cases
        .push("Concurrent updates to the same record".to_string());

    let mut task = Task::new(
        ids.mint(),
        format!("Implement {}", payload.service_name),
        TaskType::ServiceLayer,
        MODULE_SERVICES,
        spec,
    )
    .with_priority(Priority::High)
    .with_entity(&entity.name)
    .with_criteria(vec![
        "Every CRUD method is covered by a unit test".to_string(),
        "Uniqueness and referential checks return typed errors".to_string(),
    ])
    .with_tags(["service", "business-logic"]);
    if let Some(environment) = environment {
        task.add_dependency(environment);
    }
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::context::{CompilerInput, GenerationOptions};
    use crate::domain::document::{
        BusinessRule, DataType, Field, FunctionalRequirement, Relationship, RelationshipKind,
        StructuredRequirementDoc,
    };

    #[test]
    fn test_service_lists_unique_checks_and_collaborators() {
        let doc = StructuredRequirementDoc::new("Shop").with_requirement(
            FunctionalRequirement::new("FR-001", "Orders")
                .with_entity("Order")
                .with_rule(BusinessRule::new("BR-001", "Total", RuleKind::Calculation))
                .with_rule(BusinessRule::new("BR-002", "Format", RuleKind::Validation)),
        );
        let entities = vec![
            Entity::new("Order", "orders")
                .with_field(Field::new("number", DataType::String).unique()),
            Entity::new("Customer", "customers"),
        ];
        let relationships = vec![Relationship::new(
            "order_customer",
            ("Order", "customer_id"),
            ("Customer", "id"),
            RelationshipKind::ManyToOne,
        )];
        let mut ids = IdCounter::new();
        let ctx = GenerationContext::build(
            CompilerInput {
                document: Some(&doc),
                entities: &entities,
                relationships: &relationships,
                schema: "",
            },
            GenerationOptions::default(),
            &mut ids,
        )
        .unwrap();

        let task = service_task(&ctx, &mut ids, &entities[0], Some(TaskId::new(1)));
        let TaskPayload::Service(payload) = &task.specification.payload else {
            panic!("expected service payload");
        };
        assert_eq!(payload.service_name, "OrderService");
        assert_eq!(payload.collaborators, vec!["CustomerService".to_string()]);
        assert!(payload.methods[0]
            .notes
            .contains(&"Check uniqueness of `number` before insert".to_string()));
        assert!(task.specification.requirements.contains(&"See BR-001".to_string()));
        assert!(!task.specification.requirements.contains(&"See BR-002".to_string()));
        assert_eq!(task.dependencies, vec![TaskId::new(1)]);
    }
}
