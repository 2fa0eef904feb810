//! CRUD endpoint templates

use super::{MODULE_API, plural};
use crate::compiler::context::{GenerationContext, IdCounter};
use crate::domain::document::{Entity, Field, Priority};
use crate::domain::task::payload::{ApiPayload, ErrorCode};
use crate::domain::task::{CrudOperation, Task, TaskPayload, TaskSpecification, TaskType};

/// Error table shared by every generated endpoint
pub fn error_codes() -> Vec<ErrorCode> {
    [
        (400, "Bad Request: validation failed"),
        (401, "Unauthorized: missing or invalid credentials"),
        (404, "Not Found: record does not exist"),
        (500, "Internal Server Error"),
    ]
    .into_iter()
    .map(|(status, meaning)| ErrorCode {
        status,
        meaning: meaning.to_string(),
    })
    .collect()
}

/// Collection route, e.g. `/api/orders`
pub fn collection_route(entity: &Entity) -> String {
    format!("/api/{}", entity.route_segment())
}

/// Record route, e.g. `/api/orders/:id`
pub fn record_route(entity: &Entity) -> String {
    format!("{}/:{}", collection_route(entity), entity.primary_key_column())
}

pub fn route_for(entity: &Entity, operation: CrudOperation) -> String {
    if operation.targets_record() {
        record_route(entity)
    } else {
        collection_route(entity)
    }
}

fn describe_field(field: &Field) -> String {
    let mut text = format!("{}: {}", field.name, field.data_type.wire_type());
    if field.is_required() {
        text.push_str(" (required)");
    }
    if let Some(values) = &field.enum_values {
        text.push_str(&format!(" [{}]", values.join("|")));
    }
    text
}

fn payload_for(entity: &Entity, operation: CrudOperation) -> ApiPayload {
    let request_fields = match operation {
        CrudOperation::Create | CrudOperation::Update => {
            entity.editable_fields().map(describe_field).collect()
        }
        _ => Vec::new(),
    };
    let query_params = match operation {
        CrudOperation::List => {
            let mut params: Vec<String> = ["page", "page_size", "sort_by", "sort_order"]
                .iter()
                .map(|p| p.to_string())
                .collect();
            params.extend(
                entity
                    .fields
                    .iter()
                    .filter(|f| f.constraints.indexed)
                    .map(|f| format!("filter[{}]", f.name)),
            );
            params
        }
        _ => Vec::new(),
    };
    let response_shape = match operation {
        CrudOperation::Create => format!("201 Created with the {} record", entity.name),
        CrudOperation::List => format!(
            "200 OK with {{ items: {}[], total, page, page_size }}",
            entity.name
        ),
        CrudOperation::Get | CrudOperation::Update => format!("200 OK with the {} record", entity.name),
        CrudOperation::Delete => "204 No Content".to_string(),
    };

    ApiPayload {
        operation,
        method: operation.http_method().to_string(),
        route: route_for(entity, operation),
        request_fields,
        response_shape,
        query_params,
        error_codes: error_codes(),
    }
}

fn title_for(entity: &Entity, operation: CrudOperation) -> String {
    match operation {
        CrudOperation::Create => format!("Create {} endpoint", entity.name),
        CrudOperation::List => format!("List {} endpoint", plural(&entity.name)),
        CrudOperation::Get => format!("Get {} by id endpoint", entity.name),
        CrudOperation::Update => format!("Update {} endpoint", entity.name),
        CrudOperation::Delete => format!("Delete {} endpoint", entity.name),
    }
}

fn requirement_lines(entity: &Entity, payload: &ApiPayload) -> Vec<String> {
    let mut lines = vec![format!("Implement {} {}", payload.method, payload.route)];
    if !payload.request_fields.is_empty() {
        lines.push(format!("Request body: {}", payload.request_fields.join(", ")));
    }
    if !payload.query_params.is_empty() {
        lines.push(format!("Query parameters: {}", payload.query_params.join(", ")));
    }
    lines.push(format!("Response: {}", payload.response_shape));

    match payload.operation {
        CrudOperation::Create | CrudOperation::Update => {
            for field in entity.editable_fields().filter(|f| f.is_required()) {
                lines.push(format!("Reject requests missing `{}` with 400", field.name));
            }
            for field in entity.unique_fields() {
                lines.push(format!("Reject duplicate `{}` values with 400", field.name));
            }
        }
        CrudOperation::List => {
            lines.push("Default page size is 20; page_size is capped at 100".to_string());
            if entity.is_soft_delete {
                lines.push("Exclude rows with `deleted_at` set".to_string());
            }
        }
        CrudOperation::Get => {
            lines.push(format!("Return 404 when the {} does not exist", entity.name));
        }
        CrudOperation::Delete => {
            if entity.is_soft_delete {
                lines.push("Set `deleted_at` instead of removing the row".to_string());
            } else {
                lines.push("Remove the row; referenced rows block deletion".to_string());
            }
        }
    }
    if entity.is_auditable && payload.operation != CrudOperation::List {
        lines.push("Populate audit columns from the authenticated user".to_string());
    }
    let codes: Vec<String> = payload
        .error_codes
        .iter()
        .map(|c| format!("{} {}", c.status, c.meaning))
        .collect();
    lines.push(format!("Error responses: {}", codes.join("; ")));
    lines
}

fn acceptance_criteria(entity: &Entity, payload: &ApiPayload) -> Vec<String> {
    let mut criteria = vec![format!(
        "{} {} returns {}",
        payload.method, payload.route, payload.response_shape
    )];
    criteria.push("Unauthenticated requests receive 401".to_string());
    match payload.operation {
        CrudOperation::Create | CrudOperation::Update => {
            criteria.push("Invalid payloads receive 400 with field-level messages".to_string());
        }
        CrudOperation::List => {
            criteria.push("Pagination and sorting parameters are honored".to_string());
        }
        CrudOperation::Get | CrudOperation::Delete => {
            criteria.push(format!("Unknown {} ids receive 404", entity.name));
        }
    }
    criteria
}

/// Five CRUD tasks for one entity, in create/list/get/update/delete order
pub fn crud_tasks(ctx: &GenerationContext<'_>, ids: &mut IdCounter, entity: &Entity) -> Vec<Task> {
    let migration = ctx.migration_id(&entity.name);
    CrudOperation::ALL
        .iter()
        .map(|&operation| {
            let payload = payload_for(entity, operation);
            let mut spec = TaskSpecification::new(
                format!(
                    "Expose the {} operation for {} over HTTP",
                    operation.as_str(),
                    entity.name
                ),
                format!(
                    "REST endpoint backed by the `{}` table.",
                    entity.table_name
                ),
                TaskPayload::Api(payload.clone()),
            );
            spec.requirements = requirement_lines(entity, &payload);
            spec.security_notes
                .push("Require an authenticated session".to_string());
            if operation == CrudOperation::List {
                spec.edge_cases
                    .push("Empty collection returns items: [] with total 0".to_string());
                spec.edge_cases
                    .push("Unknown sort_by field falls back to the primary key".to_string());
            }
            if operation.targets_record() {
                spec.edge_cases.push(format!(
                    "Malformed `{}` path parameter returns 400",
                    entity.primary_key_column()
                ));
            }
            if matches!(operation, CrudOperation::Create | CrudOperation::Update) {
                spec.security_notes
                    .push("Ignore client-supplied primary key and audit columns".to_string());
            }

            let mut task = Task::new(
                ids.mint(),
                title_for(entity, operation),
                TaskType::ApiCrud,
                MODULE_API,
                spec,
            )
            .with_priority(Priority::High)
            .with_entity(&entity.name)
            .with_criteria(acceptance_criteria(entity, &payload))
            .with_tags(["api", "crud", operation.as_str()]);
            if let Some(migration) = migration {
                task.add_dependency(migration);
            }
            task
        })
        .collect()
}
