//! Schema-migration template

use tracing::debug;

use super::MODULE_DATABASE;
use crate::compiler::context::GenerationContext;
use crate::domain::document::{AUDIT_COLUMNS, Entity, Field, Priority, RelationshipKind, SOFT_DELETE_COLUMNS};
use crate::domain::task::payload::{ColumnSpec, DatabasePayload, ForeignKeySpec, IndexSpec};
use crate::domain::task::{Task, TaskPayload, TaskSpecification, TaskType};
use crate::error::{Error, Result};

pub const ON_DELETE: &str = "RESTRICT";
pub const ON_UPDATE: &str = "CASCADE";

/// Build the migration task for one entity, using its reserved id
pub fn migration_task(ctx: &GenerationContext<'_>, entity: &Entity) -> Result<Task> {
    let id = ctx.migration_id(&entity.name).ok_or_else(|| {
        Error::Generation(format!("no migration id reserved for entity '{}'", entity.name))
    })?;

    let payload = database_payload(ctx, entity);
    debug!(
        entity = %entity.name,
        columns = payload.columns.len(),
        foreign_keys = payload.foreign_keys.len(),
        "Schema template"
    );

    let mut spec = TaskSpecification::new(
        format!("Create the `{}` table for the {} entity", entity.table_name, entity.name),
        format!(
            "{} is a {} entity with {} declared fields.",
            entity.name,
            entity.kind.as_str(),
            entity.fields.len()
        ),
        TaskPayload::Database(payload.clone()),
    );
    spec.requirements = requirement_lines(entity, &payload);
    if !ctx.schema.trim().is_empty() {
        spec.technical_notes.push(format!(
            "Column names and types must match the `{}` table in the generated schema",
            entity.table_name
        ));
    }
    spec.technical_notes
        .push("Write both up and down migrations".to_string());
    spec.edge_cases.push(format!(
        "A table named `{}` already exists",
        entity.table_name
    ));
    if !payload.foreign_keys.is_empty() {
        spec.edge_cases
            .push("Referenced tables must exist before this migration runs".to_string());
    }

    let criteria = acceptance_criteria(entity, &payload);

    Ok(Task::new(
        id,
        format!("Create {} table migration", entity.name),
        TaskType::DatabaseMigration,
        MODULE_DATABASE,
        spec,
    )
    .with_priority(Priority::High)
    .with_entity(&entity.name)
    .with_criteria(criteria)
    .with_tags(["database", "migration", entity.table_name.as_str()]))
}

fn column_for(field: &Field) -> ColumnSpec {
    ColumnSpec {
        name: field.column_name.clone(),
        sql_type: field.data_type.sql_type().to_string(),
        nullable: field.constraints.nullable && !field.constraints.primary_key,
        unique: field.constraints.unique,
        default_value: field.default_value.clone(),
    }
}

fn bookkeeping_column(name: &str) -> ColumnSpec {
    let (sql_type, nullable, default_value) = match name {
        "created_at" | "updated_at" => ("TIMESTAMP", false, Some("CURRENT_TIMESTAMP".to_string())),
        "deleted_at" => ("TIMESTAMP", true, None),
        _ => ("VARCHAR(255)", true, None),
    };
    ColumnSpec {
        name: name.to_string(),
        sql_type: sql_type.to_string(),
        nullable,
        unique: false,
        default_value,
    }
}

/// Columns, keys and indexes for the entity's table
pub fn database_payload(ctx: &GenerationContext<'_>, entity: &Entity) -> DatabasePayload {
    let mut columns = Vec::new();
    if !entity.has_declared_primary_key() {
        columns.push(ColumnSpec {
            name: "id".to_string(),
            sql_type: "UUID".to_string(),
            nullable: false,
            unique: false,
            default_value: None,
        });
    }
    columns.extend(entity.fields.iter().map(column_for));

    let mut add_missing = |names: &[&str]| {
        for name in names {
            if !columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
                columns.push(bookkeeping_column(name));
            }
        }
    };
    if entity.is_auditable {
        add_missing(&AUDIT_COLUMNS[..]);
    }
    if entity.is_soft_delete {
        add_missing(&SOFT_DELETE_COLUMNS[..]);
    }

    let indexes = entity
        .fields
        .iter()
        .filter(|f| f.constraints.indexed && !f.constraints.primary_key)
        .map(|f| IndexSpec {
            name: format!("idx_{}_{}", entity.table_name, f.column_name),
            columns: vec![f.column_name.clone()],
            unique: f.constraints.unique,
        })
        .collect();

    let foreign_keys = ctx
        .outbound_relationships(&entity.name)
        .filter(|r| r.kind != RelationshipKind::ManyToMany)
        .map(|r| {
            let column = entity
                .fields
                .iter()
                .find(|f| f.name == r.source_field || f.column_name == r.source_field)
                .map(|f| f.column_name.clone())
                .unwrap_or_else(|| r.source_field.clone());
            ForeignKeySpec {
                column,
                references_table: ctx.table_for(&r.target_entity),
                references_column: r.target_field.clone(),
                on_delete: ON_DELETE.to_string(),
                on_update: ON_UPDATE.to_string(),
            }
        })
        .collect();

    DatabasePayload {
        table_name: entity.table_name.clone(),
        columns,
        primary_key: entity.primary_key_column().to_string(),
        indexes,
        foreign_keys,
        audit_columns: entity.is_auditable,
        soft_delete: entity.is_soft_delete,
    }
}

fn describe_column(column: &ColumnSpec, field: Option<&Field>) -> String {
    let mut line = format!("Column `{}` {}", column.name, column.sql_type);
    line.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
    if column.unique {
        line.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default_value {
        line.push_str(&format!(" DEFAULT {}", default));
    }
    if let Some(field) = field {
        if let Some(values) = &field.enum_values {
            line.push_str(&format!(" (one of: {})", values.join(", ")));
        }
        if let Some(bounds) = field.bounds_description() {
            line.push_str(&format!(" ({})", bounds));
        }
    }
    line
}

fn requirement_lines(entity: &Entity, payload: &DatabasePayload) -> Vec<String> {
    let mut lines = vec![format!(
        "Create table `{}` for entity {}",
        payload.table_name, entity.name
    )];
    for column in &payload.columns {
        let field = entity.fields.iter().find(|f| f.column_name == column.name);
        lines.push(describe_column(column, field));
    }
    lines.push(format!("Primary key on `{}`", payload.primary_key));
    for index in &payload.indexes {
        let kind = if index.unique { "Unique index" } else { "Index" };
        lines.push(format!("{} `{}` on ({})", kind, index.name, index.columns.join(", ")));
    }
    for fk in &payload.foreign_keys {
        lines.push(format!(
            "Foreign key `{}` references {}({}) ON DELETE {} ON UPDATE {}",
            fk.column, fk.references_table, fk.references_column, fk.on_delete, fk.on_update
        ));
    }
    if entity.is_auditable {
        lines.push(format!("Add audit columns: {}", AUDIT_COLUMNS.join(", ")));
    }
    if entity.is_soft_delete {
        lines.push(format!("Add soft-delete columns: {}", SOFT_DELETE_COLUMNS.join(", ")));
    }
    lines
}

fn acceptance_criteria(entity: &Entity, payload: &DatabasePayload) -> Vec<String> {
    let mut criteria = vec![
        format!("Table `{}` exists in the database", payload.table_name),
        format!(
            "All {} columns exist with the specified types",
            payload.columns.len()
        ),
        format!("Primary key is defined on `{}`", payload.primary_key),
    ];

    let not_null: Vec<&str> = entity
        .fields
        .iter()
        .filter(|f| f.is_required())
        .map(|f| f.column_name.as_str())
        .collect();
    if !not_null.is_empty() {
        criteria.push(format!("NOT NULL is enforced on: {}", not_null.join(", ")));
    }
    let unique: Vec<&str> = entity.unique_fields().map(|f| f.column_name.as_str()).collect();
    if !unique.is_empty() {
        criteria.push(format!("UNIQUE is enforced on: {}", unique.join(", ")));
    }
    if !payload.indexes.is_empty() {
        criteria.push(format!("{} index(es) are created", payload.indexes.len()));
    }
    if !payload.foreign_keys.is_empty() {
        criteria.push(format!(
            "Foreign keys reject orphaned references (ON DELETE {})",
            ON_DELETE
        ));
    }
    if entity.is_auditable {
        criteria.push("Audit columns are populated on insert and update".to_string());
    }
    if entity.is_soft_delete {
        criteria.push("Soft-deleted rows keep `deleted_at` set instead of being removed".to_string());
    }
    criteria.push("The down migration drops the table cleanly".to_string());
    criteria
}
