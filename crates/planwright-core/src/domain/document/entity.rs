//! Extracted data entities and relationships
//!
//! These come from the entity extractor and describe the relational shape
//! the generated plan targets.

use serde::{Deserialize, Serialize};

/// Columns added to every audit-tracked table
pub const AUDIT_COLUMNS: [&str; 4] = ["created_at", "updated_at", "created_by", "updated_by"];

/// Columns added to every soft-delete table
pub const SOFT_DELETE_COLUMNS: [&str; 2] = ["deleted_at", "deleted_by"];

/// Role an entity plays in the data model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Master,
    Transaction,
    Reference,
    Lookup,
    Junction,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Master => "master",
            EntityKind::Transaction => "transaction",
            EntityKind::Reference => "reference",
            EntityKind::Lookup => "lookup",
            EntityKind::Junction => "junction",
        }
    }
}

/// Abstract field type, mapped to a concrete column type by [`DataType::sql_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[default]
    String,
    Text,
    Integer,
    Decimal,
    Boolean,
    Date,
    Datetime,
    Uuid,
    Json,
    Enum,
}

impl DataType {
    /// Concrete column type for migrations
    pub fn sql_type(&self) -> &'static str {
        match self {
            DataType::String => "VARCHAR(255)",
            DataType::Text => "TEXT",
            DataType::Integer => "INTEGER",
            DataType::Decimal => "DECIMAL(12,2)",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Datetime => "TIMESTAMP",
            DataType::Uuid => "UUID",
            DataType::Json => "JSONB",
            DataType::Enum => "VARCHAR(50)",
        }
    }

    /// Type name used for API request/response shapes and client calls
    pub fn wire_type(&self) -> &'static str {
        match self {
            DataType::String | DataType::Text | DataType::Uuid | DataType::Enum => "string",
            DataType::Integer | DataType::Decimal => "number",
            DataType::Boolean => "boolean",
            DataType::Date | DataType::Datetime => "string (ISO-8601)",
            DataType::Json => "object",
        }
    }
}

/// Column constraints attached to a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConstraints {
    pub primary_key: bool,
    pub unique: bool,
    pub nullable: bool,
    pub indexed: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Default for FieldConstraints {
    fn default() -> Self {
        Self {
            primary_key: false,
            unique: false,
            nullable: true,
            indexed: false,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
        }
    }
}

/// A single entity attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub column_name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default)]
    pub constraints: FieldConstraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl Field {
    /// Create a nullable field whose column name equals its name
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            column_name: name.clone(),
            name,
            data_type,
            constraints: FieldConstraints::default(),
            enum_values: None,
            default_value: None,
        }
    }

    /// Override the column name
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column_name = column.into();
        self
    }

    /// Mark as primary key (implies not-null)
    pub fn primary_key(mut self) -> Self {
        self.constraints.primary_key = true;
        self.constraints.nullable = false;
        self
    }

    /// Mark as not-null
    pub fn required(mut self) -> Self {
        self.constraints.nullable = false;
        self
    }

    /// Mark as unique
    pub fn unique(mut self) -> Self {
        self.constraints.unique = true;
        self
    }

    /// Mark as indexed
    pub fn indexed(mut self) -> Self {
        self.constraints.indexed = true;
        self
    }

    /// Set enum values (also switches the type to enum)
    pub fn with_enum_values(mut self, values: Vec<String>) -> Self {
        self.data_type = DataType::Enum;
        self.enum_values = Some(values);
        self
    }

    /// Set a default value
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Not-null and not the primary key
    pub fn is_required(&self) -> bool {
        !self.constraints.nullable && !self.constraints.primary_key
    }

    /// Audit or soft-delete bookkeeping column
    pub fn is_bookkeeping(&self) -> bool {
        let column = self.column_name.to_ascii_lowercase();
        AUDIT_COLUMNS.contains(&column.as_str()) || SOFT_DELETE_COLUMNS.contains(&column.as_str())
    }

    /// Human-readable bounds, e.g. "length 3..=50"
    pub fn bounds_description(&self) -> Option<String> {
        let c = &self.constraints;
        let mut parts = Vec::new();
        match (c.min_length, c.max_length) {
            (Some(min), Some(max)) => parts.push(format!("length {}..={}", min, max)),
            (Some(min), None) => parts.push(format!("length >= {}", min)),
            (None, Some(max)) => parts.push(format!("length <= {}", max)),
            (None, None) => {}
        }
        match (c.min, c.max) {
            (Some(min), Some(max)) => parts.push(format!("value {}..={}", min, max)),
            (Some(min), None) => parts.push(format!("value >= {}", min)),
            (None, Some(max)) => parts.push(format!("value <= {}", max)),
            (None, None) => {}
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// A data entity extracted from the requirements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub table_name: String,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub is_auditable: bool,
    #[serde(default)]
    pub is_soft_delete: bool,
}

impl Entity {
    /// Create an entity with no fields
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            kind: EntityKind::Master,
            fields: Vec::new(),
            is_auditable: false,
            is_soft_delete: false,
        }
    }

    /// Add a field
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Set the entity kind
    pub fn with_kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    /// Enable audit columns
    pub fn auditable(mut self) -> Self {
        self.is_auditable = true;
        self
    }

    /// Enable soft delete
    pub fn soft_delete(mut self) -> Self {
        self.is_soft_delete = true;
        self
    }

    /// Primary key column, `id` when no field is flagged
    pub fn primary_key_column(&self) -> &str {
        self.fields
            .iter()
            .find(|f| f.constraints.primary_key)
            .map(|f| f.column_name.as_str())
            .unwrap_or("id")
    }

    /// Whether a field carries the primary key
    pub fn has_declared_primary_key(&self) -> bool {
        self.fields.iter().any(|f| f.constraints.primary_key)
    }

    /// Fields a client may write: no primary key, no audit or soft-delete columns
    pub fn editable_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(|f| !f.constraints.primary_key && !f.is_bookkeeping())
    }

    /// Fields marked unique (excluding the primary key)
    pub fn unique_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(|f| f.constraints.unique && !f.constraints.primary_key)
    }

    /// URL segment for this entity's endpoints
    pub fn route_segment(&self) -> String {
        self.table_name.to_ascii_lowercase().replace('_', "-")
    }

    /// Whether the name matches, ignoring ASCII case
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Cardinality of a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::OneToOne => "one-to-one",
            RelationshipKind::OneToMany => "one-to-many",
            RelationshipKind::ManyToOne => "many-to-one",
            RelationshipKind::ManyToMany => "many-to-many",
        }
    }
}

/// A named link between two entity/field pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub name: String,
    pub source_entity: String,
    pub source_field: String,
    pub target_entity: String,
    pub target_field: String,
    pub kind: RelationshipKind,
}

impl Relationship {
    pub fn new(
        name: impl Into<String>,
        source: (&str, &str),
        target: (&str, &str),
        kind: RelationshipKind,
    ) -> Self {
        Self {
            name: name.into(),
            source_entity: source.0.to_string(),
            source_field: source.1.to_string(),
            target_entity: target.0.to_string(),
            target_field: target.1.to_string(),
            kind,
        }
    }

    /// Whether this relationship originates at the named entity
    pub fn starts_at(&self, entity: &str) -> bool {
        self.source_entity.eq_ignore_ascii_case(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editable_fields_skip_key_and_bookkeeping() {
        let entity = Entity::new("Order", "orders")
            .with_field(Field::new("id", DataType::Uuid).primary_key())
            .with_field(Field::new("total", DataType::Decimal).required())
            .with_field(Field::new("created_at", DataType::Datetime));

        let editable: Vec<&str> = entity.editable_fields().map(|f| f.name.as_str()).collect();
        assert_eq!(editable, vec!["total"]);
    }

    #[test]
    fn test_primary_key_column_defaults_to_id() {
        let entity = Entity::new("Tag", "tags").with_field(Field::new("label", DataType::String));
        assert_eq!(entity.primary_key_column(), "id");
        assert!(!entity.has_declared_primary_key());

        let keyed = Entity::new("Tag", "tags")
            .with_field(Field::new("code", DataType::String).with_column("tag_code").primary_key());
        assert_eq!(keyed.primary_key_column(), "tag_code");
    }

    #[test]
    fn test_field_constraints_default_nullable() {
        let field: Field = serde_json::from_str(
            r#"{"name":"email","column_name":"email","data_type":"string","constraints":{"unique":true}}"#,
        )
        .unwrap();
        assert!(field.constraints.nullable);
        assert!(field.constraints.unique);
        assert!(!field.is_required());
    }

    #[test]
    fn test_bounds_description() {
        let mut field = Field::new("name", DataType::String);
        field.constraints.min_length = Some(3);
        field.constraints.max_length = Some(50);
        assert_eq!(field.bounds_description().as_deref(), Some("length 3..=50"));
        assert_eq!(Field::new("x", DataType::Integer).bounds_description(), None);
    }

    #[test]
    fn test_relationship_kind_serde() {
        let kind: RelationshipKind = serde_json::from_str("\"many-to-one\"").unwrap();
        assert_eq!(kind, RelationshipKind::ManyToOne);
        assert_eq!(kind.as_str(), "many-to-one");
    }

    #[test]
    fn test_route_segment() {
        let entity = Entity::new("OrderLine", "order_lines");
        assert_eq!(entity.route_segment(), "order-lines");
    }
}
