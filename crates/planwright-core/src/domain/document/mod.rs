//! Document model
//!
//! Inputs consumed by the compiler: the structured requirements document,
//! extracted entities and relationships, and the opaque schema text.

pub mod entity;
pub mod requirement;

use serde::{Deserialize, Serialize};

pub use entity::{
    AUDIT_COLUMNS, DataType, Entity, EntityKind, Field, FieldConstraints, Relationship,
    RelationshipKind, SOFT_DELETE_COLUMNS,
};
pub use requirement::{
    BusinessRule, FieldMapping, FunctionalRequirement, Priority, RuleKind, Screen, ScreenAction,
    ScreenKind, StateTransition, StructuredRequirementDoc, WorkflowDefinition,
};

/// All compiler inputs in one serializable bundle
///
/// `document` is optional so that a missing document is reported by the
/// compiler as missing input rather than as a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputBundle {
    #[serde(default)]
    pub document: Option<StructuredRequirementDoc>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub schema: String,
}

impl InputBundle {
    /// Parse a bundle from JSON text
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
