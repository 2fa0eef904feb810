//! Generation context
//!
//! Normalizes the compiler inputs into an immutable context threaded through
//! every template, plus the id counter that mints task ids.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::document::{
    Entity, FunctionalRequirement, InputBundle, Relationship, Screen, StructuredRequirementDoc,
};
use crate::domain::task::TaskId;
use crate::error::{Error, Result};

/// Where rules and screens the parser could not attach end up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// Attach to the first requirement, or to a placeholder when there is none
    #[default]
    FirstRequirement,
    /// Ignore them
    Drop,
}

impl OrphanPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrphanPolicy::FirstRequirement => "first-requirement",
            OrphanPolicy::Drop => "drop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "first-requirement" => Some(OrphanPolicy::FirstRequirement),
            "drop" => Some(OrphanPolicy::Drop),
            _ => None,
        }
    }
}

/// Id of the requirement synthesized to own orphans in an empty document
pub const PLACEHOLDER_REQUIREMENT_ID: &str = "FR-000";

/// Knobs that change what the compiler emits
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Inline referenced rules/screens/requirements into requirement lines
    pub expand_references: bool,
    /// Environment and test setup already ran; emit those tasks as `skip`
    pub environment_provisioned: bool,
    pub orphan_policy: OrphanPolicy,
    /// Timestamp stamped on the task set
    pub generated_at: DateTime<Utc>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            expand_references: true,
            environment_provisioned: false,
            orphan_policy: OrphanPolicy::FirstRequirement,
            generated_at: DateTime::UNIX_EPOCH,
        }
    }
}

/// Borrowed view of the four compiler inputs
#[derive(Debug, Clone, Copy)]
pub struct CompilerInput<'a> {
    pub document: Option<&'a StructuredRequirementDoc>,
    pub entities: &'a [Entity],
    pub relationships: &'a [Relationship],
    pub schema: &'a str,
}

impl<'a> From<&'a InputBundle> for CompilerInput<'a> {
    fn from(bundle: &'a InputBundle) -> Self {
        Self {
            document: bundle.document.as_ref(),
            entities: &bundle.entities,
            relationships: &bundle.relationships,
            schema: &bundle.schema,
        }
    }
}

/// Mints task ids in strictly increasing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCounter {
    next: u32,
}

impl IdCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Hand out the next id
    pub fn mint(&mut self) -> TaskId {
        let id = TaskId::new(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u32 {
        self.next - 1
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Entity name (case-insensitive) to its schema-migration task id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationIndex {
    by_entity: BTreeMap<String, TaskId>,
}

impl MigrationIndex {
    pub fn insert(&mut self, entity: &str, id: TaskId) {
        self.by_entity.insert(entity.to_ascii_lowercase(), id);
    }

    pub fn get(&self, entity: &str) -> Option<TaskId> {
        self.by_entity.get(&entity.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

/// A screen that survived route de-duplication, with its owning requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedScreen {
    pub requirement_id: String,
    pub screen: Screen,
}

impl PlacedScreen {
    pub fn route(&self) -> &str {
        &self.screen.route
    }
}

/// Normalized, immutable inputs for one generation run
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub document: StructuredRequirementDoc,
    pub entities: &'a [Entity],
    pub relationships: &'a [Relationship],
    pub schema: &'a str,
    pub options: GenerationOptions,
    migrations: MigrationIndex,
    screens: Vec<PlacedScreen>,
}

impl<'a> GenerationContext<'a> {
    /// Validate the inputs and build the context
    ///
    /// Reserves one migration id per entity from `ids`, so the schema family
    /// owns the first ids of the set.
    pub fn build(
        input: CompilerInput<'a>,
        options: GenerationOptions,
        ids: &mut IdCounter,
    ) -> Result<Self> {
        let document = input
            .document
            .ok_or_else(|| Error::MissingInput("no requirements document supplied".to_string()))?;
        if input.entities.is_empty() {
            return Err(Error::MissingInput("no entities supplied".to_string()));
        }
        check_entities(input.entities)?;

        let document = attach_orphans(document.clone(), options.orphan_policy);
        let screens = place_screens(&document)?;

        let mut migrations = MigrationIndex::default();
        for entity in input.entities {
            migrations.insert(&entity.name, ids.mint());
        }

        debug!(
            requirements = document.requirements.len(),
            entities = input.entities.len(),
            screens = screens.len(),
            "Generation context built"
        );

        Ok(Self {
            document,
            entities: input.entities,
            relationships: input.relationships,
            schema: input.schema,
            options,
            migrations,
            screens,
        })
    }

    /// Look up an entity by name, ignoring ASCII case
    pub fn entity(&self, name: &str) -> Option<&'a Entity> {
        self.entities.iter().find(|e| e.is_named(name))
    }

    pub fn migrations(&self) -> &MigrationIndex {
        &self.migrations
    }

    pub fn migration_id(&self, entity: &str) -> Option<TaskId> {
        self.migrations.get(entity)
    }

    /// Screens with unique routes, first occurrence first
    pub fn screens(&self) -> &[PlacedScreen] {
        &self.screens
    }

    pub fn requirement(&self, id: &str) -> Option<&FunctionalRequirement> {
        self.document.requirements.iter().find(|r| r.id == id)
    }

    /// Relationships that start at the named entity
    pub fn outbound_relationships(&self, entity: &str) -> impl Iterator<Item = &'a Relationship> {
        let entity = entity.to_string();
        self.relationships.iter().filter(move |r| r.starts_at(&entity))
    }

    /// Table name for an entity, falling back to the lowercased name
    pub fn table_for(&self, entity: &str) -> String {
        self.entity(entity)
            .map(|e| e.table_name.clone())
            .unwrap_or_else(|| entity.to_ascii_lowercase())
    }
}

fn check_entities(entities: &[Entity]) -> Result<()> {
    let mut seen: Vec<String> = Vec::with_capacity(entities.len());
    for entity in entities {
        if entity.name.trim().is_empty() {
            return Err(Error::InvalidInput("entity with an empty name".to_string()));
        }
        let key = entity.name.to_ascii_lowercase();
        if seen.contains(&key) {
            return Err(Error::InvalidInput(format!(
                "entity '{}' is declared more than once",
                entity.name
            )));
        }
        seen.push(key);
    }
    Ok(())
}

fn attach_orphans(mut document: StructuredRequirementDoc, policy: OrphanPolicy) -> StructuredRequirementDoc {
    let rules = std::mem::take(&mut document.unassigned_rules);
    let screens = std::mem::take(&mut document.unassigned_screens);
    if rules.is_empty() && screens.is_empty() {
        return document;
    }

    match policy {
        OrphanPolicy::Drop => {
            warn!(
                rules = rules.len(),
                screens = screens.len(),
                "Dropping unassigned rules and screens"
            );
        }
        OrphanPolicy::FirstRequirement => {
            if document.requirements.is_empty() {
                document.requirements.push(
                    FunctionalRequirement::new(PLACEHOLDER_REQUIREMENT_ID, "General")
                        .with_description("Rules and screens not tied to a specific requirement"),
                );
            }
            let owner = &mut document.requirements[0];
            debug!(
                requirement = %owner.id,
                rules = rules.len(),
                screens = screens.len(),
                "Attaching unassigned rules and screens"
            );
            owner.business_rules.extend(rules);
            owner.screens.extend(screens);
        }
    }
    document
}

/// Normalize a route: trimmed, no trailing slash except for the root
pub fn normalize_route(route: &str) -> String {
    let trimmed = route.trim();
    if trimmed.len() > 1 {
        trimmed.trim_end_matches('/').to_string()
    } else {
        trimmed.to_string()
    }
}

fn place_screens(document: &StructuredRequirementDoc) -> Result<Vec<PlacedScreen>> {
    let mut placed: Vec<PlacedScreen> = Vec::new();
    for (requirement, screen) in document.screens() {
        let route = normalize_route(&screen.route);
        if route.is_empty() {
            return Err(Error::InvalidInput(format!("screen {} has no route", screen.id)));
        }
        if placed.iter().any(|p| p.route() == route) {
            debug!(screen = %screen.id, route = %route, "Dropping screen with duplicate route");
            continue;
        }
        let mut screen = screen.clone();
        screen.route = route;
        placed.push(PlacedScreen {
            requirement_id: requirement.id.clone(),
            screen,
        });
    }
    Ok(placed)
}
