//! Structured requirements document
//!
//! The parsed shape of a requirements document: functional requirements with
//! their business rules, screens and optional workflow state machine.

use serde::{Deserialize, Serialize};

/// Requirement and task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of business rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[default]
    Validation,
    Calculation,
    Constraint,
    Workflow,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Validation => "validation",
            RuleKind::Calculation => "calculation",
            RuleKind::Constraint => "constraint",
            RuleKind::Workflow => "workflow",
        }
    }
}

/// A business rule attached to a requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: RuleKind,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl BusinessRule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            description: String::new(),
            formula: None,
            conditions: Vec::new(),
            error_message: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Kind of UI surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenKind {
    List,
    #[default]
    Form,
    Detail,
    Modal,
    Dashboard,
    Report,
}

impl ScreenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenKind::List => "list",
            ScreenKind::Form => "form",
            ScreenKind::Detail => "detail",
            ScreenKind::Modal => "modal",
            ScreenKind::Dashboard => "dashboard",
            ScreenKind::Report => "report",
        }
    }
}

/// A screen field bound to an entity attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_input_type")]
    pub input_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn default_input_type() -> String {
    "text".to_string()
}

impl FieldMapping {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            input_type: default_input_type(),
            required: false,
            source: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A user action available on a screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenAction {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ScreenAction {
    pub fn named(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: None,
        }
    }
}

/// A UI surface a requirement renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: ScreenKind,
    pub route: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    #[serde(default)]
    pub actions: Vec<ScreenAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl Screen {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ScreenKind,
        route: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            route: route.into(),
            layout: String::new(),
            fields: Vec::new(),
            actions: Vec::new(),
            entity: None,
        }
    }

    pub fn with_field(mut self, field: FieldMapping) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_action(mut self, action: ScreenAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn for_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }
}

/// A transition of a workflow state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: String,
    pub to: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

impl StateTransition {
    pub fn new(from: impl Into<String>, to: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            action: action.into(),
            guard: None,
        }
    }
}

/// State machine behind a workflow requirement
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub states: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<StateTransition>,
    pub initial_state: String,
    #[serde(default)]
    pub final_states: Vec<String>,
}

/// A functional requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalRequirement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub is_workflow: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<WorkflowDefinition>,
    #[serde(default)]
    pub business_rules: Vec<BusinessRule>,
    #[serde(default)]
    pub screens: Vec<Screen>,
}

impl FunctionalRequirement {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            entities: Vec::new(),
            is_workflow: false,
            workflow: None,
            business_rules: Vec::new(),
            screens: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entities.push(entity.into());
        self
    }

    pub fn with_rule(mut self, rule: BusinessRule) -> Self {
        self.business_rules.push(rule);
        self
    }

    pub fn with_screen(mut self, screen: Screen) -> Self {
        self.screens.push(screen);
        self
    }

    pub fn with_workflow(mut self, workflow: WorkflowDefinition) -> Self {
        self.is_workflow = true;
        self.workflow = Some(workflow);
        self
    }

    /// First involved entity, used as the owning entity of derived tasks
    pub fn primary_entity(&self) -> Option<&str> {
        self.entities.first().map(String::as_str)
    }

    /// The state machine, present only when the requirement is flagged as a workflow
    pub fn state_machine(&self) -> Option<&WorkflowDefinition> {
        if self.is_workflow {
            self.workflow.as_ref()
        } else {
            None
        }
    }
}

/// The full structured requirements document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuredRequirementDoc {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub requirements: Vec<FunctionalRequirement>,
    /// Rules the parser could not attach to any requirement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unassigned_rules: Vec<BusinessRule>,
    /// Screens the parser could not attach to any requirement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unassigned_screens: Vec<Screen>,
}

impl StructuredRequirementDoc {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_requirement(mut self, requirement: FunctionalRequirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// All business rules in document order
    pub fn rules(&self) -> impl Iterator<Item = (&FunctionalRequirement, &BusinessRule)> {
        self.requirements
            .iter()
            .flat_map(|r| r.business_rules.iter().map(move |rule| (r, rule)))
    }

    /// All screens in document order
    pub fn screens(&self) -> impl Iterator<Item = (&FunctionalRequirement, &Screen)> {
        self.requirements
            .iter()
            .flat_map(|r| r.screens.iter().map(move |screen| (r, screen)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_deserializes_with_defaults() {
        let req: FunctionalRequirement =
            serde_json::from_str(r#"{"id":"FR-001","title":"Place order"}"#).unwrap();
        assert_eq!(req.priority, Priority::Medium);
        assert!(req.entities.is_empty());
        assert!(req.state_machine().is_none());
    }

    #[test]
    fn test_state_machine_requires_flag() {
        let mut req = FunctionalRequirement::new("FR-002", "Approve order");
        req.workflow = Some(WorkflowDefinition {
            states: vec!["draft".into(), "approved".into()],
            transitions: vec![StateTransition::new("draft", "approved", "approve")],
            initial_state: "draft".into(),
            final_states: vec!["approved".into()],
        });
        assert!(req.state_machine().is_none());
        req.is_workflow = true;
        assert!(req.state_machine().is_some());
    }

    #[test]
    fn test_document_iterates_rules_and_screens_in_order() {
        let doc = StructuredRequirementDoc::new("Shop")
            .with_requirement(
                FunctionalRequirement::new("FR-001", "A")
                    .with_rule(BusinessRule::new("BR-001", "r1", RuleKind::Validation))
                    .with_screen(Screen::new("SCR-001", "S1", ScreenKind::List, "/a")),
            )
            .with_requirement(
                FunctionalRequirement::new("FR-002", "B")
                    .with_rule(BusinessRule::new("BR-002", "r2", RuleKind::Calculation)),
            );

        let rule_ids: Vec<&str> = doc.rules().map(|(_, r)| r.id.as_str()).collect();
        assert_eq!(rule_ids, vec!["BR-001", "BR-002"]);
        assert_eq!(doc.screens().count(), 1);
    }

    #[test]
    fn test_screen_kind_serde() {
        let kind: ScreenKind = serde_json::from_str("\"dashboard\"").unwrap();
        assert_eq!(kind, ScreenKind::Dashboard);
        assert_eq!(ScreenKind::default(), ScreenKind::Form);
    }
}
