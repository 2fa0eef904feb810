//! Business rule and workflow templates

use super::{MODULE_RULES, see};
use crate::compiler::context::{GenerationContext, IdCounter};
use crate::domain::document::{
    BusinessRule, FunctionalRequirement, RuleKind, StateTransition, WorkflowDefinition,
};
use crate::domain::task::payload::{ValidationPayload, WorkflowPayload, WorkflowStateSpec};
use crate::domain::task::{Task, TaskPayload, TaskSpecification, TaskType};
use crate::error::{Error, Result};

/// Message used when a validation rule declares none
pub fn default_error_message(rule: &BusinessRule) -> String {
    format!("{} validation failed", rule.name)
}

fn validation_task(
    ctx: &GenerationContext<'_>,
    ids: &mut IdCounter,
    requirement: &FunctionalRequirement,
    rule: &BusinessRule,
) -> Task {
    let error_message = rule
        .error_message
        .clone()
        .unwrap_or_else(|| default_error_message(rule));
    let payload = ValidationPayload {
        rule_id: rule.id.clone(),
        rule_kind: rule.kind.as_str().to_string(),
        description: rule.description.clone(),
        formula: rule.formula.clone(),
        conditions: rule.conditions.clone(),
        error_message: error_message.clone(),
    };

    let mut spec = TaskSpecification::new(
        format!("Enforce {} ({})", rule.name, rule.id),
        format!("Validation rule from {}: {}.", requirement.id, requirement.title),
        TaskPayload::Validation(payload),
    );
    spec.requirements.push(format!("Rule {}: {}", rule.id, rule.name));
    if !rule.description.is_empty() {
        spec.requirements.push(rule.description.clone());
    }
    if let Some(formula) = &rule.formula {
        spec.requirements.push(format!("Formula: {}", formula));
    }
    for condition in &rule.conditions {
        spec.requirements.push(format!("Condition: {}", condition));
    }
    spec.requirements
        .push(format!("On failure return: \"{}\"", error_message));
    spec.technical_notes
        .push("Run the same check on the client and the server".to_string());
    spec.edge_cases
        .push("Empty and whitespace-only input".to_string());

    let mut test_cases = vec![format!("Accepts input satisfying {}", rule.name)];
    test_cases.extend(
        rule.conditions
            .iter()
            .map(|c| format!("Rejects input when `{}` does not hold", c)),
    );
    test_cases.push(format!("Rejection message is \"{}\"", error_message));

    let mut task = Task::new(
        ids.mint(),
        format!("Implement validation: {}", rule.name),
        TaskType::Validation,
        MODULE_RULES,
        spec,
    )
    .with_priority(requirement.priority)
    .with_requirement(&requirement.id)
    .with_criteria(vec![
        format!("Invalid input is rejected with \"{}\"", error_message),
        "Valid input passes without warnings".to_string(),
    ])
    .with_test_cases(test_cases)
    .with_tags(["validation", rule.id.as_str()]);
    if let Some(entity) = requirement.primary_entity() {
        if let Some(migration) = ctx.migration_id(entity) {
            task.add_dependency(migration);
        }
        task = task.with_entity(entity);
    }
    task
}

/// One task per validation rule; a rule id shared by several requirements
/// is emitted once, under its first owner
pub fn validation_tasks(ctx: &GenerationContext<'_>, ids: &mut IdCounter) -> Vec<Task> {
    let mut seen: Vec<&str> = Vec::new();
    let mut tasks = Vec::new();
    for (requirement, rule) in ctx.document.rules() {
        if rule.kind != RuleKind::Validation || seen.contains(&rule.id.as_str()) {
            continue;
        }
        seen.push(&rule.id);
        tasks.push(validation_task(ctx, ids, requirement, rule));
    }
    tasks
}

fn check_workflow(requirement: &FunctionalRequirement, workflow: &WorkflowDefinition) -> Result<()> {
    let known = |state: &str| workflow.states.iter().any(|s| s == state);
    if workflow.states.is_empty() {
        return Err(Error::Generation(format!(
            "workflow of {} declares no states",
            requirement.id
        )));
    }
    if !known(&workflow.initial_state) {
        return Err(Error::Generation(format!(
            "workflow of {} starts in unknown state '{}'",
            requirement.id, workflow.initial_state
        )));
    }
    let unknown = workflow
        .final_states
        .iter()
        .map(String::as_str)
        .chain(workflow.transitions.iter().flat_map(|t| [t.from.as_str(), t.to.as_str()]))
        .find(|s| !known(*s));
    match unknown {
        Some(state) => Err(Error::Generation(format!(
            "workflow of {} references unknown state '{}'",
            requirement.id, state
        ))),
        None => Ok(()),
    }
}

fn describe_transition(transition: &StateTransition) -> String {
    match &transition.guard {
        Some(guard) => format!(
            "{} -> {} on `{}` when {}",
            transition.from, transition.to, transition.action, guard
        ),
        None => format!("{} -> {} on `{}`", transition.from, transition.to, transition.action),
    }
}

fn workflow_task(
    ctx: &GenerationContext<'_>,
    ids: &mut IdCounter,
    requirement: &FunctionalRequirement,
    workflow: &WorkflowDefinition,
    prior: &[Task],
) -> Result<Task> {
    check_workflow(requirement, workflow)?;

    let states: Vec<WorkflowStateSpec> = workflow
        .states
        .iter()
        .map(|state| WorkflowStateSpec {
            name: state.clone(),
            transitions: workflow
                .transitions
                .iter()
                .filter(|t| &t.from == state)
                .cloned()
                .collect(),
        })
        .collect();

    let mut spec = TaskSpecification::new(
        format!("Implement the {} state machine", requirement.title),
        format!("Workflow behind requirement {}.", requirement.id),
        TaskPayload::Workflow(WorkflowPayload {
            states: states.clone(),
            initial_state: workflow.initial_state.clone(),
            final_states: workflow.final_states.clone(),
        }),
    );
    spec.requirements
        .push(format!("States: {}", workflow.states.join(", ")));
    spec.requirements
        .push(format!("Initial state: {}", workflow.initial_state));
    if !workflow.final_states.is_empty() {
        spec.requirements
            .push(format!("Final states: {}", workflow.final_states.join(", ")));
    }
    for state in &states {
        if state.transitions.is_empty() {
            spec.requirements
                .push(format!("From `{}`: no outgoing transitions", state.name));
        } else {
            let allowed: Vec<String> = state.transitions.iter().map(describe_transition).collect();
            spec.requirements
                .push(format!("From `{}`: {}", state.name, allowed.join("; ")));
        }
    }
    for rule in requirement
        .business_rules
        .iter()
        .filter(|r| r.kind == RuleKind::Workflow)
    {
        spec.requirements.push(see(&rule.id));
    }
    spec.technical_notes
        .push("Persist the current state and every transition with its actor".to_string());
    spec.edge_cases
        .push("Transition requested from a state that does not allow it".to_string());
    spec.edge_cases
        .push("Two users trigger transitions on the same record at once".to_string());
    spec.security_notes
        .push("Check the caller may perform each transition".to_string());

    let mut criteria = vec![
        format!("New records start in `{}`", workflow.initial_state),
        "Disallowed transitions are rejected without changing state".to_string(),
    ];
    if !workflow.final_states.is_empty() {
        criteria.push(format!(
            "No transitions leave final states: {}",
            workflow.final_states.join(", ")
        ));
    }
    let test_cases = workflow.transitions.iter().map(describe_transition).collect();

    let mut task = Task::new(
        ids.mint(),
        format!("Implement workflow: {}", requirement.title),
        TaskType::Workflow,
        MODULE_RULES,
        spec,
    )
    .with_priority(requirement.priority)
    .with_requirement(&requirement.id)
    .with_criteria(criteria)
    .with_test_cases(test_cases)
    .with_tags(["workflow", "state-machine"]);

    if let Some(entity) = requirement.primary_entity() {
        if let Some(migration) = ctx.migration_id(entity) {
            task.add_dependency(migration);
        }
        task = task.with_entity(entity);
    }
    for validation in prior.iter().filter(|t| {
        t.task_type == TaskType::Validation
            && t.related_requirement.as_deref() == Some(requirement.id.as_str())
    }) {
        task.add_dependency(validation.id);
    }
    Ok(task)
}

/// One task per requirement flagged as a workflow with a state machine
///
/// `prior` holds the tasks generated so far; the requirement's validation
/// tasks become dependencies.
pub fn workflow_tasks(
    ctx: &GenerationContext<'_>,
    ids: &mut IdCounter,
    prior: &[Task],
) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    for requirement in &ctx.document.requirements {
        if let Some(workflow) = requirement.state_machine() {
            tasks.push(workflow_task(ctx, ids, requirement, workflow, prior)?);
        }
    }
    Ok(tasks)
}
