//! Screen-level UI templates

use super::{MODULE_UI, see};
use crate::compiler::context::{GenerationContext, IdCounter, PlacedScreen};
use crate::domain::document::{RuleKind, ScreenAction, ScreenKind};
use crate::domain::task::payload::UiPayload;
use crate::domain::task::{Task, TaskPayload, TaskSpecification, TaskType};

/// Task type for a screen kind; kinds without a dedicated family build as forms
pub fn ui_type_for(kind: ScreenKind) -> TaskType {
    match kind {
        ScreenKind::List => TaskType::UiList,
        ScreenKind::Form => TaskType::UiForm,
        ScreenKind::Detail => TaskType::UiDetail,
        ScreenKind::Modal => TaskType::UiModal,
        _ => TaskType::UiForm,
    }
}

/// Actions injected when a screen declares none
pub fn default_actions(task_type: TaskType) -> Vec<ScreenAction> {
    let labels: &[&str] = match task_type {
        TaskType::UiList => &["Add New", "View"],
        TaskType::UiDetail => &["Edit", "Back"],
        TaskType::UiModal => &["Confirm", "Cancel"],
        _ => &["Save", "Cancel"],
    };
    labels.iter().map(|l| ScreenAction::named(*l)).collect()
}

/// Build the UI task for one de-duplicated screen
pub fn ui_task(ctx: &GenerationContext<'_>, ids: &mut IdCounter, placed: &PlacedScreen) -> Task {
    let screen = &placed.screen;
    let task_type = ui_type_for(screen.kind);
    let requirement = ctx.requirement(&placed.requirement_id);

    let actions = if screen.actions.is_empty() {
        default_actions(task_type)
    } else {
        screen.actions.clone()
    };
    let payload = UiPayload {
        screen_id: screen.id.clone(),
        screen_name: screen.name.clone(),
        route: screen.route.clone(),
        layout: screen.layout.clone(),
        fields: screen.fields.clone(),
        actions: actions.clone(),
    };

    let entity = screen
        .entity
        .clone()
        .or_else(|| requirement.and_then(|r| r.primary_entity()).map(str::to_string));

    let mut spec = TaskSpecification::new(
        format!("Build the {} screen at {}", screen.name, screen.route),
        format!(
            "{} screen for requirement {}.",
            screen.kind.as_str(),
            placed.requirement_id
        ),
        TaskPayload::Ui(payload),
    );
    spec.requirements.push(see(&screen.id));
    for field in &screen.fields {
        let label = if field.label.is_empty() { &field.name } else { &field.label };
        spec.requirements.push(format!(
            "Field `{}` ({}, {} input{})",
            field.name,
            label,
            field.input_type,
            if field.required { ", required" } else { "" }
        ));
    }
    for action in &actions {
        match &action.target {
            Some(target) => spec
                .requirements
                .push(format!("Action: {} -> {}", action.label, target)),
            None => spec.requirements.push(format!("Action: {}", action.label)),
        }
    }
    if task_type == TaskType::UiForm {
        if let Some(requirement) = requirement {
            for rule in requirement
                .business_rules
                .iter()
                .filter(|r| r.kind == RuleKind::Validation)
            {
                spec.requirements.push(see(&rule.id));
            }
        }
        spec.edge_cases
            .push("Submitting twice while a save is in flight".to_string());
    }
    if task_type == TaskType::UiList {
        spec.edge_cases
            .push("Empty state when there are no records".to_string());
    }
    spec.security_notes
        .push("Escape user-provided values when rendering".to_string());

    let mut criteria = vec![
        format!("Screen renders at {}", screen.route),
        format!("All {} fields are displayed", screen.fields.len()),
    ];
    let required: Vec<&str> = screen
        .fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.as_str())
        .collect();
    if !required.is_empty() {
        criteria.push(format!("Required fields are enforced: {}", required.join(", ")));
    }
    let labels: Vec<&str> = actions.iter().map(|a| a.label.as_str()).collect();
    criteria.push(format!("Actions available: {}", labels.join(", ")));

    let mut task = Task::new(
        ids.mint(),
        format!("Build {} screen", screen.name),
        task_type,
        MODULE_UI,
        spec,
    )
    .with_requirement(&placed.requirement_id)
    .with_route(&screen.route)
    .with_criteria(criteria)
    .with_tags(["ui", screen.kind.as_str()]);
    if let Some(requirement) = requirement {
        task = task.with_priority(requirement.priority);
    }
    if let Some(entity) = entity {
        task = task.with_entity(entity);
    }
    task
}
