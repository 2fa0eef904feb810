//! Markdown rendering grouped by module

use std::fmt::Write as _;

use crate::domain::task::{EnrichmentStatus, Task, TaskSet};

fn write_list(out: &mut String, heading: &str, items: &[String], checkbox: bool) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "**{}**\n", heading);
    for item in items {
        if checkbox {
            let _ = writeln!(out, "- [ ] {}", item);
        } else {
            let _ = writeln!(out, "- {}", item);
        }
    }
    out.push('\n');
}

fn write_task(out: &mut String, task: &Task) {
    let _ = writeln!(out, "### {} {}\n", task.id, task.title);
    let _ = writeln!(
        out,
        "- Type: `{}` | Tier: {} | Priority: {} | Complexity: {} | Mode: {}",
        task.task_type,
        task.tier,
        task.priority,
        task.estimated_complexity,
        task.execution_mode.as_str()
    );
    if task.dependencies.is_empty() {
        out.push_str("- Depends on: none\n");
    } else {
        let deps: Vec<String> = task.dependencies.iter().map(|d| d.to_string()).collect();
        let _ = writeln!(out, "- Depends on: {}", deps.join(", "));
    }
    if let Some(entity) = &task.related_entity {
        let _ = writeln!(out, "- Entity: {}", entity);
    }
    if let Some(route) = &task.route {
        let _ = writeln!(out, "- Route: `{}`", route);
    }
    let _ = writeln!(out, "\n{}\n", task.specification.objective);
    if !task.specification.context.is_empty() {
        let _ = writeln!(out, "_{}_\n", task.specification.context);
    }

    write_list(out, "Requirements", &task.specification.requirements, false);
    write_list(out, "Technical notes", &task.specification.technical_notes, false);
    write_list(out, "Edge cases", &task.specification.edge_cases, false);
    write_list(out, "Security", &task.specification.security_notes, false);
    write_list(out, "Acceptance criteria", &task.acceptance_criteria, true);
    if let Some(cases) = &task.test_cases {
        write_list(out, "Test cases", cases, false);
    }
    if let EnrichmentStatus::Enriched { guidance } = &task.enrichment {
        write_list(out, "Guidance", &guidance.notes, false);
    }
}

/// Render the set: summary tables first, then tasks grouped by module in
/// order of each module's first task
pub fn to_markdown(set: &TaskSet) -> String {
    let mut out = String::new();
    let title = if set.metadata.source_title.is_empty() {
        "Untitled project"
    } else {
        set.metadata.source_title.as_str()
    };
    let _ = writeln!(out, "# Development plan: {}\n", title);
    let _ = writeln!(
        out,
        "Generated {} | {} tasks | overall complexity: {}\n",
        set.generated_at.format("%Y-%m-%d %H:%M UTC"),
        set.summary.total_tasks,
        set.summary.overall_complexity
    );

    out.push_str("## Summary\n\n| Tier | Tasks |\n|---|---|\n");
    for (tier, count) in &set.summary.by_tier {
        let _ = writeln!(out, "| {} | {} |", tier, count);
    }
    out.push_str("\n| Type | Tasks |\n|---|---|\n");
    for (task_type, count) in &set.summary.by_type {
        let _ = writeln!(out, "| {} | {} |", task_type, count);
    }
    out.push('\n');

    let mut modules: Vec<&str> = Vec::new();
    for task in &set.tasks {
        if !modules.contains(&task.module.as_str()) {
            modules.push(&task.module);
        }
    }
    for module in modules {
        let _ = writeln!(out, "## Module: {}\n", module);
        for task in set.tasks.iter().filter(|t| t.module == module) {
            write_task(&mut out, task);
        }
    }
    out
}
