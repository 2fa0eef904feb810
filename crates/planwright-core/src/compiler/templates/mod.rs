//! Task templates
//!
//! One submodule per task family. Each template turns a document fragment
//! into draft tasks; tier and complexity are filled in by the classifier.

pub mod api;
pub mod orchestration;
pub mod rules;
pub mod schema;
pub mod service;
pub mod testing;
pub mod ui;

use crate::domain::task::{Task, TaskId, TaskType};

pub const MODULE_DATABASE: &str = "database";
pub const MODULE_API: &str = "api";
pub const MODULE_SERVICES: &str = "services";
pub const MODULE_UI: &str = "ui";
pub const MODULE_RULES: &str = "business-rules";
pub const MODULE_TESTING: &str = "testing";
pub const MODULE_INFRASTRUCTURE: &str = "infrastructure";
pub const MODULE_APP_SHELL: &str = "app-shell";

/// Pointer line that reference expansion replaces with the fragment itself
pub fn see(reference_id: &str) -> String {
    format!("See {}", reference_id)
}

/// Ids of tasks matching a predicate, in generation order
pub fn ids_where(tasks: &[Task], predicate: impl Fn(&Task) -> bool) -> Vec<TaskId> {
    tasks.iter().filter(|t| predicate(t)).map(|t| t.id).collect()
}

/// Ids of tasks of one type
pub fn ids_of_type(tasks: &[Task], task_type: TaskType) -> Vec<TaskId> {
    ids_where(tasks, |t| t.task_type == task_type)
}

/// `order_lines` / `Order line` -> `OrderLines`
pub fn pascal_case(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// `Order line` -> `orderLine`
pub fn camel_case(text: &str) -> String {
    let pascal = pascal_case(text);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Naive English plural for titles and call names
pub fn plural(word: &str) -> String {
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        format!("{}es", word)
    } else if word.ends_with('y')
        && !word.ends_with("ay")
        && !word.ends_with("ey")
        && !word.ends_with("oy")
    {
        format!("{}ies", &word[..word.len() - 1])
    } else {
        format!("{}s", word)
    }
}
