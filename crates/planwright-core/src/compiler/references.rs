//! Reference expansion
//!
//! Templates point at document fragments with lines such as `See BR-003` or
//! `As per SCR-002`. Expansion swaps each pointer line for the fragment text
//! itself, so a task can be read without the source document. Lines that
//! mention an id inside other text keep their wording; every id a task
//! mentions is recorded as a `ref:<id>` tag.
//!
//! Ids are whatever the document uses. A pointer is recognized when its
//! target is an id in the [`ReferenceIndex`], or when it has the usual
//! `FR-`/`BR-`/`SCR-` shape (reported as unresolved if the document lacks it).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::compiler::templates::ui::{default_actions, ui_type_for};
use crate::domain::document::{BusinessRule, FunctionalRequirement, Screen, StructuredRequirementDoc};
use crate::domain::task::Task;

static CONVENTIONAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:FR|BR|SCR)-\d{3,}$").unwrap());

static POINTER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:(?:[Ss]ee|[Aa]s per)\s+)?(\S+?)\s*\.?\s*$").unwrap());

fn is_conventional_id(token: &str) -> bool {
    CONVENTIONAL_ID.is_match(token)
}

/// Candidate id tokens of a line: split on whitespace and list punctuation,
/// with surrounding punctuation trimmed
fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')' | '[' | ']' | '/'))
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
}

fn rule_fragment(rule: &BusinessRule) -> String {
    let mut text = format!("[{}] {} ({} rule)", rule.id, rule.name, rule.kind.as_str());
    if !rule.description.is_empty() {
        text.push_str(&format!(": {}", rule.description.trim_end_matches('.')));
    }
    if let Some(formula) = &rule.formula {
        text.push_str(&format!(". Formula: {}", formula));
    }
    if !rule.conditions.is_empty() {
        text.push_str(&format!(". Conditions: {}", rule.conditions.join("; ")));
    }
    if let Some(message) = &rule.error_message {
        text.push_str(&format!(". Error: \"{}\"", message));
    }
    text
}

fn screen_fragment(screen: &Screen) -> String {
    let mut text = format!(
        "[{}] {} ({} screen at {})",
        screen.id,
        screen.name,
        screen.kind.as_str(),
        screen.route.trim()
    );
    if !screen.fields.is_empty() {
        let fields: Vec<String> = screen
            .fields
            .iter()
            .map(|f| {
                let label = if f.label.is_empty() { &f.name } else { &f.label };
                if f.required {
                    format!("{} \"{}\" {} required", f.name, label, f.input_type)
                } else {
                    format!("{} \"{}\" {}", f.name, label, f.input_type)
                }
            })
            .collect();
        text.push_str(&format!(". Fields: {}", fields.join(", ")));
    }
    let actions = if screen.actions.is_empty() {
        default_actions(ui_type_for(screen.kind))
    } else {
        screen.actions.clone()
    };
    let labels: Vec<&str> = actions.iter().map(|a| a.label.as_str()).collect();
    text.push_str(&format!(". Actions: {}", labels.join(", ")));
    text
}

fn requirement_fragment(requirement: &FunctionalRequirement) -> String {
    let mut text = format!(
        "[{}] {} ({} priority)",
        requirement.id, requirement.title, requirement.priority
    );
    if !requirement.description.is_empty() {
        text.push_str(&format!(": {}", requirement.description.trim_end_matches('.')));
    }
    if !requirement.entities.is_empty() {
        text.push_str(&format!(". Entities: {}", requirement.entities.join(", ")));
    }
    text
}

/// Fragment text for every requirement, rule and screen id in a document
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    fragments: BTreeMap<String, String>,
}

impl ReferenceIndex {
    /// Index a document; the first fragment with a given id wins
    pub fn from_document(document: &StructuredRequirementDoc) -> Self {
        let mut fragments = BTreeMap::new();
        for requirement in &document.requirements {
            fragments
                .entry(requirement.id.clone())
                .or_insert_with(|| requirement_fragment(requirement));
        }
        for (_, rule) in document.rules() {
            fragments
                .entry(rule.id.clone())
                .or_insert_with(|| rule_fragment(rule));
        }
        for (_, screen) in document.screens() {
            fragments
                .entry(screen.id.clone())
                .or_insert_with(|| screen_fragment(screen));
        }
        Self { fragments }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.fragments.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fragments.contains_key(id)
    }

    /// The id a line points at, when the line is nothing but a pointer
    pub fn pointer_target<'a>(&self, line: &'a str) -> Option<&'a str> {
        let id = POINTER_LINE.captures(line)?.get(1)?.as_str();
        if self.contains(id) || is_conventional_id(id) {
            Some(id)
        } else {
            None
        }
    }

    /// Whether a line is nothing but a pointer to a document fragment
    pub fn is_bare_reference(&self, line: &str) -> bool {
        self.pointer_target(line).is_some()
    }

    /// Every reference id mentioned in a line, in order of appearance
    pub fn reference_ids<'a>(&self, line: &'a str) -> Vec<&'a str> {
        tokens(line)
            .filter(|t| self.contains(t) || is_conventional_id(t))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Fragment for an id, or a marker stating it could not be resolved
    pub fn resolve(&self, id: &str) -> String {
        match self.get(id) {
            Some(fragment) => fragment.to_string(),
            None => format!("[{}] (unresolved reference: not present in the document)", id),
        }
    }
}

/// Expand pointer lines in every task's requirements; returns the number of
/// lines replaced
pub fn expand_references(tasks: &mut [Task], index: &ReferenceIndex) -> usize {
    let mut replaced = 0;
    for task in tasks.iter_mut() {
        let mut mentioned: Vec<String> = Vec::new();
        let mut lines: Vec<String> = Vec::with_capacity(task.specification.requirements.len());
        for line in task.specification.requirements.drain(..) {
            for id in index.reference_ids(&line) {
                if !mentioned.iter().any(|m| m == id) {
                    mentioned.push(id.to_string());
                }
            }
            let pointer = index.pointer_target(&line).map(str::to_string);
            match pointer {
                Some(id) => {
                    if index.get(&id).is_none() {
                        warn!(task_id = %task.id, reference = %id, "Unresolved reference");
                    }
                    let fragment = index.resolve(&id);
                    // Two pointers to the same fragment collapse into one line
                    if !lines.contains(&fragment) {
                        lines.push(fragment);
                    }
                    replaced += 1;
                }
                None => lines.push(line),
            }
        }
        task.specification.requirements = lines;
        for id in mentioned {
            let tag = format!("ref:{}", id);
            if !task.tags.contains(&tag) {
                task.tags.push(tag);
            }
        }
    }
    debug!(replaced, "Expanded reference pointers");
    replaced
}
