use crate::domain::task::TaskSet;
use crate::error::Result;

/// Pretty-printed structural dump
pub fn to_json(set: &TaskSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(set)?)
}

/// Parse a task set previously written by [`to_json`]
pub fn from_json(text: &str) -> Result<TaskSet> {
    Ok(serde_json::from_str(text)?)
}
