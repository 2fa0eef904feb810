//! Task set exporters
//!
//! Pure formatting over a [`TaskSet`]: JSON, YAML and Markdown.

pub mod json;
pub mod markdown;
pub mod yaml;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::task::TaskSet;
use crate::error::{Error, Result};

pub use json::to_json;
pub use markdown::to_markdown;
pub use yaml::to_yaml;

/// Output format for an exported task set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Yaml,
    Markdown,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
            ExportFormat::Markdown => "markdown",
        }
    }

    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
            ExportFormat::Markdown => "md",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(Error::InvalidInput(format!(
                "unknown export format '{}' (expected json, yaml or markdown)",
                other
            ))),
        }
    }
}

/// Render a task set in the given format
pub fn export(set: &TaskSet, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(set),
        ExportFormat::Yaml => to_yaml(set),
        ExportFormat::Markdown => Ok(to_markdown(set)),
    }
}
