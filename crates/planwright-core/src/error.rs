//! Error types for Planwright

use thiserror::Error;

/// Result type alias using Planwright's Error
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong with the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphProblem {
    /// A task depends on itself, directly or transitively. Holds the cycle path.
    Cycle(Vec<String>),
    /// A task names a dependency that is not in the set.
    DanglingDependency { task: String, missing: String },
}

impl std::fmt::Display for GraphProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle(path) => write!(f, "dependency cycle {}", path.join(" -> ")),
            Self::DanglingDependency { task, missing } => {
                write!(f, "{} depends on unknown task {}", task, missing)
            }
        }
    }
}

/// Broad class of a failure, used to tell the user whose move it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The input needs fixing (missing document, no entities, malformed data)
    InputProblem,
    /// The compiler produced something inconsistent
    InternalDefect,
    /// Generation failed but a reduced plan can still be produced
    Degraded,
    /// A collaborator outside the compiler failed (enrichment, filesystem)
    External,
}

impl ErrorCategory {
    /// Short label shown next to the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InputProblem => "input problem",
            Self::InternalDefect => "internal defect",
            Self::Degraded => "degraded output",
            Self::External => "external failure",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Planwright error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (E001-E099)
    #[error("Missing input: {0}. Supply a requirements document and at least one entity.")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Graph errors (E100-E199)
    #[error("Dependency graph is inconsistent: {0}")]
    GraphConsistency(GraphProblem),

    // Generation errors (E200-E299)
    #[error("Task generation failed: {0}")]
    Generation(String),

    // Enrichment errors (E300-E399)
    #[error("Enrichment failed for {task_id}: {reason}")]
    Enrichment { task_id: String, reason: String },

    #[error("Enrichment provider rejected credentials: {0}")]
    Authentication(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Serialization errors (E700-E799)
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "E001",
            Self::InvalidInput(_) => "E002",
            Self::GraphConsistency(GraphProblem::Cycle(_)) => "E100",
            Self::GraphConsistency(GraphProblem::DanglingDependency { .. }) => "E101",
            Self::Generation(_) => "E200",
            Self::Enrichment { .. } => "E300",
            Self::Authentication(_) => "E301",
            Self::ConfigError(_) => "E600",
            Self::Serialization(_) => "E700",
            Self::Yaml(_) => "E701",
            Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingInput(_) => {
                Some("Provide `document` and a non-empty `entities` list in the input file".to_string())
            }
            Self::InvalidInput(_) => Some("planwright validate <input.json>".to_string()),
            Self::GraphConsistency(_) => {
                Some("This is a compiler defect; please report it with the input file".to_string())
            }
            Self::Generation(_) => {
                Some("A reduced plan (schema + CRUD) can be produced with fallback enabled".to_string())
            }
            Self::Authentication(_) => {
                Some("Check the enrichment provider API key".to_string())
            }
            Self::ConfigError(_) => Some("planwright config list".to_string()),
            _ => None,
        }
    }

    /// Classify the error for user-facing reporting
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingInput(_) | Self::InvalidInput(_) | Self::ConfigError(_) => {
                ErrorCategory::InputProblem
            }
            Self::GraphConsistency(_) => ErrorCategory::InternalDefect,
            Self::Generation(_) => ErrorCategory::Degraded,
            Self::Enrichment { .. }
            | Self::Authentication(_)
            | Self::Serialization(_)
            | Self::Yaml(_)
            | Self::Io(_) => ErrorCategory::External,
        }
    }

    /// Whether the caller should fall back to the minimal generator
    pub fn allows_fallback(&self) -> bool {
        matches!(self, Self::Generation(_))
    }
}
