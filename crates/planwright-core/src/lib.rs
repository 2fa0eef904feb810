//! Planwright Core Library
//!
//! Compiles a structured requirements document into an ordered, tiered plan
//! of implementation tasks:
//! - Domain model (requirements, entities, tasks, task sets)
//! - Template-driven compiler with a minimal fallback generator
//! - Reference expansion and dependency graph validation
//! - Concurrent, cancellable enrichment through a pluggable provider
//! - JSON, YAML and Markdown export

pub mod compiler;
pub mod config;
pub mod domain;
pub mod enrichment;
pub mod error;
pub mod export;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::compiler::{CompilerInput, GenerationOptions, TaskCompiler};
    pub use crate::config::Config;
    pub use crate::domain::document::{InputBundle, StructuredRequirementDoc};
    pub use crate::domain::task::{Task, TaskId, TaskSet};
    pub use crate::error::{Error, Result};
    pub use crate::export::{ExportFormat, export};
}

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod error_tests;
