//! Task model
//!
//! The compiler's output: typed, classified tasks with inlined
//! specifications, grouped into a task set with a summary.

pub mod entity;
pub mod payload;
pub mod set;
pub mod types;

pub use entity::{EnrichmentStatus, Guidance, Task, TaskSpecification};
pub use payload::{CrudOperation, TaskPayload};
pub use set::{CompilerMode, EnrichmentStats, TaskSet, TaskSetMetadata, TaskSummary};
pub use types::{Complexity, ExecutionMode, TaskId, TaskType, Tier};
