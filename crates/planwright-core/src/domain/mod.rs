//! Domain layer
//!
//! Contains the input document model and the output task model.

pub mod document;
pub mod task;
