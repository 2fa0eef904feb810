//! Minimal fallback generator
//!
//! Produces schema migrations and CRUD endpoints only. Used when the full
//! template pipeline hits a generation error, so the caller still gets a
//! usable, if reduced, plan.

use super::TaskGenerator;
use super::context::{GenerationContext, IdCounter};
use super::templates::{api, schema};
use crate::domain::task::{CompilerMode, Task};
use crate::error::Result;

/// Schema + CRUD strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalGenerator;

impl MinimalGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl TaskGenerator for MinimalGenerator {
    fn mode(&self) -> CompilerMode {
        CompilerMode::Fallback
    }

    fn generate(&self, ctx: &GenerationContext<'_>, ids: &mut IdCounter) -> Result<Vec<Task>> {
        let mut tasks = Vec::with_capacity(ctx.entities.len() * 6);
        for entity in ctx.entities {
            tasks.push(schema::migration_task(ctx, entity)?);
        }
        for entity in ctx.entities {
            tasks.extend(api::crud_tasks(ctx, ids, entity));
        }
        Ok(tasks)
    }
}
