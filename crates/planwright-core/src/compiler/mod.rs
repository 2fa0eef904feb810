//! Requirement-to-task compiler
//!
//! Lowers a structured requirements document, its entities, relationships and
//! schema text into a dependency-ordered [`TaskSet`]. The pipeline is
//! synchronous and side-effect free:
//!
//! 1. [`context`] validates the inputs and reserves migration ids
//! 2. a [`TaskGenerator`] runs the templates in fixed family order
//! 3. [`references`] inlines referenced fragments
//! 4. [`dependencies`] links migrations and checks the graph
//! 5. [`classifier`] and [`summary`] fill in tiers, complexity and totals

pub mod classifier;
pub mod context;
pub mod dependencies;
pub mod fallback;
pub mod references;
pub mod summary;
pub mod templates;

pub use context::{
    CompilerInput, GenerationContext, GenerationOptions, IdCounter, MigrationIndex, OrphanPolicy,
};
pub use dependencies::execution_order;
pub use fallback::MinimalGenerator;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::task::{CompilerMode, Task, TaskSet, TaskSetMetadata};
use crate::error::Result;
use references::ReferenceIndex;
use templates::{api, orchestration, rules, schema, service, testing, ui};

/// A strategy that turns a generation context into draft tasks
pub trait TaskGenerator: Send + Sync {
    /// Mode recorded in the task set metadata
    fn mode(&self) -> CompilerMode;

    /// Produce draft tasks in generation order
    fn generate(&self, ctx: &GenerationContext<'_>, ids: &mut IdCounter) -> Result<Vec<Task>>;
}

/// Every template family, in the fixed order later families rely on
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl TaskGenerator for TemplateGenerator {
    fn mode(&self) -> CompilerMode {
        CompilerMode::Full
    }

    fn generate(&self, ctx: &GenerationContext<'_>, ids: &mut IdCounter) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = Vec::new();

        for entity in ctx.entities {
            tasks.push(schema::migration_task(ctx, entity)?);
        }
        for entity in ctx.entities {
            tasks.extend(api::crud_tasks(ctx, ids, entity));
        }
        for placed in ctx.screens() {
            tasks.push(ui::ui_task(ctx, ids, placed));
        }
        tasks.extend(rules::validation_tasks(ctx, ids));
        let workflows = rules::workflow_tasks(ctx, ids, &tasks)?;
        tasks.extend(workflows);
        for entity in ctx.entities {
            let test = testing::entity_test_task(ids, entity, &tasks);
            tasks.push(test);
        }
        debug!(count = tasks.len(), "Entity and screen families generated");

        let environment = orchestration::environment_task(ctx, ids);
        let environment_id = environment.id;
        tasks.push(environment);
        for entity in ctx.entities {
            tasks.push(service::service_task(ctx, ids, entity, Some(environment_id)));
        }
        let client = orchestration::api_client_task(ctx, ids, &tasks);
        tasks.push(client);
        if let Some(routes) = orchestration::route_config_task(ctx, ids, &tasks) {
            let routes_id = routes.id;
            tasks.push(routes);
            tasks.push(orchestration::navigation_task(ctx, ids, routes_id));
        }
        let pages = orchestration::page_tasks(ctx, ids, &tasks);
        tasks.extend(pages);
        let flows = orchestration::e2e_tasks(ctx, ids, &tasks);
        tasks.extend(flows);
        tasks.push(orchestration::test_setup_task(ctx, ids, environment_id));
        debug!(count = tasks.len(), "Orchestration families generated");

        Ok(tasks)
    }
}

/// Compiles requirement documents into task sets
#[derive(Debug, Clone, Default)]
pub struct TaskCompiler {
    options: GenerationOptions,
}

impl TaskCompiler {
    pub fn new(options: GenerationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Run the full template pipeline
    pub fn compile(&self, input: CompilerInput<'_>) -> Result<TaskSet> {
        self.compile_with(&TemplateGenerator, input)
    }

    /// Run the full pipeline, dropping to schema + CRUD on a generation error
    ///
    /// Missing input and graph inconsistencies are returned as-is.
    pub fn compile_with_fallback(&self, input: CompilerInput<'_>) -> Result<TaskSet> {
        match self.compile(input) {
            Err(err) if err.allows_fallback() => {
                warn!(error = %err, "Template generation failed, falling back to schema + CRUD plan");
                self.compile_with(&MinimalGenerator, input)
            }
            other => other,
        }
    }

    /// Run one generator through expansion, linking, validation and
    /// classification
    pub fn compile_with(&self, generator: &dyn TaskGenerator, input: CompilerInput<'_>) -> Result<TaskSet> {
        let mut ids = IdCounter::new();
        let ctx = GenerationContext::build(input, self.options.clone(), &mut ids)?;

        let mut tasks = generator.generate(&ctx, &mut ids)?;
        if self.options.expand_references {
            let index = ReferenceIndex::from_document(&ctx.document);
            references::expand_references(&mut tasks, &index);
        }
        dependencies::link_migrations(&mut tasks, ctx.migrations());
        dependencies::validate_graph(&tasks)?;
        classifier::classify(&mut tasks);
        let summary = summary::summarize(&tasks);

        let title = ctx.document.title.clone();
        let set = TaskSet {
            id: task_set_id(&title, tasks.len()),
            generated_at: self.options.generated_at,
            tasks,
            summary,
            metadata: TaskSetMetadata {
                source_title: title,
                mode: generator.mode(),
                references_expanded: self.options.expand_references,
                schema_lines: ctx.schema.lines().count(),
                enrichment: None,
            },
        };

        info!(
            task_set = %set.id,
            tasks = set.summary.total_tasks,
            mode = ?set.metadata.mode,
            complexity = %set.summary.overall_complexity,
            "Task set compiled"
        );
        Ok(set)
    }
}

/// Deterministic set id from the document title and task count
fn task_set_id(title: &str, task_count: usize) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{}:{}", title, task_count).as_bytes()).to_string()
}
