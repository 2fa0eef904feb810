//! Planwright Core Integration Tests

use std::collections::HashSet;

use async_trait::async_trait;
use planwright_core::{
    Error,
    compiler::{
        CompilerInput, GenerationOptions, MinimalGenerator, TaskCompiler, execution_order,
        references::ReferenceIndex,
    },
    domain::document::{
        BusinessRule, DataType, Entity, Field, FunctionalRequirement, InputBundle, RuleKind,
        Screen, ScreenKind, StructuredRequirementDoc,
    },
    domain::task::{
        CompilerMode, EnrichmentStatus, ExecutionMode, Guidance, Task, TaskPayload,
        TaskSet, TaskType, Tier,
    },
    enrichment::{EnrichmentContext, EnrichmentFailure, TaskEnricher, enrich_task_set},
    export::{ExportFormat, export, json::from_json},
};
use tokio_util::sync::CancellationToken;

const FIXTURE: &str = include_str!("fixtures/order_management.json");

fn bundle() -> InputBundle {
    InputBundle::from_json(FIXTURE).expect("fixture parses")
}

fn compile(bundle: &InputBundle) -> TaskSet {
    TaskCompiler::default()
        .compile(CompilerInput::from(bundle))
        .expect("fixture compiles")
}

/// Every id reachable from `task` through dependencies
fn ancestors(set: &TaskSet, task: &Task) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut stack: Vec<_> = task.dependencies.clone();
    while let Some(id) = stack.pop() {
        if seen.insert(id.to_string()) {
            if let Some(dep) = set.get_task(id) {
                stack.extend(dep.dependencies.iter().copied());
            }
        }
    }
    seen
}

#[test]
fn test_one_migration_and_five_crud_per_entity() {
    let bundle = bundle();
    let set = compile(&bundle);

    for entity in &bundle.entities {
        let migrations: Vec<&Task> = set.tasks_of_type(TaskType::DatabaseMigration)
            .into_iter()
            .filter(|t| t.related_entity.as_deref() == Some(entity.name.as_str()))
            .collect();
        assert_eq!(migrations.len(), 1, "one migration for {}", entity.name);
        let migration_id = migrations[0].id.to_string();

        let crud: Vec<&Task> = set.tasks_of_type(TaskType::ApiCrud)
            .into_iter()
            .filter(|t| t.related_entity.as_deref() == Some(entity.name.as_str()))
            .collect();
        assert_eq!(crud.len(), 5, "five CRUD tasks for {}", entity.name);
        for task in crud {
            assert!(ancestors(&set, task).contains(&migration_id));
        }
    }
}

#[test]
fn test_ids_strictly_increase_in_generation_order() {
    let set = compile(&bundle());
    let sequences: Vec<u32> = set.tasks.iter().map(|t| t.id.sequence()).collect();
    let expected: Vec<u32> = (1..=set.tasks.len() as u32).collect();
    assert_eq!(sequences, expected);
    assert_eq!(set.tasks[0].id.to_string(), "TASK-001");
}

#[test]
fn test_graph_is_acyclic_and_closed() {
    let set = compile(&bundle());
    let known: HashSet<String> = set.tasks.iter().map(|t| t.id.to_string()).collect();
    for task in &set.tasks {
        for dep in &task.dependencies {
            assert!(known.contains(&dep.to_string()), "{} -> {}", task.id, dep);
        }
    }

    let stages = execution_order(&set.tasks).expect("acyclic");
    let scheduled: usize = stages.iter().map(|s| s.len()).sum();
    assert_eq!(scheduled, set.tasks.len());
    // Migrations have no dependencies, so they all start in the first stage
    for migration in set.tasks_of_type(TaskType::DatabaseMigration) {
        assert!(stages[0].contains(&migration.id));
    }

    let ready = set.ready_tasks(&[]);
    assert!(ready.iter().all(|t| t.dependencies.is_empty()));
    assert_eq!(ready.len(), stages[0].len());
}

#[test]
fn test_generation_is_deterministic() {
    let bundle = bundle();
    let first = export(&compile(&bundle), ExportFormat::Json).unwrap();
    let second = export(&compile(&bundle), ExportFormat::Json).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_no_bare_references_after_expansion() {
    let bundle = bundle();
    let set = compile(&bundle);
    let index = ReferenceIndex::from_document(bundle.document.as_ref().unwrap());
    assert!(set.metadata.references_expanded);
    for task in &set.tasks {
        for line in &task.specification.requirements {
            assert!(!index.is_bare_reference(line), "{} still has pointer line {:?}", task.id, line);
        }
    }
    let validation = set.tasks_of_type(TaskType::Validation);
    assert!(validation
        .iter()
        .any(|t| t.tags.iter().any(|tag| tag == "ref:BR-001")));
}

#[test]
fn test_pointer_lines_survive_without_expansion() {
    let bundle = bundle();
    let options = GenerationOptions {
        expand_references: false,
        ..Default::default()
    };
    let set = TaskCompiler::new(options)
        .compile(CompilerInput::from(&bundle))
        .unwrap();
    assert!(!set.metadata.references_expanded);
    let index = ReferenceIndex::from_document(bundle.document.as_ref().unwrap());
    let pointers = set
        .tasks
        .iter()
        .flat_map(|t| t.specification.requirements.iter())
        .filter(|line| index.is_bare_reference(line))
        .count();
    assert!(pointers > 0);
}

#[test]
fn test_free_form_document_ids_are_expanded() {
    let document = StructuredRequirementDoc::new("Checkout").with_requirement(
        FunctionalRequirement::new("REQ-1", "Check out")
            .with_entity("Order")
            .with_rule(
                BusinessRule::new("BR-1", "Order total", RuleKind::Calculation)
                    .with_formula("sum(lines.price)"),
            )
            .with_rule(
                BusinessRule::new("RULE-7", "Total is positive", RuleKind::Validation)
                    .with_condition("total > 0"),
            )
            .with_screen(Screen::new("SCR-1", "Checkout", ScreenKind::Form, "/orders")),
    );
    let entities = vec![
        Entity::new("Order", "orders")
            .with_field(Field::new("id", DataType::Uuid).primary_key())
            .with_field(Field::new("total", DataType::Decimal).required()),
    ];
    let input = CompilerInput {
        document: Some(&document),
        entities: &entities,
        relationships: &[],
        schema: "",
    };
    let set = TaskCompiler::default().compile(input).unwrap();
    let index = ReferenceIndex::from_document(&document);

    let bare: Vec<String> = set
        .tasks
        .iter()
        .flat_map(|t| {
            t.specification
                .requirements
                .iter()
                .filter(|line| index.is_bare_reference(line))
                .map(move |line| format!("{} {}: {}", t.id, t.task_type, line))
        })
        .collect();
    assert!(bare.is_empty(), "pointer lines left: {:?}", bare);

    let form = &set.tasks_of_type(TaskType::UiForm)[0];
    assert!(form
        .specification
        .requirements
        .iter()
        .any(|line| line.starts_with("[SCR-1] Checkout")));
    assert!(form.tags.iter().any(|tag| tag == "ref:SCR-1"));
    let service = &set.tasks_of_type(TaskType::ServiceLayer)[0];
    assert!(service.tags.iter().any(|tag| tag == "ref:BR-1"));
}

#[test]
fn test_order_migration_criteria() {
    let set = compile(&bundle());
    let migration = set.tasks_of_type(TaskType::DatabaseMigration)
        .into_iter()
        .find(|t| t.related_entity.as_deref() == Some("Order"))
        .unwrap();

    assert!(migration
        .acceptance_criteria
        .iter()
        .any(|c| c == "Table `orders` exists in the database"));
    assert!(migration.acceptance_criteria.iter().any(|c| c.contains("Audit columns")));
    assert!(!migration
        .acceptance_criteria
        .iter()
        .any(|c| c.to_lowercase().contains("soft-delete") || c.contains("deleted_at")));
    assert_eq!(migration.tier, Tier::T1);
}

#[test]
fn test_form_without_actions_gets_save_and_cancel() {
    let set = compile(&bundle());
    let form = set.tasks_of_type(TaskType::UiForm)
        .into_iter()
        .find(|t| t.route.as_deref() == Some("/orders/new"))
        .unwrap();
    let TaskPayload::Ui(payload) = &form.specification.payload else {
        panic!("form task carries a UI payload");
    };
    assert_eq!(payload.fields.len(), 2);
    let actions: Vec<&str> = payload.actions.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(actions, vec!["Save", "Cancel"]);
}

#[test]
fn test_shared_route_collapses_into_one_page() {
    let set = compile(&bundle());
    let ui_at_orders: Vec<&Task> = set
        .tasks
        .iter()
        .filter(|t| t.route.as_deref() == Some("/orders"))
        .filter(|t| matches!(t.specification.payload, TaskPayload::Ui(_)))
        .collect();
    assert_eq!(ui_at_orders.len(), 1, "only the first /orders screen makes a UI task");

    let pages: Vec<&Task> = set.tasks_of_type(TaskType::PageComposition)
        .into_iter()
        .filter(|t| t.route.as_deref() == Some("/orders"))
        .collect();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].dependencies, vec![ui_at_orders[0].id]);
}

#[test]
fn test_workflow_and_flows() {
    let set = compile(&bundle());
    let workflows = set.tasks_of_type(TaskType::Workflow);
    assert_eq!(workflows.len(), 1);
    assert_eq!(workflows[0].tier, Tier::T3);
    assert_eq!(workflows[0].related_requirement.as_deref(), Some("FR-002"));

    // FR-002 has no screens, so only FR-001 gets an end-to-end flow
    let flows = set.tasks_of_type(TaskType::E2eFlow);
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].execution_mode, ExecutionMode::Manual);
    let page_ids: HashSet<String> = set.tasks_of_type(TaskType::PageComposition)
        .iter()
        .map(|t| t.id.to_string())
        .collect();
    assert!(flows[0]
        .dependencies
        .iter()
        .any(|d| page_ids.contains(&d.to_string())));
}

#[test]
fn test_summary_matches_tasks() {
    let set = compile(&bundle());
    assert_eq!(set.summary.total_tasks, set.tasks.len());
    assert_eq!(set.summary.by_tier.values().sum::<usize>(), set.tasks.len());
    assert_eq!(set.summary.by_type.values().sum::<usize>(), set.tasks.len());
    assert_eq!(set.summary.enriched_tasks, None);
    assert_eq!(set.metadata.mode, CompilerMode::Full);
    assert_eq!(set.metadata.source_title, "Order Management");
    assert_eq!(set.metadata.schema_lines, 2);
}

#[test]
fn test_provisioned_environment_is_skipped() {
    let bundle = bundle();
    let options = GenerationOptions {
        environment_provisioned: true,
        ..Default::default()
    };
    let set = TaskCompiler::new(options)
        .compile(CompilerInput::from(&bundle))
        .unwrap();
    let env = set.tasks_of_type(TaskType::EnvironmentSetup);
    assert_eq!(env.len(), 1);
    assert_eq!(env[0].execution_mode, ExecutionMode::Skip);
}

#[test]
fn test_missing_document_is_input_problem() {
    let bundle = InputBundle {
        document: None,
        ..bundle()
    };
    let err = TaskCompiler::default()
        .compile(CompilerInput::from(&bundle))
        .unwrap_err();
    assert!(matches!(err, Error::MissingInput(_)));
    assert!(!err.allows_fallback());
}

#[test]
fn test_no_entities_is_input_problem() {
    let bundle = InputBundle {
        entities: Vec::new(),
        ..bundle()
    };
    let err = TaskCompiler::default()
        .compile_with_fallback(CompilerInput::from(&bundle))
        .unwrap_err();
    assert!(matches!(err, Error::MissingInput(_)));
}

#[test]
fn test_broken_workflow_falls_back_to_schema_and_crud() {
    let mut bundle = bundle();
    let document = bundle.document.as_mut().unwrap();
    document.requirements[1]
        .workflow
        .as_mut()
        .unwrap()
        .initial_state = "draft".to_string();

    let compiler = TaskCompiler::default();
    let err = compiler.compile(CompilerInput::from(&bundle)).unwrap_err();
    assert!(err.allows_fallback());

    let set = compiler
        .compile_with_fallback(CompilerInput::from(&bundle))
        .unwrap();
    assert_eq!(set.metadata.mode, CompilerMode::Fallback);
    assert_eq!(set.tasks.len(), 12);
    assert!(set.tasks.iter().all(|t| matches!(
        t.task_type,
        TaskType::DatabaseMigration | TaskType::ApiCrud
    )));
}

#[test]
fn test_export_json_round_trip() {
    let set = compile(&bundle());
    let json = export(&set, ExportFormat::Json).unwrap();
    let back = from_json(&json).unwrap();
    assert_eq!(back, set);

    let markdown = export(&set, ExportFormat::Markdown).unwrap();
    assert!(markdown.starts_with("# Development plan: Order Management"));
    assert!(markdown.contains("## Module: database"));

    let yaml = export(&set, ExportFormat::Yaml).unwrap();
    assert!(yaml.contains("TASK-001"));
}

struct StaticEnricher;

#[async_trait]
impl TaskEnricher for StaticEnricher {
    async fn enrich(
        &self,
        task: &Task,
        _ctx: &EnrichmentContext,
    ) -> Result<Guidance, EnrichmentFailure> {
        Ok(Guidance {
            notes: vec![format!("Start with {}", task.title)],
            suggested_tier: None,
        })
    }
}

fn five_task_set() -> TaskSet {
    let entity = Entity::new("Product", "products")
        .with_field(Field::new("id", DataType::Uuid).primary_key())
        .with_field(Field::new("name", DataType::String).required());
    let document = StructuredRequirementDoc::new("Catalog")
        .with_requirement(FunctionalRequirement::new("FR-001", "Manage products").with_entity("Product"));
    let entities = vec![entity];
    let input = CompilerInput {
        document: Some(&document),
        entities: &entities,
        relationships: &[],
        schema: "",
    };
    let mut set = TaskCompiler::default()
        .compile_with(&MinimalGenerator::new(), input)
        .unwrap();
    // Migration plus the four non-delete endpoints
    set.tasks.truncate(5);
    set
}

#[tokio::test]
async fn test_cancel_after_two_keeps_partial_results() {
    let mut set = five_task_set();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let report = enrich_task_set(
        &mut set,
        &StaticEnricher,
        &EnrichmentContext::default(),
        cancel,
        move |progress| {
            if progress.completed == 2 {
                trigger.cancel();
            }
        },
        1,
    )
    .await
    .expect("cancellation is not an error");

    assert!(report.cancelled);
    assert_eq!(report.enriched, 2);
    let enriched = set.enriched_count();
    let untouched = set
        .tasks
        .iter()
        .filter(|t| t.enrichment == EnrichmentStatus::NotEnriched)
        .count();
    assert_eq!(enriched, 2);
    assert_eq!(untouched, 3);
    assert!(set.tasks[0].enrichment.is_enriched());
    assert!(set.tasks[1].enrichment.is_enriched());
    assert_eq!(set.summary.enriched_tasks, Some(2));
}

#[tokio::test]
async fn test_full_enrichment_run() {
    let mut set = five_task_set();
    let report = enrich_task_set(
        &mut set,
        &StaticEnricher,
        &EnrichmentContext::new("Catalog", ""),
        CancellationToken::new(),
        |_| {},
        3,
    )
    .await
    .unwrap();

    assert!(!report.cancelled);
    assert_eq!(report.enriched, 5);
    assert!(report.failures.is_empty());
    let stats = set.metadata.enrichment.unwrap();
    assert_eq!(stats.enriched, 5);
    assert_eq!(stats.not_enriched, 0);
    assert_eq!(set.summary.enriched_tasks, Some(5));
}
