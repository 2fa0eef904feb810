//! Project-wide assembly templates
//!
//! These run after the per-entity and per-screen families and read the ids
//! those families assigned: environment, API client, route configuration,
//! navigation, page composition, end-to-end flows and test setup.

use std::collections::BTreeSet;

use super::{
    MODULE_API, MODULE_APP_SHELL, MODULE_INFRASTRUCTURE, MODULE_TESTING, MODULE_UI, camel_case,
    ids_of_type, ids_where, pascal_case, plural, see,
};
use crate::compiler::context::{GenerationContext, IdCounter, normalize_route};
use crate::domain::document::{FunctionalRequirement, RuleKind};
use crate::domain::task::payload::{
    ApiClientPayload, ClientCall, DependencyPin, EnvironmentPayload, FlowPayload, NavItem,
    NavigationPayload, PagePayload, RouteEntry, RoutePayload, TaskPayload, TestScenario,
};
use crate::domain::task::{
    CrudOperation, ExecutionMode, Task, TaskId, TaskSpecification, TaskType,
};

use super::api::route_for;

/// Steps every page composition follows, in order
pub const PAGE_STEPS: [&str; 5] = [
    "Import the screen components",
    "Wire page state",
    "Implement data fetch on mount",
    "Bind screen actions to handlers",
    "Handle loading and error states",
];

/// Most rule-violation scenarios attached to one flow
const MAX_VIOLATION_SCENARIOS: usize = 2;

fn setup_mode(ctx: &GenerationContext<'_>) -> ExecutionMode {
    if ctx.options.environment_provisioned {
        ExecutionMode::Skip
    } else {
        ExecutionMode::CodeGeneration
    }
}

fn pins(list: &[(&str, &str)]) -> Vec<DependencyPin> {
    list.iter()
        .map(|(name, version)| DependencyPin {
            name: name.to_string(),
            version: version.to_string(),
        })
        .collect()
}

pub fn environment_task(ctx: &GenerationContext<'_>, ids: &mut IdCounter) -> Task {
    let provisioned = ctx.options.environment_provisioned;
    let payload = EnvironmentPayload {
        components: vec![
            "PostgreSQL database".to_string(),
            "API server runtime".to_string(),
            "Web client build toolchain".to_string(),
        ],
        dependencies: pins(&[
            ("postgresql", "16"),
            ("node", "20"),
            ("typescript", "5"),
        ]),
        verification_steps: vec![
            "Database accepts connections with the configured credentials".to_string(),
            "Migrations run against an empty database".to_string(),
            "API server starts and answers a health check".to_string(),
            "Web client builds without errors".to_string(),
        ],
        provisioned,
    };

    let mut spec = TaskSpecification::new(
        "Set up the development environment",
        format!(
            "Runtime needed by the {} tables of {}.",
            ctx.entities.len(),
            if ctx.document.title.is_empty() { "the project" } else { ctx.document.title.as_str() }
        ),
        TaskPayload::Environment(payload.clone()),
    );
    spec.requirements
        .extend(payload.components.iter().map(|c| format!("Provide {}", c)));
    spec.requirements.extend(
        payload
            .dependencies
            .iter()
            .map(|p| format!("Pin {} {}", p.name, p.version)),
    );
    spec.security_notes
        .push("Keep credentials out of version control".to_string());
    if provisioned {
        spec.technical_notes
            .push("Already provisioned; verify only".to_string());
    }

    Task::new(
        ids.mint(),
        "Set up development environment",
        TaskType::EnvironmentSetup,
        MODULE_INFRASTRUCTURE,
        spec,
    )
    .with_mode(setup_mode(ctx))
    .with_criteria(payload.verification_steps.clone())
    .with_tags(["environment", "setup"])
}

/// Typed client with one call per CRUD endpoint
pub fn api_client_task(ctx: &GenerationContext<'_>, ids: &mut IdCounter, prior: &[Task]) -> Task {
    let calls: Vec<ClientCall> = ctx
        .entities
        .iter()
        .flat_map(|entity| {
            CrudOperation::ALL.into_iter().map(move |operation| {
                let name = match operation {
                    CrudOperation::List => format!("list{}", pascal_case(&plural(&entity.name))),
                    _ => format!("{}{}", operation.as_str(), pascal_case(&entity.name)),
                };
                ClientCall {
                    name,
                    method: operation.http_method().to_string(),
                    route: route_for(entity, operation),
                    entity: entity.name.clone(),
                }
            })
        })
        .collect();

    let mut spec = TaskSpecification::new(
        "Build the typed API client",
        "Single client module the UI uses for every endpoint.",
        TaskPayload::ApiClient(ApiClientPayload { calls: calls.clone() }),
    );
    spec.requirements.extend(
        calls
            .iter()
            .map(|c| format!("{}() -> {} {}", c.name, c.method, c.route)),
    );
    spec.requirements
        .push("Map 400/401/404/500 responses to typed errors".to_string());
    spec.security_notes
        .push("Attach the session credential to every request".to_string());

    Task::new(
        ids.mint(),
        "Build API client",
        TaskType::ApiClient,
        MODULE_API,
        spec,
    )
    .with_dependencies(ids_of_type(prior, TaskType::ApiCrud))
    .with_criteria(vec![
        format!("All {} calls are implemented and typed", calls.len()),
        "Errors surface with status and message".to_string(),
    ])
    .with_tags(["api", "client"])
}

fn component_name(screen_name: &str) -> String {
    let name = pascal_case(screen_name);
    if name.ends_with("Page") || name.ends_with("Screen") {
        name
    } else {
        format!("{}Screen", name)
    }
}

/// Router table over the de-duplicated routes; `None` when there are no screens
pub fn route_config_task(
    ctx: &GenerationContext<'_>,
    ids: &mut IdCounter,
    prior: &[Task],
) -> Option<Task> {
    if ctx.screens().is_empty() {
        return None;
    }
    let routes: Vec<RouteEntry> = ctx
        .screens()
        .iter()
        .map(|placed| RouteEntry {
            path: placed.route().to_string(),
            screen_id: placed.screen.id.clone(),
            screen_name: placed.screen.name.clone(),
            component: component_name(&placed.screen.name),
        })
        .collect();

    let mut spec = TaskSpecification::new(
        "Configure client-side routing",
        format!("{} routes, one per unique screen route.", routes.len()),
        TaskPayload::Routes(RoutePayload { routes: routes.clone() }),
    );
    spec.requirements.extend(
        routes
            .iter()
            .map(|r| format!("{} renders {} ({})", r.path, r.component, r.screen_id)),
    );
    spec.requirements
        .push("Unknown paths render a not-found page".to_string());

    Some(
        Task::new(
            ids.mint(),
            "Configure routes",
            TaskType::RouteConfig,
            MODULE_APP_SHELL,
            spec,
        )
        .with_dependencies(ids_where(prior, |t| t.task_type.is_ui()))
        .with_criteria(vec![
            format!("All {} routes resolve to their screen", routes.len()),
            "Deep links load the right screen on refresh".to_string(),
        ])
        .with_tags(["routing"]),
    )
}

pub fn navigation_task(ctx: &GenerationContext<'_>, ids: &mut IdCounter, route_config: TaskId) -> Task {
    // Parameterized routes are reached from their list screens, not the menu
    let items: Vec<NavItem> = ctx
        .screens()
        .iter()
        .filter(|placed| !placed.route().contains(':'))
        .map(|placed| NavItem {
            label: placed.screen.name.clone(),
            route: placed.route().to_string(),
        })
        .collect();

    let mut spec = TaskSpecification::new(
        "Build the navigation menu",
        "Top-level navigation over the configured routes.",
        TaskPayload::Navigation(NavigationPayload { items: items.clone() }),
    );
    spec.requirements.extend(
        items
            .iter()
            .map(|i| format!("Menu entry \"{}\" -> {}", i.label, i.route)),
    );
    spec.requirements
        .push("Highlight the entry for the active route".to_string());

    Task::new(
        ids.mint(),
        "Build navigation",
        TaskType::Navigation,
        MODULE_APP_SHELL,
        spec,
    )
    .with_dependency(route_config)
    .with_criteria(vec![format!("{} menu entries are shown", items.len())])
    .with_tags(["navigation"])
}

/// One page per unique route, depending on exactly the UI tasks at that route
pub fn page_tasks(ctx: &GenerationContext<'_>, ids: &mut IdCounter, prior: &[Task]) -> Vec<Task> {
    let mut pages = Vec::new();
    let mut routes: Vec<&str> = Vec::new();
    for placed in ctx.screens() {
        if routes.contains(&placed.route()) {
            continue;
        }
        routes.push(placed.route());
        let route = placed.route();
        let ui: Vec<&Task> = prior
            .iter()
            .filter(|t| t.task_type.is_ui() && t.route.as_deref() == Some(route))
            .collect();
        let screens: Vec<String> = ui
            .iter()
            .filter_map(|t| match &t.specification.payload {
                TaskPayload::Ui(payload) => Some(payload.screen_id.clone()),
                _ => None,
            })
            .collect();

        let mut spec = TaskSpecification::new(
            format!("Compose the page served at {}", route),
            format!("Assembles {} into a routed page.", screens.join(", ")),
            TaskPayload::Page(PagePayload {
                route: route.to_string(),
                screens: screens.clone(),
                steps: PAGE_STEPS.iter().map(|s| s.to_string()).collect(),
            }),
        );
        spec.requirements.extend(
            PAGE_STEPS
                .iter()
                .enumerate()
                .map(|(i, step)| format!("{}. {}", i + 1, step)),
        );
        spec.edge_cases
            .push("Fetch fails or times out on mount".to_string());
        spec.edge_cases
            .push("User navigates away while a request is pending".to_string());

        let mut task = Task::new(
            ids.mint(),
            format!("Compose page {}", route),
            TaskType::PageComposition,
            MODULE_UI,
            spec,
        )
        .with_route(route)
        .with_requirement(&placed.requirement_id)
        .with_dependencies(ui.iter().map(|t| t.id))
        .with_criteria(vec![
            format!("{} loads its data and renders without errors", route),
            "Loading and error states are visible to the user".to_string(),
        ])
        .with_tags(["page", "composition"]);
        if let Some(entity) = ui.iter().find_map(|t| t.related_entity.clone()) {
            task = task.with_entity(entity);
        }
        pages.push(task);
    }
    pages
}

fn scenarios(requirement: &FunctionalRequirement, routes: &[String]) -> Vec<TestScenario> {
    let mut scenarios = vec![TestScenario {
        name: format!("{}: happy path", requirement.title),
        steps: routes.iter().map(|r| format!("Open {} and complete it", r)).collect(),
        expected: "The flow completes and the data is persisted".to_string(),
    }];
    let violations = requirement
        .business_rules
        .iter()
        .filter(|r| matches!(r.kind, RuleKind::Validation | RuleKind::Constraint))
        .take(MAX_VIOLATION_SCENARIOS)
        .map(|rule| TestScenario {
            name: format!("{}: violates {}", requirement.title, rule.id),
            steps: vec![format!("Submit input that breaks {}", rule.name)],
            expected: rule
                .error_message
                .clone()
                .unwrap_or_else(|| super::rules::default_error_message(rule)),
        });
    scenarios.extend(violations);
    scenarios
}

/// Flow tests, one per requirement whose screens all have pages
///
/// Requirements without screens have nothing to drive through the UI and get
/// no flow.
pub fn e2e_tasks(ctx: &GenerationContext<'_>, ids: &mut IdCounter, prior: &[Task]) -> Vec<Task> {
    let page_routes: BTreeSet<&str> = prior
        .iter()
        .filter(|t| t.task_type == TaskType::PageComposition)
        .filter_map(|t| t.route.as_deref())
        .collect();

    let mut flows = Vec::new();
    for requirement in &ctx.document.requirements {
        if requirement.screens.is_empty() {
            continue;
        }
        let mut routes: Vec<String> = Vec::new();
        for screen in &requirement.screens {
            let route = normalize_route(&screen.route);
            if !routes.contains(&route) {
                routes.push(route);
            }
        }
        if !routes.iter().all(|r| page_routes.contains(r.as_str())) {
            continue;
        }

        let screen_ids: Vec<String> = requirement.screens.iter().map(|s| s.id.clone()).collect();
        let rule_ids: Vec<String> = requirement.business_rules.iter().map(|r| r.id.clone()).collect();
        let scenarios = scenarios(requirement, &routes);

        let mut spec = TaskSpecification::new(
            format!("Verify {} end to end", requirement.title),
            format!("Flow test for {}.", requirement.id),
            TaskPayload::Flow(FlowPayload {
                requirement_id: requirement.id.clone(),
                screens: screen_ids.clone(),
                rules: rule_ids.clone(),
                scenarios: scenarios.clone(),
            }),
        );
        spec.requirements.push(see(&requirement.id));
        spec.requirements.extend(screen_ids.iter().map(|id| see(id)));
        spec.requirements.extend(rule_ids.iter().map(|id| see(id)));
        spec.requirements.extend(
            scenarios
                .iter()
                .map(|s| format!("Scenario \"{}\": expect {}", s.name, s.expected)),
        );

        let mut deps = ids_where(prior, |t| {
            t.task_type == TaskType::PageComposition
                && t.route.as_deref().is_some_and(|r| routes.iter().any(|x| x == r))
        });
        let logic = ids_where(prior, |t| {
            matches!(t.task_type, TaskType::Workflow | TaskType::Validation)
                && t.related_requirement.as_deref() == Some(requirement.id.as_str())
        });
        if logic.is_empty() {
            deps.extend(ids_where(prior, |t| {
                t.task_type == TaskType::ServiceLayer
                    && requirement.entities.iter().any(|e| t.concerns_entity(e))
            }));
        } else {
            deps.extend(logic);
        }

        let mut task = Task::new(
            ids.mint(),
            format!("E2E flow: {}", requirement.title),
            TaskType::E2eFlow,
            MODULE_TESTING,
            spec,
        )
        .with_priority(requirement.priority)
        .with_requirement(&requirement.id)
        .with_mode(ExecutionMode::Manual)
        .with_dependencies(deps)
        .with_criteria(vec![
            "The happy path passes in a browser against a seeded database".to_string(),
            "Every listed rule violation shows its error message".to_string(),
        ])
        .with_test_cases(scenarios.iter().map(|s| s.name.clone()).collect())
        .with_tags(["e2e", camel_case(&requirement.title).as_str()]);
        if let Some(entity) = requirement.primary_entity() {
            task = task.with_entity(entity);
        }
        flows.push(task);
    }
    flows
}

pub fn test_setup_task(ctx: &GenerationContext<'_>, ids: &mut IdCounter, environment: TaskId) -> Task {
    let payload = EnvironmentPayload {
        components: vec![
            "Unit test runner".to_string(),
            "Disposable test database".to_string(),
            "Browser automation for E2E flows".to_string(),
        ],
        dependencies: pins(&[("vitest", "1"), ("playwright", "1")]),
        verification_steps: vec![
            "An empty test suite runs green".to_string(),
            "The test database is created and torn down per run".to_string(),
        ],
        provisioned: ctx.options.environment_provisioned,
    };
    let mut spec = TaskSpecification::new(
        "Set up the test environment",
        "Shared tooling for the test and E2E tasks.",
        TaskPayload::Environment(payload.clone()),
    );
    spec.requirements
        .extend(payload.components.iter().map(|c| format!("Provide {}", c)));
    spec.requirements
        .push("Seed fixtures for every entity".to_string());

    Task::new(
        ids.mint(),
        "Set up test environment",
        TaskType::TestSetup,
        MODULE_TESTING,
        spec,
    )
    .with_mode(setup_mode(ctx))
    .with_dependency(environment)
    .with_criteria(payload.verification_steps.clone())
    .with_tags(["testing", "setup"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::context::{CompilerInput, GenerationOptions};
    use crate::compiler::templates::ui::ui_task;
    use crate::domain::document::{
        BusinessRule, Entity, Screen, ScreenKind, StructuredRequirementDoc,
    };

    fn document() -> StructuredRequirementDoc {
        StructuredRequirementDoc::new("Shop")
            .with_requirement(
                FunctionalRequirement::new("FR-001", "Manage orders")
                    .with_entity("Order")
                    .with_rule(BusinessRule::new("BR-001", "Qty", RuleKind::Validation))
                    .with_rule(BusinessRule::new("BR-002", "Stock", RuleKind::Constraint))
                    .with_rule(BusinessRule::new("BR-003", "Limit", RuleKind::Validation))
                    .with_screen(Screen::new("SCR-001", "Order list", ScreenKind::List, "/orders"))
                    .with_screen(Screen::new("SCR-002", "Order edit", ScreenKind::Form, "/orders/:id")),
            )
            .with_requirement(FunctionalRequirement::new("FR-002", "Reports"))
    }

    #[test]
    fn test_pages_and_flows() {
        let doc = document();
        let entities = vec![Entity::new("Order", "orders")];
        let mut ids = IdCounter::new();
        let ctx = GenerationContext::build(
            CompilerInput {
                document: Some(&doc),
                entities: &entities,
                relationships: &[],
                schema: "",
            },
            GenerationOptions::default(),
            &mut ids,
        )
        .unwrap();

        let mut tasks: Vec<Task> = ctx.screens().iter().map(|p| ui_task(&ctx, &mut ids, p)).collect();
        let pages = page_tasks(&ctx, &mut ids, &tasks);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].dependencies, vec![tasks[0].id]);
        let TaskPayload::Page(payload) = &pages[0].specification.payload else {
            panic!("expected page payload");
        };
        assert_eq!(payload.steps.len(), 5);
        assert_eq!(payload.steps[2], "Implement data fetch on mount");
        tasks.extend(pages);

        let flows = e2e_tasks(&ctx, &mut ids, &tasks);
        assert_eq!(flows.len(), 1);
        let TaskPayload::Flow(flow) = &flows[0].specification.payload else {
            panic!("expected flow payload");
        };
        assert_eq!(flow.scenarios.len(), 1 + MAX_VIOLATION_SCENARIOS);
        assert_eq!(flows[0].execution_mode, ExecutionMode::Manual);
    }

    #[test]
    fn test_setup_tasks_skip_when_provisioned() {
        let doc = document();
        let entities = vec![Entity::new("Order", "orders")];
        let mut ids = IdCounter::new();
        let ctx = GenerationContext::build(
            CompilerInput {
                document: Some(&doc),
                entities: &entities,
                relationships: &[],
                schema: "",
            },
            GenerationOptions {
                environment_provisioned: true,
                ..Default::default()
            },
            &mut ids,
        )
        .unwrap();
        let env = environment_task(&ctx, &mut ids);
        let setup = test_setup_task(&ctx, &mut ids, env.id);
        assert_eq!(env.execution_mode, ExecutionMode::Skip);
        assert_eq!(setup.execution_mode, ExecutionMode::Skip);
        assert_eq!(setup.dependencies, vec![env.id]);
    }

    #[test]
    fn test_navigation_skips_parameterized_routes() {
        let doc = document();
        let entities = vec![Entity::new("Order", "orders")];
        let mut ids = IdCounter::new();
        let ctx = GenerationContext::build(
            CompilerInput {
                document: Some(&doc),
                entities: &entities,
                relationships: &[],
                schema: "",
            },
            GenerationOptions::default(),
            &mut ids,
        )
        .unwrap();
        let routes = route_config_task(&ctx, &mut ids, &[]).unwrap();
        let nav = navigation_task(&ctx, &mut ids, routes.id);
        let TaskPayload::Navigation(payload) = &nav.specification.payload else {
            panic!("expected navigation payload");
        };
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.items[0].route, "/orders");
    }
}
