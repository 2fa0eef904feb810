//! Error module tests

use crate::error::{Error, ErrorCategory, GraphProblem, Result};

#[test]
fn test_missing_input_error() {
    let error = Error::MissingInput("entities".to_string());
    assert_eq!(error.code(), "E001");
    assert!(error.suggestion().is_some());
    assert_eq!(error.category(), ErrorCategory::InputProblem);
    assert!(error.to_string().contains("entities"));
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("duplicate entity 'Order'".to_string());
    assert_eq!(error.code(), "E002");
    assert_eq!(
        error.suggestion(),
        Some("planwright validate <input.json>".to_string())
    );
    assert!(!error.allows_fallback());
}

#[test]
fn test_cycle_error() {
    let problem = GraphProblem::Cycle(vec![
        "TASK-001".to_string(),
        "TASK-002".to_string(),
        "TASK-001".to_string(),
    ]);
    let error = Error::GraphConsistency(problem);
    assert_eq!(error.code(), "E100");
    assert_eq!(error.category(), ErrorCategory::InternalDefect);
    assert!(error.to_string().contains("TASK-001 -> TASK-002 -> TASK-001"));
}

#[test]
fn test_dangling_dependency_error() {
    let error = Error::GraphConsistency(GraphProblem::DanglingDependency {
        task: "TASK-004".to_string(),
        missing: "TASK-099".to_string(),
    });
    assert_eq!(error.code(), "E101");
    assert!(error.to_string().contains("TASK-004 depends on unknown task TASK-099"));
}

#[test]
fn test_generation_error_allows_fallback() {
    let error = Error::Generation("workflow has no states".to_string());
    assert_eq!(error.code(), "E200");
    assert!(error.allows_fallback());
    assert_eq!(error.category(), ErrorCategory::Degraded);
}

#[test]
fn test_enrichment_errors() {
    let error = Error::Enrichment {
        task_id: "TASK-003".to_string(),
        reason: "timeout".to_string(),
    };
    assert_eq!(error.code(), "E300");
    assert_eq!(error.suggestion(), None);
    assert!(error.to_string().contains("TASK-003"));

    let auth = Error::Authentication("401".to_string());
    assert_eq!(auth.code(), "E301");
    assert_eq!(auth.category(), ErrorCategory::External);
    assert!(auth.suggestion().is_some());
}

#[test]
fn test_category_labels() {
    assert_eq!(ErrorCategory::InputProblem.to_string(), "input problem");
    assert_eq!(ErrorCategory::InternalDefect.to_string(), "internal defect");
    assert_eq!(ErrorCategory::Degraded.to_string(), "degraded output");
    assert_eq!(ErrorCategory::External.to_string(), "external failure");
}

#[test]
fn test_serialization_error_from() {
    let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ not json");
    let error: Error = parsed.unwrap_err().into();
    assert_eq!(error.code(), "E700");
}

#[test]
fn test_io_error_from() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "input.json");
    let error: Error = io.into();
    assert_eq!(error.code(), "E9999");
    assert!(error.to_string().contains("input.json"));
}

#[test]
fn test_result_alias() {
    fn fails() -> Result<()> {
        Err(Error::InvalidInput("boom".to_string()))
    }
    assert!(matches!(fails(), Err(Error::InvalidInput(_))));
}

#[test]
fn test_config_error() {
    let error = Error::ConfigError("concurrency out of range".to_string());
    assert_eq!(error.code(), "E600");
    assert_eq!(error.suggestion(), Some("planwright config list".to_string()));
    assert_eq!(error.category(), ErrorCategory::InputProblem);
}
