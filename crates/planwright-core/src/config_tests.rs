//! Config module tests

use crate::compiler::OrphanPolicy;
use crate::config::{Config, EnrichmentConfig, KEYS};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(config.generation.expand_references);
    assert!(!config.generation.environment_provisioned);
    assert_eq!(config.generation.orphan_policy, OrphanPolicy::FirstRequirement);

    assert_eq!(config.enrichment.concurrency, 3);
    assert_eq!(config.enrichment.max_retries, 3);
    assert_eq!(config.enrichment.backoff_base_ms, 1000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_get_and_set_round_trip() {
    let mut config = Config::default();
    config.set("generation.orphan_policy", "drop").unwrap();
    config.set("enrichment.concurrency", "8").unwrap();
    config.set("generation.environment_provisioned", "true").unwrap();

    assert_eq!(config.get("generation.orphan_policy").unwrap(), "drop");
    assert_eq!(config.get("enrichment.concurrency").unwrap(), "8");
    assert!(config.generation.environment_provisioned);
}

#[test]
fn test_set_rejects_bad_values() {
    let mut config = Config::default();
    assert!(config.set("enrichment.concurrency", "0").is_err());
    assert!(config.set("enrichment.concurrency", "17").is_err());
    assert!(config.set("enrichment.concurrency", "many").is_err());
    assert!(config.set("generation.orphan_policy", "keep").is_err());
    assert!(config.set("generation.expand_references", "yes").is_err());
    assert_eq!(config, Config::default());
}

#[test]
fn test_unknown_key() {
    let mut config = Config::default();
    let err = config.get("llm.model").unwrap_err();
    assert!(err.to_string().contains("Unknown configuration key"));
    assert!(config.set("llm.model", "x").is_err());
}

#[test]
fn test_list_covers_every_key() {
    let listed = Config::default().list().unwrap();
    assert_eq!(listed.len(), KEYS.len());
    assert_eq!(listed[0].0, "generation.expand_references");
    assert_eq!(listed[0].1, "true");
}

#[test]
fn test_validate_rejects_zero_backoff_with_retries() {
    let config = Config {
        enrichment: EnrichmentConfig {
            concurrency: 2,
            max_retries: 2,
            backoff_base_ms: 0,
        },
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.set("enrichment.max_retries", "5").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[enrichment]\nconcurrency = 6\n").unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.enrichment.concurrency, 6);
    assert_eq!(loaded.enrichment.max_retries, 3);
    assert!(loaded.generation.expand_references);
}

#[test]
fn test_to_options_and_retry_policy() {
    let mut config = Config::default();
    config.set("generation.expand_references", "false").unwrap();
    config.set("enrichment.backoff_base_ms", "250").unwrap();

    let options = config.to_options(chrono::DateTime::UNIX_EPOCH);
    assert!(!options.expand_references);
    assert_eq!(options.generated_at, chrono::DateTime::UNIX_EPOCH);

    let policy = config.retry_policy();
    assert_eq!(policy.max_retries, 3);
    assert_eq!(policy.backoff_base, std::time::Duration::from_millis(250));
}
