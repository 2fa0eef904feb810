//! Configuration management
//!
//! Settings live in a TOML file under the user config directory. Every key is
//! optional; missing keys fall back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compiler::{GenerationOptions, OrphanPolicy};
use crate::enrichment::DEFAULT_CONCURRENCY;
use crate::enrichment::retry::{DEFAULT_BACKOFF_BASE_MS, DEFAULT_MAX_RETRIES, RetryPolicy};

/// Upper bound on parallel enrichment requests
pub const MAX_CONCURRENCY: usize = 16;

/// Every key understood by [`Config::get`] and [`Config::set`]
pub const KEYS: &[&str] = &[
    "generation.expand_references",
    "generation.environment_provisioned",
    "generation.orphan_policy",
    "enrichment.concurrency",
    "enrichment.max_retries",
    "enrichment.backoff_base_ms",
];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub enrichment: EnrichmentConfig,
}

/// What the compiler emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub expand_references: bool,
    pub environment_provisioned: bool,
    pub orphan_policy: OrphanPolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            expand_references: true,
            environment_provisioned: false,
            orphan_policy: OrphanPolicy::FirstRequirement,
        }
    }
}

/// How tasks are sent to the enrichment provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub concurrency: usize,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        }
    }
}

impl Config {
    /// Get the config directory path
    ///
    /// Can be overridden with PLANWRIGHT_CONFIG_DIR.
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        if let Ok(dir) = std::env::var("PLANWRIGHT_CONFIG_DIR") {
            return Ok(PathBuf::from(dir));
        }
        let base = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(base.join("planwright"))
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a file, or defaults when it does not exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_CONCURRENCY).contains(&self.enrichment.concurrency) {
            return Err(anyhow!(
                "Enrichment concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            ));
        }
        if self.enrichment.backoff_base_ms == 0 && self.enrichment.max_retries > 0 {
            return Err(anyhow!("Backoff base must be positive when retries are enabled"));
        }
        Ok(())
    }

    /// Get a configuration value by dotted key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        let value = match key {
            "generation.expand_references" => self.generation.expand_references.to_string(),
            "generation.environment_provisioned" => {
                self.generation.environment_provisioned.to_string()
            }
            "generation.orphan_policy" => self.generation.orphan_policy.as_str().to_string(),
            "enrichment.concurrency" => self.enrichment.concurrency.to_string(),
            "enrichment.max_retries" => self.enrichment.max_retries.to_string(),
            "enrichment.backoff_base_ms" => self.enrichment.backoff_base_ms.to_string(),
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `planwright config list` to see available keys.",
                    key
                ));
            }
        };
        Ok(value)
    }

    /// Set a configuration value by dotted key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "generation.expand_references" => {
                self.generation.expand_references = value
                    .parse()
                    .with_context(|| format!("Invalid expand_references value: {}", value))?;
            }
            "generation.environment_provisioned" => {
                self.generation.environment_provisioned = value
                    .parse()
                    .with_context(|| format!("Invalid environment_provisioned value: {}", value))?;
            }
            "generation.orphan_policy" => {
                self.generation.orphan_policy = OrphanPolicy::parse(value).ok_or_else(|| {
                    anyhow!(
                        "Invalid orphan policy: {}. Valid options: first-requirement, drop",
                        value
                    )
                })?;
            }
            "enrichment.concurrency" => {
                let concurrency: usize = value
                    .parse()
                    .with_context(|| format!("Invalid concurrency value: {}", value))?;
                if !(1..=MAX_CONCURRENCY).contains(&concurrency) {
                    return Err(anyhow!(
                        "Enrichment concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    ));
                }
                self.enrichment.concurrency = concurrency;
            }
            "enrichment.max_retries" => {
                self.enrichment.max_retries = value
                    .parse()
                    .with_context(|| format!("Invalid max_retries value: {}", value))?;
            }
            "enrichment.backoff_base_ms" => {
                self.enrichment.backoff_base_ms = value
                    .parse()
                    .with_context(|| format!("Invalid backoff_base_ms value: {}", value))?;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `planwright config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Compiler options for a run stamped at `generated_at`
    pub fn to_options(&self, generated_at: DateTime<Utc>) -> GenerationOptions {
        GenerationOptions {
            expand_references: self.generation.expand_references,
            environment_provisioned: self.generation.environment_provisioned,
            orphan_policy: self.generation.orphan_policy,
            generated_at,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.enrichment.max_retries, self.enrichment.backoff_base_ms)
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
