//! Enrichment driver
//!
//! Runs an external [`TaskEnricher`] over a compiled task set with bounded
//! parallelism, cooperative cancellation and per-task progress reporting.
//! The driver takes the set by `&mut`, so only one generation or enrichment
//! can touch a set at a time.

pub mod retry;

pub use retry::{RetryPolicy, RetryingEnricher};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::compiler::summary::summarize;
use crate::domain::task::{
    EnrichmentStats, EnrichmentStatus, ExecutionMode, Guidance, Task, TaskId, TaskSet,
};
use crate::error::{Error, Result};

/// Default number of in-flight enrichment calls
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Why a single enrichment call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentFailure {
    /// Worth retrying (rate limit, timeout, 5xx)
    #[error("transient: {0}")]
    Transient(String),

    #[error("permanent: {0}")]
    Permanent(String),

    /// Credentials rejected; aborts the whole batch
    #[error("authentication: {0}")]
    Authentication(String),
}

/// Project-level context handed to the enricher with each task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentContext {
    pub project_title: String,
    pub schema: String,
}

impl EnrichmentContext {
    pub fn new(project_title: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            project_title: project_title.into(),
            schema: schema.into(),
        }
    }
}

/// Produces implementation guidance for one task
#[async_trait]
pub trait TaskEnricher: Send + Sync {
    async fn enrich(
        &self,
        task: &Task,
        ctx: &EnrichmentContext,
    ) -> std::result::Result<Guidance, EnrichmentFailure>;
}

/// Reported after each task completes, successfully or not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentProgress {
    pub task_id: TaskId,
    pub completed: usize,
    pub total: usize,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task_id: TaskId,
    pub reason: String,
}

impl From<TaskFailure> for Error {
    fn from(failure: TaskFailure) -> Self {
        Error::Enrichment {
            task_id: failure.task_id.to_string(),
            reason: failure.reason,
        }
    }
}

/// Outcome of an enrichment run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub enriched: usize,
    pub failures: Vec<TaskFailure>,
    pub cancelled: bool,
}

fn apply_guidance(task: &mut Task, guidance: Guidance) {
    if let Some(tier) = guidance.suggested_tier {
        task.tier = tier;
    }
    task.enrichment = EnrichmentStatus::Enriched { guidance };
}

/// Enrich every task of a set that is not already satisfied
///
/// Tasks in `skip` mode are marked skipped and never dispatched. When `cancel`
/// fires, in-flight calls are abandoned: finished tasks keep their guidance
/// and everything else stays not-enriched. An authentication failure stops
/// the batch the same way and is returned as [`Error::Authentication`]. Other
/// failures are recorded per task and do not fail the run.
pub async fn enrich_task_set<E, P>(
    set: &mut TaskSet,
    enricher: &E,
    ctx: &EnrichmentContext,
    cancel: CancellationToken,
    progress: P,
    concurrency: usize,
) -> Result<EnrichmentReport>
where
    E: TaskEnricher + ?Sized,
    P: Fn(EnrichmentProgress),
{
    let limit = concurrency.max(1);
    let mut queue: Vec<usize> = Vec::new();
    for (index, task) in set.tasks.iter_mut().enumerate() {
        if task.execution_mode == ExecutionMode::Skip {
            task.enrichment = EnrichmentStatus::Skipped;
        } else {
            task.enrichment = EnrichmentStatus::NotEnriched;
            queue.push(index);
        }
    }
    let total = queue.len();
    info!(tasks = total, concurrency = limit, "Starting enrichment");

    let mut pending = queue.into_iter();
    let mut in_flight = FuturesUnordered::new();
    let mut report = EnrichmentReport::default();
    let mut completed = 0;
    let mut auth_failure: Option<String> = None;

    loop {
        while in_flight.len() < limit && !cancel.is_cancelled() {
            let Some(index) = pending.next() else { break };
            let task = set.tasks[index].clone();
            debug!(task_id = %task.id, "Dispatching enrichment");
            in_flight.push(async move {
                let outcome = enricher.enrich(&task, ctx).await;
                (index, outcome)
            });
        }
        if in_flight.is_empty() {
            break;
        }

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            next = in_flight.next() => next,
        };
        let Some((index, outcome)) = next else { break };

        completed += 1;
        let task = &mut set.tasks[index];
        let succeeded = match outcome {
            Ok(guidance) => {
                apply_guidance(task, guidance);
                report.enriched += 1;
                true
            }
            Err(EnrichmentFailure::Authentication(reason)) => {
                warn!(task_id = %task.id, reason = %reason, "Enrichment provider rejected credentials, aborting batch");
                auth_failure = Some(reason);
                false
            }
            Err(failure) => {
                warn!(task_id = %task.id, error = %failure, "Enrichment failed");
                task.enrichment = EnrichmentStatus::Failed {
                    reason: failure.to_string(),
                };
                report.failures.push(TaskFailure {
                    task_id: task.id,
                    reason: failure.to_string(),
                });
                false
            }
        };
        progress(EnrichmentProgress {
            task_id: set.tasks[index].id,
            completed,
            total,
            succeeded,
        });
        if auth_failure.is_some() {
            break;
        }
    }
    // Abandon whatever is still running
    drop(in_flight);

    report.cancelled = auth_failure.is_none() && cancel.is_cancelled() && completed < total;
    let stats = EnrichmentStats {
        enriched: report.enriched,
        failed: report.failures.len(),
        not_enriched: total - report.enriched - report.failures.len(),
        cancelled: report.cancelled,
    };
    set.summary = summarize(&set.tasks);
    set.metadata.enrichment = Some(stats);
    info!(
        enriched = stats.enriched,
        failed = stats.failed,
        not_enriched = stats.not_enriched,
        cancelled = stats.cancelled,
        "Enrichment finished"
    );

    match auth_failure {
        Some(reason) => Err(Error::Authentication(reason)),
        None => Ok(report),
    }
}
