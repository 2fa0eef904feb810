//! Dependency resolver
//!
//! Stitches entity-bound tasks to their schema migration and checks the
//! resulting graph: no dangling ids, no cycles. Also layers a valid graph
//! into execution stages.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::compiler::context::MigrationIndex;
use crate::domain::task::{Task, TaskId};
use crate::error::{Error, GraphProblem, Result};

/// Make every API/UI/service task that names an entity depend on that
/// entity's migration; returns the number of edges added
pub fn link_migrations(tasks: &mut [Task], migrations: &MigrationIndex) -> usize {
    let mut added = 0;
    for task in tasks.iter_mut() {
        if !task.task_type.requires_entity_migration() {
            continue;
        }
        let Some(migration) = task.related_entity.as_deref().and_then(|e| migrations.get(e)) else {
            continue;
        };
        if task.add_dependency(migration) {
            added += 1;
        }
    }
    debug!(added, "Linked tasks to entity migrations");
    added
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Check that every dependency resolves and that the graph is acyclic
pub fn validate_graph(tasks: &[Task]) -> Result<()> {
    let index: BTreeMap<TaskId, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

    for task in tasks {
        if let Some(missing) = task.dependencies.iter().find(|d| !index.contains_key(*d)) {
            return Err(Error::GraphConsistency(GraphProblem::DanglingDependency {
                task: task.id.to_string(),
                missing: missing.to_string(),
            }));
        }
    }

    // Iterative three-colour DFS; the explicit stack doubles as the cycle path
    let mut marks = vec![Mark::Unvisited; tasks.len()];
    for start in 0..tasks.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::InProgress;
        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let deps = &tasks[node].dependencies;
            if next < deps.len() {
                frame.1 += 1;
                let child = index[&deps[next]];
                match marks[child] {
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::InProgress => {
                        let from = stack.iter().position(|&(n, _)| n == child).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[from..].iter().map(|&(n, _)| tasks[n].id.to_string()).collect();
                        cycle.push(tasks[child].id.to_string());
                        return Err(Error::GraphConsistency(GraphProblem::Cycle(cycle)));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}

/// Layer the graph into stages: every task's dependencies sit in earlier
/// stages, ids ascend within a stage
pub fn execution_order(tasks: &[Task]) -> Result<Vec<Vec<TaskId>>> {
    validate_graph(tasks)?;

    let mut remaining: BTreeMap<TaskId, usize> = tasks
        .iter()
        .map(|t| (t.id, t.dependencies.iter().collect::<BTreeSet<_>>().len()))
        .collect();
    let mut dependents: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
    for task in tasks {
        for dep in task.dependencies.iter().collect::<BTreeSet<_>>() {
            dependents.entry(*dep).or_default().push(task.id);
        }
    }

    let mut stages = Vec::new();
    let mut ready: Vec<TaskId> = remaining
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(id, _)| *id)
        .collect();
    while !ready.is_empty() {
        let mut next = Vec::new();
        for id in &ready {
            remaining.remove(id);
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        next.push(*dependent);
                    }
                }
            }
        }
        next.sort();
        stages.push(std::mem::replace(&mut ready, next));
    }
    Ok(stages)
}
