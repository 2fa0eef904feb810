//! Summary aggregator

use std::collections::BTreeMap;

use crate::domain::task::{Complexity, Task, TaskSummary};

/// Average ordinal complexity; zero for an empty set
pub fn average_complexity(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let total: u32 = tasks
        .iter()
        .map(|t| u32::from(t.estimated_complexity.ordinal()))
        .sum();
    f64::from(total) / tasks.len() as f64
}

pub fn summarize(tasks: &[Task]) -> TaskSummary {
    let mut by_tier = BTreeMap::new();
    let mut by_type = BTreeMap::new();
    for task in tasks {
        *by_tier.entry(task.tier).or_insert(0) += 1;
        *by_type.entry(task.task_type).or_insert(0) += 1;
    }
    let overall_complexity = if tasks.is_empty() {
        Complexity::Trivial
    } else {
        Complexity::from_average(average_complexity(tasks))
    };
    let enriched = tasks.iter().filter(|t| t.enrichment.is_enriched()).count();

    TaskSummary {
        total_tasks: tasks.len(),
        by_tier,
        by_type,
        overall_complexity,
        enriched_tasks: (enriched > 0).then_some(enriched),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::payload::NavigationPayload;
    use crate::domain::task::{TaskId, TaskPayload, TaskSpecification, TaskType, Tier};

    fn task(id: u32, task_type: TaskType, tier: Tier, complexity: Complexity) -> Task {
        let mut task = Task::new(
            TaskId::new(id),
            "t",
            task_type,
            "m",
            TaskSpecification::new("", "", TaskPayload::Navigation(NavigationPayload { items: vec![] })),
        );
        task.tier = tier;
        task.estimated_complexity = complexity;
        task
    }

    #[test]
    fn test_counts_per_tier_and_type() {
        let tasks = vec![
            task(1, TaskType::DatabaseMigration, Tier::T1, Complexity::Simple),
            task(2, TaskType::ApiCrud, Tier::T2, Complexity::Simple),
            task(3, TaskType::ApiCrud, Tier::T2, Complexity::Simple),
            task(4, TaskType::Workflow, Tier::T3, Complexity::Complex),
        ];
        let summary = summarize(&tasks);
        assert_eq!(summary.total_tasks, 4);
        assert_eq!(summary.by_tier[&Tier::T2], 2);
        assert_eq!(summary.by_type[&TaskType::ApiCrud], 2);
        assert!(!summary.by_tier.contains_key(&Tier::T4));
        assert_eq!(summary.overall_complexity, Complexity::Simple);
        assert_eq!(summary.enriched_tasks, None);
    }

    #[test]
    fn test_average_buckets() {
        // 2 + 3 + 3 + 2 + 3 = 13 / 5 = 2.6
        let tasks: Vec<Task> = [2u8, 3, 3, 2, 3]
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let complexity = if *o == 2 { Complexity::Simple } else { Complexity::Moderate };
                task(i as u32 + 1, TaskType::Test, Tier::T2, complexity)
            })
            .collect();
        assert!((average_complexity(&tasks) - 2.6).abs() < f64::EPSILON);
        assert_eq!(summarize(&tasks).overall_complexity, Complexity::Moderate);
    }

    #[test]
    fn test_empty_set() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.overall_complexity, Complexity::Trivial);
    }
}
