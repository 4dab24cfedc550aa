// src/dag/graph.rs

use std::collections::HashSet;

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::dag::task::Task;
use crate::errors::{Result, SiteflowError};

/// Check the static shape of the task graph.
///
/// This checks:
/// - every prerequisite names a registered task
/// - the prerequisite relation has no cycles (self-dependencies included)
pub fn validate_graph(tasks: &[Task]) -> Result<()> {
    validate_references(tasks)?;
    validate_acyclic(tasks)
}

fn validate_references(tasks: &[Task]) -> Result<()> {
    let known: HashSet<&str> = tasks.iter().map(Task::name).collect();
    for task in tasks {
        for dep in task.prerequisites() {
            if !known.contains(dep.as_str()) {
                warn!(task = %task.name(), prerequisite = %dep, "unknown prerequisite");
                return Err(SiteflowError::UnknownTask(dep.clone()));
            }
        }
    }
    Ok(())
}

fn validate_acyclic(tasks: &[Task]) -> Result<()> {
    // Edge direction: task -> prerequisite.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for task in tasks {
        graph.add_node(task.name());
    }
    for task in tasks {
        for dep in task.prerequisites() {
            graph.add_edge(task.name(), dep.as_str(), ());
        }
    }

    if toposort(&graph, None).is_ok() {
        return Ok(());
    }

    let component = tarjan_scc(&graph)
        .into_iter()
        .find(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .unwrap_or_default();

    Err(SiteflowError::CyclicDependency {
        cycle: trace_cycle(&graph, &component),
    })
}

/// Walk edges inside a strongly connected component until a node repeats,
/// yielding a concrete cycle such as `["a", "b", "a"]`.
fn trace_cycle(graph: &DiGraphMap<&str, ()>, component: &[&str]) -> Vec<String> {
    let members: HashSet<&str> = component.iter().copied().collect();
    let Some(start) = component.iter().copied().min() else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(next) = graph.neighbors(current).filter(|n| members.contains(n)).min() else {
            return path.iter().map(|s| s.to_string()).collect();
        };
        if let Some(pos) = path.iter().position(|p| *p == next) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
            cycle.push(next.to_string());
            return cycle;
        }
        path.push(next);
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use crate::dag::{RegistryBuilder, TaskContext};
    use crate::errors::SiteflowError;

    async fn noop(_: TaskContext) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn two_node_cycle_is_named() {
        let mut builder = RegistryBuilder::new();
        builder.register("a", &["b"], noop).unwrap();
        builder.register("b", &["a"], noop).unwrap();

        match builder.build() {
            Err(SiteflowError::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let mut builder = RegistryBuilder::new();
        builder.register("loop", &["loop"], noop).unwrap();

        match builder.build() {
            Err(SiteflowError::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec!["loop", "loop"]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn dangling_prerequisite_is_unknown() {
        let mut builder = RegistryBuilder::new();
        builder.register("html", &["sass"], noop).unwrap();

        assert!(matches!(
            builder.build(),
            Err(SiteflowError::UnknownTask(ref n)) if n == "sass"
        ));
    }

    #[test]
    fn diamond_is_accepted() {
        let mut builder = RegistryBuilder::new();
        builder.register("base", &[], noop).unwrap();
        builder.register("left", &["base"], noop).unwrap();
        builder.register("right", &["base"], noop).unwrap();
        builder.register("top", &["left", "right"], noop).unwrap();

        assert_eq!(builder.build().unwrap().len(), 4);
    }
}
