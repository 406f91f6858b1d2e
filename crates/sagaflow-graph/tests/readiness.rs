//! Integration tests driving a graph the way an executor does.

use sagaflow_graph::{DependencyGraph, GraphNode};

struct Step {
    name: &'static str,
    reads_results_of: Vec<&'static str>,
    after: Vec<&'static str>,
}

impl GraphNode for Step {
    fn name(&self) -> &str {
        self.name
    }

    fn dependencies(&self) -> Vec<&str> {
        self.reads_results_of
            .iter()
            .chain(self.after.iter())
            .copied()
            .collect()
    }
}

fn step(name: &'static str, reads: &[&'static str], after: &[&'static str]) -> Step {
    Step {
        name,
        reads_results_of: reads.to_vec(),
        after: after.to_vec(),
    }
}

fn drain(graph: &mut DependencyGraph) -> Vec<String> {
    let mut order = Vec::new();
    while !graph.all_completed() {
        let ready: Vec<String> = graph.ready_steps().into_iter().map(String::from).collect();
        assert!(!ready.is_empty(), "graph stalled with {:?}", graph.pending_steps());
        for name in ready {
            graph.complete_step(&name);
            order.push(name);
        }
    }
    order
}

#[test]
fn registration_workflow_runs_in_dependency_order() {
    let mut graph = DependencyGraph::new();
    graph.add_step(&step("create_user", &["validate_email", "hash_password"], &[]));
    graph.add_step(&step("validate_email", &[], &[]));
    graph.add_step(&step("hash_password", &[], &[]));

    let order = drain(&mut graph);

    assert_eq!(order, vec!["validate_email", "hash_password", "create_user"]);
}

#[test]
fn explicit_and_result_dependencies_are_combined() {
    let mut graph = DependencyGraph::new();
    graph.add_step(&step("a", &[], &[]));
    graph.add_step(&step("b", &[], &[]));
    graph.add_step(&step("c", &["a"], &["b", "a"]));

    assert_eq!(graph.dependencies_of("c"), vec!["a", "b"]);

    graph.complete_step("a");
    assert_eq!(graph.ready_steps(), vec!["b"]);
    graph.complete_step("b");
    assert_eq!(graph.ready_steps(), vec!["c"]);
}

#[test]
fn every_acyclic_graph_drains_completely() {
    let mut graph = DependencyGraph::new();
    graph.add_step(&step("e", &["c", "d"], &[]));
    graph.add_step(&step("d", &["b"], &[]));
    graph.add_step(&step("c", &["a"], &["b"]));
    graph.add_step(&step("b", &[], &[]));
    graph.add_step(&step("a", &[], &[]));

    assert!(!graph.has_cycles());
    let order = drain(&mut graph);
    assert_eq!(order.len(), 5);
    assert!(graph.all_completed());
    assert_eq!(order.last().map(String::as_str), Some("e"));
}

#[test]
fn topological_order_agrees_with_readiness() {
    let mut graph = DependencyGraph::new();
    graph.add_step(&step("c", &["b"], &[]));
    graph.add_step(&step("b", &["a"], &[]));
    graph.add_step(&step("a", &[], &[]));

    assert_eq!(graph.topological_sort(), vec!["a", "b", "c"]);
}

#[test]
fn cycle_path_names_the_steps_involved() {
    let mut graph = DependencyGraph::new();
    graph.add_step(&step("a", &["b"], &[]));
    graph.add_step(&step("b", &["a"], &[]));
    graph.add_step(&step("independent", &[], &[]));

    let cycle = graph.find_cycle().expect("cycle expected");
    assert!(cycle.contains(&"a".to_string()));
    assert!(cycle.contains(&"b".to_string()));
    assert!(!cycle.contains(&"independent".to_string()));
}
