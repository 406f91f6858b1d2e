use indexmap::{IndexMap, IndexSet};

use crate::node::GraphNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Directed dependency graph over step names.
///
/// Iteration order everywhere follows registration order, so readiness and
/// topological ordering are deterministic for a given set of steps.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// step -> steps it depends on
    dependencies: IndexMap<String, IndexSet<String>>,
    /// step -> steps depending on it (may contain names never registered)
    dependents: IndexMap<String, IndexSet<String>>,
    completed: IndexSet<String>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node and an edge from each of its dependencies to it.
    pub fn add_step<N: GraphNode + ?Sized>(&mut self, node: &N) {
        self.add_node(node.name(), node.dependencies());
    }

    /// Register `name` with the given dependencies.
    ///
    /// Registering the same name twice merges the dependency lists.
    pub fn add_node<'a, I>(&mut self, name: &str, dependencies: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let deps = self.dependencies.entry(name.to_string()).or_default();
        let mut added = Vec::new();
        for dependency in dependencies {
            if deps.insert(dependency.to_string()) {
                added.push(dependency);
            }
        }
        self.dependents.entry(name.to_string()).or_default();
        for dependency in added {
            self.dependents
                .entry(dependency.to_string())
                .or_default()
                .insert(name.to_string());
        }
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Steps that must complete before `name`, in registration order.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.dependencies
            .get(name)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Registered steps that depend on `name`.
    #[must_use]
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.dependents
            .get(name)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Steps not yet completed whose dependencies have all completed.
    ///
    /// Recomputed by a full scan on every call.
    #[must_use]
    pub fn ready_steps(&self) -> Vec<&str> {
        self.dependencies
            .iter()
            .filter(|(name, deps)| {
                !self.completed.contains(name.as_str())
                    && deps.iter().all(|dep| self.completed.contains(dep))
            })
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Steps that have not completed yet, in registration order.
    #[must_use]
    pub fn pending_steps(&self) -> Vec<&str> {
        self.dependencies
            .keys()
            .filter(|name| !self.completed.contains(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Mark a step as completed.
    ///
    /// Returns `false` if the step is unknown or was already completed.
    pub fn complete_step(&mut self, name: &str) -> bool {
        if !self.contains(name) {
            return false;
        }
        self.completed.insert(name.to_string())
    }

    #[must_use]
    pub fn is_completed(&self, name: &str) -> bool {
        self.completed.contains(name)
    }

    /// Completed steps in completion order.
    #[must_use]
    pub fn completed_steps(&self) -> Vec<&str> {
        self.completed.iter().map(String::as_str).collect()
    }

    #[must_use]
    pub fn all_completed(&self) -> bool {
        self.completed.len() == self.dependencies.len()
    }

    /// `(step, dependency)` pairs where the dependency was never registered.
    #[must_use]
    pub fn missing_dependencies(&self) -> Vec<(&str, &str)> {
        let known = &self.dependencies;
        known
            .iter()
            .flat_map(move |(name, deps)| {
                deps.iter()
                    .filter(move |dep| !known.contains_key(dep.as_str()))
                    .map(move |dep| (name.as_str(), dep.as_str()))
            })
            .collect()
    }

    #[must_use]
    pub fn has_cycles(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// The first cycle found by depth-first search, as a path that starts and
    /// ends with the same step (`a -> b -> a`).
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks: IndexMap<&str, Mark> = IndexMap::new();
        let mut stack: Vec<&str> = Vec::new();

        for name in self.dependencies.keys() {
            if !marks.contains_key(name.as_str()) {
                if let Some(cycle) = self.visit_for_cycle(name, &mut marks, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit_for_cycle<'a>(
        &'a self,
        node: &'a str,
        marks: &mut IndexMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(node, Mark::InProgress);
        stack.push(node);

        for next in self.successors(node) {
            match marks.get(next) {
                Some(Mark::InProgress) => {
                    let start = stack.iter().position(|n| *n == next).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(ToString::to_string).collect();
                    cycle.push(next.to_string());
                    return Some(cycle);
                }
                Some(Mark::Done) => {}
                None => {
                    if let Some(cycle) = self.visit_for_cycle(next, marks, stack) {
                        return Some(cycle);
                    }
                }
            }
        }

        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    /// A linear order in which every step follows its dependencies.
    ///
    /// Empty when the graph has cycles.
    #[must_use]
    pub fn topological_sort(&self) -> Vec<&str> {
        if self.has_cycles() {
            return Vec::new();
        }

        let mut visited: IndexSet<&str> = IndexSet::new();
        let mut post_order: Vec<&str> = Vec::with_capacity(self.len());
        for name in self.dependencies.keys() {
            self.visit_post_order(name, &mut visited, &mut post_order);
        }
        post_order.reverse();
        post_order
    }

    fn visit_post_order<'a>(
        &'a self,
        node: &'a str,
        visited: &mut IndexSet<&'a str>,
        post_order: &mut Vec<&'a str>,
    ) {
        if !visited.insert(node) {
            return;
        }
        for next in self.successors(node) {
            self.visit_post_order(next, visited, post_order);
        }
        post_order.push(node);
    }

    fn successors<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.dependents
            .get(node)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }
}
