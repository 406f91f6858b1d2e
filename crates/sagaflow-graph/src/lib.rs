//! Dependency graph for saga workflows.
//!
//! Nodes are step names. An edge `dependency -> step` means the dependency
//! must complete before the step may run. The graph tracks which steps have
//! completed during a run and answers which steps are ready next.
//!
//! Cycles are not rejected when steps are added; callers validate the graph
//! with [`DependencyGraph::has_cycles`] (or [`DependencyGraph::find_cycle`])
//! before executing anything.

mod graph;
mod node;

pub use graph::DependencyGraph;
pub use node::GraphNode;
