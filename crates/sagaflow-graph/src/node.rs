/// Anything that can be registered as a node of a [`DependencyGraph`].
///
/// [`DependencyGraph`]: crate::DependencyGraph
pub trait GraphNode {
    /// Unique name of the node within one graph.
    fn name(&self) -> &str;

    /// Names of the nodes that must complete before this one.
    ///
    /// Duplicates are allowed; the graph deduplicates them.
    fn dependencies(&self) -> Vec<&str>;
}

impl GraphNode for (&str, Vec<&str>) {
    fn name(&self) -> &str {
        self.0
    }

    fn dependencies(&self) -> Vec<&str> {
        self.1.clone()
    }
}
