//! Dynamic dependency graph
//!
//! Holds the set of outstanding tasks and their prerequisite edges as two
//! reciprocal adjacency maps. Unlike a precomputed topological plan, the
//! graph is mutated in place while a run is underway: the executor removes
//! each node as its task succeeds, and that removal is what exposes
//! dependents as runnable.
//!
//! The graph is not internally locked. The executor holds the sole `&mut`
//! for the duration of a run and is the only mutator in that window; workers
//! receive task values by clone and never touch the graph.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Write as _};
use std::hash::Hash;

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::DiGraph;
use thiserror::Error;

/// Error types for graph validation
#[derive(Debug, Error)]
pub enum GraphError {
    /// Task dependency cycle detected
    #[error("task dependency graph contains a cycle involving: {tasks}")]
    CyclicDependency { tasks: String },
}

/// A task value lifted into the graph.
///
/// Two nodes name the same graph entry iff their underlying values compare
/// equal. Hashing and equality are delegated to the value, so the graph's
/// collections can be probed with a borrowed `T` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node<T> {
    value: T,
}

impl<T> Node<T> {
    /// Wrap a task value
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// The wrapped task value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwrap back into the task value
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T> From<T> for Node<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

// `Hash` and `Eq` delegate to the single field, as `Borrow` requires.
impl<T> Borrow<T> for Node<T> {
    fn borrow(&self) -> &T {
        &self.value
    }
}

/// Dependency graph over opaque task values.
///
/// `depended_upon` maps a node to the prerequisites it is still waiting on;
/// `depending_on` is the reciprocal map from a node to the nodes waiting on
/// it. The two maps are mutual inverses, maintained together by every
/// mutation. A node with no outstanding prerequisites is *free* and eligible
/// for execution; the free frontier is computed on demand, never stored.
pub struct TaskGraph<T> {
    nodes: HashSet<Node<T>>,
    depended_upon: HashMap<Node<T>, HashSet<Node<T>>>,
    depending_on: HashMap<Node<T>, HashSet<Node<T>>>,
}

impl<T> Default for TaskGraph<T> {
    fn default() -> Self {
        Self {
            nodes: HashSet::new(),
            depended_upon: HashMap::new(),
            depending_on: HashMap::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> TaskGraph<T> {
    /// Create an empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` as a node if not already present.
    ///
    /// Idempotent; never creates edges.
    pub fn add_node(&mut self, value: T) {
        self.nodes.insert(Node::new(value));
    }

    /// Register that `from` depends on `to`.
    ///
    /// Both endpoints are inserted as nodes if absent. Duplicate edges are
    /// absorbed (set semantics).
    pub fn add_edge(&mut self, from: T, to: T) {
        let from = Node::new(from);
        let to = Node::new(to);
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());
        self.depended_upon
            .entry(from.clone())
            .or_default()
            .insert(to.clone());
        self.depending_on.entry(to).or_default().insert(from);
    }

    /// Remove `value` and every edge mentioning it, in either direction.
    ///
    /// Dependents of `value` lose it as a prerequisite, which is what lets
    /// them become free once their other prerequisites are gone. Removing a
    /// non-member is a no-op.
    pub fn remove_node(&mut self, value: &T) {
        if !self.nodes.remove(value) {
            return;
        }
        // Only the adjacency sets that actually mention the node are
        // touched; the reciprocal map names them.
        if let Some(dependents) = self.depending_on.remove(value) {
            for dependent in dependents {
                if let Some(prerequisites) = self.depended_upon.get_mut(&dependent) {
                    prerequisites.remove(value);
                    if prerequisites.is_empty() {
                        self.depended_upon.remove(&dependent);
                    }
                }
            }
        }
        // The reverse direction matters when a node is removed while it
        // still has prerequisites of its own.
        if let Some(prerequisites) = self.depended_upon.remove(value) {
            for prerequisite in prerequisites {
                if let Some(dependents) = self.depending_on.get_mut(&prerequisite) {
                    dependents.remove(value);
                    if dependents.is_empty() {
                        self.depending_on.remove(&prerequisite);
                    }
                }
            }
        }
    }

    /// Snapshot of every node with no outstanding prerequisites.
    ///
    /// Computed from the current state; callers must not assume the set is
    /// stable across mutations.
    #[must_use]
    pub fn free_nodes(&self) -> HashSet<T> {
        self.nodes
            .iter()
            .filter(|node| {
                self.depended_upon
                    .get(node.value())
                    .is_none_or(HashSet::is_empty)
            })
            .map(|node| node.value().clone())
            .collect()
    }

    /// Prerequisites `value` is still waiting on.
    #[must_use]
    pub fn dependencies_of(&self, value: &T) -> HashSet<T> {
        self.depended_upon
            .get(value)
            .map(|set| set.iter().map(|node| node.value().clone()).collect())
            .unwrap_or_default()
    }

    /// Nodes waiting on `value`.
    #[must_use]
    pub fn dependents_of(&self, value: &T) -> HashSet<T> {
        self.depending_on
            .get(value)
            .map(|set| set.iter().map(|node| node.value().clone()).collect())
            .unwrap_or_default()
    }

    /// All task values currently in the graph
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.nodes.iter().map(|node| node.value().clone()).collect()
    }

    /// Whether `value` is a member of the graph
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.nodes.contains(value)
    }

    /// Number of nodes in the graph
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of dependency edges remaining
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.depended_upon.values().map(HashSet::len).sum()
    }
}

impl<T: Eq + Hash + Clone + Debug> TaskGraph<T> {
    /// Human-readable rendering of nodes, the current free frontier, and the
    /// remaining dependency edges. Diagnostics only; the format is not
    /// contractual.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut nodes: Vec<String> = self
            .nodes
            .iter()
            .map(|node| format!("{:?}", node.value()))
            .collect();
        nodes.sort();

        let mut free: Vec<String> = self
            .free_nodes()
            .iter()
            .map(|value| format!("{value:?}"))
            .collect();
        free.sort();

        let mut edges: Vec<String> = self
            .depended_upon
            .iter()
            .flat_map(|(from, tos)| {
                tos.iter()
                    .map(move |to| format!("{:?} -> {:?}", from.value(), to.value()))
            })
            .collect();
        edges.sort();

        let mut out = String::new();
        let _ = writeln!(out, "nodes: [{}]", nodes.join(", "));
        let _ = writeln!(out, "free:  [{}]", free.join(", "));
        let _ = writeln!(out, "edges:");
        for edge in &edges {
            let _ = writeln!(out, "  {edge}");
        }
        out
    }

    /// Check that the graph is acyclic.
    ///
    /// The executor does not call this: cycles are caller errors and
    /// manifest as a run that never reaches quiescence. Callers that want
    /// the guarantee up front run this after construction.
    ///
    /// # Errors
    /// Returns [`GraphError::CyclicDependency`] if any cycle exists.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut graph = DiGraph::<&T, ()>::new();
        let mut indices = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            indices.insert(node.value(), graph.add_node(node.value()));
        }
        for (from, tos) in &self.depended_upon {
            for to in tos {
                // Edge goes from prerequisite to dependent (to -> from).
                graph.add_edge(indices[to.value()], indices[from.value()], ());
            }
        }

        if is_cyclic_directed(&graph) {
            let mut tasks: Vec<String> =
                self.values().iter().map(|value| format!("{value:?}")).collect();
            tasks.sort();
            return Err(GraphError::CyclicDependency {
                tasks: tasks.join(", "),
            });
        }

        Ok(())
    }
}
