//! Dependency graph over extension descriptors.
//!
//! Edges point from dependent to dependency: if A requires B the edge is
//! `A -> B`. The graph is derived from a snapshot of descriptors on every
//! planning request and never mutated afterwards.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::extension_system::error::{ExtensionSystemError, Result};
use crate::extension_system::info::ExtensionInfo;

/// Traversal direction for closures and orderings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Dependencies before dependents (install order)
    Forward,
    /// Dependents before dependencies (uninstall order)
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

/// Dependency graph for extensions
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Node weights keyed by extension name
    weights: HashMap<String, i32>,
    /// Edges in the graph (extension -> dependencies, declaration order)
    edges: HashMap<String, Vec<String>>,
    /// Reverse edges (extension -> dependents)
    reverse_edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Builds the graph, failing on the first dependency that is not part of
    /// `extensions`.
    pub fn build(extensions: &[ExtensionInfo]) -> Result<Self> {
        Self::from_extensions(extensions, true)
    }

    /// Builds the graph keeping only edges whose target is part of
    /// `extensions`.
    pub fn restricted(extensions: &[ExtensionInfo]) -> Result<Self> {
        Self::from_extensions(extensions, false)
    }

    fn from_extensions(extensions: &[ExtensionInfo], strict: bool) -> Result<Self> {
        let mut graph = Self::default();

        for info in extensions {
            if graph.weights.insert(info.name.clone(), info.weight).is_some() {
                return Err(ExtensionSystemError::DuplicateExtension {
                    name: info.name.clone(),
                });
            }
            graph.edges.insert(info.name.clone(), Vec::new());
            graph.reverse_edges.insert(info.name.clone(), Vec::new());
        }

        for info in extensions {
            for dep in &info.requires {
                if !graph.weights.contains_key(&dep.name) {
                    if strict {
                        return Err(ExtensionSystemError::MissingDependency {
                            requester: info.name.clone(),
                            missing: dep.name.clone(),
                        });
                    }
                    continue;
                }
                graph.add_edge(&info.name, &dep.name);
            }
        }

        Ok(graph)
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let deps = self.edges.entry(from.to_string()).or_default();
        if !deps.iter().any(|d| d == to) {
            deps.push(to.to_string());
        }
        let dependents = self.reverse_edges.entry(to.to_string()).or_default();
        if !dependents.iter().any(|d| d == from) {
            dependents.push(from.to_string());
        }
    }

    /// Check if the graph contains a node
    pub fn contains(&self, name: &str) -> bool {
        self.weights.contains_key(name)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Direct dependencies of a node, in declaration order
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.neighbours(name, Direction::Forward)
            .iter()
            .map(String::as_str)
            .collect()
    }

    /// Direct dependents of a node, sorted by name
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        let mut dependents: Vec<&str> = self
            .neighbours(name, Direction::Reverse)
            .iter()
            .map(String::as_str)
            .collect();
        dependents.sort_unstable();
        dependents
    }

    fn neighbours(&self, name: &str, direction: Direction) -> &[String] {
        let map = match direction {
            Direction::Forward => &self.edges,
            Direction::Reverse => &self.reverse_edges,
        };
        map.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn ensure_known<S: AsRef<str>>(&self, roots: &[S]) -> Result<()> {
        for root in roots {
            if !self.contains(root.as_ref()) {
                return Err(ExtensionSystemError::UnknownExtension {
                    name: root.as_ref().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Transitive closure of `roots` (roots included).
    ///
    /// `Forward` follows the requires relation, `Reverse` follows the
    /// is-required-by relation.
    pub fn closure<S: AsRef<str>>(&self, roots: &[S], direction: Direction) -> Result<BTreeSet<String>> {
        self.ensure_known(roots)?;

        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut stack: Vec<&str> = roots.iter().map(|r| r.as_ref()).collect();
        while let Some(current) = stack.pop() {
            if !visited.insert(current.to_string()) {
                continue;
            }
            for next in self.neighbours(current, direction) {
                if !visited.contains(next) {
                    stack.push(next);
                }
            }
        }
        Ok(visited)
    }

    /// Check if the graph contains cycles
    pub fn has_cycles(&self) -> bool {
        let mut names: Vec<&str> = self.weights.keys().map(String::as_str).collect();
        names.sort_unstable();
        self.find_cycle(&names, Direction::Forward).is_some()
    }

    /// Depth-first search for a cycle reachable from `roots`.
    ///
    /// Returns the nodes on the DFS stack between the first and the repeated
    /// visit of the node that closed the cycle.
    fn find_cycle(&self, roots: &[&str], direction: Direction) -> Option<Vec<String>> {
        let mut state: HashMap<&str, VisitState> = HashMap::new();
        let mut stack: Vec<&str> = Vec::new();

        for root in roots {
            if let Some(cycle) = self.visit(root, direction, &mut state, &mut stack) {
                return Some(cycle);
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        direction: Direction,
        state: &mut HashMap<&'a str, VisitState>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        match state.get(node) {
            Some(VisitState::Done) => return None,
            Some(VisitState::InProgress) => {
                let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                return Some(stack[start..].iter().map(|n| n.to_string()).collect());
            }
            None => {}
        }

        state.insert(node, VisitState::InProgress);
        stack.push(node);

        for next in self.neighbours(node, direction) {
            if let Some(cycle) = self.visit(next.as_str(), direction, state, stack) {
                return Some(cycle);
            }
        }

        stack.pop();
        state.insert(node, VisitState::Done);
        None
    }

    /// Orders the closure of `roots`.
    ///
    /// `Forward` places every extension after all of its dependencies; ties
    /// between ready nodes break on ascending weight, then name. `Reverse` is
    /// the exact reverse of the forward order over the reverse closure.
    pub fn topological_order<S: AsRef<str>>(&self, roots: &[S], direction: Direction) -> Result<Vec<String>> {
        self.ensure_known(roots)?;

        let mut sorted_roots: Vec<&str> = roots.iter().map(|r| r.as_ref()).collect();
        sorted_roots.sort_unstable();
        sorted_roots.dedup();

        if let Some(members) = self.find_cycle(&sorted_roots, direction) {
            return Err(ExtensionSystemError::CircularDependency { members });
        }

        let nodes = self.closure(&sorted_roots, direction)?;
        let mut order = self.forward_order(&nodes)?;
        if direction == Direction::Reverse {
            order.reverse();
        }
        Ok(order)
    }

    /// Kahn's algorithm restricted to `nodes`, ready set ordered by
    /// (weight, name).
    fn forward_order(&self, nodes: &BTreeSet<String>) -> Result<Vec<String>> {
        let mut pending: HashMap<&str, usize> = HashMap::new();
        let mut ready: BTreeSet<(i32, &str)> = BTreeSet::new();

        for name in nodes {
            let count = self
                .neighbours(name, Direction::Forward)
                .iter()
                .filter(|dep| nodes.contains(*dep))
                .count();
            if count == 0 {
                ready.insert((self.weight_of(name), name.as_str()));
            } else {
                pending.insert(name.as_str(), count);
            }
        }

        let mut order = Vec::with_capacity(nodes.len());
        while let Some((_, name)) = ready.pop_first() {
            order.push(name.to_string());
            for dependent in self.neighbours(name, Direction::Reverse) {
                if let Some(count) = pending.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        pending.remove(dependent.as_str());
                        ready.insert((self.weight_of(dependent), dependent.as_str()));
                    }
                }
            }
        }

        if order.len() != nodes.len() {
            // Only reachable when a cycle escaped the rooted search.
            let placed: HashSet<&str> = order.iter().map(String::as_str).collect();
            let members = nodes
                .iter()
                .filter(|n| !placed.contains(n.as_str()))
                .cloned()
                .collect();
            return Err(ExtensionSystemError::CircularDependency { members });
        }
        Ok(order)
    }

    fn weight_of(&self, name: &str) -> i32 {
        self.weights.get(name).copied().unwrap_or_default()
    }
}
