//! Field dependency graph.
//!
//! Provides the `FieldGraph` type: a static picture of which fields read
//! which other fields, built from a profile's contributions and the
//! defaults of every reachable field. Evaluation never needs it; it is a
//! pre-flight check for formula sets that might loop.

use crate::error::ProfileError;
use crate::expr::{push_unique, ExprNode};
use crate::field::Field;
use crate::profile::Profile;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// A directed graph of field dependencies.
///
/// An edge runs from a dependency to the field that reads it.
///
/// # Examples
///
/// ```rust
/// use statprofile::{Field, Profile};
///
/// let str_ = Field::new("str");
/// let atk = Field::new("atk");
/// let profile = Profile::builder()
///     .insert(&str_, 10)
///     .insert(&atk, &str_ * 2)
///     .build();
///
/// let graph = profile.dependency_graph();
/// assert_eq!(graph.dependencies_of(&atk), vec![str_.clone()]);
///
/// let order = graph.topological_sort().unwrap();
/// let str_pos = order.iter().position(|f| f == &str_).unwrap();
/// let atk_pos = order.iter().position(|f| f == &atk).unwrap();
/// assert!(str_pos < atk_pos);
/// ```
pub struct FieldGraph {
    graph: DiGraph<Field, ()>,
    node_map: HashMap<Field, NodeIndex>,
}

impl FieldGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Build the graph for every field reachable from `profile`.
    ///
    /// A field's edges come from its contributions in the profile and
    /// from its default. A scoped read `f[g=v]` depends on `f` and on
    /// whatever `v` reads; `g` is additionally treated as reading `v`'s
    /// fields, since that is what it resolves to inside the scope.
    pub fn from_profile(profile: &Profile) -> Self {
        let mut graph = FieldGraph::new();
        let mut visited = HashSet::new();
        // popped in name order, so identical profiles build identical graphs
        let mut stack: Vec<Field> = profile.fields().cloned().collect();
        stack.sort_by(|a, b| b.name().cmp(a.name()));

        while let Some(field) = stack.pop() {
            if !visited.insert(field.clone()) {
                continue;
            }
            graph.add_node(field.clone());

            let mut deps = Vec::new();
            for expr in profile.contributions(&field) {
                expr.collect_fields(&mut deps);
                graph.add_scope_edges(expr.node(), &mut stack);
            }
            field.default_value().collect_fields(&mut deps);
            graph.add_scope_edges(field.default_value().node(), &mut stack);

            for dep in deps {
                graph.add_edge(field.clone(), dep.clone());
                if !visited.contains(&dep) {
                    stack.push(dep);
                }
            }
        }

        graph
    }

    /// Add edges for overrides inside scoped reads anywhere in `node`.
    fn add_scope_edges(&mut self, node: &ExprNode, stack: &mut Vec<Field>) {
        match node {
            ExprNode::Literal(_) | ExprNode::Field(_) | ExprNode::Computed { .. } => {}
            ExprNode::Neg(inner) => self.add_scope_edges(inner.node(), stack),
            ExprNode::Binary { lhs, rhs, .. } => {
                self.add_scope_edges(lhs.node(), stack);
                self.add_scope_edges(rhs.node(), stack);
            }
            ExprNode::Guard { inner, .. } => self.add_scope_edges(inner.node(), stack),
            ExprNode::Scoped { overrides, .. } => {
                for (target, value) in overrides {
                    let mut deps = Vec::new();
                    value.collect_fields(&mut deps);
                    for dep in deps {
                        self.add_edge(target.clone(), dep.clone());
                        stack.push(dep);
                    }
                    self.add_scope_edges(value.node(), stack);
                }
            }
        }
    }

    /// Add a node if it doesn't exist, returning its index.
    pub fn add_node(&mut self, field: Field) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&field) {
            idx
        } else {
            let idx = self.graph.add_node(field.clone());
            self.node_map.insert(field, idx);
            idx
        }
    }

    /// Record that `from` reads `to`.
    ///
    /// Both nodes are added if missing.
    pub fn add_edge(&mut self, from: Field, to: Field) {
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);
        if self.graph.find_edge(to_idx, from_idx).is_none() {
            self.graph.add_edge(to_idx, from_idx, ());
        }
    }

    /// Fields that `field` reads directly.
    pub fn dependencies_of(&self, field: &Field) -> Vec<Field> {
        let mut out = Vec::new();
        if let Some(&idx) = self.node_map.get(field) {
            for dep in self.graph.neighbors_directed(idx, Direction::Incoming) {
                push_unique(&mut out, &self.graph[dep]);
            }
        }
        out
    }

    /// Detect cycles in the graph.
    ///
    /// Nodes are visited in insertion order and the reported path runs
    /// from a reader to the field it reads: if `a` reads `b` and `b`
    /// reads `a`, the path is `[a, b, a]`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if no cycles are detected
    /// * `Err(ProfileError::Cycle)` with the names along the cycle
    pub fn detect_cycles(&self) -> Result<(), ProfileError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for node_idx in self.graph.node_indices() {
            if !visited.contains(&node_idx) {
                let mut cycle_path = Vec::new();
                if let Some(cycle) =
                    self.dfs_cycle_detect(node_idx, &mut visited, &mut rec_stack, &mut cycle_path)
                {
                    return Err(cycle);
                }
            }
        }

        Ok(())
    }

    fn dfs_cycle_detect(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        rec_stack: &mut HashSet<NodeIndex>,
        cycle_path: &mut Vec<NodeIndex>,
    ) -> Option<ProfileError> {
        visited.insert(node);
        rec_stack.insert(node);
        cycle_path.push(node);

        // from a reader to the fields it reads
        for neighbor in self.graph.neighbors_directed(node, Direction::Incoming) {
            if !visited.contains(&neighbor) {
                if let Some(cycle) = self.dfs_cycle_detect(neighbor, visited, rec_stack, cycle_path)
                {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&neighbor) {
                let start = cycle_path
                    .iter()
                    .position(|idx| *idx == neighbor)
                    .unwrap_or(0);
                let mut path: Vec<String> = cycle_path[start..]
                    .iter()
                    .map(|idx| self.graph[*idx].name().to_string())
                    .collect();
                path.push(self.graph[neighbor].name().to_string());
                return Some(ProfileError::Cycle { path });
            }
        }

        rec_stack.remove(&node);
        cycle_path.pop();
        None
    }

    /// Fields ordered so that every dependency comes before its readers.
    pub fn topological_sort(&self) -> Result<Vec<Field>, ProfileError> {
        self.detect_cycles()?;

        match toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()),
            Err(cycle) => Err(ProfileError::Cycle {
                path: vec![self.graph[cycle.node_id()].name().to_string()],
            }),
        }
    }

    /// All fields in the graph.
    pub fn nodes(&self) -> Vec<Field> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// Check if a field is part of the graph.
    pub fn contains_node(&self, field: &Field) -> bool {
        self.node_map.contains_key(field)
    }
}

impl Default for FieldGraph {
    fn default() -> Self {
        Self::new()
    }
}
