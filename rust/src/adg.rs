//! Action dependency graph (ADG).
//!
//! Vertices are actions, edges are precedence constraints:
//! - Type-1: consecutive actions of the same shuttle
//! - Type-2: cross-shuttle ordering around shared cells (see [`crate::dependency`])
//!
//! The graph also tracks an execution status per action so a supervisor can
//! release actions to shuttles once their predecessors allow it.

use pyo3::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;
use thiserror::Error;

use crate::config::AdgConfig;
use crate::dependency::{timed_type2_dependencies, DepCreationMethod, UnknownMethod};
use crate::log_summary;
use crate::models::{Action, ActionStatus, DependencyEdge, ShuttleId, VertexId};

/// Errors raised by graph construction and execution tracking.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdgError {
    #[error(transparent)]
    UnknownMethod(#[from] UnknownMethod),
    #[error("Vertex not found: {0}")]
    VertexNotFound(VertexId),
    #[error("Action dependency graph contains a cycle")]
    CycleDetected,
    #[error("Action {vertex} is {status}, expected {expected}")]
    InvalidStatus {
        vertex: VertexId,
        status: ActionStatus,
        expected: ActionStatus,
    },
}

/// Outcome of adding Type-2 dependencies to a graph.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreationStats {
    #[pyo3(get)]
    pub method: String,
    #[pyo3(get)]
    pub elapsed_secs: f64,
    #[pyo3(get)]
    pub created_type2_dependencies: usize,
    /// Edge count after insertion (Type-1 and Type-2, duplicates collapsed).
    #[pyo3(get)]
    pub total_edges: usize,
    #[pyo3(get)]
    pub acyclic: bool,
}

#[pymethods]
impl CreationStats {
    fn __repr__(&self) -> String {
        format!(
            "CreationStats(method={:?}, elapsed_secs={}, created_type2_dependencies={}, total_edges={}, acyclic={})",
            self.method,
            self.elapsed_secs,
            self.created_type2_dependencies,
            self.total_edges,
            self.acyclic
        )
    }
}

/// Directed graph of actions with per-vertex execution status.
///
/// Vertex ids are dense (`0..num_vertices`) and assigned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Adg {
    actions: Vec<Action>,
    statuses: Vec<ActionStatus>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    edges: Vec<DependencyEdge>,
    edge_set: FxHashSet<DependencyEdge>,
}

impl Adg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph holding only Type-1 dependencies.
    ///
    /// Shuttles are laid out in order of first appearance; each shuttle's actions
    /// keep input order and receive consecutive vertex ids.
    pub fn with_type1(actions: &[Action], skip_wait_actions: bool) -> Self {
        let mut shuttle_order: Vec<ShuttleId> = Vec::new();
        let mut per_shuttle: FxHashMap<ShuttleId, Vec<&Action>> = FxHashMap::default();

        for action in actions {
            if skip_wait_actions && !action.is_move_action() {
                continue;
            }
            per_shuttle
                .entry(action.shuttle_id)
                .or_insert_with(|| {
                    shuttle_order.push(action.shuttle_id);
                    Vec::new()
                })
                .push(action);
        }

        let mut adg = Self::new();
        for shuttle_id in &shuttle_order {
            let mut previous: Option<usize> = None;
            for action in &per_shuttle[shuttle_id] {
                let vertex = adg.push_action(**action);
                if let Some(prev) = previous {
                    adg.insert_edge(prev, vertex);
                }
                previous = Some(vertex);
            }
        }
        adg
    }

    /// Build the full graph: Type-1 chains plus Type-2 dependencies.
    ///
    /// # Returns
    /// * `Err(AdgError::UnknownMethod)` if the configured method name is invalid
    /// * `Err(AdgError::CycleDetected)` if the combined dependencies form a cycle
    pub fn build(actions: &[Action], config: &AdgConfig) -> Result<Self, AdgError> {
        let method = config.method()?;
        let mut adg = Self::with_type1(actions, config.skip_wait_actions);
        let stats = adg.add_type2_dependencies(method, config.verbosity)?;
        if !stats.acyclic {
            return Err(AdgError::CycleDetected);
        }
        log_summary!(
            config.verbosity,
            "ADG built: {} vertices, {} edges ({} type-2)",
            adg.num_vertices(),
            adg.num_edges(),
            stats.created_type2_dependencies
        );
        Ok(adg)
    }

    /// Add a vertex for `action`, returning its new vertex id.
    pub fn add_action(&mut self, action: Action) -> VertexId {
        self.push_action(action) as VertexId
    }

    /// Add an edge; returns `false` if it was already present.
    pub fn add_dependency(&mut self, from: VertexId, to: VertexId) -> Result<bool, AdgError> {
        let from = self.index_of(from)?;
        let to = self.index_of(to)?;
        Ok(self.insert_edge(from, to))
    }

    /// Run a Type-2 strategy over this graph's actions and insert its edges.
    pub fn add_type2_dependencies(
        &mut self,
        method: DepCreationMethod,
        verbosity: u8,
    ) -> Result<CreationStats, AdgError> {
        let result = timed_type2_dependencies(&self.actions, method, verbosity);
        for &(from, to) in &result.dependencies {
            self.add_dependency(from, to)?;
        }
        Ok(CreationStats {
            method: method.name().to_string(),
            elapsed_secs: result.elapsed_secs,
            created_type2_dependencies: result.dependencies.len(),
            total_edges: self.num_edges(),
            acyclic: self.is_acyclic(),
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.actions.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Actions in vertex id order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn action(&self, id: VertexId) -> Result<&Action, AdgError> {
        Ok(&self.actions[self.index_of(id)?])
    }

    pub fn status(&self, id: VertexId) -> Result<ActionStatus, AdgError> {
        Ok(self.statuses[self.index_of(id)?])
    }

    pub fn successors(&self, id: VertexId) -> Result<Vec<VertexId>, AdgError> {
        let i = self.index_of(id)?;
        Ok(self.successors[i].iter().map(|&s| s as VertexId).collect())
    }

    pub fn predecessors(&self, id: VertexId) -> Result<Vec<VertexId>, AdgError> {
        let i = self.index_of(id)?;
        Ok(self.predecessors[i].iter().map(|&p| p as VertexId).collect())
    }

    /// Whether a directed path leads from `source` to `target` (a vertex reaches itself).
    pub fn is_reachable(&self, source: VertexId, target: VertexId) -> Result<bool, AdgError> {
        let source = self.index_of(source)?;
        let target = self.index_of(target)?;
        Ok(self.reachable(source, target, None))
    }

    /// Topological order via Kahn's algorithm.
    pub fn topological_order(&self) -> Result<Vec<VertexId>, AdgError> {
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..self.num_vertices())
            .filter(|&v| in_degree[v] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.num_vertices());
        while let Some(v) = queue.pop_front() {
            order.push(v as VertexId);
            for &s in &self.successors[v] {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    queue.push_back(s);
                }
            }
        }

        if order.len() != self.num_vertices() {
            return Err(AdgError::CycleDetected);
        }
        Ok(order)
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_ok()
    }

    /// Graph with the same vertices and only the edges that carry reachability.
    ///
    /// An edge `(u, v)` is kept iff `v` is unreachable from `u` once the edge is
    /// removed. Only defined for acyclic graphs.
    pub fn transitive_reduction(&self) -> Result<Self, AdgError> {
        if !self.is_acyclic() {
            return Err(AdgError::CycleDetected);
        }

        let mut reduced = Self {
            actions: self.actions.clone(),
            statuses: self.statuses.clone(),
            successors: vec![Vec::new(); self.num_vertices()],
            predecessors: vec![Vec::new(); self.num_vertices()],
            edges: Vec::new(),
            edge_set: FxHashSet::default(),
        };
        for &(from, to) in &self.edges {
            let (u, v) = (from as usize, to as usize);
            if !self.reachable(u, v, Some((u, v))) {
                reduced.insert_edge(u, v);
            }
        }
        Ok(reduced)
    }

    /// Pending action whose predecessors allow release.
    ///
    /// Predecessors of other shuttles must be completed; predecessors of the same
    /// shuttle only need to be enqueued, since the shuttle executes its queue in order.
    pub fn is_enqueueable(&self, id: VertexId) -> Result<bool, AdgError> {
        Ok(self.enqueueable(self.index_of(id)?))
    }

    /// Enqueue every currently releasable action, in vertex order.
    pub fn enqueue_ready(&mut self) -> Vec<VertexId> {
        let mut enqueued = Vec::new();
        for v in 0..self.num_vertices() {
            if self.enqueueable(v) {
                self.statuses[v] = ActionStatus::Enqueued;
                enqueued.push(v as VertexId);
            }
        }
        enqueued
    }

    /// Mark an enqueued action completed and release what it unblocks.
    ///
    /// Returns the ids newly moved to `Enqueued`, in breadth-first order from `id`.
    pub fn complete(&mut self, id: VertexId) -> Result<Vec<VertexId>, AdgError> {
        let v = self.index_of(id)?;
        let status = self.statuses[v];
        if status != ActionStatus::Enqueued {
            return Err(AdgError::InvalidStatus {
                vertex: id,
                status,
                expected: ActionStatus::Enqueued,
            });
        }
        self.statuses[v] = ActionStatus::Completed;
        Ok(self.enqueue_from(v))
    }

    fn enqueue_from(&mut self, start: usize) -> Vec<VertexId> {
        let mut enqueued = Vec::new();
        let mut expanded: FxHashSet<usize> = FxHashSet::default();
        let mut queue = VecDeque::from([start]);

        while let Some(v) = queue.pop_front() {
            if self.enqueueable(v) {
                self.statuses[v] = ActionStatus::Enqueued;
                enqueued.push(v as VertexId);
            }
            if self.statuses[v] == ActionStatus::Pending || !expanded.insert(v) {
                continue;
            }
            for &s in &self.successors[v] {
                if self.statuses[s] == ActionStatus::Pending {
                    queue.push_back(s);
                }
            }
        }
        enqueued
    }

    fn enqueueable(&self, v: usize) -> bool {
        if self.statuses[v] != ActionStatus::Pending {
            return false;
        }
        let shuttle_id = self.actions[v].shuttle_id;
        self.predecessors[v].iter().all(|&p| {
            if self.actions[p].shuttle_id == shuttle_id {
                self.statuses[p] != ActionStatus::Pending
            } else {
                self.statuses[p] == ActionStatus::Completed
            }
        })
    }

    fn index_of(&self, id: VertexId) -> Result<usize, AdgError> {
        usize::try_from(id)
            .ok()
            .filter(|&i| i < self.num_vertices())
            .ok_or(AdgError::VertexNotFound(id))
    }

    fn push_action(&mut self, action: Action) -> usize {
        let v = self.actions.len();
        self.actions.push(action.with_vertex_id(v as VertexId));
        self.statuses.push(ActionStatus::Pending);
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        v
    }

    fn insert_edge(&mut self, from: usize, to: usize) -> bool {
        let edge = (from as VertexId, to as VertexId);
        if !self.edge_set.insert(edge) {
            return false;
        }
        self.edges.push(edge);
        self.successors[from].push(to);
        self.predecessors[to].push(from);
        true
    }

    /// Depth-first reachability, optionally ignoring one edge.
    fn reachable(&self, source: usize, target: usize, skip: Option<(usize, usize)>) -> bool {
        let mut visited = vec![false; self.num_vertices()];
        let mut stack = vec![source];
        visited[source] = true;

        while let Some(v) = stack.pop() {
            if v == target {
                return true;
            }
            for &s in &self.successors[v] {
                if skip == Some((v, s)) || visited[s] {
                    continue;
                }
                visited[s] = true;
                stack.push(s);
            }
        }
        false
    }
}
