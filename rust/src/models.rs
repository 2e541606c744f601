//! Core data types for action dependency construction.

use pyo3::prelude::*;
use std::cmp::Ordering;

/// External vertex identifier linking an action to a node in the consumer's graph.
pub type VertexId = i64;

/// Identifier of the shuttle owning an action.
pub type ShuttleId = i64;

/// Precedence edge `(predecessor_vertex_id, successor_vertex_id)`.
pub type DependencyEdge = (VertexId, VertexId);

/// Vertex id carried by actions that are not yet part of a graph.
pub const UNASSIGNED_VERTEX: VertexId = -1;

/// A discrete grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Position> for (i32, i32) {
    fn from(pos: Position) -> Self {
        (pos.x, pos.y)
    }
}

/// One scheduled movement of a shuttle from `start` to `goal` at `time_step`.
#[pyclass(frozen)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Action {
    pub start: Position,
    pub goal: Position,
    #[pyo3(get)]
    pub time_step: i64,
    #[pyo3(get)]
    pub shuttle_id: ShuttleId,
    #[pyo3(get)]
    pub vertex_id: VertexId,
}

impl Action {
    pub fn new(
        start: impl Into<Position>,
        goal: impl Into<Position>,
        time_step: i64,
        shuttle_id: ShuttleId,
        vertex_id: VertexId,
    ) -> Self {
        Self {
            start: start.into(),
            goal: goal.into(),
            time_step,
            shuttle_id,
            vertex_id,
        }
    }

    /// Copy of this action carrying a different vertex id.
    pub fn with_vertex_id(self, vertex_id: VertexId) -> Self {
        Self { vertex_id, ..self }
    }

    /// False for wait actions, where the shuttle stays on its cell.
    pub fn is_move_action(&self) -> bool {
        self.start != self.goal
    }

    /// The global total order: by time step only.
    pub fn time_order(&self, other: &Self) -> Ordering {
        self.time_step.cmp(&other.time_step)
    }
}

#[pymethods]
impl Action {
    #[new]
    #[pyo3(signature = (start, goal, time_step, shuttle_id, vertex_id=UNASSIGNED_VERTEX))]
    fn py_new(
        start: (i32, i32),
        goal: (i32, i32),
        time_step: i64,
        shuttle_id: ShuttleId,
        vertex_id: VertexId,
    ) -> Self {
        Self::new(start, goal, time_step, shuttle_id, vertex_id)
    }

    #[getter(start)]
    fn py_start(&self) -> (i32, i32) {
        self.start.into()
    }

    #[getter(goal)]
    fn py_goal(&self) -> (i32, i32) {
        self.goal.into()
    }

    #[pyo3(name = "is_move_action")]
    fn py_is_move_action(&self) -> bool {
        self.is_move_action()
    }

    fn __repr__(&self) -> String {
        format!(
            "Action(start=({}, {}), goal=({}, {}), time_step={}, shuttle_id={}, vertex_id={})",
            self.start.x,
            self.start.y,
            self.goal.x,
            self.goal.y,
            self.time_step,
            self.shuttle_id,
            self.vertex_id
        )
    }
}

/// Stable sort by time step; equal time steps keep their relative order.
pub fn sort_by_time_step(actions: &mut [Action]) {
    actions.sort_by(Action::time_order);
}

/// Expand per-shuttle move lists into actions.
///
/// Each move becomes one action whose time step is its index in the shuttle's list.
/// Vertex ids are left unassigned.
pub fn actions_from_moves(moves: &[(ShuttleId, Vec<(Position, Position)>)]) -> Vec<Action> {
    moves
        .iter()
        .flat_map(|(shuttle_id, path)| {
            path.iter().enumerate().map(move |(t, &(start, goal))| {
                Action::new(start, goal, t as i64, *shuttle_id, UNASSIGNED_VERTEX)
            })
        })
        .collect()
}

/// Execution state of an action in a dependency graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActionStatus {
    #[default]
    Pending,
    Enqueued,
    Completed,
}

impl ActionStatus {
    /// Next status, or `None` once completed.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Enqueued),
            Self::Enqueued => Some(Self::Completed),
            Self::Completed => None,
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Enqueued => write!(f, "ENQUEUED"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}
