//! Rust implementation of action dependency graph construction for multi-shuttle plans.
//!
//! The core computes Type-2 dependencies between actions of different shuttles
//! that share grid cells, using one of three interchangeable methods. Around it
//! sits the action dependency graph used to release actions to shuttles.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

pub mod adg;
pub mod candidate_index;
pub mod comparison;
mod config;
pub mod dependency;
pub mod logging;
mod models;

pub use adg::{Adg, AdgError, CreationStats};
pub use candidate_index::CandidateIndex;
pub use comparison::{compare_methods, MethodComparison};
pub use config::AdgConfig;
pub use dependency::{
    create_type2_dependencies, create_type2_dependencies_logged, timed_type2_dependencies,
    DepCreationMethod, DepCreationResult, UnknownMethod,
};
pub use models::{
    actions_from_moves, sort_by_time_step, Action, ActionStatus, DependencyEdge, Position,
    ShuttleId, VertexId, UNASSIGNED_VERTEX,
};

/// Create Type-2 dependencies from a list of actions.
///
/// # Arguments
/// * `all_actions` - Actions of all shuttles
/// * `dep_creation_method` - EXHAUSTIVE (default), CP or SCP
///
/// # Returns
/// * List of `(predecessor_vertex_id, successor_vertex_id)` tuples
#[pyfunction]
#[pyo3(
    name = "create_type2_dependencies",
    signature = (all_actions, dep_creation_method=DepCreationMethod::Exhaustive)
)]
fn py_create_type2_dependencies(
    all_actions: Vec<Action>,
    dep_creation_method: DepCreationMethod,
) -> Vec<DependencyEdge> {
    create_type2_dependencies(&all_actions, dep_creation_method)
}

/// Expand per-shuttle move lists into actions (time step = index of the move).
#[pyfunction]
#[pyo3(name = "actions_from_moves")]
#[allow(clippy::type_complexity)]
fn py_actions_from_moves(
    robot_moves: Vec<(ShuttleId, Vec<((i32, i32), (i32, i32))>)>,
) -> Vec<Action> {
    let moves: Vec<(ShuttleId, Vec<(Position, Position)>)> = robot_moves
        .into_iter()
        .map(|(shuttle_id, path)| {
            let path = path
                .into_iter()
                .map(|(start, goal)| (start.into(), goal.into()))
                .collect();
            (shuttle_id, path)
        })
        .collect();
    actions_from_moves(&moves)
}

/// Build an action dependency graph.
///
/// # Returns
/// * `(actions, edges)`: the graph's actions with assigned vertex ids, and all
///   Type-1 and Type-2 edges
///
/// # Raises
/// * ValueError if the method is unknown or the graph contains a cycle
#[pyfunction]
#[pyo3(signature = (actions, config=None))]
fn build_adg(
    actions: Vec<Action>,
    config: Option<AdgConfig>,
) -> PyResult<(Vec<Action>, Vec<DependencyEdge>)> {
    let config = config.unwrap_or_default();
    match Adg::build(&actions, &config) {
        Ok(adg) => Ok((adg.actions().to_vec(), adg.edges().to_vec())),
        Err(e) => Err(pyo3::exceptions::PyValueError::new_err(e.to_string())),
    }
}

/// Compare runtime and edge counts of the three methods on one action set.
///
/// `skip_wait_actions` defaults to the `AdgConfig` default, so the compared
/// graphs match the one `build_adg` builds without a config.
#[pyfunction]
#[pyo3(signature = (
    actions,
    skip_wait_actions=AdgConfig::default().skip_wait_actions,
    skip_exhaustive=false,
    verbosity=0
))]
fn compare_dependency_methods(
    actions: Vec<Action>,
    skip_wait_actions: bool,
    skip_exhaustive: bool,
    verbosity: u8,
) -> PyResult<MethodComparison> {
    compare_methods(&actions, skip_wait_actions, skip_exhaustive, verbosity)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

/// The dependency_creator Python module.
#[pymodule]
fn dependency_creator(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core data types
    m.add_class::<Action>()?;
    m.add_class::<DepCreationMethod>()?;
    m.add_class::<CreationStats>()?;
    m.add_class::<MethodComparison>()?;

    // Config types
    m.add_class::<AdgConfig>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_create_type2_dependencies, m)?)?;
    m.add_function(wrap_pyfunction!(py_actions_from_moves, m)?)?;
    m.add_function(wrap_pyfunction!(build_adg, m)?)?;
    m.add_function(wrap_pyfunction!(compare_dependency_methods, m)?)?;

    Ok(())
}
