//! Type-2 dependency creation.
//!
//! A Type-2 dependency orders two actions of different shuttles around a shared
//! cell: if action `a` ends where candidate `c` starts and `c` is not later than
//! `a`, then `c` must leave the cell before `a` may enter it, giving the edge
//! `(c.vertex_id, a.vertex_id)`.
//!
//! Three interchangeable methods are provided:
//! - `Exhaustive`: reference pairwise scan, O(n²)
//! - `Cp`: candidate partitioning, compares only against actions starting at the goal
//! - `Scp`: sorted candidate partitioning, one nearest predecessor per action
//!
//! `Exhaustive` and `Cp` produce the same edge sequence. `Scp` may report fewer
//! edges: when the nearest-in-time candidate belongs to the querying action's own
//! shuttle, no edge is emitted, even if an older candidate of another shuttle
//! would have qualified.

use pyo3::prelude::*;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;

use crate::candidate_index::CandidateIndex;
use crate::logging::VERBOSITY_SILENT;
use crate::models::{Action, DependencyEdge};
use crate::{log_checks, log_debug, log_summary};

/// Strategy used to build Type-2 dependencies.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepCreationMethod {
    #[default]
    #[pyo3(name = "EXHAUSTIVE")]
    Exhaustive,
    #[pyo3(name = "CP")]
    Cp,
    #[pyo3(name = "SCP")]
    Scp,
}

impl DepCreationMethod {
    pub const ALL: [DepCreationMethod; 3] = [Self::Exhaustive, Self::Cp, Self::Scp];

    pub fn name(self) -> &'static str {
        match self {
            Self::Exhaustive => "exhaustive",
            Self::Cp => "cp",
            Self::Scp => "scp",
        }
    }
}

impl std::fmt::Display for DepCreationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Method name that does not match any [`DepCreationMethod`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown dependency creation method: {0} (expected exhaustive, cp or scp)")]
pub struct UnknownMethod(pub String);

impl FromStr for DepCreationMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exhaustive" | "naive" => Ok(Self::Exhaustive),
            "cp" => Ok(Self::Cp),
            "scp" => Ok(Self::Scp),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// Edges produced by one timed strategy run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepCreationResult {
    pub dependencies: Vec<DependencyEdge>,
    pub elapsed_secs: f64,
}

/// Create Type-2 dependencies with the given method.
///
/// Pure function of its input; the actions are only read.
pub fn create_type2_dependencies(
    actions: &[Action],
    method: DepCreationMethod,
) -> Vec<DependencyEdge> {
    create_type2_dependencies_logged(actions, method, VERBOSITY_SILENT)
}

/// Same as [`create_type2_dependencies`], with diagnostics on stderr.
pub fn create_type2_dependencies_logged(
    actions: &[Action],
    method: DepCreationMethod,
    verbosity: u8,
) -> Vec<DependencyEdge> {
    let dependencies = match method {
        DepCreationMethod::Exhaustive => exhaustive(actions, verbosity),
        DepCreationMethod::Cp => candidate_partitioning(actions, verbosity),
        DepCreationMethod::Scp => sorted_candidate_partitioning(actions, verbosity),
    };
    log_summary!(
        verbosity,
        "{}: {} type-2 dependencies from {} actions",
        method,
        dependencies.len(),
        actions.len()
    );
    dependencies
}

/// Run a strategy and measure its wall-clock time.
pub fn timed_type2_dependencies(
    actions: &[Action],
    method: DepCreationMethod,
    verbosity: u8,
) -> DepCreationResult {
    let started = Instant::now();
    let dependencies = create_type2_dependencies_logged(actions, method, verbosity);
    let elapsed_secs = started.elapsed().as_secs_f64();
    log_summary!(verbosity, "{} took {:.6}s", method, elapsed_secs);
    DepCreationResult {
        dependencies,
        elapsed_secs,
    }
}

fn exhaustive(actions: &[Action], verbosity: u8) -> Vec<DependencyEdge> {
    let mut dependencies = Vec::new();
    for a in actions {
        for b in actions {
            if a.shuttle_id == b.shuttle_id {
                continue;
            }
            if a.goal == b.start && a.time_step >= b.time_step {
                log_checks!(
                    verbosity,
                    "  edge {} -> {} at ({}, {})",
                    b.vertex_id,
                    a.vertex_id,
                    a.goal.x,
                    a.goal.y
                );
                dependencies.push((b.vertex_id, a.vertex_id));
            }
        }
    }
    dependencies
}

fn candidate_partitioning(actions: &[Action], verbosity: u8) -> Vec<DependencyEdge> {
    let index = CandidateIndex::build(actions);
    log_debug!(
        verbosity,
        "  candidate index: {} positions, largest bucket {}",
        index.len(),
        index.max_bucket_len()
    );

    let mut dependencies = Vec::new();
    for a in actions {
        for c in index.candidates(a.goal) {
            if c.shuttle_id == a.shuttle_id {
                continue;
            }
            if c.time_step <= a.time_step {
                log_checks!(verbosity, "  edge {} -> {}", c.vertex_id, a.vertex_id);
                dependencies.push((c.vertex_id, a.vertex_id));
            }
        }
    }
    dependencies
}

fn sorted_candidate_partitioning(actions: &[Action], verbosity: u8) -> Vec<DependencyEdge> {
    let index = CandidateIndex::build_sorted(actions);
    log_debug!(
        verbosity,
        "  sorted candidate index: {} positions, largest bucket {}",
        index.len(),
        index.max_bucket_len()
    );

    actions
        .iter()
        .filter_map(|a| {
            let candidate = find_relevant_candidate(&index, a, verbosity)?;
            log_checks!(verbosity, "  edge {} -> {}", candidate.vertex_id, a.vertex_id);
            Some((candidate.vertex_id, a.vertex_id))
        })
        .collect()
}

/// Nearest-in-time candidate for `action`, if it belongs to another shuttle.
///
/// The backward search stops at the first candidate: a same-shuttle match yields
/// `None` rather than continuing to older candidates.
fn find_relevant_candidate<'a>(
    index: &CandidateIndex<'a>,
    action: &Action,
    verbosity: u8,
) -> Option<&'a Action> {
    let nearest = index.nearest_at_or_before(action.goal, action.time_step)?;
    if nearest.shuttle_id == action.shuttle_id {
        log_checks!(
            verbosity,
            "  skip {}: nearest candidate {} is on shuttle {}",
            action.vertex_id,
            nearest.vertex_id,
            action.shuttle_id
        );
        return None;
    }
    Some(nearest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VertexId;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn make_action(
        start: (i32, i32),
        goal: (i32, i32),
        time_step: i64,
        shuttle_id: i64,
        vertex_id: VertexId,
    ) -> Action {
        Action::new(start, goal, time_step, shuttle_id, vertex_id)
    }

    fn edge_set(edges: &[DependencyEdge]) -> BTreeSet<DependencyEdge> {
        edges.iter().copied().collect()
    }

    /// The nearest candidate at (1, 1) for action 0 belongs to shuttle 0 itself,
    /// while an older candidate belongs to shuttle 1.
    fn divergence_scenario() -> Vec<Action> {
        vec![
            make_action((0, 0), (1, 1), 5, 0, 0),
            make_action((1, 1), (2, 1), 1, 1, 1),
            make_action((1, 1), (1, 2), 3, 0, 2),
        ]
    }

    /// Small grid plan: three shuttles crossing and following each other.
    fn crossing_plan() -> Vec<Action> {
        vec![
            make_action((0, 0), (0, 1), 0, 0, 0),
            make_action((0, 1), (0, 2), 1, 0, 1),
            make_action((0, 2), (0, 3), 2, 0, 2),
            make_action((1, 1), (0, 1), 0, 1, 3),
            make_action((0, 1), (0, 1), 1, 1, 4),
            make_action((0, 1), (0, 0), 2, 1, 5),
            make_action((0, 2), (1, 2), 0, 2, 6),
            make_action((1, 2), (1, 1), 1, 2, 7),
            make_action((1, 1), (0, 1), 2, 2, 8),
            make_action((0, 1), (0, 2), 3, 2, 9),
        ]
    }

    #[test]
    fn test_scenario_a_single_edge_for_all_methods() {
        let actions = vec![
            make_action((0, 0), (1, 1), 1, 0, 0),
            make_action((1, 1), (2, 2), 0, 1, 1),
        ];
        for method in DepCreationMethod::ALL {
            assert_eq!(
                create_type2_dependencies(&actions, method),
                vec![(1, 0)],
                "method {method}"
            );
        }
    }

    #[test]
    fn test_scenario_b_no_edges_for_all_methods() {
        let actions = vec![
            make_action((0, 0), (1, 1), 0, 0, 0),
            make_action((1, 1), (2, 2), 1, 1, 1),
        ];
        for method in DepCreationMethod::ALL {
            assert!(
                create_type2_dependencies(&actions, method).is_empty(),
                "method {method}"
            );
        }
    }

    #[test]
    fn test_equal_time_steps_produce_edge() {
        let actions = vec![
            make_action((1, 0), (2, 0), 1, 42, 99),
            make_action((2, 0), (3, 0), 1, 66, 142),
        ];
        for method in DepCreationMethod::ALL {
            assert_eq!(create_type2_dependencies(&actions, method), vec![(142, 99)]);
        }
    }

    #[test]
    fn test_same_shuttle_never_depends_on_itself() {
        let actions = vec![
            make_action((0, 0), (1, 0), 0, 3, 0),
            make_action((1, 0), (2, 0), 0, 3, 1),
            make_action((2, 0), (2, 0), 1, 3, 2),
        ];
        for method in DepCreationMethod::ALL {
            assert!(create_type2_dependencies(&actions, method).is_empty());
        }
    }

    #[test]
    fn test_scenario_c_scp_diverges_from_cp() {
        let actions = divergence_scenario();

        let exhaustive = create_type2_dependencies(&actions, DepCreationMethod::Exhaustive);
        let cp = create_type2_dependencies(&actions, DepCreationMethod::Cp);
        let scp = create_type2_dependencies(&actions, DepCreationMethod::Scp);

        assert_eq!(exhaustive, vec![(1, 0)]);
        assert_eq!(cp, vec![(1, 0)]);
        assert!(scp.is_empty());
    }

    #[test]
    fn test_exhaustive_and_cp_agree() {
        let actions = crossing_plan();
        let exhaustive = create_type2_dependencies(&actions, DepCreationMethod::Exhaustive);
        let cp = create_type2_dependencies(&actions, DepCreationMethod::Cp);

        assert!(!exhaustive.is_empty());
        assert_eq!(edge_set(&exhaustive), edge_set(&cp));
        assert_eq!(exhaustive, cp);
    }

    #[test]
    fn test_exhaustive_reports_every_qualifying_predecessor() {
        // Two other shuttles start at (5, 5) before action 0 arrives there.
        let actions = vec![
            make_action((4, 5), (5, 5), 6, 0, 0),
            make_action((5, 5), (6, 5), 2, 1, 1),
            make_action((5, 5), (5, 6), 4, 2, 2),
            make_action((5, 5), (5, 4), 9, 3, 3),
        ];
        let exhaustive = create_type2_dependencies(&actions, DepCreationMethod::Exhaustive);
        let scp = create_type2_dependencies(&actions, DepCreationMethod::Scp);

        assert_eq!(exhaustive, vec![(1, 0), (2, 0)]);
        assert_eq!(scp, vec![(2, 0)]);
    }

    #[test]
    fn test_scp_edges_are_subset_of_cp() {
        let actions = crossing_plan();
        let cp = edge_set(&create_type2_dependencies(&actions, DepCreationMethod::Cp));
        let scp = create_type2_dependencies(&actions, DepCreationMethod::Scp);

        for edge in &scp {
            assert!(cp.contains(edge), "scp edge {edge:?} missing from cp");
        }
    }

    #[test]
    fn test_scp_emits_at_most_one_edge_per_action() {
        let actions = crossing_plan();
        let scp = create_type2_dependencies(&actions, DepCreationMethod::Scp);
        let successors: BTreeSet<VertexId> = scp.iter().map(|&(_, s)| s).collect();
        assert_eq!(successors.len(), scp.len());
    }

    #[test]
    fn test_scp_tie_break_takes_last_in_input_order() {
        // Candidates 1 and 2 share time step 3; 2 comes later in the input.
        let actions = vec![
            make_action((0, 0), (1, 1), 3, 0, 0),
            make_action((1, 1), (2, 1), 3, 1, 1),
            make_action((1, 1), (1, 2), 3, 2, 2),
        ];
        assert_eq!(
            create_type2_dependencies(&actions, DepCreationMethod::Scp),
            vec![(2, 0)]
        );
    }

    #[test]
    fn test_scp_tie_break_same_shuttle_stops_search() {
        // The last equal-time candidate belongs to shuttle 0, so no edge even
        // though candidate 1 of shuttle 1 has the same time step.
        let actions = vec![
            make_action((0, 0), (1, 1), 3, 0, 0),
            make_action((1, 1), (2, 1), 3, 1, 1),
            make_action((1, 1), (1, 2), 3, 0, 2),
        ];
        assert!(create_type2_dependencies(&actions, DepCreationMethod::Scp).is_empty());
        assert_eq!(
            create_type2_dependencies(&actions, DepCreationMethod::Cp),
            vec![(1, 0)]
        );
    }

    #[test]
    fn test_methods_are_idempotent() {
        let actions = crossing_plan();
        for method in DepCreationMethod::ALL {
            let first = create_type2_dependencies(&actions, method);
            let second = create_type2_dependencies(&actions, method);
            assert_eq!(first, second, "method {method}");
        }
    }

    #[test]
    fn test_input_is_not_modified() {
        let actions = crossing_plan();
        let before = actions.clone();
        for method in DepCreationMethod::ALL {
            let _ = create_type2_dependencies(&actions, method);
        }
        assert_eq!(actions, before);
    }

    #[test]
    fn test_empty_input() {
        for method in DepCreationMethod::ALL {
            assert!(create_type2_dependencies(&[], method).is_empty());
        }
    }

    #[test]
    fn test_timed_run_matches_untimed() {
        let actions = crossing_plan();
        let timed = timed_type2_dependencies(&actions, DepCreationMethod::Cp, VERBOSITY_SILENT);
        assert_eq!(
            timed.dependencies,
            create_type2_dependencies(&actions, DepCreationMethod::Cp)
        );
        assert!(timed.elapsed_secs >= 0.0);
    }

    #[test]
    fn test_default_method_is_exhaustive() {
        assert_eq!(DepCreationMethod::default(), DepCreationMethod::Exhaustive);
    }

    #[test]
    fn test_method_from_str() {
        assert_eq!("SCP".parse::<DepCreationMethod>(), Ok(DepCreationMethod::Scp));
        assert_eq!(" cp ".parse::<DepCreationMethod>(), Ok(DepCreationMethod::Cp));
        assert_eq!("naive".parse::<DepCreationMethod>(), Ok(DepCreationMethod::Exhaustive));
        assert_eq!(
            "greedy".parse::<DepCreationMethod>(),
            Err(UnknownMethod("greedy".to_string()))
        );
        for method in DepCreationMethod::ALL {
            assert_eq!(method.name().parse::<DepCreationMethod>(), Ok(method));
        }
    }

    /// Small grid, few shuttles, times around zero and colliding vertex ids.
    fn arb_actions() -> impl Strategy<Value = Vec<Action>> {
        prop::collection::vec(
            ((0..3i32, 0..2i32), (0..3i32, 0..2i32), -1..3i64, 0..3i64, 0..6i64),
            0..12,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(start, goal, t, shuttle, vertex)| make_action(start, goal, t, shuttle, vertex))
                .collect()
        })
    }

    /// Latest candidate at or before the action's time, last in input order on ties;
    /// an edge only when that candidate belongs to another shuttle.
    fn nearest_candidate_edges(actions: &[Action]) -> Vec<DependencyEdge> {
        actions
            .iter()
            .filter_map(|a| {
                let mut nearest: Option<&Action> = None;
                for c in actions {
                    if c.start == a.goal
                        && c.time_step <= a.time_step
                        && nearest.map_or(true, |n| c.time_step >= n.time_step)
                    {
                        nearest = Some(c);
                    }
                }
                nearest
                    .filter(|n| n.shuttle_id != a.shuttle_id)
                    .map(|n| (n.vertex_id, a.vertex_id))
            })
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn property_exhaustive_and_cp_edge_sets_match(actions in arb_actions()) {
            let exhaustive = create_type2_dependencies(&actions, DepCreationMethod::Exhaustive);
            let cp = create_type2_dependencies(&actions, DepCreationMethod::Cp);
            prop_assert_eq!(edge_set(&exhaustive), edge_set(&cp));
        }

        #[test]
        fn property_scp_is_subset_of_cp(actions in arb_actions()) {
            let cp = edge_set(&create_type2_dependencies(&actions, DepCreationMethod::Cp));
            let scp = create_type2_dependencies(&actions, DepCreationMethod::Scp);
            for edge in &scp {
                prop_assert!(cp.contains(edge), "scp edge {:?} missing from cp", edge);
            }
        }

        #[test]
        fn property_scp_matches_nearest_candidate_rule(actions in arb_actions()) {
            let scp = create_type2_dependencies(&actions, DepCreationMethod::Scp);
            // At most one edge per action, emitted in input order.
            prop_assert!(scp.len() <= actions.len());
            prop_assert_eq!(scp, nearest_candidate_edges(&actions));
        }
    }
}
