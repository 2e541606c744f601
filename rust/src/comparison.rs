//! Side-by-side comparison of the Type-2 dependency methods.

use pyo3::prelude::*;

use crate::adg::{Adg, AdgError, CreationStats};
use crate::dependency::DepCreationMethod;
use crate::log_summary;
use crate::models::Action;

/// Runtime and edge counts of each method on the same action set.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct MethodComparison {
    #[pyo3(get)]
    pub exhaustive: Option<CreationStats>,
    #[pyo3(get)]
    pub cp: Option<CreationStats>,
    #[pyo3(get)]
    pub scp: Option<CreationStats>,
    /// Edge count of the transitive reduction of the exhaustive graph.
    #[pyo3(get)]
    pub reduced_edges: Option<usize>,
}

impl MethodComparison {
    pub fn get(&self, method: DepCreationMethod) -> Option<&CreationStats> {
        match method {
            DepCreationMethod::Exhaustive => self.exhaustive.as_ref(),
            DepCreationMethod::Cp => self.cp.as_ref(),
            DepCreationMethod::Scp => self.scp.as_ref(),
        }
    }

    fn set(&mut self, method: DepCreationMethod, stats: CreationStats) {
        let slot = match method {
            DepCreationMethod::Exhaustive => &mut self.exhaustive,
            DepCreationMethod::Cp => &mut self.cp,
            DepCreationMethod::Scp => &mut self.scp,
        };
        *slot = Some(stats);
    }
}

#[pymethods]
impl MethodComparison {
    fn __repr__(&self) -> String {
        let edges = |stats: &Option<CreationStats>| {
            stats
                .as_ref()
                .map(|s| s.total_edges.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        format!(
            "MethodComparison(exhaustive_edges={}, cp_edges={}, scp_edges={}, reduced_edges={:?})",
            edges(&self.exhaustive),
            edges(&self.cp),
            edges(&self.scp),
            self.reduced_edges
        )
    }
}

/// Build a fresh Type-1 graph per method and time its Type-2 creation.
///
/// The exhaustive run is the slowest; `skip_exhaustive` leaves it (and the
/// transitive reduction it feeds) out.
pub fn compare_methods(
    actions: &[Action],
    skip_wait_actions: bool,
    skip_exhaustive: bool,
    verbosity: u8,
) -> Result<MethodComparison, AdgError> {
    let mut comparison = MethodComparison::default();

    for method in DepCreationMethod::ALL {
        if skip_exhaustive && method == DepCreationMethod::Exhaustive {
            continue;
        }
        let mut adg = Adg::with_type1(actions, skip_wait_actions);
        let stats = adg.add_type2_dependencies(method, verbosity)?;

        if method == DepCreationMethod::Exhaustive && stats.acyclic {
            comparison.reduced_edges = Some(adg.transitive_reduction()?.num_edges());
        }
        log_summary!(
            verbosity,
            "{} took {:.6}s: {} type-2 of {} edges",
            method,
            stats.elapsed_secs,
            stats.created_type2_dependencies,
            stats.total_edges
        );
        comparison.set(method, stats);
    }

    Ok(comparison)
}
