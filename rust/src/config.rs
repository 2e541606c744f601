//! Configuration types for dependency graph construction.

use pyo3::prelude::*;

use crate::dependency::{DepCreationMethod, UnknownMethod};

/// Configuration for building an action dependency graph.
#[pyclass]
#[derive(Clone, Debug)]
pub struct AdgConfig {
    /// Type-2 dependency method: "exhaustive", "cp" or "scp"
    #[pyo3(get, set)]
    pub method: String,
    /// Drop wait actions (start == goal) before building the graph
    #[pyo3(get, set)]
    pub skip_wait_actions: bool,
    /// Verbosity level: 0=silent, 1=summary, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for AdgConfig {
    fn default() -> Self {
        Self {
            method: DepCreationMethod::default().name().to_string(),
            skip_wait_actions: false,
            verbosity: 0,
        }
    }
}

impl AdgConfig {
    /// Parsed Type-2 dependency method.
    pub fn method(&self) -> Result<DepCreationMethod, UnknownMethod> {
        self.method.parse()
    }

    pub fn with_method(method: DepCreationMethod) -> Self {
        Self {
            method: method.name().to_string(),
            ..Self::default()
        }
    }
}

#[pymethods]
impl AdgConfig {
    #[new]
    #[pyo3(signature = (method=None, skip_wait_actions=None, verbosity=None))]
    fn new(method: Option<String>, skip_wait_actions: Option<bool>, verbosity: Option<u8>) -> Self {
        let defaults = Self::default();
        Self {
            method: method.unwrap_or(defaults.method),
            skip_wait_actions: skip_wait_actions.unwrap_or(defaults.skip_wait_actions),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "AdgConfig(method={:?}, skip_wait_actions={}, verbosity={})",
            self.method, self.skip_wait_actions, self.verbosity
        )
    }
}
