//! Configuration for the backtracking search.

use pyo3::prelude::*;

/// Knobs for a scheduling run.
#[pyclass]
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Maximum number of search nodes before the run is aborted (None = unlimited).
    #[pyo3(get, set)]
    pub max_nodes: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            max_nodes: None,
        }
    }
}

impl SearchConfig {
    /// True once `nodes` has gone past the configured budget.
    #[inline]
    pub fn budget_exceeded(&self, nodes: u64) -> bool {
        matches!(self.max_nodes, Some(limit) if nodes > limit)
    }
}

#[pymethods]
impl SearchConfig {
    #[new]
    #[pyo3(signature = (verbosity=0, max_nodes=None))]
    fn new(verbosity: u8, max_nodes: Option<u64>) -> Self {
        Self {
            verbosity,
            max_nodes,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "SearchConfig(verbosity={}, max_nodes={:?})",
            self.verbosity, self.max_nodes
        )
    }
}
