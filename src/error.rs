//! Error taxonomy for the solver.
//!
//! Construction-time problems (parameters, grids, initialization) abort the
//! solve. Running out of iterations is not an error: it is reported through
//! [`crate::solver::Status`] on an otherwise successful solution.

use thiserror::Error;

pub type VfiResult<T> = Result<T, VfiError>;

#[derive(Debug, Error)]
pub enum VfiError {
    /// A parameter is out of range or would make a grid meaningless.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Execution flags that cannot be combined, or a step requested out of order.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Deterministic steady state consumption is not positive for some productivity state.
    #[error("non-positive steady state consumption {consumption} at productivity index {z_index}")]
    NonPositiveConsumption { z_index: usize, consumption: f64 },

    /// The smallest capital choice is not affordable from the poorest state.
    #[error("infeasible capital grid: k_min = {k_min} exceeds available resources {resources}")]
    InfeasibleGrid { k_min: f64, resources: f64 },

    #[error("degenerate capital grid: k_max = {k_max} is not above k_min = {k_min}")]
    DegenerateGrid { k_min: f64, k_max: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse parameter file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("could not write table: {0}")]
    Csv(#[from] csv::Error),
}
