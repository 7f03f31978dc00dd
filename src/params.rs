//! Model calibration and solver settings.
//!
//! A [`Parameters`] value is built once per solve, validated, and then passed
//! by reference into every component. Nothing in the crate keeps parameters
//! in global state.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{VfiError, VfiResult};
use crate::real::Real;

/// How the Bellman objective is maximized over next period capital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MaxType {
    /// Evaluate every feasible grid point.
    Exhaustive,
    /// Bisect on the two midpoints, relying on concavity of the objective.
    #[default]
    Binary,
}

/// Howard improvement cadence: number of policy evaluation steps run between
/// two maximizing steps. Read from TOML as a plain integer, `0` meaning off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "usize")]
pub enum Howard {
    #[default]
    Off,
    Steps(usize),
}

impl From<usize> for Howard {
    fn from(steps: usize) -> Self {
        match steps {
            0 => Howard::Off,
            n => Howard::Steps(n),
        }
    }
}

impl Howard {
    pub fn is_on(self) -> bool {
        matches!(self, Howard::Steps(_))
    }

    pub fn steps(self) -> usize {
        match self {
            Howard::Off => 0,
            Howard::Steps(n) => n,
        }
    }
}

fn default_max_iter() -> usize {
    10_000
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    /// Coefficient of relative risk aversion.
    pub eta: Real,
    /// Time discount factor.
    pub beta: Real,
    /// Capital share in production.
    pub alpha: Real,
    /// Depreciation rate.
    pub delta: Real,
    /// Mean of the log productivity innovation.
    pub mu: Real,
    /// Persistence of log productivity.
    pub rho: Real,
    /// Standard deviation of the log productivity innovation.
    pub sigma: Real,
    /// Half-width of the productivity grid in unconditional standard deviations.
    pub lambda: Real,
    pub nk: usize,
    pub nz: usize,
    /// Sup-norm tolerance on successive value iterates.
    pub tol: Real,
    #[serde(default)]
    pub maxtype: MaxType,
    #[serde(default)]
    pub howard: Howard,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
}

impl Parameters {
    /// Benchmark calibration used throughout the tests and by the binary
    /// when no parameter file is given.
    pub fn reference() -> Self {
        Parameters {
            eta: 2.0,
            beta: 0.95,
            alpha: 0.33,
            delta: 0.1,
            mu: 0.0,
            rho: 0.9,
            sigma: 0.02,
            lambda: 3.0,
            nk: 100,
            nz: 11,
            tol: 1e-6,
            maxtype: MaxType::Binary,
            howard: Howard::Off,
            max_iter: default_max_iter(),
        }
    }

    pub fn from_toml_str(text: &str) -> VfiResult<Self> {
        let params: Parameters = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> VfiResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Range checks on every field, plus the rule that binary search never
    /// runs together with Howard improvement.
    pub fn validate(&self) -> VfiResult<()> {
        check(
            "eta",
            self.eta,
            self.eta > 0.0 && self.eta != 1.0,
            "must be positive and different from 1",
        )?;
        check("beta", self.beta, self.beta > 0.0 && self.beta < 1.0, "must lie in (0, 1)")?;
        check("alpha", self.alpha, self.alpha > 0.0 && self.alpha < 1.0, "must lie in (0, 1)")?;
        check("delta", self.delta, (0.0..=1.0).contains(&self.delta), "must lie in [0, 1]")?;
        check("mu", self.mu, true, "must be finite")?;
        check("rho", self.rho, self.rho.abs() < 1.0, "must satisfy |rho| < 1")?;
        check("sigma", self.sigma, self.sigma > 0.0, "must be positive")?;
        check("lambda", self.lambda, self.lambda > 0.0, "must be positive")?;
        check("tol", self.tol, self.tol > 0.0, "must be positive")?;
        if self.nk < 1 {
            return Err(VfiError::InvalidParameter {
                name: "nk",
                value: self.nk as f64,
                reason: "capital grid needs at least one point",
            });
        }
        if self.nz < 2 {
            return Err(VfiError::InvalidParameter {
                name: "nz",
                value: self.nz as f64,
                reason: "Tauchen discretization needs at least two points",
            });
        }
        if self.max_iter == 0 {
            return Err(VfiError::InvalidConfiguration(
                "max_iter must allow at least one iteration".to_string(),
            ));
        }
        if self.maxtype == MaxType::Binary && self.howard.is_on() {
            return Err(VfiError::InvalidConfiguration(
                "binary search maximization cannot be combined with Howard improvement".to_string(),
            ));
        }
        Ok(())
    }
}

fn check(name: &'static str, value: Real, ok: bool, reason: &'static str) -> VfiResult<()> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(VfiError::InvalidParameter {
            name,
            value: value as f64,
            reason,
        })
    }
}
