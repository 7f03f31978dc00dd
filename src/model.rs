//! Discretized model: parameters plus the fixed state grids.
//!
//! Everything in a [`Model`] is computed once per solve and only read
//! afterwards, so it is shared freely across worker threads.

use crate::bellman::Bellman;
use crate::error::{VfiError, VfiResult};
use crate::grid::{capital_grid, feasible_upper, resources, StateIndex};
use crate::params::Parameters;
use crate::real::Real;
use crate::tauchen::Productivity;

#[derive(Debug, Clone)]
pub struct Model {
    pub params: Parameters,
    pub k: Vec<Real>,
    pub productivity: Productivity,
    pub index: StateIndex,
    /// Resources `z * k^alpha + (1 - delta) * k` for every state.
    ydep_k: Vec<Real>,
    /// Largest affordable capital index for every state.
    khi: Vec<usize>,
}

impl Model {
    /// Validates `params`, then builds the Tauchen grid and the capital grid.
    pub fn new(params: Parameters) -> VfiResult<Self> {
        params.validate()?;
        let productivity = Productivity::from_params(&params)?;
        let k = capital_grid(params.nk, params.alpha, params.beta, params.delta, &productivity.z)?;
        Self::from_grids(params, k, productivity)
    }

    /// Uses caller-supplied grids. `nk` and `nz` in `params` are replaced by
    /// the grid sizes.
    pub fn from_grids(mut params: Parameters, k: Vec<Real>, productivity: Productivity) -> VfiResult<Self> {
        params.nk = k.len();
        params.nz = productivity.nz();
        params.validate()?;

        if !k.windows(2).all(|w| w[0] < w[1]) {
            return Err(VfiError::InvalidConfiguration(
                "capital grid must be strictly increasing".to_string(),
            ));
        }
        if !productivity.z.windows(2).all(|w| w[0] < w[1]) || productivity.z.iter().any(|&z| !(z > 0.0)) {
            return Err(VfiError::InvalidConfiguration(
                "productivity grid must be positive and strictly increasing".to_string(),
            ));
        }
        if productivity.p.nz() != productivity.nz() {
            return Err(VfiError::InvalidConfiguration(format!(
                "transition matrix is {n} x {n} but the productivity grid has {} points",
                productivity.nz(),
                n = productivity.p.nz()
            )));
        }

        let index = StateIndex::new(k.len(), productivity.nz());
        let mut ydep_k = Vec::with_capacity(index.len());
        let mut khi = Vec::with_capacity(index.len());
        for s in 0..index.len() {
            let (i, j) = index.split(s);
            let ydep = resources(productivity.z[j], k[i], params.alpha, params.delta);
            let Some(hi) = feasible_upper(&k, ydep) else {
                return Err(VfiError::InfeasibleGrid {
                    k_min: k[0] as f64,
                    resources: ydep as f64,
                });
            };
            ydep_k.push(ydep);
            khi.push(hi);
        }

        Ok(Model {
            params,
            k,
            productivity,
            index,
            ydep_k,
            khi,
        })
    }

    pub fn nk(&self) -> usize {
        self.index.nk
    }

    pub fn nz(&self) -> usize {
        self.index.nz
    }

    pub fn z(&self) -> &[Real] {
        &self.productivity.z
    }

    #[inline]
    pub fn resources(&self, s: usize) -> Real {
        self.ydep_k[s]
    }

    #[inline]
    pub fn feasible_upper(&self, s: usize) -> usize {
        self.khi[s]
    }

    pub fn bellman<'a>(&'a self, v0: &'a [Real]) -> VfiResult<Bellman<'a>> {
        Bellman::new(&self.k, &self.productivity.p, v0, self.params.eta, self.params.beta)
    }
}
