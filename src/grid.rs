//! Capital grid and the state space indexing convention.

use crate::error::{VfiError, VfiResult};
use crate::real::Real;

/// Deterministic steady state capital for productivity level `z`.
pub fn steady_state_capital(z: Real, alpha: Real, beta: Real, delta: Real) -> Real {
    ((1.0 / (alpha * z)) * (1.0 / beta - 1.0 + delta)).powf(1.0 / (alpha - 1.0))
}

/// Output plus undepreciated capital: everything that can be split between
/// consumption and next period capital.
#[inline]
pub fn resources(z: Real, k: Real, alpha: Real, delta: Real) -> Real {
    z * k.powf(alpha) + (1.0 - delta) * k
}

/// Equally spaced grid from 95% of steady state capital under the lowest
/// productivity to 105% of steady state capital under the highest.
pub fn capital_grid(nk: usize, alpha: Real, beta: Real, delta: Real, z: &[Real]) -> VfiResult<Vec<Real>> {
    if nk < 1 {
        return Err(VfiError::InvalidParameter {
            name: "nk",
            value: nk as f64,
            reason: "capital grid needs at least one point",
        });
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(VfiError::InvalidParameter {
            name: "alpha",
            value: alpha as f64,
            reason: "must lie in (0, 1)",
        });
    }
    if !(beta > 0.0 && beta < 1.0) {
        return Err(VfiError::InvalidParameter {
            name: "beta",
            value: beta as f64,
            reason: "must lie in (0, 1)",
        });
    }
    if !(0.0..=1.0).contains(&delta) {
        return Err(VfiError::InvalidParameter {
            name: "delta",
            value: delta as f64,
            reason: "must lie in [0, 1]",
        });
    }
    let (Some(&zlo), Some(&zhi)) = (z.first(), z.last()) else {
        return Err(VfiError::InvalidConfiguration(
            "capital grid needs a non-empty productivity grid".to_string(),
        ));
    };

    let kmin = 0.95 * steady_state_capital(zlo, alpha, beta, delta);
    let kmax = 1.05 * steady_state_capital(zhi, alpha, beta, delta);

    if nk == 1 {
        return Ok(vec![kmin]);
    }
    if !(kmax > kmin) || !kmin.is_finite() || !kmax.is_finite() {
        return Err(VfiError::DegenerateGrid {
            k_min: kmin as f64,
            k_max: kmax as f64,
        });
    }

    let kstep = (kmax - kmin) / (nk - 1) as Real;
    log::debug!("Capital grid with {nk} points on [{kmin}, {kmax}]");
    Ok((0..nk).map(|i| kmin + kstep * i as Real).collect())
}

/// Index of the largest grid point not exceeding `ydep_k`, or `None` when even
/// the first point is out of reach.
pub fn feasible_upper(k: &[Real], ydep_k: Real) -> Option<usize> {
    k.partition_point(|&kp| kp <= ydep_k).checked_sub(1)
}

/// Mapping between `(capital, productivity)` pairs and flat offsets.
///
/// Capital varies fastest: state `(i, j)` lives at `i + j * nk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateIndex {
    pub nk: usize,
    pub nz: usize,
}

impl StateIndex {
    pub fn new(nk: usize, nz: usize) -> Self {
        StateIndex { nk, nz }
    }

    #[inline]
    pub fn flat(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < self.nk && j < self.nz);
        i + j * self.nk
    }

    #[inline]
    pub fn split(&self, s: usize) -> (usize, usize) {
        (s % self.nk, s / self.nk)
    }

    pub fn len(&self) -> usize {
        self.nk * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
