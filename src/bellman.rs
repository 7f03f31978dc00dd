//! Per-state Bellman update.
//!
//! For a state with resources `ydep_k` and productivity index `j`, the
//! objective over next period capital index `l` is
//!
//! ```text
//! w(l) = u(ydep_k - K[l]) + beta * sum_m P[j][m] * V0[l, m]
//! ```
//!
//! restricted to the feasible choices `0..=khi`, where `K[khi]` is the largest
//! grid point not exceeding `ydep_k`.

use crate::error::{VfiError, VfiResult};
use crate::grid::StateIndex;
use crate::params::MaxType;
use crate::real::Real;
use crate::tauchen::TransitionMatrix;

/// CRRA utility, `eta != 1`.
#[inline]
pub fn utility(c: Real, eta: Real) -> Real {
    c.powf(1.0 - eta) / (1.0 - eta)
}

/// Read-only view of everything a single state update needs.
#[derive(Debug, Clone, Copy)]
pub struct Bellman<'a> {
    k: &'a [Real],
    p: &'a TransitionMatrix,
    v0: &'a [Real],
    index: StateIndex,
    eta: Real,
    beta: Real,
}

impl<'a> Bellman<'a> {
    pub fn new(k: &'a [Real], p: &'a TransitionMatrix, v0: &'a [Real], eta: Real, beta: Real) -> VfiResult<Self> {
        let index = StateIndex::new(k.len(), p.nz());
        if v0.len() != index.len() {
            return Err(VfiError::InvalidConfiguration(format!(
                "value function has {} entries, expected {} x {}",
                v0.len(),
                index.nk,
                index.nz
            )));
        }
        Ok(Bellman { k, p, v0, index, eta, beta })
    }

    pub fn index(&self) -> StateIndex {
        self.index
    }

    /// Expected continuation value of choosing capital index `kp` from productivity `j`.
    #[inline]
    pub fn expected(&self, j: usize, kp: usize) -> Real {
        (0..self.index.nz)
            .map(|m| self.p.prob(j, m) * self.v0[self.index.flat(kp, m)])
            .sum()
    }

    #[inline]
    pub fn objective(&self, j: usize, ydep_k: Real, kp: usize) -> Real {
        utility(ydep_k - self.k[kp], self.eta) + self.beta * self.expected(j, kp)
    }

    /// Evaluates every choice in `0..=khi`; ties keep the lowest index.
    pub fn grid_max(&self, j: usize, ydep_k: Real, khi: usize) -> (usize, Real) {
        self.best_of(j, ydep_k, 0, khi)
    }

    /// Bisection on a concave objective, after Heer and Maussner (2005).
    ///
    /// Compares the two middle points of the bracket and keeps the half that
    /// holds the larger one, until at most three candidates remain. Only
    /// correct when `w` is concave over `0..=khi`.
    pub fn binary_max(&self, j: usize, ydep_k: Real, khi: usize) -> (usize, Real) {
        let (mut lo, mut hi) = (0, khi);
        while hi - lo > 2 {
            let mid = (lo + hi) / 2;
            if self.objective(j, ydep_k, mid + 1) > self.objective(j, ydep_k, mid) {
                lo = mid;
            } else {
                hi = mid + 1;
            }
        }
        self.best_of(j, ydep_k, lo, hi)
    }

    pub fn maximize(&self, maxtype: MaxType, j: usize, ydep_k: Real, khi: usize) -> (usize, Real) {
        match maxtype {
            MaxType::Exhaustive => self.grid_max(j, ydep_k, khi),
            MaxType::Binary => self.binary_max(j, ydep_k, khi),
        }
    }

    /// Value of keeping policy `g` without re-optimizing (Howard step).
    #[inline]
    pub fn evaluate(&self, j: usize, ydep_k: Real, g: usize) -> Real {
        self.objective(j, ydep_k, g)
    }

    fn best_of(&self, j: usize, ydep_k: Real, lo: usize, hi: usize) -> (usize, Real) {
        let mut best = (lo, self.objective(j, ydep_k, lo));
        for l in lo + 1..=hi {
            let w = self.objective(j, ydep_k, l);
            if w > best.1 {
                best = (l, w);
            }
        }
        best
    }
}
