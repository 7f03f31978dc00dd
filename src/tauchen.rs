//! Tauchen (1986) discretization of log productivity
//!
//! ```text
//! log z' = mu + rho * log z + e,   e ~ N(0, sigma^2)
//! ```
//!
//! The grid is equally spaced in logs over `lambda` unconditional standard
//! deviations around the unconditional mean. Each row of the transition matrix
//! is the mass of the conditional normal falling in the bin around each grid
//! point, with the two outer bins taking the tails.

use statrs::function::erf::erf;

use crate::error::{VfiError, VfiResult};
use crate::params::Parameters;
use crate::real::Real;

/// Row-stochastic `nz x nz` matrix stored column-major: the probability of
/// moving from state `from` to state `to` lives at `from + to * nz`, so the
/// current-state index varies fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    nz: usize,
    data: Vec<Real>,
}

impl TransitionMatrix {
    /// Builds the matrix from rows, one per current state.
    pub fn from_rows(rows: &[Vec<Real>]) -> VfiResult<Self> {
        let nz = rows.len();
        if nz == 0 || rows.iter().any(|row| row.len() != nz) {
            return Err(VfiError::InvalidConfiguration(format!(
                "transition matrix must be square, got {nz} rows"
            )));
        }
        let mut data = vec![0.0; nz * nz];
        for (from, row) in rows.iter().enumerate() {
            for (to, &prob) in row.iter().enumerate() {
                data[from + to * nz] = prob;
            }
        }
        Ok(TransitionMatrix { nz, data })
    }

    pub fn nz(&self) -> usize {
        self.nz
    }

    #[inline]
    pub fn prob(&self, from: usize, to: usize) -> Real {
        self.data[from + to * self.nz]
    }

    /// Next period distribution conditional on `from`.
    pub fn row(&self, from: usize) -> impl Iterator<Item = Real> + '_ {
        (0..self.nz).map(move |to| self.prob(from, to))
    }

    pub fn row_sums(&self) -> Vec<Real> {
        (0..self.nz).map(|from| self.row(from).sum()).collect()
    }

    /// Column-major storage, as described on the type.
    pub fn as_slice(&self) -> &[Real] {
        &self.data
    }
}

/// Discretized productivity process: levels `z` (increasing, positive) and
/// transition matrix `p`.
#[derive(Debug, Clone, PartialEq)]
pub struct Productivity {
    pub z: Vec<Real>,
    pub p: TransitionMatrix,
}

impl Productivity {
    pub fn from_params(params: &Parameters) -> VfiResult<Self> {
        tauchen(params.nz, params.mu, params.rho, params.sigma, params.lambda)
    }

    pub fn nz(&self) -> usize {
        self.z.len()
    }
}

fn normal_cdf(x: Real) -> Real {
    (0.5 * (1.0 + erf(x as f64 / std::f64::consts::SQRT_2))) as Real
}

pub fn tauchen(nz: usize, mu: Real, rho: Real, sigma: Real, lambda: Real) -> VfiResult<Productivity> {
    if nz < 2 {
        return Err(VfiError::InvalidParameter {
            name: "nz",
            value: nz as f64,
            reason: "Tauchen discretization needs at least two points",
        });
    }
    if !(rho.abs() < 1.0) {
        return Err(VfiError::InvalidParameter {
            name: "rho",
            value: rho as f64,
            reason: "must satisfy |rho| < 1",
        });
    }
    if !(sigma > 0.0 && sigma.is_finite()) {
        return Err(VfiError::InvalidParameter {
            name: "sigma",
            value: sigma as f64,
            reason: "must be positive",
        });
    }
    if !(lambda > 0.0 && lambda.is_finite()) {
        return Err(VfiError::InvalidParameter {
            name: "lambda",
            value: lambda as f64,
            reason: "must be positive",
        });
    }

    // 1. Grid in logs
    let sigma_z = sigma / (1.0 - rho * rho).sqrt();
    let mu_z = mu / (1.0 - rho);
    let zmin = mu_z - lambda * sigma_z;
    let zmax = mu_z + lambda * sigma_z;
    let zstep = (zmax - zmin) / (nz - 1) as Real;
    let log_z: Vec<Real> = (0..nz).map(|i| zmin + zstep * i as Real).collect();

    // 2. Transition rows, each normalized on its own
    let rows: Vec<Vec<Real>> = log_z
        .iter()
        .map(|&from| transition_row(&log_z, from, mu, rho, sigma, zstep))
        .collect();

    let z = log_z.iter().map(|lz| lz.exp()).collect();
    let p = TransitionMatrix::from_rows(&rows)?;
    log::debug!("Tauchen grid with {nz} points on [{}, {}]", zmin.exp(), zmax.exp());

    Ok(Productivity { z, p })
}

fn transition_row(log_z: &[Real], from: Real, mu: Real, rho: Real, sigma: Real, zstep: Real) -> Vec<Real> {
    let nz = log_z.len();
    let mean = mu + rho * from;
    let half = 0.5 * zstep;

    let mut row: Vec<Real> = log_z
        .iter()
        .enumerate()
        .map(|(to, &lz)| {
            let upper = if to + 1 == nz { 1.0 } else { normal_cdf((lz + half - mean) / sigma) };
            let lower = if to == 0 { 0.0 } else { normal_cdf((lz - half - mean) / sigma) };
            (upper - lower).max(0.0)
        })
        .collect();

    let total: Real = row.iter().sum();
    for prob in row.iter_mut() {
        *prob /= total;
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    // a few thousand ulps at the working precision
    const EPS: Real = 1e4 * Real::EPSILON;

    #[test]
    fn reference_grid_is_increasing_and_centered() {
        let prod = tauchen(11, 0.0, 0.9, 0.02, 3.0).unwrap();
        assert_eq!(prod.z.len(), 11);
        assert!(prod.z.iter().all(|&z| z > 0.0));
        assert!(prod.z.windows(2).all(|w| w[0] < w[1]));
        // mu = 0 puts the middle point at exp(0)
        assert_abs_diff_eq!(prod.z[5], 1.0, epsilon = EPS);

        let sigma_z = 0.02 / (1.0 - 0.81 as Real).sqrt();
        assert_abs_diff_eq!(prod.z[0].ln(), -3.0 * sigma_z, epsilon = EPS);
        assert_abs_diff_eq!(prod.z[10].ln(), 3.0 * sigma_z, epsilon = EPS);
    }

    #[test]
    fn rows_sum_to_one() {
        let prod = tauchen(11, 0.0, 0.9, 0.02, 3.0).unwrap();
        for sum in prod.p.row_sums() {
            assert_abs_diff_eq!(sum, 1.0, epsilon = EPS);
        }
        assert!(prod.p.as_slice().iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn symmetric_process_has_symmetric_matrix() {
        let prod = tauchen(7, 0.0, 0.7, 0.1, 2.5).unwrap();
        for i in 0..7 {
            for j in 0..7 {
                assert_abs_diff_eq!(prod.p.prob(i, j), prod.p.prob(6 - i, 6 - j), epsilon = EPS);
            }
        }
    }

    #[test]
    fn persistence_concentrates_mass_on_the_diagonal() {
        let prod = tauchen(5, 0.0, 0.95, 0.01, 3.0).unwrap();
        let mid = prod.p.prob(2, 2);
        for j in [0, 1, 3, 4] {
            assert!(mid > prod.p.prob(2, j));
        }
    }

    #[test]
    fn matches_hand_computed_two_state_case() {
        // Two points at +/- sigma_z; the bins split at the conditional mean's distance.
        let prod = tauchen(2, 0.0, 0.5, 0.1, 1.0).unwrap();
        let sigma_z = 0.1 / (0.75 as Real).sqrt();
        let lo = -sigma_z;
        // Stay low: mass below the midpoint 0 of N(0.5*lo, 0.1^2).
        let expected = normal_cdf((0.0 - 0.5 * lo) / 0.1);
        assert_abs_diff_eq!(prod.p.prob(0, 0), expected, epsilon = EPS);
        assert_abs_diff_eq!(prod.p.prob(0, 1), 1.0 - expected, epsilon = EPS);
        assert_abs_diff_eq!(prod.p.prob(1, 1), expected, epsilon = EPS);
    }

    #[test]
    fn column_major_layout() {
        let p = TransitionMatrix::from_rows(&[vec![0.8, 0.2], vec![0.3, 0.7]]).unwrap();
        assert_eq!(p.as_slice(), &[0.8, 0.3, 0.2, 0.7]);
        assert_eq!(p.prob(0, 1), 0.2);
        assert_eq!(p.row(1).collect::<Vec<_>>(), vec![0.3, 0.7]);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            tauchen(1, 0.0, 0.9, 0.02, 3.0),
            Err(VfiError::InvalidParameter { name: "nz", .. })
        ));
        assert!(matches!(
            tauchen(5, 0.0, 1.0, 0.02, 3.0),
            Err(VfiError::InvalidParameter { name: "rho", .. })
        ));
        assert!(matches!(
            tauchen(5, 0.0, 0.9, -0.02, 3.0),
            Err(VfiError::InvalidParameter { name: "sigma", .. })
        ));
        assert!(matches!(
            TransitionMatrix::from_rows(&[vec![1.0], vec![0.5, 0.5]]),
            Err(VfiError::InvalidConfiguration(_))
        ));
    }
}
