//! Initial guess for the value function.

use crate::error::{VfiError, VfiResult};
use crate::grid::steady_state_capital;
use crate::params::Parameters;
use crate::real::Real;

/// Seeds `V` (flattened `nk x nz`, capital fastest) with the deterministic
/// steady state utility of each productivity level, repeated over capital.
pub fn initial_value(params: &Parameters, z: &[Real], nk: usize) -> VfiResult<Vec<Real>> {
    let Parameters { eta, beta, alpha, delta, .. } = *params;

    let mut v = Vec::with_capacity(nk * z.len());
    for (j, &zj) in z.iter().enumerate() {
        let kj = steady_state_capital(zj, alpha, beta, delta);
        let cj = zj * kj.powf(alpha) - delta * kj;
        if !(cj > 0.0) {
            return Err(VfiError::NonPositiveConsumption {
                z_index: j,
                consumption: cj as f64,
            });
        }
        let vj = cj.powf(1.0 - eta) / (1.0 - eta);
        v.extend(std::iter::repeat(vj).take(nk));
    }
    Ok(v)
}
