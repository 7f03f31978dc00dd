//! One value function iteration over the whole state space.
//!
//! Every state is independent: workers read the frozen `v0` and the model
//! grids, and write only their own slots of `v` and `g`. The pool's scope is
//! the barrier; nothing returns until every worker is done.

use scoped_threadpool::Pool;

use crate::error::{VfiError, VfiResult};
use crate::model::Model;
use crate::params::MaxType;
use crate::real::Real;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// Re-optimize next period capital at every state.
    Maximize(MaxType),
    /// Re-evaluate the Bellman equation at the current policy.
    Howard,
}

impl StepMode {
    pub fn is_howard(self) -> bool {
        self == StepMode::Howard
    }
}

/// Writes the updated value function into `v` and, on maximizing steps, the
/// policy into `g`. Returns the sup-norm distance between `v` and `v0`.
///
/// On Howard steps `g` must already hold a policy that every state can
/// afford, and the model must not be configured for binary search.
pub fn step(
    pool: &mut Pool,
    model: &Model,
    mode: StepMode,
    v0: &[Real],
    v: &mut [Real],
    g: &mut [usize],
) -> VfiResult<Real> {
    let n = model.index.len();
    if v.len() != n || g.len() != n {
        return Err(VfiError::InvalidConfiguration(format!(
            "step buffers have {} and {} entries, expected {n}",
            v.len(),
            g.len()
        )));
    }
    if mode == StepMode::Howard {
        if model.params.maxtype == MaxType::Binary {
            return Err(VfiError::InvalidConfiguration(
                "Howard steps are not allowed with binary search maximization".to_string(),
            ));
        }
        if let Some(s) = (0..n).find(|&s| g[s] > model.feasible_upper(s)) {
            return Err(VfiError::InvalidConfiguration(format!(
                "Howard step needs a feasible policy, state {s} picks capital index {} above {}",
                g[s],
                model.feasible_upper(s)
            )));
        }
    }
    let bellman = model.bellman(v0)?;

    let threads = pool.thread_count().max(1) as usize;
    let chunk = n.div_ceil(threads).max(1);

    // one slot per worker, so no lock is needed for the distance
    let mut diffs: Vec<Real> = vec![0.0; n.div_ceil(chunk)];

    pool.scoped(|scope| {
        for (c, ((v_chunk, g_chunk), max_diff)) in v
            .chunks_mut(chunk)
            .zip(g.chunks_mut(chunk))
            .zip(diffs.iter_mut())
            .enumerate()
        {
            let bellman = &bellman;
            scope.execute(move || {
                let offset = c * chunk;
                for (local, (value, policy)) in v_chunk.iter_mut().zip(g_chunk.iter_mut()).enumerate() {
                    let s = offset + local;
                    let (_, j) = model.index.split(s);
                    let ydep_k = model.resources(s);

                    *value = match mode {
                        StepMode::Maximize(maxtype) => {
                            let (kp, w) = bellman.maximize(maxtype, j, ydep_k, model.feasible_upper(s));
                            *policy = kp;
                            w
                        }
                        StepMode::Howard => bellman.evaluate(j, ydep_k, *policy),
                    };

                    // a NaN distance must not be lost
                    let diff = (*value - v0[s]).abs();
                    if !(diff <= *max_diff) {
                        *max_diff = diff;
                    }
                }
            });
        }
    });

    Ok(diffs
        .into_iter()
        .fold(0.0, |sup, d| if d > sup || d.is_nan() { d } else { sup }))
}
