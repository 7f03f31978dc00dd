//! Value function iteration to convergence.

use std::mem;

use log::{debug, info, warn};
use scoped_threadpool::Pool;

use crate::error::{VfiError, VfiResult};
use crate::init::initial_value;
use crate::model::Model;
use crate::params::{Howard, Parameters};
use crate::real::Real;
use crate::step::{step, StepMode};
use crate::tauchen::TransitionMatrix;

/// Maximizing steps run before the first Howard run.
pub const HOWARD_WARMUP: usize = 3;

const LOG_EVERY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Converged,
    /// Stopped on the iteration budget; the solution holds the last iterate.
    MaxIterations,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    pub mode: StepMode,
    pub distance: Real,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub model: Model,
    /// Value function, capital fastest.
    pub v: Vec<Real>,
    /// Policy as indices into the capital grid, capital fastest.
    pub g: Vec<usize>,
    pub status: Status,
    pub iterations: usize,
    /// Sup-norm distance of the last step.
    pub distance: Real,
    pub history: Vec<IterationRecord>,
}

impl Solution {
    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }

    /// Policy resolved to capital levels.
    pub fn policy_capital(&self) -> Vec<Real> {
        self.g.iter().map(|&kp| self.model.k[kp]).collect()
    }

    pub fn value_at(&self, i: usize, j: usize) -> Real {
        self.v[self.model.index.flat(i, j)]
    }

    pub fn policy_at(&self, i: usize, j: usize) -> usize {
        self.g[self.model.index.flat(i, j)]
    }

    pub fn k(&self) -> &[Real] {
        &self.model.k
    }

    pub fn z(&self) -> &[Real] {
        self.model.z()
    }

    pub fn p(&self) -> &TransitionMatrix {
        &self.model.productivity.p
    }
}

/// Owns the model and the two value buffers. `v0` always holds the latest
/// iterate; `v` is scratch written by the next step and then swapped in.
#[derive(Debug)]
pub struct Solver {
    model: Model,
    v0: Vec<Real>,
    v: Vec<Real>,
    g: Vec<usize>,
    has_policy: bool,
    history: Vec<IterationRecord>,
}

impl Solver {
    pub fn new(params: Parameters) -> VfiResult<Self> {
        Self::from_model(Model::new(params)?)
    }

    /// Starts from the deterministic steady state guess.
    pub fn from_model(model: Model) -> VfiResult<Self> {
        let v0 = initial_value(&model.params, model.z(), model.nk())?;
        Self::with_initial_value(model, v0)
    }

    pub fn with_initial_value(model: Model, v0: Vec<Real>) -> VfiResult<Self> {
        let n = model.index.len();
        if v0.len() != n {
            return Err(VfiError::InvalidConfiguration(format!(
                "initial value function has {} entries, expected {n}",
                v0.len()
            )));
        }
        Ok(Solver {
            model,
            v0,
            v: vec![0.0; n],
            g: vec![0; n],
            has_policy: false,
            history: Vec::new(),
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Latest value iterate.
    pub fn value(&self) -> &[Real] {
        &self.v0
    }

    pub fn policy(&self) -> &[usize] {
        &self.g
    }

    pub fn history(&self) -> &[IterationRecord] {
        &self.history
    }

    /// Runs one step and swaps buffers. Returns the sup-norm distance to the
    /// previous iterate.
    ///
    /// Maximizing steps must use the configured `maxtype`. Howard steps need a
    /// policy from an earlier maximizing step and are refused under binary
    /// search.
    pub fn step(&mut self, pool: &mut Pool, mode: StepMode) -> VfiResult<Real> {
        match mode {
            StepMode::Maximize(maxtype) if maxtype != self.model.params.maxtype => {
                return Err(VfiError::InvalidConfiguration(format!(
                    "{maxtype:?} step requested on a solver configured for {:?}",
                    self.model.params.maxtype
                )));
            }
            StepMode::Howard if !self.has_policy => {
                return Err(VfiError::InvalidConfiguration(
                    "Howard step requested before any maximizing step".to_string(),
                ));
            }
            _ => {}
        }

        let distance = step(pool, &self.model, mode, &self.v0, &mut self.v, &mut self.g)?;
        mem::swap(&mut self.v0, &mut self.v);
        if !mode.is_howard() {
            self.has_policy = true;
        }

        self.history.push(IterationRecord {
            iteration: self.history.len() + 1,
            mode,
            distance,
        });
        Ok(distance)
    }

    /// Step kind for the `done`-th step (0-based), from the Howard cadence.
    pub fn schedule(&self, done: usize) -> StepMode {
        let maximize = StepMode::Maximize(self.model.params.maxtype);
        match self.model.params.howard {
            Howard::Off => maximize,
            Howard::Steps(n) => {
                if done < HOWARD_WARMUP || (done - HOWARD_WARMUP) % (n + 1) == 0 {
                    maximize
                } else {
                    StepMode::Howard
                }
            }
        }
    }

    /// Iterates until a maximizing step moves the value function by less than
    /// `tol`, or the iteration budget runs out.
    pub fn solve(mut self, pool: &mut Pool) -> VfiResult<Solution> {
        let Parameters { tol, max_iter, maxtype, howard, nk, nz, .. } = self.model.params;
        info!(
            "Solving {nk} x {nz} states, maxtype = {maxtype:?}, howard = {howard:?}, threads = {}",
            pool.thread_count()
        );

        let mut status = Status::MaxIterations;
        let mut distance = Real::INFINITY;
        let mut iteration = 0;

        while iteration < max_iter {
            let mode = self.schedule(iteration);
            if mode.is_howard() && iteration > 0 && !self.schedule(iteration - 1).is_howard() {
                debug!("Iteration = {}, starting {} Howard steps", iteration + 1, howard.steps());
            }

            distance = self.step(pool, mode)?;
            iteration += 1;

            let finished = !mode.is_howard() && distance < tol;
            if iteration == 1 || iteration % LOG_EVERY == 0 || finished {
                info!("Iteration = {}, Sup Diff = {}", iteration, distance);
            }
            if finished {
                status = Status::Converged;
                break;
            }
        }

        if status == Status::MaxIterations {
            warn!("No convergence after {iteration} iterations, last Sup Diff = {distance}");
        }

        Ok(Solution {
            model: self.model,
            v: self.v0,
            g: self.g,
            status,
            iterations: iteration,
            distance,
            history: self.history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MaxType;

    fn small_params() -> Parameters {
        Parameters {
            nk: 30,
            nz: 3,
            tol: 1e-5,
            ..Parameters::reference()
        }
    }

    #[test]
    fn schedule_alternates_after_warmup() {
        let params = Parameters {
            maxtype: MaxType::Exhaustive,
            howard: Howard::Steps(2),
            ..small_params()
        };
        let solver = Solver::new(params).unwrap();
        let modes: Vec<bool> = (0..10).map(|i| solver.schedule(i).is_howard()).collect();
        assert_eq!(
            modes,
            vec![false, false, false, false, true, true, false, true, true, false]
        );

        let solver = Solver::new(small_params()).unwrap();
        assert!((0..10).all(|i| !solver.schedule(i).is_howard()));
    }

    #[test]
    fn howard_before_policy_is_rejected() {
        let params = Parameters {
            maxtype: MaxType::Exhaustive,
            ..small_params()
        };
        let mut solver = Solver::new(params).unwrap();
        let mut pool = Pool::new(2);
        assert!(matches!(
            solver.step(&mut pool, StepMode::Howard),
            Err(VfiError::InvalidConfiguration(_))
        ));
        solver.step(&mut pool, StepMode::Maximize(MaxType::Exhaustive)).unwrap();
        assert!(solver.step(&mut pool, StepMode::Howard).is_ok());
        assert_eq!(solver.history().len(), 2);
    }

    #[test]
    fn howard_is_refused_under_binary_search() {
        let mut solver = Solver::new(small_params()).unwrap();
        let mut pool = Pool::new(2);
        solver.step(&mut pool, StepMode::Maximize(MaxType::Binary)).unwrap();
        assert!(matches!(
            solver.step(&mut pool, StepMode::Howard),
            Err(VfiError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn maximizer_must_match_the_configuration() {
        let params = Parameters {
            maxtype: MaxType::Exhaustive,
            ..small_params()
        };
        let mut solver = Solver::new(params).unwrap();
        let mut pool = Pool::new(2);
        assert!(matches!(
            solver.step(&mut pool, StepMode::Maximize(MaxType::Binary)),
            Err(VfiError::InvalidConfiguration(_))
        ));
        assert!(solver.history().is_empty());

        // A refused binary step leaves no policy for Howard to reuse.
        assert!(solver.step(&mut pool, StepMode::Howard).is_err());

        let mut solver = Solver::new(small_params()).unwrap();
        assert!(solver.step(&mut pool, StepMode::Maximize(MaxType::Exhaustive)).is_err());
        assert!(solver.step(&mut pool, StepMode::Maximize(MaxType::Binary)).is_ok());
    }

    #[test]
    fn step_swaps_buffers() {
        let mut solver = Solver::new(small_params()).unwrap();
        let before = solver.value().to_vec();
        let mut pool = Pool::new(2);
        let d = solver.step(&mut pool, StepMode::Maximize(MaxType::Binary)).unwrap();
        let after = solver.value();
        let sup = before
            .iter()
            .zip(after)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, Real::max);
        assert_eq!(d, sup);
    }

    #[test]
    fn small_model_converges() {
        let mut pool = Pool::new(2);
        let solution = Solver::new(small_params()).unwrap().solve(&mut pool).unwrap();
        assert!(solution.converged());
        assert!(solution.distance < 1e-5);
        assert_eq!(solution.history.len(), solution.iterations);
        assert_eq!(solution.v.len(), 90);
        assert!(solution.g.iter().all(|&kp| kp < 30));
        assert_eq!(solution.policy_capital()[0], solution.k()[solution.g[0]]);
    }

    #[test]
    fn budget_exhaustion_is_a_status() {
        let params = Parameters {
            max_iter: 2,
            ..small_params()
        };
        let mut pool = Pool::new(2);
        let solution = Solver::new(params).unwrap().solve(&mut pool).unwrap();
        assert_eq!(solution.status, Status::MaxIterations);
        assert_eq!(solution.iterations, 2);
        assert!(solution.distance > 1e-5);
    }
}
