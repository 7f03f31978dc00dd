//! Value function iteration for the stochastic neoclassical growth model.
//!
//! The state is `(k, z)`: capital on an equally spaced grid and productivity on
//! a Tauchen grid for a log AR(1). Each iteration solves the Bellman equation
//! at every state in parallel, by exhaustive grid search or by a bisection that
//! relies on concavity, optionally interleaved with Howard policy evaluation
//! steps.
//!
//! ```no_run
//! use rbc_vfi::{Parameters, Solver};
//! use scoped_threadpool::Pool;
//!
//! let mut pool = Pool::new(num_cpus::get() as u32);
//! let solution = Solver::new(Parameters::reference())?.solve(&mut pool)?;
//! println!("{} iterations, converged = {}", solution.iterations, solution.converged());
//! # Ok::<(), rbc_vfi::VfiError>(())
//! ```

pub mod bellman;
pub mod error;
pub mod grid;
pub mod init;
pub mod model;
pub mod params;
pub mod real;
pub mod report;
pub mod solver;
pub mod step;
pub mod tauchen;

pub use error::{VfiError, VfiResult};
pub use model::Model;
pub use params::{Howard, MaxType, Parameters};
pub use real::Real;
pub use solver::{Solution, Solver, Status};
pub use step::StepMode;
pub use tauchen::{Productivity, TransitionMatrix};
