//! CSV tables of a solved model.
//!
//! Value and policy tables have one row per capital grid point and one
//! column per productivity state.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::VfiResult;
use crate::real::Real;
use crate::solver::Solution;
use crate::tauchen::TransitionMatrix;

pub fn write_grid<W: Write>(out: W, name: &str, values: &[Real]) -> VfiResult<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record([name])?;
    for x in values {
        wtr.write_record([x.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Row `i` is the distribution of next period productivity given state `i`.
pub fn write_transition<W: Write>(out: W, p: &TransitionMatrix) -> VfiResult<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record((0..p.nz()).map(|j| format!("z{j}")))?;
    for i in 0..p.nz() {
        wtr.write_record(p.row(i).map(|x| x.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_value<W: Write>(out: W, solution: &Solution) -> VfiResult<()> {
    write_table(out, solution, |i, j| solution.value_at(i, j))
}

/// Policy as next period capital levels.
pub fn write_policy<W: Write>(out: W, solution: &Solution) -> VfiResult<()> {
    write_table(out, solution, |i, j| solution.k()[solution.policy_at(i, j)])
}

fn write_table<W, F>(out: W, solution: &Solution, cell: F) -> VfiResult<()>
where
    W: Write,
    F: Fn(usize, usize) -> Real,
{
    let nz = solution.model.nz();
    let mut wtr = csv::Writer::from_writer(out);

    let header = std::iter::once("k".to_string()).chain(solution.z().iter().map(|z| format!("z={z}")));
    wtr.write_record(header)?;

    for (i, k) in solution.k().iter().enumerate() {
        let row = std::iter::once(k.to_string()).chain((0..nz).map(|j| cell(i, j).to_string()));
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes `grid_k.csv`, `grid_z.csv`, `transition.csv`, `value.csv` and
/// `policy.csv` into `dir`, creating it if needed.
pub fn write_all(dir: &Path, solution: &Solution) -> VfiResult<()> {
    fs::create_dir_all(dir)?;
    write_grid(File::create(dir.join("grid_k.csv"))?, "k", solution.k())?;
    write_grid(File::create(dir.join("grid_z.csv"))?, "z", solution.z())?;
    write_transition(File::create(dir.join("transition.csv"))?, solution.p())?;
    write_value(File::create(dir.join("value.csv"))?, solution)?;
    write_policy(File::create(dir.join("policy.csv"))?, solution)?;
    Ok(())
}
