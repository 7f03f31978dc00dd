use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::{error, info, LevelFilter};
use scoped_threadpool::Pool;
use time::precise_time_s;

use rbc_vfi::{report, Howard, MaxType, Parameters, Solution, Solver, VfiError, VfiResult};

const SAMPLES: usize = 5;

#[derive(Parser, Debug)]
#[clap(
    name = "rbc_vfi",
    version,
    about = "Solve the stochastic growth model by value function iteration."
)]
struct Args {
    /// TOML parameter file. Defaults to the reference calibration.
    #[clap(long)]
    params: Option<PathBuf>,

    /// Maximization method, overriding the parameter file.
    #[clap(long, value_enum)]
    max: Option<MaxType>,

    /// Howard steps between maximizing steps (0 turns them off).
    #[clap(long)]
    howard: Option<usize>,

    /// Worker threads. Defaults to the number of CPUs.
    #[clap(long)]
    threads: Option<u32>,

    /// Time several solves and report the median.
    #[clap(long)]
    sample: bool,

    /// Directory for the CSV tables.
    #[clap(long)]
    output: Option<PathBuf>,
}

fn load_params(args: &Args) -> VfiResult<Parameters> {
    let mut params = match &args.params {
        Some(path) => Parameters::from_file(path)?,
        None => Parameters::reference(),
    };
    if let Some(maxtype) = args.max {
        params.maxtype = maxtype;
    }
    if let Some(steps) = args.howard {
        params.howard = Howard::from(steps);
    }
    params.validate()?;
    Ok(params)
}

fn timed_solve(pool: &mut Pool, params: &Parameters) -> VfiResult<(Solution, f64)> {
    let cpu0 = precise_time_s();
    let solution = Solver::new(params.clone())?.solve(pool)?;
    let cpu1 = precise_time_s();
    Ok((solution, cpu1 - cpu0))
}

fn run(args: &Args) -> VfiResult<Solution> {
    let params = load_params(args)?;
    let thread_count = args.threads.unwrap_or(num_cpus::get() as u32);
    if thread_count == 0 {
        return Err(VfiError::InvalidConfiguration("need at least one thread".to_string()));
    }
    let mut pool = Pool::new(thread_count);

    if args.sample {
        let level = log::max_level();
        log::set_max_level(LevelFilter::Warn);
        let mut samples = Vec::with_capacity(SAMPLES);
        for i in 0..SAMPLES {
            let (_, elapsed) = timed_solve(&mut pool, &params)?;
            println!("Sample #{}, Time: {}s", i + 1, elapsed);
            samples.push(elapsed);
        }
        log::set_max_level(level);

        samples.sort_by(|a, b| a.total_cmp(b));
        println!("\nMedian time is = {}", samples[SAMPLES / 2]);
    }

    let (solution, elapsed) = timed_solve(&mut pool, &params)?;

    let (i, j) = (solution.model.nk() / 2, solution.model.nz() / 2);
    println!("Iterations = {}, Sup Diff = {}", solution.iterations, solution.distance);
    println!("Policy at (k = {}, z = {}) = {}", solution.k()[i], solution.z()[j], solution.k()[solution.policy_at(i, j)]);
    println!("Elapsed time is = {}", elapsed);

    if let Some(dir) = &args.output {
        report::write_all(dir, &solution)?;
        info!("Wrote tables to {}", dir.display());
    }
    Ok(solution)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match run(&args) {
        Ok(solution) if solution.converged() => {}
        Ok(_) => process::exit(2),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}
