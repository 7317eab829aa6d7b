use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod containers;
mod error;
mod generate;
mod genetic;
mod instance;
mod loader;
mod makespan;
mod matrix;
mod neighbor;
mod report;
mod solution;
mod tabu;

use genetic::{GaConfig, SelectionMethod, Termination};
use instance::Instance;
use matrix::OperationMatrix;
use solution::Solution;
use tabu::TabuConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solves a sequence-dependent-setup job-shop instance
    Solve {
        /// Headerless square CSV of sequence-dependent setup times
        #[arg(long)]
        sequence_dependency_matrix: String,

        /// Headerless single-row CSV of per-machine work rates
        #[arg(long)]
        machine_speeds: String,

        /// Headerless CSV of job/task rows
        #[arg(long)]
        job_tasks: String,

        /// Search driver to run
        #[arg(long, value_enum)]
        method: Method,

        /// Tabu Search wall-clock budget, in seconds
        #[arg(long, default_value_t = 10)]
        search_time: u64,

        /// Tabu list capacity
        #[arg(long, default_value_t = 20)]
        tabu_size: usize,

        /// Neighborhood size per Tabu iteration
        #[arg(long, default_value_t = 50)]
        neighborhood_size: usize,

        /// Per-iteration neighborhood generation budget, in milliseconds
        #[arg(long, default_value_t = 200)]
        neighborhood_wait: u64,

        /// Probability of a machine-reassignment move (vs. row swap)
        #[arg(long, default_value_t = 0.5)]
        probability_change_machine: f64,

        /// GA generation count (mutually exclusive with --runtime)
        #[arg(long)]
        iterations: Option<usize>,

        /// GA wall-clock budget, in seconds (mutually exclusive with --iterations)
        #[arg(long)]
        runtime: Option<u64>,

        /// GA population size
        #[arg(long, default_value_t = 50)]
        population_size: usize,

        /// GA mutation probability
        #[arg(long, default_value_t = 0.1)]
        mutation_probability: f64,

        /// GA tournament draw size
        #[arg(long, default_value_t = 4)]
        selection_size: usize,

        /// GA parent selection policy
        #[arg(long, value_enum, default_value_t = SelectionArg::Tournament)]
        selection_method: SelectionArg,

        /// Number of worker threads; best result wins
        #[arg(long, default_value_t = 1)]
        workers: usize,

        /// Record a per-iteration benchmark trace
        #[arg(long)]
        benchmark: bool,

        /// Base RNG seed; workers derive `seed + worker_index`
        #[arg(long)]
        seed: Option<u64>,

        /// Benchmark trace CSV output path (requires --benchmark)
        #[arg(long)]
        trace_file: Option<String>,
    },
    /// Generates a random SDST-JSSP instance's three CSV resources
    Generate {
        /// Number of jobs
        #[arg(long)]
        job_count: usize,

        /// Number of machines
        #[arg(long)]
        machine_count: usize,

        /// Minimum tasks per job
        #[arg(long, default_value_t = 2)]
        min_tasks: usize,

        /// Maximum tasks per job
        #[arg(long, default_value_t = 5)]
        max_tasks: usize,

        /// Minimum task size, in pieces
        #[arg(long, default_value_t = 1.0)]
        min_pieces: f64,

        /// Maximum task size, in pieces
        #[arg(long, default_value_t = 20.0)]
        max_pieces: f64,

        /// Minimum number of machines a task may run on
        #[arg(long, default_value_t = 1)]
        min_allowed: usize,

        /// Maximum number of machines a task may run on
        #[arg(long, default_value_t = 3)]
        max_allowed: usize,

        /// Minimum sequence-dependent setup time
        #[arg(long, default_value_t = 0.0)]
        min_setup: f64,

        /// Maximum sequence-dependent setup time
        #[arg(long, default_value_t = 5.0)]
        max_setup: f64,

        /// Output path for the setup matrix CSV
        #[arg(long)]
        sequence_dependency_matrix: String,

        /// Output path for the machine speeds CSV
        #[arg(long)]
        machine_speeds: String,

        /// Output path for the job/task CSV
        #[arg(long)]
        job_tasks: String,
    },
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum Method {
    Tabu,
    Ga,
}

#[derive(clap::ValueEnum, Clone, Copy)]
enum SelectionArg {
    Tournament,
    FitnessProportionate,
    Random,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Solve {
            sequence_dependency_matrix,
            machine_speeds,
            job_tasks,
            method,
            search_time,
            tabu_size,
            neighborhood_size,
            neighborhood_wait,
            probability_change_machine,
            iterations,
            runtime,
            population_size,
            mutation_probability,
            selection_size,
            selection_method,
            workers,
            benchmark,
            seed,
            trace_file,
        } => {
            validate_solve_config(
                *tabu_size,
                *neighborhood_size,
                *probability_change_machine,
                *population_size,
                *selection_size,
                *mutation_probability,
                *workers,
            );

            let instance = loader::read(sequence_dependency_matrix, machine_speeds, job_tasks);
            log::info!("loaded instance with {} tasks on {} machines", instance.task_count(), instance.machine_count);

            let best = match method {
                Method::Tabu => solve_tabu(
                    &instance,
                    *workers,
                    *seed,
                    &TabuConfig {
                        search_time: Duration::from_secs(*search_time),
                        tabu_size: *tabu_size,
                        neighborhood_size: *neighborhood_size,
                        neighborhood_wait: Duration::from_millis(*neighborhood_wait),
                        probability_change_machine: *probability_change_machine,
                        benchmark: *benchmark,
                    },
                    trace_file.as_deref(),
                ),
                Method::Ga => solve_ga(
                    &instance,
                    *workers,
                    *seed,
                    &GaConfig {
                        mutation_probability: *mutation_probability,
                        selection_size: *selection_size,
                        selection_method: selection_arg_to_method(*selection_method),
                        termination: termination_from_args(*iterations, *runtime),
                        benchmark: *benchmark,
                    },
                    *population_size,
                    trace_file.as_deref(),
                ),
            };

            println!("best makespan: {}", best.makespan);
        }
        Commands::Generate {
            job_count,
            machine_count,
            min_tasks,
            max_tasks,
            min_pieces,
            max_pieces,
            min_allowed,
            max_allowed,
            min_setup,
            max_setup,
            sequence_dependency_matrix,
            machine_speeds,
            job_tasks,
        } => {
            assert!(*job_count >= 1, "job_count must be at least 1");
            assert!(*machine_count >= 1, "machine_count must be at least 1");
            assert!(min_tasks <= max_tasks, "min_tasks must be at most max_tasks");

            let instance = generate::instance(
                *job_count,
                *machine_count,
                *min_tasks,
                *max_tasks,
                *min_pieces,
                *max_pieces,
                *min_allowed,
                *max_allowed,
                *min_setup,
                *max_setup,
            );
            generate::write(sequence_dependency_matrix, machine_speeds, job_tasks, &instance);
        }
    }
}

/// Validates the §6.3 config domains before any driver is constructed,
/// so a bad value surfaces as `InvalidConfiguration` at the CLI boundary
/// instead of panicking deep inside a search loop.
fn validate_solve_config(
    tabu_size: usize,
    neighborhood_size: usize,
    probability_change_machine: f64,
    population_size: usize,
    selection_size: usize,
    mutation_probability: f64,
    workers: usize,
) {
    assert!(tabu_size >= 1, "tabu_size must be at least 1, got {tabu_size}");
    assert!(neighborhood_size >= 1, "neighborhood_size must be at least 1, got {neighborhood_size}");
    assert!(
        (0.0..=1.0).contains(&probability_change_machine),
        "probability_change_machine must be in [0, 1], got {probability_change_machine}"
    );
    assert!(population_size >= 2, "population_size must be at least 2, got {population_size}");
    assert!(selection_size >= 2, "selection_size must be at least 2, got {selection_size}");
    assert!(
        (0.0..=1.0).contains(&mutation_probability),
        "mutation_probability must be in [0, 1], got {mutation_probability}"
    );
    assert!(workers >= 1, "workers must be at least 1, got {workers}");
}

fn termination_from_args(iterations: Option<usize>, runtime: Option<u64>) -> Termination {
    match (iterations, runtime) {
        (Some(n), None) => Termination::Iterations(n),
        (None, Some(s)) => Termination::Runtime(Duration::from_secs(s)),
        _ => panic!("exactly one of --iterations or --runtime must be given"),
    }
}

fn selection_arg_to_method(arg: SelectionArg) -> SelectionMethod {
    match arg {
        SelectionArg::Tournament => SelectionMethod::Tournament,
        SelectionArg::FitnessProportionate => SelectionMethod::FitnessProportionate,
        SelectionArg::Random => SelectionMethod::Random,
    }
}

fn worker_seed(base_seed: Option<u64>, worker_index: usize) -> StdRng {
    match base_seed {
        Some(base) => StdRng::seed_from_u64(base + worker_index as u64),
        None => StdRng::from_os_rng(),
    }
}

fn solve_tabu(
    instance: &Instance,
    workers: usize,
    base_seed: Option<u64>,
    config: &TabuConfig,
    trace_file: Option<&str>,
) -> Solution {
    let initial = Solution::evaluate(OperationMatrix::identity(instance), instance);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for worker_index in 0..workers {
            let tx = tx.clone();
            let initial = initial.clone();
            let config = config.clone();
            scope.spawn(move || {
                let mut rng = worker_seed(base_seed, worker_index);
                let outcome = tabu::search(initial, instance, &config, &mut rng);
                tx.send(outcome).expect("main thread dropped the receiver");
            });
        }
        drop(tx);
    });

    let outcomes: Vec<tabu::TabuOutcome> = rx.iter().collect();
    let best_outcome = outcomes
        .into_iter()
        .min_by(|a, b| solution::compare(&a.best, &b.best))
        .expect("at least one worker runs");

    if let Some(path) = trace_file {
        report::write_tabu_trace(path, &best_outcome.trace);
    }

    best_outcome.best
}

fn solve_ga(
    instance: &Instance,
    workers: usize,
    base_seed: Option<u64>,
    config: &GaConfig,
    population_size: usize,
    trace_file: Option<&str>,
) -> Solution {
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for worker_index in 0..workers {
            let tx = tx.clone();
            let config = config.clone();
            scope.spawn(move || {
                let mut rng = worker_seed(base_seed, worker_index);
                let initial_population = genetic::random_population(instance, population_size, &mut rng);
                let outcome = genetic::run(initial_population, instance, &config, &mut rng);
                tx.send(outcome).expect("main thread dropped the receiver");
            });
        }
        drop(tx);
    });

    let outcomes: Vec<genetic::GaOutcome> = rx.iter().collect();
    let best_outcome = outcomes
        .into_iter()
        .min_by(|a, b| solution::compare(&a.best, &b.best))
        .expect("at least one worker runs");

    if let (Some(path), Some(trace)) = (trace_file, &best_outcome.trace) {
        report::write_ga_trace(path, trace);
    }

    best_outcome.best
}

