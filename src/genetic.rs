//! Genetic Driver (C8): population-based search with three selection
//! variants, job-aligned two-point crossover, and machine-reassignment
//! mutation (§4.4).

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::instance::Instance;
use crate::matrix::{OperationMatrix, OperationRow};
use crate::solution::{self, Solution};

/// Parent-selection policy (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMethod {
    Tournament,
    FitnessProportionate,
    Random,
}

/// GA termination condition (§4.4, §6.3): either a fixed generation
/// count or a wall-clock budget.
#[derive(Debug, Clone, Copy)]
pub enum Termination {
    Iterations(usize),
    Runtime(Duration),
}

/// Tunable parameters for a GA run.
#[derive(Debug, Clone)]
pub struct GaConfig {
    pub mutation_probability: f64,
    /// Tournament draw size; unused by `FitnessProportionate`/`Random`.
    pub selection_size: usize,
    pub selection_method: SelectionMethod,
    pub termination: Termination,
    pub benchmark: bool,
}

/// Optional per-generation benchmark trace (§4.4, §6.2).
#[derive(Debug, Default)]
pub struct GaTrace {
    pub best_solution_makespan_v_iter: Vec<f64>,
    pub avg_population_makespan_v_iter: Vec<f64>,
    /// `(generation, makespan)` pairs recorded whenever a new global best
    /// is found.
    pub min_makespan_coordinates: Vec<(usize, f64)>,
}

/// Result of a GA run.
#[derive(Debug)]
pub struct GaOutcome {
    pub best: Solution,
    pub initial_population: Vec<Solution>,
    pub result_population: Vec<Solution>,
    pub trace: Option<GaTrace>,
}

/// Builds a random initial population of `size` individuals by starting
/// from the identity matrix and reassigning each task's machine
/// uniformly at random among its compatible machines.
pub fn random_population<R: Rng + ?Sized>(instance: &Instance, size: usize, rng: &mut R) -> Vec<Solution> {
    (0..size)
        .map(|_| {
            let rows = instance
                .tasks
                .iter()
                .map(|task| OperationRow {
                    job_id: task.job_id,
                    task_id: task.task_id,
                    sequence_number: task.sequence_number,
                    machine_id: task.allowed[rng.random_range(0..task.allowed.len())],
                })
                .collect::<Vec<_>>();
            // Rows are built in task-table order; restore per-job
            // sequence order before evaluating, since that order is the
            // only invariant the matrix requires.
            let mut by_job: Vec<Vec<OperationRow>> = vec![Vec::new(); instance.job_count];
            for row in rows {
                by_job[row.job_id].push(row);
            }
            for job_rows in &mut by_job {
                job_rows.sort_by_key(|r| r.sequence_number);
            }
            let ordered: Vec<OperationRow> = by_job.into_iter().flatten().collect();
            let matrix = OperationMatrix::new(ordered, instance).expect("random assignment preserves order and coverage");
            Solution::evaluate(matrix, instance)
        })
        .collect()
}

/// Runs the GA from `initial_population` until `config.termination` is
/// reached.
///
/// # Panics
/// Panics if `initial_population` is empty.
pub fn run<R: Rng + ?Sized>(
    initial_population: Vec<Solution>,
    instance: &Instance,
    config: &GaConfig,
    rng: &mut R,
) -> GaOutcome {
    assert!(!initial_population.is_empty(), "initial population must be non-empty");

    let mut population = initial_population.clone();
    let mut best = population_best(&population).clone();
    let mut trace = GaTrace::default();

    let deadline = match config.termination {
        Termination::Runtime(d) => Some(Instant::now() + d),
        Termination::Iterations(_) => None,
    };

    let mut generation = 0;
    loop {
        let done = match config.termination {
            Termination::Iterations(n) => generation >= n,
            Termination::Runtime(_) => Instant::now() >= deadline.expect("runtime termination sets a deadline"),
        };
        if done {
            break;
        }

        population = evolve_generation(&population, instance, config, rng);
        let gen_best = population_best(&population);
        if solution::compare(gen_best, &best) == Ordering::Less {
            best = gen_best.clone();
            log::debug!("generation {generation}: new best makespan {}", best.makespan);
            if config.benchmark {
                trace.min_makespan_coordinates.push((generation, best.makespan));
            }
        }

        if config.benchmark {
            trace.best_solution_makespan_v_iter.push(best.makespan);
            let avg = population.iter().map(|s| s.makespan).sum::<f64>() / population.len() as f64;
            trace.avg_population_makespan_v_iter.push(avg);
        }

        generation += 1;
    }

    GaOutcome {
        best,
        initial_population,
        result_population: population,
        trace: if config.benchmark { Some(trace) } else { None },
    }
}

fn population_best(population: &[Solution]) -> &Solution {
    population.iter().min_by(|a, b| solution::compare(a, b)).expect("population must be non-empty")
}

fn evolve_generation<R: Rng + ?Sized>(
    population: &[Solution],
    instance: &Instance,
    config: &GaConfig,
    rng: &mut R,
) -> Vec<Solution> {
    (0..population.len())
        .map(|_| loop {
            let (parent_a, parent_b) = select_parents(population, config, rng);
            let mut rows = crossover(&parent_a, &parent_b, instance, rng);
            mutate(&mut rows, instance, config.mutation_probability, rng);
            match OperationMatrix::new(rows, instance) {
                Ok(matrix) => break Solution::evaluate(matrix, instance),
                Err(_) => continue,
            }
        })
        .collect()
}

fn select_parents<R: Rng + ?Sized>(
    population: &[Solution],
    config: &GaConfig,
    rng: &mut R,
) -> (Solution, Solution) {
    match config.selection_method {
        SelectionMethod::Tournament => select_tournament(population, config.selection_size, rng),
        SelectionMethod::FitnessProportionate => select_fitness_proportionate(population, rng),
        SelectionMethod::Random => select_random(population, rng),
    }
}

fn select_tournament<R: Rng + ?Sized>(population: &[Solution], s: usize, rng: &mut R) -> (Solution, Solution) {
    let mut draws: Vec<&Solution> = (0..s).map(|_| &population[rng.random_range(0..population.len())]).collect();
    draws.sort_by(|a, b| solution::compare(a, b));
    (draws[0].clone(), draws[1].clone())
}

fn select_fitness_proportionate<R: Rng + ?Sized>(population: &[Solution], rng: &mut R) -> (Solution, Solution) {
    let weights: Vec<f64> = population.iter().map(|s| 1.0 / s.makespan).collect();
    let idx_a = weighted_pick(&weights, rng);
    let mut remaining = weights.clone();
    remaining[idx_a] = 0.0;
    let idx_b = weighted_pick(&remaining, rng);
    (population[idx_a].clone(), population[idx_b].clone())
}

fn weighted_pick<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.random_range(0..weights.len());
    }
    let mut target = rng.random::<f64>() * total;
    for (i, &w) in weights.iter().enumerate() {
        if target < w {
            return i;
        }
        target -= w;
    }
    weights.len() - 1
}

fn select_random<R: Rng + ?Sized>(population: &[Solution], rng: &mut R) -> (Solution, Solution) {
    let a = &population[rng.random_range(0..population.len())];
    let b = &population[rng.random_range(0..population.len())];
    (a.clone(), b.clone())
}

/// Two-point, job-aligned crossover: the child inherits every row of
/// two randomly chosen jobs from `parent_a` (in `parent_a`'s order) and
/// every other row from `parent_b` (in `parent_b`'s order). Each job's
/// rows come entirely from one parent, so intra-job order is preserved
/// by construction.
fn crossover<R: Rng + ?Sized>(
    parent_a: &Solution,
    parent_b: &Solution,
    instance: &Instance,
    rng: &mut R,
) -> Vec<OperationRow> {
    let job_count = instance.job_count;
    let j1 = rng.random_range(0..job_count);
    let j2 = if job_count > 1 {
        let mut candidate = rng.random_range(0..job_count);
        while candidate == j1 {
            candidate = rng.random_range(0..job_count);
        }
        candidate
    } else {
        j1
    };

    let mut rows: Vec<OperationRow> = parent_a
        .matrix
        .rows()
        .iter()
        .filter(|r| r.job_id == j1 || r.job_id == j2)
        .copied()
        .collect();
    rows.extend(parent_b.matrix.rows().iter().filter(|r| r.job_id != j1 && r.job_id != j2).copied());
    rows
}

/// With probability `mutation_probability`, reassigns one random row's
/// machine to a uniformly random distinct compatible machine. A no-op
/// if the chosen task has only one compatible machine.
fn mutate<R: Rng + ?Sized>(rows: &mut [OperationRow], instance: &Instance, mutation_probability: f64, rng: &mut R) {
    if rng.random::<f64>() >= mutation_probability {
        return;
    }
    let row_index = rng.random_range(0..rows.len());
    let row = rows[row_index];
    let allowed = &instance.task((row.job_id, row.task_id)).allowed;
    if allowed.len() < 2 {
        return;
    }
    let alternatives: Vec<usize> = allowed.iter().copied().filter(|&m| m != row.machine_id).collect();
    rows[row_index].machine_id = alternatives[rng.random_range(0..alternatives.len())];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Task;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_instance() -> Instance {
        let tasks = vec![
            Task { job_id: 0, task_id: 0, sequence_number: 0, pieces: 4.0, allowed: vec![0, 1] },
            Task { job_id: 0, task_id: 1, sequence_number: 1, pieces: 6.0, allowed: vec![0, 1] },
            Task { job_id: 1, task_id: 0, sequence_number: 0, pieces: 3.0, allowed: vec![0, 1] },
            Task { job_id: 1, task_id: 1, sequence_number: 1, pieces: 5.0, allowed: vec![0, 1] },
            Task { job_id: 2, task_id: 0, sequence_number: 0, pieces: 2.0, allowed: vec![0, 1] },
        ];
        Instance::new(vec![1.0, 1.0], tasks, vec![vec![0.0; 5]; 5])
    }

    fn config(method: SelectionMethod, iterations: usize) -> GaConfig {
        GaConfig {
            mutation_probability: 0.3,
            selection_size: 3,
            selection_method: method,
            termination: Termination::Iterations(iterations),
            benchmark: true,
        }
    }

    #[test]
    fn population_cardinality_is_preserved() {
        let instance = small_instance();
        let mut rng = StdRng::seed_from_u64(5);
        let initial = random_population(&instance, 12, &mut rng);
        let outcome = run(initial, &instance, &config(SelectionMethod::Tournament, 20), &mut rng);
        assert_eq!(outcome.result_population.len(), outcome.initial_population.len());
    }

    #[test]
    fn best_beats_every_initial_individual() {
        let instance = small_instance();
        let mut rng = StdRng::seed_from_u64(9);
        let initial = random_population(&instance, 12, &mut rng);
        let outcome = run(initial, &instance, &config(SelectionMethod::FitnessProportionate, 30), &mut rng);
        for individual in &outcome.initial_population {
            assert_ne!(solution::compare(&outcome.best, individual), Ordering::Greater);
        }
    }

    #[test]
    fn random_selection_also_improves_population() {
        let instance = small_instance();
        let mut rng = StdRng::seed_from_u64(13);
        let initial = random_population(&instance, 12, &mut rng);
        let outcome = run(initial, &instance, &config(SelectionMethod::Random, 30), &mut rng);
        for individual in &outcome.initial_population {
            assert_ne!(solution::compare(&outcome.best, individual), Ordering::Greater);
        }
    }

    #[test]
    fn crossover_output_is_always_feasible() {
        let instance = small_instance();
        let mut rng = StdRng::seed_from_u64(21);
        let population = random_population(&instance, 8, &mut rng);
        for _ in 0..100 {
            let (a, b) = select_random(&population, &mut rng);
            let rows = crossover(&a, &b, &instance, &mut rng);
            assert!(OperationMatrix::new(rows, &instance).is_ok());
        }
    }

    #[test]
    fn benchmark_trace_has_one_entry_per_generation() {
        let instance = small_instance();
        let mut rng = StdRng::seed_from_u64(33);
        let initial = random_population(&instance, 6, &mut rng);
        let outcome = run(initial, &instance, &config(SelectionMethod::Tournament, 15), &mut rng);
        let trace = outcome.trace.expect("benchmark was requested");
        assert_eq!(trace.best_solution_makespan_v_iter.len(), 15);
        assert_eq!(trace.avg_population_makespan_v_iter.len(), 15);
    }
}
