//! Tabu Driver (C7): iterative tabu search with aspiration and a
//! stagnation-break diversification jump (§4.3).

use std::time::{Duration, Instant};

use rand::Rng;

use crate::containers::TabuList;
use crate::instance::Instance;
use crate::neighbor;
use crate::solution::{self, Solution};

const STAGNATION_THRESHOLD: u32 = 100;
const DIVERSIFICATION_BUCKET_RANGE: std::ops::RangeInclusive<usize> = 10..=25;

/// Tunable parameters for a Tabu Search run (§4.3, §6.3).
#[derive(Debug, Clone)]
pub struct TabuConfig {
    pub search_time: Duration,
    pub tabu_size: usize,
    pub neighborhood_size: usize,
    pub neighborhood_wait: Duration,
    pub probability_change_machine: f64,
    pub benchmark: bool,
}

/// One row of the optional per-iteration trace.
#[derive(Debug, Clone, Copy)]
pub struct TraceEntry {
    pub neighborhood_size: usize,
    pub tabu_size: usize,
    pub seed_makespan: f64,
    pub best_makespan: f64,
}

/// Result of a Tabu Search run: the best solution found, plus the
/// per-iteration trace when `config.benchmark` is set.
#[derive(Debug)]
pub struct TabuOutcome {
    pub best: Solution,
    pub trace: Vec<TraceEntry>,
}

/// Runs Tabu Search from `initial` until `config.search_time` elapses.
/// Never aborts: an empty neighborhood for a given iteration is simply
/// skipped (§4.3's termination/failure rules).
pub fn search<R: Rng + ?Sized>(
    initial: Solution,
    instance: &Instance,
    config: &TabuConfig,
    rng: &mut R,
) -> TabuOutcome {
    let mut seed = initial.clone();
    let mut best = initial.clone();
    let mut tabu = TabuList::new(config.tabu_size, initial);
    let mut stagnation_counter: u32 = 0;
    let mut stagnation_reference = seed.machine_makespans.clone();
    let mut trace = Vec::new();

    let deadline = Instant::now() + config.search_time;
    while Instant::now() < deadline {
        let mut neighborhood = match neighbor::generate_neighborhood(
            &seed,
            config.probability_change_machine,
            instance,
            config.neighborhood_size,
            config.neighborhood_wait,
            rng,
        ) {
            Ok(neighborhood) => neighborhood,
            Err(_) => {
                log::warn!("generated neighborhood is empty, seed makespan {}", seed.makespan);
                Vec::new()
            }
        };
        neighborhood.sort_by(solution::compare);

        if let Some(selected) = select_move(&neighborhood, &tabu, &best) {
            log::trace!("selected move with makespan {}", selected.makespan);
            seed = selected;
            tabu.enqueue(seed.clone());
        }

        if seed < best {
            best = seed.clone();
            log::debug!("new best makespan {}", best.makespan);
        }

        stagnation_counter += 1;
        if stagnation_counter >= STAGNATION_THRESHOLD {
            if seed.machine_makespans == stagnation_reference {
                if let Some(jump) = diversification_jump(&neighborhood, rng) {
                    log::debug!("stagnation detected, diversification jump to makespan {}", jump.makespan);
                    seed = jump;
                }
            }
            stagnation_counter = 0;
            stagnation_reference = seed.machine_makespans.clone();
        }

        if config.benchmark {
            trace.push(TraceEntry {
                neighborhood_size: neighborhood.len(),
                tabu_size: tabu.len(),
                seed_makespan: seed.makespan,
                best_makespan: best.makespan,
            });
        }
    }

    TabuOutcome { best, trace }
}

/// Selects the first non-tabu neighbor in ascending §3.3 order, or, if
/// every neighbor is tabu, the first one that beats `best` (aspiration).
fn select_move(sorted_neighborhood: &[Solution], tabu: &TabuList, best: &Solution) -> Option<Solution> {
    for neighbor in sorted_neighborhood {
        if !tabu.contains(neighbor) {
            return Some(neighbor.clone());
        }
    }
    sorted_neighborhood.iter().find(|n| solution::compare(n, best) == std::cmp::Ordering::Less).cloned()
}

/// Groups an already-sorted-by-makespan neighborhood into contiguous
/// equal-makespan buckets, mirroring `SolutionMultiset`'s bucketing.
fn bucket_by_makespan(sorted_neighborhood: &[Solution]) -> Vec<&[Solution]> {
    let mut buckets = Vec::new();
    let mut start = 0;
    for i in 1..=sorted_neighborhood.len() {
        if i == sorted_neighborhood.len() || sorted_neighborhood[i].makespan != sorted_neighborhood[start].makespan {
            buckets.push(&sorted_neighborhood[start..i]);
            start = i;
        }
    }
    buckets
}

/// Picks a uniformly random element from bucket index `r` of the sorted
/// neighborhood, `r` drawn from `[10, 25]` and clamped to the last
/// available bucket (§4.3, §9 Open Question: the source does not guard
/// against neighborhoods smaller than 26 buckets).
fn diversification_jump<R: Rng + ?Sized>(sorted_neighborhood: &[Solution], rng: &mut R) -> Option<Solution> {
    let buckets = bucket_by_makespan(sorted_neighborhood);
    if buckets.is_empty() {
        return None;
    }
    let r = rng.random_range(DIVERSIFICATION_BUCKET_RANGE);
    let bucket = buckets[r.min(buckets.len() - 1)];
    Some(bucket[rng.random_range(0..bucket.len())].clone())
}
