//! Reporting (C13): writes the optional per-iteration benchmark traces
//! produced by the Tabu and GA drivers out to CSV.

use std::collections::HashMap;

use crate::genetic::GaTrace;
use crate::tabu::TraceEntry;

/// Writes a Tabu Search benchmark trace to `path`, one row per
/// iteration: `neighborhood_size,tabu_size,seed_makespan,best_makespan`.
pub fn write_tabu_trace(path: &str, trace: &[TraceEntry]) {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap_or_else(|e| panic!("could not write tabu trace CSV {path}: {e:#?}"));

    wtr.write_record(["neighborhood_size", "tabu_size", "seed_makespan", "best_makespan"])
        .expect("could not write tabu trace header");
    for entry in trace {
        wtr.write_record([
            entry.neighborhood_size.to_string(),
            entry.tabu_size.to_string(),
            entry.seed_makespan.to_string(),
            entry.best_makespan.to_string(),
        ])
        .expect("could not write tabu trace row");
    }
    wtr.flush().expect("could not flush tabu trace CSV");
}

/// Writes a GA benchmark trace to `path`, one row per generation:
/// `generation,best_makespan,avg_makespan,min_makespan`. `min_makespan` is
/// sparse: it carries a value only on generations where
/// `GaTrace::min_makespan_coordinates` records a new best (§6.2's
/// "min-makespan coordinates"), and is left empty otherwise.
pub fn write_ga_trace(path: &str, trace: &GaTrace) {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap_or_else(|e| panic!("could not write GA trace CSV {path}: {e:#?}"));

    let min_makespan_by_generation: HashMap<usize, f64> =
        trace.min_makespan_coordinates.iter().copied().collect();

    wtr.write_record(["generation", "best_makespan", "avg_makespan", "min_makespan"])
        .expect("could not write GA trace header");
    for (generation, (best, avg)) in trace
        .best_solution_makespan_v_iter
        .iter()
        .zip(trace.avg_population_makespan_v_iter.iter())
        .enumerate()
    {
        let min_makespan = match min_makespan_by_generation.get(&generation) {
            Some(value) => value.to_string(),
            None => String::new(),
        };
        wtr.write_record([generation.to_string(), best.to_string(), avg.to_string(), min_makespan])
            .expect("could not write GA trace row");
    }
    wtr.flush().expect("could not flush GA trace CSV");
}
