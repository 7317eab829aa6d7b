//! Makespan Evaluator (C3): deterministic per-machine completion-time
//! computation from an operation matrix, including sequence-dependent
//! setups (§4.1).

use crate::instance::Instance;
use crate::matrix::OperationMatrix;

/// Computes `machineMakespans[0..M)` for a feasible operation matrix.
///
/// Iterates rows in order, maintaining per-machine ready times, per-job
/// ready times, and the last task run on each machine, exactly as §4.1
/// describes. All arithmetic is `f64` and performed in row order, so
/// results are bit-identical for a fixed matrix and instance.
pub fn machine_makespans(matrix: &OperationMatrix, instance: &Instance) -> Vec<f64> {
    let mut machine_ready = vec![0.0_f64; instance.machine_count];
    let mut job_ready = vec![0.0_f64; instance.job_count];
    let mut last_task_on_machine: Vec<Option<(usize, usize)>> = vec![None; instance.machine_count];

    for row in matrix.rows() {
        step(
            row.job_id,
            row.task_id,
            row.machine_id,
            instance,
            &mut machine_ready,
            &mut job_ready,
            &mut last_task_on_machine,
        );
    }

    machine_ready
}

#[inline]
fn step(
    job_id: usize,
    task_id: usize,
    machine_id: usize,
    instance: &Instance,
    machine_ready: &mut [f64],
    job_ready: &mut [f64],
    last_task_on_machine: &mut [Option<(usize, usize)>],
) {
    let task = instance.task((job_id, task_id));
    let runtime = task.pieces / instance.machine_speed[machine_id];

    let setup_time = match last_task_on_machine[machine_id] {
        None => 0.0,
        Some(prev) => instance.setup_time(prev, (job_id, task_id)),
    };

    let start = machine_ready[machine_id].max(job_ready[job_id]);
    let end = start + setup_time + runtime;

    machine_ready[machine_id] = end;
    job_ready[job_id] = end;
    last_task_on_machine[machine_id] = Some((job_id, task_id));
}

/// The scalar makespan: the maximum across `machineMakespans`.
///
/// # Panics
/// Panics if `machine_makespans` is empty (an instance always has at
/// least one machine, per `Instance::new`).
#[inline]
pub fn makespan(machine_makespans: &[f64]) -> f64 {
    machine_makespans
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}
