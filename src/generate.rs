// Small helper functions to generate random instances of the SDST-JSSP
// (C10), and to write them back out to the three CSV resources C9 reads.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::instance::{Instance, Task};

/// Generates a randomized instance with `job_count` jobs and
/// `machine_count` machines. Each job gets a random number of tasks in
/// `[min_tasks, max_tasks]`; each task's pieces are drawn from
/// `[min_pieces, max_pieces]`, and it is made compatible with a random
/// subset of `[min_allowed, max_allowed]` machines. Setup times are
/// drawn uniformly from `[min_setup, max_setup]`.
#[expect(clippy::too_many_arguments)]
pub fn instance(
    job_count: usize,
    machine_count: usize,
    min_tasks: usize,
    max_tasks: usize,
    min_pieces: f64,
    max_pieces: f64,
    min_allowed: usize,
    max_allowed: usize,
    min_setup: f64,
    max_setup: f64,
) -> Instance {
    let machine_speed = machine_speeds(machine_count);
    let tasks = tasks(job_count, machine_count, min_tasks, max_tasks, min_pieces, max_pieces, min_allowed, max_allowed);
    let setup = setup_matrix(tasks.len(), min_setup, max_setup);
    Instance::new(machine_speed, tasks, setup)
}

fn machine_speeds(machine_count: usize) -> Vec<f64> {
    (0..machine_count).map(|_| rand::rng().random_range(0.5..2.0)).collect()
}

#[expect(clippy::too_many_arguments)]
fn tasks(
    job_count: usize,
    machine_count: usize,
    min_tasks: usize,
    max_tasks: usize,
    min_pieces: f64,
    max_pieces: f64,
    min_allowed: usize,
    max_allowed: usize,
) -> Vec<Task> {
    (0..job_count)
        .flat_map(|job_id| {
            let task_count = rand::rng().random_range(min_tasks..=max_tasks);
            (0..task_count).map(move |task_id| (job_id, task_id))
        })
        .map(|(job_id, task_id)| {
            let pieces = rand::rng().random_range(min_pieces..=max_pieces);
            let allowed_count = rand::rng().random_range(min_allowed..=max_allowed.min(machine_count)).max(1);
            let mut machines: Vec<usize> = (0..machine_count).collect();
            machines.shuffle(&mut rand::rng());
            let allowed = machines.into_iter().take(allowed_count).collect();
            Task { job_id, task_id, sequence_number: task_id, pieces, allowed }
        })
        .collect()
}

fn setup_matrix(size: usize, min_setup: f64, max_setup: f64) -> Vec<Vec<f64>> {
    (0..size)
        .map(|_| (0..size).map(|_| rand::rng().random_range(min_setup..=max_setup)).collect())
        .collect()
}

/// Writes an `Instance` to the three CSV resources `loader::read` expects.
pub fn write(
    sequence_dependency_matrix_path: &str,
    machine_speeds_path: &str,
    job_tasks_path: &str,
    instance: &Instance,
) {
    let mut speeds_wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(machine_speeds_path)
        .expect("could not write machine speeds CSV");
    speeds_wtr
        .write_record(instance.machine_speed.iter().map(f64::to_string))
        .expect("could not write machine speeds row");
    speeds_wtr.flush().expect("could not flush machine speeds CSV");

    let mut tasks_wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(job_tasks_path)
        .expect("could not write job/task CSV");
    for task in &instance.tasks {
        let allowed = task.allowed.iter().map(usize::to_string).collect::<Vec<_>>().join("|");
        tasks_wtr
            .write_record([
                task.job_id.to_string(),
                task.task_id.to_string(),
                task.sequence_number.to_string(),
                allowed,
                task.pieces.to_string(),
            ])
            .expect("could not write job/task row");
    }
    tasks_wtr.flush().expect("could not flush job/task CSV");

    let mut setup_wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(sequence_dependency_matrix_path)
        .expect("could not write setup matrix CSV");
    for row in &instance.setup {
        setup_wtr
            .write_record(row.iter().map(f64::to_string))
            .expect("could not write setup matrix row");
    }
    setup_wtr.flush().expect("could not flush setup matrix CSV");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::OperationMatrix;

    #[test]
    fn generated_instance_has_requested_shape() {
        let instance = instance(4, 3, 2, 5, 1.0, 10.0, 1, 3, 0.0, 2.0);
        assert_eq!(instance.machine_count, 3);
        assert_eq!(instance.job_count, 4);
        assert!(instance.task_count() >= 8);
    }

    #[test]
    fn generated_instance_is_immediately_feasible() {
        let instance = instance(3, 2, 1, 3, 1.0, 5.0, 1, 2, 0.0, 1.0);
        let _ = OperationMatrix::identity(&instance);
    }

    #[test]
    fn round_trips_through_csv() {
        let instance = instance(2, 2, 1, 2, 1.0, 5.0, 1, 2, 0.0, 1.0);
        let mut setup_path = std::env::temp_dir();
        setup_path.push(format!("sdst_jssp_gen_setup_{}.csv", std::process::id()));
        let mut speeds_path = std::env::temp_dir();
        speeds_path.push(format!("sdst_jssp_gen_speeds_{}.csv", std::process::id()));
        let mut tasks_path = std::env::temp_dir();
        tasks_path.push(format!("sdst_jssp_gen_tasks_{}.csv", std::process::id()));

        write(
            setup_path.to_str().unwrap(),
            speeds_path.to_str().unwrap(),
            tasks_path.to_str().unwrap(),
            &instance,
        );

        let reloaded = crate::loader::read(
            setup_path.to_str().unwrap(),
            speeds_path.to_str().unwrap(),
            tasks_path.to_str().unwrap(),
        );
        assert_eq!(reloaded.task_count(), instance.task_count());
        assert_eq!(reloaded.machine_count, instance.machine_count);

        let _ = std::fs::remove_file(setup_path);
        let _ = std::fs::remove_file(speeds_path);
        let _ = std::fs::remove_file(tasks_path);
    }
}
