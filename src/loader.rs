// CSV loading for problem instances (C9, §6.1, §3.6).
//
// Three resources, loaded once at solver start-up and never mutated
// afterwards: the sequence-dependency setup matrix, the machine speed
// vector, and the job/task table. Malformed input is a fatal
// `MalformedInstance` (§7), surfaced as a panic with the offending row,
// matching the teacher's `files.rs`.

use csv::ReaderBuilder;

use crate::instance::{Instance, Task};

/// Reads the three instance CSVs and builds an `Instance`.
///
/// `job_tasks_path` rows are `job_id,task_id,sequence_number,usable_machines,pieces`
/// where `usable_machines` is a `|`-separated list of machine indices.
/// `machine_speeds_path` is a single row of `M` positive reals.
/// `sequence_dependency_matrix_path` is a square, headerless matrix of
/// non-negative reals with one row/column per task, in the same order
/// as `job_tasks_path`.
pub fn read(
    sequence_dependency_matrix_path: &str,
    machine_speeds_path: &str,
    job_tasks_path: &str,
) -> Instance {
    let tasks = read_tasks(job_tasks_path);
    let machine_speed = read_machine_speeds(machine_speeds_path);
    let setup = read_setup_matrix(sequence_dependency_matrix_path, tasks.len());

    Instance::new(machine_speed, tasks, setup)
}

fn read_tasks(path: &str) -> Vec<Task> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap_or_else(|e| panic!("could not read job/task CSV {path}: {e:#?}"));

    rdr.records()
        .enumerate()
        .map(|(index, record)| {
            let row = index + 1;
            let record = record.unwrap_or_else(|e| panic!("cannot parse job/task row {row}: {e:#?}"));
            let job_id = record
                .get(0)
                .unwrap_or_else(|| panic!("missing job_id in job/task row {row}"))
                .parse()
                .unwrap_or_else(|e| panic!("bad job_id in job/task row {row}: {e:#?}"));
            let task_id = record
                .get(1)
                .unwrap_or_else(|| panic!("missing task_id in job/task row {row}"))
                .parse()
                .unwrap_or_else(|e| panic!("bad task_id in job/task row {row}: {e:#?}"));
            let sequence_number = record
                .get(2)
                .unwrap_or_else(|| panic!("missing sequence_number in job/task row {row}"))
                .parse()
                .unwrap_or_else(|e| panic!("bad sequence_number in job/task row {row}: {e:#?}"));
            let allowed = record
                .get(3)
                .unwrap_or_else(|| panic!("missing usable_machines in job/task row {row}"))
                .split('|')
                .map(|cell| {
                    cell.trim()
                        .parse()
                        .unwrap_or_else(|e| panic!("bad machine id in job/task row {row}: {e:#?}"))
                })
                .collect();
            let pieces = record
                .get(4)
                .unwrap_or_else(|| panic!("missing pieces in job/task row {row}"))
                .parse()
                .unwrap_or_else(|e| panic!("bad pieces in job/task row {row}: {e:#?}"));

            Task { job_id, task_id, sequence_number, pieces, allowed }
        })
        .collect()
}

fn read_machine_speeds(path: &str) -> Vec<f64> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap_or_else(|e| panic!("could not read machine speeds CSV {path}: {e:#?}"));
    let record = rdr
        .records()
        .next()
        .unwrap_or_else(|| panic!("machine speeds CSV {path} has no rows"))
        .unwrap_or_else(|e| panic!("cannot parse machine speeds row: {e:#?}"));

    record
        .iter()
        .enumerate()
        .map(|(column, cell)| {
            cell.parse()
                .unwrap_or_else(|e| panic!("bad machine speed in column {column}: {e:#?}"))
        })
        .collect()
}

fn read_setup_matrix(path: &str, expected_size: usize) -> Vec<Vec<f64>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap_or_else(|e| panic!("could not read setup matrix CSV {path}: {e:#?}"));

    let matrix: Vec<Vec<f64>> = rdr
        .records()
        .enumerate()
        .map(|(index, record)| {
            let row = index + 1;
            let record = record.unwrap_or_else(|e| panic!("cannot parse setup matrix row {row}: {e:#?}"));
            record
                .iter()
                .enumerate()
                .map(|(column, cell)| {
                    cell.parse::<f64>()
                        .unwrap_or_else(|e| panic!("bad setup value at row {row} column {column}: {e:#?}"))
                })
                .collect()
        })
        .collect();

    assert_eq!(
        matrix.len(),
        expected_size,
        "setup matrix has {} rows, expected {expected_size} (one per task)",
        matrix.len()
    );

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("sdst_jssp_loader_test_{name}_{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        path
    }

    #[test]
    fn reads_a_small_instance() {
        let job_tasks = write_temp("tasks", "0,0,0,0|1,4\n0,1,1,0,6\n1,0,0,1,3\n");
        let machine_speeds = write_temp("speeds", "1,2\n");
        let setup = write_temp("setup", "0,0,0\n0,0,0\n0,0,0\n");

        let instance = read(
            setup.to_str().unwrap(),
            machine_speeds.to_str().unwrap(),
            job_tasks.to_str().unwrap(),
        );

        assert_eq!(instance.task_count(), 3);
        assert_eq!(instance.machine_count, 2);
        assert_eq!(instance.task((0, 0)).allowed, vec![0, 1]);

        let _ = std::fs::remove_file(job_tasks);
        let _ = std::fs::remove_file(machine_speeds);
        let _ = std::fs::remove_file(setup);
    }

    #[test]
    #[should_panic(expected = "setup matrix has")]
    fn rejects_mismatched_setup_matrix_size() {
        let job_tasks = write_temp("tasks2", "0,0,0,0,4\n");
        let machine_speeds = write_temp("speeds2", "1\n");
        let setup = write_temp("setup2", "0,0\n0,0\n");

        read(setup.to_str().unwrap(), machine_speeds.to_str().unwrap(), job_tasks.to_str().unwrap());

        let _ = std::fs::remove_file(job_tasks);
        let _ = std::fs::remove_file(machine_speeds);
        let _ = std::fs::remove_file(setup);
    }
}
