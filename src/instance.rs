//! Problem Instance (C1): immutable holder of machine speeds, the
//! sequence-dependent setup matrix and the job/task table. Built once by
//! the loader or the generator and shared by reference for the lifetime
//! of a solver run.

use std::collections::HashMap;

/// Identifies a task execution slot by the job it belongs to and its
/// position within that job.
pub type TaskId = (usize, usize);

/// A single task: its workload and the machines it may run on.
#[derive(Debug, Clone)]
pub struct Task {
    pub job_id: usize,
    pub task_id: usize,
    /// Position of this task within its job (0-based).
    pub sequence_number: usize,
    /// Work units required to complete the task.
    pub pieces: f64,
    /// Machines this task may be assigned to.
    pub allowed: Vec<usize>,
}

/// An immutable problem instance: machine speeds, the sequence-dependent
/// setup matrix, and the job/task table.
#[derive(Debug)]
pub struct Instance {
    /// Number of machines.
    pub machine_count: usize,
    /// Work units per time unit, one entry per machine.
    pub machine_speed: Vec<f64>,
    /// Every task across every job, in no particular order other than
    /// however the loader or generator produced them.
    pub tasks: Vec<Task>,
    /// `(job_id, task_id) -> index into `tasks``.
    pub task_index: HashMap<TaskId, usize>,
    /// `setup[a][b]` is the sequence-dependent setup time incurred when
    /// the task encoded at row `b` runs immediately after the task
    /// encoded at row `a` on the same machine. Indexed by the same row
    /// index as `tasks`.
    pub setup: Vec<Vec<f64>>,
    /// Number of distinct jobs.
    pub job_count: usize,
}

impl Instance {
    /// Builds an instance from its three tables, validating the
    /// invariants a loader or generator must uphold.
    ///
    /// # Panics
    /// Panics with a descriptive message (`MalformedInstance`, §7) if the
    /// tables are inconsistent: duplicate `(job_id, task_id)` pairs, an
    /// empty `allowed` set, a non-positive machine speed, a negative
    /// setup entry, or a setup matrix whose dimensions don't match the
    /// task count.
    pub fn new(machine_speed: Vec<f64>, tasks: Vec<Task>, setup: Vec<Vec<f64>>) -> Self {
        assert!(!machine_speed.is_empty(), "machine_speed must be non-empty");
        for (m, speed) in machine_speed.iter().enumerate() {
            assert!(*speed > 0.0, "machine {m} has non-positive speed {speed}");
        }

        let machine_count = machine_speed.len();
        let mut task_index = HashMap::with_capacity(tasks.len());
        for (row, task) in tasks.iter().enumerate() {
            assert!(!task.allowed.is_empty(), "task {:?} has no compatible machines", (task.job_id, task.task_id));
            for &m in &task.allowed {
                assert!(m < machine_count, "task {:?} references unknown machine {m}", (task.job_id, task.task_id));
            }
            let key = (task.job_id, task.task_id);
            let prior = task_index.insert(key, row);
            assert!(prior.is_none(), "duplicate task id {key:?} in job/task table");
        }

        assert_eq!(setup.len(), tasks.len(), "setup matrix row count must match task count");
        for row in &setup {
            assert_eq!(row.len(), tasks.len(), "setup matrix must be square");
            for &value in row {
                assert!(value >= 0.0, "setup matrix entries must be non-negative, got {value}");
            }
        }

        let job_count = tasks.iter().map(|t| t.job_id).max().map_or(0, |max| max + 1);

        Self {
            machine_count,
            machine_speed,
            tasks,
            task_index,
            setup,
            job_count,
        }
    }

    /// Total number of task rows across all jobs.
    #[inline]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Row index of a `(job_id, task_id)` pair in `tasks`/`setup`.
    #[inline]
    pub fn encode(&self, task_id: TaskId) -> usize {
        self.task_index[&task_id]
    }

    /// The task record for a `(job_id, task_id)` pair.
    #[inline]
    pub fn task(&self, task_id: TaskId) -> &Task {
        &self.tasks[self.encode(task_id)]
    }

    /// Number of tasks belonging to a given job.
    pub fn job_task_count(&self, job_id: usize) -> usize {
        self.tasks.iter().filter(|t| t.job_id == job_id).count()
    }

    /// Sequence-dependent setup time incurred when `curr` runs
    /// immediately after `prev` on the same machine.
    #[inline]
    pub fn setup_time(&self, prev: TaskId, curr: TaskId) -> f64 {
        self.setup[self.encode(prev)][self.encode(curr)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_instance() -> Instance {
        let tasks = vec![
            Task { job_id: 0, task_id: 0, sequence_number: 0, pieces: 10.0, allowed: vec![0, 1] },
            Task { job_id: 0, task_id: 1, sequence_number: 1, pieces: 5.0, allowed: vec![0] },
            Task { job_id: 1, task_id: 0, sequence_number: 0, pieces: 8.0, allowed: vec![1] },
        ];
        let setup = vec![vec![0.0; 3]; 3];
        Instance::new(vec![2.0, 4.0], tasks, setup)
    }

    #[test]
    fn encodes_task_rows() {
        let instance = tiny_instance();
        assert_eq!(instance.encode((0, 0)), 0);
        assert_eq!(instance.encode((1, 0)), 2);
        assert_eq!(instance.task_count(), 3);
        assert_eq!(instance.job_count, 2);
    }

    #[test]
    #[should_panic(expected = "duplicate task id")]
    fn rejects_duplicate_tasks() {
        let tasks = vec![
            Task { job_id: 0, task_id: 0, sequence_number: 0, pieces: 1.0, allowed: vec![0] },
            Task { job_id: 0, task_id: 0, sequence_number: 0, pieces: 1.0, allowed: vec![0] },
        ];
        Instance::new(vec![1.0], tasks, vec![vec![0.0; 2]; 2]);
    }

    #[test]
    #[should_panic(expected = "no compatible machines")]
    fn rejects_empty_allowed_set() {
        let tasks = vec![Task { job_id: 0, task_id: 0, sequence_number: 0, pieces: 1.0, allowed: vec![] }];
        Instance::new(vec![1.0], tasks, vec![vec![0.0]]);
    }

    #[test]
    #[should_panic(expected = "non-positive speed")]
    fn rejects_non_positive_speed() {
        let tasks = vec![Task { job_id: 0, task_id: 0, sequence_number: 0, pieces: 1.0, allowed: vec![0] }];
        Instance::new(vec![0.0], tasks, vec![vec![0.0]]);
    }
}
