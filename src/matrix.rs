//! Operation Matrix (C2): the canonical schedule encoding of §3.2 and its
//! feasibility invariants.

use crate::error::CoreError;
use crate::instance::Instance;

/// One task execution slot: which task, where it sits in its job, and
/// which machine it is assigned to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationRow {
    pub job_id: usize,
    pub task_id: usize,
    pub sequence_number: usize,
    pub machine_id: usize,
}

/// A finite ordered sequence of operation rows, one per task execution
/// slot, encoding a candidate schedule: row order is a topological
/// linearization of per-job precedence, the machine column encodes
/// assignment. No start times are stored; `makespan::evaluate` computes
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationMatrix {
    rows: Vec<OperationRow>,
}

impl OperationMatrix {
    /// Builds a matrix from rows already produced elsewhere (neighbor
    /// generation, crossover), checking all §3.2 invariants.
    ///
    /// # Errors
    /// Returns `CoreError::CoverageViolation` if some `(job_id, task_id)`
    /// is missing or duplicated, `CoreError::IncompatibleMachine` if a
    /// row's `machine_id` is not in the task's compatible set, or
    /// `CoreError::OrderViolation` if intra-job order (§3.2) is broken.
    pub fn new(rows: Vec<OperationRow>, instance: &Instance) -> Result<Self, CoreError> {
        if rows.len() != instance.task_count() {
            return Err(CoreError::CoverageViolation);
        }

        let mut seen = vec![false; instance.task_count()];
        let mut last_seq = vec![None; instance.job_count];
        for row in &rows {
            let encoded = instance.encode((row.job_id, row.task_id));
            if std::mem::replace(&mut seen[encoded], true) {
                return Err(CoreError::CoverageViolation);
            }

            let task = &instance.tasks[encoded];
            if !task.allowed.contains(&row.machine_id) {
                return Err(CoreError::IncompatibleMachine);
            }

            if let Some(prev_seq) = last_seq[row.job_id] {
                if row.sequence_number < prev_seq {
                    return Err(CoreError::OrderViolation);
                }
            }
            last_seq[row.job_id] = Some(row.sequence_number);
        }
        if seen.iter().any(|&covered| !covered) {
            return Err(CoreError::CoverageViolation);
        }

        Ok(Self { rows })
    }

    /// Builds a matrix directly from an instance's task table, placing
    /// every job's tasks in sequence order and assigning each task to
    /// its first compatible machine. Always feasible.
    pub fn identity(instance: &Instance) -> Self {
        let mut by_job: Vec<Vec<&crate::instance::Task>> = vec![Vec::new(); instance.job_count];
        for task in &instance.tasks {
            by_job[task.job_id].push(task);
        }
        for tasks in &mut by_job {
            tasks.sort_by_key(|t| t.sequence_number);
        }

        let rows = by_job
            .into_iter()
            .flatten()
            .map(|task| OperationRow {
                job_id: task.job_id,
                task_id: task.task_id,
                sequence_number: task.sequence_number,
                machine_id: task.allowed[0],
            })
            .collect::<Vec<_>>();

        Self::new(rows, instance).expect("identity matrix must be feasible")
    }

    #[inline]
    pub fn rows(&self) -> &[OperationRow] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Byte representation of the row sequence, used as a stable hash
    /// key for tabu membership (matrix identity, not object identity —
    /// see §9).
    pub fn identity_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.rows.len() * 32);
        for row in &self.rows {
            bytes.extend_from_slice(&row.job_id.to_le_bytes());
            bytes.extend_from_slice(&row.task_id.to_le_bytes());
            bytes.extend_from_slice(&row.sequence_number.to_le_bytes());
            bytes.extend_from_slice(&row.machine_id.to_le_bytes());
        }
        bytes
    }

    /// Returns a copy with the row at `row_index` reassigned to
    /// `machine_id`, checked against `instance`.
    pub fn with_machine(
        &self,
        row_index: usize,
        machine_id: usize,
        instance: &Instance,
    ) -> Result<Self, CoreError> {
        let mut rows = self.rows.clone();
        rows[row_index].machine_id = machine_id;
        Self::new(rows, instance)
    }

    /// Returns a copy with the rows at `i` and `j` swapped, checked
    /// against `instance`.
    pub fn with_swapped_rows(
        &self,
        i: usize,
        j: usize,
        instance: &Instance,
    ) -> Result<Self, CoreError> {
        let mut rows = self.rows.clone();
        rows.swap(i, j);
        Self::new(rows, instance)
    }
}
