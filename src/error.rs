//! Recoverable error kinds produced by the core (§7).
//!
//! `MalformedInstance` and `InvalidConfiguration` are fatal and are
//! surfaced as panics at load/parse time instead (see `loader.rs` and
//! `main.rs`), matching the teacher's fail-fast style for operator-facing
//! input errors.

use std::fmt;

/// An operation that would violate one of the operation-matrix invariants
/// of §3.2 was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// Construction or mutation of an operation matrix would produce a
    /// row whose `machine_id` is not in the task's compatible set.
    IncompatibleMachine,
    /// Construction or mutation would violate intra-job ordering.
    OrderViolation,
    /// Construction would leave some `(job_id, task_id)` uncovered or
    /// covered more than once.
    CoverageViolation,
    /// The requested move has no candidate to draw from (e.g. a row swap
    /// on a matrix with fewer than two rows).
    NoFeasibleMove,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::IncompatibleMachine => {
                write!(f, "infeasible solution: machine not in compatible set")
            }
            CoreError::OrderViolation => {
                write!(f, "infeasible solution: intra-job order violated")
            }
            CoreError::CoverageViolation => {
                write!(f, "infeasible solution: task coverage violated")
            }
            CoreError::NoFeasibleMove => {
                write!(f, "no feasible move: not enough rows to draw from")
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// Neighborhood generation produced zero feasible candidates within its
/// wait window. Not fatal: the caller skips the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyNeighborhood;

impl fmt::Display for EmptyNeighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "neighborhood generation produced no feasible candidates")
    }
}

impl std::error::Error for EmptyNeighborhood {}
