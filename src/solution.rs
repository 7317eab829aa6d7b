//! Solution Value (C4): a candidate schedule together with its makespan
//! breakdown, and the single total order (§3.3, §9) used throughout the
//! search — by the Tabu neighborhood iteration, the GA selection
//! tie-breaks, and the multiset bucket ordering alike.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::instance::Instance;
use crate::makespan;
use crate::matrix::OperationMatrix;

/// An operation matrix plus its evaluated makespan breakdown.
#[derive(Debug, Clone)]
pub struct Solution {
    pub matrix: OperationMatrix,
    pub machine_makespans: Vec<f64>,
    pub makespan: f64,
}

impl Solution {
    /// Evaluates `matrix` against `instance` and wraps the result.
    pub fn evaluate(matrix: OperationMatrix, instance: &Instance) -> Self {
        let machine_makespans = makespan::machine_makespans(&matrix, instance);
        let makespan = makespan::makespan(&machine_makespans);
        Self { matrix, machine_makespans, makespan }
    }

    /// Stable hash of the underlying matrix's row representation, used
    /// as the tabu-membership key (§9: hash matrix identity, never
    /// object identity).
    pub fn matrix_key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.matrix.identity_bytes().hash(&mut hasher);
        hasher.finish()
    }
}

/// The sole comparator definition for the §3.3 total order: compare by
/// scalar makespan ascending, and on ties compare `machine_makespans`
/// lexicographically after sorting each in descending order (a flatter
/// load profile wins ties).
pub fn compare(a: &Solution, b: &Solution) -> Ordering {
    match a.makespan.total_cmp(&b.makespan) {
        Ordering::Equal => compare_sorted_desc(&a.machine_makespans, &b.machine_makespans),
        other => other,
    }
}

fn compare_sorted_desc(a: &[f64], b: &[f64]) -> Ordering {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(|x, y| y.total_cmp(x));
    b.sort_by(|x, y| y.total_cmp(x));
    for (x, y) in a.iter().zip(b.iter()) {
        match x.total_cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == Ordering::Equal
    }
}

impl Eq for Solution {}

impl PartialOrd for Solution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(compare(self, other))
    }
}

impl Ord for Solution {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}
