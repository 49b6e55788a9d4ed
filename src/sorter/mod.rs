//! Bubble sort step recording
//!
//! The sort runs to completion on a private copy of the input and records
//! every swap it performs. Replaying those swaps in order against the
//! original sequence reproduces the sort one step at a time.

use std::collections::VecDeque;
use std::fmt;

/// What a recorded step did to its two indices.
///
/// Only swaps are recorded; comparisons that leave the pair in place are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Swap,
}

/// A single recorded swap of two adjacent indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub indices: [usize; 2],
    pub kind: StepKind,
}

impl Step {
    /// Swap of `left` and its right neighbour
    pub fn swap(left: usize) -> Self {
        Self {
            indices: [left, left + 1],
            kind: StepKind::Swap,
        }
    }

    /// Whether `index` is one of the two positions this step touches
    pub fn touches(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Apply this step to a slice in place
    pub fn apply<T>(&self, values: &mut [T]) {
        match self.kind {
            StepKind::Swap => values.swap(self.indices[0], self.indices[1]),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StepKind::Swap => write!(f, "swap {} <-> {}", self.indices[0], self.indices[1]),
        }
    }
}

/// Ordered steps produced before playback begins
pub type StepQueue = VecDeque<Step>;

/// Bubble sort a copy of `values` and return every swap performed.
///
/// Passes repeat until one completes without a swap, so an already sorted
/// input yields an empty queue.
pub fn record_bubble_sort(values: &[f64]) -> StepQueue {
    let mut work = values.to_vec();
    let mut steps = StepQueue::new();

    loop {
        let mut swapped = false;
        for i in 1..work.len() {
            if work[i - 1] > work[i] {
                let step = Step::swap(i - 1);
                step.apply(&mut work);
                steps.push_back(step);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }

    steps
}

/// Apply a sequence of steps in order
pub fn apply_steps<'a, T, I>(values: &mut [T], steps: I)
where
    I: IntoIterator<Item = &'a Step>,
{
    for step in steps {
        step.apply(values);
    }
}
