// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Neighbour Selections
//!
//! A selection owns a queue of units of work (students or requests) and turns
//! one unit at a time into an optional [`Proposal`]. Several solver threads may
//! poll the same selection, so the queue sits behind a mutex and every method
//! takes `&self`; the per-search state lives on the stack of `search`.
//!
//! [`process`] runs one unit end to end and reports the outcome as
//! `Result<Outcome, Retryable>`; [`process_with_retry`] re-runs a unit whose
//! proposal went stale, up to a limit, and then gives up on it for this pass.

use crate::{error::Retryable, neighbour::Proposal, solution::Solution, stats::SelectionStatistics};
use parking_lot::Mutex;
use sectioning_model::index::{RequestId, StudentId};
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkUnit {
    Student(StudentId),
    Request(RequestId),
}

impl std::fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkUnit::Student(s) => write!(f, "{}", s),
            WorkUnit::Request(r) => write!(f, "{}", r),
        }
    }
}

pub trait NeighbourSelection: Send + Sync {
    fn name(&self) -> &str;

    /// Rebuilds the queue for a new pass over the solution. Returns `false`
    /// when the selection has nothing left to do.
    fn init(&self, solution: &Solution<'_>) -> bool;

    /// The next unit of work, `None` once the pass is over.
    fn next_unit(&self, solution: &Solution<'_>) -> Option<WorkUnit>;

    /// Searches one unit. `None` means no improving move was found.
    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal>;

    /// Called after a proposal of this selection was applied.
    fn on_applied(&self, _solution: &Solution<'_>, _unit: WorkUnit, _value: f64) {}

    fn statistics(&self) -> SelectionStatistics;
}

impl std::fmt::Debug for dyn NeighbourSelection + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NeighbourSelection({})", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// A proposal was applied and changed the objective by `value`.
    Applied { value: f64 },
    NoImprovement,
}

/// Searches `unit` and applies the proposal, if any.
pub fn process(
    selection: &dyn NeighbourSelection,
    solution: &Solution<'_>,
    unit: WorkUnit,
) -> Result<Outcome, Retryable> {
    let Some(proposal) = selection.search(solution, unit) else {
        return Ok(Outcome::NoImprovement);
    };
    let value = solution.apply(proposal)?;
    selection.on_applied(solution, unit, value);
    Ok(Outcome::Applied { value })
}

/// [`process`] with up to `retry_limit` retries of stale proposals. `None`
/// when the unit was abandoned.
pub fn process_with_retry(
    selection: &dyn NeighbourSelection,
    solution: &Solution<'_>,
    unit: WorkUnit,
    retry_limit: usize,
) -> Option<Outcome> {
    let mut attempt = 0;
    loop {
        match process(selection, solution, unit) {
            Ok(outcome) => return Some(outcome),
            Err(error) if attempt < retry_limit => {
                attempt += 1;
                tracing::debug!(selection = selection.name(), %unit, attempt, %error, "retrying");
            }
            Err(error) => {
                tracing::debug!(selection = selection.name(), %unit, %error, "giving up");
                return None;
            }
        }
    }
}

/// A queue of units shared by every thread polling a selection.
#[derive(Debug, Default)]
pub struct WorkQueue {
    units: Mutex<VecDeque<WorkUnit>>,
}

impl WorkQueue {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the content of the queue.
    pub fn reset(&self, units: impl IntoIterator<Item = WorkUnit>) {
        let mut queue = self.units.lock();
        queue.clear();
        queue.extend(units);
    }

    #[inline]
    pub fn pop(&self) -> Option<WorkUnit> {
        self.units.lock().pop_front()
    }

    #[inline]
    pub fn push(&self, unit: WorkUnit) {
        self.units.lock().push_back(unit);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.units.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbour::{Neighbour, StudentUnassignNeighbour};
    use sectioning_model::{
        Assignment, Model,
        candidates::enrollments,
        synthetic::{SyntheticParams, generate},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Proposes to unassign the student, with a revision that is stale for
    /// the first `stale` calls.
    struct Flaky {
        queue: WorkQueue,
        stale: AtomicUsize,
        calls: AtomicUsize,
    }

    /// Never consistent, so a stale revision is always rejected.
    #[derive(Debug)]
    struct Never;

    impl Neighbour for Never {
        fn name(&self) -> &str {
            "Never"
        }
        fn student(&self) -> Option<StudentId> {
            None
        }
        fn value(&self, _model: &Model, _assignment: &Assignment) -> f64 {
            0.0
        }
        fn is_consistent(&self, _model: &Model, _assignment: &Assignment) -> bool {
            false
        }
        fn assign(&self, _model: &Model, _assignment: &mut Assignment) {}
    }

    impl NeighbourSelection for Flaky {
        fn name(&self) -> &str {
            "Flaky"
        }

        fn init(&self, solution: &Solution<'_>) -> bool {
            self.queue
                .reset(solution.model().students().ids().map(WorkUnit::Student));
            !self.queue.is_empty()
        }

        fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
            self.queue.pop()
        }

        fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
            let WorkUnit::Student(student) = unit else {
                return None;
            };
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.stale.load(Ordering::SeqCst) {
                return Some(Proposal::new(Box::new(Never), solution.revision() + 1));
            }
            let neighbour = StudentUnassignNeighbour::new(solution.model(), student);
            Some(Proposal::new(Box::new(neighbour), solution.revision()))
        }

        fn statistics(&self) -> SelectionStatistics {
            SelectionStatistics::new()
        }
    }

    fn flaky(stale: usize) -> Flaky {
        Flaky {
            queue: WorkQueue::new(),
            stale: AtomicUsize::new(stale),
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_retry_recovers_from_stale_proposals() {
        let instance = generate(&SyntheticParams::small(2)).unwrap();
        let model = &instance.model;
        let solution = Solution::new(model);
        let r = model.student(StudentId::new(0)).requests()[0];
        let e = enrollments(model, r).into_iter().next().unwrap();
        solution.write().assign(model, e);

        let selection = flaky(2);
        let unit = WorkUnit::Student(StudentId::new(0));
        let outcome = process_with_retry(&selection, &solution, unit, 3);
        assert!(matches!(outcome, Some(Outcome::Applied { value }) if value > 0.0));
        assert_eq!(selection.calls.load(Ordering::SeqCst), 3);
        assert_eq!(solution.read().nr_assigned(), 0);
    }

    #[test]
    fn test_retry_gives_up_after_limit() {
        let instance = generate(&SyntheticParams::small(2)).unwrap();
        let solution = Solution::new(&instance.model);
        let selection = flaky(10);
        let unit = WorkUnit::Student(StudentId::new(1));
        let outcome = process_with_retry(&selection, &solution, unit, 2);
        assert_eq!(outcome, None);
        assert_eq!(selection.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_queue_is_drained_in_order() {
        let instance = generate(&SyntheticParams::small(2)).unwrap();
        let solution = Solution::new(&instance.model);
        let selection = flaky(0);
        assert!(selection.init(&solution));
        assert_eq!(selection.queue.len(), instance.model.students().len());
        assert_eq!(
            selection.next_unit(&solution),
            Some(WorkUnit::Student(StudentId::new(0)))
        );
        while selection.next_unit(&solution).is_some() {}
        assert!(selection.queue.is_empty());
    }
}
