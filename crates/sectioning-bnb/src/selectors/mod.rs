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

//! # Student Selections
//!
//! Every selection here visits students from a shared queue and runs the
//! per-student branch and bound on each, differing only in which students are
//! queued, which [`Policy`] the search uses and what is done with its result.
//!
//! The per-selection state (queue, random generator, statistics, pass
//! counter) lives in [`SelectorCore`]; the searches themselves share nothing.

pub mod assign_initial;
pub mod branch_bound;
pub mod critical;
pub mod min_credit;
pub mod online;
pub mod priority_construction;

use crate::{
    neighbour::BranchBoundNeighbour,
    policy::{Policy, SearchSettings},
    selection::{SelectionOutcome, search},
};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sectioning_model::{
    Assignment, Enrollment, Model,
    index::{RequestId, StudentId},
};
use sectioning_search::{
    monitor::tracing::TracingSelectionMonitor,
    neighbour::{Proposal, value_of_changes},
    order::StudentOrder,
    selection::{WorkQueue, WorkUnit},
    solution::Solution,
    stats::SelectionStatistics,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug)]
pub struct SelectorCore {
    name: &'static str,
    settings: SearchSettings,
    order: StudentOrder,
    queue: WorkQueue,
    rng: Mutex<ChaCha8Rng>,
    stats: Mutex<SelectionStatistics>,
    passes: AtomicUsize,
    progress: AtomicBool,
}

impl SelectorCore {
    pub fn new(
        name: &'static str,
        settings: SearchSettings,
        order: StudentOrder,
        seed: u64,
    ) -> Self {
        Self {
            name,
            settings,
            order,
            queue: WorkQueue::new(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            stats: Mutex::new(SelectionStatistics::new()),
            passes: AtomicUsize::new(0),
            progress: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Passes started so far.
    #[inline]
    pub fn passes(&self) -> usize {
        self.passes.load(Ordering::Acquire)
    }

    /// Whether anything was applied since the current pass started.
    #[inline]
    pub fn made_progress(&self) -> bool {
        self.progress.load(Ordering::Acquire)
    }

    #[inline]
    pub fn on_applied(&self) {
        self.progress.store(true, Ordering::Release);
    }

    /// Starts a pass over the students `keep` accepts, in the configured
    /// order. Returns the number queued.
    pub fn start_pass(&self, model: &Model, keep: impl Fn(StudentId) -> bool) -> usize {
        let students = {
            let mut rng = self.rng.lock();
            self.order.students(model, &mut *rng)
        };
        let units: Vec<WorkUnit> = students
            .into_iter()
            .filter(|&s| keep(s))
            .map(WorkUnit::Student)
            .collect();
        let queued = units.len();
        self.queue.reset(units);
        self.passes.fetch_add(1, Ordering::AcqRel);
        self.progress.store(false, Ordering::Release);
        tracing::debug!(selection = self.name, queued, pass = self.passes(), "pass started");
        queued
    }

    #[inline]
    pub fn next_unit(&self) -> Option<WorkUnit> {
        self.queue.pop()
    }

    /// Runs one search against `assignment` with `settings`.
    pub fn search_with(
        &self,
        model: &Model,
        assignment: &Assignment,
        student: StudentId,
        settings: &SearchSettings,
        policy: &Policy,
    ) -> SelectionOutcome {
        search(
            model,
            assignment,
            student,
            settings,
            policy,
            TracingSelectionMonitor::new(self.name),
        )
    }

    /// Wraps `schedule` into a proposal against `assignment`.
    pub fn proposal(
        &self,
        model: &Model,
        assignment: &Assignment,
        student: StudentId,
        schedule: &[Option<Enrollment>],
    ) -> Proposal {
        let changes = changes_of(model, student, schedule);
        let value = value_of_changes(model, assignment, &changes);
        let neighbour = BranchBoundNeighbour::new(model, student, schedule, value);
        tracing::trace!(selection = self.name, %neighbour, "proposal");
        Proposal::new(Box::new(neighbour), assignment.revision())
    }

    /// Standard handling of a unit: search with `policy` and propose the
    /// schedule found if its key beats the current one.
    pub fn search_student(
        &self,
        solution: &Solution<'_>,
        unit: WorkUnit,
        policy: &Policy,
    ) -> Option<Proposal> {
        let WorkUnit::Student(student) = unit else {
            return None;
        };
        let model = solution.model();
        let assignment = solution.read();
        let outcome = self.search_with(model, &assignment, student, &self.settings, policy);
        let proposal = outcome
            .improvement()
            .map(|best| self.proposal(model, &assignment, student, best));
        self.record(&outcome, proposal.is_some());
        proposal
    }

    pub fn record(&self, outcome: &SelectionOutcome, found: bool) {
        self.record_all(std::slice::from_ref(outcome), found);
    }

    /// Records the searches made for one unit as one selection.
    pub fn record_all(&self, outcomes: &[SelectionOutcome], found: bool) {
        let elapsed = outcomes.iter().map(|o| o.elapsed).sum();
        let nodes = outcomes.iter().map(|o| o.nodes).sum();
        let timed_out = outcomes.iter().any(|o| o.timed_out);
        self.stats.lock().on_search(elapsed, nodes, timed_out, found);
    }

    #[inline]
    pub fn statistics(&self) -> SelectionStatistics {
        self.stats.lock().clone()
    }
}

/// Pairs the student's requests with the slots of `schedule`.
pub(crate) fn changes_of(
    model: &Model,
    student: StudentId,
    schedule: &[Option<Enrollment>],
) -> Vec<(RequestId, Option<Enrollment>)> {
    model
        .student(student)
        .requests()
        .iter()
        .copied()
        .zip(schedule.iter().cloned())
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use sectioning_search::{
        selection::{NeighbourSelection, Outcome, process_with_retry},
        solution::Solution,
    };

    /// Drives one pass of `selection` on a single thread. Returns the number
    /// of applied proposals.
    pub fn run_pass(selection: &dyn NeighbourSelection, solution: &Solution<'_>) -> usize {
        let mut applied = 0;
        while let Some(unit) = selection.next_unit(solution) {
            if let Some(Outcome::Applied { .. }) =
                process_with_retry(selection, solution, unit, 3)
            {
                applied += 1;
            }
        }
        applied
    }

    /// Drives passes until the selection reports it is done.
    pub fn run_to_end(selection: &dyn NeighbourSelection, solution: &Solution<'_>) -> usize {
        let mut applied = 0;
        while selection.init(solution) {
            applied += run_pass(selection, solution);
        }
        applied
    }
}
