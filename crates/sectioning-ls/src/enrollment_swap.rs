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

//! # Enrollment Swap
//!
//! Visits assigned course requests and looks for a value that is cheaper for
//! the owner than the current one. A free candidate is a straight move. A
//! candidate held by other students in a shared section is a double swap:
//! they give up their value and are re-seated, typically into the sections
//! the request vacates.

use crate::{
    budget::BacktrackBudget,
    moves::{ChangeSet, SwapRules, Trial, schedule_value_with, try_move},
    neighbour::{SwapKind, SwapNeighbour},
};
use parking_lot::Mutex;
use sectioning_model::{
    Assignment, Enrollment, Model,
    candidates::enrollments,
    index::{RequestId, StudentId},
    objective,
};
use sectioning_search::{
    config::SectioningConfig,
    neighbour::{Proposal, value_of_changes},
    selection::{NeighbourSelection, WorkQueue, WorkUnit},
    solution::Solution,
    stats::SelectionStatistics,
};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

const MIN_IMPROVEMENT: f64 = 1e-9;

#[derive(Debug)]
pub struct StudentEnrollmentSwapSelection {
    rules: SwapRules,
    timeout: Duration,
    max_iterations: u64,
    queue: WorkQueue,
    stats: Mutex<SelectionStatistics>,
    passes: AtomicUsize,
}

impl StudentEnrollmentSwapSelection {
    pub fn new(config: &SectioningConfig) -> Self {
        Self::with_settings(
            SwapRules::from_config(config),
            config.enrollment_swap_timeout,
            config.enrollment_swap_max_iterations,
        )
    }

    pub fn with_settings(rules: SwapRules, timeout: Duration, max_iterations: u64) -> Self {
        Self {
            rules,
            timeout,
            max_iterations,
            queue: WorkQueue::new(),
            stats: Mutex::new(SelectionStatistics::new()),
            passes: AtomicUsize::new(0),
        }
    }

    /// Assigned course requests, higher priority students first, then by
    /// request priority tier and position.
    fn requests(model: &Model, assignment: &Assignment) -> Vec<RequestId> {
        let mut requests: Vec<RequestId> = assignment
            .assigned()
            .map(|(r, _)| r)
            .filter(|&r| model.request(r).is_course())
            .collect();
        requests.sort_by_key(|&r| {
            let request = model.request(r);
            (
                model.student(request.student()).priority(),
                request.request_priority(),
                request.priority(),
                r,
            )
        });
        requests
    }

    /// Candidates cheaper for the owner than `current`, cheapest first.
    fn candidates(model: &Model, assignment: &Assignment, current: &Enrollment) -> Vec<Enrollment> {
        let owner = model.request(current.request()).student();
        let current_value = objective::student_value(model, assignment, owner);
        let mut better: Vec<(f64, Enrollment)> = enrollments(model, current.request())
            .into_iter()
            .filter(|e| e != current)
            .map(|e| (schedule_value_with(model, assignment, &e), e))
            .filter(|(value, _)| *value < current_value - MIN_IMPROVEMENT)
            .collect();
        better.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        better.into_iter().map(|(_, e)| e).collect()
    }

    /// Whether the holders of `conflicts` can trade with `student`: all of
    /// them are other students sitting in a section of `candidate`.
    fn is_swappable(
        &self,
        model: &Model,
        student: StudentId,
        candidate: &Enrollment,
        conflicts: &[Enrollment],
    ) -> bool {
        conflicts.iter().all(|c| {
            model.request(c.request()).student() != student
                && c.sections().iter().any(|s| candidate.sections().contains(s))
                && self.rules.can_unassign(model, student, c)
        })
    }

    fn explore(
        &self,
        model: &Model,
        assignment: &mut Assignment,
        request: RequestId,
        budget: &mut BacktrackBudget,
    ) -> Option<SwapNeighbour> {
        let current = assignment.value(request)?.clone();
        let student = model.request(request).student();
        let mut best: Option<SwapNeighbour> = None;
        for candidate in Self::candidates(model, assignment, &current) {
            let conflicts = model.conflicts(assignment, &candidate);
            if conflicts.contains(&candidate) {
                continue;
            }
            if !conflicts.is_empty() && !self.is_swappable(model, student, &candidate, &conflicts) {
                continue;
            }
            if !budget.step() {
                break;
            }
            let (changes, value) = if conflicts.is_empty() {
                let mut changes = ChangeSet::new();
                changes.set(request, Some(candidate.clone()));
                let value = value_of_changes(model, assignment, changes.as_slice());
                (changes, value)
            } else {
                match try_move(model, assignment, &candidate, &conflicts) {
                    Trial::Resolved { changes, value } => (changes, value),
                    Trial::Unresolved { .. } => continue,
                }
            };
            if value < -MIN_IMPROVEMENT && best.as_ref().is_none_or(|b| value < b.found_value()) {
                best = Some(SwapNeighbour::new(
                    SwapKind::Enrollment,
                    student,
                    changes.into_vec(),
                    value,
                ));
            }
        }
        best
    }
}

impl NeighbourSelection for StudentEnrollmentSwapSelection {
    fn name(&self) -> &str {
        "EnrollmentSwap"
    }

    fn init(&self, solution: &Solution<'_>) -> bool {
        if self.passes.fetch_add(1, Ordering::AcqRel) > 0 {
            return false;
        }
        let requests = Self::requests(solution.model(), &solution.read());
        let queued = requests.len();
        self.queue.reset(requests.into_iter().map(WorkUnit::Request));
        tracing::debug!(selection = self.name(), queued, "pass started");
        queued > 0
    }

    fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
        self.queue.pop()
    }

    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
        let WorkUnit::Request(request) = unit else {
            return None;
        };
        let model = solution.model();
        let mut budget = BacktrackBudget::new(self.timeout, self.max_iterations);

        let mut assignment = solution.write();
        let revision = assignment.revision();
        let best = self.explore(model, &mut assignment, request, &mut budget);
        debug_assert_eq!(assignment.revision(), revision);
        drop(assignment);

        self.stats.lock().on_search(
            budget.elapsed(),
            budget.iterations(),
            budget.timed_out(),
            best.is_some(),
        );
        best.map(|neighbour| {
            tracing::trace!(selection = self.name(), %neighbour, "proposal");
            Proposal::new(Box::new(neighbour), revision).improving()
        })
    }

    fn statistics(&self) -> SelectionStatistics {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioning_model::{
        builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec},
        index::SectionId,
        offering::UNLIMITED,
        request::Choice,
    };
    use sectioning_search::selection::{Outcome, process_with_retry};

    struct Trade {
        model: Model,
        first: SectionId,
        second: SectionId,
        picky: RequestId,
        other: RequestId,
        picky_value: Enrollment,
        other_value: Enrollment,
    }

    /// Two single-seat sections. The picky student asked for the first one
    /// but sits in the second; the other student sits in the first.
    fn trade() -> Trade {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("HIST 210");
        let course = b.add_course(offering, "HIST 210", UNLIMITED, 3.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        let first = b.add_section(subpart, SectionSpec::new("1", 1)).unwrap();
        let second = b.add_section(subpart, SectionSpec::new("2", 1)).unwrap();

        let s1 = b.add_student(StudentSpec::new(1));
        let picky = b
            .add_course_request(
                s1,
                CourseRequestSpec::new([course]).with_selected(Choice::Section(first)),
            )
            .unwrap();
        let s2 = b.add_student(StudentSpec::new(2));
        let other = b.add_course_request(s2, CourseRequestSpec::new([course])).unwrap();
        let picky_value = b.enrollment(picky, course, &[second]).unwrap();
        let other_value = b.enrollment(other, course, &[first]).unwrap();
        let model = b.build().unwrap();
        Trade {
            model,
            first,
            second,
            picky,
            other,
            picky_value,
            other_value,
        }
    }

    fn seeded(t: &Trade) -> Assignment {
        let mut assignment = Assignment::new(&t.model);
        assignment.assign(&t.model, t.picky_value.clone());
        assignment.assign(&t.model, t.other_value.clone());
        assignment
    }

    fn selection() -> StudentEnrollmentSwapSelection {
        StudentEnrollmentSwapSelection::with_settings(
            SwapRules::default(),
            Duration::from_secs(60),
            1000,
        )
    }

    #[test]
    fn test_students_trade_sections() {
        let t = trade();
        let solution = Solution::with_assignment(&t.model, seeded(&t));
        let selection = selection();
        let before = solution.value();

        assert!(selection.init(&solution));
        let mut applied = 0;
        while let Some(unit) = selection.next_unit(&solution) {
            if let Some(Outcome::Applied { value }) =
                process_with_retry(&selection, &solution, unit, 3)
            {
                assert!(value < 0.0);
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
        assert!(solution.value() < before);

        let assignment = solution.read();
        assert_eq!(assignment.value(t.picky).map(|e| e.sections()), Some(&[t.first][..]));
        assert_eq!(assignment.value(t.other).map(|e| e.sections()), Some(&[t.second][..]));
        assert!(!selection.init(&solution));
    }

    #[test]
    fn test_search_restores_the_assignment() {
        let t = trade();
        let solution = Solution::with_assignment(&t.model, seeded(&t));
        let selection = selection();
        let before = solution.snapshot();

        let proposal = selection
            .search(&solution, WorkUnit::Request(t.picky))
            .unwrap();
        assert_eq!(*solution.read(), before);
        assert_eq!(solution.read().revision(), before.revision());
        assert_eq!(proposal.revision, before.revision());
        assert_eq!(proposal.neighbour.name(), "EnrollmentSwap");
        assert!(proposal.neighbour.value(&t.model, &before) < 0.0);

        assert!(selection.search(&solution, WorkUnit::Request(t.other)).is_none());
        assert_eq!(selection.statistics().selections, 2);
        assert_eq!(selection.statistics().neighbours, 1);
    }

    #[test]
    fn test_zero_iterations_try_nothing() {
        let t = trade();
        let solution = Solution::with_assignment(&t.model, seeded(&t));
        let selection = StudentEnrollmentSwapSelection::with_settings(
            SwapRules::default(),
            Duration::from_secs(60),
            0,
        );
        assert!(selection.search(&solution, WorkUnit::Request(t.picky)).is_none());
        assert_eq!(selection.statistics().nodes, 0);
    }
}
