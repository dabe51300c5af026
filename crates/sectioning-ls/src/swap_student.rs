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

//! # Student Swap
//!
//! For a student with unassigned requests, tries every (sampled) candidate of
//! those requests: the values in the way are taken from their owners, who are
//! immediately re-seated elsewhere. The best resulting move is proposed when it
//! improves the objective.
//!
//! Students whose values could not be moved (protected, or with no other place
//! to go) are collected as problem students; the driver may release them later
//! to break the deadlock.

use crate::{
    budget::BacktrackBudget,
    moves::{SwapRules, Trial, try_move},
    neighbour::{SwapKind, SwapNeighbour},
};
use parking_lot::Mutex;
use rand::{SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashSet;
use sectioning_model::{Assignment, Enrollment, Model, candidates::enrollments, index::StudentId};
use sectioning_search::{
    config::SectioningConfig,
    neighbour::Proposal,
    order::StudentOrder,
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
pub struct SwapStudentSelection {
    rules: SwapRules,
    timeout: Duration,
    max_values: usize,
    order: StudentOrder,
    queue: WorkQueue,
    rng: Mutex<ChaCha8Rng>,
    stats: Mutex<SelectionStatistics>,
    problem_students: Mutex<FxHashSet<StudentId>>,
    passes: AtomicUsize,
}

impl SwapStudentSelection {
    pub fn new(config: &SectioningConfig) -> Self {
        Self::with_settings(
            SwapRules::from_config(config),
            config.swap_students_timeout,
            config.swap_students_max_values,
            config.student_order,
            config.seed,
        )
    }

    pub fn with_settings(
        rules: SwapRules,
        timeout: Duration,
        max_values: usize,
        order: StudentOrder,
        seed: u64,
    ) -> Self {
        Self {
            rules,
            timeout,
            max_values: max_values.max(1),
            order,
            queue: WorkQueue::new(),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
            stats: Mutex::new(SelectionStatistics::new()),
            problem_students: Mutex::new(FxHashSet::default()),
            passes: AtomicUsize::new(0),
        }
    }

    /// Students found in the way so far.
    pub fn problem_students(&self) -> Vec<StudentId> {
        let mut students: Vec<StudentId> = self.problem_students.lock().iter().copied().collect();
        students.sort_unstable();
        students
    }

    /// Returns the problem students and forgets them.
    pub fn take_problem_students(&self) -> Vec<StudentId> {
        let mut students: Vec<StudentId> = self.problem_students.lock().drain().collect();
        students.sort_unstable();
        students
    }

    /// Up to `max_values` candidates of every unassigned request of the
    /// student, in random order.
    fn candidates(
        &self,
        model: &Model,
        assignment: &Assignment,
        student: StudentId,
    ) -> Vec<Enrollment> {
        let mut rng = self.rng.lock();
        let mut out = Vec::new();
        for &request in model.student(student).requests() {
            if assignment.is_assigned(request) {
                continue;
            }
            let mut values = enrollments(model, request);
            values.shuffle(&mut *rng);
            values.truncate(self.max_values);
            out.extend(values);
        }
        out
    }

    /// Explores every candidate of the student against the locked
    /// assignment, restoring it after each trial.
    fn explore(
        &self,
        model: &Model,
        assignment: &mut Assignment,
        student: StudentId,
        problems: &mut FxHashSet<StudentId>,
        budget: &mut BacktrackBudget,
    ) -> Option<SwapNeighbour> {
        let mut best: Option<SwapNeighbour> = None;
        for candidate in self.candidates(model, assignment, student) {
            let conflicts = model.conflicts(assignment, &candidate);
            if conflicts.contains(&candidate) {
                continue;
            }
            let blocked: Vec<StudentId> = conflicts
                .iter()
                .filter(|c| !self.rules.can_unassign(model, student, c))
                .map(|c| model.request(c.request()).student())
                .collect();
            if !blocked.is_empty() {
                problems.extend(blocked);
                continue;
            }
            if !budget.step() {
                break;
            }
            match try_move(model, assignment, &candidate, &conflicts) {
                Trial::Unresolved { blocking } => {
                    problems.insert(blocking);
                }
                Trial::Resolved { changes, value } => {
                    if best.as_ref().is_none_or(|b| value < b.found_value()) {
                        best = Some(SwapNeighbour::new(
                            SwapKind::Student,
                            student,
                            changes.into_vec(),
                            value,
                        ));
                    }
                }
            }
        }
        best
    }
}

impl NeighbourSelection for SwapStudentSelection {
    fn name(&self) -> &str {
        "SwapStudent"
    }

    fn init(&self, solution: &Solution<'_>) -> bool {
        if self.passes.fetch_add(1, Ordering::AcqRel) > 0 {
            return false;
        }
        let model = solution.model();
        let students = {
            let mut rng = self.rng.lock();
            self.order.students(model, &mut *rng)
        };
        let assignment = solution.read();
        let units: Vec<WorkUnit> = students
            .into_iter()
            .filter(|&s| assignment.nr_assigned_of(model, s) < model.student(s).nr_requests())
            .map(WorkUnit::Student)
            .collect();
        let queued = units.len();
        self.queue.reset(units);
        tracing::debug!(selection = self.name(), queued, "pass started");
        queued > 0
    }

    fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
        self.queue.pop()
    }

    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
        let WorkUnit::Student(student) = unit else {
            return None;
        };
        let model = solution.model();
        let mut budget = BacktrackBudget::new(self.timeout, u64::MAX);
        let mut problems = FxHashSet::default();

        let mut assignment = solution.write();
        let revision = assignment.revision();
        let best = self.explore(model, &mut assignment, student, &mut problems, &mut budget);
        debug_assert_eq!(assignment.revision(), revision);
        drop(assignment);

        let proposal = match best {
            Some(neighbour) if neighbour.found_value() < -MIN_IMPROVEMENT => {
                tracing::trace!(selection = self.name(), %neighbour, "proposal");
                Some(Proposal::new(Box::new(neighbour), revision).improving())
            }
            _ => {
                if !problems.is_empty() {
                    tracing::trace!(
                        selection = self.name(),
                        %student,
                        problems = problems.len(),
                        "no swap"
                    );
                    self.problem_students.lock().extend(problems);
                }
                None
            }
        };
        self.stats.lock().on_search(
            budget.elapsed(),
            budget.iterations(),
            budget.timed_out(),
            proposal.is_some(),
        );
        proposal
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
        index::{RequestId, SectionId},
        offering::UNLIMITED,
    };
    use sectioning_core::time::{DayCode, TimeLocation};
    use sectioning_search::selection::{Outcome, process_with_retry};

    struct Crowded {
        model: Model,
        holders: [StudentId; 2],
        held: Vec<Enrollment>,
        newcomer_request: RequestId,
        second: Option<SectionId>,
    }

    /// Two students hold a Monday section of capacity two. A third one, who
    /// cannot come on Tuesdays, wants the course too. With `tuesday` there is
    /// an empty Tuesday section the holders could move to.
    fn crowded(tuesday: bool) -> Crowded {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("CHEM 115");
        let course = b.add_course(offering, "CHEM 115", UNLIMITED, 3.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        let monday = b
            .add_section(
                subpart,
                SectionSpec::new("1", 2).with_time(TimeLocation::new(DayCode::MON, 90, 12)),
            )
            .unwrap();
        let second = tuesday.then(|| {
            b.add_section(
                subpart,
                SectionSpec::new("2", 1).with_time(TimeLocation::new(DayCode::TUE, 90, 12)),
            )
            .unwrap()
        });

        let mut holders = Vec::new();
        let mut held = Vec::new();
        for id in 1..=2 {
            let s = b.add_student(StudentSpec::new(id));
            let r = b.add_course_request(s, CourseRequestSpec::new([course])).unwrap();
            holders.push(s);
            held.push(b.enrollment(r, course, &[monday]).unwrap());
        }
        let newcomer = b.add_student(
            StudentSpec::new(3).with_unavailability(TimeLocation::new(DayCode::TUE, 0, 288), false),
        );
        let newcomer_request = b
            .add_course_request(newcomer, CourseRequestSpec::new([course]))
            .unwrap();
        let model = b.build().unwrap();
        Crowded {
            model,
            holders: [holders[0], holders[1]],
            held,
            newcomer_request,
            second,
        }
    }

    fn selection() -> SwapStudentSelection {
        SwapStudentSelection::with_settings(
            SwapRules::default(),
            Duration::from_secs(60),
            100,
            StudentOrder::Sequential,
            0,
        )
    }

    fn seeded(c: &Crowded) -> Assignment {
        let mut assignment = Assignment::new(&c.model);
        for e in &c.held {
            assignment.assign(&c.model, e.clone());
        }
        assignment
    }

    #[test]
    fn test_holder_moves_to_make_room() {
        let c = crowded(true);
        let model = &c.model;
        let solution = Solution::with_assignment(model, seeded(&c));
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
        assert!(assignment.is_assigned(c.newcomer_request));
        let second = c.second.unwrap();
        let moved = c
            .holders
            .iter()
            .filter(|&&s| {
                let r = model.student(s).requests()[0];
                assignment.value(r).is_some_and(|e| e.sections() == [second])
            })
            .count();
        assert_eq!(moved, 1);
        assert_eq!(assignment.nr_assigned(), 3);
        assert!(!selection.init(&solution));
    }

    #[test]
    fn test_no_room_reports_holders() {
        let c = crowded(false);
        let model = &c.model;
        let solution = Solution::with_assignment(model, seeded(&c));
        let selection = selection();
        let before = solution.snapshot();

        assert!(selection.init(&solution));
        let unit = selection.next_unit(&solution).unwrap();
        assert_eq!(unit, WorkUnit::Student(model.request(c.newcomer_request).student()));
        assert!(selection.search(&solution, unit).is_none());
        assert!(selection.next_unit(&solution).is_none());

        let problems = selection.problem_students();
        assert!(!problems.is_empty());
        assert!(problems.iter().all(|s| c.holders.contains(s)));
        assert_eq!(*solution.read(), before);
        assert_eq!(solution.read().revision(), before.revision());

        assert_eq!(selection.take_problem_students(), problems);
        assert!(selection.problem_students().is_empty());
        assert_eq!(selection.statistics().neighbours, 0);
    }

    #[test]
    fn test_zero_timeout_leaves_solution_untouched() {
        let c = crowded(true);
        let model = &c.model;
        let solution = Solution::with_assignment(model, seeded(&c));
        let selection = SwapStudentSelection::with_settings(
            SwapRules::default(),
            Duration::ZERO,
            100,
            StudentOrder::Sequential,
            0,
        );
        let before = solution.snapshot();

        assert!(selection.init(&solution));
        while let Some(unit) = selection.next_unit(&solution) {
            assert!(selection.search(&solution, unit).is_none());
        }
        assert_eq!(*solution.read(), before);
        assert_eq!(selection.statistics().timeouts, 1);
    }
}
