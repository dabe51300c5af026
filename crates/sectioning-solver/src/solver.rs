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

//! # Phased Sectioning Solver
//!
//! Runs the neighbour selections of the sectioning engine one after another
//! over a shared [`Solution`], each phase polled by a pool of scoped worker
//! threads until the selection reports it is done.
//!
//! ## Phases
//!
//! Construction, run once:
//! - `AssignInitial` (minimal perturbation only), then `CriticalCourses`
//!   while the schedules are still mostly empty, then either
//!   `PriorityConstruction` or, in online mode, `Online`.
//!
//! Improvement, run in rounds:
//! - `BranchBound`, `MinCredit`, `SwapStudent`, `EnrollmentSwap`, release of
//!   problem students, and `BranchBound` again when anybody was released.
//!
//! A round that does not improve the best value found ends the run, as does
//! the time limit. The best assignment seen is returned.
//!
//! ## Usage
//!
//! ```rust
//! use sectioning_model::synthetic::{SyntheticParams, generate};
//! use sectioning_search::config::SectioningConfig;
//! use sectioning_solver::solver::SolverBuilder;
//! use std::time::Duration;
//!
//! let instance = generate(&SyntheticParams::small(7)).unwrap();
//! let mut config = SectioningConfig::default();
//! config.with_time_limit(Duration::from_secs(10));
//! let solver = SolverBuilder::new(config).with_threads(2).build();
//! let outcome = solver.solve(&instance.model);
//! assert!(outcome.report.value <= 0.0);
//! ```

use crate::report::{PhaseReport, SolverReport, TerminationReason};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sectioning_bnb::selectors::{
    assign_initial::AssignInitialSelection, branch_bound::BranchBoundSelection,
    critical::CriticalCoursesSelection, min_credit::MinCreditSelection,
    online::OnlineSelection, priority_construction::PriorityConstructionSelection,
};
use sectioning_ls::{StudentEnrollmentSwapSelection, SwapStudentSelection};
use sectioning_model::{Assignment, Model, constraints::is_pinned, index::StudentId, objective};
use sectioning_search::{
    config::SectioningConfig,
    neighbour::{Proposal, StudentUnassignNeighbour},
    selection::{NeighbourSelection, Outcome, process_with_retry},
    solution::Solution,
};
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

const MIN_IMPROVEMENT: f64 = 1e-9;

/// The final assignment and what it took to get there.
#[derive(Debug)]
pub struct SolverOutcome {
    pub assignment: Assignment,
    pub report: SolverReport,
}

#[derive(Debug, Clone)]
pub struct SectioningSolver {
    config: SectioningConfig,
    threads: usize,
    online: bool,
}

impl SectioningSolver {
    #[inline]
    pub fn config(&self) -> &SectioningConfig {
        &self.config
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }

    #[inline]
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Sections every student of `model`, starting from nothing assigned.
    pub fn solve(&self, model: &Model) -> SolverOutcome {
        self.solve_from(model, Assignment::new(model))
    }

    /// Sections every student of `model`, starting from `initial`.
    pub fn solve_from(&self, model: &Model, initial: Assignment) -> SolverOutcome {
        let start = Instant::now();
        let deadline = start
            .checked_add(self.config.time_limit)
            .unwrap_or_else(|| start + Duration::from_secs(86_400 * 365));
        let solution = Solution::with_assignment(model, initial);
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut phases = Vec::new();
        let mut salt = 0u64;

        tracing::info!(
            students = model.students().len(),
            requests = model.requests().len(),
            threads = self.threads,
            mpp = model.is_mpp(),
            online = self.online,
            "sectioning started"
        );

        let mut construction: Vec<Box<dyn NeighbourSelection>> = Vec::new();
        if model.is_mpp() {
            construction.push(Box::new(AssignInitialSelection::new(&self.salted(&mut salt))));
        }
        construction.push(Box::new(CriticalCoursesSelection::new(&self.salted(&mut salt))));
        if self.online {
            construction.push(Box::new(OnlineSelection::new(&self.salted(&mut salt))));
        } else {
            construction.push(Box::new(PriorityConstructionSelection::new(
                &self.salted(&mut salt),
            )));
        }
        for selection in &construction {
            phases.push(self.run_phase(selection.as_ref(), &solution, deadline, 0));
        }

        let mut best_value = solution.value();
        let mut best = solution.snapshot();
        let mut rounds = 0;
        let mut released = 0;
        let termination = loop {
            if Instant::now() >= deadline {
                break TerminationReason::TimeLimit;
            }
            rounds += 1;

            let improvement: Vec<Box<dyn NeighbourSelection>> = vec![
                Box::new(BranchBoundSelection::new(&self.salted(&mut salt))),
                Box::new(MinCreditSelection::new(&self.salted(&mut salt))),
            ];
            for selection in &improvement {
                phases.push(self.run_phase(selection.as_ref(), &solution, deadline, rounds));
            }
            let swap = SwapStudentSelection::new(&self.salted(&mut salt));
            phases.push(self.run_phase(&swap, &solution, deadline, rounds));
            let enrollment_swap = StudentEnrollmentSwapSelection::new(&self.salted(&mut salt));
            phases.push(self.run_phase(&enrollment_swap, &solution, deadline, rounds));

            let released_now = self.release(&solution, &swap.take_problem_students(), &mut rng);
            released += released_now;
            if released_now > 0 {
                let reseat = BranchBoundSelection::new(&self.salted(&mut salt));
                phases.push(self.run_phase(&reseat, &solution, deadline, rounds));
            }

            let value = solution.value();
            tracing::info!(
                round = rounds,
                value,
                best = best_value,
                released = released_now,
                "round finished"
            );
            if value < best_value - MIN_IMPROVEMENT {
                best_value = value;
                best = solution.snapshot();
            } else if Instant::now() >= deadline {
                break TerminationReason::TimeLimit;
            } else {
                break TerminationReason::Converged;
            }
        };

        let mut assignment = solution.into_assignment();
        if objective::total_value(model, &assignment) > best_value + MIN_IMPROVEMENT {
            tracing::debug!(best = best_value, "restoring best assignment");
            assignment = best;
        }
        let report = Self::report(model, &assignment, phases, rounds, released, termination, start);
        tracing::info!(
            value = report.value,
            assigned = report.assigned_requests,
            requests = report.total_requests,
            %termination,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "sectioning finished"
        );
        SolverOutcome { assignment, report }
    }

    /// The configuration with a fresh seed, so that every selection shuffles
    /// differently.
    fn salted(&self, salt: &mut u64) -> SectioningConfig {
        *salt += 1;
        let mut config = self.config.clone();
        config.seed = config.seed.wrapping_add(*salt);
        config
    }

    /// Polls `selection` with the worker pool, pass after pass, until it is
    /// done or the deadline passes.
    fn run_phase(
        &self,
        selection: &dyn NeighbourSelection,
        solution: &Solution<'_>,
        deadline: Instant,
        round: usize,
    ) -> PhaseReport {
        let start = Instant::now();
        let before = solution.value();
        let applied = AtomicU64::new(0);
        let abandoned = AtomicU64::new(0);
        let retry_limit = self.config.retry_limit;
        let mut passes = 0;

        while Instant::now() < deadline && selection.init(solution) {
            passes += 1;
            std::thread::scope(|scope| {
                for _ in 0..self.threads {
                    scope.spawn(|| {
                        while Instant::now() < deadline {
                            let Some(unit) = selection.next_unit(solution) else {
                                break;
                            };
                            match process_with_retry(selection, solution, unit, retry_limit) {
                                Some(Outcome::Applied { .. }) => {
                                    applied.fetch_add(1, Ordering::Relaxed);
                                }
                                Some(Outcome::NoImprovement) => {}
                                None => {
                                    abandoned.fetch_add(1, Ordering::Relaxed);
                                }
                            }
                        }
                    });
                }
            });
        }

        let report = PhaseReport {
            name: selection.name().to_string(),
            round,
            passes,
            applied: applied.into_inner(),
            abandoned: abandoned.into_inner(),
            value_change: solution.value() - before,
            statistics: selection.statistics(),
            elapsed: start.elapsed(),
        };
        tracing::info!(
            phase = %report.name,
            round,
            passes,
            applied = report.applied,
            value_change = report.value_change,
            "phase finished"
        );
        report
    }

    /// Unassigns each problem student with the configured probability.
    /// Students holding a value that may never be taken away are kept.
    fn release(
        &self,
        solution: &Solution<'_>,
        students: &[StudentId],
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let model = solution.model();
        let probability = self.config.problem_students_unassign_probability.clamp(0.0, 1.0);
        let mut released = 0;
        for &student in students {
            if !rng.random_bool(probability) {
                continue;
            }
            let (pinned, revision) = {
                let assignment = solution.read();
                let pinned = model
                    .student(student)
                    .requests()
                    .iter()
                    .filter_map(|&r| assignment.value(r))
                    .any(|e| is_pinned(model, e));
                (pinned, assignment.revision())
            };
            if pinned {
                continue;
            }
            let neighbour = StudentUnassignNeighbour::new(model, student);
            match solution.apply(Proposal::new(Box::new(neighbour), revision)) {
                Ok(value) => {
                    tracing::debug!(%student, value, "problem student released");
                    released += 1;
                }
                Err(error) => tracing::debug!(%student, %error, "release rejected"),
            }
        }
        released
    }

    fn report(
        model: &Model,
        assignment: &Assignment,
        phases: Vec<PhaseReport>,
        rounds: usize,
        released: usize,
        termination: TerminationReason,
        start: Instant,
    ) -> SolverReport {
        let complete_students = model
            .students()
            .ids()
            .filter(|&s| assignment.nr_assigned_of(model, s) >= model.student(s).nr_requests())
            .count();
        SolverReport {
            phases,
            rounds,
            released,
            value: objective::total_value(model, assignment),
            assigned_requests: assignment.nr_assigned(),
            total_requests: model.requests().len(),
            complete_students,
            total_students: model.students().len(),
            termination,
            elapsed: start.elapsed(),
        }
    }
}

pub struct SolverBuilder {
    config: SectioningConfig,
    threads: usize,
    online: bool,
}

impl Default for SolverBuilder {
    #[inline]
    fn default() -> Self {
        Self::new(SectioningConfig::default())
    }
}

impl SolverBuilder {
    #[inline]
    pub fn new(config: SectioningConfig) -> Self {
        Self {
            config,
            threads: 1,
            online: false,
        }
    }

    /// Worker threads polling each phase; at least one.
    #[inline]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    #[inline]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.config.time_limit = limit;
        self
    }

    /// Constructs with the online selection instead of priority
    /// construction.
    #[inline]
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    #[inline]
    pub fn build(self) -> SectioningSolver {
        SectioningSolver {
            config: self.config,
            threads: self.threads,
            online: self.online,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioning_core::time::{DayCode, TimeLocation};
    use sectioning_model::{
        builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec},
        offering::UNLIMITED,
        request::RequestPriority,
        synthetic::{SyntheticParams, generate, generate_with},
    };
    use sectioning_search::order::StudentOrder;

    fn config(seed: u64) -> SectioningConfig {
        let mut config = SectioningConfig::default();
        config
            .with_seed(seed)
            .with_student_order(StudentOrder::Sequential)
            .with_time_limit(Duration::from_secs(60))
            .with_branch_and_bound_timeout(Duration::from_secs(5));
        config
    }

    fn assert_report_matches(model: &Model, outcome: &SolverOutcome) {
        let report = &outcome.report;
        assert_eq!(report.assigned_requests, outcome.assignment.nr_assigned());
        assert_eq!(report.total_requests, model.requests().len());
        assert_eq!(report.total_students, model.students().len());
        assert!((report.value - objective::total_value(model, &outcome.assignment)).abs() < 1e-9);
    }

    #[test]
    fn test_single_thread_run_converges() {
        let instance = generate(&SyntheticParams::small(3)).unwrap();
        let model = &instance.model;
        let outcome = SolverBuilder::new(config(3)).build().solve(model);

        assert_report_matches(model, &outcome);
        assert_eq!(outcome.report.termination, TerminationReason::Converged);
        assert!(outcome.report.rounds >= 1);
        assert!(outcome.report.value < 0.0);
        assert!(outcome.report.assigned_requests > 0);
        let names: Vec<&str> = outcome.report.phases.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[..2], ["CriticalCourses", "PriorityConstruction"]);
        assert!(names.contains(&"SwapStudent"));
        assert!(names.contains(&"EnrollmentSwap"));
    }

    /// Critical B overlaps A; C meets on another day.
    #[test]
    fn test_critical_courses_run_before_construction() {
        let mut b = ModelBuilder::new();
        let mut courses = Vec::new();
        for (name, day) in [("A", DayCode::MON), ("B", DayCode::MON), ("C", DayCode::WED)] {
            let offering = b.add_offering(name);
            let course = b.add_course(offering, name, UNLIMITED, 3.0).unwrap();
            let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
            let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
            b.add_section(
                subpart,
                SectionSpec::unlimited("1").with_time(TimeLocation::new(day, 96, 12)),
            )
            .unwrap();
            courses.push(course);
        }
        let s = b.add_student(StudentSpec::new(1));
        b.add_course_request(s, CourseRequestSpec::new([courses[0]])).unwrap();
        b.add_course_request(
            s,
            CourseRequestSpec::new([courses[1]]).with_priority(RequestPriority::Critical),
        )
        .unwrap();
        let c = b.add_course_request(s, CourseRequestSpec::new([courses[2]])).unwrap();
        let model = b.build().unwrap();

        let outcome = SolverBuilder::new(config(2)).build().solve(&model);

        let phases = &outcome.report.phases;
        assert_eq!(phases[0].name, "CriticalCourses");
        assert_eq!(phases[0].applied, 1);
        assert!(phases[0].value_change < 0.0);
        assert_eq!(phases[1].name, "PriorityConstruction");
        assert!(phases[1].value_change <= 0.0);
        assert!(outcome.assignment.is_assigned(c));
    }

    #[test]
    fn test_parallel_run_is_not_worse_than_empty() {
        let instance = generate(&SyntheticParams::small(5)).unwrap();
        let model = &instance.model;
        let outcome = SolverBuilder::new(config(5)).with_threads(4).build().solve(model);

        assert_report_matches(model, &outcome);
        assert!(outcome.report.value < 0.0);
        assert!(outcome.report.phases.iter().all(|p| p.abandoned <= p.statistics.selections));
    }

    #[test]
    fn test_zero_time_limit_returns_the_start() {
        let instance = generate(&SyntheticParams::small(1)).unwrap();
        let model = &instance.model;
        let outcome = SolverBuilder::new(config(1))
            .with_time_limit(Duration::ZERO)
            .build()
            .solve(model);

        assert_eq!(outcome.report.termination, TerminationReason::TimeLimit);
        assert_eq!(outcome.report.rounds, 0);
        assert_eq!(outcome.assignment.nr_assigned(), 0);
        assert!(outcome.report.phases.iter().all(|p| p.passes == 0));
    }

    #[test]
    fn test_online_mode_constructs_with_online_selection() {
        let instance = generate(&SyntheticParams::small(4)).unwrap();
        let model = &instance.model;
        let outcome = SolverBuilder::new(config(4)).with_online(true).build().solve(model);

        assert_report_matches(model, &outcome);
        assert_eq!(outcome.report.phases[1].name, "Online");
        assert!(outcome.report.value < 0.0);
    }

    #[test]
    fn test_mpp_starts_from_initial_values() {
        let mut config = config(6);
        config.with_mpp(true, true);
        let instance = generate_with(&SyntheticParams::small(6).with_initial_assignments(), |b| {
            config.configure(b)
        })
        .unwrap();
        let model = &instance.model;
        assert!(model.is_mpp());
        let outcome = SolverBuilder::new(config).build().solve(model);

        assert_report_matches(model, &outcome);
        let first = &outcome.report.phases[0];
        assert_eq!(first.name, "AssignInitial");
        assert_eq!(outcome.report.phases[1].name, "CriticalCourses");
        assert!(first.applied > 0);
        assert!(outcome.report.value < 0.0);
        assert!(
            outcome
                .assignment
                .assigned()
                .any(|(r, e)| model.request(r).initial() == Some(e))
        );
    }
}
