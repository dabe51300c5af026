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

//! Online sectioning. Each student is searched twice: first for the schedule
//! with the least crowded sections, then for the best valued schedule whose
//! slots are at most `epsilon` more crowded than that one's.

use crate::{
    policy::{Objective, PenaltySource, Policy, SearchSettings},
    selection::SelectionOutcome,
    selectors::SelectorCore,
};
use sectioning_model::{Assignment, Model, index::StudentId};
use sectioning_search::{
    config::SectioningConfig,
    neighbour::Proposal,
    order::StudentOrder,
    selection::{NeighbourSelection, WorkUnit},
    solution::Solution,
    stats::SelectionStatistics,
};

#[derive(Debug)]
pub struct OnlineSelection {
    core: SelectorCore,
    epsilon: f64,
}

impl OnlineSelection {
    pub fn new(config: &SectioningConfig) -> Self {
        Self::with_settings(
            SearchSettings::from_config(config),
            config.online_epsilon,
            config.student_order,
            config.seed,
        )
    }

    pub fn with_settings(
        settings: SearchSettings,
        epsilon: f64,
        order: StudentOrder,
        seed: u64,
    ) -> Self {
        Self {
            core: SelectorCore::new("Online", settings, order, seed),
            epsilon,
        }
    }

    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Per-slot penalty limits: the online penalties of the least crowded
    /// schedule. `None` when the first search found nothing.
    pub fn limits(
        &self,
        model: &Model,
        assignment: &Assignment,
        student: StudentId,
    ) -> Option<Vec<Option<f64>>> {
        let outcome = self.least_crowded(model, assignment, student);
        limits_of(model, assignment, &outcome)
    }

    fn least_crowded(
        &self,
        model: &Model,
        assignment: &Assignment,
        student: StudentId,
    ) -> SelectionOutcome {
        let settings = self
            .core
            .settings()
            .clone()
            .with_objective(Objective::Penalty(PenaltySource::Online));
        self.core.search_with(model, assignment, student, &settings, &Policy::Standard)
    }
}

fn limits_of(
    model: &Model,
    assignment: &Assignment,
    outcome: &SelectionOutcome,
) -> Option<Vec<Option<f64>>> {
    let best = outcome.best.as_ref()?;
    Some(
        best.iter()
            .map(|slot| slot.as_ref().map(|e| PenaltySource::Online.penalty(model, assignment, e)))
            .collect(),
    )
}

impl NeighbourSelection for OnlineSelection {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn init(&self, solution: &Solution<'_>) -> bool {
        if self.core.passes() > 0 {
            return false;
        }
        self.core.start_pass(solution.model(), |_| true) > 0
    }

    fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
        self.core.next_unit()
    }

    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
        let WorkUnit::Student(student) = unit else {
            return None;
        };
        let model = solution.model();
        let assignment = solution.read();
        let first = self.least_crowded(model, &assignment, student);
        let Some(limits) = limits_of(model, &assignment, &first) else {
            self.core.record(&first, false);
            return None;
        };
        let policy = Policy::Epsilon {
            limits,
            epsilon: self.epsilon,
            source: PenaltySource::Online,
        };
        let settings = self.core.settings().clone().with_objective(Objective::Value);
        let outcome = self.core.search_with(model, &assignment, student, &settings, &policy);
        let proposal = outcome
            .improvement()
            .map(|best| self.core.proposal(model, &assignment, student, best));
        self.core.record_all(&[first, outcome], proposal.is_some());
        proposal
    }

    fn on_applied(&self, _solution: &Solution<'_>, _unit: WorkUnit, _value: f64) {
        self.core.on_applied();
    }

    fn statistics(&self) -> SelectionStatistics {
        self.core.statistics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::online_penalty;
    use crate::selectors::testing::run_to_end;
    use sectioning_model::{
        builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec},
        candidates::enrollments,
        offering::UNLIMITED,
    };
    use std::time::Duration;

    /// One course with an emptier and a fuller section.
    #[test]
    fn test_prefers_the_emptier_section() {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("ECON 101");
        let course = b.add_course(offering, "ECON 101", UNLIMITED, 3.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        let crowded = b.add_section(subpart, SectionSpec::new("1", 4)).unwrap();
        let roomy = b.add_section(subpart, SectionSpec::new("2", 4)).unwrap();
        let mut held = Vec::new();
        for i in 0..3 {
            let s = b.add_student(StudentSpec::new(i));
            let r = b.add_course_request(s, CourseRequestSpec::new([course])).unwrap();
            held.push(b.enrollment(r, course, &[crowded]).unwrap());
        }
        let newcomer = b.add_student(StudentSpec::new(10));
        let wanted = b.add_course_request(newcomer, CourseRequestSpec::new([course])).unwrap();
        let model = b.build().unwrap();

        let mut assignment = Assignment::new(&model);
        for e in held {
            assignment.assign(&model, e);
        }
        let roomy_value = enrollments(&model, wanted)
            .into_iter()
            .find(|e| e.sections() == [roomy])
            .unwrap();
        assert!(online_penalty(&model, &assignment, &roomy_value) < 0.5);

        let solution = Solution::with_assignment(&model, assignment);
        let selection = OnlineSelection::with_settings(
            SearchSettings::default().with_timeout(Duration::from_secs(60)),
            0.1,
            StudentOrder::Sequential,
            0,
        );
        let limits = selection
            .limits(&model, &solution.read(), newcomer)
            .unwrap();
        assert_eq!(limits.len(), 1);
        assert!((limits[0].unwrap() - 0.25).abs() < 1e-9);

        assert!(run_to_end(&selection, &solution) >= 1);
        assert_eq!(solution.read().value(wanted), Some(&roomy_value));
        // Both searches of a student count as one selection.
        assert_eq!(selection.statistics().selections, model.students().len() as u64);
    }
}
