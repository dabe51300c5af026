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

use crate::{
    policy::{Policy, SearchSettings},
    selectors::SelectorCore,
};
use sectioning_model::{Assignment, Model, index::StudentId, request::RequestPriority};
use sectioning_search::{
    config::SectioningConfig,
    neighbour::Proposal,
    order::StudentOrder,
    selection::{NeighbourSelection, WorkUnit},
    solution::Solution,
    stats::SelectionStatistics,
};

/// Repeated passes over the students with an unassigned request at or above
/// a priority tier, searching only over those requests (and, in MPP, the
/// requests with an initial value). Other requests keep their value unless
/// it stands in the way. A schedule is taken when it leaves fewer critical
/// requests unassigned.
///
/// Passes stop after `rounds` or after a pass that changed nothing.
#[derive(Debug)]
pub struct CriticalCoursesSelection {
    core: SelectorCore,
    policy: Policy,
    rounds: usize,
}

impl CriticalCoursesSelection {
    pub fn new(config: &SectioningConfig) -> Self {
        Self::with_settings(
            SearchSettings::from_config(config),
            config.critical_tier,
            config.critical_rounds,
            config.student_order,
            config.seed,
        )
    }

    pub fn with_settings(
        settings: SearchSettings,
        tier: RequestPriority,
        rounds: usize,
        order: StudentOrder,
        seed: u64,
    ) -> Self {
        Self {
            core: SelectorCore::new("CriticalCourses", settings, order, seed),
            policy: Policy::Critical { tier },
            rounds,
        }
    }

    #[inline]
    pub fn tier(&self) -> Option<RequestPriority> {
        match self.policy {
            Policy::Critical { tier } => Some(tier),
            _ => None,
        }
    }

    fn has_unassigned_critical(
        &self,
        model: &Model,
        assignment: &Assignment,
        student: StudentId,
    ) -> bool {
        model.student(student).requests().iter().any(|&r| {
            !assignment.is_assigned(r) && self.policy.is_critical(model.request(r))
        })
    }
}

impl NeighbourSelection for CriticalCoursesSelection {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn init(&self, solution: &Solution<'_>) -> bool {
        let passes = self.core.passes();
        if passes >= self.rounds || (passes > 0 && !self.core.made_progress()) {
            return false;
        }
        let model = solution.model();
        let assignment = solution.read();
        self.core
            .start_pass(model, |s| self.has_unassigned_critical(model, &assignment, s))
            > 0
    }

    fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
        self.core.next_unit()
    }

    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
        self.core.search_student(solution, unit, &self.policy)
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
    use crate::selectors::testing::run_to_end;
    use sectioning_core::time::{DayCode, TimeLocation};
    use sectioning_model::{
        builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec},
        offering::UNLIMITED,
    };
    use std::time::Duration;

    /// Two students want one seat; only the second one marks it critical.
    #[test]
    fn test_critical_student_takes_the_seat() {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("BIO 201");
        let course = b.add_course(offering, "BIO 201", UNLIMITED, 3.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        let section = b.add_section(subpart, SectionSpec::new("1", 1)).unwrap();
        let relaxed = b.add_student(StudentSpec::new(1));
        b.add_course_request(relaxed, CourseRequestSpec::new([course])).unwrap();
        let eager = b.add_student(StudentSpec::new(2));
        let wanted = b
            .add_course_request(
                eager,
                CourseRequestSpec::new([course]).with_priority(RequestPriority::Critical),
            )
            .unwrap();
        let e = b.enrollment(wanted, course, &[section]).unwrap();
        let model = b.build().unwrap();

        let solution = Solution::new(&model);
        let selection = CriticalCoursesSelection::with_settings(
            SearchSettings::default().with_timeout(Duration::from_secs(60)),
            RequestPriority::Important,
            5,
            StudentOrder::Sequential,
            0,
        );
        assert_eq!(run_to_end(&selection, &solution), 1);
        assert_eq!(solution.read().value(wanted), Some(&e));
        assert!(!solution.read().is_assigned(model.student(relaxed).requests()[0]));
        // The second pass finds nobody left and ends the phase.
        assert_eq!(selection.statistics().selections, 1);
    }

    /// The student holds A (Monday) and C (Wednesday); critical B overlaps A.
    #[test]
    fn test_unrelated_courses_survive_the_critical_pass() {
        let mut b = ModelBuilder::new();
        let mut courses = Vec::new();
        let mut sections = Vec::new();
        for (name, day) in [("A", DayCode::MON), ("B", DayCode::MON), ("C", DayCode::WED)] {
            let offering = b.add_offering(name);
            let course = b.add_course(offering, name, UNLIMITED, 3.0).unwrap();
            let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
            let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
            let section = b
                .add_section(
                    subpart,
                    SectionSpec::unlimited("1").with_time(TimeLocation::new(day, 96, 12)),
                )
                .unwrap();
            courses.push(course);
            sections.push(section);
        }
        let s = b.add_student(StudentSpec::new(1));
        let a = b.add_course_request(s, CourseRequestSpec::new([courses[0]])).unwrap();
        let critical = b
            .add_course_request(
                s,
                CourseRequestSpec::new([courses[1]]).with_priority(RequestPriority::Critical),
            )
            .unwrap();
        let c = b.add_course_request(s, CourseRequestSpec::new([courses[2]])).unwrap();
        let held_a = b.enrollment(a, courses[0], &[sections[0]]).unwrap();
        let wanted = b.enrollment(critical, courses[1], &[sections[1]]).unwrap();
        let held_c = b.enrollment(c, courses[2], &[sections[2]]).unwrap();
        let model = b.build().unwrap();

        let mut assignment = Assignment::new(&model);
        assignment.assign(&model, held_a);
        assignment.assign(&model, held_c.clone());
        let solution = Solution::with_assignment(&model, assignment);
        let selection = CriticalCoursesSelection::with_settings(
            SearchSettings::default().with_timeout(Duration::from_secs(60)),
            RequestPriority::Important,
            5,
            StudentOrder::Sequential,
            0,
        );
        assert_eq!(run_to_end(&selection, &solution), 1);

        let assignment = solution.read();
        assert!(!assignment.is_assigned(a));
        assert_eq!(assignment.value(critical), Some(&wanted));
        assert_eq!(assignment.value(c), Some(&held_c));
    }

    #[test]
    fn test_rounds_limit_passes() {
        let instance = sectioning_model::synthetic::generate(
            &sectioning_model::synthetic::SyntheticParams::small(0),
        )
        .unwrap();
        let solution = Solution::new(&instance.model);
        let selection = CriticalCoursesSelection::with_settings(
            SearchSettings::default(),
            RequestPriority::Normal,
            1,
            StudentOrder::Random,
            0,
        );
        assert!(selection.init(&solution));
        while selection.next_unit(&solution).is_some() {}
        assert!(!selection.init(&solution));
    }
}
