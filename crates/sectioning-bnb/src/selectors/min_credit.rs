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
use sectioning_model::{Assignment, Model, constraints::total_credit, index::StudentId};
use sectioning_search::{
    config::SectioningConfig,
    neighbour::Proposal,
    order::StudentOrder,
    selection::{NeighbourSelection, WorkUnit},
    solution::Solution,
    stats::SelectionStatistics,
};

/// One pass over the students below their minimum credit. The search stops
/// as soon as the credit is reached, and a schedule is taken when it misses
/// less credit than the current one.
#[derive(Debug)]
pub struct MinCreditSelection {
    core: SelectorCore,
}

impl MinCreditSelection {
    pub fn new(config: &SectioningConfig) -> Self {
        Self::with_settings(
            SearchSettings::from_config(config),
            config.student_order,
            config.seed,
        )
    }

    pub fn with_settings(settings: SearchSettings, order: StudentOrder, seed: u64) -> Self {
        Self {
            core: SelectorCore::new("MinCredit", settings, order, seed),
        }
    }
}

/// Whether the student holds less than its minimum credit.
pub fn below_min_credit(model: &Model, assignment: &Assignment, student: StudentId) -> bool {
    let min = model.student(student).min_credit();
    if min <= 0.0 {
        return false;
    }
    let held = total_credit(
        model,
        model
            .student(student)
            .requests()
            .iter()
            .filter_map(|&r| assignment.value(r)),
    );
    held < min
}

impl NeighbourSelection for MinCreditSelection {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn init(&self, solution: &Solution<'_>) -> bool {
        if self.core.passes() > 0 {
            return false;
        }
        let model = solution.model();
        let assignment = solution.read();
        self.core
            .start_pass(model, |s| below_min_credit(model, &assignment, s))
            > 0
    }

    fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
        self.core.next_unit()
    }

    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
        self.core.search_student(solution, unit, &Policy::MinCredit)
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

    #[test]
    fn test_only_students_below_minimum_are_searched() {
        let mut b = ModelBuilder::new();
        let mut courses = Vec::new();
        for (i, name) in ["A", "B"].into_iter().enumerate() {
            let offering = b.add_offering(name);
            let course = b.add_course(offering, name, UNLIMITED, 3.0).unwrap();
            let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
            let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
            b.add_section(
                subpart,
                SectionSpec::unlimited("1")
                    .with_time(TimeLocation::new(DayCode::WED, 96 + 24 * i as u16, 12)),
            )
            .unwrap();
            courses.push(course);
        }
        let needy = b.add_student(StudentSpec::new(1).with_credit(3.0, None));
        for &course in &courses {
            b.add_course_request(needy, CourseRequestSpec::new([course])).unwrap();
        }
        let content = b.add_student(StudentSpec::new(2));
        b.add_course_request(content, CourseRequestSpec::new([courses[0]])).unwrap();
        let model = b.build().unwrap();

        let solution = Solution::new(&model);
        assert!(below_min_credit(&model, &solution.read(), needy));
        assert!(!below_min_credit(&model, &solution.read(), content));

        let selection = MinCreditSelection::with_settings(
            SearchSettings::default().with_timeout(Duration::from_secs(60)),
            StudentOrder::Sequential,
            0,
        );
        assert_eq!(run_to_end(&selection, &solution), 1);
        assert_eq!(selection.statistics().selections, 1);
        assert_eq!(solution.read().nr_assigned_of(&model, needy), 1);
        assert!(!below_min_credit(&model, &solution.read(), needy));
        assert_eq!(solution.read().nr_assigned_of(&model, content), 0);
    }
}
