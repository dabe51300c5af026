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

//! Objective of a schedule.
//!
//! Lower is better. Each assigned slot costs `-(request weight × student
//! weight)` where the student weight already accounts for the slot's soft
//! conflicts; unassigned slots cost nothing. Pair conflicts are charged to the
//! later slot only, so the value of a schedule is the plain sum of its slots.

use crate::{
    assignment::Assignment, enrollment::Enrollment, index::StudentId, model::Model,
    quality::slot_conflicts,
};

/// Student weight of slot `idx` given the slots before it.
pub fn slot_weight(model: &Model, schedule: &[Option<Enrollment>], idx: usize) -> f64 {
    let Some(Some(enrollment)) = schedule.get(idx) else {
        return 0.0;
    };
    let conflicts = slot_conflicts(model, schedule, idx);
    model.weights().weight(model, enrollment, &conflicts)
}

/// Cost of slot `idx`.
pub fn slot_cost(model: &Model, schedule: &[Option<Enrollment>], idx: usize) -> f64 {
    match schedule.get(idx) {
        Some(Some(enrollment)) => {
            -model.request(enrollment.request()).weight() * slot_weight(model, schedule, idx)
        }
        _ => 0.0,
    }
}

pub fn schedule_value(model: &Model, schedule: &[Option<Enrollment>]) -> f64 {
    (0..schedule.len())
        .map(|idx| slot_cost(model, schedule, idx))
        .sum()
}

pub fn student_value(model: &Model, assignment: &Assignment, student: StudentId) -> f64 {
    schedule_value(model, &assignment.schedule(model, student))
}

/// Value of the whole assignment.
pub fn total_value(model: &Model, assignment: &Assignment) -> f64 {
    model
        .students()
        .ids()
        .map(|s| student_value(model, assignment, s))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec};
    use crate::offering::UNLIMITED;
    use crate::quality::TimeOverlapConflicts;
    use crate::weights::EqualStudentWeights;
    use sectioning_core::time::{DayCode, TimeLocation};

    #[test]
    fn test_free_time_overlap_is_charged_to_later_slot() {
        let mut b = ModelBuilder::new();
        b.with_student_weights(Box::new(EqualStudentWeights::default()))
            .with_conflict_oracle(Box::new(TimeOverlapConflicts::new()));
        let offering = b.add_offering("ART 100");
        let course = b.add_course(offering, "ART 100", UNLIMITED, 3.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        let section = b
            .add_section(
                subpart,
                SectionSpec::unlimited("1").with_time(TimeLocation::new(DayCode::MON, 96, 12)),
            )
            .unwrap();
        let s = b.add_student(StudentSpec::new(1));
        let course_request = b
            .add_course_request(s, CourseRequestSpec::new([course]))
            .unwrap();
        let free = b
            .add_free_time_request(s, TimeLocation::new(DayCode::MON, 96, 12), false)
            .unwrap();
        let e = b.enrollment(course_request, course, &[section]).unwrap();
        let model = b.build().unwrap();

        let schedule = vec![Some(e), Some(Enrollment::free_time(free))];
        assert_eq!(slot_cost(&model, &schedule, 0), -1.0);
        // The free time is fully covered: half of its weight is lost.
        assert!((slot_cost(&model, &schedule, 1) + 0.5).abs() < 1e-9);
        assert!((schedule_value(&model, &schedule) + 1.5).abs() < 1e-9);

        let mut assignment = Assignment::new(&model);
        assert_eq!(total_value(&model, &assignment), 0.0);
        for e in schedule.into_iter().flatten() {
            assignment.assign(&model, e);
        }
        assert!((total_value(&model, &assignment) + 1.5).abs() < 1e-9);
    }
}
