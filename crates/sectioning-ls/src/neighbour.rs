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

use sectioning_model::{
    Assignment, Enrollment, Model,
    index::{RequestId, StudentId},
};
use sectioning_search::neighbour::{Neighbour, apply_changes, changes_fit, value_of_changes};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapKind {
    /// A student takes a value away from others, who are re-seated.
    Student,
    /// A request moves to a cheaper value, possibly trading it with the
    /// students holding it.
    Enrollment,
}

/// The outcome of a swap exploration: one value per touched request, applied
/// at once. Requests of displaced students appear once, with their
/// replacement value.
#[derive(Debug, Clone)]
pub struct SwapNeighbour {
    kind: SwapKind,
    student: StudentId,
    changes: Vec<(RequestId, Option<Enrollment>)>,
    value: f64,
}

impl SwapNeighbour {
    pub fn new(
        kind: SwapKind,
        student: StudentId,
        changes: Vec<(RequestId, Option<Enrollment>)>,
        value: f64,
    ) -> Self {
        debug_assert!(
            changes
                .iter()
                .enumerate()
                .all(|(i, (r, _))| changes[..i].iter().all(|(o, _)| o != r)),
            "called `SwapNeighbour::new` with a request changed twice"
        );
        Self {
            kind,
            student,
            changes,
            value,
        }
    }

    #[inline]
    pub fn kind(&self) -> SwapKind {
        self.kind
    }

    #[inline]
    pub fn changes(&self) -> &[(RequestId, Option<Enrollment>)] {
        &self.changes
    }

    /// Objective change measured during the exploration.
    #[inline]
    pub fn found_value(&self) -> f64 {
        self.value
    }
}

impl Neighbour for SwapNeighbour {
    fn name(&self) -> &str {
        match self.kind {
            SwapKind::Student => "SwapStudent",
            SwapKind::Enrollment => "EnrollmentSwap",
        }
    }

    fn student(&self) -> Option<StudentId> {
        Some(self.student)
    }

    fn value(&self, model: &Model, assignment: &Assignment) -> f64 {
        value_of_changes(model, assignment, &self.changes)
    }

    fn is_consistent(&self, model: &Model, assignment: &Assignment) -> bool {
        changes_fit(model, assignment, &self.changes)
    }

    fn assign(&self, model: &Model, assignment: &mut Assignment) {
        apply_changes(model, assignment, &self.changes);
    }
}

impl std::fmt::Display for SwapNeighbour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}", self.name(), self.student)?;
        for (request, value) in &self.changes {
            match value {
                Some(e) => write!(f, ", {} -> {}", request, e)?,
                None => write!(f, ", {} -> none", request)?,
            }
        }
        write!(f, ", {:+.4})", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioning_model::{
        builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec},
        offering::UNLIMITED,
    };

    #[test]
    fn test_applying_twice_equals_applying_once() {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("ART 150");
        let course = b.add_course(offering, "ART 150", UNLIMITED, 2.0).unwrap();
        let config = b.add_config(offering, "Studio", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Studio", None, false).unwrap();
        let first = b.add_section(subpart, SectionSpec::new("1", 1)).unwrap();
        let second = b.add_section(subpart, SectionSpec::new("2", 1)).unwrap();
        let s1 = b.add_student(StudentSpec::new(1));
        let r1 = b.add_course_request(s1, CourseRequestSpec::new([course])).unwrap();
        let s2 = b.add_student(StudentSpec::new(2));
        let r2 = b.add_course_request(s2, CourseRequestSpec::new([course])).unwrap();
        let held = b.enrollment(r2, course, &[first]).unwrap();
        let taken = b.enrollment(r1, course, &[first]).unwrap();
        let moved = b.enrollment(r2, course, &[second]).unwrap();
        let model = b.build().unwrap();

        let mut assignment = Assignment::new(&model);
        assignment.assign(&model, held);
        let neighbour = SwapNeighbour::new(
            SwapKind::Student,
            s1,
            vec![(r2, Some(moved.clone())), (r1, Some(taken.clone()))],
            -1.0,
        );
        assert!(neighbour.is_consistent(&model, &assignment));
        assert!(neighbour.value(&model, &assignment) < 0.0);

        neighbour.assign(&model, &mut assignment);
        let once = assignment.clone();
        neighbour.assign(&model, &mut assignment);
        assert_eq!(assignment, once);
        assert_eq!(assignment.value(r1), Some(&taken));
        assert_eq!(assignment.value(r2), Some(&moved));
        assert_eq!(neighbour.name(), "SwapStudent");
        assert!(neighbour.to_string().starts_with("SwapStudent("));
    }
}
