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

//! Hard constraints of a student's schedule and the global conflict query.
//!
//! The pairwise and credit checks are shared by every search: the branch and
//! bound applies them to a partial schedule, [`Model::conflicts`] to the
//! global assignment. A search that agrees with one agrees with the other.

use crate::{
    assignment::Assignment,
    candidates::overlaps_unavailability,
    enrollment::Enrollment,
    index::{RequestId, StudentId},
    limits,
    model::Model,
};
use std::{cmp::Reverse, collections::BTreeMap};

const CREDIT_EPSILON: f32 = 1e-4;

/// Whether two values of the same student's requests cannot be held together:
/// both in one offering, overlapping hard, or splitting a linked section group.
pub fn incompatible(model: &Model, a: &Enrollment, b: &Enrollment) -> bool {
    if a.request() == b.request() {
        return false;
    }
    let (oa, ob) = (a.offering(model), b.offering(model));
    if let (Some(x), Some(y)) = (oa, ob) {
        if x == y {
            return true;
        }
        let student = model.student(model.request(a.request()).student());
        for link in student.linked_sections() {
            if link.involves(x)
                && link.involves(y)
                && link.is_linked(x, a.sections()) != link.is_linked(y, b.sections())
            {
                return true;
            }
        }
    }
    a.is_overlapping(model, b)
}

/// Credit of a set of values.
pub fn total_credit<'a>(model: &Model, values: impl IntoIterator<Item = &'a Enrollment>) -> f32 {
    values.into_iter().map(|e| e.credit(model)).sum()
}

/// Whether `credit` is above the student's maximum.
#[inline]
pub fn exceeds_max_credit(model: &Model, student: StudentId, credit: f32) -> bool {
    model
        .student(student)
        .max_credit()
        .is_some_and(|max| credit > max + CREDIT_EPSILON)
}

/// Whether the value may never be taken away from its request: it is fixed,
/// or it is the initial value of a request that must keep it.
pub fn is_pinned(model: &Model, enrollment: &Enrollment) -> bool {
    let request = model.request(enrollment.request());
    if request.fixed().is_some() {
        return true;
    }
    let settings = model.settings();
    settings.mpp
        && settings.keep_initial_assignments
        && request.initial() == Some(enrollment)
}

impl Model {
    /// Values that must be unassigned for `enrollment` to be assigned. When
    /// the list contains `enrollment` itself, it cannot be assigned at all.
    ///
    /// Covered: hard unavailability, hard overlaps, one value per offering,
    /// linked sections, maximum credit, alternative slots and every capacity
    /// and reservation limit. The request's own current value is replaced, not
    /// reported.
    pub fn conflicts(&self, assignment: &Assignment, enrollment: &Enrollment) -> Vec<Enrollment> {
        let request = self.request(enrollment.request());
        let student_id = request.student();
        let student = self.student(student_id);
        let infeasible = || vec![enrollment.clone()];

        if overlaps_unavailability(self, student_id, enrollment) {
            return infeasible();
        }

        let others: Vec<&Enrollment> = student
            .requests()
            .iter()
            .filter(|&&r| r != enrollment.request())
            .filter_map(|&r| assignment.value(r))
            .collect();
        let mut dropped: BTreeMap<RequestId, Enrollment> = BTreeMap::new();

        for &other in &others {
            if incompatible(self, enrollment, other) {
                dropped.insert(other.request(), other.clone());
            }
        }

        if let Some(max) = student.max_credit() {
            let mut credit = enrollment.credit(self)
                + total_credit(
                    self,
                    others
                        .iter()
                        .copied()
                        .filter(|o| !dropped.contains_key(&o.request())),
                );
            if credit > max + CREDIT_EPSILON {
                let mut kept: Vec<&Enrollment> = others
                    .iter()
                    .copied()
                    .filter(|o| o.is_course() && !dropped.contains_key(&o.request()))
                    .collect();
                kept.sort_by_key(|o| Reverse(self.request(o.request()).priority()));
                for other in kept {
                    if credit <= max + CREDIT_EPSILON {
                        break;
                    }
                    credit -= other.credit(self);
                    dropped.insert(other.request(), other.clone());
                }
                if credit > max + CREDIT_EPSILON {
                    return infeasible();
                }
            }
        }

        // Alternative slots: the student may not hold more values than
        // non-alternative requests.
        let mut held = 1 + others
            .iter()
            .filter(|o| !dropped.contains_key(&o.request()))
            .count();
        while held > student.nr_requests() {
            let worst = others
                .iter()
                .copied()
                .filter(|o| {
                    !dropped.contains_key(&o.request())
                        && self.request(o.request()).is_alternative()
                })
                .max_by_key(|o| self.request(o.request()).priority());
            let Some(worst) = worst else {
                return infeasible();
            };
            let worst_priority = self.request(worst.request()).priority();
            if request.is_alternative() && worst_priority < request.priority() {
                return infeasible();
            }
            dropped.insert(worst.request(), worst.clone());
            held -= 1;
        }

        match limits::capacity_conflicts(self, assignment, enrollment) {
            None => return infeasible(),
            Some(adepts) => {
                for r in adepts {
                    if let Some(value) = assignment.value(r) {
                        dropped.insert(r, value.clone());
                    }
                }
            }
        }

        if dropped.values().any(|e| is_pinned(self, e)) {
            return infeasible();
        }
        dropped.into_values().collect()
    }

    /// Whether `enrollment` can be assigned without unassigning anything.
    pub fn is_consistent(&self, assignment: &Assignment, enrollment: &Enrollment) -> bool {
        self.conflicts(assignment, enrollment).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec};
    use crate::index::{CourseId, OfferingId, SectionId};
    use crate::offering::UNLIMITED;
    use crate::student::LinkedSections;
    use sectioning_core::time::{DayCode, TimeLocation};

    struct Fixture {
        model: Model,
        requests: Vec<RequestId>,
        courses: Vec<CourseId>,
        sections: Vec<Vec<SectionId>>,
    }

    /// Three one-subpart offerings with two sections each. Section 0 of every
    /// offering meets Monday 8:00, section 1 on a different day.
    fn fixture(student: StudentSpec, alternatives: usize, limit: i32) -> Fixture {
        let mut b = ModelBuilder::new();
        let mut courses = Vec::new();
        let mut sections = Vec::new();
        for (i, name) in ["MATH 101", "PHYS 101", "CHEM 101"].into_iter().enumerate() {
            let offering = b.add_offering(name);
            let course = b.add_course(offering, name, UNLIMITED, 3.0).unwrap();
            let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
            let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
            let day = [DayCode::TUE, DayCode::WED, DayCode::THU][i];
            let s0 = b
                .add_section(
                    subpart,
                    SectionSpec::new("1", limit).with_time(TimeLocation::new(DayCode::MON, 96, 12)),
                )
                .unwrap();
            let s1 = b
                .add_section(
                    subpart,
                    SectionSpec::new("2", limit).with_time(TimeLocation::new(day, 96, 12)),
                )
                .unwrap();
            courses.push(course);
            sections.push(vec![s0, s1]);
        }
        let s = b.add_student(student);
        let mut requests = Vec::new();
        for (i, &course) in courses.iter().enumerate() {
            let mut spec = CourseRequestSpec::new([course]);
            if i >= courses.len() - alternatives {
                spec = spec.alternative();
            }
            requests.push(b.add_course_request(s, spec).unwrap());
        }
        Fixture {
            model: b.build().unwrap(),
            requests,
            courses,
            sections,
        }
    }

    fn enroll(f: &Fixture, i: usize, section: usize) -> Enrollment {
        let s = f.sections[i][section];
        Enrollment::course(f.requests[i], 0, f.courses[i], f.model.section_config(s), [s])
    }

    #[test]
    fn test_overlap_displaces_other_request() {
        let f = fixture(StudentSpec::new(1), 0, UNLIMITED);
        let mut a = Assignment::new(&f.model);
        a.assign(&f.model, enroll(&f, 0, 0));

        let conflicts = f.model.conflicts(&a, &enroll(&f, 1, 0));
        assert_eq!(conflicts, vec![enroll(&f, 0, 0)]);
        assert!(f.model.is_consistent(&a, &enroll(&f, 1, 1)));
    }

    #[test]
    fn test_max_credit_drops_least_important() {
        let f = fixture(StudentSpec::new(1).with_credit(0.0, Some(6.0)), 0, UNLIMITED);
        let mut a = Assignment::new(&f.model);
        a.assign(&f.model, enroll(&f, 0, 1));
        a.assign(&f.model, enroll(&f, 1, 1));

        let conflicts = f.model.conflicts(&a, &enroll(&f, 2, 1));
        assert_eq!(conflicts, vec![enroll(&f, 1, 1)]);
    }

    #[test]
    fn test_alternative_without_slot_is_infeasible() {
        let f = fixture(StudentSpec::new(1), 1, UNLIMITED);
        let mut a = Assignment::new(&f.model);
        a.assign(&f.model, enroll(&f, 0, 1));
        a.assign(&f.model, enroll(&f, 1, 1));

        let alternative = enroll(&f, 2, 1);
        assert_eq!(f.model.conflicts(&a, &alternative), vec![alternative.clone()]);

        a.unassign(&f.model, f.requests[1]);
        assert!(f.model.is_consistent(&a, &alternative));
    }

    #[test]
    fn test_linked_sections_must_agree() {
        // Section 2 of MATH 101 goes with section 2 of PHYS 101.
        let link = LinkedSections::new([
            (OfferingId::new(0), SectionId::new(1)),
            (OfferingId::new(1), SectionId::new(3)),
        ]);
        let f = fixture(StudentSpec::new(1).with_linked_sections(link), 0, UNLIMITED);
        let mut a = Assignment::new(&f.model);
        a.assign(&f.model, enroll(&f, 0, 1));

        // Linked in MATH but not in PHYS.
        assert!(incompatible(&f.model, &enroll(&f, 1, 0), &enroll(&f, 0, 1)));
        assert!(!incompatible(&f.model, &enroll(&f, 1, 1), &enroll(&f, 0, 1)));
        assert_eq!(f.model.conflicts(&a, &enroll(&f, 2, 1)), vec![]);
    }

    #[test]
    fn test_full_section_of_other_student() {
        let f = fixture(StudentSpec::new(1), 0, 0);
        let a = Assignment::new(&f.model);
        let e = enroll(&f, 0, 0);
        assert_eq!(f.model.conflicts(&a, &e), vec![e.clone()]);
    }
}
