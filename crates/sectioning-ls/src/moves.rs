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

//! Building blocks shared by the swap movers: who may be displaced, where a
//! displaced request goes, and the tentative execution of a move.
//!
//! Every trial is performed on the shared assignment through an
//! [`AssignmentJournal`] and rolled back before the next one, so each trial
//! sees the state the exploration started from.

use sectioning_model::{
    Assignment, Enrollment, Model,
    candidates::available_enrollments,
    constraints::is_pinned,
    index::{RequestId, StudentId},
    journal::AssignmentJournal,
    objective,
};
use sectioning_search::{config::SectioningConfig, neighbour::value_of_changes};
use smallvec::SmallVec;

/// Which enrollments of other students a swap may take away.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapRules {
    pub allow_unassign_higher_priority: bool,
    pub allow_unassign_critical: bool,
}

impl SwapRules {
    pub fn from_config(config: &SectioningConfig) -> Self {
        Self {
            allow_unassign_higher_priority: config.allow_unassign_higher_priority,
            allow_unassign_critical: config.allow_unassign_critical,
        }
    }

    /// Whether `conflict` may be unassigned so that `student` can take a
    /// value. Pinned values never may; the student's own values always may.
    pub fn can_unassign(&self, model: &Model, student: StudentId, conflict: &Enrollment) -> bool {
        if is_pinned(model, conflict) {
            return false;
        }
        let request = model.request(conflict.request());
        let owner = request.student();
        if owner == student {
            return true;
        }
        if !self.allow_unassign_critical && request.request_priority().is_critical() {
            return false;
        }
        !(!self.allow_unassign_higher_priority
            && model
                .student(owner)
                .priority()
                .is_higher_than(model.student(student).priority()))
    }
}

/// Value of the owner's schedule with `value` in place of whatever its request
/// holds.
pub(crate) fn schedule_value_with(
    model: &Model,
    assignment: &Assignment,
    value: &Enrollment,
) -> f64 {
    let owner = model.request(value.request()).student();
    let mut schedule = assignment.schedule(model, owner);
    if let Some(position) = model
        .student(owner)
        .requests()
        .iter()
        .position(|&r| r == value.request())
    {
        schedule[position] = Some(value.clone());
    }
    objective::schedule_value(model, &schedule)
}

/// The cheapest value other than `previous` that `request` can take in the
/// current assignment without displacing anything. Ties go to the first in
/// enrollment order.
pub fn best_swap(
    model: &Model,
    assignment: &Assignment,
    request: RequestId,
    previous: &Enrollment,
) -> Option<Enrollment> {
    available_enrollments(model, assignment, request)
        .into_iter()
        .filter(|e| e != previous && model.is_consistent(assignment, e))
        .map(|e| (schedule_value_with(model, assignment, &e), e))
        .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, e)| e)
}

/// Changes of one move, one entry per request; a later entry for the same
/// request replaces the earlier one.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    changes: Vec<(RequestId, Option<Enrollment>)>,
}

impl ChangeSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, request: RequestId, value: Option<Enrollment>) {
        match self.changes.iter_mut().find(|(r, _)| *r == request) {
            Some(entry) => entry.1 = value,
            None => self.changes.push((request, value)),
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[(RequestId, Option<Enrollment>)] {
        &self.changes
    }

    #[inline]
    pub fn into_vec(self) -> Vec<(RequestId, Option<Enrollment>)> {
        self.changes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Result of one trial.
#[derive(Debug)]
pub enum Trial {
    /// The move and its objective change.
    Resolved { changes: ChangeSet, value: f64 },
    /// A displaced request found no place; its student is the culprit.
    Unresolved { blocking: StudentId },
}

/// Tentatively unassigns `conflicts`, assigns `candidate` and re-seats every
/// displaced request of another student with [`best_swap`]. The assignment
/// is rolled back before returning, whatever the result.
pub fn try_move(
    model: &Model,
    assignment: &mut Assignment,
    candidate: &Enrollment,
    conflicts: &[Enrollment],
) -> Trial {
    let student = model.request(candidate.request()).student();
    let mut journal = AssignmentJournal::with_capacity(2 * conflicts.len() + 1);
    let mut changes = ChangeSet::new();

    for conflict in conflicts {
        journal.unassign(model, assignment, conflict.request());
        changes.set(conflict.request(), None);
    }
    journal.assign(model, assignment, candidate.clone());
    changes.set(candidate.request(), Some(candidate.clone()));

    let displaced: SmallVec<[&Enrollment; 4]> = conflicts
        .iter()
        .filter(|c| model.request(c.request()).student() != student)
        .collect();
    for conflict in displaced {
        match best_swap(model, assignment, conflict.request(), conflict) {
            Some(replacement) => {
                changes.set(conflict.request(), Some(replacement.clone()));
                journal.assign(model, assignment, replacement);
            }
            None => {
                journal.rollback(model, assignment);
                return Trial::Unresolved {
                    blocking: model.request(conflict.request()).student(),
                };
            }
        }
    }

    journal.rollback(model, assignment);
    let value = value_of_changes(model, assignment, changes.as_slice());
    Trial::Resolved { changes, value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioning_model::{
        builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec},
        offering::UNLIMITED,
        student::StudentPriority,
    };

    #[test]
    fn test_change_set_keeps_last_value() {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("PHYS 101");
        let course = b.add_course(offering, "PHYS 101", UNLIMITED, 4.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        let section = b.add_section(subpart, SectionSpec::unlimited("1")).unwrap();
        let s = b.add_student(StudentSpec::new(1));
        let r = b.add_course_request(s, CourseRequestSpec::new([course])).unwrap();
        let e = b.enrollment(r, course, &[section]).unwrap();

        let mut changes = ChangeSet::new();
        assert!(changes.is_empty());
        changes.set(r, None);
        changes.set(r, Some(e.clone()));
        assert_eq!(changes.as_slice(), &[(r, Some(e))]);
    }

    #[test]
    fn test_protection_rules() {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("MUS 110");
        let course = b.add_course(offering, "MUS 110", UNLIMITED, 1.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        let section = b.add_section(subpart, SectionSpec::unlimited("1")).unwrap();
        let senior = b.add_student(StudentSpec::new(1).with_priority(StudentPriority::Senior));
        let held = b.add_course_request(senior, CourseRequestSpec::new([course])).unwrap();
        let normal = b.add_student(StudentSpec::new(2));
        let e = b.enrollment(held, course, &[section]).unwrap();
        let model = b.build().unwrap();

        let strict = SwapRules::default();
        assert!(!strict.can_unassign(&model, normal, &e));
        assert!(strict.can_unassign(&model, senior, &e));
        let lenient = SwapRules {
            allow_unassign_higher_priority: true,
            allow_unassign_critical: false,
        };
        assert!(lenient.can_unassign(&model, normal, &e));
    }
}
