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

//! # Neighbours
//!
//! A `Neighbour` is the only way a selection communicates a decision: an
//! atomic transition of the shared assignment (a set of request → value
//! changes) together with the objective change it causes. Selections create
//! neighbours; the driver applies them through
//! [`Solution::apply`](crate::solution::Solution::apply).

use sectioning_model::{
    Assignment, Enrollment, Model,
    index::{RequestId, StudentId},
    objective,
};

pub trait Neighbour: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// The student the transition is about, if there is a single one.
    fn student(&self) -> Option<StudentId>;

    /// Change of the total objective applying the transition to `assignment`
    /// would cause. Negative is an improvement.
    fn value(&self, model: &Model, assignment: &Assignment) -> f64;

    /// Whether the transition can be applied to `assignment` as it stands:
    /// every value it assigns fits once the values it unassigns are gone.
    fn is_consistent(&self, model: &Model, assignment: &Assignment) -> bool;

    /// Applies the transition. Applying it twice in a row leaves the same
    /// assignment as applying it once.
    fn assign(&self, model: &Model, assignment: &mut Assignment);
}

impl std::fmt::Display for dyn Neighbour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Neighbour({})", self.name())
    }
}

/// A neighbour together with the assignment revision it was computed
/// against.
#[derive(Debug)]
pub struct Proposal {
    pub neighbour: Box<dyn Neighbour>,
    pub revision: u64,
    /// The proposal is only worth applying while it lowers the objective.
    pub improving: bool,
}

impl Proposal {
    #[inline]
    pub fn new(neighbour: Box<dyn Neighbour>, revision: u64) -> Self {
        Self {
            neighbour,
            revision,
            improving: false,
        }
    }

    /// Marks the proposal as one that must still lower the objective when it
    /// is applied to a newer revision.
    #[inline]
    pub fn improving(mut self) -> Self {
        self.improving = true;
        self
    }
}

/// Values of the student's requests after `changes` (request, new value) are
/// applied to `assignment`. Requests not in `changes` keep their value.
pub fn schedule_after(
    model: &Model,
    assignment: &Assignment,
    student: StudentId,
    changes: &[(RequestId, Option<Enrollment>)],
) -> Vec<Option<Enrollment>> {
    model
        .student(student)
        .requests()
        .iter()
        .map(|&r| match changes.iter().find(|(c, _)| *c == r) {
            Some((_, value)) => value.clone(),
            None => assignment.value(r).cloned(),
        })
        .collect()
}

/// Objective change of replacing the values of some requests of one or more
/// students. Only the students touched by `changes` are evaluated.
pub fn value_of_changes(
    model: &Model,
    assignment: &Assignment,
    changes: &[(RequestId, Option<Enrollment>)],
) -> f64 {
    let mut students: Vec<StudentId> = changes
        .iter()
        .map(|(r, _)| model.request(*r).student())
        .collect();
    students.sort_unstable();
    students.dedup();
    students
        .into_iter()
        .map(|s| {
            let after = schedule_after(model, assignment, s, changes);
            objective::schedule_value(model, &after)
                - objective::student_value(model, assignment, s)
        })
        .sum()
}

/// Applies `changes` to `assignment`: every slot that changes is cleared
/// first, then the new values are assigned. Slots already holding their new
/// value are left alone.
pub fn apply_changes(
    model: &Model,
    assignment: &mut Assignment,
    changes: &[(RequestId, Option<Enrollment>)],
) {
    for (request, value) in changes {
        if assignment.value(*request) != value.as_ref() {
            assignment.unassign(model, *request);
        }
    }
    for (request, value) in changes {
        if let Some(value) = value {
            if assignment.value(*request) != Some(value) {
                assignment.assign(model, value.clone());
            }
        }
    }
}

/// Whether `changes` can be applied without displacing anything outside of
/// them.
pub fn changes_fit(
    model: &Model,
    assignment: &Assignment,
    changes: &[(RequestId, Option<Enrollment>)],
) -> bool {
    let mut trial = assignment.fork();
    for (request, value) in changes {
        if trial.value(*request) != value.as_ref() {
            trial.unassign(model, *request);
        }
    }
    for (request, value) in changes {
        let Some(value) = value else {
            continue;
        };
        if trial.value(*request) == Some(value) {
            continue;
        }
        if !model.is_consistent(&trial, value) {
            return false;
        }
        trial.assign(model, value.clone());
    }
    true
}

/// Unassigns every request of a student.
#[derive(Debug, Clone)]
pub struct StudentUnassignNeighbour {
    student: StudentId,
    requests: Vec<RequestId>,
}

impl StudentUnassignNeighbour {
    pub fn new(model: &Model, student: StudentId) -> Self {
        Self {
            student,
            requests: model.student(student).requests().to_vec(),
        }
    }

    fn changes(&self) -> Vec<(RequestId, Option<Enrollment>)> {
        self.requests.iter().map(|&r| (r, None)).collect()
    }
}

impl Neighbour for StudentUnassignNeighbour {
    fn name(&self) -> &str {
        "StudentUnassign"
    }

    fn student(&self) -> Option<StudentId> {
        Some(self.student)
    }

    fn value(&self, model: &Model, assignment: &Assignment) -> f64 {
        value_of_changes(model, assignment, &self.changes())
    }

    fn is_consistent(&self, _model: &Model, _assignment: &Assignment) -> bool {
        true
    }

    fn assign(&self, model: &Model, assignment: &mut Assignment) {
        for &r in &self.requests {
            assignment.unassign(model, r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioning_model::candidates::enrollments;
    use sectioning_model::synthetic::{SyntheticParams, generate};

    #[test]
    fn test_unassign_neighbour_is_idempotent() {
        let instance = generate(&SyntheticParams::small(5)).unwrap();
        let model = &instance.model;
        let mut assignment = Assignment::new(model);
        let student = StudentId::new(0);
        let first = model.student(student).requests()[0];
        let e = enrollments(model, first).into_iter().next().unwrap();
        assignment.assign(model, e);

        let neighbour = StudentUnassignNeighbour::new(model, student);
        assert!(neighbour.value(model, &assignment) > 0.0);

        neighbour.assign(model, &mut assignment);
        let once = assignment.fork();
        neighbour.assign(model, &mut assignment);
        assert_eq!(assignment, once);
        assert_eq!(assignment.nr_assigned_of(model, student), 0);
    }

    #[test]
    fn test_apply_changes_skips_held_values() {
        let instance = generate(&SyntheticParams::small(6)).unwrap();
        let model = &instance.model;
        let mut assignment = Assignment::new(model);
        let r = model.requests().ids().next().unwrap();
        let e = enrollments(model, r).into_iter().next().unwrap();

        let changes = vec![(r, Some(e.clone()))];
        assert!(changes_fit(model, &assignment, &changes));
        apply_changes(model, &mut assignment, &changes);
        let revision = assignment.revision();
        apply_changes(model, &mut assignment, &changes);
        assert_eq!(assignment.revision(), revision);
        assert_eq!(value_of_changes(model, &assignment, &changes), 0.0);
    }
}
