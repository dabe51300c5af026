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

/// Replaces a student's whole schedule with the one a search found.
#[derive(Debug, Clone)]
pub struct BranchBoundNeighbour {
    student: StudentId,
    changes: Vec<(RequestId, Option<Enrollment>)>,
    /// Objective change measured when the search ended.
    value: f64,
}

impl BranchBoundNeighbour {
    pub fn new(
        model: &Model,
        student: StudentId,
        schedule: &[Option<Enrollment>],
        value: f64,
    ) -> Self {
        let requests = model.student(student).requests();
        debug_assert_eq!(
            requests.len(),
            schedule.len(),
            "called `BranchBoundNeighbour::new` with a schedule of {} slots for {} requests",
            schedule.len(),
            requests.len()
        );
        Self {
            student,
            changes: requests.iter().copied().zip(schedule.iter().cloned()).collect(),
            value,
        }
    }

    #[inline]
    pub fn changes(&self) -> &[(RequestId, Option<Enrollment>)] {
        &self.changes
    }

    /// The objective change computed against the assignment searched.
    #[inline]
    pub fn found_value(&self) -> f64 {
        self.value
    }
}

impl Neighbour for BranchBoundNeighbour {
    fn name(&self) -> &str {
        "BranchBound"
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

impl std::fmt::Display for BranchBoundNeighbour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BranchBound({}, {} of {} assigned, {:+.4})",
            self.student,
            self.changes.iter().filter(|(_, e)| e.is_some()).count(),
            self.changes.len(),
            self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        policy::{Policy, SearchSettings},
        selection::search,
    };
    use sectioning_model::synthetic::{SyntheticParams, generate};
    use sectioning_search::monitor::selection_monitor::NoOperationMonitor;

    #[test]
    fn test_applying_twice_equals_applying_once() {
        let instance = generate(&SyntheticParams::small(9)).unwrap();
        let model = &instance.model;
        let mut assignment = Assignment::new(model);
        let student = StudentId::new(3);
        let outcome = search(
            model,
            &assignment,
            student,
            &SearchSettings::default(),
            &Policy::Standard,
            NoOperationMonitor,
        );
        let best = outcome.improvement().unwrap().to_vec();
        let neighbour = BranchBoundNeighbour::new(
            model,
            student,
            &best,
            outcome.best_key.cost - outcome.current_key.cost,
        );

        assert!(neighbour.is_consistent(model, &assignment));
        let value = neighbour.value(model, &assignment);
        assert!((value - neighbour.found_value()).abs() < 1e-9);

        neighbour.assign(model, &mut assignment);
        assert_eq!(assignment.schedule(model, student), best);
        let once = assignment.fork();
        neighbour.assign(model, &mut assignment);
        assert_eq!(assignment, once);
        assert_eq!(neighbour.value(model, &assignment), 0.0);
    }
}
