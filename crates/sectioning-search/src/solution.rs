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

//! # Solution
//!
//! The shared, lockable state every selection works against: the model (read
//! only) and the assignment behind a reader-writer lock.
//!
//! Searches that never touch the assignment until they are done (the branch
//! and bound) read it under a shared lock and remember its revision. Searches
//! that evaluate moves by performing them (the swap movers) hold the write
//! lock for the whole exploration and restore the assignment before
//! releasing it. Either way the result is a [`Proposal`], and
//! [`Solution::apply`] is the single place where proposals become changes.

use crate::{error::Retryable, neighbour::Proposal};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use sectioning_model::{Assignment, Model, objective};

const MIN_IMPROVEMENT: f64 = 1e-9;

pub struct Solution<'m> {
    model: &'m Model,
    assignment: RwLock<Assignment>,
}

impl<'m> Solution<'m> {
    /// A solution with nothing assigned.
    pub fn new(model: &'m Model) -> Self {
        Self::with_assignment(model, Assignment::new(model))
    }

    pub fn with_assignment(model: &'m Model, assignment: Assignment) -> Self {
        Self {
            model,
            assignment: RwLock::new(assignment),
        }
    }

    #[inline]
    pub fn model(&self) -> &'m Model {
        self.model
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, Assignment> {
        self.assignment.read()
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, Assignment> {
        self.assignment.write()
    }

    #[inline]
    pub fn revision(&self) -> u64 {
        self.assignment.read().revision()
    }

    /// Total objective of the current assignment.
    pub fn value(&self) -> f64 {
        objective::total_value(self.model, &self.assignment.read())
    }

    /// A copy of the current assignment.
    pub fn snapshot(&self) -> Assignment {
        self.assignment.read().fork()
    }

    pub fn into_assignment(self) -> Assignment {
        self.assignment.into_inner()
    }

    /// Applies the proposal and returns the objective change it caused.
    ///
    /// A proposal computed against an older revision is still applied when it
    /// fits the current assignment and, if it is marked improving, still
    /// lowers the objective; otherwise it is rejected.
    pub fn apply(&self, proposal: Proposal) -> Result<f64, Retryable> {
        let mut assignment = self.assignment.write();
        let neighbour = &proposal.neighbour;
        let found = assignment.revision();
        let stale = found != proposal.revision;
        if stale && !neighbour.is_consistent(self.model, &assignment) {
            return Err(Retryable::Stale {
                neighbour: neighbour.name().to_string(),
                expected: proposal.revision,
                found,
            });
        }
        let value = neighbour.value(self.model, &assignment);
        if stale && proposal.improving && value >= -MIN_IMPROVEMENT {
            return Err(Retryable::NoLongerImproving {
                neighbour: neighbour.name().to_string(),
                expected: proposal.revision,
                found,
            });
        }
        neighbour.assign(self.model, &mut assignment);
        Ok(value)
    }
}

impl std::fmt::Debug for Solution<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let assignment = self.assignment.read();
        f.debug_struct("Solution")
            .field("assigned", &assignment.nr_assigned())
            .field("requests", &self.model.requests().len())
            .field("revision", &assignment.revision())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neighbour::{Neighbour, StudentUnassignNeighbour};
    use sectioning_model::{
        Enrollment,
        candidates::enrollments,
        index::{RequestId, StudentId},
        synthetic::{SyntheticParams, generate},
    };

    /// Assigns one value, but only while the request is free.
    #[derive(Debug)]
    struct AssignIfFree(Enrollment);

    impl Neighbour for AssignIfFree {
        fn name(&self) -> &str {
            "AssignIfFree"
        }

        fn student(&self) -> Option<StudentId> {
            None
        }

        fn value(&self, _model: &Model, _assignment: &Assignment) -> f64 {
            -1.0
        }

        fn is_consistent(&self, _model: &Model, assignment: &Assignment) -> bool {
            !assignment.is_assigned(self.0.request())
        }

        fn assign(&self, model: &Model, assignment: &mut Assignment) {
            assignment.assign(model, self.0.clone());
        }
    }

    fn first_value(model: &Model, request: RequestId) -> Enrollment {
        enrollments(model, request).into_iter().next().unwrap()
    }

    #[test]
    fn test_apply_at_current_revision() {
        let instance = generate(&SyntheticParams::small(1)).unwrap();
        let solution = Solution::new(&instance.model);
        let r = instance.model.requests().ids().next().unwrap();
        let proposal = Proposal::new(
            Box::new(AssignIfFree(first_value(&instance.model, r))),
            solution.revision(),
        );
        assert_eq!(solution.apply(proposal), Ok(-1.0));
        assert!(solution.read().is_assigned(r));
    }

    #[test]
    fn test_stale_proposal_is_retryable() {
        let instance = generate(&SyntheticParams::small(1)).unwrap();
        let model = &instance.model;
        let solution = Solution::new(model);
        let r = model.requests().ids().next().unwrap();
        let revision = solution.revision();

        // Someone else assigns the request in the meantime.
        solution.write().assign(model, first_value(model, r));

        let proposal = Proposal::new(Box::new(AssignIfFree(first_value(model, r))), revision);
        assert!(matches!(
            solution.apply(proposal),
            Err(Retryable::Stale { expected: 0, found: 1, .. })
        ));
    }

    #[test]
    fn test_outdated_but_consistent_proposal_applies() {
        let instance = generate(&SyntheticParams::small(1)).unwrap();
        let model = &instance.model;
        let solution = Solution::new(model);
        let student = StudentId::new(0);
        let revision = solution.revision();

        let other = model.student(StudentId::new(1)).requests()[0];
        solution.write().assign(model, first_value(model, other));

        let neighbour = StudentUnassignNeighbour::new(model, student);
        let proposal = Proposal::new(Box::new(neighbour), revision);
        assert_eq!(solution.apply(proposal), Ok(0.0));
    }

    #[test]
    fn test_outdated_improving_proposal_without_gain_is_rejected() {
        let instance = generate(&SyntheticParams::small(1)).unwrap();
        let model = &instance.model;
        let solution = Solution::new(model);
        let student = StudentId::new(0);
        let revision = solution.revision();

        let other = model.student(StudentId::new(1)).requests()[0];
        solution.write().assign(model, first_value(model, other));

        // Unassigning a student who holds nothing no longer gains anything.
        let neighbour = StudentUnassignNeighbour::new(model, student);
        let proposal = Proposal::new(Box::new(neighbour), revision).improving();
        assert!(matches!(
            solution.apply(proposal),
            Err(Retryable::NoLongerImproving { expected: 0, found: 1, .. })
        ));
        assert_eq!(solution.read().revision(), 1);

        let current = Proposal::new(
            Box::new(AssignIfFree(first_value(model, model.student(student).requests()[0]))),
            solution.revision(),
        )
        .improving();
        assert_eq!(solution.apply(current), Ok(-1.0));
    }
}
