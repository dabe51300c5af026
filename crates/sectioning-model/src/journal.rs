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

//! Undo support for tentative assignment changes.
//!
//! Moves that are evaluated by actually performing them (unassign the
//! conflicts, assign the candidate, re-seat the displaced students, measure)
//! record every transition here and roll back by replaying the inverse
//! transitions in LIFO order. Because occupancy contexts are recomputed from
//! their enrolled sets, a rollback leaves the assignment equal to the state
//! before the first recorded change, and the revision counter is restored
//! too.

use crate::{assignment::Assignment, enrollment::Enrollment, index::RequestId, model::Model};

#[derive(Debug, Clone, PartialEq)]
struct JournalEntry {
    request: RequestId,
    previous: Option<Enrollment>,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentJournal {
    entries: Vec<JournalEntry>,
    start_revision: u64,
}

impl AssignmentJournal {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            start_revision: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn mark(&mut self, assignment: &Assignment) {
        if self.entries.is_empty() {
            self.start_revision = assignment.revision();
        }
    }

    /// Assigns through the journal.
    pub fn assign(
        &mut self,
        model: &Model,
        assignment: &mut Assignment,
        enrollment: Enrollment,
    ) -> Option<Enrollment> {
        self.mark(assignment);
        let request = enrollment.request();
        let previous = assignment.assign(model, enrollment);
        self.entries.push(JournalEntry {
            request,
            previous: previous.clone(),
        });
        previous
    }

    /// Unassigns through the journal. Unassigning an unassigned request is
    /// not recorded.
    pub fn unassign(
        &mut self,
        model: &Model,
        assignment: &mut Assignment,
        request: RequestId,
    ) -> Option<Enrollment> {
        self.mark(assignment);
        let previous = assignment.unassign(model, request)?;
        self.entries.push(JournalEntry {
            request,
            previous: Some(previous.clone()),
        });
        Some(previous)
    }

    /// Undoes every recorded change, newest first.
    pub fn rollback(&mut self, model: &Model, assignment: &mut Assignment) {
        if self.entries.is_empty() {
            return;
        }
        while let Some(entry) = self.entries.pop() {
            match entry.previous {
                Some(previous) => {
                    assignment.assign(model, previous);
                }
                None => {
                    assignment.unassign(model, entry.request);
                }
            }
        }
        assignment.restore_revision(self.start_revision);
    }

    /// Keeps the recorded changes and forgets them.
    #[inline]
    pub fn commit(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{SyntheticInstance, SyntheticParams, generate};

    #[test]
    fn test_rollback_restores_state_and_revision() {
        let SyntheticInstance { model, .. } = generate(&SyntheticParams::small(7)).unwrap();
        let mut assignment = Assignment::new(&model);

        // Seed with the first enrollment of every other request.
        for r in model.requests().ids().step_by(2) {
            if let Some(e) = crate::candidates::enrollments(&model, r).into_iter().next() {
                assignment.assign(&model, e);
            }
        }
        let before = assignment.fork();
        let revision = assignment.revision();

        let mut journal = AssignmentJournal::new();
        for r in model.requests().ids() {
            if assignment.is_assigned(r) {
                journal.unassign(&model, &mut assignment, r);
            } else if let Some(e) = crate::candidates::enrollments(&model, r).into_iter().last() {
                journal.assign(&model, &mut assignment, e);
            }
        }
        assert!(!journal.is_empty());
        assert_ne!(assignment, before);

        journal.rollback(&model, &mut assignment);
        assert!(journal.is_empty());
        assert_eq!(assignment, before);
        assert_eq!(assignment.revision(), revision);
    }

    #[test]
    fn test_commit_forgets_changes() {
        let SyntheticInstance { model, .. } = generate(&SyntheticParams::small(3)).unwrap();
        let mut assignment = Assignment::new(&model);
        let mut journal = AssignmentJournal::new();
        let r = model.requests().ids().next().unwrap();
        let e = crate::candidates::enrollments(&model, r).into_iter().next().unwrap();

        journal.assign(&model, &mut assignment, e.clone());
        journal.commit();
        journal.rollback(&model, &mut assignment);

        assert_eq!(assignment.value(r), Some(&e));
    }
}
