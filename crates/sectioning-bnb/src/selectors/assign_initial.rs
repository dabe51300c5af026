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
use sectioning_model::{Assignment, Model, index::StudentId};
use sectioning_search::{
    config::SectioningConfig,
    neighbour::Proposal,
    order::StudentOrder,
    selection::{NeighbourSelection, WorkUnit},
    solution::Solution,
    stats::SelectionStatistics,
};

/// Minimal perturbation start: one pass over the students that hold nothing
/// yet but have initial values, giving each as many of them as fit.
///
/// Does nothing outside of MPP.
#[derive(Debug)]
pub struct AssignInitialSelection {
    core: SelectorCore,
}

impl AssignInitialSelection {
    pub fn new(config: &SectioningConfig) -> Self {
        Self::with_settings(
            SearchSettings::from_config(config),
            config.student_order,
            config.seed,
        )
    }

    pub fn with_settings(settings: SearchSettings, order: StudentOrder, seed: u64) -> Self {
        Self {
            core: SelectorCore::new("AssignInitial", settings, order, seed),
        }
    }
}

fn waits_for_initial(model: &Model, assignment: &Assignment, student: StudentId) -> bool {
    let requests = model.student(student).requests();
    requests.iter().all(|&r| !assignment.is_assigned(r))
        && requests.iter().any(|&r| model.request(r).initial().is_some())
}

impl NeighbourSelection for AssignInitialSelection {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn init(&self, solution: &Solution<'_>) -> bool {
        let model = solution.model();
        if !model.is_mpp() || self.core.passes() > 0 {
            return false;
        }
        let assignment = solution.read();
        self.core
            .start_pass(model, |s| waits_for_initial(model, &assignment, s))
            > 0
    }

    fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
        self.core.next_unit()
    }

    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
        self.core.search_student(solution, unit, &Policy::InitialOnly)
    }

    fn on_applied(&self, _solution: &Solution<'_>, _unit: WorkUnit, _value: f64) {
        self.core.on_applied();
    }

    fn statistics(&self) -> SelectionStatistics {
        self.core.statistics()
    }
}
