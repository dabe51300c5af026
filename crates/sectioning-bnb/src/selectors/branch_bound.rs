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
use sectioning_search::{
    config::SectioningConfig,
    neighbour::Proposal,
    order::StudentOrder,
    selection::{NeighbourSelection, WorkUnit},
    solution::Solution,
    stats::SelectionStatistics,
};

/// One pass over every student, replacing each schedule with the best one
/// the branch and bound finds.
#[derive(Debug)]
pub struct BranchBoundSelection {
    core: SelectorCore,
}

impl BranchBoundSelection {
    pub fn new(config: &SectioningConfig) -> Self {
        Self::with_settings(
            SearchSettings::from_config(config),
            config.student_order,
            config.seed,
        )
    }

    pub fn with_settings(settings: SearchSettings, order: StudentOrder, seed: u64) -> Self {
        Self {
            core: SelectorCore::new("BranchBound", settings, order, seed),
        }
    }
}

impl NeighbourSelection for BranchBoundSelection {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn init(&self, solution: &Solution<'_>) -> bool {
        if self.core.passes() > 0 {
            return false;
        }
        self.core.start_pass(solution.model(), |_| true) > 0
    }

    fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
        self.core.next_unit()
    }

    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
        self.core.search_student(solution, unit, &Policy::Standard)
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
    use sectioning_model::{
        objective,
        synthetic::{SyntheticParams, generate},
    };
    use std::time::Duration;

    fn selection() -> BranchBoundSelection {
        BranchBoundSelection::with_settings(
            SearchSettings::default().with_timeout(Duration::from_secs(60)),
            StudentOrder::Sequential,
            7,
        )
    }

    #[test]
    fn test_single_pass_assigns_and_improves() {
        let instance = generate(&SyntheticParams::small(1)).unwrap();
        let model = &instance.model;
        let solution = Solution::new(model);
        let selection = selection();

        let applied = run_to_end(&selection, &solution);
        assert!(applied > 0);
        assert!(solution.read().nr_assigned() > 0);
        assert!(solution.value() < 0.0);
        assert!(!selection.init(&solution));

        let stats = selection.statistics();
        assert_eq!(stats.selections, model.students().len() as u64);
        assert_eq!(stats.neighbours, applied as u64);
        assert_eq!(stats.timeouts, 0);
    }

    #[test]
    fn test_assignment_stays_consistent() {
        for seed in 0..3 {
            let instance = generate(&SyntheticParams::small(seed)).unwrap();
            let model = &instance.model;
            let solution = Solution::new(model);
            run_to_end(&selection(), &solution);
            let assignment = solution.read();
            for (_, e) in assignment.assigned() {
                assert!(model.conflicts(&assignment, e).is_empty(), "seed {seed}");
            }
            let total = objective::total_value(model, &assignment);
            assert!((total - solution.value()).abs() < 1e-9);
        }
    }
}
