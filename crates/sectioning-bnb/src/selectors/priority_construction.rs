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

//! Construction in cycles. In cycle `k` every student keeps at most the first
//! `k` assigned slots (by request priority) of the best schedule the search
//! finds, so everybody gets their first choice before anybody gets a second
//! one. A cycle repeats while its passes change something; the last cycle
//! commits whole schedules.

use crate::{
    policy::{Policy, SearchSettings},
    selectors::{SelectorCore, changes_of},
};
use sectioning_model::Enrollment;
use sectioning_search::{
    config::SectioningConfig,
    neighbour::{Proposal, value_of_changes},
    order::StudentOrder,
    selection::{NeighbourSelection, WorkUnit},
    solution::Solution,
    stats::SelectionStatistics,
};
use std::sync::atomic::{AtomicUsize, Ordering};

const MIN_IMPROVEMENT: f64 = 1e-9;

#[derive(Debug)]
pub struct PriorityConstructionSelection {
    core: SelectorCore,
    max_cycles: usize,
    cycle: AtomicUsize,
}

impl PriorityConstructionSelection {
    pub fn new(config: &SectioningConfig) -> Self {
        Self::with_settings(
            SearchSettings::from_config(config),
            config.priority_construction_max_cycles,
            config.student_order,
            config.seed,
        )
    }

    pub fn with_settings(
        settings: SearchSettings,
        max_cycles: usize,
        order: StudentOrder,
        seed: u64,
    ) -> Self {
        Self {
            core: SelectorCore::new("PriorityConstruction", settings, order, seed),
            max_cycles: max_cycles.max(1),
            cycle: AtomicUsize::new(1),
        }
    }

    #[inline]
    pub fn cycle(&self) -> usize {
        self.cycle.load(Ordering::Acquire)
    }
}

/// Keeps the first `k` assigned slots.
fn truncate(schedule: &[Option<Enrollment>], k: usize) -> Vec<Option<Enrollment>> {
    let mut kept = 0;
    schedule
        .iter()
        .map(|slot| match slot {
            Some(e) if kept < k => {
                kept += 1;
                Some(e.clone())
            }
            _ => None,
        })
        .collect()
}

impl NeighbourSelection for PriorityConstructionSelection {
    fn name(&self) -> &str {
        self.core.name()
    }

    fn init(&self, solution: &Solution<'_>) -> bool {
        if self.core.passes() > 0 && !self.core.made_progress() {
            let cycle = self.cycle.fetch_add(1, Ordering::AcqRel) + 1;
            tracing::debug!(selection = self.core.name(), cycle, "next cycle");
        }
        if self.cycle() > self.max_cycles {
            return false;
        }
        self.core.start_pass(solution.model(), |_| true) > 0
    }

    fn next_unit(&self, _solution: &Solution<'_>) -> Option<WorkUnit> {
        self.core.next_unit()
    }

    fn search(&self, solution: &Solution<'_>, unit: WorkUnit) -> Option<Proposal> {
        let WorkUnit::Student(student) = unit else {
            return None;
        };
        let model = solution.model();
        let assignment = solution.read();
        let outcome = self.core.search_with(
            model,
            &assignment,
            student,
            self.core.settings(),
            &Policy::Standard,
        );
        let cycle = self.cycle();
        let proposal = outcome.best.as_deref().and_then(|best| {
            let schedule = if cycle >= self.max_cycles {
                best.to_vec()
            } else {
                truncate(best, cycle)
            };
            if schedule == outcome.current {
                return None;
            }
            let changes = changes_of(model, student, &schedule);
            let value = value_of_changes(model, &assignment, &changes);
            (value < -MIN_IMPROVEMENT)
                .then(|| self.core.proposal(model, &assignment, student, &schedule))
        });
        self.core.record(&outcome, proposal.is_some());
        proposal
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
    use crate::{
        selection::search,
        selectors::testing::{run_pass, run_to_end},
    };
    use sectioning_search::monitor::selection_monitor::NoOperationMonitor;
    use sectioning_model::synthetic::{SyntheticParams, generate};
    use std::time::Duration;

    #[test]
    fn test_truncate_keeps_leading_assigned_slots() {
        let instance = generate(&SyntheticParams::small(0)).unwrap();
        let model = &instance.model;
        let requests = model.student(sectioning_model::index::StudentId::new(0)).requests();
        let values: Vec<Option<Enrollment>> = requests
            .iter()
            .map(|&r| sectioning_model::candidates::enrollments(model, r).into_iter().next())
            .collect();
        let mut schedule = values.clone();
        schedule[0] = None;
        let kept = truncate(&schedule, 1);
        assert!(kept[0].is_none());
        assert_eq!(kept[1], schedule[1]);
        assert!(kept[2..].iter().all(Option::is_none));
    }

    #[test]
    fn test_first_cycle_gives_one_value_per_student() {
        let instance = generate(&SyntheticParams::small(2)).unwrap();
        let model = &instance.model;
        let solution = Solution::new(model);
        let selection = PriorityConstructionSelection::with_settings(
            SearchSettings::default().with_timeout(Duration::from_secs(60)),
            3,
            StudentOrder::Sequential,
            0,
        );

        assert!(selection.init(&solution));
        assert!(run_pass(&selection, &solution) > 0);
        for student in model.students().ids() {
            assert!(solution.read().nr_assigned_of(model, student) <= 1);
        }

        run_to_end(&selection, &solution);
        assert_eq!(selection.cycle(), 4);
        assert!(
            model
                .students()
                .ids()
                .any(|s| solution.read().nr_assigned_of(model, s) > 1)
        );
    }

    #[test]
    fn test_last_cycle_commits_whole_schedules() {
        for seed in 0..3 {
            let instance = generate(&SyntheticParams::small(seed)).unwrap();
            let model = &instance.model;
            let solution = Solution::new(model);
            let settings = SearchSettings::default().with_timeout(Duration::from_secs(60));
            let selection = PriorityConstructionSelection::with_settings(
                settings.clone(),
                3,
                StudentOrder::Sequential,
                seed,
            );
            run_to_end(&selection, &solution);

            let assignment = solution.read();
            for student in model.students().ids() {
                let outcome = search(
                    model,
                    &assignment,
                    student,
                    &settings,
                    &Policy::Standard,
                    NoOperationMonitor,
                );
                assert!(
                    outcome.improvement().is_none(),
                    "seed {}: {} can still improve",
                    seed,
                    student
                );
            }
        }
    }
}
