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

//! # Per-Student Branch and Bound
//!
//! Finds the best schedule of one student given everybody else's enrollments,
//! which stay untouched during the search. Slot `i` of a schedule holds the
//! value of the student's `i`-th request or nothing.
//!
//! The search is a depth-first recursion over the request positions:
//!
//! 1. Stop when the time budget runs out; the incumbent stands.
//! 2. Prune when the bound of the partial schedule cannot beat the incumbent.
//! 3. At the end (or where the policy allows stopping early) keep the
//!    schedule if it is strictly better than the incumbent.
//! 4. Otherwise decide the next request: skip it when it may not take a value
//!    (offering its current value first when the policy keeps those), try
//!    only its initial value in MPP, only its selected values when it has
//!    some, or every candidate in comparator order; finally try leaving it
//!    unassigned.
//!
//! Slot costs charge pair conflicts to the later slot, so the cost of a prefix
//! never changes once it is decided and the bound is the prefix cost plus the
//! best the remaining slots could still add. The remaining slot count comes
//! from [`sectioning_model::alternatives`], the same function that decides
//! whether an alternative may take a value.
//!
//! The incumbent starts as the all-unassigned schedule (unless a request has a
//! fixed value), so a search that finds nothing better returns it.

use crate::{
    avoid::TimesToAvoid,
    policy::{Key, Objective, Policy, SearchSettings, assigned_weight},
};
use sectioning_model::{
    Assignment, Enrollment, Model, alternatives,
    candidates::available_enrollments,
    constraints::{exceeds_max_credit, incompatible, total_credit},
    index::{RequestId, StudentId},
    objective,
    request::satisfies_choices,
};
use sectioning_search::monitor::{
    selection_monitor::{PruneReason, SearchCommand, SelectionMonitor},
    time_budget::TimeBudget,
};
use smallvec::SmallVec;
use std::time::{Duration, Instant};

/// Result of one per-student search.
#[derive(Clone, Debug)]
pub struct SelectionOutcome {
    pub student: StudentId,
    /// The student's schedule when the search started.
    pub current: Vec<Option<Enrollment>>,
    pub current_key: Key,
    /// The best schedule found, `None` only when no legal schedule was.
    pub best: Option<Vec<Option<Enrollment>>>,
    pub best_key: Key,
    pub timed_out: bool,
    pub nodes: u64,
    pub elapsed: Duration,
}

impl SelectionOutcome {
    /// The best schedule, if it differs from the current one and is strictly
    /// better.
    pub fn improvement(&self) -> Option<&[Option<Enrollment>]> {
        let best = self.best.as_deref()?;
        if best != self.current.as_slice() && self.best_key.better_than(&self.current_key) {
            Some(best)
        } else {
            None
        }
    }
}

/// Candidate values of one slot, in the order they are tried.
#[derive(Clone, Debug, Default)]
struct Slot {
    values: Vec<Enrollment>,
    penalties: Vec<f64>,
    /// Positions in `values` matching the selected choices.
    selected: SmallVec<[usize; 4]>,
    /// Position of the initial value in `values`.
    initial: Option<usize>,
    /// Position of the value the student holds now.
    current: Option<usize>,
    /// Lowest penalty over `values`.
    min_penalty: f64,
}

pub struct Selection<'a, M: SelectionMonitor> {
    model: &'a Model,
    assignment: &'a Assignment,
    student: StudentId,
    requests: &'a [RequestId],
    settings: &'a SearchSettings,
    policy: &'a Policy,
    slots: Vec<Slot>,
    current: Vec<Option<Enrollment>>,
    partial: Vec<Option<Enrollment>>,
    costs: Vec<f64>,
    penalties: Vec<f64>,
    best: Option<Vec<Option<Enrollment>>>,
    best_key: Key,
    budget: TimeBudget,
    monitor: M,
    nodes: u64,
    timed_out: bool,
}

impl<'a, M: SelectionMonitor> Selection<'a, M> {
    pub fn new(
        model: &'a Model,
        assignment: &'a Assignment,
        student: StudentId,
        settings: &'a SearchSettings,
        policy: &'a Policy,
        monitor: M,
    ) -> Self {
        let requests = model.student(student).requests();
        let current = assignment.schedule(model, student);
        let n = requests.len();
        let mut selection = Self {
            model,
            assignment,
            student,
            requests,
            settings,
            policy,
            slots: Vec::with_capacity(n),
            current,
            partial: vec![None; n],
            costs: vec![0.0; n],
            penalties: vec![0.0; n],
            best: None,
            best_key: Key::WORST,
            budget: TimeBudget::new(settings.timeout),
            monitor,
            nodes: 0,
            timed_out: false,
        };
        selection.build_slots();
        selection
    }

    fn penalty(&self, enrollment: &Enrollment) -> f64 {
        match self.settings.objective {
            Objective::Penalty(source) => source.penalty(self.model, self.assignment, enrollment),
            Objective::Value => match self.policy {
                Policy::Epsilon { source, .. } => {
                    source.penalty(self.model, self.assignment, enrollment)
                }
                _ => enrollment.penalty(self.model),
            },
        }
    }

    /// Computes and orders the candidates of every slot.
    fn build_slots(&mut self) {
        let model = self.model;
        let values: Vec<Vec<Enrollment>> = self
            .requests
            .iter()
            .map(|&r| available_enrollments(model, self.assignment, r))
            .collect();
        let avoid = if self.settings.times_to_avoid {
            TimesToAvoid::new(
                model,
                self.requests
                    .iter()
                    .copied()
                    .zip(values.iter().map(Vec::as_slice)),
                self.settings.scarce_enrollments,
            )
        } else {
            TimesToAvoid::default()
        };

        for (idx, values) in values.into_iter().enumerate() {
            let request = model.request(self.requests[idx]);
            let current = self.current[idx].as_ref();
            let mut scored: Vec<(bool, f64, f64, f64, Enrollment)> = values
                .into_iter()
                .map(|e| {
                    let standalone = match self.settings.objective {
                        Objective::Value => {
                            let alone = [Some(e.clone())];
                            -request.weight() * objective::slot_weight(model, &alone, 0)
                        }
                        Objective::Penalty(_) => self.penalty(&e),
                    };
                    let penalty = self.penalty(&e);
                    (
                        current != Some(&e),
                        avoid.score(model, &e),
                        standalone,
                        penalty,
                        e,
                    )
                })
                .collect();
            scored.sort_by(|a, b| {
                a.0.cmp(&b.0)
                    .then(a.1.total_cmp(&b.1))
                    .then(a.2.total_cmp(&b.2))
                    .then_with(|| a.4.cmp(&b.4))
            });

            let mut slot = Slot {
                min_penalty: f64::INFINITY,
                ..Slot::default()
            };
            for (position, (_, _, _, penalty, e)) in scored.into_iter().enumerate() {
                if let Some(course) = request.as_course() {
                    if !course.selected().is_empty()
                        && satisfies_choices(model, course.selected(), &e)
                    {
                        slot.selected.push(position);
                    }
                }
                if request.initial() == Some(&e) {
                    slot.initial = Some(position);
                }
                if current == Some(&e) {
                    slot.current = Some(position);
                }
                slot.min_penalty = slot.min_penalty.min(penalty);
                slot.penalties.push(penalty);
                slot.values.push(e);
            }
            if slot.values.is_empty() {
                slot.min_penalty = 0.0;
            }
            self.slots.push(slot);
        }
    }

    /// Runs the search.
    pub fn run(mut self) -> SelectionOutcome {
        let start = Instant::now();
        self.budget.on_enter_search(self.model, self.student);
        self.monitor.on_enter_search(self.model, self.student);

        let current_key = self.schedule_key(&self.current);
        if self.requests.iter().all(|&r| self.model.request(r).fixed().is_none()) {
            let baseline = vec![None; self.requests.len()];
            self.best_key = self.schedule_key(&baseline);
            self.best = Some(baseline);
        }

        self.backtrack(0);

        self.monitor
            .on_exit_search(self.student, self.nodes, self.timed_out);
        SelectionOutcome {
            student: self.student,
            current: self.current,
            current_key,
            best: self.best,
            best_key: self.best_key,
            timed_out: self.timed_out,
            nodes: self.nodes,
            elapsed: start.elapsed(),
        }
    }

    #[inline]
    fn check_budget(&mut self) -> bool {
        if self.timed_out {
            return false;
        }
        if let SearchCommand::Terminate(_) = self.budget.search_command() {
            self.timed_out = true;
            return false;
        }
        if self.monitor.search_command().is_terminate() {
            self.timed_out = true;
            return false;
        }
        true
    }

    fn backtrack(&mut self, idx: usize) {
        if !self.check_budget() {
            return;
        }
        self.budget.on_step(idx);
        self.monitor.on_step(idx);
        self.nodes = self.nodes.wrapping_add(1);

        if self.settings.prune && !self.bound(idx).better_than(&self.best_key) {
            self.monitor.on_prune(idx, PruneReason::Bound);
            return;
        }

        let n = self.requests.len();
        if idx == n
            || (self.policy.short_circuit(
                self.model,
                self.requests,
                idx,
                self.min_credit(),
                self.prefix_credit(idx),
            ) && !self.holds_kept_value(idx))
        {
            self.save_best(idx);
            return;
        }

        let model = self.model;
        let request = model.request(self.requests[idx]);

        if !self.policy.is_eligible(model, request) {
            if let Some(position) = self.kept_value(idx) {
                if self.can_assign(idx) && self.fits(idx, position) {
                    self.branch(idx, position);
                }
            }
            self.backtrack(idx + 1);
            return;
        }
        if !self.can_assign(idx) {
            self.backtrack(idx + 1);
            return;
        }

        if model.is_mpp() {
            if let Some(initial) = self.slots[idx].initial {
                if self.fits(idx, initial) {
                    self.branch(idx, initial);
                    return;
                }
            }
        }

        let mut found = false;
        let selected = self.settings.branch_when_selected
            && self.slots[idx]
                .selected
                .iter()
                .any(|&position| self.fits(idx, position));
        let positions: Vec<usize> = if selected {
            self.slots[idx].selected.to_vec()
        } else {
            (0..self.slots[idx].values.len()).collect()
        };
        for position in positions {
            if self.timed_out {
                return;
            }
            if !self.fits(idx, position) {
                self.monitor.on_prune(idx, PruneReason::Infeasible);
                continue;
            }
            found = true;
            self.branch(idx, position);
        }

        if !found || (request.is_course() && request.fixed().is_none()) {
            self.backtrack(idx + 1);
        }
    }

    /// Puts value `position` into slot `idx`, searches on, and takes it back.
    fn branch(&mut self, idx: usize, position: usize) {
        let value = self.slots[idx].values[position].clone();
        self.partial[idx] = Some(value);
        self.costs[idx] = objective::slot_cost(self.model, &self.partial, idx);
        self.penalties[idx] = self.slots[idx].penalties[position];
        self.backtrack(idx + 1);
        self.partial[idx] = None;
        self.costs[idx] = 0.0;
        self.penalties[idx] = 0.0;
    }

    /// Whether value `position` of slot `idx` is allowed by the policy and
    /// fits the decided slots.
    fn fits(&self, idx: usize, position: usize) -> bool {
        let slot = &self.slots[idx];
        let value = &slot.values[position];
        if !self
            .policy
            .allows(self.model, idx, value, slot.penalties[position])
        {
            return false;
        }
        if self.partial[..idx]
            .iter()
            .flatten()
            .any(|other| incompatible(self.model, value, other))
        {
            return false;
        }
        !(value.is_course()
            && exceeds_max_credit(
                self.model,
                self.student,
                self.prefix_credit(idx) + value.credit(self.model),
            ))
    }

    /// Current value of slot `idx` when the policy keeps it although the
    /// search does not branch on the request.
    #[inline]
    fn kept_value(&self, idx: usize) -> Option<usize> {
        if self.policy.keeps_current() {
            self.slots[idx].current
        } else {
            None
        }
    }

    /// Whether a slot from `idx` on still has a kept value to decide.
    fn holds_kept_value(&self, idx: usize) -> bool {
        (idx..self.requests.len()).any(|i| {
            self.kept_value(i).is_some()
                && !self.policy.is_eligible(self.model, self.model.request(self.requests[i]))
        })
    }

    #[inline]
    fn can_assign(&self, idx: usize) -> bool {
        alternatives::can_assign(self.model, self.requests, idx, |i| {
            self.partial[i].is_some()
        })
    }

    #[inline]
    fn prefix_credit(&self, idx: usize) -> f32 {
        total_credit(self.model, self.partial[..idx].iter().flatten())
    }

    #[inline]
    fn min_credit(&self) -> f32 {
        self.model.student(self.student).min_credit()
    }

    /// Lower bound on the key of every completion of `partial[..idx]`.
    fn bound(&self, idx: usize) -> Key {
        let model = self.model;
        let requests = self.requests;
        let remaining =
            alternatives::remaining_slots(model, requests, idx, |i| self.partial[i].is_some());
        let suffix = &requests[idx..];

        let primary = match self.policy {
            Policy::Critical { .. } => {
                let decided = requests[..idx]
                    .iter()
                    .zip(&self.partial)
                    .filter(|(r, e)| e.is_none() && self.policy.is_critical(model.request(**r)))
                    .count();
                let open = suffix
                    .iter()
                    .filter(|&&r| self.policy.is_critical(model.request(r)))
                    .count();
                (decided + open.saturating_sub(remaining)) as f64
            }
            _ => 0.0,
        };

        match self.settings.objective {
            Objective::Value => {
                let prefix: f64 = self.costs[..idx].iter().sum();
                let mut bounds: Vec<f64> = suffix
                    .iter()
                    .map(|&r| model.request_bound(r).min(0.0))
                    .collect();
                bounds.sort_by(f64::total_cmp);
                Key::new(primary, 0.0, prefix + bounds.iter().take(remaining).sum::<f64>())
            }
            Objective::Penalty(_) => {
                let prefix_assigned: f64 = requests[..idx]
                    .iter()
                    .zip(&self.partial)
                    .filter(|(_, e)| e.is_some())
                    .map(|(r, _)| assigned_weight(model.request(*r)))
                    .sum();
                let mut weights: Vec<f64> = suffix
                    .iter()
                    .map(|&r| assigned_weight(model.request(r)))
                    .collect();
                weights.sort_by(|a, b| b.total_cmp(a));
                let assigned = prefix_assigned + weights.iter().take(remaining).sum::<f64>();

                let prefix_penalty: f64 = self.penalties[..idx].iter().sum();
                let mut minima: Vec<f64> = self.slots[idx..]
                    .iter()
                    .map(|s| s.min_penalty.min(0.0))
                    .collect();
                minima.sort_by(f64::total_cmp);
                let penalty = prefix_penalty + minima.iter().take(remaining).sum::<f64>();
                Key::new(primary, -assigned, penalty)
            }
        }
    }

    /// Key of `partial` with every slot from `upto` on unassigned.
    fn partial_key(&self, upto: usize) -> Key {
        let model = self.model;
        let credit = self.prefix_credit(upto);
        let primary =
            self.policy
                .primary(model, self.requests, &self.partial, self.min_credit(), credit);
        match self.settings.objective {
            Objective::Value => Key::new(primary, 0.0, self.costs[..upto].iter().sum()),
            Objective::Penalty(_) => {
                let assigned: f64 = self
                    .requests
                    .iter()
                    .zip(&self.partial)
                    .take(upto)
                    .filter(|(_, e)| e.is_some())
                    .map(|(r, _)| assigned_weight(model.request(*r)))
                    .sum();
                Key::new(primary, -assigned, self.penalties[..upto].iter().sum())
            }
        }
    }

    /// Key of a complete schedule, computed from scratch.
    pub fn schedule_key(&self, schedule: &[Option<Enrollment>]) -> Key {
        let model = self.model;
        let credit = total_credit(model, schedule.iter().flatten());
        let primary = self
            .policy
            .primary(model, self.requests, schedule, self.min_credit(), credit);
        match self.settings.objective {
            Objective::Value => Key::new(primary, 0.0, objective::schedule_value(model, schedule)),
            Objective::Penalty(_) => {
                let assigned: f64 = self
                    .requests
                    .iter()
                    .zip(schedule)
                    .filter(|(_, e)| e.is_some())
                    .map(|(r, _)| assigned_weight(model.request(*r)))
                    .sum();
                let penalty: f64 = schedule.iter().flatten().map(|e| self.penalty(e)).sum();
                Key::new(primary, -assigned, penalty)
            }
        }
    }

    fn save_best(&mut self, upto: usize) {
        debug_assert!(
            self.partial[upto..].iter().all(Option::is_none),
            "called `Selection::save_best` with decided slots after position {}",
            upto
        );
        let key = self.partial_key(upto);
        if key.better_than(&self.best_key) {
            self.best = Some(self.partial.clone());
            self.best_key = key;
            self.monitor.on_incumbent(key.cost);
        }
    }
}

/// Runs one search.
pub fn search<M: SelectionMonitor>(
    model: &Model,
    assignment: &Assignment,
    student: StudentId,
    settings: &SearchSettings,
    policy: &Policy,
    monitor: M,
) -> SelectionOutcome {
    Selection::new(model, assignment, student, settings, policy, monitor).run()
}
