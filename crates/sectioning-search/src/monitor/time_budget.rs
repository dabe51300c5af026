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

//! # Time Budget
//!
//! Wall-clock budget of a search. The clock is read only when
//! `(steps & clock_check_mask) == 0`, which includes the very first step, so
//! a zero budget stops a search before it visits anything.

use crate::monitor::selection_monitor::{PruneReason, SearchCommand, SelectionMonitor};
use sectioning_model::{Model, index::StudentId};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBudget {
    clock_check_mask: u64,
    steps: u64,
    time_limit: Duration,
    start_time: Instant,
}

impl TimeBudget {
    /// Checks the clock every 256 steps.
    const DEFAULT_STEP_CLOCK_CHECK_MASK: u64 = 0xFF;

    #[inline]
    pub fn new(time_limit: Duration) -> Self {
        Self::with_clock_check_mask(time_limit, Self::DEFAULT_STEP_CLOCK_CHECK_MASK)
    }

    #[inline]
    pub fn with_clock_check_mask(time_limit: Duration, clock_check_mask: u64) -> Self {
        Self {
            clock_check_mask,
            steps: 0,
            time_limit,
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn restart(&mut self) {
        self.start_time = Instant::now();
        self.steps = 0;
    }

    #[inline]
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Reads the clock regardless of the step mask.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.start_time.elapsed() >= self.time_limit
    }

    #[inline(always)]
    pub fn tick(&mut self) {
        self.steps = self.steps.wrapping_add(1);
    }
}

impl SelectionMonitor for TimeBudget {
    fn name(&self) -> &str {
        "TimeBudget"
    }

    fn on_enter_search(&mut self, _model: &Model, _student: StudentId) {
        self.restart();
    }

    fn on_exit_search(&mut self, _student: StudentId, _nodes: u64, _timed_out: bool) {}

    #[inline(always)]
    fn on_step(&mut self, _depth: usize) {
        self.tick();
    }

    fn on_prune(&mut self, _depth: usize, _reason: PruneReason) {}

    fn on_incumbent(&mut self, _value: f64) {}

    #[inline(always)]
    fn search_command(&self) -> SearchCommand {
        if (self.steps & self.clock_check_mask) == 0 && self.is_exhausted() {
            return SearchCommand::Terminate("time limit reached".to_string());
        }
        SearchCommand::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_budget_terminates_on_first_check() {
        let budget = TimeBudget::new(Duration::ZERO);
        assert!(budget.search_command().is_terminate());
    }

    #[test]
    fn test_mask_skips_clock_between_checks() {
        let mut budget = TimeBudget::with_clock_check_mask(Duration::from_millis(1), 0x3);
        budget.start_time = Instant::now() - Duration::from_millis(50);
        for s in [1u64, 2, 3, 5, 6, 7] {
            budget.steps = s;
            assert_eq!(budget.search_command(), SearchCommand::Continue, "steps={s}");
        }
        for s in [0u64, 4, 8] {
            budget.steps = s;
            assert!(budget.search_command().is_terminate(), "steps={s}");
        }
    }

    #[test]
    fn test_generous_budget_continues() {
        let mut budget = TimeBudget::new(Duration::from_secs(3600));
        assert_eq!(budget.search_command(), SearchCommand::Continue);
        budget.tick();
        assert_eq!(budget.search_command(), SearchCommand::Continue);
        assert!(!budget.is_exhausted());
    }

    #[test]
    fn test_tick_wraps() {
        let mut budget = TimeBudget::new(Duration::from_secs(1));
        budget.steps = u64::MAX;
        budget.tick();
        assert_eq!(budget.steps, 0);
    }
}
