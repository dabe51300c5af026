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

//! Budget of one swap exploration: a wall-clock limit and a cap on trial
//! moves, whichever runs out first.

use sectioning_search::monitor::{selection_monitor::SelectionMonitor, time_budget::TimeBudget};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BacktrackBudget {
    time: TimeBudget,
    max_iterations: u64,
    iterations: u64,
    timed_out: bool,
}

impl BacktrackBudget {
    /// Trial moves are few and expensive, so the clock is read on every one.
    pub fn new(timeout: Duration, max_iterations: u64) -> Self {
        Self {
            time: TimeBudget::with_clock_check_mask(timeout, 0),
            max_iterations,
            iterations: 0,
            timed_out: false,
        }
    }

    /// Accounts for one more trial move. Returns `false` once the budget is
    /// spent; the move must not be tried then.
    pub fn step(&mut self) -> bool {
        if self.timed_out || self.iterations >= self.max_iterations {
            return false;
        }
        if self.time.search_command().is_terminate() {
            self.timed_out = true;
            return false;
        }
        self.time.tick();
        self.iterations += 1;
        true
    }

    #[inline]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    #[inline]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.time.elapsed()
    }
}
