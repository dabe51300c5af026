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

use std::time::Duration;

/// Counters of one selection across all of its searches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStatistics {
    /// Searches started.
    pub selections: u64,
    /// Searches stopped by their time budget.
    pub timeouts: u64,
    /// Searches that produced a neighbour.
    pub neighbours: u64,
    /// Nodes (or trial moves) visited.
    pub nodes: u64,
    /// Time spent searching.
    pub time_total: Duration,
}

impl SelectionStatistics {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a finished search.
    #[inline]
    pub fn on_search(&mut self, elapsed: Duration, nodes: u64, timed_out: bool, found: bool) {
        self.selections = self.selections.saturating_add(1);
        self.nodes = self.nodes.saturating_add(nodes);
        self.time_total += elapsed;
        if timed_out {
            self.timeouts = self.timeouts.saturating_add(1);
        }
        if found {
            self.neighbours = self.neighbours.saturating_add(1);
        }
    }

    /// Average search time in milliseconds, zero before the first search.
    pub fn average_time_ms(&self) -> f64 {
        if self.selections == 0 {
            return 0.0;
        }
        self.time_total.as_secs_f64() * 1000.0 / self.selections as f64
    }

    pub fn merge(&mut self, other: &SelectionStatistics) {
        self.selections = self.selections.saturating_add(other.selections);
        self.timeouts = self.timeouts.saturating_add(other.timeouts);
        self.neighbours = self.neighbours.saturating_add(other.neighbours);
        self.nodes = self.nodes.saturating_add(other.nodes);
        self.time_total += other.time_total;
    }
}

impl std::fmt::Display for SelectionStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} selections, {} neighbours, {} timeouts, {} nodes, {:.2} ms average",
            self.selections,
            self.neighbours,
            self.timeouts,
            self.nodes,
            self.average_time_ms()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_search_and_average() {
        let mut stats = SelectionStatistics::new();
        assert_eq!(stats.average_time_ms(), 0.0);
        stats.on_search(Duration::from_millis(10), 5, false, true);
        stats.on_search(Duration::from_millis(30), 7, true, false);
        assert_eq!(stats.selections, 2);
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.neighbours, 1);
        assert_eq!(stats.nodes, 12);
        assert!((stats.average_time_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_and_display() {
        let mut a = SelectionStatistics::new();
        a.on_search(Duration::from_millis(4), 1, false, true);
        let mut b = SelectionStatistics::new();
        b.on_search(Duration::from_millis(4), 2, true, false);
        a.merge(&b);
        assert_eq!(a.selections, 2);
        assert_eq!(a.nodes, 3);
        assert_eq!(
            a.to_string(),
            "2 selections, 1 neighbours, 1 timeouts, 3 nodes, 4.00 ms average"
        );
    }
}
