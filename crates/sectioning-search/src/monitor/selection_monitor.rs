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

use sectioning_model::{Model, index::StudentId};

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum SearchCommand {
    #[default]
    Continue,
    Terminate(String),
}

impl SearchCommand {
    #[inline]
    pub fn is_terminate(&self) -> bool {
        matches!(self, SearchCommand::Terminate(_))
    }
}

impl std::fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchCommand::Continue => write!(f, "Continue"),
            SearchCommand::Terminate(reason) => write!(f, "Terminate: {}", reason),
        }
    }
}

/// Reasons for cutting a branch of a per-student search.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PruneReason {
    /// The bound of the remaining slots cannot beat the incumbent.
    Bound,
    /// The value clashes with a slot that is already decided.
    Infeasible,
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneReason::Bound => write!(f, "Bound"),
            PruneReason::Infeasible => write!(f, "Infeasible"),
        }
    }
}

/// Observer of one per-student search.
pub trait SelectionMonitor {
    fn name(&self) -> &str;

    /// Called before the search of `student` starts.
    fn on_enter_search(&mut self, model: &Model, student: StudentId);

    /// Called after the search ends, with the number of visited nodes and
    /// whether the time budget ran out.
    fn on_exit_search(&mut self, student: StudentId, nodes: u64, timed_out: bool);

    /// Called at every node.
    fn on_step(&mut self, depth: usize);

    /// Called when a branch is cut.
    fn on_prune(&mut self, depth: usize, reason: PruneReason);

    /// Called when the incumbent improves.
    fn on_incumbent(&mut self, value: f64);

    /// Called before every node to decide whether to go on.
    fn search_command(&self) -> SearchCommand {
        SearchCommand::Continue
    }
}

impl std::fmt::Debug for dyn SelectionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SelectionMonitor({})", self.name())
    }
}

impl std::fmt::Display for dyn SelectionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SelectionMonitor({})", self.name())
    }
}

/// A monitor that ignores every event.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct NoOperationMonitor;

impl NoOperationMonitor {
    #[inline(always)]
    pub fn new() -> Self {
        Self
    }
}

impl SelectionMonitor for NoOperationMonitor {
    #[inline(always)]
    fn name(&self) -> &str {
        "NoOperationMonitor"
    }

    #[inline(always)]
    fn on_enter_search(&mut self, _model: &Model, _student: StudentId) {}

    #[inline(always)]
    fn on_exit_search(&mut self, _student: StudentId, _nodes: u64, _timed_out: bool) {}

    #[inline(always)]
    fn on_step(&mut self, _depth: usize) {}

    #[inline(always)]
    fn on_prune(&mut self, _depth: usize, _reason: PruneReason) {}

    #[inline(always)]
    fn on_incumbent(&mut self, _value: f64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(SearchCommand::Continue.to_string(), "Continue");
        assert_eq!(
            SearchCommand::Terminate("time limit reached".into()).to_string(),
            "Terminate: time limit reached"
        );
        assert!(SearchCommand::Terminate(String::new()).is_terminate());
        assert_eq!(PruneReason::Bound.to_string(), "Bound");
    }

    #[test]
    fn test_no_operation_monitor_always_continues() {
        let monitor = NoOperationMonitor::new();
        assert_eq!(monitor.search_command(), SearchCommand::Continue);
        let dynamic: &dyn SelectionMonitor = &monitor;
        assert_eq!(format!("{dynamic}"), "SelectionMonitor(NoOperationMonitor)");
    }
}
