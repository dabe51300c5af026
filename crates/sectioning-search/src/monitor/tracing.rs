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

use crate::monitor::selection_monitor::{PruneReason, SelectionMonitor};
use sectioning_model::{Model, index::StudentId};

/// Forwards search events to `tracing`: nodes, prunes and incumbents at
/// `trace`, the end of a search at `debug`.
#[derive(Debug, Clone, Default)]
pub struct TracingSelectionMonitor {
    selection: &'static str,
    prunes: u64,
    incumbents: u64,
}

impl TracingSelectionMonitor {
    pub fn new(selection: &'static str) -> Self {
        Self {
            selection,
            prunes: 0,
            incumbents: 0,
        }
    }
}

impl SelectionMonitor for TracingSelectionMonitor {
    fn name(&self) -> &str {
        "TracingSelectionMonitor"
    }

    fn on_enter_search(&mut self, model: &Model, student: StudentId) {
        self.prunes = 0;
        self.incumbents = 0;
        tracing::trace!(
            selection = self.selection,
            %student,
            requests = model.student(student).requests().len(),
            "enter search"
        );
    }

    fn on_exit_search(&mut self, student: StudentId, nodes: u64, timed_out: bool) {
        if timed_out {
            tracing::debug!(selection = self.selection, %student, nodes, "search timed out");
        }
        tracing::trace!(
            selection = self.selection,
            %student,
            nodes,
            prunes = self.prunes,
            incumbents = self.incumbents,
            "exit search"
        );
    }

    fn on_step(&mut self, depth: usize) {
        tracing::trace!(selection = self.selection, depth, "node");
    }

    fn on_prune(&mut self, depth: usize, reason: PruneReason) {
        self.prunes += 1;
        tracing::trace!(selection = self.selection, depth, %reason, "prune");
    }

    fn on_incumbent(&mut self, value: f64) {
        self.incumbents += 1;
        tracing::trace!(selection = self.selection, value, "incumbent");
    }
}
