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

//! What a run did: per-phase counters and the final state of the schedule.

use sectioning_search::stats::SelectionStatistics;
use std::time::Duration;

/// Why the driver stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// A full round of improvement phases did not improve the best value.
    Converged,
    TimeLimit,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::Converged => write!(f, "converged"),
            TerminationReason::TimeLimit => write!(f, "time limit reached"),
        }
    }
}

/// One run of one selection until it reported it was done.
#[derive(Clone, Debug, Default)]
pub struct PhaseReport {
    pub name: String,
    /// Improvement round the phase ran in, 0 for construction.
    pub round: usize,
    pub passes: usize,
    pub applied: u64,
    /// Units given up on after repeated stale proposals.
    pub abandoned: u64,
    /// Objective change of everything the phase applied.
    pub value_change: f64,
    pub statistics: SelectionStatistics,
    pub elapsed: Duration,
}

impl std::fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<20} round {:>2}: {} applied, {} abandoned, {:+.3} value, {} ({:.1} ms)",
            self.name,
            self.round,
            self.applied,
            self.abandoned,
            self.value_change,
            self.statistics,
            self.elapsed.as_secs_f64() * 1000.0
        )
    }
}

#[derive(Clone, Debug)]
pub struct SolverReport {
    pub phases: Vec<PhaseReport>,
    pub rounds: usize,
    /// Students unassigned to release swap deadlocks.
    pub released: usize,
    pub value: f64,
    pub assigned_requests: usize,
    pub total_requests: usize,
    pub complete_students: usize,
    pub total_students: usize,
    pub termination: TerminationReason,
    pub elapsed: Duration,
}

impl SolverReport {
    /// Searches stopped by their own budget, over all phases.
    pub fn timeouts(&self) -> u64 {
        self.phases.iter().map(|p| p.statistics.timeouts).sum()
    }

    /// Statistics of every phase with the given name, merged.
    pub fn phase_statistics(&self, name: &str) -> SelectionStatistics {
        let mut merged = SelectionStatistics::new();
        for phase in self.phases.iter().filter(|p| p.name == name) {
            merged.merge(&phase.statistics);
        }
        merged
    }
}

impl std::fmt::Display for SolverReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Sectioning finished: {}", self.termination)?;
        writeln!(f, "  value:     {:.4}", self.value)?;
        writeln!(
            f,
            "  requests:  {}/{} assigned",
            self.assigned_requests, self.total_requests
        )?;
        writeln!(
            f,
            "  students:  {}/{} complete",
            self.complete_students, self.total_students
        )?;
        writeln!(f, "  rounds:    {}", self.rounds)?;
        writeln!(f, "  released:  {}", self.released)?;
        writeln!(f, "  timeouts:  {}", self.timeouts())?;
        writeln!(f, "  time:      {:.3} s", self.elapsed.as_secs_f64())?;
        for phase in &self.phases {
            writeln!(f, "  {}", phase)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(name: &str, timeouts: u64) -> PhaseReport {
        PhaseReport {
            name: name.to_string(),
            statistics: SelectionStatistics {
                selections: 4,
                timeouts,
                ..SelectionStatistics::default()
            },
            ..PhaseReport::default()
        }
    }

    #[test]
    fn test_aggregates_over_phases() {
        let report = SolverReport {
            phases: vec![phase("BranchBound", 1), phase("SwapStudent", 0), phase("BranchBound", 2)],
            rounds: 2,
            released: 0,
            value: -3.5,
            assigned_requests: 7,
            total_requests: 9,
            complete_students: 2,
            total_students: 3,
            termination: TerminationReason::Converged,
            elapsed: Duration::from_millis(12),
        };
        assert_eq!(report.timeouts(), 3);
        let merged = report.phase_statistics("BranchBound");
        assert_eq!(merged.selections, 8);
        assert_eq!(merged.timeouts, 3);
        let text = report.to_string();
        assert!(text.contains("7/9 assigned"));
        assert!(text.contains("converged"));
    }
}
