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

//! # Sectioning Solver
//!
//! Drives the selections of the sectioning engine over a shared solution:
//! construction phases first, then rounds of branch and bound, minimum credit
//! repair, swaps and problem-student release until nothing improves or the
//! time limit is reached.
//!
//! ## Modules
//!
//! - `solver`: the phased driver, its builder and the worker pool.
//! - `report`: per-phase statistics and the final summary.
//! - `error`: failures of the demo binary's setup.

pub mod error;
pub mod report;
pub mod solver;

pub use error::RunError;
pub use report::{PhaseReport, SolverReport, TerminationReason};
pub use solver::{SectioningSolver, SolverBuilder, SolverOutcome};
