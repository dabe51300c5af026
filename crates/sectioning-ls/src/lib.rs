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

//! Swap based local search for student sectioning.
//!
//! These movers take over when the per-student branch and bound is stuck
//! because every useful section is full. They evaluate moves by performing
//! them on the shared assignment under the write lock and undo each trial
//! through the assignment journal, so a search that finds nothing leaves the
//! assignment exactly as it found it.
//!
//! Module map
//! - `budget`: wall-clock and iteration budget of one exploration.
//! - `moves`: protection rules, re-seating of displaced requests and the
//!   journaled trial shared by both movers.
//! - `neighbour`: the multi-student change set a swap proposes.
//! - `swap_student`: gives an incomplete student a value taken from others.
//! - `enrollment_swap`: moves an assigned request to a cheaper value, trading
//!   with the students holding it when needed.

pub mod budget;
pub mod enrollment_swap;
pub mod moves;
pub mod neighbour;
pub mod swap_student;

pub use enrollment_swap::StudentEnrollmentSwapSelection;
pub use moves::SwapRules;
pub use neighbour::{SwapKind, SwapNeighbour};
pub use swap_student::SwapStudentSelection;
