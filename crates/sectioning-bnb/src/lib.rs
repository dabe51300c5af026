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

//! Per-student branch and bound for student sectioning.
//!
//! The search (`selection`) finds the best schedule of one student while
//! every other student stays put. Its variants are expressed through a
//! `policy::Policy` and an `policy::Objective` rather than separate search
//! code; `avoid` orders candidates away from the times of scarce requests.
//!
//! Module map
//! - `selection`: the recursive search and its outcome.
//! - `policy`: comparison keys, objectives, policies and search settings.
//! - `avoid`: times-to-avoid scoring of candidate values.
//! - `neighbour`: the schedule replacement a search proposes.
//! - `selectors`: the neighbour selections driving the search over the
//!   student body (standard, critical courses, minimum credit, initial
//!   values, priority construction, online).

pub mod avoid;
pub mod neighbour;
pub mod policy;
pub mod selection;
pub mod selectors;

pub use neighbour::BranchBoundNeighbour;
pub use policy::{Key, Objective, PenaltySource, Policy, SearchSettings};
pub use selection::{SelectionOutcome, search};
