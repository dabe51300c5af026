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

//! Shared search vocabulary of the sectioning engine.
//!
//! - `solution`: the model plus the assignment behind a lock, with
//!   revision-checked application of proposals.
//! - `neighbour`: the `Neighbour` trait every selection outputs.
//! - `selection`: the `NeighbourSelection` trait, work queues and the
//!   retrying unit processor.
//! - `monitor`: per-search observers, time budgets and tracing.
//! - `config`, `properties`, `order`: configuration and student ordering.
//! - `stats`: per-selection counters.

pub mod config;
pub mod error;
pub mod monitor;
pub mod neighbour;
pub mod order;
pub mod properties;
pub mod selection;
pub mod solution;
pub mod stats;

pub use error::Retryable;
pub use neighbour::{Neighbour, Proposal};
pub use selection::{NeighbourSelection, Outcome, WorkUnit};
pub use solution::Solution;
