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

//! # Sectioning Model
//!
//! The problem side of student sectioning: what there is to enroll in, who
//! asks for what, and what a (partial) answer looks like.
//!
//! ## Modules
//!
//! - `index`: typed ids of every arena entity.
//! - `offering`, `student`, `request`, `reservation`: the immutable arena
//!   entities. Back-references are ids, never pointers.
//! - `enrollment`: one candidate value of a request (course, config, sections
//!   and the reservation it goes through).
//! - `model`, `builder`: the frozen `Model` and the `ModelBuilder` that
//!   validates references and derives request bounds.
//! - `assignment`, `journal`: the mutable request to enrollment map with its
//!   occupancy contexts, and LIFO undo over it.
//! - `limits`, `constraints`, `alternatives`: capacity, reservation and
//!   student-level hard constraints, including `Model::conflicts`.
//! - `candidates`: enumeration of the structurally valid enrollments of a
//!   request.
//! - `quality`, `weights`, `objective`: soft conflicts, student weights and the
//!   resulting schedule value.
//! - `synthetic`: seeded random instances.

pub mod alternatives;
pub mod assignment;
pub mod builder;
pub mod candidates;
pub mod constraints;
pub mod enrollment;
pub mod error;
pub mod index;
pub mod journal;
pub mod limits;
pub mod model;
pub mod objective;
pub mod offering;
pub mod quality;
pub mod request;
pub mod reservation;
pub mod student;
pub mod synthetic;
pub mod weights;

pub use assignment::Assignment;
pub use enrollment::Enrollment;
pub use error::ModelError;
pub use model::Model;
