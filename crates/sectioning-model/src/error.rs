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

use thiserror::Error;

/// Reasons a `ModelBuilder` refuses to produce a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("{kind} {index} does not exist")]
    DanglingId { kind: &'static str, index: usize },
    #[error("config {0} has no subparts")]
    EmptyConfig(usize),
    #[error("subpart {child} has parent subpart {parent} from a different config")]
    SubpartParentMismatch { child: usize, parent: usize },
    #[error("section {section} has parent section {parent} outside of the parent subpart")]
    SectionParentMismatch { section: usize, parent: usize },
    #[error("course request {0} lists no courses")]
    EmptyCourseRequest(usize),
    #[error("course {course} is not requested by request {request}")]
    CourseNotRequested { request: usize, course: usize },
    #[error("enrollment of request {0} does not pick exactly one section per subpart")]
    IncompleteEnrollment(usize),
    #[error("request {request} has negative weight {weight}")]
    NegativeWeight { request: usize, weight: f64 },
    #[error("reservation {reservation} restricts to config or section {index} of another offering")]
    ReservationScope { reservation: usize, index: usize },
}
