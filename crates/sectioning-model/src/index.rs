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

//! Typed ids of every entity in the sectioning arena.

use sectioning_core::typed_index;

typed_index!(
    /// Index of an instructional offering (the owner of configs, courses and reservations).
    OfferingTag,
    OfferingId
);
typed_index!(
    /// Index of a course (one offering can be cross-listed as several courses).
    CourseTag,
    CourseId
);
typed_index!(
    /// Index of an offering configuration.
    ConfigTag,
    ConfigId
);
typed_index!(
    /// Index of a scheduling subpart within a configuration.
    SubpartTag,
    SubpartId
);
typed_index!(
    /// Index of a class section.
    SectionTag,
    SectionId
);
typed_index!(
    /// Index of a student.
    StudentTag,
    StudentId
);
typed_index!(
    /// Index of a course or free-time request.
    RequestTag,
    RequestId
);
typed_index!(
    /// Index of a reservation.
    ReservationTag,
    ReservationId
);
typed_index!(
    /// Index of a request group (students asking to be sectioned together).
    GroupTag,
    GroupId
);
