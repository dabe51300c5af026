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

//! Times to avoid.
//!
//! Requests with only a few available values are easy to lose: any other
//! request of the student that takes one of their times may leave them with
//! nothing. Every time of a scarce request's values is weighed by how scarce
//! the request is (one over the number of its values), and candidates of the
//! other requests are tried in order of the total weight of the scarce times
//! they overlap.

use sectioning_core::time::TimeLocation;
use sectioning_model::{Enrollment, Model, index::RequestId};

#[derive(Clone, Debug, Default)]
pub struct TimesToAvoid {
    times: Vec<(RequestId, TimeLocation, f64)>,
}

impl TimesToAvoid {
    /// Collects the times of every course request with at least one and at
    /// most `scarce` candidate values.
    pub fn new<'c>(
        model: &Model,
        candidates: impl IntoIterator<Item = (RequestId, &'c [Enrollment])>,
        scarce: usize,
    ) -> Self {
        let mut times = Vec::new();
        for (request, values) in candidates {
            if !model.request(request).is_course() || values.is_empty() || values.len() > scarce {
                continue;
            }
            let weight = 1.0 / values.len() as f64;
            for value in values {
                for time in value.times(model) {
                    times.push((request, time.clone(), weight));
                }
            }
        }
        Self { times }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Weight of the scarce times of other requests the value overlaps.
    pub fn score(&self, model: &Model, enrollment: &Enrollment) -> f64 {
        if self.times.is_empty() {
            return 0.0;
        }
        let own = enrollment.times(model);
        self.times
            .iter()
            .filter(|(request, time, _)| {
                *request != enrollment.request() && own.iter().any(|t| t.overlaps(time))
            })
            .map(|(_, _, weight)| weight)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioning_core::time::DayCode;
    use sectioning_model::{
        builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec},
        candidates::enrollments,
        offering::UNLIMITED,
    };

    #[test]
    fn test_overlapping_a_scarce_request_scores() {
        let mut b = ModelBuilder::new();
        let mut courses = Vec::new();
        let mut sections = Vec::new();
        // The first course meets only Monday 9:00; the second either Monday
        // 9:00 or Tuesday 9:00.
        for (name, days) in [("A", vec![DayCode::MON]), ("B", vec![DayCode::MON, DayCode::TUE])] {
            let offering = b.add_offering(name);
            let course = b.add_course(offering, name, UNLIMITED, 3.0).unwrap();
            let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
            let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
            let mut own = Vec::new();
            for (i, day) in days.into_iter().enumerate() {
                own.push(
                    b.add_section(
                        subpart,
                        SectionSpec::unlimited(format!("{}", i + 1))
                            .with_time(TimeLocation::new(day, 108, 12)),
                    )
                    .unwrap(),
                );
            }
            courses.push(course);
            sections.push(own);
        }
        let s = b.add_student(StudentSpec::new(1));
        let ra = b.add_course_request(s, CourseRequestSpec::new([courses[0]])).unwrap();
        let rb = b.add_course_request(s, CourseRequestSpec::new([courses[1]])).unwrap();
        let model = b.build().unwrap();

        let va = enrollments(&model, ra);
        let vb = enrollments(&model, rb);
        let avoid = TimesToAvoid::new(&model, [(ra, va.as_slice()), (rb, vb.as_slice())], 1);
        assert!(!avoid.is_empty());

        let monday = vb.iter().find(|e| e.sections() == [sections[1][0]]).unwrap();
        let tuesday = vb.iter().find(|e| e.sections() == [sections[1][1]]).unwrap();
        assert_eq!(avoid.score(&model, monday), 1.0);
        assert_eq!(avoid.score(&model, tuesday), 0.0);
        // A request never avoids its own times.
        assert_eq!(avoid.score(&model, &va[0]), 0.0);
    }
}
