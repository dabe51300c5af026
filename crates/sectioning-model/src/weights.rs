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

//! Student weights turn an enrollment and its soft conflicts into a weight in
//! `[0, 1]`-ish range; the search minimizes `-(request weight × weight)`
//! summed over a student's schedule.
//!
//! `bound(request)` must never be below the weight of any enrollment of the
//! request: it is what the branch and bound prunes with before any conflict
//! is computed.

use crate::{
    enrollment::Enrollment,
    index::RequestId,
    model::Model,
    quality::{Conflict, ConflictKind},
    request::satisfies_choices,
};

pub trait StudentWeights: Send + Sync {
    fn name(&self) -> &str;

    /// Weight of the enrollment ignoring all conflicts.
    fn base_weight(&self, model: &Model, enrollment: &Enrollment) -> f64;

    /// Weight of the enrollment given its conflicts.
    fn weight(&self, model: &Model, enrollment: &Enrollment, conflicts: &[Conflict]) -> f64;

    /// Upper bound on `weight` over every enrollment of the request.
    fn bound(&self, model: &Model, request: RequestId) -> f64;
}

/// Fraction of the enrollment's weekly minutes covered by an overlap.
#[inline]
fn overlap_share(model: &Model, enrollment: &Enrollment, minutes: u32) -> f64 {
    let total = enrollment.weekly_minutes(model).max(1);
    (minutes as f64 / total as f64).min(1.0)
}

fn conflict_penalty(
    model: &Model,
    enrollment: &Enrollment,
    base: f64,
    conflicts: &[Conflict],
    distance_factor: f64,
    overlap_factor: f64,
) -> f64 {
    conflicts
        .iter()
        .map(|c| match c.kind {
            ConflictKind::Distance => base * distance_factor * c.penalty,
            ConflictKind::Overlap | ConflictKind::FreeTime | ConflictKind::Unavailability => {
                base * overlap_factor * c.penalty * overlap_share(model, enrollment, c.minutes)
            }
        })
        .sum()
}

/// Earlier requests weigh more: the first non-alternative request takes
/// `priority` of the total, the next takes `priority` of what is left, and so
/// on; the last one takes the rest. Alternative courses within a request are
/// discounted by the alternative factors.
#[derive(Clone, Debug, PartialEq)]
pub struct PriorityStudentWeights {
    pub priority: f64,
    pub first_alternative: f64,
    pub second_alternative: f64,
    pub distance_conflict: f64,
    pub time_overlap: f64,
    pub selection: f64,
}

impl Default for PriorityStudentWeights {
    fn default() -> Self {
        Self {
            priority: 0.5,
            first_alternative: 0.5,
            second_alternative: 0.25,
            distance_conflict: 0.01,
            time_overlap: 0.5,
            selection: 0.1,
        }
    }
}

impl PriorityStudentWeights {
    /// Share of the student's total the request is worth.
    pub fn request_weight(&self, model: &Model, request: RequestId) -> f64 {
        let req = model.request(request);
        let student = model.student(req.student());
        let non_alternatives = student.nr_requests();

        let mut total = 1.0;
        let mut last = 1.0;
        for (position, &r) in student.requests().iter().take(non_alternatives).enumerate() {
            let w = if position + 1 == non_alternatives {
                total
            } else {
                self.priority * total
            };
            if r == request {
                return w;
            }
            total -= w;
            last = w;
        }

        // Alternative requests stand in for the least important request.
        let alternative_position = req.priority().saturating_sub(non_alternatives);
        last * self.first_alternative.powi(alternative_position as i32 + 1)
    }

    #[inline]
    fn course_factor(&self, priority: usize) -> f64 {
        match priority {
            0 => 1.0,
            1 => self.first_alternative,
            _ => self.second_alternative,
        }
    }
}

impl StudentWeights for PriorityStudentWeights {
    fn name(&self) -> &str {
        "Priority"
    }

    fn base_weight(&self, model: &Model, enrollment: &Enrollment) -> f64 {
        let w = self.request_weight(model, enrollment.request());
        if enrollment.is_course() {
            w * self.course_factor(enrollment.priority())
        } else {
            w
        }
    }

    fn weight(&self, model: &Model, enrollment: &Enrollment, conflicts: &[Conflict]) -> f64 {
        let base = self.base_weight(model, enrollment);
        let mut weight = base
            - conflict_penalty(
                model,
                enrollment,
                base,
                conflicts,
                self.distance_conflict,
                self.time_overlap,
            );
        let request = model.request(enrollment.request());
        if let Some(course) = request.as_course() {
            if !course.selected().is_empty()
                && !satisfies_choices(model, course.selected(), enrollment)
            {
                weight -= base * self.selection;
            }
        }
        weight
    }

    fn bound(&self, model: &Model, request: RequestId) -> f64 {
        self.request_weight(model, request)
    }
}

/// Every request is worth the same; only conflicts make a difference.
#[derive(Clone, Debug, PartialEq)]
pub struct EqualStudentWeights {
    pub distance_conflict: f64,
    pub time_overlap: f64,
}

impl Default for EqualStudentWeights {
    fn default() -> Self {
        Self {
            distance_conflict: 0.01,
            time_overlap: 0.5,
        }
    }
}

impl StudentWeights for EqualStudentWeights {
    fn name(&self) -> &str {
        "Equal"
    }

    fn base_weight(&self, _model: &Model, _enrollment: &Enrollment) -> f64 {
        1.0
    }

    fn weight(&self, model: &Model, enrollment: &Enrollment, conflicts: &[Conflict]) -> f64 {
        1.0 - conflict_penalty(
            model,
            enrollment,
            1.0,
            conflicts,
            self.distance_conflict,
            self.time_overlap,
        )
    }

    fn bound(&self, _model: &Model, _request: RequestId) -> f64 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{CourseRequestSpec, ModelBuilder, SectionSpec, StudentSpec};
    use crate::index::RequestId;
    use crate::offering::UNLIMITED;
    use sectioning_core::time::{DayCode, TimeLocation};

    fn model_with_requests(n: usize, alternatives: usize) -> (Model, Vec<RequestId>) {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("ENG 100");
        let course = b.add_course(offering, "ENG 100", UNLIMITED, 3.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        b.add_section(
            subpart,
            SectionSpec::unlimited("1").with_time(TimeLocation::new(DayCode::MON, 96, 12)),
        )
        .unwrap();
        let s = b.add_student(StudentSpec::new(1));
        let mut requests = Vec::new();
        for _ in 0..n {
            requests.push(b.add_course_request(s, CourseRequestSpec::new([course])).unwrap());
        }
        for _ in 0..alternatives {
            requests.push(
                b.add_course_request(s, CourseRequestSpec::new([course]).alternative())
                    .unwrap(),
            );
        }
        (b.build().unwrap(), requests)
    }

    #[test]
    fn test_priority_weights_sum_to_one() {
        let (model, requests) = model_with_requests(4, 0);
        let w = PriorityStudentWeights::default();
        let total: f64 = requests.iter().map(|&r| w.request_weight(&model, r)).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(w.request_weight(&model, requests[0]) > w.request_weight(&model, requests[1]));
    }

    #[test]
    fn test_alternative_weighs_less_than_last_request() {
        let (model, requests) = model_with_requests(2, 1);
        let w = PriorityStudentWeights::default();
        assert!(w.request_weight(&model, requests[2]) < w.request_weight(&model, requests[1]));
    }

    #[test]
    fn test_conflicts_never_exceed_bound() {
        let (model, requests) = model_with_requests(2, 0);
        let w = PriorityStudentWeights::default();
        let e = Enrollment::free_time(requests[0]);
        let conflict = Conflict {
            kind: ConflictKind::Distance,
            request: requests[0],
            other: None,
            section: None,
            minutes: 0,
            penalty: 1.0,
        };
        let weight = w.weight(&model, &e, &[conflict]);
        assert!(weight < w.bound(&model, requests[0]));
    }

    #[test]
    fn test_equal_weights() {
        let (model, requests) = model_with_requests(3, 0);
        let w = EqualStudentWeights::default();
        let e = Enrollment::free_time(requests[2]);
        assert_eq!(w.weight(&model, &e, &[]), 1.0);
        assert_eq!(w.bound(&model, requests[0]), 1.0);
    }
}
