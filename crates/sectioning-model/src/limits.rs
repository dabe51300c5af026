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

//! Capacity and reservation limits.
//!
//! An enrollment of a request with weight `w` fits when, for every section of
//! it, its config and its course, the weight already enrolled by *other*
//! requests plus `w` stays within the limit. Enrollments through a
//! reservation must also fit into the reservation's limit, and may ignore the
//! entity limits when the reservation allows assigning over limit.
//! Enrollments without a reservation must fit into the unreserved space: the
//! limit minus what is enrolled minus what active reservations still hold.
//!
//! [`capacity_conflicts`] answers the harder question of *which* enrollments
//! would have to leave so the candidate fits.

use crate::{
    assignment::{Assignment, OccupancyContext},
    enrollment::Enrollment,
    index::{ConfigId, OfferingId, RequestId, ReservationId, SectionId},
    model::Model,
    request::RequestPriority,
    student::StudentPriority,
};
use rustc_hash::FxHashSet;
use std::cmp::Reverse;

const EPSILON: f64 = 1e-9;

/// Space active reservations of the offering still hold in a section or
/// config, as seen by `request`. An unlimited reservation holds everything.
fn reserved_space(
    model: &Model,
    assignment: &Assignment,
    offering: OfferingId,
    request: RequestId,
    covers: impl Fn(ReservationId) -> bool,
    limit: f64,
) -> f64 {
    let mut reserved = 0.0;
    for &r in model.offering(offering).reservations() {
        let reservation = model.reservation(r);
        if reservation.is_expired() || !covers(r) {
            continue;
        }
        if reservation.is_unlimited() {
            return limit;
        }
        let used = assignment.reservation(r).enrollment_weight_excluding(request);
        reserved += (reservation.limit() - used).max(0.0);
    }
    reserved.min(limit)
}

fn section_reserved_space(
    model: &Model,
    assignment: &Assignment,
    section: SectionId,
    request: RequestId,
) -> f64 {
    let limit = model.section(section).limit() as f64;
    reserved_space(
        model,
        assignment,
        model.section_offering(section),
        request,
        |r| model.reservation(r).covers_section(model, section),
        limit,
    )
}

fn config_reserved_space(
    model: &Model,
    assignment: &Assignment,
    config: ConfigId,
    request: RequestId,
) -> f64 {
    let limit = model.config(config).limit() as f64;
    reserved_space(
        model,
        assignment,
        model.config(config).offering(),
        request,
        |r| model.reservation(r).covers_config(config),
        limit,
    )
}

#[inline]
fn exceeds(ctx: &OccupancyContext, request: RequestId, weight: f64, limit: i32) -> bool {
    limit >= 0 && ctx.enrollment_weight_excluding(request) + weight > limit as f64 + EPSILON
}

/// Whether the enrollment breaks a capacity or reservation limit given what
/// the other requests hold.
pub fn in_conflict(model: &Model, assignment: &Assignment, enrollment: &Enrollment) -> bool {
    if enrollment.is_free_time() {
        return false;
    }
    let request = enrollment.request();
    let weight = model.request(request).weight();

    let mut over_limit = false;
    if let Some(r) = enrollment.reservation() {
        let reservation = model.reservation(r);
        if reservation.is_expired() {
            return true;
        }
        if !reservation.is_unlimited()
            && assignment.reservation(r).enrollment_weight_excluding(request) + weight
                > reservation.limit() + EPSILON
        {
            return true;
        }
        over_limit = reservation.can_assign_over_limit();
    }

    if !over_limit {
        for &s in enrollment.sections() {
            if exceeds(assignment.section(s), request, weight, model.section(s).limit()) {
                return true;
            }
        }
        if let Some(c) = enrollment.config() {
            if exceeds(assignment.config(c), request, weight, model.config(c).limit()) {
                return true;
            }
        }
        if let Some(c) = enrollment.course_id() {
            if exceeds(assignment.course(c), request, weight, model.course(c).limit()) {
                return true;
            }
        }
    }

    if enrollment.reservation().is_none() {
        for &s in enrollment.sections() {
            let limit = model.section(s).limit();
            if limit < 0 {
                continue;
            }
            let available = limit as f64
                - assignment.section(s).enrollment_weight_excluding(request)
                - section_reserved_space(model, assignment, s, request);
            if weight > available + EPSILON {
                return true;
            }
        }
        if let Some(c) = enrollment.config() {
            let limit = model.config(c).limit();
            if limit >= 0 {
                let available = limit as f64
                    - assignment.config(c).enrollment_weight_excluding(request)
                    - config_reserved_space(model, assignment, c, request);
                if weight > available + EPSILON {
                    return true;
                }
            }
        }
    }
    false
}

/// Order in which enrollments are taken out to make room: enrollments
/// without a reservation first, then less important students, then less
/// important requests, then later requests.
fn adept_key(
    model: &Model,
    assignment: &Assignment,
    request: RequestId,
) -> (
    bool,
    Reverse<StudentPriority>,
    Reverse<RequestPriority>,
    Reverse<usize>,
    Reverse<RequestId>,
) {
    let req = model.request(request);
    (
        assignment
            .value(request)
            .is_some_and(|e| e.reservation().is_some()),
        Reverse(model.student(req.student()).priority()),
        Reverse(req.request_priority()),
        Reverse(req.priority()),
        Reverse(request),
    )
}

/// Takes adepts out of `ctx` (in [`adept_key`] order) until `weight` fits
/// under `available`. Returns `false` if even dropping all of them is not
/// enough.
#[allow(clippy::too_many_arguments)]
fn drop_adepts(
    model: &Model,
    assignment: &Assignment,
    ctx: &OccupancyContext,
    request: RequestId,
    weight: f64,
    available: f64,
    eligible: impl Fn(RequestId) -> bool,
    dropped: &mut FxHashSet<RequestId>,
) -> bool {
    let mut used: f64 = ctx
        .enrolled()
        .filter(|&r| r != request && !dropped.contains(&r))
        .map(|r| model.request(r).weight())
        .sum();
    if used + weight <= available + EPSILON {
        return true;
    }
    let mut adepts: Vec<RequestId> = ctx
        .enrolled()
        .filter(|&r| r != request && !dropped.contains(&r) && eligible(r))
        .collect();
    adepts.sort_by_key(|&r| adept_key(model, assignment, r));
    for adept in adepts {
        dropped.insert(adept);
        used -= model.request(adept).weight();
        if used + weight <= available + EPSILON {
            return true;
        }
    }
    false
}

/// Requests whose enrollments must be dropped for `enrollment` to fit every
/// limit, or `None` if it cannot fit at all.
pub fn capacity_conflicts(
    model: &Model,
    assignment: &Assignment,
    enrollment: &Enrollment,
) -> Option<FxHashSet<RequestId>> {
    let mut dropped = FxHashSet::default();
    if enrollment.is_free_time() {
        return Some(dropped);
    }
    let request = enrollment.request();
    let weight = model.request(request).weight();
    let any = |_: RequestId| true;

    let mut over_limit = false;
    if let Some(r) = enrollment.reservation() {
        let reservation = model.reservation(r);
        if reservation.is_expired() {
            return None;
        }
        if !reservation.is_unlimited()
            && !drop_adepts(
                model,
                assignment,
                assignment.reservation(r),
                request,
                weight,
                reservation.limit(),
                any,
                &mut dropped,
            )
        {
            return None;
        }
        over_limit = reservation.can_assign_over_limit();
    }

    if !over_limit {
        for &s in enrollment.sections() {
            let limit = model.section(s).limit();
            if limit >= 0
                && !drop_adepts(
                    model,
                    assignment,
                    assignment.section(s),
                    request,
                    weight,
                    limit as f64,
                    any,
                    &mut dropped,
                )
            {
                return None;
            }
        }
        if let Some(c) = enrollment.config() {
            let limit = model.config(c).limit();
            if limit >= 0
                && !drop_adepts(
                    model,
                    assignment,
                    assignment.config(c),
                    request,
                    weight,
                    limit as f64,
                    any,
                    &mut dropped,
                )
            {
                return None;
            }
        }
        if let Some(c) = enrollment.course_id() {
            let limit = model.course(c).limit();
            if limit >= 0
                && !drop_adepts(
                    model,
                    assignment,
                    assignment.course(c),
                    request,
                    weight,
                    limit as f64,
                    any,
                    &mut dropped,
                )
            {
                return None;
            }
        }
    }

    if enrollment.reservation().is_none() {
        let unreserved = |r: RequestId| {
            assignment
                .value(r)
                .is_some_and(|e| e.reservation().is_none())
        };
        for &s in enrollment.sections() {
            let limit = model.section(s).limit();
            if limit < 0 {
                continue;
            }
            let available =
                limit as f64 - section_reserved_space(model, assignment, s, request);
            if !drop_adepts(
                model,
                assignment,
                assignment.section(s),
                request,
                weight,
                available,
                unreserved,
                &mut dropped,
            ) {
                return None;
            }
        }
        if let Some(c) = enrollment.config() {
            let limit = model.config(c).limit();
            if limit >= 0 {
                let available =
                    limit as f64 - config_reserved_space(model, assignment, c, request);
                if !drop_adepts(
                    model,
                    assignment,
                    assignment.config(c),
                    request,
                    weight,
                    available,
                    unreserved,
                    &mut dropped,
                ) {
                    return None;
                }
            }
        }
    }
    Some(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{
        CourseRequestSpec, ModelBuilder, ReservationSpec, SectionSpec, StudentSpec,
    };
    use crate::index::{CourseId, StudentId};
    use crate::offering::UNLIMITED;
    use crate::reservation::ReservationKind;
    use crate::student::StudentPriority;

    struct Fixture {
        model: Model,
        requests: Vec<RequestId>,
        course: CourseId,
        section: SectionId,
    }

    /// One section with `limit` seats and one request per student priority.
    fn fixture(
        limit: i32,
        priorities: &[StudentPriority],
        reserved_for_first: Option<f64>,
    ) -> Fixture {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("PHYS 150");
        let course = b.add_course(offering, "PHYS 150", UNLIMITED, 3.0).unwrap();
        let config = b.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = b.add_subpart(config, "Lec", None, false).unwrap();
        let section = b.add_section(subpart, SectionSpec::new("1", limit)).unwrap();
        let mut requests = Vec::new();
        for (i, &p) in priorities.iter().enumerate() {
            let s = b.add_student(StudentSpec::new(i as u64).with_priority(p));
            requests.push(b.add_course_request(s, CourseRequestSpec::new([course])).unwrap());
        }
        if let Some(limit) = reserved_for_first {
            let students = [StudentId::new(0)].into_iter().collect();
            b.add_reservation(
                offering,
                ReservationSpec::new("first", ReservationKind::Individual(students), limit),
            )
            .unwrap();
        }
        Fixture {
            model: b.build().unwrap(),
            requests,
            course,
            section,
        }
    }

    fn enrollment(f: &Fixture, i: usize) -> Enrollment {
        let config = f.model.section_config(f.section);
        Enrollment::course(f.requests[i], 0, f.course, config, [f.section])
    }

    #[test]
    fn test_full_section_is_in_conflict() {
        let f = fixture(1, &[StudentPriority::Normal, StudentPriority::Normal], None);
        let mut a = Assignment::new(&f.model);
        assert!(!in_conflict(&f.model, &a, &enrollment(&f, 0)));
        a.assign(&f.model, enrollment(&f, 0));
        assert!(in_conflict(&f.model, &a, &enrollment(&f, 1)));
        // The holder itself is never in conflict with its own seat.
        assert!(!in_conflict(&f.model, &a, &enrollment(&f, 0)));
    }

    #[test]
    fn test_unlimited_section_never_conflicts() {
        let f = fixture(UNLIMITED, &[StudentPriority::Normal; 3], None);
        let mut a = Assignment::new(&f.model);
        a.assign(&f.model, enrollment(&f, 0));
        a.assign(&f.model, enrollment(&f, 1));
        assert!(!in_conflict(&f.model, &a, &enrollment(&f, 2)));
    }

    #[test]
    fn test_reserved_space_blocks_unreserved_students() {
        let f = fixture(2, &[StudentPriority::Normal; 3], Some(1.0));
        let mut a = Assignment::new(&f.model);
        a.assign(&f.model, enrollment(&f, 1));
        // One seat left, but it is held by the reservation of student 0.
        assert!(in_conflict(&f.model, &a, &enrollment(&f, 2)));
        let reserved = enrollment(&f, 0).with_reservation(Some(ReservationId::new(0)));
        assert!(!in_conflict(&f.model, &a, &reserved));
    }

    #[test]
    fn test_adepts_prefer_less_important_students() {
        let f = fixture(
            2,
            &[StudentPriority::Normal, StudentPriority::Dummy, StudentPriority::Priority],
            None,
        );
        let mut a = Assignment::new(&f.model);
        a.assign(&f.model, enrollment(&f, 0));
        a.assign(&f.model, enrollment(&f, 1));

        let dropped = capacity_conflicts(&f.model, &a, &enrollment(&f, 2)).unwrap();
        assert_eq!(dropped.len(), 1);
        assert!(dropped.contains(&f.requests[1]), "the dummy student gives way");
    }
}
