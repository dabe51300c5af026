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

//! Candidate enrollments of a request.
//!
//! [`enrollments`] enumerates every structurally valid value: for each
//! requested course (in preference order), each config of its offering, and
//! every way of picking one section per subpart such that each child section
//! sits under the picked parent section, no two picked sections overlap hard,
//! no picked section is cancelled or collides with a hard unavailability of
//! the student, and the request's required choices hold.
//!
//! Reservations are attached as the enrollment is produced: the applicable
//! reservation with the best priority whose scope includes the sections.
//! [`available_enrollments`] additionally drops (or re-attaches) candidates
//! that do not fit the current occupancy.

use crate::{
    assignment::Assignment,
    enrollment::Enrollment,
    index::{ConfigId, CourseId, OfferingId, RequestId, ReservationId, SectionId, StudentId},
    limits,
    model::Model,
    request::{RequestKind, satisfies_choices},
};
use smallvec::SmallVec;

/// Whether any section collides with a hard unavailability of the student.
pub fn overlaps_unavailability(model: &Model, student: StudentId, enrollment: &Enrollment) -> bool {
    enrollment
        .sections()
        .iter()
        .any(|&s| section_overlaps_unavailability(model, student, s))
}

fn section_overlaps_unavailability(model: &Model, student: StudentId, section: SectionId) -> bool {
    let sec = model.section(section);
    if model.subpart(sec.subpart()).allow_overlap() {
        return false;
    }
    let Some(time) = sec.time() else {
        return false;
    };
    model
        .student(student)
        .unavailabilities()
        .iter()
        .any(|u| !u.allow_overlap && u.time.overlaps(time))
}

/// Non-expired reservations of the offering the student may use, best first.
pub fn applicable_reservations(
    model: &Model,
    student: StudentId,
    offering: OfferingId,
) -> SmallVec<[ReservationId; 2]> {
    let mut out: SmallVec<[ReservationId; 2]> = model
        .offering(offering)
        .reservations()
        .iter()
        .copied()
        .filter(|&r| {
            let reservation = model.reservation(r);
            !reservation.is_expired() && reservation.is_applicable(model, student)
        })
        .collect();
    out.sort_by_key(|&r| (model.reservation(r).priority(), r));
    out
}

/// Reservation options for an enrollment in `config` with `sections`, best
/// first; `None` ends the list when the enrollment may go without one.
fn reservation_options(
    model: &Model,
    applicable: &[ReservationId],
    config: ConfigId,
    sections: &[SectionId],
) -> SmallVec<[Option<ReservationId>; 3]> {
    let mut out: SmallVec<[Option<ReservationId>; 3]> = applicable
        .iter()
        .copied()
        .filter(|&r| model.reservation(r).includes(model, config, sections))
        .map(Some)
        .collect();
    let must_use = applicable
        .iter()
        .any(|&r| model.reservation(r).must_be_used());
    if !must_use {
        out.push(None);
    }
    out
}

struct Enumeration<'m> {
    model: &'m Model,
    request: RequestId,
    student: StudentId,
    priority: usize,
    course: CourseId,
    config: ConfigId,
    applicable: SmallVec<[ReservationId; 2]>,
    chosen: SmallVec<[SectionId; 4]>,
}

impl Enumeration<'_> {
    fn fits(&self, section: SectionId) -> bool {
        let model = self.model;
        let sec = model.section(section);
        if sec.is_cancelled() {
            return false;
        }
        let subpart = model.subpart(sec.subpart());
        if let Some(parent_subpart) = subpart.parent() {
            let picked_parent = self
                .chosen
                .iter()
                .copied()
                .find(|&s| model.section(s).subpart() == parent_subpart);
            if let (Some(picked), Some(parent)) = (picked_parent, sec.parent()) {
                if picked != parent {
                    return false;
                }
            }
        }
        if section_overlaps_unavailability(model, self.student, section) {
            return false;
        }
        !self.chosen.iter().any(|&other| {
            let o = model.section(other);
            o.is_overlapping(sec)
                && !subpart.allow_overlap()
                && !model.subpart(o.subpart()).allow_overlap()
        })
    }

    fn run(&mut self, depth: usize, out: &mut Vec<Enrollment>) {
        let model = self.model;
        let subparts = model.config(self.config).subparts();
        if depth == subparts.len() {
            self.emit(out);
            return;
        }
        for &section in model.subpart(subparts[depth]).sections() {
            if !self.fits(section) {
                continue;
            }
            self.chosen.push(section);
            self.run(depth + 1, out);
            self.chosen.pop();
        }
    }

    fn emit(&self, out: &mut Vec<Enrollment>) {
        let enrollment = Enrollment::course(
            self.request,
            self.priority,
            self.course,
            self.config,
            self.chosen.iter().copied(),
        );
        let request = self.model.request(self.request);
        if let Some(course) = request.as_course() {
            if !satisfies_choices(self.model, course.required(), &enrollment) {
                return;
            }
        }
        let options = reservation_options(
            self.model,
            &self.applicable,
            self.config,
            enrollment.sections(),
        );
        if let Some(&reservation) = options.first() {
            out.push(enrollment.with_reservation(reservation));
        }
    }
}

/// Every structurally valid enrollment of the request, ignoring occupancy.
pub fn enrollments(model: &Model, request: RequestId) -> Vec<Enrollment> {
    let req = model.request(request);
    let course_request = match req.kind() {
        RequestKind::FreeTime(_) => return vec![Enrollment::free_time(request)],
        RequestKind::Course(c) => c,
    };
    if let Some(fixed) = course_request.fixed() {
        return vec![fixed.clone()];
    }

    let mut out = Vec::new();
    for (priority, &course) in course_request.courses().iter().enumerate() {
        let offering = model.course(course).offering();
        let applicable = applicable_reservations(model, req.student(), offering);
        for &config in model.offering(offering).configs() {
            let mut enumeration = Enumeration {
                model,
                request,
                student: req.student(),
                priority,
                course,
                config,
                applicable: applicable.clone(),
                chosen: SmallVec::new(),
            };
            enumeration.run(0, &mut out);
        }
    }
    out
}

/// Re-attaches the best reservation under which the enrollment fits the
/// current occupancy, or `None` if it fits under none.
pub fn fit_reservation(
    model: &Model,
    assignment: &Assignment,
    enrollment: &Enrollment,
) -> Option<Enrollment> {
    let (Some(config), Some(offering)) = (enrollment.config(), enrollment.offering(model)) else {
        return Some(enrollment.clone());
    };
    let student = model.request(enrollment.request()).student();
    let applicable = applicable_reservations(model, student, offering);
    reservation_options(model, &applicable, config, enrollment.sections())
        .into_iter()
        .map(|r| enrollment.clone().with_reservation(r))
        .find(|e| !limits::in_conflict(model, assignment, e))
}

/// Enrollments of the request that fit the current occupancy. Other
/// students' enrollments are obstacles; the request's own value is not.
pub fn available_enrollments(
    model: &Model,
    assignment: &Assignment,
    request: RequestId,
) -> Vec<Enrollment> {
    enrollments(model, request)
        .into_iter()
        .filter_map(|e| {
            if limits::in_conflict(model, assignment, &e) {
                fit_reservation(model, assignment, &e)
            } else {
                Some(e)
            }
        })
        .collect()
}

/// Available enrollments matching the request's selected choices.
pub fn selected_enrollments(
    model: &Model,
    assignment: &Assignment,
    request: RequestId,
) -> Vec<Enrollment> {
    let Some(course) = model.request(request).as_course() else {
        return Vec::new();
    };
    if course.selected().is_empty() {
        return Vec::new();
    }
    available_enrollments(model, assignment, request)
        .into_iter()
        .filter(|e| satisfies_choices(model, course.selected(), e))
        .collect()
}
