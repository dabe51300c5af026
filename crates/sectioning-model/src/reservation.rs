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

//! Reservations carve space out of an offering for a group of students.
//!
//! A reservation may be limited to some configurations and/or sections of its
//! offering. Enrollments that use a reservation are counted against the
//! reservation's limit; enrollments that do not must fit into the space left
//! after every active reservation took its remaining share.

use crate::{
    index::{ConfigId, CourseId, OfferingId, ReservationId, SectionId, StudentId},
    model::Model,
};
use rustc_hash::FxHashSet;

#[derive(Clone, Debug)]
pub enum ReservationKind {
    /// Named students.
    Individual(FxHashSet<StudentId>),
    /// A student group (e.g. a major or a cohort).
    Group(FxHashSet<StudentId>),
    /// Students requesting the given course of a cross-listed offering.
    Course(CourseId),
}

#[derive(Clone, Debug)]
pub struct Reservation {
    pub(crate) id: ReservationId,
    pub(crate) offering: OfferingId,
    pub(crate) name: String,
    pub(crate) kind: ReservationKind,
    pub(crate) limit: f64,
    pub(crate) priority: i32,
    pub(crate) configs: Vec<ConfigId>,
    pub(crate) sections: Vec<SectionId>,
    pub(crate) can_assign_over_limit: bool,
    pub(crate) must_be_used: bool,
    pub(crate) allow_overlap: bool,
    pub(crate) expired: bool,
}

impl Reservation {
    #[inline]
    pub fn id(&self) -> ReservationId {
        self.id
    }

    #[inline]
    pub fn offering(&self) -> OfferingId {
        self.offering
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &ReservationKind {
        &self.kind
    }

    /// Reserved space, negative when unlimited.
    #[inline]
    pub fn limit(&self) -> f64 {
        self.limit
    }

    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.limit < 0.0
    }

    /// Lower values are preferred when several reservations apply.
    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[inline]
    pub fn configs(&self) -> &[ConfigId] {
        &self.configs
    }

    #[inline]
    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    /// Enrollments using the reservation ignore section, config and course
    /// limits.
    #[inline]
    pub fn can_assign_over_limit(&self) -> bool {
        self.can_assign_over_limit
    }

    /// Eligible students may only be enrolled through this reservation.
    #[inline]
    pub fn must_be_used(&self) -> bool {
        self.must_be_used
    }

    #[inline]
    pub fn allow_overlap(&self) -> bool {
        self.allow_overlap
    }

    /// Expired reservations no longer hold space and cannot be used by new
    /// enrollments.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Whether the reservation applies to the student at all.
    pub fn is_applicable(&self, model: &Model, student: StudentId) -> bool {
        match &self.kind {
            ReservationKind::Individual(students) | ReservationKind::Group(students) => {
                students.contains(&student)
            }
            ReservationKind::Course(course) => model.student(student).requests().iter().any(|&r| {
                model
                    .request(r)
                    .as_course()
                    .is_some_and(|c| c.courses().contains(course))
            }),
        }
    }

    /// Whether the reservation covers a config: no config restriction or the
    /// config is listed.
    #[inline]
    pub fn covers_config(&self, config: ConfigId) -> bool {
        self.configs.is_empty() || self.configs.contains(&config)
    }

    /// Whether the reservation reserves space in the section: its config is
    /// covered and, if the reservation lists sections of that subpart, the
    /// section is one of them.
    pub fn covers_section(&self, model: &Model, section: SectionId) -> bool {
        let subpart = model.section(section).subpart();
        if !self.covers_config(model.subpart(subpart).config()) {
            return false;
        }
        let mut restricted = false;
        for &s in &self.sections {
            if model.section(s).subpart() == subpart {
                if s == section {
                    return true;
                }
                restricted = true;
            }
        }
        !restricted
    }

    /// Whether a whole choice of sections in `config` is inside the
    /// reservation.
    pub fn includes(&self, model: &Model, config: ConfigId, sections: &[SectionId]) -> bool {
        self.covers_config(config) && sections.iter().all(|&s| self.covers_section(model, s))
    }
}
