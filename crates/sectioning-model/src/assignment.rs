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

//! # Assignment and Occupancy Contexts
//!
//! The mutable half of the problem: which enrollment every request holds, and
//! the occupancy of every section, config, course, reservation and request
//! group that follows from it.
//!
//! Every change goes through [`Assignment::assign`] or
//! [`Assignment::unassign`], which call `on_assigned` / `on_unassigned` on each
//! affected context exactly once. Contexts keep the set of enrolled requests
//! (ordered) and update their aggregates in constant time; the weight extremes
//! are rescanned only when an extreme leaves.
//!
//! Equality compares values and enrolled sets only. The aggregates follow
//! from the enrolled sets and the revision counter is a change stamp, not
//! state.

use crate::{
    enrollment::Enrollment,
    index::{ConfigId, CourseId, GroupId, RequestId, ReservationId, SectionId, StudentId},
    model::Model,
};
use sectioning_core::index::IndexVec;
use std::collections::BTreeMap;

/// Occupancy of one section, config, course or reservation.
#[derive(Clone, Debug, Default)]
pub struct OccupancyContext {
    enrolled: BTreeMap<RequestId, f64>,
    weight: f64,
    min_weight: f64,
    max_weight: f64,
}

impl PartialEq for OccupancyContext {
    fn eq(&self, other: &Self) -> bool {
        self.enrolled == other.enrolled
    }
}

impl OccupancyContext {
    fn on_assigned(&mut self, request: RequestId, weight: f64) {
        if let Some(previous) = self.enrolled.remove(&request) {
            self.on_removed(previous);
        }
        self.enrolled.insert(request, weight);
        self.weight += weight;
        if self.enrolled.len() == 1 {
            self.min_weight = weight;
            self.max_weight = weight;
        } else {
            self.min_weight = self.min_weight.min(weight);
            self.max_weight = self.max_weight.max(weight);
        }
    }

    fn on_unassigned(&mut self, request: RequestId) {
        if let Some(weight) = self.enrolled.remove(&request) {
            self.on_removed(weight);
        }
    }

    fn on_removed(&mut self, weight: f64) {
        if self.enrolled.is_empty() {
            self.weight = 0.0;
            self.min_weight = 0.0;
            self.max_weight = 0.0;
            return;
        }
        self.weight -= weight;
        if weight <= self.min_weight || weight >= self.max_weight {
            let values = self.enrolled.values().copied();
            self.min_weight = values.clone().fold(f64::INFINITY, f64::min);
            self.max_weight = values.fold(f64::NEG_INFINITY, f64::max);
        }
    }

    /// Total weight of the enrolled requests.
    #[inline]
    pub fn enrollment_weight(&self) -> f64 {
        self.weight
    }

    /// Total weight without the given request, if it is enrolled.
    #[inline]
    pub fn enrollment_weight_excluding(&self, request: RequestId) -> f64 {
        match self.enrolled.get(&request) {
            Some(w) => self.weight - w,
            None => self.weight,
        }
    }

    #[inline]
    pub fn min_weight(&self) -> f64 {
        self.min_weight
    }

    #[inline]
    pub fn max_weight(&self) -> f64 {
        self.max_weight
    }

    #[inline]
    pub fn contains(&self, request: RequestId) -> bool {
        self.enrolled.contains_key(&request)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.enrolled.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.enrolled.is_empty()
    }

    /// Enrolled requests in id order.
    #[inline]
    pub fn enrolled(&self) -> impl Iterator<Item = RequestId> + '_ {
        self.enrolled.keys().copied()
    }
}

/// Occupancy of a request group: which of its requests are enrolled and how
/// the group spreads over sections.
#[derive(Clone, Debug, Default)]
pub struct GroupContext {
    enrolled: BTreeMap<RequestId, (f64, Vec<SectionId>)>,
    weight: f64,
    /// Weight and member count per attended section.
    section_weights: BTreeMap<SectionId, (f64, usize)>,
}

impl PartialEq for GroupContext {
    fn eq(&self, other: &Self) -> bool {
        self.enrolled == other.enrolled
    }
}

impl GroupContext {
    fn on_assigned(&mut self, request: RequestId, weight: f64, sections: &[SectionId]) {
        self.on_unassigned(request);
        for &s in sections {
            let entry = self.section_weights.entry(s).or_insert((0.0, 0));
            entry.0 += weight;
            entry.1 += 1;
        }
        self.weight += weight;
        self.enrolled.insert(request, (weight, sections.to_vec()));
    }

    fn on_unassigned(&mut self, request: RequestId) {
        let Some((weight, sections)) = self.enrolled.remove(&request) else {
            return;
        };
        for s in sections {
            if let Some(entry) = self.section_weights.get_mut(&s) {
                entry.1 -= 1;
                if entry.1 == 0 {
                    self.section_weights.remove(&s);
                } else {
                    entry.0 -= weight;
                }
            }
        }
        self.weight = if self.enrolled.is_empty() { 0.0 } else { self.weight - weight };
    }

    #[inline]
    pub fn enrollment_weight(&self) -> f64 {
        self.weight
    }

    /// Weight of group members attending the section.
    #[inline]
    pub fn section_weight(&self, section: SectionId) -> f64 {
        self.section_weights.get(&section).map_or(0.0, |&(weight, _)| weight)
    }

    /// Fraction of the group's weight in its most attended sections, one per
    /// enrolled subpart. 1 means the group is fully together.
    pub fn togetherness(&self) -> f64 {
        if self.weight <= 0.0 {
            return 1.0;
        }
        let max = self
            .section_weights
            .values()
            .map(|&(weight, _)| weight)
            .fold(0.0, f64::max);
        max / self.weight
    }
}

#[derive(Clone, Debug)]
pub struct Assignment {
    values: IndexVec<RequestId, Option<Enrollment>>,
    sections: IndexVec<SectionId, OccupancyContext>,
    configs: IndexVec<ConfigId, OccupancyContext>,
    courses: IndexVec<CourseId, OccupancyContext>,
    reservations: IndexVec<ReservationId, OccupancyContext>,
    groups: IndexVec<GroupId, GroupContext>,
    nr_assigned: usize,
    revision: u64,
}

impl Assignment {
    /// An empty assignment sized for the model.
    pub fn new(model: &Model) -> Self {
        Self {
            values: IndexVec::from_elem(None, model.requests().len()),
            sections: IndexVec::from_elem(OccupancyContext::default(), model.sections().len()),
            configs: IndexVec::from_elem(OccupancyContext::default(), model.configs().len()),
            courses: IndexVec::from_elem(OccupancyContext::default(), model.courses().len()),
            reservations: IndexVec::from_elem(
                OccupancyContext::default(),
                model.reservations().len(),
            ),
            groups: IndexVec::from_elem(GroupContext::default(), model.groups().len()),
            nr_assigned: 0,
            revision: 0,
        }
    }

    /// A copy of the assignment state for what-if evaluation. The model is
    /// not copied; both assignments keep referring to the same one.
    #[inline]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    #[inline]
    pub fn value(&self, request: RequestId) -> Option<&Enrollment> {
        self.values[request].as_ref()
    }

    #[inline]
    pub fn is_assigned(&self, request: RequestId) -> bool {
        self.values[request].is_some()
    }

    #[inline]
    pub fn nr_assigned(&self) -> usize {
        self.nr_assigned
    }

    /// Number of transitions applied so far.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub(crate) fn restore_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    #[inline]
    pub fn section(&self, id: SectionId) -> &OccupancyContext {
        &self.sections[id]
    }

    #[inline]
    pub fn config(&self, id: ConfigId) -> &OccupancyContext {
        &self.configs[id]
    }

    #[inline]
    pub fn course(&self, id: CourseId) -> &OccupancyContext {
        &self.courses[id]
    }

    #[inline]
    pub fn reservation(&self, id: ReservationId) -> &OccupancyContext {
        &self.reservations[id]
    }

    #[inline]
    pub fn group(&self, id: GroupId) -> &GroupContext {
        &self.groups[id]
    }

    /// Assigned requests with their enrollments, in request order.
    pub fn assigned(&self) -> impl Iterator<Item = (RequestId, &Enrollment)> + '_ {
        self.values
            .iter_enumerated()
            .filter_map(|(r, e)| e.as_ref().map(|e| (r, e)))
    }

    /// The student's current values, one slot per request in request order.
    pub fn schedule(&self, model: &Model, student: StudentId) -> Vec<Option<Enrollment>> {
        model
            .student(student)
            .requests()
            .iter()
            .map(|&r| self.values[r].clone())
            .collect()
    }

    pub fn nr_assigned_of(&self, model: &Model, student: StudentId) -> usize {
        model
            .student(student)
            .requests()
            .iter()
            .filter(|&&r| self.values[r].is_some())
            .count()
    }

    /// Assigns the enrollment to its request, replacing (and returning) any
    /// previous value.
    pub fn assign(&mut self, model: &Model, enrollment: Enrollment) -> Option<Enrollment> {
        let request = enrollment.request();
        let previous = self.values[request].take();
        if let Some(previous) = &previous {
            self.on_unassigned(model, previous);
            self.nr_assigned -= 1;
        }
        self.on_assigned(model, &enrollment);
        self.values[request] = Some(enrollment);
        self.nr_assigned += 1;
        self.revision += 1;
        previous
    }

    /// Removes and returns the request's value, if any.
    pub fn unassign(&mut self, model: &Model, request: RequestId) -> Option<Enrollment> {
        let previous = self.values[request].take();
        if let Some(previous) = &previous {
            self.on_unassigned(model, previous);
            self.nr_assigned -= 1;
            self.revision += 1;
        }
        previous
    }

    fn on_assigned(&mut self, model: &Model, enrollment: &Enrollment) {
        let request = model.request(enrollment.request());
        let weight = request.weight();
        let id = request.id();

        for &s in enrollment.sections() {
            self.sections[s].on_assigned(id, weight);
        }
        if let Some(config) = enrollment.config() {
            self.configs[config].on_assigned(id, weight);
        }
        if let Some(course) = enrollment.course_id() {
            self.courses[course].on_assigned(id, weight);
            if let Some(group) = request.group() {
                if model.group(group).course() == course {
                    self.groups[group].on_assigned(id, weight, enrollment.sections());
                }
            }
        }
        if let Some(reservation) = enrollment.reservation() {
            self.reservations[reservation].on_assigned(id, weight);
        }
    }

    fn on_unassigned(&mut self, model: &Model, enrollment: &Enrollment) {
        let request = model.request(enrollment.request());
        let id = request.id();

        for &s in enrollment.sections() {
            self.sections[s].on_unassigned(id);
        }
        if let Some(config) = enrollment.config() {
            self.configs[config].on_unassigned(id);
        }
        if let Some(course) = enrollment.course_id() {
            self.courses[course].on_unassigned(id);
            if let Some(group) = request.group() {
                self.groups[group].on_unassigned(id);
            }
        }
        if let Some(reservation) = enrollment.reservation() {
            self.reservations[reservation].on_unassigned(id);
        }
    }
}

impl PartialEq for Assignment {
    fn eq(&self, other: &Self) -> bool {
        self.nr_assigned == other.nr_assigned
            && self.values == other.values
            && self.sections == other.sections
            && self.configs == other.configs
            && self.courses == other.courses
            && self.reservations == other.reservations
            && self.groups == other.groups
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| match (a, b) {
                    (Some(a), Some(b)) => a.reservation() == b.reservation(),
                    _ => true,
                })
    }
}
