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

//! Incremental construction of a [`Model`].
//!
//! Entities are added parent first: an offering before its configs and
//! courses, a config before its subparts, a subpart before its sections, a
//! student before their requests. Every `add_*` call checks the ids it refers
//! to and hands back the id of the new entity. `build` validates the parts
//! that can only be checked once everything is known, reorders each student's
//! requests so alternatives come last, and precomputes the per-request bounds
//! the search prunes with.

use crate::{
    enrollment::Enrollment,
    error::ModelError,
    index::{
        ConfigId, CourseId, GroupId, OfferingId, RequestId, ReservationId, SectionId, StudentId,
        SubpartId,
    },
    model::{Model, ModelSettings, RequestGroup},
    offering::{Config, Course, Offering, Room, Section, Subpart, UNLIMITED},
    quality::ConflictOracle,
    request::{Choice, CourseRequest, FreeTimeRequest, Request, RequestKind, RequestPriority},
    reservation::{Reservation, ReservationKind},
    student::{LinkedSections, Student, StudentPriority, Unavailability},
    weights::{PriorityStudentWeights, StudentWeights},
};
use sectioning_core::{index::IndexVec, time::TimeLocation};

/// Everything about a section except its subpart.
#[derive(Clone, Debug)]
pub struct SectionSpec {
    pub name: String,
    pub limit: i32,
    pub time: Option<TimeLocation>,
    pub room: Option<Room>,
    pub parent: Option<SectionId>,
    pub penalty: f64,
    pub cancelled: bool,
    pub space_expected: f64,
    pub space_held: f64,
}

impl SectionSpec {
    pub fn new(name: impl Into<String>, limit: i32) -> Self {
        Self {
            name: name.into(),
            limit,
            time: None,
            room: None,
            parent: None,
            penalty: 0.0,
            cancelled: false,
            space_expected: 0.0,
            space_held: 0.0,
        }
    }

    pub fn unlimited(name: impl Into<String>) -> Self {
        Self::new(name, UNLIMITED)
    }

    pub fn with_time(mut self, time: TimeLocation) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.room = Some(room);
        self
    }

    pub fn with_parent(mut self, parent: SectionId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    pub fn with_space(mut self, expected: f64, held: f64) -> Self {
        self.space_expected = expected;
        self.space_held = held;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct StudentSpec {
    pub external_id: u64,
    pub name: String,
    pub min_credit: f32,
    pub max_credit: Option<f32>,
    pub priority: StudentPriority,
    pub unavailabilities: Vec<Unavailability>,
    pub linked_sections: Vec<LinkedSections>,
}

impl StudentSpec {
    pub fn new(external_id: u64) -> Self {
        Self {
            external_id,
            name: format!("student-{}", external_id),
            ..Default::default()
        }
    }

    pub fn with_credit(mut self, min: f32, max: Option<f32>) -> Self {
        self.min_credit = min;
        self.max_credit = max;
        self
    }

    pub fn with_priority(mut self, priority: StudentPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_unavailability(mut self, time: TimeLocation, allow_overlap: bool) -> Self {
        self.unavailabilities.push(Unavailability {
            time,
            allow_overlap,
        });
        self
    }

    pub fn with_linked_sections(mut self, link: LinkedSections) -> Self {
        self.linked_sections.push(link);
        self
    }
}

#[derive(Clone, Debug)]
pub struct CourseRequestSpec {
    pub courses: Vec<CourseId>,
    pub alternative: bool,
    pub waitlist: bool,
    pub weight: f64,
    pub request_priority: RequestPriority,
    pub selected: Vec<Choice>,
    pub required: Vec<Choice>,
    pub group: Option<GroupId>,
}

impl CourseRequestSpec {
    pub fn new(courses: impl IntoIterator<Item = CourseId>) -> Self {
        Self {
            courses: courses.into_iter().collect(),
            alternative: false,
            waitlist: false,
            weight: 1.0,
            request_priority: RequestPriority::Normal,
            selected: Vec::new(),
            required: Vec::new(),
            group: None,
        }
    }

    pub fn alternative(mut self) -> Self {
        self.alternative = true;
        self
    }

    pub fn waitlisted(mut self) -> Self {
        self.waitlist = true;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_priority(mut self, priority: RequestPriority) -> Self {
        self.request_priority = priority;
        self
    }

    pub fn with_selected(mut self, choice: Choice) -> Self {
        self.selected.push(choice);
        self
    }

    pub fn with_required(mut self, choice: Choice) -> Self {
        self.required.push(choice);
        self
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }
}

#[derive(Clone, Debug)]
pub struct ReservationSpec {
    pub name: String,
    pub kind: ReservationKind,
    pub limit: f64,
    pub priority: i32,
    pub configs: Vec<ConfigId>,
    pub sections: Vec<SectionId>,
    pub can_assign_over_limit: bool,
    pub must_be_used: bool,
    pub allow_overlap: bool,
    pub expired: bool,
}

impl ReservationSpec {
    pub fn new(name: impl Into<String>, kind: ReservationKind, limit: f64) -> Self {
        Self {
            name: name.into(),
            kind,
            limit,
            priority: 0,
            configs: Vec::new(),
            sections: Vec::new(),
            can_assign_over_limit: false,
            must_be_used: false,
            allow_overlap: false,
            expired: false,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn on_configs(mut self, configs: impl IntoIterator<Item = ConfigId>) -> Self {
        self.configs.extend(configs);
        self
    }

    pub fn on_sections(mut self, sections: impl IntoIterator<Item = SectionId>) -> Self {
        self.sections.extend(sections);
        self
    }

    pub fn over_limit(mut self) -> Self {
        self.can_assign_over_limit = true;
        self
    }

    pub fn must_be_used(mut self) -> Self {
        self.must_be_used = true;
        self
    }

    pub fn allowing_overlaps(mut self) -> Self {
        self.allow_overlap = true;
        self
    }

    pub fn expired(mut self) -> Self {
        self.expired = true;
        self
    }
}

#[inline]
fn dangling<T>(kind: &'static str, index: usize) -> Result<T, ModelError> {
    Err(ModelError::DanglingId { kind, index })
}

pub struct ModelBuilder {
    settings: ModelSettings,
    offerings: IndexVec<OfferingId, Offering>,
    courses: IndexVec<CourseId, Course>,
    configs: IndexVec<ConfigId, Config>,
    subparts: IndexVec<SubpartId, Subpart>,
    sections: IndexVec<SectionId, Section>,
    students: IndexVec<StudentId, Student>,
    requests: IndexVec<RequestId, Request>,
    reservations: IndexVec<ReservationId, Reservation>,
    groups: IndexVec<GroupId, RequestGroup>,
    weights: Box<dyn StudentWeights>,
    oracles: Vec<Box<dyn ConflictOracle>>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    /// An empty builder with default settings, priority based student weights
    /// and no conflict oracles.
    pub fn new() -> Self {
        Self {
            settings: ModelSettings::default(),
            offerings: IndexVec::new(),
            courses: IndexVec::new(),
            configs: IndexVec::new(),
            subparts: IndexVec::new(),
            sections: IndexVec::new(),
            students: IndexVec::new(),
            requests: IndexVec::new(),
            reservations: IndexVec::new(),
            groups: IndexVec::new(),
            weights: Box::new(PriorityStudentWeights::default()),
            oracles: Vec::new(),
        }
    }

    pub fn with_settings(&mut self, settings: ModelSettings) -> &mut Self {
        self.settings = settings;
        self
    }

    #[inline]
    pub fn settings(&self) -> ModelSettings {
        self.settings
    }

    pub fn with_student_weights(&mut self, weights: Box<dyn StudentWeights>) -> &mut Self {
        self.weights = weights;
        self
    }

    pub fn with_conflict_oracle(&mut self, oracle: Box<dyn ConflictOracle>) -> &mut Self {
        self.oracles.push(oracle);
        self
    }

    #[inline]
    pub fn num_students(&self) -> usize {
        self.students.len()
    }

    #[inline]
    pub fn num_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn add_offering(&mut self, name: impl Into<String>) -> OfferingId {
        let id = self.offerings.next_id();
        self.offerings.push(Offering {
            id,
            name: name.into(),
            configs: Vec::new(),
            courses: Vec::new(),
            reservations: Vec::new(),
        })
    }

    pub fn add_course(
        &mut self,
        offering: OfferingId,
        name: impl Into<String>,
        limit: i32,
        credit: f32,
    ) -> Result<CourseId, ModelError> {
        if !self.offerings.contains(offering) {
            return dangling("offering", offering.get());
        }
        let id = self.courses.push(Course {
            id: self.courses.next_id(),
            offering,
            name: name.into(),
            limit,
            credit,
        });
        self.offerings[offering].courses.push(id);
        Ok(id)
    }

    pub fn add_config(
        &mut self,
        offering: OfferingId,
        name: impl Into<String>,
        limit: i32,
    ) -> Result<ConfigId, ModelError> {
        if !self.offerings.contains(offering) {
            return dangling("offering", offering.get());
        }
        let id = self.configs.push(Config {
            id: self.configs.next_id(),
            offering,
            name: name.into(),
            limit,
            subparts: Vec::new(),
        });
        self.offerings[offering].configs.push(id);
        Ok(id)
    }

    pub fn add_subpart(
        &mut self,
        config: ConfigId,
        name: impl Into<String>,
        parent: Option<SubpartId>,
        allow_overlap: bool,
    ) -> Result<SubpartId, ModelError> {
        if !self.configs.contains(config) {
            return dangling("config", config.get());
        }
        let id = self.subparts.next_id();
        if let Some(parent) = parent {
            if !self.subparts.contains(parent) {
                return dangling("subpart", parent.get());
            }
            if self.subparts[parent].config != config {
                return Err(ModelError::SubpartParentMismatch {
                    child: id.get(),
                    parent: parent.get(),
                });
            }
        }
        self.subparts.push(Subpart {
            id,
            config,
            name: name.into(),
            parent,
            sections: Vec::new(),
            allow_overlap,
        });
        self.configs[config].subparts.push(id);
        Ok(id)
    }

    pub fn add_section(
        &mut self,
        subpart: SubpartId,
        spec: SectionSpec,
    ) -> Result<SectionId, ModelError> {
        if !self.subparts.contains(subpart) {
            return dangling("subpart", subpart.get());
        }
        let id = self.sections.next_id();
        if let Some(parent) = spec.parent {
            if !self.sections.contains(parent) {
                return dangling("section", parent.get());
            }
            if self.subparts[subpart].parent != Some(self.sections[parent].subpart) {
                return Err(ModelError::SectionParentMismatch {
                    section: id.get(),
                    parent: parent.get(),
                });
            }
        }
        self.sections.push(Section {
            id,
            subpart,
            name: spec.name,
            limit: spec.limit,
            time: spec.time,
            room: spec.room,
            parent: spec.parent,
            penalty: spec.penalty,
            cancelled: spec.cancelled,
            space_expected: spec.space_expected,
            space_held: spec.space_held,
        });
        self.subparts[subpart].sections.push(id);
        Ok(id)
    }

    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        course: CourseId,
    ) -> Result<GroupId, ModelError> {
        if !self.courses.contains(course) {
            return dangling("course", course.get());
        }
        let id = self.groups.next_id();
        Ok(self.groups.push(RequestGroup {
            id,
            name: name.into(),
            course,
            requests: Vec::new(),
        }))
    }

    pub fn add_student(&mut self, spec: StudentSpec) -> StudentId {
        let id = self.students.next_id();
        self.students.push(Student {
            id,
            external_id: spec.external_id,
            name: spec.name,
            requests: Vec::new(),
            min_credit: spec.min_credit,
            max_credit: spec.max_credit,
            priority: spec.priority,
            unavailabilities: spec.unavailabilities,
            linked_sections: spec.linked_sections,
            nr_requests: 0,
        })
    }

    pub fn add_course_request(
        &mut self,
        student: StudentId,
        spec: CourseRequestSpec,
    ) -> Result<RequestId, ModelError> {
        if !self.students.contains(student) {
            return dangling("student", student.get());
        }
        let id = self.requests.next_id();
        if spec.courses.is_empty() {
            return Err(ModelError::EmptyCourseRequest(id.get()));
        }
        if let Some(&course) = spec.courses.iter().find(|c| !self.courses.contains(**c)) {
            return dangling("course", course.get());
        }
        if let Some(group) = spec.group {
            if !self.groups.contains(group) {
                return dangling("group", group.get());
            }
            self.groups[group].requests.push(id);
        }
        self.push_request(
            student,
            spec.alternative,
            spec.weight,
            spec.request_priority,
            spec.group,
            RequestKind::Course(CourseRequest {
                courses: spec.courses,
                waitlist: spec.waitlist,
                selected: spec.selected,
                required: spec.required,
                fixed: None,
            }),
        )
    }

    pub fn add_free_time_request(
        &mut self,
        student: StudentId,
        time: TimeLocation,
        alternative: bool,
    ) -> Result<RequestId, ModelError> {
        if !self.students.contains(student) {
            return dangling("student", student.get());
        }
        self.push_request(
            student,
            alternative,
            1.0,
            RequestPriority::Normal,
            None,
            RequestKind::FreeTime(FreeTimeRequest { time }),
        )
    }

    fn push_request(
        &mut self,
        student: StudentId,
        alternative: bool,
        weight: f64,
        request_priority: RequestPriority,
        group: Option<GroupId>,
        kind: RequestKind,
    ) -> Result<RequestId, ModelError> {
        let id = self.requests.next_id();
        if weight < 0.0 {
            return Err(ModelError::NegativeWeight {
                request: id.get(),
                weight,
            });
        }
        let priority = self.students[student].requests.len();
        self.requests.push(Request {
            id,
            student,
            priority,
            alternative,
            weight,
            request_priority,
            initial: None,
            group,
            kind,
        });
        self.students[student].requests.push(id);
        Ok(id)
    }

    /// Builds the enrollment of `request` into `sections` of `course`. The
    /// config is taken from the sections.
    pub fn enrollment(
        &self,
        request: RequestId,
        course: CourseId,
        sections: &[SectionId],
    ) -> Result<Enrollment, ModelError> {
        let Some(req) = self.requests.get(request) else {
            return dangling("request", request.get());
        };
        let Some(course_request) = req.as_course() else {
            return Err(ModelError::CourseNotRequested {
                request: request.get(),
                course: course.get(),
            });
        };
        let Some(priority) = course_request.courses.iter().position(|&c| c == course) else {
            return Err(ModelError::CourseNotRequested {
                request: request.get(),
                course: course.get(),
            });
        };
        if let Some(&s) = sections.iter().find(|s| !self.sections.contains(**s)) {
            return dangling("section", s.get());
        }
        let Some(&first) = sections.first() else {
            return Err(ModelError::IncompleteEnrollment(request.get()));
        };
        let config = self.subparts[self.sections[first].subpart].config;
        let subparts = &self.configs[config].subparts;
        let complete = subparts.len() == sections.len()
            && subparts
                .iter()
                .all(|&sp| {
                    sections
                        .iter()
                        .filter(|&&s| self.sections[s].subpart == sp)
                        .count()
                        == 1
                });
        if !complete || self.configs[config].offering != self.courses[course].offering {
            return Err(ModelError::IncompleteEnrollment(request.get()));
        }
        Ok(Enrollment::course(
            request,
            priority,
            course,
            config,
            sections.iter().copied(),
        ))
    }

    /// Records the enrollment a request held before this solve (MPP).
    pub fn set_initial_assignment(
        &mut self,
        request: RequestId,
        course: CourseId,
        sections: &[SectionId],
    ) -> Result<&mut Self, ModelError> {
        let enrollment = self.enrollment(request, course, sections)?;
        self.requests[request].initial = Some(enrollment);
        Ok(self)
    }

    /// Pins a course request to one enrollment.
    pub fn set_fixed_assignment(
        &mut self,
        request: RequestId,
        course: CourseId,
        sections: &[SectionId],
    ) -> Result<&mut Self, ModelError> {
        let enrollment = self.enrollment(request, course, sections)?;
        if let RequestKind::Course(c) = &mut self.requests[request].kind {
            c.fixed = Some(enrollment);
        }
        Ok(self)
    }

    pub fn add_reservation(
        &mut self,
        offering: OfferingId,
        spec: ReservationSpec,
    ) -> Result<ReservationId, ModelError> {
        if !self.offerings.contains(offering) {
            return dangling("offering", offering.get());
        }
        let id = self.reservations.next_id();
        for &c in &spec.configs {
            if !self.configs.contains(c) || self.configs[c].offering != offering {
                return Err(ModelError::ReservationScope {
                    reservation: id.get(),
                    index: c.get(),
                });
            }
        }
        for &s in &spec.sections {
            if !self.sections.contains(s)
                || self.configs[self.subparts[self.sections[s].subpart].config].offering
                    != offering
            {
                return Err(ModelError::ReservationScope {
                    reservation: id.get(),
                    index: s.get(),
                });
            }
        }
        self.reservations.push(Reservation {
            id,
            offering,
            name: spec.name,
            kind: spec.kind,
            limit: spec.limit,
            priority: spec.priority,
            configs: spec.configs,
            sections: spec.sections,
            can_assign_over_limit: spec.can_assign_over_limit,
            must_be_used: spec.must_be_used,
            allow_overlap: spec.allow_overlap,
            expired: spec.expired,
        });
        self.offerings[offering].reservations.push(id);
        Ok(id)
    }

    pub fn build(mut self) -> Result<Model, ModelError> {
        if let Some(config) = self.configs.iter().find(|c| c.subparts.is_empty()) {
            return Err(ModelError::EmptyConfig(config.id.get()));
        }

        // Alternatives go last, the rest keeps its insertion order.
        for student in self.students.iter_mut() {
            let requests = &self.requests;
            student
                .requests
                .sort_by_key(|&r| requests[r].alternative);
            student.nr_requests = student
                .requests
                .iter()
                .filter(|&&r| !requests[r].alternative)
                .count();
            for (position, &r) in student.requests.iter().enumerate() {
                self.requests[r].priority = position;
            }
        }

        let nr_requests = self.requests.len();
        let mut model = Model {
            settings: self.settings,
            offerings: self.offerings,
            courses: self.courses,
            configs: self.configs,
            subparts: self.subparts,
            sections: self.sections,
            students: self.students,
            requests: self.requests,
            reservations: self.reservations,
            groups: self.groups,
            weights: self.weights,
            oracles: self.oracles,
            request_bounds: IndexVec::from_elem(0.0, nr_requests),
        };

        let bounds: IndexVec<RequestId, f64> = model
            .requests
            .iter()
            .map(|r| -r.weight * model.weights.bound(&model, r.id))
            .collect();
        model.request_bounds = bounds;

        tracing::debug!(
            offerings = model.offerings.len(),
            sections = model.sections.len(),
            students = model.students.len(),
            requests = model.requests.len(),
            "built sectioning model"
        );
        Ok(model)
    }
}

impl std::fmt::Debug for ModelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBuilder")
            .field("offerings", &self.offerings.len())
            .field("sections", &self.sections.len())
            .field("students", &self.students.len())
            .field("requests", &self.requests.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sectioning_core::time::DayCode;

    fn one_section_offering(builder: &mut ModelBuilder) -> (CourseId, SectionId) {
        let offering = builder.add_offering("MATH 101");
        let course = builder.add_course(offering, "MATH 101", UNLIMITED, 3.0).unwrap();
        let config = builder.add_config(offering, "Lec", UNLIMITED).unwrap();
        let subpart = builder.add_subpart(config, "Lec", None, false).unwrap();
        let section = builder
            .add_section(
                subpart,
                SectionSpec::new("1", 10).with_time(TimeLocation::new(DayCode::MON, 96, 12)),
            )
            .unwrap();
        (course, section)
    }

    #[test]
    fn test_build_orders_alternatives_last() {
        let mut b = ModelBuilder::new();
        let (course, _) = one_section_offering(&mut b);
        let s = b.add_student(StudentSpec::new(1));
        let alt = b
            .add_course_request(s, CourseRequestSpec::new([course]).alternative())
            .unwrap();
        let first = b.add_course_request(s, CourseRequestSpec::new([course])).unwrap();
        let model = b.build().unwrap();

        assert_eq!(model.student(s).requests(), &[first, alt]);
        assert_eq!(model.request(first).priority(), 0);
        assert_eq!(model.request(alt).priority(), 1);
        assert_eq!(model.student(s).nr_requests(), 1);
    }

    #[test]
    fn test_dangling_ids_are_rejected() {
        let mut b = ModelBuilder::new();
        assert!(matches!(
            b.add_course(OfferingId::new(3), "X", 1, 0.0),
            Err(ModelError::DanglingId { kind: "offering", index: 3 })
        ));
        let s = b.add_student(StudentSpec::new(1));
        assert!(matches!(
            b.add_course_request(s, CourseRequestSpec::new([])),
            Err(ModelError::EmptyCourseRequest(0))
        ));
    }

    #[test]
    fn test_empty_config_fails_build() {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("EMPTY");
        b.add_config(offering, "none", UNLIMITED).unwrap();
        assert!(matches!(b.build(), Err(ModelError::EmptyConfig(0))));
    }

    #[test]
    fn test_section_parent_must_be_in_parent_subpart() {
        let mut b = ModelBuilder::new();
        let offering = b.add_offering("CHEM 110");
        let config = b.add_config(offering, "Lec+Lab", UNLIMITED).unwrap();
        let lec = b.add_subpart(config, "Lec", None, false).unwrap();
        let lab = b.add_subpart(config, "Lab", Some(lec), false).unwrap();
        let lec1 = b.add_section(lec, SectionSpec::unlimited("1")).unwrap();
        let lab1 = b
            .add_section(lab, SectionSpec::unlimited("1A").with_parent(lec1))
            .unwrap();
        assert!(matches!(
            b.add_section(lec, SectionSpec::unlimited("2").with_parent(lab1)),
            Err(ModelError::SectionParentMismatch { .. })
        ));
    }

    #[test]
    fn test_initial_assignment_resolves_priority_and_config() {
        let mut b = ModelBuilder::new();
        let (first, _) = one_section_offering(&mut b);
        let (second, section) = one_section_offering(&mut b);
        let s = b.add_student(StudentSpec::new(1));
        let r = b
            .add_course_request(s, CourseRequestSpec::new([first, second]))
            .unwrap();
        b.set_initial_assignment(r, second, &[section]).unwrap();
        let model = b.build().unwrap();

        let initial = model.request(r).initial().unwrap();
        assert_eq!(initial.priority(), 1);
        assert_eq!(initial.course_id(), Some(second));
        assert_eq!(initial.sections(), &[section]);
    }

    #[test]
    fn test_request_bound_is_negative_weight() {
        let mut b = ModelBuilder::new();
        let (course, _) = one_section_offering(&mut b);
        let s = b.add_student(StudentSpec::new(1));
        let r = b
            .add_course_request(s, CourseRequestSpec::new([course]).with_weight(2.0))
            .unwrap();
        let model = b.build().unwrap();
        assert!(model.request_bound(r) < 0.0);
    }
}
