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

//! The immutable sectioning model.
//!
//! A `Model` is built once through [`ModelBuilder`](crate::builder::ModelBuilder)
//! and then only read. Everything that changes while solving lives in an
//! [`Assignment`](crate::assignment::Assignment), so one model can back many
//! assignments (forks, parallel searches) at once.

use crate::{
    index::{
        ConfigId, CourseId, GroupId, OfferingId, RequestId, ReservationId, SectionId, StudentId,
        SubpartId,
    },
    offering::{Config, Course, Offering, Section, Subpart},
    quality::ConflictOracle,
    request::Request,
    reservation::Reservation,
    student::Student,
    weights::StudentWeights,
};
use sectioning_core::index::IndexVec;

/// Switches of the model that change what counts as a valid schedule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModelSettings {
    /// Minimal perturbation mode: initial enrollments are preferred.
    pub mpp: bool,
    /// In MPP, requests holding an initial enrollment may not lose it.
    pub keep_initial_assignments: bool,
}

/// Requests of several students asking to be placed together.
#[derive(Clone, Debug)]
pub struct RequestGroup {
    pub(crate) id: GroupId,
    pub(crate) name: String,
    pub(crate) course: CourseId,
    pub(crate) requests: Vec<RequestId>,
}

impl RequestGroup {
    #[inline]
    pub fn id(&self) -> GroupId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn course(&self) -> CourseId {
        self.course
    }

    #[inline]
    pub fn requests(&self) -> &[RequestId] {
        &self.requests
    }
}

pub struct Model {
    pub(crate) settings: ModelSettings,
    pub(crate) offerings: IndexVec<OfferingId, Offering>,
    pub(crate) courses: IndexVec<CourseId, Course>,
    pub(crate) configs: IndexVec<ConfigId, Config>,
    pub(crate) subparts: IndexVec<SubpartId, Subpart>,
    pub(crate) sections: IndexVec<SectionId, Section>,
    pub(crate) students: IndexVec<StudentId, Student>,
    pub(crate) requests: IndexVec<RequestId, Request>,
    pub(crate) reservations: IndexVec<ReservationId, Reservation>,
    pub(crate) groups: IndexVec<GroupId, RequestGroup>,
    pub(crate) weights: Box<dyn StudentWeights>,
    pub(crate) oracles: Vec<Box<dyn ConflictOracle>>,
    pub(crate) request_bounds: IndexVec<RequestId, f64>,
}

impl Model {
    #[inline]
    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    #[inline]
    pub fn is_mpp(&self) -> bool {
        self.settings.mpp
    }

    #[inline]
    pub fn offering(&self, id: OfferingId) -> &Offering {
        &self.offerings[id]
    }

    #[inline]
    pub fn course(&self, id: CourseId) -> &Course {
        &self.courses[id]
    }

    #[inline]
    pub fn config(&self, id: ConfigId) -> &Config {
        &self.configs[id]
    }

    #[inline]
    pub fn subpart(&self, id: SubpartId) -> &Subpart {
        &self.subparts[id]
    }

    #[inline]
    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id]
    }

    #[inline]
    pub fn student(&self, id: StudentId) -> &Student {
        &self.students[id]
    }

    #[inline]
    pub fn request(&self, id: RequestId) -> &Request {
        &self.requests[id]
    }

    #[inline]
    pub fn reservation(&self, id: ReservationId) -> &Reservation {
        &self.reservations[id]
    }

    #[inline]
    pub fn group(&self, id: GroupId) -> &RequestGroup {
        &self.groups[id]
    }

    #[inline]
    pub fn offerings(&self) -> &IndexVec<OfferingId, Offering> {
        &self.offerings
    }

    #[inline]
    pub fn courses(&self) -> &IndexVec<CourseId, Course> {
        &self.courses
    }

    #[inline]
    pub fn configs(&self) -> &IndexVec<ConfigId, Config> {
        &self.configs
    }

    #[inline]
    pub fn sections(&self) -> &IndexVec<SectionId, Section> {
        &self.sections
    }

    #[inline]
    pub fn students(&self) -> &IndexVec<StudentId, Student> {
        &self.students
    }

    #[inline]
    pub fn requests(&self) -> &IndexVec<RequestId, Request> {
        &self.requests
    }

    #[inline]
    pub fn reservations(&self) -> &IndexVec<ReservationId, Reservation> {
        &self.reservations
    }

    #[inline]
    pub fn groups(&self) -> &IndexVec<GroupId, RequestGroup> {
        &self.groups
    }

    #[inline]
    pub fn weights(&self) -> &dyn StudentWeights {
        self.weights.as_ref()
    }

    #[inline]
    pub fn oracles(&self) -> &[Box<dyn ConflictOracle>] {
        &self.oracles
    }

    /// Admissible lower bound on the cost of assigning the request:
    /// `-(request weight × best possible enrollment weight)`.
    #[inline]
    pub fn request_bound(&self, request: RequestId) -> f64 {
        self.request_bounds[request]
    }

    #[inline]
    pub fn section_config(&self, section: SectionId) -> ConfigId {
        self.subparts[self.sections[section].subpart].config
    }

    #[inline]
    pub fn section_offering(&self, section: SectionId) -> OfferingId {
        self.configs[self.section_config(section)].offering
    }

    #[inline]
    pub fn nr_requests(&self) -> usize {
        self.requests.len()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("settings", &self.settings)
            .field("offerings", &self.offerings.len())
            .field("sections", &self.sections.len())
            .field("students", &self.students.len())
            .field("requests", &self.requests.len())
            .field("reservations", &self.reservations.len())
            .field("weights", &self.weights.name())
            .field("oracles", &self.oracles.len())
            .finish()
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Model({} offerings, {} sections, {} students, {} requests)",
            self.offerings.len(),
            self.sections.len(),
            self.students.len(),
            self.requests.len()
        )
    }
}
