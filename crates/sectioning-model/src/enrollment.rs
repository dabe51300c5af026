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

use crate::{
    index::{ConfigId, CourseId, OfferingId, RequestId, ReservationId, SectionId},
    model::Model,
};
use sectioning_core::time::TimeLocation;
use smallvec::SmallVec;

/// A value of a request: either a complete choice of sections (one per
/// subpart of `config`) of one of the requested courses, or the free time of a
/// free-time request.
///
/// Equality, hashing and ordering ignore the attached reservation: the same
/// sections are the same enrollment regardless of which reservation pays for
/// them.
#[derive(Clone, Debug)]
pub struct Enrollment {
    request: RequestId,
    priority: usize,
    course: Option<CourseId>,
    config: Option<ConfigId>,
    sections: SmallVec<[SectionId; 4]>,
    reservation: Option<ReservationId>,
}

impl Enrollment {
    /// Creates a course enrollment. `priority` is the index of `course` in the
    /// request's course list. Sections are kept sorted.
    pub fn course(
        request: RequestId,
        priority: usize,
        course: CourseId,
        config: ConfigId,
        sections: impl IntoIterator<Item = SectionId>,
    ) -> Self {
        let mut sections: SmallVec<[SectionId; 4]> = sections.into_iter().collect();
        sections.sort_unstable();
        Self {
            request,
            priority,
            course: Some(course),
            config: Some(config),
            sections,
            reservation: None,
        }
    }

    /// The only value of a free-time request.
    pub fn free_time(request: RequestId) -> Self {
        Self {
            request,
            priority: 0,
            course: None,
            config: None,
            sections: SmallVec::new(),
            reservation: None,
        }
    }

    #[inline]
    pub fn with_reservation(mut self, reservation: Option<ReservationId>) -> Self {
        self.reservation = reservation;
        self
    }

    #[inline]
    pub fn request(&self) -> RequestId {
        self.request
    }

    #[inline]
    pub fn priority(&self) -> usize {
        self.priority
    }

    #[inline]
    pub fn course_id(&self) -> Option<CourseId> {
        self.course
    }

    #[inline]
    pub fn config(&self) -> Option<ConfigId> {
        self.config
    }

    #[inline]
    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    #[inline]
    pub fn reservation(&self) -> Option<ReservationId> {
        self.reservation
    }

    #[inline]
    pub fn is_course(&self) -> bool {
        self.course.is_some()
    }

    #[inline]
    pub fn is_free_time(&self) -> bool {
        self.course.is_none()
    }

    #[inline]
    pub fn offering(&self, model: &Model) -> Option<OfferingId> {
        self.course.map(|c| model.course(c).offering())
    }

    /// Meeting times: of every timed section, or the free time itself.
    pub fn times<'m>(&self, model: &'m Model) -> SmallVec<[&'m TimeLocation; 4]> {
        match self.course {
            Some(_) => self
                .sections
                .iter()
                .filter_map(|&s| model.section(s).time())
                .collect(),
            None => model
                .request(self.request)
                .as_free_time()
                .map(|f| f.time())
                .into_iter()
                .collect(),
        }
    }

    #[inline]
    pub fn credit(&self, model: &Model) -> f32 {
        self.course.map_or(0.0, |c| model.course(c).credit())
    }

    /// Average static penalty of the sections, zero for free time.
    pub fn penalty(&self, model: &Model) -> f64 {
        if self.sections.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.sections.iter().map(|&s| model.section(s).penalty()).sum();
        sum / self.sections.len() as f64
    }

    pub fn weekly_minutes(&self, model: &Model) -> u32 {
        self.times(model).iter().map(|t| t.weekly_minutes()).sum()
    }

    /// Whether any section of `self` may overlap: its subpart allows it or
    /// its reservation does.
    fn allows_overlap(&self, model: &Model, section: SectionId) -> bool {
        model.subpart(model.section(section).subpart()).allow_overlap()
            || self
                .reservation
                .is_some_and(|r| model.reservation(r).allow_overlap())
    }

    /// Hard time overlap between two course enrollments. Free time never
    /// overlaps hard; its overlaps are soft conflicts.
    pub fn is_overlapping(&self, model: &Model, other: &Enrollment) -> bool {
        if self.is_free_time() || other.is_free_time() {
            return false;
        }
        self.sections.iter().any(|&a| {
            other.sections.iter().any(|&b| {
                model.section(a).is_overlapping(model.section(b))
                    && !self.allows_overlap(model, a)
                    && !other.allows_overlap(model, b)
            })
        })
    }

    /// Sections of `self` and `other` that overlap although overlapping is
    /// allowed, with the shared weekly minutes.
    pub fn soft_overlaps(
        &self,
        model: &Model,
        other: &Enrollment,
    ) -> SmallVec<[(Option<SectionId>, u32); 2]> {
        let mut out = SmallVec::new();
        if self.is_free_time() && other.is_free_time() {
            return out;
        }
        if self.is_free_time() || other.is_free_time() {
            let (free, course) = if self.is_free_time() {
                (self, other)
            } else {
                (other, self)
            };
            let Some(free_time) = model.request(free.request).as_free_time() else {
                return out;
            };
            for &s in &course.sections {
                if let Some(t) = model.section(s).time() {
                    let minutes = t.shared_minutes(free_time.time());
                    if minutes > 0 {
                        out.push((Some(s), minutes));
                    }
                }
            }
            return out;
        }
        for &a in &self.sections {
            for &b in &other.sections {
                let (Some(ta), Some(tb)) = (model.section(a).time(), model.section(b).time())
                else {
                    continue;
                };
                let minutes = ta.shared_minutes(tb);
                if minutes > 0 && (self.allows_overlap(model, a) || other.allows_overlap(model, b))
                {
                    out.push((Some(a), minutes));
                }
            }
        }
        out
    }
}

impl PartialEq for Enrollment {
    fn eq(&self, other: &Self) -> bool {
        self.request == other.request
            && self.course == other.course
            && self.config == other.config
            && self.sections == other.sections
    }
}

impl Eq for Enrollment {}

impl std::hash::Hash for Enrollment {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.request.hash(state);
        self.course.hash(state);
        self.config.hash(state);
        self.sections.hash(state);
    }
}

impl PartialOrd for Enrollment {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Assignment independent total order: course alternative first, then config,
/// then sections lexicographically.
impl Ord for Enrollment {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.request
            .cmp(&other.request)
            .then(self.priority.cmp(&other.priority))
            .then(self.course.cmp(&other.course))
            .then(self.config.cmp(&other.config))
            .then_with(|| self.sections.as_slice().cmp(other.sections.as_slice()))
    }
}

impl std::fmt::Display for Enrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.course {
            None => write!(f, "{}: free time", self.request),
            Some(course) => {
                write!(f, "{}: {} [", self.request, course)?;
                for (i, s) in self.sections.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", s)?;
                }
                f.write_str("]")
            }
        }
    }
}
