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

use crate::index::{OfferingId, RequestId, SectionId, StudentId};
use sectioning_core::time::TimeLocation;

/// Priority of the student as a whole. Declaration order is importance order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StudentPriority {
    Priority,
    Senior,
    #[default]
    Normal,
    /// Placeholder students for projected demand; the first to give way.
    Dummy,
}

impl StudentPriority {
    /// Whether `self` is strictly more important than `other`.
    #[inline]
    pub fn is_higher_than(self, other: StudentPriority) -> bool {
        self < other
    }
}

/// A block of time the student is not available for classes.
#[derive(Clone, Debug)]
pub struct Unavailability {
    pub time: TimeLocation,
    /// Overlapping classes are tolerated but counted as soft overlaps.
    pub allow_overlap: bool,
}

/// Sections across offerings that must be taken together: a student attending
/// the linked section of one offering must attend the linked sections of every
/// other offering of the group they are enrolled in.
#[derive(Clone, Debug, Default)]
pub struct LinkedSections {
    pub(crate) sections: Vec<(OfferingId, SectionId)>,
}

impl LinkedSections {
    pub fn new(sections: impl IntoIterator<Item = (OfferingId, SectionId)>) -> Self {
        Self {
            sections: sections.into_iter().collect(),
        }
    }

    #[inline]
    pub fn sections(&self) -> &[(OfferingId, SectionId)] {
        &self.sections
    }

    #[inline]
    pub fn involves(&self, offering: OfferingId) -> bool {
        self.sections.iter().any(|(o, _)| *o == offering)
    }

    /// Whether `sections` (all of one offering) contain every linked section
    /// of that offering.
    pub fn is_linked(&self, offering: OfferingId, sections: &[SectionId]) -> bool {
        self.sections
            .iter()
            .filter(|(o, _)| *o == offering)
            .all(|(_, s)| sections.contains(s))
    }
}

#[derive(Clone, Debug)]
pub struct Student {
    pub(crate) id: StudentId,
    pub(crate) external_id: u64,
    pub(crate) name: String,
    pub(crate) requests: Vec<RequestId>,
    pub(crate) min_credit: f32,
    pub(crate) max_credit: Option<f32>,
    pub(crate) priority: StudentPriority,
    pub(crate) unavailabilities: Vec<Unavailability>,
    pub(crate) linked_sections: Vec<LinkedSections>,
    pub(crate) nr_requests: usize,
}

impl Student {
    #[inline]
    pub fn id(&self) -> StudentId {
        self.id
    }

    #[inline]
    pub fn external_id(&self) -> u64 {
        self.external_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requests in priority order; alternative requests come last.
    #[inline]
    pub fn requests(&self) -> &[RequestId] {
        &self.requests
    }

    #[inline]
    pub fn min_credit(&self) -> f32 {
        self.min_credit
    }

    #[inline]
    pub fn max_credit(&self) -> Option<f32> {
        self.max_credit
    }

    #[inline]
    pub fn priority(&self) -> StudentPriority {
        self.priority
    }

    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.priority == StudentPriority::Dummy
    }

    #[inline]
    pub fn unavailabilities(&self) -> &[Unavailability] {
        &self.unavailabilities
    }

    #[inline]
    pub fn linked_sections(&self) -> &[LinkedSections] {
        &self.linked_sections
    }

    /// Number of non-alternative requests; the most requests the student can
    /// ever have assigned at once.
    #[inline]
    pub fn nr_requests(&self) -> usize {
        self.nr_requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_priority_order() {
        assert!(StudentPriority::Priority.is_higher_than(StudentPriority::Normal));
        assert!(StudentPriority::Normal.is_higher_than(StudentPriority::Dummy));
        assert!(!StudentPriority::Normal.is_higher_than(StudentPriority::Normal));
    }

    #[test]
    fn test_linked_sections() {
        let o1 = OfferingId::new(0);
        let o2 = OfferingId::new(1);
        let link = LinkedSections::new([(o1, SectionId::new(3)), (o2, SectionId::new(7))]);

        assert!(link.involves(o1));
        assert!(!link.involves(OfferingId::new(2)));
        assert!(link.is_linked(o1, &[SectionId::new(2), SectionId::new(3)]));
        assert!(!link.is_linked(o2, &[SectionId::new(6)]));
    }
}
