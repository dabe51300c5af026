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

//! The course catalogue side of the arena: offerings, their configurations,
//! subparts and sections, and the (possibly cross-listed) courses students
//! actually request.
//!
//! Every entity is plain data owned by the `Model`. Parent links are ids,
//! owning links are `Vec`s of ids, so walking the hierarchy in either
//! direction is an index lookup.

use crate::index::{ConfigId, CourseId, OfferingId, ReservationId, SectionId, SubpartId};
use sectioning_core::time::TimeLocation;

/// Marks an entity without a capacity limit.
pub const UNLIMITED: i32 = -1;

/// A room with planar coordinates in meters, used for distance conflicts.
#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl Room {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }

    /// Euclidean distance to another room in meters.
    #[inline]
    pub fn distance(&self, other: &Room) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Clone, Debug)]
pub struct Offering {
    pub(crate) id: OfferingId,
    pub(crate) name: String,
    pub(crate) configs: Vec<ConfigId>,
    pub(crate) courses: Vec<CourseId>,
    pub(crate) reservations: Vec<ReservationId>,
}

impl Offering {
    #[inline]
    pub fn id(&self) -> OfferingId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn configs(&self) -> &[ConfigId] {
        &self.configs
    }

    #[inline]
    pub fn courses(&self) -> &[CourseId] {
        &self.courses
    }

    #[inline]
    pub fn reservations(&self) -> &[ReservationId] {
        &self.reservations
    }
}

#[derive(Clone, Debug)]
pub struct Course {
    pub(crate) id: CourseId,
    pub(crate) offering: OfferingId,
    pub(crate) name: String,
    pub(crate) limit: i32,
    pub(crate) credit: f32,
}

impl Course {
    #[inline]
    pub fn id(&self) -> CourseId {
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

    /// Course limit, [`UNLIMITED`] when there is none.
    #[inline]
    pub fn limit(&self) -> i32 {
        self.limit
    }

    #[inline]
    pub fn credit(&self) -> f32 {
        self.credit
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub(crate) id: ConfigId,
    pub(crate) offering: OfferingId,
    pub(crate) name: String,
    pub(crate) limit: i32,
    pub(crate) subparts: Vec<SubpartId>,
}

impl Config {
    #[inline]
    pub fn id(&self) -> ConfigId {
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
    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Subparts in topological order: a parent always precedes its children.
    #[inline]
    pub fn subparts(&self) -> &[SubpartId] {
        &self.subparts
    }
}

#[derive(Clone, Debug)]
pub struct Subpart {
    pub(crate) id: SubpartId,
    pub(crate) config: ConfigId,
    pub(crate) name: String,
    pub(crate) parent: Option<SubpartId>,
    pub(crate) sections: Vec<SectionId>,
    pub(crate) allow_overlap: bool,
}

impl Subpart {
    #[inline]
    pub fn id(&self) -> SubpartId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> ConfigId {
        self.config
    }

    /// Instructional type, e.g. `Lec` or `Lab`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn parent(&self) -> Option<SubpartId> {
        self.parent
    }

    #[inline]
    pub fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    /// Sections of this subpart may overlap with other classes of the student.
    #[inline]
    pub fn allow_overlap(&self) -> bool {
        self.allow_overlap
    }
}

#[derive(Clone, Debug)]
pub struct Section {
    pub(crate) id: SectionId,
    pub(crate) subpart: SubpartId,
    pub(crate) name: String,
    pub(crate) limit: i32,
    pub(crate) time: Option<TimeLocation>,
    pub(crate) room: Option<Room>,
    pub(crate) parent: Option<SectionId>,
    pub(crate) penalty: f64,
    pub(crate) cancelled: bool,
    pub(crate) space_expected: f64,
    pub(crate) space_held: f64,
}

impl Section {
    #[inline]
    pub fn id(&self) -> SectionId {
        self.id
    }

    #[inline]
    pub fn subpart(&self) -> SubpartId {
        self.subpart
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Section limit, [`UNLIMITED`] when there is none.
    #[inline]
    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Meeting time; arranged-hours sections have none.
    #[inline]
    pub fn time(&self) -> Option<&TimeLocation> {
        self.time.as_ref()
    }

    #[inline]
    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    #[inline]
    pub fn parent(&self) -> Option<SectionId> {
        self.parent
    }

    /// Static preference penalty of the section (lower is better).
    #[inline]
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Demand projected for students not yet sectioned.
    #[inline]
    pub fn space_expected(&self) -> f64 {
        self.space_expected
    }

    /// Space held back for students not yet sectioned.
    #[inline]
    pub fn space_held(&self) -> f64 {
        self.space_held
    }

    #[inline]
    pub fn is_overlapping(&self, other: &Section) -> bool {
        match (&self.time, &other.time) {
            (Some(a), Some(b)) => a.overlaps(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_distance() {
        let a = Room::new("A", 0.0, 0.0);
        let b = Room::new("B", 300.0, 400.0);
        assert_eq!(a.distance(&b), 500.0);
        assert_eq!(b.distance(&a), 500.0);
    }
}
