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

//! # Conflict Oracles
//!
//! Pure query objects that tell the search how bad a schedule is beyond plain
//! feasibility. Hard problems (full sections, hard time overlaps) never reach
//! an oracle; the oracles only report soft conflicts:
//!
//! - [`DistanceConflicts`]: back-to-back classes whose rooms are too far
//!   apart to walk in the break between them.
//! - [`TimeOverlapConflicts`]: overlaps that are allowed but undesirable:
//!   classes over free time, classes of subparts that allow overlaps,
//!   classes over soft unavailabilities.
//! - [`StudentQuality`]: both of the above behind one oracle, each kind
//!   scaled by its own weight.
//!
//! Oracles report conflicts of one enrollment on its own (`conflicts`) and of
//! a pair of enrollments (`conflicts_between`). The search attributes a pair
//! conflict to the later request only, so that the cost of a partial schedule
//! is the sum of the costs of its slots.

use crate::{
    enrollment::Enrollment,
    index::{RequestId, SectionId},
    model::Model,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictKind {
    Distance,
    Overlap,
    FreeTime,
    Unavailability,
}

/// One soft conflict. `other` is `None` when the conflict is internal to the
/// enrollment of `request` or is with the student's unavailability.
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub request: RequestId,
    pub other: Option<RequestId>,
    pub section: Option<SectionId>,
    /// Shared weekly minutes of an overlap, zero for distance conflicts.
    pub minutes: u32,
    /// Severity multiplier set by the reporting oracle.
    pub penalty: f64,
}

pub trait ConflictOracle: Send + Sync {
    fn name(&self) -> &str;

    /// Conflicts within a single enrollment.
    fn conflicts(&self, model: &Model, enrollment: &Enrollment, out: &mut Vec<Conflict>);

    /// Conflicts between two enrollments of the same student.
    fn conflicts_between(
        &self,
        model: &Model,
        a: &Enrollment,
        b: &Enrollment,
        out: &mut Vec<Conflict>,
    );
}

/// Back-to-back classes whose rooms are further apart than the student can
/// walk during the break.
#[derive(Clone, Debug)]
pub struct DistanceConflicts {
    /// Walking speed in meters per minute.
    speed: f64,
    /// Breaks of at least this many minutes are always long enough.
    allowed_break: u32,
}

impl Default for DistanceConflicts {
    fn default() -> Self {
        Self::new(67.0, 30)
    }
}

impl DistanceConflicts {
    pub fn new(speed: f64, allowed_break: u32) -> Self {
        debug_assert!(speed > 0.0, "walking speed must be positive");
        Self {
            speed,
            allowed_break,
        }
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub fn allowed_break(&self) -> u32 {
        self.allowed_break
    }

    fn in_conflict(&self, model: &Model, a: SectionId, b: SectionId) -> bool {
        let (sa, sb) = (model.section(a), model.section(b));
        let (Some(ta), Some(tb)) = (sa.time(), sb.time()) else {
            return false;
        };
        let (Some(ra), Some(rb)) = (sa.room(), sb.room()) else {
            return false;
        };
        match ta.break_minutes(tb) {
            Some(gap) if gap < self.allowed_break => {
                let travel = (ra.distance(rb) / self.speed).ceil();
                travel > gap as f64
            }
            _ => false,
        }
    }

    fn push(
        &self,
        request: RequestId,
        other: Option<RequestId>,
        s: SectionId,
        out: &mut Vec<Conflict>,
    ) {
        out.push(Conflict {
            kind: ConflictKind::Distance,
            request,
            other,
            section: Some(s),
            minutes: 0,
            penalty: 1.0,
        });
    }
}

impl ConflictOracle for DistanceConflicts {
    fn name(&self) -> &str {
        "DistanceConflicts"
    }

    fn conflicts(&self, model: &Model, enrollment: &Enrollment, out: &mut Vec<Conflict>) {
        let sections = enrollment.sections();
        for (i, &a) in sections.iter().enumerate() {
            for &b in &sections[i + 1..] {
                if self.in_conflict(model, a, b) {
                    self.push(enrollment.request(), None, b, out);
                }
            }
        }
    }

    fn conflicts_between(
        &self,
        model: &Model,
        a: &Enrollment,
        b: &Enrollment,
        out: &mut Vec<Conflict>,
    ) {
        for &sa in a.sections() {
            for &sb in b.sections() {
                if self.in_conflict(model, sa, sb) {
                    self.push(a.request(), Some(b.request()), sa, out);
                }
            }
        }
    }
}

/// Overlaps the student tolerates but would rather not have.
#[derive(Clone, Debug, Default)]
pub struct TimeOverlapConflicts;

impl TimeOverlapConflicts {
    pub fn new() -> Self {
        Self
    }
}

impl ConflictOracle for TimeOverlapConflicts {
    fn name(&self) -> &str {
        "TimeOverlapConflicts"
    }

    fn conflicts(&self, model: &Model, enrollment: &Enrollment, out: &mut Vec<Conflict>) {
        if enrollment.is_free_time() {
            return;
        }
        let request = enrollment.request();
        let sections = enrollment.sections();
        for (i, &a) in sections.iter().enumerate() {
            for &b in &sections[i + 1..] {
                let (Some(ta), Some(tb)) = (model.section(a).time(), model.section(b).time())
                else {
                    continue;
                };
                let minutes = ta.shared_minutes(tb);
                if minutes > 0 {
                    out.push(Conflict {
                        kind: ConflictKind::Overlap,
                        request,
                        other: None,
                        section: Some(b),
                        minutes,
                        penalty: 1.0,
                    });
                }
            }
        }
        let student = model.student(model.request(request).student());
        for unavailability in student.unavailabilities().iter().filter(|u| u.allow_overlap) {
            for &s in sections {
                let Some(t) = model.section(s).time() else {
                    continue;
                };
                let minutes = t.shared_minutes(&unavailability.time);
                if minutes > 0 {
                    out.push(Conflict {
                        kind: ConflictKind::Unavailability,
                        request,
                        other: None,
                        section: Some(s),
                        minutes,
                        penalty: 1.0,
                    });
                }
            }
        }
    }

    fn conflicts_between(
        &self,
        model: &Model,
        a: &Enrollment,
        b: &Enrollment,
        out: &mut Vec<Conflict>,
    ) {
        let kind = if a.is_free_time() || b.is_free_time() {
            ConflictKind::FreeTime
        } else {
            ConflictKind::Overlap
        };
        for (section, minutes) in a.soft_overlaps(model, b) {
            out.push(Conflict {
                kind,
                request: a.request(),
                other: Some(b.request()),
                section,
                minutes,
                penalty: 1.0,
            });
        }
    }
}

/// Distance and overlap conflicts combined, each kind scaled by a weight.
#[derive(Clone, Debug)]
pub struct StudentQuality {
    distance: DistanceConflicts,
    overlaps: TimeOverlapConflicts,
    kind_weights: FxHashMap<ConflictKind, f64>,
}

impl StudentQuality {
    pub fn new(distance: DistanceConflicts) -> Self {
        Self {
            distance,
            overlaps: TimeOverlapConflicts,
            kind_weights: FxHashMap::default(),
        }
    }

    /// Scales every conflict of `kind`. Unlisted kinds weigh 1.
    pub fn with_weight(mut self, kind: ConflictKind, weight: f64) -> Self {
        self.kind_weights.insert(kind, weight);
        self
    }

    fn scale(&self, from: usize, out: &mut [Conflict]) {
        for conflict in &mut out[from..] {
            if let Some(w) = self.kind_weights.get(&conflict.kind) {
                conflict.penalty *= w;
            }
        }
    }
}

impl ConflictOracle for StudentQuality {
    fn name(&self) -> &str {
        "StudentQuality"
    }

    fn conflicts(&self, model: &Model, enrollment: &Enrollment, out: &mut Vec<Conflict>) {
        let from = out.len();
        self.distance.conflicts(model, enrollment, out);
        self.overlaps.conflicts(model, enrollment, out);
        self.scale(from, out);
    }

    fn conflicts_between(
        &self,
        model: &Model,
        a: &Enrollment,
        b: &Enrollment,
        out: &mut Vec<Conflict>,
    ) {
        let from = out.len();
        self.distance.conflicts_between(model, a, b, out);
        self.overlaps.conflicts_between(model, a, b, out);
        self.scale(from, out);
    }
}

/// Conflicts of the enrollment in slot `idx` of a student's schedule, with
/// pair conflicts attributed to the later slot only.
pub fn slot_conflicts(
    model: &Model,
    schedule: &[Option<Enrollment>],
    idx: usize,
) -> SmallVec<[Conflict; 4]> {
    let mut out = Vec::new();
    let Some(Some(enrollment)) = schedule.get(idx) else {
        return SmallVec::new();
    };
    for oracle in model.oracles() {
        oracle.conflicts(model, enrollment, &mut out);
        for earlier in schedule[..idx].iter().flatten() {
            oracle.conflicts_between(model, enrollment, earlier, &mut out);
        }
    }
    out.into_iter().collect()
}
