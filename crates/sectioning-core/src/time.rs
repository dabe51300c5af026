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

//! # Meeting Times
//!
//! `TimeLocation` describes when a class (or a free-time block, or a teaching
//! unavailability) meets: a set of week days, a start slot and a length in
//! five minute slots, and optionally the weeks of the term it meets in.
//!
//! Two time locations overlap when they share a day, their slot ranges
//! intersect, and they share at least one week. All other questions the
//! sectioning search asks about time (shared minutes for soft overlaps, the
//! break between back-to-back classes for distance conflicts) are derived from
//! the same three components.
//!
//! ## Usage
//!
//! ```rust
//! use sectioning_core::time::{TimeLocation, DayCode};
//!
//! // Monday and Wednesday, 8:00 for 50 minutes (slot 96 = 8:00).
//! let lecture = TimeLocation::new(DayCode::MON | DayCode::WED, 96, 10);
//! let lab = TimeLocation::new(DayCode::WED, 100, 12);
//! assert!(lecture.overlaps(&lab));
//! assert_eq!(lecture.shared_minutes(&lab), 30);
//! ```

use fixedbitset::FixedBitSet;

/// Minutes per slot.
pub const SLOT_LENGTH_MINUTES: u32 = 5;
/// Number of slots in a day.
pub const SLOTS_PER_DAY: u16 = 288;

/// Day-of-week bit flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct DayCode(u8);

impl DayCode {
    pub const MON: DayCode = DayCode(1 << 0);
    pub const TUE: DayCode = DayCode(1 << 1);
    pub const WED: DayCode = DayCode(1 << 2);
    pub const THU: DayCode = DayCode(1 << 3);
    pub const FRI: DayCode = DayCode(1 << 4);
    pub const SAT: DayCode = DayCode(1 << 5);
    pub const SUN: DayCode = DayCode(1 << 6);

    const NAMES: [&'static str; 7] = ["M", "T", "W", "R", "F", "S", "U"];

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        DayCode(bits & 0x7F)
    }

    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn intersection(&self, other: DayCode) -> DayCode {
        DayCode(self.0 & other.0)
    }
}

impl std::ops::BitOr for DayCode {
    type Output = DayCode;

    fn bitor(self, rhs: DayCode) -> DayCode {
        DayCode(self.0 | rhs.0)
    }
}

impl std::fmt::Display for DayCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (bit, name) in Self::NAMES.iter().enumerate() {
            if self.0 & (1 << bit) != 0 {
                f.write_str(name)?;
            }
        }
        Ok(())
    }
}

/// When something meets during the term.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TimeLocation {
    days: DayCode,
    start_slot: u16,
    length: u16,
    weeks: Option<FixedBitSet>,
}

impl TimeLocation {
    /// Creates a time location meeting every week.
    ///
    /// # Panics
    ///
    /// Panics if the meeting would not end within the day.
    #[inline]
    pub fn new(days: DayCode, start_slot: u16, length: u16) -> Self {
        assert!(
            start_slot as u32 + length as u32 <= SLOTS_PER_DAY as u32,
            "called `TimeLocation::new` with a meeting past midnight: start {} + length {} > {}",
            start_slot,
            length,
            SLOTS_PER_DAY
        );

        Self {
            days,
            start_slot,
            length,
            weeks: None,
        }
    }

    /// Restricts the meeting to the given weeks of the term.
    #[inline]
    pub fn with_weeks(mut self, weeks: FixedBitSet) -> Self {
        self.weeks = Some(weeks);
        self
    }

    #[inline]
    pub fn days(&self) -> DayCode {
        self.days
    }

    #[inline]
    pub fn start_slot(&self) -> u16 {
        self.start_slot
    }

    #[inline]
    pub fn length(&self) -> u16 {
        self.length
    }

    /// First slot after the meeting.
    #[inline]
    pub fn end_slot(&self) -> u16 {
        self.start_slot + self.length
    }

    #[inline]
    pub fn weeks(&self) -> Option<&FixedBitSet> {
        self.weeks.as_ref()
    }

    /// Minutes of one meeting.
    #[inline]
    pub fn meeting_minutes(&self) -> u32 {
        self.length as u32 * SLOT_LENGTH_MINUTES
    }

    /// Minutes per week over all meeting days.
    #[inline]
    pub fn weekly_minutes(&self) -> u32 {
        self.days.count() * self.meeting_minutes()
    }

    #[inline]
    pub fn shares_days(&self, other: &TimeLocation) -> bool {
        !self.days.intersection(other.days).is_empty()
    }

    #[inline]
    pub fn shares_hours(&self, other: &TimeLocation) -> bool {
        self.start_slot < other.end_slot() && other.start_slot < self.end_slot()
    }

    /// Whether both meet in at least one common week. A missing pattern means
    /// every week.
    #[inline]
    pub fn shares_weeks(&self, other: &TimeLocation) -> bool {
        match (&self.weeks, &other.weeks) {
            (Some(a), Some(b)) => !a.is_disjoint(b),
            _ => true,
        }
    }

    #[inline]
    pub fn overlaps(&self, other: &TimeLocation) -> bool {
        self.shares_days(other) && self.shares_hours(other) && self.shares_weeks(other)
    }

    /// Number of overlapping slots within one shared day.
    #[inline]
    pub fn shared_slots(&self, other: &TimeLocation) -> u16 {
        let start = self.start_slot.max(other.start_slot);
        let end = self.end_slot().min(other.end_slot());
        end.saturating_sub(start)
    }

    /// Overlapping minutes per week, zero when the two do not overlap.
    #[inline]
    pub fn shared_minutes(&self, other: &TimeLocation) -> u32 {
        if !self.overlaps(other) {
            return 0;
        }
        self.days.intersection(other.days).count()
            * self.shared_slots(other) as u32
            * SLOT_LENGTH_MINUTES
    }

    /// Break in minutes between two meetings on a common day, `None` when they
    /// overlap or never meet on the same day and week.
    #[inline]
    pub fn break_minutes(&self, other: &TimeLocation) -> Option<u32> {
        if !self.shares_days(other) || !self.shares_weeks(other) || self.shares_hours(other) {
            return None;
        }
        let gap = if self.end_slot() <= other.start_slot {
            other.start_slot - self.end_slot()
        } else {
            self.start_slot - other.end_slot()
        };
        Some(gap as u32 * SLOT_LENGTH_MINUTES)
    }
}

impl std::fmt::Debug for TimeLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimeLocation({})", self)
    }
}

impl std::fmt::Display for TimeLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let to_hm = |slot: u16| {
            let minutes = slot as u32 * SLOT_LENGTH_MINUTES;
            (minutes / 60, minutes % 60)
        };
        let (sh, sm) = to_hm(self.start_slot);
        let (eh, em) = to_hm(self.end_slot());
        write!(f, "{} {:02}:{:02}-{:02}:{:02}", self.days, sh, sm, eh, em)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weeks(bits: &[usize]) -> FixedBitSet {
        let mut set = FixedBitSet::with_capacity(16);
        for &b in bits {
            set.insert(b);
        }
        set
    }

    #[test]
    fn test_overlap_requires_day_hour_and_week() {
        let a = TimeLocation::new(DayCode::MON | DayCode::WED, 96, 12);
        let b = TimeLocation::new(DayCode::WED, 102, 12);
        let c = TimeLocation::new(DayCode::TUE, 96, 12);
        let d = TimeLocation::new(DayCode::MON, 108, 12);

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c), "no common day");
        assert!(!a.overlaps(&d), "touching end and start do not overlap");
    }

    #[test]
    fn test_week_patterns() {
        let odd = TimeLocation::new(DayCode::MON, 96, 12).with_weeks(weeks(&[1, 3, 5]));
        let even = TimeLocation::new(DayCode::MON, 96, 12).with_weeks(weeks(&[0, 2, 4]));
        let every = TimeLocation::new(DayCode::MON, 96, 12);

        assert!(!odd.overlaps(&even));
        assert!(odd.overlaps(&every));
        assert!(even.overlaps(&every));
    }

    #[test]
    fn test_shared_minutes() {
        let a = TimeLocation::new(DayCode::MON | DayCode::WED | DayCode::FRI, 96, 10);
        let b = TimeLocation::new(DayCode::MON | DayCode::FRI, 100, 10);
        // two shared days, six shared slots each
        assert_eq!(a.shared_minutes(&b), 2 * 6 * SLOT_LENGTH_MINUTES);
        assert_eq!(a.weekly_minutes(), 150);
    }

    #[test]
    fn test_break_minutes() {
        let first = TimeLocation::new(DayCode::TUE, 96, 10);
        let second = TimeLocation::new(DayCode::TUE, 108, 10);
        let other_day = TimeLocation::new(DayCode::THU, 108, 10);

        assert_eq!(first.break_minutes(&second), Some(10));
        assert_eq!(second.break_minutes(&first), Some(10));
        assert_eq!(first.break_minutes(&other_day), None);
        assert_eq!(first.break_minutes(&first), None);
    }

    #[test]
    fn test_display() {
        let t = TimeLocation::new(DayCode::MON | DayCode::WED, 102, 15);
        assert_eq!(t.to_string(), "MW 08:30-09:45");
    }

    #[test]
    #[should_panic]
    fn test_meeting_past_midnight_panics() {
        let _ = TimeLocation::new(DayCode::MON, 280, 12);
    }
}
