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

//! Student requests: course requests with their alternatives and choice
//! preferences, and free-time requests.

use crate::{
    enrollment::Enrollment,
    index::{ConfigId, CourseId, GroupId, OfferingId, RequestId, SectionId, StudentId},
    model::Model,
};
use sectioning_core::time::TimeLocation;

/// Importance tier of a request. Declaration order is importance order, so
/// `a <= b` reads "a is at least as critical as b".
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RequestPriority {
    Lc,
    Critical,
    Vital,
    Important,
    #[default]
    Normal,
    VisitingF2F,
}

impl RequestPriority {
    #[inline]
    pub fn is_at_least(self, tier: RequestPriority) -> bool {
        self <= tier
    }

    /// Any tier above `Normal`.
    #[inline]
    pub fn is_critical(self) -> bool {
        self < RequestPriority::Normal
    }

    pub fn parse(name: &str) -> Option<RequestPriority> {
        match name.to_ascii_lowercase().as_str() {
            "lc" => Some(RequestPriority::Lc),
            "critical" => Some(RequestPriority::Critical),
            "vital" => Some(RequestPriority::Vital),
            "important" => Some(RequestPriority::Important),
            "normal" => Some(RequestPriority::Normal),
            "visitingf2f" => Some(RequestPriority::VisitingF2F),
            _ => None,
        }
    }
}

/// A preference (selected) or restriction (required) over the sections a
/// course request may be given.
#[derive(Clone, Debug, PartialEq)]
pub enum Choice {
    Config(ConfigId),
    Section(SectionId),
    /// Any section of the given instructional type meeting at this time.
    Time {
        offering: OfferingId,
        instructional_type: String,
        time: TimeLocation,
    },
}

/// Whether `enrollment` honours every choice in `choices` that concerns it.
///
/// Choices are grouped by what they constrain: all config choices of the
/// enrollment's offering form one disjunction, all section and time choices on
/// one subpart form another. A group the enrollment does not touch is
/// ignored.
pub fn satisfies_choices(model: &Model, choices: &[Choice], enrollment: &Enrollment) -> bool {
    if choices.is_empty() {
        return true;
    }
    let (Some(config), Some(offering)) = (enrollment.config(), enrollment.offering(model)) else {
        return true;
    };

    let mut config_group = false;
    let mut config_hit = false;
    for choice in choices {
        if let Choice::Config(c) = choice {
            if model.config(*c).offering() == offering {
                config_group = true;
                config_hit |= *c == config;
            }
        }
    }
    if config_group && !config_hit {
        return false;
    }

    for &section in enrollment.sections() {
        let subpart = model.subpart(model.section(section).subpart());
        let mut group = false;
        let mut hit = false;
        for choice in choices {
            match choice {
                Choice::Section(s) => {
                    if model.section(*s).subpart() == subpart.id() {
                        group = true;
                        hit |= *s == section;
                    }
                }
                Choice::Time {
                    offering: o,
                    instructional_type,
                    time,
                } => {
                    if *o == offering && instructional_type == subpart.name() {
                        group = true;
                        hit |= model.section(section).time() == Some(time);
                    }
                }
                Choice::Config(_) => {}
            }
        }
        if group && !hit {
            return false;
        }
    }
    true
}

#[derive(Clone, Debug, Default)]
pub struct CourseRequest {
    pub(crate) courses: Vec<CourseId>,
    pub(crate) waitlist: bool,
    pub(crate) selected: Vec<Choice>,
    pub(crate) required: Vec<Choice>,
    pub(crate) fixed: Option<Enrollment>,
}

impl CourseRequest {
    /// Requested courses, first choice first.
    #[inline]
    pub fn courses(&self) -> &[CourseId] {
        &self.courses
    }

    #[inline]
    pub fn is_waitlist(&self) -> bool {
        self.waitlist
    }

    #[inline]
    pub fn selected(&self) -> &[Choice] {
        &self.selected
    }

    #[inline]
    pub fn required(&self) -> &[Choice] {
        &self.required
    }

    #[inline]
    pub fn fixed(&self) -> Option<&Enrollment> {
        self.fixed.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct FreeTimeRequest {
    pub(crate) time: TimeLocation,
}

impl FreeTimeRequest {
    #[inline]
    pub fn time(&self) -> &TimeLocation {
        &self.time
    }
}

#[derive(Clone, Debug)]
pub enum RequestKind {
    Course(CourseRequest),
    FreeTime(FreeTimeRequest),
}

#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) id: RequestId,
    pub(crate) student: StudentId,
    pub(crate) priority: usize,
    pub(crate) alternative: bool,
    pub(crate) weight: f64,
    pub(crate) request_priority: RequestPriority,
    pub(crate) initial: Option<Enrollment>,
    pub(crate) group: Option<GroupId>,
    pub(crate) kind: RequestKind,
}

impl Request {
    #[inline]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[inline]
    pub fn student(&self) -> StudentId {
        self.student
    }

    /// Position in the student's request list.
    #[inline]
    pub fn priority(&self) -> usize {
        self.priority
    }

    #[inline]
    pub fn is_alternative(&self) -> bool {
        self.alternative
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn request_priority(&self) -> RequestPriority {
        self.request_priority
    }

    /// Enrollment the request held before the current solve (MPP).
    #[inline]
    pub fn initial(&self) -> Option<&Enrollment> {
        self.initial.as_ref()
    }

    #[inline]
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    #[inline]
    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    #[inline]
    pub fn as_course(&self) -> Option<&CourseRequest> {
        match &self.kind {
            RequestKind::Course(c) => Some(c),
            RequestKind::FreeTime(_) => None,
        }
    }

    #[inline]
    pub fn as_free_time(&self) -> Option<&FreeTimeRequest> {
        match &self.kind {
            RequestKind::FreeTime(f) => Some(f),
            RequestKind::Course(_) => None,
        }
    }

    #[inline]
    pub fn is_course(&self) -> bool {
        matches!(self.kind, RequestKind::Course(_))
    }

    #[inline]
    pub fn is_waitlist(&self) -> bool {
        self.as_course().is_some_and(|c| c.waitlist)
    }

    #[inline]
    pub fn fixed(&self) -> Option<&Enrollment> {
        self.as_course().and_then(|c| c.fixed.as_ref())
    }

    #[inline]
    pub fn has_selection(&self) -> bool {
        self.as_course().is_some_and(|c| !c.selected.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_priority_tiers() {
        assert!(RequestPriority::Critical.is_at_least(RequestPriority::Important));
        assert!(RequestPriority::Important.is_at_least(RequestPriority::Important));
        assert!(!RequestPriority::Normal.is_at_least(RequestPriority::Important));
        assert!(!RequestPriority::VisitingF2F.is_critical());
        assert!(RequestPriority::Vital.is_critical());
    }

    #[test]
    fn test_request_priority_parse() {
        assert_eq!(RequestPriority::parse("Important"), Some(RequestPriority::Important));
        assert_eq!(RequestPriority::parse("LC"), Some(RequestPriority::Lc));
        assert_eq!(RequestPriority::parse("urgent"), None);
    }
}
