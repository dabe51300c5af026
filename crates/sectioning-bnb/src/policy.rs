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

//! # Search Policies
//!
//! One branch and bound serves every variant. What differs between them is
//! injected here:
//!
//! - [`Objective`]: what a schedule is worth. `Value` sums slot costs;
//!   `Penalty` first maximizes the number of assigned requests (course
//!   requests count 10, free time 1) and then minimizes the summed penalty.
//! - [`Policy`]: which requests are branched on, which values are allowed,
//!   when the search may stop early, and an optional leading component of the
//!   comparison key (unassigned critical requests, missing credit).
//!
//! Schedules are compared through a lexicographic [`Key`]; lower is better.

use sectioning_model::{
    Assignment, Enrollment, Model,
    index::RequestId,
    request::{Request, RequestPriority},
};
use sectioning_search::config::SectioningConfig;
use std::time::Duration;

/// Tolerance of every key comparison.
pub const KEY_EPSILON: f64 = 1e-9;

const CREDIT_EPSILON: f32 = 1e-4;

/// Lexicographic comparison key of a schedule; lower is better.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Key {
    /// Policy component: unassigned critical requests or missing credit.
    pub primary: f64,
    /// Negated weighted number of assigned requests; zero when minimizing
    /// value.
    pub assigned: f64,
    /// Summed slot costs, or summed penalties when minimizing penalty.
    pub cost: f64,
}

impl Key {
    /// Worse than every schedule.
    pub const WORST: Key = Key {
        primary: f64::INFINITY,
        assigned: f64::INFINITY,
        cost: f64::INFINITY,
    };

    #[inline]
    pub fn new(primary: f64, assigned: f64, cost: f64) -> Self {
        Self {
            primary,
            assigned,
            cost,
        }
    }

    /// Whether `self` is strictly better than `other`.
    pub fn better_than(&self, other: &Key) -> bool {
        for (a, b) in [
            (self.primary, other.primary),
            (self.assigned, other.assigned),
            (self.cost, other.cost),
        ] {
            if a < b - KEY_EPSILON {
                return true;
            }
            if a > b + KEY_EPSILON {
                return false;
            }
        }
        false
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {:.6})", self.primary, self.assigned, self.cost)
    }
}

/// Where penalties come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PenaltySource {
    /// The static penalties of the sections.
    #[default]
    Static,
    /// How full the sections are.
    Online,
}

impl PenaltySource {
    pub fn penalty(&self, model: &Model, assignment: &Assignment, enrollment: &Enrollment) -> f64 {
        match self {
            PenaltySource::Static => enrollment.penalty(model),
            PenaltySource::Online => online_penalty(model, assignment, enrollment),
        }
    }
}

/// Average fill ratio the sections of `enrollment` would reach. Sections
/// without a limit count as empty; sections with a zero limit as full.
pub fn online_penalty(model: &Model, assignment: &Assignment, enrollment: &Enrollment) -> f64 {
    let sections = enrollment.sections();
    if sections.is_empty() {
        return 0.0;
    }
    let request = enrollment.request();
    let weight = model.request(request).weight();
    let sum: f64 = sections
        .iter()
        .map(|&s| {
            let limit = model.section(s).limit();
            match limit {
                l if l < 0 => 0.0,
                0 => 1.0,
                l => {
                    (assignment.section(s).enrollment_weight_excluding(request) + weight) / l as f64
                }
            }
        })
        .sum();
    sum / sections.len() as f64
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Objective {
    #[default]
    Value,
    Penalty(PenaltySource),
}

impl Objective {
    #[inline]
    pub fn minimizes_penalty(&self) -> bool {
        matches!(self, Objective::Penalty(_))
    }
}

/// Weight of an assigned request in the assigned-count component.
#[inline]
pub fn assigned_weight(request: &Request) -> f64 {
    if request.is_course() { 10.0 } else { 1.0 }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Policy {
    #[default]
    Standard,
    /// Only requests at or above `tier` (and, in MPP, requests with an
    /// initial value) are branched on. The rest keep their current value
    /// or stay unassigned.
    Critical { tier: RequestPriority },
    /// Stops as soon as the student's minimum credit is reached.
    MinCredit,
    /// Only initial values are tried.
    InitialOnly,
    /// The penalty of the value in slot `i` may not exceed `limits[i]`
    /// scaled by `1 ± epsilon`.
    Epsilon {
        limits: Vec<Option<f64>>,
        epsilon: f64,
        source: PenaltySource,
    },
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Policy::Standard => "Standard",
            Policy::Critical { .. } => "Critical",
            Policy::MinCredit => "MinCredit",
            Policy::InitialOnly => "InitialOnly",
            Policy::Epsilon { .. } => "Epsilon",
        }
    }

    /// Whether the request counts for the leading key component.
    #[inline]
    pub fn is_critical(&self, request: &Request) -> bool {
        match self {
            Policy::Critical { tier } => request.request_priority().is_at_least(*tier),
            _ => false,
        }
    }

    /// Whether the search branches on the request at all. Requests it does
    /// not branch on stay unassigned.
    pub fn is_eligible(&self, model: &Model, request: &Request) -> bool {
        match self {
            Policy::Critical { .. } => {
                self.is_critical(request) || (model.is_mpp() && request.initial().is_some())
            }
            _ => true,
        }
    }

    /// Whether a request the search does not branch on may keep the value
    /// it currently holds.
    #[inline]
    pub fn keeps_current(&self) -> bool {
        matches!(self, Policy::Critical { .. })
    }

    /// Whether the search can stop at `idx` with everything after it
    /// unassigned.
    pub fn short_circuit(
        &self,
        model: &Model,
        requests: &[RequestId],
        idx: usize,
        min_credit: f32,
        prefix_credit: f32,
    ) -> bool {
        match self {
            Policy::Critical { .. } => !requests[idx..]
                .iter()
                .any(|&r| self.is_eligible(model, model.request(r))),
            Policy::MinCredit => min_credit > 0.0 && prefix_credit + CREDIT_EPSILON >= min_credit,
            _ => false,
        }
    }

    /// Whether the value may go into slot `idx`.
    pub fn allows(&self, model: &Model, idx: usize, enrollment: &Enrollment, penalty: f64) -> bool {
        match self {
            Policy::InitialOnly => {
                model.request(enrollment.request()).initial() == Some(enrollment)
            }
            Policy::Epsilon {
                limits, epsilon, ..
            } => match limits.get(idx).copied().flatten() {
                None => true,
                Some(limit) => {
                    let factor = if limit >= 0.0 {
                        1.0 + epsilon
                    } else {
                        1.0 - epsilon
                    };
                    penalty <= limit * factor + KEY_EPSILON
                }
            },
            _ => true,
        }
    }

    /// Leading key component of a complete schedule.
    pub fn primary(
        &self,
        model: &Model,
        requests: &[RequestId],
        schedule: &[Option<Enrollment>],
        min_credit: f32,
        credit: f32,
    ) -> f64 {
        match self {
            Policy::Critical { .. } => requests
                .iter()
                .zip(schedule)
                .filter(|(r, e)| e.is_none() && self.is_critical(model.request(**r)))
                .count() as f64,
            Policy::MinCredit => (min_credit - credit).max(0.0) as f64,
            _ => 0.0,
        }
    }
}

/// Settings of one per-student search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchSettings {
    pub timeout: Duration,
    pub objective: Objective,
    pub branch_when_selected: bool,
    pub times_to_avoid: bool,
    pub scarce_enrollments: usize,
    /// Prune with bounds. Switching it off gives a plain exhaustive search.
    pub prune: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from_config(&SectioningConfig::default())
    }
}

impl SearchSettings {
    pub fn from_config(config: &SectioningConfig) -> Self {
        Self {
            timeout: config.branch_and_bound_timeout,
            objective: if config.minimize_penalty {
                Objective::Penalty(PenaltySource::Static)
            } else {
                Objective::Value
            },
            branch_when_selected: config.branch_when_selected,
            times_to_avoid: config.times_to_avoid,
            scarce_enrollments: config.scarce_enrollments,
            prune: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn without_pruning(mut self) -> Self {
        self.prune = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_lexicographic() {
        let a = Key::new(0.0, -20.0, 5.0);
        let b = Key::new(0.0, -10.0, -5.0);
        assert!(a.better_than(&b));
        assert!(!b.better_than(&a));
        assert!(Key::new(1.0, -30.0, -9.0).better_than(&Key::WORST));
        assert!(!Key::new(1.0, -30.0, -9.0).better_than(&Key::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_equal_keys_are_not_better() {
        let a = Key::new(0.0, 0.0, -1.5);
        let b = Key::new(0.0, 0.0, -1.5 + KEY_EPSILON / 2.0);
        assert!(!a.better_than(&b));
        assert!(!b.better_than(&a));
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = SectioningConfig::default();
        config.with_minimize_penalty(true);
        let settings = SearchSettings::from_config(&config);
        assert_eq!(settings.objective, Objective::Penalty(PenaltySource::Static));
        assert!(settings.prune);
        assert!(!settings.clone().without_pruning().prune);
    }
}
