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

//! # Sectioning Configuration
//!
//! Every knob of the selections and the driver in one value. Defaults match
//! a production run; [`SectioningConfig::from_properties`] reads the
//! `Neighbour.*`, `Sectioning.*`, `Distances.*` and `Weights.*` keys and keeps
//! the default of every key that is missing or does not parse.

use crate::{order::StudentOrder, properties::Properties};
use sectioning_model::{
    builder::ModelBuilder,
    model::ModelSettings,
    quality::{DistanceConflicts, StudentQuality},
    request::RequestPriority,
    weights::{EqualStudentWeights, PriorityStudentWeights, StudentWeights},
};
use std::time::Duration;

/// Which [`StudentWeights`] strategy scores schedules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StudentWeightsKind {
    #[default]
    Priority,
    Equal,
}

impl StudentWeightsKind {
    pub fn parse(name: &str) -> Option<StudentWeightsKind> {
        match name.trim().to_ascii_lowercase().as_str() {
            "priority" => Some(StudentWeightsKind::Priority),
            "equal" => Some(StudentWeightsKind::Equal),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SectioningConfig {
    pub branch_and_bound_timeout: Duration,
    pub minimize_penalty: bool,
    pub branch_when_selected: bool,
    pub times_to_avoid: bool,
    /// Requests with at most this many candidates are scarce.
    pub scarce_enrollments: usize,
    pub swap_students_timeout: Duration,
    pub swap_students_max_values: usize,
    pub enrollment_swap_timeout: Duration,
    pub enrollment_swap_max_iterations: u64,
    pub allow_unassign_higher_priority: bool,
    pub allow_unassign_critical: bool,
    pub mpp: bool,
    pub keep_initial_assignments: bool,
    pub online_epsilon: f64,
    pub critical_rounds: usize,
    pub critical_tier: RequestPriority,
    pub priority_construction_max_cycles: usize,
    pub student_order: StudentOrder,
    pub student_weights: StudentWeightsKind,
    pub retry_limit: usize,
    pub problem_students_unassign_probability: f64,
    pub seed: u64,
    pub time_limit: Duration,
    pub distance_speed: f64,
    pub allowed_break: u32,
    pub weights: PriorityStudentWeights,
}

impl Default for SectioningConfig {
    fn default() -> Self {
        Self {
            branch_and_bound_timeout: Duration::from_millis(1000),
            minimize_penalty: false,
            branch_when_selected: true,
            times_to_avoid: true,
            scarce_enrollments: 5,
            swap_students_timeout: Duration::from_millis(5000),
            swap_students_max_values: 100,
            enrollment_swap_timeout: Duration::from_millis(5000),
            enrollment_swap_max_iterations: 1000,
            allow_unassign_higher_priority: false,
            allow_unassign_critical: false,
            mpp: false,
            keep_initial_assignments: false,
            online_epsilon: 0.1,
            critical_rounds: 10,
            critical_tier: RequestPriority::Important,
            priority_construction_max_cycles: 7,
            student_order: StudentOrder::Random,
            student_weights: StudentWeightsKind::Priority,
            retry_limit: 3,
            problem_students_unassign_probability: 0.1,
            seed: 0,
            time_limit: Duration::from_secs(60),
            distance_speed: 67.0,
            allowed_break: 30,
            weights: PriorityStudentWeights::default(),
        }
    }
}

impl SectioningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_properties(properties: &Properties) -> Self {
        let d = Self::default();
        let ms = |key: &str, default: Duration| {
            Duration::from_millis(properties.get_u64(key, default.as_millis() as u64))
        };
        let w = &d.weights;
        Self {
            branch_and_bound_timeout: ms(
                "Neighbour.BranchAndBoundTimeout",
                d.branch_and_bound_timeout,
            ),
            minimize_penalty: properties
                .get_bool("Neighbour.BranchAndBoundMinimizePenalty", d.minimize_penalty),
            branch_when_selected: properties.get_bool(
                "Neighbour.BranchAndBoundBranchWhenSelected",
                d.branch_when_selected,
            ),
            times_to_avoid: properties
                .get_bool("Neighbour.BranchAndBoundTimesToAvoid", d.times_to_avoid),
            scarce_enrollments: properties
                .get_u64("Neighbour.ScarceEnrollments", d.scarce_enrollments as u64)
                as usize,
            swap_students_timeout: ms("Neighbour.SwapStudentsTimeout", d.swap_students_timeout),
            swap_students_max_values: properties.get_u64(
                "Neighbour.SwapStudentsMaxValues",
                d.swap_students_max_values as u64,
            ) as usize,
            enrollment_swap_timeout: ms(
                "Neighbour.EnrollmentSwapTimeout",
                d.enrollment_swap_timeout,
            ),
            enrollment_swap_max_iterations: properties.get_u64(
                "Neighbour.EnrollmentSwapMaxIterations",
                d.enrollment_swap_max_iterations,
            ),
            allow_unassign_higher_priority: properties.get_bool(
                "Neighbour.AllowUnassignHigherPriority",
                d.allow_unassign_higher_priority,
            ),
            allow_unassign_critical: properties
                .get_bool("Neighbour.AllowUnassignCritical", d.allow_unassign_critical),
            mpp: properties.get_bool("Sectioning.MPP", d.mpp),
            keep_initial_assignments: properties.get_bool(
                "Sectioning.KeepInitialAssignments",
                d.keep_initial_assignments,
            ),
            online_epsilon: properties.get_f64("Sectioning.OnlineEpsilon", d.online_epsilon),
            critical_rounds: properties
                .get_u64("Sectioning.CriticalRounds", d.critical_rounds as u64)
                as usize,
            critical_tier: match properties.get_str("Sectioning.CriticalTier") {
                None => d.critical_tier,
                Some(name) => RequestPriority::parse(name).unwrap_or_else(|| {
                    tracing::warn!(name, "unknown critical tier, using Important");
                    d.critical_tier
                }),
            },
            priority_construction_max_cycles: properties.get_u64(
                "Sectioning.PriorityConstructionMaxCycles",
                d.priority_construction_max_cycles as u64,
            ) as usize,
            student_order: properties
                .get_str("Sectioning.StudentOrder")
                .map_or(d.student_order, StudentOrder::parse_or_default),
            student_weights: match properties.get_str("Sectioning.StudentWeights") {
                None => d.student_weights,
                Some(name) => StudentWeightsKind::parse(name).unwrap_or_else(|| {
                    tracing::warn!(name, "unknown student weights, using Priority");
                    StudentWeightsKind::Priority
                }),
            },
            retry_limit: properties.get_u64("Sectioning.RetryLimit", d.retry_limit as u64)
                as usize,
            problem_students_unassign_probability: properties
                .get_f64(
                    "Sectioning.ProblemStudentsUnassignProb",
                    d.problem_students_unassign_probability,
                )
                .clamp(0.0, 1.0),
            seed: properties.get_u64("Sectioning.Seed", d.seed),
            time_limit: Duration::from_secs_f64(
                properties
                    .get_f64("Sectioning.TimeLimit", d.time_limit.as_secs_f64())
                    .max(0.0),
            ),
            distance_speed: properties.get_f64("Distances.Speed", d.distance_speed),
            allowed_break: properties.get_u64("Distances.AllowedBreak", d.allowed_break as u64)
                as u32,
            weights: PriorityStudentWeights {
                priority: properties.get_f64("Weights.Priority", w.priority),
                first_alternative: properties
                    .get_f64("Weights.FirstAlternative", w.first_alternative),
                second_alternative: properties
                    .get_f64("Weights.SecondAlternative", w.second_alternative),
                distance_conflict: properties
                    .get_f64("Weights.DistanceConflict", w.distance_conflict),
                time_overlap: properties.get_f64("Weights.TimeOverlapFactor", w.time_overlap),
                selection: properties.get_f64("Weights.SelectionFactor", w.selection),
            },
        }
    }

    pub fn with_branch_and_bound_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.branch_and_bound_timeout = timeout;
        self
    }

    pub fn with_minimize_penalty(&mut self, minimize_penalty: bool) -> &mut Self {
        self.minimize_penalty = minimize_penalty;
        self
    }

    pub fn with_mpp(&mut self, mpp: bool, keep_initial_assignments: bool) -> &mut Self {
        self.mpp = mpp;
        self.keep_initial_assignments = keep_initial_assignments;
        self
    }

    pub fn with_student_order(&mut self, order: StudentOrder) -> &mut Self {
        self.student_order = order;
        self
    }

    pub fn with_seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    pub fn with_time_limit(&mut self, time_limit: Duration) -> &mut Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_swap_students_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.swap_students_timeout = timeout;
        self
    }

    pub fn with_enrollment_swap_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.enrollment_swap_timeout = timeout;
        self
    }

    pub fn with_priority_construction_max_cycles(&mut self, cycles: usize) -> &mut Self {
        self.priority_construction_max_cycles = cycles;
        self
    }

    pub fn with_retry_limit(&mut self, retry_limit: usize) -> &mut Self {
        self.retry_limit = retry_limit;
        self
    }

    /// The configured student weights strategy.
    pub fn student_weights(&self) -> Box<dyn StudentWeights> {
        match self.student_weights {
            StudentWeightsKind::Priority => Box::new(self.weights.clone()),
            StudentWeightsKind::Equal => Box::new(EqualStudentWeights {
                distance_conflict: self.weights.distance_conflict,
                time_overlap: self.weights.time_overlap,
            }),
        }
    }

    pub fn distance_conflicts(&self) -> DistanceConflicts {
        DistanceConflicts::new(self.distance_speed.max(f64::EPSILON), self.allowed_break)
    }

    /// Applies the model-level switches, weights and oracles to a builder.
    /// An MPP switch already set on the builder is kept.
    pub fn configure(&self, builder: &mut ModelBuilder) {
        let current = builder.settings();
        builder
            .with_settings(ModelSettings {
                mpp: self.mpp || current.mpp,
                keep_initial_assignments: self.keep_initial_assignments,
            })
            .with_student_weights(self.student_weights())
            .with_conflict_oracle(Box::new(StudentQuality::new(self.distance_conflicts())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_properties() {
        assert_eq!(
            SectioningConfig::from_properties(&Properties::new()),
            SectioningConfig::default()
        );
    }

    #[test]
    fn test_properties_override_defaults() {
        let properties = Properties::parse(
            "Neighbour.BranchAndBoundTimeout=250\n\
             Neighbour.BranchAndBoundMinimizePenalty=true\n\
             Sectioning.MPP=true\n\
             Sectioning.KeepInitialAssignments=true\n\
             Sectioning.CriticalTier=Vital\n\
             Sectioning.StudentOrder=Sequential\n\
             Sectioning.StudentWeights=Equal\n\
             Sectioning.TimeLimit=2.5\n\
             Weights.Priority=0.7\n",
        );
        let config = SectioningConfig::from_properties(&properties);
        assert_eq!(config.branch_and_bound_timeout, Duration::from_millis(250));
        assert!(config.minimize_penalty);
        assert!(config.mpp && config.keep_initial_assignments);
        assert_eq!(config.critical_tier, RequestPriority::Vital);
        assert_eq!(config.student_order, StudentOrder::Sequential);
        assert_eq!(config.student_weights, StudentWeightsKind::Equal);
        assert_eq!(config.time_limit, Duration::from_millis(2500));
        assert_eq!(config.weights.priority, 0.7);
        assert_eq!(config.student_weights().name(), "Equal");
    }

    #[test]
    fn test_unknown_strategy_names_fall_back() {
        let properties = Properties::parse(
            "Sectioning.StudentOrder=Alphabetical\n\
             Sectioning.StudentWeights=Fancy\n\
             Sectioning.CriticalTier=Urgent\n",
        );
        let config = SectioningConfig::from_properties(&properties);
        assert_eq!(config.student_order, StudentOrder::Random);
        assert_eq!(config.student_weights, StudentWeightsKind::Priority);
        assert_eq!(config.critical_tier, RequestPriority::Important);
    }

    #[test]
    fn test_setters_chain() {
        let mut config = SectioningConfig::new();
        config
            .with_seed(7)
            .with_retry_limit(1)
            .with_mpp(true, true)
            .with_time_limit(Duration::from_secs(5));
        assert_eq!(config.seed, 7);
        assert_eq!(config.retry_limit, 1);
        assert!(config.keep_initial_assignments);
        assert_eq!(config.time_limit, Duration::from_secs(5));
    }
}
