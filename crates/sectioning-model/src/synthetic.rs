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

//! Seeded random instances for tests, benchmarks and the demo binary.
//!
//! Every offering has one config with a lecture subpart and, optionally, a
//! lab subpart under it. Labs never meet on a day of their parent lecture, so
//! every course request has at least one structurally valid enrollment.
//! Unavailabilities are soft. The same parameters always produce the same
//! model.

use crate::{
    builder::{CourseRequestSpec, ModelBuilder, ReservationSpec, SectionSpec, StudentSpec},
    error::ModelError,
    index::{CourseId, SectionId, StudentId},
    model::{Model, ModelSettings},
    offering::{Room, UNLIMITED},
    quality::{DistanceConflicts, StudentQuality},
    reservation::ReservationKind,
    student::StudentPriority,
};
use rand::{
    Rng, SeedableRng,
    seq::{IndexedRandom, SliceRandom},
};
use rand_chacha::ChaCha8Rng;
use sectioning_core::time::{DayCode, TimeLocation};

#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticParams {
    pub seed: u64,
    pub offerings: usize,
    pub lectures_per_offering: usize,
    /// Lab sections under each lecture; zero means no lab subpart.
    pub labs_per_lecture: usize,
    pub lecture_limit: i32,
    pub students: usize,
    pub requests_per_student: usize,
    pub alternatives_per_student: usize,
    /// Chance that a course request names a second, alternative course.
    pub alternative_course_probability: f64,
    pub free_time_probability: f64,
    pub unavailability_probability: f64,
    pub reservation_probability: f64,
    pub dummy_probability: f64,
    /// Record the first enrollment of every course request as its initial
    /// value and switch the model to minimal perturbation.
    pub initial_assignments: bool,
    /// Side of the square campus in meters.
    pub campus_size: f64,
}

impl SyntheticParams {
    /// A handful of students over a few offerings; solves in milliseconds.
    pub fn small(seed: u64) -> Self {
        Self {
            seed,
            offerings: 6,
            lectures_per_offering: 3,
            labs_per_lecture: 2,
            lecture_limit: 6,
            students: 12,
            requests_per_student: 3,
            alternatives_per_student: 1,
            alternative_course_probability: 0.3,
            free_time_probability: 0.2,
            unavailability_probability: 0.2,
            reservation_probability: 0.2,
            dummy_probability: 0.1,
            initial_assignments: false,
            campus_size: 1500.0,
        }
    }

    /// A few hundred students competing for tight sections.
    pub fn medium(seed: u64) -> Self {
        Self {
            offerings: 40,
            lectures_per_offering: 4,
            labs_per_lecture: 3,
            lecture_limit: 25,
            students: 400,
            requests_per_student: 5,
            alternatives_per_student: 2,
            ..Self::small(seed)
        }
    }

    pub fn with_initial_assignments(mut self) -> Self {
        self.initial_assignments = true;
        self
    }
}

#[derive(Debug)]
pub struct SyntheticInstance {
    pub model: Model,
    pub params: SyntheticParams,
}

const LECTURE_PATTERNS: [(u8, u16); 2] = [
    // Monday, Wednesday, Friday for 50 minutes.
    (0b0001_0101, 10),
    // Tuesday, Thursday for 75 minutes.
    (0b0000_1010, 15),
];

/// 8:00 to 17:00 in half-hour steps.
fn random_start(rng: &mut ChaCha8Rng) -> u16 {
    96 + 6 * rng.random_range(0..18u16)
}

fn random_room(rng: &mut ChaCha8Rng, name: String, size: f64) -> Room {
    Room::new(name, rng.random_range(0.0..size), rng.random_range(0.0..size))
}

/// Lab days are the weekdays the lecture does not meet on.
fn lab_day(rng: &mut ChaCha8Rng, lecture_days: u8) -> DayCode {
    let free: Vec<u8> = (0..5u8)
        .map(|d| 1 << d)
        .filter(|bit| lecture_days & bit == 0)
        .collect();
    DayCode::from_bits(free[rng.random_range(0..free.len())])
}

struct CourseSections {
    course: CourseId,
    /// Lecture with its labs.
    lectures: Vec<(SectionId, Vec<SectionId>)>,
}

/// Generates an instance scored by the default student weights and a
/// [`StudentQuality`] oracle.
pub fn generate(params: &SyntheticParams) -> Result<SyntheticInstance, ModelError> {
    generate_with(params, |b| {
        b.with_conflict_oracle(Box::new(StudentQuality::new(DistanceConflicts::default())));
    })
}

/// Generates an instance, letting `configure` choose the settings, weights
/// and oracles before any entity is added.
pub fn generate_with(
    params: &SyntheticParams,
    configure: impl FnOnce(&mut ModelBuilder),
) -> Result<SyntheticInstance, ModelError> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut b = ModelBuilder::new();
    if params.initial_assignments {
        b.with_settings(ModelSettings {
            mpp: true,
            keep_initial_assignments: false,
        });
    }
    configure(&mut b);

    let mut catalog = Vec::with_capacity(params.offerings);
    for o in 0..params.offerings {
        let name = format!("C{:03}", 100 + o);
        let offering = b.add_offering(name.clone());
        let course = b.add_course(offering, name, UNLIMITED, rng.random_range(1..=4) as f32)?;
        let config = b.add_config(offering, "Main", UNLIMITED)?;
        let lec = b.add_subpart(config, "Lec", None, false)?;
        let lab = if params.labs_per_lecture > 0 {
            Some(b.add_subpart(config, "Lab", Some(lec), false)?)
        } else {
            None
        };

        let mut lectures = Vec::with_capacity(params.lectures_per_offering);
        for l in 0..params.lectures_per_offering {
            let (days, length) = LECTURE_PATTERNS[rng.random_range(0..LECTURE_PATTERNS.len())];
            let time = TimeLocation::new(DayCode::from_bits(days), random_start(&mut rng), length);
            let room = random_room(&mut rng, format!("R{o}-{l}"), params.campus_size);
            let lecture = b.add_section(
                lec,
                SectionSpec::new(format!("{}", l + 1), params.lecture_limit)
                    .with_time(time)
                    .with_room(room)
                    .with_penalty(rng.random_range(0.0..1.0)),
            )?;
            let mut labs = Vec::new();
            if let Some(lab) = lab {
                let lab_limit = (params.lecture_limit as usize).div_ceil(params.labs_per_lecture);
                for k in 0..params.labs_per_lecture {
                    let day = lab_day(&mut rng, days);
                    let time = TimeLocation::new(day, random_start(&mut rng), 24);
                    let room = random_room(&mut rng, format!("L{o}-{l}-{k}"), params.campus_size);
                    let name = format!("{}{}", l + 1, (b'A' + k as u8) as char);
                    labs.push(b.add_section(
                        lab,
                        SectionSpec::new(name, lab_limit as i32)
                            .with_parent(lecture)
                            .with_time(time)
                            .with_room(room),
                    )?);
                }
            }
            lectures.push((lecture, labs));
        }
        catalog.push(CourseSections { course, lectures });
    }

    let mut students: Vec<StudentId> = Vec::with_capacity(params.students);
    for s in 0..params.students {
        let mut spec = StudentSpec::new(s as u64);
        if rng.random_bool(params.dummy_probability) {
            spec = spec.with_priority(StudentPriority::Dummy);
        }
        if rng.random_bool(params.unavailability_probability) {
            let day = DayCode::from_bits(1 << rng.random_range(0..5u8));
            let time = TimeLocation::new(day, random_start(&mut rng), 24);
            spec = spec.with_unavailability(time, true);
        }
        let student = b.add_student(spec);
        students.push(student);

        let mut picks: Vec<usize> = (0..catalog.len()).collect();
        picks.shuffle(&mut rng);
        let wanted = params.requests_per_student + params.alternatives_per_student;
        let mut picks = picks.into_iter();
        for i in 0..wanted {
            let Some(first) = picks.next() else {
                break;
            };
            let mut courses = vec![catalog[first].course];
            if rng.random_bool(params.alternative_course_probability) {
                if let Some(second) = picks.next() {
                    courses.push(catalog[second].course);
                }
            }
            let mut request = CourseRequestSpec::new(courses);
            if i >= params.requests_per_student {
                request = request.alternative();
            }
            let request = b.add_course_request(student, request)?;
            if params.initial_assignments {
                let (lecture, labs) = &catalog[first].lectures[0];
                let mut sections = vec![*lecture];
                sections.extend(labs.first().copied());
                b.set_initial_assignment(request, catalog[first].course, &sections)?;
            }
        }
        if rng.random_bool(params.free_time_probability) {
            let day = DayCode::from_bits(1 << rng.random_range(0..5u8));
            let time = TimeLocation::new(day, 144, 24);
            b.add_free_time_request(student, time, false)?;
        }
    }

    for (o, entry) in catalog.iter().enumerate() {
        if students.len() >= 2 && rng.random_bool(params.reservation_probability) {
            let holders = students
                .choose_multiple(&mut rng, 2)
                .copied()
                .collect();
            b.add_reservation(
                crate::index::OfferingId::new(o),
                ReservationSpec::new(
                    format!("R-{}", entry.course),
                    ReservationKind::Individual(holders),
                    2.0,
                ),
            )?;
        }
    }

    let model = b.build()?;
    tracing::debug!(seed = params.seed, students = params.students, "generated synthetic instance");
    Ok(SyntheticInstance {
        model,
        params: params.clone(),
    })
}
