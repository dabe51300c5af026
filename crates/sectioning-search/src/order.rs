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

//! Orders in which selections visit students.
//!
//! Randomness is applied once, when a queue is built; the searches that
//! follow are deterministic given the order.

use rand::{Rng, seq::SliceRandom};
use sectioning_model::{Model, index::StudentId};
use std::cmp::Reverse;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StudentOrder {
    /// Shuffled.
    #[default]
    Random,
    /// By student id.
    Sequential,
    /// Higher student priority first, then students with more critical
    /// requests; ties shuffled.
    Priority,
}

impl StudentOrder {
    pub fn parse(name: &str) -> Option<StudentOrder> {
        match name.trim().to_ascii_lowercase().as_str() {
            "random" => Some(StudentOrder::Random),
            "sequential" => Some(StudentOrder::Sequential),
            "priority" => Some(StudentOrder::Priority),
            _ => None,
        }
    }

    /// Parses a strategy name, falling back to [`StudentOrder::Random`] with a
    /// warning for unknown names.
    pub fn parse_or_default(name: &str) -> StudentOrder {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!(name, "unknown student order, using Random");
            StudentOrder::Random
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            StudentOrder::Random => "Random",
            StudentOrder::Sequential => "Sequential",
            StudentOrder::Priority => "Priority",
        }
    }

    /// Reorders `students` in place.
    pub fn order<R: Rng + ?Sized>(&self, model: &Model, students: &mut [StudentId], rng: &mut R) {
        match self {
            StudentOrder::Random => students.shuffle(rng),
            StudentOrder::Sequential => students.sort_unstable(),
            StudentOrder::Priority => {
                students.shuffle(rng);
                students.sort_by_key(|&s| {
                    let student = model.student(s);
                    let critical = student
                        .requests()
                        .iter()
                        .filter(|&&r| model.request(r).request_priority().is_critical())
                        .count();
                    (student.priority(), Reverse(critical))
                });
            }
        }
    }

    /// Every student of the model in this order.
    pub fn students<R: Rng + ?Sized>(&self, model: &Model, rng: &mut R) -> Vec<StudentId> {
        let mut students: Vec<StudentId> = model.students().ids().collect();
        self.order(model, &mut students, rng);
        students
    }
}

impl std::fmt::Display for StudentOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use sectioning_model::{
        builder::{ModelBuilder, StudentSpec},
        student::StudentPriority,
    };

    fn model() -> Model {
        let mut b = ModelBuilder::new();
        b.add_student(StudentSpec::new(0).with_priority(StudentPriority::Dummy));
        b.add_student(StudentSpec::new(1));
        b.add_student(StudentSpec::new(2).with_priority(StudentPriority::Priority));
        b.add_student(StudentSpec::new(3));
        b.build().unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!(StudentOrder::parse("priority"), Some(StudentOrder::Priority));
        assert_eq!(StudentOrder::parse(" Sequential "), Some(StudentOrder::Sequential));
        assert_eq!(StudentOrder::parse("Alphabetical"), None);
        assert_eq!(StudentOrder::parse_or_default("Alphabetical"), StudentOrder::Random);
    }

    #[test]
    fn test_priority_order_puts_priority_students_first_and_dummies_last() {
        let model = model();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let order = StudentOrder::Priority.students(&model, &mut rng);
        assert_eq!(order.first(), Some(&StudentId::new(2)));
        assert_eq!(order.last(), Some(&StudentId::new(0)));
    }

    #[test]
    fn test_random_order_is_a_permutation() {
        let model = model();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut order = StudentOrder::Random.students(&model, &mut rng);
        order.sort_unstable();
        assert_eq!(order, StudentOrder::Sequential.students(&model, &mut rng));
    }
}
