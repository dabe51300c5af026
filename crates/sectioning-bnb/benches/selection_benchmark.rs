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

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sectioning_bnb::{
    policy::{Objective, PenaltySource, Policy, SearchSettings},
    selection::search,
};
use sectioning_model::{
    Assignment,
    index::StudentId,
    synthetic::{SyntheticParams, generate},
};
use sectioning_search::monitor::selection_monitor::NoOperationMonitor;
use std::hint::black_box;
use std::time::Duration;

/// Half of the students seated, so the searches run against real occupancy.
fn half_seated(model: &sectioning_model::Model, settings: &SearchSettings) -> Assignment {
    let mut assignment = Assignment::new(model);
    for student in model.students().ids().filter(|s| s.get() % 2 == 0) {
        let outcome = search(
            model,
            &assignment,
            student,
            settings,
            &Policy::Standard,
            NoOperationMonitor,
        );
        if let Some(best) = outcome.improvement() {
            for e in best.iter().flatten() {
                assignment.assign(model, e.clone());
            }
        }
    }
    assignment
}

fn bench_selection(c: &mut Criterion) {
    let instance = generate(&SyntheticParams::medium(17)).expect("synthetic instance");
    let model = &instance.model;
    let value = SearchSettings::default().with_timeout(Duration::from_secs(10));
    let assignment = half_seated(model, &value);
    let students: Vec<StudentId> = model.students().ids().filter(|s| s.get() % 2 == 1).collect();

    let mut group = c.benchmark_group("selection_benchmark");
    group.throughput(Throughput::Elements(students.len() as u64));
    for (label, settings) in [
        ("value", value.clone()),
        (
            "penalty",
            value.clone().with_objective(Objective::Penalty(PenaltySource::Static)),
        ),
        ("exhaustive", value.clone().without_pruning()),
    ] {
        group.bench_with_input(BenchmarkId::new(label, students.len()), &settings, |b, settings| {
            b.iter(|| {
                for &student in &students {
                    black_box(search(
                        black_box(model),
                        black_box(&assignment),
                        student,
                        settings,
                        &Policy::Standard,
                        NoOperationMonitor,
                    ));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_selection);
criterion_main!(benches);
