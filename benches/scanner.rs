//! Benchmark for the content scanner hot path.

#![allow(missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};
use lexmon::{Category, Lexicon, score};
use std::hint::black_box;

fn bench_scanner(c: &mut Criterion) {
    let lexicon = Lexicon::new(vec![
        Category::new("incidents", ["outage", "down", "failure", "crash"]).unwrap(),
        Category::new("maintenance", ["maintenance", "upgrade", "migration"]).unwrap(),
        Category::new("weather", ["storm", "flood", "snow"]).unwrap(),
    ])
    .unwrap();

    let body = "The scheduled maintenance caused a brief outage. Service was down \
                for six minutes; the upgrade completed despite the storm. "
        .repeat(64);

    c.bench_function("score_12kb_3_categories", |b| {
        b.iter(|| score(black_box(&body), black_box(&lexicon)));
    });
}

criterion_group!(benches, bench_scanner);
criterion_main!(benches);
