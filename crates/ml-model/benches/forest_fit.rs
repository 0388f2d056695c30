//! Benchmarks for rating model training and scoring
//!
//! Run with: cargo bench --package ml-model
//!
//! Uses a synthetic training set shaped like the warehouse data: a few
//! thousand ratings over ~20 genres and 27 regions.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ml_model::{ForestParams, FeatureRow, RatingModel, Regressor};

const GENRES: [&str; 5] = ["Drama", "Comedy", "Action", "Horror", "Romance"];

fn synthetic_rows(n: usize) -> (Vec<FeatureRow>, Vec<f64>) {
    let mut features = Vec::with_capacity(n);
    let mut targets = Vec::with_capacity(n);
    for i in 0..n {
        let genre = GENRES[i % GENRES.len()];
        let region = format!("R{:02}", i % 27);
        features.push(FeatureRow::new(1950.0 + (i % 70) as f64, 80.0 + (i % 90) as f64, genre, region));
        targets.push(1.0 + (i % 9) as f64 / 2.0);
    }
    (features, targets)
}

fn bench_fit(c: &mut Criterion) {
    let (features, targets) = synthetic_rows(2_000);
    let params = ForestParams {
        n_estimators: 50,
        ..ForestParams::default()
    };

    c.bench_function("rating_model_fit_2k_rows_50_trees", |b| {
        b.iter(|| {
            let model = RatingModel::fit(black_box(&features), black_box(&targets), &params).unwrap();
            black_box(model)
        })
    });
}

fn bench_predict(c: &mut Criterion) {
    let (features, targets) = synthetic_rows(2_000);
    let model = RatingModel::fit(&features, &targets, &ForestParams::default()).unwrap();
    let (candidates, _) = synthetic_rows(400);

    c.bench_function("rating_model_predict_400_rows", |b| {
        b.iter(|| black_box(model.predict(black_box(&candidates)).unwrap()))
    });
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
