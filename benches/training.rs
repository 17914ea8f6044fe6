//! Training benchmark: fit each backend on a synthetic feature matrix.

use alice_detect::model::{
    BoostingParams, Classifier, GradientBoosting, LogisticParams, LogisticRegression,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::{Array1, Array2};

fn make_matrix(rows: usize, cols: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((rows, cols), |(r, c)| ((r * 13 + c * 7) % 17) as f64);
    let y = Array1::from_shape_fn(rows, |r| if (r * 13) % 17 > 8 { 1.0 } else { 0.0 });
    (x, y)
}

fn bench_logistic(c: &mut Criterion) {
    let (x, y) = make_matrix(500, 135);
    c.bench_function("logistic_fit_500x135", |b| {
        b.iter(|| {
            let mut model = LogisticRegression::new(LogisticParams::default());
            model.fit(black_box(x.view()), black_box(y.view())).unwrap();
            black_box(model)
        })
    });
}

fn bench_boosting(c: &mut Criterion) {
    let (x, y) = make_matrix(500, 135);
    let params = BoostingParams {
        n_estimators: 20,
        ..BoostingParams::default()
    };
    c.bench_function("boosting_fit_500x135_20_trees", |b| {
        b.iter(|| {
            let mut model = GradientBoosting::new(params, 42);
            model.fit(black_box(x.view()), black_box(y.view())).unwrap();
            black_box(model)
        })
    });
}

criterion_group!(benches, bench_logistic, bench_boosting);
criterion_main!(benches);
