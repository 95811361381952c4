#[macro_use]
extern crate criterion;
extern crate flamed;

use criterion::Criterion;
use flamed::fit::EditMode;
use flamed::generate::{generate, UniformIndex};
use flamed::{AffineStage, FlameMaps, IfsPoint, Vector2};

fn chaos_game(c: &mut Criterion) {
    let flame = FlameMaps::default();
    let mut buffer = vec![IfsPoint::default(); 100_000];
    let mut source = UniformIndex::seeded(17);
    c.bench_function("generate 100k points", move |b| {
        b.iter(|| generate(&flame, &mut buffer, &mut source).unwrap())
    });
}

fn parameter_fit(c: &mut Criterion) {
    let flame = FlameMaps::default();
    c.bench_function("rotate fit", move |b| {
        b.iter(|| {
            let mut flame = flame.clone();
            flame
                .edit(3, EditMode::Rotate, Vector2::new(0.3, 0.2), Vector2::new(0.01, 0.0), AffineStage::Pre)
                .unwrap()
        })
    });
}

criterion_group!(benches, chaos_game, parameter_fit);
criterion_main!(benches);
