use corridor_mdp::{sample_transition, solve, Action, CorridorConfig, CorridorModel};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    for &num_states in &[4usize, 16, 64, 256] {
        let model = CorridorConfig::default()
            .with_num_states(num_states)
            .build()
            .unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(num_states),
            &model,
            |b, model| b.iter(|| solve(black_box(model)).unwrap()),
        );
    }
    group.finish();
}

fn bench_sample_transition(c: &mut Criterion) {
    let model = CorridorModel::default();
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    c.bench_function("sample_transition", |b| {
        b.iter(|| sample_transition(&model, black_box(1), Action::Increase, &mut rng).unwrap())
    });
}

criterion_group!(benches, bench_solve, bench_sample_transition);
criterion_main!(benches);
