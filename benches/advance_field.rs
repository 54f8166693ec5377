use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use progressive_fractal::core::actions::advance_field::advance_field;
use progressive_fractal::core::data::fractal_field::{FieldGeometry, FractalField};
use progressive_fractal::{Complex, CoordSystem, EngineSettings, EscapePolicy};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;

fn field() -> FractalField {
    let coords = CoordSystem::from_centre_and_radius(WIDTH, HEIGHT, Complex::new(-0.5, 0.0), 1.5)
        .expect("valid view");
    FractalField::with_geometry(FieldGeometry::from_coord_system(WIDTH, HEIGHT, &coords))
        .expect("valid field")
}

fn bench_advance_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance_field");

    for policy in [EscapePolicy::PerIteration, EscapePolicy::PerBatch] {
        let settings = EngineSettings {
            escape_policy: policy,
            ..EngineSettings::default()
        };

        for batch in [1u32, 10, 30] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", policy), batch),
                &batch,
                |b, &batch| {
                    b.iter_batched_ref(
                        field,
                        |field| advance_field(black_box(field), batch, &settings),
                        BatchSize::LargeInput,
                    )
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_advance_field);
criterion_main!(benches);
