use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use epicity::parameters::Parameters;
use epicity::simulation::{RunSummary, Simulation};

static SEED: u64 = 123;
static MAX_TIME: f64 = 20.0;

fn default_simulation() -> RunSummary {
    let mut simulation =
        Simulation::on_grid_city(Parameters::default(), SEED).expect("default parameters are valid");
    simulation.run_until(MAX_TIME)
}

fn crowded_city() -> Simulation {
    let parameters = Parameters {
        population: 400,
        initial_infections: 10,
        ..Parameters::default()
    };
    Simulation::on_grid_city(parameters, SEED).expect("crowded parameters are valid")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("default simulation", |bencher| {
        bencher.iter(default_simulation);
    });
    c.bench_function("crowded city 30 ticks", |bencher| {
        bencher.iter_batched(
            crowded_city,
            |mut simulation| {
                for _ in 0..30 {
                    simulation.step();
                }
                simulation
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(simulation_benches, criterion_benchmark);
criterion_main!(simulation_benches);
