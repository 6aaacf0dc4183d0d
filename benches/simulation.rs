//! Performance benchmarks for neurogrid

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neurogrid::grid::SpatialIndex;
use neurogrid::neural::{build_features, forward, Genome, MutationConfig, INPUT_SIZE};
use neurogrid::perception::{PerceptionContext, VisionCone};
use neurogrid::{Config, Creature, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn benchmark_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    for population in [20, 100, 400].iter() {
        let mut config = Config::default();
        config.creatures.initial_count = *population;
        config.world.grid_size = 80;
        config.world.food_max_count = 200;

        let mut world = World::new_with_seed(config, 42);

        // Warm up
        world.run(10).unwrap();

        group.bench_with_input(BenchmarkId::new("population", population), population, |b, _| {
            b.iter(|| {
                world.step().unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_neural_forward(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let genome = Genome::random(&mut rng);
    let inputs = [0.5f32; INPUT_SIZE];

    c.bench_function("neural_forward", |b| {
        b.iter(|| forward(black_box(&genome), black_box(&inputs)).unwrap());
    });
}

fn benchmark_perception(c: &mut Criterion) {
    let mut config = Config::default();
    config.creatures.initial_count = 200;
    config.world.grid_size = 80;
    let world = World::new_with_seed(config.clone(), 42);

    let mut index = SpatialIndex::new();
    index.rebuild(world.creatures.iter().map(Creature::position));
    let ctx = PerceptionContext {
        cone: VisionCone::from_config(&config.creatures),
        obstacles: &world.obstacles,
        food: &world.food,
        creatures: &world.creatures,
        index: &index,
    };

    c.bench_function("creature_perceive", |b| {
        b.iter(|| ctx.perceive(black_box(0)));
    });

    let perception = ctx.perceive(0);
    c.bench_function("creature_features", |b| {
        b.iter(|| {
            build_features(
                black_box(&world.creatures[0]),
                &perception,
                config.creatures.max_energy,
                config.creatures.visibility_radius,
            )
        });
    });
}

fn benchmark_mutation(c: &mut Criterion) {
    let mutation_config = MutationConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    c.bench_function("genome_mutation", |b| {
        let mut genome = Genome::random(&mut rng);
        let mut step_rng = ChaCha8Rng::seed_from_u64(3);
        b.iter(|| {
            genome.mutate(mutation_config.step, &mut step_rng);
        });
    });
}

fn benchmark_checkpoint(c: &mut Criterion) {
    let mut config = Config::default();
    config.creatures.initial_count = 200;
    config.world.grid_size = 80;
    let mut world = World::new_with_seed(config, 42);
    world.run(100).unwrap();

    let checkpoint = world.create_checkpoint();

    c.bench_function("checkpoint_serialize", |b| {
        b.iter(|| bincode::serialize(black_box(&checkpoint)).unwrap());
    });

    let serialized = bincode::serialize(&checkpoint).unwrap();

    c.bench_function("checkpoint_deserialize", |b| {
        b.iter(|| {
            let _: neurogrid::checkpoint::Checkpoint = bincode::deserialize(black_box(&serialized)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    benchmark_world_step,
    benchmark_neural_forward,
    benchmark_perception,
    benchmark_mutation,
    benchmark_checkpoint,
);

criterion_main!(benches);
