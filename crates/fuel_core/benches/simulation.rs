//! Simulation benchmarks for fuel_core.
//!
//! Run with: `cargo bench -p fuel_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fuel_core::conditions::ConditionLedger;
use fuel_core::data::TankData;
use fuel_core::tank::Tank;
use fuel_test_utils::fixtures::{demo_world, spawn, step_demo, world};

/// Full ticks of the demo world at increasing unit counts.
pub fn demo_tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("demo_tick");
    for trucks in [10, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(trucks), &trucks, |b, &trucks| {
            let mut world = demo_world(trucks);
            b.iter(|| {
                step_demo(&mut world);
                black_box(world.get_tick())
            });
        });
    }
    group.finish();
}

/// Area refuelers sweeping a dense cluster of trucks.
pub fn area_sweep_benchmark(c: &mut Criterion) {
    c.bench_function("area_sweep_20x200", |b| {
        let mut world = world();
        let player = world.add_player();
        for i in 0..20 {
            spawn(&mut world, "tanker", player, i % 5, i / 5);
        }
        for i in 0..200 {
            spawn(&mut world, "truck", player, i % 20, i / 20);
        }

        b.iter(|| black_box(world.tick()));
    });
}

/// Raw tank traffic without the world around it.
pub fn tank_benchmark(c: &mut Criterion) {
    c.bench_function("tank_receive_take", |b| {
        let mut conditions = ConditionLedger::new();
        let mut tank = Tank::new(1, &TankData::with_capacity(1000));
        b.iter(|| {
            tank.take_fuel(black_box(7), &mut conditions);
            tank.receive_fuel(black_box(7), &mut conditions);
        });
    });
}

/// State hash over a busy world.
pub fn state_hash_benchmark(c: &mut Criterion) {
    let world = demo_world(500);
    c.bench_function("state_hash_500", |b| b.iter(|| black_box(world.state_hash())));
}

criterion_group!(
    benches,
    demo_tick_benchmark,
    area_sweep_benchmark,
    tank_benchmark,
    state_hash_benchmark
);
criterion_main!(benches);
