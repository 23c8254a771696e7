//! Benchmarks for the integration and position phases.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{Point3, Vector3};

use dynamics_core::{BodySet, Integrator, PositionUpdater, RigidBody, Shape};

fn populate(count: usize) -> BodySet {
    let mut bodies = BodySet::with_capacity(count);
    for i in 0..count {
        let mut body = RigidBody::dynamic(Shape::sphere(0.5), 1.0).unwrap();
        body.set_position(Point3::new(i as f64 * 2.0, 10.0, 0.0));
        body.set_angular_velocity(Vector3::new(0.1, 1.0, -0.3));
        bodies.insert(body);
    }
    bodies
}

fn bench_integrator(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator");
    for count in [64, 512, 4096] {
        group.bench_with_input(BenchmarkId::new("update", count), &count, |b, &count| {
            let mut bodies = populate(count);
            let mut integrator = Integrator::new(Vector3::new(0.0, -9.81, 0.0));
            b.iter(|| integrator.update(&mut bodies, 1.0 / 240.0));
        });
    }
    group.finish();
}

fn bench_position_phases(c: &mut Criterion) {
    let mut group = c.benchmark_group("position_updater");
    for count in [64, 512, 4096] {
        group.bench_with_input(BenchmarkId::new("pre_update", count), &count, |b, &count| {
            let mut bodies = populate(count);
            let mut updater = PositionUpdater::default();
            b.iter(|| {
                updater.pre_update(&mut bodies, 1.0 / 240.0);
                updater.finish_tick();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_integrator, bench_position_phases);
criterion_main!(benches);
