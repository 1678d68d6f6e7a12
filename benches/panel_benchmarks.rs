//! Performance benchmarks for the panel's per-event paths
//!
//! Layout runs on every inner commit and hit-testing on every host pointer
//! motion, so both must stay cheap as plugins are added.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ledge::scene::{SceneGraph, SurfaceId};
use ledge::toplevel::{horizontal_positions, LayoutParams, Rectangle, ToplevelRegistry};

/// Registry with `count` mapped windows of varying width.
fn populated_row(count: u64) -> (ToplevelRegistry, SceneGraph) {
    let mut scene = SceneGraph::new();
    let mut registry = ToplevelRegistry::new(LayoutParams::default());

    for i in 0..count {
        let Some(id) = registry.create(&mut scene, SurfaceId(i + 1)) else {
            continue;
        };
        let width = 20 + (i % 5) as i32 * 10;
        registry.on_commit(&mut scene, id, Rectangle::default());
        registry.on_commit(&mut scene, id, Rectangle::new(0, 0, width, 34));
        registry.map(&mut scene, id);
        if let Some(toplevel) = registry.get(id) {
            scene.set_buffer_size(toplevel.buffer_node, width, 34);
        }
    }
    (registry, scene)
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_layout");

    for window_count in [4u64, 16, 64].iter() {
        group.bench_with_input(
            format!("arrange_{}_windows", window_count),
            window_count,
            |b, &window_count| {
                b.iter_batched(
                    || populated_row(window_count),
                    |(registry, mut scene)| {
                        registry.arrange(&mut scene);
                        black_box(scene)
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.bench_function("offsets_64_widths", |b| {
        let widths: Vec<i32> = (0..64).map(|i| 20 + (i % 5) * 10).collect();
        b.iter(|| black_box(horizontal_positions(widths.iter().copied(), LayoutParams::default())));
    });

    group.finish();
}

fn bench_hit_test(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_test");

    for window_count in [4u64, 16, 64].iter() {
        let (_registry, scene) = populated_row(*window_count);
        group.bench_function(format!("sweep_{}_windows", window_count), |b| {
            b.iter(|| {
                for x in (0..2000).step_by(7) {
                    black_box(scene.hit_test(f64::from(x), 20.0));
                }
            });
        });
    }

    group.finish();
}

fn bench_render_list(c: &mut Criterion) {
    let (_registry, scene) = populated_row(16);
    c.bench_function("render_list_16_windows", |b| {
        b.iter(|| black_box(scene.render_list()));
    });
}

criterion_group!(benches, bench_layout, bench_hit_test, bench_render_list);
criterion_main!(benches);
