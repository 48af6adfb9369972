//! Benchmarks for the per-frame relay and text mesh emission.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kelpo_engine::text::{append_text, FontAtlas};
use kelpo_engine::transform::{
    clip_space_matrix, duplicate, project_to_screen, rotate, screen_space_matrix, translate,
};
use kelpo_engine::{Batch, Texture, TextureRegistry, Triangle, Vertex};

/// A strip of `n` triangles spread over a unit-ish square around the origin.
fn make_mesh(n: usize) -> Batch<Triangle> {
    (0..n)
        .map(|i| {
            let fi = i as f32;
            let x = (fi * 0.37) % 2.0 - 1.0;
            let y = (fi * 0.61) % 2.0 - 1.0;
            let z = (fi * 0.13) % 2.0 - 1.0;
            Triangle::new([
                Vertex::at(x, y, z).with_color([255, 0, 0, 255]),
                Vertex::at(x + 0.1, y, z).with_color([0, 255, 0, 255]),
                Vertex::at(x, y + 0.1, z).with_color([0, 0, 255, 255]),
            ])
        })
        .collect()
}

fn bench_relay(c: &mut Criterion) {
    let clip = clip_space_matrix(60f32.to_radians(), 4.0 / 3.0, 0.1, 100.0);
    let screen_m = screen_space_matrix(640.0, 480.0);

    let mut group = c.benchmark_group("frame_relay");
    for &count in &[12, 1_000, 10_000, 100_000] {
        let source = make_mesh(count);
        let mut world = Batch::with_capacity(count);
        let mut screen = Batch::with_capacity(count);

        group.bench_with_input(BenchmarkId::from_parameter(count), &source, |b, source| {
            let mut angle = 0.0f32;
            b.iter(|| {
                world.clear();
                screen.clear();
                duplicate(source, &mut world).unwrap();
                rotate(&mut world, angle, angle * 0.5, 0.0);
                translate(&mut world, 0.0, 0.0, 4.0);
                black_box(project_to_screen(&world, &mut screen, &clip, &screen_m).unwrap());
                angle += 0.01;
            });
        });
    }
    group.finish();
}

fn bench_append_text(c: &mut Criterion) {
    let mut textures = TextureRegistry::new();
    let texture = Texture::create_from_rgb888(256, 256, &vec![255u8; 256 * 256 * 3]).unwrap();
    let atlas = FontAtlas::register(texture, &mut textures);
    let line = "FPS: 59.94  triangles: 12  renderer: software";
    let mut batch = Batch::with_capacity(line.len() * 2);

    c.bench_function("append_text_status_line", |b| {
        b.iter(|| {
            batch.clear();
            black_box(append_text(&mut batch, &atlas, black_box(line), 8.0, 8.0, [255; 4], 0.5).unwrap());
        });
    });
}

fn bench_push_copy(c: &mut Criterion) {
    let tri = Triangle::default();
    c.bench_function("batch_push_copy_10k", |b| {
        b.iter(|| {
            let mut batch: Batch<Triangle> = Batch::new();
            for _ in 0..10_000 {
                batch.push_copy(black_box(&tri)).unwrap();
            }
            black_box(batch.len());
        });
    });
}

criterion_group!(benches, bench_relay, bench_append_text, bench_push_copy);
criterion_main!(benches);
