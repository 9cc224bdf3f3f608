//! Visibility benchmarks for the cell arena server
//!
//! The per-client view refresh is a full linear scan of the world, so its
//! cost at various world sizes bounds how many sessions a tick can serve.
//!
//! Run with: cargo bench --bench visibility

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use cell_arena_server::game::constants::world as world_consts;
use cell_arena_server::game::world::{CellId, CellKind, Color, PlayerId, WorldState};
use cell_arena_server::net::visibility::collect_visible;
use cell_arena_server::net::viewport;
use cell_arena_server::util::rect::Rect;
use cell_arena_server::util::vec2::Vec2;

fn arena_border() -> Rect {
    Rect::new(
        world_consts::BORDER_LEFT,
        world_consts::BORDER_RIGHT,
        world_consts::BORDER_TOP,
        world_consts::BORDER_BOTTOM,
    )
}

/// Create a world with the given number of randomly placed food cells
fn create_world_with_cells(count: usize) -> WorldState {
    let border = arena_border();
    let mut world = WorldState::new(border);
    let mut rng = rand::thread_rng();

    for _ in 0..count {
        let position = Vec2::new(
            rng.gen_range(border.left..border.right),
            rng.gen_range(border.top..border.bottom),
        );
        world.spawn(
            CellKind::Food,
            None,
            position,
            world_consts::FOOD_MASS,
            Color::random(&mut rng),
        );
    }

    world
}

/// Benchmark the visibility scan at various world sizes
fn bench_collect_visible(c: &mut Criterion) {
    let mut group = c.benchmark_group("collect_visible");
    group.sample_size(50);

    for count in [500, 1_000, 2_500, 5_000, 10_000] {
        let world = create_world_with_cells(count);
        let view = Rect::from_center_half_extent(Vec2::new(3000.0, 3000.0), 1024.0);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("scan", count), &count, |b, _| {
            b.iter(|| black_box(collect_visible(black_box(&view), &world)));
        });
    }

    group.finish();
}

/// Benchmark viewport math for sessions owning many cells
fn bench_viewport_math(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewport");

    for count in [1usize, 8, 32] {
        let mut world = create_world_with_cells(100);
        let owner = PlayerId::new_v4();
        let mut rng = rand::thread_rng();
        let cells: Vec<CellId> = (0..count)
            .map(|_| {
                world.spawn(
                    CellKind::Player,
                    Some(owner),
                    Vec2::new(rng.gen_range(0.0..6000.0), rng.gen_range(0.0..6000.0)),
                    world_consts::START_MASS,
                    Color::random(&mut rng),
                )
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("sight_and_center", count), &count, |b, _| {
            b.iter(|| {
                let radius = viewport::sight_radius(&cells, &world, 1024.0, 0.4);
                let center = viewport::view_center(&cells, &world, Vec2::ZERO);
                black_box(viewport::view_box(center, radius))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_collect_visible, bench_viewport_math);
criterion_main!(benches);
