use std::hint::black_box;
use std::time::Instant;

use glam::Vec2;
use topdown_common::{EntityId, Rect};
use topdown_partition::{MembershipTracker, UniformGrid};

const WORLD: i32 = 5000;
const CELL: i32 = 50;
const SPRITE: i32 = 32;

struct Mover {
    id: EntityId,
    pos: Vec2,
    vel: Vec2,
    tracker: MembershipTracker,
}

fn make_movers(count: usize) -> Vec<Mover> {
    let side = (count as f32).sqrt().ceil() as usize;
    let spacing = WORLD as f32 / (side as f32 + 1.0);
    (0..count)
        .map(|i| {
            let x = ((i % side) as f32 + 1.0) * spacing;
            let y = ((i / side) as f32 + 1.0) * spacing;
            let angle = i as f32 * 0.37;
            Mover {
                id: EntityId(i as u64),
                pos: Vec2::new(x, y),
                vel: Vec2::new(angle.cos(), angle.sin()) * 5.0,
                tracker: MembershipTracker::new(),
            }
        })
        .collect()
}

fn step(movers: &mut [Mover]) {
    for m in movers {
        m.pos = (m.pos + m.vel).clamp(Vec2::ZERO, Vec2::splat(WORLD as f32));
    }
}

fn bench_incremental(count: usize, ticks: usize) {
    let mut grid = UniformGrid::new(WORLD, CELL).expect("grid");
    let mut movers = make_movers(count);

    let start = Instant::now();
    for _ in 0..ticks {
        step(&mut movers);
        for m in &mut movers {
            let bounds = Rect::centered(m.pos, SPRITE, SPRITE);
            let delta = m.tracker.recompute(&bounds, m.pos, &grid);
            if !delta.is_empty() {
                grid.apply_delta(m.id, black_box(&delta));
            }
        }
    }
    let elapsed = start.elapsed();
    let per_tick = elapsed / ticks as u32;
    println!(
        "  incremental ({count} movers, {ticks} ticks): {per_tick:?}/tick, total {elapsed:?}"
    );
}

fn bench_full_rebuild(count: usize, ticks: usize) {
    let mut grid = UniformGrid::new(WORLD, CELL).expect("grid");
    let mut movers = make_movers(count);

    let start = Instant::now();
    for _ in 0..ticks {
        step(&mut movers);
        for m in &mut movers {
            let bounds = Rect::centered(m.pos, SPRITE, SPRITE);
            m.tracker.recompute(&bounds, m.pos, &grid);
        }
        grid.rebuild(movers.iter().map(|m| (m.id, m.tracker.current())));
        black_box(&grid);
    }
    let elapsed = start.elapsed();
    let per_tick = elapsed / ticks as u32;
    println!(
        "  full rebuild ({count} movers, {ticks} ticks): {per_tick:?}/tick, total {elapsed:?}"
    );
}

fn bench_query_neighbors(count: usize, iterations: usize) {
    let mut grid = UniformGrid::new(WORLD, CELL).expect("grid");
    let mut movers = make_movers(count);
    for m in &mut movers {
        let bounds = Rect::centered(m.pos, SPRITE, SPRITE);
        let delta = m.tracker.recompute(&bounds, m.pos, &grid);
        grid.apply_delta(m.id, &delta);
    }

    let start = Instant::now();
    for i in 0..iterations {
        let m = &movers[i % movers.len()];
        let _ = black_box(grid.query_neighbors(m.id, black_box(m.tracker.current())));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  neighbor query ({count} movers, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Partition Benchmarks ===\n");

    println!("Incremental delta updates:");
    bench_incremental(100, 1000);
    bench_incremental(1000, 100);
    bench_incremental(10000, 10);

    println!("\nFull rebuild every tick:");
    bench_full_rebuild(100, 1000);
    bench_full_rebuild(1000, 100);
    bench_full_rebuild(10000, 10);

    println!("\nNeighbor query:");
    bench_query_neighbors(1000, 10000);
    bench_query_neighbors(10000, 10000);

    println!("\n=== Done ===");
}
