// Search throughput on a flat plane, a field of pits, and a 1-wide corridor
// with pits that force parkour jumps.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use voxel_pathfinder::goal::Goal;
use voxel_pathfinder::movement::MovementSet;
use voxel_pathfinder::search::{SearchBudget, search};
use voxel_pathfinder::types::{BlockKind, VoxelCoord};
use voxel_pathfinder::world::VoxelWorld;

fn plane(size: i32) -> VoxelWorld {
    let span = size as u32;
    let mut world = VoxelWorld::with_origin(VoxelCoord::new(0, -4, 0), span, 12, span);
    let far = VoxelCoord::new(size - 1, -1, size - 1);
    world.fill(VoxelCoord::new(0, -1, 0), far, BlockKind::Solid);
    world
}

/// Plane with a 2x2 pit every 6 blocks in both directions.
fn pitted(size: i32) -> VoxelWorld {
    let mut world = plane(size);
    for x in (3..size - 3).step_by(6) {
        for z in (3..size - 3).step_by(6) {
            let pit = VoxelCoord::new(x + 1, -1, z + 1);
            world.fill(VoxelCoord::new(x, -4, z), pit, BlockKind::Air);
        }
    }
    world
}

/// A walled 1-wide corridor along x with a 2-wide pit every 5 blocks.
fn corridor(length: i32) -> VoxelWorld {
    let mut world = VoxelWorld::with_origin(VoxelCoord::new(-1, -4, -2), length as u32 + 2, 12, 5);
    world.fill(VoxelCoord::new(-1, -1, -2), VoxelCoord::new(length, 3, 2), BlockKind::Solid);
    world.fill(VoxelCoord::new(0, 0, 0), VoxelCoord::new(length - 1, 3, 0), BlockKind::Air);
    for x in (4..length - 3).step_by(5) {
        world.fill(VoxelCoord::new(x, -4, 0), VoxelCoord::new(x + 1, -1, 0), BlockKind::Air);
    }
    world
}

fn bench_search(c: &mut Criterion) {
    let moves = MovementSet::default();
    let mut group = c.benchmark_group("voxel_pathfinder/search");

    let flat = plane(64);
    group.bench_function("plane_64_diagonal", |b| {
        b.iter(|| {
            let goal = Goal::block_at(VoxelCoord::new(60, 0, 60));
            let result = search(
                VoxelCoord::new(2, 0, 2),
                goal,
                &mut moves.over(&flat),
                SearchBudget::unlimited(),
            )
            .expect("valid goal");
            black_box(result.path.len());
        })
    });

    let pits = pitted(64);
    group.bench_function("pitted_64_diagonal", |b| {
        b.iter(|| {
            let goal = Goal::block_at(VoxelCoord::new(60, 0, 60));
            let result = search(
                VoxelCoord::new(1, 0, 1),
                goal,
                &mut moves.over(&pits),
                SearchBudget::unlimited(),
            )
            .expect("valid goal");
            black_box(result.path.len());
        })
    });

    let hall = corridor(64);
    group.bench_function("corridor_64_parkour", |b| {
        b.iter(|| {
            let goal = Goal::block_at(VoxelCoord::new(62, 0, 0));
            let result = search(
                VoxelCoord::new(0, 0, 0),
                goal,
                &mut moves.over(&hall),
                SearchBudget::unlimited(),
            )
            .expect("valid goal");
            black_box(result.path.len());
        })
    });

    group.bench_function("plane_64_reach", |b| {
        b.iter(|| {
            let goal = Goal::reach(VoxelCoord::new(48, 0, 10));
            let result = search(
                VoxelCoord::new(2, 0, 2),
                goal,
                &mut moves.over(&flat),
                SearchBudget::unlimited(),
            )
            .expect("valid goal");
            black_box(result.path.len());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
