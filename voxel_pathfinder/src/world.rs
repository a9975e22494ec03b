// Block query boundary and a dense reference grid.
//
// The pathfinder never owns the world. Everything it needs is a single
// query, "what occupies this lattice cell?", expressed by the `BlockSource`
// trait. The movement predicates (`is_walkable`, `is_standable`,
// `is_jumpable`, ...) are provided methods layered on that one query, so a
// host only implements `block()`.
//
// `VoxelWorld` is a dense 3D grid implementing `BlockSource`, used for
// headless runs, tests and benches. It is stored as a flat `Vec<BlockKind>`
// indexed by `x + z * size_x + y * size_x * size_z` relative to an integer
// origin, so negative coordinates are addressable. Out-of-bounds reads
// return `Air`; out-of-bounds writes are no-ops.
//
// See also: `movement.rs` which evaluates rule preconditions through these
// predicates, `physics.rs` which collides the agent's box against
// `is_solid` cells.

use crate::types::{BlockKind, VoxelCoord};

/// Host-provided block lookup. Implementors supply `block()`; the movement
/// predicates are derived from it.
///
/// Predicates take the agent's *feet* cell: a 2-tall agent at `p` occupies
/// `p` and `p.up(1)` and stands on `p.down(1)`.
pub trait BlockSource {
    fn block(&self, pos: VoxelCoord) -> BlockKind;

    fn is_air(&self, pos: VoxelCoord) -> bool {
        self.block(pos) == BlockKind::Air
    }

    fn is_water(&self, pos: VoxelCoord) -> bool {
        self.block(pos) == BlockKind::Water
    }

    fn is_ladder(&self, pos: VoxelCoord) -> bool {
        self.block(pos) == BlockKind::Ladder
    }

    fn is_solid(&self, pos: VoxelCoord) -> bool {
        self.block(pos).is_solid()
    }

    fn is_passable(&self, pos: VoxelCoord) -> bool {
        self.block(pos).is_passable()
    }

    /// Body fits: the cell and the one above are passable.
    fn is_walkable(&self, pos: VoxelCoord) -> bool {
        self.is_passable(pos) && self.is_passable(pos.up(1))
    }

    /// Body fits and there is a solid floor below.
    fn is_standable(&self, pos: VoxelCoord) -> bool {
        self.is_solid(pos.down(1)) && self.is_walkable(pos)
    }

    /// Body fits with one extra cell of headroom for a jump arc.
    fn is_jumpable(&self, pos: VoxelCoord) -> bool {
        self.is_walkable(pos) && self.is_passable(pos.up(2))
    }
}

impl<T: BlockSource + ?Sized> BlockSource for &T {
    fn block(&self, pos: VoxelCoord) -> BlockKind {
        (**self).block(pos)
    }
}

/// Dense 3D block grid anchored at `origin`.
#[derive(Clone, Debug, Default)]
pub struct VoxelWorld {
    /// Flat storage: index = x + z * size_x + y * size_x * size_z (local coords).
    blocks: Vec<BlockKind>,
    /// World coordinate of local cell (0, 0, 0).
    pub origin: VoxelCoord,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: u32,
}

impl VoxelWorld {
    /// Create a new world filled with `Air`, with local (0, 0, 0) at the
    /// world origin.
    pub fn new(size_x: u32, size_y: u32, size_z: u32) -> Self {
        Self::with_origin(VoxelCoord::new(0, 0, 0), size_x, size_y, size_z)
    }

    /// Create a new world filled with `Air` whose minimum corner is `origin`.
    pub fn with_origin(origin: VoxelCoord, size_x: u32, size_y: u32, size_z: u32) -> Self {
        let total = (size_x as usize) * (size_y as usize) * (size_z as usize);
        Self {
            blocks: vec![BlockKind::Air; total],
            origin,
            size_x,
            size_y,
            size_z,
        }
    }

    /// Check whether a coordinate is within bounds.
    pub fn in_bounds(&self, coord: VoxelCoord) -> bool {
        let x = coord.x - self.origin.x;
        let y = coord.y - self.origin.y;
        let z = coord.z - self.origin.z;
        x >= 0
            && y >= 0
            && z >= 0
            && (x as u32) < self.size_x
            && (y as u32) < self.size_y
            && (z as u32) < self.size_z
    }

    /// Convert a coordinate to a flat index. Returns `None` if out of bounds.
    fn index(&self, coord: VoxelCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            let x = (coord.x - self.origin.x) as usize;
            let y = (coord.y - self.origin.y) as usize;
            let z = (coord.z - self.origin.z) as usize;
            let sx = self.size_x as usize;
            let sz = self.size_z as usize;
            Some(x + z * sx + y * sx * sz)
        } else {
            None
        }
    }

    /// Read a block. Returns `Air` for out-of-bounds coordinates.
    pub fn get(&self, coord: VoxelCoord) -> BlockKind {
        self.index(coord)
            .map(|i| self.blocks[i])
            .unwrap_or(BlockKind::Air)
    }

    /// Write a block. No-op for out-of-bounds coordinates.
    pub fn set(&mut self, coord: VoxelCoord, block: BlockKind) {
        if let Some(i) = self.index(coord) {
            self.blocks[i] = block;
        }
    }

    /// Fill the inclusive box spanned by `a` and `b`.
    pub fn fill(&mut self, a: VoxelCoord, b: VoxelCoord, block: BlockKind) {
        for y in a.y.min(b.y)..=a.y.max(b.y) {
            for z in a.z.min(b.z)..=a.z.max(b.z) {
                for x in a.x.min(b.x)..=a.x.max(b.x) {
                    self.set(VoxelCoord::new(x, y, z), block);
                }
            }
        }
    }

    /// Number of cells holding `block`.
    pub fn count(&self, block: BlockKind) -> usize {
        self.blocks.iter().filter(|&&b| b == block).count()
    }
}

impl BlockSource for VoxelWorld {
    fn block(&self, pos: VoxelCoord) -> BlockKind {
        self.get(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_world_is_all_air() {
        let world = VoxelWorld::new(4, 4, 4);
        assert_eq!(world.count(BlockKind::Air), 64);
        assert_eq!(world.get(VoxelCoord::new(2, 2, 2)), BlockKind::Air);
    }

    #[test]
    fn default_world_is_empty_at_origin() {
        let mut world = VoxelWorld::default();
        assert_eq!(world.origin, VoxelCoord::new(0, 0, 0));
        assert!(!world.in_bounds(VoxelCoord::new(0, 0, 0)));
        world.set(VoxelCoord::new(0, 0, 0), BlockKind::Solid);
        assert_eq!(world.get(VoxelCoord::new(0, 0, 0)), BlockKind::Air);
    }

    #[test]
    fn set_and_get() {
        let mut world = VoxelWorld::new(8, 8, 8);
        let coord = VoxelCoord::new(3, 5, 2);
        world.set(coord, BlockKind::Solid);
        assert_eq!(world.get(coord), BlockKind::Solid);
        // Neighbors are still air.
        assert_eq!(world.get(VoxelCoord::new(3, 5, 3)), BlockKind::Air);
    }

    #[test]
    fn out_of_bounds_read_returns_air() {
        let world = VoxelWorld::new(4, 4, 4);
        assert_eq!(world.get(VoxelCoord::new(-1, 0, 0)), BlockKind::Air);
        assert_eq!(world.get(VoxelCoord::new(0, 4, 0)), BlockKind::Air);
        assert_eq!(world.get(VoxelCoord::new(100, 100, 100)), BlockKind::Air);
    }

    #[test]
    fn out_of_bounds_write_is_noop() {
        let mut world = VoxelWorld::new(4, 4, 4);
        world.set(VoxelCoord::new(-1, 0, 0), BlockKind::Solid);
        world.set(VoxelCoord::new(100, 0, 0), BlockKind::Solid);
        assert_eq!(world.count(BlockKind::Solid), 0);
    }

    #[test]
    fn origin_makes_negative_coords_addressable() {
        let mut world = VoxelWorld::with_origin(VoxelCoord::new(-4, -4, -4), 8, 8, 8);
        let coord = VoxelCoord::new(-4, -1, 3);
        assert!(world.in_bounds(coord));
        world.set(coord, BlockKind::Water);
        assert_eq!(world.get(coord), BlockKind::Water);
        assert!(!world.in_bounds(VoxelCoord::new(4, 0, 0)));
    }

    #[test]
    fn indexing_is_correct() {
        let mut world = VoxelWorld::new(10, 8, 6);
        let coord = VoxelCoord::new(5, 3, 4);
        world.set(coord, BlockKind::Ladder);
        assert_eq!(world.get(coord), BlockKind::Ladder);
        assert_eq!(world.get(VoxelCoord::new(4, 3, 4)), BlockKind::Air);
        assert_eq!(world.get(VoxelCoord::new(5, 2, 4)), BlockKind::Air);
        assert_eq!(world.get(VoxelCoord::new(5, 3, 3)), BlockKind::Air);
        assert_eq!(world.count(BlockKind::Ladder), 1);
    }

    #[test]
    fn fill_covers_inclusive_box_in_any_corner_order() {
        let mut world = VoxelWorld::new(8, 8, 8);
        world.fill(VoxelCoord::new(3, 1, 3), VoxelCoord::new(1, 0, 2), BlockKind::Solid);
        assert_eq!(world.count(BlockKind::Solid), 3 * 2 * 2);
    }

    #[test]
    fn standable_needs_floor_and_headroom() {
        let mut world = VoxelWorld::new(4, 6, 4);
        world.fill(VoxelCoord::new(0, 0, 0), VoxelCoord::new(3, 0, 3), BlockKind::Solid);
        let feet = VoxelCoord::new(1, 1, 1);
        assert!(world.is_standable(feet));
        assert!(world.is_jumpable(feet));

        world.set(feet.up(1), BlockKind::Solid);
        assert!(!world.is_standable(feet));
        assert!(!world.is_walkable(feet));

        // Floating cell: walkable but not standable.
        assert!(world.is_walkable(VoxelCoord::new(2, 3, 2)));
        assert!(!world.is_standable(VoxelCoord::new(2, 3, 2)));
    }

    #[test]
    fn jumpable_needs_arc_clearance() {
        let mut world = VoxelWorld::new(4, 6, 4);
        let feet = VoxelCoord::new(1, 1, 1);
        assert!(world.is_jumpable(feet));
        world.set(feet.up(2), BlockKind::Solid);
        assert!(world.is_walkable(feet));
        assert!(!world.is_jumpable(feet));
    }

    #[test]
    fn water_and_ladders_are_passable() {
        let mut world = VoxelWorld::new(4, 4, 4);
        world.set(VoxelCoord::new(1, 1, 1), BlockKind::Water);
        world.set(VoxelCoord::new(1, 2, 1), BlockKind::Ladder);
        assert!(world.is_walkable(VoxelCoord::new(1, 1, 1)));
        assert!(world.is_water(VoxelCoord::new(1, 1, 1)));
        assert!(world.is_ladder(VoxelCoord::new(1, 2, 1)));
        assert!(!world.is_air(VoxelCoord::new(1, 2, 1)));
    }
}
