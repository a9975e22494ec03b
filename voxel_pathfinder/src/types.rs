// Core types shared across the pathfinder.
//
// Defines lattice coordinates (`VoxelCoord`), the four horizontal facings
// used by directional movement rules (`Facing`), and the block taxonomy the
// pathfinder understands (`BlockKind`). All types derive `Serialize` and
// `Deserialize` so paths, goals and configs can be snapshotted as JSON.
//
// See also: `world.rs` for the block query boundary built on `BlockKind`,
// `movement.rs` for the offset builders that walk `VoxelCoord`s relative to
// a `Facing`, `search.rs` which keys its node table by `VoxelCoord::packed`.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A lattice cell in the block world. Each component is in block units.
///
/// The coordinate system uses right-handed conventions:
/// - X: east  (positive) / west  (negative)
/// - Y: up    (positive) / down  (negative)
/// - Z: south (positive) / north (negative)
///
/// When a coordinate names an agent's position it is the *feet* cell: the
/// agent occupies this cell and the one above it, and stands on the cell
/// below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Bits per axis in `VoxelCoord::packed`. Coordinates must lie in
/// `[-2^20, 2^20)` on every axis for packed keys to be unique.
const PACK_BITS: u32 = 21;
const PACK_MASK: u64 = (1 << PACK_BITS) - 1;

impl VoxelCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell containing a continuous world-space point.
    pub fn containing(point: Vec3) -> Self {
        Self::new(
            point.x.floor() as i32,
            point.y.floor() as i32,
            point.z.floor() as i32,
        )
    }

    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    pub const fn up(self, n: i32) -> Self {
        self.offset(0, n, 0)
    }

    pub const fn down(self, n: i32) -> Self {
        self.offset(0, -n, 0)
    }

    /// Point at the horizontal centre of the cell, at floor height.
    pub fn floor_center(self) -> Vec3 {
        Vec3::new(self.x as f32 + 0.5, self.y as f32, self.z as f32 + 0.5)
    }

    /// Pack the three axes into one integer key (21 bits each, two's
    /// complement truncated). Used by the search's node table.
    pub fn packed(self) -> u64 {
        ((self.x as u64 & PACK_MASK) << (2 * PACK_BITS))
            | ((self.y as u64 & PACK_MASK) << PACK_BITS)
            | (self.z as u64 & PACK_MASK)
    }
}

impl fmt::Display for VoxelCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One of the four horizontal headings a directional movement rule is
/// evaluated in. `forward` and `right` offsets are taken relative to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    /// All facings in evaluation order.
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Unit (dx, dz) step when moving forward.
    pub const fn forward_step(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    /// Unit (dx, dz) step to the right (clockwise seen from above).
    pub const fn right_step(self) -> (i32, i32) {
        let (dx, dz) = self.forward_step();
        (-dz, dx)
    }
}

// ---------------------------------------------------------------------------
// Block types
// ---------------------------------------------------------------------------

/// What occupies a single lattice cell, as far as movement is concerned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Air,
    /// Full collision cube; can be stood on.
    Solid,
    /// Liquid: passable, swimmable.
    Water,
    /// Climbable, passable.
    Ladder,
}

impl BlockKind {
    pub fn is_solid(self) -> bool {
        self == BlockKind::Solid
    }

    /// Anything the agent's body may occupy.
    pub fn is_passable(self) -> bool {
        !self.is_solid()
    }
}
