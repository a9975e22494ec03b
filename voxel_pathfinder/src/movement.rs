// Movement rules: lazy neighbor generation for the search.
//
// A movement rule is a pure precondition chain over block predicates: given
// an origin cell and a facing, it either emits a candidate `Transition`
// (landing cell + traversal cost) or nothing. Rules never see search state
// (g, h, open/closed sets) and never mutate anything, which is what lets the
// rule set grow independently of `search.rs`.
//
// Rules are variants of the `MoveKind` enum, dispatched by `match` in
// `MoveKind::add_candidates`. A `MovementSet` is the registry: an ordered
// list of kinds built once from `MovementConfig`. The neighbor set of a cell
// is the concatenation of every registered rule's output in registration
// order. Directional rules run once per `Facing` (so a "forward, right"
// rule covers all four diagonals); vertical-only rules run once.
//
// Geometry is expressed with `Probe`s: composable offset builders
// (`forward(n)`, `right(n)`, `up(n)`, `down(n)`) relative to the origin and
// facing. Parkour rules require a real gap: every intermediate column must
// have no floor under it and clearance for the jump arc.
//
// Costs encode distance, time and risk; aerial moves cost more than their
// straight-line length. See DESIGN.md for the full cost table.
//
// See also: `world.rs` for the predicates, `search.rs` which consumes
// `Neighbors`, `executor.rs` which physically performs the moves.

use crate::config::MovementConfig;
use crate::types::{Facing, VoxelCoord};
use crate::world::BlockSource;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f32::consts::SQRT_2;

/// A candidate move out of some origin cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub target: VoxelCoord,
    /// Non-negative traversal cost.
    pub cost: f32,
    pub kind: MoveKind,
}

/// Per-origin candidate buffer.
pub type Candidates = SmallVec<[Transition; 32]>;

/// Source of candidate transitions, consumed by the search.
pub trait Neighbors {
    /// Append every transition out of `origin` to `out`.
    fn neighbors(&mut self, origin: VoxelCoord, out: &mut Candidates);
}

impl<F> Neighbors for F
where
    F: FnMut(VoxelCoord, &mut Candidates),
{
    fn neighbors(&mut self, origin: VoxelCoord, out: &mut Candidates) {
        self(origin, out)
    }
}

// ---------------------------------------------------------------------------
// Offset builders
// ---------------------------------------------------------------------------

/// A cell reached by offsets relative to a facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Probe {
    pos: VoxelCoord,
    facing: Facing,
}

impl Probe {
    pub fn new(pos: VoxelCoord, facing: Facing) -> Self {
        Self { pos, facing }
    }

    pub fn pos(self) -> VoxelCoord {
        self.pos
    }

    pub fn forward(self, n: i32) -> Self {
        let (dx, dz) = self.facing.forward_step();
        Self::new(self.pos.offset(dx * n, 0, dz * n), self.facing)
    }

    pub fn right(self, n: i32) -> Self {
        let (dx, dz) = self.facing.right_step();
        Self::new(self.pos.offset(dx * n, 0, dz * n), self.facing)
    }

    pub fn up(self, n: i32) -> Self {
        Self::new(self.pos.up(n), self.facing)
    }

    pub fn down(self, n: i32) -> Self {
        Self::new(self.pos.down(n), self.facing)
    }
}

/// What a rule sees: the world, an origin and a facing.
pub struct MoveContext<'a, W: BlockSource + ?Sized> {
    world: &'a W,
    origin: Probe,
}

impl<'a, W: BlockSource + ?Sized> MoveContext<'a, W> {
    pub fn new(world: &'a W, origin: VoxelCoord, facing: Facing) -> Self {
        Self {
            world,
            origin: Probe::new(origin, facing),
        }
    }

    pub fn origin(&self) -> Probe {
        self.origin
    }

    pub fn forward(&self, n: i32) -> Probe {
        self.origin.forward(n)
    }

    pub fn right(&self, n: i32) -> Probe {
        self.origin.right(n)
    }

    pub fn up(&self, n: i32) -> Probe {
        self.origin.up(n)
    }

    pub fn down(&self, n: i32) -> Probe {
        self.origin.down(n)
    }

    pub fn is_air(&self, p: Probe) -> bool {
        self.world.is_air(p.pos)
    }

    pub fn is_water(&self, p: Probe) -> bool {
        self.world.is_water(p.pos)
    }

    pub fn is_ladder(&self, p: Probe) -> bool {
        self.world.is_ladder(p.pos)
    }

    pub fn is_passable(&self, p: Probe) -> bool {
        self.world.is_passable(p.pos)
    }

    pub fn is_walkable(&self, p: Probe) -> bool {
        self.world.is_walkable(p.pos)
    }

    pub fn is_standable(&self, p: Probe) -> bool {
        self.world.is_standable(p.pos)
    }

    pub fn is_jumpable(&self, p: Probe) -> bool {
        self.world.is_jumpable(p.pos)
    }

    /// A column to leap over: no floor below it, arc clearance above.
    pub fn is_gap(&self, p: Probe) -> bool {
        self.is_passable(p.down(1)) && self.is_jumpable(p)
    }

    fn emit(&self, out: &mut Candidates, target: Probe, cost: f32, kind: MoveKind) {
        out.push(Transition {
            target: target.pos,
            cost,
            kind,
        });
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    Forward,
    ForwardUp,
    ForwardDown,
    Diagonal,
    DiagonalUp,
    DiagonalDown,
    Parkour1,
    Parkour2,
    Parkour3,
    ParkourUp1,
    ParkourUp2,
    ParkourUp3,
    ParkourDown1,
    ParkourDown2,
    ParkourDown3,
    DiagonalParkour,
    DiagonalUpParkour,
    DiagonalDownParkour,
    SemiDiagonalParkour,
    LadderUp,
    LadderDown,
    SwimForward,
    SwimDiagonal,
    SwimUp,
    SwimDown,
    SwimForwardUp,
    SwimForwardDown,
}

impl MoveKind {
    pub const BASIC: &'static [MoveKind] = &[
        MoveKind::Forward,
        MoveKind::ForwardUp,
        MoveKind::ForwardDown,
        MoveKind::Diagonal,
        MoveKind::DiagonalUp,
        MoveKind::DiagonalDown,
    ];

    pub const PARKOUR: &'static [MoveKind] = &[
        MoveKind::Parkour1,
        MoveKind::Parkour2,
        MoveKind::Parkour3,
        MoveKind::ParkourUp1,
        MoveKind::ParkourUp2,
        MoveKind::ParkourUp3,
        MoveKind::ParkourDown1,
        MoveKind::ParkourDown2,
        MoveKind::ParkourDown3,
        MoveKind::DiagonalParkour,
        MoveKind::DiagonalUpParkour,
        MoveKind::DiagonalDownParkour,
        MoveKind::SemiDiagonalParkour,
    ];

    pub const LADDER: &'static [MoveKind] = &[MoveKind::LadderUp, MoveKind::LadderDown];

    pub const SWIM: &'static [MoveKind] = &[
        MoveKind::SwimForward,
        MoveKind::SwimDiagonal,
        MoveKind::SwimUp,
        MoveKind::SwimDown,
        MoveKind::SwimForwardUp,
        MoveKind::SwimForwardDown,
    ];

    /// Vertical-only rules ignore facing and are evaluated once per origin.
    pub fn is_directional(self) -> bool {
        !matches!(
            self,
            MoveKind::LadderUp | MoveKind::LadderDown | MoveKind::SwimUp | MoveKind::SwimDown
        )
    }

    /// Whether executing this move leaves the ground on purpose.
    pub fn is_jump(self) -> bool {
        Self::PARKOUR.contains(&self)
    }

    /// Evaluate this rule's preconditions and append its candidates.
    pub fn add_candidates<W: BlockSource + ?Sized>(
        self,
        ctx: &MoveContext<'_, W>,
        out: &mut Candidates,
    ) {
        match self {
            MoveKind::Forward => {
                let land = ctx.forward(1);
                if ctx.is_standable(land) {
                    ctx.emit(out, land, 1.0, self);
                }
            }
            MoveKind::ForwardUp => {
                let land = ctx.forward(1).up(1);
                if ctx.is_walkable(ctx.up(1))
                    && ctx.is_standable(land)
                    && ctx.is_standable(ctx.origin())
                {
                    ctx.emit(out, land, 3.0, self);
                }
            }
            MoveKind::ForwardDown => {
                let column = ctx.forward(1);
                if !ctx.is_walkable(column) || ctx.is_standable(column) {
                    return;
                }
                for drop in 1..=4 {
                    let land = column.down(drop);
                    if !ctx.is_passable(land) {
                        break;
                    }
                    if ctx.is_standable(land) {
                        ctx.emit(out, land, 3.0 + drop as f32, self);
                        break;
                    }
                }
            }
            MoveKind::Diagonal => {
                let land = ctx.right(1).forward(1);
                if (ctx.is_walkable(ctx.right(1)) || ctx.is_walkable(ctx.forward(1)))
                    && ctx.is_standable(land)
                {
                    ctx.emit(out, land, SQRT_2, self);
                }
            }
            MoveKind::DiagonalUp => {
                let land = ctx.right(1).forward(1).up(1);
                let side_open = ctx.is_jumpable(ctx.right(1).up(1))
                    || ctx.is_jumpable(ctx.forward(1).up(1));
                if side_open
                    && ctx.is_walkable(ctx.origin())
                    && ctx.is_walkable(ctx.up(1))
                    && ctx.is_standable(land)
                {
                    ctx.emit(out, land, SQRT_2 * 2.5, self);
                }
            }
            MoveKind::DiagonalDown => {
                let column = ctx.right(1).forward(1);
                let side_open = ctx.is_walkable(ctx.right(1)) || ctx.is_walkable(ctx.forward(1));
                if !side_open || !ctx.is_walkable(column) || ctx.is_standable(column) {
                    return;
                }
                for drop in 1..=3 {
                    let land = column.down(drop);
                    if !ctx.is_passable(land) {
                        break;
                    }
                    if ctx.is_standable(land) {
                        ctx.emit(out, land, SQRT_2 * 1.5 + drop as f32 * 2.0, self);
                        break;
                    }
                }
            }
            MoveKind::Parkour1 => straight_jump(ctx, out, self, 1, 0, 1.5),
            MoveKind::Parkour2 => straight_jump(ctx, out, self, 2, 0, 2.5),
            MoveKind::Parkour3 => straight_jump(ctx, out, self, 3, 0, 4.0),
            MoveKind::ParkourUp1 => straight_jump(ctx, out, self, 1, 1, 1.5),
            MoveKind::ParkourUp2 => straight_jump(ctx, out, self, 2, 1, 3.03),
            MoveKind::ParkourUp3 => straight_jump(ctx, out, self, 3, 1, 5.0),
            MoveKind::ParkourDown1 => straight_jump(ctx, out, self, 1, -1, 1.0),
            MoveKind::ParkourDown2 => straight_jump(ctx, out, self, 2, -1, 2.0),
            MoveKind::ParkourDown3 => straight_jump(ctx, out, self, 3, -1, 4.0),
            MoveKind::DiagonalParkour => {
                let land = ctx.right(2).forward(2);
                let near_open = ctx.is_jumpable(ctx.right(1)) || ctx.is_jumpable(ctx.forward(1));
                let far_open = ctx.is_jumpable(ctx.right(2).forward(1))
                    || ctx.is_jumpable(ctx.right(1).forward(2));
                if ctx.is_standable(ctx.origin())
                    && ctx.is_gap(ctx.right(1).forward(1))
                    && near_open
                    && far_open
                    && ctx.is_standable(land)
                {
                    ctx.emit(out, land, 3.04, self);
                }
            }
            MoveKind::DiagonalUpParkour => {
                let land = ctx.right(2).forward(2).up(1);
                let near_open = ctx.is_jumpable(ctx.right(1)) || ctx.is_jumpable(ctx.forward(1));
                let far_open = ctx.is_jumpable(ctx.right(2).forward(1).up(1))
                    || ctx.is_jumpable(ctx.right(1).forward(2).up(1));
                if ctx.is_standable(ctx.origin())
                    && ctx.is_gap(ctx.right(1).forward(1))
                    && ctx.is_jumpable(ctx.right(1).forward(1).up(1))
                    && near_open
                    && far_open
                    && ctx.is_standable(land)
                {
                    ctx.emit(out, land, 3.01, self);
                }
            }
            MoveKind::DiagonalDownParkour => {
                let land = ctx.right(2).forward(2).down(1);
                let near_open = ctx.is_walkable(ctx.right(1)) || ctx.is_walkable(ctx.forward(1));
                let far_open = ctx.is_walkable(ctx.right(2).forward(1))
                    || ctx.is_walkable(ctx.right(1).forward(2));
                if ctx.is_standable(ctx.origin())
                    && ctx.is_gap(ctx.right(1).forward(1))
                    && near_open
                    && far_open
                    && ctx.is_standable(land)
                {
                    ctx.emit(out, land, 2.0, self);
                }
            }
            MoveKind::SemiDiagonalParkour => {
                // Knight's-move leap:   . L
                //                       . .
                //                       O .
                let land = ctx.right(1).forward(2);
                let first = ctx.is_jumpable(ctx.right(1)) || ctx.is_jumpable(ctx.forward(1));
                let second =
                    ctx.is_jumpable(ctx.right(1).forward(1)) || ctx.is_jumpable(ctx.forward(2));
                let bridge =
                    ctx.is_jumpable(ctx.forward(1)) || ctx.is_jumpable(ctx.right(1).forward(1));
                let gapped = ctx.is_passable(ctx.forward(1).down(1))
                    && ctx.is_passable(ctx.right(1).forward(1).down(1));
                if ctx.is_standable(ctx.origin())
                    && first
                    && second
                    && bridge
                    && gapped
                    && ctx.is_standable(land)
                {
                    ctx.emit(out, land, 3.02, self);
                }
            }
            MoveKind::LadderUp => {
                let land = ctx.up(1);
                let on_ladder = ctx.is_ladder(ctx.origin()) || ctx.is_ladder(land);
                if on_ladder && ctx.is_walkable(land) {
                    ctx.emit(out, land, 2.0, self);
                }
            }
            MoveKind::LadderDown => {
                let land = ctx.down(1);
                let on_ladder = ctx.is_ladder(ctx.origin()) || ctx.is_ladder(land);
                if on_ladder && ctx.is_passable(land) {
                    ctx.emit(out, land, 2.0, self);
                }
            }
            MoveKind::SwimForward => {
                let land = ctx.forward(1);
                if ctx.is_water(land) {
                    ctx.emit(out, land, 5.0, self);
                }
            }
            MoveKind::SwimDiagonal => {
                let land = ctx.right(1).forward(1);
                let side_open = ctx.is_water(ctx.right(1)) || ctx.is_water(ctx.forward(1));
                if side_open && ctx.is_water(land) {
                    ctx.emit(out, land, 5.0 * SQRT_2, self);
                }
            }
            MoveKind::SwimUp => {
                let land = ctx.up(1);
                if ctx.is_water(ctx.origin()) && ctx.is_water(land) {
                    ctx.emit(out, land, 4.0, self);
                }
            }
            MoveKind::SwimDown => {
                let land = ctx.down(1);
                if ctx.is_water(land) {
                    ctx.emit(out, land, 10.0, self);
                }
            }
            MoveKind::SwimForwardUp => {
                let land = ctx.forward(1).up(1);
                if ctx.is_water(ctx.origin())
                    && ctx.is_walkable(ctx.up(1))
                    && ctx.is_standable(land)
                {
                    ctx.emit(out, land, 5.0, self);
                }
            }
            MoveKind::SwimForwardDown => {
                let land = ctx.forward(1).down(1);
                if ctx.is_standable(ctx.origin()) && ctx.is_water(land) {
                    ctx.emit(out, land, 10.0, self);
                }
            }
        }
    }
}

/// Straight leap over `gaps` floorless columns, landing `rise` cells higher
/// (or lower when negative) on the column after them.
fn straight_jump<W: BlockSource + ?Sized>(
    ctx: &MoveContext<'_, W>,
    out: &mut Candidates,
    kind: MoveKind,
    gaps: i32,
    rise: i32,
    cost: f32,
) {
    if !ctx.is_standable(ctx.origin()) {
        return;
    }
    for k in 1..=gaps {
        let column = ctx.forward(k);
        if !ctx.is_gap(column) {
            return;
        }
        if rise > 0 && !ctx.is_jumpable(column.up(rise)) {
            return;
        }
    }
    let land = ctx.forward(gaps + 1).up(rise);
    if ctx.is_standable(land) {
        ctx.emit(out, land, cost, kind);
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Ordered registry of movement rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovementSet {
    rules: Vec<MoveKind>,
}

impl Default for MovementSet {
    fn default() -> Self {
        Self::from_config(&MovementConfig::default())
    }
}

impl MovementSet {
    pub fn new(rules: Vec<MoveKind>) -> Self {
        Self { rules }
    }

    /// Walking rules only.
    pub fn basic() -> Self {
        Self::new(MoveKind::BASIC.to_vec())
    }

    /// Registry order: basic, parkour, ladder, swim.
    pub fn from_config(config: &MovementConfig) -> Self {
        let mut rules = MoveKind::BASIC.to_vec();
        if config.allow_parkour {
            rules.extend_from_slice(MoveKind::PARKOUR);
        }
        if config.allow_ladders {
            rules.extend_from_slice(MoveKind::LADDER);
        }
        if config.allow_swimming {
            rules.extend_from_slice(MoveKind::SWIM);
        }
        Self { rules }
    }

    /// Add a rule at the end of the registry.
    pub fn register(&mut self, kind: MoveKind) {
        if !self.rules.contains(&kind) {
            self.rules.push(kind);
        }
    }

    pub fn rules(&self) -> &[MoveKind] {
        &self.rules
    }

    /// Append every candidate out of `origin`, in registration order.
    pub fn candidates<W: BlockSource + ?Sized>(
        &self,
        world: &W,
        origin: VoxelCoord,
        out: &mut Candidates,
    ) {
        for &rule in &self.rules {
            if rule.is_directional() {
                for facing in Facing::ALL {
                    rule.add_candidates(&MoveContext::new(world, origin, facing), out);
                }
            } else {
                rule.add_candidates(&MoveContext::new(world, origin, Facing::North), out);
            }
        }
    }

    /// Bind the registry to a world as a search neighbor source.
    pub fn over<'a, W: BlockSource + ?Sized>(&'a self, world: &'a W) -> MovementGraph<'a, W> {
        MovementGraph { moves: self, world }
    }
}

/// A `MovementSet` bound to a world.
pub struct MovementGraph<'a, W: BlockSource + ?Sized> {
    pub moves: &'a MovementSet,
    pub world: &'a W,
}

impl<W: BlockSource + ?Sized> Neighbors for MovementGraph<'_, W> {
    fn neighbors(&mut self, origin: VoxelCoord, out: &mut Candidates) {
        self.moves.candidates(self.world, origin, out);
    }
}
