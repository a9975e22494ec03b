// Test-only harness for end-to-end pathfinder tests.
//
// Wraps a real `Pathfinder` and a real `SimulatedAgent` (reference block
// physics in a `VoxelWorld`) and drives them the way a host would: one
// `Pathfinder::tick` followed by one physics step, repeated. Every emitted
// event and every agent state is recorded so tests can assert on the whole
// run afterwards.
//
// Also provides the small world builders the scenarios share. All worlds
// have their floor at y = -1, so agents stand at y = 0.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use voxel_pathfinder::agent::{AgentState, SimulatedAgent};
use voxel_pathfinder::config::PathfinderConfig;
use voxel_pathfinder::coordinator::{GoToOptions, Pathfinder};
use voxel_pathfinder::event::{PathEvent, PathEventKind};
use voxel_pathfinder::goal::Goal;
use voxel_pathfinder::types::{BlockKind, VoxelCoord};
use voxel_pathfinder::world::VoxelWorld;

/// Default tick ceiling for a single intent.
pub const MAX_TICKS: u32 = 2000;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A pathfinder and the agent it drives, plus everything they produced.
pub struct TestRun {
    pub pathfinder: Pathfinder,
    pub agent: SimulatedAgent,
    pub events: Vec<PathEvent>,
    /// Agent state after every physics step.
    pub trace: Vec<AgentState>,
}

impl TestRun {
    pub fn new(world: VoxelWorld, start: VoxelCoord, config: PathfinderConfig) -> Self {
        let physics = config.physics.clone();
        Self {
            pathfinder: Pathfinder::new(config),
            agent: SimulatedAgent::new(world, physics, AgentState::standing_on(start)),
            events: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Issue a `go_to` for a block goal, panicking on a rejected goal.
    pub fn go_to_block(&mut self, cell: VoxelCoord, options: GoToOptions) -> u64 {
        self.go_to(Goal::block_at(cell), options)
    }

    pub fn go_to(&mut self, goal: Goal, options: GoToOptions) -> u64 {
        self.pathfinder
            .go_to(&self.agent, goal, options)
            .expect("go_to rejected the goal")
    }

    /// One pathfinder tick plus one physics step. Returns this tick's events.
    pub fn step(&mut self) -> Vec<PathEvent> {
        let events = self.pathfinder.tick(&mut self.agent);
        self.events.extend(events.iter().cloned());
        self.agent.advance();
        self.trace.push(self.agent.state);
        events
    }

    /// Step until an event ends the intent, or `max_ticks` pass. Returns the
    /// terminal event kind, if any.
    pub fn run_to_end(&mut self, max_ticks: u32) -> Option<PathEventKind> {
        for _ in 0..max_ticks {
            let events = self.step();
            if let Some(event) = events.into_iter().find(|e| e.kind.is_terminal()) {
                return Some(event.kind);
            }
        }
        None
    }

    pub fn cell(&self) -> VoxelCoord {
        self.agent.state.cell()
    }

    /// Lowest feet height the agent reached.
    pub fn lowest_y(&self) -> f32 {
        self.trace
            .iter()
            .map(|s| s.position.y)
            .fold(self.agent.state.position.y, f32::min)
    }

    pub fn count(&self, predicate: impl Fn(&PathEventKind) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(&e.kind)).count()
    }
}

// ---------------------------------------------------------------------------
// World builders
// ---------------------------------------------------------------------------

/// Open floor spanning x and z in `[-margin, size + margin)`.
pub fn flat_floor(size: i32) -> VoxelWorld {
    let margin = 8;
    let span = (size + 2 * margin) as u32;
    let mut world = VoxelWorld::with_origin(VoxelCoord::new(-margin, -6, -margin), span, 14, span);
    world.fill(
        VoxelCoord::new(-margin, -1, -margin),
        VoxelCoord::new(size + margin - 1, -1, size + margin - 1),
        BlockKind::Solid,
    );
    world
}

/// Flat floor with a 3-tall wall across the x axis at `x`, spanning z in
/// `[-half_width, half_width]`.
pub fn walled_floor(size: i32, x: i32, half_width: i32) -> VoxelWorld {
    let mut world = flat_floor(size);
    world.fill(
        VoxelCoord::new(x, 0, -half_width),
        VoxelCoord::new(x, 2, half_width),
        BlockKind::Solid,
    );
    world
}

/// A walled 1-wide corridor along +x at z = 0, `length` long, with a pit
/// `pit_width` wide and 3 deep starting at `pit_x`.
pub fn pit_corridor(length: i32, pit_x: i32, pit_width: i32) -> VoxelWorld {
    let mut world = VoxelWorld::with_origin(VoxelCoord::new(-1, -6, -2), length as u32 + 2, 14, 5);
    world.fill(VoxelCoord::new(-1, -4, -2), VoxelCoord::new(length, 4, 2), BlockKind::Solid);
    world.fill(VoxelCoord::new(0, 0, 0), VoxelCoord::new(length - 1, 3, 0), BlockKind::Air);
    world.fill(
        VoxelCoord::new(pit_x, -3, 0),
        VoxelCoord::new(pit_x + pit_width - 1, -1, 0),
        BlockKind::Air,
    );
    world
}

/// Flat floor with a staircase rising along +x: the step at `x0 + i` has its
/// top at y = i + 1, for `steps` steps, then a landing of the same height.
pub fn staircase(x0: i32, steps: i32) -> VoxelWorld {
    let mut world = flat_floor(x0 + steps + 6);
    for i in 0..steps {
        world.fill(
            VoxelCoord::new(x0 + i, 0, -2),
            VoxelCoord::new(x0 + i, i, 2),
            BlockKind::Solid,
        );
    }
    world.fill(
        VoxelCoord::new(x0 + steps, 0, -2),
        VoxelCoord::new(x0 + steps + 5, steps - 1, 2),
        BlockKind::Solid,
    );
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxel_pathfinder::world::BlockSource;

    #[test]
    fn corridor_has_a_pit_and_standable_edges() {
        let world = pit_corridor(12, 5, 2);
        assert!(world.is_standable(VoxelCoord::new(4, 0, 0)));
        assert!(!world.is_standable(VoxelCoord::new(5, 0, 0)));
        assert!(!world.is_standable(VoxelCoord::new(6, 0, 0)));
        assert!(world.is_standable(VoxelCoord::new(7, 0, 0)));
        assert!(world.is_standable(VoxelCoord::new(5, -3, 0)));
        assert!(!world.is_passable(VoxelCoord::new(4, 0, 1)));
    }

    #[test]
    fn staircase_steps_rise_by_one() {
        let world = staircase(2, 3);
        assert!(world.is_standable(VoxelCoord::new(1, 0, 0)));
        assert!(world.is_standable(VoxelCoord::new(2, 1, 0)));
        assert!(world.is_standable(VoxelCoord::new(3, 2, 0)));
        assert!(world.is_standable(VoxelCoord::new(4, 3, 0)));
        assert!(world.is_standable(VoxelCoord::new(8, 3, 0)));
    }
}
