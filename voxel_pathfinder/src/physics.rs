// Physics-advance boundary and a reference block physics.
//
// The executor never reasons about trajectories analytically. To decide
// whether a jump is safe it asks a `PhysicsStepper` to advance a
// hypothetical `AgentState` one tick at a time under a chosen
// `ControlState`, and looks at where the agent lands. `simulate_until` wraps
// that loop: step until a predicate holds or the horizon runs out, tracking
// consecutive air ticks.
//
// `BlockPhysics` is the reference stepper, modelled on classic voxel-game
// movement: accelerate along the facing, move with axis-separated AABB
// collision (y, then x, then z) against solid cells, then apply gravity and
// drag. Water swaps in buoyant gravity and heavy drag; ladder cells cap the
// descent speed and climb when jumping or pushing into a wall. All constants
// come from `PhysicsConfig`.
//
// Collision resolves by snapping the box face exactly onto the blocking
// cell boundary, so a grounded agent's feet sit at an integer y and
// `VoxelCoord::containing` on its position yields the feet cell.
//
// See also: `agent.rs` for `AgentState`/`ControlState`, `executor.rs` which
// runs the jump and hop predictions, `config.rs` for `PhysicsConfig`.

use crate::agent::{AgentState, ControlState, facing_vector};
use crate::config::PhysicsConfig;
use crate::types::VoxelCoord;
use crate::world::BlockSource;
use glam::Vec3;

/// Offsets box bounds inward before converting them to cell ranges, so a
/// face resting exactly on a cell boundary does not overlap the next cell.
const EDGE_EPSILON: f32 = 1e-4;

/// Depth of the floor probe for an agent with no vertical velocity.
const GROUND_PROBE: f32 = 0.01;

/// Advances an agent state by one tick.
pub trait PhysicsStepper {
    fn step(
        &self,
        state: &AgentState,
        controls: ControlState,
        world: &dyn BlockSource,
    ) -> AgentState;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockPhysics {
    pub config: PhysicsConfig,
}

impl BlockPhysics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    fn half_width(&self) -> f32 {
        self.config.agent_width / 2.0
    }

    /// Whether the agent's body overlaps water.
    pub fn in_water(&self, position: Vec3, world: &dyn BlockSource) -> bool {
        let feet = VoxelCoord::containing(position);
        world.is_water(feet) || world.is_water(feet.up(1))
    }

    pub fn on_ladder(&self, position: Vec3, world: &dyn BlockSource) -> bool {
        let feet = VoxelCoord::containing(position);
        world.is_ladder(feet) || world.is_ladder(feet.up(1))
    }

    /// Move `position` by `delta` along one axis, stopping at the first solid
    /// cell. Returns the new coordinate on that axis and whether it was
    /// clipped.
    fn sweep_axis(
        &self,
        world: &dyn BlockSource,
        position: Vec3,
        axis: usize,
        delta: f32) -> (f32, bool,
    ) {
        let hw = self.half_width();
        let min = position - Vec3::new(hw, 0.0, hw);
        let max = position + Vec3::new(hw, self.config.agent_height, hw);
        if delta == 0.0 {
            return (position[axis], false);
        }

        // Cells the box covers on the two other axes.
        let cells = |a: usize| {
            let lo = (min[a] + EDGE_EPSILON).floor() as i32;
            let hi = (max[a] - EDGE_EPSILON).floor() as i32;
            lo..=hi
        };
        let (u, v) = match axis {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        let coord = |along: i32, a: i32, b: i32| {
            let mut c = [0; 3];
            c[axis] = along;
            c[u] = a;
            c[v] = b;
            VoxelCoord::new(c[0], c[1], c[2])
        };
        let blocked = |along: i32| {
            cells(u).any(|a| cells(v).any(|b| world.is_solid(coord(along, a, b))))
        };

        if delta > 0.0 {
            let first = (max[axis] - EDGE_EPSILON).floor() as i32 + 1;
            let last = (max[axis] + delta).floor() as i32;
            for along in first..=last {
                if blocked(along) {
                    let extent = max[axis] - position[axis];
                    return (along as f32 - extent, true);
                }
            }
        } else {
            let first = (min[axis] + EDGE_EPSILON).floor() as i32 - 1;
            let last = (min[axis] + delta).floor() as i32;
            for along in (last..=first).rev() {
                if blocked(along) {
                    let extent = position[axis] - min[axis];
                    return ((along + 1) as f32 + extent, true);
                }
            }
        }
        (position[axis] + delta, false)
    }
}

impl PhysicsStepper for BlockPhysics {
    fn step(
        &self,
        state: &AgentState,
        controls: ControlState,
        world: &dyn BlockSource,
    ) -> AgentState {
        let cfg = &self.config;
        let mut next = *state;
        let mut vel = state.velocity;
        let in_water = self.in_water(state.position, world);
        let on_ladder = self.on_ladder(state.position, world);
        let sprinting = controls.sprint && controls.forward && !controls.sneak;

        // Input acceleration along the facing.
        if controls.forward {
            let mut accel = if in_water {
                cfg.water_acceleration
            } else if state.on_ground {
                cfg.walk_acceleration * if sprinting { cfg.sprint_multiplier } else { 1.0 }
            } else if sprinting {
                cfg.sprint_air_acceleration
            } else {
                cfg.air_acceleration
            };
            if controls.sneak {
                accel *= cfg.sneak_multiplier;
            }
            vel += facing_vector(state.yaw) * accel;
        }

        if controls.jump {
            if in_water {
                vel.y += cfg.swim_up_acceleration;
            } else if state.on_ground {
                vel.y = cfg.jump_velocity;
                if sprinting {
                    vel += facing_vector(state.yaw) * cfg.sprint_jump_boost;
                }
            }
        }

        if on_ladder {
            vel.y = vel.y.max(-cfg.ladder_max_descent);
            if controls.jump || state.collided_horizontally {
                vel.y = cfg.ladder_climb_speed;
            }
        }

        // Axis-separated move: y first so ground contact is known before the
        // horizontal sweep.
        let mut pos = state.position;
        let (y, hit_y) = self.sweep_axis(world, pos, 1, vel.y);
        pos.y = y;
        let (x, hit_x) = self.sweep_axis(world, pos, 0, vel.x);
        pos.x = x;
        let (z, hit_z) = self.sweep_axis(world, pos, 2, vel.z);
        pos.z = z;

        next.on_ground = if vel.y < 0.0 {
            hit_y
        } else {
            // At rest: probe just below the feet.
            vel.y == 0.0 && self.sweep_axis(world, pos, 1, -GROUND_PROBE).1
        };
        next.collided_horizontally = hit_x || hit_z;
        if hit_y {
            vel.y = 0.0;
        }
        if hit_x {
            vel.x = 0.0;
        }
        if hit_z {
            vel.z = 0.0;
        }

        // Swimming against a wall lifts the agent out of the water.
        if in_water && controls.jump && next.collided_horizontally {
            vel.y = vel.y.max(cfg.water_exit_velocity);
        }

        // Gravity and drag.
        if in_water {
            vel *= cfg.water_drag;
            vel.y -= cfg.water_gravity;
        } else {
            vel.y = (vel.y - cfg.gravity) * cfg.vertical_drag;
            let drag = if next.on_ground {
                cfg.ground_friction
            } else {
                cfg.air_drag
            };
            vel.x *= drag;
            vel.z *= drag;
        }
        vel.y = vel.y.max(-cfg.terminal_velocity);

        next.position = pos;
        next.velocity = vel;
        next.air_ticks = if next.on_ground { 0 } else { state.air_ticks + 1 };
        next
    }
}

// ---------------------------------------------------------------------------
// Forward simulation
// ---------------------------------------------------------------------------

/// Outcome of `simulate_until`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    /// State when the predicate first held, or after the last tick.
    pub state: AgentState,
    pub ticks: u32,
    pub satisfied: bool,
}

/// Step `start` under fixed `controls` until `until` holds or `max_ticks`
/// pass. The predicate is not checked on `start` itself. Air ticks count
/// from zero at the start of the simulation.
pub fn simulate_until<F>(
    physics: &dyn PhysicsStepper,
    world: &dyn BlockSource,
    start: &AgentState,
    controls: ControlState,
    max_ticks: u32,
    mut until: F,
) -> Prediction
where
    F: FnMut(&AgentState) -> bool,
{
    let mut state = AgentState {
        air_ticks: 0,
        ..*start
    };
    for tick in 1..=max_ticks {
        state = physics.step(&state, controls, world);
        if until(&state) {
            return Prediction {
                state,
                ticks: tick,
                satisfied: true,
            };
        }
    }
    Prediction {
        state,
        ticks: max_ticks,
        satisfied: false,
    }
}

/// Whether the agent is grounded now or will be within `ticks` under
/// `controls`.
pub fn will_be_on_ground(
    physics: &dyn PhysicsStepper,
    world: &dyn BlockSource,
    state: &AgentState,
    controls: ControlState,
    ticks: u32,
) -> bool {
    state.on_ground
        || simulate_until(physics, world, state, controls, ticks, |s| s.on_ground).satisfied
}
