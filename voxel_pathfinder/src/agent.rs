// Host agent boundary.
//
// The pathfinder does not own the agent. Each tick it samples the agent's
// state (`AgentState`), reads blocks through the host's `BlockSource`, asks
// the host's `PhysicsStepper` to forward-simulate hypothetical inputs, and
// writes back control outputs (`ControlState`) and an orientation. All of
// that is the `AgentHost` trait.
//
// Orientation follows the usual voxel-game convention: yaw 0 faces north
// (-z) and grows counter-clockwise seen from above, so the facing vector is
// `(-sin yaw, 0, -cos yaw)`; positive pitch looks up.
//
// `SimulatedAgent` is a complete headless host: a `VoxelWorld`, the
// reference `BlockPhysics`, and an agent state advanced by `advance()`. It is
// what the tests, benches and integration harness drive.
//
// See also: `physics.rs` for `PhysicsStepper` and forward simulation,
// `executor.rs` and `coordinator.rs` which drive an `AgentHost` per tick.

use crate::config::PhysicsConfig;
use crate::goal::EYE_HEIGHT;
use crate::physics::{BlockPhysics, PhysicsStepper};
use crate::types::VoxelCoord;
use crate::world::{BlockSource, VoxelWorld};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Control outputs the pathfinder drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlState {
    pub forward: bool,
    pub sprint: bool,
    pub jump: bool,
    pub sneak: bool,
}

impl ControlState {
    /// Sprint-jump forward.
    pub const SPRINT_JUMP: ControlState = ControlState {
        forward: true,
        sprint: true,
        jump: true,
        sneak: false,
    };

    /// Walking hop: jump without sprint.
    pub const HOP: ControlState = ControlState {
        forward: true,
        sprint: false,
        jump: true,
        sneak: false,
    };

    /// Sprint forward with feet on the ground.
    pub const SPRINT: ControlState = ControlState {
        forward: true,
        sprint: true,
        jump: false,
        sneak: false,
    };
}

/// Snapshot of the agent, sampled fresh every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Feet position: bottom centre of the bounding box.
    pub position: Vec3,
    /// Blocks per tick.
    pub velocity: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
    pub collided_horizontally: bool,
    /// Consecutive airborne ticks, maintained by the physics step.
    pub air_ticks: u32,
}

impl AgentState {
    /// At rest at `position`, facing north.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
            collided_horizontally: false,
            air_ticks: 0,
        }
    }

    /// At rest on the floor of `cell`, centred.
    pub fn standing_on(cell: VoxelCoord) -> Self {
        Self {
            on_ground: true,
            ..Self::at(cell.floor_center())
        }
    }

    pub fn eye_position(&self) -> Vec3 {
        self.position + Vec3::new(0.0, EYE_HEIGHT, 0.0)
    }

    /// Horizontal unit vector the agent faces.
    pub fn facing(&self) -> Vec3 {
        facing_vector(self.yaw)
    }

    /// The lattice cell holding the agent's feet.
    pub fn cell(&self) -> VoxelCoord {
        VoxelCoord::containing(self.position)
    }
}

/// Horizontal unit vector for a yaw angle.
pub fn facing_vector(yaw: f32) -> Vec3 {
    Vec3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// (yaw, pitch) that points the eyes at `from` toward `target`.
pub fn look_angles(from: Vec3, target: Vec3) -> (f32, f32) {
    let delta = target - from;
    let yaw = (-delta.x).atan2(-delta.z);
    let ground = (delta.x * delta.x + delta.z * delta.z).sqrt();
    let pitch = delta.y.atan2(ground);
    (yaw, pitch)
}

/// Everything the pathfinder needs from the agent it drives.
pub trait AgentHost {
    fn agent(&self) -> AgentState;

    fn world(&self) -> &dyn BlockSource;

    fn physics(&self) -> &dyn PhysicsStepper;

    fn controls(&self) -> ControlState;

    fn set_controls(&mut self, controls: ControlState);

    fn set_orientation(&mut self, yaw: f32, pitch: f32);

    fn clear_controls(&mut self) {
        self.set_controls(ControlState::default());
    }

    /// Turn the eyes toward `target`.
    fn look_at(&mut self, target: Vec3) {
        let (yaw, pitch) = look_angles(self.agent().eye_position(), target);
        self.set_orientation(yaw, pitch);
    }
}

// ---------------------------------------------------------------------------
// Headless host
// ---------------------------------------------------------------------------

/// A self-contained agent in a `VoxelWorld`, advanced by `BlockPhysics`.
#[derive(Clone, Debug)]
pub struct SimulatedAgent {
    pub world: VoxelWorld,
    pub physics: BlockPhysics,
    pub state: AgentState,
    pub controls: ControlState,
    /// Physics ticks advanced so far.
    pub tick: u64,
}

impl SimulatedAgent {
    pub fn new(world: VoxelWorld, physics: PhysicsConfig, state: AgentState) -> Self {
        Self {
            world,
            physics: BlockPhysics::new(physics),
            state,
            controls: ControlState::default(),
            tick: 0,
        }
    }

    /// Agent standing centred on `cell` with default physics.
    pub fn standing_on(world: VoxelWorld, cell: VoxelCoord) -> Self {
        Self::new(world, PhysicsConfig::default(), AgentState::standing_on(cell))
    }

    /// Advance one physics tick with the current controls.
    pub fn advance(&mut self) {
        self.state = self.physics.step(&self.state, self.controls, &self.world);
        self.tick += 1;
    }
}

impl AgentHost for SimulatedAgent {
    fn agent(&self) -> AgentState {
        self.state
    }

    fn world(&self) -> &dyn BlockSource {
        &self.world
    }

    fn physics(&self) -> &dyn PhysicsStepper {
        &self.physics
    }

    fn controls(&self) -> ControlState {
        self.controls
    }

    fn set_controls(&mut self, controls: ControlState) {
        self.controls = controls;
    }

    fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.state.yaw = yaw;
        self.state.pitch = pitch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn yaw_zero_faces_north() {
        assert!(approx(facing_vector(0.0), Vec3::new(0.0, 0.0, -1.0)));
        assert!(approx(facing_vector(FRAC_PI_2), Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn look_angles_point_at_target() {
        let from = Vec3::new(0.5, 1.625, 0.5);
        for target in [
            Vec3::new(5.5, 1.625, 0.5),
            Vec3::new(0.5, 1.625, -3.5),
            Vec3::new(-2.0, 1.625, 4.0),
        ] {
            let (yaw, pitch) = look_angles(from, target);
            let dir = (target - from).normalize();
            assert!(approx(facing_vector(yaw), dir), "yaw {yaw} for {target}");
            assert!(pitch.abs() < 1e-6);
        }
        let (_, pitch) = look_angles(from, Vec3::new(0.5, 3.625, 2.5));
        assert!((pitch - std::f32::consts::FRAC_PI_4).abs() < 1e-5);
    }

    #[test]
    fn standing_state_is_grounded_and_centred() {
        let state = AgentState::standing_on(VoxelCoord::new(3, 2, -4));
        assert!(state.on_ground);
        assert_eq!(state.position, Vec3::new(3.5, 2.0, -3.5));
        assert_eq!(state.cell(), VoxelCoord::new(3, 2, -4));
        assert_eq!(state.eye_position().y, 2.0 + EYE_HEIGHT);
    }

    #[test]
    fn simulated_agent_records_orientation_and_controls() {
        let world = VoxelWorld::new(4, 4, 4);
        let mut agent = SimulatedAgent::standing_on(world, VoxelCoord::new(1, 1, 1));
        agent.look_at(Vec3::new(3.5, 1.0 + EYE_HEIGHT, 1.5));
        assert!(approx(agent.agent().facing(), Vec3::new(1.0, 0.0, 0.0)));
        agent.set_controls(ControlState::SPRINT);
        assert_eq!(agent.controls(), ControlState::SPRINT);
        agent.clear_controls();
        assert_eq!(agent.controls(), ControlState::default());
    }
}
