// Movement executor: drives one leg of a route, one decision per tick.
//
// A `MoveLeg` steers the agent from wherever it is to a single target point
// (usually the next waypoint of a path). Each call to `MoveLeg::tick` samples
// the agent, decides the control outputs for this physics step and writes
// them to the host. The leg is a small state machine:
//
//   Approaching -> Committed(Jump | Hop) -> Approaching | Arrived
//
// While approaching, the agent looks at the target and the situation is
// classified in priority order:
//   1. liquid or a ladder at the body: swim/climb (jump held, no sprint);
//   2. straight legs only: stalled against a wall on the ground: auto-jump;
//   3. a forward-simulated sprint jump lands on the target or the path,
//      travels far enough and does not fall too far: commit to it;
//   4. a forward-simulated walking hop lands on the path and sprinting
//      alone would not do as well: commit to it, sprint suppressed;
//   5. otherwise walk, releasing any head lock once grounded.
// A commit locks the head: orientation is not touched again until the
// agent reports on-ground, at which point the leg drops back to
// Approaching and re-evaluates on that same tick. Arrival is only tested
// while approaching, so a committed jump always finishes before the leg can
// resolve.
//
// "Skip" legs carry the remaining path and also resolve when the agent is
// anywhere on it; `LegOutcome::Arrived { advance }` tells the caller how many
// waypoints that consumed. A leg can also resolve `Stopped` (its cancel
// predicate fired, e.g. a newer plan superseded it) or `TimedOut`. Any
// number of resolve callbacks may be attached; each runs exactly once.
//
// See also: `physics.rs` for `simulate_until`, `goal.rs` for the on-block
// test, `coordinator.rs` which chains legs along a path.

use crate::agent::{AgentHost, AgentState, ControlState};
use crate::config::ExecutorConfig;
use crate::goal::{EYE_HEIGHT, is_on_block, xz_distance};
use crate::physics::{PhysicsStepper, simulate_until, will_be_on_ground};
use crate::types::VoxelCoord;
use crate::world::BlockSource;
use glam::Vec3;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Commit {
    /// Sprint jump.
    Jump,
    /// Walking hop, sprint suppressed until landing.
    Hop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegPhase {
    Approaching,
    Committed(Commit),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegOutcome {
    /// Reached the target, or a later point of the path. `advance` is the
    /// number of waypoints (counting the target) now behind the agent.
    Arrived { advance: usize },
    /// The cancel predicate fired.
    Stopped,
    TimedOut,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LegTimeout {
    /// `ExecutorConfig::leg_timeout_ticks` plus a per-block allowance.
    FromConfig,
    After(u32),
    Never,
}

type CancelFn = Box<dyn Fn() -> bool>;
type ResolveFn = Box<dyn FnOnce(LegOutcome)>;

/// One waypoint-to-waypoint segment driven by the executor.
pub struct MoveLeg {
    target: Vec3,
    /// Points checked by the on-path tests: the remaining path for skip
    /// legs, `[start, target]` for straight legs.
    path: Vec<Vec3>,
    skip: bool,
    centered: bool,
    auto_jump: bool,
    timeout: LegTimeout,
    deadline: Option<u32>,
    phase: LegPhase,
    head_locked: bool,
    walk_until_ground: bool,
    elapsed: u32,
    cancel: Option<CancelFn>,
    resolvers: Vec<ResolveFn>,
    outcome: Option<LegOutcome>,
}

impl fmt::Debug for MoveLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveLeg")
            .field("target", &self.target)
            .field("skip", &self.skip)
            .field("centered", &self.centered)
            .field("phase", &self.phase)
            .field("head_locked", &self.head_locked)
            .field("elapsed", &self.elapsed)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl MoveLeg {
    /// A leg to `target` that only resolves on the target block.
    pub fn toward(target: Vec3) -> Self {
        Self {
            target,
            path: vec![target],
            skip: false,
            centered: false,
            auto_jump: false,
            timeout: LegTimeout::FromConfig,
            deadline: None,
            phase: LegPhase::Approaching,
            head_locked: false,
            walk_until_ground: false,
            elapsed: 0,
            cancel: None,
            resolvers: Vec::new(),
            outcome: None,
        }
    }

    /// A leg to `remaining[0]` that also resolves anywhere on `remaining`.
    /// `remaining` must not be empty.
    pub fn along(remaining: Vec<Vec3>) -> Self {
        let target = remaining.first().copied().unwrap_or(Vec3::ZERO);
        Self {
            path: remaining,
            skip: true,
            ..Self::toward(target)
        }
    }

    /// A straight run from `start` to `target`, with auto-jump.
    pub fn straight(start: Vec3, target: Vec3) -> Self {
        Self {
            path: vec![start, target],
            auto_jump: true,
            ..Self::toward(target)
        }
    }

    /// Require arrival within `CENTER_TOLERANCE` of the target.
    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    pub fn timeout(mut self, timeout: LegTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop the leg as soon as `stale` returns true.
    pub fn cancel_when(mut self, stale: impl Fn() -> bool + 'static) -> Self {
        self.cancel = Some(Box::new(stale));
        self
    }

    /// Run `callback` once when the leg resolves.
    pub fn on_resolve(&mut self, callback: impl FnOnce(LegOutcome) + 'static) {
        self.resolvers.push(Box::new(callback));
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn phase(&self) -> LegPhase {
        self.phase
    }

    pub fn is_head_locked(&self) -> bool {
        self.head_locked
    }

    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed
    }

    pub fn outcome(&self) -> Option<LegOutcome> {
        self.outcome
    }

    /// Advance the leg by one tick. Returns the outcome once resolved; a
    /// resolved leg keeps returning it without touching the host.
    pub fn tick<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        cfg: &ExecutorConfig,
    ) -> Option<LegOutcome> {
        if let Some(outcome) = self.outcome {
            return Some(outcome);
        }
        if self.cancel.as_ref().is_some_and(|stale| stale()) {
            debug!("leg toward {} cancelled", self.target);
            host.clear_controls();
            return Some(self.resolve(LegOutcome::Stopped));
        }

        let agent = host.agent();
        if self.elapsed == 0 {
            self.deadline = match self.timeout {
                LegTimeout::FromConfig => cfg.leg_timeout_ticks.map(|base| {
                    let blocks = agent.position.distance(self.target).ceil() as u32;
                    base.saturating_add(blocks.saturating_mul(cfg.leg_timeout_ticks_per_block))
                }),
                LegTimeout::After(ticks) => Some(ticks),
                LegTimeout::Never => None,
            };
        }
        self.elapsed += 1;
        if self.deadline.is_some_and(|deadline| self.elapsed > deadline) {
            debug!("leg toward {} timed out after {} ticks", self.target, self.elapsed - 1);
            host.clear_controls();
            return Some(self.resolve(LegOutcome::TimedOut));
        }

        if matches!(self.phase, LegPhase::Committed(_)) && agent.on_ground {
            self.phase = LegPhase::Approaching;
            self.head_locked = false;
            self.walk_until_ground = false;
        }

        let mut controls = host.controls();
        controls.forward = true;
        controls.sprint = !self.walk_until_ground;

        if self.phase == LegPhase::Approaching {
            if let Some(advance) = self.arrival(&*host, &agent, cfg) {
                controls.jump = false;
                host.set_controls(controls);
                return Some(self.resolve(LegOutcome::Arrived { advance }));
            }
        }

        if !self.head_locked {
            host.look_at(self.target + Vec3::new(0.0, EYE_HEIGHT, 0.0));
        }
        // Predictions run along the freshly set facing.
        let agent = host.agent();
        let action = self.classify(&*host, &agent, cfg);
        self.apply(action, &mut controls, &agent, cfg);
        host.set_controls(controls);
        None
    }

    fn resolve(&mut self, outcome: LegOutcome) -> LegOutcome {
        self.outcome = Some(outcome);
        self.head_locked = false;
        self.walk_until_ground = false;
        self.phase = LegPhase::Approaching;
        for callback in self.resolvers.drain(..) {
            callback(outcome);
        }
        outcome
    }

    /// Whether the agent, as it stands now, has completed the leg.
    fn arrival<H: AgentHost + ?Sized>(
        &self,
        host: &H,
        agent: &AgentState,
        cfg: &ExecutorConfig,
    ) -> Option<usize> {
        if is_on_block(agent.position, self.target, agent.on_ground, self.centered) {
            return Some(1);
        }
        if !self.skip {
            return None;
        }
        let grounded = will_be_on_ground(host.physics(), host.world(), agent, host.controls(), 1);
        next_waypoint_index(
            &self.path,
            agent.position,
            PathCheck {
                max_segments: cfg.path_lookahead,
                tolerance: cfg.path_tolerance,
                on_ground: false,
                grounded,
            },
        )
    }

    fn classify<H: AgentHost + ?Sized>(
        &self,
        host: &H,
        agent: &AgentState,
        cfg: &ExecutorConfig,
    ) -> Action {
        let world = host.world();
        let physics = host.physics();

        if let Some(action) = self.swim_or_climb(world, agent, cfg) {
            return action;
        }
        if !agent.on_ground {
            return Action::Drift;
        }
        if self.auto_jump && is_stalled(agent, cfg) {
            return Action::AutoJump;
        }
        let lookahead = Lookahead {
            world,
            physics,
            agent,
            cfg,
        };
        if lookahead.sprint_jump_lands(self) {
            return Action::SprintJump;
        }
        if lookahead.hop_beats_sprint(self) {
            return Action::Hop;
        }
        Action::Walk
    }

    fn swim_or_climb(
        &self,
        world: &dyn BlockSource,
        agent: &AgentState,
        cfg: &ExecutorConfig,
    ) -> Option<Action> {
        let feet = VoxelCoord::containing(agent.position);
        let head = feet.up(1);
        let wet = world.is_water(feet.down(1)) || world.is_water(feet) || world.is_water(head);
        let swim = wet && self.target.y >= agent.position.y - 0.5;
        let climb = world.is_ladder(head) && self.target.y >= agent.position.y;
        if swim || climb {
            let forward = xz_distance(agent.position, self.target) >= cfg.swim_forward_cutoff;
            Some(Action::Swim { forward })
        } else {
            None
        }
    }

    fn apply(
        &mut self,
        action: Action,
        controls: &mut ControlState,
        agent: &AgentState,
        cfg: &ExecutorConfig,
    ) {
        match action {
            Action::Swim { forward } => {
                controls.sprint = false;
                controls.forward = forward;
                controls.jump = true;
            }
            Action::AutoJump => {
                trace!("auto jump at {}", agent.position);
                controls.jump = true;
            }
            Action::SprintJump => {
                debug!("sprint jump at {} toward {}", agent.position, self.target);
                self.head_locked = true;
                self.phase = LegPhase::Committed(Commit::Jump);
                controls.sprint = true;
                controls.jump = true;
            }
            Action::Hop => {
                debug!("hop at {} toward {}", agent.position, self.target);
                self.head_locked = true;
                self.walk_until_ground = true;
                self.phase = LegPhase::Committed(Commit::Hop);
                controls.sprint = false;
                controls.jump = true;
            }
            Action::Walk => {
                self.head_locked = false;
                self.walk_until_ground = false;
                self.phase = LegPhase::Approaching;
                controls.jump = false;
                let near = xz_distance(agent.position, self.target) < cfg.centered_walk_distance;
                controls.sprint = !(self.centered && near);
            }
            Action::Drift => {}
        }
    }
}

/// Per-tick decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Swim { forward: bool },
    AutoJump,
    SprintJump,
    Hop,
    Walk,
    /// Airborne with nothing to decide: keep the current inputs.
    Drift,
}

fn is_stalled(agent: &AgentState, cfg: &ExecutorConfig) -> bool {
    agent.on_ground
        && agent.collided_horizontally
        && agent.velocity.x.abs() < cfg.stall_horizontal_speed
        && agent.velocity.z.abs() < cfg.stall_horizontal_speed
        && agent.velocity.y.abs() < cfg.stall_vertical_speed
}

/// Forward-simulation checks from the agent's current state.
struct Lookahead<'a> {
    world: &'a dyn BlockSource,
    physics: &'a dyn PhysicsStepper,
    agent: &'a AgentState,
    cfg: &'a ExecutorConfig,
}

impl Lookahead<'_> {
    fn travel(&self, state: &AgentState) -> (f32, f32) {
        let distance = self.agent.position.distance(state.position);
        let fall = self.agent.position.y - state.position.y;
        (distance, fall)
    }

    fn on_path(
        &self,
        leg: &MoveLeg,
        state: &AgentState,
        max_segments: usize,
        on_ground: bool,
    ) -> bool {
        next_waypoint_index(
            &leg.path,
            state.position,
            PathCheck {
                max_segments,
                tolerance: self.cfg.path_tolerance,
                on_ground,
                grounded: state.on_ground,
            },
        )
        .is_some()
    }

    /// A sprint jump lands, far enough and low enough, on the target or the
    /// path.
    fn sprint_jump_lands(&self, leg: &MoveLeg) -> bool {
        let landing = simulate_until(
            self.physics,
            self.world,
            self.agent,
            ControlState::SPRINT_JUMP,
            self.cfg.sprint_jump_horizon_ticks,
            |s| s.on_ground,
        );
        if !landing.satisfied {
            return false;
        }
        let (distance, fall) = self.travel(&landing.state);
        if distance <= self.cfg.sprint_jump_min_distance || fall > self.cfg.sprint_jump_max_fall {
            return false;
        }
        is_on_block(landing.state.position, leg.target, true, leg.centered)
            || self.on_path(leg, &landing.state, self.cfg.path_lookahead, true)
    }

    /// A walking hop lands somewhere useful that plain sprinting would not
    /// reach within the same horizon.
    fn hop_beats_sprint(&self, leg: &MoveLeg) -> bool {
        let good = |state: &AgentState| {
            let (distance, fall) = self.travel(state);
            distance > self.cfg.hop_min_distance
                && fall <= self.cfg.hop_max_fall
                && self.on_path(leg, state, self.cfg.hop_path_lookahead, false)
        };
        let landing = simulate_until(
            self.physics,
            self.world,
            self.agent,
            ControlState::HOP,
            self.cfg.hop_horizon_ticks,
            |s| s.on_ground,
        );
        if !landing.satisfied || !good(&landing.state) {
            return false;
        }
        let sprint = simulate_until(
            self.physics,
            self.world,
            self.agent,
            ControlState::SPRINT,
            self.cfg.hop_horizon_ticks,
            good,
        );
        !sprint.satisfied
    }
}

// ---------------------------------------------------------------------------
// Path progress
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathCheck {
    /// Segments scanned from the start of the point list.
    pub max_segments: usize,
    /// Max distance from a segment that still counts as on it.
    pub tolerance: f32,
    /// Vertical tolerance for the on-block tests (see `is_on_block`).
    pub on_ground: bool,
    /// Segment-distance matches only count for a grounded (or landing) agent.
    pub grounded: bool,
}

/// Where `point` sits on the polyline `points`, as the index of the next
/// waypoint to head for. `None` if it is not on the path.
///
/// Standing on `points[i]` yields `i + 1`; lying within tolerance of the
/// segment `points[i - 1]..points[i]` yields `i`.
pub fn next_waypoint_index(points: &[Vec3], point: Vec3, check: PathCheck) -> Option<usize> {
    match points {
        [] => None,
        [only] => is_on_block(point, *only, check.on_ground, false).then_some(1),
        _ => {
            let end = points.len().min(check.max_segments + 1);
            for i in 1..end {
                let (a, b) = (points[i - 1], points[i]);
                if is_on_block(point, a, check.on_ground, false) {
                    return Some(i);
                }
                if is_on_block(point, b, check.on_ground, false) {
                    return Some(i + 1);
                }
                if check.grounded && distance_to_segment(point, a, b) < check.tolerance {
                    return Some(i);
                }
            }
            None
        }
    }
}

/// Euclidean distance from `p` to the segment `a..b`.
pub fn distance_to_segment(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::SimulatedAgent;
    use crate::config::PhysicsConfig;
    use crate::types::BlockKind;
    use crate::world::VoxelWorld;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn floor_world() -> VoxelWorld {
        let mut world = VoxelWorld::with_origin(VoxelCoord::new(-8, -8, -8), 32, 16, 16);
        world.fill(VoxelCoord::new(-8, -1, -8), VoxelCoord::new(23, -1, 7), BlockKind::Solid);
        world
    }

    fn center(x: i32, y: i32, z: i32) -> Vec3 {
        VoxelCoord::new(x, y, z).floor_center()
    }

    /// Config with jumping turned off.
    fn walking_only() -> ExecutorConfig {
        ExecutorConfig {
            sprint_jump_min_distance: f32::MAX,
            hop_min_distance: f32::MAX,
            ..ExecutorConfig::default()
        }
    }

    fn drive(
        leg: &mut MoveLeg,
        agent: &mut SimulatedAgent,
        cfg: &ExecutorConfig,
        max_ticks: u32,
    ) -> Option<LegOutcome> {
        for _ in 0..max_ticks {
            if let Some(outcome) = leg.tick(agent, cfg) {
                return Some(outcome);
            }
            agent.advance();
        }
        None
    }

    #[test]
    fn walking_leg_arrives_on_target_block() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut agent = SimulatedAgent::standing_on(floor_world(), VoxelCoord::new(0, 0, 0));
        let mut leg = MoveLeg::straight(center(0, 0, 0), center(3, 0, 0));
        let outcome = drive(&mut leg, &mut agent, &walking_only(), 200);
        assert_eq!(outcome, Some(LegOutcome::Arrived { advance: 1 }));
        assert_eq!(agent.state.cell(), VoxelCoord::new(3, 0, 0));
        assert!(!agent.controls.jump);
    }

    #[test]
    fn leg_on_target_resolves_immediately() {
        let mut agent = SimulatedAgent::standing_on(floor_world(), VoxelCoord::new(2, 0, 2));
        let mut leg = MoveLeg::toward(center(2, 0, 2));
        assert_eq!(
            leg.tick(&mut agent, &ExecutorConfig::default()),
            Some(LegOutcome::Arrived { advance: 1 })
        );
        // Resolved legs are inert.
        assert_eq!(
            leg.tick(&mut agent, &ExecutorConfig::default()),
            Some(LegOutcome::Arrived { advance: 1 })
        );
    }

    /// Walk a waypoint list the way the coordinator does, recording every
    /// state the agent passes through.
    fn walk_path(
        agent: &mut SimulatedAgent,
        points: &[Vec3],
        cfg: &ExecutorConfig) -> (usize, Vec<AgentState>, bool,
    ) {
        let mut index = 0;
        let mut states = Vec::new();
        let mut committed = false;
        let mut ticks = 0;
        while index < points.len() && ticks < 600 {
            let mut leg = MoveLeg::along(points[index..].to_vec());
            loop {
                ticks += 1;
                let before = agent.state;
                let was_committed = matches!(leg.phase(), LegPhase::Committed(_));
                let outcome = leg.tick(agent, cfg);
                if was_committed && !before.on_ground {
                    assert_eq!(agent.state.yaw, before.yaw, "head moved mid-jump");
                    assert_eq!(agent.state.pitch, before.pitch, "head moved mid-jump");
                }
                committed |= leg.is_head_locked();
                match outcome {
                    Some(LegOutcome::Arrived { advance }) => {
                        index += advance;
                        break;
                    }
                    Some(other) => panic!("leg ended with {other:?}"),
                    None => {}
                }
                agent.advance();
                states.push(agent.state);
                if ticks >= 600 {
                    break;
                }
            }
        }
        (index, states, committed)
    }

    #[test]
    fn jumps_a_one_wide_gap_without_falling() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut world = floor_world();
        world.fill(VoxelCoord::new(3, -8, -8), VoxelCoord::new(3, -1, 7), BlockKind::Air);
        let mut agent = SimulatedAgent::standing_on(world, VoxelCoord::new(0, 0, 0));
        let points: Vec<Vec3> = [0, 1, 2, 4, 5, 6, 7, 8].iter().map(|&x| center(x, 0, 0)).collect();

        let (index, states, committed) = walk_path(&mut agent, &points, &ExecutorConfig::default());
        assert!(index >= points.len());
        assert!(committed, "crossing the gap needs a jump");
        assert!(states.iter().all(|s| s.position.y > -0.5), "fell into the gap");
        assert!(agent.state.position.x > 4.0);
    }

    #[test]
    fn cancel_stops_leg_and_fires_every_callback() {
        let mut agent = SimulatedAgent::standing_on(floor_world(), VoxelCoord::new(0, 0, 0));
        let stale = Rc::new(Cell::new(false));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let flag = Rc::clone(&stale);
        let mut leg = MoveLeg::toward(center(10, 0, 0)).cancel_when(move || flag.get());
        for tag in ["waiter", "hook"] {
            let seen = Rc::clone(&seen);
            leg.on_resolve(move |outcome| seen.borrow_mut().push((tag, outcome)));
        }

        let cfg = ExecutorConfig::default();
        assert_eq!(drive(&mut leg, &mut agent, &cfg, 3), None);
        stale.set(true);
        assert_eq!(leg.tick(&mut agent, &cfg), Some(LegOutcome::Stopped));
        assert_eq!(agent.controls, ControlState::default());
        assert_eq!(
            *seen.borrow(),
            vec![("waiter", LegOutcome::Stopped), ("hook", LegOutcome::Stopped)]
        );
        // Callbacks run once.
        leg.tick(&mut agent, &cfg);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn frozen_agent_times_out() {
        let mut agent = SimulatedAgent::standing_on(floor_world(), VoxelCoord::new(0, 0, 0));
        let mut leg = MoveLeg::toward(center(5, 0, 0)).timeout(LegTimeout::After(3));
        let cfg = walking_only();
        // Never advance physics: the agent cannot make progress.
        for _ in 0..3 {
            assert_eq!(leg.tick(&mut agent, &cfg), None);
        }
        assert_eq!(leg.tick(&mut agent, &cfg), Some(LegOutcome::TimedOut));
        assert_eq!(leg.elapsed_ticks(), 4);
    }

    #[test]
    fn config_timeout_scales_with_distance() {
        let mut agent = SimulatedAgent::standing_on(floor_world(), VoxelCoord::new(0, 0, 0));
        let cfg = ExecutorConfig {
            leg_timeout_ticks: Some(2),
            leg_timeout_ticks_per_block: 1,
            ..walking_only()
        };
        // Three blocks away: 2 + 3 ticks allowed.
        let mut leg = MoveLeg::toward(center(3, 0, 0));
        for _ in 0..5 {
            assert_eq!(leg.tick(&mut agent, &cfg), None);
        }
        assert_eq!(leg.tick(&mut agent, &cfg), Some(LegOutcome::TimedOut));
    }

    #[test]
    fn huge_per_block_timeout_saturates() {
        let mut agent = SimulatedAgent::standing_on(floor_world(), VoxelCoord::new(0, 0, 0));
        let cfg = ExecutorConfig {
            leg_timeout_ticks: Some(10),
            leg_timeout_ticks_per_block: u32::MAX,
            ..walking_only()
        };
        let mut leg = MoveLeg::toward(center(100, 0, 0));
        for _ in 0..20 {
            assert_eq!(leg.tick(&mut agent, &cfg), None);
        }
        assert_eq!(leg.elapsed_ticks(), 20);
    }

    #[test]
    fn water_means_swim_up_without_sprint() {
        let mut world = floor_world();
        world.fill(VoxelCoord::new(-2, -3, -2), VoxelCoord::new(2, 0, 2), BlockKind::Water);
        let start = AgentState::at(Vec3::new(0.5, -2.0, 0.5));
        let mut agent = SimulatedAgent::new(world, PhysicsConfig::default(), start);
        let mut leg = MoveLeg::toward(center(0, 1, 3));
        assert_eq!(leg.tick(&mut agent, &ExecutorConfig::default()), None);
        assert!(agent.controls.jump);
        assert!(!agent.controls.sprint);
        assert!(agent.controls.forward);

        // Directly under the target: ascend only.
        let mut leg = MoveLeg::toward(Vec3::new(0.6, 1.0, 0.6));
        leg.tick(&mut agent, &ExecutorConfig::default());
        assert!(agent.controls.jump);
        assert!(!agent.controls.forward);
    }

    #[test]
    fn stalled_straight_leg_auto_jumps() {
        let mut world = floor_world();
        world.fill(VoxelCoord::new(1, 0, -8), VoxelCoord::new(1, 0, 7), BlockKind::Solid);
        let mut agent = SimulatedAgent::standing_on(world, VoxelCoord::new(0, 0, 0));
        agent.state.collided_horizontally = true;
        let mut leg = MoveLeg::straight(center(0, 0, 0), center(3, 1, 0));
        assert_eq!(leg.tick(&mut agent, &walking_only()), None);
        assert!(agent.controls.jump);
        // Auto-jump does not lock the head.
        assert!(!leg.is_head_locked());
    }

    #[test]
    fn path_legs_do_not_auto_jump() {
        let mut world = floor_world();
        world.fill(VoxelCoord::new(1, 0, -8), VoxelCoord::new(1, 0, 7), BlockKind::Solid);
        let mut agent = SimulatedAgent::standing_on(world, VoxelCoord::new(0, 0, 0));
        agent.state.collided_horizontally = true;
        let mut leg = MoveLeg::along(vec![center(1, 1, 0), center(2, 1, 0)]);
        leg.tick(&mut agent, &walking_only());
        assert!(!agent.controls.jump);
    }

    #[test]
    fn waypoint_index_on_blocks_and_segments() {
        let points = vec![center(0, 0, 0), center(1, 0, 0), center(2, 0, 0), center(2, 0, 3)];
        let check = PathCheck {
            max_segments: 100,
            tolerance: 0.7,
            on_ground: true,
            grounded: true,
        };
        assert_eq!(next_waypoint_index(&points, center(0, 0, 0), check), Some(1));
        // Standing on a waypoint heads for the one after it.
        assert_eq!(next_waypoint_index(&points, center(1, 0, 0), check), Some(2));
        assert_eq!(next_waypoint_index(&points, center(2, 0, 0), check), Some(3));
        // Between (2,0,0) and (2,0,3), beside the line.
        let beside = Vec3::new(2.9, 0.0, 2.0);
        assert_eq!(next_waypoint_index(&points, beside, check), Some(3));
        // Same point, but the agent is airborne and not about to land.
        let airborne = PathCheck { grounded: false, ..check };
        assert_eq!(next_waypoint_index(&points, beside, airborne), None);
        // Off the path entirely.
        assert_eq!(next_waypoint_index(&points, center(5, 0, 5), check), None);
    }

    #[test]
    fn waypoint_index_respects_lookahead() {
        let points: Vec<Vec3> = (0..20).map(|x| center(x, 0, 0)).collect();
        let near = PathCheck {
            max_segments: 3,
            tolerance: 0.7,
            on_ground: true,
            grounded: true,
        };
        assert_eq!(next_waypoint_index(&points, center(2, 0, 0), near), Some(3));
        assert_eq!(next_waypoint_index(&points, center(10, 0, 0), near), None);
        assert_eq!(
            next_waypoint_index(&points, center(10, 0, 0), PathCheck { max_segments: 100, ..near }),
            Some(11)
        );
    }

    #[test]
    fn single_point_path_matches_on_block_only() {
        let check = PathCheck {
            max_segments: 100,
            tolerance: 0.7,
            on_ground: true,
            grounded: true,
        };
        let corner = Vec3::new(4.1, 0.0, 4.9);
        assert_eq!(next_waypoint_index(&[center(4, 0, 4)], corner, check), Some(1));
        assert_eq!(next_waypoint_index(&[center(4, 0, 4)], center(5, 0, 4), check), None);
        assert_eq!(next_waypoint_index(&[], center(0, 0, 0), check), None);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(4.0, 0.0, 0.0);
        assert_eq!(distance_to_segment(Vec3::new(2.0, 0.0, 1.0), a, b), 1.0);
        assert_eq!(distance_to_segment(Vec3::new(-3.0, 0.0, 4.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Vec3::new(1.0, 0.0, 0.0), a, a), 1.0);
    }
}
