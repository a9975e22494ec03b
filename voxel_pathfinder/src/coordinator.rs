// Path coordinator: turns caller intents into searches and executions.
//
// `Pathfinder` is the public face of the crate. Callers issue intents
// (`go_to`, `follow`, `stop`) and call `tick` once per physics step with the
// host agent; `tick` returns the `PathEvent`s of that step. Nothing here runs
// on its own: searches are advanced `expansions_per_tick` nodes at a time
// from `tick`, and legs make one decision per `tick`.
//
// Generations. Every intent (each `go_to`, each follow replan) takes the
// next value of a monotonically increasing counter. When a plan for an
// intent becomes ready (a search finishes, or a straight run is chosen) its
// generation becomes the "completed" generation. A search result older than
// the completed generation is dropped unexecuted. An execution in flight is
// not torn down by a newer intent: its current leg carries a cancel
// predicate that watches the completed generation, resolves `Stopped` once
// a newer plan exists, and only then is the newer plan promoted.
//
// Continuations. A search that times out still yields a path to its best
// node. Once that path is walked, planning resumes from the agent's cell
// under the same generation; a leg that times out does the same. Both count
// against `max_continuations`, after which the intent gives up.
//
// Before searching, a goal with a single target point may be tried as a
// straight run: sprint toward it in forward simulation and, if that reaches
// the goal without bumping into anything or staying airborne too long, drive
// one straight leg instead.
//
// See also: `search.rs` for the step-function A*, `executor.rs` for legs,
// `event.rs` for the output events, `config.rs` for every tunable used here.

use crate::agent::{AgentHost, ControlState, look_angles};
use crate::config::PathfinderConfig;
use crate::error::{PathError, Result};
use crate::event::{PathEvent, PathEventKind};
use crate::executor::{LegOutcome, MoveLeg};
use crate::goal::{EYE_HEIGHT, Goal};
use crate::movement::MovementSet;
use crate::physics::simulate_until;
use crate::search::{AStarSearch, SearchBudget, SearchResult, SearchStatus};
use crate::types::VoxelCoord;
use crate::world::BlockSource;
use glam::Vec3;
use log::{debug, warn};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Options for `Pathfinder::go_to`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GoToOptions {
    /// Skip searching and run straight at the goal point.
    pub straight: bool,
    /// Finish within `CENTER_TOLERANCE` of the goal point.
    pub centered: bool,
    /// Per-search time budget; the config value when `None`.
    pub timeout: Option<Duration>,
}

/// Options for `Pathfinder::follow`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowOptions {
    /// Do not replan while the target is this close.
    pub min_distance: f32,
    /// Do not replan while the target is farther than this.
    pub max_distance: Option<f32>,
    /// Walk onto the target's block instead of stopping within reach.
    pub centered: bool,
}

impl Default for FollowOptions {
    fn default() -> Self {
        Self {
            min_distance: 2.0,
            max_distance: None,
            centered: false,
        }
    }
}

struct PendingSearch {
    search: AStarSearch,
    generation: u64,
    options: GoToOptions,
    continuations: u32,
}

enum Route {
    Path {
        status: SearchStatus,
        points: Vec<Vec3>,
        index: usize,
    },
    Straight,
    /// Final centered leg onto the goal point.
    Centering,
}

struct Execution {
    generation: u64,
    goal: Goal,
    options: GoToOptions,
    continuations: u32,
    route: Route,
    leg: MoveLeg,
}

struct FollowState {
    options: FollowOptions,
    /// Latest observed target position and whether it stood on the ground.
    target: Option<(Vec3, bool)>,
    planned_cell: Option<VoxelCoord>,
    last_replan: Option<u64>,
}

pub struct Pathfinder {
    config: PathfinderConfig,
    moves: MovementSet,
    tick: u64,
    /// Last generation handed out.
    intent: u64,
    /// Generation of the newest ready plan. Shared with leg cancel predicates.
    completed: Rc<Cell<u64>>,
    searches: Vec<PendingSearch>,
    /// Ready plan waiting for the active execution to stop.
    queued: Option<Execution>,
    active: Option<Execution>,
    follow: Option<FollowState>,
    outbox: Vec<PathEvent>,
}

impl Pathfinder {
    pub fn new(config: PathfinderConfig) -> Self {
        let moves = MovementSet::from_config(&config.movement);
        Self::with_moves(config, moves)
    }

    /// Use a custom rule registry instead of the one `config.movement`
    /// describes.
    pub fn with_moves(config: PathfinderConfig, moves: MovementSet) -> Self {
        Self {
            config,
            moves,
            tick: 0,
            intent: 0,
            completed: Rc::new(Cell::new(0)),
            searches: Vec::new(),
            queued: None,
            active: None,
            follow: None,
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &PathfinderConfig {
        &self.config
    }

    pub fn moves(&self) -> &MovementSet {
        &self.moves
    }

    /// Generation of the most recent intent.
    pub fn generation(&self) -> u64 {
        self.intent
    }

    pub fn completed_generation(&self) -> u64 {
        self.completed.get()
    }

    /// Ticks processed so far.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Nothing planned, queued or executing.
    pub fn is_idle(&self) -> bool {
        self.searches.is_empty() && self.queued.is_none() && self.active.is_none()
    }

    pub fn is_following(&self) -> bool {
        self.follow.is_some()
    }

    /// Start moving toward `goal`. Returns the intent's generation. Any
    /// follow target is dropped; an execution already in flight keeps going
    /// until the new plan is ready.
    pub fn go_to<H: AgentHost + ?Sized>(
        &mut self,
        host: &H,
        goal: Goal,
        options: GoToOptions,
    ) -> Result<u64> {
        goal.validate()?;
        if options.straight && goal.target_point().is_none() {
            return Err(PathError::NoTargetPoint);
        }
        self.follow = None;
        let generation = self.next_generation();
        self.plan(host, goal, options, generation, 0)?;
        Ok(generation)
    }

    /// Keep moving toward a target whose position is fed in through
    /// `observe_target`.
    pub fn follow(&mut self, options: FollowOptions) {
        self.follow = Some(FollowState {
            options,
            target: None,
            planned_cell: None,
            last_replan: None,
        });
    }

    pub fn observe_target(&mut self, position: Vec3, on_ground: bool) {
        if let Some(follow) = self.follow.as_mut() {
            follow.target = Some((position, on_ground));
        }
    }

    /// Drop every search, plan, execution and follow target, and release
    /// all controls.
    pub fn stop<H: AgentHost + ?Sized>(&mut self, host: &mut H) {
        self.follow = None;
        self.searches.clear();
        self.queued = None;
        self.active = None;
        // Nothing issued before the stop may execute.
        let generation = self.next_generation();
        self.completed.set(generation);
        host.clear_controls();
        self.emit(generation, PathEventKind::Stopped);
    }

    /// Advance one tick: follow replans, search steps, then one executor
    /// decision. Returns the events of this tick (plus any queued by calls
    /// since the previous tick).
    pub fn tick<H: AgentHost + ?Sized>(&mut self, host: &mut H) -> Vec<PathEvent> {
        self.tick += 1;
        self.follow_tick(&*host);
        self.step_searches(&*host);
        self.drive(host);
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Planning
    // -----------------------------------------------------------------------

    fn next_generation(&mut self) -> u64 {
        self.intent += 1;
        self.intent
    }

    fn emit(&mut self, generation: u64, kind: PathEventKind) {
        self.outbox.push(PathEvent {
            tick: self.tick,
            generation,
            kind,
        });
    }

    fn budget(&self, options: &GoToOptions) -> SearchBudget {
        SearchBudget {
            time: options
                .timeout
                .unwrap_or(Duration::from_millis(self.config.search_timeout_ms)),
            max_expansions: self.config.max_expansions,
        }
    }

    fn plan<H: AgentHost + ?Sized>(
        &mut self,
        host: &H,
        goal: Goal,
        options: GoToOptions,
        generation: u64,
        continuations: u32,
    ) -> Result<()> {
        let agent = host.agent();
        if let Some(target) = goal.target_point() {
            let try_straight = self.config.straight_line && continuations == 0;
            let straight = options.straight
                || (try_straight && self.straight_run_reaches(host, &goal, target));
            if straight {
                debug!("generation {generation}: straight run to {target}");
                let leg = MoveLeg::straight(agent.position, target).centered(options.centered);
                let execution = Execution {
                    generation,
                    goal,
                    options,
                    continuations,
                    route: Route::Straight,
                    leg,
                };
                self.emit(
                    generation,
                    PathEventKind::StraightLine {
                        target: VoxelCoord::containing(target),
                    },
                );
                self.adopt(execution);
                return Ok(());
            }
        } else if options.straight {
            return Err(PathError::NoTargetPoint);
        }

        let start = ground_cell(host.world(), agent.cell());
        let search = AStarSearch::new(start, goal, self.budget(&options))?;
        self.searches.push(PendingSearch {
            search,
            generation,
            options,
            continuations,
        });
        Ok(())
    }

    /// Forward-simulate sprinting straight at `target`.
    fn straight_run_reaches<H: AgentHost + ?Sized>(
        &self,
        host: &H,
        goal: &Goal,
        target: Vec3,
    ) -> bool {
        let mut start = host.agent();
        start.yaw = look_angles(start.eye_position(), target + Vec3::new(0.0, EYE_HEIGHT, 0.0)).0;
        let max_air = self.config.straight_max_air_ticks;
        let run = simulate_until(
            host.physics(),
            host.world(),
            &start,
            ControlState::SPRINT,
            self.config.straight_horizon_ticks,
            |s| goal.is_end(s.position) || s.collided_horizontally || s.air_ticks > max_air,
        );
        run.satisfied && goal.is_end(run.state.position)
    }

    /// Make `execution` the newest ready plan.
    fn adopt(&mut self, mut execution: Execution) {
        self.completed.set(execution.generation);
        execution.leg = self.guard(execution.leg, execution.generation);
        if let Some(old) = self.queued.replace(execution) {
            debug!("generation {}: superseded before it started", old.generation);
        }
    }

    /// Attach the staleness check for `generation` to a leg.
    fn guard(&self, leg: MoveLeg, generation: u64) -> MoveLeg {
        let completed = Rc::clone(&self.completed);
        leg.cancel_when(move || completed.get() > generation)
    }

    fn follow_tick<H: AgentHost + ?Sized>(&mut self, host: &H) {
        let Some(follow) = self.follow.as_ref() else {
            return;
        };
        let Some((target, target_on_ground)) = follow.target else {
            return;
        };
        let options = follow.options;
        let agent = host.agent();
        let target_cell = VoxelCoord::containing(target);
        let distance = agent.position.distance(target);
        let interval = self.config.follow_replan_interval_ticks;

        let due = follow.last_replan.is_none_or(|t| self.tick - t >= interval);
        let moved = follow.planned_cell != Some(target_cell);
        let in_range = distance > options.min_distance
            && options.max_distance.is_none_or(|max| distance <= max);
        let idle = self.searches.is_empty();
        if !(agent.on_ground && target_on_ground && moved && due && in_range && idle) {
            return;
        }

        // With no stand-off distance the target's own block is the goal.
        let goal = if options.centered || options.min_distance <= 0.0 {
            Goal::block(target)
        } else {
            Goal::reach_within(target_cell, options.min_distance)
        };
        if let Err(err) = goal.validate() {
            warn!("cannot follow target at {target_cell}: {err}");
            return;
        }
        let go = GoToOptions {
            centered: options.centered,
            ..GoToOptions::default()
        };
        let generation = self.next_generation();
        debug!("generation {generation}: following target at {target_cell}");
        match self.plan(host, goal, go, generation, 0) {
            Ok(()) => {
                if let Some(follow) = self.follow.as_mut() {
                    follow.planned_cell = Some(target_cell);
                    follow.last_replan = Some(self.tick);
                }
            }
            Err(err) => warn!("follow replan toward {target_cell} failed: {err}"),
        }
    }

    // -----------------------------------------------------------------------
    // Searching
    // -----------------------------------------------------------------------

    fn step_searches<H: AgentHost + ?Sized>(&mut self, host: &H) {
        if self.searches.is_empty() {
            return;
        }
        let mut finished = Vec::new();
        {
            let mut graph = self.moves.over(host.world());
            let per_tick = self.config.expansions_per_tick;
            let mut i = 0;
            while i < self.searches.len() {
                match self.searches[i].search.step(&mut graph, per_tick) {
                    Ok(None) => i += 1,
                    Ok(Some(result)) => finished.push((self.searches.remove(i), Some(result))),
                    Err(err) => {
                        let generation = self.searches[i].generation;
                        warn!("search for generation {generation} failed: {err}");
                        finished.push((self.searches.remove(i), None));
                    }
                }
            }
        }
        // Newest first, so older results finishing on the same tick are stale.
        finished.sort_by(|a, b| b.0.generation.cmp(&a.0.generation));
        for (pending, result) in finished {
            match result {
                Some(result) => self.search_finished(pending, result),
                None => self.emit(
                    pending.generation,
                    PathEventKind::GaveUp {
                        continuations: pending.continuations,
                    },
                ),
            }
        }
    }

    fn search_finished(&mut self, pending: PendingSearch, result: SearchResult) {
        if pending.generation < self.completed.get() {
            debug!(
                "generation {}: discarding stale {:?} result (completed {})",
                pending.generation,
                result.status,
                self.completed.get()
            );
            return;
        }
        self.emit(
            pending.generation,
            PathEventKind::PathComputed {
                status: result.status,
                length: result.path.len(),
                cost: result.cost,
            },
        );
        let points = result.path.points();
        let leg = MoveLeg::along(points.clone());
        let execution = Execution {
            generation: pending.generation,
            goal: pending.search.goal().clone(),
            options: pending.options,
            continuations: pending.continuations,
            route: Route::Path {
                status: result.status,
                points,
                index: 0,
            },
            leg,
        };
        self.adopt(execution);
    }

    // -----------------------------------------------------------------------
    // Executing
    // -----------------------------------------------------------------------

    fn drive<H: AgentHost + ?Sized>(&mut self, host: &mut H) {
        loop {
            if self.active.is_none() {
                self.active = self.queued.take();
            }
            let Some(execution) = self.active.as_mut() else {
                return;
            };
            if let Route::Straight = execution.route {
                let agent = host.agent();
                let arrived = agent.on_ground && execution.goal.is_end(agent.position);
                if !execution.options.centered && arrived {
                    let Some(execution) = self.active.take() else {
                        return;
                    };
                    self.finish(host, &execution, PathEventKind::GoalReached);
                    continue;
                }
            }
            let Some(outcome) = execution.leg.tick(host, &self.config.executor) else {
                return;
            };
            let Some(execution) = self.active.take() else {
                return;
            };
            self.leg_resolved(host, execution, outcome);
        }
    }

    fn leg_resolved<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        mut execution: Execution,
        outcome: LegOutcome,
    ) {
        match outcome {
            LegOutcome::Stopped => {
                debug!("generation {}: execution superseded", execution.generation);
            }
            LegOutcome::TimedOut => {
                let target = VoxelCoord::containing(execution.leg.target());
                self.emit(execution.generation, PathEventKind::LegTimedOut { target });
                self.continue_intent(host, execution);
            }
            LegOutcome::Arrived { advance } => match execution.route {
                Route::Path { status, points, index } => {
                    let index = index + advance;
                    if index < points.len() {
                        let leg = MoveLeg::along(points[index..].to_vec());
                        execution.leg = self.guard(leg, execution.generation);
                        execution.route = Route::Path { status, points, index };
                        self.active = Some(execution);
                    } else {
                        execution.route = Route::Path { status, points, index };
                        self.path_walked(host, execution, status);
                    }
                }
                Route::Straight | Route::Centering => {
                    self.finish(host, &execution, PathEventKind::GoalReached)
                }
            },
        }
    }

    /// The last waypoint of a searched path has been reached.
    fn path_walked<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        mut execution: Execution,
        status: SearchStatus,
    ) {
        let agent = host.agent();
        let at_goal = execution.goal.is_end(agent.position);
        match status {
            SearchStatus::Timeout if !at_goal => self.continue_intent(host, execution),
            SearchStatus::NoPath if !at_goal => {
                self.finish(host, &execution, PathEventKind::PathExhausted { at: agent.cell() });
            }
            _ => match execution.goal.target_point() {
                Some(target) if execution.options.centered => {
                    let leg = MoveLeg::toward(target).centered(true);
                    execution.leg = self.guard(leg, execution.generation);
                    execution.route = Route::Centering;
                    self.active = Some(execution);
                }
                _ => self.finish(host, &execution, PathEventKind::GoalReached),
            },
        }
    }

    /// Replan from the agent's cell under the same generation.
    fn continue_intent<H: AgentHost + ?Sized>(&mut self, host: &mut H, execution: Execution) {
        host.clear_controls();
        let attempt = execution.continuations + 1;
        if self.config.max_continuations.is_some_and(|max| attempt > max) {
            warn!(
                "generation {}: giving up after {} continuations",
                execution.generation, execution.continuations
            );
            self.emit(
                execution.generation,
                PathEventKind::GaveUp {
                    continuations: execution.continuations,
                },
            );
            return;
        }
        let from = ground_cell(host.world(), host.agent().cell());
        let generation = execution.generation;
        debug!("generation {generation}: continuing from {from} (attempt {attempt})");
        self.emit(generation, PathEventKind::Continuing { from, attempt });
        let (goal, options) = (execution.goal, execution.options);
        if let Err(err) = self.plan(&*host, goal, options, generation, attempt) {
            warn!("generation {generation}: continuation failed: {err}");
            self.emit(generation, PathEventKind::GaveUp { continuations: attempt });
        }
    }

    fn finish<H: AgentHost + ?Sized>(
        &mut self,
        host: &mut H,
        execution: &Execution,
        kind: PathEventKind,
    ) {
        debug!("generation {}: {kind:?}", execution.generation);
        host.clear_controls();
        self.emit(execution.generation, kind);
    }
}

/// The cell an airborne agent is about to stand in: the first standable
/// cell at or below `cell`, looking a few blocks down.
fn ground_cell(world: &dyn BlockSource, cell: VoxelCoord) -> VoxelCoord {
    (0..4)
        .map(|drop| cell.down(drop))
        .find(|&c| world.is_standable(c))
        .unwrap_or(cell)
}
