// voxel_pathfinder: route planning and execution for an agent in a block world.
//
// This crate plans routes over a voxel lattice whose edges come from a
// registry of movement rules (walking, stepping up and down, parkour jumps,
// ladders, swimming), and drives an agent along them one physics tick at a
// time, forward-simulating jumps before committing to them. It owns neither
// the world nor the agent: both are reached through the `BlockSource`,
// `AgentHost` and `PhysicsStepper` traits, with headless implementations
// (`VoxelWorld`, `SimulatedAgent`, `BlockPhysics`) for tests and benches.
//
// Module overview:
// - `types.rs`:       VoxelCoord, Facing, BlockKind.
// - `world.rs`:       BlockSource predicates + the dense VoxelWorld grid.
// - `goal.rs`:        Goal variants: heuristic, arrival test, target point.
// - `movement.rs`:    MoveKind rules, MovementSet registry, neighbor sources.
// - `search.rs`:      Step-function A* with time budget and best-node fallback.
// - `agent.rs`:       AgentHost boundary, control outputs, SimulatedAgent.
// - `physics.rs`:     PhysicsStepper boundary, BlockPhysics, forward simulation.
// - `executor.rs`:    MoveLeg: per-tick control decisions for one leg.
// - `coordinator.rs`: Pathfinder: go_to / follow / stop, generations, continuations.
// - `event.rs`:       PathEvent output events.
// - `config.rs`:      PathfinderConfig, every tunable parameter.
// - `error.rs`:       PathError.
//
// **Single-threaded.** Searches and legs advance only when the host calls
// `Pathfinder::tick`; nothing here spawns threads or keeps timers beyond the
// search's wall-clock budget.

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod executor;
pub mod goal;
pub mod movement;
pub mod physics;
pub mod search;
pub mod types;
pub mod world;
