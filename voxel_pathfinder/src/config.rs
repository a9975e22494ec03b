// Data-driven pathfinder configuration.
//
// Every tunable constant of the pathfinder lives in `PathfinderConfig`,
// loadable from JSON. The control loop never uses magic numbers: search
// budgets, jump-prediction horizons, landing thresholds, path tolerances and
// leg timeouts are all read from here. Parameters are grouped into nested
// structs: `MovementConfig` (which rule groups are registered),
// `ExecutorConfig` (per-tick control decisions) and `PhysicsConfig` (the
// reference block physics used for headless runs and prediction).
//
// All structs are `#[serde(default)]`, so a JSON file only needs the fields
// it overrides; unknown fields are rejected so typos fail loudly.
//
// See also: `movement.rs` which builds its rule registry from
// `MovementConfig`, `executor.rs` and `physics.rs` which read the other two
// groups, `coordinator.rs` which owns the top-level config.

use crate::error::Result;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Nested parameter groups
// ---------------------------------------------------------------------------

/// Which movement rule groups are registered. Walking rules are always on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementConfig {
    pub allow_parkour: bool,
    pub allow_ladders: bool,
    pub allow_swimming: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            allow_parkour: true,
            allow_ladders: true,
            allow_swimming: true,
        }
    }
}

/// Thresholds for the executor's per-tick decisions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Ticks to forward-simulate a sprint jump before giving up on landing.
    pub sprint_jump_horizon_ticks: u32,
    /// A sprint jump must carry the agent farther than this.
    pub sprint_jump_min_distance: f32,
    /// A sprint jump may not land lower than this below the take-off point.
    pub sprint_jump_max_fall: f32,
    /// Ticks to forward-simulate a walking hop.
    pub hop_horizon_ticks: u32,
    pub hop_min_distance: f32,
    pub hop_max_fall: f32,
    /// How many path segments a hop landing is checked against.
    pub hop_path_lookahead: usize,
    /// How many path segments a general on-path check scans.
    pub path_lookahead: usize,
    /// Max distance from a path segment that still counts as on the path.
    pub path_tolerance: f32,
    /// Within this horizontal distance of a swim/climb target, stop pushing
    /// forward and only ascend.
    pub swim_forward_cutoff: f32,
    /// Auto-jump fires when horizontal speed falls below this while pressed
    /// against a wall.
    pub stall_horizontal_speed: f32,
    pub stall_vertical_speed: f32,
    /// Sprint is suppressed within this distance of a centered target.
    pub centered_walk_distance: f32,
    /// A leg that has not arrived after this many ticks, plus
    /// `leg_timeout_ticks_per_block` for each block of initial distance,
    /// resolves `TimedOut`. `None` disables the timeout.
    pub leg_timeout_ticks: Option<u32>,
    pub leg_timeout_ticks_per_block: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            sprint_jump_horizon_ticks: 40,
            sprint_jump_min_distance: 0.5,
            sprint_jump_max_fall: 2.5,
            hop_horizon_ticks: 20,
            hop_min_distance: 1.0,
            hop_max_fall: 2.0,
            hop_path_lookahead: 10,
            path_lookahead: 100,
            path_tolerance: 0.7,
            swim_forward_cutoff: 0.5,
            stall_horizontal_speed: 0.01,
            stall_vertical_speed: 0.1,
            centered_walk_distance: 1.0,
            leg_timeout_ticks: Some(100),
            leg_timeout_ticks_per_block: 10,
        }
    }
}

/// Constants of the reference block physics, in blocks and ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    pub gravity: f32,
    /// Vertical velocity multiplier per airborne tick.
    pub vertical_drag: f32,
    /// Horizontal velocity multiplier per tick while airborne.
    pub air_drag: f32,
    /// Horizontal velocity multiplier per tick while grounded.
    pub ground_friction: f32,
    pub walk_acceleration: f32,
    pub sprint_multiplier: f32,
    pub sneak_multiplier: f32,
    pub air_acceleration: f32,
    pub sprint_air_acceleration: f32,
    pub jump_velocity: f32,
    /// Extra horizontal impulse along the facing when jumping while sprinting.
    pub sprint_jump_boost: f32,
    pub water_gravity: f32,
    pub water_drag: f32,
    pub water_acceleration: f32,
    pub swim_up_acceleration: f32,
    /// Upward speed when swimming into a wall with jump held.
    pub water_exit_velocity: f32,
    pub ladder_climb_speed: f32,
    pub ladder_max_descent: f32,
    pub agent_width: f32,
    pub agent_height: f32,
    pub terminal_velocity: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.08,
            vertical_drag: 0.98,
            air_drag: 0.91,
            ground_friction: 0.546,
            walk_acceleration: 0.1,
            sprint_multiplier: 1.3,
            sneak_multiplier: 0.3,
            air_acceleration: 0.02,
            sprint_air_acceleration: 0.026,
            jump_velocity: 0.42,
            sprint_jump_boost: 0.2,
            water_gravity: 0.02,
            water_drag: 0.8,
            water_acceleration: 0.02,
            swim_up_acceleration: 0.04,
            water_exit_velocity: 0.3,
            ladder_climb_speed: 0.2,
            ladder_max_descent: 0.15,
            agent_width: 0.6,
            agent_height: 1.8,
            terminal_velocity: 3.92,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathfinderConfig {
    /// Wall-clock budget for one search, in milliseconds.
    pub search_timeout_ms: u64,
    /// Optional cap on node expansions per search.
    pub max_expansions: Option<u64>,
    /// Node expansions performed per tick while a search is in flight.
    pub expansions_per_tick: usize,
    /// Try a predicted straight sprint toward the goal before searching.
    pub straight_line: bool,
    /// Same-generation continuations (after `Timeout` or a stuck leg) allowed
    /// before giving up. `None` continues forever.
    pub max_continuations: Option<u32>,
    /// Ticks between follow replans.
    pub follow_replan_interval_ticks: u64,
    /// Ticks to forward-simulate the straight-line sprint check.
    pub straight_horizon_ticks: u32,
    /// The straight-line check fails after this many consecutive air ticks.
    pub straight_max_air_ticks: u32,
    pub movement: MovementConfig,
    pub executor: ExecutorConfig,
    pub physics: PhysicsConfig,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            search_timeout_ms: 1000,
            max_expansions: None,
            expansions_per_tick: 2000,
            straight_line: true,
            max_continuations: Some(16),
            follow_replan_interval_ticks: 2,
            straight_horizon_ticks: 200,
            straight_max_air_ticks: 15,
            movement: MovementConfig::default(),
            executor: ExecutorConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl PathfinderConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathError;

    #[test]
    fn default_config_serializes() {
        let config = PathfinderConfig::default();
        let json = config.to_json().unwrap();
        let restored = PathfinderConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{
            "search_timeout_ms": 250,
            "executor": { "path_tolerance": 0.5 },
            "movement": { "allow_parkour": false }
        }"#;
        let config = PathfinderConfig::from_json(json).unwrap();
        assert_eq!(config.search_timeout_ms, 250);
        assert_eq!(config.executor.path_tolerance, 0.5);
        assert_eq!(config.executor.sprint_jump_horizon_ticks, 40);
        assert!(!config.movement.allow_parkour);
        assert!(config.movement.allow_swimming);
        assert_eq!(config.physics, PhysicsConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = PathfinderConfig::from_json(r#"{ "search_timeout": 5 }"#).unwrap_err();
        assert!(matches!(err, PathError::Config(_)));
    }

    #[test]
    fn optional_limits_accept_null() {
        let json = r#"{ "max_continuations": null, "executor": { "leg_timeout_ticks": null } }"#;
        let config = PathfinderConfig::from_json(json).unwrap();
        assert_eq!(config.max_continuations, None);
        assert_eq!(config.executor.leg_timeout_ticks, None);
    }
}
