// Goals: what "arrived" and "how close" mean.
//
// A `Goal` is an immutable value exposing three queries:
// - `heuristic(cell)`: estimated remaining cost from a lattice cell, evaluated
//   once per discovered search node, so it must stay O(1) per point goal.
// - `is_end(point)`: arrival test on a *continuous* position (the agent's
//   feet). The search calls it with the block-centred point of a node; the
//   executor calls it with the live agent position.
// - `equals(cell)`: whether a lattice cell is the goal's own cell.
//
// Variants: `Exact` (a raw point), `Block` (snapped to the block centre),
// `Reach` (arrived once the target is within arm's reach of the eyes), and
// `Any` (the best of several sub-goals). An empty `Any` has no meaning and is
// rejected by `validate()` with `PathError::InvalidGoal`.
//
// The heuristic counts vertical distance twice so the search prefers to
// resolve height early; it is not admissible for every movement rule, which
// the non-reopening search tolerates (see `search.rs`).

use crate::error::{PathError, Result};
use crate::types::VoxelCoord;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Height of the agent's eyes above its feet.
pub const EYE_HEIGHT: f32 = 1.625;

/// Horizontal slack for a `centered` on-block check.
pub const CENTER_TOLERANCE: f32 = 0.2;

/// Default arm's reach for `Goal::Reach`.
pub const DEFAULT_REACH: f32 = 3.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Goal {
    /// Stand on the block containing `pos`.
    Exact { pos: Vec3 },
    /// Like `Exact`, with `pos` snapped to the horizontal block centre.
    Block { pos: Vec3 },
    /// Get the eyes within `radius` of the point `EYE_HEIGHT` above `pos`.
    Reach { pos: Vec3, radius: f32 },
    /// Arrive at whichever sub-goal is satisfied first.
    Any(Vec<Goal>),
}

impl Goal {
    pub fn exact(pos: Vec3) -> Self {
        Goal::Exact { pos }
    }

    /// Block goal: x/z floored then centred, y kept as given.
    pub fn block(pos: Vec3) -> Self {
        Goal::Block {
            pos: Vec3::new(pos.x.floor() + 0.5, pos.y, pos.z.floor() + 0.5),
        }
    }

    pub fn block_at(cell: VoxelCoord) -> Self {
        Goal::Block {
            pos: cell.floor_center(),
        }
    }

    /// Reach goal around a block, with the default reach.
    pub fn reach(cell: VoxelCoord) -> Self {
        Self::reach_within(cell, DEFAULT_REACH)
    }

    pub fn reach_within(cell: VoxelCoord, radius: f32) -> Self {
        Goal::Reach {
            pos: cell.floor_center(),
            radius,
        }
    }

    pub fn any(goals: Vec<Goal>) -> Self {
        Goal::Any(goals)
    }

    /// Reject goals with no meaning: empty composites, non-finite targets,
    /// non-positive reach.
    pub fn validate(&self) -> Result<()> {
        match self {
            Goal::Exact { pos } | Goal::Block { pos } => check_point(*pos),
            Goal::Reach { pos, radius } => {
                check_point(*pos)?;
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(PathError::InvalidGoal(format!(
                        "reach radius must be positive, got {radius}"
                    )));
                }
                Ok(())
            }
            Goal::Any(goals) => {
                if goals.is_empty() {
                    return Err(PathError::InvalidGoal(
                        "composite goal has no sub-goals".into(),
                    ));
                }
                goals.iter().try_for_each(Goal::validate)
            }
        }
    }

    /// Estimated remaining cost from `cell`. Never negative.
    pub fn heuristic(&self, cell: VoxelCoord) -> f32 {
        match self {
            Goal::Exact { pos } | Goal::Block { pos } | Goal::Reach { pos, .. } => {
                let here = cell.floor_center();
                xz_distance(here, *pos) + (here.y - pos.y).abs() * 2.0
            }
            Goal::Any(goals) => goals
                .iter()
                .map(|g| g.heuristic(cell))
                .fold(f32::MAX, f32::min),
        }
    }

    /// Arrival test for a continuous feet position.
    pub fn is_end(&self, point: Vec3) -> bool {
        match self {
            Goal::Exact { pos } | Goal::Block { pos } => is_on_block(point, *pos, true, false),
            Goal::Reach { pos, radius } => {
                can_reach(point, *pos + Vec3::new(0.0, EYE_HEIGHT, 0.0), *radius)
            }
            Goal::Any(goals) => goals.iter().any(|g| g.is_end(point)),
        }
    }

    /// Whether `cell` is the goal's own cell.
    pub fn equals(&self, cell: VoxelCoord) -> bool {
        match self {
            Goal::Exact { pos } | Goal::Block { pos } | Goal::Reach { pos, .. } => {
                VoxelCoord::containing(*pos) == cell
            }
            Goal::Any(goals) => goals.iter().any(|g| g.equals(cell)),
        }
    }

    /// The single point this goal aims at, if it has one. Composite goals
    /// have none.
    pub fn target_point(&self) -> Option<Vec3> {
        match self {
            Goal::Exact { pos } | Goal::Block { pos } | Goal::Reach { pos, .. } => Some(*pos),
            Goal::Any(_) => None,
        }
    }
}

fn check_point(pos: Vec3) -> Result<()> {
    if pos.is_finite() {
        Ok(())
    } else {
        Err(PathError::InvalidGoal(format!("non-finite target {pos}")))
    }
}

/// Horizontal (x/z) distance between two points.
pub fn xz_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Whether feet at `point` count as standing on the block at `target`.
///
/// Horizontally the point must share the target's block column, or with
/// `centered` lie within `CENTER_TOLERANCE` of the target. Vertically a
/// grounded agent must be level with the target; an airborne one may still
/// be rising over it.
pub fn is_on_block(point: Vec3, target: Vec3, on_ground: bool, centered: bool) -> bool {
    let horizontal = if centered {
        xz_distance(point, target) < CENTER_TOLERANCE
    } else {
        point.x.floor() == target.x.floor() && point.z.floor() == target.z.floor()
    };
    if !horizontal {
        return false;
    }
    let dy = point.y - target.y;
    if on_ground {
        (-0.5..0.5).contains(&dy)
    } else {
        (-0.5..1.5).contains(&dy)
    }
}

/// Whether eyes above feet at `point` are within `reach` of `target`.
pub fn can_reach(point: Vec3, target: Vec3, reach: f32) -> bool {
    let eyes = point + Vec3::new(0.0, EYE_HEIGHT, 0.0);
    eyes.distance(target) <= reach
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_goal_snaps_to_center() {
        let goal = Goal::block(Vec3::new(5.9, 0.0, -0.2));
        assert_eq!(goal.target_point(), Some(Vec3::new(5.5, 0.0, -0.5)));
    }

    #[test]
    fn heuristic_is_horizontal_plus_double_vertical() {
        let goal = Goal::block_at(VoxelCoord::new(5, 0, 0));
        assert_eq!(goal.heuristic(VoxelCoord::new(0, 0, 0)), 5.0);
        assert_eq!(goal.heuristic(VoxelCoord::new(5, 2, 0)), 4.0);
        assert_eq!(goal.heuristic(VoxelCoord::new(5, 0, 0)), 0.0);
    }

    #[test]
    fn block_goal_ends_on_its_block_only() {
        let goal = Goal::block_at(VoxelCoord::new(5, 0, 0));
        assert!(goal.is_end(Vec3::new(5.5, 0.0, 0.5)));
        assert!(goal.is_end(Vec3::new(5.05, 0.0, 0.95)));
        assert!(!goal.is_end(Vec3::new(4.5, 0.0, 0.5)));
        assert!(!goal.is_end(Vec3::new(5.5, 1.0, 0.5)));
    }

    #[test]
    fn reach_goal_ends_within_radius() {
        let goal = Goal::reach_within(VoxelCoord::new(10, 0, 0), 3.0);
        // Node (7,0,0) is block-centred at x = 7.5, three units short.
        assert!(goal.is_end(VoxelCoord::new(7, 0, 0).floor_center()));
        assert!(!goal.is_end(VoxelCoord::new(6, 0, 0).floor_center()));
        assert!(goal.is_end(VoxelCoord::new(10, 0, 0).floor_center()));
    }

    #[test]
    fn any_goal_takes_best_child() {
        let near = Goal::block_at(VoxelCoord::new(2, 0, 0));
        let far = Goal::block_at(VoxelCoord::new(20, 0, 0));
        let goal = Goal::any(vec![far.clone(), near.clone()]);
        let origin = VoxelCoord::new(0, 0, 0);
        assert_eq!(goal.heuristic(origin), near.heuristic(origin));
        assert!(goal.is_end(Vec3::new(20.5, 0.0, 0.5)));
        assert!(goal.is_end(Vec3::new(2.5, 0.0, 0.5)));
        assert!(!goal.is_end(Vec3::new(10.5, 0.0, 0.5)));
        assert!(goal.equals(VoxelCoord::new(20, 0, 0)));
        assert_eq!(goal.target_point(), None);
    }

    #[test]
    fn empty_any_is_invalid() {
        let err = Goal::any(Vec::new()).validate().unwrap_err();
        assert!(matches!(err, PathError::InvalidGoal(_)));
        // Nested empties are caught too.
        let nested = Goal::any(vec![Goal::block_at(VoxelCoord::new(0, 0, 0)), Goal::any(vec![])]);
        assert!(nested.validate().is_err());
    }

    #[test]
    fn non_finite_and_zero_radius_are_invalid() {
        assert!(Goal::exact(Vec3::new(f32::NAN, 0.0, 0.0)).validate().is_err());
        assert!(Goal::reach_within(VoxelCoord::new(0, 0, 0), 0.0).validate().is_err());
        assert!(Goal::reach(VoxelCoord::new(0, 0, 0)).validate().is_ok());
    }

    #[test]
    fn centered_check_is_tighter_than_column_check() {
        let target = Vec3::new(3.5, 1.0, 3.5);
        let off_center = Vec3::new(3.1, 1.0, 3.5);
        assert!(is_on_block(off_center, target, true, false));
        assert!(!is_on_block(off_center, target, true, true));
        assert!(is_on_block(Vec3::new(3.45, 1.0, 3.55), target, true, true));
    }

    #[test]
    fn airborne_agent_may_be_above_block() {
        let target = Vec3::new(0.5, 0.0, 0.5);
        let mid_hop = Vec3::new(0.5, 1.1, 0.5);
        assert!(!is_on_block(mid_hop, target, true, false));
        assert!(is_on_block(mid_hop, target, false, false));
    }

    #[test]
    fn goal_serialization_roundtrip() {
        let goal = Goal::any(vec![
            Goal::block_at(VoxelCoord::new(1, 2, 3)),
            Goal::reach(VoxelCoord::new(-4, 0, 9)),
        ]);
        let json = serde_json::to_string(&goal).unwrap();
        let restored: Goal = serde_json::from_str(&json).unwrap();
        assert_eq!(goal, restored);
    }
}
