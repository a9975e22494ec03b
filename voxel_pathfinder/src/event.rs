// Pathfinder output events.
//
// `Pathfinder::tick` returns the events that happened during that tick, in
// the order they happened. Each carries the tick number and the generation
// of the intent it belongs to, so a caller that issued several `go_to`s can
// tell which one finished. Events of a superseded generation are never
// emitted: a stale plan is dropped silently.
//
// See also: `coordinator.rs` which emits these.

use crate::search::SearchStatus;
use crate::types::VoxelCoord;
use serde::{Deserialize, Serialize};

/// Something the pathfinder did or concluded during a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathEvent {
    pub tick: u64,
    pub generation: u64,
    pub kind: PathEventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathEventKind {
    /// A search finished and its path was handed to the executor.
    PathComputed { status: SearchStatus, length: usize, cost: f32 },
    /// A straight-line run was chosen instead of a search.
    StraightLine { target: VoxelCoord },
    /// A search timed out (or a leg got stuck) and planning resumed from the
    /// agent's current cell under the same generation.
    Continuing { from: VoxelCoord, attempt: u32 },
    /// The agent stands at the goal.
    GoalReached,
    /// The best partial path of a `NoPath` search has been walked; the goal
    /// is not reachable from here.
    PathExhausted { at: VoxelCoord },
    /// A leg did not arrive within its timeout.
    LegTimedOut { target: VoxelCoord },
    /// `stop()` was called.
    Stopped,
    /// The continuation ceiling was hit without reaching the goal.
    GaveUp { continuations: u32 },
}

impl PathEventKind {
    /// Whether this event ends its generation's intent.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PathEventKind::GoalReached
                | PathEventKind::PathExhausted { .. }
                | PathEventKind::Stopped
                | PathEventKind::GaveUp { .. }
        )
    }
}
