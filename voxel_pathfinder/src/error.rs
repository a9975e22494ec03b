// Error types for the pathfinder.
//
// Only genuinely fatal conditions are errors. Search outcomes (`NoPath`,
// `Timeout`) are `SearchStatus` values and leg outcomes (`Stopped`,
// `TimedOut`) are `LegOutcome` values; a superseded plan is discarded
// silently and never surfaces here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    /// Malformed goal: an empty composite, or a heuristic that produced a
    /// non-finite or negative value. Not retried.
    #[error("invalid goal: {0}")]
    InvalidGoal(String),

    /// Straight-line movement was requested for a goal without a single
    /// target point.
    #[error("goal has no target point for straight-line movement")]
    NoTargetPoint,

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PathError>;
