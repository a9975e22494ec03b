// Anytime A* over the movement graph.
//
// A non-reopening A* with a best-effort fallback. The open set is a
// `BinaryHeap` (min-heap via reversed ordering) with lazy reprioritization:
// when a node's `g` improves, a fresh entry is pushed and the old one is
// skipped on pop because its recorded `g` no longer matches. Ties on `f` are
// broken by insertion sequence, so identical inputs always produce identical
// paths.
//
// Nodes live in an arena (`Vec<Node>`) indexed by `NodeId`; each stores its
// parent id, so reconstruction is an index walk. Positions map to node ids
// through an `FxHashMap` keyed by `VoxelCoord::packed`. Closed nodes are
// never reopened, even when a cheaper route to them turns up later: the
// heuristic double-counts vertical distance and is not admissible for every
// movement rule, and callers rely on the resulting cost/length trade-off.
//
// The engine is a step function. `AStarSearch::step` expands at most
// `max_expansions` nodes and returns `None` while the search is still
// running, so a host can interleave it with its own tick loop; `search` runs
// one to completion. Every search tracks the node with the lowest heuristic
// seen so far, and both `NoPath` and `Timeout` return the path to it.
//
// See also: `movement.rs` for the `Neighbors` source, `goal.rs` for the
// heuristic and arrival test, `coordinator.rs` which drives the step
// function from the tick loop.

use crate::error::{PathError, Result};
use crate::goal::Goal;
use crate::movement::{Candidates, MoveKind, Neighbors};
use crate::types::VoxelCoord;
use glam::Vec3;
use log::{trace, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStatus {
    Success,
    /// Open set exhausted; the path leads to the closest node found.
    NoPath,
    /// Budget exhausted; the path leads to the closest node found so far.
    Timeout,
}

/// Ordered lattice route from the start cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub positions: Vec<VoxelCoord>,
    /// Rule used for each step (len = positions.len() - 1).
    pub moves: Vec<MoveKind>,
    /// Cost of each step (len = positions.len() - 1).
    pub step_costs: Vec<f32>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn start(&self) -> Option<VoxelCoord> {
        self.positions.first().copied()
    }

    pub fn end(&self) -> Option<VoxelCoord> {
        self.positions.last().copied()
    }

    /// Waypoints for the executor: block-centred feet positions.
    pub fn points(&self) -> Vec<Vec3> {
        self.positions.iter().map(|p| p.floor_center()).collect()
    }

    pub fn total_cost(&self) -> f32 {
        self.step_costs.iter().sum()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes popped and closed.
    pub expansions: u64,
    /// Distinct positions discovered.
    pub discovered: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub status: SearchStatus,
    /// g of the final node.
    pub cost: f32,
    pub path: Path,
    pub stats: SearchStats,
}

/// Limits on one search. The search stops with `Timeout` when either is
/// exceeded; both are checked once per expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchBudget {
    pub time: Duration,
    pub max_expansions: Option<u64>,
}

impl SearchBudget {
    pub fn time(time: Duration) -> Self {
        Self {
            time,
            max_expansions: None,
        }
    }

    /// Expansion cap only, for deterministic timeouts.
    pub fn expansions(max: u64) -> Self {
        Self {
            time: Duration::MAX,
            max_expansions: Some(max),
        }
    }

    pub fn unlimited() -> Self {
        Self::time(Duration::MAX)
    }
}

type NodeId = usize;

struct Node {
    pos: VoxelCoord,
    g: f32,
    h: f32,
    parent: Option<NodeId>,
    /// Rule and cost of the step from `parent`.
    via: Option<(MoveKind, f32)>,
    closed: bool,
}

/// Entry in the open set (min-heap via reversed ordering).
struct OpenEntry {
    f_score: f32,
    /// g at push time; a mismatch on pop marks the entry stale.
    g_score: f32,
    seq: u64,
    node: NodeId,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score, then oldest, is "greatest".
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct AStarSearch {
    goal: Goal,
    budget: SearchBudget,
    nodes: Vec<Node>,
    index: FxHashMap<u64, NodeId>,
    open: BinaryHeap<OpenEntry>,
    seq: u64,
    best: NodeId,
    expansions: u64,
    started: Instant,
    finished: Option<(SearchStatus, NodeId)>,
    buf: Candidates,
}

impl AStarSearch {
    /// Start a search. Fails with `InvalidGoal` if the goal is malformed or
    /// its heuristic misbehaves at `start`.
    pub fn new(start: VoxelCoord, goal: Goal, budget: SearchBudget) -> Result<Self> {
        goal.validate()?;
        let h = checked_heuristic(&goal, start)?;
        let mut search = Self {
            goal,
            budget,
            nodes: Vec::new(),
            index: FxHashMap::default(),
            open: BinaryHeap::new(),
            seq: 0,
            best: 0,
            expansions: 0,
            started: Instant::now(),
            finished: None,
            buf: Candidates::new(),
        };
        search.nodes.push(Node {
            pos: start,
            g: 0.0,
            h,
            parent: None,
            via: None,
            closed: false,
        });
        search.index.insert(start.packed(), 0);
        search.push_open(0);
        Ok(search)
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn start(&self) -> VoxelCoord {
        self.nodes[0].pos
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    /// Number of nodes closed so far.
    pub fn closed_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.closed).count()
    }

    /// Expand up to `max_expansions` nodes. Returns the result once the
    /// search has finished, `None` while it is still running.
    pub fn step<N: Neighbors + ?Sized>(
        &mut self,
        neighbors: &mut N,
        max_expansions: usize,
    ) -> Result<Option<SearchResult>> {
        if let Some((status, node)) = self.finished {
            return Ok(Some(self.result(status, node)));
        }

        let mut expanded = 0;
        while expanded < max_expansions {
            if self.over_budget() {
                return Ok(Some(self.finish(SearchStatus::Timeout, self.best)));
            }
            let Some(entry) = self.open.pop() else {
                return Ok(Some(self.finish(SearchStatus::NoPath, self.best)));
            };
            let id = entry.node;
            if self.nodes[id].closed || self.nodes[id].g.to_bits() != entry.g_score.to_bits() {
                continue;
            }

            let pos = self.nodes[id].pos;
            if self.goal.is_end(pos.floor_center()) {
                return Ok(Some(self.finish(SearchStatus::Success, id)));
            }

            self.nodes[id].closed = true;
            self.expansions += 1;
            expanded += 1;

            let mut buf = std::mem::take(&mut self.buf);
            buf.clear();
            neighbors.neighbors(pos, &mut buf);
            let result = buf.iter().try_for_each(|t| self.relax(id, t.target, t.cost, t.kind));
            self.buf = buf;
            result?;
        }
        Ok(None)
    }

    fn relax(&mut self, from: NodeId, target: VoxelCoord, cost: f32, kind: MoveKind) -> Result<()> {
        if !(cost.is_finite() && cost >= 0.0) {
            warn!("ignoring transition to {target} with cost {cost}");
            return Ok(());
        }
        let g = self.nodes[from].g + cost;
        match self.index.get(&target.packed()) {
            Some(&id) => {
                let node = &mut self.nodes[id];
                if node.closed || g >= node.g {
                    return Ok(());
                }
                node.g = g;
                node.parent = Some(from);
                node.via = Some((kind, cost));
                self.push_open(id);
            }
            None => {
                let h = checked_heuristic(&self.goal, target)?;
                let id = self.nodes.len();
                self.nodes.push(Node {
                    pos: target,
                    g,
                    h,
                    parent: Some(from),
                    via: Some((kind, cost)),
                    closed: false,
                });
                self.index.insert(target.packed(), id);
                if h < self.nodes[self.best].h {
                    self.best = id;
                }
                self.push_open(id);
            }
        }
        Ok(())
    }

    fn push_open(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        self.open.push(OpenEntry {
            f_score: node.g + node.h,
            g_score: node.g,
            seq: self.seq,
            node: id,
        });
        self.seq += 1;
    }

    fn over_budget(&self) -> bool {
        let capped = self
            .budget
            .max_expansions
            .is_some_and(|max| self.expansions >= max);
        capped || self.started.elapsed() > self.budget.time
    }

    fn finish(&mut self, status: SearchStatus, node: NodeId) -> SearchResult {
        self.finished = Some((status, node));
        let result = self.result(status, node);
        trace!(
            "search {:?} after {} expansions, {} nodes, {:?}",
            status,
            result.stats.expansions,
            result.stats.discovered,
            result.stats.elapsed
        );
        result
    }

    fn result(&self, status: SearchStatus, node: NodeId) -> SearchResult {
        SearchResult {
            status,
            cost: self.nodes[node].g,
            path: self.reconstruct(node),
            stats: SearchStats {
                expansions: self.expansions,
                discovered: self.nodes.len(),
                elapsed: self.started.elapsed(),
            },
        }
    }

    fn reconstruct(&self, mut id: NodeId) -> Path {
        let mut path = Path::default();
        loop {
            let node = &self.nodes[id];
            path.positions.push(node.pos);
            if let Some((kind, cost)) = node.via {
                path.moves.push(kind);
                path.step_costs.push(cost);
            }
            match node.parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
        path.positions.reverse();
        path.moves.reverse();
        path.step_costs.reverse();
        path
    }
}

/// Run a search to completion.
pub fn search<N: Neighbors + ?Sized>(
    start: VoxelCoord,
    goal: Goal,
    neighbors: &mut N,
    budget: SearchBudget,
) -> Result<SearchResult> {
    let mut search = AStarSearch::new(start, goal, budget)?;
    loop {
        if let Some(result) = search.step(neighbors, usize::MAX)? {
            return Ok(result);
        }
    }
}

fn checked_heuristic(goal: &Goal, cell: VoxelCoord) -> Result<f32> {
    let h = goal.heuristic(cell);
    if h.is_finite() && h >= 0.0 {
        Ok(h)
    } else {
        Err(PathError::InvalidGoal(format!("heuristic {h} at {cell}")))
    }
}
