//! Breadth-first path search over the 4-connected walkable grid.

use std::collections::HashSet;

use glam::IVec2;
use pathfinding::prelude::bfs;
use tracing::trace;

use crate::map::direction::Direction;
use crate::map::flags::AgentKind;
use crate::map::grid::Grid;

/// Finds the shortest path from `start` to whichever cell of `goals` is nearest by hop count.
///
/// The returned path includes both `start` and the reached goal. Neighbors are visited in
/// [`Direction::SEARCH_ORDER`], so among equally near goals the first one discovered in that
/// order wins. Returns `None` when no goal is reachable (including an empty goal set).
pub fn nearest_path(grid: &Grid, start: IVec2, goals: &HashSet<IVec2>, kind: AgentKind) -> Option<Vec<IVec2>> {
    if goals.is_empty() {
        return None;
    }

    let path = bfs(
        &start,
        |&cell| {
            Direction::SEARCH_ORDER
                .into_iter()
                .map(move |dir| cell + dir.as_ivec2())
                .filter(|&next| grid.is_walkable(next, kind))
        },
        |cell| goals.contains(cell),
    );

    trace!(?start, goals = goals.len(), hops = path.as_ref().map(|p| p.len() - 1), "Nearest path search");
    path
}

/// Convenience wrapper for a slice of goals.
pub fn nearest_path_to_any(grid: &Grid, start: IVec2, goals: &[IVec2], kind: AgentKind) -> Option<Vec<IVec2>> {
    let goals: HashSet<IVec2> = goals.iter().copied().collect();
    nearest_path(grid, start, &goals, kind)
}
