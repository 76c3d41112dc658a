//! Connected-region search for clearing
//!
//! A region is a maximal set of orthogonally adjacent cells of one color.
//! Regions of at least `CLEAR_THRESHOLD` cells are cleared.

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Board, Position};
use serde::{Deserialize, Serialize};

/// Minimum region size that gets cleared
pub const CLEAR_THRESHOLD: usize = 4;

/// Neighbor order: right, down, left, up
const NEIGHBORS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// How many qualifying regions a single clear pass removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearRule {
    /// Only the first region found in row-major scan order
    #[default]
    FirstRegion,
    /// Every qualifying region on the board at once
    AllRegions,
}

impl ClearRule {
    pub fn name(&self) -> &'static str {
        match self {
            ClearRule::FirstRegion => "First region",
            ClearRule::AllRegions => "All regions",
        }
    }
}

/// Find the first region of `CLEAR_THRESHOLD`+ cells, scanning top to
/// bottom and left to right. Empty if nothing qualifies.
pub fn find_clearable_region(board: &Board) -> Vec<Position> {
    find_clearable(board, ClearRule::FirstRegion)
}

/// Find the cells a clear pass removes under the given rule
pub fn find_clearable(board: &Board, rule: ClearRule) -> Vec<Position> {
    let mut visited = [false; BOARD_WIDTH * BOARD_HEIGHT];
    let mut cleared = Vec::new();

    for (start, _) in board.occupied() {
        if visited[start.index()] {
            continue;
        }

        let region = explore(board, start, &mut visited);
        if region.len() >= CLEAR_THRESHOLD {
            match rule {
                ClearRule::FirstRegion => return region,
                ClearRule::AllRegions => cleared.extend(region),
            }
        }
    }

    cleared
}

/// Depth-first walk over same-colored neighbors, marking `visited`
fn explore(board: &Board, start: Position, visited: &mut [bool]) -> Vec<Position> {
    let Some(color) = board.get(start).map(|cell| cell.color) else {
        return Vec::new();
    };

    let mut region = Vec::new();
    let mut stack = vec![start];
    visited[start.index()] = true;

    while let Some(pos) = stack.pop() {
        region.push(pos);

        for (dx, dy) in NEIGHBORS {
            let nx = pos.x as i32 + dx;
            let ny = pos.y as i32 + dy;
            if !board.is_within_bounds(nx, ny as f64) {
                continue;
            }

            let next = Position::new(nx as usize, ny as usize);
            if visited[next.index()] {
                continue;
            }
            if board.get(next).is_some_and(|cell| cell.color == color) {
                visited[next.index()] = true;
                stack.push(next);
            }
        }
    }

    region
}
