//! Read-only view of the simulation for renderers

use crate::color::{ColorPair, PuyoColor};
use crate::game::Phase;

/// A placed cell as it should be drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellView {
    pub x: usize,
    pub y: usize,
    pub color: PuyoColor,
    /// Row to draw at; differs from `y` while settling
    pub visual_row: f64,
    /// 1.0 at rest, shrinking toward 0.0 while clearing
    pub visual_scale: f64,
}

/// One cell of the active pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceCellView {
    pub color: PuyoColor,
    pub x: i32,
    /// Fractional row
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cells: Vec<CellView>,
    /// Empty unless a pair is under control
    pub piece: Vec<PieceCellView>,
    /// Upcoming pairs, next first
    pub preview: Vec<ColorPair>,
    pub phase: Phase,
    pub game_over: bool,
}

impl Snapshot {
    /// Placed cell at a grid position
    pub fn cell_at(&self, x: usize, y: usize) -> Option<&CellView> {
        self.cells.iter().find(|cell| cell.x == x && cell.y == y)
    }

    /// Active pair cell drawn in the given row, using the row it is entering
    pub fn piece_cell_at(&self, x: usize, row: usize) -> Option<&PieceCellView> {
        self.piece
            .iter()
            .find(|cell| cell.x == x as i32 && cell.y.ceil() == row as f64)
    }
}
