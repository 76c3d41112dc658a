//! Game board representation, collision rules and gravity

use crate::color::PuyoColor;

/// Board dimensions
pub const BOARD_WIDTH: usize = 6;
pub const BOARD_HEIGHT: usize = 13;
/// Row 0 is the hidden spawn buffer above the play area
pub const BUFFER_ROWS: usize = 1;
/// A spawn attempt while this cell is occupied ends the game
pub const GAME_OVER_CELL: Position = Position { x: 2, y: 1 };

/// A grid coordinate. Row 0 is the top, rows grow downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Flat index, `y * BOARD_WIDTH + x`
    pub const fn index(&self) -> usize {
        self.y * BOARD_WIDTH + self.x
    }
}

/// A placed puyo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub color: PuyoColor,
    /// Size hint for the clear animation, 1.0 down to 0.0
    pub visual_scale: f64,
    /// Row the cell is drawn at; trails the real row while settling
    pub visual_row: f64,
}

impl Cell {
    pub fn new(color: PuyoColor, row: usize) -> Self {
        Self {
            color,
            visual_scale: 1.0,
            visual_row: row as f64,
        }
    }
}

/// The game board
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Grid stored as [row][col], row 0 is top
    cells: [[Option<Cell>; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [[None; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(pos.y)?.get(pos.x)?.as_ref()
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.cells.get_mut(pos.y)?.get_mut(pos.x)?.as_mut()
    }

    /// Place a cell. Returns false if out of bounds.
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        match self.cells.get_mut(pos.y).and_then(|row| row.get_mut(pos.x)) {
            Some(slot) => {
                *slot = Some(cell);
                true
            }
            None => false,
        }
    }

    /// Remove and return the cell at a position
    pub fn take(&mut self, pos: Position) -> Option<Cell> {
        self.cells.get_mut(pos.y)?.get_mut(pos.x)?.take()
    }

    /// Column inside the board and ceiling of the row inside the board.
    /// The ceiling lets a piece count as inside the row it is falling into.
    pub fn is_within_bounds(&self, x: i32, y: f64) -> bool {
        let row = y.ceil();
        (0..BOARD_WIDTH as i32).contains(&x) && row >= 0.0 && row < BOARD_HEIGHT as f64
    }

    /// Whether the cell at `(x, ceil(y))` holds a puyo.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds; check `is_within_bounds` first.
    pub fn is_occupied(&self, x: i32, y: f64) -> bool {
        assert!(
            self.is_within_bounds(x, y),
            "occupancy query out of bounds: ({x}, {y})"
        );
        self.cells[y.ceil() as usize][x as usize].is_some()
    }

    /// Within bounds and empty
    pub fn is_movable(&self, x: i32, y: f64) -> bool {
        self.is_within_bounds(x, y) && !self.is_occupied(x, y)
    }

    /// Drop every unsupported cell straight down until it rests.
    /// Cells keep their `visual_row`, so the fall can be animated afterwards.
    /// Returns the number of cells that moved.
    pub fn settle(&mut self) -> usize {
        let mut moved = 0;
        for y in (0..BOARD_HEIGHT - 1).rev() {
            for x in (0..BOARD_WIDTH).rev() {
                if self.cells[y][x].is_none() {
                    continue;
                }

                let mut target = y;
                while self.is_movable(x as i32, (target + 1) as f64) {
                    target += 1;
                }

                if target != y {
                    self.cells[target][x] = self.cells[y][x].take();
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Advance the settle animation by one tick: each displaced cell covers
    /// `1 / remaining` of its distance to the real row.
    pub fn step_fall_animation(&mut self, remaining: u32) {
        let remaining = remaining.max(1) as f64;
        for (y, row) in self.cells.iter_mut().enumerate() {
            for cell in row.iter_mut().flatten() {
                let target = y as f64;
                if cell.visual_row != target {
                    cell.visual_row += (target - cell.visual_row) / remaining;
                }
            }
        }
    }

    /// Snap every cell onto its real row
    pub fn snap_rows(&mut self) {
        for (y, row) in self.cells.iter_mut().enumerate() {
            for cell in row.iter_mut().flatten() {
                cell.visual_row = y as f64;
            }
        }
    }

    /// Advance the clear animation by one tick for the given cells
    pub fn step_erase_animation(&mut self, positions: &[Position], remaining: u32) {
        let remaining = remaining.max(1) as f64;
        for &pos in positions {
            if let Some(cell) = self.get_mut(pos) {
                cell.visual_scale -= cell.visual_scale / remaining;
            }
        }
    }

    /// Remove the given cells, returning how many were present
    pub fn remove(&mut self, positions: &[Position]) -> usize {
        positions
            .iter()
            .filter(|&&pos| self.take(pos).is_some())
            .count()
    }

    /// Check if the board is completely empty
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_none()))
    }

    /// Every occupied position with its cell, in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = (Position, &Cell)> {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(x, cell)| cell.as_ref().map(|c| (Position::new(x, y), c)))
        })
    }

    /// Whether a spawn attempt would end the game
    pub fn is_topped_out(&self) -> bool {
        self.get(GAME_OVER_CELL).is_some()
    }
}

#[cfg(test)]
impl Board {
    /// Build a board from text rows aligned to the bottom of the grid.
    /// `.` is empty; `R G B Y P` are the five colors.
    pub(crate) fn from_ascii(rows: &[&str]) -> Board {
        let mut board = Board::new();
        let top = BOARD_HEIGHT - rows.len();
        for (i, line) in rows.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                let color = match ch {
                    'R' => PuyoColor::Red,
                    'G' => PuyoColor::Green,
                    'B' => PuyoColor::Blue,
                    'Y' => PuyoColor::Yellow,
                    'P' => PuyoColor::Purple,
                    _ => continue,
                };
                board.set(Position::new(x, top + i), Cell::new(color, top + i));
            }
        }
        board
    }
}
