//! Active falling pair

use crate::board::{Board, Position};
use crate::color::{ColorPair, PuyoColor};
use crate::kick::{KICK_OFFSETS, RotationDirection, rotate_offset};

/// Spawn column of the pivot
pub const SPAWN_X: i32 = 2;
/// Spawn row of the pivot; the pair straddles the buffer row and the row below
pub const SPAWN_Y: f64 = 0.5;

/// Offset of a cell from the piece anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const PIVOT: Offset = Offset { dx: 0, dy: 0 };
    pub const ABOVE: Offset = Offset { dx: 0, dy: -1 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    fn rotated(self, direction: RotationDirection) -> Self {
        let (dx, dy) = rotate_offset(self.dx, self.dy, direction);
        Self { dx, dy }
    }
}

/// One of the two puyos of the active piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceCell {
    pub color: PuyoColor,
    pub offset: Offset,
}

/// The pair under player control
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePiece {
    /// Anchor column
    pub x: i32,
    /// Anchor row, fractional while falling
    pub y: f64,
    /// Pivot first, satellite second
    pub cells: [PieceCell; 2],
}

impl ActivePiece {
    /// Create a new pair at the spawn position: pivot below, satellite above
    pub fn spawn(colors: ColorPair) -> Self {
        Self {
            x: SPAWN_X,
            y: SPAWN_Y,
            cells: [
                PieceCell {
                    color: colors[0],
                    offset: Offset::PIVOT,
                },
                PieceCell {
                    color: colors[1],
                    offset: Offset::ABOVE,
                },
            ],
        }
    }

    /// Absolute `(column, row)` of both cells; rows may be fractional
    pub fn positions(&self) -> [(i32, f64); 2] {
        self.cells
            .map(|cell| (self.x + cell.offset.dx, self.y + cell.offset.dy as f64))
    }

    /// Try to move left, returns true if successful
    pub fn move_left(&mut self, board: &Board) -> bool {
        self.move_horizontal(-1, board)
    }

    /// Try to move right, returns true if successful
    pub fn move_right(&mut self, board: &Board) -> bool {
        self.move_horizontal(1, board)
    }

    /// Shift by `delta` columns if both cells fit there
    pub fn move_horizontal(&mut self, delta: i32, board: &Board) -> bool {
        if !fits(board, &self.cells, self.x + delta, self.y) {
            return false;
        }
        self.x += delta;
        true
    }

    /// Drop one whole row if both cells fit there
    pub fn move_down(&mut self, board: &Board) -> bool {
        if !fits(board, &self.cells, self.x, self.y + 1.0) {
            return false;
        }
        self.y += 1.0;
        true
    }

    /// Turn the satellite around the pivot, trying each kick in order.
    /// Nothing changes if no kick fits.
    pub fn rotate(&mut self, direction: RotationDirection, board: &Board) -> bool {
        let [pivot, satellite] = self.cells;
        let turned = [
            pivot,
            PieceCell {
                offset: satellite.offset.rotated(direction),
                ..satellite
            },
        ];

        for (kick_x, kick_y) in KICK_OFFSETS {
            let x = self.x + kick_x;
            let y = self.y + kick_y as f64;
            if fits(board, &turned, x, y) {
                self.cells = turned;
                self.x = x;
                self.y = y;
                return true;
            }
        }
        false
    }

    /// Continuous fall by `step` rows. Returns false, leaving the piece in
    /// place, once the pair can fall no further.
    pub fn fall(&mut self, step: f64, board: &Board) -> bool {
        if !fits(board, &self.cells, self.x, self.y + step) {
            return false;
        }
        self.y += step;
        true
    }

    /// Grid cells the pair occupies once fixed: rows are `ceil(y) + dy`
    pub fn lock_positions(&self) -> [(Position, PuyoColor); 2] {
        let row = self.y.ceil() as i32;
        self.cells.map(|cell| {
            let x = self.x + cell.offset.dx;
            let y = row + cell.offset.dy;
            debug_assert!(x >= 0 && y >= 0, "locking outside the board: ({x}, {y})");
            (Position::new(x as usize, y as usize), cell.color)
        })
    }
}

/// Every cell movable with the anchor at `(x, y)`
fn fits(board: &Board, cells: &[PieceCell; 2], x: i32, y: f64) -> bool {
    cells
        .iter()
        .all(|cell| board.is_movable(x + cell.offset.dx, y + cell.offset.dy as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;

    fn pair() -> ColorPair {
        [PuyoColor::Red, PuyoColor::Blue]
    }

    fn piece_at(x: i32, y: f64, satellite: Offset) -> ActivePiece {
        let mut piece = ActivePiece::spawn(pair());
        piece.x = x;
        piece.y = y;
        piece.cells[1].offset = satellite;
        piece
    }

    fn fill(board: &mut Board, x: usize, rows: std::ops::RangeInclusive<usize>) {
        for y in rows {
            board.set(Position::new(x, y), Cell::new(PuyoColor::Green, y));
        }
    }

    #[test]
    fn test_spawn_position() {
        let piece = ActivePiece::spawn(pair());
        assert_eq!(piece.x, 2);
        assert_eq!(piece.y, 0.5);
        assert_eq!(piece.cells[0].offset, Offset::PIVOT);
        assert_eq!(piece.cells[0].color, PuyoColor::Red);
        assert_eq!(piece.cells[1].offset, Offset::ABOVE);
        assert_eq!(piece.cells[1].color, PuyoColor::Blue);
        assert_eq!(piece.positions(), [(2, 0.5), (2, -0.5)]);
    }

    #[test]
    fn test_spawn_fits_empty_board() {
        let board = Board::new();
        let piece = ActivePiece::spawn(pair());
        assert!(piece.positions().iter().all(|&(x, y)| board.is_movable(x, y)));
    }

    #[test]
    fn test_move_left_and_right() {
        let board = Board::new();
        let mut piece = ActivePiece::spawn(pair());
        assert!(piece.move_left(&board));
        assert!(piece.move_left(&board));
        assert!(!piece.move_left(&board));
        assert_eq!(piece.x, 0);
        for _ in 0..5 {
            piece.move_right(&board);
        }
        assert_eq!(piece.x, 5);
    }

    #[test]
    fn test_move_is_all_or_nothing() {
        let mut board = Board::new();
        // Only the satellite's destination is blocked
        board.set(Position::new(3, 4), Cell::new(PuyoColor::Green, 4));
        let mut piece = piece_at(2, 5.0, Offset::ABOVE);
        let before = piece.clone();
        assert!(!piece.move_right(&board));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_move_down_stops_at_floor() {
        let board = Board::new();
        let mut piece = piece_at(2, 11.0, Offset::ABOVE);
        assert!(piece.move_down(&board));
        assert_eq!(piece.y, 12.0);
        assert!(!piece.move_down(&board));
        assert_eq!(piece.y, 12.0);
    }

    #[test]
    fn test_rotate_in_open_space_uses_no_kick() {
        let board = Board::new();
        let mut piece = piece_at(2, 6.0, Offset::ABOVE);
        assert!(piece.rotate(RotationDirection::Right, &board));
        assert_eq!((piece.x, piece.y), (2, 6.0));
        assert_eq!(piece.cells[1].offset, Offset::new(1, 0));
        assert_eq!(piece.cells[0].offset, Offset::PIVOT);
    }

    #[test]
    fn test_left_wall_prefers_horizontal_kick() {
        let board = Board::new();
        // Satellite below; turning right would put it at offset (-1, 0), off the wall
        let mut piece = piece_at(0, 6.0, Offset::new(0, 1));
        assert!(piece.rotate(RotationDirection::Right, &board));
        assert_eq!(piece.cells[1].offset, Offset::new(-1, 0));
        assert_eq!((piece.x, piece.y), (1, 6.0));
    }

    #[test]
    fn test_left_wall_kick_rotating_left() {
        let board = Board::new();
        let mut piece = piece_at(0, 6.0, Offset::ABOVE);
        assert!(piece.rotate(RotationDirection::Left, &board));
        assert_eq!(piece.cells[1].offset, Offset::new(-1, 0));
        assert_eq!(piece.x, 1);
    }

    #[test]
    fn test_right_wall_falls_through_to_left_kick() {
        let board = Board::new();
        let mut piece = piece_at(5, 6.0, Offset::ABOVE);
        assert!(piece.rotate(RotationDirection::Right, &board));
        assert_eq!(piece.cells[1].offset, Offset::new(1, 0));
        assert_eq!(piece.x, 4);
    }

    #[test]
    fn test_floor_kick_lifts_piece() {
        let board = Board::new();
        let mut piece = piece_at(2, 12.0, Offset::new(1, 0));
        assert!(piece.rotate(RotationDirection::Right, &board));
        assert_eq!(piece.cells[1].offset, Offset::new(0, 1));
        assert_eq!((piece.x, piece.y), (2, 11.0));
    }

    #[test]
    fn test_blocked_rotation_changes_nothing() {
        let mut board = Board::new();
        fill(&mut board, 1, 5..=12);
        fill(&mut board, 3, 5..=12);
        let mut piece = piece_at(2, 12.0, Offset::ABOVE);
        let before = piece.clone();
        assert!(!piece.rotate(RotationDirection::Right, &board));
        assert!(!piece.rotate(RotationDirection::Left, &board));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_fall_advances_fractionally() {
        let board = Board::new();
        let mut piece = ActivePiece::spawn(pair());
        assert!(piece.fall(0.25, &board));
        assert_eq!(piece.y, 0.75);
    }

    #[test]
    fn test_fall_blocked_by_stack() {
        let mut board = Board::new();
        fill(&mut board, 2, 10..=12);
        let mut piece = piece_at(2, 9.0, Offset::ABOVE);
        assert!(!piece.fall(0.1, &board));
        assert_eq!(piece.y, 9.0);
    }

    #[test]
    fn test_lock_positions_round_row_up() {
        let piece = piece_at(4, 11.4, Offset::ABOVE);
        let cells = piece.lock_positions();
        assert_eq!(cells[0], (Position::new(4, 12), PuyoColor::Red));
        assert_eq!(cells[1], (Position::new(4, 11), PuyoColor::Blue));
    }
}
