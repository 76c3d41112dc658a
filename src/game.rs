//! Core game state and the phase machine
//!
//! One tick moves the game through at most one step of
//! spawn → control → lock → settle → clear → settle → … → spawn.

use crate::board::{Board, Cell, Position};
use crate::kick::RotationDirection;
use crate::piece::ActivePiece;
use crate::queue::{MIN_QUEUED, NextQueue};
use crate::region::{ClearRule, find_clearable};
use crate::snapshot::{CellView, PieceCellView, Snapshot};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Simulation ticks per second
pub const TICK_RATE: u32 = 60;
/// Continuous fall speed in rows per second
pub const FALL_SPEED: f64 = 1.0;
/// Length of the settle and clear animation windows
pub const ANIMATION_TICKS: u32 = TICK_RATE / 4;
/// Minimum time between two processed ticks
pub const TICK_INTERVAL: Duration = Duration::from_micros(1_000_000 / TICK_RATE as u64);

/// Phase of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A new pair is spawned on the next tick
    Spawning,
    /// The pair falls and accepts commands
    Control,
    /// The pair can fall no further and is fixed on the next tick
    Locking,
    /// Displaced cells slide to their resting rows
    Settling { ticks_remaining: u32 },
    /// A region shrinks away
    Clearing { ticks_remaining: u32 },
    GameOver,
}

/// Player commands the simulation understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    MoveDown,
    RotateLeft,
    RotateRight,
}

/// The whole simulation: board, active pair, next queue and phase
#[derive(Debug, Clone)]
pub struct Simulation {
    board: Board,
    piece: Option<ActivePiece>,
    queue: NextQueue,
    phase: Phase,
    /// Cells shrinking in the current clear window
    pending_clear: Vec<Position>,
    clear_rule: ClearRule,
    last_tick: Option<Instant>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Create a new game with a random seed
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a new game with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self::with_queue(NextQueue::with_seed(seed))
    }

    /// Create a new game on an empty board dealing from `queue`
    pub fn with_queue(queue: NextQueue) -> Self {
        Self {
            board: Board::new(),
            piece: None,
            queue,
            phase: Phase::Spawning,
            pending_clear: Vec::new(),
            clear_rule: ClearRule::default(),
            last_tick: None,
        }
    }

    /// Start from a preset board. The board is settled and cleared before
    /// the first pair spawns.
    pub fn with_board(mut board: Board, queue: NextQueue) -> Self {
        board.settle();
        Self {
            board,
            piece: None,
            queue,
            phase: Phase::Settling {
                ticks_remaining: ANIMATION_TICKS,
            },
            pending_clear: Vec::new(),
            clear_rule: ClearRule::default(),
            last_tick: None,
        }
    }

    pub fn with_clear_rule(mut self, rule: ClearRule) -> Self {
        self.clear_rule = rule;
        self
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn piece(&self) -> Option<&ActivePiece> {
        self.piece.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clear_rule(&self) -> ClearRule {
        self.clear_rule
    }

    /// Cells currently shrinking away
    pub fn pending_clear(&self) -> &[Position] {
        &self.pending_clear
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Commands are only taken while the pair is under control
    pub fn accepts_input(&self) -> bool {
        self.phase == Phase::Control
    }

    /// Driver entry point, safe to call every frame. Runs one `step` once
    /// `TICK_INTERVAL` has passed since the last processed tick.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < TICK_INTERVAL {
                return false;
            }
        }
        self.last_tick = Some(now);
        self.step();
        true
    }

    /// Advance exactly one simulation tick
    pub fn step(&mut self) {
        match self.phase {
            Phase::Spawning => self.spawn(),
            Phase::Control => self.apply_gravity(),
            Phase::Locking => self.lock_piece(),
            Phase::Settling { ticks_remaining } => self.settle_tick(ticks_remaining),
            Phase::Clearing { ticks_remaining } => self.clear_tick(ticks_remaining),
            Phase::GameOver => {}
        }
    }

    /// Apply a player command. Returns false when it is rejected, either
    /// because of the phase or because the pair does not fit.
    pub fn apply_command(&mut self, command: Command) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(piece) = self.piece.as_mut() else {
            return false;
        };

        match command {
            Command::MoveLeft => piece.move_left(&self.board),
            Command::MoveRight => piece.move_right(&self.board),
            Command::MoveDown => piece.move_down(&self.board),
            Command::RotateLeft => piece.rotate(RotationDirection::Left, &self.board),
            Command::RotateRight => piece.rotate(RotationDirection::Right, &self.board),
        }
    }

    /// Read-only view for renderers
    pub fn snapshot(&self) -> Snapshot {
        let cells = self
            .board
            .occupied()
            .map(|(pos, cell)| CellView {
                x: pos.x,
                y: pos.y,
                color: cell.color,
                visual_row: cell.visual_row,
                visual_scale: cell.visual_scale,
            })
            .collect();

        let piece = self
            .piece
            .iter()
            .flat_map(|piece| {
                piece
                    .cells
                    .iter()
                    .zip(piece.positions())
                    .map(|(cell, (x, y))| PieceCellView {
                        color: cell.color,
                        x,
                        y,
                    })
            })
            .collect();

        Snapshot {
            cells,
            piece,
            preview: self.queue.preview(MIN_QUEUED),
            phase: self.phase,
            game_over: self.is_game_over(),
        }
    }

    fn spawn(&mut self) {
        if self.board.is_topped_out() {
            info!("spawn cell occupied, game over");
            self.piece = None;
            self.phase = Phase::GameOver;
            return;
        }

        let colors = self.queue.next();
        debug!(pivot = colors[0].name(), satellite = colors[1].name(), "spawning pair");
        self.piece = Some(ActivePiece::spawn(colors));
        self.phase = Phase::Control;
    }

    fn apply_gravity(&mut self) {
        let Some(piece) = self.piece.as_mut() else {
            self.phase = Phase::Spawning;
            return;
        };

        if !piece.fall(FALL_SPEED / TICK_RATE as f64, &self.board) {
            debug!(x = piece.x, y = piece.y, "pair landed");
            self.phase = Phase::Locking;
        }
    }

    /// Move the pair's cells into the board and let them settle
    fn lock_piece(&mut self) {
        let Some(piece) = self.piece.take() else {
            self.phase = Phase::Spawning;
            return;
        };

        for (pos, color) in piece.lock_positions() {
            if !self.board.set(pos, Cell::new(color, pos.y)) {
                warn!(x = pos.x, y = pos.y, "locked cell outside the board");
            }
        }

        let moved = self.board.settle();
        debug!(moved, "pair locked");
        self.phase = Phase::Settling {
            ticks_remaining: ANIMATION_TICKS,
        };
    }

    fn settle_tick(&mut self, ticks_remaining: u32) {
        self.board.step_fall_animation(ticks_remaining);
        let ticks_remaining = ticks_remaining.saturating_sub(1);
        if ticks_remaining > 0 {
            self.phase = Phase::Settling { ticks_remaining };
            return;
        }

        self.board.snap_rows();
        let region = find_clearable(&self.board, self.clear_rule);
        if region.is_empty() {
            self.phase = Phase::Spawning;
        } else {
            debug!(cells = region.len(), "clearing region");
            self.pending_clear = region;
            self.phase = Phase::Clearing {
                ticks_remaining: ANIMATION_TICKS,
            };
        }
    }

    fn clear_tick(&mut self, ticks_remaining: u32) {
        self.board
            .step_erase_animation(&self.pending_clear, ticks_remaining);
        let ticks_remaining = ticks_remaining.saturating_sub(1);
        if ticks_remaining > 0 {
            self.phase = Phase::Clearing { ticks_remaining };
            return;
        }

        let removed = self.board.remove(&self.pending_clear);
        self.pending_clear.clear();
        let moved = self.board.settle();
        debug!(removed, moved, "region cleared");
        self.phase = Phase::Settling {
            ticks_remaining: ANIMATION_TICKS,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BOARD_HEIGHT, GAME_OVER_CELL};
    use crate::color::PuyoColor;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const RED_PAIR: [PuyoColor; 2] = [PuyoColor::Red, PuyoColor::Red];

    fn steps(sim: &mut Simulation, count: u32) {
        for _ in 0..count {
            sim.step();
        }
    }

    /// Step until the phase changes, with an upper bound
    fn run_until_phase_changes(sim: &mut Simulation) -> u32 {
        let start = sim.phase();
        for n in 1..=5_000 {
            sim.step();
            if sim.phase() != start {
                return n;
            }
        }
        panic!("phase stuck at {start:?}");
    }

    fn color_at(sim: &Simulation, x: usize, y: usize) -> Option<PuyoColor> {
        sim.board().get(Position::new(x, y)).map(|cell| cell.color)
    }

    #[test]
    fn test_first_tick_spawns() {
        let mut sim = Simulation::with_seed(1);
        assert_eq!(sim.phase(), Phase::Spawning);
        assert!(sim.piece().is_none());
        sim.step();
        assert_eq!(sim.phase(), Phase::Control);
        let piece = sim.piece().cloned();
        assert_eq!(piece.map(|p| (p.x, p.y)), Some((2, 0.5)));
    }

    #[test]
    fn test_commands_ignored_outside_control() {
        let mut sim = Simulation::with_seed(2);
        assert!(!sim.apply_command(Command::MoveLeft));
        sim.step();
        assert!(sim.apply_command(Command::MoveLeft));

        let mut settling = Simulation::with_board(Board::new(), NextQueue::with_seed(2));
        assert!(!settling.accepts_input());
        assert!(!settling.apply_command(Command::RotateRight));
    }

    #[test]
    fn test_continuous_fall() {
        let mut sim = Simulation::with_seed(3);
        sim.step();
        steps(&mut sim, 30);
        let y = sim.piece().map(|p| p.y).unwrap_or_default();
        assert!((y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_move_down_command_drops_a_row() {
        let mut sim = Simulation::with_seed(4);
        sim.step();
        assert!(sim.apply_command(Command::MoveDown));
        assert_eq!(sim.piece().map(|p| p.y), Some(1.5));
    }

    #[test]
    fn test_rejected_command_keeps_state() {
        let mut sim = Simulation::with_seed(5);
        sim.step();
        while sim.apply_command(Command::MoveLeft) {}
        let before = sim.piece().cloned();
        assert!(!sim.apply_command(Command::MoveLeft));
        assert_eq!(sim.piece().cloned(), before);
    }

    #[test]
    fn test_drop_to_floor_without_clear() {
        let mut sim = Simulation::with_queue(NextQueue::with_pairs(0, [RED_PAIR]));
        sim.step();
        assert_eq!(sim.phase(), Phase::Control);

        run_until_phase_changes(&mut sim);
        assert_eq!(sim.phase(), Phase::Locking);
        assert!(!sim.accepts_input());

        sim.step();
        assert!(matches!(sim.phase(), Phase::Settling { .. }));
        assert!(sim.piece().is_none());
        assert_eq!(color_at(&sim, 2, 12), Some(PuyoColor::Red));
        assert_eq!(color_at(&sim, 2, 11), Some(PuyoColor::Red));
        assert_eq!(sim.board().occupied().count(), 2);

        steps(&mut sim, ANIMATION_TICKS);
        assert_eq!(sim.phase(), Phase::Spawning);
        assert_eq!(sim.board().occupied().count(), 2);
    }

    #[test]
    fn test_resting_row_of_four_is_cleared() {
        let board = Board::from_ascii(&["BBBB.."]);
        let mut sim = Simulation::with_board(board, NextQueue::with_seed(6));

        steps(&mut sim, ANIMATION_TICKS - 1);
        assert!(matches!(sim.phase(), Phase::Settling { ticks_remaining: 1 }));
        sim.step();
        assert!(matches!(sim.phase(), Phase::Clearing { .. }));
        assert_eq!(sim.pending_clear().len(), 4);

        sim.step();
        let scale = sim.board().get(Position::new(0, 12)).map(|c| c.visual_scale);
        assert!(scale.is_some_and(|s| s > 0.0 && s < 1.0));

        steps(&mut sim, ANIMATION_TICKS - 1);
        assert!(sim.board().is_empty());
        assert!(sim.pending_clear().is_empty());
        assert!(matches!(sim.phase(), Phase::Settling { .. }));

        steps(&mut sim, ANIMATION_TICKS);
        assert_eq!(sim.phase(), Phase::Spawning);
    }

    #[test]
    fn test_clear_lets_upper_cells_fall_into_a_chain() {
        let board = Board::from_ascii(&[
            "R.....", //
            "G.....",
            "G.....",
            "G.....",
            "GRRR..",
        ]);
        let mut sim = Simulation::with_board(board, NextQueue::with_seed(7));

        steps(&mut sim, ANIMATION_TICKS);
        assert!(sim.pending_clear().iter().all(|pos| pos.x == 0));
        steps(&mut sim, ANIMATION_TICKS);

        // The lone red dropped next to the other three
        assert_eq!(color_at(&sim, 0, 12), Some(PuyoColor::Red));
        let row = sim.board().get(Position::new(0, 12)).map(|c| c.visual_row);
        assert_eq!(row, Some(8.0));

        steps(&mut sim, ANIMATION_TICKS);
        assert!(matches!(sim.phase(), Phase::Clearing { .. }));
        assert_eq!(sim.pending_clear().len(), 4);

        steps(&mut sim, ANIMATION_TICKS * 2);
        assert!(sim.board().is_empty());
        assert_eq!(sim.phase(), Phase::Spawning);
    }

    #[test]
    fn test_clear_rule_controls_groups_per_pass() {
        let rows = ["YYYY..", "......", "RRRR.."];

        let mut first = Simulation::with_board(Board::from_ascii(&rows), NextQueue::with_seed(8));
        steps(&mut first, ANIMATION_TICKS);
        assert_eq!(first.pending_clear().len(), 4);

        let mut all = Simulation::with_board(Board::from_ascii(&rows), NextQueue::with_seed(8))
            .with_clear_rule(ClearRule::AllRegions);
        steps(&mut all, ANIMATION_TICKS);
        assert_eq!(all.pending_clear().len(), 8);
    }

    #[test]
    fn test_spawn_on_occupied_cell_ends_game() {
        // Alternating column so nothing connects
        let mut board = Board::new();
        for y in GAME_OVER_CELL.y..BOARD_HEIGHT {
            let color = if y % 2 == 0 { PuyoColor::Red } else { PuyoColor::Green };
            board.set(Position::new(GAME_OVER_CELL.x, y), Cell::new(color, y));
        }
        let mut sim = Simulation::with_board(board, NextQueue::with_seed(9));

        steps(&mut sim, ANIMATION_TICKS);
        assert_eq!(sim.phase(), Phase::Spawning);
        sim.step();
        assert!(sim.is_game_over());
        assert!(sim.piece().is_none());

        let before = sim.board().clone();
        steps(&mut sim, 100);
        assert!(sim.is_game_over());
        assert!(sim.piece().is_none());
        assert_eq!(sim.board(), &before);
        assert!(!sim.apply_command(Command::MoveLeft));
        assert!(sim.snapshot().game_over);
    }

    #[test]
    fn test_tick_is_throttled() {
        let mut sim = Simulation::with_seed(10);
        let start = Instant::now();
        assert!(sim.tick(start));
        assert_eq!(sim.phase(), Phase::Control);
        assert!(!sim.tick(start + Duration::from_millis(5)));
        assert!(!sim.tick(start + Duration::from_millis(16)));
        assert!(sim.tick(start + Duration::from_millis(17)));
        assert!(!sim.tick(start + Duration::from_millis(20)));
        assert!(sim.tick(start + Duration::from_millis(40)));
    }

    #[test]
    fn test_snapshot_exposes_piece_and_preview() {
        let mut sim = Simulation::with_queue(NextQueue::with_pairs(
            11,
            [[PuyoColor::Red, PuyoColor::Blue], [PuyoColor::Green, PuyoColor::Yellow]],
        ));
        sim.step();
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.phase, Phase::Control);
        assert!(!snapshot.game_over);
        assert!(snapshot.cells.is_empty());
        assert_eq!(snapshot.piece.len(), 2);
        assert_eq!(snapshot.piece[0].color, PuyoColor::Red);
        assert_eq!((snapshot.piece[1].x, snapshot.piece[1].y), (2, -0.5));
        assert_eq!(snapshot.preview.len(), 2);
        assert_eq!(snapshot.preview[0], [PuyoColor::Green, PuyoColor::Yellow]);
    }

    #[test]
    fn test_random_play_keeps_invariants() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let commands = [
            Command::MoveLeft,
            Command::MoveRight,
            Command::MoveDown,
            Command::RotateLeft,
            Command::RotateRight,
        ];

        for seed in 0..4 {
            let mut sim = Simulation::with_seed(seed);
            for _ in 0..20_000 {
                if rng.gen_bool(0.2) {
                    let command = commands[rng.gen_range(0..commands.len())];
                    sim.apply_command(command);
                }
                sim.step();

                if let Some(piece) = sim.piece() {
                    for (x, y) in piece.positions() {
                        assert!(sim.board().is_movable(x, y), "piece overlaps at ({x}, {y})");
                    }
                    let satellite = piece.cells[1].offset;
                    assert_eq!(satellite.dx.abs() + satellite.dy.abs(), 1);
                }
                for (pos, cell) in sim.board().occupied() {
                    if !sim.pending_clear().contains(&pos) {
                        assert_eq!(cell.visual_scale, 1.0);
                    }
                }
                if sim.is_game_over() {
                    break;
                }
            }
        }
    }
}
