//! Terminal UI rendering with ratatui

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, BUFFER_ROWS, GAME_OVER_CELL};
use crate::color::{ColorPair, PuyoColor};
use crate::game::Phase;
use crate::settings::Settings;
use crate::snapshot::Snapshot;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const EMPTY: &str = "  ";
const DANGER: &str = "><";

/// Rows drawn on screen; the spawn buffer stays hidden
const VISIBLE_ROWS: usize = BOARD_HEIGHT - BUFFER_ROWS;
/// Total width needed: board(14) + side panel(18)
const GAME_WIDTH: u16 = 32;
/// Board rows plus borders
const GAME_HEIGHT: u16 = VISIBLE_ROWS as u16 + 2;

/// What occupies one screen cell of the board
#[derive(Debug, Clone, Copy, PartialEq)]
enum Tile {
    Placed { color: PuyoColor, scale: f64 },
    Piece(PuyoColor),
}

fn puyo_color(color: PuyoColor) -> Color {
    match color {
        PuyoColor::Red => Color::Red,
        PuyoColor::Green => Color::Green,
        PuyoColor::Blue => Color::Blue,
        PuyoColor::Yellow => Color::Yellow,
        PuyoColor::Purple => Color::Magenta,
    }
}

/// Shrinking glyphs for clearing cells
fn scaled_glyph(scale: f64, block_char: &'static str) -> &'static str {
    if scale > 0.66 {
        block_char
    } else if scale > 0.33 {
        "▪▪"
    } else {
        "··"
    }
}

/// Lay out placed cells at their drawn row, then the active pair on top
fn compose_tiles(snapshot: &Snapshot) -> [[Option<Tile>; BOARD_WIDTH]; BOARD_HEIGHT] {
    let mut tiles = [[None; BOARD_WIDTH]; BOARD_HEIGHT];

    for cell in &snapshot.cells {
        let row = (cell.visual_row.round().max(0.0) as usize).min(BOARD_HEIGHT - 1);
        tiles[row][cell.x] = Some(Tile::Placed {
            color: cell.color,
            scale: cell.visual_scale,
        });
    }

    for cell in &snapshot.piece {
        let row = cell.y.ceil();
        if row < 0.0 || cell.x < 0 {
            continue;
        }
        let (row, x) = (row as usize, cell.x as usize);
        if row < BOARD_HEIGHT && x < BOARD_WIDTH {
            tiles[row][x] = Some(Tile::Piece(cell.color));
        }
    }

    tiles
}

/// Render the game screen
pub fn render_game(frame: &mut Frame, snapshot: &Snapshot, settings: &Settings, paused: bool) {
    let area = frame.area();
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    // board | next + info
    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH as u16 * 2 + 2),
            Constraint::Length(18),
        ])
        .split(game_area);

    render_board(frame, main_layout[0], snapshot, settings);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(6)])
        .split(main_layout[1]);

    render_next_queue(frame, right_layout[0], &snapshot.preview, settings);
    render_info(frame, right_layout[1], snapshot, settings);

    if snapshot.game_over {
        render_overlay(frame, area, "GAME OVER", "R restart / Q quit");
    } else if paused {
        render_overlay(frame, area, "PAUSED", "Press P to resume");
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, snapshot: &Snapshot, settings: &Settings) {
    let (block_char, empty_char) = settings.visual.block_chars();

    let block = Block::default()
        .title(" PUYRS ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let tiles = compose_tiles(snapshot);
    let lines: Vec<Line> = (BUFFER_ROWS..BOARD_HEIGHT)
        .map(|row| {
            let spans: Vec<Span> = (0..BOARD_WIDTH)
                .map(|col| match tiles[row][col] {
                    Some(Tile::Piece(color)) => {
                        Span::styled(block_char, Style::default().fg(puyo_color(color)).bold())
                    }
                    Some(Tile::Placed { color, scale }) => Span::styled(
                        scaled_glyph(scale, block_char),
                        Style::default().fg(puyo_color(color)),
                    ),
                    None if settings.visual.show_danger_marker
                        && row == GAME_OVER_CELL.y
                        && col == GAME_OVER_CELL.x =>
                    {
                        Span::styled(DANGER, Style::default().fg(Color::Red).dim())
                    }
                    None => Span::styled(empty_char, Style::default().fg(Color::DarkGray)),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the upcoming pairs, satellite drawn above pivot
fn render_next_queue(frame: &mut Frame, area: Rect, preview: &[ColorPair], settings: &Settings) {
    let (block_char, _) = settings.visual.block_chars();

    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let shown = preview.iter().take(2);
    let mut top = Vec::new();
    let mut bottom = Vec::new();
    for [pivot, satellite] in shown {
        top.push(Span::styled(block_char, Style::default().fg(puyo_color(*satellite))));
        top.push(Span::raw(EMPTY));
        bottom.push(Span::styled(block_char, Style::default().fg(puyo_color(*pivot))));
        bottom.push(Span::raw(EMPTY));
    }

    let lines = vec![Line::raw(""), Line::from(top), Line::from(bottom)];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render phase and rule info
fn render_info(frame: &mut Frame, area: Rect, snapshot: &Snapshot, settings: &Settings) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let phase = match snapshot.phase {
        Phase::Spawning => "spawn",
        Phase::Control => "drop",
        Phase::Locking => "lock",
        Phase::Settling { .. } => "settle",
        Phase::Clearing { .. } => "pop!",
        Phase::GameOver => "over",
    };

    let lines = vec![
        Line::from(Span::styled("PHASE", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(phase, Style::default().fg(Color::Yellow).bold())),
        Line::raw(""),
        Line::from(Span::styled("CLEAR", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            settings.gameplay.clear_rule.name(),
            Style::default().fg(Color::Cyan),
        )),
        Line::raw(""),
        Line::from(Span::styled("PUYOS", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            snapshot.cells.len().to_string(),
            Style::default().fg(Color::Green),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render an overlay (for pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_area = center_rect(area, 24, 5);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];

    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
}
