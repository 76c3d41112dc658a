//! PUYRS - A Rusty falling-pair puzzle
//!
//! Connect four, watch them pop.

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use puyrs::input::{InputAction, InputHandler};
use puyrs::queue::NextQueue;
use puyrs::settings::Settings;
use puyrs::{Simulation, ui};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Get the puyrs temp directory, creating it if needed
fn puyrs_temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join("puyrs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Start a fresh game from the gameplay settings
fn new_simulation(settings: &Settings) -> Simulation {
    let queue = match settings.gameplay.seed {
        Some(seed) => NextQueue::with_seed(seed),
        None => NextQueue::new(),
    };
    Simulation::with_queue(queue).with_clear_rule(settings.gameplay.clear_rule)
}

fn main() -> io::Result<()> {
    // Session ID for this instance's log file
    let session_id: u32 = rand::random();

    let log_dir = puyrs_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = match "puyrs=debug".parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    tracing::info!(
        "PUYRS starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load();
    // Write defaults on first run so there is a file to edit
    if Settings::settings_path().is_some_and(|path| !path.exists()) {
        if let Err(e) = settings.save() {
            tracing::warn!("could not save default settings: {}", e);
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &settings);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    if let Err(e) = &result {
        tracing::error!("terminal error: {}", e);
    }
    println!("\nThanks for playing PUYRS!");

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &Settings,
) -> io::Result<()> {
    let input = InputHandler::from_settings(settings);
    let mut sim = new_simulation(settings);
    let mut paused = false;
    let mut was_game_over = false;

    loop {
        let snapshot = sim.snapshot();
        terminal.draw(|frame| ui::render_game(frame, &snapshot, settings, paused))?;

        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match input.key_down(key) {
                    Some(InputAction::Quit) => {
                        tracing::info!("quit requested");
                        return Ok(());
                    }
                    Some(InputAction::Restart) => {
                        tracing::info!("restarting");
                        sim = new_simulation(settings);
                        paused = false;
                        was_game_over = false;
                    }
                    Some(InputAction::Pause) if !sim.is_game_over() => {
                        paused = !paused;
                        tracing::debug!(paused, "pause toggled");
                    }
                    Some(InputAction::Game(command)) if !paused => {
                        sim.apply_command(command);
                    }
                    _ => {}
                }
            }
        }

        if !paused {
            sim.tick(Instant::now());
        }

        if sim.is_game_over() && !was_game_over {
            was_game_over = true;
            tracing::info!("game over");
        }
    }
}
