//! Key handling: maps terminal key presses to game commands
//!
//! Every press fires once. Held keys repeat through the terminal's own
//! key repeat.

use crate::game::Command;
use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Game(Command),
    Pause,
    Restart,
    Quit,
}

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub move_down: Vec<KeyCode>,
    pub rotate_left: Vec<KeyCode>,
    pub rotate_right: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
    pub restart: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(code)
    }

    /// Parse a list of key strings into KeyCodes, skipping unknown names
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter()
            .filter_map(|s| {
                let code = Self::parse_key(s);
                if code.is_none() {
                    warn!(key = %s, "ignoring unknown key binding");
                }
                code
            })
            .collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let keys = &settings.keys;
        Self {
            move_left: Self::parse_keys(&keys.move_left),
            move_right: Self::parse_keys(&keys.move_right),
            move_down: Self::parse_keys(&keys.move_down),
            rotate_left: Self::parse_keys(&keys.rotate_left),
            rotate_right: Self::parse_keys(&keys.rotate_right),
            pause: Self::parse_keys(&keys.pause),
            quit: Self::parse_keys(&keys.quit),
            restart: Self::parse_keys(&keys.restart),
        }
    }

    /// Look up the action bound to a key
    pub fn action_for(&self, code: KeyCode) -> Option<InputAction> {
        let code = normalize_key(code);
        let table = [
            (&self.move_left, InputAction::Game(Command::MoveLeft)),
            (&self.move_right, InputAction::Game(Command::MoveRight)),
            (&self.move_down, InputAction::Game(Command::MoveDown)),
            (&self.rotate_left, InputAction::Game(Command::RotateLeft)),
            (&self.rotate_right, InputAction::Game(Command::RotateRight)),
            (&self.pause, InputAction::Pause),
            (&self.restart, InputAction::Restart),
            (&self.quit, InputAction::Quit),
        ];
        table
            .into_iter()
            .find(|(keys, _)| keys.contains(&code))
            .map(|(_, action)| action)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Turns key events into actions
#[derive(Debug, Clone, Default)]
pub struct InputHandler {
    bindings: KeyBindings,
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            bindings: KeyBindings::from_settings(settings),
        }
    }

    /// Handle a key press event
    pub fn key_down(&self, key: KeyEvent) -> Option<InputAction> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(InputAction::Quit);
        }
        self.bindings.action_for(key.code)
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
