//! Rotation math and kick table
//!
//! The satellite turns a quarter circle around the pivot. When the turned
//! pair collides, the kicks below are tried in order and the first one that
//! fits wins: no kick, then horizontal, then vertical.

use std::f64::consts::FRAC_PI_2;

/// Kick offsets `(dx, dy)` in priority order
pub const KICK_OFFSETS: [(i32, i32); 5] = [(0, 0), (1, 0), (-1, 0), (0, -1), (0, 1)];

/// Direction for rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDirection {
    /// Counter-clockwise on screen
    Left,
    /// Clockwise on screen
    Right,
}

impl RotationDirection {
    /// Angle added to the satellite's current angle (rows grow downward)
    fn angle(&self) -> f64 {
        match self {
            RotationDirection::Left => -FRAC_PI_2,
            RotationDirection::Right => FRAC_PI_2,
        }
    }
}

/// Turn a unit offset `(dx, dy)` a quarter circle, snapping the result back
/// onto the integer grid.
pub fn rotate_offset(dx: i32, dy: i32, direction: RotationDirection) -> (i32, i32) {
    let angle = (dy as f64).atan2(dx as f64) + direction.angle();
    (snap(angle.cos()), snap(angle.sin()))
}

fn snap(value: f64) -> i32 {
    value.round() as i32
}
