//! PUYRS - falling-pair puzzle core
//!
//! `Simulation` in `game` drives the rules. `input` and `ui` are the
//! terminal front-end used by the binary and carry no rules of their own.

pub mod board;
pub mod color;
pub mod game;
pub mod input;
pub mod kick;
pub mod piece;
pub mod queue;
pub mod region;
pub mod settings;
pub mod snapshot;
pub mod ui;

pub use game::{Command, Phase, Simulation};
pub use snapshot::Snapshot;
