//! Puyo colors
//!
//! The palette is fixed at five colors. A pair of colors is what the next
//! queue hands to each freshly spawned piece.

/// The five puyo colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PuyoColor {
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
}

/// Number of colors in the palette
pub const PALETTE_SIZE: usize = 5;

/// Colors of one piece: index 0 is the pivot, index 1 the satellite
pub type ColorPair = [PuyoColor; 2];

impl PuyoColor {
    /// All colors, in palette order
    pub fn all() -> [PuyoColor; PALETTE_SIZE] {
        [
            PuyoColor::Red,
            PuyoColor::Green,
            PuyoColor::Blue,
            PuyoColor::Yellow,
            PuyoColor::Purple,
        ]
    }

    /// Color at a palette index (wraps around)
    pub fn from_index(index: usize) -> PuyoColor {
        Self::all()[index % PALETTE_SIZE]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PuyoColor::Red => "red",
            PuyoColor::Green => "green",
            PuyoColor::Blue => "blue",
            PuyoColor::Yellow => "yellow",
            PuyoColor::Purple => "purple",
        }
    }
}
