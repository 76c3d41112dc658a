//! Next-pair queue
//!
//! Each upcoming piece is two independent uniform draws from the palette.
//! The queue is topped up to `MIN_QUEUED` pairs before every draw.

use crate::color::{ColorPair, PALETTE_SIZE, PuyoColor};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Pairs kept ready before a draw
pub const MIN_QUEUED: usize = 3;

/// The upcoming color pairs
#[derive(Debug, Clone)]
pub struct NextQueue {
    queue: VecDeque<ColorPair>,
    rng: ChaCha8Rng,
}

impl Default for NextQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NextQueue {
    /// Create a queue seeded from entropy
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a reproducible queue
    pub fn with_seed(seed: u64) -> Self {
        let mut queue = Self {
            queue: VecDeque::with_capacity(MIN_QUEUED),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        queue.refill();
        queue
    }

    /// Create a queue that deals `pairs` first, then random pairs
    pub fn with_pairs(seed: u64, pairs: impl IntoIterator<Item = ColorPair>) -> Self {
        let mut queue = Self {
            queue: pairs.into_iter().collect(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        queue.refill();
        queue
    }

    /// Take the next pair
    pub fn next(&mut self) -> ColorPair {
        self.refill();
        match self.queue.pop_front() {
            Some(pair) => pair,
            // refill guarantees MIN_QUEUED pairs
            None => self.generate(),
        }
    }

    /// Preview up to `count` upcoming pairs without removing them
    pub fn preview(&self, count: usize) -> Vec<ColorPair> {
        self.queue.iter().take(count).copied().collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn refill(&mut self) {
        while self.queue.len() < MIN_QUEUED {
            let pair = self.generate();
            self.queue.push_back(pair);
        }
    }

    fn generate(&mut self) -> ColorPair {
        [self.draw(), self.draw()]
    }

    fn draw(&mut self) -> PuyoColor {
        PuyoColor::from_index(self.rng.gen_range(0..PALETTE_SIZE))
    }
}
