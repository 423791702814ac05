//! Run-time settings shared across the pipeline: board dimension, win
//! target, presentation pace, strategy choice and per-dimension best
//! scores.

use clap::ValueEnum;
use std::collections::HashMap;
use std::fmt;

/// Which strategy drives automated play and hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Uniformly random legal move
    Random,
    /// One-ply greedy on score delta
    Greedy,
    /// Depth-limited expectimax search
    Expectimax,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Random => "random",
            StrategyKind::Greedy => "greedy",
            StrategyKind::Expectimax => "expectimax",
        };
        write!(f, "{}", name)
    }
}

/// Mutable session settings, owned by the coordinator.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dimension: usize,
    /// Tile value that wins the game; 0 disables the target.
    pub target_score: u32,
    /// Minimum time each presented batch stays on screen.
    pub animation_pace_ms: u64,
    pub strategy: StrategyKind,
    pub seed: u64,
    /// Best score seen per board dimension this process lifetime.
    pub best_scores: HashMap<usize, u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dimension: 4,
            target_score: 0,
            animation_pace_ms: 100,
            strategy: StrategyKind::Expectimax,
            seed: 0,
            best_scores: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn best_score(&self, dimension: usize) -> u32 {
        self.best_scores.get(&dimension).copied().unwrap_or(0)
    }

    /// Records `score` if it beats the best for `dimension`; returns true
    /// when a new best was set.
    pub fn update_best_score(&mut self, dimension: usize, score: u32) -> bool {
        let best = self.best_scores.entry(dimension).or_insert(0);
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }
}
