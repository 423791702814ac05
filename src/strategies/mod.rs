//! # Move Strategies
//!
//! A strategy maps a board snapshot to a move command (or `None` when no
//! legal move exists). Strategies run on the worker thread and never
//! touch live session state; everything they see is a copy.

mod expectimax;
mod greedy;
mod random;

pub use expectimax::ExpectimaxStrategy;
pub use greedy::GreedyStrategy;
pub use random::RandomStrategy;

use crate::board::{Board, MoveCommand};
use crate::settings::StrategyKind;

/// A move-selection policy.
pub trait Strategy: Send {
    fn name(&self) -> &'static str;

    /// Picks a move for `board`, or `None` when every direction is a
    /// no-op.
    fn choose_move(&mut self, board: &Board) -> Option<MoveCommand>;
}

/// Builds the configured strategy. `threads` only affects expectimax;
/// 0 means one rayon worker per logical CPU.
pub fn build(kind: StrategyKind, seed: u64, threads: usize) -> Box<dyn Strategy + Send> {
    match kind {
        StrategyKind::Random => Box::new(RandomStrategy::new(seed)),
        StrategyKind::Greedy => Box::new(GreedyStrategy::new()),
        StrategyKind::Expectimax => Box::new(ExpectimaxStrategy::new(threads)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saturated() -> Board {
        Board::from_rows(&[
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
        ])
    }

    fn open() -> Board {
        Board::from_rows(&[
            vec![2, 2, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ])
    }

    #[test]
    fn every_strategy_finds_a_move_on_an_open_board() {
        for kind in [
            StrategyKind::Random,
            StrategyKind::Greedy,
            StrategyKind::Expectimax,
        ] {
            let mut strategy = build(kind, 1, 1);
            let command = strategy.choose_move(&open());
            let command = command.unwrap_or_else(|| panic!("{} found no move", strategy.name()));
            let mut probe = open();
            assert!(
                !probe.apply_move(command.direction).0.is_empty(),
                "{} proposed a no-op",
                strategy.name()
            );
        }
    }

    #[test]
    fn every_strategy_reports_none_on_a_dead_board() {
        for kind in [
            StrategyKind::Random,
            StrategyKind::Greedy,
            StrategyKind::Expectimax,
        ] {
            let mut strategy = build(kind, 1, 1);
            assert!(strategy.choose_move(&saturated()).is_none());
        }
    }
}
