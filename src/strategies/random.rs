//! Uniformly random legal move. The baseline strategy, and the one the
//! pipeline tests drive because it terminates games quickly on small
//! boards.

use crate::board::{Board, Direction, MoveCommand};
use crate::strategies::Strategy;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

pub struct RandomStrategy {
    rng: Xoshiro256StarStar,
}

impl RandomStrategy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose_move(&mut self, board: &Board) -> Option<MoveCommand> {
        let mut directions = Direction::ALL;
        directions.shuffle(&mut self.rng);
        directions
            .into_iter()
            .find(|&direction| {
                let mut probe = board.clone();
                !probe.apply_move(direction).0.is_empty()
            })
            .map(MoveCommand::new)
    }
}
