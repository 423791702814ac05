//! One-ply greedy strategy: pick the direction with the largest
//! immediate score delta, breaking ties on the number of empty cells
//! left behind.

use crate::board::{Board, Direction, MoveCommand};
use crate::strategies::Strategy;

#[derive(Default)]
pub struct GreedyStrategy;

impl GreedyStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for GreedyStrategy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn choose_move(&mut self, board: &Board) -> Option<MoveCommand> {
        let mut best: Option<(Direction, u32, usize)> = None;
        for &direction in &Direction::ALL {
            let mut probe = board.clone();
            let (actions, delta) = probe.apply_move(direction);
            if actions.is_empty() {
                continue;
            }
            let empties = probe.empty_cells().len();
            let better = match best {
                None => true,
                Some((_, best_delta, best_empties)) => {
                    delta > best_delta || (delta == best_delta && empties > best_empties)
                }
            };
            if better {
                best = Some((direction, delta, empties));
            }
        }
        best.map(|(direction, _, _)| MoveCommand::new(direction))
    }
}
