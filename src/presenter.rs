//! # Presentation Layer
//!
//! The [`Presenter`] trait is the seam between the coordination pipeline
//! and whatever draws the board. The pipeline hands it one action batch
//! at a time and waits for an explicit completion signal before releasing
//! the next, so a presenter never sees overlapping batches.
//!
//! [`DisplayGrid`] is the canonical implementation of the displayed-board
//! bookkeeping: it applies action batches to its own copy of the grid,
//! which is exactly what the stop-mid-flight reconciliation reads back.
//! Concrete frontends wrap it and add drawing on top.

use crate::actions::{InitAction, MoveAction, RemoveAction};
use crate::board::Board;

/// Receives presentation work from the pipeline.
///
/// Implementations must apply each batch to their displayed state before
/// returning; the pipeline treats the displayed board as authoritative
/// when reconciling after a stop.
pub trait Presenter {
    /// Presents a committed move: slides/merges, then insertions.
    fn present_update(&mut self, move_actions: &[MoveAction], init_actions: &[InitAction]);

    /// Presents a reset clear.
    fn present_clear(&mut self, remove_actions: &[RemoveAction]);

    /// Replaces the displayed board wholesale (undo and reconciliation).
    fn jump_to(&mut self, board: &Board);

    /// The board as currently displayed.
    fn displayed_board(&self) -> Board;

    /// Called exactly once per game when the session has ended and every
    /// queued batch has been presented.
    fn game_ended(&mut self);
}

/// Pure displayed-board state: a grid that replays action batches.
#[derive(Debug, Clone)]
pub struct DisplayGrid {
    board: Board,
}

impl DisplayGrid {
    pub fn new(dimension: usize) -> Self {
        Self {
            board: Board::new(dimension),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = board;
    }

    /// Applies a move batch in two phases: all sources are read and
    /// cleared before any destination is written, so actions within a
    /// batch cannot observe each other's writes regardless of order.
    pub fn apply_update(&mut self, move_actions: &[MoveAction], init_actions: &[InitAction]) {
        let mut writes = Vec::with_capacity(move_actions.len());
        for action in move_actions {
            let mut value = self.board.get(action.from);
            if action.absorbed.is_some() {
                value *= 2;
            }
            writes.push((action.to, value));
        }
        for action in move_actions {
            self.board.set(action.from, 0);
            if let Some(absorbed) = action.absorbed {
                self.board.set(absorbed, 0);
            }
        }
        for (at, value) in writes {
            self.board.set(at, value);
        }
        for action in init_actions {
            self.board.set(action.at, action.value);
        }
    }

    /// Applies a reset clear.
    pub fn apply_clear(&mut self, remove_actions: &[RemoveAction]) {
        for action in remove_actions {
            self.board.set(action.at, 0);
        }
    }
}
