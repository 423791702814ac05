//! Presentation actions produced by each committed board change.
//!
//! The board engine's internal slide/merge bookkeeping is translated into
//! three action kinds consumed by the presentation layer: tile movements
//! (possibly merging), tile insertions, and whole-board removals during
//! reset.

use std::fmt;

/// A board position as (row, column), zero-based.
pub type Coord = (usize, usize);

/// One tile movement within a single move pass.
///
/// `absorbed` is `None` for a plain slide. When present, the tile at
/// `absorbed` merges into the tile sliding from `from`, and the tile
/// landing at `to` carries double the source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveAction {
    /// Where the surviving tile started
    pub from: Coord,
    /// Second source cell for a merge, if any
    pub absorbed: Option<Coord>,
    /// Where the tile ends up
    pub to: Coord,
}

/// A tile inserted after a successful move or at game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitAction {
    /// Cell receiving the new tile
    pub at: Coord,
    /// Value of the new tile (2 or 4)
    pub value: u32,
}

/// A tile removed while clearing the board during reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveAction {
    /// Cell being cleared
    pub at: Coord,
}

/// One unit of presentation work released by the action pipeline.
///
/// A batch either carries remove actions (a reset clear) or a set of
/// move/init actions together with the score after the move, never both.
#[derive(Debug, Clone, Default)]
pub struct ActionBatch {
    pub move_actions: Vec<MoveAction>,
    pub init_actions: Vec<InitAction>,
    pub remove_actions: Vec<RemoveAction>,
    /// Session score once this batch is on screen
    pub score: u32,
}

impl ActionBatch {
    /// Batch for a committed move: slides/merges plus the inserted tile.
    pub fn update(move_actions: Vec<MoveAction>, init_actions: Vec<InitAction>, score: u32) -> Self {
        Self {
            move_actions,
            init_actions,
            remove_actions: Vec::new(),
            score,
        }
    }

    /// Batch for a reset clear.
    pub fn clear(remove_actions: Vec<RemoveAction>) -> Self {
        Self {
            move_actions: Vec::new(),
            init_actions: Vec::new(),
            remove_actions,
            score: 0,
        }
    }

    /// True if this batch clears the board rather than moving tiles.
    pub fn is_clear(&self) -> bool {
        !self.remove_actions.is_empty()
    }
}

impl fmt::Display for MoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.absorbed {
            Some(absorbed) => write!(
                f,
                "({},{})+({},{}) -> ({},{})",
                self.from.0, self.from.1, absorbed.0, absorbed.1, self.to.0, self.to.1
            ),
            None => write!(
                f,
                "({},{}) -> ({},{})",
                self.from.0, self.from.1, self.to.0, self.to.1
            ),
        }
    }
}

impl fmt::Display for InitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ ({},{})", self.value, self.at.0, self.at.1)
    }
}
