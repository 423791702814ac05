//! # History Stack
//!
//! Records every committed board + score snapshot, supporting undo
//! (pop + restore) and rollback-to-match when automated play is stopped
//! mid-animation. A parallel command log keeps one audit record per
//! committed move for replay and debugging.

use crate::board::{Board, MoveCommand};
use rand_xoshiro::Xoshiro256StarStar;

/// A committed state: the post-move board, the score, and the session
/// RNG as it stood after the move. Restoring the RNG along with the
/// board makes undo-then-replay reproduce the original outcome exactly.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub state_id: usize,
    pub board: Board,
    pub score: u32,
    pub rng: Xoshiro256StarStar,
}

/// Audit record linking two consecutive snapshots by the command played
/// between them.
#[derive(Debug, Clone, Copy)]
pub struct CommandRecord {
    pub from_state: usize,
    pub to_state: usize,
    pub command: MoveCommand,
}

/// Append-only during forward play; truncated by undo or by
/// stop-mid-flight reconciliation.
#[derive(Debug, Default)]
pub struct History {
    states: Vec<GameSnapshot>,
    commands: Vec<CommandRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn last(&self) -> Option<&GameSnapshot> {
        self.states.last()
    }

    pub fn commands(&self) -> &[CommandRecord] {
        &self.commands
    }

    /// Appends a committed state. `command` is `None` only for the
    /// starting snapshot (the two initial tiles).
    pub fn record(
        &mut self,
        board: Board,
        score: u32,
        rng: Xoshiro256StarStar,
        command: Option<MoveCommand>,
    ) {
        let state_id = self.states.len();
        if let Some(command) = command {
            if state_id > 0 {
                self.commands.push(CommandRecord {
                    from_state: state_id - 1,
                    to_state: state_id,
                    command,
                });
            }
        }
        self.states.push(GameSnapshot {
            state_id,
            board,
            score,
            rng,
        });
    }

    /// Undo is possible once at least one move sits on top of the
    /// starting snapshot.
    pub fn can_undo(&self) -> bool {
        self.states.len() > 1
    }

    /// Pops the snapshot of the currently displayed state and returns
    /// the one to restore, or `None` when only the start remains.
    pub fn undo(&mut self) -> Option<GameSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.states.pop();
        self.commands.pop();
        self.states.last().cloned()
    }

    /// Truncates to the newest snapshot whose board equals `displayed`.
    /// Returns false when no snapshot matches; the caller treats that as
    /// a fatal consistency error.
    pub fn truncate_to_match(&mut self, displayed: &Board) -> bool {
        let Some(pos) = self.states.iter().rposition(|s| &s.board == displayed) else {
            return false;
        };
        self.states.truncate(pos + 1);
        self.commands.truncate(pos);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Direction;
    use rand::SeedableRng;

    fn rng() -> Xoshiro256StarStar {
        Xoshiro256StarStar::seed_from_u64(0)
    }

    fn board_with(value: u32) -> Board {
        let mut board = Board::new(4);
        board.set((0, 0), value);
        board
    }

    fn sample() -> History {
        let mut history = History::new();
        history.record(board_with(2), 0, rng(), None);
        history.record(board_with(4), 4, rng(), Some(MoveCommand::new(Direction::Left)));
        history.record(board_with(8), 12, rng(), Some(MoveCommand::new(Direction::Up)));
        history
    }

    #[test]
    fn records_link_consecutive_states() {
        let history = sample();
        assert_eq!(history.len(), 3);
        assert_eq!(history.commands().len(), 2);
        assert_eq!(history.commands()[0].from_state, 0);
        assert_eq!(history.commands()[0].to_state, 1);
        assert_eq!(history.commands()[1].from_state, 1);
        assert_eq!(history.commands()[1].to_state, 2);
    }

    #[test]
    fn undo_pops_current_and_returns_previous() {
        let mut history = sample();
        let restored = history.undo().expect("two moves recorded");
        assert_eq!(restored.board, board_with(4));
        assert_eq!(restored.score, 4);
        assert_eq!(history.len(), 2);
        assert_eq!(history.commands().len(), 1);

        let restored = history.undo().expect("one move left");
        assert_eq!(restored.board, board_with(2));
        assert!(history.undo().is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn truncate_rolls_back_to_matching_board() {
        let mut history = sample();
        assert!(history.truncate_to_match(&board_with(4)));
        assert_eq!(history.len(), 2);
        assert_eq!(history.commands().len(), 1);
        assert_eq!(history.last().unwrap().board, board_with(4));
    }

    #[test]
    fn truncate_reports_missing_board() {
        let mut history = sample();
        assert!(!history.truncate_to_match(&board_with(64)));
        // Nothing was removed.
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn truncate_prefers_newest_match() {
        let mut history = sample();
        // Duplicate an earlier board at the top of the stack.
        history.record(board_with(4), 20, rng(), Some(MoveCommand::new(Direction::Down)));
        assert!(history.truncate_to_match(&board_with(4)));
        assert_eq!(history.len(), 4);
        assert_eq!(history.last().unwrap().score, 20);
    }
}
