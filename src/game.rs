//! # Game Session
//!
//! Wraps the board engine with score tracking, a win target, an internal
//! bounded command queue and the delegate-style notification contract.
//! Notifications are a tagged event enum delivered over an mpsc channel,
//! which preserves exactly-once, in-order delivery per session.
//!
//! The session is the single owner of the live board. External
//! collaborators only ever receive snapshots (plain copies); this is the
//! invariant preventing torn reads across the asynchronous boundary.

use crate::actions::{InitAction, MoveAction, RemoveAction};
use crate::board::{Board, MoveCommand, TWO_TILE_PROBABILITY};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use std::collections::VecDeque;
use std::sync::mpsc::Sender;
use tracing::debug;

/// Default capacity of the session's internal command queue. Sized for
/// automated play; the pipeline above applies tighter per-mode bounds.
pub const DEFAULT_COMMAND_QUEUE_SIZE: usize = 100;

/// Session lifecycle: `Idle` after reset, `Active` once started, `Ended`
/// when the board is terminal or the win target is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Active,
    Ended,
}

/// Notifications emitted by the session, exactly once and in order.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// The board was cleared; one remove action per previously occupied cell.
    Reset { remove_actions: Vec<RemoveAction> },
    /// A new game began; an `Updated` with the two starting tiles follows.
    Started,
    /// A command was applied (or the starting tiles were placed).
    /// `command` is `None` for the start insertion. `move_actions` and
    /// `init_actions` are both empty for a no-op move.
    Updated {
        command: Option<MoveCommand>,
        move_actions: Vec<MoveAction>,
        init_actions: Vec<InitAction>,
        score: u32,
        board: Board,
    },
    /// The session ended; `won` is true when the target was reached.
    Ended { won: bool },
}

/// The game session: board, score, win target and command intake.
pub struct Game {
    dimension: usize,
    /// Tile value that wins the game; 0 means unlimited.
    target_score: u32,
    score: u32,
    board: Board,
    phase: GamePhase,
    command_queue: VecDeque<MoveCommand>,
    command_queue_size: usize,
    two_tile_probability: f64,
    events: Sender<GameEvent>,
    rng: Xoshiro256StarStar,
}

impl Game {
    /// Creates a session with an empty board in the `Idle` phase.
    ///
    /// # Panics
    /// If `dimension < 2` (board construction contract).
    pub fn new(dimension: usize, target_score: u32, events: Sender<GameEvent>, seed: u64) -> Self {
        Self {
            dimension,
            target_score,
            score: 0,
            board: Board::new(dimension),
            phase: GamePhase::Idle,
            command_queue: VecDeque::new(),
            command_queue_size: DEFAULT_COMMAND_QUEUE_SIZE,
            two_tile_probability: TWO_TILE_PROBABILITY,
            events,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    /// Caps the internal command queue; commands arriving above the cap
    /// are silently dropped (a safety valve, not expected to trigger
    /// under correct backpressure upstream).
    pub fn set_command_queue_size(&mut self, size: usize) {
        self.command_queue_size = size;
    }

    /// Overrides the 2-vs-4 insertion ratio (default 9:1).
    pub fn set_two_tile_probability(&mut self, probability: f64) {
        self.two_tile_probability = probability;
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// A snapshot of the live board. Always a plain copy, never a live
    /// reference; safe to hand across the compute boundary.
    pub fn current_board(&self) -> Board {
        self.board.clone()
    }

    /// A copy of the session RNG. Recorded alongside each committed
    /// state so that undo restores the full causal state: replaying the
    /// identical command after an undo reproduces the pre-undo board and
    /// score exactly.
    pub fn rng_snapshot(&self) -> Xoshiro256StarStar {
        self.rng.clone()
    }

    /// Clears the board and returns to `Idle`, notifying `Reset` with one
    /// remove action per cleared cell.
    pub fn reset(&mut self) {
        self.score = 0;
        self.command_queue.clear();
        let remove_actions = self.board.clear();
        self.phase = GamePhase::Idle;
        self.events.send(GameEvent::Reset { remove_actions }).ok();
    }

    /// Starts a new game: inserts two random tiles and transitions to
    /// `Active`, notifying `Started` followed by `Updated` with the two
    /// insertions and score 0.
    ///
    /// # Panics
    /// If the board is not empty; callers must `reset` first.
    pub fn start(&mut self) {
        assert!(
            self.board.is_empty(),
            "board must be empty before starting a new game; reset first"
        );
        let init_actions = self
            .board
            .insert_random_tiles(2, self.two_tile_probability, &mut self.rng);
        self.phase = GamePhase::Active;
        self.events.send(GameEvent::Started).ok();
        self.events
            .send(GameEvent::Updated {
                command: None,
                move_actions: Vec::new(),
                init_actions,
                score: self.score,
                board: self.board.clone(),
            })
            .ok();
    }

    /// Enqueues `command` and synchronously drains the internal queue
    /// one command at a time while `Active`.
    pub fn play(&mut self, command: MoveCommand) {
        if self.phase != GamePhase::Active {
            debug!(%command, "session not active, ignoring command");
            return;
        }
        if self.command_queue.len() >= self.command_queue_size {
            // Queue is wedged. Should never happen in practice.
            debug!(len = self.command_queue.len(), "command queue wedged, dropping");
            return;
        }
        self.command_queue.push_back(command);
        while self.phase == GamePhase::Active {
            let Some(next) = self.command_queue.pop_front() else {
                break;
            };
            self.perform(next);
        }
    }

    fn perform(&mut self, command: MoveCommand) {
        let (move_actions, delta) = self.board.apply_move(command.direction);
        let init_actions = if move_actions.is_empty() {
            // No-op move: no insertion, and the board stays as it was.
            Vec::new()
        } else {
            self.board
                .insert_random_tiles(1, self.two_tile_probability, &mut self.rng)
        };

        self.score += delta;
        self.events
            .send(GameEvent::Updated {
                command: Some(command),
                move_actions,
                init_actions,
                score: self.score,
                board: self.board.clone(),
            })
            .ok();

        if self.board.is_terminal() {
            self.phase = GamePhase::Ended;
            self.events.send(GameEvent::Ended { won: false }).ok();
        } else if self.target_score > 0 && self.board.max_tile() >= self.target_score {
            self.phase = GamePhase::Ended;
            self.events.send(GameEvent::Ended { won: true }).ok();
        }
    }

    /// Pure query for strategy lookahead: simulates one ply against an
    /// arbitrary board using the identical merge algorithm as live play.
    ///
    /// # Panics
    /// If `board`'s dimension differs from the session's.
    pub fn next_state_from_board<R: rand::Rng + ?Sized>(
        &self,
        board: &Board,
        command: MoveCommand,
        insert_tile: bool,
        rng: &mut R,
    ) -> (Board, u32) {
        assert_eq!(
            board.dimension(),
            self.dimension,
            "board dimension must match the session"
        );
        board.simulate(command, insert_tile, rng)
    }

    /// Rewrites the live board and score directly, bypassing move
    /// application. Used by undo and by stop-mid-flight reconciliation.
    /// Revives an `Ended` session when the restored board still has moves.
    ///
    /// # Panics
    /// If `board`'s dimension differs from the session's.
    pub fn restore(&mut self, board: Board, score: u32) {
        assert_eq!(
            board.dimension(),
            self.dimension,
            "board dimension must match the session"
        );
        self.board = board;
        self.score = score;
        self.command_queue.clear();
        if !self.board.is_terminal() {
            self.phase = GamePhase::Active;
        }
    }

    /// Restores the RNG to a previously recorded snapshot (undo).
    pub fn restore_rng(&mut self, rng: Xoshiro256StarStar) {
        self.rng = rng;
    }
}
