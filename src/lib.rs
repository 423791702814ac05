//! # Sliding-Tile Merge Pipeline
//!
//! A 2048-style sliding-tile merge game built around an explicitly
//! coordinated pipeline: a deterministic board engine, a game session
//! with a delegate-style event contract, a strategy worker on its own
//! thread, and a single-flight, backpressure-aware presentation queue.
//!
//! ## Layout
//! - [`board`] — grid, slide/merge algorithm, terminal detection
//! - [`game`] — session lifecycle, score, win target, event emission
//! - [`actions`] — presentation actions derived from board changes
//! - [`coordinator`] — queues, pacing, stop reconciliation, undo gating
//! - [`history`] — committed-state stack with rollback-to-match
//! - [`presenter`] — the display seam and the displayed-board grid
//! - [`strategies`] — random, greedy and expectimax move policies
//! - [`worker`] — the strategy compute thread and its channels
//! - [`settings`] — dimension, pace, strategy choice, best scores
//!
//! ## Usage
//! Run the `play` binary with `cargo run --release` for best
//! performance; expectimax search is CPU-bound.

pub mod actions;
pub mod board;
pub mod coordinator;
pub mod game;
pub mod history;
pub mod presenter;
pub mod settings;
pub mod strategies;
pub mod worker;

pub use actions::{ActionBatch, Coord, InitAction, MoveAction, RemoveAction};
pub use board::{Board, Direction, MoveCommand, TWO_TILE_PROBABILITY};
pub use coordinator::{Coordinator, PipelineConfig};
pub use game::{Game, GameEvent, GamePhase};
pub use history::{CommandRecord, GameSnapshot, History};
pub use presenter::{DisplayGrid, Presenter};
pub use settings::{Settings, StrategyKind};
pub use strategies::Strategy;
pub use worker::{ComputeRequest, ComputeResponse, StrategyWorker};
