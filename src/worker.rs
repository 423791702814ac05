//! # Strategy Worker
//!
//! Runs the move strategy on a dedicated thread so lookahead never blocks
//! the coordination line. Requests and responses travel over a pair of
//! mpsc channels; the coordinator polls responses with `try_recv` from
//! its serial loop, which keeps concurrency on the compute stage at one.
//!
//! Cancellation is epoch-based: the coordinator bumps its epoch when it
//! stops automated play or starts a new game, and discards any response
//! stamped with an older epoch. The worker itself never needs to know a
//! request was abandoned.

use crate::board::{Board, MoveCommand};
use crate::strategies::Strategy;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// A request to the worker thread.
pub enum ComputeRequest {
    /// Choose a move for `board`. `oneshot` marks a hint request that
    /// must be surfaced even when automated play is off.
    Choose {
        board: Board,
        epoch: u64,
        oneshot: bool,
    },
    /// Shut the worker down.
    Stop,
}

/// The worker's answer to a `Choose` request.
#[derive(Debug, Clone, Copy)]
pub struct ComputeResponse {
    /// `None` when the strategy found no legal move.
    pub command: Option<MoveCommand>,
    /// The epoch the request was stamped with.
    pub epoch: u64,
    pub oneshot: bool,
}

/// Owns the strategy thread and its channel endpoints.
pub struct StrategyWorker {
    request_tx: Sender<ComputeRequest>,
    response_rx: Receiver<ComputeResponse>,
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StrategyWorker {
    /// Spawns the worker thread running `strategy`.
    pub fn new(mut strategy: Box<dyn Strategy + Send>) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<ComputeRequest>();
        let (response_tx, response_rx) = mpsc::channel::<ComputeResponse>();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_flag);

        let handle = thread::spawn(move || {
            debug!(strategy = strategy.name(), "strategy worker started");
            for request in request_rx {
                if thread_stop.load(Ordering::SeqCst) {
                    break;
                }
                match request {
                    ComputeRequest::Choose {
                        board,
                        epoch,
                        oneshot,
                    } => {
                        let command = strategy.choose_move(&board);
                        if response_tx
                            .send(ComputeResponse {
                                command,
                                epoch,
                                oneshot,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                    ComputeRequest::Stop => break,
                }
            }
            debug!("strategy worker stopped");
        });

        Self {
            request_tx,
            response_rx,
            stop_flag,
            handle: Some(handle),
        }
    }

    /// Submits one compute request. Returns false if the worker thread is
    /// gone.
    pub fn submit(&self, board: Board, epoch: u64, oneshot: bool) -> bool {
        self.request_tx
            .send(ComputeRequest::Choose {
                board,
                epoch,
                oneshot,
            })
            .is_ok()
    }

    /// Non-blocking poll for a finished computation.
    pub fn try_recv(&self) -> Option<ComputeResponse> {
        match self.response_rx.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Asks the thread to exit after its current request.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.request_tx.send(ComputeRequest::Stop).ok();
    }
}

impl Drop for StrategyWorker {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}
