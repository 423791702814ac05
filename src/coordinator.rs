//! # Pipeline Coordinator
//!
//! The serial coordination line between three actors: the user (or the
//! strategy standing in for them), the game session, and the presenter.
//! Everything here runs on the caller's thread; the only other thread is
//! the strategy worker, reached exclusively through its channel pair.
//!
//! Two bounded queues implement backpressure:
//!
//! * the **command queue** holds move intents not yet applied to the
//!   session;
//! * the **action queue** holds presentation batches not yet shown.
//!
//! In user mode both queues are tiny and overflow drops input silently
//! (the user is mashing keys faster than the pace allows). In automated
//! mode the queues are larger and overflow is a contract violation: the
//! dispatch headroom check must keep the strategy from outrunning the
//! presenter, so hitting the cap means the backpressure logic is broken
//! and the pipeline panics rather than desynchronize.
//!
//! Presentation is single-flight. One batch is on screen at a time; the
//! next is released only by [`Coordinator::animation_finished`]. Stopping
//! automated play mid-flight defers reconciliation until the in-flight
//! batch completes, then rolls the session back to whatever the presenter
//! actually displayed.

use crate::actions::ActionBatch;
use crate::board::MoveCommand;
use crate::game::{Game, GameEvent, GamePhase};
use crate::history::History;
use crate::presenter::Presenter;
use crate::settings::Settings;
use crate::strategies::Strategy;
use crate::worker::StrategyWorker;
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver};
use tracing::{debug, info};

/// Queue bounds per input mode.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Cap applied to both queues while the user drives.
    pub user_queue_size: usize,
    /// Cap applied to both queues during automated play.
    pub auto_queue_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            user_queue_size: 2,
            auto_queue_size: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PresentState {
    Idle,
    Presenting,
}

/// Owns the session, the queues, the history and the strategy worker.
pub struct Coordinator<P: Presenter> {
    game: Game,
    events: Receiver<GameEvent>,
    worker: StrategyWorker,
    presenter: P,
    settings: Settings,
    config: PipelineConfig,
    command_queue: VecDeque<MoveCommand>,
    action_queue: VecDeque<ActionBatch>,
    present_state: PresentState,
    history: History,
    auto_running: bool,
    stop_pending: bool,
    end_notified: bool,
    jobs_in_flight: usize,
    /// Bumped to cancel in-flight computations; stale responses are
    /// discarded on receipt.
    epoch: u64,
    /// Score belonging to the displayed board, which trails the session
    /// score while batches are queued.
    displayed_score: u32,
}

impl<P: Presenter> Coordinator<P> {
    pub fn new(
        presenter: P,
        settings: Settings,
        config: PipelineConfig,
        strategy: Box<dyn Strategy + Send>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let mut game = Game::new(
            settings.dimension,
            settings.target_score,
            events_tx,
            settings.seed,
        );
        game.set_command_queue_size(config.auto_queue_size);
        Self {
            game,
            events: events_rx,
            worker: StrategyWorker::new(strategy),
            presenter,
            settings,
            config,
            command_queue: VecDeque::new(),
            action_queue: VecDeque::new(),
            present_state: PresentState::Idle,
            history: History::new(),
            auto_running: false,
            stop_pending: false,
            end_notified: false,
            jobs_in_flight: 0,
            epoch: 0,
            displayed_score: 0,
        }
    }

    /// Resets the session and starts a fresh game. Any queued work and
    /// any in-flight computation for the previous game is abandoned.
    pub fn start_new_game(&mut self) {
        self.auto_running = false;
        self.stop_pending = false;
        self.end_notified = false;
        self.epoch += 1;
        self.command_queue.clear();
        self.action_queue.clear();
        self.displayed_score = 0;
        self.game.reset();
        self.pump_events();
        self.game.start();
        self.pump_events();
        self.execute_action_queue();
    }

    /// Accepts one move intent, from the user or from the strategy.
    ///
    /// # Panics
    /// On queue overflow during automated play; the headroom check is
    /// supposed to make that unreachable.
    pub fn queue_command(&mut self, command: MoveCommand) {
        if self.stop_pending {
            debug!(%command, "stop pending, dropping command");
            return;
        }
        if self.queues_are_full() {
            if self.auto_running {
                panic!(
                    "command queue overflow during automated play: backpressure violated \
                     (commands {}, actions {})",
                    self.command_queue.len(),
                    self.action_queue.len()
                );
            }
            debug!(%command, "queues full, dropping user command");
            return;
        }
        self.command_queue.push_back(command);
        self.execute_command_queue();
    }

    /// Starts automated play driven by the configured strategy.
    pub fn start_auto(&mut self) {
        if self.stop_pending || self.game.phase() != GamePhase::Active {
            debug!("cannot start automated play now");
            return;
        }
        if self.auto_running {
            return;
        }
        info!("automated play started");
        self.auto_running = true;
        self.request_strategy_move(false);
    }

    /// Stops automated play. Queued work is discarded, in-flight
    /// computations are cancelled by epoch, and the session is rolled
    /// back to the displayed state; if a batch is on screen the rollback
    /// waits for its completion signal.
    pub fn stop_auto(&mut self) {
        if !self.auto_running {
            return;
        }
        info!("automated play stopping");
        self.auto_running = false;
        self.stop_pending = true;
        self.command_queue.clear();
        self.action_queue.clear();
        self.epoch += 1;
        if self.present_state == PresentState::Idle {
            self.reconcile_with_displayed();
        }
    }

    /// One-shot strategy request: compute a move for the current board
    /// and play it. Ignored during automated play.
    pub fn hint(&mut self) {
        if self.auto_running || self.game.phase() != GamePhase::Active {
            return;
        }
        self.request_strategy_move(true);
    }

    /// Reverts the session and the display to the previous committed
    /// state. Refused while anything is still moving through the
    /// pipeline. Returns true when a state was restored.
    pub fn undo(&mut self) -> bool {
        if self.auto_running || self.stop_pending || self.present_state == PresentState::Presenting
        {
            return false;
        }
        if !self.command_queue.is_empty()
            || !self.action_queue.is_empty()
            || self.jobs_in_flight > 0
        {
            return false;
        }
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.game.restore(snapshot.board.clone(), snapshot.score);
        self.game.restore_rng(snapshot.rng);
        self.displayed_score = snapshot.score;
        self.end_notified = false;
        self.presenter.jump_to(&snapshot.board);
        true
    }

    /// Drains finished computations from the worker. Call regularly from
    /// the driving loop.
    pub fn poll_worker(&mut self) {
        while let Some(response) = self.worker.try_recv() {
            self.jobs_in_flight = self.jobs_in_flight.saturating_sub(1);
            if response.epoch != self.epoch {
                debug!(
                    response_epoch = response.epoch,
                    current_epoch = self.epoch,
                    "discarding stale computation"
                );
                continue;
            }
            let Some(command) = response.command else {
                // No legal move found; the session will end on its own
                // once a real move confirms it, so just stop driving.
                self.auto_running = false;
                continue;
            };
            if response.oneshot || self.auto_running {
                self.queue_command(command);
            }
        }
    }

    /// Signals that the in-flight presentation batch finished. Releases
    /// the next batch, or runs a deferred stop reconciliation.
    pub fn animation_finished(&mut self) {
        if self.present_state == PresentState::Idle {
            debug!("completion signal with no batch in flight");
            return;
        }
        self.present_state = PresentState::Idle;
        if self.stop_pending {
            self.reconcile_with_displayed();
        }
        self.execute_action_queue();
    }

    pub fn is_presenting(&self) -> bool {
        self.present_state == PresentState::Presenting
    }

    pub fn is_auto_running(&self) -> bool {
        self.auto_running
    }

    /// True once the end of the game has been shown to the presenter.
    pub fn finished(&self) -> bool {
        self.end_notified
    }

    pub fn displayed_score(&self) -> u32 {
        self.displayed_score
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    fn queue_capacity(&self) -> usize {
        if self.auto_running {
            self.config.auto_queue_size
        } else {
            self.config.user_queue_size
        }
    }

    fn queues_are_full(&self) -> bool {
        let cap = self.queue_capacity();
        self.command_queue.len() >= cap || self.action_queue.len() >= cap
    }

    fn execute_command_queue(&mut self) {
        if let Some(command) = self.command_queue.pop_front() {
            self.game.play(command);
            self.pump_events();
            self.execute_action_queue();
        }
    }

    fn pump_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Reset { remove_actions } => {
                self.auto_running = false;
                if !remove_actions.is_empty() {
                    self.queue_action(ActionBatch::clear(remove_actions));
                }
            }
            GameEvent::Started => {
                self.history.clear();
                self.end_notified = false;
            }
            GameEvent::Updated {
                command,
                move_actions,
                init_actions,
                score,
                board,
            } => {
                if !move_actions.is_empty() || !init_actions.is_empty() {
                    self.history
                        .record(board, score, self.game.rng_snapshot(), command);
                    self.queue_action(ActionBatch::update(move_actions, init_actions, score));
                }
                if self.auto_running {
                    self.request_strategy_move(false);
                }
            }
            GameEvent::Ended { won } => {
                info!(won, score = self.game.score(), "game over");
                self.auto_running = false;
            }
        }
    }

    fn queue_action(&mut self, batch: ActionBatch) {
        if self.stop_pending {
            return;
        }
        if self.queues_are_full() {
            if self.auto_running {
                panic!(
                    "action queue overflow during automated play: backpressure violated \
                     (commands {}, actions {})",
                    self.command_queue.len(),
                    self.action_queue.len()
                );
            }
            debug!("queues full, dropping presentation batch");
            return;
        }
        self.action_queue.push_back(batch);
        self.execute_action_queue();
    }

    fn execute_action_queue(&mut self) {
        if self.present_state == PresentState::Presenting || self.stop_pending {
            return;
        }
        let Some(batch) = self.action_queue.pop_front() else {
            if self.game.phase() == GamePhase::Ended && !self.end_notified {
                self.end_notified = true;
                self.presenter.game_ended();
            }
            return;
        };

        // Dropping below the automated cap is the resume point: the
        // strategy may have gone quiet after a headroom skip, so kick it
        // once the pipeline is otherwise drained.
        if self.auto_running
            && self.action_queue.len() == self.config.auto_queue_size - 1
            && self.jobs_in_flight + self.command_queue.len() == 0
        {
            self.request_strategy_move(false);
        }

        self.present_state = PresentState::Presenting;
        if !batch.is_clear() {
            self.displayed_score = batch.score;
            self.settings
                .update_best_score(self.game.dimension(), batch.score);
        } else {
            self.displayed_score = 0;
        }
        if batch.is_clear() {
            self.presenter.present_clear(&batch.remove_actions);
        } else {
            self.presenter
                .present_update(&batch.move_actions, &batch.init_actions);
        }
    }

    /// Dispatches one strategy computation if the pipeline has headroom.
    /// Counting in-flight jobs against both queue bounds is what keeps
    /// automated play from ever overflowing them.
    fn request_strategy_move(&mut self, oneshot: bool) {
        if self.game.phase() == GamePhase::Ended {
            return;
        }
        let cap = self.config.auto_queue_size;
        if self.jobs_in_flight + self.command_queue.len() >= cap
            || self.jobs_in_flight + self.action_queue.len() >= cap
        {
            debug!(
                jobs = self.jobs_in_flight,
                commands = self.command_queue.len(),
                actions = self.action_queue.len(),
                "no headroom, skipping strategy dispatch"
            );
            return;
        }
        self.jobs_in_flight += 1;
        self.worker
            .submit(self.game.current_board(), self.epoch, oneshot);
    }

    /// Rolls the session back to exactly what the presenter displayed
    /// when the stop landed, and truncates history to match.
    ///
    /// # Panics
    /// If the displayed board matches no recorded state; presentation and
    /// history can only disagree through a bug, and continuing would
    /// desynchronize them permanently.
    fn reconcile_with_displayed(&mut self) {
        let displayed = self.presenter.displayed_board();
        self.game.restore(displayed.clone(), self.displayed_score);
        if !self.history.truncate_to_match(&displayed) {
            panic!("displayed board not found in state history during stop reconciliation");
        }
        if let Some(snapshot) = self.history.last() {
            self.game.restore_rng(snapshot.rng.clone());
        }
        self.stop_pending = false;
        info!(
            score = self.displayed_score,
            states = self.history.len(),
            "session reconciled to displayed state"
        );
    }

    #[cfg(test)]
    fn force_auto(&mut self, on: bool) {
        self.auto_running = on;
    }
}
