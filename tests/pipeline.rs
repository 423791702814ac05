//! End-to-end pipeline tests driving the public API with a real strategy
//! worker thread, instant presentation completions, and real games played
//! to termination.

use merge2048::{
    strategies, Board, Coordinator, GamePhase, InitAction, MoveAction, PipelineConfig, Presenter,
    RemoveAction, Settings, StrategyKind,
};
use std::thread;
use std::time::{Duration, Instant};

/// Presenter that applies batches to a board and nothing else.
struct InstantPresenter {
    board: Board,
    ended: usize,
}

impl InstantPresenter {
    fn new(dimension: usize) -> Self {
        Self {
            board: Board::new(dimension),
            ended: 0,
        }
    }
}

impl Presenter for InstantPresenter {
    fn present_update(&mut self, move_actions: &[MoveAction], init_actions: &[InitAction]) {
        let mut grid = merge2048::DisplayGrid::new(self.board.dimension());
        grid.set_board(self.board.clone());
        grid.apply_update(move_actions, init_actions);
        self.board = grid.board().clone();
    }

    fn present_clear(&mut self, remove_actions: &[RemoveAction]) {
        for action in remove_actions {
            self.board.set(action.at, 0);
        }
    }

    fn jump_to(&mut self, board: &Board) {
        self.board = board.clone();
    }

    fn displayed_board(&self) -> Board {
        self.board.clone()
    }

    fn game_ended(&mut self) {
        self.ended += 1;
    }
}

fn pipeline(dimension: usize, seed: u64, kind: StrategyKind) -> Coordinator<InstantPresenter> {
    let settings = Settings {
        dimension,
        seed,
        strategy: kind,
        ..Settings::default()
    };
    Coordinator::new(
        InstantPresenter::new(dimension),
        settings,
        PipelineConfig::default(),
        strategies::build(kind, seed, 1),
    )
}

fn complete_all(c: &mut Coordinator<InstantPresenter>) {
    while c.is_presenting() {
        c.animation_finished();
    }
}

#[test]
fn automated_game_runs_to_completion_and_stays_consistent() {
    let mut c = pipeline(3, 42, StrategyKind::Random);
    c.start_new_game();
    complete_all(&mut c);
    c.start_auto();

    let deadline = Instant::now() + Duration::from_secs(120);
    while !c.finished() {
        assert!(Instant::now() < deadline, "automated game never finished");
        c.poll_worker();
        complete_all(&mut c);
        thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(c.game().phase(), GamePhase::Ended);
    assert_eq!(c.presenter().ended, 1);
    // Display, session and history all agree on the final state.
    let last = c.history().last().expect("history holds the final state");
    assert_eq!(c.presenter().displayed_board(), c.game().current_board());
    assert_eq!(last.board, c.game().current_board());
    assert_eq!(last.score, c.game().score());
    assert!(!c.history().commands().is_empty());
}

#[test]
fn stopping_automated_play_reconciles_to_the_displayed_state() {
    let mut c = pipeline(4, 7, StrategyKind::Greedy);
    c.start_new_game();
    complete_all(&mut c);
    c.start_auto();

    // Let the session run ahead of the display: never complete batches,
    // so the first one stays in flight while moves pile up behind it.
    let deadline = Instant::now() + Duration::from_secs(120);
    while c.history().len() < 3 {
        assert!(Instant::now() < deadline, "strategy produced no moves");
        c.poll_worker();
        thread::sleep(Duration::from_millis(1));
    }
    assert!(c.is_presenting());
    let displayed = c.presenter().displayed_board();

    c.stop_auto();
    // The in-flight batch still owns the display; reconciliation is
    // deferred until its completion signal.
    c.animation_finished();
    complete_all(&mut c);

    assert!(!c.is_auto_running());
    assert_eq!(c.game().current_board(), displayed);
    assert_eq!(c.presenter().displayed_board(), displayed);
    assert_eq!(
        c.history().last().expect("history nonempty").board,
        displayed
    );
    assert_eq!(c.game().score(), c.displayed_score());

    // The pipeline accepts user input again.
    let direction = merge2048::Direction::ALL
        .iter()
        .copied()
        .find(|&d| {
            let mut probe = c.game().current_board();
            !probe.apply_move(d).0.is_empty()
        })
        .expect("reconciled board still has moves");
    c.queue_command(merge2048::MoveCommand::new(direction));
    complete_all(&mut c);
    assert_eq!(c.presenter().displayed_board(), c.game().current_board());
}

#[test]
fn hint_plays_exactly_one_strategy_move() {
    let mut c = pipeline(4, 11, StrategyKind::Greedy);
    c.start_new_game();
    complete_all(&mut c);
    assert_eq!(c.history().len(), 1);

    c.hint();
    let deadline = Instant::now() + Duration::from_secs(30);
    while c.history().len() < 2 {
        assert!(Instant::now() < deadline, "hint never landed");
        c.poll_worker();
        complete_all(&mut c);
        thread::sleep(Duration::from_millis(1));
    }
    // Let any stray work drain, then confirm exactly one move played.
    thread::sleep(Duration::from_millis(20));
    c.poll_worker();
    complete_all(&mut c);
    assert_eq!(c.history().len(), 2);
    assert_eq!(c.history().commands().len(), 1);
    assert!(!c.is_auto_running());
    assert_eq!(c.presenter().displayed_board(), c.game().current_board());
}
