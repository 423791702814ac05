//! # `play` — terminal frontend for the merge-game pipeline
//!
//! Drives the coordination pipeline from a plain terminal: interactive
//! moves read line-by-line from stdin, or fully automated play with
//! `--auto`. Presentation pacing is real: each batch stays on screen for
//! at least `--pace-ms` before the next is released, which is exactly
//! the backpressure the automated strategy runs against.

use anyhow::Result;
use clap::Parser;
use colored::{Color, Colorize};
use merge2048::{
    strategies, Board, Coordinator, Direction, DisplayGrid, InitAction, MoveAction, MoveCommand,
    Presenter, PipelineConfig, RemoveAction, Settings, StrategyKind,
};
use std::io::{self, BufRead};
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Board side length
    #[clap(short, long, default_value_t = 4)]
    dimension: usize,

    /// Tile value that wins the game (0 = play until stuck)
    #[clap(short, long, default_value_t = 0)]
    target: u32,

    /// Strategy used for hints and automated play
    #[clap(short, long, value_enum, default_value_t = StrategyKind::Expectimax)]
    strategy: StrategyKind,

    /// Minimum milliseconds each move stays on screen
    #[clap(short, long, default_value_t = 100)]
    pace_ms: u64,

    /// RNG seed; omit for a random game
    #[clap(long)]
    seed: Option<u64>,

    /// Threads for the expectimax pool (0 = all logical CPUs)
    #[clap(short = 'n', long, default_value_t = 0)]
    num_threads: usize,

    /// Stop automated play after this many presented moves
    #[clap(long)]
    max_moves: Option<usize>,

    /// Run the strategy from the start instead of reading stdin
    #[clap(long, action = clap::ArgAction::SetTrue)]
    auto: bool,
}

/// Renders the displayed grid to the terminal. The pipeline's displayed
/// board lives in the wrapped [`DisplayGrid`]; this type only adds ink.
struct TerminalPresenter {
    grid: DisplayGrid,
    score: u32,
    presented_at: Instant,
}

impl TerminalPresenter {
    fn new(dimension: usize) -> Self {
        Self {
            grid: DisplayGrid::new(dimension),
            score: 0,
            presented_at: Instant::now(),
        }
    }

    fn since_presented(&self) -> Duration {
        self.presented_at.elapsed()
    }

    fn set_score(&mut self, score: u32) {
        self.score = score;
    }

    fn draw(&self) {
        let board = self.grid.board();
        println!();
        println!("score: {}", self.score.to_string().bold());
        for row in board.rows() {
            for value in row {
                if value == 0 {
                    print!("{:>7}", ".".color(Color::BrightBlack));
                } else {
                    print!("{:>7}", value.to_string().color(tile_color(value)).bold());
                }
            }
            println!();
        }
    }
}

fn tile_color(value: u32) -> Color {
    match value {
        2 | 4 => Color::White,
        8 | 16 => Color::Yellow,
        32 | 64 => Color::Red,
        128 | 256 => Color::Magenta,
        512 | 1024 => Color::Cyan,
        _ => Color::Green,
    }
}

impl Presenter for TerminalPresenter {
    fn present_update(&mut self, move_actions: &[MoveAction], init_actions: &[InitAction]) {
        self.grid.apply_update(move_actions, init_actions);
        self.presented_at = Instant::now();
        self.draw();
    }

    fn present_clear(&mut self, remove_actions: &[RemoveAction]) {
        self.grid.apply_clear(remove_actions);
        self.presented_at = Instant::now();
    }

    fn jump_to(&mut self, board: &Board) {
        self.grid.set_board(board.clone());
        self.presented_at = Instant::now();
        self.draw();
    }

    fn displayed_board(&self) -> Board {
        self.grid.board().clone()
    }

    fn game_ended(&mut self) {
        println!("\n{}", "game over".bold());
    }
}

type Pipeline = Coordinator<TerminalPresenter>;

/// Completes the in-flight batch once its pace has elapsed, then keeps
/// releasing queued batches the same way until the display is idle.
fn settle(pipeline: &mut Pipeline, pace: Duration) {
    loop {
        pipeline.poll_worker();
        if !pipeline.is_presenting() {
            break;
        }
        let wait = pace.saturating_sub(pipeline.presenter().since_presented());
        thread::sleep(wait);
        let score = pipeline.displayed_score();
        pipeline.presenter_mut().set_score(score);
        pipeline.animation_finished();
    }
}

/// Runs automated play until the game ends, the move cap is hit, or the
/// strategy gives up.
fn run_auto(pipeline: &mut Pipeline, pace: Duration, max_moves: Option<usize>) {
    pipeline.start_auto();
    let mut presented = 0usize;
    while !pipeline.finished() {
        pipeline.poll_worker();
        if pipeline.is_presenting() {
            let wait = pace.saturating_sub(pipeline.presenter().since_presented());
            thread::sleep(wait);
            let score = pipeline.displayed_score();
            pipeline.presenter_mut().set_score(score);
            pipeline.animation_finished();
            presented += 1;
            if let Some(cap) = max_moves {
                if presented >= cap && pipeline.is_auto_running() {
                    println!("move cap reached, stopping");
                    pipeline.stop_auto();
                }
            }
        } else if pipeline.is_auto_running() {
            thread::sleep(Duration::from_millis(1));
        } else {
            // Stopped and drained.
            break;
        }
    }
    settle(pipeline, pace);
}

/// Waits for a one-shot hint computation to land and be presented.
fn wait_for_hint(pipeline: &mut Pipeline, pace: Duration) {
    let before = pipeline.history().len();
    let deadline = Instant::now() + Duration::from_secs(30);
    while pipeline.history().len() == before && Instant::now() < deadline {
        pipeline.poll_worker();
        settle(pipeline, pace);
        thread::sleep(Duration::from_millis(2));
    }
    if let Some(record) = pipeline.history().commands().last() {
        println!("hint played: {}", record.command);
    }
}

fn run_interactive(pipeline: &mut Pipeline, pace: Duration, max_moves: Option<usize>) -> Result<()> {
    println!("moves: u/d/l/r  |  hint: h  |  undo: z  |  auto: a  |  new: n  |  quit: q");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();
        match input {
            "" => {}
            "q" | "quit" => break,
            "n" | "new" => {
                pipeline.start_new_game();
                settle(pipeline, pace);
            }
            "z" | "undo" => {
                if !pipeline.undo() {
                    println!("nothing to undo");
                }
            }
            "h" | "hint" => {
                pipeline.hint();
                wait_for_hint(pipeline, pace);
            }
            "a" | "auto" => {
                run_auto(pipeline, pace, max_moves);
            }
            other => match other.parse::<Direction>() {
                Ok(direction) => {
                    pipeline.queue_command(MoveCommand::new(direction));
                    settle(pipeline, pace);
                }
                Err(err) => println!("{}", err),
            },
        }
        if pipeline.finished() {
            println!(
                "final score: {}  best for {}x{}: {}",
                pipeline.displayed_score(),
                pipeline.game().dimension(),
                pipeline.game().dimension(),
                pipeline
                    .settings()
                    .best_score(pipeline.game().dimension())
            );
            println!("press n for a new game, q to quit");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings = Settings {
        dimension: args.dimension,
        target_score: args.target,
        animation_pace_ms: args.pace_ms,
        strategy: args.strategy,
        seed: args.seed.unwrap_or_else(rand::random),
        ..Settings::default()
    };
    let pace = Duration::from_millis(settings.animation_pace_ms);
    let strategy = strategies::build(settings.strategy, settings.seed, args.num_threads);
    let presenter = TerminalPresenter::new(settings.dimension);
    let mut pipeline = Coordinator::new(presenter, settings, PipelineConfig::default(), strategy);

    pipeline.start_new_game();
    settle(&mut pipeline, pace);

    if args.auto {
        run_auto(&mut pipeline, pace, args.max_moves);
        println!(
            "final score: {} (moves recorded: {})",
            pipeline.displayed_score(),
            pipeline.history().commands().len()
        );
        Ok(())
    } else {
        run_interactive(&mut pipeline, pace, args.max_moves)
    }
}
