//! # Board Engine
//!
//! Owns the dimension×dimension grid of tile values and implements move
//! simulation (slide + merge), random insertion, and terminal detection.
//! Pure and synchronous; no I/O. Each committed move is reported as
//! [`MoveAction`]s so the presentation layer can animate exactly what
//! changed.
//!
//! ## Merge rule
//! For every line perpendicular to the move direction, empty cells are
//! dropped and at most one adjacent equal pair merges per tile position:
//! a tile produced by a merge does not merge again in the same pass.

use crate::actions::{Coord, InitAction, MoveAction, RemoveAction};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Probability that an inserted tile is a 2 rather than a 4.
pub const TWO_TILE_PROBABILITY: f64 = 0.9;

/// A slide direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions, in a fixed order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

/// A move intent: a requested slide direction, not yet validated against
/// board state. Created by input sources (user gesture or strategy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveCommand {
    pub direction: Direction,
}

impl MoveCommand {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }
}

impl fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.direction)
    }
}

/// A square grid of tile values; 0 denotes an empty cell.
///
/// Stored as an owned contiguous row-major vector. Hypothetical
/// simulations (strategy lookahead, terminal probing) clone the board;
/// there is no shared mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    dimension: usize,
    cells: Vec<u32>,
}

impl Board {
    /// Creates an empty board.
    ///
    /// # Panics
    /// If `dimension < 2`; the caller violated the construction contract.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension >= 2, "board dimension must be at least 2");
        Self {
            dimension,
            cells: vec![0; dimension * dimension],
        }
    }

    /// Builds a board from row-major rows.
    ///
    /// # Panics
    /// If `rows` is not square or smaller than 2×2.
    pub fn from_rows(rows: &[Vec<u32>]) -> Self {
        let dimension = rows.len();
        let mut board = Board::new(dimension);
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), dimension, "board rows must form a square");
            for (c, &value) in row.iter().enumerate() {
                board.set((r, c), value);
            }
        }
        board
    }

    /// Side length of the square board.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Value at `at`; 0 means empty.
    pub fn get(&self, at: Coord) -> u32 {
        self.cells[at.0 * self.dimension + at.1]
    }

    /// Writes `value` at `at`.
    pub fn set(&mut self, at: Coord, value: u32) {
        self.cells[at.0 * self.dimension + at.1] = value;
    }

    /// The board as nested rows, for display and external collaborators.
    pub fn rows(&self) -> Vec<Vec<u32>> {
        (0..self.dimension)
            .map(|r| self.cells[r * self.dimension..(r + 1) * self.dimension].to_vec())
            .collect()
    }

    /// Coordinates of all empty cells, in row-major order.
    pub fn empty_cells(&self) -> Vec<Coord> {
        let mut empties = Vec::new();
        for r in 0..self.dimension {
            for c in 0..self.dimension {
                if self.get((r, c)) == 0 {
                    empties.push((r, c));
                }
            }
        }
        empties
    }

    /// True if no cell holds a tile.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|&v| v == 0)
    }

    /// True if every cell holds a tile.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&v| v != 0)
    }

    /// The largest tile value on the board.
    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all tile values. Merging conserves this sum.
    pub fn tile_sum(&self) -> u64 {
        self.cells.iter().map(|&v| v as u64).sum()
    }

    /// Cell coordinates of one line perpendicular to `direction`, ordered
    /// from the edge the direction points at, outward.
    fn line_coords(&self, direction: Direction, index: usize) -> Vec<Coord> {
        let d = self.dimension;
        match direction {
            Direction::Left => (0..d).map(|c| (index, c)).collect(),
            Direction::Right => (0..d).rev().map(|c| (index, c)).collect(),
            Direction::Up => (0..d).map(|r| (r, index)).collect(),
            Direction::Down => (0..d).rev().map(|r| (r, index)).collect(),
        }
    }

    /// Slides and merges every line toward `direction`.
    ///
    /// Returns one [`MoveAction`] per tile that moved or merged (a tile
    /// that stayed put produces none) and the score delta: the sum of all
    /// post-merge values created by this pass, counted once per merge.
    ///
    /// An empty action list means the move was a no-op; callers must not
    /// insert a new tile in that case.
    pub fn apply_move(&mut self, direction: Direction) -> (Vec<MoveAction>, u32) {
        let d = self.dimension;
        let mut actions = Vec::new();
        let mut score_delta = 0u32;

        for index in 0..d {
            let line = self.line_coords(direction, index);
            let tiles: Vec<(Coord, u32)> = line
                .iter()
                .map(|&at| (at, self.get(at)))
                .filter(|&(_, v)| v != 0)
                .collect();

            let mut merged_line = vec![0u32; d];
            let mut slot = 0;
            let mut i = 0;
            while i < tiles.len() {
                let (at, value) = tiles[i];
                if i + 1 < tiles.len() && tiles[i + 1].1 == value {
                    let merged = value * 2;
                    merged_line[slot] = merged;
                    score_delta += merged;
                    actions.push(MoveAction {
                        from: at,
                        absorbed: Some(tiles[i + 1].0),
                        to: line[slot],
                    });
                    i += 2;
                } else {
                    merged_line[slot] = value;
                    if at != line[slot] {
                        actions.push(MoveAction {
                            from: at,
                            absorbed: None,
                            to: line[slot],
                        });
                    }
                    i += 1;
                }
                slot += 1;
            }

            for (k, &at) in line.iter().enumerate() {
                self.set(at, merged_line[k]);
            }
        }

        (actions, score_delta)
    }

    /// Inserts up to `count` tiles into uniformly-random empty cells,
    /// chosen without replacement. Each tile is a 2 with probability
    /// `two_probability`, else a 4.
    ///
    /// Returns fewer actions than requested when fewer empty cells exist;
    /// callers treat zero insertions on a full board as a terminal signal
    /// candidate.
    pub fn insert_random_tiles<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        two_probability: f64,
        rng: &mut R,
    ) -> Vec<InitAction> {
        let empties = self.empty_cells();
        let chosen: Vec<Coord> = empties.choose_multiple(rng, count).copied().collect();
        let mut inits = Vec::with_capacity(chosen.len());
        for at in chosen {
            let value = if rng.gen_bool(two_probability) { 2 } else { 4 };
            self.set(at, value);
            inits.push(InitAction { at, value });
        }
        inits
    }

    /// Clears every cell, returning one [`RemoveAction`] per previously
    /// occupied cell in row-major order.
    pub fn clear(&mut self) -> Vec<RemoveAction> {
        let mut removes = Vec::new();
        for r in 0..self.dimension {
            for c in 0..self.dimension {
                if self.get((r, c)) != 0 {
                    self.set((r, c), 0);
                    removes.push(RemoveAction { at: (r, c) });
                }
            }
        }
        removes
    }

    /// True iff the board has no empty cell and no direction produces a
    /// legal move. Dry-runs [`Board::apply_move`] against disposable
    /// copies, so the answer always agrees with real play.
    pub fn is_terminal(&self) -> bool {
        if !self.is_full() {
            return false;
        }
        Direction::ALL.iter().all(|&direction| {
            let mut probe = self.clone();
            probe.apply_move(direction).0.is_empty()
        })
    }

    /// Simulates one ply without mutating `self`: applies `command` to a
    /// copy and optionally inserts one random tile, returning the result
    /// board and the score delta. Uses the identical merge algorithm as
    /// live play, so strategy lookahead matches real play exactly.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        command: MoveCommand,
        insert_tile: bool,
        rng: &mut R,
    ) -> (Board, u32) {
        let mut next = self.clone();
        let (_, delta) = next.apply_move(command.direction);
        if insert_tile {
            next.insert_random_tiles(1, TWO_TILE_PROBABILITY, rng);
        }
        (next, delta)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.dimension {
            for c in 0..self.dimension {
                let value = self.get((r, c));
                if value == 0 {
                    write!(f, "{:>6}", ".")?;
                } else {
                    write!(f, "{:>6}", value)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    fn rng() -> Xoshiro256StarStar {
        Xoshiro256StarStar::seed_from_u64(7)
    }

    #[test]
    fn merge_pair_into_corner() {
        let mut board = Board::from_rows(&[
            vec![2, 2, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        let (actions, delta) = board.apply_move(Direction::Left);
        assert_eq!(delta, 4);
        assert_eq!(board.rows()[0], vec![4, 0, 0, 0]);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].from, (0, 0));
        assert_eq!(actions[0].absorbed, Some((0, 1)));
        assert_eq!(actions[0].to, (0, 0));
    }

    #[test]
    fn merges_at_most_once_per_position() {
        let mut board = Board::from_rows(&[
            vec![2, 2, 2, 2],
            vec![4, 2, 2, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        let (_, delta) = board.apply_move(Direction::Left);
        // Row 0: two independent pairs; row 1: the 4 does not re-merge.
        assert_eq!(board.rows()[0], vec![4, 4, 0, 0]);
        assert_eq!(board.rows()[1], vec![4, 4, 0, 0]);
        assert_eq!(delta, 4 + 4 + 4);
    }

    #[test]
    fn merge_prefers_far_edge_pair() {
        // [2,2,2] toward the left merges the two nearest the left edge.
        let mut board = Board::from_rows(&[
            vec![2, 2, 2],
            vec![0, 0, 0],
            vec![0, 0, 0],
        ]);
        board.apply_move(Direction::Left);
        assert_eq!(board.rows()[0], vec![4, 2, 0]);
    }

    #[test]
    fn noop_move_produces_no_actions() {
        let mut board = Board::from_rows(&[
            vec![2, 4, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        let before = board.clone();
        let (actions, delta) = board.apply_move(Direction::Left);
        assert!(actions.is_empty());
        assert_eq!(delta, 0);
        assert_eq!(board, before);
    }

    #[test]
    fn second_pass_is_noop_when_fully_compacted() {
        let mut board = Board::from_rows(&[
            vec![0, 2, 0, 4],
            vec![8, 0, 2, 0],
            vec![0, 0, 0, 0],
            vec![0, 16, 0, 2],
        ]);
        let (first, _) = board.apply_move(Direction::Left);
        assert!(!first.is_empty());
        let (second, delta) = board.apply_move(Direction::Left);
        assert!(second.is_empty());
        assert_eq!(delta, 0);
    }

    #[test]
    fn tile_sum_is_conserved_and_delta_counts_merges() {
        let mut r = rng();
        for _ in 0..50 {
            let mut board = Board::new(4);
            board.insert_random_tiles(r.gen_range(1..=12), TWO_TILE_PROBABILITY, &mut r);
            for &direction in &Direction::ALL {
                let mut probe = board.clone();
                let sum_before = probe.tile_sum();
                let (actions, delta) = probe.apply_move(direction);
                assert_eq!(probe.tile_sum(), sum_before);
                let merged: u32 = actions
                    .iter()
                    .filter(|a| a.absorbed.is_some())
                    .map(|a| board.get(a.from) * 2)
                    .sum();
                assert_eq!(delta, merged);
            }
        }
    }

    #[test]
    fn direction_orientation() {
        let mut board = Board::from_rows(&[
            vec![0, 0, 0],
            vec![0, 2, 0],
            vec![0, 0, 0],
        ]);
        board.apply_move(Direction::Down);
        assert_eq!(board.get((2, 1)), 2);
        board.apply_move(Direction::Right);
        assert_eq!(board.get((2, 2)), 2);
        board.apply_move(Direction::Up);
        assert_eq!(board.get((0, 2)), 2);
        board.apply_move(Direction::Left);
        assert_eq!(board.get((0, 0)), 2);
    }

    #[test]
    fn insert_fills_random_empty_cells() {
        let mut board = Board::new(4);
        let inits = board.insert_random_tiles(2, TWO_TILE_PROBABILITY, &mut rng());
        assert_eq!(inits.len(), 2);
        assert_eq!(board.empty_cells().len(), 14);
        for init in &inits {
            assert!(init.value == 2 || init.value == 4);
            assert_eq!(board.get(init.at), init.value);
        }
    }

    #[test]
    fn insert_returns_fewer_when_board_is_tight() {
        let mut board = Board::from_rows(&[
            vec![2, 4, 8],
            vec![16, 32, 64],
            vec![128, 256, 0],
        ]);
        let inits = board.insert_random_tiles(3, TWO_TILE_PROBABILITY, &mut rng());
        assert_eq!(inits.len(), 1);
        assert!(board.is_full());
        assert!(board.insert_random_tiles(1, TWO_TILE_PROBABILITY, &mut rng()).is_empty());
    }

    #[test]
    fn terminal_detection_matches_apply_move() {
        // Full board, no adjacent equal values: terminal.
        let saturated = Board::from_rows(&[
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
        ]);
        assert!(saturated.is_terminal());
        for &direction in &Direction::ALL {
            let mut probe = saturated.clone();
            assert!(probe.apply_move(direction).0.is_empty());
        }

        // Full board with one mergeable pair: not terminal.
        let mergeable = Board::from_rows(&[
            vec![2, 4, 2, 4],
            vec![4, 2, 4, 2],
            vec![2, 4, 4, 8],
            vec![4, 2, 8, 2],
        ]);
        assert!(!mergeable.is_terminal());

        // Any empty cell: not terminal.
        let mut open = saturated.clone();
        open.set((0, 0), 0);
        assert!(!open.is_terminal());
    }

    #[test]
    fn clear_reports_occupied_cells_in_row_major_order() {
        let mut board = Board::from_rows(&[
            vec![0, 2, 0],
            vec![4, 0, 0],
            vec![0, 0, 8],
        ]);
        let removes = board.clear();
        let cleared: Vec<_> = removes.iter().map(|a| a.at).collect();
        assert_eq!(cleared, vec![(0, 1), (1, 0), (2, 2)]);
        assert!(board.is_empty());
    }

    #[test]
    fn simulate_leaves_original_untouched() {
        let board = Board::from_rows(&[
            vec![2, 2, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
            vec![0, 0, 0, 0],
        ]);
        let snapshot = board.clone();
        let (next, delta) = board.simulate(MoveCommand::new(Direction::Left), true, &mut rng());
        assert_eq!(board, snapshot);
        assert_eq!(delta, 4);
        assert_eq!(next.get((0, 0)), 4);
        // One tile merged away, one inserted.
        assert_eq!(next.empty_cells().len(), 14);
    }

    #[test]
    #[should_panic(expected = "dimension must be at least 2")]
    fn rejects_degenerate_dimension() {
        Board::new(1);
    }
}
