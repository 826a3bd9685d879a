//! Core game engine for the Bird Sort puzzle.
//!
//! This module defines the puzzle's fundamental components:
//! - `Color`: an opaque token color drawn from a fixed palette.
//! - `Board`: an immutable-by-convention snapshot of every branch, with the
//!   move model (`legal_moves`, `check_move`, `apply`) and the solved predicate.
//! - `Move`: a `(from, to)` transition label between two branches.
//! - `Game`: a small play session that applies moves, counts steps and keeps
//!   a history of boards for undo.
use crate::error::{EngineError, IllegalMove, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of tokens a branch can hold in a regular level.
pub const BRANCH_CAPACITY: usize = 4;

/// Number of distinct colors the palette can express.
pub const PALETTE_SIZE: usize = 8;

const PALETTE_CHARS: [char; PALETTE_SIZE] = ['R', 'G', 'B', 'Y', 'P', 'O', 'C', 'M'];

/// A token color. Colors carry no attributes beyond their identity.
///
/// # Examples
///
/// ```
/// use birdsort_solver::engine::Color;
/// let red = Color::from_char('R').unwrap();
/// assert_eq!(red.index(), 0);
/// assert_eq!(red.to_char(), 'R');
/// assert!(Color::new(8).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(u8);

impl Color {
    /// Creates the color with the given palette index, or `None` if the index
    /// is outside the palette.
    pub fn new(index: u8) -> Option<Color> {
        if (index as usize) < PALETTE_SIZE {
            Some(Color(index))
        } else {
            None
        }
    }

    /// Returns the palette index of this color.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Converts the color to its single-letter representation.
    pub fn to_char(self) -> char {
        PALETTE_CHARS[self.index()]
    }

    /// Parses a palette letter (case-sensitive).
    pub fn from_char(c: char) -> Option<Color> {
        PALETTE_CHARS
            .iter()
            .position(|&p| p == c)
            .map(|idx| Color(idx as u8))
    }

    /// Returns the ANSI background code used for terminal output.
    fn to_ansi_color_code(self) -> &'static str {
        match self.0 {
            0 => "41",
            1 => "42",
            2 => "44",
            3 => "43",
            4 => "45",
            5 => "48;5;208",
            6 => "46",
            _ => "48;5;201",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// A transfer of the top run of `from` onto `to`.
///
/// A move is only a label; whether it is legal depends on the board it is
/// applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    pub fn new(from: usize, to: usize) -> Self {
        Move { from, to }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Which boards count as finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalRule {
    /// Every branch is either empty or holds `capacity` tokens of one color.
    #[default]
    EmptyOrComplete,
    /// Every branch holds `capacity` tokens of one color; no branch may be left empty.
    AllComplete,
}

/// The full arrangement of every branch at one instant.
///
/// Branches are stored bottom-to-top, so the last element of each branch is
/// the top token. Two boards are equal iff their capacities and branch contents
/// (including branch order) are equal, which makes `Board` usable directly as a
/// search key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    branches: Vec<Vec<Color>>,
    capacity: usize,
}

impl Board {
    /// Creates a board from explicit branch contents.
    ///
    /// # Arguments
    /// * `branches`: One vector per branch, bottom token first.
    /// * `capacity`: The maximum number of tokens any branch can hold.
    ///
    /// # Returns
    /// * `Ok(Board)` when every branch fits within `capacity`.
    /// * `Err(EngineError::InvalidArgument)` when there are no branches, the
    ///   capacity is zero, or a branch is over capacity.
    ///
    /// The per-color inventory is not checked here so that hand-built test
    /// positions (including unsolvable ones) can be expressed; see
    /// [`Board::has_uniform_inventory`].
    pub fn new(branches: Vec<Vec<Color>>, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::InvalidArgument(
                "branch capacity must be at least 1".into(),
            ));
        }
        if branches.is_empty() {
            return Err(EngineError::InvalidArgument(
                "a board needs at least one branch".into(),
            ));
        }
        if let Some((idx, branch)) = branches
            .iter()
            .enumerate()
            .find(|(_, b)| b.len() > capacity)
        {
            return Err(EngineError::InvalidArgument(format!(
                "branch {} holds {} tokens but capacity is {}",
                idx,
                branch.len(),
                capacity
            )));
        }
        Ok(Board { branches, capacity })
    }

    /// Creates a board with `branch_count` empty branches.
    pub fn empty(branch_count: usize, capacity: usize) -> Result<Self> {
        Board::new(vec![Vec::new(); branch_count], capacity)
    }

    /// Creates a solved board: branch `i < colors` is full of color `i`, the
    /// remaining branches are empty.
    pub fn solved(branch_count: usize, colors: usize, capacity: usize) -> Result<Self> {
        if colors > PALETTE_SIZE {
            return Err(EngineError::InvalidArgument(format!(
                "palette holds at most {} colors, {} requested",
                PALETTE_SIZE, colors
            )));
        }
        if colors > branch_count {
            return Err(EngineError::InvalidArgument(format!(
                "{} colors do not fit on {} branches",
                colors, branch_count
            )));
        }
        let branches = (0..branch_count)
            .map(|idx| {
                if idx < colors {
                    vec![Color(idx as u8); capacity]
                } else {
                    Vec::new()
                }
            })
            .collect();
        Board::new(branches, capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Returns the tokens of branch `idx`, bottom first.
    pub fn branch(&self, idx: usize) -> Option<&[Color]> {
        self.branches.get(idx).map(Vec::as_slice)
    }

    /// Returns all branches, bottom token first in each.
    pub fn branches(&self) -> &[Vec<Color>] {
        &self.branches
    }

    /// Returns the top token of branch `idx`, or `None` if it is empty or out of range.
    pub fn top(&self, idx: usize) -> Option<Color> {
        self.branches.get(idx).and_then(|b| b.last().copied())
    }

    /// Length of the maximal run of same-colored tokens at the top of branch `idx`.
    pub fn top_run(&self, idx: usize) -> usize {
        let Some(branch) = self.branches.get(idx) else {
            return 0;
        };
        match branch.last() {
            Some(&top) => branch.iter().rev().take_while(|&&c| c == top).count(),
            None => 0,
        }
    }

    /// Number of tokens branch `idx` can still accept.
    pub fn free_slots(&self, idx: usize) -> usize {
        self.branches
            .get(idx)
            .map_or(0, |b| self.capacity - b.len())
    }

    /// True if branch `idx` holds `capacity` tokens of a single color.
    pub fn is_branch_complete(&self, idx: usize) -> bool {
        self.branches
            .get(idx)
            .is_some_and(|b| b.len() == self.capacity && is_homogeneous(b))
    }

    pub fn token_count(&self) -> usize {
        self.branches.iter().map(Vec::len).sum()
    }

    /// Counts the tokens of every color present on the board.
    pub fn color_counts(&self) -> BTreeMap<Color, usize> {
        let mut counts = BTreeMap::new();
        for &color in self.branches.iter().flatten() {
            *counts.entry(color).or_insert(0) += 1;
        }
        counts
    }

    /// True if every color on the board appears exactly `capacity` times, which
    /// is what a generated level guarantees.
    pub fn has_uniform_inventory(&self) -> bool {
        self.color_counts().values().all(|&n| n == self.capacity)
    }

    /// True if every branch is empty or holds exactly `capacity` tokens of one color.
    ///
    /// A board whose branches are all empty is vacuously solved.
    pub fn is_solved(&self) -> bool {
        self.is_solved_under(GoalRule::EmptyOrComplete)
    }

    /// Evaluates the solved predicate for the given goal rule.
    pub fn is_solved_under(&self, rule: GoalRule) -> bool {
        let complete = |b: &Vec<Color>| b.len() == self.capacity && is_homogeneous(b);
        match rule {
            GoalRule::EmptyOrComplete => self.branches.iter().all(|b| b.is_empty() || complete(b)),
            GoalRule::AllComplete => self.branches.iter().all(complete),
        }
    }

    /// Checks a move against the legality rules without applying it.
    ///
    /// # Returns
    /// The number of tokens the move would transfer: the maximal top run of the
    /// source, limited by the free slots of the destination.
    ///
    /// # Errors
    /// * `InvalidArgument` if either index is out of range or both are equal.
    /// * `IllegalMove` with `EmptySource`, `Full`, `ColorMismatch` or `NoOp`
    ///   (a sorted source moved wholesale onto an empty branch), in that order
    ///   of precedence.
    pub fn check_move(&self, mv: Move) -> Result<usize> {
        let n = self.branches.len();
        if mv.from >= n || mv.to >= n {
            return Err(EngineError::InvalidArgument(format!(
                "move {} references a branch outside 0..{}",
                mv, n
            )));
        }
        if mv.from == mv.to {
            return Err(EngineError::InvalidArgument(format!(
                "move {} has the same source and destination",
                mv
            )));
        }
        let illegal = |reason| EngineError::IllegalMove {
            from: mv.from,
            to: mv.to,
            reason,
        };

        let source = &self.branches[mv.from];
        let dest = &self.branches[mv.to];
        let Some(&color) = source.last() else {
            return Err(illegal(IllegalMove::EmptySource));
        };
        let free = self.capacity - dest.len();
        if free == 0 {
            return Err(illegal(IllegalMove::Full));
        }
        if dest.last().is_some_and(|&top| top != color) {
            return Err(illegal(IllegalMove::ColorMismatch));
        }
        let run = self.top_run(mv.from);
        if dest.is_empty() && run == source.len() {
            return Err(illegal(IllegalMove::NoOp));
        }
        Ok(run.min(free))
    }

    /// Applies a move and returns the resulting board together with the number
    /// of tokens that were transferred.
    ///
    /// When the source's top run is longer than the destination's free space,
    /// only as many tokens as fit are moved; the count makes that visible.
    pub fn apply_counted(&self, mv: Move) -> Result<(Board, usize)> {
        let moved = self.check_move(mv)?;
        let mut next = self.clone();
        let split = next.branches[mv.from].len() - moved;
        let run: Vec<Color> = next.branches[mv.from].drain(split..).collect();
        next.branches[mv.to].extend(run);
        Ok((next, moved))
    }

    /// Applies a move, producing a new board. `self` is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use birdsort_solver::engine::{Board, Move};
    /// use birdsort_solver::utils::board_from_rows;
    ///
    /// let board = board_from_rows(&["RR", "R"], 4).unwrap();
    /// let next = board.apply(Move::new(0, 1)).unwrap();
    /// assert_eq!(next, board_from_rows(&["", "RRR"], 4).unwrap());
    /// ```
    pub fn apply(&self, mv: Move) -> Result<Board> {
        self.apply_counted(mv).map(|(board, _)| board)
    }

    /// Enumerates every legal move, ordered by source then destination index.
    ///
    /// Moves that would only relocate a sorted branch into an empty one are
    /// excluded.
    pub fn legal_moves(&self) -> Vec<Move> {
        let n = self.branches.len();
        let mut moves = Vec::new();
        for from in 0..n {
            if self.branches[from].is_empty() {
                continue;
            }
            for to in 0..n {
                let mv = Move::new(from, to);
                if from != to && self.check_move(mv).is_ok() {
                    moves.push(mv);
                }
            }
        }
        moves
    }

    /// Renders the board for a terminal, one branch per line, with an optional
    /// highlighted (selected) branch marked by `>`.
    pub fn to_string_with_highlight(&self, selected: Option<usize>) -> String {
        let mut output = String::new();
        for (idx, branch) in self.branches.iter().enumerate() {
            let marker = if selected == Some(idx) { '>' } else { ' ' };
            output.push_str(&format!("{}{:<2}|", marker, idx));
            for slot in 0..self.capacity {
                match branch.get(slot) {
                    Some(color) => output.push_str(&format!(
                        "\x1b[1;{}m{} \x1b[m",
                        color.to_ansi_color_code(),
                        color.to_char()
                    )),
                    None => output.push_str("  "),
                }
            }
            output.push('|');
            if idx < self.branches.len() - 1 {
                output.push('\n');
            }
        }
        output
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_with_highlight(None))
    }
}

fn is_homogeneous(branch: &[Color]) -> bool {
    branch.windows(2).all(|w| w[0] == w[1])
}

/// A play session: the current board, the number of moves made, and the boards
/// seen before each move so they can be undone.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    steps: u32,
    history: Vec<Board>,
}

impl Game {
    pub fn new_with_board(initial_board: Board) -> Self {
        Game {
            board: initial_board,
            steps: 0,
            history: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Applies a move to the current board.
    ///
    /// Returns the number of tokens transferred. On error the game is unchanged.
    pub fn process_move(&mut self, mv: Move) -> Result<usize> {
        let (next, moved) = self.board.apply_counted(mv)?;
        self.history.push(std::mem::replace(&mut self.board, next));
        self.steps += 1;
        Ok(moved)
    }

    /// Restores the board from before the last move. Returns `false` if there
    /// is nothing to undo.
    pub fn undo_last_move(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.board = previous;
                self.steps -= 1;
                true
            }
            None => false,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.board.is_solved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate_board;
    use crate::utils::board_from_rows;
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn c(ch: char) -> Color {
        Color::from_char(ch).unwrap()
    }

    #[test]
    fn test_color_palette_round_trip() {
        for idx in 0..PALETTE_SIZE as u8 {
            let color = Color::new(idx).unwrap();
            assert_eq!(Color::from_char(color.to_char()), Some(color));
        }
        assert_eq!(Color::from_char('X'), None);
        assert_eq!(Color::from_char('r'), None);
    }

    #[test]
    fn test_board_new_rejects_over_capacity() {
        let result = Board::new(vec![vec![c('R'); 3]], 2);
        assert!(matches!(result, Err(EngineError::InvalidArgument(_))));
        assert!(Board::new(vec![], 4).is_err());
        assert!(Board::new(vec![vec![]], 0).is_err());
    }

    #[test]
    fn test_solved_constructor() {
        let board = Board::solved(5, 3, 4).unwrap();
        assert_eq!(board.branch_count(), 5);
        assert_eq!(board.token_count(), 12);
        assert!(board.is_solved());
        assert!(board.has_uniform_inventory());
        assert!(Board::solved(3, 4, 4).is_err());
        assert!(Board::solved(10, 9, 4).is_err());
    }

    #[test]
    fn test_top_and_top_run() {
        let board = board_from_rows(&["RGG", "B", ""], 4).unwrap();
        assert_eq!(board.top(0), Some(c('G')));
        assert_eq!(board.top_run(0), 2);
        assert_eq!(board.top_run(1), 1);
        assert_eq!(board.top(2), None);
        assert_eq!(board.top_run(2), 0);
        assert_eq!(board.top_run(9), 0);
        assert_eq!(board.free_slots(0), 1);
    }

    #[test]
    fn test_is_solved_definition() {
        assert!(board_from_rows(&["RRRR", "", "GGGG"], 4).unwrap().is_solved());
        // Monochrome but not full.
        assert!(!board_from_rows(&["RR", "RR"], 4).unwrap().is_solved());
        // Full but mixed.
        assert!(!board_from_rows(&["RRRG", "GGGR"], 4).unwrap().is_solved());
    }

    #[test]
    fn test_all_empty_board_is_vacuously_solved() {
        let board = Board::empty(4, 4).unwrap();
        assert!(board.is_solved());
        assert!(!board.is_solved_under(GoalRule::AllComplete));
    }

    #[test]
    fn test_goal_rule_all_complete() {
        let board = board_from_rows(&["RRRR", "GGGG"], 4).unwrap();
        assert!(board.is_solved_under(GoalRule::AllComplete));
        let with_scratch = board_from_rows(&["RRRR", "GGGG", ""], 4).unwrap();
        assert!(with_scratch.is_solved_under(GoalRule::EmptyOrComplete));
        assert!(!with_scratch.is_solved_under(GoalRule::AllComplete));
    }

    #[test]
    fn test_check_move_invalid_indices() {
        let board = board_from_rows(&["R", "R"], 2).unwrap();
        assert!(matches!(
            board.check_move(Move::new(0, 5)),
            Err(EngineError::InvalidArgument(_))
        ));
        assert!(matches!(
            board.check_move(Move::new(1, 1)),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_check_move_illegal_reasons() {
        let board = board_from_rows(&["", "RRRR", "RG", "G"], 4).unwrap();
        let reason = |from, to| board.check_move(Move::new(from, to)).unwrap_err().illegal_reason();
        assert_eq!(reason(0, 1), Some(IllegalMove::EmptySource));
        assert_eq!(reason(3, 1), Some(IllegalMove::Full));
        // Full is reported before the color comparison.
        assert_eq!(reason(2, 1), Some(IllegalMove::Full));
        let mismatch = board_from_rows(&["R", "G"], 4).unwrap();
        assert_eq!(
            mismatch.check_move(Move::new(0, 1)).unwrap_err().illegal_reason(),
            Some(IllegalMove::ColorMismatch)
        );
        assert_eq!(reason(3, 0), Some(IllegalMove::NoOp));
    }

    #[test]
    fn test_apply_moves_maximal_run() {
        let board = board_from_rows(&["RGG", "G", ""], 4).unwrap();
        let (next, moved) = board.apply_counted(Move::new(0, 1)).unwrap();
        assert_eq!(moved, 2);
        assert_eq!(next, board_from_rows(&["R", "GGG", ""], 4).unwrap());
        // The original board is untouched.
        assert_eq!(board.branch(0), Some(&[c('R'), c('G'), c('G')][..]));
    }

    #[test]
    fn test_apply_truncates_to_free_capacity() {
        let board = board_from_rows(&["RGGG", "BGG"], 4).unwrap();
        let (next, moved) = board.apply_counted(Move::new(0, 1)).unwrap();
        assert_eq!(moved, 1);
        assert_eq!(next, board_from_rows(&["RGG", "BGGG"], 4).unwrap());
    }

    #[test]
    fn test_apply_partial_run_onto_empty_branch() {
        let board = board_from_rows(&["RGG", ""], 4).unwrap();
        let next = board.apply(Move::new(0, 1)).unwrap();
        assert_eq!(next, board_from_rows(&["R", "GG"], 4).unwrap());
    }

    #[test]
    fn test_apply_single_color_example() {
        let board = board_from_rows(&["R", "R"], 2).unwrap();
        let next = board.apply(Move::new(0, 1)).unwrap();
        assert_eq!(next, board_from_rows(&["", "RR"], 2).unwrap());
        assert!(next.is_solved());
    }

    #[test]
    fn test_apply_is_deterministic() {
        let board = board_from_rows(&["RGBR", "GB", "BRG", ""], 4).unwrap();
        for mv in board.legal_moves() {
            assert_eq!(board.apply(mv).unwrap(), board.apply(mv).unwrap());
        }
    }

    #[test]
    fn test_legal_moves_order_and_exclusions() {
        let board = board_from_rows(&["RG", "G", "", "BB"], 4).unwrap();
        let moves = board.legal_moves();
        // 1 -> 2 and 3 -> 2 would relocate a sorted branch into an empty one.
        assert_eq!(
            moves,
            vec![
                Move::new(0, 1),
                Move::new(0, 2),
                Move::new(1, 0),
            ]
        );
        for mv in &moves {
            assert!(board.apply(*mv).is_ok());
        }
    }

    #[test]
    fn test_legal_moves_preserve_color_counts() {
        let board = board_from_rows(&["RGBY", "YBGR", "RG", "BY", "", ""], 4).unwrap();
        let counts = board.color_counts();
        for mv in board.legal_moves() {
            let next = board.apply(mv).unwrap();
            assert_eq!(next.color_counts(), counts);
            assert_eq!(next.token_count(), board.token_count());
        }
    }

    #[test]
    fn test_generated_levels_preserve_inventory_under_play() {
        let mut rng = SmallRng::seed_from_u64(41);
        for (branches, colors) in [(4, 3), (7, 5), (10, 8)] {
            let board = generate_board(branches, colors, BRANCH_CAPACITY, 80, &mut rng).unwrap();
            let counts = board.color_counts();
            let total = board.token_count();
            assert_eq!(total, colors * BRANCH_CAPACITY);

            for mv in board.legal_moves() {
                let next = board.apply(mv).unwrap();
                assert_eq!(next.color_counts(), counts);
                assert_eq!(next.token_count(), total);
            }

            let mut current = board;
            for _ in 0..200 {
                let moves = current.legal_moves();
                let Some(&mv) = moves.choose(&mut rng) else {
                    break;
                };
                current = current.apply(mv).unwrap();
                assert_eq!(current.color_counts(), counts);
                assert_eq!(current.token_count(), total);
                assert!(current.has_uniform_inventory());
            }
        }
    }

    #[test]
    fn test_display_board_formatting() {
        let board = board_from_rows(&["R", ""], 2).unwrap();
        let plain = format!("{}", board);
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" 0 |"));
        assert!(lines[0].contains("\x1b[1;41mR \x1b[m"));
        assert_eq!(lines[1], " 1 |    |");
        let highlighted = board.to_string_with_highlight(Some(1));
        assert!(highlighted.lines().nth(1).unwrap().starts_with(">1 |"));
    }

    #[test]
    fn test_game_process_and_undo() {
        let board = board_from_rows(&["RG", "G", ""], 4).unwrap();
        let mut game = Game::new_with_board(board.clone());
        assert_eq!(game.process_move(Move::new(0, 1)).unwrap(), 1);
        assert_eq!(game.steps(), 1);
        assert!(game.process_move(Move::new(1, 1)).is_err());
        assert_eq!(game.steps(), 1);
        assert!(game.undo_last_move());
        assert_eq!(game.board(), &board);
        assert_eq!(game.steps(), 0);
        assert!(!game.undo_last_move());
    }

    #[test]
    fn test_game_detects_solved() {
        let board = board_from_rows(&["R", "R"], 2).unwrap();
        let mut game = Game::new_with_board(board);
        assert!(!game.is_solved());
        game.process_move(Move::new(1, 0)).unwrap();
        assert!(game.is_solved());
    }
}
