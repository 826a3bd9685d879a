//! Seeded level generation.
//!
//! Levels are produced by starting from a solved board and applying random
//! *reverse* moves: each step picks a destination `d`, lifts `t` tokens of
//! its top run and drops them on a branch `s` such that the forward move
//! `s -> d` is legal and transfers exactly those `t` tokens. Replaying the
//! forward moves in reverse order solves the level, so every generated board
//! is solvable.
use crate::config::EngineConfig;
use crate::engine::{Board, BRANCH_CAPACITY, PALETTE_SIZE};
use crate::error::{EngineError, Result};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A reverse step: lift `count` tokens off `from` and place them on `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ReverseStep {
    from: usize,
    to: usize,
    count: usize,
}

fn reverse_steps(board: &Board) -> Vec<ReverseStep> {
    let n = board.branch_count();
    let capacity = board.capacity();
    let mut steps = Vec::new();
    for from in 0..n {
        let Some(color) = board.top(from) else {
            continue;
        };
        let len = board.branch(from).map_or(0, <[_]>::len);
        let run = board.top_run(from);
        for count in 1..=run {
            // What remains below must accept the forward move back.
            if count < run || count == len {
                for to in (0..n).filter(|&to| to != from) {
                    let to_len = board.branch(to).map_or(0, <[_]>::len);
                    if to_len + count > capacity || board.top(to) == Some(color) {
                        continue;
                    }
                    // Forward move would be a sorted branch dropped onto an empty one.
                    if to_len == 0 && count == len {
                        continue;
                    }
                    steps.push(ReverseStep { from, to, count });
                }
            }
        }
    }
    steps
}

fn apply_reverse(board: &Board, step: ReverseStep) -> Result<Board> {
    let mut branches = board.branches().to_vec();
    let split = branches[step.from].len() - step.count;
    let lifted: Vec<_> = branches[step.from].drain(split..).collect();
    branches[step.to].extend(lifted);
    Board::new(branches, board.capacity())
}

/// Generates a solvable board.
///
/// # Arguments
/// * `branches`: Number of branches.
/// * `colors`: Number of colors; each appears `capacity` times. At least one
///   branch must be left over for maneuvering, so `colors < branches`.
/// * `capacity`: Branch capacity.
/// * `scramble_moves`: Number of reverse moves applied to the solved board.
/// * `rng`: Source of randomness.
///
/// # Returns
/// A board with a uniform inventory. It is unsolved unless the scramble could
/// not leave the solved set (for example `scramble_moves == 0`).
pub fn generate_board<R: Rng>(
    branches: usize,
    colors: usize,
    capacity: usize,
    scramble_moves: usize,
    rng: &mut R,
) -> Result<Board> {
    if colors == 0 || colors > PALETTE_SIZE {
        return Err(EngineError::InvalidArgument(format!(
            "colors must be in 1..={}, got {}",
            PALETTE_SIZE, colors
        )));
    }
    if colors >= branches {
        return Err(EngineError::InvalidArgument(format!(
            "{} colors need at least {} branches, got {}",
            colors,
            colors + 1,
            branches
        )));
    }

    let mut board = Board::solved(branches, colors, capacity)?;
    let mut applied = 0;
    // Up to twice the requested steps while the board is still solved.
    let max_steps = scramble_moves * 2;
    while applied < max_steps && (applied < scramble_moves || board.is_solved()) {
        let candidates = reverse_steps(&board);
        let Some(&step) = candidates.choose(rng) else {
            break;
        };
        board = apply_reverse(&board, step)?;
        applied += 1;
    }
    log::debug!(
        "generated {}x{} level after {} reverse moves",
        branches,
        colors,
        applied
    );
    Ok(board)
}

/// Generates a level for the given configuration, reproducibly from `seed`.
///
/// # Examples
/// ```
/// use birdsort_solver::config::EngineConfig;
/// use birdsort_solver::generator::generate_level;
///
/// let config = EngineConfig::default();
/// let a = generate_level(&config, 7).unwrap();
/// let b = generate_level(&config, 7).unwrap();
/// assert_eq!(a, b);
/// assert!(a.has_uniform_inventory());
/// ```
pub fn generate_level(config: &EngineConfig, seed: u64) -> Result<Board> {
    config.validate()?;
    let mut rng = SmallRng::seed_from_u64(seed);
    generate_board(
        config.branches,
        config.colors,
        BRANCH_CAPACITY,
        config.scramble_moves,
        &mut rng,
    )
}
