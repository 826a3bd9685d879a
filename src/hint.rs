//! Next-move suggestions built on the solver.
//!
//! A hint first runs a (usually tightly bounded) search and returns the first
//! move of the path it finds. When that search runs out of budget the service
//! can fall back to a one-ply lookahead over [`estimate`]. Every hint records
//! which of the two produced it.
//!
//! [`estimate`]: crate::heuristics::estimate
use crate::engine::{Board, GoalRule, Move};
use crate::error::{EngineError, Result};
use crate::heuristics::rank_moves;
use crate::solver::{solve, Optimality, SearchLimits, SolverConfig};
use std::fmt;

/// Which strategy produced a hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HintSource {
    /// First move of a solver path; `optimal` tells whether that path is shortest.
    Solver { optimal: bool },
    /// Best move by one-ply heuristic lookahead.
    Lookahead,
}

impl fmt::Display for HintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintSource::Solver { optimal: true } => write!(f, "solver (optimal)"),
            HintSource::Solver { optimal: false } => write!(f, "solver (best effort)"),
            HintSource::Lookahead => write!(f, "lookahead"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hint {
    pub mv: Move,
    pub source: HintSource,
    /// Length of the solver path the hint starts, when a path was found.
    pub moves_to_solve: Option<usize>,
}

/// Parameters for [`hint`].
#[derive(Clone, Debug, PartialEq)]
pub struct HintConfig {
    pub solver: SolverConfig,
    /// Fall back to lookahead when the search is exhausted.
    pub fallback: bool,
}

impl Default for HintConfig {
    fn default() -> Self {
        HintConfig {
            solver: SolverConfig {
                limits: SearchLimits::expansions(20_000),
                ..SolverConfig::default()
            },
            fallback: true,
        }
    }
}

/// Suggests the next move for `board`.
///
/// # Errors
/// * `AlreadySolved` if the board needs no move.
/// * `Unsolvable` and `InvalidArgument` from the solver, unchanged.
/// * `SearchExhausted` if the search ran out of budget and fallback is disabled.
///
/// # Examples
/// ```
/// use birdsort_solver::engine::Move;
/// use birdsort_solver::hint::{hint, HintConfig, HintSource};
/// use birdsort_solver::utils::board_from_rows;
///
/// let board = board_from_rows(&["R", "R"], 2).unwrap();
/// let hint = hint(&board, &HintConfig::default()).unwrap();
/// assert_eq!(hint.mv, Move::new(0, 1));
/// assert_eq!(hint.source, HintSource::Solver { optimal: true });
/// ```
pub fn hint(board: &Board, config: &HintConfig) -> Result<Hint> {
    if board.is_solved_under(config.solver.goal) {
        return Err(EngineError::AlreadySolved);
    }
    match solve(board, &config.solver) {
        Ok(solution) => {
            let mv = solution
                .moves
                .first()
                .copied()
                .ok_or(EngineError::AlreadySolved)?;
            Ok(Hint {
                mv,
                source: HintSource::Solver {
                    optimal: solution.optimality == Optimality::Optimal,
                },
                moves_to_solve: Some(solution.moves.len()),
            })
        }
        Err(EngineError::SearchExhausted { expanded }) if config.fallback => {
            log::debug!(
                "hint search exhausted after {} expansions, using lookahead",
                expanded
            );
            lookahead_hint(board, config.solver.goal)
        }
        Err(err) => Err(err),
    }
}

/// Picks the legal move whose resulting board has the lowest estimate.
///
/// Returns `AlreadySolved` if the board is solved under `goal`, and
/// `Unsolvable` if it is not but has no legal move.
pub fn lookahead_hint(board: &Board, goal: GoalRule) -> Result<Hint> {
    if board.is_solved_under(goal) {
        return Err(EngineError::AlreadySolved);
    }
    let (mv, _) = rank_moves(board)
        .into_iter()
        .next()
        .ok_or(EngineError::Unsolvable)?;
    Ok(Hint {
        mv,
        source: HintSource::Lookahead,
        moves_to_solve: None,
    })
}

/// Returns up to `k` candidate moves, best first, with the estimate of the
/// board each one leads to.
pub fn top_moves(board: &Board, k: usize) -> Vec<(Move, u32)> {
    let mut ranked = rank_moves(board);
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate_board;
    use crate::utils::board_from_rows;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn exhausted_config(fallback: bool) -> HintConfig {
        HintConfig {
            solver: SolverConfig {
                limits: SearchLimits::expansions(0),
                ..SolverConfig::default()
            },
            fallback,
        }
    }

    #[test]
    fn test_hint_is_first_move_of_solution() {
        let mut rng = SmallRng::seed_from_u64(17);
        let board = generate_board(5, 3, 4, 60, &mut rng).unwrap();
        let solution = solve(&board, &SolverConfig::default()).unwrap();
        let hint = hint(&board, &HintConfig {
            solver: SolverConfig::default(),
            fallback: false,
        })
        .unwrap();
        assert_eq!(hint.mv, solution.moves[0]);
        assert_eq!(hint.moves_to_solve, Some(solution.moves.len()));
        assert_eq!(hint.source, HintSource::Solver { optimal: true });
    }

    #[test]
    fn test_hint_on_solved_board() {
        let board = board_from_rows(&["RR", ""], 2).unwrap();
        assert_eq!(
            hint(&board, &HintConfig::default()).unwrap_err(),
            EngineError::AlreadySolved
        );
        assert_eq!(
            lookahead_hint(&board, GoalRule::EmptyOrComplete).unwrap_err(),
            EngineError::AlreadySolved
        );
    }

    #[test]
    fn test_lookahead_respects_goal_rule() {
        let board = board_from_rows(&["RR", "", "GG"], 2).unwrap();
        assert_eq!(
            lookahead_hint(&board, GoalRule::EmptyOrComplete).unwrap_err(),
            EngineError::AlreadySolved
        );
        // Not solved when every branch must be full, and no move can fill the spare one.
        assert_eq!(
            lookahead_hint(&board, GoalRule::AllComplete).unwrap_err(),
            EngineError::Unsolvable
        );

        let mut config = exhausted_config(true);
        config.solver.goal = GoalRule::AllComplete;
        assert_eq!(hint(&board, &config).unwrap_err(), EngineError::Unsolvable);
    }

    #[test]
    fn test_hint_falls_back_to_lookahead() {
        let board = board_from_rows(&["RRRG", "GGG", "R", ""], 4).unwrap();
        let hint = hint(&board, &exhausted_config(true)).unwrap();
        assert_eq!(hint.source, HintSource::Lookahead);
        assert_eq!(hint.mv, Move::new(0, 1));
        assert_eq!(hint.moves_to_solve, None);
    }

    #[test]
    fn test_hint_without_fallback_propagates_exhaustion() {
        let board = board_from_rows(&["RRRG", "GGG", "R", ""], 4).unwrap();
        assert_eq!(
            hint(&board, &exhausted_config(false)).unwrap_err(),
            EngineError::SearchExhausted { expanded: 0 }
        );
    }

    #[test]
    fn test_hint_propagates_unsolvable() {
        let board = board_from_rows(&["R", "G"], 2).unwrap();
        assert_eq!(
            hint(&board, &HintConfig::default()).unwrap_err(),
            EngineError::Unsolvable
        );
        assert_eq!(
            hint(&board, &exhausted_config(true)).unwrap_err(),
            EngineError::Unsolvable
        );
    }

    #[test]
    fn test_top_moves() {
        let board = board_from_rows(&["RRRG", "GGG", "R", ""], 4).unwrap();
        assert_eq!(top_moves(&board, 1), vec![(Move::new(0, 1), 1)]);
        assert_eq!(top_moves(&board, 5).len(), 2);
        assert!(top_moves(&board, 0).is_empty());
    }
}
