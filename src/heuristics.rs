//! Cost-to-solve estimates and one-ply move ranking.
//!
//! [`estimate`] is the admissible heuristic used by A* and IDA*. It sums two
//! lower bounds that a single move can each reduce by at most one, and never
//! both at once:
//!
//! - **buried runs**: every same-color run that is not at the bottom of its
//!   branch has to be lifted off at least once;
//! - **split colors**: a color that forms the bottom run of `k` branches needs
//!   at least `k - 1` moves that empty one of those branches onto another.
//!
//! The estimate is therefore consistent (and admissible) on every board whose
//! colors each appear exactly `capacity` times. [`mixed_branch_penalty`] is an
//! extra, inadmissible signal that weighted search adds on top.
use crate::engine::{Board, Move, PALETTE_SIZE};
use std::collections::HashSet;

/// Estimates the number of moves still needed to solve `board`.
///
/// Returns 0 iff the board is solved.
///
/// # Examples
/// ```
/// use birdsort_solver::heuristics::estimate;
/// use birdsort_solver::utils::board_from_rows;
///
/// let solved = board_from_rows(&["RRRR", "", "GGGG"], 4).unwrap();
/// assert_eq!(estimate(&solved), 0);
///
/// // One buried run (the G on top of R) and R split over two bottoms.
/// let board = board_from_rows(&["RRG", "R", "GGG"], 4).unwrap();
/// assert_eq!(estimate(&board), 2);
/// ```
pub fn estimate(board: &Board) -> u32 {
    if board.is_solved() {
        return 0;
    }
    let raw = buried_runs(board) + split_colors(board);
    raw.max(1)
}

/// Counts the runs that sit above the bottom run of their branch.
pub fn buried_runs(board: &Board) -> u32 {
    board
        .branches()
        .iter()
        .map(|branch| branch.windows(2).filter(|w| w[0] != w[1]).count() as u32)
        .sum()
}

/// Sums, over colors, the number of extra branches whose bottom run has that color.
pub fn split_colors(board: &Board) -> u32 {
    let mut bottoms = [0u32; PALETTE_SIZE];
    for branch in board.branches() {
        if let Some(bottom) = branch.first() {
            bottoms[bottom.index()] += 1;
        }
    }
    bottoms.iter().map(|&n| n.saturating_sub(1)).sum()
}

/// Extra penalty used by weighted search; not admissible on its own.
///
/// Adds one for every additional color mixed into a branch and one for every
/// additional branch that holds some token of a given color.
pub fn mixed_branch_penalty(board: &Board) -> u32 {
    let mut penalty = 0;
    let mut branches_with_color = [0u32; PALETTE_SIZE];
    for branch in board.branches() {
        let mut seen = [false; PALETTE_SIZE];
        for color in branch {
            seen[color.index()] = true;
        }
        let distinct = seen.iter().filter(|&&s| s).count() as u32;
        penalty += distinct.saturating_sub(1);
        for (idx, present) in seen.iter().enumerate() {
            if *present {
                branches_with_color[idx] += 1;
            }
        }
    }
    penalty
        + branches_with_color
            .iter()
            .map(|&n| n.saturating_sub(1))
            .sum::<u32>()
}

/// Counts branches that already hold `capacity` tokens of one color.
pub fn count_completed_branches(board: &Board) -> usize {
    (0..board.branch_count())
        .filter(|&idx| board.is_branch_complete(idx))
        .count()
}

/// Ranks every legal move by the estimate of the board it produces.
///
/// Ties keep the move-model order (source, then destination), so the ranking
/// is deterministic.
pub fn rank_moves(board: &Board) -> Vec<(Move, u32)> {
    let mut ranked: Vec<(Move, u32)> = board
        .legal_moves()
        .into_iter()
        .filter_map(|mv| board.apply(mv).ok().map(|next| (mv, estimate(&next))))
        .collect();
    ranked.sort_by_key(|&(_, score)| score);
    ranked
}

/// The outcome of a greedy playout.
#[derive(Clone, Debug)]
pub struct Playout {
    pub moves: Vec<Move>,
    pub final_board: Board,
    pub solved: bool,
}

/// Plays the best one-ply move repeatedly until the board is solved, no
/// unvisited successor remains, or `max_moves` moves have been played.
///
/// Boards already seen during the playout are never re-entered, so the
/// playout cannot cycle.
pub fn greedy_playout(board: &Board, max_moves: usize) -> Playout {
    let mut current = board.clone();
    let mut moves = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(current.clone());

    while !current.is_solved() && moves.len() < max_moves {
        let next = rank_moves(&current).into_iter().find_map(|(mv, _)| {
            let next = current.apply(mv).ok()?;
            (!visited.contains(&next)).then_some((mv, next))
        });
        let Some((mv, next)) = next else {
            break;
        };
        visited.insert(next.clone());
        moves.push(mv);
        current = next;
    }

    Playout {
        solved: current.is_solved(),
        moves,
        final_board: current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::board_from_rows;

    #[test]
    fn test_estimate_zero_only_when_solved() {
        let solved = board_from_rows(&["GGGG", "RRRR", ""], 4).unwrap();
        assert_eq!(estimate(&solved), 0);
        let empty = Board::empty(3, 4).unwrap();
        assert_eq!(estimate(&empty), 0);
        // Homogeneous but split: the raw terms may be zero, estimate is still positive.
        let split = board_from_rows(&["RR", "RR"], 4).unwrap();
        assert!(estimate(&split) > 0);
    }

    #[test]
    fn test_buried_runs_and_split_colors() {
        let board = board_from_rows(&["RGGB", "BR", "G", ""], 4).unwrap();
        assert_eq!(buried_runs(&board), 3);
        // No color is the bottom of more than one branch.
        assert_eq!(split_colors(&board), 0);
        let split = board_from_rows(&["RG", "RB", "R"], 4).unwrap();
        assert_eq!(split_colors(&split), 2);
    }

    #[test]
    fn test_estimate_is_consistent_across_moves() {
        let board = board_from_rows(&["RGBR", "GBRG", "BRGB", "", ""], 4).unwrap();
        let mut frontier = vec![board];
        let mut seen = HashSet::new();
        while let Some(current) = frontier.pop() {
            if !seen.insert(current.clone()) || seen.len() > 2_000 {
                continue;
            }
            let h = estimate(&current);
            for mv in current.legal_moves() {
                let next = current.apply(mv).unwrap();
                assert!(
                    h <= 1 + estimate(&next),
                    "estimate dropped by more than one on {} from\n{}",
                    mv,
                    current
                );
                frontier.push(next);
            }
        }
    }

    #[test]
    fn test_mixed_branch_penalty() {
        let solved = board_from_rows(&["RRRR", "GGGG"], 4).unwrap();
        assert_eq!(mixed_branch_penalty(&solved), 0);
        // Branch 0 mixes two colors, G appears in two branches.
        let board = board_from_rows(&["RRRG", "GGG", "R"], 4).unwrap();
        assert_eq!(mixed_branch_penalty(&board), 1 + 1 + 1);
    }

    #[test]
    fn test_count_completed_branches() {
        let board = board_from_rows(&["RRRR", "GGG", "G", "BBBB"], 4).unwrap();
        assert_eq!(count_completed_branches(&board), 2);
    }

    #[test]
    fn test_rank_moves_prefers_progress() {
        let board = board_from_rows(&["RRRG", "GGG", "R", ""], 4).unwrap();
        let ranked = rank_moves(&board);
        assert_eq!(ranked, vec![(Move::new(0, 1), 1), (Move::new(0, 3), 2)]);
    }

    #[test]
    fn test_rank_moves_on_stuck_board() {
        let board = board_from_rows(&["RG", "GR"], 2).unwrap();
        assert!(rank_moves(&board).is_empty());
    }

    #[test]
    fn test_greedy_playout_solves_simple_board() {
        let board = board_from_rows(&["RRRG", "GGGR", "", ""], 4).unwrap();
        let playout = greedy_playout(&board, 50);
        assert!(playout.solved);
        let mut replay = board.clone();
        for mv in &playout.moves {
            replay = replay.apply(*mv).unwrap();
        }
        assert_eq!(replay, playout.final_board);
    }

    #[test]
    fn test_greedy_playout_respects_move_limit() {
        let board = board_from_rows(&["RGBR", "GBRG", "BRGB", "", ""], 4).unwrap();
        let playout = greedy_playout(&board, 2);
        assert!(playout.moves.len() <= 2);
    }
}
