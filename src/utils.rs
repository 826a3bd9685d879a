use crate::engine::{Board, Color};
use crate::error::{BoardFileError, EngineError, Result};
use std::fs;
use std::path::Path;

/// Parses an array of string slices into a `Board`.
///
/// Each string slice describes one branch, listing its tokens from the bottom
/// to the top as palette letters (`R`, `G`, `B`, `Y`, `P`, `O`, `C`, `M`).
/// An empty branch is written as `""` or `"-"`.
///
/// # Arguments
/// * `rows`: One string per branch, in branch order.
/// * `capacity`: The capacity of every branch.
///
/// # Returns
/// * `Ok(Board)` if parsing is successful.
/// * `Err(EngineError::InvalidArgument)` if a character is not a palette letter,
///   a branch is over capacity, or no rows were given.
///
/// # Examples
/// ```
/// use birdsort_solver::utils::board_from_rows;
/// use birdsort_solver::engine::Color;
///
/// let board = board_from_rows(&["RG", "-", "G"], 4).unwrap();
/// assert_eq!(board.branch_count(), 3);
/// assert_eq!(board.top(0), Color::from_char('G'));
/// assert!(board.branch(1).unwrap().is_empty());
///
/// assert!(board_from_rows(&["RXB"], 4).is_err());
/// assert!(board_from_rows(&["RRRRR"], 4).is_err());
/// ```
pub fn board_from_rows(rows: &[&str], capacity: usize) -> Result<Board> {
    let mut branches = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        if *row == "-" {
            branches.push(Vec::new());
            continue;
        }
        let branch = row
            .chars()
            .enumerate()
            .map(|(pos, ch)| {
                Color::from_char(ch).ok_or_else(|| {
                    EngineError::InvalidArgument(format!(
                        "unrecognized character '{}' in branch {} position {}",
                        ch, idx, pos
                    ))
                })
            })
            .collect::<Result<Vec<Color>>>()?;
        branches.push(branch);
    }
    Board::new(branches, capacity)
}

/// Formats a board in the same text format `board_from_rows` reads, writing
/// `-` for empty branches.
pub fn board_to_rows(board: &Board) -> Vec<String> {
    board
        .branches()
        .iter()
        .map(|branch| {
            if branch.is_empty() {
                "-".to_string()
            } else {
                branch.iter().map(|c| c.to_char()).collect()
            }
        })
        .collect()
}

/// Reads a board file: one branch per line, blank lines and lines starting
/// with `#` are ignored.
pub fn read_board_file(path: &Path, capacity: usize) -> Result<Board, BoardFileError> {
    let content = fs::read_to_string(path).map_err(|source| BoardFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .collect();

    board_from_rows(&lines, capacity).map_err(|source| BoardFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
