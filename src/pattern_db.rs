//! Disjoint pattern databases.
//!
//! A pattern keeps only the tokens of a small group of colors and forgets the
//! rest, along with the order of the branches. Inside a pattern a move may lift
//! any part of a top run onto an empty branch or a matching top, as long as the
//! destination has room. Every real move of a group color is such a move, and
//! moves of other colors leave the pattern unchanged, so the distance from a
//! pattern to its sorted form never exceeds the real distance. A real move
//! changes the pattern of one group only, which lets the distances of disjoint
//! groups be added.
//!
//! Tables are filled by breadth-first search backwards from the sorted pattern
//! and are keyed by group size: colors inside a group are renumbered, and with
//! a uniform inventory every group of the same size shares one table.
use crate::engine::{Board, Color};
use crate::heuristics::estimate;
use std::collections::{HashMap, VecDeque};

/// Cap on the patterns stored in one table.
pub const DEFAULT_PATTERN_STATES: usize = 100_000;

/// Branches of a pattern, each holding group-local color indices, sorted.
type Pattern = Vec<Vec<u8>>;

/// Distances from every pattern of one group size to the sorted pattern.
#[derive(Clone, Debug)]
pub struct PatternDatabase {
    branches: usize,
    capacity: usize,
    distances: HashMap<Pattern, u32>,
    /// Lower bound returned for patterns missing from the table.
    unseen: u32,
    complete: bool,
}

impl PatternDatabase {
    /// Builds the table for `colors` colors of `capacity` tokens each on
    /// `branches` branches, storing at most about `max_states` patterns.
    ///
    /// When the cap stops the search early, every missing pattern is at least
    /// one move further than the deepest finished layer, and that depth is
    /// what lookups return for them.
    pub fn build(colors: usize, branches: usize, capacity: usize, max_states: usize) -> Self {
        let mut goal: Pattern = (0..colors).map(|c| vec![c as u8; capacity]).collect();
        goal.resize(branches.max(colors), Vec::new());
        goal.sort();

        let mut distances = HashMap::from([(goal.clone(), 0)]);
        let mut queue = VecDeque::from([(goal, 0u32)]);
        let mut unseen = 1;
        let mut complete = true;

        while let Some((pattern, distance)) = queue.pop_front() {
            unseen = distance + 1;
            if distances.len() >= max_states {
                complete = false;
                break;
            }
            for prev in predecessors(&pattern, capacity) {
                if !distances.contains_key(&prev) {
                    distances.insert(prev.clone(), distance + 1);
                    queue.push_back((prev, distance + 1));
                }
            }
        }

        log::debug!(
            "pattern table for {} colors on {} branches: {} patterns{}",
            colors,
            branches,
            distances.len(),
            if complete { "" } else { " (truncated)" }
        );
        PatternDatabase {
            branches,
            capacity,
            distances,
            unseen,
            complete,
        }
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// True if the search reached every pattern that can be sorted.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    fn distance(&self, pattern: &Pattern) -> u32 {
        self.distances.get(pattern).copied().unwrap_or(self.unseen)
    }
}

/// Patterns one relaxed move away from `pattern`, found by undoing a move
/// into each branch.
fn predecessors(pattern: &Pattern, capacity: usize) -> Vec<Pattern> {
    let mut found = Vec::new();
    for (to, branch) in pattern.iter().enumerate() {
        let Some(&color) = branch.last() else {
            continue;
        };
        let run = branch.iter().rev().take_while(|&&c| c == color).count();
        for count in 1..=run {
            // Below the lifted tokens the branch must have been empty or matching.
            if count == run && count != branch.len() {
                continue;
            }
            for (from, source) in pattern.iter().enumerate() {
                if from == to || source.len() + count > capacity {
                    continue;
                }
                let mut prev = pattern.clone();
                let split = prev[to].len() - count;
                let lifted = prev[to].split_off(split);
                prev[from].extend(lifted);
                prev.sort();
                found.push(prev);
            }
        }
    }
    found
}

fn project(board: &Board, group: &[Color]) -> Pattern {
    let mut pattern: Pattern = board
        .branches()
        .iter()
        .map(|branch| {
            branch
                .iter()
                .filter_map(|c| group.iter().position(|g| g == c).map(|i| i as u8))
                .collect()
        })
        .collect();
    pattern.sort();
    pattern
}

/// Splits colors into disjoint groups: singletons for up to three colors,
/// two halves for up to six, thirds beyond that.
pub fn color_groups(colors: &[Color]) -> Vec<Vec<Color>> {
    let n = colors.len();
    let sizes = if n <= 3 {
        vec![1; n]
    } else if n <= 6 {
        vec![n / 2, n - n / 2]
    } else {
        vec![n / 3, n / 3, n - 2 * (n / 3)]
    };
    let mut rest = colors;
    sizes
        .into_iter()
        .map(|size| {
            let (group, tail) = rest.split_at(size);
            rest = tail;
            group.to_vec()
        })
        .collect()
}

/// Pattern tables covering every color of one board shape.
#[derive(Clone, Debug)]
pub struct DisjointPatternDatabase {
    groups: Vec<Vec<Color>>,
    tables: HashMap<usize, PatternDatabase>,
}

impl DisjointPatternDatabase {
    /// Builds the tables for the colors on `board`.
    ///
    /// Returns `None` unless every color appears exactly `capacity` times.
    pub fn for_board(board: &Board, max_states: usize) -> Option<Self> {
        if !board.has_uniform_inventory() {
            return None;
        }
        let colors: Vec<Color> = board.color_counts().into_keys().collect();
        let groups = color_groups(&colors);
        let mut tables = HashMap::new();
        for group in &groups {
            tables.entry(group.len()).or_insert_with(|| {
                PatternDatabase::build(group.len(), board.branch_count(), board.capacity(), max_states)
            });
        }
        Some(DisjointPatternDatabase { groups, tables })
    }

    pub fn groups(&self) -> &[Vec<Color>] {
        &self.groups
    }

    /// Sum of the group distances, or 0 for a board of another shape.
    pub fn lookup(&self, board: &Board) -> u32 {
        self.groups
            .iter()
            .filter_map(|group| {
                let table = self.tables.get(&group.len())?;
                (table.branches == board.branch_count() && table.capacity == board.capacity())
                    .then(|| table.distance(&project(board, group)))
            })
            .sum()
    }

    /// The larger of [`lookup`](Self::lookup) and [`estimate`]; both are
    /// lower bounds, so the maximum is one too.
    pub fn estimate(&self, board: &Board) -> u32 {
        estimate(board).max(self.lookup(board))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate_board;
    use crate::utils::board_from_rows;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn shortest_by_bfs(start: &Board) -> Option<u32> {
        let mut seen = HashSet::from([start.clone()]);
        let mut queue = VecDeque::from([(start.clone(), 0)]);
        while let Some((board, depth)) = queue.pop_front() {
            if board.is_solved() {
                return Some(depth);
            }
            for mv in board.legal_moves() {
                let next = board.apply(mv).unwrap();
                if seen.insert(next.clone()) {
                    queue.push_back((next, depth + 1));
                }
            }
        }
        None
    }

    fn colors(s: &str) -> Vec<Color> {
        s.chars().map(|ch| Color::from_char(ch).unwrap()).collect()
    }

    #[test]
    fn test_color_groups() {
        let sizes = |n: usize| -> Vec<usize> {
            color_groups(&colors(&"RGBYPOCM"[..n]))
                .iter()
                .map(Vec::len)
                .collect()
        };
        assert_eq!(sizes(0), Vec::<usize>::new());
        assert_eq!(sizes(3), vec![1, 1, 1]);
        assert_eq!(sizes(5), vec![2, 3]);
        assert_eq!(sizes(7), vec![2, 2, 3]);
        assert_eq!(color_groups(&colors("RGBY")), vec![colors("RG"), colors("BY")]);
    }

    #[test]
    fn test_single_color_table() {
        let table = PatternDatabase::build(1, 3, 2, DEFAULT_PATTERN_STATES);
        assert!(table.is_complete());
        // [RR] [] [], [R] [R] [].
        assert_eq!(table.len(), 2);
        assert_eq!(table.distance(&vec![vec![], vec![0], vec![0]]), 1);
    }

    #[test]
    fn test_solved_board_looks_up_zero() {
        let board = Board::solved(5, 3, 4).unwrap();
        let db = DisjointPatternDatabase::for_board(&board, DEFAULT_PATTERN_STATES).unwrap();
        assert_eq!(db.groups().len(), 3);
        assert_eq!(db.lookup(&board), 0);
        assert_eq!(db.estimate(&board), 0);
    }

    #[test]
    fn test_lookup_counts_each_group() {
        let board = board_from_rows(&["RG", "GR", ""], 2).unwrap();
        let db = DisjointPatternDatabase::for_board(&board, DEFAULT_PATTERN_STATES).unwrap();
        // Each color is split over two branches and needs one merge.
        assert_eq!(db.lookup(&board), 2);
        assert_eq!(shortest_by_bfs(&board), Some(3));
    }

    #[test]
    fn test_non_uniform_inventory_has_no_database() {
        let board = board_from_rows(&["RR", "R", "R", ""], 2).unwrap();
        assert!(DisjointPatternDatabase::for_board(&board, DEFAULT_PATTERN_STATES).is_none());
    }

    #[test]
    fn test_other_board_shape_looks_up_zero() {
        let board = board_from_rows(&["RG", "GR", ""], 2).unwrap();
        let db = DisjointPatternDatabase::for_board(&board, DEFAULT_PATTERN_STATES).unwrap();
        let wider = board_from_rows(&["RG", "GR", "", ""], 2).unwrap();
        assert_eq!(db.lookup(&wider), 0);
    }

    #[test]
    fn test_pattern_estimate_never_exceeds_shortest_path() {
        let mut rng = SmallRng::seed_from_u64(31);
        let mut boards = Vec::new();
        for _ in 0..4 {
            boards.push(generate_board(4, 3, 3, 40, &mut rng).unwrap());
            boards.push(generate_board(5, 4, 2, 40, &mut rng).unwrap());
        }
        for board in boards {
            let db = DisjointPatternDatabase::for_board(&board, DEFAULT_PATTERN_STATES).unwrap();
            let shortest = shortest_by_bfs(&board).unwrap();
            assert!(
                db.estimate(&board) <= shortest,
                "estimate {} above shortest path {} for\n{}",
                db.estimate(&board),
                shortest,
                board
            );
            assert!(db.estimate(&board) >= estimate(&board));
        }
    }

    #[test]
    fn test_truncated_table_stays_a_lower_bound() {
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..4 {
            let board = generate_board(5, 4, 2, 40, &mut rng).unwrap();
            let db = DisjointPatternDatabase::for_board(&board, 3).unwrap();
            assert!(db.lookup(&board) <= shortest_by_bfs(&board).unwrap());
        }
        assert!(!PatternDatabase::build(2, 5, 2, 3).is_complete());
    }
}
