//! Search for move sequences that solve a board.
//!
//! Two strategies are provided:
//! - **A\*** over the board graph, keyed by board equality, with an optional
//!   weight that trades optimality for speed.
//! - **IDA\***, an iterative-deepening variant that only keeps the current path
//!   in memory.
//!
//! Both share [`SearchLimits`], so interactive callers can bound latency, and
//! both report [`EngineError::SearchExhausted`] separately from
//! [`EngineError::Unsolvable`]. Either can be guided by [`estimate`] or by a
//! disjoint pattern database built for the board being solved.
use crate::engine::{Board, GoalRule, Move};
use crate::error::{EngineError, Result};
use crate::heuristics::{estimate, mixed_branch_penalty};
use crate::pattern_db::{DisjointPatternDatabase, DEFAULT_PATTERN_STATES};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Search priorities are kept in integer thousandths of a move.
const WEIGHT_SCALE: u64 = 1000;

/// Largest accepted heuristic weight.
pub const MAX_WEIGHT: f64 = 1000.0;

/// Which search strategy to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "astar")]
    AStar,
    #[serde(rename = "ida_star")]
    IdaStar,
}

impl FromStr for Algorithm {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "astar" | "a*" => Ok(Algorithm::AStar),
            "ida_star" | "ida*" | "ida" => Ok(Algorithm::IdaStar),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown algorithm '{}', expected 'astar' or 'ida_star'",
                other
            ))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::AStar => write!(f, "astar"),
            Algorithm::IdaStar => write!(f, "ida_star"),
        }
    }
}

/// Lower bound that guides the search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicKind {
    /// [`estimate`]: buried runs plus split colors.
    #[default]
    Estimate,
    /// Disjoint pattern database, never below [`estimate`]. Falls back to
    /// [`estimate`] on boards without a uniform inventory.
    PatternDatabase,
}

impl FromStr for HeuristicKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "estimate" => Ok(HeuristicKind::Estimate),
            "pattern_database" | "pdb" => Ok(HeuristicKind::PatternDatabase),
            other => Err(EngineError::InvalidArgument(format!(
                "unknown heuristic '{}', expected 'estimate' or 'pattern_database'",
                other
            ))),
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeuristicKind::Estimate => write!(f, "estimate"),
            HeuristicKind::PatternDatabase => write!(f, "pattern_database"),
        }
    }
}

/// Caps on the work a single search may do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of states expanded; `None` means unbounded.
    pub max_expansions: Option<usize>,
    /// Wall-clock budget measured from the start of the search.
    pub time_limit: Option<Duration>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        SearchLimits {
            max_expansions: None,
            time_limit: None,
        }
    }

    pub fn expansions(max: usize) -> Self {
        SearchLimits {
            max_expansions: Some(max),
            time_limit: None,
        }
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits::expansions(200_000)
    }
}

/// Parameters for [`solve`].
#[derive(Clone, Debug, PartialEq)]
pub struct SolverConfig {
    pub limits: SearchLimits,
    /// Heuristic weight; `1.0` is plain A*. Ignored by IDA*.
    pub weight: f64,
    pub goal: GoalRule,
    pub algorithm: Algorithm,
    pub heuristic: HeuristicKind,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            limits: SearchLimits::default(),
            weight: 1.0,
            goal: GoalRule::default(),
            algorithm: Algorithm::default(),
            heuristic: HeuristicKind::default(),
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() || !(1.0..=MAX_WEIGHT).contains(&self.weight) {
            return Err(EngineError::InvalidArgument(format!(
                "heuristic weight must be in 1.0..={}, got {}",
                MAX_WEIGHT, self.weight
            )));
        }
        Ok(())
    }

    fn weight_scaled(&self) -> u64 {
        (self.weight * WEIGHT_SCALE as f64).round() as u64
    }
}

/// Whether a returned path is known to be shortest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Optimality {
    Optimal,
    BestEffort,
}

/// Counters collected during a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub expanded: usize,
    pub generated: usize,
    pub elapsed: Duration,
}

/// Represents a solution found by the solver.
#[derive(Clone, Debug)]
pub struct Solution {
    /// Moves to apply in order, starting from the searched board.
    pub moves: Vec<Move>,
    /// The board after applying every move.
    pub final_board: Board,
    pub optimality: Optimality,
    pub stats: SearchStats,
}

/// Finds a sequence of moves that takes `board` to a solved board.
///
/// # Errors
/// * `InvalidArgument` if the configuration is invalid.
/// * `Unsolvable` if every reachable board was explored without reaching the goal.
/// * `SearchExhausted` if the search hit its expansion or time limit first.
///
/// # Examples
/// ```
/// use birdsort_solver::engine::Move;
/// use birdsort_solver::solver::{solve, SolverConfig};
/// use birdsort_solver::utils::board_from_rows;
///
/// let board = board_from_rows(&["R", "R"], 2).unwrap();
/// let solution = solve(&board, &SolverConfig::default()).unwrap();
/// assert_eq!(solution.moves, vec![Move::new(0, 1)]);
/// assert!(solution.final_board.is_solved());
/// ```
pub fn solve(board: &Board, config: &SolverConfig) -> Result<Solution> {
    config.validate()?;
    log::debug!(
        "starting {} search with {} on {} branches (weight {}, limits {:?})",
        config.algorithm,
        config.heuristic,
        board.branch_count(),
        config.weight,
        config.limits
    );
    let evaluator = Evaluator::new(board, config.heuristic);
    let result = match config.algorithm {
        Algorithm::AStar => astar(board, config, &evaluator),
        Algorithm::IdaStar => ida_star(board, config, &evaluator),
    };
    match &result {
        Ok(solution) => log::debug!(
            "found {} move solution ({:?}); expanded {}, generated {}, {:?}",
            solution.moves.len(),
            solution.optimality,
            solution.stats.expanded,
            solution.stats.generated,
            solution.stats.elapsed
        ),
        Err(err) => log::debug!("search ended without a solution: {}", err),
    }
    result
}

enum Evaluator {
    Estimate,
    Pattern(DisjointPatternDatabase),
}

impl Evaluator {
    fn new(start: &Board, kind: HeuristicKind) -> Self {
        match kind {
            HeuristicKind::Estimate => Evaluator::Estimate,
            HeuristicKind::PatternDatabase => {
                match DisjointPatternDatabase::for_board(start, DEFAULT_PATTERN_STATES) {
                    Some(db) => Evaluator::Pattern(db),
                    None => {
                        log::debug!("pattern database needs a uniform inventory, using estimate");
                        Evaluator::Estimate
                    }
                }
            }
        }
    }

    fn estimate(&self, board: &Board) -> u32 {
        match self {
            Evaluator::Estimate => estimate(board),
            Evaluator::Pattern(db) => db.estimate(board),
        }
    }
}

struct Budget {
    limits: SearchLimits,
    started: Instant,
    expanded: usize,
}

impl Budget {
    fn new(limits: SearchLimits) -> Self {
        Budget {
            limits,
            started: Instant::now(),
            expanded: 0,
        }
    }

    /// Accounts for one expansion, or fails if the budget is spent.
    fn charge(&mut self) -> Result<()> {
        let over_count = self
            .limits
            .max_expansions
            .is_some_and(|max| self.expanded >= max);
        let over_time = self
            .limits
            .time_limit
            .is_some_and(|limit| self.started.elapsed() >= limit);
        if over_count || over_time {
            return Err(EngineError::SearchExhausted {
                expanded: self.expanded,
            });
        }
        self.expanded += 1;
        Ok(())
    }
}

fn optimality_for(board: &Board, admissible: bool) -> Optimality {
    // The estimate is only a proven lower bound on uniform inventories.
    if admissible && board.has_uniform_inventory() {
        Optimality::Optimal
    } else {
        Optimality::BestEffort
    }
}

struct Node {
    board: Board,
    parent: Option<usize>,
    via: Option<Move>,
    g: u32,
}

/// A frontier entry; the heap pops the lowest `f`, then the lowest `h`
/// (deepest), then the earliest inserted.
#[derive(PartialEq, Eq)]
struct Entry {
    f: u64,
    h: u32,
    seq: u64,
    node: usize,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn astar(start: &Board, config: &SolverConfig, evaluator: &Evaluator) -> Result<Solution> {
    let weight = config.weight_scaled();
    let weighted = weight > WEIGHT_SCALE;
    let priority = |board: &Board, g: u32, h: u32| {
        let penalty = if weighted {
            (mixed_branch_penalty(board) as u64).saturating_mul(weight - WEIGHT_SCALE)
        } else {
            0
        };
        (g as u64 * WEIGHT_SCALE)
            .saturating_add((h as u64).saturating_mul(weight))
            .saturating_add(penalty)
    };

    let mut budget = Budget::new(config.limits);
    let mut generated = 0;
    let mut nodes = vec![Node {
        board: start.clone(),
        parent: None,
        via: None,
        g: 0,
    }];
    let mut best_g: HashMap<Board, u32> = HashMap::new();
    best_g.insert(start.clone(), 0);

    let mut open = BinaryHeap::new();
    let h = evaluator.estimate(start);
    open.push(Entry {
        f: priority(start, 0, h),
        h,
        seq: 0,
        node: 0,
    });
    let mut seq = 1;

    while let Some(entry) = open.pop() {
        let node = &nodes[entry.node];
        if best_g.get(&node.board).is_some_and(|&best| node.g > best) {
            continue;
        }
        if node.board.is_solved_under(config.goal) {
            let stats = SearchStats {
                expanded: budget.expanded,
                generated,
                elapsed: budget.started.elapsed(),
            };
            let moves = reconstruct_path(&nodes, entry.node);
            return Ok(Solution {
                moves,
                final_board: node.board.clone(),
                optimality: optimality_for(start, !weighted),
                stats,
            });
        }
        budget.charge()?;

        let board = node.board.clone();
        let g = node.g + 1;
        for mv in board.legal_moves() {
            let next = board.apply(mv)?;
            if best_g.get(&next).is_some_and(|&best| best <= g) {
                continue;
            }
            best_g.insert(next.clone(), g);
            let h = evaluator.estimate(&next);
            let f = priority(&next, g, h);
            nodes.push(Node {
                board: next,
                parent: Some(entry.node),
                via: Some(mv),
                g,
            });
            open.push(Entry {
                f,
                h,
                seq,
                node: nodes.len() - 1,
            });
            seq += 1;
            generated += 1;
        }
    }

    Err(EngineError::Unsolvable)
}

fn reconstruct_path(nodes: &[Node], mut idx: usize) -> Vec<Move> {
    let mut moves = Vec::new();
    while let (Some(parent), Some(mv)) = (nodes[idx].parent, nodes[idx].via) {
        moves.push(mv);
        idx = parent;
    }
    moves.reverse();
    moves
}

enum Probe {
    Found,
    /// Smallest `f` that exceeded the bound, if any branch was cut.
    Exceeded(Option<u32>),
}

struct IdaSearch<'a> {
    goal: GoalRule,
    evaluator: &'a Evaluator,
    budget: Budget,
    path: Vec<Board>,
    on_path: HashSet<Board>,
    moves: Vec<Move>,
    generated: usize,
}

impl IdaSearch<'_> {
    fn probe(&mut self, g: u32, bound: u32) -> Result<Probe> {
        let Some(board) = self.path.last().cloned() else {
            return Ok(Probe::Exceeded(None));
        };
        let f = g + self.evaluator.estimate(&board);
        if f > bound {
            return Ok(Probe::Exceeded(Some(f)));
        }
        if board.is_solved_under(self.goal) {
            return Ok(Probe::Found);
        }
        self.budget.charge()?;

        let mut next_bound: Option<u32> = None;
        for mv in board.legal_moves() {
            let next = board.apply(mv)?;
            if self.on_path.contains(&next) {
                continue;
            }
            self.generated += 1;
            self.on_path.insert(next.clone());
            self.path.push(next);
            self.moves.push(mv);

            match self.probe(g + 1, bound)? {
                Probe::Found => return Ok(Probe::Found),
                Probe::Exceeded(Some(f)) => {
                    next_bound = Some(next_bound.map_or(f, |b| b.min(f)));
                }
                Probe::Exceeded(None) => {}
            }

            self.moves.pop();
            if let Some(done) = self.path.pop() {
                self.on_path.remove(&done);
            }
        }
        Ok(Probe::Exceeded(next_bound))
    }
}

fn ida_star(start: &Board, config: &SolverConfig, evaluator: &Evaluator) -> Result<Solution> {
    let mut search = IdaSearch {
        goal: config.goal,
        evaluator,
        budget: Budget::new(config.limits),
        path: vec![start.clone()],
        on_path: HashSet::from([start.clone()]),
        moves: Vec::new(),
        generated: 0,
    };

    let mut bound = evaluator.estimate(start);
    loop {
        log::trace!("IDA* iteration with bound {}", bound);
        match search.probe(0, bound)? {
            Probe::Found => {
                let final_board = search.path.last().cloned().unwrap_or_else(|| start.clone());
                return Ok(Solution {
                    moves: search.moves,
                    final_board,
                    optimality: optimality_for(start, true),
                    stats: SearchStats {
                        expanded: search.budget.expanded,
                        generated: search.generated,
                        elapsed: search.budget.started.elapsed(),
                    },
                });
            }
            Probe::Exceeded(Some(next)) => bound = next,
            Probe::Exceeded(None) => return Err(EngineError::Unsolvable),
        }
    }
}
