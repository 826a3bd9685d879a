//! # Bird Sort Solver Library
//!
//! This library provides the puzzle engine for Bird Sort: colored tokens sit
//! on capacity-limited branches and must be rearranged, by moving same-colored
//! top runs between branches, until every branch is empty or holds a full set
//! of one color.
//!
//! It is used by three binaries:
//! - `human_player`: interactive play on the command line, with hints and undo.
//! - `ai_solver`: solves a board file or a seeded random level and prints the moves.
//! - `heuristic_evaluator`: compares search strategies across seeded levels.
//!
//! ## Modules
//! - `engine`: board representation (`Board`, `Color`), the move model
//!   (`Move`, `legal_moves`, `apply`) and a play session (`Game`).
//! - `heuristics`: cost-to-solve estimates and one-ply move ranking.
//! - `pattern_db`: disjoint pattern databases, an alternative search heuristic.
//! - `solver`: A*, weighted A* and IDA* search with exploration limits.
//! - `hint`: next-move suggestions on top of the solver.
//! - `generator`: seeded, solvable level generation.
//! - `config`: TOML-loadable engine configuration.
//! - `error`: error types shared by all of the above.
//! - `utils`: the text board format.

pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod heuristics;
pub mod hint;
pub mod pattern_db;
pub mod solver;
pub mod utils;

pub use engine::{Board, Color, Move};
pub use error::{EngineError, IllegalMove, Result};
pub use hint::{hint, Hint, HintConfig};
pub use solver::{solve, Solution, SolverConfig};
