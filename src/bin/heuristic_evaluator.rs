use birdsort_solver::config::EngineConfig;
use birdsort_solver::engine::Board;
use birdsort_solver::error::EngineError;
use birdsort_solver::generator::generate_level;
use birdsort_solver::heuristics::{estimate, greedy_playout};
use birdsort_solver::solver::{solve, Algorithm, HeuristicKind, SearchLimits, SolverConfig};
use clap::Parser;
use std::collections::BTreeMap;

const GREEDY_MOVE_LIMIT: usize = 200;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Compare search strategies across seeded levels", long_about = None)]
struct Args {
    /// Number of levels to evaluate
    #[clap(short = 'n', long, default_value_t = 20)]
    levels: u64,

    /// First seed; levels use consecutive seeds
    #[clap(short, long, default_value_t = 0)]
    start_seed: u64,

    /// Number of branches
    #[clap(long, default_value_t = 7)]
    branches: usize,

    /// Number of colors
    #[clap(long, default_value_t = 5)]
    colors: usize,

    /// Expansion cap for every search
    #[clap(short, long, default_value_t = 200_000)]
    max_states: usize,
}

#[derive(Default)]
struct Tally {
    solved: usize,
    exhausted: usize,
    failed: usize,
    total_moves: usize,
    total_expanded: usize,
}

enum Strategy {
    Search(SolverConfig),
    Greedy,
}

/// Returns `(moves, expanded)` for a solved level.
fn run_strategy(strategy: &Strategy, board: &Board) -> Result<(usize, usize), EngineError> {
    match strategy {
        Strategy::Search(config) => {
            solve(board, config).map(|s| (s.moves.len(), s.stats.expanded))
        }
        Strategy::Greedy => {
            let playout = greedy_playout(board, GREEDY_MOVE_LIMIT);
            if playout.solved {
                Ok((playout.moves.len(), playout.moves.len()))
            } else {
                Err(EngineError::SearchExhausted {
                    expanded: playout.moves.len(),
                })
            }
        }
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = EngineConfig {
        branches: args.branches,
        colors: args.colors,
        ..EngineConfig::default()
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let limits = SearchLimits::expansions(args.max_states);
    let search = |algorithm: Algorithm, weight: f64, heuristic: HeuristicKind| {
        Strategy::Search(SolverConfig {
            limits,
            weight,
            algorithm,
            heuristic,
            ..SolverConfig::default()
        })
    };
    let strategies: Vec<(&str, Strategy)> = vec![
        ("A*", search(Algorithm::AStar, 1.0, HeuristicKind::Estimate)),
        ("A*+PDB", search(Algorithm::AStar, 1.0, HeuristicKind::PatternDatabase)),
        ("WA*(1.5)", search(Algorithm::AStar, 1.5, HeuristicKind::Estimate)),
        ("WA*(3.0)", search(Algorithm::AStar, 3.0, HeuristicKind::Estimate)),
        ("IDA*", search(Algorithm::IdaStar, 1.0, HeuristicKind::Estimate)),
        ("Greedy", Strategy::Greedy),
    ];

    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();

    println!("Starting strategy evaluation for {} levels...", args.levels);

    for seed in args.start_seed..args.start_seed + args.levels {
        let board = match generate_level(&config, seed) {
            Ok(board) => board,
            Err(e) => {
                eprintln!("Warning: could not generate level for seed {}: {}", seed, e);
                continue;
            }
        };

        println!("\nEvaluating level with seed {} (estimate {})", seed, estimate(&board));

        for (name, strategy) in &strategies {
            let tally = tallies.entry(*name).or_default();
            match run_strategy(strategy, &board) {
                Ok((moves, expanded)) => {
                    println!("  Strategy: {:<10}, Moves: {:<4}, Expanded: {}", name, moves, expanded);
                    tally.solved += 1;
                    tally.total_moves += moves;
                    tally.total_expanded += expanded;
                }
                Err(EngineError::SearchExhausted { expanded }) => {
                    println!("  Strategy: {:<10}, gave up after {}", name, expanded);
                    tally.exhausted += 1;
                }
                Err(e) => {
                    println!("  Strategy: {:<10}, failed: {}", name, e);
                    tally.failed += 1;
                }
            }
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!(
        "Strategies evaluated: {}",
        strategies.iter().map(|(name, _)| *name).collect::<Vec<&str>>().join(", ")
    );
    println!("\n--- Averages over solved levels ---");

    for (name, _) in &strategies {
        let Some(tally) = tallies.get(name) else {
            continue;
        };
        if tally.solved == 0 {
            println!(
                "Strategy {:<10}: no levels solved ({} exhausted, {} failed)",
                name, tally.exhausted, tally.failed
            );
            continue;
        }
        let solved = tally.solved as f64;
        println!(
            "Strategy {:<10}: solved {:>3}, exhausted {:>3}, avg moves {:>6.2}, avg expanded {:>10.1}",
            name,
            tally.solved,
            tally.exhausted,
            tally.total_moves as f64 / solved,
            tally.total_expanded as f64 / solved
        );
    }
}
