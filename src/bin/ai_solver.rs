use birdsort_solver::config::EngineConfig;
use birdsort_solver::engine::{Board, BRANCH_CAPACITY};
use birdsort_solver::generator::generate_level;
use birdsort_solver::solver::{solve, Algorithm, HeuristicKind};
use birdsort_solver::utils::{board_to_rows, read_board_file};
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the board file (one branch per line, bottom first, '-' for empty)
    board_file: Option<PathBuf>,

    /// Generate a level from this seed instead of reading a board file
    #[clap(short, long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Branch capacity used when reading a board file
    #[clap(long, default_value_t = BRANCH_CAPACITY)]
    capacity: usize,

    /// Number of branches for generated levels
    #[clap(long)]
    branches: Option<usize>,

    /// Number of colors for generated levels
    #[clap(long)]
    colors: Option<usize>,

    /// Maximum number of states to expand
    #[clap(short, long)]
    max_states: Option<usize>,

    /// Wall-clock limit for the search, in milliseconds
    #[clap(short, long)]
    time_limit_ms: Option<u64>,

    /// Heuristic weight (1.0 = optimal A*)
    #[clap(short, long)]
    weight: Option<f64>,

    /// Search algorithm: astar or ida_star
    #[clap(short, long)]
    algorithm: Option<Algorithm>,

    /// Search heuristic: estimate or pattern_database
    #[clap(long)]
    heuristic: Option<HeuristicKind>,
}

fn load_config(args: &Args) -> Result<EngineConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(branches) = args.branches {
        config.branches = branches;
    }
    if let Some(colors) = args.colors {
        config.colors = colors;
    }
    if let Some(max) = args.max_states {
        config.solver.max_expansions = Some(max);
    }
    if let Some(ms) = args.time_limit_ms {
        config.solver.time_limit_ms = Some(ms);
    }
    if let Some(weight) = args.weight {
        config.solver.weight = weight;
    }
    if let Some(algorithm) = args.algorithm {
        config.solver.algorithm = algorithm;
    }
    if let Some(heuristic) = args.heuristic {
        config.solver.heuristic = heuristic;
    }
    config.validate()?;
    Ok(config)
}

fn load_board(args: &Args, config: &EngineConfig) -> Result<Board, Box<dyn Error>> {
    match (&args.board_file, args.seed) {
        (Some(path), _) => {
            let board = read_board_file(path, args.capacity)?;
            println!("Loaded board from {}\n", path.display());
            Ok(board)
        }
        (None, Some(seed)) => {
            let board = generate_level(config, seed)?;
            println!(
                "Generated level with {} branches and {} colors (seed {})\n",
                config.branches, config.colors, seed
            );
            Ok(board)
        }
        (None, None) => Err("provide a board file or --seed".into()),
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;
    let board = load_board(&args, &config)?;
    let solver_config = config.solver_config();

    println!("Initial board state:\n{}\n", board);
    if !board.has_uniform_inventory() {
        println!("Warning: not every color appears exactly {} times.\n", board.capacity());
    }
    println!(
        "Searching with {} and {} (weight {}, limits {:?})...\n",
        solver_config.algorithm, solver_config.heuristic, solver_config.weight, solver_config.limits
    );

    let solution = solve(&board, &solver_config)?;
    println!("Solution found ({:?}):\n", solution.optimality);
    println!("Moves ({}):", solution.moves.len());
    if solution.moves.is_empty() {
        println!("  No moves needed.");
    } else {
        let mut current = board;
        for (i, mv) in solution.moves.iter().enumerate() {
            let (next, moved) = current.apply_counted(*mv)?;
            println!("  Move {}: {} ({} token{})", i + 1, mv, moved, if moved == 1 { "" } else { "s" });
            current = next;
        }
    }
    println!(
        "\nExpanded {} states, generated {}, in {:.3}s",
        solution.stats.expanded,
        solution.stats.generated,
        solution.stats.elapsed.as_secs_f64()
    );
    println!("Final board state:\n{}", solution.final_board);
    println!("\nFinal board rows:\n{}", board_to_rows(&solution.final_board).join("\n"));
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
