use birdsort_solver::config::EngineConfig;
use birdsort_solver::engine::{Game, Move, BRANCH_CAPACITY};
use birdsort_solver::generator::generate_level;
use birdsort_solver::hint::{hint, top_moves};
use birdsort_solver::utils::read_board_file;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Play Bird Sort in the terminal", long_about = None)]
struct Args {
    /// Board file to play instead of a generated level
    board_file: Option<PathBuf>,

    /// Seed for the generated level (random if omitted)
    #[clap(short, long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let board = match &args.board_file {
        Some(path) => read_board_file(path, BRANCH_CAPACITY).map_err(|e| e.to_string()),
        None => {
            let seed = args.seed.unwrap_or_else(rand::random);
            println!("Level seed: {}", seed);
            generate_level(&config, seed).map_err(|e| e.to_string())
        }
    }
    .unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });

    let hint_config = config.hint_config();
    let mut game = Game::new_with_board(board);
    println!("Welcome to Bird Sort!");

    loop {
        println!("---------------------");
        println!("Steps: {}", game.steps());
        println!("{}", game.board());

        if game.is_solved() {
            println!();
            println!("---------------------");
            println!("Solved in {} steps!", game.steps());
            println!("---------------------");
            break;
        }

        print!("Enter your move (from to), 'h' for a hint, 'u' to undo, 'q' to quit: ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => {
                println!("Error reading input. Please try again.");
                continue;
            }
        }

        let trimmed_input = input.trim();

        if trimmed_input == "q" {
            println!("Thanks for playing!");
            break;
        }

        if trimmed_input == "u" {
            if game.undo_last_move() {
                println!("Move undone.");
            } else {
                println!("Cannot undo further (already at initial state).");
            }
            continue;
        }

        if trimmed_input == "h" {
            match hint(game.board(), &hint_config) {
                Ok(h) => {
                    let remaining = h
                        .moves_to_solve
                        .map(|n| format!(", {} moves to go", n))
                        .unwrap_or_default();
                    println!("Hint: {} [{}{}]", h.mv, h.source, remaining);
                }
                Err(e) => println!("No hint available: {}", e),
            }
            let candidates: Vec<String> = top_moves(game.board(), 3)
                .iter()
                .map(|(mv, score)| format!("{} (est. {})", mv, score))
                .collect();
            if !candidates.is_empty() {
                println!("Candidates: {}", candidates.join(", "));
            }
            continue;
        }

        let parts: Vec<&str> = trimmed_input.split_whitespace().collect();
        if parts.len() == 2 {
            if let (Ok(from), Ok(to)) = (parts[0].parse::<usize>(), parts[1].parse::<usize>()) {
                match game.process_move(Move::new(from, to)) {
                    Ok(moved) => println!("Moved {} bird{}.", moved, if moved == 1 { "" } else { "s" }),
                    Err(e) => println!("Invalid move: {}", e),
                }
            } else {
                println!("Invalid input: Please enter branch numbers (e.g., '3 4'), 'h', 'u', or 'q'.");
            }
        } else {
            println!("Invalid input format. Use 'from to', 'h', 'u', or 'q'.");
        }
    }
}
