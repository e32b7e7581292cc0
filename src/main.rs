mod tui;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fifteen::{solve, CancelToken, HeuristicKind, Puzzle, Solution, SolveError};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    board: BoardArgs,
    /// Heuristic guiding the search
    #[arg(short = 'H', long, value_enum, default_value_t = HeuristicArg::LinearConflict)]
    heuristic: HeuristicArg,
    /// Abort the search after this many seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum HeuristicArg {
    Manhattan,
    MisplacedTiles,
    LinearConflict,
}

impl From<HeuristicArg> for HeuristicKind {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::Manhattan => HeuristicKind::Manhattan,
            HeuristicArg::MisplacedTiles => HeuristicKind::MisplacedTiles,
            HeuristicArg::LinearConflict => HeuristicKind::LinearConflict,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play and solve interactively in the terminal
    Play,
}

#[derive(Args)]
struct BoardArgs {
    /// Number of tiles (3, 8, 15, 24, ...)
    #[arg(short, long, default_value_t = 15, value_name = "NUM")]
    size: usize,
    /// Seed for the shuffle, random when omitted
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Explicit row-major tiles, 0 for the blank (e.g. 1,2,3,4,5,6,0,7,8)
    #[arg(long, value_delimiter = ',', value_name = "TILES")]
    tiles: Option<Vec<u32>>,
}

impl BoardArgs {
    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn build(&self, rng: &mut StdRng) -> Result<Puzzle> {
        match &self.tiles {
            Some(tiles) => {
                let dimension = (tiles.len() as f64).sqrt().round() as usize;
                if dimension * dimension != tiles.len() {
                    bail!("{} tiles do not fill a square board", tiles.len());
                }
                Puzzle::from_tiles(dimension, tiles.clone()).context("Failed to parse tiles")
            }
            None => Puzzle::new(self.size, rng).context("Failed to create puzzle"),
        }
    }
}

type SolveHandle = JoinHandle<Result<Solution, SolveError>>;

/// Runs `solve` on a background thread. The returned token is the only writer
/// of the cancellation flag.
fn spawn_solver(puzzle: Puzzle, heuristic: HeuristicKind) -> (SolveHandle, CancelToken) {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let worker = thread::spawn(move || solve(&puzzle, &heuristic, &token));
    (worker, cancel)
}

fn run_once(puzzle: Puzzle, heuristic: HeuristicKind, timeout: Option<u64>) -> Result<()> {
    println!("Puzzle:\n{}", puzzle);
    if puzzle.is_solved() {
        println!("Puzzle already solved");
        return Ok(());
    }

    info!("solving {}-puzzle with {}", puzzle.size(), heuristic);
    let started = Instant::now();
    let (worker, cancel) = spawn_solver(puzzle.clone(), heuristic);

    if let Some(secs) = timeout {
        let deadline = started + Duration::from_secs(secs);
        while !worker.is_finished() {
            if Instant::now() >= deadline {
                cancel.cancel();
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }

    let result = worker
        .join()
        .map_err(|_| anyhow!("Solver thread panicked"))?;
    let elapsed = started.elapsed();

    let solution = match result {
        Ok(solution) => solution,
        Err(SolveError::Cancelled) => {
            println!("Gave up after {:.2?}", elapsed);
            return Ok(());
        }
        Err(err) => return Err(err).context("Failed to solve puzzle"),
    };

    println!(
        "Found optimal solution with {} moves in {:.2?}",
        solution.move_count(),
        elapsed
    );

    for (movement, state) in solution.moves().iter().zip(&solution.states()[1..]) {
        println!("{}\n{}", movement, state);
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they stay out of the board output
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let interactive = matches!(cli.command, Some(Commands::Play));
    if !interactive || cli.verbose {
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }

    let mut rng = cli.board.rng();
    let puzzle = cli.board.build(&mut rng)?;

    let heuristic = HeuristicKind::from(cli.heuristic);
    match cli.command {
        Some(Commands::Play) => tui::run(puzzle, heuristic, rng),
        None => run_once(puzzle, heuristic, cli.timeout),
    }
}
