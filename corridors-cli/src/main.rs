//! Interactive and self-play driver for the Corridors MCTS engine.
//!
//! Replaces the teacher's `quoridor-cli` (a parallel tournament runner
//! pitting a dozen hand-written `Strategy` implementations against each
//! other and writing win-rate CSVs) with a client of the new engine's
//! public contract (spec.md §6): a human or a second engine instance plays
//! against a [`corridors_core::mcts::ThreadedEngine`] over stdin, or two
//! engine instances self-play to a decided result. `clap` replaces the
//! teacher's hand-rolled `std::env::var("QUORIDOR_DEBUG")` check, and
//! `tracing-subscriber` replaces its bare `println!`/`eprintln!` calls.

mod openings;

use std::io::{self, BufRead, Write};

use clap::{Args, Parser, Subcommand};
use tracing::info;

use corridors_core::corridors::CorridorsState;
use corridors_core::mcts::ThreadedEngine;
use corridors_core::{EngineConfig, GameState};

#[derive(Parser)]
#[command(name = "corridors-cli", about = "Play against, or watch, the Corridors MCTS engine")]
struct Cli {
    #[command(flatten)]
    verbosity: Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Verbosity {
    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Play a match against the engine over stdin.
    Play {
        #[command(flatten)]
        board: BoardArgs,
        #[command(flatten)]
        engine: EngineArgs,
        /// Let the engine move first instead of the human.
        #[arg(long)]
        engine_first: bool,
    },
    /// Watch the engine play both sides until the game ends.
    SelfPlay {
        #[command(flatten)]
        board: BoardArgs,
        #[command(flatten)]
        engine: EngineArgs,
        /// Safety cap on the number of plies before declaring a draw.
        #[arg(long, default_value_t = 300)]
        max_plies: usize,
    },
}

#[derive(Args, Clone)]
struct BoardArgs {
    /// Board size (odd, >= 3).
    #[arg(long, default_value_t = 9)]
    size: usize,
    /// Walls available to each side.
    #[arg(long, default_value_t = 10)]
    walls: usize,
    /// Named opening to seed the position with before play begins.
    #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(openings::OPENING_NAMES.iter().copied()))]
    opening: Option<String>,
}

#[derive(Args, Clone)]
struct EngineArgs {
    /// Exploration constant `c` in the UCT/PUCT selection formula.
    #[arg(long, default_value_t = std::f64::consts::FRAC_1_SQRT_2)]
    c: f64,
    /// RNG seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Minimum simulations before acting on the root.
    #[arg(long, default_value_t = 500)]
    min_simulations: usize,
    /// Maximum simulations the worker will accumulate at a root.
    #[arg(long, default_value_t = 20_000)]
    max_simulations: usize,
    /// Simulations per worker batch between mutex releases.
    #[arg(long, default_value_t = 200)]
    sim_increment: usize,
    /// Use the bespoke shortest-path-margin evaluator instead of rollouts.
    #[arg(long)]
    no_rollout: bool,
    /// Depth-1 preview-evaluate every child on first visit.
    #[arg(long)]
    eval_children: bool,
    /// Use PUCT instead of UCT for selection.
    #[arg(long)]
    puct: bool,
    /// Multiply the exploration bonus by the evaluator's priors (requires `--no-rollout`).
    #[arg(long)]
    use_probs: bool,
    /// Rank children by mean equity instead of visit count at move time.
    #[arg(long)]
    by_equity: bool,
    /// Probability of a uniformly-random move instead of the top-ranked one.
    #[arg(long, default_value_t = 0.0)]
    epsilon: f64,
}

impl EngineArgs {
    fn into_config(self) -> EngineConfig {
        EngineConfig {
            c: self.c,
            seed: self.seed,
            min_simulations: self.min_simulations,
            max_simulations: self.max_simulations,
            sim_increment: self.sim_increment,
            use_rollout: !self.no_rollout,
            eval_children: self.eval_children,
            use_puct: self.puct,
            use_probs: self.use_probs,
            decide_using_visits: !self.by_equity,
            epsilon: self.epsilon,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbosity.verbose);

    let result = match cli.command {
        Command::Play { board, engine, engine_first } => run_play(board, engine, engine_first),
        Command::SelfPlay { board, engine, max_plies } => run_self_play(board, engine, max_plies),
    };

    if let Err(err) = result {
        eprintln!("corridors-cli: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
}

fn build_state(board: &BoardArgs) -> Result<CorridorsState, corridors_core::CorridorsError> {
    let mut state = CorridorsState::new(board.size, board.walls)?;
    if let Some(name) = &board.opening {
        let (first, second) = openings::opening_moves(name);
        for text in first.iter().interleave(second.iter()) {
            state = state.apply_action_text(text, false)?;
        }
    }
    Ok(state)
}

/// Tiny local zip-shortest helper so `build_state` doesn't need an extra
/// crate dependency for interleaving two move lists of possibly different
/// lengths.
trait InterleaveExt<'a, T> {
    fn interleave(self, other: std::slice::Iter<'a, T>) -> Interleaved<'a, T>;
}

impl<'a, T> InterleaveExt<'a, T> for std::slice::Iter<'a, T> {
    fn interleave(self, other: std::slice::Iter<'a, T>) -> Interleaved<'a, T> {
        Interleaved { a: self, b: other, take_a: true }
    }
}

struct Interleaved<'a, T> {
    a: std::slice::Iter<'a, T>,
    b: std::slice::Iter<'a, T>,
    take_a: bool,
}

impl<'a, T> Iterator for Interleaved<'a, T> {
    type Item = &'a T;
    fn next(&mut self) -> Option<&'a T> {
        let item = if self.take_a { self.a.next().or_else(|| self.b.next()) } else { self.b.next().or_else(|| self.a.next()) };
        self.take_a = !self.take_a;
        item
    }
}

fn run_play(board: BoardArgs, engine: EngineArgs, engine_first: bool) -> Result<(), corridors_core::CorridorsError> {
    let state = build_state(&board)?;
    let handle = ThreadedEngine::construct(engine.into_config(), state)?;
    info!("engine constructed, board {}x{}", board.size, board.size);

    let stdin = io::stdin();
    let mut human_to_move = !engine_first;

    loop {
        println!("{}", handle.display(true)?);
        if handle.is_terminal()? {
            break;
        }

        if human_to_move {
            print!("your move: ");
            io::stdout().flush().ok();
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
                println!("end of input, stopping");
                return Ok(());
            }
            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            match handle.make_move(text, true) {
                Ok(()) => {}
                Err(err) => {
                    println!("illegal move: {err}");
                    continue;
                }
            }
        } else {
            let text = handle.make_best_move(true)?;
            println!("engine plays {text}");
        }
        human_to_move = !human_to_move;
    }

    print_result(&handle)?;
    handle.shutdown()
}

fn run_self_play(board: BoardArgs, engine: EngineArgs, max_plies: usize) -> Result<(), corridors_core::CorridorsError> {
    let state = build_state(&board)?;
    let handle = ThreadedEngine::construct(engine.into_config(), state)?;

    for ply in 0..max_plies {
        if handle.is_terminal()? {
            break;
        }
        let text = handle.make_best_move(true)?;
        info!(ply, move_text = %text, "engine move");
    }

    println!("{}", handle.display(true)?);
    print_result(&handle)?;
    handle.shutdown()
}

fn print_result(handle: &ThreadedEngine<CorridorsState>) -> Result<(), corridors_core::CorridorsError> {
    if handle.is_terminal()? {
        match handle.get_evaluation()? {
            Some(v) if v > 0.0 => println!("the side to move at the final position won"),
            Some(v) if v < 0.0 => println!("the side to move at the final position lost; its opponent won"),
            _ => println!("game ended in a draw"),
        }
    } else {
        println!("game stopped before a decided result (ply cap reached)");
    }
    Ok(())
}
