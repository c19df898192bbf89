//! A generic Monte Carlo Tree Search engine with a concrete instantiation
//! for Corridors, a Quoridor-family pawn-and-wall board game.
//!
//! The crate is layered leaves-first, mirroring the teacher's
//! `quoridor-core` split between board logic and strategy:
//!
//! - [`game_state`]: the capability surface ([`game_state::GameState`]) any
//!   two-player, perfect-information, deterministic game must provide for
//!   the search to operate on it.
//! - [`corridors`]: the concrete Corridors instantiation of that surface.
//! - [`mcts`]: the search tree ([`mcts::Node`]), the single-threaded driver
//!   ([`mcts::SearchController`]), and the supervised worker-thread wrapper
//!   ([`mcts::ThreadedEngine`]) clients actually hold.
//! - [`config`] / [`error`]: the engine's tunables and failure channel.

pub mod config;
pub mod corridors;
pub mod error;
pub mod game_state;
pub mod mcts;

pub use config::EngineConfig;
pub use error::{CorridorsError, Result};
pub use game_state::GameState;
