//! The Corridors (Quoridor-family) game: the L0 instantiation of
//! [`crate::game_state::GameState`] that the teacher's `Quoridor` struct
//! played the equivalent role for.

mod board_graph;
mod coords;
mod state;
mod wire;

pub use coords::{algebraic_to_coord, coord_to_algebraic};
pub use state::CorridorsState;
pub use wire::CorridorsWire;
