//! On-the-wire representation of a [`CorridorsState`], for clients that
//! serialize positions (save files, network peers, language bindings).
//!
//! Unlike the teacher's `parse_state_string`, which panics on malformed
//! input, `TryFrom<CorridorsWire>` validates every invariant the in-memory
//! type relies on — including the path invariant enforced continuously by
//! [`super::state::CorridorsState`]'s own wall-placement logic — and
//! reports violations as [`CorridorsError::InvalidInput`].

use crate::error::CorridorsError;

use super::board_graph::{both_players_have_a_path, build_graph};
use super::coords::Coord;
use super::state::CorridorsState;

/// A flat, serialization-friendly snapshot of a Corridors position. Field
/// shapes match [`CorridorsState`]'s internal bitmaps exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorridorsWire {
    pub size: usize,
    pub flip: bool,
    pub hero_pos: Coord,
    pub villain_pos: Coord,
    pub hero_walls_remaining: usize,
    pub villain_walls_remaining: usize,
    /// `(size - 1) x size`, row-major.
    pub horizontal_walls: Vec<bool>,
    /// `size x (size - 1)`, row-major.
    pub vertical_walls: Vec<bool>,
    /// `(size - 1) x (size - 1)`, row-major.
    pub wall_middles: Vec<bool>,
}

impl From<&CorridorsState> for CorridorsWire {
    fn from(state: &CorridorsState) -> Self {
        CorridorsWire {
            size: state.size(),
            flip: state.flip(),
            hero_pos: state.hero_pos(),
            villain_pos: state.villain_pos(),
            hero_walls_remaining: state.hero_walls_remaining(),
            villain_walls_remaining: state.villain_walls_remaining(),
            horizontal_walls: state.horizontal_walls().to_vec(),
            vertical_walls: state.vertical_walls().to_vec(),
            wall_middles: state.wall_middles().to_vec(),
        }
    }
}

impl TryFrom<CorridorsWire> for CorridorsState {
    type Error = CorridorsError;

    fn try_from(wire: CorridorsWire) -> Result<Self, Self::Error> {
        let size = wire.size;
        if size < 3 || size % 2 == 0 {
            return invalid("size", format!("board size must be odd and >= 3, got {}", size));
        }
        if !in_bounds(wire.hero_pos, size) || !in_bounds(wire.villain_pos, size) {
            return invalid("hero_pos/villain_pos", "pawn position out of bounds".to_string());
        }
        if wire.hero_pos == wire.villain_pos {
            return invalid("hero_pos/villain_pos", "pawns cannot occupy the same cell".to_string());
        }
        if wire.horizontal_walls.len() != (size - 1) * size {
            return invalid(
                "horizontal_walls",
                format!("expected {} entries, got {}", (size - 1) * size, wire.horizontal_walls.len()),
            );
        }
        if wire.vertical_walls.len() != size * (size - 1) {
            return invalid(
                "vertical_walls",
                format!("expected {} entries, got {}", size * (size - 1), wire.vertical_walls.len()),
            );
        }
        if wire.wall_middles.len() != (size - 1) * (size - 1) {
            return invalid(
                "wall_middles",
                format!("expected {} entries, got {}", (size - 1) * (size - 1), wire.wall_middles.len()),
            );
        }
        for r in 0..size - 1 {
            for c in 0..size - 1 {
                let occupied_h = wire.horizontal_walls[r * size + c] && wire.horizontal_walls[r * size + c + 1];
                let occupied_v =
                    wire.vertical_walls[r * (size - 1) + c] && wire.vertical_walls[(r + 1) * (size - 1) + c];
                let marked = wire.wall_middles[r * (size - 1) + c];
                if (occupied_h || occupied_v) != marked {
                    return invalid(
                        "wall_middles",
                        format!("slot ({}, {}) occupancy disagrees with the edge bitmaps", r, c),
                    );
                }
            }
        }

        let (graph, idx) = build_graph(size, &wire.horizontal_walls, &wire.vertical_walls);
        if !both_players_have_a_path(&graph, &idx, size, wire.hero_pos, 0, wire.villain_pos, size - 1) {
            return invalid("horizontal_walls/vertical_walls", "a player has no path to their goal row".to_string());
        }

        Ok(CorridorsState::from_raw_parts(
            size,
            wire.hero_pos,
            wire.villain_pos,
            wire.hero_walls_remaining,
            wire.villain_walls_remaining,
            wire.horizontal_walls,
            wire.vertical_walls,
            wire.wall_middles,
            wire.flip,
        ))
    }
}

fn in_bounds(coord: Coord, size: usize) -> bool {
    coord.0 < size && coord.1 < size
}

fn invalid<T>(field: &'static str, detail: String) -> Result<T, CorridorsError> {
    Err(CorridorsError::InvalidInput { field, detail })
}
