//! Algebraic notation helpers, adapted from the teacher's `utils.rs`.
//!
//! Unlike the teacher (which panics on malformed input), conversions here
//! return `Result` so the engine can reject bad move text from a client
//! with `IllegalOperation`/`InvalidInput` instead of aborting the process.

use crate::error::CorridorsError;

/// (row, col), (0, 0) is the top-left corner. Row 0 is always hero's goal
/// row in the engine's internal (hero-to-move) representation.
pub type Coord = (usize, usize);

/// Converts algebraic notation (e.g. `"e1"`, `"a9"`, or with a trailing
/// wall-orientation character such as `"e9h"`) to a `(row, col)` coordinate
/// for a board of the given size.
pub fn algebraic_to_coord(square: &str, size: usize) -> Result<Coord, CorridorsError> {
    let pos_str = if square.len() > 2 && (square.ends_with('h') || square.ends_with('v')) {
        &square[0..square.len() - 1]
    } else {
        square
    };

    if pos_str.len() < 2 {
        return Err(bad_notation(square));
    }

    let bytes = pos_str.as_bytes();
    let col_char = (bytes[0] as char).to_ascii_lowercase();
    if !col_char.is_ascii_lowercase() {
        return Err(bad_notation(square));
    }
    let col = (col_char as u8 - b'a') as usize;

    let row_num: usize = pos_str[1..].parse().map_err(|_| bad_notation(square))?;
    if row_num == 0 || row_num > size || col >= size {
        return Err(bad_notation(square));
    }
    let row = size - row_num;
    Ok((row, col))
}

/// Converts a `(row, col)` coordinate to algebraic notation for a board of
/// the given size.
pub fn coord_to_algebraic(coord: Coord, size: usize) -> Result<String, CorridorsError> {
    let (row, col) = coord;
    if row >= size || col >= size {
        return Err(CorridorsError::InvalidInput {
            field: "coord",
            detail: format!("coordinate {:?} out of bounds for size {}", coord, size),
        });
    }
    let col_char = (b'a' + col as u8) as char;
    let row_num = size - row;
    Ok(format!("{}{}", col_char, row_num))
}

fn bad_notation(square: &str) -> CorridorsError {
    CorridorsError::InvalidInput {
        field: "action_text",
        detail: format!("malformed algebraic notation: '{}'", square),
    }
}

/// Mirrors a coordinate vertically (`row -> size - 1 - row`), used to
/// translate between hero-perspective and canonical board orientation.
pub fn mirror_row(coord: Coord, size: usize) -> Coord {
    (size - 1 - coord.0, coord.1)
}
