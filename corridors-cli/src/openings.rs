//! Named opening move sequences for seeding a starting position, adapted
//! from the teacher's `quoridor-core/src/openings.rs`.
//!
//! The teacher keyed its table by `Player` because each `Strategy` object
//! played a fixed physical side for a whole match. That concept is gone:
//! the engine always plays from the position currently at its root, so
//! this table instead returns the two alternating move lists in canonical
//! (`flip = false`) notation, applied move-by-move by whichever side is to
//! act — first mover, then second mover, repeating until one list runs
//! out.

/// Returns `(first_mover_moves, second_mover_moves)` in canonical
/// notation for `name`, or two empty lists for an unrecognized or "No
/// Opening" name.
pub fn opening_moves(name: &str) -> (Vec<&'static str>, Vec<&'static str>) {
    match name {
        "standard" => (vec!["e2", "e3", "e4", "e3v"], vec!["e8", "e7", "e6", "e6v"]),
        "shiller" => (vec!["e2", "e3", "e4", "c3v"], vec!["e8", "e7", "e6"]),
        "sidewall" => (vec!["c3h", "f3h"], vec!["c6h", "f6h"]),
        "stonewall" => (vec!["e2", "e3", "d2h"], vec!["e8", "e7", "e7h"]),
        "ala" => (vec!["e2", "e3", "e4", "d5h", "f5h", "c4v", "g4v"], vec!["e8", "e7", "e6"]),
        "gap" => (vec!["e2", "e3", "e4"], vec!["e8", "e7", "e6"]),
        _ => (Vec::new(), Vec::new()),
    }
}

/// The names recognized by [`opening_moves`] (excluding the no-op default).
pub const OPENING_NAMES: &[&str] = &["standard", "shiller", "sidewall", "stonewall", "ala", "gap"];
