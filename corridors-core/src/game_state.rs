//! The capability surface the MCTS engine requires from any game.
//!
//! Generalizes the teacher's `Quoridor` + free-standing `Strategy` trait
//! (`quoridor-core/src/strategy/mod.rs`) into a single game-agnostic
//! contract: anything implementing `GameState` can be dropped into
//! [`crate::mcts::SearchController`] without the engine knowing its rules.

use crate::error::CorridorsError;

/// A game position, always viewed from the side about to move ("hero");
/// the other side is "villain".
///
/// Implementations are expected to be cheap to clone (the engine clones
/// states during rollouts) and to compare equal exactly when they
/// represent the same position from the same side-to-move perspective.
pub trait GameState: Clone + PartialEq + Send + std::fmt::Debug {
    /// Pushes one clone of `self` per legal successor position into `sink`.
    /// Terminal states push nothing.
    fn legal_moves(&self, sink: &mut dyn FnMut(Self));

    /// True when the game has ended at this position.
    fn is_terminal(&self) -> bool;

    /// The value of a terminal position from hero's perspective, in
    /// `{-1, 0, 1}` (`+1` = hero wins). Only meaningful when
    /// [`GameState::is_terminal`] is true.
    fn terminal_value(&self) -> f64;

    /// A domain-specific heuristic that can decide a non-terminal position
    /// without further search, e.g. an unobstructed shorter path to the
    /// goal. Returns `Some(v)` with `v` in `[-1, 1]` when it applies.
    /// Implementations that have no such heuristic simply return `None`.
    fn check_non_terminal_eval(&self) -> Option<f64> {
        None
    }

    /// A tie-breaking rank (higher = better for villain) used to choose
    /// deterministically among heuristically-decided children and avoid
    /// selection cycles. Only consulted when
    /// [`GameState::check_non_terminal_eval`] returns `Some`.
    fn non_terminal_rank(&self) -> i64 {
        0
    }

    /// A bespoke evaluator returning a scalar value for `self` and,
    /// optionally, a prior probability per entry in `children` (same
    /// order, same length). Consulted when `use_rollout` is false.
    fn evaluate(&self, children: &[Self]) -> (f64, Option<Vec<f64>>);

    /// Renders the transition from `self` to `child` as a short token
    /// (e.g. `"e2"`, `"c5h"`). `flip` selects canonical-board notation
    /// (`false`) vs. current-mover-perspective notation (`true`).
    fn action_text(&self, child: &Self, flip: bool) -> String;

    /// Parses an action token produced by [`GameState::action_text`] and
    /// returns the resulting child state, if the token names a legal move.
    fn apply_action_text(&self, text: &str, flip: bool) -> Result<Self, CorridorsError>
    where
        Self: Sized;

    /// A human-readable rendering of the position, e.g. for a CLI or log
    /// line. `flip` has the same meaning as in [`GameState::action_text`].
    /// The default falls back to `Debug`, which is adequate for games
    /// without a natural board rendering.
    fn render(&self, _flip: bool) -> String {
        format!("{:?}", self)
    }
}
