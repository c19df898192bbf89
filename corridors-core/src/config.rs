//! Engine configuration, validated at construction time.
//!
//! Mirrors the teacher's builder idiom (`MCTSStrategy::new(..).with_time_limit(..)`)
//! but produces a plain validated struct rather than mutating strategy state,
//! since the engine itself (not a `Strategy` impl) now owns the search.

use crate::error::CorridorsError;

/// Tunables recognized by [`crate::mcts::ThreadedEngine::construct`].
///
/// Field names and meanings follow the engine's external contract exactly;
/// see the module docs for how each is consumed.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Exploration constant `c` in the UCT/PUCT selection formula. Typical
    /// range is sqrt(1/2) to sqrt(2).
    pub c: f64,
    /// Seed for the search controller's RNG.
    pub seed: u64,
    /// Floor: an external call tops the root up to at least this many
    /// simulations before acting on it.
    pub min_simulations: usize,
    /// Ceiling: the worker idles once the root reaches this many
    /// simulations.
    pub max_simulations: usize,
    /// Size of each batch the worker runs between mutex releases.
    pub sim_increment: usize,
    /// If false, first-visit evaluation uses the game's bespoke evaluator
    /// instead of a random rollout.
    pub use_rollout: bool,
    /// If true, depth-1 preview-evaluate every child on a node's first
    /// visit instead of lazily discovering them one at a time.
    pub eval_children: bool,
    /// Use the PUCT exploration term instead of UCT.
    pub use_puct: bool,
    /// Multiply the exploration bonus by the prior probability (requires
    /// a bespoke evaluator that returns priors).
    pub use_probs: bool,
    /// Rank children by visit count rather than by equity when choosing
    /// the move to play.
    pub decide_using_visits: bool,
    /// Probability of choosing a uniformly-random legal child instead of
    /// the top-ranked one.
    pub epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            c: std::f64::consts::FRAC_1_SQRT_2,
            seed: 0,
            min_simulations: 100,
            max_simulations: 10_000,
            sim_increment: 200,
            use_rollout: true,
            eval_children: false,
            use_puct: false,
            use_probs: false,
            decide_using_visits: true,
            epsilon: 0.0,
        }
    }
}

impl EngineConfig {
    /// Validates the configuration, returning `InvalidInput` on the first
    /// out-of-range field found.
    pub fn validate(&self) -> Result<(), CorridorsError> {
        if !self.c.is_finite() || self.c < 0.0 {
            return Err(CorridorsError::InvalidInput {
                field: "c",
                detail: format!("exploration constant must be finite and non-negative, got {}", self.c),
            });
        }
        if self.sim_increment == 0 {
            return Err(CorridorsError::InvalidInput {
                field: "sim_increment",
                detail: "sim_increment must be at least 1".to_string(),
            });
        }
        if self.min_simulations > self.max_simulations {
            return Err(CorridorsError::InvalidInput {
                field: "min_simulations",
                detail: format!(
                    "min_simulations ({}) must not exceed max_simulations ({})",
                    self.min_simulations, self.max_simulations
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(CorridorsError::InvalidInput {
                field: "epsilon",
                detail: format!("epsilon must be in [0, 1], got {}", self.epsilon),
            });
        }
        if self.use_probs && self.use_rollout {
            return Err(CorridorsError::InvalidInput {
                field: "use_probs",
                detail: "use_probs requires a bespoke evaluator (use_rollout = false)".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_sim_bounds() {
        let cfg = EngineConfig { min_simulations: 500, max_simulations: 100, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_epsilon_out_of_range() {
        let cfg = EngineConfig { epsilon: 1.5, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_sim_increment() {
        let cfg = EngineConfig { sim_increment: 0, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_probs_without_bespoke_evaluator() {
        let cfg = EngineConfig { use_probs: true, use_rollout: true, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
