//! Drives simulation batches from a root node and applies moves, advancing
//! the root in place. Generalizes the shape of the teacher's
//! `MCTSStrategy::run_search` (pick-root, loop-simulate, pick-move) into a
//! reusable, single-threaded driver that [`crate::mcts::ThreadedEngine`]
//! wraps for concurrent access.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::error::CorridorsError;
use crate::game_state::GameState;

use super::node::Node;

/// Owns the current root, the search RNG, and the validated configuration.
pub struct SearchController<G: GameState> {
    root: Node<G>,
    rng: StdRng,
    config: EngineConfig,
}

impl<G: GameState> SearchController<G> {
    pub fn new(state: G, config: EngineConfig) -> Result<Self, CorridorsError> {
        config.validate()?;
        Ok(SearchController { root: Node::new(state), rng: StdRng::seed_from_u64(config.seed), config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn root_state(&self) -> &G {
        self.root.state()
    }

    pub fn visit_count(&self) -> usize {
        self.root.visit_count()
    }

    pub fn is_terminal(&self) -> bool {
        self.root.state().is_terminal()
    }

    /// `None` if the root has not been evaluated yet, `Some(equity)`
    /// (self-relative) otherwise.
    pub fn equity(&self) -> Option<f64> {
        self.root.equity()
    }

    /// `None` if the root is non-terminal, `Some(terminal_value)` if it is.
    pub fn evaluation(&self) -> Option<f64> {
        self.root.state().is_terminal().then(|| self.root.state().terminal_value())
    }

    pub fn sorted_actions(&mut self, flip: bool) -> Vec<(usize, Option<f64>, String)> {
        self.root.sorted_actions(flip)
    }

    pub fn display(&self, flip: bool) -> String {
        self.root.state().render(flip)
    }

    /// Runs `k` additional simulations from the current root.
    pub fn simulate(&mut self, k: usize) -> Result<(), CorridorsError> {
        self.root.simulate(k, &mut self.rng, &self.config)
    }

    /// Tops the root up to at least `min_sims` visits, running simulations
    /// in `sim_increment`-sized batches.
    pub fn ensure_min_simulations(&mut self) -> Result<(), CorridorsError> {
        self.top_up_to(self.config.min_simulations)
    }

    /// Runs simulations in `sim_increment`-sized batches until the root
    /// has at least `target` visits (capped by `max_simulations`).
    pub fn top_up_to(&mut self, target: usize) -> Result<(), CorridorsError> {
        let target = target.min(self.config.max_simulations);
        while self.root.visit_count() < target
            && !self.root.state().is_terminal()
            && self.root.state().check_non_terminal_eval().is_none()
        {
            let remaining = target - self.root.visit_count();
            let batch = self.config.sim_increment.min(remaining.max(1));
            self.simulate(batch)?;
        }
        Ok(())
    }

    /// Chooses the best action from the root per `choose_best_action` and
    /// advances the root to it, returning the chosen child's action text.
    pub fn make_best_move(&mut self, flip: bool) -> Result<String, CorridorsError> {
        let idx = self.root.choose_best_action(&self.config, &mut self.rng)?;
        self.advance_to_child(idx, flip)
    }

    /// Advances the root to the child named by `text` (in the perspective
    /// named by `flip`), returning that text back for confirmation.
    pub fn make_move(&mut self, text: &str, flip: bool) -> Result<String, CorridorsError> {
        let idx = self.find_child_index(text, flip)?;
        self.advance_to_child(idx, flip)
    }

    fn find_child_index(&mut self, text: &str, flip: bool) -> Result<usize, CorridorsError> {
        // Materialize children (if not already) so the scan below sees
        // them; `sorted_actions` has this side effect as a byproduct, but
        // here we just need the children themselves.
        let _ = self.root.sorted_actions(flip);
        let root_state = self.root.state().clone();
        self.root
            .children()
            .iter()
            .position(|child| root_state.action_text(&child.state, flip) == text)
            .ok_or_else(|| CorridorsError::IllegalOperation {
                operation: "make_move",
                detail: format!("`{}` does not name a legal move from the current root", text),
            })
    }

    fn advance_to_child(&mut self, idx: usize, flip: bool) -> Result<String, CorridorsError> {
        let root_state = self.root.state().clone();
        let child_state = self.root.children()[idx].state().clone();
        let text = root_state.action_text(&child_state, flip);
        self.root = self.root.take_child(idx)?;
        Ok(text)
    }

    /// Replaces the root with `state` outright, discarding the current
    /// tree, unless `state` matches one of the current root's children (in
    /// which case that subtree — and its accumulated statistics — is
    /// reused).
    pub fn set_state(&mut self, state: G) {
        if let Some(idx) = self.root.children().iter().position(|c| *c.state() == state) {
            self.root = self.root.take_child(idx).expect("index from position() is valid");
        } else {
            self.root = Node::new(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corridors::CorridorsState;

    fn config() -> EngineConfig {
        EngineConfig { min_simulations: 50, max_simulations: 200, sim_increment: 20, ..Default::default() }
    }

    #[test]
    fn fresh_controller_has_zero_visits() {
        let controller = SearchController::new(CorridorsState::new(9, 10).unwrap(), config()).unwrap();
        assert_eq!(controller.visit_count(), 0);
    }

    #[test]
    fn ensure_min_simulations_reaches_the_floor() {
        let mut controller = SearchController::new(CorridorsState::new(9, 10).unwrap(), config()).unwrap();
        controller.ensure_min_simulations().unwrap();
        assert!(controller.visit_count() >= 50);
    }

    #[test]
    fn make_move_preserves_the_chosen_childs_visit_count() {
        let mut controller = SearchController::new(CorridorsState::new(9, 10).unwrap(), config()).unwrap();
        controller.ensure_min_simulations().unwrap();
        let rows = controller.sorted_actions(true);
        let (visits_before, _, text) = rows[0].clone();
        controller.make_move(&text, true).unwrap();
        assert_eq!(controller.visit_count(), visits_before);
    }

    #[test]
    fn make_move_with_unknown_text_is_illegal_and_leaves_state_unchanged() {
        let mut controller = SearchController::new(CorridorsState::new(9, 10).unwrap(), config()).unwrap();
        controller.ensure_min_simulations().unwrap();
        let visits_before = controller.visit_count();
        assert!(controller.make_move("z9h", false).is_err());
        assert_eq!(controller.visit_count(), visits_before);
    }
}
