//! A node in the search tree, generalizing the teacher's raw-pointer
//! `MCTSNode` (`strategy/mcts.rs`) into an owned, unsafe-free tree.
//!
//! The teacher builds a `Vec<*mut MCTSNode>` path during selection and
//! dereferences it (unsafely) during backpropagation. Here a single
//! recursive method plays both roles: the call stack *is* the path, and
//! statistics update as each frame returns, so there is never a raw or
//! shared-mutable pointer into the tree. Orphaning a child on `make_move`
//! is `Vec::remove`; the discarded siblings drop along with the old root.

use rand::Rng;

use crate::config::EngineConfig;
use crate::error::CorridorsError;
use crate::game_state::GameState;

/// Caps a single rollout so a game with evaluation cycles and no heuristic
/// fails loudly instead of hanging the worker thread.
const MAX_ROLLOUT_ITERS: usize = 10_000;

/// A tree node. Statistics (`visit_count`, `value_sum`) are accumulated
/// self-relative — from this node's own side-to-move's perspective — so a
/// parent negates a child's equity when scoring it (see
/// [`Node::select_child_index`]).
#[derive(Debug)]
pub struct Node<G: GameState> {
    pub(crate) state: G,
    pub(crate) visit_count: usize,
    value_sum: f64,
    eval_value: Option<f64>,
    eval_probs: Option<Vec<f64>>,
    all_children_evaluated: bool,
    pub(crate) children: Vec<Node<G>>,
}

impl<G: GameState> Node<G> {
    pub fn new(state: G) -> Self {
        Node {
            state,
            visit_count: 0,
            value_sum: 0.0,
            eval_value: None,
            eval_probs: None,
            all_children_evaluated: false,
            children: Vec::new(),
        }
    }

    pub fn state(&self) -> &G {
        &self.state
    }

    pub fn visit_count(&self) -> usize {
        self.visit_count
    }

    /// Mean backpropagated value, self-relative; `None` until first visit.
    pub fn equity(&self) -> Option<f64> {
        (self.visit_count > 0).then(|| self.value_sum / self.visit_count as f64)
    }

    pub fn is_evaluated(&self) -> bool {
        self.eval_value.is_some()
    }

    /// The stored first-visit evaluation, if any.
    pub fn eval_value(&self) -> Option<f64> {
        self.eval_value
    }

    pub fn children(&self) -> &[Node<G>] {
        &self.children
    }

    fn materialize_children(&mut self) {
        if self.children.is_empty() && !self.state.is_terminal() {
            let state = &self.state;
            let children = &mut self.children;
            state.legal_moves(&mut |child_state| children.push(Node::new(child_state)));
        }
    }

    /// First-visit valuation. See spec.md §4.1 `evaluate`.
    fn evaluate(&mut self, rng: &mut impl Rng, config: &EngineConfig) -> Result<(), CorridorsError> {
        if self.eval_value.is_some() {
            return Err(CorridorsError::IllegalOperation {
                operation: "evaluate",
                detail: "node was already evaluated".to_string(),
            });
        }

        if self.state.is_terminal() {
            self.eval_value = Some(self.state.terminal_value());
            return Ok(());
        }

        if let Some(heuristic) = self.state.check_non_terminal_eval() {
            self.eval_value = Some(heuristic);
            return Ok(());
        }

        if config.use_rollout {
            self.eval_value = Some(Self::rollout(self.state.clone(), rng)?);
        } else {
            self.materialize_children();
            let child_states: Vec<G> = self.children.iter().map(|c| c.state.clone()).collect();
            let (value, probs) = self.state.evaluate(&child_states);
            if let Some(probs) = &probs {
                if probs.len() != self.children.len() {
                    return Err(CorridorsError::InternalInvariantViolation {
                        invariant: "prior_arity",
                        context: format!(
                            "bespoke evaluator returned {} priors for {} children",
                            probs.len(),
                            self.children.len()
                        ),
                    });
                }
            }
            self.eval_value = Some(value);
            self.eval_probs = probs;
        }

        if config.eval_children {
            self.materialize_children();
            for child in &mut self.children {
                if child.eval_value.is_none() {
                    child.evaluate(rng, config)?;
                }
            }
            self.all_children_evaluated = true;
        }

        Ok(())
    }

    /// Random simulation from a cloned state, bounded by
    /// `MAX_ROLLOUT_ITERS`. Returns the value signed so it is always from
    /// `state`'s own (the initial mover's) perspective.
    fn rollout(mut state: G, rng: &mut impl Rng) -> Result<f64, CorridorsError> {
        let mut sign = 1.0;
        for _ in 0..MAX_ROLLOUT_ITERS {
            if state.is_terminal() {
                return Ok(sign * state.terminal_value());
            }
            if let Some(heuristic) = state.check_non_terminal_eval() {
                return Ok(sign * heuristic);
            }
            let mut successors = Vec::new();
            state.legal_moves(&mut |child| successors.push(child));
            if successors.is_empty() {
                return Err(CorridorsError::InternalInvariantViolation {
                    invariant: "non_terminal_has_moves",
                    context: "rollout reached a non-terminal, non-heuristic state with no legal moves".to_string(),
                });
            }
            let pick = rng.gen_range(0..successors.len());
            state = successors.into_iter().nth(pick).expect("pick is in range");
            sign = -sign;
        }
        Err(CorridorsError::SearchStalled {
            iterations: MAX_ROLLOUT_ITERS,
            state_display: state.render(true),
        })
    }

    /// Picks which child to descend into, materializing children on first
    /// use. See spec.md §4.1 `select`.
    fn select_child_index(&mut self, rng: &mut impl Rng, config: &EngineConfig) -> Result<usize, CorridorsError> {
        self.materialize_children();
        if self.children.is_empty() {
            return Err(CorridorsError::InternalInvariantViolation {
                invariant: "non_terminal_has_children",
                context: "node is non-terminal and non-heuristic but has no legal children".to_string(),
            });
        }

        if !self.all_children_evaluated {
            let unevaluated: Vec<usize> = self
                .children
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_evaluated())
                .map(|(i, _)| i)
                .collect();
            if !unevaluated.is_empty() {
                return Ok(unevaluated[rng.gen_range(0..unevaluated.len())]);
            }
            self.all_children_evaluated = true;
        }

        let parent_visits = self.visit_count.max(1) as f64;
        let ln_n_minus_1 = (parent_visits - 1.0).max(0.0).ln().max(0.0);
        let sqrt_n_minus_1 = (parent_visits - 1.0).max(0.0).sqrt();

        let mut best_score = f64::NEG_INFINITY;
        let mut best_indices = Vec::new();
        for (i, child) in self.children.iter().enumerate() {
            let child_equity = child.equity().unwrap_or(0.0);
            let q = -child_equity;
            let n_i = child.visit_count.max(1) as f64;
            let mut u = if config.use_puct {
                sqrt_n_minus_1 / (1.0 + n_i)
            } else {
                (ln_n_minus_1 / n_i).sqrt()
            };
            if config.use_probs {
                if let Some(probs) = &self.eval_probs {
                    u *= probs.get(i).copied().unwrap_or(0.0);
                }
            }
            let score = q + config.c * u;
            if score > best_score {
                best_score = score;
                best_indices.clear();
                best_indices.push(i);
            } else if score == best_score {
                best_indices.push(i);
            }
        }
        Ok(best_indices[rng.gen_range(0..best_indices.len())])
    }

    /// Runs one selection/expansion/evaluation/backpropagation pass,
    /// returning the value contributed to this node's own statistics (and,
    /// negated, to its parent's).
    fn run_one_simulation(&mut self, rng: &mut impl Rng, config: &EngineConfig) -> Result<f64, CorridorsError> {
        let r = if !self.is_evaluated() {
            self.evaluate(rng, config)?;
            self.eval_value.expect("just evaluated")
        } else if self.state.is_terminal() || self.state.check_non_terminal_eval().is_some() {
            self.eval_value.expect("already evaluated")
        } else {
            let idx = self.select_child_index(rng, config)?;
            let child_value = self.children[idx].run_one_simulation(rng, config)?;
            -child_value
        };
        self.visit_count += 1;
        self.value_sum += r;
        Ok(r)
    }

    /// Runs `k` simulations from this node, evaluating it first if this is
    /// its first visit (that evaluation does not count toward `k`).
    pub fn simulate(&mut self, k: usize, rng: &mut impl Rng, config: &EngineConfig) -> Result<(), CorridorsError> {
        if self.state.is_terminal() {
            return Err(CorridorsError::IllegalOperation {
                operation: "simulate",
                detail: "root is terminal".to_string(),
            });
        }
        if !self.is_evaluated() {
            self.run_one_simulation(rng, config)?;
        }
        for _ in 0..k {
            self.run_one_simulation(rng, config)?;
        }
        Ok(())
    }

    /// Policy for picking the move to actually play. See spec.md §4.1
    /// `choose_best_action`.
    pub fn choose_best_action(&mut self, config: &EngineConfig, rng: &mut impl Rng) -> Result<usize, CorridorsError> {
        self.materialize_children();
        if self.children.is_empty() {
            return Err(CorridorsError::IllegalOperation {
                operation: "choose_best_action",
                detail: "no legal children from this position".to_string(),
            });
        }

        let winning: Vec<usize> = self
            .children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.state.is_terminal() && c.state.terminal_value() < 0.0)
            .map(|(i, _)| i)
            .collect();
        if !winning.is_empty() {
            return Ok(winning[rng.gen_range(0..winning.len())]);
        }

        if self.state.check_non_terminal_eval().is_some() {
            let max_rank = self.children.iter().map(|c| c.state.non_terminal_rank()).max().expect("non-empty");
            let candidates: Vec<usize> = self
                .children
                .iter()
                .enumerate()
                .filter(|(_, c)| c.state.non_terminal_rank() == max_rank)
                .map(|(i, _)| i)
                .collect();
            return Ok(candidates[rng.gen_range(0..candidates.len())]);
        }

        if config.epsilon > 0.0 && rng.gen::<f64>() < config.epsilon {
            return Ok(rng.gen_range(0..self.children.len()));
        }

        let scores: Vec<f64> = self
            .children
            .iter()
            .map(|c| {
                if config.decide_using_visits {
                    c.visit_count as f64
                } else {
                    -c.equity().unwrap_or(0.0)
                }
            })
            .collect();
        let max_score = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let top: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == max_score)
            .map(|(i, _)| i)
            .collect();
        Ok(top[rng.gen_range(0..top.len())])
    }

    /// Orphans child `idx`, returning it as the new root candidate. The
    /// remaining siblings (and `self`, once the caller drops it) are
    /// released normally.
    pub fn take_child(&mut self, idx: usize) -> Result<Node<G>, CorridorsError> {
        if idx >= self.children.len() {
            return Err(CorridorsError::IllegalOperation {
                operation: "take_child",
                detail: format!("child index {} out of range ({} children)", idx, self.children.len()),
            });
        }
        Ok(self.children.remove(idx))
    }

    /// `(visits, equity, action text)` per child, sorted descending by
    /// equity (parent's view), then ascending `non_terminal_rank`, then
    /// descending visit count.
    pub fn sorted_actions(&mut self, flip: bool) -> Vec<(usize, Option<f64>, String)> {
        self.materialize_children();
        let state = &self.state;
        let mut rows: Vec<(usize, Option<f64>, String, i64)> = self
            .children
            .iter()
            .map(|c| {
                let text = state.action_text(&c.state, flip);
                let equity = c.equity().map(|e| -e);
                (c.visit_count, equity, text, c.state.non_terminal_rank())
            })
            .collect();
        rows.sort_by(|a, b| {
            let equity_cmp = match (a.1, b.1) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            equity_cmp.then(a.3.cmp(&b.3)).then(b.0.cmp(&a.0))
        });
        rows.into_iter().map(|(v, e, t, _)| (v, e, t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corridors::CorridorsState;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn fresh_node_is_unevaluated() {
        let node = Node::new(CorridorsState::new(9, 10).unwrap());
        assert!(!node.is_evaluated());
        assert_eq!(node.equity(), None);
    }

    #[test]
    fn simulate_grows_visit_count_by_k_plus_one() {
        let mut node = Node::new(CorridorsState::new(9, 10).unwrap());
        let mut r = rng();
        let config = EngineConfig { use_rollout: true, ..Default::default() };
        node.simulate(10, &mut r, &config).unwrap();
        assert_eq!(node.visit_count(), 11);
    }

    #[test]
    fn equity_stays_within_bounds_after_many_simulations() {
        let mut node = Node::new(CorridorsState::new(5, 3).unwrap());
        let mut r = rng();
        let config = EngineConfig { use_rollout: true, max_simulations: 500, ..Default::default() };
        node.simulate(200, &mut r, &config).unwrap();
        let eq = node.equity().unwrap();
        assert!((-1.0..=1.0).contains(&eq));
    }

    #[test]
    fn simulate_on_terminal_root_is_illegal() {
        let terminal_state = crate::corridors::CorridorsState::from_raw_parts(
            9,
            (4, 4),
            (8, 4),
            10,
            10,
            vec![false; 8 * 9],
            vec![false; 9 * 8],
            vec![false; 8 * 8],
            false,
        );
        assert!(terminal_state.is_terminal());
        let mut node = Node::new(terminal_state);
        let mut r = rng();
        let config = EngineConfig::default();
        assert!(node.simulate(1, &mut r, &config).is_err());
    }

    #[test]
    fn choose_best_action_never_panics_and_returns_a_valid_index() {
        let mut node = Node::new(CorridorsState::new(5, 5).unwrap());
        let mut r = rng();
        let config = EngineConfig { use_rollout: true, min_simulations: 20, max_simulations: 20, ..Default::default() };
        node.simulate(20, &mut r, &config).unwrap();
        let idx = node.choose_best_action(&config, &mut r).unwrap();
        assert!(idx < node.children().len());
    }

    #[test]
    fn sorted_actions_orders_by_equity_then_visits() {
        let mut node = Node::new(CorridorsState::new(9, 10).unwrap());
        let mut r = rng();
        let config = EngineConfig { use_rollout: true, ..Default::default() };
        node.simulate(50, &mut r, &config).unwrap();
        let rows = node.sorted_actions(true);
        assert!(!rows.is_empty());
        for pair in rows.windows(2) {
            let (e0, e1) = (pair[0].1, pair[1].1);
            if let (Some(a), Some(b)) = (e0, e1) {
                assert!(a >= b - 1e-9);
            }
        }
    }

    /// Invariant #4 (spec.md §8): when two children score identically,
    /// `select_child_index` must break the tie uniformly, not favor
    /// whichever came first. Constructs two children with hand-set,
    /// identical statistics (white-box, since visit/value fields are
    /// crate-private) and checks the pick frequency over many seeds.
    #[test]
    fn tie_breaking_is_uniform_across_seeds() {
        let mut node = Node::new(CorridorsState::new(9, 10).unwrap());
        node.visit_count = 50;
        let mut a = Node::new(CorridorsState::new(9, 10).unwrap());
        a.visit_count = 5;
        a.value_sum = 0.0;
        a.eval_value = Some(0.0);
        let mut b = Node::new(CorridorsState::new(9, 10).unwrap());
        b.visit_count = 5;
        b.value_sum = 0.0;
        b.eval_value = Some(0.0);
        node.children = vec![a, b];
        node.all_children_evaluated = true;

        let config = EngineConfig::default();
        let mut counts = [0usize; 2];
        for seed in 0..2000u64 {
            let mut r = rand::rngs::StdRng::seed_from_u64(seed);
            let idx = node.select_child_index(&mut r, &config).unwrap();
            counts[idx] += 1;
        }
        let frequency = counts[0] as f64 / 2000.0;
        assert!((0.5 - frequency).abs() < 0.05, "tie-break frequency {} not close to 0.5", frequency);
    }
}
