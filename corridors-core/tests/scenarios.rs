//! End-to-end scenarios S1-S6 from spec.md §8, driven entirely through the
//! crate's public surface (`CorridorsWire`, `SearchController`,
//! `ThreadedEngine`), the way a client outside the crate would exercise it.

use std::time::Duration;

use corridors_core::corridors::{CorridorsState, CorridorsWire};
use corridors_core::mcts::{SearchController, ThreadedEngine};
use corridors_core::{EngineConfig, GameState};

fn empty_walls(size: usize) -> (Vec<bool>, Vec<bool>, Vec<bool>) {
    (vec![false; (size - 1) * size], vec![false; size * (size - 1)], vec![false; (size - 1) * (size - 1)])
}

fn wire_state(
    size: usize,
    hero_pos: (usize, usize),
    villain_pos: (usize, usize),
    hero_walls_remaining: usize,
    villain_walls_remaining: usize,
) -> CorridorsState {
    let (horizontal_walls, vertical_walls, wall_middles) = empty_walls(size);
    CorridorsWire {
        size,
        flip: false,
        hero_pos,
        villain_pos,
        hero_walls_remaining,
        villain_walls_remaining,
        horizontal_walls,
        vertical_walls,
        wall_middles,
    }
    .try_into()
    .expect("hand-built wire state satisfies every CorridorsState invariant")
}

/// S1 — Single-move checkmate: hero one step from its goal row, with no
/// other path-relevant obstruction, must choose that step and the
/// resulting root must show a decided loss for whoever moves next.
#[test]
fn s1_single_move_checkmate() {
    let state = wire_state(9, (1, 4), (4, 4), 10, 10);
    let config = EngineConfig { min_simulations: 100, max_simulations: 1000, use_rollout: true, epsilon: 0.0, ..Default::default() };
    let mut controller = SearchController::new(state, config).unwrap();
    controller.ensure_min_simulations().unwrap();
    let text = controller.make_best_move(true).unwrap();
    assert_eq!(text, "e9");
    assert!(controller.is_terminal());
    assert_eq!(controller.evaluation(), Some(-1.0));
}

/// S3 — Root reuse: the chosen child keeps the visit count it accumulated
/// as part of the search, rather than resetting to zero when it becomes
/// the new root.
#[test]
fn s3_root_reuse_preserves_visit_count() {
    let config = EngineConfig { min_simulations: 5000, max_simulations: 5000, sim_increment: 500, ..Default::default() };
    let mut controller = SearchController::new(CorridorsState::new(9, 10).unwrap(), config).unwrap();
    controller.ensure_min_simulations().unwrap();

    let rows = controller.sorted_actions(true);
    let (visits_before, _, text) = rows[0].clone();
    assert!(visits_before > 0);

    controller.make_move(&text, true).unwrap();
    assert_eq!(controller.visit_count(), visits_before);
}

/// S4 — Threaded accumulation: between the floor and the ceiling, the
/// worker keeps making progress on its own.
#[test]
fn s4_threaded_accumulation_between_bounds() {
    let config = EngineConfig { min_simulations: 100, max_simulations: 10_000, sim_increment: 200, ..Default::default() };
    let engine = ThreadedEngine::construct(config, CorridorsState::new(9, 10).unwrap()).unwrap();
    engine.ensure_sims(10_000);
    std::thread::sleep(Duration::from_millis(200));
    let visits = engine.get_visit_count().unwrap();
    assert!(visits >= 100, "expected at least the min_simulations floor, got {visits}");
    assert!(visits <= 10_000, "expected at most the max_simulations ceiling, got {visits}");
    engine.shutdown().unwrap();
}

/// S5 — Heuristic-decided endgame: villain has no walls left and a
/// strictly longer path than hero, so the position is soundly decided
/// without further search, and `choose_best_action` must still pick a
/// definite move rather than looping.
#[test]
fn s5_heuristic_decided_endgame_picks_a_move() {
    // Hero two steps from goal row 0, villain four steps from goal row 8,
    // villain holds no walls: hero's shorter path cannot be lengthened.
    let state = wire_state(9, (2, 4), (4, 4), 5, 0);
    assert_eq!(state.check_non_terminal_eval(), Some(1.0));

    let config = EngineConfig { min_simulations: 50, max_simulations: 50, ..Default::default() };
    let mut controller = SearchController::new(state, config).unwrap();
    controller.ensure_min_simulations().unwrap();
    let text = controller.make_best_move(true).unwrap();
    // The shortest-path-preserving move is the forward step toward hero's
    // goal row, not a move that lengthens hero's own path.
    assert_eq!(text, "e8");
}

/// S6 — Illegal move rejection: an unknown move token is rejected without
/// mutating engine state, and a legal move afterward still works.
#[test]
fn s6_illegal_move_is_rejected_without_side_effects() {
    let config = EngineConfig { min_simulations: 50, max_simulations: 50, ..Default::default() };
    let mut controller = SearchController::new(CorridorsState::new(9, 10).unwrap(), config).unwrap();
    controller.ensure_min_simulations().unwrap();
    let visits_before = controller.visit_count();

    assert!(controller.make_move("z9h", false).is_err());
    assert_eq!(controller.visit_count(), visits_before);

    let rows = controller.sorted_actions(true);
    let (_, _, legal_text) = rows[0].clone();
    assert!(controller.make_move(&legal_text, true).is_ok());
}
