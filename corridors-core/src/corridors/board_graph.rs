//! Pathfinding substrate for the Corridors board, adapted from the
//! teacher's `graph.rs`. Unlike the teacher, which mutates a single
//! long-lived `petgraph` graph as walls accumulate, this rebuilds a graph
//! on demand from a state's wall bitmaps — the state itself stays a
//! plain value type (bitmaps + coordinates), matching spec.md §3.2's
//! data model, and a cloned state never drags a graph along with it.

use std::collections::HashMap;

use petgraph::algo::{dijkstra, has_path_connecting};
use petgraph::graph::{NodeIndex, UnGraph};

use super::coords::Coord;

/// Builds the full NxN grid graph, then removes every edge blocked by the
/// given wall bitmaps (see [`crate::corridors::state::CorridorsState`] for
/// their exact shape and indexing convention).
pub(crate) fn build_graph(
    size: usize,
    horizontal_walls: &[bool],
    vertical_walls: &[bool],
) -> (UnGraph<Coord, ()>, HashMap<Coord, NodeIndex>) {
    let mut graph = UnGraph::new_undirected();
    let mut node_indices = HashMap::with_capacity(size * size);

    for r in 0..size {
        for c in 0..size {
            node_indices.insert((r, c), graph.add_node((r, c)));
        }
    }

    for r in 0..size {
        for c in 0..size {
            let here = node_indices[&(r, c)];
            if c + 1 < size && !vertical_wall_blocks(vertical_walls, size, r, c) {
                graph.add_edge(here, node_indices[&(r, c + 1)], ());
            }
            if r + 1 < size && !horizontal_wall_blocks(horizontal_walls, size, r, c) {
                graph.add_edge(here, node_indices[&(r + 1, c)], ());
            }
        }
    }

    (graph, node_indices)
}

/// `horizontal_walls` is `(size - 1) x size`, row-major: entry `(r, c)`
/// is set when a horizontal wall severs the edge between `(r, c)` and
/// `(r + 1, c)`.
fn horizontal_wall_blocks(horizontal_walls: &[bool], size: usize, r: usize, c: usize) -> bool {
    horizontal_walls[r * size + c]
}

/// `vertical_walls` is `size x (size - 1)`, row-major: entry `(r, c)` is
/// set when a vertical wall severs the edge between `(r, c)` and
/// `(r, c + 1)`.
fn vertical_wall_blocks(vertical_walls: &[bool], size: usize, r: usize, c: usize) -> bool {
    vertical_walls[r * (size - 1) + c]
}

/// Shortest-path distance (in pawn steps, ignoring jumps) from `start` to
/// any cell in goal row `goal_row`. Returns `None` if unreachable.
pub(crate) fn shortest_path_len(
    graph: &UnGraph<Coord, ()>,
    node_indices: &HashMap<Coord, NodeIndex>,
    start: Coord,
    goal_row: usize,
    size: usize,
) -> Option<usize> {
    let start_node = *node_indices.get(&start)?;
    let distances = dijkstra(graph, start_node, None, |_| 1usize);
    (0..size)
        .filter_map(|c| distances.get(&node_indices[&(goal_row, c)]).copied())
        .min()
}

/// True iff both `hero_start`/`hero_goal_row` and `villain_start`/
/// `villain_goal_row` can still reach their goal row in `graph`. Used to
/// enforce the path invariant after a hypothetical wall placement.
pub(crate) fn both_players_have_a_path(
    graph: &UnGraph<Coord, ()>,
    node_indices: &HashMap<Coord, NodeIndex>,
    size: usize,
    hero_start: Coord,
    hero_goal_row: usize,
    villain_start: Coord,
    villain_goal_row: usize,
) -> bool {
    player_has_a_path(graph, node_indices, size, hero_start, hero_goal_row)
        && player_has_a_path(graph, node_indices, size, villain_start, villain_goal_row)
}

fn player_has_a_path(
    graph: &UnGraph<Coord, ()>,
    node_indices: &HashMap<Coord, NodeIndex>,
    size: usize,
    start: Coord,
    goal_row: usize,
) -> bool {
    let Some(&start_node) = node_indices.get(&start) else { return false };
    (0..size).any(|c| has_path_connecting(graph, start_node, node_indices[&(goal_row, c)], None))
}
