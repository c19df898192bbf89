//! Corridors (Quoridor-family) position, adapted from the teacher's
//! `Quoridor` struct in `game.rs`.
//!
//! Unlike the teacher, which stores absolute player identity (`active_player`)
//! and a mutable `petgraph` graph alongside the board, `CorridorsState` is
//! always expressed from the side to move ("hero") against the other side
//! ("villain"): hero's goal row is always 0, villain's is always `size - 1`.
//! Every move ends by swapping hero/villain and mirroring all coordinates
//! and wall bitmaps across the row axis, toggling `flip`. `flip` records
//! whether the internal (hero-to-move) frame is currently mirrored relative
//! to the canonical/physical board, which is what lets `action_text` render
//! either canonical notation or current-mover notation on request.

use std::collections::HashSet;

use crate::error::CorridorsError;
use crate::game_state::GameState;

use super::board_graph::{both_players_have_a_path, build_graph, shortest_path_len};
use super::coords::{algebraic_to_coord, coord_to_algebraic, mirror_row, Coord};

/// A Corridors position, always viewed from the side to move.
///
/// `horizontal_walls` is `(size - 1) x size` (severs the edge between
/// `(r, c)` and `(r + 1, c)`), `vertical_walls` is `size x (size - 1)`
/// (severs the edge between `(r, c)` and `(r, c + 1)`), and `wall_middles`
/// is `(size - 1) x (size - 1)`, one bit per wall *slot* (the 2x1 footprint
/// a wall of either orientation occupies), true when that slot is occupied.
/// A single `wall_middles` check catches both same-slot overlap and
/// perpendicular crossing at the same slot, which is why the state doesn't
/// need the teacher's separate neighbor-slot overlap checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorridorsState {
    size: usize,
    hero_pos: Coord,
    villain_pos: Coord,
    hero_walls_remaining: usize,
    villain_walls_remaining: usize,
    horizontal_walls: Vec<bool>,
    vertical_walls: Vec<bool>,
    wall_middles: Vec<bool>,
    flip: bool,
}

/// A wall's orientation: horizontal (spans two columns of the same row
/// boundary) or vertical (spans two rows of the same column boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WallOrientation {
    Horizontal,
    Vertical,
}

impl CorridorsState {
    /// A fresh position on a `size x size` board (`size` must be odd and
    /// at least 3 for the starting pawns to sit on the center file), each
    /// side holding `walls_per_side` walls.
    pub fn new(size: usize, walls_per_side: usize) -> Result<Self, CorridorsError> {
        if size < 3 || size % 2 == 0 {
            return Err(CorridorsError::InvalidInput {
                field: "size",
                detail: format!("board size must be odd and >= 3, got {}", size),
            });
        }
        let center = size / 2;
        Ok(CorridorsState {
            size,
            hero_pos: (size - 1, center),
            villain_pos: (0, center),
            hero_walls_remaining: walls_per_side,
            villain_walls_remaining: walls_per_side,
            horizontal_walls: vec![false; (size - 1) * size],
            vertical_walls: vec![false; size * (size - 1)],
            wall_middles: vec![false; (size - 1) * (size - 1)],
            flip: false,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn hero_pos(&self) -> Coord {
        self.hero_pos
    }

    pub fn villain_pos(&self) -> Coord {
        self.villain_pos
    }

    pub fn hero_walls_remaining(&self) -> usize {
        self.hero_walls_remaining
    }

    pub fn villain_walls_remaining(&self) -> usize {
        self.villain_walls_remaining
    }

    pub fn flip(&self) -> bool {
        self.flip
    }

    pub(crate) fn horizontal_walls(&self) -> &[bool] {
        &self.horizontal_walls
    }

    pub(crate) fn vertical_walls(&self) -> &[bool] {
        &self.vertical_walls
    }

    pub(crate) fn wall_middles(&self) -> &[bool] {
        &self.wall_middles
    }

    /// Constructs a state directly from validated fields, used by
    /// [`super::wire::CorridorsWire`]'s `TryFrom` impl. Does not itself
    /// validate the path invariant; callers must check it first.
    pub(crate) fn from_raw_parts(
        size: usize,
        hero_pos: Coord,
        villain_pos: Coord,
        hero_walls_remaining: usize,
        villain_walls_remaining: usize,
        horizontal_walls: Vec<bool>,
        vertical_walls: Vec<bool>,
        wall_middles: Vec<bool>,
        flip: bool,
    ) -> Self {
        CorridorsState {
            size,
            hero_pos,
            villain_pos,
            hero_walls_remaining,
            villain_walls_remaining,
            horizontal_walls,
            vertical_walls,
            wall_middles,
            flip,
        }
    }

    fn distances(&self) -> (Option<usize>, Option<usize>) {
        let (graph, idx) = build_graph(self.size, &self.horizontal_walls, &self.vertical_walls);
        let d_hero = shortest_path_len(&graph, &idx, self.hero_pos, 0, self.size);
        let d_villain = shortest_path_len(&graph, &idx, self.villain_pos, self.size - 1, self.size);
        (d_hero, d_villain)
    }

    /// Legal pawn destinations from `hero_pos`, including jumps over
    /// `villain_pos`. Adapted from the teacher's `get_legal_moves`.
    fn legal_pawn_destinations(&self) -> Vec<Coord> {
        let (graph, idx) = build_graph(self.size, &self.horizontal_walls, &self.vertical_walls);
        let own_node = idx[&self.hero_pos];
        let opp_node = idx[&self.villain_pos];

        let mut dests = HashSet::new();
        for neighbor_idx in graph.neighbors(own_node) {
            let npos = graph[neighbor_idx];
            if npos != self.villain_pos {
                dests.insert(npos);
                continue;
            }

            let dr = self.villain_pos.0 as isize - self.hero_pos.0 as isize;
            let dc = self.villain_pos.1 as isize - self.hero_pos.1 as isize;
            let jr = self.hero_pos.0 as isize + 2 * dr;
            let jc = self.hero_pos.1 as isize + 2 * dc;

            let mut straight_ok = false;
            if jr >= 0 && (jr as usize) < self.size && jc >= 0 && (jc as usize) < self.size {
                let jpos = (jr as usize, jc as usize);
                if let Some(&jnode) = idx.get(&jpos) {
                    if graph.contains_edge(opp_node, jnode) {
                        dests.insert(jpos);
                        straight_ok = true;
                    }
                }
            }

            if !straight_ok {
                for opp_neighbor in graph.neighbors(opp_node) {
                    let onp = graph[opp_neighbor];
                    if onp != self.hero_pos {
                        dests.insert(onp);
                    }
                }
            }
        }
        dests.into_iter().collect()
    }

    /// Legal wall slots (row, col, orientation) given walls remaining and
    /// the path invariant. Adapted from the teacher's `get_legal_walls` /
    /// `is_wall_placement_valid`.
    fn legal_wall_slots(&self) -> Vec<(usize, usize, WallOrientation)> {
        if self.hero_walls_remaining == 0 {
            return Vec::new();
        }
        let mut slots = Vec::new();
        for r in 0..self.size - 1 {
            for c in 0..self.size - 1 {
                if self.is_wall_slot_legal(r, c, WallOrientation::Horizontal) {
                    slots.push((r, c, WallOrientation::Horizontal));
                }
                if self.is_wall_slot_legal(r, c, WallOrientation::Vertical) {
                    slots.push((r, c, WallOrientation::Vertical));
                }
            }
        }
        slots
    }

    fn is_wall_slot_legal(&self, r: usize, c: usize, orientation: WallOrientation) -> bool {
        if self.wall_middles[r * (self.size - 1) + c] {
            return false;
        }
        let (h, v) = self.walls_with_slot_occupied(r, c, orientation);
        let (graph, idx) = build_graph(self.size, &h, &v);
        both_players_have_a_path(&graph, &idx, self.size, self.hero_pos, 0, self.villain_pos, self.size - 1)
    }

    fn walls_with_slot_occupied(
        &self,
        r: usize,
        c: usize,
        orientation: WallOrientation,
    ) -> (Vec<bool>, Vec<bool>) {
        let mut h = self.horizontal_walls.clone();
        let mut v = self.vertical_walls.clone();
        match orientation {
            WallOrientation::Horizontal => {
                h[r * self.size + c] = true;
                h[r * self.size + c + 1] = true;
            }
            WallOrientation::Vertical => {
                v[r * (self.size - 1) + c] = true;
                v[(r + 1) * (self.size - 1) + c] = true;
            }
        }
        (h, v)
    }

    /// Builds the child that results from hero acting, then flips
    /// perspective: new hero = old villain (mirrored), new villain = old
    /// hero's post-move position (mirrored). `new_hero_pos`/
    /// `new_hero_walls_remaining` describe hero's situation *before* the
    /// flip; pass `self.hero_pos`/`self.hero_walls_remaining` unchanged for
    /// a wall placement, or an updated position for a pawn move.
    fn build_child(
        &self,
        new_hero_pos: Coord,
        new_hero_walls_remaining: usize,
        horizontal_walls: Vec<bool>,
        vertical_walls: Vec<bool>,
        wall_middles: Vec<bool>,
    ) -> CorridorsState {
        let size = self.size;
        CorridorsState {
            size,
            hero_pos: mirror_row(self.villain_pos, size),
            villain_pos: mirror_row(new_hero_pos, size),
            hero_walls_remaining: self.villain_walls_remaining,
            villain_walls_remaining: new_hero_walls_remaining,
            horizontal_walls: mirror_rows(&horizontal_walls, size - 1, size),
            vertical_walls: mirror_rows(&vertical_walls, size, size - 1),
            wall_middles: mirror_rows(&wall_middles, size - 1, size - 1),
            flip: !self.flip,
        }
    }

    fn child_for_pawn_move(&self, dest: Coord) -> CorridorsState {
        self.build_child(
            dest,
            self.hero_walls_remaining,
            self.horizontal_walls.clone(),
            self.vertical_walls.clone(),
            self.wall_middles.clone(),
        )
    }

    fn child_for_wall(&self, r: usize, c: usize, orientation: WallOrientation) -> CorridorsState {
        let (h, v) = self.walls_with_slot_occupied(r, c, orientation);
        let mut mid = self.wall_middles.clone();
        mid[r * (self.size - 1) + c] = true;
        self.build_child(self.hero_pos, self.hero_walls_remaining - 1, h, v, mid)
    }

    /// Given a child state reached from `self`, recovers the move that
    /// produced it, in `self`'s (hero-to-move) coordinate frame.
    fn move_into(&self, child: &CorridorsState) -> Move {
        let hero_pos_before_flip = mirror_row(child.villain_pos, self.size);
        if hero_pos_before_flip != self.hero_pos {
            return Move::Pawn(hero_pos_before_flip);
        }
        let mid_before_flip = mirror_rows(&child.wall_middles, self.size - 1, self.size - 1);
        for r in 0..self.size - 1 {
            for c in 0..self.size - 1 {
                let idx = r * (self.size - 1) + c;
                if mid_before_flip[idx] && !self.wall_middles[idx] {
                    let h_before_flip = mirror_rows(&child.horizontal_walls, self.size - 1, self.size);
                    let orientation = if h_before_flip[r * self.size + c]
                        && !self.horizontal_walls[r * self.size + c]
                    {
                        WallOrientation::Horizontal
                    } else {
                        WallOrientation::Vertical
                    };
                    return Move::Wall(r, c, orientation);
                }
            }
        }
        // Neither a pawn move nor a wall changed anything: should not
        // happen for a true child of `self`.
        Move::Pawn(self.hero_pos)
    }

    /// Converts a hero-frame coordinate to the frame named by
    /// `flip_param` (see [`GameState::action_text`]): the current-mover
    /// frame if `flip_param` is true, else the canonical/physical frame.
    fn to_render_coord(&self, hero_frame: Coord, row_count: usize, flip_param: bool) -> Coord {
        if flip_param || !self.flip {
            hero_frame
        } else {
            (row_count - 1 - hero_frame.0, hero_frame.1)
        }
    }
}

enum Move {
    Pawn(Coord),
    Wall(usize, usize, WallOrientation),
}

/// Mirrors a `rows x cols` row-major bitmap across its row axis.
fn mirror_rows(bits: &[bool], rows: usize, cols: usize) -> Vec<bool> {
    let mut out = vec![false; rows * cols];
    for r in 0..rows {
        let src = &bits[r * cols..(r + 1) * cols];
        out[(rows - 1 - r) * cols..(rows - r) * cols].copy_from_slice(src);
    }
    out
}

impl GameState for CorridorsState {
    fn legal_moves(&self, sink: &mut dyn FnMut(Self)) {
        if self.is_terminal() {
            return;
        }
        for dest in self.legal_pawn_destinations() {
            sink(self.child_for_pawn_move(dest));
        }
        for (r, c, orientation) in self.legal_wall_slots() {
            sink(self.child_for_wall(r, c, orientation));
        }
    }

    fn is_terminal(&self) -> bool {
        self.hero_pos.0 == 0 || self.villain_pos.0 == self.size - 1
    }

    fn terminal_value(&self) -> f64 {
        if self.villain_pos.0 == self.size - 1 {
            -1.0
        } else if self.hero_pos.0 == 0 {
            1.0
        } else {
            0.0
        }
    }

    fn check_non_terminal_eval(&self) -> Option<f64> {
        if self.villain_walls_remaining != 0 {
            return None;
        }
        let (d_hero, d_villain) = self.distances();
        match (d_hero, d_villain) {
            (Some(d_hero), Some(d_villain)) if d_hero < d_villain => {
                // With no walls left, villain cannot lengthen hero's path:
                // hero wins the pure race. Sound regardless of move order.
                Some(1.0)
            }
            _ => None,
        }
    }

    fn non_terminal_rank(&self) -> i64 {
        let (d_hero, d_villain) = self.distances();
        let d_hero = d_hero.unwrap_or(usize::MAX / 2) as i64;
        let d_villain = d_villain.unwrap_or(usize::MAX / 2) as i64;
        d_hero - d_villain
    }

    fn evaluate(&self, _children: &[Self]) -> (f64, Option<Vec<f64>>) {
        let (d_hero, d_villain) = self.distances();
        let d_hero = d_hero.unwrap_or(self.size * self.size) as f64;
        let d_villain = d_villain.unwrap_or(self.size * self.size) as f64;
        let value = ((d_villain - d_hero) / self.size as f64).clamp(-1.0, 1.0);
        (value, None)
    }

    fn action_text(&self, child: &Self, flip: bool) -> String {
        match self.move_into(child) {
            Move::Pawn(dest) => {
                let rendered = self.to_render_coord(dest, self.size, flip);
                coord_to_algebraic(rendered, self.size).unwrap_or_else(|_| "??".to_string())
            }
            Move::Wall(r, c, orientation) => {
                let rendered = self.to_render_coord((r, c), self.size - 1, flip);
                let suffix = match orientation {
                    WallOrientation::Horizontal => 'h',
                    WallOrientation::Vertical => 'v',
                };
                match coord_to_algebraic(rendered, self.size) {
                    Ok(base) => format!("{}{}", base, suffix),
                    Err(_) => "??".to_string(),
                }
            }
        }
    }

    fn apply_action_text(&self, text: &str, flip: bool) -> Result<Self, CorridorsError> {
        let illegal = || CorridorsError::IllegalOperation {
            operation: "apply_action_text",
            detail: format!("`{}` does not name a legal move from this position", text),
        };

        let is_wall = text.len() > 2 && (text.ends_with('h') || text.ends_with('v'));
        let rendered = algebraic_to_coord(text, self.size).map_err(|_| illegal())?;

        if is_wall {
            let orientation = if text.ends_with('h') { WallOrientation::Horizontal } else { WallOrientation::Vertical };
            let (r, c) = self.to_render_coord(rendered, self.size - 1, flip);
            if self.hero_walls_remaining == 0
                || r >= self.size - 1
                || c >= self.size - 1
                || !self.is_wall_slot_legal(r, c, orientation)
            {
                return Err(illegal());
            }
            Ok(self.child_for_wall(r, c, orientation))
        } else {
            let dest = self.to_render_coord(rendered, self.size, flip);
            if !self.legal_pawn_destinations().contains(&dest) {
                return Err(illegal());
            }
            Ok(self.child_for_pawn_move(dest))
        }
    }

    fn render(&self, flip: bool) -> String {
        let mut rows = vec![vec!['.'; self.size]; self.size];
        let hero_render = self.to_render_coord(self.hero_pos, self.size, flip);
        let villain_render = self.to_render_coord(self.villain_pos, self.size, flip);
        rows[hero_render.0][hero_render.1] = 'H';
        rows[villain_render.0][villain_render.1] = 'V';
        let mut out = String::new();
        for row in rows {
            out.push_str(&row.iter().collect::<String>());
            out.push('\n');
        }
        out.push_str(&format!(
            "hero walls: {}, villain walls: {}\n",
            self.hero_walls_remaining, self.villain_walls_remaining
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_has_expected_starting_positions() {
        let state = CorridorsState::new(9, 10).unwrap();
        assert_eq!(state.hero_pos(), (8, 4));
        assert_eq!(state.villain_pos(), (0, 4));
        assert_eq!(state.hero_walls_remaining(), 10);
        assert_eq!(state.villain_walls_remaining(), 10);
        assert!(!state.is_terminal());
    }

    #[test]
    fn rejects_even_or_tiny_board_sizes() {
        assert!(CorridorsState::new(8, 10).is_err());
        assert!(CorridorsState::new(1, 10).is_err());
    }

    #[test]
    fn legal_moves_from_start_include_simple_step() {
        let state = CorridorsState::new(9, 10).unwrap();
        let mut children = Vec::new();
        state.legal_moves(&mut |c| children.push(c));
        let forward = state.child_for_pawn_move((7, 4));
        assert!(children.contains(&forward));
    }

    #[test]
    fn pawn_move_swaps_and_mirrors_perspective() {
        let state = CorridorsState::new(9, 10).unwrap();
        let child = state.child_for_pawn_move((7, 4));
        // New hero is old villain, mirrored: (0,4) -> (8,4).
        assert_eq!(child.hero_pos(), (8, 4));
        // New villain is hero's post-move position, mirrored: (7,4) -> (1,4).
        assert_eq!(child.villain_pos(), (1, 4));
        assert!(child.flip());
    }

    #[test]
    fn jump_over_adjacent_opponent_is_legal() {
        let close = CorridorsState::from_raw_parts(
            9,
            (4, 4),
            (3, 4),
            10,
            10,
            vec![false; 8 * 9],
            vec![false; 9 * 8],
            vec![false; 8 * 8],
            false,
        );
        let dests = close.legal_pawn_destinations();
        assert!(dests.contains(&(2, 4)));
    }

    #[test]
    fn diagonal_jump_when_straight_jump_is_blocked() {
        // Wall behind the villain (row boundary 2/3 fully blocked at col 4)
        // forces the straight jump destination (2,4) to be unreachable,
        // so hero should be able to jump diagonally instead.
        let mut h = vec![false; 8 * 9];
        h[2 * 9 + 3] = true;
        h[2 * 9 + 4] = true;
        let close = CorridorsState::from_raw_parts(
            9,
            (4, 4),
            (3, 4),
            10,
            10,
            h,
            vec![false; 9 * 8],
            vec![false; 8 * 8],
            false,
        );
        let dests = close.legal_pawn_destinations();
        assert!(!dests.contains(&(2, 4)));
        assert!(dests.contains(&(3, 3)) || dests.contains(&(3, 5)));
    }

    #[test]
    fn wall_placement_consumes_a_wall_and_mirrors_bitmaps() {
        let state = CorridorsState::new(9, 10).unwrap();
        let child = state.child_for_wall(4, 4, WallOrientation::Horizontal);
        assert_eq!(child.villain_walls_remaining(), 9);
        assert!(child.wall_middles[mirror_slot_index(4, 4, 9)]);
    }

    fn mirror_slot_index(r: usize, c: usize, size: usize) -> usize {
        ((size - 2) - r) * (size - 1) + c
    }

    #[test]
    fn overlapping_wall_slot_is_illegal() {
        let state = CorridorsState::new(9, 10).unwrap();
        let child = state.child_for_wall(4, 4, WallOrientation::Horizontal);
        // In child's (mirrored) frame, the occupied slot is no longer legal.
        let occupied = mirror_slot_index(4, 4, 9);
        let r = occupied / (9 - 1);
        let c = occupied % (9 - 1);
        assert!(!child.is_wall_slot_legal(r, c, WallOrientation::Horizontal));
        assert!(!child.is_wall_slot_legal(r, c, WallOrientation::Vertical));
    }

    #[test]
    fn wall_sealing_off_a_path_is_illegal() {
        let mut state = CorridorsState::new(9, 10).unwrap();
        // Wall off the entire row-4 boundary slot by slot; the last slot
        // that would seal the only remaining gap must be rejected.
        let slots: Vec<usize> = (0..8).collect();
        let mut legal_count = 0;
        for &c in &slots {
            if state.is_wall_slot_legal(4, c, WallOrientation::Horizontal) {
                state = state.child_for_wall(4, c, WallOrientation::Horizontal);
                // child is now villain's move in a mirrored frame; immediately
                // flip back conceptually by re-deriving coordinates is unnecessary
                // for this monotonic sealing test since mirroring preserves
                // connectivity structure either way.
                legal_count += 1;
            }
        }
        assert!(legal_count < 8, "a fully sealed row must reject at least one slot");
    }

    #[test]
    fn action_text_round_trips_through_apply_action_text() {
        let state = CorridorsState::new(9, 10).unwrap();
        let mut children = Vec::new();
        state.legal_moves(&mut |c| children.push(c));
        for child in &children {
            let text = state.action_text(child, true);
            let parsed = state.apply_action_text(&text, true).unwrap();
            assert_eq!(&parsed, child);
        }
    }

    #[test]
    fn no_walls_left_for_villain_with_hero_shorter_path_is_decided() {
        let state = CorridorsState::from_raw_parts(
            9,
            (1, 4),
            (5, 4),
            10,
            0,
            vec![false; 8 * 9],
            vec![false; 9 * 8],
            vec![false; 8 * 8],
            false,
        );
        assert_eq!(state.check_non_terminal_eval(), Some(1.0));
    }

    #[test]
    fn villain_reaching_goal_row_is_terminal_loss_for_hero_to_move() {
        let state = CorridorsState::from_raw_parts(
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
        assert!(state.is_terminal());
        assert_eq!(state.terminal_value(), -1.0);
    }
}
