//! Merge-order solvability search
//!
//! Decides whether a set of colored pieces can be reduced to a single piece
//! of the border color through some sequence of same-color merges. The
//! search abstracts physics away entirely: a piece is just a color plus a
//! neighbor set, and merging two neighbors produces one piece of the same
//! color whose neighbor set is the union of both.
//!
//! Piece identity is a bit index, so the whole state fits in a `u64` live
//! mask plus one adjacency mask per piece. States are memoized and the
//! search carries a hard expansion budget; exhausting the budget reports
//! `Unwinnable`, which is the conservative answer for a generator that will
//! simply try another seed.

use std::collections::HashSet;

use glam::Vec2;

use crate::consts::{MAX_VALIDATOR_SHAPES, VALIDATOR_STATE_BUDGET};
use crate::error::{Error, Result};
use crate::level::Placement;
use crate::palette::Color;
use crate::sim::shape::Shape;

/// Physics-free abstraction of a shape for the solvability search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Piece {
    pub color: Color,
    pub pos: Vec2,
    pub radius: f32,
}

impl Piece {
    pub fn from_placement(p: &Placement) -> Self {
        Piece {
            color: p.color,
            pos: p.pos,
            radius: p.extent.bounding_radius(),
        }
    }

    pub fn from_shape(s: &Shape) -> Self {
        Piece {
            color: s.color,
            pos: s.pos,
            radius: s.bounding_radius(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solvability {
    Winnable,
    Unwinnable,
}

/// Which pairs count as mergeable neighbors.
///
/// `Universal` reflects drag controls: the player can carry any shape to any
/// other, so every pair is adjacent. `Proximity` restricts merges to pieces
/// whose bounding circles sit within `max_gap` of each other, for rule sets
/// without free dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactModel {
    Universal,
    Proximity { max_gap: f32 },
}

/// Search for a merge order ending in one border-colored piece.
pub fn validate(
    pieces: &[Piece],
    border_color: Color,
    palette: &[Color],
    model: ContactModel,
) -> Result<Solvability> {
    if pieces.len() < 2 {
        return Err(Error::Precondition(format!(
            "{} pieces, need at least 2",
            pieces.len()
        )));
    }
    if pieces.len() > MAX_VALIDATOR_SHAPES {
        return Err(Error::Precondition(format!(
            "{} pieces exceeds the {MAX_VALIDATOR_SHAPES} ceiling",
            pieces.len()
        )));
    }
    if palette.is_empty() {
        return Err(Error::Precondition("empty palette".into()));
    }
    if !palette.contains(&border_color) {
        return Err(Error::Precondition(format!(
            "border color {} not in palette",
            border_color.as_str()
        )));
    }
    for (i, p) in pieces.iter().enumerate() {
        if !palette.contains(&p.color) {
            return Err(Error::Precondition(format!(
                "piece {i} color {} not in palette",
                p.color.as_str()
            )));
        }
    }

    let n = pieces.len();
    let colors: Vec<Color> = pieces.iter().map(|p| p.color).collect();
    let mut adjacency = vec![0u64; n];
    for i in 0..n {
        for j in (i + 1)..n {
            if adjacent(&pieces[i], &pieces[j], model) {
                adjacency[i] |= 1 << j;
                adjacency[j] |= 1 << i;
            }
        }
    }

    let live: u64 = if n == 64 { u64::MAX } else { (1 << n) - 1 };
    let mut search = Search {
        colors,
        border_color,
        memo: HashSet::new(),
        expanded: 0,
        exhausted: false,
    };
    let winnable = search.run(live, &adjacency);
    if search.exhausted && !winnable {
        log::warn!(
            "solvability search exhausted its {VALIDATOR_STATE_BUDGET} state budget \
             on {n} pieces, reporting unwinnable"
        );
    }
    log::debug!(
        "solvability: {n} pieces, {} states expanded, {:?}",
        search.expanded,
        if winnable {
            Solvability::Winnable
        } else {
            Solvability::Unwinnable
        }
    );

    Ok(if winnable {
        Solvability::Winnable
    } else {
        Solvability::Unwinnable
    })
}

fn adjacent(a: &Piece, b: &Piece, model: ContactModel) -> bool {
    match model {
        ContactModel::Universal => true,
        ContactModel::Proximity { max_gap } => {
            let gap = (a.pos - b.pos).length() - a.radius - b.radius;
            gap <= max_gap
        }
    }
}

struct Search {
    colors: Vec<Color>,
    border_color: Color,
    memo: HashSet<(u64, Vec<u64>)>,
    expanded: u32,
    exhausted: bool,
}

impl Search {
    fn run(&mut self, live: u64, adjacency: &[u64]) -> bool {
        if live.count_ones() == 1 {
            let last = live.trailing_zeros() as usize;
            return self.colors[last] == self.border_color;
        }
        if self.expanded >= VALIDATOR_STATE_BUDGET {
            self.exhausted = true;
            return false;
        }

        let key = (
            live,
            adjacency
                .iter()
                .enumerate()
                .map(|(i, &m)| if live & (1 << i) != 0 { m & live } else { 0 })
                .collect::<Vec<u64>>(),
        );
        if !self.memo.insert(key) {
            return false;
        }
        self.expanded += 1;

        let n = adjacency.len();
        for i in 0..n {
            if live & (1 << i) == 0 {
                continue;
            }
            let mut partners = adjacency[i] & live & !((1u64 << i) | ((1u64 << i) - 1));
            while partners != 0 {
                let j = partners.trailing_zeros() as usize;
                partners &= partners - 1;
                if self.colors[i] != self.colors[j] {
                    continue;
                }

                // Merge j into i: the survivor inherits both neighbor sets
                let next_live = live & !(1u64 << j);
                let mut next_adj = adjacency.to_vec();
                next_adj[i] = (next_adj[i] | next_adj[j]) & !((1u64 << i) | (1u64 << j));
                next_adj[j] = 0;
                for (k, mask) in next_adj.iter_mut().enumerate() {
                    if k != i && *mask & (1u64 << j) != 0 {
                        *mask = (*mask & !(1u64 << j)) | (1u64 << i);
                    }
                }

                if self.run(next_live, &next_adj) {
                    return true;
                }
                if self.exhausted {
                    return false;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(color: Color, x: f32) -> Piece {
        Piece {
            color,
            pos: Vec2::new(x, 100.0),
            radius: 20.0,
        }
    }

    #[test]
    fn test_same_color_pair_is_winnable() {
        let pieces = [piece(Color::Mint, 100.0), piece(Color::Mint, 300.0)];
        let result = validate(
            &pieces,
            Color::Mint,
            &[Color::Mint],
            ContactModel::Universal,
        )
        .unwrap();
        assert_eq!(result, Solvability::Winnable);
    }

    #[test]
    fn test_differing_pair_is_unwinnable() {
        let pieces = [piece(Color::Mint, 100.0), piece(Color::Pink, 300.0)];
        let result = validate(
            &pieces,
            Color::Mint,
            &[Color::Mint, Color::Pink],
            ContactModel::Universal,
        )
        .unwrap();
        assert_eq!(result, Solvability::Unwinnable);
    }

    #[test]
    fn test_monochrome_chain_is_winnable() {
        let pieces: Vec<Piece> = (0..8).map(|i| piece(Color::Gold, i as f32 * 60.0)).collect();
        let result = validate(
            &pieces,
            Color::Gold,
            &[Color::Gold],
            ContactModel::Universal,
        )
        .unwrap();
        assert_eq!(result, Solvability::Winnable);
    }

    #[test]
    fn test_wrong_final_color_is_unwinnable() {
        // All pieces merge fine, but the survivor is not the border color
        let pieces = [piece(Color::Pink, 100.0), piece(Color::Pink, 300.0)];
        let result = validate(
            &pieces,
            Color::Mint,
            &[Color::Mint, Color::Pink],
            ContactModel::Universal,
        )
        .unwrap();
        assert_eq!(result, Solvability::Unwinnable);
    }

    #[test]
    fn test_proximity_model_gates_merges() {
        // Two border-colored pieces far apart, radius 20 each: gap is 160
        let pieces = [piece(Color::Mint, 100.0), piece(Color::Mint, 300.0)];

        let near = validate(
            &pieces,
            Color::Mint,
            &[Color::Mint],
            ContactModel::Proximity { max_gap: 200.0 },
        )
        .unwrap();
        assert_eq!(near, Solvability::Winnable);

        let far = validate(
            &pieces,
            Color::Mint,
            &[Color::Mint],
            ContactModel::Proximity { max_gap: 50.0 },
        )
        .unwrap();
        assert_eq!(far, Solvability::Unwinnable);
    }

    #[test]
    fn test_proximity_island_blocks_the_bridge() {
        // a-b adjacent, c isolated: a and b merge but c can never join
        let pieces = [
            piece(Color::Mint, 100.0),
            piece(Color::Mint, 150.0),
            piece(Color::Mint, 700.0),
        ];
        let result = validate(
            &pieces,
            Color::Mint,
            &[Color::Mint],
            ContactModel::Proximity { max_gap: 30.0 },
        )
        .unwrap();
        assert_eq!(result, Solvability::Unwinnable);
    }

    #[test]
    fn test_preconditions() {
        let one = [piece(Color::Mint, 100.0)];
        assert!(matches!(
            validate(&one, Color::Mint, &[Color::Mint], ContactModel::Universal),
            Err(Error::Precondition(_))
        ));

        let two = [piece(Color::Mint, 100.0), piece(Color::Mint, 300.0)];
        assert!(matches!(
            validate(&two, Color::Mint, &[], ContactModel::Universal),
            Err(Error::Precondition(_))
        ));
        assert!(matches!(
            validate(&two, Color::Pink, &[Color::Mint], ContactModel::Universal),
            Err(Error::Precondition(_))
        ));
    }
}
