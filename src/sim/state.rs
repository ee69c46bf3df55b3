//! Board state and session types
//!
//! A `Board` is the single mutable play surface, owned exclusively by one
//! session. It is hydrated from an immutable validated `Level` and advanced
//! tick by tick; WON and LOST are terminal.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generation::validator::{self, ContactModel, Piece, Solvability};
use crate::level::Level;
use crate::palette::Color;
use crate::sim::shape::Shape;

/// Session state. No transition leaves WON or LOST; restarting builds a
/// fresh board from the stored level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Playing,
    Won,
    Lost,
}

/// Ephemeral record of one merge, for animation and testing hooks.
/// Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeEvent {
    pub survivor: u32,
    pub absorbed: u32,
    pub color: Color,
    /// Contact midpoint where the survivor ends up.
    pub point: Vec2,
    /// Combined area after the merge.
    pub area: f32,
}

/// Fixed rectangular play surface, origin top-left, +y down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Clamp a point into the bounds, keeping `half` extents of slack.
    pub fn clamp(&self, p: Vec2, half: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(half.x, (self.width - half.x).max(half.x)),
            p.y.clamp(half.y, (self.height - half.y).max(half.y)),
        )
    }

    /// Whether a shape with the given half extents fits entirely inside.
    pub fn contains(&self, p: Vec2, half: Vec2) -> bool {
        p.x - half.x >= 0.0
            && p.y - half.y >= 0.0
            && p.x + half.x <= self.width
            && p.y + half.y <= self.height
    }
}

/// Drag command for one tick: the pointer position the held shape follows.
#[derive(Debug, Clone, Copy)]
pub struct DragInput {
    pub shape_id: u32,
    pub pointer: Vec2,
}

/// Input for a single tick. Absent drag means nothing is held; a shape that
/// was held last tick is released with its estimated throw velocity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub drag: Option<DragInput>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct DragState {
    pub shape_id: u32,
}

/// The play surface: bounds, border color, palette, and the live shape set
/// ordered by creation.
#[derive(Debug, Clone)]
pub struct Board {
    pub bounds: Bounds,
    pub border_color: Color,
    pub palette: Vec<Color>,
    pub shapes: Vec<Shape>,
    pub phase: SessionPhase,
    /// Color of the most recent merge, if any (background tint hook).
    pub last_merged: Option<Color>,
    /// Merge events from the most recent tick.
    pub merge_events: Vec<MergeEvent>,
    pub(crate) drag: Option<DragState>,
}

impl Board {
    /// Hydrate a fresh board from a validated level.
    ///
    /// Only structural checks run here: solvability was proven at generation
    /// time and is never re-checked on load. A record that fails the
    /// structural checks refuses to start a session rather than silently
    /// repositioning shapes.
    pub fn from_level(level: &Level) -> Result<Board> {
        level.structural_check()?;

        let shapes: Vec<Shape> = level
            .placements
            .iter()
            .map(|p| Shape::new(p.id, p.color, p.extent, p.pos))
            .collect();

        log::info!(
            "session start: {} shapes, border {}, strategy {:?}, seed {}",
            shapes.len(),
            level.border_color.as_str(),
            level.strategy,
            level.seed
        );

        Ok(Board {
            bounds: level.bounds,
            border_color: level.border_color,
            palette: level.palette.clone(),
            shapes,
            phase: SessionPhase::Playing,
            last_merged: None,
            merge_events: Vec::new(),
            drag: None,
        })
    }

    /// Build a board directly from shapes. Test and tooling entry point;
    /// levels produced by the generator go through [`Board::from_level`].
    pub fn from_shapes(
        bounds: Bounds,
        border_color: Color,
        palette: Vec<Color>,
        shapes: Vec<Shape>,
    ) -> Board {
        Board {
            bounds,
            border_color,
            palette,
            shapes,
            phase: SessionPhase::Playing,
            last_merged: None,
            merge_events: Vec::new(),
            drag: None,
        }
    }

    pub fn live_shapes(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.alive)
    }

    pub fn live_count(&self) -> usize {
        self.shapes.iter().filter(|s| s.alive).count()
    }

    pub fn shape(&self, id: u32) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Topmost live shape containing the point, in reverse creation order.
    /// Callers translate a pointer-down into a [`DragInput`] with this.
    pub fn pick_shape_at(&self, p: Vec2) -> Option<u32> {
        self.shapes
            .iter()
            .rev()
            .find(|s| s.alive && s.contains_point(p))
            .map(|s| s.id)
    }

    /// Take the merge events accumulated by the last tick.
    pub fn drain_merge_events(&mut self) -> Vec<MergeEvent> {
        std::mem::take(&mut self.merge_events)
    }

    /// Re-run the solvability search over the current live set. Used for
    /// mid-play "level impossible" feedback; expensive, so callers invoke it
    /// after merges rather than every tick.
    pub fn is_dead_end(&self) -> bool {
        if self.phase != SessionPhase::Playing || self.live_count() < 2 {
            return false;
        }
        let pieces: Vec<Piece> = self.live_shapes().map(Piece::from_shape).collect();
        match validator::validate(
            &pieces,
            self.border_color,
            &self.palette,
            ContactModel::Universal,
        ) {
            Ok(Solvability::Unwinnable) => true,
            Ok(Solvability::Winnable) => false,
            Err(e) => {
                log::warn!("dead-end check skipped: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::generation::StrategyId;
    use crate::level::Placement;
    use crate::sim::shape::Extent;

    fn level_with(placements: Vec<Placement>) -> Level {
        Level {
            seed: 1,
            strategy: StrategyId::FibonacciSpiral,
            border_color: Color::Mint,
            bounds: Bounds::new(800.0, 600.0),
            palette: vec![Color::Mint, Color::Pink],
            placements,
        }
    }

    fn placement(id: u32, color: Color, pos: Vec2) -> Placement {
        Placement {
            id,
            color,
            extent: Extent::Circle { radius: 20.0 },
            pos,
        }
    }

    #[test]
    fn test_from_level_hydrates_shapes() {
        let level = level_with(vec![
            placement(1, Color::Mint, Vec2::new(100.0, 100.0)),
            placement(2, Color::Pink, Vec2::new(300.0, 200.0)),
        ]);
        let board = Board::from_level(&level).unwrap();
        assert_eq!(board.live_count(), 2);
        assert_eq!(board.phase, SessionPhase::Playing);
        assert_eq!(board.shape(1).unwrap().vel, Vec2::ZERO);
    }

    #[test]
    fn test_from_level_rejects_out_of_bounds() {
        let level = level_with(vec![
            placement(1, Color::Mint, Vec2::new(100.0, 100.0)),
            placement(2, Color::Pink, Vec2::new(795.0, 200.0)),
        ]);
        assert!(matches!(
            Board::from_level(&level),
            Err(Error::CorruptLevel(_))
        ));
    }

    #[test]
    fn test_from_level_rejects_single_shape() {
        let level = level_with(vec![placement(1, Color::Mint, Vec2::new(100.0, 100.0))]);
        assert!(matches!(
            Board::from_level(&level),
            Err(Error::CorruptLevel(_))
        ));
    }

    #[test]
    fn test_from_level_rejects_out_of_palette_color() {
        let level = level_with(vec![
            placement(1, Color::Mint, Vec2::new(100.0, 100.0)),
            placement(2, Color::Violet, Vec2::new(300.0, 200.0)),
        ]);
        assert!(matches!(
            Board::from_level(&level),
            Err(Error::CorruptLevel(_))
        ));
    }

    #[test]
    fn test_pick_shape_prefers_newest() {
        let level = level_with(vec![
            placement(1, Color::Mint, Vec2::new(100.0, 100.0)),
            placement(2, Color::Pink, Vec2::new(110.0, 100.0)),
        ]);
        let board = Board::from_level(&level).unwrap();
        // The overlap region belongs to the later-created shape
        assert_eq!(board.pick_shape_at(Vec2::new(105.0, 100.0)), Some(2));
        assert_eq!(board.pick_shape_at(Vec2::new(85.0, 100.0)), Some(1));
        assert_eq!(board.pick_shape_at(Vec2::new(400.0, 400.0)), None);
    }

    #[test]
    fn test_dead_end_detection() {
        let bounds = Bounds::new(800.0, 600.0);
        let palette = vec![Color::Mint, Color::Pink];
        let mk = |id, color, x| {
            Shape::new(
                id,
                color,
                Extent::Circle { radius: 20.0 },
                Vec2::new(x, 100.0),
            )
        };

        // Mixed colors can never reduce to one shape
        let board = Board::from_shapes(
            bounds,
            Color::Mint,
            palette.clone(),
            vec![mk(1, Color::Mint, 100.0), mk(2, Color::Pink, 300.0)],
        );
        assert!(board.is_dead_end());

        // Monochrome border-colored board is fine
        let board = Board::from_shapes(
            bounds,
            Color::Mint,
            palette,
            vec![mk(1, Color::Mint, 100.0), mk(2, Color::Mint, 300.0)],
        );
        assert!(!board.is_dead_end());
    }
}
