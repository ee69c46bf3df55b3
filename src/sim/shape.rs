//! The shape model: pure data plus geometry queries
//!
//! A shape is a tagged variant (circle, square, triangle, rectangle) with
//! per-kind size parameters. Geometry queries are deterministic and have no
//! side effects; all mutation happens in the tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::palette::Color;
use crate::sim::collision;

/// Shape kind tag. Fixed at creation; merges keep the survivor's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Rectangle,
}

/// Size parameters per kind. Implies the kind tag.
///
/// Triangles are isosceles, apex up, centered on their bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Extent {
    Circle { radius: f32 },
    Square { side: f32 },
    Triangle { base: f32, height: f32 },
    Rectangle { width: f32, height: f32 },
}

impl Extent {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Extent::Circle { .. } => ShapeKind::Circle,
            Extent::Square { .. } => ShapeKind::Square,
            Extent::Triangle { .. } => ShapeKind::Triangle,
            Extent::Rectangle { .. } => ShapeKind::Rectangle,
        }
    }

    /// Exact area, used for the merge conservation rule and the mass model.
    pub fn area(&self) -> f32 {
        match *self {
            Extent::Circle { radius } => std::f32::consts::PI * radius * radius,
            Extent::Square { side } => side * side,
            Extent::Triangle { base, height } => base * height * 0.5,
            Extent::Rectangle { width, height } => width * height,
        }
    }

    /// Radius of the smallest center-circle containing the shape.
    /// Used as a broad-phase pre-check and for wall clamping slack.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Extent::Circle { radius } => radius,
            Extent::Square { side } => side * std::f32::consts::FRAC_1_SQRT_2,
            Extent::Triangle { base, height } => {
                let hb = base * 0.5;
                let hh = height * 0.5;
                // Farthest vertex from the bbox center (apex or a base corner)
                hh.max((hb * hb + hh * hh).sqrt())
            }
            Extent::Rectangle { width, height } => {
                0.5 * (width * width + height * height).sqrt()
            }
        }
    }

    /// Half width/height of the axis-aligned bounding box.
    pub fn half_extents(&self) -> Vec2 {
        match *self {
            Extent::Circle { radius } => Vec2::splat(radius),
            Extent::Square { side } => Vec2::splat(side * 0.5),
            Extent::Triangle { base, height } => Vec2::new(base * 0.5, height * 0.5),
            Extent::Rectangle { width, height } => Vec2::new(width * 0.5, height * 0.5),
        }
    }

    /// Uniformly rescale so that `area()` equals `target`. Kind is preserved.
    pub fn scaled_to_area(&self, target: f32) -> Extent {
        let current = self.area();
        if current <= 0.0 || target <= 0.0 {
            return *self;
        }
        let k = (target / current).sqrt();
        match *self {
            Extent::Circle { radius } => Extent::Circle { radius: radius * k },
            Extent::Square { side } => Extent::Square { side: side * k },
            Extent::Triangle { base, height } => Extent::Triangle {
                base: base * k,
                height: height * k,
            },
            Extent::Rectangle { width, height } => Extent::Rectangle {
                width: width * k,
                height: height * k,
            },
        }
    }

    /// All size parameters strictly positive.
    pub fn is_positive(&self) -> bool {
        match *self {
            Extent::Circle { radius } => radius > 0.0,
            Extent::Square { side } => side > 0.0,
            Extent::Triangle { base, height } => base > 0.0 && height > 0.0,
            Extent::Rectangle { width, height } => width > 0.0 && height > 0.0,
        }
    }

    /// World-space vertices for polygon kinds; `None` for circles.
    /// Shapes never rotate, so vertices are axis-aligned offsets from `pos`.
    pub(crate) fn polygon(&self, pos: Vec2) -> Option<([Vec2; 4], usize)> {
        match *self {
            Extent::Circle { .. } => None,
            Extent::Square { side } => {
                let h = side * 0.5;
                Some((
                    [
                        pos + Vec2::new(-h, -h),
                        pos + Vec2::new(h, -h),
                        pos + Vec2::new(h, h),
                        pos + Vec2::new(-h, h),
                    ],
                    4,
                ))
            }
            Extent::Triangle { base, height } => {
                let hb = base * 0.5;
                let hh = height * 0.5;
                Some((
                    [
                        pos + Vec2::new(0.0, -hh),
                        pos + Vec2::new(hb, hh),
                        pos + Vec2::new(-hb, hh),
                        Vec2::ZERO,
                    ],
                    3,
                ))
            }
            Extent::Rectangle { width, height } => {
                let hw = width * 0.5;
                let hh = height * 0.5;
                Some((
                    [
                        pos + Vec2::new(-hw, -hh),
                        pos + Vec2::new(hw, -hh),
                        pos + Vec2::new(hw, hh),
                        pos + Vec2::new(-hw, hh),
                    ],
                    4,
                ))
            }
        }
    }
}

/// A playable piece on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
    /// Stable unique id, assigned at creation, never reused while alive.
    pub id: u32,
    pub color: Color,
    pub extent: Extent,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Dead shapes have merged into another and never come back.
    pub alive: bool,
    /// Held by the pointer; skips physics integration this tick.
    #[serde(skip)]
    pub dragged: bool,
}

impl Shape {
    pub fn new(id: u32, color: Color, extent: Extent, pos: Vec2) -> Self {
        Self {
            id,
            color,
            extent,
            pos,
            vel: Vec2::ZERO,
            alive: true,
            dragged: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        self.extent.kind()
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.extent.area()
    }

    #[inline]
    pub fn bounding_radius(&self) -> f32 {
        self.extent.bounding_radius()
    }

    /// Exact geometric overlap test. Symmetric: `a.overlaps(b) == b.overlaps(a)`.
    pub fn overlaps(&self, other: &Shape) -> bool {
        collision::contact(self.extent, self.pos, other.extent, other.pos).is_some()
    }

    /// Exact point containment, used for drag pick-up.
    pub fn contains_point(&self, p: Vec2) -> bool {
        let d = p - self.pos;
        match self.extent {
            Extent::Circle { radius } => d.length_squared() < radius * radius,
            Extent::Square { side } => {
                let h = side * 0.5;
                d.x.abs() < h && d.y.abs() < h
            }
            Extent::Rectangle { width, height } => {
                d.x.abs() < width * 0.5 && d.y.abs() < height * 0.5
            }
            Extent::Triangle { .. } => {
                let (verts, _) = self.extent.polygon(self.pos).unwrap();
                point_in_triangle(p, verts[0], verts[1], verts[2])
            }
        }
    }
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let sign = |p1: Vec2, p2: Vec2, p3: Vec2| {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}
