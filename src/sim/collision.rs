//! Collision detection and response
//!
//! Circle-circle pairs get the exact distance test; everything else goes
//! through a bounding-circle pre-check and then a separating-axis test that
//! also yields the minimum translation vector for response.

use glam::Vec2;

use super::shape::{Extent, Shape};
use super::state::MergeEvent;

/// A detected overlap between two shapes.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Unit normal pointing from shape `a` toward shape `b`.
    pub normal: Vec2,
    /// Overlap depth along the normal.
    pub penetration: f32,
    /// Contact point: the boundary point on the center-to-center segment,
    /// weighted by bounding radii.
    pub point: Vec2,
}

/// Exact overlap test returning contact data, or `None` when separated.
pub fn contact(ea: Extent, pa: Vec2, eb: Extent, pb: Vec2) -> Option<Contact> {
    if let (Extent::Circle { radius: ra }, Extent::Circle { radius: rb }) = (ea, eb) {
        return circle_circle(pa, ra, pb, rb);
    }

    // Broad phase: bounding circles
    let ra = ea.bounding_radius();
    let rb = eb.bounding_radius();
    let d2 = (pb - pa).length_squared();
    let reach = ra + rb;
    if d2 >= reach * reach {
        return None;
    }

    sat_contact(ea, pa, eb, pb).map(|(normal, penetration)| Contact {
        normal,
        penetration,
        point: boundary_point(pa, ra, pb, rb),
    })
}

fn circle_circle(pa: Vec2, ra: f32, pb: Vec2, rb: f32) -> Option<Contact> {
    let delta = pb - pa;
    let dist = delta.length();
    let overlap = ra + rb - dist;
    if overlap <= 0.0 {
        return None;
    }
    // Coincident centers: pick an arbitrary axis
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };
    Some(Contact {
        normal,
        penetration: overlap,
        point: pa + normal * (ra - overlap * 0.5),
    })
}

fn boundary_point(pa: Vec2, ra: f32, pb: Vec2, rb: f32) -> Vec2 {
    let t = if ra + rb > 1e-6 { ra / (ra + rb) } else { 0.5 };
    pa + (pb - pa) * t
}

/// Separating-axis test over both shapes' edge normals (plus the
/// closest-vertex axis when one side is a circle). Returns the minimum
/// translation axis oriented from `a` to `b` and the overlap depth.
fn sat_contact(ea: Extent, pa: Vec2, eb: Extent, pb: Vec2) -> Option<(Vec2, f32)> {
    let mut axes = [Vec2::ZERO; 9];
    let mut n_axes = 0;

    let poly_a = ea.polygon(pa);
    let poly_b = eb.polygon(pb);

    for poly in [&poly_a, &poly_b].into_iter().flatten() {
        let (verts, n) = *poly;
        for i in 0..n {
            let edge = verts[(i + 1) % n] - verts[i];
            let normal = Vec2::new(-edge.y, edge.x).normalize_or_zero();
            if normal != Vec2::ZERO {
                axes[n_axes] = normal;
                n_axes += 1;
            }
        }
    }

    // Circle vs polygon: the axis toward the closest vertex matters too
    if poly_a.is_none()
        && let Some(axis) = closest_vertex_axis(pa, &poly_b)
    {
        axes[n_axes] = axis;
        n_axes += 1;
    }
    if poly_b.is_none()
        && let Some(axis) = closest_vertex_axis(pb, &poly_a)
    {
        axes[n_axes] = axis;
        n_axes += 1;
    }

    let mut best_axis = Vec2::ZERO;
    let mut best_overlap = f32::MAX;

    for axis in &axes[..n_axes] {
        let (min_a, max_a) = project(ea, pa, *axis);
        let (min_b, max_b) = project(eb, pb, *axis);
        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if overlap <= 0.0 {
            return None;
        }
        if overlap < best_overlap {
            best_overlap = overlap;
            best_axis = *axis;
        }
    }

    // Orient the axis from a toward b
    if best_axis.dot(pb - pa) < 0.0 {
        best_axis = -best_axis;
    }
    Some((best_axis, best_overlap))
}

fn closest_vertex_axis(center: Vec2, poly: &Option<([Vec2; 4], usize)>) -> Option<Vec2> {
    let (verts, n) = (*poly)?;
    let closest = verts[..n]
        .iter()
        .min_by(|a, b| {
            (**a - center)
                .length_squared()
                .partial_cmp(&(**b - center).length_squared())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()?;
    let axis = (closest - center).normalize_or_zero();
    (axis != Vec2::ZERO).then_some(axis)
}

fn project(extent: Extent, pos: Vec2, axis: Vec2) -> (f32, f32) {
    match extent.polygon(pos) {
        None => {
            let c = pos.dot(axis);
            let r = extent.bounding_radius();
            (c - r, c + r)
        }
        Some((verts, n)) => {
            let mut min = f32::MAX;
            let mut max = f32::MIN;
            for v in &verts[..n] {
                let d = v.dot(axis);
                min = min.min(d);
                max = max.max(d);
            }
            (min, max)
        }
    }
}

/// Elastic bounce between two unlike-colored shapes.
///
/// Masses are area-proportional; a dragged shape is treated as infinitely
/// massive so the pointer keeps authority over its position.
pub fn resolve_bounce(a: &mut Shape, b: &mut Shape, c: &Contact, restitution: f32) {
    let inv_a = if a.dragged { 0.0 } else { 1.0 / a.area() };
    let inv_b = if b.dragged { 0.0 } else { 1.0 / b.area() };
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    let n = c.normal;
    let vn = (b.vel - a.vel).dot(n);
    // Impulse only when approaching; separation happens regardless
    if vn < 0.0 {
        let j = -(1.0 + restitution) * vn / inv_sum;
        a.vel -= n * (j * inv_a);
        b.vel += n * (j * inv_b);
    }

    // Positional correction removes the overlap, split by inverse mass
    let push = c.penetration / inv_sum;
    a.pos -= n * (push * inv_a);
    b.pos += n * (push * inv_b);
}

/// Merge two like-colored shapes: the smaller-area shape dies, the survivor
/// grows to the combined area, moves to the contact point, and takes the
/// momentum-weighted velocity.
pub fn merge_pair(a: &mut Shape, b: &mut Shape, c: &Contact) -> MergeEvent {
    debug_assert_eq!(a.color, b.color);

    let (ma, mb) = (a.area(), b.area());
    let total_area = ma + mb;
    let momentum = a.vel * ma + b.vel * mb;

    let a_survives = ma > mb || (ma == mb && a.id < b.id);
    let (survivor, victim) = if a_survives { (a, b) } else { (b, a) };

    survivor.extent = survivor.extent.scaled_to_area(total_area);
    survivor.pos = c.point;
    survivor.vel = momentum / total_area;
    victim.alive = false;

    MergeEvent {
        survivor: survivor.id,
        absorbed: victim.id,
        color: survivor.color,
        point: c.point,
        area: total_area,
    }
}
