//! Procedural placement strategies
//!
//! Five spatial-pattern algorithms, each a pure function of
//! `(seed, bounds, shape_count, palette)`. Determinism is a replayability
//! requirement: the same inputs must yield the same placement list, so all
//! randomness comes from a `Pcg32` seeded from the level seed.
//!
//! Every strategy guarantees: shapes fully inside the bounds, minimum
//! spawn separation (enforced by jittered resampling), and reproducible
//! color/kind/size assignment.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::level::Placement;
use crate::palette::Color;
use crate::sim::shape::Extent;
use crate::sim::state::Bounds;

/// Golden angle in radians (~137.5°).
const GOLDEN_ANGLE: f32 = 2.399_963;

/// The closed set of placement strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyId {
    FractalSpiral,
    FibonacciSpiral,
    OrganicClusters,
    PerlinNoise,
    MandelbrotBoundary,
}

impl StrategyId {
    pub const ALL: [StrategyId; 5] = [
        StrategyId::FractalSpiral,
        StrategyId::FibonacciSpiral,
        StrategyId::OrganicClusters,
        StrategyId::PerlinNoise,
        StrategyId::MandelbrotBoundary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyId::FractalSpiral => "fractal_spiral",
            StrategyId::FibonacciSpiral => "fibonacci_spiral",
            StrategyId::OrganicClusters => "organic_clusters",
            StrategyId::PerlinNoise => "perlin_noise",
            StrategyId::MandelbrotBoundary => "mandelbrot_boundary",
        }
    }
}

/// A raw candidate spot before sizing/coloring. `bias` is a [0, 1] weight
/// some strategies produce (Mandelbrot escape time) to steer size and color;
/// `None` means uniform random assignment.
struct Spot {
    pos: Vec2,
    bias: Option<f32>,
}

/// Run a placement strategy. Deterministic for fixed inputs.
pub fn place(
    strategy: StrategyId,
    seed: u64,
    bounds: &Bounds,
    shape_count: usize,
    palette: &[Color],
) -> Result<Vec<Placement>> {
    if shape_count < 2 {
        return Err(Error::Precondition(format!(
            "shape_count {shape_count} < 2"
        )));
    }
    if shape_count > MAX_VALIDATOR_SHAPES {
        return Err(Error::Precondition(format!(
            "shape_count {shape_count} exceeds the {MAX_VALIDATOR_SHAPES} ceiling"
        )));
    }
    if palette.is_empty() {
        return Err(Error::Precondition("empty palette".into()));
    }
    // <= keeps the cluster-center sampling range non-empty
    if bounds.width <= 4.0 * EDGE_MARGIN || bounds.height <= 4.0 * EDGE_MARGIN {
        return Err(Error::Precondition(format!(
            "bounds {}x{} too small for placement",
            bounds.width, bounds.height
        )));
    }

    let mut rng = Pcg32::seed_from_u64(seed);
    let spots = match strategy {
        StrategyId::FractalSpiral => fractal_spiral(&mut rng, bounds, shape_count),
        StrategyId::FibonacciSpiral => fibonacci_spiral(bounds, shape_count),
        StrategyId::OrganicClusters => organic_clusters(&mut rng, bounds, shape_count),
        StrategyId::PerlinNoise => perlin_noise(&mut rng, seed, bounds, shape_count),
        StrategyId::MandelbrotBoundary => mandelbrot_boundary(&mut rng, bounds, shape_count),
    };

    assemble(&mut rng, bounds, shape_count, palette, spots)
}

/// Size, color, and separate the raw spots into final placements.
fn assemble(
    rng: &mut Pcg32,
    bounds: &Bounds,
    shape_count: usize,
    palette: &[Color],
    spots: Vec<Spot>,
) -> Result<Vec<Placement>> {
    let mut placements: Vec<Placement> = Vec::with_capacity(shape_count);

    for spot in spots {
        if placements.len() == shape_count {
            break;
        }

        let extent = random_extent(rng, spot.bias);
        let color = match spot.bias {
            Some(t) => palette[((t * palette.len() as f32) as usize).min(palette.len() - 1)],
            None => palette[rng.random_range(0..palette.len())],
        };

        let base = clamp_inset(bounds, spot.pos);
        let mut pos = base;
        let mut tries = 0u32;
        // Rejection/resampling keeps the minimum spawn separation
        while !separated(&placements, pos, &extent) {
            if tries == 20 {
                break;
            }
            let scale = 30.0 + 20.0 * tries as f32;
            let jitter = Vec2::new(
                rng.random_range(-1.0..1.0_f32),
                rng.random_range(-1.0..1.0_f32),
            ) * scale;
            pos = clamp_inset(bounds, base + jitter);
            tries += 1;
        }
        if !separated(&placements, pos, &extent) {
            continue;
        }

        placements.push(Placement {
            id: placements.len() as u32 + 1,
            color,
            extent,
            pos,
        });
    }

    // Crowded patterns can reject spots; top up with uniform samples so a
    // dense layout degrades toward uniform placement instead of failing
    let mut tries = 0u32;
    while placements.len() < shape_count && tries < 400 {
        tries += 1;
        let extent = random_extent(rng, None);
        let pos = Vec2::new(
            rng.random_range(EDGE_MARGIN..bounds.width - EDGE_MARGIN),
            rng.random_range(EDGE_MARGIN..bounds.height - EDGE_MARGIN),
        );
        if !separated(&placements, pos, &extent) {
            continue;
        }
        placements.push(Placement {
            id: placements.len() as u32 + 1,
            color: palette[rng.random_range(0..palette.len())],
            extent,
            pos,
        });
    }

    if placements.len() < shape_count {
        return Err(Error::Precondition(format!(
            "placed only {} of {} shapes before running out of room",
            placements.len(),
            shape_count
        )));
    }
    Ok(placements)
}

fn separated(placed: &[Placement], pos: Vec2, extent: &Extent) -> bool {
    let r = extent.bounding_radius();
    placed.iter().all(|p| {
        let min_dist = r + p.extent.bounding_radius() + MIN_SEPARATION;
        (p.pos - pos).length_squared() >= min_dist * min_dist
    })
}

fn clamp_inset(bounds: &Bounds, p: Vec2) -> Vec2 {
    Vec2::new(
        p.x.clamp(EDGE_MARGIN, bounds.width - EDGE_MARGIN),
        p.y.clamp(EDGE_MARGIN, bounds.height - EDGE_MARGIN),
    )
}

fn random_extent(rng: &mut Pcg32, bias: Option<f32>) -> Extent {
    let size = match bias {
        Some(t) => MIN_SHAPE_SIZE + t * (MAX_SHAPE_SIZE - MIN_SHAPE_SIZE),
        None => rng.random_range(MIN_SHAPE_SIZE..MAX_SHAPE_SIZE),
    };
    match rng.random_range(0..4u32) {
        0 => Extent::Circle { radius: size },
        1 => Extent::Square { side: size * 2.0 },
        2 => Extent::Triangle {
            base: size * 2.0,
            height: size * 2.0,
        },
        _ => Extent::Rectangle {
            width: size * 2.0,
            height: size * 1.4,
        },
    }
}

/// Spiral arms with decreasing-radius recursion offsets and seeded jitter.
fn fractal_spiral(rng: &mut Pcg32, bounds: &Bounds, n: usize) -> Vec<Spot> {
    let center = bounds.center();
    let base_radius = bounds.width.min(bounds.height) * 0.25;
    const SPIRAL_FACTOR: f32 = 0.3;
    const FRACTAL_DEPTH: u32 = 3;

    (0..n)
        .map(|i| {
            let angle = (i as f32 / n as f32) * TAU;
            let spiral = 1.0 + i as f32 * SPIRAL_FACTOR;
            let noise = (angle * 3.0).sin() * 30.0 + (angle * 5.0).cos() * 20.0;
            let radius = base_radius * spiral + noise;

            let mut pos = center + Vec2::new(angle.cos(), angle.sin()) * radius;
            pos += recursive_offset(i as u64, FRACTAL_DEPTH);
            pos += Vec2::new(
                rng.random_range(-8.0..8.0_f32),
                rng.random_range(-8.0..8.0_f32),
            );
            Spot { pos, bias: None }
        })
        .collect()
}

/// Sum of golden-angle offsets at halving depth, doubling the index per
/// level so siblings decorrelate.
fn recursive_offset(mut index: u64, depth: u32) -> Vec2 {
    let mut acc = Vec2::ZERO;
    for d in (1..=depth).rev() {
        let base = 40.0 / d as f32;
        let angle = (index as f32 * GOLDEN_ANGLE) % TAU;
        acc += Vec2::new(angle.cos(), angle.sin()) * base;
        index = index.wrapping_mul(2);
    }
    acc
}

/// Golden-angle increments with √index radius growth: naturally even,
/// non-overlapping density.
fn fibonacci_spiral(bounds: &Bounds, n: usize) -> Vec<Spot> {
    let center = bounds.center();
    let step = 15.0 * bounds.width.min(bounds.height) / 600.0;

    (0..n)
        .map(|i| {
            let angle = i as f32 * GOLDEN_ANGLE;
            let radius = step * ((i + 1) as f32).sqrt() * 4.0;
            Spot {
                pos: center + Vec2::new(angle.cos(), angle.sin()) * radius,
                bias: None,
            }
        })
        .collect()
}

/// Shapes sampled around 2-4 Gaussian cluster centers.
fn organic_clusters(rng: &mut Pcg32, bounds: &Bounds, n: usize) -> Vec<Spot> {
    let num_clusters = rng.random_range(2..=4usize);
    let centers: Vec<Vec2> = (0..num_clusters)
        .map(|_| {
            Vec2::new(
                rng.random_range(2.0 * EDGE_MARGIN..bounds.width - 2.0 * EDGE_MARGIN),
                rng.random_range(2.0 * EDGE_MARGIN..bounds.height - 2.0 * EDGE_MARGIN),
            )
        })
        .collect();

    (0..n)
        .map(|i| {
            let center = centers[i % num_clusters];
            let angle = rng.random_range(0.0..TAU);
            let distance = (gaussian(rng) * 60.0).abs().min(120.0);
            Spot {
                pos: center + Vec2::new(angle.cos(), angle.sin()) * distance,
                bias: None,
            }
        })
        .collect()
}

/// Standard normal via Box-Muller.
fn gaussian(rng: &mut Pcg32) -> f32 {
    let u1 = rng.random::<f32>().max(1e-7);
    let u2 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Jittered grid candidates accepted by thresholding a coherent value-noise
/// field, giving smooth density gradients. The threshold relaxes until
/// enough candidates pass.
fn perlin_noise(rng: &mut Pcg32, seed: u64, bounds: &Bounds, n: usize) -> Vec<Spot> {
    let cell = 60.0;
    let cols = ((bounds.width - 2.0 * EDGE_MARGIN) / cell) as i32;
    let rows = ((bounds.height - 2.0 * EDGE_MARGIN) / cell) as i32;
    let noise_scale = 0.008;

    let mut threshold = 0.55;
    loop {
        let mut spots = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                let jitter = Vec2::new(
                    rng.random_range(-0.4..0.4_f32),
                    rng.random_range(-0.4..0.4_f32),
                ) * cell;
                let pos = Vec2::new(
                    EDGE_MARGIN + (col as f32 + 0.5) * cell,
                    EDGE_MARGIN + (row as f32 + 0.5) * cell,
                ) + jitter;
                if value_noise(seed, pos * noise_scale) > threshold {
                    spots.push(Spot { pos, bias: None });
                }
            }
        }
        if spots.len() >= n || threshold <= 0.0 {
            return spots;
        }
        threshold -= 0.1;
    }
}

/// Coherent value noise: smoothstep-interpolated lattice hashes in [0, 1].
fn value_noise(seed: u64, p: Vec2) -> f32 {
    let ix = p.x.floor() as i64;
    let iy = p.y.floor() as i64;
    let fx = p.x - ix as f32;
    let fy = p.y - iy as f32;
    let sx = fx * fx * (3.0 - 2.0 * fx);
    let sy = fy * fy * (3.0 - 2.0 * fy);

    let v00 = lattice(seed, ix, iy);
    let v10 = lattice(seed, ix + 1, iy);
    let v01 = lattice(seed, ix, iy + 1);
    let v11 = lattice(seed, ix + 1, iy + 1);

    let top = v00 + (v10 - v00) * sx;
    let bottom = v01 + (v11 - v01) * sx;
    top + (bottom - top) * sy
}

fn lattice(seed: u64, ix: i64, iy: i64) -> f32 {
    let mut h = seed
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(ix as u64)
        .wrapping_mul(0x85eb_ca6b)
        .wrapping_add(iy as u64)
        .wrapping_mul(0xc2b2_ae35);
    h ^= h >> 29;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 32;
    (h & 0xffff_ffff) as f32 / u32::MAX as f32
}

/// Positions on the boundary of the Mandelbrot cardioid sweep; escape time
/// biases both radius and the size/color assignment.
fn mandelbrot_boundary(rng: &mut Pcg32, bounds: &Bounds, n: usize) -> Vec<Spot> {
    let center = bounds.center();
    let reach = bounds.width.min(bounds.height) * 0.5 - EDGE_MARGIN;
    const MAX_ITERATIONS: u32 = 20;

    (0..n)
        .map(|i| {
            let angle = i as f32 * TAU / n as f32 + rng.random_range(-0.05..0.05_f32);

            // Sample c just outside the main cardioid, where escape times vary
            let c_re = 0.7885 * angle.cos();
            let c_im = 0.7885 * angle.sin();
            let (mut z_re, mut z_im) = (0.0f32, 0.0f32);
            let mut iterations = 0;
            while iterations < MAX_ITERATIONS && z_re * z_re + z_im * z_im < 4.0 {
                (z_re, z_im) = (z_re * z_re - z_im * z_im + c_re, 2.0 * z_re * z_im + c_im);
                iterations += 1;
            }

            let t = iterations as f32 / MAX_ITERATIONS as f32;
            let radius = reach * (0.35 + 0.6 * t);
            Spot {
                pos: center + Vec2::new(angle.cos(), angle.sin()) * radius,
                bias: Some(t),
            }
        })
        .collect()
}
