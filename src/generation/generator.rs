//! Level generation driver
//!
//! Ties a placement strategy to the solvability validator: place, validate,
//! and retry with a perturbed seed until a winnable layout appears or the
//! attempt budget runs out. Deterministic: attempt `k` always uses
//! `seed.wrapping_add(k)`, so a stored level's seed alone reproduces it.

use crate::consts::{DEFAULT_SHAPE_COUNT, EDGE_MARGIN, MAX_LEVEL_ATTEMPTS, MAX_VALIDATOR_SHAPES};
use crate::error::{Error, Result};
use crate::generation::strategy::{self, StrategyId};
use crate::generation::validator::{self, ContactModel, Piece, Solvability};
use crate::level::Level;
use crate::palette::Color;
use crate::sim::state::Bounds;

/// Everything a generation run needs. `attempts` bounds the retry loop;
/// `contact_model` is what the validator assumes about reachability.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub strategy: StrategyId,
    pub seed: u64,
    pub bounds: Bounds,
    pub shape_count: usize,
    pub palette: Vec<Color>,
    pub border_color: Color,
    pub attempts: u32,
    pub contact_model: ContactModel,
}

impl GenerateParams {
    pub fn new(strategy: StrategyId, seed: u64, border_color: Color) -> Self {
        GenerateParams {
            strategy,
            seed,
            bounds: Bounds::new(crate::consts::BOARD_WIDTH, crate::consts::BOARD_HEIGHT),
            shape_count: DEFAULT_SHAPE_COUNT,
            palette: vec![border_color],
            border_color,
            attempts: MAX_LEVEL_ATTEMPTS,
            contact_model: ContactModel::Universal,
        }
    }
}

/// Generate a validated, winnable level.
pub fn generate(params: &GenerateParams) -> Result<Level> {
    generate_with_cancel(params, || false)
}

/// As [`generate`], checking `cancel` at each attempt boundary. A cancelled
/// run reports exhaustion like a failed one.
pub fn generate_with_cancel(
    params: &GenerateParams,
    cancel: impl Fn() -> bool,
) -> Result<Level> {
    if params.attempts == 0 {
        return Err(Error::Precondition("zero generation attempts".into()));
    }
    if !params.palette.contains(&params.border_color) {
        return Err(Error::Precondition(format!(
            "border color {} not in palette",
            params.border_color.as_str()
        )));
    }
    // Malformed parameters fail up front; past this point an in-loop
    // placement failure means the layout was too crowded, which is a
    // per-attempt outcome like an unwinnable one
    if params.shape_count < 2 || params.shape_count > MAX_VALIDATOR_SHAPES {
        return Err(Error::Precondition(format!(
            "shape_count {} outside 2..={MAX_VALIDATOR_SHAPES}",
            params.shape_count
        )));
    }
    if params.bounds.width <= 4.0 * EDGE_MARGIN || params.bounds.height <= 4.0 * EDGE_MARGIN {
        return Err(Error::Precondition(format!(
            "bounds {}x{} too small for placement",
            params.bounds.width, params.bounds.height
        )));
    }

    for attempt in 0..params.attempts {
        if cancel() {
            log::info!(
                "generation cancelled after {attempt} attempts ({:?})",
                params.strategy
            );
            break;
        }

        let attempt_seed = params.seed.wrapping_add(attempt as u64);
        let placements = match strategy::place(
            params.strategy,
            attempt_seed,
            &params.bounds,
            params.shape_count,
            &params.palette,
        ) {
            Ok(p) => p,
            Err(Error::Precondition(reason)) => {
                // Crowded layouts can fail separation; the next seed may not
                log::debug!("attempt {attempt} placement failed: {reason}");
                continue;
            }
            Err(e) => return Err(e),
        };

        let pieces: Vec<Piece> = placements.iter().map(Piece::from_placement).collect();
        match validator::validate(
            &pieces,
            params.border_color,
            &params.palette,
            params.contact_model,
        )? {
            Solvability::Winnable => {
                log::info!(
                    "generated winnable level: {:?}, seed {attempt_seed:#x}, {} shapes, \
                     attempt {}",
                    params.strategy,
                    placements.len(),
                    attempt + 1
                );
                return Ok(Level {
                    seed: attempt_seed,
                    strategy: params.strategy,
                    border_color: params.border_color,
                    bounds: params.bounds,
                    palette: params.palette.clone(),
                    placements,
                });
            }
            Solvability::Unwinnable => {
                log::debug!(
                    "attempt {attempt} ({:?}, seed {attempt_seed:#x}) unwinnable",
                    params.strategy
                );
            }
        }
    }

    Err(Error::GenerationExhausted {
        strategy: params.strategy,
        attempts: params.attempts,
    })
}
