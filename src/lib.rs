//! Chroma Fuse - a color-merge puzzle engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, merges, session state)
//! - `generation`: Procedural level generation with solvability validation
//! - `level`: Replayable level records and the JSON store
//! - `palette`: The closed gameplay color set
//!
//! The engine is headless: it owns rules, physics, and generation, and
//! exposes plain data for a renderer to draw. Everything is deterministic
//! for a fixed seed and input sequence.

pub mod error;
pub mod generation;
pub mod level;
pub mod palette;
pub mod sim;

pub use error::{Error, Result};
pub use generation::{GenerateParams, StrategyId, generate};
pub use level::{Level, LevelStore, Placement};
pub use palette::{Color, DEFAULT_PALETTE};
pub use sim::{Board, Bounds, DragInput, SessionPhase, TickInput, tick};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;

    /// Default board dimensions
    pub const BOARD_WIDTH: f32 = 800.0;
    pub const BOARD_HEIGHT: f32 = 600.0;

    /// Downward acceleration on free shapes (pixels/s²)
    pub const GRAVITY: f32 = 180.0;
    /// Per-second velocity damping factor
    pub const LINEAR_DAMPING: f32 = 0.6;
    /// Energy kept when bouncing off a wall
    pub const WALL_RESTITUTION: f32 = 0.65;
    /// Energy kept when unlike shapes bounce off each other
    pub const BOUNCE_RESTITUTION: f32 = 0.9;

    /// Shape size range: radius for circles, half-size for the rest
    pub const MIN_SHAPE_SIZE: f32 = 20.0;
    pub const MAX_SHAPE_SIZE: f32 = 40.0;
    /// Shapes spawn no closer than this to the board edge
    pub const EDGE_MARGIN: f32 = 50.0;
    /// Minimum surface-to-surface distance between spawned shapes
    pub const MIN_SEPARATION: f32 = 20.0;

    /// Shapes per generated level unless a caller overrides it
    pub const DEFAULT_SHAPE_COUNT: usize = 8;
    /// Seed perturbations the generator tries before giving up
    pub const MAX_LEVEL_ATTEMPTS: u32 = 10;

    /// Piece ceiling for the solvability search (bitmask-sized state)
    pub const MAX_VALIDATOR_SHAPES: usize = 64;
    /// Search states expanded before the validator reports unwinnable
    pub const VALIDATOR_STATE_BUDGET: u32 = 200_000;
}
