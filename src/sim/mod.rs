//! Deterministic simulation module
//!
//! All play-time logic lives here. This module must stay pure and
//! deterministic:
//! - Fixed timestep only
//! - Stable iteration order (creation order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod shape;
pub mod state;
pub mod tick;

pub use collision::{Contact, contact};
pub use shape::{Extent, Shape, ShapeKind};
pub use state::{Board, Bounds, DragInput, MergeEvent, SessionPhase, TickInput};
pub use tick::tick;
