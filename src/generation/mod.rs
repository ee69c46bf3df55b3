//! Level generation
//!
//! Three layers, each independently testable:
//! - `strategy`: seeded spatial placement patterns
//! - `validator`: merge-order solvability search over the placed pieces
//! - `generator`: the place/validate/retry driver that produces a `Level`

pub mod generator;
pub mod strategy;
pub mod validator;

pub use generator::{GenerateParams, generate, generate_with_cancel};
pub use strategy::{StrategyId, place};
pub use validator::{ContactModel, Piece, Solvability, validate};
