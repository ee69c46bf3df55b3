//! Error taxonomy
//!
//! Three failure families, never used for normal control flow:
//! - `Precondition`: malformed input, always reported to the caller.
//! - `GenerationExhausted`: recoverable; retry with other parameters.
//! - `CorruptLevel`: fatal for that load, isolated to the loading session.
//!
//! WON/LOST are session states, not errors. Physics never errors.

use thiserror::Error;

use crate::generation::StrategyId;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed shape/level input (empty set, out-of-palette color,
    /// non-positive extent, too many shapes).
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// No winnable layout found within the attempt budget.
    #[error("no winnable layout for {strategy:?} within {attempts} attempts")]
    GenerationExhausted { strategy: StrategyId, attempts: u32 },

    /// A persisted level record failed structural checks.
    #[error("corrupt level: {0}")]
    CorruptLevel(String),

    /// Level store I/O failure.
    #[error("level store io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
