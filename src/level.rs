//! Level records and the on-disk replay store
//!
//! A `Level` is the persisted, replayable definition of a board: seed,
//! strategy, border color, bounds, palette, and the validated placements.
//! It is immutable after generation. The store writes plain JSON; the exact
//! encoding is an external concern, the core only guarantees the record is
//! reproducible from `(seed, strategy)` plus the board parameters.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::generation::StrategyId;
use crate::palette::Color;
use crate::sim::shape::Extent;
use crate::sim::state::Bounds;

/// One spawn record. Hydrated into a live `Shape` (zero velocity) at
/// session start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: u32,
    pub color: Color,
    pub extent: Extent,
    pub pos: Vec2,
}

/// A validated, replayable level definition.
///
/// Invariant: every persisted level passed the solvability validator at
/// creation time. Loading re-checks structure only, never solvability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub seed: u64,
    pub strategy: StrategyId,
    pub border_color: Color,
    pub bounds: Bounds,
    pub palette: Vec<Color>,
    pub placements: Vec<Placement>,
}

impl Level {
    /// File stem used by the store: strategy plus the winning seed.
    pub fn file_stem(&self) -> String {
        format!("level_{}_{:016x}", self.strategy.as_str(), self.seed)
    }

    /// Structural validity of a record: enough shapes, positive extents,
    /// palette membership, unique ids, every shape inside the bounds.
    pub fn structural_check(&self) -> Result<()> {
        if self.placements.len() < 2 {
            return Err(Error::CorruptLevel(format!(
                "level has {} shapes, need at least 2",
                self.placements.len()
            )));
        }
        if self.palette.is_empty() {
            return Err(Error::CorruptLevel("empty palette".into()));
        }
        if !self.palette.contains(&self.border_color) {
            return Err(Error::CorruptLevel(format!(
                "border color {} not in palette",
                self.border_color.as_str()
            )));
        }
        if !(self.bounds.width > 0.0 && self.bounds.height > 0.0) {
            return Err(Error::CorruptLevel("non-positive bounds".into()));
        }

        let mut seen = std::collections::HashSet::new();
        for p in &self.placements {
            if !seen.insert(p.id) {
                return Err(Error::CorruptLevel(format!("duplicate shape id {}", p.id)));
            }
            if !p.extent.is_positive() {
                return Err(Error::CorruptLevel(format!(
                    "shape {} has a non-positive extent",
                    p.id
                )));
            }
            if !self.palette.contains(&p.color) {
                return Err(Error::CorruptLevel(format!(
                    "shape {} color {} not in palette",
                    p.id,
                    p.color.as_str()
                )));
            }
            if !self.bounds.contains(p.pos, p.extent.half_extents()) {
                return Err(Error::CorruptLevel(format!(
                    "shape {} at {} violates bounds",
                    p.id, p.pos
                )));
            }
        }
        Ok(())
    }
}

/// Directory-backed JSON store for levels.
pub struct LevelStore {
    dir: PathBuf,
}

impl LevelStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Persist a level under its file stem. Refuses structurally broken
    /// records rather than writing them out.
    pub fn save(&self, level: &Level) -> Result<PathBuf> {
        level.structural_check()?;
        let path = self.dir.join(format!("{}.json", level.file_stem()));
        let json = serde_json::to_string_pretty(level)
            .map_err(|e| Error::CorruptLevel(format!("encode failed: {e}")))?;
        fs::write(&path, json)?;
        log::info!("saved level to {}", path.display());
        Ok(path)
    }

    /// Load and structurally check a stored level by file stem.
    pub fn load(&self, stem: &str) -> Result<Level> {
        self.load_path(&self.dir.join(format!("{stem}.json")))
    }

    /// Load and structurally check a stored level from an explicit path.
    /// A record that fails to parse or fails the checks is corrupt; the
    /// failure is isolated to this load.
    pub fn load_path(&self, path: &Path) -> Result<Level> {
        let json = fs::read_to_string(path)?;
        let level: Level = serde_json::from_str(&json)
            .map_err(|e| Error::CorruptLevel(format!("{}: {e}", path.display())))?;
        level.structural_check()?;
        Ok(level)
    }

    /// File stems of every stored level, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut stems = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                stems.push(stem.to_string());
            }
        }
        stems.sort();
        Ok(stems)
    }
}
