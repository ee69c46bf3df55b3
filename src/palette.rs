//! The fixed gameplay color palette
//!
//! Color equality is the only thing the merge rules look at, so colors are a
//! closed enum rather than raw RGB. The RGB values exist for renderers only.

use serde::{Deserialize, Serialize};

/// A gameplay color. Same color = merge, different color = bounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Mint,
    Pink,
    Gold,
    Coral,
    Turquoise,
    Violet,
}

impl Color {
    /// Every color the engine knows about.
    pub const ALL: [Color; 6] = [
        Color::Mint,
        Color::Pink,
        Color::Gold,
        Color::Coral,
        Color::Turquoise,
        Color::Violet,
    ];

    /// Display RGB for renderers.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            Color::Mint => [71, 225, 166],
            Color::Pink => [255, 121, 198],
            Color::Gold => [255, 195, 0],
            Color::Coral => [255, 158, 128],
            Color::Turquoise => [64, 224, 208],
            Color::Violet => [138, 43, 226],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Mint => "mint",
            Color::Pink => "pink",
            Color::Gold => "gold",
            Color::Coral => "coral",
            Color::Turquoise => "turquoise",
            Color::Violet => "violet",
        }
    }
}

/// Default board palette (three colors, like the aurora set the game ships with).
pub const DEFAULT_PALETTE: &[Color] = &[Color::Mint, Color::Pink, Color::Gold];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_subset_of_all() {
        for c in DEFAULT_PALETTE {
            assert!(Color::ALL.contains(c));
        }
    }
}
