use serde::{Deserialize, Serialize};

use crate::colony::ModuleKind;

// === Tile ===

/// What occupies one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Ground,
    /// Unbuilt resource deposit.
    Deposit,
    Module(ModuleKind),
}

impl Tile {
    pub fn glyph(self) -> char {
        match self {
            Tile::Ground => '.',
            Tile::Deposit => '*',
            Tile::Module(kind) => kind.glyph(),
        }
    }

    /// Nothing built here yet; deposits count as open ground.
    pub fn is_open(self) -> bool {
        matches!(self, Tile::Ground | Tile::Deposit)
    }

    pub fn module(self) -> Option<ModuleKind> {
        match self {
            Tile::Module(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_connector(self) -> bool {
        self.module().is_some_and(ModuleKind::is_connector)
    }
}

// === Position ===

/// Integer tile coordinates. Unwrapped values are allowed; the grid wraps
/// them on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }
}

/// A built module recorded by position, replayed onto a regenerated grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    pub kind: ModuleKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposits_and_ground_are_open() {
        assert!(Tile::Ground.is_open());
        assert!(Tile::Deposit.is_open());
        assert!(!Tile::Module(ModuleKind::SolarArray).is_open());
    }

    #[test]
    fn only_networked_modules_connect() {
        assert!(Tile::Module(ModuleKind::CommandCenter).is_connector());
        assert!(Tile::Module(ModuleKind::AdvancedHabitat).is_connector());
        assert!(!Tile::Module(ModuleKind::SolarArray).is_connector());
        assert!(!Tile::Module(ModuleKind::MiningRig).is_connector());
        assert!(!Tile::Deposit.is_connector());
        assert!(!Tile::Ground.is_connector());
    }

    #[test]
    fn glyphs() {
        assert_eq!(Tile::Ground.glyph(), '.');
        assert_eq!(Tile::Deposit.glyph(), '*');
        assert_eq!(Tile::Module(ModuleKind::CommandCenter).glyph(), 'C');
    }
}
