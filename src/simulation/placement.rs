//! Placement legality. Checks run in a fixed order and stop at the first
//! failure, so the reported reason is always the earliest rule broken.

use thiserror::Error;

use crate::colony::{Colony, ModuleClass, ModuleKind};
use crate::world::{Grid, Position};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("tile ({x}, {y}) is already built on")]
    Occupied { x: i32, y: i32 },

    #[error("target is {distance} tiles away, range is {range}")]
    OutOfRange { distance: i32, range: i32 },

    #[error("cannot afford {}", .0.name())]
    Unaffordable(ModuleKind),

    #[error("{} must be placed on a deposit", .0.name())]
    NeedsDeposit(ModuleKind),

    #[error("{} must be next to a connected module", .0.name())]
    NotConnected(ModuleKind),
}

/// Everything a placement check reads.
#[derive(Debug, Clone, Copy)]
pub struct PlacementQuery<'a> {
    pub grid: &'a Grid,
    pub colony: &'a Colony,
    pub avatar: Position,
    pub range: i32,
}

impl PlacementQuery<'_> {
    /// Is `kind` legal at `(x, y)`? Unlock state is not consulted.
    pub fn check(&self, x: i32, y: i32, kind: ModuleKind) -> Result<(), PlacementError> {
        if !self.grid.is_empty(x, y) {
            let (x, y) = self.grid.wrap(x, y);
            return Err(PlacementError::Occupied { x, y });
        }

        let distance = self.grid.wrapped_distance(self.avatar, Position::new(x, y));
        if distance > self.range {
            return Err(PlacementError::OutOfRange {
                distance,
                range: self.range,
            });
        }

        if !self.colony.can_afford(kind.cost()) {
            return Err(PlacementError::Unaffordable(kind));
        }

        if kind.class() == ModuleClass::Mining && !self.grid.has_deposit_wrapped(x, y) {
            return Err(PlacementError::NeedsDeposit(kind));
        }

        if !kind.exempt_from_adjacency() && !self.grid.touches_connector(x, y) {
            return Err(PlacementError::NotConnected(kind));
        }

        Ok(())
    }

    pub fn is_valid(&self, x: i32, y: i32, kind: ModuleKind) -> bool {
        self.check(x, y, kind).is_ok()
    }
}
