use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::colony::{ColonyMode, ModuleKind, ResearchError, TechId};
use crate::simulation::placement::PlacementError;

/// Everything the input layer can ask a session to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    // ── Building ──────────────────────────────────
    SelectModule { kind: ModuleKind },
    CancelPlacement,
    /// Place the selected module; the selection is kept for repeat builds.
    PlaceSelected { x: i32, y: i32 },
    PlaceModule { kind: ModuleKind, x: i32, y: i32 },

    // ── Research ──────────────────────────────────
    Research { tech: TechId },

    // ── Avatar and environment ────────────────────
    MoveAvatar { dx: i32, dy: i32 },
    SetMode { mode: ColonyMode },

    Reset,
}

/// Why a command was refused. Session state is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("no module selected for placement")]
    NothingSelected,

    #[error("{} has not been unlocked", .0.name())]
    Locked(ModuleKind),

    #[error("{} cannot be built", .0.name())]
    NotBuildable(ModuleKind),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Research(#[from] ResearchError),
}

/// Result of applying one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Selected(ModuleKind),
    Cancelled,
    Placed { kind: ModuleKind, x: i32, y: i32 },
    Researched(TechId),
    Moved { x: i32, y: i32 },
    ModeChanged(ColonyMode),
    Reset,
    Rejected(CommandError),
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }
}

impl From<Result<Outcome, CommandError>> for Outcome {
    fn from(result: Result<Outcome, CommandError>) -> Self {
        result.unwrap_or_else(Outcome::Rejected)
    }
}
