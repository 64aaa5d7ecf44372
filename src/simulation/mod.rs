pub mod command;
pub mod oxygen;
pub mod placement;
pub mod statistics;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::colony::{BuildError, Colony, ColonyMode, ModuleClass, ModuleKind, TechId, TickReport};
use crate::config::generation::GridParams;
use crate::config::simulation::SimulationConfig;
use crate::world::generation::generate_grid;
use crate::world::{Grid, Placement, Position, Tile};

pub use command::{Command, CommandError, Outcome};
pub use oxygen::{OxygenEvent, OxygenSupply};
pub use placement::{PlacementError, PlacementQuery};

/// Tunables a session reads every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub max_step_seconds: f64,
    pub placement_range: i32,
    pub oxygen_range: i32,
    pub oxygen_seconds: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for SessionSettings {
    fn from(config: &SimulationConfig) -> Self {
        SessionSettings {
            max_step_seconds: config.max_step_seconds,
            placement_range: config.placement_range as i32,
            oxygen_range: config.oxygen_range as i32,
            oxygen_seconds: config.oxygen_seconds,
        }
    }
}

/// Result of one driver frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub tick: TickReport,
    pub oxygen: OxygenEvent,
    pub outcomes: Vec<Outcome>,
}

/// One game: a colony, its grid, and the avatar walking over it.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    settings: SessionSettings,
    /// Params as requested; a zero seed re-rolls on reset.
    requested: GridParams,
    colony: Colony,
    grid: Grid,
    command_center: Position,
    avatar: Position,
    placements: Vec<Placement>,
    selection: Option<ModuleKind>,
    oxygen: OxygenSupply,
    started_ms: u64,
    last_frame_ms: u64,
    browned_out: bool,
    starving: bool,
}

/// Session ids are derived from the grid seed so a replayed game keeps its id.
pub fn session_id(seed: u64) -> Uuid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Uuid::from_bytes(rng.r#gen())
}

impl Session {
    /// Start a fresh session. A zero seed in `params` is replaced by a random
    /// one; the seed actually used is available from `grid().params()`.
    /// `params` must pass `GridParams::validate`.
    pub fn new(params: &GridParams, settings: SessionSettings, now_ms: u64) -> Self {
        let grid = generate_grid(params);
        let mut session = Self::assemble(grid, settings, now_ms);
        session.requested = params.clone();
        info!(
            id = %session.id,
            seed = session.grid.seed(),
            width = session.grid.width(),
            height = session.grid.height(),
            deposits = session.grid.deposit_count(),
            "Session started"
        );
        session
    }

    fn assemble(mut grid: Grid, settings: SessionSettings, now_ms: u64) -> Self {
        let command_center = Position::new(grid.width() / 2, grid.height() / 2);
        grid.set(
            command_center.x,
            command_center.y,
            Tile::Module(ModuleKind::CommandCenter),
        );
        let (ax, ay) = grid.wrap(command_center.x + 1, command_center.y);

        Session {
            id: session_id(grid.seed()),
            settings,
            requested: grid.params().clone(),
            colony: Colony::new(now_ms).with_max_step(settings.max_step_seconds),
            grid,
            command_center,
            avatar: Position::new(ax, ay),
            placements: Vec::new(),
            selection: None,
            oxygen: OxygenSupply::new(settings.oxygen_seconds, settings.oxygen_range),
            started_ms: now_ms,
            last_frame_ms: now_ms,
            browned_out: false,
            starving: false,
        }
    }

    /// Rebuild a saved session: regenerate the grid from its resolved params,
    /// replay the placements and adopt the saved colony.
    pub fn restore(
        params: GridParams,
        colony: Colony,
        placements: Vec<Placement>,
        avatar: Position,
        elapsed_ms: u64,
        settings: SessionSettings,
        now_ms: u64,
    ) -> Self {
        let grid = Grid::generate(params);
        let mut session = Self::assemble(grid, settings, now_ms);
        for p in &placements {
            session.grid.set(p.x, p.y, Tile::Module(p.kind));
        }
        let (ax, ay) = session.grid.wrap(avatar.x, avatar.y);
        session.avatar = Position::new(ax, ay);
        session.placements = placements;
        session.colony = colony.with_max_step(settings.max_step_seconds);
        session.started_ms = now_ms.saturating_sub(elapsed_ms);
        debug!(
            id = %session.id,
            placements = session.placements.len(),
            elapsed_ms,
            "Session restored"
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn colony(&self) -> &Colony {
        &self.colony
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn avatar(&self) -> Position {
        self.avatar
    }

    pub fn command_center(&self) -> Position {
        self.command_center
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn selection(&self) -> Option<ModuleKind> {
        self.selection
    }

    pub fn oxygen(&self) -> &OxygenSupply {
        &self.oxygen
    }

    /// Milliseconds of game time since the session started.
    pub fn elapsed_ms(&self) -> u64 {
        self.last_frame_ms.saturating_sub(self.started_ms)
    }

    /// Run one frame: the colony tick and oxygen first, then `commands` in
    /// order against the post-tick state.
    pub fn frame(
        &mut self,
        now_ms: u64,
        commands: impl IntoIterator<Item = Command>,
    ) -> FrameReport {
        let tick = self.colony.update(now_ms);
        self.log_tick(&tick);

        let dt = now_ms.saturating_sub(self.last_frame_ms) as f64 / 1000.0;
        self.last_frame_ms = now_ms;
        let distance = self.grid.wrapped_distance(self.avatar, self.command_center);
        let oxygen = self.oxygen.update(distance, dt);
        if oxygen == OxygenEvent::Depleted {
            warn!(
                x = self.avatar.x,
                y = self.avatar.y,
                distance,
                "Oxygen depleted away from base"
            );
        }

        let outcomes = commands
            .into_iter()
            .map(|command| self.apply(command, now_ms))
            .collect();

        FrameReport {
            tick,
            oxygen,
            outcomes,
        }
    }

    fn log_tick(&mut self, tick: &TickReport) {
        let brownout = tick.rates.is_brownout();
        if brownout && !self.browned_out {
            warn!(
                power_factor = tick.rates.power_factor,
                generation = tick.rates.power_gen,
                demand = tick.rates.power_use,
                "Brownout: power demand exceeds generation"
            );
        } else if !brownout && self.browned_out {
            info!("Power restored");
        }
        self.browned_out = brownout;

        if tick.starved && !self.starving {
            warn!(kerbals = self.colony.kerbals, "Snacks exhausted, kerbals starving");
        }
        self.starving = tick.starved;
    }

    /// Apply a single command immediately.
    pub fn apply(&mut self, command: Command, now_ms: u64) -> Outcome {
        let result = match command {
            Command::SelectModule { kind } => self.select(kind),
            Command::CancelPlacement => {
                self.selection = None;
                Ok(Outcome::Cancelled)
            }
            Command::PlaceSelected { x, y } => match self.selection {
                Some(kind) => self.place(kind, x, y),
                None => Err(CommandError::NothingSelected),
            },
            Command::PlaceModule { kind, x, y } => self.place(kind, x, y),
            Command::Research { tech } => self.research(tech),
            Command::MoveAvatar { dx, dy } => {
                let (x, y) = self
                    .grid
                    .wrap(self.avatar.x.wrapping_add(dx), self.avatar.y.wrapping_add(dy));
                self.avatar = Position::new(x, y);
                Ok(Outcome::Moved { x, y })
            }
            Command::SetMode { mode } => {
                self.set_mode(mode);
                Ok(Outcome::ModeChanged(mode))
            }
            Command::Reset => {
                self.reset(now_ms);
                Ok(Outcome::Reset)
            }
        };
        if let Err(e) = &result {
            debug!(error = %e, "Command rejected");
        }
        result.into()
    }

    fn select(&mut self, kind: ModuleKind) -> Result<Outcome, CommandError> {
        if kind == ModuleKind::CommandCenter {
            return Err(CommandError::NotBuildable(kind));
        }
        if !self.colony.is_unlocked(kind) {
            return Err(CommandError::Locked(kind));
        }
        self.selection = Some(kind);
        Ok(Outcome::Selected(kind))
    }

    fn place(&mut self, kind: ModuleKind, x: i32, y: i32) -> Result<Outcome, CommandError> {
        if kind == ModuleKind::CommandCenter {
            return Err(CommandError::NotBuildable(kind));
        }
        if !self.colony.is_unlocked(kind) {
            return Err(CommandError::Locked(kind));
        }
        self.check_placement(x, y, kind)?;
        self.colony.purchase_module(kind).map_err(|e| match e {
            BuildError::Locked(k) => CommandError::Locked(k),
            BuildError::Unaffordable(k) => PlacementError::Unaffordable(k).into(),
        })?;

        let (x, y) = self.grid.wrap(x, y);
        self.grid.set(x, y, Tile::Module(kind));
        self.placements.push(Placement { x, y, kind });
        debug!(kind = ?kind, x, y, count = self.colony.count(kind), "Module placed");
        Ok(Outcome::Placed { kind, x, y })
    }

    fn research(&mut self, tech: TechId) -> Result<Outcome, CommandError> {
        let researched = self.colony.research(tech)?;
        debug!(
            tech = researched.id.name(),
            cost = researched.cost,
            unlocks = ?researched.unlocks,
            "Technology researched"
        );
        Ok(Outcome::Researched(tech))
    }

    pub fn set_mode(&mut self, mode: ColonyMode) {
        if self.colony.mode != mode {
            info!(mode = ?mode, "Colony mode changed");
        }
        self.colony.set_mode(mode);
    }

    /// Throw everything away and start over with the same settings. A fixed
    /// seed reproduces the same deposit layout.
    pub fn reset(&mut self, now_ms: u64) {
        let requested = self.requested.clone();
        *self = Session::new(&requested, self.settings, now_ms);
    }

    fn placement_query(&self) -> PlacementQuery<'_> {
        PlacementQuery {
            grid: &self.grid,
            colony: &self.colony,
            avatar: self.avatar,
            range: self.settings.placement_range,
        }
    }

    pub fn check_placement(&self, x: i32, y: i32, kind: ModuleKind) -> Result<(), PlacementError> {
        self.placement_query().check(x, y, kind)
    }

    pub fn is_valid_placement(&self, x: i32, y: i32, kind: ModuleKind) -> bool {
        self.placement_query().is_valid(x, y, kind)
    }

    /// Mining modules whose recorded tile really holds a deposit.
    pub fn active_mining_sites(&self) -> usize {
        self.placements
            .iter()
            .filter(|p| p.kind.class() == ModuleClass::Mining)
            .filter(|p| self.grid.has_deposit_wrapped(p.x, p.y))
            .count()
    }
}
