pub mod ledger;
pub mod modules;
pub mod tech;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ledger::{Cost, ResourceKind, ResourceLedger};
pub use modules::{ModuleClass, ModuleKind, ModuleSpec};
pub use tech::{ResearchError, TechGraph, TechId, Technology};

/// Capacity provided by the command center before any habitats.
pub const BASE_KERBAL_CAPACITY: f64 = 5.0;
/// Longest step a single `update` will simulate.
pub const DEFAULT_MAX_STEP_SECONDS: f64 = 0.25;
/// Snacks eaten per kerbal per second.
pub const SNACKS_PER_KERBAL: f64 = 0.05;
pub const STARVATION_RATE: f64 = 0.01;
pub const GROWTH_RATE: f64 = 0.005;
/// Growth needs more than this many snacks in store.
pub const GROWTH_SNACK_THRESHOLD: f64 = 50.0;
/// Growth stops this close to capacity.
pub const GROWTH_HEADROOM: f64 = 0.05;

const ORBITAL_SOLAR_FACTOR: f64 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColonyMode {
    Ground,
    Orbital,
}

impl ColonyMode {
    pub fn solar_factor(self) -> f64 {
        match self {
            ColonyMode::Ground => 1.0,
            ColonyMode::Orbital => ORBITAL_SOLAR_FACTOR,
        }
    }

    pub fn mining_enabled(self) -> bool {
        self == ColonyMode::Ground
    }
}

/// Aggregate per-second rates for the current module set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProductionRates {
    pub power_gen: f64,
    pub power_use: f64,
    pub snacks_gen: f64,
    pub snacks_use: f64,
    pub materials_gen: f64,
    pub science_gen: f64,
    /// Brownout multiplier in [0, 1] applied to snacks and science.
    pub power_factor: f64,
}

impl ProductionRates {
    pub fn net_power(&self) -> f64 {
        self.power_gen - self.power_use
    }

    pub fn is_brownout(&self) -> bool {
        self.power_factor < 1.0
    }
}

/// What one call to `Colony::update` did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub delta_seconds: f64,
    pub rates: ProductionRates,
    pub starved: bool,
    pub grew: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("{} has not been unlocked", .0.name())]
    Locked(ModuleKind),

    #[error("cannot afford {}", .0.name())]
    Unaffordable(ModuleKind),
}

/// Plain persisted form of a colony.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonyRecord {
    pub resources: Vec<(ResourceKind, f64)>,
    pub modules: Vec<(ModuleKind, u32)>,
    pub kerbals: f64,
    pub mode: ColonyMode,
    pub unlocked_modules: Vec<ModuleKind>,
    pub unlocked_techs: Vec<TechId>,
}

const STARTING_UNLOCKS: [ModuleKind; 5] = [
    ModuleKind::Habitation,
    ModuleKind::Greenhouse,
    ModuleKind::SolarArray,
    ModuleKind::ScienceLab,
    ModuleKind::MiningRig,
];

/// Colony state: resources, built modules, population, and unlocks.
#[derive(Debug, Clone)]
pub struct Colony {
    pub resources: ResourceLedger,
    modules: [u32; ModuleKind::COUNT],
    pub kerbals: f64,
    kerbal_capacity: f64,
    pub mode: ColonyMode,
    pub(crate) unlocked_modules: BTreeSet<ModuleKind>,
    pub(crate) unlocked_techs: BTreeSet<TechId>,
    last_update_ms: u64,
    max_step_seconds: f64,
    tech: TechGraph,
}

impl Colony {
    /// A fresh colony whose clock starts at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        let mut resources = ResourceLedger::default();
        resources.set(ResourceKind::Power, 100.0);
        resources.set(ResourceKind::Snacks, 100.0);
        resources.set(ResourceKind::BuildingMaterials, 500.0);
        resources.set(ResourceKind::Science, 0.0);

        let mut modules = [0; ModuleKind::COUNT];
        modules[ModuleKind::CommandCenter as usize] = 1;

        let mut colony = Colony {
            resources,
            modules,
            kerbals: 3.0,
            kerbal_capacity: BASE_KERBAL_CAPACITY,
            mode: ColonyMode::Ground,
            unlocked_modules: STARTING_UNLOCKS.into_iter().collect(),
            unlocked_techs: BTreeSet::new(),
            last_update_ms: now_ms,
            max_step_seconds: DEFAULT_MAX_STEP_SECONDS,
            tech: TechGraph::standard(),
        };
        colony.recompute_kerbal_capacity();
        colony
    }

    pub fn with_max_step(mut self, seconds: f64) -> Self {
        self.max_step_seconds = seconds.max(0.0);
        self
    }

    pub fn with_tech_graph(mut self, graph: TechGraph) -> Self {
        self.tech = graph;
        self
    }

    pub fn tech_graph(&self) -> &TechGraph {
        &self.tech
    }

    pub fn set_mode(&mut self, mode: ColonyMode) {
        self.mode = mode;
    }

    pub fn count(&self, kind: ModuleKind) -> u32 {
        self.modules[kind as usize]
    }

    pub fn kerbal_capacity(&self) -> f64 {
        self.kerbal_capacity
    }

    pub fn last_update_ms(&self) -> u64 {
        self.last_update_ms
    }

    pub fn unlocked_modules(&self) -> &BTreeSet<ModuleKind> {
        &self.unlocked_modules
    }

    pub fn unlocked_techs(&self) -> &BTreeSet<TechId> {
        &self.unlocked_techs
    }

    pub fn is_unlocked(&self, kind: ModuleKind) -> bool {
        kind == ModuleKind::CommandCenter || self.unlocked_modules.contains(&kind)
    }

    pub fn module_cost(&self, kind: ModuleKind) -> &'static Cost {
        kind.cost()
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        self.resources.can_afford(cost)
    }

    pub fn spend(&mut self, cost: &Cost) -> bool {
        self.resources.spend(cost)
    }

    pub fn add_resource(&mut self, kind: ResourceKind, amount: f64) {
        self.resources.add(kind, amount);
    }

    pub fn remove_resource(&mut self, kind: ResourceKind, amount: f64) -> bool {
        self.resources.remove(kind, amount)
    }

    /// Count one more `kind`. Does not charge for it; see `purchase_module`.
    /// Locked kinds are ignored.
    pub fn build_module(&mut self, kind: ModuleKind) {
        if !self.is_unlocked(kind) {
            return;
        }
        self.modules[kind as usize] += 1;
        self.recompute_kerbal_capacity();
    }

    /// Check unlock, spend the cost and build, as one step.
    pub fn purchase_module(&mut self, kind: ModuleKind) -> Result<(), BuildError> {
        if !self.is_unlocked(kind) {
            return Err(BuildError::Locked(kind));
        }
        if !self.spend(kind.cost()) {
            return Err(BuildError::Unaffordable(kind));
        }
        self.build_module(kind);
        Ok(())
    }

    pub fn research(&mut self, id: TechId) -> Result<&'static Technology, ResearchError> {
        let graph = self.tech;
        graph.research(id, self)
    }

    pub fn unlock_tech(&mut self, id: TechId) -> bool {
        self.research(id).is_ok()
    }

    pub fn available_for_research(&self) -> Vec<TechId> {
        self.tech.available_for_research(&self.unlocked_techs)
    }

    fn recompute_kerbal_capacity(&mut self) {
        let from_habitats: f64 = ModuleKind::ALL
            .iter()
            .filter(|k| k.class() == ModuleClass::Habitation)
            .map(|&k| self.count(k) as f64 * k.spec().kerbal_capacity)
            .sum();
        self.kerbal_capacity = BASE_KERBAL_CAPACITY + from_habitats;
        if self.kerbals > self.kerbal_capacity {
            self.kerbals = self.kerbal_capacity;
        }
    }

    /// Per-second rates for the current modules, population and mode.
    pub fn production_rates(&self) -> ProductionRates {
        let solar_factor = self.mode.solar_factor();
        let mut rates = ProductionRates::default();

        for kind in ModuleKind::ALL {
            let n = self.count(kind) as f64;
            if n <= 0.0 {
                continue;
            }
            let spec = kind.spec();

            let mut output = spec.power_gen;
            if spec.class == ModuleClass::Solar {
                output *= solar_factor;
            }
            rates.power_gen += output * n;
            rates.power_use += spec.power_use * n;

            if spec.class == ModuleClass::Mining {
                // Counts every built rig, deposit or not.
                if self.mode.mining_enabled() {
                    rates.materials_gen += spec.materials_gen * n;
                }
            } else {
                rates.snacks_gen += spec.snacks_gen * n;
                rates.materials_gen += spec.materials_gen * n;
                rates.science_gen += spec.science_gen * n;
            }
        }

        rates.snacks_use = self.kerbals * SNACKS_PER_KERBAL;
        rates.power_factor = if rates.power_use == 0.0 || rates.power_gen >= rates.power_use {
            1.0
        } else {
            (rates.power_gen / rates.power_use).max(0.0)
        };
        rates
    }

    /// Advance the simulation to `now_ms`. The step is clamped to
    /// `[0, max_step]` seconds.
    pub fn update(&mut self, now_ms: u64) -> TickReport {
        let elapsed = now_ms.saturating_sub(self.last_update_ms) as f64 / 1000.0;
        let delta = elapsed.clamp(0.0, self.max_step_seconds);
        self.last_update_ms = now_ms;

        let rates = self.production_rates();
        let pf = rates.power_factor;

        self.resources
            .add(ResourceKind::Power, rates.net_power() * delta);
        self.resources.add(
            ResourceKind::Snacks,
            (rates.snacks_gen - rates.snacks_use) * pf * delta,
        );
        self.resources
            .add(ResourceKind::BuildingMaterials, rates.materials_gen * delta);
        self.resources
            .add(ResourceKind::Science, rates.science_gen * pf * delta);

        // A deficit drains the store but never below empty.
        if self.resources.get(ResourceKind::Power) < 0.0 {
            self.resources.set(ResourceKind::Power, 0.0);
        }

        let snacks = self.resources.get(ResourceKind::Snacks);
        let starved = snacks < 0.0;
        if starved {
            self.resources.set(ResourceKind::Snacks, 0.0);
            self.kerbals = (self.kerbals - STARVATION_RATE * delta).max(0.0);
        }

        let has_room = self.kerbals < self.kerbal_capacity - GROWTH_HEADROOM;
        let grew = has_room && snacks > GROWTH_SNACK_THRESHOLD && delta > 0.0;
        if grew {
            self.kerbals = (self.kerbals + GROWTH_RATE * delta).min(self.kerbal_capacity);
        }

        TickReport {
            delta_seconds: delta,
            rates,
            starved,
            grew,
        }
    }

    pub fn to_record(&self) -> ColonyRecord {
        ColonyRecord {
            resources: self.resources.entries().collect(),
            modules: ModuleKind::ALL
                .iter()
                .map(|&k| (k, self.count(k)))
                .collect(),
            kerbals: self.kerbals,
            mode: self.mode,
            unlocked_modules: self.unlocked_modules.iter().copied().collect(),
            unlocked_techs: self.unlocked_techs.iter().copied().collect(),
        }
    }

    /// Rebuild a colony from a record: start fresh, overlay the stored fields,
    /// then recompute capacity. The command center is always kept.
    pub fn from_record(record: &ColonyRecord, now_ms: u64) -> Self {
        let mut colony = Colony::new(now_ms);
        for &(kind, amount) in &record.resources {
            colony.resources.set(kind, amount);
        }
        colony.modules = [0; ModuleKind::COUNT];
        for &(kind, count) in &record.modules {
            colony.modules[kind as usize] = count;
        }
        let cc = &mut colony.modules[ModuleKind::CommandCenter as usize];
        *cc = (*cc).max(1);
        colony.kerbals = record.kerbals.max(0.0);
        colony.mode = record.mode;
        colony.unlocked_modules = record.unlocked_modules.iter().copied().collect();
        colony.unlocked_techs = record.unlocked_techs.iter().copied().collect();
        colony.recompute_kerbal_capacity();
        colony
    }
}
