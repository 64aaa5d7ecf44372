use serde::{Deserialize, Serialize};

use crate::colony::ledger::Cost;
use crate::colony::ledger::ResourceKind::{BuildingMaterials as Bm, Power, Science};

// === Enums ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModuleKind {
    CommandCenter,
    Habitation,
    Greenhouse,
    ScienceLab,
    SolarArray,
    MiningRig,
    CommsRelay,
    OrbitalAssembly,
    AdvancedHabitat,
    FusionReactor,
    QuantumLab,
    PlasmaExtractor,
    ShieldGenerator,
    TeleportHub,
    NanoFactory,
    ArcReactor,
}

/// Behavioural class of a module. The tick and the placement rules key off
/// the class rather than individual kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleClass {
    Command,
    Habitation,
    Production,
    Research,
    /// Output scaled by the environment solar factor; exempt from adjacency.
    Solar,
    /// Needs a deposit tile; yields only in Ground mode; exempt from adjacency.
    Mining,
    Generator,
    Utility,
}

/// Static description of a module kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleSpec {
    pub name: &'static str,
    pub glyph: char,
    pub class: ModuleClass,
    pub connector: bool,
    pub cost: &'static Cost,
    pub power_gen: f64,
    pub power_use: f64,
    pub snacks_gen: f64,
    pub materials_gen: f64,
    pub science_gen: f64,
    pub kerbal_capacity: f64,
}

const BLANK: ModuleSpec = ModuleSpec {
    name: "",
    glyph: ' ',
    class: ModuleClass::Utility,
    connector: false,
    cost: &[],
    power_gen: 0.0,
    power_use: 0.0,
    snacks_gen: 0.0,
    materials_gen: 0.0,
    science_gen: 0.0,
    kerbal_capacity: 0.0,
};

/// Indexed by `ModuleKind as usize`.
static MODULE_SPECS: [ModuleSpec; ModuleKind::COUNT] = [
    ModuleSpec {
        name: "Command Center",
        glyph: 'C',
        class: ModuleClass::Command,
        connector: true,
        power_gen: 10.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Habitation",
        glyph: 'H',
        class: ModuleClass::Habitation,
        connector: true,
        cost: &[(Bm, 100.0), (Power, 50.0)],
        power_use: 2.0,
        kerbal_capacity: 5.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Greenhouse",
        glyph: 'G',
        class: ModuleClass::Production,
        connector: true,
        cost: &[(Bm, 150.0), (Power, 100.0)],
        power_use: 4.0,
        snacks_gen: 2.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Science Lab",
        glyph: 'L',
        class: ModuleClass::Research,
        connector: true,
        cost: &[(Bm, 200.0), (Power, 150.0)],
        power_use: 5.0,
        science_gen: 1.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Solar Array",
        glyph: 'S',
        class: ModuleClass::Solar,
        cost: &[(Bm, 120.0)],
        power_gen: 15.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Mining Rig",
        glyph: 'M',
        class: ModuleClass::Mining,
        cost: &[(Bm, 250.0), (Power, 100.0)],
        power_use: 6.0,
        materials_gen: 2.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Comms Relay",
        glyph: 'A',
        class: ModuleClass::Utility,
        connector: true,
        cost: &[(Bm, 80.0), (Power, 30.0)],
        power_use: 1.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Orbital Assembly",
        glyph: 'O',
        class: ModuleClass::Utility,
        connector: true,
        cost: &[(Bm, 400.0), (Power, 250.0)],
        power_use: 8.0,
        ..BLANK
    },
    // Advanced habitat shares the habitat glyph, so it links the network too.
    ModuleSpec {
        name: "Advanced Habitat",
        glyph: 'H',
        class: ModuleClass::Habitation,
        connector: true,
        cost: &[(Bm, 300.0), (Power, 150.0)],
        power_use: 3.0,
        kerbal_capacity: 12.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Fusion Reactor",
        glyph: 'F',
        class: ModuleClass::Generator,
        cost: &[(Bm, 600.0), (Science, 100.0)],
        power_gen: 60.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Quantum Lab",
        glyph: 'Q',
        class: ModuleClass::Research,
        cost: &[(Bm, 500.0), (Power, 300.0), (Science, 200.0)],
        power_use: 12.0,
        science_gen: 4.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Plasma Extractor",
        glyph: 'P',
        class: ModuleClass::Mining,
        cost: &[(Bm, 450.0), (Power, 200.0)],
        power_use: 10.0,
        materials_gen: 6.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Shield Generator",
        glyph: 'D',
        class: ModuleClass::Utility,
        cost: &[(Bm, 400.0), (Power, 250.0)],
        power_use: 15.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Teleport Hub",
        glyph: 'T',
        class: ModuleClass::Utility,
        cost: &[(Bm, 700.0), (Power, 400.0), (Science, 300.0)],
        power_use: 20.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Nano Factory",
        glyph: 'N',
        class: ModuleClass::Production,
        cost: &[(Bm, 550.0), (Power, 300.0)],
        power_use: 14.0,
        materials_gen: 4.0,
        ..BLANK
    },
    ModuleSpec {
        name: "Arc Reactor",
        glyph: 'R',
        class: ModuleClass::Generator,
        cost: &[(Bm, 900.0), (Science, 500.0)],
        power_gen: 120.0,
        ..BLANK
    },
];

impl ModuleKind {
    pub const COUNT: usize = 16;

    pub const ALL: [ModuleKind; Self::COUNT] = [
        ModuleKind::CommandCenter,
        ModuleKind::Habitation,
        ModuleKind::Greenhouse,
        ModuleKind::ScienceLab,
        ModuleKind::SolarArray,
        ModuleKind::MiningRig,
        ModuleKind::CommsRelay,
        ModuleKind::OrbitalAssembly,
        ModuleKind::AdvancedHabitat,
        ModuleKind::FusionReactor,
        ModuleKind::QuantumLab,
        ModuleKind::PlasmaExtractor,
        ModuleKind::ShieldGenerator,
        ModuleKind::TeleportHub,
        ModuleKind::NanoFactory,
        ModuleKind::ArcReactor,
    ];

    pub fn spec(self) -> &'static ModuleSpec {
        &MODULE_SPECS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn glyph(self) -> char {
        self.spec().glyph
    }

    pub fn class(self) -> ModuleClass {
        self.spec().class
    }

    pub fn cost(self) -> &'static Cost {
        self.spec().cost
    }

    /// Connector tiles satisfy the adjacency rule for neighbouring placements.
    pub fn is_connector(self) -> bool {
        self.spec().connector
    }

    pub fn is_advanced(self) -> bool {
        (self as usize) >= 8
    }

    /// Whether placement of this kind skips the connector-adjacency rule.
    pub fn exempt_from_adjacency(self) -> bool {
        matches!(self.class(), ModuleClass::Solar | ModuleClass::Mining)
    }

    /// Case-insensitive lookup by display name or variant name, ignoring
    /// spaces, dashes and underscores: "mining rig", "MiningRig", "mining_rig".
    pub fn parse(name: &str) -> Option<ModuleKind> {
        let wanted = normalize(name);
        Self::ALL.into_iter().find(|k| {
            normalize(k.name()) == wanted || normalize(&format!("{:?}", k)) == wanted
        })
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}
