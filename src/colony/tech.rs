//! Technology tree: static definitions plus the eligibility and unlock logic.
//!
//! The graph itself is an immutable value. Research state (which techs are
//! done) lives on the `Colony`; the graph only reads and updates it through
//! `research`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::colony::ledger::ResourceKind;
use crate::colony::modules::ModuleKind;
use crate::colony::Colony;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TechId {
    Comms,
    AdvancedPower,
    Isru,
    OrbitalAssembly,
    AdvancedHabitation,
    FusionPower,
    PlasmaExtraction,
    Nanofabrication,
    QuantumComputing,
    DeflectorShields,
    ArcReactor,
    Teleportation,
}

impl TechId {
    pub fn name(self) -> &'static str {
        match self {
            TechId::Comms => "Comms",
            TechId::AdvancedPower => "Advanced Power",
            TechId::Isru => "ISRU",
            TechId::OrbitalAssembly => "Orbital Assembly",
            TechId::AdvancedHabitation => "Advanced Habitation",
            TechId::FusionPower => "Fusion Power",
            TechId::PlasmaExtraction => "Plasma Extraction",
            TechId::Nanofabrication => "Nanofabrication",
            TechId::QuantumComputing => "Quantum Computing",
            TechId::DeflectorShields => "Deflector Shields",
            TechId::ArcReactor => "Arc Reactor",
            TechId::Teleportation => "Teleportation",
        }
    }

    /// Case-insensitive lookup by display name or variant name.
    pub fn parse(name: &str) -> Option<TechId> {
        let wanted = name.to_lowercase().replace([' ', '_', '-'], "");
        STANDARD_TECHS.iter().map(|t| t.id).find(|id| {
            id.name().to_lowercase().replace(' ', "") == wanted
                || format!("{:?}", id).to_lowercase() == wanted
        })
    }
}

/// Static description of one technology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Technology {
    pub id: TechId,
    pub tier: u8,
    /// Science cost, paid in full at unlock time.
    pub cost: f64,
    pub prerequisites: &'static [TechId],
    pub unlocks: &'static [ModuleKind],
}

static STANDARD_TECHS: [Technology; 12] = [
    Technology {
        id: TechId::Comms,
        tier: 1,
        cost: 200.0,
        prerequisites: &[],
        unlocks: &[ModuleKind::CommsRelay],
    },
    Technology {
        id: TechId::AdvancedPower,
        tier: 1,
        cost: 400.0,
        prerequisites: &[],
        unlocks: &[ModuleKind::SolarArray],
    },
    Technology {
        id: TechId::Isru,
        tier: 1,
        cost: 500.0,
        prerequisites: &[],
        unlocks: &[ModuleKind::MiningRig],
    },
    Technology {
        id: TechId::OrbitalAssembly,
        tier: 2,
        cost: 800.0,
        prerequisites: &[TechId::Comms],
        unlocks: &[ModuleKind::OrbitalAssembly],
    },
    Technology {
        id: TechId::AdvancedHabitation,
        tier: 2,
        cost: 600.0,
        prerequisites: &[TechId::Isru],
        unlocks: &[ModuleKind::AdvancedHabitat],
    },
    Technology {
        id: TechId::FusionPower,
        tier: 2,
        cost: 1000.0,
        prerequisites: &[TechId::AdvancedPower],
        unlocks: &[ModuleKind::FusionReactor],
    },
    Technology {
        id: TechId::PlasmaExtraction,
        tier: 3,
        cost: 1200.0,
        prerequisites: &[TechId::Isru, TechId::FusionPower],
        unlocks: &[ModuleKind::PlasmaExtractor],
    },
    Technology {
        id: TechId::Nanofabrication,
        tier: 3,
        cost: 1400.0,
        prerequisites: &[TechId::Isru, TechId::OrbitalAssembly],
        unlocks: &[ModuleKind::NanoFactory],
    },
    Technology {
        id: TechId::QuantumComputing,
        tier: 3,
        cost: 1500.0,
        prerequisites: &[TechId::Comms, TechId::FusionPower],
        unlocks: &[ModuleKind::QuantumLab],
    },
    Technology {
        id: TechId::DeflectorShields,
        tier: 4,
        cost: 2000.0,
        prerequisites: &[TechId::FusionPower, TechId::OrbitalAssembly],
        unlocks: &[ModuleKind::ShieldGenerator],
    },
    Technology {
        id: TechId::ArcReactor,
        tier: 4,
        cost: 2500.0,
        prerequisites: &[TechId::FusionPower, TechId::QuantumComputing],
        unlocks: &[ModuleKind::ArcReactor],
    },
    Technology {
        id: TechId::Teleportation,
        tier: 4,
        cost: 3000.0,
        prerequisites: &[TechId::QuantumComputing, TechId::Nanofabrication],
        unlocks: &[ModuleKind::TeleportHub],
    },
];

/// Why a research attempt was refused. The colony is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResearchError {
    #[error("technology {0:?} is not part of this tech tree")]
    UnknownTech(TechId),

    #[error("{} has already been researched", .0.name())]
    AlreadyResearched(TechId),

    #[error("{} requires {} first", .tech.name(), .missing.name())]
    MissingPrerequisite { tech: TechId, missing: TechId },

    #[error("{} needs {required} science, only {available:.1} available", .tech.name())]
    InsufficientScience {
        tech: TechId,
        required: f64,
        available: f64,
    },
}

/// Problems found when building a graph from a technology table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("duplicate technology id: {0:?}")]
    DuplicateId(TechId),

    #[error("prerequisite {prereq:?} for technology {tech:?} does not exist")]
    UnknownPrerequisite { tech: TechId, prereq: TechId },

    #[error("prerequisite {prereq:?} of {tech:?} is not in a lower tier")]
    TierOrder { tech: TechId, prereq: TechId },
}

/// An immutable technology graph.
#[derive(Debug, Clone, Copy)]
pub struct TechGraph {
    techs: &'static [Technology],
}

impl TechGraph {
    /// The standard twelve-tech tree, four tiers deep.
    pub fn standard() -> Self {
        TechGraph {
            techs: &STANDARD_TECHS,
        }
    }

    /// Build a graph over a custom table. Every prerequisite must exist and
    /// sit in a strictly lower tier, which also rules out cycles.
    pub fn new(techs: &'static [Technology]) -> Result<Self, GraphError> {
        let mut seen = BTreeSet::new();
        for tech in techs {
            if !seen.insert(tech.id) {
                return Err(GraphError::DuplicateId(tech.id));
            }
        }
        for tech in techs {
            for &prereq in tech.prerequisites {
                let Some(dep) = techs.iter().find(|t| t.id == prereq) else {
                    return Err(GraphError::UnknownPrerequisite {
                        tech: tech.id,
                        prereq,
                    });
                };
                if dep.tier >= tech.tier {
                    return Err(GraphError::TierOrder {
                        tech: tech.id,
                        prereq,
                    });
                }
            }
        }
        Ok(TechGraph { techs })
    }

    pub fn get(&self, id: TechId) -> Option<&'static Technology> {
        self.techs.iter().find(|t| t.id == id)
    }

    pub fn all(&self) -> &'static [Technology] {
        self.techs
    }

    /// Full eligibility check, reporting the first reason for refusal.
    pub fn check(
        &self,
        id: TechId,
        researched: &BTreeSet<TechId>,
        science_available: f64,
    ) -> Result<&'static Technology, ResearchError> {
        let tech = self.get(id).ok_or(ResearchError::UnknownTech(id))?;
        if researched.contains(&id) {
            return Err(ResearchError::AlreadyResearched(id));
        }
        if let Some(&missing) = tech.prerequisites.iter().find(|p| !researched.contains(p)) {
            return Err(ResearchError::MissingPrerequisite { tech: id, missing });
        }
        if science_available < tech.cost {
            return Err(ResearchError::InsufficientScience {
                tech: id,
                required: tech.cost,
                available: science_available,
            });
        }
        Ok(tech)
    }

    pub fn can_research(
        &self,
        id: TechId,
        researched: &BTreeSet<TechId>,
        science_available: f64,
    ) -> bool {
        self.check(id, researched, science_available).is_ok()
    }

    /// Research `id` for `colony`: pays the science cost, records the tech and
    /// opens its modules for building. No side effect on refusal.
    pub fn research(
        &self,
        id: TechId,
        colony: &mut Colony,
    ) -> Result<&'static Technology, ResearchError> {
        let science = colony.resources.get(ResourceKind::Science);
        let tech = self.check(id, &colony.unlocked_techs, science)?;
        if !colony.resources.remove(ResourceKind::Science, tech.cost) {
            return Err(ResearchError::InsufficientScience {
                tech: id,
                required: tech.cost,
                available: science,
            });
        }
        colony.unlocked_techs.insert(id);
        colony.unlocked_modules.extend(tech.unlocks.iter().copied());
        Ok(tech)
    }

    pub fn unlock(&self, id: TechId, colony: &mut Colony) -> bool {
        self.research(id, colony).is_ok()
    }

    /// Techs not yet researched whose prerequisites are all done, in table
    /// order. Affordability is not considered.
    pub fn available_for_research(&self, researched: &BTreeSet<TechId>) -> Vec<TechId> {
        self.techs
            .iter()
            .filter(|t| !researched.contains(&t.id))
            .filter(|t| t.prerequisites.iter().all(|p| researched.contains(p)))
            .map(|t| t.id)
            .collect()
    }
}

impl Default for TechGraph {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[TechId]) -> BTreeSet<TechId> {
        ids.iter().copied().collect()
    }

    fn colony_with_science(science: f64) -> Colony {
        let mut colony = Colony::new(0);
        colony.resources.set(ResourceKind::Science, science);
        colony
    }

    #[test]
    fn standard_graph_is_valid() {
        let graph = TechGraph::new(&STANDARD_TECHS).unwrap();
        assert_eq!(graph.all().len(), 12);
    }

    #[test]
    fn tier_one_is_available_from_the_start() {
        let graph = TechGraph::standard();
        assert_eq!(
            graph.available_for_research(&BTreeSet::new()),
            vec![TechId::Comms, TechId::AdvancedPower, TechId::Isru]
        );
    }

    #[test]
    fn availability_ignores_affordability() {
        let graph = TechGraph::standard();
        let done = set(&[TechId::Comms, TechId::AdvancedPower, TechId::Isru]);
        let available = graph.available_for_research(&done);
        assert!(available.contains(&TechId::OrbitalAssembly));
        assert!(available.contains(&TechId::FusionPower));
        assert!(available.contains(&TechId::AdvancedHabitation));
        assert!(!available.contains(&TechId::Teleportation));
    }

    #[test]
    fn missing_prerequisite_blocks_regardless_of_science() {
        let graph = TechGraph::standard();
        let mut colony = colony_with_science(1_000_000.0);
        let err = graph.research(TechId::OrbitalAssembly, &mut colony).unwrap_err();
        assert_eq!(
            err,
            ResearchError::MissingPrerequisite {
                tech: TechId::OrbitalAssembly,
                missing: TechId::Comms,
            }
        );
        assert_eq!(colony.resources.get(ResourceKind::Science), 1_000_000.0);
        assert!(colony.unlocked_techs.is_empty());
        assert!(!colony.is_unlocked(ModuleKind::OrbitalAssembly));
    }

    #[test]
    fn research_deducts_exact_cost_and_unlocks_modules() {
        let graph = TechGraph::standard();
        let mut colony = colony_with_science(250.0);
        assert!(!colony.is_unlocked(ModuleKind::CommsRelay));

        let tech = graph.research(TechId::Comms, &mut colony).unwrap();
        assert_eq!(tech.cost, 200.0);
        assert_eq!(colony.resources.get(ResourceKind::Science), 50.0);
        assert!(colony.unlocked_techs.contains(&TechId::Comms));
        assert!(colony.is_unlocked(ModuleKind::CommsRelay));
    }

    #[test]
    fn research_is_once_only() {
        let graph = TechGraph::standard();
        let mut colony = colony_with_science(1000.0);
        assert!(graph.unlock(TechId::Comms, &mut colony));
        assert_eq!(
            graph.research(TechId::Comms, &mut colony).unwrap_err(),
            ResearchError::AlreadyResearched(TechId::Comms)
        );
        assert_eq!(colony.resources.get(ResourceKind::Science), 800.0);
    }

    #[test]
    fn insufficient_science_leaves_colony_unchanged() {
        let graph = TechGraph::standard();
        let mut colony = colony_with_science(199.0);
        let before = colony.to_record();
        assert!(!graph.unlock(TechId::Comms, &mut colony));
        assert_eq!(colony.to_record(), before);
        assert!(matches!(
            graph.research(TechId::Comms, &mut colony),
            Err(ResearchError::InsufficientScience { required, .. }) if required == 200.0
        ));
    }

    #[test]
    fn exact_balance_is_enough() {
        let graph = TechGraph::standard();
        let mut colony = colony_with_science(500.0);
        assert!(graph.unlock(TechId::Isru, &mut colony));
        assert_eq!(colony.resources.get(ResourceKind::Science), 0.0);
    }

    #[test]
    fn can_research_requires_every_prerequisite() {
        let graph = TechGraph::standard();
        let partial = set(&[TechId::QuantumComputing]);
        assert!(!graph.can_research(TechId::Teleportation, &partial, 10_000.0));
        let full = set(&[TechId::QuantumComputing, TechId::Nanofabrication]);
        assert!(graph.can_research(TechId::Teleportation, &full, 3000.0));
        assert!(!graph.can_research(TechId::Teleportation, &full, 2999.9));
    }

    #[test]
    fn whole_tree_can_be_walked_in_tier_order() {
        let graph = TechGraph::standard();
        let mut colony = colony_with_science(100_000.0);
        loop {
            let next = graph.available_for_research(&colony.unlocked_techs);
            let Some(&id) = next.first() else { break };
            graph.research(id, &mut colony).unwrap();
        }
        assert_eq!(colony.unlocked_techs.len(), 12);
        for kind in ModuleKind::ALL {
            assert!(colony.is_unlocked(kind), "{:?} should be unlocked", kind);
        }
    }

    static DUPLICATE: [Technology; 2] = [
        Technology {
            id: TechId::Comms,
            tier: 1,
            cost: 1.0,
            prerequisites: &[],
            unlocks: &[],
        },
        Technology {
            id: TechId::Comms,
            tier: 1,
            cost: 1.0,
            prerequisites: &[],
            unlocks: &[],
        },
    ];

    static DANGLING: [Technology; 1] = [Technology {
        id: TechId::OrbitalAssembly,
        tier: 2,
        cost: 1.0,
        prerequisites: &[TechId::Comms],
        unlocks: &[],
    }];

    static SAME_TIER: [Technology; 2] = [
        Technology {
            id: TechId::Comms,
            tier: 1,
            cost: 1.0,
            prerequisites: &[TechId::Isru],
            unlocks: &[],
        },
        Technology {
            id: TechId::Isru,
            tier: 1,
            cost: 1.0,
            prerequisites: &[TechId::Comms],
            unlocks: &[],
        },
    ];

    #[test]
    fn malformed_tables_are_rejected() {
        assert_eq!(
            TechGraph::new(&DUPLICATE).unwrap_err(),
            GraphError::DuplicateId(TechId::Comms)
        );
        assert!(matches!(
            TechGraph::new(&DANGLING).unwrap_err(),
            GraphError::UnknownPrerequisite { .. }
        ));
        assert!(matches!(
            TechGraph::new(&SAME_TIER).unwrap_err(),
            GraphError::TierOrder { .. }
        ));
    }

    #[test]
    fn injected_graph_drives_unlocks() {
        let graph = TechGraph::new(&[]).unwrap();
        let mut colony = colony_with_science(1000.0);
        assert_eq!(
            graph.research(TechId::Comms, &mut colony).unwrap_err(),
            ResearchError::UnknownTech(TechId::Comms)
        );
    }

    static SHORT_TREE: [Technology; 2] = [
        Technology {
            id: TechId::Comms,
            tier: 1,
            cost: 10.0,
            prerequisites: &[],
            unlocks: &[ModuleKind::TeleportHub],
        },
        Technology {
            id: TechId::Teleportation,
            tier: 2,
            cost: 5.0,
            prerequisites: &[TechId::Comms],
            unlocks: &[ModuleKind::ArcReactor],
        },
    ];

    #[test]
    fn colony_researches_through_its_own_graph() {
        let graph = TechGraph::new(&SHORT_TREE).unwrap();
        let mut colony = Colony::new(0).with_tech_graph(graph);
        colony.resources.set(ResourceKind::Science, 15.0);

        assert_eq!(colony.tech_graph().all().len(), 2);
        assert_eq!(colony.available_for_research(), vec![TechId::Comms]);
        assert_eq!(
            colony.research(TechId::Isru).unwrap_err(),
            ResearchError::UnknownTech(TechId::Isru)
        );

        assert_eq!(colony.research(TechId::Comms).unwrap().id, TechId::Comms);
        assert!(colony.is_unlocked(ModuleKind::TeleportHub));
        assert!(!colony.is_unlocked(ModuleKind::CommsRelay));
        assert_eq!(colony.available_for_research(), vec![TechId::Teleportation]);

        assert!(colony.unlock_tech(TechId::Teleportation));
        assert!(colony.is_unlocked(ModuleKind::ArcReactor));
        assert!(colony.resources.get(ResourceKind::Science).abs() < 1e-9);
    }

    #[test]
    fn parse_tech_names() {
        assert_eq!(TechId::parse("ISRU"), Some(TechId::Isru));
        assert_eq!(TechId::parse("fusion power"), Some(TechId::FusionPower));
        assert_eq!(TechId::parse("FusionPower"), Some(TechId::FusionPower));
        assert_eq!(TechId::parse("warp"), None);
    }
}
