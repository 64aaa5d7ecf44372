use crate::colony::{ModuleClass, ModuleKind, ProductionRates, ResourceKind};
use crate::simulation::Session;

/// Point-in-time summary of a session for inspection and logging.
#[derive(Debug, Clone)]
pub struct SessionStatistics {
    pub elapsed_ms: u64,
    pub resources: Vec<(ResourceKind, f64)>,
    /// Built kinds only, in table order.
    pub modules: Vec<(ModuleKind, u32)>,
    pub kerbals: f64,
    pub kerbal_capacity: f64,
    pub rates: ProductionRates,
    /// Mining-class modules counted by the colony; all of them yield.
    pub mining_modules: u32,
    /// Mining placements that actually sit on a deposit.
    pub active_mining_sites: u32,
    pub techs_researched: usize,
    pub oxygen_fraction: f64,
    pub distance_from_base: i32,
}

/// Compute statistics for the current session state.
pub fn compute_statistics(session: &Session) -> SessionStatistics {
    let colony = session.colony();
    let modules: Vec<(ModuleKind, u32)> = ModuleKind::ALL
        .iter()
        .map(|&k| (k, colony.count(k)))
        .filter(|&(_, n)| n > 0)
        .collect();
    let mining_modules = modules
        .iter()
        .filter(|(k, _)| k.class() == ModuleClass::Mining)
        .map(|&(_, n)| n)
        .sum();

    SessionStatistics {
        elapsed_ms: session.elapsed_ms(),
        resources: colony.resources.entries().collect(),
        modules,
        kerbals: colony.kerbals,
        kerbal_capacity: colony.kerbal_capacity(),
        rates: colony.production_rates(),
        mining_modules,
        active_mining_sites: session.active_mining_sites() as u32,
        techs_researched: colony.unlocked_techs().len(),
        oxygen_fraction: session.oxygen().fraction(),
        distance_from_base: session
            .grid()
            .wrapped_distance(session.avatar(), session.command_center()),
    }
}

/// Print a human-readable summary.
pub fn print_statistics(stats: &SessionStatistics) {
    println!("=== Colony Summary ===");
    println!("Elapsed: {:.1}s", stats.elapsed_ms as f64 / 1000.0);
    println!(
        "Kerbals: {:.2} / {:.0}",
        stats.kerbals, stats.kerbal_capacity
    );

    println!("\nResources:");
    for (kind, amount) in &stats.resources {
        println!("  {:<20} {:>10.1}", kind.name(), amount);
    }

    let r = &stats.rates;
    println!("\nRates (per second):");
    println!(
        "  Power      {:>+8.2}  ({:.1} gen, {:.1} use)",
        r.net_power(),
        r.power_gen,
        r.power_use
    );
    println!("  Snacks     {:>+8.2}", (r.snacks_gen - r.snacks_use) * r.power_factor);
    println!("  Materials  {:>+8.2}", r.materials_gen);
    println!("  Science    {:>+8.2}", r.science_gen * r.power_factor);
    if r.is_brownout() {
        println!("  BROWNOUT: power factor {:.2}", r.power_factor);
    }

    println!("\nModules:");
    for (kind, count) in &stats.modules {
        println!("  {:<20} {:>4}", kind.name(), count);
    }
    if stats.mining_modules > 0 {
        println!(
            "  ({} mining modules, {} on deposits)",
            stats.mining_modules, stats.active_mining_sites
        );
    }

    println!("\nTechnologies researched: {}", stats.techs_researched);
    if stats.oxygen_fraction < 1.0 {
        println!(
            "Oxygen: {:.0}% ({} tiles from base)",
            stats.oxygen_fraction * 100.0,
            stats.distance_from_base
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridParams;
    use crate::simulation::{Command, SessionSettings};

    #[test]
    fn fresh_session_statistics() {
        let session = Session::new(&GridParams::with_seed(9), SessionSettings::default(), 0);
        let stats = compute_statistics(&session);
        assert_eq!(stats.modules, vec![(ModuleKind::CommandCenter, 1)]);
        assert_eq!(stats.kerbals, 3.0);
        assert_eq!(stats.kerbal_capacity, 5.0);
        assert_eq!(stats.mining_modules, 0);
        assert_eq!(stats.techs_researched, 0);
        assert_eq!(stats.distance_from_base, 1);
        assert_eq!(stats.oxygen_fraction, 1.0);
        assert_eq!(stats.rates.power_gen, 10.0);
    }

    #[test]
    fn mining_sites_are_reported_separately() {
        let params = GridParams {
            seed: 4,
            width: 30,
            height: 30,
            deposit_chance: 1.0,
        };
        let mut session = Session::new(&params, SessionSettings::default(), 0);
        let cc = session.command_center();
        session.apply(
            Command::PlaceModule {
                kind: ModuleKind::MiningRig,
                x: cc.x + 1,
                y: cc.y + 1,
            },
            0,
        );
        let stats = compute_statistics(&session);
        assert_eq!(stats.mining_modules, 1);
        assert_eq!(stats.active_mining_sites, 1);
        assert_eq!(stats.rates.materials_gen, 2.0);
    }
}
