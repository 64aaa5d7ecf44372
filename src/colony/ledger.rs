use serde::{Deserialize, Serialize};

// === Resource kinds ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Power,
    Snacks,
    BuildingMaterials,
    Science,
}

impl ResourceKind {
    pub const COUNT: usize = 4;

    pub const ALL: [ResourceKind; Self::COUNT] = [
        ResourceKind::Power,
        ResourceKind::Snacks,
        ResourceKind::BuildingMaterials,
        ResourceKind::Science,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Power => "Power",
            ResourceKind::Snacks => "Snacks",
            ResourceKind::BuildingMaterials => "Building Materials",
            ResourceKind::Science => "Science",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// A build or research price: a list of (resource, amount) pairs.
/// Kinds not listed cost nothing.
pub type Cost = [(ResourceKind, f64)];

/// Resource amounts held by the colony.
///
/// The ledger enforces no bounds on `add`; callers clamp where a bound applies
/// (the tick clamps Snacks at zero). `remove` and `spend` never go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLedger {
    amounts: [f64; ResourceKind::COUNT],
}

impl Default for ResourceLedger {
    fn default() -> Self {
        Self {
            amounts: [0.0; ResourceKind::COUNT],
        }
    }
}

impl ResourceLedger {
    pub fn get(&self, kind: ResourceKind) -> f64 {
        self.amounts[kind.index()]
    }

    pub fn set(&mut self, kind: ResourceKind, amount: f64) {
        self.amounts[kind.index()] = amount;
    }

    pub fn add(&mut self, kind: ResourceKind, amount: f64) {
        self.amounts[kind.index()] += amount;
    }

    /// Deduct `amount` if at least that much is held. Leaves the ledger
    /// untouched and returns false otherwise.
    pub fn remove(&mut self, kind: ResourceKind, amount: f64) -> bool {
        let current = self.get(kind);
        if current >= amount {
            self.set(kind, current - amount);
            true
        } else {
            false
        }
    }

    pub fn can_afford(&self, cost: &Cost) -> bool {
        cost.iter().all(|&(kind, amount)| self.get(kind) >= amount)
    }

    /// All-or-nothing deduction of `cost`.
    pub fn spend(&mut self, cost: &Cost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        for &(kind, amount) in cost {
            self.amounts[kind.index()] -= amount;
        }
        true
    }

    /// (kind, amount) entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        ResourceKind::ALL.iter().map(move |&k| (k, self.get(k)))
    }
}

/// Render a cost as `"100 Building Materials, 50 Power"`.
pub fn format_cost(cost: &Cost) -> String {
    if cost.is_empty() {
        return "free".to_string();
    }
    cost.iter()
        .map(|(kind, amount)| format!("{} {}", amount, kind.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(power: f64, snacks: f64, materials: f64, science: f64) -> ResourceLedger {
        let mut l = ResourceLedger::default();
        l.set(ResourceKind::Power, power);
        l.set(ResourceKind::Snacks, snacks);
        l.set(ResourceKind::BuildingMaterials, materials);
        l.set(ResourceKind::Science, science);
        l
    }

    #[test]
    fn remove_succeeds_only_when_enough_is_held() {
        let mut l = ledger(10.0, 0.0, 0.0, 0.0);
        assert!(l.remove(ResourceKind::Power, 10.0));
        assert_eq!(l.get(ResourceKind::Power), 0.0);
        assert!(!l.remove(ResourceKind::Power, 0.5));
        assert_eq!(l.get(ResourceKind::Power), 0.0);
    }

    #[test]
    fn add_accepts_negative_amounts() {
        let mut l = ledger(0.0, 1.0, 0.0, 0.0);
        l.add(ResourceKind::Snacks, -3.0);
        assert_eq!(l.get(ResourceKind::Snacks), -2.0);
    }

    #[test]
    fn spend_is_all_or_nothing() {
        let mut l = ledger(40.0, 100.0, 500.0, 0.0);
        let before = l;
        let cost = [
            (ResourceKind::BuildingMaterials, 100.0),
            (ResourceKind::Power, 50.0),
        ];
        assert!(!l.can_afford(&cost));
        assert!(!l.spend(&cost));
        assert_eq!(l, before, "failed spend must not deduct anything");

        l.set(ResourceKind::Power, 50.0);
        assert!(l.spend(&cost));
        assert_eq!(l.get(ResourceKind::BuildingMaterials), 400.0);
        assert_eq!(l.get(ResourceKind::Power), 0.0);
    }

    #[test]
    fn empty_cost_is_always_affordable() {
        let mut l = ResourceLedger::default();
        assert!(l.can_afford(&[]));
        assert!(l.spend(&[]));
    }

    #[test]
    fn entries_follow_declaration_order() {
        let l = ledger(1.0, 2.0, 3.0, 4.0);
        let kinds: Vec<_> = l.entries().map(|(k, _)| k).collect();
        assert_eq!(kinds, ResourceKind::ALL.to_vec());
    }

    #[test]
    fn cost_formatting() {
        assert_eq!(format_cost(&[]), "free");
        assert_eq!(
            format_cost(&[(ResourceKind::BuildingMaterials, 120.0)]),
            "120 Building Materials"
        );
    }
}
