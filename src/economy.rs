use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deposits::ResourceKind;

pub const NO_EVENT: &str = "None";

/// The colony-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Population,
    Food,
    Power,
    Water,
    Metals,
    Marsium,
    Soldiers,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Counter::Population => "Population",
            Counter::Food => "Food",
            Counter::Power => "Power",
            Counter::Water => "Water",
            Counter::Metals => "Metals",
            Counter::Marsium => "Marsium",
            Counter::Soldiers => "Soldiers",
        };
        f.write_str(label)
    }
}

/// Per-capita consumption applied on every round advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRates {
    pub food: u32,
    pub water: u32,
}

impl Default for ConsumptionRates {
    fn default() -> Self {
        Self { food: 2, water: 1 }
    }
}

/// Dashboard state. Every counter is unsigned and every mutation saturates at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyState {
    pub population: u32,
    pub food: u32,
    pub power: u32,
    pub water: u32,
    pub metals: u32,
    pub marsium: u32,
    pub soldiers: u32,
    pub current_round: u32,
    pub rounds_total: u32,
    pub current_event: String,
    pub rates: ConsumptionRates,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self {
            population: 5,
            food: 50,
            power: 20,
            water: 30,
            metals: 20,
            marsium: 0,
            soldiers: 0,
            current_round: 1,
            rounds_total: 30,
            current_event: NO_EVENT.to_string(),
            rates: ConsumptionRates::default(),
        }
    }
}

impl EconomyState {
    pub fn get(&self, counter: Counter) -> u32 {
        match counter {
            Counter::Population => self.population,
            Counter::Food => self.food,
            Counter::Power => self.power,
            Counter::Water => self.water,
            Counter::Metals => self.metals,
            Counter::Marsium => self.marsium,
            Counter::Soldiers => self.soldiers,
        }
    }

    fn slot(&mut self, counter: Counter) -> &mut u32 {
        match counter {
            Counter::Population => &mut self.population,
            Counter::Food => &mut self.food,
            Counter::Power => &mut self.power,
            Counter::Water => &mut self.water,
            Counter::Metals => &mut self.metals,
            Counter::Marsium => &mut self.marsium,
            Counter::Soldiers => &mut self.soldiers,
        }
    }

    /// Apply a signed delta, clamping to `0..=u32::MAX`. Returns the new value.
    pub fn adjust(&mut self, counter: Counter, delta: i64) -> u32 {
        let slot = self.slot(counter);
        let next = (i64::from(*slot) + delta).clamp(0, i64::from(u32::MAX));
        *slot = next as u32;
        *slot
    }

    pub fn can_afford(&self, metals: u32) -> bool {
        self.metals >= metals
    }

    /// Deduct `metals` if all of it is available; otherwise leave state untouched.
    pub fn spend_metals(&mut self, metals: u32) -> bool {
        if !self.can_afford(metals) {
            return false;
        }
        self.metals -= metals;
        true
    }

    pub fn at_final_round(&self) -> bool {
        self.current_round >= self.rounds_total
    }

    /// Move to the next round unless the cap is reached.
    pub fn next_round(&mut self) -> bool {
        if self.at_final_round() {
            return false;
        }
        self.current_round += 1;
        true
    }

    /// Flat per-capita drain of food and water. Returns what was actually removed.
    pub fn consume(&mut self) -> (u32, u32) {
        let food_due = self.population.saturating_mul(self.rates.food);
        let water_due = self.population.saturating_mul(self.rates.water);
        let food = food_due.min(self.food);
        let water = water_due.min(self.water);
        self.food -= food;
        self.water -= water;
        (food, water)
    }

    /// Credit unit cargo to the counters using the refinery table.
    pub fn refine(&mut self, cargo: &BTreeMap<ResourceKind, u32>) -> Vec<(Counter, u32)> {
        let mut credited = Vec::new();
        for (kind, count) in cargo {
            if *count == 0 {
                continue;
            }
            let (counter, per_unit) = refine_yield(*kind);
            let amount = count.saturating_mul(per_unit);
            self.adjust(counter, i64::from(amount));
            credited.push((counter, amount));
        }
        credited
    }
}

/// Which counter a raw resource feeds and how much one unit is worth.
pub fn refine_yield(kind: ResourceKind) -> (Counter, u32) {
    match kind {
        ResourceKind::Iron => (Counter::Metals, 2),
        ResourceKind::Ice => (Counter::Water, 3),
        ResourceKind::Marsium => (Counter::Marsium, 1),
        ResourceKind::Rock => (Counter::Metals, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumption_scales_with_population() {
        let mut economy = EconomyState::default();
        economy.consume();
        assert_eq!(economy.food, 40);
        assert_eq!(economy.water, 25);
    }

    #[test]
    fn consumption_clamps_at_zero() {
        let mut economy = EconomyState {
            food: 1,
            water: 0,
            ..EconomyState::default()
        };
        assert_eq!(economy.consume(), (1, 0));
        assert_eq!(economy.food, 0);
        assert_eq!(economy.water, 0);
    }

    #[test]
    fn adjust_never_goes_negative() {
        let mut economy = EconomyState::default();
        assert_eq!(economy.adjust(Counter::Power, -500), 0);
        assert_eq!(economy.adjust(Counter::Soldiers, 3), 3);
    }

    #[test]
    fn round_counter_stops_at_cap() {
        let mut economy = EconomyState {
            current_round: 29,
            ..EconomyState::default()
        };
        assert!(economy.next_round());
        assert_eq!(economy.current_round, 30);
        assert!(!economy.next_round());
        assert_eq!(economy.current_round, 30);
    }

    #[test]
    fn spending_is_all_or_nothing() {
        let mut economy = EconomyState {
            metals: 4,
            ..EconomyState::default()
        };
        assert!(!economy.spend_metals(5));
        assert_eq!(economy.metals, 4);
        assert!(economy.spend_metals(4));
        assert_eq!(economy.metals, 0);
    }

    #[test]
    fn refining_uses_the_conversion_table() {
        let mut economy = EconomyState::default();
        let mut cargo = BTreeMap::new();
        cargo.insert(ResourceKind::Iron, 2);
        cargo.insert(ResourceKind::Ice, 1);
        cargo.insert(ResourceKind::Marsium, 1);
        economy.refine(&cargo);
        assert_eq!(economy.metals, 24);
        assert_eq!(economy.water, 33);
        assert_eq!(economy.marsium, 1);
    }
}
