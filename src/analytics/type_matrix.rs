use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::table::{CombatRow, CreatureRow};

/// A type field naming more than one label ("fire/flying", "grass,poison").
pub fn is_composite(types: &str) -> bool {
    types.contains('/') || types.contains(',')
}

/// id → type for creatures carrying exactly one type tag. Creatures with no
/// type or a composite one are left out; a repeated id keeps its first row.
pub fn single_type_lookup(creatures: &[CreatureRow]) -> HashMap<i64, &str> {
    let mut lookup = HashMap::new();
    for c in creatures {
        if let Some(t) = c.types.as_deref().filter(|t| !is_composite(t)) {
            lookup.entry(c.id).or_insert(t);
        }
    }
    lookup
}

/// (winner type, loser type) for a battle, or `None` when either side has no
/// single type in the lookup.
pub fn matchup<'a>(combat: &CombatRow, lookup: &HashMap<i64, &'a str>) -> Option<(&'a str, &'a str)> {
    let winner = *lookup.get(&combat.winner_id)?;
    let loser = *lookup.get(&combat.loser_id())?;
    Some((winner, loser))
}

/// Battle counts by (winner type, loser type), single-type creatures only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeMatrix {
    cells: BTreeMap<(String, String), u64>,
}

impl TypeMatrix {
    pub fn build(combats: &[CombatRow], creatures: &[CreatureRow]) -> Self {
        let lookup = single_type_lookup(creatures);
        let mut cells: BTreeMap<(String, String), u64> = BTreeMap::new();
        for (w, l) in combats.iter().filter_map(|c| matchup(c, &lookup)) {
            *cells.entry((w.to_string(), l.to_string())).or_default() += 1;
        }
        Self { cells }
    }

    /// Count for a pair; pairs never seen read as 0.
    pub fn get(&self, winner_type: &str, loser_type: &str) -> u64 {
        self.cells
            .get(&(winner_type.to_string(), loser_type.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn winner_types(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.cells.keys().map(|(w, _)| w.as_str()).collect();
        set.into_iter().collect()
    }

    pub fn loser_types(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.cells.keys().map(|(_, l)| l.as_str()).collect();
        set.into_iter().collect()
    }

    pub fn total(&self) -> u64 {
        self.cells.values().sum()
    }

    pub fn max_count(&self) -> u64 {
        self.cells.values().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The loser type with the largest column sum; the alphabetically first
    /// one wins a tie.
    pub fn most_beaten_type(&self) -> Option<(&str, u64)> {
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for ((_, l), count) in &self.cells {
            *totals.entry(l.as_str()).or_default() += count;
        }
        let mut best: Option<(&str, u64)> = None;
        for (t, n) in totals {
            if best.map_or(true, |(_, b)| n > b) {
                best = Some((t, n));
            }
        }
        best
    }
}
