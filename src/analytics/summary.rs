use std::collections::{HashMap, HashSet};

use super::distribution::{distribution, Distribution};
use super::type_matrix::TypeMatrix;
use super::win_rate::{round2, win_counts, win_rates, NameCount, WinRateRow};
use crate::error::Result;
use crate::table::{CombatRow, CreatureRow};

pub const TOP_N: usize = 10;
pub const SPEED_BINS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneralStats {
    pub total_combats: usize,
    /// Distinct non-null names across both participant columns.
    pub unique_pokemon: usize,
}

pub fn general_stats(combats: &[CombatRow]) -> GeneralStats {
    let names: HashSet<&str> = combats
        .iter()
        .flat_map(|c| [c.pokemon_1_name.as_deref(), c.pokemon_2_name.as_deref()])
        .flatten()
        .collect();
    GeneralStats {
        total_combats: combats.len(),
        unique_pokemon: names.len(),
    }
}

/// id → detail row, first occurrence of a repeated id.
fn detail_index(creatures: &[CreatureRow]) -> HashMap<i64, &CreatureRow> {
    let mut index = HashMap::new();
    for c in creatures {
        index.entry(c.id).or_insert(c);
    }
    index
}

/// Mean attack of the winner over all battles whose winner has a known
/// attack stat, rounded to 2 decimals.
pub fn average_winner_attack(combats: &[CombatRow], creatures: &[CreatureRow]) -> Option<f64> {
    let index = detail_index(creatures);
    let attacks: Vec<i64> = combats
        .iter()
        .filter_map(|c| index.get(&c.winner_id).and_then(|d| d.attack))
        .collect();
    if attacks.is_empty() {
        return None;
    }
    let sum: i64 = attacks.iter().sum();
    Some(round2(sum as f64 / attacks.len() as f64))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerProfile {
    pub name: String,
    pub wins: u64,
    pub attack: Option<i64>,
    pub defense: Option<i64>,
}

/// Attack and defense of the `n` most frequent winners. Stats come from the
/// detail row of the winner id the name was first seen with.
pub fn top_winner_profiles(combats: &[CombatRow], creatures: &[CreatureRow], n: usize) -> Vec<WinnerProfile> {
    let index = detail_index(creatures);
    let mut id_by_name: HashMap<&str, i64> = HashMap::new();
    for c in combats {
        if let Some(name) = c.winner_name.as_deref() {
            id_by_name.entry(name).or_insert(c.winner_id);
        }
    }

    win_counts(combats)
        .into_iter()
        .take(n)
        .map(|NameCount { name, count }| {
            let detail = id_by_name
                .get(name.as_str())
                .and_then(|id| index.get(id));
            WinnerProfile {
                attack: detail.and_then(|d| d.attack),
                defense: detail.and_then(|d| d.defense),
                name,
                wins: count,
            }
        })
        .collect()
}

/// Everything the dashboard shows, recomputed from the two tables.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub general: GeneralStats,
    pub top_winners: Vec<NameCount>,
    pub win_rates: Vec<WinRateRow>,
    pub avg_winner_attack: Option<f64>,
    pub winner_profiles: Vec<WinnerProfile>,
    pub speed: Option<Distribution>,
    pub matrix: TypeMatrix,
}

impl DashboardData {
    pub fn compute(combats: &[CombatRow], creatures: &[CreatureRow]) -> Result<Self> {
        let mut top_winners = win_counts(combats);
        top_winners.truncate(TOP_N);

        Ok(Self {
            general: general_stats(combats),
            top_winners,
            win_rates: win_rates(combats),
            avg_winner_attack: average_winner_attack(combats, creatures),
            winner_profiles: top_winner_profiles(combats, creatures, TOP_N),
            speed: distribution(creatures.iter().filter_map(|c| c.speed), SPEED_BINS)?,
            matrix: TypeMatrix::build(combats, creatures),
        })
    }
}
