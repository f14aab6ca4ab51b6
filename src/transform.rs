use std::collections::HashMap;

use tracing::info;

use crate::error::Result;
use crate::types::{CombatRecord, CreatureSummary, RawCombat};

/// Creature id → names, in list order. A list can carry the same id more than
/// once; every occurrence is kept so the join behaves like a relational one.
struct NameIndex {
    names: HashMap<i64, Vec<Option<String>>>,
}

impl NameIndex {
    fn build(creatures: &[CreatureSummary]) -> Result<Self> {
        let mut names: HashMap<i64, Vec<Option<String>>> = HashMap::new();
        for creature in creatures {
            let id = creature.id.to_i64("pokemon_id")?;
            names.entry(id).or_default().push(creature.name.clone());
        }
        Ok(Self { names })
    }

    /// Left-join lookup: an unknown id yields a single null name.
    fn lookup(&self, id: i64) -> &[Option<String>] {
        const UNMATCHED: &[Option<String>] = &[None];
        self.names.get(&id).map(Vec::as_slice).unwrap_or(UNMATCHED)
    }
}

/// Renames the raw role fields, coerces every identifier to an integer and
/// attaches the name for each role. Battles referencing an unknown id are
/// kept with a null name. Fails on the first identifier that is not an integer.
pub fn transform(combats: &[RawCombat], creatures: &[CreatureSummary]) -> Result<Vec<CombatRecord>> {
    let index = NameIndex::build(creatures)?;
    let mut rows = Vec::with_capacity(combats.len());

    for combat in combats {
        let pokemon_1_id = combat.first_pokemon.to_i64("pokemon_1_id")?;
        let pokemon_2_id = combat.second_pokemon.to_i64("pokemon_2_id")?;
        let winner_id = combat.winner.to_i64("winner_id")?;

        for pokemon_1_name in index.lookup(pokemon_1_id) {
            for pokemon_2_name in index.lookup(pokemon_2_id) {
                for winner_name in index.lookup(winner_id) {
                    rows.push(CombatRecord {
                        pokemon_1_id,
                        pokemon_2_id,
                        winner_id,
                        extra: combat.extra.clone(),
                        pokemon_1_name: pokemon_1_name.clone(),
                        pokemon_2_name: pokemon_2_name.clone(),
                        winner_name: winner_name.clone(),
                    });
                }
            }
        }
    }

    info!(
        combats = combats.len(),
        rows = rows.len(),
        "Transform complete: {} combats joined into {} rows",
        combats.len(),
        rows.len()
    );
    Ok(rows)
}
