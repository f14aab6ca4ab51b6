use serde::Deserialize;

/// A combats-table row as read back by the dashboard. Passthrough columns are
/// not needed for analytics and are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CombatRow {
    pub pokemon_1_id: i64,
    pub pokemon_2_id: i64,
    pub winner_id: i64,
    pub pokemon_1_name: Option<String>,
    pub pokemon_2_name: Option<String>,
    pub winner_name: Option<String>,
}

impl CombatRow {
    /// The participant that is not the winner. When the winner matches
    /// neither participant, pokemon 1 counts as the loser.
    pub fn loser_id(&self) -> i64 {
        if self.pokemon_1_id != self.winner_id {
            self.pokemon_1_id
        } else {
            self.pokemon_2_id
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatureRow {
    pub id: i64,
    pub name: Option<String>,
    pub hp: Option<i64>,
    pub attack: Option<i64>,
    pub defense: Option<i64>,
    pub sp_attack: Option<i64>,
    pub sp_defense: Option<i64>,
    pub speed: Option<i64>,
    pub generation: Option<i64>,
    pub legendary: Option<bool>,
    pub types: Option<String>,
}

/// Header plus the first few raw rows of a file, for the samples view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TablePreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}
