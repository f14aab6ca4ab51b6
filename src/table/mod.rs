pub mod models;
pub mod reader;
pub mod writer;

pub use models::{CombatRow, CreatureRow, TablePreview};

/// Fixed leading columns of the combats table.
pub const COMBAT_ID_COLUMNS: [&str; 3] = ["pokemon_1_id", "pokemon_2_id", "winner_id"];

/// Fixed trailing columns of the combats table.
pub const COMBAT_NAME_COLUMNS: [&str; 3] = ["pokemon_1_name", "pokemon_2_name", "winner_name"];

/// Fixed leading columns of the details table.
pub const DETAIL_COLUMNS: [&str; 11] = [
    "id",
    "name",
    "hp",
    "attack",
    "defense",
    "sp_attack",
    "sp_defense",
    "speed",
    "generation",
    "legendary",
    "types",
];
