use std::collections::BTreeMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Identifier as it arrives on the wire. The API is not strict about whether
/// ids are JSON numbers or numeric strings, so any JSON value is accepted here
/// (a missing field reads as `null`) and the value is coerced later by the
/// transform stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl Default for RawId {
    fn default() -> Self {
        RawId::Other(Value::Null)
    }
}

impl RawId {
    /// Coerces to an integer id. Fractional floats and non-numeric strings
    /// are rejected rather than mapped to a default.
    pub fn to_i64(&self, field: &str) -> Result<i64> {
        let coerced = match self {
            RawId::Int(n) => Some(*n),
            RawId::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(*f as i64)
            }
            RawId::Float(_) => None,
            RawId::Text(s) => s.trim().parse::<i64>().ok(),
            RawId::Other(_) => None,
        };
        coerced.ok_or_else(|| AppError::TypeCoercion {
            field: field.to_string(),
            value: self.to_string(),
        })
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Int(n) => write!(f, "{n}"),
            RawId::Float(x) => write!(f, "{x}"),
            RawId::Text(s) => write!(f, "{s}"),
            RawId::Other(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for RawId {
    fn from(n: i64) -> Self {
        RawId::Int(n)
    }
}

fn de_lenient_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer)?
        .to_i64("id")
        .map_err(de::Error::custom)
}

// ---------------------------------------------------------------------------
// API response shapes
// ---------------------------------------------------------------------------

/// One entry of `GET /combats`. Fields beyond the three roles are carried
/// through to the output table untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCombat {
    #[serde(default)]
    pub first_pokemon: RawId,
    #[serde(default)]
    pub second_pokemon: RawId,
    #[serde(default)]
    pub winner: RawId,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CombatPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub combats: Vec<RawCombat>,
}

/// Minimal creature entry from `GET /pokemon`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatureSummary {
    #[serde(default)]
    pub id: RawId,
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET /pokemon` page. Older deployments name the array `pokemons`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonPage {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub items: Option<Vec<CreatureSummary>>,
    #[serde(default)]
    pub pokemons: Option<Vec<CreatureSummary>>,
}

impl PokemonPage {
    pub fn into_items(self) -> Vec<CreatureSummary> {
        self.items.or(self.pokemons).unwrap_or_default()
    }
}

/// Full record from `GET /pokemon/{id}`.
///
/// Stats are read leniently: integral floats and numeric strings count as
/// integers, and `legendary` also accepts 0/1 and "true"/"false". A known
/// field whose value still cannot be read is kept verbatim in `unparsed` so
/// the details table can write it as returned.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "DetailWire")]
pub struct CreatureDetail {
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
    /// Delimited string ("fire/flying"); a JSON array of labels is joined
    /// with `/`.
    pub types: Option<String>,
    pub unparsed: BTreeMap<String, Value>,
    pub extra: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct DetailWire {
    #[serde(deserialize_with = "de_lenient_id")]
    id: i64,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl From<DetailWire> for CreatureDetail {
    fn from(wire: DetailWire) -> Self {
        let DetailWire { id, mut fields } = wire;
        let mut unparsed = BTreeMap::new();
        let f = &mut fields;
        let u = &mut unparsed;

        let name = take_field(f, u, "name", lenient_text);
        let hp = take_field(f, u, "hp", lenient_int);
        let attack = take_field(f, u, "attack", lenient_int);
        let defense = take_field(f, u, "defense", lenient_int);
        let sp_attack = take_field(f, u, "sp_attack", lenient_int);
        let sp_defense = take_field(f, u, "sp_defense", lenient_int);
        let speed = take_field(f, u, "speed", lenient_int);
        let generation = take_field(f, u, "generation", lenient_int);
        let legendary = take_field(f, u, "legendary", lenient_bool);
        let types = take_field(f, u, "types", lenient_types);

        Self {
            id,
            name,
            hp,
            attack,
            defense,
            sp_attack,
            sp_defense,
            speed,
            generation,
            legendary,
            types,
            unparsed,
            extra: fields,
        }
    }
}

/// Removes `key` from `fields` and coerces it. A non-null value that does not
/// coerce is moved to `unparsed`.
fn take_field<T>(
    fields: &mut BTreeMap<String, Value>,
    unparsed: &mut BTreeMap<String, Value>,
    key: &str,
    coerce: fn(&Value) -> Option<T>,
) -> Option<T> {
    let value = fields.remove(key)?;
    let typed = coerce(&value);
    if typed.is_none() && !value.is_null() {
        unparsed.insert(key.to_string(), value);
    }
    typed
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn lenient_int(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn lenient_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn lenient_text(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

fn lenient_types(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .map(|t| t.as_str())
            .collect::<Option<Vec<_>>>()
            .map(|labels| labels.join("/")),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

// ---------------------------------------------------------------------------
// Joined output
// ---------------------------------------------------------------------------

/// A battle after the name join, one row of the combats table.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatRecord {
    pub pokemon_1_id: i64,
    pub pokemon_2_id: i64,
    pub winner_id: i64,
    pub extra: BTreeMap<String, Value>,
    pub pokemon_1_name: Option<String>,
    pub pokemon_2_name: Option<String>,
    pub winner_name: Option<String>,
}
