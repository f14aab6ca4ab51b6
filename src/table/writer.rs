use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::Value;
use tracing::info;

use super::{COMBAT_ID_COLUMNS, COMBAT_NAME_COLUMNS, DETAIL_COLUMNS};
use crate::error::Result;
use crate::types::{CombatRecord, CreatureDetail};

fn cell(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Typed value when there is one, otherwise whatever the API sent for `key`.
fn stat<T: ToString>(v: &Option<T>, unparsed: &BTreeMap<String, Value>, key: &str) -> String {
    match v {
        Some(x) => x.to_string(),
        None => unparsed.get(key).map(cell).unwrap_or_default(),
    }
}

/// Union of passthrough keys over all rows, sorted, minus any that would
/// shadow a fixed column.
fn passthrough_columns<'a, I>(maps: I, fixed: &[&str]) -> Vec<String>
where
    I: Iterator<Item = &'a BTreeMap<String, Value>>,
{
    let keys: BTreeSet<&String> = maps.flat_map(|m| m.keys()).collect();
    keys.into_iter()
        .filter(|k| !fixed.contains(&k.as_str()))
        .cloned()
        .collect()
}

fn extra_cells(extra: &BTreeMap<String, Value>, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|c| extra.get(c).map(cell).unwrap_or_default())
        .collect()
}

pub fn write_combats<W: Write>(out: W, rows: &[CombatRecord]) -> Result<()> {
    let fixed: Vec<&str> = COMBAT_ID_COLUMNS.iter().chain(&COMBAT_NAME_COLUMNS).copied().collect();
    let extras = passthrough_columns(rows.iter().map(|r| &r.extra), &fixed);

    let mut writer = csv::Writer::from_writer(out);
    let header: Vec<&str> = COMBAT_ID_COLUMNS
        .iter()
        .copied()
        .chain(extras.iter().map(String::as_str))
        .chain(COMBAT_NAME_COLUMNS.iter().copied())
        .collect();
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.pokemon_1_id.to_string(),
            row.pokemon_2_id.to_string(),
            row.winner_id.to_string(),
        ];
        record.extend(extra_cells(&row.extra, &extras));
        record.push(opt(&row.pokemon_1_name));
        record.push(opt(&row.pokemon_2_name));
        record.push(opt(&row.winner_name));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_details<W: Write>(out: W, details: &[CreatureDetail]) -> Result<()> {
    let extras = passthrough_columns(details.iter().map(|d| &d.extra), &DETAIL_COLUMNS);

    let mut writer = csv::Writer::from_writer(out);
    let header: Vec<&str> = DETAIL_COLUMNS
        .iter()
        .copied()
        .chain(extras.iter().map(String::as_str))
        .collect();
    writer.write_record(&header)?;

    for d in details {
        let mut record = vec![
            d.id.to_string(),
            stat(&d.name, &d.unparsed, "name"),
            stat(&d.hp, &d.unparsed, "hp"),
            stat(&d.attack, &d.unparsed, "attack"),
            stat(&d.defense, &d.unparsed, "defense"),
            stat(&d.sp_attack, &d.unparsed, "sp_attack"),
            stat(&d.sp_defense, &d.unparsed, "sp_defense"),
            stat(&d.speed, &d.unparsed, "speed"),
            stat(&d.generation, &d.unparsed, "generation"),
            stat(&d.legendary, &d.unparsed, "legendary"),
            stat(&d.types, &d.unparsed, "types"),
        ];
        record.extend(extra_cells(&d.extra, &extras));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_combats_file(path: &Path, rows: &[CombatRecord]) -> Result<()> {
    write_combats(BufWriter::new(File::create(path)?), rows)?;
    info!(path = %path.display(), rows = rows.len(), "Combats table written");
    Ok(())
}

pub fn write_details_file(path: &Path, details: &[CreatureDetail]) -> Result<()> {
    write_details(BufWriter::new(File::create(path)?), details)?;
    info!(path = %path.display(), rows = details.len(), "Pokemon details table written");
    Ok(())
}
