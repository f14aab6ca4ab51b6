use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use super::{CombatRow, CreatureRow, TablePreview};
use crate::error::Result;

fn read_rows<D: DeserializeOwned, R: Read>(input: R) -> Result<Vec<D>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

pub fn read_combats<R: Read>(input: R) -> Result<Vec<CombatRow>> {
    read_rows(input)
}

pub fn read_creatures<R: Read>(input: R) -> Result<Vec<CreatureRow>> {
    read_rows(input)
}

pub fn read_combats_file(path: &Path) -> Result<Vec<CombatRow>> {
    read_combats(File::open(path)?)
}

pub fn read_creatures_file(path: &Path) -> Result<Vec<CreatureRow>> {
    read_creatures(File::open(path)?)
}

/// Header and up to `limit` rows, as raw strings.
pub fn preview<R: Read>(input: R, limit: usize) -> Result<TablePreview> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records().take(limit) {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(TablePreview { headers, rows })
}

pub fn preview_file(path: &Path, limit: usize) -> Result<TablePreview> {
    preview(File::open(path)?, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::writer::write_combats;
    use crate::types::CombatRecord;

    #[test]
    fn written_combats_read_back_with_null_names() {
        let mut extra = std::collections::BTreeMap::new();
        extra.insert("id".to_string(), serde_json::Value::from(5));
        let rows = vec![CombatRecord {
            pokemon_1_id: 1,
            pokemon_2_id: 2,
            winner_id: 2,
            extra,
            pokemon_1_name: Some("A".into()),
            pokemon_2_name: None,
            winner_name: None,
        }];
        let mut buf = Vec::new();
        write_combats(&mut buf, &rows).unwrap();

        let back = read_combats(buf.as_slice()).unwrap();
        assert_eq!(
            back,
            vec![CombatRow {
                pokemon_1_id: 1,
                pokemon_2_id: 2,
                winner_id: 2,
                pokemon_1_name: Some("A".into()),
                pokemon_2_name: None,
                winner_name: None,
            }]
        );
    }

    #[test]
    fn creature_rows_parse_missing_stats_as_none() {
        let csv = "id,name,hp,attack,defense,sp_attack,sp_defense,speed,generation,legendary,types\n\
                   4,Charmander,39,52,,60,50,65,1,false,fire\n";
        let rows = read_creatures(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].id, 4);
        assert_eq!(rows[0].defense, None);
        assert_eq!(rows[0].legendary, Some(false));
        assert_eq!(rows[0].types.as_deref(), Some("fire"));
    }

    #[test]
    fn non_numeric_id_in_file_is_an_error() {
        let csv = "pokemon_1_id,pokemon_2_id,winner_id,pokemon_1_name,pokemon_2_name,winner_name\n\
                   x,2,2,A,B,B\n";
        assert!(read_combats(csv.as_bytes()).is_err());
    }

    #[test]
    fn preview_limits_rows() {
        let csv = "a,b\n1,2\n3,4\n5,6\n";
        let p = preview(csv.as_bytes(), 2).unwrap();
        assert_eq!(p.headers, vec!["a", "b"]);
        assert_eq!(p.rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_combats_file(Path::new("/nonexistent/combats.csv")).unwrap_err();
        assert!(matches!(err, crate::error::AppError::Io(_)));
    }
}
