use std::collections::HashMap;

use crate::table::CombatRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WinRateRow {
    pub name: String,
    pub wins: u64,
    pub appearances: u64,
    /// Percentage, rounded to 2 decimals.
    pub win_rate: f64,
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn sorted_counts(counts: HashMap<&str, u64>) -> Vec<NameCount> {
    let mut out: Vec<NameCount> = counts
        .into_iter()
        .map(|(name, count)| NameCount { name: name.to_string(), count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}

/// Wins per winner name, most wins first. Rows with no winner name are ignored.
pub fn win_counts(combats: &[CombatRow]) -> Vec<NameCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for name in combats.iter().filter_map(|c| c.winner_name.as_deref()) {
        *counts.entry(name).or_default() += 1;
    }
    sorted_counts(counts)
}

/// Rows in which a name appears as either participant. A creature fighting
/// itself counts twice, once per column.
pub fn appearance_counts(combats: &[CombatRow]) -> Vec<NameCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    let names = combats
        .iter()
        .flat_map(|c| [c.pokemon_1_name.as_deref(), c.pokemon_2_name.as_deref()])
        .flatten();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }
    sorted_counts(counts)
}

/// Win rate for every name with at least one win, best first (ties broken by
/// wins, then name).
pub fn win_rates(combats: &[CombatRow]) -> Vec<WinRateRow> {
    let appearances: HashMap<String, u64> = appearance_counts(combats)
        .into_iter()
        .map(|nc| (nc.name, nc.count))
        .collect();

    let mut rows: Vec<WinRateRow> = win_counts(combats)
        .into_iter()
        .filter_map(|w| {
            let total = *appearances.get(&w.name)?;
            Some(WinRateRow {
                win_rate: round2(w.count as f64 / total as f64 * 100.0),
                name: w.name,
                wins: w.count,
                appearances: total,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.win_rate
            .total_cmp(&a.win_rate)
            .then_with(|| b.wins.cmp(&a.wins))
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(p1: (i64, &str), p2: (i64, &str), winner: i64) -> CombatRow {
        let winner_name = if winner == p1.0 {
            Some(p1.1.to_string())
        } else if winner == p2.0 {
            Some(p2.1.to_string())
        } else {
            None
        };
        CombatRow {
            pokemon_1_id: p1.0,
            pokemon_2_id: p2.0,
            winner_id: winner,
            pokemon_1_name: Some(p1.1.to_string()),
            pokemon_2_name: Some(p2.1.to_string()),
            winner_name,
        }
    }

    fn sample() -> Vec<CombatRow> {
        vec![
            row((1, "A"), (2, "B"), 1),
            row((1, "A"), (3, "C"), 3),
            row((2, "B"), (3, "C"), 3),
            row((1, "A"), (2, "B"), 1),
            row((3, "C"), (1, "A"), 3),
        ]
    }

    #[test]
    fn counts_wins_and_appearances() {
        let combats = sample();
        assert_eq!(
            win_counts(&combats),
            vec![
                NameCount { name: "C".into(), count: 3 },
                NameCount { name: "A".into(), count: 2 },
            ]
        );
        let apps: HashMap<String, u64> = appearance_counts(&combats)
            .into_iter()
            .map(|n| (n.name, n.count))
            .collect();
        assert_eq!(apps["A"], 4);
        assert_eq!(apps["B"], 3);
        assert_eq!(apps["C"], 3);
    }

    #[test]
    fn win_rate_is_rounded_percentage_of_appearances() {
        let rates = win_rates(&sample());
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].name, "C");
        assert_eq!(rates[0].win_rate, 100.0);
        assert_eq!(rates[1].name, "A");
        assert_eq!((rates[1].wins, rates[1].appearances), (2, 4));
        assert_eq!(rates[1].win_rate, 50.0);
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        let combats = vec![
            row((1, "A"), (2, "B"), 1),
            row((1, "A"), (2, "B"), 2),
            row((1, "A"), (2, "B"), 2),
        ];
        let rates = win_rates(&combats);
        let a = rates.iter().find(|r| r.name == "A").unwrap();
        assert_eq!(a.win_rate, 33.33);
        let b = rates.iter().find(|r| r.name == "B").unwrap();
        assert_eq!(b.win_rate, 66.67);
    }

    #[test]
    fn win_rate_stays_within_bounds() {
        let mut combats = sample();
        combats.push(row((4, "D"), (2, "B"), 2));
        combats.push(CombatRow {
            pokemon_1_id: 8,
            pokemon_2_id: 9,
            winner_id: 8,
            pokemon_1_name: None,
            pokemon_2_name: None,
            winner_name: None,
        });
        let rates = win_rates(&combats);
        assert_eq!(rates.len(), 3);
        for r in rates {
            assert!(r.appearances > 0);
            assert!((0.0..=100.0).contains(&r.win_rate), "{r:?}");
        }
    }
}
