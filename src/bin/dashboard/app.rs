use std::path::{Path, PathBuf};

use combat_etl::analytics::DashboardData;
use combat_etl::error::Result;
use combat_etl::table::reader::{preview_file, read_combats_file, read_creatures_file};
use combat_etl::table::TablePreview;
use ratatui::style::Color;

/// Rows shown per file on the samples tab.
pub const SAMPLE_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Stats,
    Matchups,
    Samples,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Overview, Tab::Stats, Tab::Matchups, Tab::Samples];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Stats => "Stats",
            Tab::Matchups => "Type matchups",
            Tab::Samples => "Samples",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loaded,
    Error(String),
}

pub struct Snapshot {
    pub data: DashboardData,
    pub combats_preview: TablePreview,
    pub details_preview: TablePreview,
}

impl Snapshot {
    /// Reads both tables and recomputes every aggregate. Nothing is cached
    /// between loads.
    pub fn load(combats_path: &Path, details_path: &Path) -> Result<Self> {
        let combats = read_combats_file(combats_path)?;
        let creatures = read_creatures_file(details_path)?;
        Ok(Self {
            data: DashboardData::compute(&combats, &creatures)?,
            combats_preview: preview_file(combats_path, SAMPLE_ROWS)?,
            details_preview: preview_file(details_path, SAMPLE_ROWS)?,
        })
    }
}

pub struct AppState {
    pub combats_path: PathBuf,
    pub details_path: PathBuf,
    pub snapshot: Snapshot,
    pub status: LoadStatus,
    pub tab: Tab,
    /// First visible row of the scrollable table on the current tab.
    pub scroll: usize,
}

impl AppState {
    /// Initial load. A missing or unreadable file is returned to the caller.
    pub fn new(combats_path: PathBuf, details_path: PathBuf) -> Result<Self> {
        let snapshot = Snapshot::load(&combats_path, &details_path)?;
        Ok(Self {
            combats_path,
            details_path,
            snapshot,
            status: LoadStatus::Loaded,
            tab: Tab::Overview,
            scroll: 0,
        })
    }

    /// Re-reads the files. On failure the previous snapshot stays on screen
    /// and the error is shown in the header.
    pub fn reload(&mut self) {
        match Snapshot::load(&self.combats_path, &self.details_path) {
            Ok(s) => {
                self.snapshot = s;
                self.status = LoadStatus::Loaded;
                self.scroll = 0;
            }
            Err(e) => self.status = LoadStatus::Error(e.to_string()),
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        let max = self.scroll_len().saturating_sub(1);
        self.scroll = (self.scroll + 1).min(max);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    fn scroll_len(&self) -> usize {
        let data = &self.snapshot.data;
        match self.tab {
            Tab::Overview => data.win_rates.len(),
            Tab::Stats => data.winner_profiles.len(),
            Tab::Matchups => data.matrix.winner_types().len(),
            Tab::Samples => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_rate(rate: f64) -> String {
    format!("{rate:.2}%")
}

pub fn format_opt<T: ToString>(v: Option<T>) -> String {
    v.map_or("—".to_string(), |x| x.to_string())
}

/// Heat colour for a matrix cell relative to the largest cell.
pub fn heat_color(count: u64, max: u64) -> Color {
    if count == 0 || max == 0 {
        return Color::DarkGray;
    }
    let ratio = count as f64 / max as f64;
    if ratio >= 0.75 {
        Color::LightRed
    } else if ratio >= 0.5 {
        Color::Yellow
    } else if ratio >= 0.25 {
        Color::Cyan
    } else {
        Color::Blue
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
