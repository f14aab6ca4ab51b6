use std::path::Path;

use tracing::{info, warn};

use crate::client::{ApiClient, Transport};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::fetcher::{fetch_combats, fetch_pokemon_details, fetch_pokemon_list, DetailStats};
use crate::table::writer::{write_combats_file, write_details_file};
use crate::transform::transform;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub combats_fetched: usize,
    pub pokemon_listed: usize,
    pub details: DetailStats,
    /// Rows written to the combats table; `None` when the load was skipped.
    pub rows_written: Option<usize>,
}

/// One full extraction run: login, the three extractions in order, then the
/// transform and both writes. The writes are skipped when either the combat
/// or the pokemon list came back empty.
pub async fn run<T: Transport>(client: &mut ApiClient<T>, cfg: &Config) -> Result<RunReport> {
    let session = client
        .login(&cfg.username, &cfg.password)
        .await
        .ok_or_else(|| AppError::Auth(format!("no access token from {}/login", cfg.base_url)))?;
    client.set_session(session);

    info!("Starting combat extraction");
    let combats = fetch_combats(client, cfg.combats_per_page).await;

    info!("Starting pokemon list extraction");
    let pokemon = fetch_pokemon_list(client, cfg.pokemon_per_page).await;

    info!("Starting pokemon detail extraction");
    let (details, detail_stats) = fetch_pokemon_details(client, &pokemon).await;

    let mut report = RunReport {
        combats_fetched: combats.len(),
        pokemon_listed: pokemon.len(),
        details: detail_stats,
        rows_written: None,
    };

    if combats.is_empty() || pokemon.is_empty() {
        warn!(
            combats = combats.len(),
            pokemon = pokemon.len(),
            "Combat or pokemon data missing, skipping transform and load"
        );
        return Ok(report);
    }

    info!("Starting transform and load");
    let rows = transform(&combats, &pokemon)?;
    write_combats_file(Path::new(&cfg.combats_csv), &rows)?;
    write_details_file(Path::new(&cfg.details_csv), &details)?;
    report.rows_written = Some(rows.len());

    Ok(report)
}
