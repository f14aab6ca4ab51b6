use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use combat_etl::client::ApiClient;
use combat_etl::config::Config;
use combat_etl::error::Result;
use combat_etl::pipeline;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let mut client = ApiClient::from_config(&cfg)?;
    info!(
        "Extracting from {} (combats/page={}, pokemon/page={}, max_retries={})",
        cfg.base_url, cfg.combats_per_page, cfg.pokemon_per_page, cfg.max_retries,
    );

    let report = pipeline::run(&mut client, &cfg).await?;

    match report.rows_written {
        Some(rows) => info!(
            "ETL complete: {rows} combat rows -> {}, {} pokemon details -> {} ({} skipped)",
            cfg.combats_csv, report.details.fetched, cfg.details_csv, report.details.skipped,
        ),
        None => info!(
            "ETL finished without writing: {} combats, {} pokemon fetched",
            report.combats_fetched, report.pokemon_listed,
        ),
    }
    Ok(())
}
