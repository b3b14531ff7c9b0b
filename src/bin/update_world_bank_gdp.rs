use std::error::Error;
use std::path::Path;

use gdp_ingest::{
    config::DbConfig,
    db::{prod_db::ProdDb, world_bank::pg_destination::PostgresDestination},
};
use log::{error, info};

/// Replace the raw_gdp_data table with a fresh copy of the World Bank GDP
/// series.  Exits with a non-zero status if anything fails.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // values already set in the process environment take precedence
    if let Err(e) = dotenvy::from_path(Path::new(".env/prod.env")) {
        info!("No .env/prod.env loaded ({}), using the process environment", e);
    }
    let config = match DbConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let archive = ProdDb::world_bank_gdp();
    let destination = PostgresDestination::new(config);
    archive.update(&destination)?;

    Ok(())
}
