use log::{error, info, warn};
use postgres::binary_copy::BinaryCopyInWriter;
use postgres::types::Type;
use postgres::{Client, Transaction};

use super::indicator::{to_stored_rows, IndicatorRecord};
use super::load::{Destination, LoadError, LoadStage, TABLE_NAME};
use crate::config::DbConfig;
use crate::utils::lib_postgres;

const DROP_TABLE_SQL: &str = "DROP TABLE IF EXISTS raw_gdp_data;";

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE raw_gdp_data (
    id SERIAL PRIMARY KEY,
    country_name TEXT,
    country_iso3_code VARCHAR(3),
    year INT,
    gdp_usd NUMERIC
);"#;

const COPY_ROWS_SQL: &str =
    "COPY raw_gdp_data (country_name, country_iso3_code, year, gdp_usd) FROM STDIN BINARY";

const COPY_ROW_TYPES: [Type; 4] = [Type::TEXT, Type::VARCHAR, Type::INT4, Type::NUMERIC];

pub struct PostgresDestination {
    pub config: DbConfig,
}

impl PostgresDestination {
    pub fn new(config: DbConfig) -> PostgresDestination {
        PostgresDestination { config }
    }
}

fn pg_error(stage: LoadStage) -> impl Fn(postgres::Error) -> LoadError {
    move |source| LoadError::Postgres { stage, source }
}

impl Destination for PostgresDestination {
    fn describe(&self) -> String {
        format!("postgres {}", self.config)
    }

    fn replace_table(&self, records: &[IndicatorRecord]) -> Result<u64, LoadError> {
        let mut client = lib_postgres::connect(&self.config).map_err(pg_error(LoadStage::Connect))?;
        info!("Successfully connected to PostgreSQL.");

        let res = replace_in_transaction(&mut client, records);

        match client.close() {
            Ok(()) => info!("Database connection closed."),
            Err(e) => warn!("Failed to close the database connection cleanly: {}", e),
        }
        res
    }
}

fn replace_in_transaction(client: &mut Client, records: &[IndicatorRecord]) -> Result<u64, LoadError> {
    let mut tx = client.transaction().map_err(pg_error(LoadStage::Begin))?;
    match write_table(&mut tx, records) {
        Ok(n) => {
            tx.commit().map_err(pg_error(LoadStage::Commit))?;
            Ok(n)
        }
        Err(e) => {
            error!("Loading failed at step '{}': {}", e.stage(), e);
            match tx.rollback() {
                Ok(()) => info!("Transaction rolled back, {} is unchanged.", TABLE_NAME),
                Err(rb) => error!("Rollback failed: {}", rb),
            }
            Err(e)
        }
    }
}

fn write_table(tx: &mut Transaction<'_>, records: &[IndicatorRecord]) -> Result<u64, LoadError> {
    info!("Dropping table '{}' if it exists...", TABLE_NAME);
    tx.batch_execute(DROP_TABLE_SQL)
        .map_err(pg_error(LoadStage::DropTable))?;

    info!("Creating table '{}'...", TABLE_NAME);
    tx.batch_execute(CREATE_TABLE_SQL)
        .map_err(pg_error(LoadStage::CreateTable))?;

    let rows = to_stored_rows(records)?;
    info!("Inserting {} records into the database...", rows.len());
    let sink = tx
        .copy_in(COPY_ROWS_SQL)
        .map_err(pg_error(LoadStage::InsertRows))?;
    let mut writer = BinaryCopyInWriter::new(sink, &COPY_ROW_TYPES);
    for row in &rows {
        writer
            .write(&[
                &row.country_name,
                &row.country_iso3_code,
                &row.year,
                &row.gdp_usd,
            ])
            .map_err(pg_error(LoadStage::InsertRows))?;
    }
    writer.finish().map_err(pg_error(LoadStage::InsertRows))
}
