use duckdb::{params, Connection, Transaction};
use log::{error, info, warn};

use super::indicator::{to_stored_rows, IndicatorRecord};
use super::load::{Destination, LoadError, LoadStage, TABLE_NAME};

// DuckDB has no SERIAL, the id comes from a sequence that is recreated
// together with the table so ids restart at 1 on every run.  VARCHAR(n) is
// not enforced by DuckDB, hence the CHECK.  DECIMAL needs a fixed scale, wide
// enough for every value the API reports; longer fractions are refused rather
// than rounded by the cast.
const DROP_TABLE_SQL: &str = r#"
DROP TABLE IF EXISTS raw_gdp_data;
DROP SEQUENCE IF EXISTS raw_gdp_data_id_seq;
"#;

const CREATE_TABLE_SQL: &str = r#"
CREATE SEQUENCE raw_gdp_data_id_seq START 1;
CREATE TABLE raw_gdp_data (
    id INTEGER PRIMARY KEY DEFAULT nextval('raw_gdp_data_id_seq'),
    country_name VARCHAR,
    country_iso3_code VARCHAR(3) CHECK (length(country_iso3_code) <= 3),
    year INTEGER,
    gdp_usd DECIMAL(38,18)
);"#;

const INSERT_ROW_SQL: &str = r#"
INSERT INTO raw_gdp_data (country_name, country_iso3_code, year, gdp_usd)
VALUES (?, ?, ?, CAST(? AS DECIMAL(38,18)));"#;

/// Scale of the `gdp_usd` column.
pub const GDP_USD_SCALE: u32 = 18;

/// Local DuckDB file as the destination.
#[derive(Clone)]
pub struct DuckDbDestination {
    pub duckdb_path: String,
}

impl DuckDbDestination {
    pub fn new(duckdb_path: &str) -> DuckDbDestination {
        DuckDbDestination {
            duckdb_path: duckdb_path.to_string(),
        }
    }
}

fn duckdb_error(stage: LoadStage) -> impl Fn(duckdb::Error) -> LoadError {
    move |source| LoadError::DuckDb { stage, source }
}

impl Destination for DuckDbDestination {
    fn describe(&self) -> String {
        format!("duckdb {}", self.duckdb_path)
    }

    fn replace_table(&self, records: &[IndicatorRecord]) -> Result<u64, LoadError> {
        let mut conn =
            Connection::open(&self.duckdb_path).map_err(duckdb_error(LoadStage::Connect))?;
        info!("Opened DuckDB file {}", self.duckdb_path);

        let res = replace_in_transaction(&mut conn, records);

        match conn.close() {
            Ok(()) => info!("Database connection closed."),
            Err((_, e)) => warn!("Failed to close the database connection cleanly: {}", e),
        }
        res
    }
}

fn replace_in_transaction(conn: &mut Connection, records: &[IndicatorRecord]) -> Result<u64, LoadError> {
    let tx = conn.transaction().map_err(duckdb_error(LoadStage::Begin))?;
    match write_table(&tx, records) {
        Ok(n) => {
            tx.commit().map_err(duckdb_error(LoadStage::Commit))?;
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

fn write_table(tx: &Transaction<'_>, records: &[IndicatorRecord]) -> Result<u64, LoadError> {
    info!("Dropping table '{}' if it exists...", TABLE_NAME);
    tx.execute_batch(DROP_TABLE_SQL)
        .map_err(duckdb_error(LoadStage::DropTable))?;

    info!("Creating table '{}'...", TABLE_NAME);
    tx.execute_batch(CREATE_TABLE_SQL)
        .map_err(duckdb_error(LoadStage::CreateTable))?;

    let rows = to_stored_rows(records)?;
    info!("Inserting {} records into the database...", rows.len());
    let mut stmt = tx
        .prepare(INSERT_ROW_SQL)
        .map_err(duckdb_error(LoadStage::InsertRows))?;
    let mut n: u64 = 0;
    for (index, row) in rows.iter().enumerate() {
        // bound as text, the cast keeps the value exact
        let gdp_usd = match row.gdp_usd {
            Some(v) if v.normalize().scale() > GDP_USD_SCALE => {
                return Err(LoadError::InexactValue {
                    index,
                    value: v,
                    scale: GDP_USD_SCALE,
                })
            }
            Some(v) => Some(v.to_string()),
            None => None,
        };
        n += stmt
            .execute(params![
                row.country_name,
                row.country_iso3_code,
                row.year,
                gdp_usd
            ])
            .map_err(duckdb_error(LoadStage::InsertRows))? as u64;
    }
    Ok(n)
}
