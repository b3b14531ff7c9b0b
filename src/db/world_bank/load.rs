use log::info;
use rust_decimal::Decimal;
use std::fmt::Display;
use thiserror::Error;

use super::indicator::IndicatorRecord;

/// Destination table.  Recreated on every run.
pub const TABLE_NAME: &str = "raw_gdp_data";

/// Steps of one load, in order.  Used to say where a load went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Connect,
    Begin,
    DropTable,
    CreateTable,
    InsertRows,
    Commit,
}

impl Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use LoadStage::*;
        match self {
            Connect => write!(f, "connect"),
            Begin => write!(f, "begin transaction"),
            DropTable => write!(f, "drop table"),
            CreateTable => write!(f, "create table"),
            InsertRows => write!(f, "insert rows"),
            Commit => write!(f, "commit"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("postgres error at step '{stage}': {source}")]
    Postgres {
        stage: LoadStage,
        #[source]
        source: postgres::Error,
    },
    #[error("duckdb error at step '{stage}': {source}")]
    DuckDb {
        stage: LoadStage,
        #[source]
        source: duckdb::Error,
    },
    #[error("record {index} has a date that is not a year: '{date}'")]
    InvalidYear { index: usize, date: String },
    #[error("record {index} has a value with more than {scale} decimal places: {value}")]
    InexactValue {
        index: usize,
        value: Decimal,
        scale: u32,
    },
}

impl LoadError {
    /// The step that failed.  Bad record contents surface while inserting.
    pub fn stage(&self) -> LoadStage {
        match self {
            LoadError::Postgres { stage, .. } | LoadError::DuckDb { stage, .. } => *stage,
            LoadError::InvalidYear { .. } | LoadError::InexactValue { .. } => {
                LoadStage::InsertRows
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was passed in, the database was not touched.
    NoData,
    /// The table was replaced with this many rows.
    Loaded(u64),
}

/// A database that can swap out the destination table.
///
/// Implementations drop, recreate and fill the table inside a single
/// transaction: on error they roll back, so the previous table survives.
/// The connection is closed before returning, whatever the outcome.
pub trait Destination {
    /// Where the data goes, for log messages.  Must not reveal credentials.
    fn describe(&self) -> String;

    fn replace_table(&self, records: &[IndicatorRecord]) -> Result<u64, LoadError>;
}

/// Replace the destination table with `records`.  An empty slice is a no-op.
pub fn load<D: Destination + ?Sized>(
    destination: &D,
    records: &[IndicatorRecord],
) -> Result<LoadOutcome, LoadError> {
    if records.is_empty() {
        info!("No data to load.");
        return Ok(LoadOutcome::NoData);
    }
    info!(
        "Loading {} records into {} ({})",
        records.len(),
        TABLE_NAME,
        destination.describe()
    );
    let n = destination.replace_table(records)?;
    info!("Data loaded successfully! {} rows in {}", n, TABLE_NAME);
    Ok(LoadOutcome::Loaded(n))
}
