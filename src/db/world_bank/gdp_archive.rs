// GDP in current US$ for every country and aggregate, all years.
// https://data.worldbank.org/indicator/NY.GDP.MKTP.CD

use log::{error, info};
use std::error::Error;

use super::fetch::{fetch_all, FetchError, HttpPageSource};
use super::indicator::IndicatorRecord;
use super::load::{load, Destination, LoadError, LoadOutcome};

#[derive(Clone)]
pub struct WorldBankGdpArchive {
    pub api_url: String,
    pub per_page: u32,
}

impl WorldBankGdpArchive {
    /// Download the full history, one page at a time.  All or nothing.
    pub fn fetch(&self) -> Result<Vec<IndicatorRecord>, FetchError> {
        let source = HttpPageSource::new(&self.api_url, self.per_page)?;
        fetch_all(&source)
    }

    /// Replace the destination table with the records.
    pub fn load<D: Destination + ?Sized>(
        &self,
        destination: &D,
        records: &[IndicatorRecord],
    ) -> Result<LoadOutcome, LoadError> {
        load(destination, records)
    }

    /// Fetch, then load.  The destination is not touched if the fetch fails.
    pub fn update<D: Destination + ?Sized>(
        &self,
        destination: &D,
    ) -> Result<LoadOutcome, Box<dyn Error>> {
        let records = self.fetch()?;
        match self.load(destination, &records) {
            Ok(outcome) => {
                info!("{:?} for {}", outcome, destination.describe());
                Ok(outcome)
            }
            Err(e) => {
                error!("Database error: {}", e);
                Err(e.into())
            }
        }
    }
}
