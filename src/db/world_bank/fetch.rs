use log::{error, info};
use reqwest::{blocking::Client, StatusCode};
use thiserror::Error;

use super::indicator::{IndicatorRecord, Page};

/// Largest page the API accepts without complaint.
pub const PER_PAGE: u32 = 1000;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request for page {page} failed: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("request for page {page} returned status {status}")]
    Status { page: u32, status: StatusCode },
    #[error("unexpected response format for page {page}: {source}")]
    Shape {
        page: u32,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Headline for the log: a body that doesn't parse is not a failed request.
    pub fn summary(&self) -> &'static str {
        match self {
            FetchError::Shape { .. } => "Error parsing API response format",
            _ => "Error fetching data from the API",
        }
    }
}

/// Where pages come from.  One call, one page, no retries.
pub trait PageSource {
    fn fetch_page(&self, page: u32) -> Result<Page, FetchError>;
}

pub struct HttpPageSource {
    client: Client,
    url: String,
    per_page: u32,
}

impl HttpPageSource {
    pub fn new(url: &str, per_page: u32) -> Result<HttpPageSource, FetchError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(HttpPageSource {
            client,
            url: url.to_string(),
            per_page,
        })
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, page: u32) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("format", "json".to_string()),
                ("page", page.to_string()),
                ("per_page", self.per_page.to_string()),
            ])
            .send()
            .map_err(|source| FetchError::Transport { page, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { page, status });
        }
        let body = response
            .text()
            .map_err(|source| FetchError::Transport { page, source })?;
        Page::from_json(&body).map_err(|source| FetchError::Shape { page, source })
    }
}

/// Walk all the pages and return every record, in page order.
///
/// The page count reported with the first page is the upper bound for the
/// whole walk, later pages can't move it.  The first failure aborts the walk
/// and the records collected so far are dropped.
pub fn fetch_all<S: PageSource + ?Sized>(source: &S) -> Result<Vec<IndicatorRecord>, FetchError> {
    let mut all_records: Vec<IndicatorRecord> = Vec::new();
    let mut page = 1;
    let mut total_pages: Option<u32> = None;

    info!("Starting data ingestion from the World Bank API...");
    loop {
        let data = match source.fetch_page(page) {
            Ok(data) => data,
            Err(e) => {
                error!("{}: {}", e.summary(), e);
                return Err(e);
            }
        };
        let last_page = *total_pages.get_or_insert(data.meta.pages);
        all_records.extend(data.records);
        info!("Successfully fetched page {}/{}.", page, last_page);

        if page >= last_page {
            break;
        }
        page += 1;
    }

    info!("Total records fetched: {}", all_records.len());
    Ok(all_records)
}
