pub mod duckdb_destination;
pub mod fetch;
pub mod gdp_archive;
pub mod indicator;
pub mod load;
pub mod pg_destination;
