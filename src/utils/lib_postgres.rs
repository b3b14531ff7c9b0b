use postgres::{Client, NoTls};

use crate::config::DbConfig;

/// Open a connection with the configured values, as they are.
pub fn connect(config: &DbConfig) -> Result<Client, postgres::Error> {
    postgres::Config::new()
        .host(&config.host)
        .port(config.port)
        .dbname(&config.name)
        .user(&config.user)
        .password(&config.password)
        .connect(NoTls)
}
