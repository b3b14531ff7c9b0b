use crate::db::world_bank::{fetch::PER_PAGE, gdp_archive::WorldBankGdpArchive};

pub struct ProdDb {}

impl ProdDb {
    pub fn world_bank_gdp() -> WorldBankGdpArchive {
        WorldBankGdpArchive {
            api_url: "https://api.worldbank.org/v2/country/all/indicator/NY.GDP.MKTP.CD"
                .to_string(),
            per_page: PER_PAGE,
        }
    }
}
