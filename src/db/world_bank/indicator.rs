// Wire and table shapes of the World Bank indicator API.
// https://datahelpdesk.worldbank.org/knowledgebase/articles/898581-api-basic-call-structures

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

use super::load::LoadError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Country {
    pub value: String,
}

/// One (country, year) observation as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndicatorRecord {
    pub country: Country,
    #[serde(rename = "countryiso3code")]
    pub country_iso3_code: String,
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_value")]
    pub value: Option<Decimal>,
}

impl IndicatorRecord {
    pub fn country_name(&self) -> &str {
        &self.country.value
    }
}

/// First element of every response.  Only `pages` drives the fetch loop.
/// Counts come back as numbers or numeric strings depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageMeta {
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub page: Option<u32>,
    #[serde(deserialize_with = "deserialize_count")]
    pub pages: u32,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub meta: PageMeta,
    pub records: Vec<IndicatorRecord>,
}

impl Page {
    /// Parse the `[metadata, records]` array.  A `null` record list, which the
    /// API sends for pages without data, is an empty page.
    pub fn from_json(body: &str) -> Result<Page, serde_json::Error> {
        let (meta, records): (PageMeta, Option<Vec<IndicatorRecord>>) =
            serde_json::from_str(body)?;
        Ok(Page {
            meta,
            records: records.unwrap_or_default(),
        })
    }
}

/// The API reports values as JSON numbers, sometimes in exponent notation.
/// With `arbitrary_precision` a number keeps its literal text, which goes
/// straight to `Decimal` so no binary float rounding sneaks in.
fn deserialize_value<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(de::Error::custom(format!(
                "expected a number or null, got {}",
                other
            )))
        }
    };
    parse_decimal(&text)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("invalid numeric value '{}'", text)))
}

fn deserialize_count<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let text = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s,
        other => return Err(de::Error::custom(format!("expected a count, got {}", other))),
    };
    text.trim()
        .parse::<T>()
        .map_err(|_| de::Error::custom(format!("invalid count '{}'", text)))
}

fn deserialize_optional_count<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(v) => deserialize_count(v).map(Some).map_err(de::Error::custom),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// A record as it lands in the destination table.  The `id` column is filled
/// in by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub country_name: String,
    pub country_iso3_code: String,
    pub year: i32,
    pub gdp_usd: Option<Decimal>,
}

impl StoredRow {
    pub fn from_record(index: usize, record: &IndicatorRecord) -> Result<StoredRow, LoadError> {
        let year = record
            .date
            .trim()
            .parse::<i32>()
            .map_err(|_| LoadError::InvalidYear {
                index,
                date: record.date.clone(),
            })?;
        Ok(StoredRow {
            country_name: record.country_name().to_string(),
            country_iso3_code: record.country_iso3_code.clone(),
            year,
            gdp_usd: record.value,
        })
    }
}

/// Map records to rows one for one, keeping the input order.
pub fn to_stored_rows(records: &[IndicatorRecord]) -> Result<Vec<StoredRow>, LoadError> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| StoredRow::from_record(i, record))
        .collect()
}

#[cfg(test)]
pub(crate) fn record(country: &str, iso3: &str, date: &str, value: Option<Decimal>) -> IndicatorRecord {
    IndicatorRecord {
        country: Country {
            value: country.to_string(),
        },
        country_iso3_code: iso3.to_string(),
        date: date.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use std::error::Error;

    use super::*;

    const PAGE_ONE: &str = r#"[
        {"page":1,"pages":17,"per_page":1000,"total":16758,"sourceid":"2","lastupdated":"2025-07-01"},
        [
            {"indicator":{"id":"NY.GDP.MKTP.CD","value":"GDP (current US$)"},
             "country":{"id":"1W","value":"World"},"countryiso3code":"WLD","date":"2020",
             "value":85000000000000,"unit":"","obs_status":"","decimal":0},
            {"indicator":{"id":"NY.GDP.MKTP.CD","value":"GDP (current US$)"},
             "country":{"id":"1W","value":"World"},"countryiso3code":"WLD","date":"2021",
             "value":null,"unit":"","obs_status":"","decimal":0},
            {"indicator":{"id":"NY.GDP.MKTP.CD","value":"GDP (current US$)"},
             "country":{"id":"AF","value":"Afghanistan"},"countryiso3code":"AFG","date":"2019",
             "value":1.87993e10,"unit":"","obs_status":"","decimal":0}
        ]
    ]"#;

    #[test]
    fn parse_page() -> Result<(), Box<dyn Error>> {
        let page = Page::from_json(PAGE_ONE)?;
        assert_eq!(page.meta.pages, 17);
        assert_eq!(page.meta.page, Some(1));
        assert_eq!(page.meta.total, Some(16758));
        assert_eq!(page.records.len(), 3);
        assert_eq!(page.records[0].country_name(), "World");
        assert_eq!(page.records[0].country_iso3_code, "WLD");
        assert_eq!(page.records[0].value, Some(dec!(85000000000000)));
        assert_eq!(page.records[1].value, None);
        assert_eq!(page.records[2].value, Some(dec!(18799300000)));
        Ok(())
    }

    #[test]
    fn parse_string_value() -> Result<(), Box<dyn Error>> {
        let body = r#"[{"pages":1},[{"country":{"value":"World"},"countryiso3code":"WLD",
            "date":"2020","value":"90000000000"}]]"#;
        let page = Page::from_json(body)?;
        assert_eq!(page.records[0].value, Some(dec!(90000000000)));
        Ok(())
    }

    #[test]
    fn long_values_are_not_rounded() -> Result<(), Box<dyn Error>> {
        let body = r#"[{"pages":1},[
            {"country":{"value":"World"},"countryiso3code":"WLD","date":"2020",
             "value":12345678901234567.891},
            {"country":{"value":"World"},"countryiso3code":"WLD","date":"2021",
             "value":1.0000000000000000001E+20}
        ]]"#;
        let page = Page::from_json(body)?;
        assert_eq!(page.records[0].value, Some(dec!(12345678901234567.891)));
        assert_eq!(page.records[1].value, Some(dec!(100000000000000000001)));
        Ok(())
    }

    #[test]
    fn counts_as_strings() -> Result<(), Box<dyn Error>> {
        let page = Page::from_json(r#"[{"page":"2","pages":"3","per_page":"1000","total":"2500"},[]]"#)?;
        assert_eq!(page.meta.page, Some(2));
        assert_eq!(page.meta.pages, 3);
        assert_eq!(page.meta.total, Some(2500));
        Ok(())
    }

    #[test]
    fn null_record_list_is_empty() -> Result<(), Box<dyn Error>> {
        let page = Page::from_json(r#"[{"page":1,"pages":0,"total":0},null]"#)?;
        assert_eq!(page.meta.pages, 0);
        assert!(page.records.is_empty());
        Ok(())
    }

    #[test]
    fn reject_bad_shapes() {
        // error payload of the API: a single message element
        assert!(Page::from_json(r#"[{"message":[{"id":"120","key":"Invalid value"}]}]"#).is_err());
        // metadata without the page count
        assert!(Page::from_json(r#"[{"page":1},[]]"#).is_err());
        // record without a country
        assert!(Page::from_json(
            r#"[{"pages":1},[{"countryiso3code":"WLD","date":"2020","value":null}]]"#
        )
        .is_err());
        assert!(Page::from_json(r#"{"pages":1}"#).is_err());
        assert!(Page::from_json("<html>Service unavailable</html>").is_err());
        // value that is not a number
        assert!(Page::from_json(
            r#"[{"pages":1},[{"country":{"value":"World"},"countryiso3code":"WLD","date":"2020","value":"n/a"}]]"#
        )
        .is_err());
    }

    #[test]
    fn stored_rows_keep_order() -> Result<(), Box<dyn Error>> {
        let records = vec![
            record("World", "WLD", "2020", Some(dec!(90000000000))),
            record("World", "WLD", "2021", None),
            record("Aruba", "ABW", " 1999 ", Some(dec!(1.5))),
        ];
        let rows = to_stored_rows(&records)?;
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows.iter().map(|r| r.year).collect::<Vec<_>>(),
            vec![2020, 2021, 1999]
        );
        assert_eq!(rows[1].gdp_usd, None);
        assert_eq!(rows[2].country_name, "Aruba");
        assert_eq!(rows[2].country_iso3_code, "ABW");
        Ok(())
    }

    #[test]
    fn bad_date_fails() {
        let records = vec![
            record("World", "WLD", "2020", None),
            record("World", "WLD", "2020Q1", None),
        ];
        match to_stored_rows(&records) {
            Err(LoadError::InvalidYear { index, date }) => {
                assert_eq!(index, 1);
                assert_eq!(date, "2020Q1");
            }
            other => panic!("expected an invalid year, got {:?}", other),
        }
    }
}
