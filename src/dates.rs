use chrono::NaiveDate;
use thiserror::Error;

use crate::models::AddressQuery;

/// Calendar dates travel as `YYYY-MM-DD` in page query strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} `{value}` is not a YYYY-MM-DD date")]
    Invalid { field: &'static str, value: String },
    #[error("startDate {start} is after endDate {end}")]
    Reversed { start: NaiveDate, end: NaiveDate },
}

fn parse_field(field: &'static str, value: Option<&str>) -> Result<NaiveDate, DateRangeError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(DateRangeError::Missing(field))?;

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DateRangeError::Invalid {
        field,
        value: value.to_string(),
    })
}

/// Validate an address and inclusive date range taken from a page query.
pub fn address_query(
    address: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<AddressQuery, DateRangeError> {
    let start = parse_field("startDate", start_date)?;
    let end = parse_field("endDate", end_date)?;

    if start > end {
        return Err(DateRangeError::Reversed { start, end });
    }

    Ok(AddressQuery {
        address: address.to_string(),
        start_date: start,
        end_date: end,
    })
}

/// First second of the range, `YYYY-MM-DDT00:00:00`.
pub fn since(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format(DATE_FORMAT))
}

/// Last second of the range, `YYYY-MM-DDT23:59:59`.
pub fn till(date: NaiveDate) -> String {
    format!("{}T23:59:59", date.format(DATE_FORMAT))
}
