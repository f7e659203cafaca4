// src/models.rs
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Which side of an address's flow a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Funds received by the address.
    Input,
    /// Funds sent by the address.
    Output,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Input, Direction::Output];

    /// GraphQL field selector under `flow { .. }`, and the `directionType` tag.
    pub fn field_name(self) -> &'static str {
        match self {
            Direction::Input => "inputs",
            Direction::Output => "outputs",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("directionType must be `inputs` or `outputs`, got `{0}`")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::ALL
            .into_iter()
            .find(|d| d.field_name() == s)
            .ok_or_else(|| UnknownDirection(s.to_string()))
    }
}

/// Address plus an inclusive calendar-day range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub address: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Arbitrary-precision transfer count, carried as its decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransferCount(String);

impl fmt::Display for TransferCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transfer count must be a non-negative integer, got `{0}`")]
pub struct InvalidTransferCount(pub String);

impl FromStr for TransferCount {
    type Err = InvalidTransferCount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(TransferCount(s.to_string()))
        } else {
            Err(InvalidTransferCount(s.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for TransferCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountVisitor;

        impl<'de> de::Visitor<'de> for CountVisitor {
            type Value = TransferCount;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an unsigned integer or a string of digits")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(TransferCount(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(|v| TransferCount(v.to_string()))
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(CountVisitor)
    }
}

/// One currency's aggregate for one direction, as shown in the summary tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowAggregateRow {
    pub key: String,
    #[serde(rename = "symbol")]
    pub currency_symbol: String,
    #[serde(rename = "address")]
    pub contract_address: String,
    #[serde(rename = "amount", serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_amount: Decimal,
    #[serde(rename = "count")]
    pub transfer_count: TransferCount,
}

/// A single transfer, as shown in the detail table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    pub key: String,
    pub timestamp: String,
    pub transaction_id: String,
    #[serde(rename = "symbol")]
    pub currency_symbol: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub amount: Decimal,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub input_txs: Vec<FlowAggregateRow>,
    pub output_txs: Vec<FlowAggregateRow>,
}

impl FlowSummary {
    pub fn rows(&self, direction: Direction) -> &[FlowAggregateRow] {
        match direction {
            Direction::Input => &self.input_txs,
            Direction::Output => &self.output_txs,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct TransactionList {
    pub txs: Vec<TransactionRow>,
}

/// Query string of the summary page, `/?address=..&startDate=..&endDate=..`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub address: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Query string of the detail page.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailParams {
    pub address: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub symbol: Option<String>,
    pub direction_type: Option<String>,
}

impl SummaryParams {
    /// `address` with surrounding whitespace removed; blank counts as absent.
    pub fn address(&self) -> Option<&str> {
        non_blank(self.address.as_deref())
    }
}

impl DetailParams {
    pub fn address(&self) -> Option<&str> {
        non_blank(self.address.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
