// src/bitquery.rs
use reqwest::{header::HeaderMap, Client, StatusCode, Url};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    models::{AddressQuery, Direction, TransferCount},
    query::{self, GraphqlRequest},
};

/// Longest slice of an error body kept in `FetchError::Status`.
const BODY_EXCERPT_LEN: usize = 512;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("API key is not a valid header value")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
    #[error("request to Bitquery failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Bitquery responded with HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not encode or decode GraphQL payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Bitquery returned errors: {0}")]
    GraphQl(String),
    #[error("Bitquery response is missing `{0}`")]
    MissingData(&'static str),
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FlowData<T> {
    flow: Option<FlowSides<T>>,
}

/// Only the side that was queried is present in a response.
#[derive(Debug, Deserialize)]
struct FlowSides<T> {
    inputs: Option<Vec<T>>,
    outputs: Option<Vec<T>>,
}

impl<T> FlowSides<T> {
    fn take(self, direction: Direction) -> Result<Vec<T>, FetchError> {
        match direction {
            Direction::Input => self.inputs.ok_or(FetchError::MissingData("flow.inputs")),
            Direction::Output => self.outputs.ok_or(FetchError::MissingData("flow.outputs")),
        }
    }
}

/// Per-currency aggregate as returned by the summary query.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateEntry {
    pub amount: Decimal,
    pub count: TransferCount,
    pub currency: AggregateCurrency,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregateCurrency {
    pub address: String,
    pub symbol: String,
}

/// A single transfer as returned by the detail query.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferEntry {
    pub amount: Decimal,
    pub currency: TransferCurrency,
    pub time: TransferTime,
    pub transaction: TransferTransaction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferCurrency {
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferTime {
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferTransaction {
    pub id: String,
}

/// GraphQL client bound to one endpoint, API key and network.
#[derive(Debug, Clone)]
pub struct BitqueryClient {
    http: Client,
    endpoint: Url,
    headers: HeaderMap,
    network: String,
}

impl BitqueryClient {
    pub fn new(cfg: &Config) -> Result<Self, FetchError> {
        Ok(Self {
            http: Client::builder().build()?,
            endpoint: cfg.bitquery_url.clone(),
            headers: query::request_headers(&cfg.api_key)?,
            network: cfg.network.clone(),
        })
    }

    /// Aggregates for one direction, in the order Bitquery ranked them.
    pub async fn fetch_aggregates(
        &self,
        query: &AddressQuery,
        direction: Direction,
    ) -> Result<Vec<AggregateEntry>, FetchError> {
        let request = query::summary_request(query, &self.network, direction);
        info!(
            "📡 Fetching {} aggregates for {} ({} → {})",
            direction, query.address, query.start_date, query.end_date
        );
        self.post(&request, direction).await
    }

    /// Newest transfers for one direction, before any currency filtering.
    pub async fn fetch_transfers(
        &self,
        query: &AddressQuery,
        direction: Direction,
    ) -> Result<Vec<TransferEntry>, FetchError> {
        let request = query::detail_request(query, &self.network, direction);
        info!(
            "📡 Fetching {} transfers for {} ({} → {})",
            direction, query.address, query.start_date, query.end_date
        );
        self.post(&request, direction).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        request: &GraphqlRequest,
        direction: Direction,
    ) -> Result<Vec<T>, FetchError> {
        let body = serde_json::to_vec(request)?;

        let resp = self
            .http
            .post(self.endpoint.clone())
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            warn!("Bitquery HTTP {} for {} query", status, direction);
            return Err(FetchError::Status {
                status,
                body: excerpt(&text),
            });
        }

        let parsed: GraphqlResponse<FlowData<T>> = serde_json::from_str(&text)?;

        if !parsed.errors.is_empty() {
            let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(FetchError::GraphQl(messages.join("; ")));
        }

        let entries = parsed
            .data
            .ok_or(FetchError::MissingData("data"))?
            .flow
            .ok_or(FetchError::MissingData("flow"))?
            .take(direction)?;

        debug!("📩 {} {} entries from Bitquery", entries.len(), direction);
        Ok(entries)
    }
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn config_for(server: &MockServer) -> Config {
        crate::config::from_lookup(|key| match key {
            "BITQUERY_URL" => Some(format!("{}/graphql", server.uri())),
            "BITQUERY_API_KEY" => Some("test-key".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn sample_query() -> AddressQuery {
        AddressQuery {
            address: "0xabc".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        }
    }

    #[tokio::test]
    async fn aggregates_are_decoded_in_response_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(header("x-api-key", "test-key"))
            .and(header("content-type", "application/json; charset=utf-8"))
            .and(body_partial_json(json!({
                "variables": {
                    "address": "0xabc",
                    "network": "flow",
                    "limit": 10,
                    "offset": 0,
                    "from": "2024-01-01T00:00:00",
                    "till": "2024-01-02T23:59:59"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"flow": {"inputs": [
                    {"amount": 12.5, "count": "3", "currency": {"address": "0xabc", "symbol": "FLOW"}},
                    {"amount": 1, "count": "1", "currency": {"address": "0xdef", "symbol": "USDC"}}
                ]}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BitqueryClient::new(&config_for(&server)).unwrap();
        let entries = client
            .fetch_aggregates(&sample_query(), Direction::Input)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].currency.symbol, "FLOW");
        assert_eq!(entries[0].amount, Decimal::new(125, 1));
        assert_eq!(entries[1].count.to_string(), "1");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let client = BitqueryClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch_aggregates(&sample_query(), Direction::Output)
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn graphql_errors_are_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{"message": "Field 'bogus' doesn't exist"}, {"message": "second"}]
            })))
            .mount(&server)
            .await;

        let client = BitqueryClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch_transfers(&sample_query(), Direction::Input)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::GraphQl(ref m) if m == "Field 'bogus' doesn't exist; second"));
    }

    #[tokio::test]
    async fn missing_fields_fail_decoding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"flow": {"outputs": [
                    {"amount": 5, "currency": {"symbol": "FLOW"}, "time": {"time": "2024-01-01 00:00:00"}}
                ]}}
            })))
            .mount(&server)
            .await;

        let client = BitqueryClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch_transfers(&sample_query(), Direction::Output)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Json(_)));
    }

    #[tokio::test]
    async fn wrong_side_in_response_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"flow": {"inputs": []}}})),
            )
            .mount(&server)
            .await;

        let client = BitqueryClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch_aggregates(&sample_query(), Direction::Output)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::MissingData("flow.outputs")));
    }

    #[test]
    fn excerpt_truncates_long_bodies() {
        let long = "x".repeat(BODY_EXCERPT_LEN + 10);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), BODY_EXCERPT_LEN + 1);
        assert_eq!(excerpt("short"), "short");
    }
}
