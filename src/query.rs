// src/query.rs
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, CONTENT_TYPE};
use serde::Serialize;

use crate::{
    dates::{since, till},
    models::{AddressQuery, Direction},
};

/// Both flows fetch a single page.
pub const PAGE_LIMIT: u32 = 10;
pub const PAGE_OFFSET: u32 = 0;

pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";
pub static API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Body of a POST to the GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: FlowVariables,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVariables {
    pub limit: u32,
    pub offset: u32,
    pub address: String,
    pub network: String,
    pub from: String,
    pub till: String,
    pub date_format: &'static str,
}

impl FlowVariables {
    fn new(query: &AddressQuery, network: &str) -> Self {
        Self {
            limit: PAGE_LIMIT,
            offset: PAGE_OFFSET,
            address: query.address.clone(),
            network: network.to_string(),
            from: since(query.start_date),
            till: till(query.end_date),
            date_format: "%Y-%m-%d",
        }
    }
}

const QUERY_PARAMS: &str = "$network: FlowNetwork!, $limit: Int!, $offset: Int!, \
     $from: ISO8601DateTime, $till: ISO8601DateTime, $address: String!";

/// Per-currency sum and count for one direction, highest count first.
fn aggregate_document(direction: Direction) -> String {
    format!(
        r#"query ({params}) {{
  flow(network: $network) {{
    {field}(options: {{limit: $limit, offset: $offset, desc: "count"}}, date: {{since: $from, till: $till}}, address: {{is: $address}}) {{
      amount(calculate: sum, address: {{is: $address}})
      count: countBigInt(address: {{is: $address}})
      currency {{
        address
        symbol
      }}
    }}
  }}
}}
"#,
        params = QUERY_PARAMS,
        field = direction.field_name(),
    )
}

/// Raw transfers for one direction, newest first.
fn transfers_document(direction: Direction) -> String {
    format!(
        r#"query ({params}) {{
  flow(network: $network) {{
    {field}(options: {{desc: "time.time", limit: $limit, offset: $offset}}, date: {{since: $from, till: $till}}, address: {{is: $address}}) {{
      time {{
        time(format: "%Y-%m-%d %H:%M:%S")
      }}
      transaction {{
        id
      }}
      currency {{
        symbol
      }}
      amount
    }}
  }}
}}
"#,
        params = QUERY_PARAMS,
        field = direction.field_name(),
    )
}

/// Aggregate query for one direction of the summary page.
pub fn summary_request(query: &AddressQuery, network: &str, direction: Direction) -> GraphqlRequest {
    GraphqlRequest {
        query: aggregate_document(direction),
        variables: FlowVariables::new(query, network),
    }
}

pub fn detail_request(query: &AddressQuery, network: &str, direction: Direction) -> GraphqlRequest {
    GraphqlRequest {
        query: transfers_document(direction),
        variables: FlowVariables::new(query, network),
    }
}

/// Headers every request carries.
pub fn request_headers(api_key: &str) -> Result<HeaderMap, InvalidHeaderValue> {
    let mut key = HeaderValue::from_str(api_key)?;
    key.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    headers.insert(API_KEY_HEADER.clone(), key);
    Ok(headers)
}
