//! HTML rendering for the summary and transaction pages.

use maud::{html, Markup, DOCTYPE};
use serde::Serialize;
use tracing::warn;

use crate::models::{
    DetailParams, Direction, FlowAggregateRow, FlowSummary, SummaryParams, TransactionList,
};

pub const SUMMARY_PATH: &str = "/";
pub const DETAIL_PATH: &str = "/transaction";

const STYLE: &str = "
body { font-family: sans-serif; margin: 2rem; }
.home-container { max-width: 960px; }
table { border-collapse: collapse; width: 100%; margin-bottom: 1.5rem; }
th, td { border-bottom: 1px solid #ddd; padding: .4rem .6rem; text-align: left; }
tbody tr:hover { background: #f5f5f5; }
.error { color: #a00; }
.empty { color: #888; text-align: center; }
";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeLink<'a> {
    address: &'a str,
    start_date: &'a str,
    end_date: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailLink<'a> {
    address: &'a str,
    start_date: &'a str,
    end_date: &'a str,
    symbol: &'a str,
    direction_type: &'static str,
}

fn with_query<T: Serialize>(path: &str, query: &T) -> String {
    match serde_urlencoded::to_string(query) {
        Ok(qs) => format!("{}?{}", path, qs),
        Err(e) => {
            warn!("Could not encode link query for {}: {}", path, e);
            path.to_string()
        }
    }
}

/// Link from a summary row to its transactions.
pub fn detail_href(
    address: &str,
    start_date: &str,
    end_date: &str,
    symbol: &str,
    direction: Direction,
) -> String {
    with_query(
        DETAIL_PATH,
        &DetailLink {
            address,
            start_date,
            end_date,
            symbol,
            direction_type: direction.field_name(),
        },
    )
}

/// Link back to the summary for the same address and range.
pub fn summary_href(address: &str, start_date: &str, end_date: &str) -> String {
    with_query(
        SUMMARY_PATH,
        &RangeLink {
            address,
            start_date,
            end_date,
        },
    )
}

pub fn explorer_href(explorer_tx_url: &str, transaction_id: &str) -> String {
    format!("{}{}", explorer_tx_url, transaction_id)
}

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (STYLE) }
            }
            body {
                div.home-container { (content) }
            }
        }
    }
}

fn error_banner(error: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = error {
            p.error role="alert" { (message) }
        }
    }
}

fn aggregate_table(
    caption: &str,
    rows: &[FlowAggregateRow],
    direction: Direction,
    range: (&str, &str, &str),
) -> Markup {
    let (address, start_date, end_date) = range;
    html! {
        table id=(format!("{}-table", direction)) {
            caption { (caption) }
            thead {
                tr {
                    th { "Currency" }
                    th { "Smart Contract Address" }
                    th { "Amount" }
                    th { "Count" }
                }
            }
            tbody {
                @for row in rows {
                    @let href = detail_href(address, start_date, end_date, &row.currency_symbol, direction);
                    tr data-key=(row.key) {
                        td { a href=(href) { (row.currency_symbol) } }
                        td { (row.contract_address) }
                        td { (row.total_amount) }
                        td { (row.transfer_count) }
                    }
                }
                @if rows.is_empty() {
                    tr { td.empty colspan="4" { "No data" } }
                }
            }
        }
    }
}

/// Search form plus the inbound and outbound currency tables.
pub fn summary_page(
    default_address: &str,
    params: &SummaryParams,
    summary: &FlowSummary,
    error: Option<&str>,
) -> Markup {
    let address = params.address().unwrap_or(default_address);
    let start_date = params.start_date.as_deref().unwrap_or_default();
    let end_date = params.end_date.as_deref().unwrap_or_default();
    let range = (address, start_date, end_date);

    let content = html! {
        form method="get" action=(SUMMARY_PATH) {
            input type="search" name="address" placeholder="input address" value=(address);
            " "
            input type="date" name="startDate" value=(start_date);
            " "
            input type="date" name="endDate" value=(end_date);
            " "
            button type="submit" { "Search" }
        }
        (error_banner(error))
        (aggregate_table("Currencies received", summary.rows(Direction::Input), Direction::Input, range))
        (aggregate_table("Currencies sent", summary.rows(Direction::Output), Direction::Output, range))
    };

    layout("Flow account summary", content)
}

/// Transfers of one currency, each linked to the block explorer.
pub fn detail_page(
    explorer_tx_url: &str,
    params: &DetailParams,
    list: &TransactionList,
    error: Option<&str>,
) -> Markup {
    let back = summary_href(
        params.address().unwrap_or_default(),
        params.start_date.as_deref().unwrap_or_default(),
        params.end_date.as_deref().unwrap_or_default(),
    );

    let content = html! {
        a href=(back) { "Back" }
        (error_banner(error))
        table id="transactions-table" {
            caption { "Transactions" }
            thead {
                tr {
                    th { "Timestamp" }
                    th { "Transaction ID" }
                    th { "Amount" }
                    th { "Currency" }
                }
            }
            tbody {
                @for tx in &list.txs {
                    tr data-key=(tx.key) {
                        td { (tx.timestamp) }
                        td {
                            a target="_blank" rel="noopener noreferrer"
                                href=(explorer_href(explorer_tx_url, &tx.transaction_id)) {
                                (tx.transaction_id)
                            }
                        }
                        td { (tx.amount) }
                        td { (tx.currency_symbol) }
                    }
                }
                @if list.txs.is_empty() {
                    tr { td.empty colspan="4" { "No data" } }
                }
            }
        }
    };

    layout("Flow transactions", content)
}

/// Shown when the upstream API fails; details stay in the logs.
pub fn failure_page() -> Markup {
    layout(
        "Something went wrong",
        html! {
            h1 { "Something went wrong" }
            p { "The blockchain data service could not be reached. Please try again later." }
            a href=(SUMMARY_PATH) { "Back to search" }
        },
    )
}
