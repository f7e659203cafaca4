//! Summary and detail pipelines: validate the page query, fetch, reshape.

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    bitquery::{AggregateEntry, BitqueryClient, FetchError, TransferEntry},
    dates::{self, DateRangeError},
    models::{
        DetailParams, Direction, FlowAggregateRow, FlowSummary, SummaryParams, TransactionList,
        TransactionRow, UnknownDirection,
    },
};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Dates(#[from] DateRangeError),
    #[error(transparent)]
    Direction(#[from] UnknownDirection),
    #[error("{0} is required")]
    MissingParam(&'static str),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl FlowError {
    /// True when the page query itself was at fault.
    pub fn is_bad_request(&self) -> bool {
        !matches!(self, FlowError::Fetch(_))
    }
}

/// One row per aggregate, keyed by position.
pub fn aggregate_rows(entries: Vec<AggregateEntry>) -> Vec<FlowAggregateRow> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| FlowAggregateRow {
            key: index.to_string(),
            currency_symbol: entry.currency.symbol,
            contract_address: entry.currency.address,
            total_amount: entry.amount,
            transfer_count: entry.count,
        })
        .collect()
}

/// Rows for transfers whose symbol equals `symbol` exactly.
///
/// Keys are positions in the unfiltered list, so they stay unique but may skip.
pub fn transaction_rows(entries: Vec<TransferEntry>, symbol: &str) -> Vec<TransactionRow> {
    entries
        .into_iter()
        .enumerate()
        .filter(|(_, entry)| entry.currency.symbol == symbol)
        .map(|(index, entry)| TransactionRow {
            key: index.to_string(),
            timestamp: entry.time.time,
            transaction_id: entry.transaction.id,
            currency_symbol: entry.currency.symbol,
            amount: entry.amount,
        })
        .collect()
}

/// Inbound and outbound aggregates for the summary page.
///
/// Without an address nothing is fetched and both lists are empty.
pub async fn account_summary(
    client: &BitqueryClient,
    params: &SummaryParams,
) -> Result<FlowSummary, FlowError> {
    let Some(address) = params.address() else {
        debug!("No address given, skipping summary fetch");
        return Ok(FlowSummary::default());
    };

    let query = dates::address_query(
        address,
        params.start_date.as_deref(),
        params.end_date.as_deref(),
    )?;

    let (inputs, outputs) = tokio::try_join!(
        client.fetch_aggregates(&query, Direction::Input),
        client.fetch_aggregates(&query, Direction::Output),
    )?;

    let summary = FlowSummary {
        input_txs: aggregate_rows(inputs),
        output_txs: aggregate_rows(outputs),
    };

    info!(
        "Summary for {}: {} inbound, {} outbound currencies",
        query.address,
        summary.input_txs.len(),
        summary.output_txs.len()
    );

    Ok(summary)
}

/// Transfers of one currency in one direction for the detail page.
pub async fn transaction_detail(
    client: &BitqueryClient,
    params: &DetailParams,
) -> Result<TransactionList, FlowError> {
    let Some(address) = params.address() else {
        debug!("No address given, skipping transaction fetch");
        return Ok(TransactionList::default());
    };

    let direction: Direction = params
        .direction_type
        .as_deref()
        .ok_or(FlowError::MissingParam("directionType"))?
        .parse()?;

    let symbol = params
        .symbol
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(FlowError::MissingParam("symbol"))?;

    let query = dates::address_query(
        address,
        params.start_date.as_deref(),
        params.end_date.as_deref(),
    )?;

    let entries = client.fetch_transfers(&query, direction).await?;
    let fetched = entries.len();
    let txs = transaction_rows(entries, symbol);

    info!(
        "Detail for {} {} {}: kept {} of {} transfers",
        query.address,
        direction,
        symbol,
        txs.len(),
        fetched
    );

    Ok(TransactionList { txs })
}
