use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use maud::Markup;
use serde::Serialize;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    bitquery::BitqueryClient,
    config::Config,
    flows::{self, FlowError},
    models::{DetailParams, FlowSummary, SummaryParams, TransactionList},
    view,
};

#[derive(Clone)]
pub struct AppState {
    pub client: BitqueryClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, crate::bitquery::FetchError> {
        Ok(Self {
            client: BitqueryClient::new(&config)?,
            config: Arc::new(config),
        })
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Status for a failed flow plus the message safe to show a visitor.
fn classify(err: &FlowError) -> (StatusCode, String) {
    if err.is_bad_request() {
        warn!("Rejected page query: {}", err);
        (StatusCode::BAD_REQUEST, err.to_string())
    } else {
        error!("Upstream fetch failed: {}", err);
        (
            StatusCode::BAD_GATEWAY,
            "blockchain data service request failed".to_string(),
        )
    }
}

/// JSON error wrapper for the `/api` routes.
pub struct ApiError(FlowError);

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = classify(&self.0);
        (status, Json(ErrorBody { error })).into_response()
    }
}

fn html(markup: Markup) -> Html<String> {
    Html(markup.into_string())
}

/// Bad input re-renders the page with a banner; upstream failure gets the generic page.
fn page_error(err: FlowError, rerender: impl FnOnce(&str) -> Markup) -> Response {
    let (status, message) = classify(&err);
    if status == StatusCode::BAD_REQUEST {
        (status, html(rerender(&message))).into_response()
    } else {
        (status, html(view::failure_page())).into_response()
    }
}

async fn summary_page(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Response {
    let default_address = state.config.default_address.as_str();
    match flows::account_summary(&state.client, &params).await {
        Ok(summary) => html(view::summary_page(default_address, &params, &summary, None)).into_response(),
        Err(err) => page_error(err, |message| {
            view::summary_page(default_address, &params, &FlowSummary::default(), Some(message))
        }),
    }
}

async fn detail_page(
    State(state): State<AppState>,
    Query(params): Query<DetailParams>,
) -> Response {
    let explorer = state.config.explorer_tx_url.as_str();
    match flows::transaction_detail(&state.client, &params).await {
        Ok(list) => html(view::detail_page(explorer, &params, &list, None)).into_response(),
        Err(err) => page_error(err, |message| {
            view::detail_page(explorer, &params, &TransactionList::default(), Some(message))
        }),
    }
}

async fn flows_json(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<FlowSummary>, ApiError> {
    Ok(Json(flows::account_summary(&state.client, &params).await?))
}

async fn transactions_json(
    State(state): State<AppState>,
    Query(params): Query<DetailParams>,
) -> Result<Json<TransactionList>, ApiError> {
    Ok(Json(flows::transaction_detail(&state.client, &params).await?))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let json_api = Router::new()
        .route("/api/flows", get(flows_json))
        .route("/api/transactions", get(transactions_json))
        .layer(cors);

    Router::new()
        .route(view::SUMMARY_PATH, get(summary_page))
        .route(view::DETAIL_PATH, get(detail_page))
        .route("/health", get(|| async { "ok" }))
        .merge(json_api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState) -> eyre::Result<()> {
    let addr = state.config.listen_addr;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Flow explorer listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Could not listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received, stopping...");
        })
        .await?;

    Ok(())
}
