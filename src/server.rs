// Chipset History - HTTP API
//
// Stateless: every request carries its full set of periods and gets its
// own comparison. No state is shared between requests.

use crate::comparator::HistoryComparator;
use crate::config::{CompareOptions, Config, RemovalScope};
use crate::history::ChipsetHistory;
use crate::period::PeriodKey;
use crate::present::ReportTables;
use crate::record::ChipsetRecord;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state (read-only defaults)
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            config: Arc::new(config),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// POST /api/compare body
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub periods: BTreeMap<PeriodKey, Vec<ChipsetRecord>>,
    #[serde(default)]
    pub identifier_field: Option<String>,
    #[serde(default)]
    pub removal_scope: Option<RemovalScope>,
    #[serde(default)]
    pub with_period: bool,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    #[serde(flatten)]
    pub tables: ReportTables,
    pub summary: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/compare - Classify the posted periods
async fn compare_periods(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> impl IntoResponse {
    let defaults = state.config.compare_options();
    let options = CompareOptions {
        identifier_field: request.identifier_field.unwrap_or(defaults.identifier_field),
        removal_scope: request.removal_scope.unwrap_or(defaults.removal_scope),
    };

    let history: ChipsetHistory = request.periods.into_iter().collect();

    match HistoryComparator::new(options).compare(&history) {
        Ok(report) => {
            info!(periods = history.len(), "{}", report.summary());
            let response = CompareResponse {
                tables: ReportTables::new(&report, request.with_period, &state.config.serial_column),
                summary: report.summary(),
            };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => {
            warn!("Rejected comparison request: {}", e);
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::<CompareResponse>::err(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/compare", post(compare_periods))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
