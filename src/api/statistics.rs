//! Statistics API Endpoints
//!
//! Upload a sales table, get the monthly statistics back. Each request runs
//! on its own aggregator; nothing is kept between requests, so a rejected
//! table can simply be fixed and sent again.
//!
//! # Endpoints
//!
//! - `POST /api/statistics` - CSV body in, JSON rows out
//! - `POST /api/statistics/export` - CSV body in, statistics CSV download out

use axum::{
    body::Bytes,
    extract::State as AxumState,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::aggregation::{SummaryRow, VariancePolicy};
use crate::error::StatsError;
use crate::io::summary_to_csv_string;
use crate::pipeline::{aggregate_csv, AggregateReport};

/// File name suggested to clients downloading the statistics table.
pub const EXPORT_FILE_NAME: &str = "estadisticas_ventas.csv";

/// Shared state for the statistics API.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub policy: VariancePolicy,
}

/// JSON body of a successful aggregation.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub total_records: u64,
    pub total_periods: usize,
    pub rows: Vec<SummaryRow>,
}

impl From<AggregateReport> for StatisticsResponse {
    fn from(report: AggregateReport) -> Self {
        Self {
            total_records: report.total_records,
            total_periods: report.total_periods(),
            rows: report.rows,
        }
    }
}

// =============================================================================
// RESPONSE HELPERS
// =============================================================================

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, Json(body)).into_response()
}

fn stats_error_response(err: &StatsError) -> Response {
    let status = match err {
        StatsError::Csv(_) => StatusCode::BAD_REQUEST,
        e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(status = status.as_u16(), error = %err, "Rejected uploaded table");
    error_response(status, &format!("Error processing file: {}", err))
}

/// Parse and aggregate off the async runtime.
async fn aggregate_upload(body: Bytes, policy: VariancePolicy) -> Result<AggregateReport, Response> {
    debug!(bytes = body.len(), "Aggregating uploaded table");
    match tokio::task::spawn_blocking(move || aggregate_csv(body.as_ref(), policy)).await {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(e)) => Err(stats_error_response(&e)),
        Err(e) => {
            error!(error = %e, "Aggregation task failed");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "aggregation task failed",
            ))
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// POST /api/statistics - aggregate and return rows as JSON
pub async fn post_statistics(AxumState(state): AxumState<Arc<ApiState>>, body: Bytes) -> Response {
    match aggregate_upload(body, state.policy).await {
        Ok(report) => Json(StatisticsResponse::from(report)).into_response(),
        Err(response) => response,
    }
}

/// POST /api/statistics/export - aggregate and return a CSV attachment
pub async fn post_statistics_export(
    AxumState(state): AxumState<Arc<ApiState>>,
    body: Bytes,
) -> Response {
    let report = match aggregate_upload(body, state.policy).await {
        Ok(report) => report,
        Err(response) => return response,
    };
    match summary_to_csv_string(&report.rows) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => stats_error_response(&e),
    }
}

/// Create the statistics router.
///
/// # Usage
///
/// ```ignore
/// let app = Router::new()
///     .nest("/api", statistics_router())
///     .with_state(Arc::new(ApiState { policy }));
/// ```
pub fn statistics_router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/statistics", post(post_statistics))
        .route("/statistics/export", post(post_statistics_export))
}

// =============================================================================
// TESTS
// =============================================================================
