//! Results and bank totals.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::AppError;
use crate::domain::{format_cents, ResultsResponse};

use super::{error_response, ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankResponse {
    pub total_taken: String,
    pub total_returned: String,
    pub difference: String,
    pub is_balanced: bool,
}

pub async fn bank_summary(State(state): State<AppState>) -> ApiResult<Json<BankResponse>> {
    let summary = state
        .service
        .bank_summary()
        .await
        .map_err(error_response)?;
    Ok(Json(BankResponse {
        total_taken: format_cents(summary.total_taken),
        total_returned: format_cents(summary.total_returned),
        difference: format_cents(summary.difference),
        is_balanced: summary.is_balanced,
    }))
}

/// `200` with `{"status":"ok", ...}` or `422` with `{"status":"imbalance", ...}`.
pub async fn compute_results(State(state): State<AppState>) -> Response {
    match state.service.compute_results().await {
        Ok(report) => (StatusCode::OK, Json(ResultsResponse::Ok(report))).into_response(),
        Err(AppError::LedgerImbalance(imbalance)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ResultsResponse::Imbalance(imbalance.into())),
        )
            .into_response(),
        Err(err) => error_response(err).into_response(),
    }
}
