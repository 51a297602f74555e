//! Shared expense handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::application::ExpenseInfo;
use crate::domain::{deserialize_amount, format_cents, Cents, ExpenseId, PlayerId};

use super::{error_response, ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: ExpenseId,
    pub amount: String,
    pub payer_id: PlayerId,
    pub payer_name: String,
    pub consumer_ids: Vec<PlayerId>,
    pub consumer_names: Vec<String>,
    pub share: String,
    pub description: Option<String>,
}

impl From<ExpenseInfo> for ExpenseResponse {
    fn from(info: ExpenseInfo) -> Self {
        Self {
            id: info.expense.id,
            amount: format_cents(info.expense.amount_cents),
            payer_id: info.expense.payer,
            payer_name: info.payer_name,
            consumer_ids: info.expense.consumers,
            consumer_names: info.consumer_names,
            share: format_cents(info.share_cents),
            description: info.expense.description,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Cents,
    pub payer_id: PlayerId,
    pub consumer_ids: Vec<PlayerId>,
    pub description: Option<String>,
}

pub async fn list_expenses(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ExpenseResponse>>> {
    let expenses = state
        .service
        .list_expenses()
        .await
        .map_err(error_response)?;
    Ok(Json(expenses.into_iter().map(Into::into).collect()))
}

pub async fn create_expense(
    State(state): State<AppState>,
    Json(request): Json<CreateExpenseRequest>,
) -> ApiResult<(StatusCode, Json<ExpenseResponse>)> {
    let info = state
        .service
        .add_expense(
            request.amount,
            request.payer_id,
            &request.consumer_ids,
            request.description,
        )
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(info.into())))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<ExpenseId>,
) -> ApiResult<StatusCode> {
    state
        .service
        .delete_expense(id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
