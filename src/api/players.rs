//! Player and bank handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    deserialize_optional_amount, format_cents, Cents, Player, PlayerId, Withdrawal,
};

use super::{error_response, ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub id: PlayerId,
    pub name: String,
    pub withdrawals: Vec<WithdrawalResponse>,
    pub total_withdrawn: String,
    pub final_amount: String,
    pub poker_net: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResponse {
    pub id: uuid::Uuid,
    pub amount: String,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Withdrawal> for WithdrawalResponse {
    fn from(w: &Withdrawal) -> Self {
        Self {
            id: w.id,
            amount: format_cents(w.amount_cents),
            added_by: w.added_by.clone(),
            created_at: w.created_at,
        }
    }
}

impl From<Player> for PlayerResponse {
    fn from(player: Player) -> Self {
        let total = player.total_withdrawn();
        Self {
            id: player.id,
            withdrawals: player.withdrawals.iter().map(Into::into).collect(),
            total_withdrawn: format_cents(total),
            final_amount: format_cents(player.final_amount_cents),
            poker_net: format_cents(player.final_amount_cents - total),
            name: player.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePlayerRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub final_amount: Option<Cents>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub amount: Option<Cents>,
    pub added_by: Option<String>,
}

pub async fn list_players(State(state): State<AppState>) -> ApiResult<Json<Vec<PlayerResponse>>> {
    let players = state
        .service
        .list_players()
        .await
        .map_err(error_response)?;
    Ok(Json(players.into_iter().map(Into::into).collect()))
}

pub async fn create_player(
    State(state): State<AppState>,
    Json(request): Json<CreatePlayerRequest>,
) -> ApiResult<(StatusCode, Json<PlayerResponse>)> {
    let player = state
        .service
        .add_player(&request.name)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(player.into())))
}

pub async fn update_player(
    State(state): State<AppState>,
    Path(id): Path<PlayerId>,
    Json(request): Json<UpdatePlayerRequest>,
) -> ApiResult<Json<PlayerResponse>> {
    let player = state
        .service
        .update_player(id, request.name.as_deref(), request.final_amount)
        .await
        .map_err(error_response)?;
    Ok(Json(player.into()))
}

pub async fn delete_player(
    State(state): State<AppState>,
    Path(id): Path<PlayerId>,
) -> ApiResult<StatusCode> {
    state
        .service
        .delete_player(id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Without an amount the configured buy-in is used.
pub async fn add_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<PlayerId>,
    Json(request): Json<WithdrawalRequest>,
) -> ApiResult<(StatusCode, Json<PlayerResponse>)> {
    let amount = request.amount.unwrap_or(state.default_buy_in_cents);
    let player = state
        .service
        .add_withdrawal(id, amount, request.added_by.as_deref())
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(player.into())))
}
