//! HTTP API for the game tracker UI.
//!
//! # Endpoints
//!
//! ```text
//! GET    /health                          - Database health check
//! GET    /api/players                     - List players with withdrawals
//! POST   /api/players                     - Add a player            {"name"}
//! PUT    /api/players/{id}                - Rename / set returned   {"name"?, "finalAmount"?}
//! DELETE /api/players/{id}                - Remove a player
//! POST   /api/players/{id}/withdrawals    - Take cash from the bank {"amount"?, "addedBy"?}
//! GET    /api/food-expenses               - List shared expenses
//! POST   /api/food-expenses               - Add an expense          {"amount", "payerId", "consumerIds"}
//! DELETE /api/food-expenses/{id}          - Remove an expense
//! GET    /api/bank                        - Total taken vs returned
//! GET    /api/results                     - Summaries and settlements
//! ```
//!
//! Amounts are accepted as JSON numbers or decimal strings and always
//! returned as decimal strings (`"20.00"`).
//!
//! CORS is permissive: the UI is served from a different origin.

pub mod expenses;
pub mod players;
pub mod results;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::{AppError, GameService};
use crate::domain::Cents;

/// Shared by every handler. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GameService>,
    /// Withdrawal amount used when a request doesn't name one
    pub default_buy_in_cents: Cents,
}

impl AppState {
    pub fn new(service: GameService, default_buy_in_cents: Cents) -> Self {
        Self {
            service: Arc::new(service),
            default_buy_in_cents,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

/// Map a service error to a status code and JSON body.
pub fn error_response(err: AppError) -> ApiError {
    let (status, kind) = match &err {
        AppError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
        AppError::InvalidExpense(_) => (StatusCode::BAD_REQUEST, "invalid_expense"),
        AppError::InvalidName(_) => (StatusCode::BAD_REQUEST, "invalid_name"),
        AppError::PlayerNotFound(_) | AppError::ExpenseNotFound(_) => {
            (StatusCode::NOT_FOUND, "not_found")
        }
        AppError::PlayerAlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
        AppError::PlayerHasExpenses { .. } => (StatusCode::CONFLICT, "player_in_use"),
        AppError::LedgerImbalance(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ledger_imbalance"),
        AppError::Database(e) => {
            error!(error = %e, "request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind,
        }),
    )
}

/// Build the router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/players",
            get(players::list_players).post(players::create_player),
        )
        .route(
            "/players/{id}",
            put(players::update_player).delete(players::delete_player),
        )
        .route("/players/{id}/withdrawals", post(players::add_withdrawal))
        .route(
            "/food-expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route("/food-expenses/{id}", delete(expenses::delete_expense))
        .route("/bank", get(results::bank_summary))
        .route("/results", get(results::compute_results));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until Ctrl-C.
pub async fn serve(state: AppState, bind: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(address = %listener.local_addr()?, "HTTP API listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.service.is_healthy().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if healthy { "healthy" } else { "unhealthy" },
            "database": healthy,
        })),
    )
}
