//! Office ledger endpoints.

use axum::{extract::State, http::StatusCode, response::Json, Extension};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::routes::AppState;
use crate::auth::ActorContext;
use crate::finance::ledger::ManualEntry;
use crate::models::{LedgerEntry, LedgerType};

#[derive(Debug, Deserialize)]
pub struct ManualEntryRequest {
    #[serde(rename = "type")]
    pub entry_type: LedgerType,
    pub amount: Decimal,
    pub description: String,
    pub user_id: Option<String>,
    pub entry_date: Option<NaiveDate>,
}

/// GET /api/finance
pub async fn list_ledger(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let entries = state.engine.list_ledger(&actor)?;
    Ok(Json(entries))
}

/// POST /api/finance — manual entry, restricted to Salary/Advance/Operational.
pub async fn create_ledger_entry(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<ManualEntryRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), ApiError> {
    let entry = state.engine.post_manual_entry(
        &actor,
        ManualEntry {
            entry_type: payload.entry_type,
            amount: payload.amount,
            description: payload.description,
            user_id: payload.user_id,
            entry_date: payload.entry_date,
        },
    )?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/finance/summary — derived net cash position.
pub async fn finance_summary(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<Value>, ApiError> {
    let net = state.engine.net_position(&actor)?;
    Ok(Json(json!({ "net_position": net })))
}
