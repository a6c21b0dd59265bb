//! Manifest endpoints: the minimum pilgrim surface the finance core needs,
//! plus the admin-only refund transition.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::routes::AppState;
use crate::auth::{authorize, ActorContext, ADMIN_TIER, STAFF_TIER};
use crate::error::ServiceError;
use crate::models::Pilgrim;
use crate::store::pilgrims::{self, NewPilgrim};

#[derive(Debug, Deserialize)]
pub struct CreatePilgrimRequest {
    pub name: String,
    pub passport_no: Option<String>,
    pub package_id: Option<String>,
    pub final_price: Decimal,
    pub visa_status: Option<String>,
    pub equipment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub amount: Decimal,
    pub notes: Option<String>,
}

/// POST /api/manifest
pub async fn create_pilgrim(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<CreatePilgrimRequest>,
) -> Result<(StatusCode, Json<Pilgrim>), ApiError> {
    authorize(&actor, STAFF_TIER)?;
    if payload.name.trim().is_empty() {
        return Err(ServiceError::invalid("Pilgrim name is required").into());
    }
    if payload.final_price <= Decimal::ZERO {
        return Err(ServiceError::invalid("Final price must be positive").into());
    }

    let pilgrim = state.engine.db().with_tx(|tx| {
        pilgrims::insert(
            tx,
            &NewPilgrim {
                name: payload.name.trim().to_string(),
                passport_no: payload.passport_no,
                package_id: payload.package_id,
                final_price: payload.final_price,
                visa_status: payload.visa_status,
                equipment_status: payload.equipment_status,
            },
        )
    })?;

    state.audit.emit(
        &actor,
        "pilgrim.create",
        Some(pilgrim.id.to_string()),
        format!("name {} price {}", pilgrim.name, pilgrim.final_price),
    );

    Ok((StatusCode::CREATED, Json(pilgrim)))
}

/// GET /api/manifest
pub async fn list_pilgrims(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> Result<Json<Vec<Pilgrim>>, ApiError> {
    authorize(&actor, STAFF_TIER)?;
    let all = state.engine.db().with_conn(pilgrims::list)?;
    Ok(Json(all))
}

/// GET /api/manifest/:id
pub async fn get_pilgrim(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Pilgrim>, ApiError> {
    authorize(&actor, STAFF_TIER)?;
    let pilgrim = state.engine.db().with_conn(|conn| pilgrims::get(conn, id))?;
    Ok(Json(pilgrim))
}

/// DELETE /api/manifest/:id — admin only, and forbidden while payment
/// records still reference the pilgrim.
pub async fn delete_pilgrim(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    authorize(&actor, ADMIN_TIER)?;
    state.engine.db().with_tx(|tx| pilgrims::delete(tx, id))?;

    state
        .audit
        .emit(&actor, "pilgrim.delete", Some(id.to_string()), "manifest entry removed");

    Ok(Json(json!({ "deleted": true, "id": id })))
}

/// POST /api/manifest/:id/refund
pub async fn refund_pilgrim(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RefundRequest>,
) -> Result<Json<Value>, ApiError> {
    let entry = state
        .engine
        .process_refund(&actor, id, payload.amount, payload.notes)?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Refund of {} recorded for pilgrim {}", entry.amount, id),
    })))
}
