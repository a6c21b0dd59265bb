//! Payment endpoints: the record CRUD shape and the legacy manifest shape.
//! Both funnel into the same engine path, so the verified-filter recompute
//! and the income posting behave identically regardless of which route the
//! dashboard used.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::routes::AppState;
use crate::auth::ActorContext;
use crate::finance::{NewPayment, PaymentPatch};
use crate::models::{PaymentRecord, PaymentState, PaymentStatus};

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub jamaah_id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    /// Installment label shown on the dashboard ("DP", "Cicilan 2", ...).
    pub payment_stage: Option<String>,
    pub status: Option<PaymentState>,
    pub notes: Option<String>,
    pub proof_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub payment_stage: Option<String>,
    pub status: Option<PaymentState>,
    pub notes: Option<String>,
    pub proof_url: Option<String>,
}

/// Legacy dashboard shape posted against the manifest entry itself.
#[derive(Debug, Deserialize)]
pub struct ManifestPaymentRequest {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: Option<String>,
    pub proof_url: Option<String>,
    pub notes: Option<String>,
}

/// Created/updated record plus the pilgrim's recomputed status.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub record: PaymentRecord,
    pub new_status: PaymentStatus,
}

/// POST /api/payments
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let (record, new_status) = state.engine.add_payment(
        &actor,
        NewPayment {
            pilgrim_id: payload.jamaah_id,
            amount: payload.amount,
            payment_date: payload.payment_date,
            method: payload.payment_stage,
            state: payload.status,
            proof_url: payload.proof_url,
            notes: payload.notes,
        },
    )?;

    Ok((StatusCode::CREATED, Json(PaymentResponse { record, new_status })))
}

/// PUT /api/payments/:id
pub async fn update_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let (record, new_status) = state.engine.update_payment(
        &actor,
        id,
        PaymentPatch {
            amount: payload.amount,
            payment_date: payload.payment_date,
            method: payload.payment_stage,
            state: payload.status,
            proof_url: payload.proof_url,
            notes: payload.notes,
        },
    )?;

    Ok(Json(PaymentResponse { record, new_status }))
}

/// DELETE /api/payments/:id
pub async fn delete_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.engine.delete_payment(&actor, id)?;
    Ok(Json(json!({ "deleted": true, "id": id })))
}

/// POST /api/manifest/:id/payment (legacy shape)
pub async fn create_manifest_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Path(pilgrim_id): Path<Uuid>,
    Json(payload): Json<ManifestPaymentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (record, new_status) = state.engine.add_payment(
        &actor,
        NewPayment {
            pilgrim_id,
            amount: payload.amount,
            payment_date: payload.date,
            method: payload.method,
            state: None,
            proof_url: payload.proof_url,
            notes: payload.notes,
        },
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "id": record.id,
            "new_status": new_status,
        })),
    ))
}
