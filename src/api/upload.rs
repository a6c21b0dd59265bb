//! Payment-proof upload passthrough.
//!
//! The only binary boundary in the system. Files are streamed through to
//! the external media store, which owns storage and returns the opaque
//! `{id, url}` reference that payment records later carry as `proof_url`.

use axum::{
    extract::{Multipart, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::routes::AppState;
use crate::auth::{authorize, ActorContext, STAFF_TIER};
use crate::error::ServiceError;

#[derive(Debug, Deserialize)]
struct MediaStoreResponse {
    id: String,
    url: String,
}

/// POST /api/upload — multipart field `file`.
pub async fn upload_proof(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    authorize(&actor, STAFF_TIER)?;

    let media_store_url = state
        .media_store_url
        .as_deref()
        .ok_or_else(|| ServiceError::Storage(anyhow::anyhow!("Media store not configured")))?;

    let mut file: Option<(String, String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::invalid(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload.bin").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::invalid(format!("Failed to read upload: {}", e)))?;
            file = Some((file_name, content_type, bytes.to_vec()));
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ServiceError::invalid("Missing multipart field 'file'"))?;

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.clone())
        .mime_str(&content_type)
        .map_err(|e| ServiceError::invalid(format!("Bad content type: {}", e)))?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let resp = state
        .http_client
        .post(media_store_url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| ServiceError::Storage(anyhow::anyhow!("Media store request failed: {}", e)))?;

    if !resp.status().is_success() {
        return Err(ServiceError::Storage(anyhow::anyhow!(
            "Media store rejected upload: {}",
            resp.status()
        ))
        .into());
    }

    let stored: MediaStoreResponse = resp
        .json()
        .await
        .map_err(|e| ServiceError::Storage(anyhow::anyhow!("Bad media store response: {}", e)))?;

    info!(file = %file_name, id = %stored.id, "📎 Proof uploaded to media store");
    state.audit.emit(
        &actor,
        "upload.create",
        Some(stored.id.clone()),
        format!("file {}", file_name),
    );

    Ok(Json(json!({
        "success": true,
        "id": stored.id,
        "url": stored.url,
    })))
}
