//! Audit log listing — owner only, paginated with total-count headers.

use axum::{
    extract::{Query, State},
    http::{header::HeaderName, HeaderMap, HeaderValue},
    response::Json,
    Extension,
};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::routes::AppState;
use crate::auth::{authorize, ActorContext, OWNER_TIER};
use crate::models::AuditEntry;
use crate::store::audit;

const DEFAULT_PER_PAGE: u32 = 50;
const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// GET /api/logs
pub async fn list_logs(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    Query(params): Query<LogsQuery>,
) -> Result<(HeaderMap, Json<Vec<AuditEntry>>), ApiError> {
    authorize(&actor, OWNER_TIER)?;

    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let (entries, total) = state
        .engine
        .db()
        .with_conn(|conn| audit::list_page(conn, page, per_page))?;

    let total_pages = total.div_ceil(per_page as u64);

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-total"),
        HeaderValue::from_str(&total.to_string()).unwrap_or(HeaderValue::from_static("0")),
    );
    headers.insert(
        HeaderName::from_static("x-total-pages"),
        HeaderValue::from_str(&total_pages.to_string()).unwrap_or(HeaderValue::from_static("0")),
    );

    Ok((headers, Json(entries)))
}
