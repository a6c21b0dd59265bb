//! Actor Extraction Middleware
//! Mission: Turn the gateway's identity headers into an ActorContext

use crate::auth::actor::{ActorContext, Role};
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Header names populated by the upstream session gateway.
const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_ROLES_HEADER: &str = "x-actor-roles";

/// Middleware that requires a resolved actor identity on every request.
/// The session gateway in front of this service validates the token and
/// forwards the actor id and role set as headers; anything without them
/// is unauthenticated.
pub async fn actor_middleware(mut req: Request, next: Next) -> Result<Response, ActorError> {
    let actor_id = req
        .headers()
        .get(ACTOR_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ActorError::MissingIdentity)?
        .to_string();

    let roles_raw = req
        .headers()
        .get(ACTOR_ROLES_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let roles: Vec<Role> = roles_raw.split(',').filter_map(Role::from_str).collect();

    let ip = req
        .headers()
        .get("x-forwarded-for")
        .or_else(|| req.headers().get("x-real-ip"))
        .and_then(|h| h.to_str().ok())
        // First hop in a forwarded chain is the client
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string());

    let actor = ActorContext {
        id: actor_id,
        roles,
        ip,
    };

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}

/// Extract the actor from a request (use after `actor_middleware`).
pub fn extract_actor(req: &Request) -> Option<&ActorContext> {
    req.extensions().get::<ActorContext>()
}

#[derive(Debug)]
pub enum ActorError {
    MissingIdentity,
}

impl IntoResponse for ActorError {
    fn into_response(self) -> Response {
        let message = match self {
            ActorError::MissingIdentity => "Missing actor identity",
        };
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "message": message })),
        )
            .into_response()
    }
}
