//! Role-permission guard for admin routes
//!
//! Validates the bearer token, checks the route's required permission and
//! stores the resulting `AuthContext` (the caller's session) in request
//! extensions before the handler runs.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use thesisdesk_common::{
    auth::{extract_bearer_token, AuthContext, Permission},
    errors::{AppError, Result},
};

use crate::AppState;

/// Guard for routes that read theses
pub async fn require_view_thesis(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    authorize(&state, request, next, Permission::ViewThesis).await
}

/// Guard for routes that modify theses
pub async fn require_modify_thesis(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    authorize(&state, request, next, Permission::ModifyThesis).await
}

async fn authorize(
    state: &AppState,
    mut request: Request,
    next: Next,
    permission: Permission,
) -> Result<Response> {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing Authorization header".to_string(),
        })?;

    let token = extract_bearer_token(header).ok_or_else(|| AppError::Unauthorized {
        message: "Authorization header must use Bearer token format".to_string(),
    })?;

    let claims = state.jwt.validate_token(token)?;
    let auth = AuthContext::from_claims(claims, request_id)?;

    if let Err(e) = auth.require_permission(permission) {
        tracing::warn!(
            user_id = auth.user_id,
            role = %auth.role,
            permission = %permission,
            "Permission denied"
        );
        return Err(e);
    }

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}
