use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::verify_token;
use crate::error::ApiError;

/// Bearer authentication for protected routes.
///
/// Verifies the token and injects the caller as an `AuthUser` extension. No
/// authorization happens here; the store forwards the caller's claims to the
/// database, whose row-level policies decide what is visible.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let auth_user = verify_token(&token, &state.auth).map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        ApiError::unauthorized(e.to_string())
    })?;

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}
