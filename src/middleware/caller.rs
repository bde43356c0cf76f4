use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::validate_jwt;
use crate::error::ApiError;
use crate::permissions::Caller;
use crate::server::AppState;

/// Attach a [`Caller`] to every request.
///
/// Requests without an Authorization header act as the anonymous caller;
/// a header that is present but unusable is refused with 401.
pub async fn caller_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = match extract_bearer(request.headers()).map_err(ApiError::unauthorized)? {
        None => Caller::anonymous(),
        Some(token) => validate_jwt(&state.config.security.jwt_secret, &token)
            .map(Caller::from)
            .map_err(|e| {
                tracing::debug!("Rejected bearer token: {}", e);
                ApiError::unauthorized(e.to_string())
            })?,
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Extract the bearer token, if an Authorization header was sent
fn extract_bearer(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        Some(_) => Err("Empty JWT token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}
