use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{error::ApiError, AppState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const VERSION_HEADER: &str = "x-lms-version";

/// The raw bearer token of an authenticated request, kept for logout.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

/// Correlation id assigned to each request.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer authentication middleware
///
/// Resolves the `Authorization: Bearer <token>` header to a
/// [`CallerIdentity`](entities::CallerIdentity) and stores it in the request
/// extensions for handlers to pick up. Requests without a valid token are
/// answered with 401 before any handler or authorization rule runs.
pub async fn authentication_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let Some(token) = extract_bearer_token(request.headers()).map(str::to_string) else {
        debug!("No bearer token on {} [{}]", request.uri(), request_id);
        return Err(ApiError::Unauthorized("missing bearer token".to_string()));
    };

    let identity = match state.authenticator.verify_token(&token).await {
        Ok(identity) => identity,
        Err(err) => {
            warn!(
                "Rejected bearer token on {}: {} [{}]",
                request.uri(),
                err,
                request_id
            );
            return Err(err.into());
        }
    };
    debug!(
        "AUTH MIDDLEWARE: {} {} as user {} ({})",
        request.method(),
        request.uri(),
        identity.id,
        identity.role
    );

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively; anything else yields `None`.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Request processing middleware hook
///
/// Assigns a request id (reusing the client's `X-Request-Id` when present)
/// and logs how long the request took.
pub async fn request_middleware(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        "{} {} -> {} in {:?} [{}]",
        method,
        uri,
        response.status(),
        start.elapsed(),
        request_id
    );

    response
}

/// Response processing middleware hook
///
/// Stamps every response with the server version.
pub async fn response_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        VERSION_HEADER,
        HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
    );

    response
}
