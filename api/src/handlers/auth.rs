//! Login, logout and the caller's own record

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use entities::CallerIdentity;
use tracing::info;
use user::Credentials;

use crate::{
    error::ApiResult,
    extract::ValidatedJson,
    middleware_hooks::BearerToken,
    models::{LoginRequest, LoginResponse, UserResponse},
    AppState,
};

/// Exchange a username and password for a bearer token
///
/// POST /login
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Incorrect username or password", body = ApiErrorResponse),
        (status = 422, description = "Missing field", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let credentials = Credentials::new(request.username, request.password);
    let issued = state.authenticator.authenticate(&credentials).await?;

    Ok(Json(LoginResponse {
        access_token: issued.access_token,
        token_type: issued.token_type,
        expires_at: issued.expires_at,
    }))
}

/// Revoke the presented bearer token
///
/// POST /logout
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> ApiResult<impl IntoResponse> {
    state.authenticator.revoke(&token).await?;
    info!("User {} logged out", identity.id);
    Ok(StatusCode::NO_CONTENT)
}

/// The authenticated caller's user record
///
/// GET /me
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<CallerIdentity>,
) -> ApiResult<impl IntoResponse> {
    let user = state.service().current_user(&identity).await?;
    Ok(Json(UserResponse::from(user)))
}
