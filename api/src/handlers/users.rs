use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use entities::CallerIdentity;
use tracing::debug;

use crate::{
    error::ApiResult,
    extract::ValidatedJson,
    models::{CreateAdminRequest, CreateTeacherRequest, UserResponse},
    AppState,
};

/// Create a branch admin
///
/// POST /admins
#[utoipa::path(
    post,
    path = "/admins",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Admin created", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller is not a SuperAdmin", body = ApiErrorResponse),
        (status = 409, description = "Username already taken", body = ApiErrorResponse),
        (status = 422, description = "Invalid body or unknown branch", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    ValidatedJson(request): ValidatedJson<CreateAdminRequest>,
) -> ApiResult<impl IntoResponse> {
    let admin = state.service().create_admin(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(admin))))
}

/// Create a teacher in the caller's branch
///
/// POST /teachers
#[utoipa::path(
    post,
    path = "/teachers",
    request_body = CreateTeacherRequest,
    responses(
        (status = 201, description = "Teacher created", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller is not an Admin", body = ApiErrorResponse),
        (status = 409, description = "Username already taken", body = ApiErrorResponse),
        (status = 422, description = "Invalid body", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_teacher(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    ValidatedJson(request): ValidatedJson<CreateTeacherRequest>,
) -> ApiResult<impl IntoResponse> {
    let teacher = state.service().create_teacher(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(teacher))))
}

/// List teachers: every branch for a SuperAdmin, the caller's branch for an Admin
///
/// GET /teachers
#[utoipa::path(
    get,
    path = "/teachers",
    responses(
        (status = 200, description = "Teachers visible to the caller", body = [UserResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller may not list teachers", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_teachers(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<impl IntoResponse> {
    let teachers = state.service().list_teachers(&caller).await?;
    debug!("Listing {} teachers for user {}", teachers.len(), caller.id);

    let response: Vec<UserResponse> = teachers.into_iter().map(UserResponse::from).collect();
    Ok(Json(response))
}
