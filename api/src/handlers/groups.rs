use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use entities::CallerIdentity;

use crate::{
    error::ApiResult,
    extract::ValidatedJson,
    models::{CreateGroupRequest, GroupResponse},
    AppState,
};

/// Create a group in the caller's branch
///
/// POST /groups
#[utoipa::path(
    post,
    path = "/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller is not an Admin", body = ApiErrorResponse),
        (status = 422, description = "Invalid body or teacher_id is not a teacher", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "groups"
)]
pub async fn create_group(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    ValidatedJson(request): ValidatedJson<CreateGroupRequest>,
) -> ApiResult<impl IntoResponse> {
    let group = state.service().create_group(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse::from(group))))
}

/// List groups: every branch for a SuperAdmin, the caller's branch for an Admin
///
/// GET /groups
#[utoipa::path(
    get,
    path = "/groups",
    responses(
        (status = 200, description = "Groups visible to the caller", body = [GroupResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller may not list groups", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "groups"
)]
pub async fn list_groups(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<impl IntoResponse> {
    let groups = state.service().list_groups(&caller).await?;
    Ok(Json(into_responses(groups)))
}

/// Groups taught by the calling teacher
///
/// GET /my-groups
#[utoipa::path(
    get,
    path = "/my-groups",
    responses(
        (status = 200, description = "The caller's groups", body = [GroupResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller is not a Teacher", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "groups"
)]
pub async fn list_my_groups(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<impl IntoResponse> {
    let groups = state.service().list_my_groups(&caller).await?;
    Ok(Json(into_responses(groups)))
}

fn into_responses(groups: Vec<entities::Group>) -> Vec<GroupResponse> {
    groups.into_iter().map(GroupResponse::from).collect()
}
