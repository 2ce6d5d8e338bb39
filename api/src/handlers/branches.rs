use axum::{extract::State, response::IntoResponse, Extension, Json};
use entities::CallerIdentity;

use crate::{error::ApiResult, models::BranchResponse, AppState};

/// List every branch
///
/// GET /branches
#[utoipa::path(
    get,
    path = "/branches",
    responses(
        (status = 200, description = "All branches", body = [BranchResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller is not a SuperAdmin", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "branches"
)]
pub async fn list_branches(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<impl IntoResponse> {
    let branches = state.service().list_branches(&caller).await?;
    let response: Vec<BranchResponse> = branches.into_iter().map(BranchResponse::from).collect();
    Ok(Json(response))
}
