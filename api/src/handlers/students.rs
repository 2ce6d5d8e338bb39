use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use entities::{CallerIdentity, Student};

use crate::{
    error::ApiResult,
    extract::ValidatedJson,
    models::{CreateStudentRequest, StudentResponse},
    AppState,
};

/// Enroll a student, stamped with the caller's branch
///
/// POST /students
#[utoipa::path(
    post,
    path = "/students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller is not an Admin", body = ApiErrorResponse),
        (status = 422, description = "Invalid body or unknown group", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "students"
)]
pub async fn create_student(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    ValidatedJson(request): ValidatedJson<CreateStudentRequest>,
) -> ApiResult<impl IntoResponse> {
    let student = state.service().create_student(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(StudentResponse::from(student))))
}

/// List students: every branch for a SuperAdmin, the caller's branch for an Admin
///
/// GET /students
#[utoipa::path(
    get,
    path = "/students",
    responses(
        (status = 200, description = "Students visible to the caller", body = [StudentResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller may not list students", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "students"
)]
pub async fn list_students(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<impl IntoResponse> {
    let students = state.service().list_students(&caller).await?;
    Ok(Json(into_responses(students)))
}

/// Students in the calling teacher's groups
///
/// GET /my-students
#[utoipa::path(
    get,
    path = "/my-students",
    responses(
        (status = 200, description = "Students taught by the caller", body = [StudentResponse]),
        (status = 401, description = "Not authenticated", body = ApiErrorResponse),
        (status = 403, description = "Caller is not a Teacher", body = ApiErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "students"
)]
pub async fn list_my_students(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
) -> ApiResult<impl IntoResponse> {
    let students = state.service().list_my_students(&caller).await?;
    Ok(Json(into_responses(students)))
}

fn into_responses(students: Vec<Student>) -> Vec<StudentResponse> {
    students.into_iter().map(StudentResponse::from).collect()
}
