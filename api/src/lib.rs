use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use authz::AuthzEngine;
use database::Database;
use user::Authenticator;

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod server;
pub mod service;

#[cfg(test)]
mod middleware_hooks_tests;

pub use server::{shutdown_signal, start_server_with_config, ApiConfig};
pub use service::EntityService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub authenticator: Arc<Authenticator>,
    pub engine: AuthzEngine,
}

impl AppState {
    pub fn new(db: Arc<Database>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            db,
            authenticator,
            engine: AuthzEngine::new(),
        }
    }

    /// Entity service bound to this state's database and engine
    pub fn service(&self) -> EntityService {
        EntityService::new(self.db.clone(), self.engine)
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::users::create_admin,
        handlers::users::create_teacher,
        handlers::users::list_teachers,
        handlers::branches::list_branches,
        handlers::groups::create_group,
        handlers::groups::list_groups,
        handlers::groups::list_my_groups,
        handlers::students::create_student,
        handlers::students::list_students,
        handlers::students::list_my_students,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::LoginRequest,
            models::LoginResponse,
            models::CreateAdminRequest,
            models::CreateTeacherRequest,
            models::CreateGroupRequest,
            models::CreateStudentRequest,
            models::UserResponse,
            models::BranchResponse,
            models::GroupResponse,
            models::StudentResponse,
            models::HealthResponse,
            models::DatabaseHealth,
            error::ApiErrorResponse,
            error::ErrorDetail,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login and token management"),
        (name = "users", description = "Admins and teachers"),
        (name = "branches", description = "Branches"),
        (name = "groups", description = "Teaching groups"),
        (name = "students", description = "Students"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "LMS Admin API",
        version = "1.0.0",
        description = "Branch-scoped administration of users, groups and students",
    ),
)]
pub struct ApiDoc;

/// Create the main API router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Everything here needs a bearer token
    let protected = Router::new()
        .route("/admins", post(handlers::users::create_admin))
        .route(
            "/teachers",
            get(handlers::users::list_teachers).post(handlers::users::create_teacher),
        )
        .route("/branches", get(handlers::branches::list_branches))
        .route(
            "/groups",
            get(handlers::groups::list_groups).post(handlers::groups::create_group),
        )
        .route(
            "/students",
            get(handlers::students::list_students).post(handlers::students::create_student),
        )
        .route("/my-groups", get(handlers::groups::list_my_groups))
        .route("/my-students", get(handlers::students::list_my_students))
        .route("/me", get(handlers::auth::me))
        .route("/logout", post(handlers::auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_hooks::authentication_middleware,
        ));

    let public = Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/health", get(handlers::health::health_check));

    Router::new()
        .merge(protected)
        .merge(public)
        .merge(SwaggerUi::new("/swagger").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(middleware_hooks::request_middleware))
        .layer(middleware::from_fn(middleware_hooks::response_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
