//! Tests for the middleware hooks
//!
//! These drive a small router through the hooks with `oneshot`, so the
//! authentication path is exercised against a real in-memory store.

#[cfg(test)]
mod tests {
    use super::super::middleware_hooks::*;
    use crate::AppState;
    use axum::{
        body::Body,
        http::{header, HeaderMap, HeaderValue, Request, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use chrono::{Duration, Utc};
    use entities::{CallerIdentity, NewUser, Role};
    use std::sync::Arc;
    use tower::ServiceExt;
    use user::{AuthConfig, Authenticator, TokenStore};

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(extract_bearer_token(&headers_with("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_extract_bearer_token_rejects_other_schemes() {
        assert_eq!(extract_bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(extract_bearer_token(&headers_with("abc")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    async fn whoami(Extension(identity): Extension<CallerIdentity>) -> String {
        format!("{}:{}", identity.id, identity.role)
    }

    async fn request_id(Extension(id): Extension<RequestId>) -> String {
        id.0
    }

    async fn test_app() -> (Router, String) {
        let db = database::initialize_in_memory().await.unwrap();
        let user_id = {
            let mut store = db.session().await.unwrap();
            store
                .insert_user(&NewUser {
                    username: "root".to_string(),
                    password_hash: "x".to_string(),
                    role: Role::SuperAdmin,
                    branch_id: None,
                })
                .await
                .unwrap()
                .id
        };

        // Creates the token table, so it must come before the insert
        let authenticator = Authenticator::new(db.clone(), AuthConfig::default())
            .await
            .unwrap();

        let token = TokenStore::generate_token();
        TokenStore::insert(db.pool(), &token, user_id, Utc::now() + Duration::minutes(5))
            .await
            .unwrap();
        let state = AppState::new(db, Arc::new(authenticator));

        let app = Router::new()
            .route("/whoami", get(whoami))
            .route("/request-id", get(request_id))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            ))
            .layer(middleware::from_fn(request_middleware))
            .layer(middleware::from_fn(response_middleware))
            .with_state(state);

        (app, token)
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler_with_identity() {
        let (app, token) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"1:SuperAdmin");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _token) = test_app().await;

        let response = app
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert!(response.headers().contains_key(VERSION_HEADER));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let (app, token) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "req-42");
    }

    #[tokio::test]
    async fn test_request_id_reaches_handler() {
        let (app, token) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/request-id")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), header_id);
    }
}
