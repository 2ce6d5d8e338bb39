//! End-to-end tests of the HTTP routes against an in-memory database.

use api::{create_router, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use entities::{BranchId, NewUser, Role, UserId};
use rstest::rstest;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use user::{AuthConfig, Authenticator, TokenStore};

struct TestApp {
    app: Router,
    db: Arc<database::Database>,
    branch_a: BranchId,
    branch_b: BranchId,
    root: String,
    admin_a: String,
    admin_b: String,
    teacher_a: (UserId, String),
    teacher_b: (UserId, String),
    idle_teacher: String,
}

async fn seed_user(
    db: &database::Database,
    username: &str,
    role: Role,
    branch_id: Option<BranchId>,
) -> (UserId, String) {
    let user = {
        let mut store = db.session().await.unwrap();
        store
            .insert_user(&NewUser {
                username: username.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                role,
                branch_id,
            })
            .await
            .unwrap()
    };

    let token = TokenStore::generate_token();
    TokenStore::insert(db.pool(), &token, user.id, Utc::now() + Duration::minutes(30))
        .await
        .unwrap();
    (user.id, token)
}

async fn setup() -> TestApp {
    let db = database::initialize_in_memory().await.unwrap();
    let authenticator = Authenticator::new(db.clone(), AuthConfig::default())
        .await
        .unwrap();

    let (branch_a, branch_b) = {
        let mut store = db.session().await.unwrap();
        let a = store.insert_branch("Chilonzor").await.unwrap();
        let b = store.insert_branch("Yunusobod").await.unwrap();
        (a.id, b.id)
    };

    let (_, root) = seed_user(&db, "root", Role::SuperAdmin, None).await;
    let (_, admin_a) = seed_user(&db, "admin_a", Role::Admin, Some(branch_a)).await;
    let (_, admin_b) = seed_user(&db, "admin_b", Role::Admin, Some(branch_b)).await;
    let teacher_a = seed_user(&db, "teacher_a", Role::Teacher, Some(branch_a)).await;
    let teacher_b = seed_user(&db, "teacher_b", Role::Teacher, Some(branch_b)).await;
    let (_, idle_teacher) = seed_user(&db, "idle", Role::Teacher, Some(branch_a)).await;

    let app = create_router(AppState::new(db.clone(), Arc::new(authenticator)));

    TestApp {
        app,
        db,
        branch_a,
        branch_b,
        root,
        admin_a,
        admin_b,
        teacher_a,
        teacher_b,
        idle_teacher,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_group(t: &TestApp, admin: &str, name: &str, teacher_id: UserId) -> Value {
    let (status, body) = send(
        &t.app,
        Method::POST,
        "/groups",
        Some(admin),
        Some(json!({ "name": name, "teacher_id": teacher_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

async fn create_student(t: &TestApp, admin: &str, name: &str, group_id: i64) -> Value {
    let (status, body) = send(
        &t.app,
        Method::POST,
        "/students",
        Some(admin),
        Some(json!({ "name": name, "group_id": group_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

fn names(list: &Value) -> Vec<String> {
    let mut names: Vec<String> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

/// Rows an insert through `uri` would add to, as the SuperAdmin sees them.
async fn stored_count(t: &TestApp, uri: &str) -> usize {
    if uri == "/admins" {
        // No list route for admins; every create case uses the username "x"
        let mut store = t.db.session().await.unwrap();
        let user = store.find_user_by_username("x").await.unwrap();
        return usize::from(user.is_some());
    }

    let (status, list) = send(&t.app, Method::GET, uri, Some(&t.root), None).await;
    assert_eq!(status, StatusCode::OK);
    list.as_array().unwrap().len()
}

#[rstest]
#[case("/admins", json!({ "username": "x", "password": "p", "branch_id": 1 }))]
#[case("/teachers", json!({ "username": "x", "password": "p" }))]
#[case("/groups", json!({ "name": "G", "teacher_id": 1 }))]
#[case::unknown_teacher("/groups", json!({ "name": "G", "teacher_id": 9999 }))]
#[case("/students", json!({ "name": "S", "group_id": 1 }))]
#[case::unknown_group("/students", json!({ "name": "S", "group_id": 9999 }))]
#[tokio::test]
async fn test_teacher_cannot_create_anything(#[case] uri: &str, #[case] body: Value) {
    let t = setup().await;
    let before = stored_count(&t, uri).await;

    let (status, response) = send(
        &t.app,
        Method::POST,
        uri,
        Some(&t.teacher_a.1),
        Some(body),
    )
    .await;

    // Denied before any reference lookup, so never a 422
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["error"]["code"], "FORBIDDEN");
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Only "));
    assert_eq!(stored_count(&t, uri).await, before);
}

#[tokio::test]
async fn test_denied_create_with_valid_references_writes_nothing() {
    let t = setup().await;
    let group = create_group(&t, &t.admin_a, "Math", t.teacher_a.0).await;

    let attempts = [
        ("/groups", json!({ "name": "Mine", "teacher_id": t.teacher_a.0 })),
        ("/students", json!({ "name": "Ali", "group_id": group["id"] })),
    ];
    for (uri, body) in attempts {
        let (status, _) = send(
            &t.app,
            Method::POST,
            uri,
            Some(&t.teacher_a.1),
            Some(body),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }

    assert_eq!(stored_count(&t, "/groups").await, 1);
    assert_eq!(stored_count(&t, "/students").await, 0);
}

#[tokio::test]
async fn test_admin_creates_are_stamped_with_admin_branch() {
    let t = setup().await;

    let (status, teacher) = send(
        &t.app,
        Method::POST,
        "/teachers",
        Some(&t.admin_a),
        Some(json!({ "username": "t_new", "password": "p", "branch_id": t.branch_b })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(teacher["role"], "Teacher");
    assert_eq!(teacher["branch_id"], t.branch_a);
    assert!(teacher.get("password_hash").is_none());

    let (status, group) = send(
        &t.app,
        Method::POST,
        "/groups",
        Some(&t.admin_a),
        Some(json!({ "name": "G1", "teacher_id": t.teacher_a.0, "branch_id": t.branch_b })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["branch_id"], t.branch_a);

    let (status, student) = send(
        &t.app,
        Method::POST,
        "/students",
        Some(&t.admin_a),
        Some(json!({ "name": "Ali", "group_id": group["id"], "branch_id": t.branch_b })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(student["branch_id"], t.branch_a);
}

#[tokio::test]
async fn test_super_admin_lists_every_branch() {
    let t = setup().await;

    let (status, branches) = send(&t.app, Method::GET, "/branches", Some(&t.root), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&branches), vec!["Chilonzor", "Yunusobod"]);
}

#[rstest]
#[case::admin(true)]
#[case::teacher(false)]
#[tokio::test]
async fn test_only_super_admin_lists_branches(#[case] as_admin: bool) {
    let t = setup().await;
    let token = if as_admin { &t.admin_a } else { &t.teacher_a.1 };

    let (status, body) = send(&t.app, Method::GET, "/branches", Some(token), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "Only SuperAdmin may list branches");
}

#[tokio::test]
async fn test_my_students_follows_group_ownership() {
    let t = setup().await;

    let g_a = create_group(&t, &t.admin_a, "Math", t.teacher_a.0).await;
    let g_b = create_group(&t, &t.admin_a, "Physics", t.teacher_b.0).await;
    create_student(&t, &t.admin_a, "Ali", g_a["id"].as_i64().unwrap()).await;
    create_student(&t, &t.admin_a, "Vali", g_b["id"].as_i64().unwrap()).await;

    let (status, mine) = send(
        &t.app,
        Method::GET,
        "/my-students",
        Some(&t.teacher_a.1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&mine), vec!["Ali"]);

    let (_, theirs) = send(&t.app, Method::GET, "/my-students", Some(&t.teacher_b.1), None).await;
    assert_eq!(names(&theirs), vec!["Vali"]);
}

#[tokio::test]
async fn test_teacher_without_groups_gets_empty_list() {
    let t = setup().await;

    let (status, body) = send(
        &t.app,
        Method::GET,
        "/my-students",
        Some(&t.idle_teacher),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_admin_then_duplicate_conflicts() {
    let t = setup().await;
    let body = json!({ "username": "a1", "password": "p", "branch_id": t.branch_b });

    let (status, admin) = send(
        &t.app,
        Method::POST,
        "/admins",
        Some(&t.root),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(admin["role"], "Admin");
    assert_eq!(admin["branch_id"], t.branch_b);

    let (status, err) = send(&t.app, Method::POST, "/admins", Some(&t.root), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_admin_requires_branch() {
    let t = setup().await;

    let (status, err) = send(
        &t.app,
        Method::POST,
        "/admins",
        Some(&t.root),
        Some(json!({ "username": "a1", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["details"]["field"], "branch_id");

    let (status, err) = send(
        &t.app,
        Method::POST,
        "/admins",
        Some(&t.root),
        Some(json!({ "username": "a1", "password": "p", "branch_id": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "REFERENCE_NOT_FOUND");
}

#[tokio::test]
async fn test_cross_branch_teacher_group_keeps_admin_branch() {
    let t = setup().await;

    let group = create_group(&t, &t.admin_a, "G1", t.teacher_b.0).await;

    assert_eq!(group["branch_id"], t.branch_a);
    assert_eq!(group["teacher_id"], t.teacher_b.0);
}

#[tokio::test]
async fn test_my_groups_spans_branches() {
    let t = setup().await;

    create_group(&t, &t.admin_a, "G-a", t.teacher_b.0).await;
    create_group(&t, &t.admin_b, "G-b", t.teacher_b.0).await;
    create_group(&t, &t.admin_a, "Other", t.teacher_a.0).await;

    let (status, groups) = send(
        &t.app,
        Method::GET,
        "/my-groups",
        Some(&t.teacher_b.1),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&groups), vec!["G-a", "G-b"]);
}

#[tokio::test]
async fn test_lists_are_scoped_by_role() {
    let t = setup().await;

    create_group(&t, &t.admin_a, "G-a", t.teacher_a.0).await;
    create_group(&t, &t.admin_b, "G-b", t.teacher_b.0).await;

    let (_, all) = send(&t.app, Method::GET, "/groups", Some(&t.root), None).await;
    assert_eq!(names(&all), vec!["G-a", "G-b"]);

    let (_, own) = send(&t.app, Method::GET, "/groups", Some(&t.admin_b), None).await;
    assert_eq!(names(&own), vec!["G-b"]);

    let (_, teachers) = send(&t.app, Method::GET, "/teachers", Some(&t.admin_b), None).await;
    let usernames: Vec<&str> = teachers
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(usernames, vec!["teacher_b"]);

    let (status, _) = send(&t.app, Method::GET, "/students", Some(&t.teacher_a.1), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_group_teacher_must_be_a_teacher() {
    let t = setup().await;

    // teacher_id pointing at a user who is not a teacher, then at nobody
    for teacher_id in [1, 9_999] {
        let (status, err) = send(
            &t.app,
            Method::POST,
            "/groups",
            Some(&t.admin_a),
            Some(json!({ "name": "G", "teacher_id": teacher_id })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"]["code"], "REFERENCE_NOT_FOUND");
    }
}

#[tokio::test]
async fn test_student_group_must_exist() {
    let t = setup().await;

    let (status, err) = send(
        &t.app,
        Method::POST,
        "/students",
        Some(&t.admin_a),
        Some(json!({ "name": "Ali", "group_id": 404 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "REFERENCE_NOT_FOUND");
}

#[tokio::test]
async fn test_missing_or_blank_fields_are_validation_errors() {
    let t = setup().await;

    let (status, err) = send(
        &t.app,
        Method::POST,
        "/students",
        Some(&t.admin_a),
        Some(json!({ "name": "Ali" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(err["error"]["details"]["field"], "group_id");

    let (status, err) = send(
        &t.app,
        Method::POST,
        "/groups",
        Some(&t.admin_a),
        Some(json!({ "name": "  ", "teacher_id": t.teacher_a.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"]["details"]["field"], "name");
}

#[rstest]
#[case::no_header(None)]
#[case::unknown_token(Some("definitely-not-issued"))]
#[tokio::test]
async fn test_protected_routes_require_a_valid_token(#[case] token: Option<&str>) {
    let t = setup().await;

    for uri in [
        "/branches",
        "/teachers",
        "/groups",
        "/students",
        "/my-groups",
        "/my-students",
        "/me",
    ] {
        let (status, body) = send(&t.app, Method::GET, uri, token, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let t = setup().await;
    let token = TokenStore::generate_token();
    TokenStore::insert(t.db.pool(), &token, 1, Utc::now() - Duration::seconds(1))
        .await
        .unwrap();

    let (status, _) = send(&t.app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_me_logout_round() {
    let t = setup().await;
    {
        let mut store = t.db.session().await.unwrap();
        store
            .insert_user(&NewUser {
                username: "boss".to_string(),
                password_hash: user::hash_password("s3cret").unwrap(),
                role: Role::SuperAdmin,
                branch_id: None,
            })
            .await
            .unwrap();
    }

    let (status, _) = send(
        &t.app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": "boss", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = send(
        &t.app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": "boss", "password": "s3cret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["token_type"], "bearer");
    let token = login["access_token"].as_str().unwrap().to_string();

    let (status, me) = send(&t.app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "boss");
    assert_eq!(me["role"], "SuperAdmin");

    let (status, _) = send(&t.app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&t.app, Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_docs_are_public() {
    let t = setup().await;

    let (status, health) = send(&t.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"]["connected"], true);

    let (status, doc) = send(&t.app, Method::GET, "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"].get("/my-students").is_some());
}

#[tokio::test]
async fn test_responses_carry_request_id_and_version() {
    let t = setup().await;

    let response = t
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-lms-version"));
}
