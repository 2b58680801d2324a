//! Integration tests for the access-control surface
//!
//! Each test assembles the real router over a throwaway database and
//! drives it request by request, asserting the role/ownership outcomes
//! the platform guarantees.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use classhub_backend::{
    api::{create_router, AppState},
    auth::JwtIssuer,
    config::Config,
    store::Store,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

const TEST_SECRET: &str = "integration-test-secret";

fn test_config() -> Config {
    Config {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        db_path: String::new(),
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_minutes: 30,
        bootstrap_admin_password: "admin123".to_string(),
        role_precedence: vec![
            "admin".to_string(),
            "instructor".to_string(),
            "student".to_string(),
        ],
        gemini_api_key: None,
        tutor_model: "gemini-1.5-flash".to_string(),
    }
}

fn test_app() -> (Router, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let store = Store::new(temp_file.path().to_str().unwrap()).unwrap();
    store.seed_roles().unwrap();

    let config = test_config();
    let state = AppState {
        store: Arc::new(store),
        jwt: Arc::new(JwtIssuer::new(TEST_SECRET.to_string(), 30)),
        config: Arc::new(config),
        tutor: None,
    };

    (create_router(state), temp_file)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register(app: &Router, username: &str) -> Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/users/",
            None,
            json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "password123",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register {} failed: {}", username, body);
    body
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let form = format!("username={}&password={}", username, password);
    let req = Request::builder()
        .method("POST")
        .uri("/users/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();

    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "login {} failed: {}", username, body);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().unwrap().to_string()
}

/// Bootstrap the admin, then grant `username` the named role.
async fn grant_role(app: &Router, admin_token: &str, user_id: &str, role_name: &str) {
    let (status, roles) = send(app, bare_request("GET", "/roles/", Some(admin_token))).await;
    assert_eq!(status, StatusCode::OK);

    let role_id = roles
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == role_name)
        .map(|r| r["id"].as_str().unwrap().to_string())
        .expect("role should exist");

    let (status, body) = send(
        app,
        bare_request(
            "POST",
            &format!("/roles/assign/{}/{}", user_id, role_id),
            Some(admin_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "assign role failed: {}", body);
}

async fn setup_admin(app: &Router) -> String {
    let (status, _) = send(app, bare_request("POST", "/roles/bootstrap-admin", None)).await;
    assert_eq!(status, StatusCode::OK);
    login(app, "admin", "admin123").await
}

/// Create an instructor-role user and return (user_id, token).
async fn setup_instructor(app: &Router, admin_token: &str, username: &str) -> (String, String) {
    let user = register(app, username).await;
    let user_id = user["id"].as_str().unwrap().to_string();
    grant_role(app, admin_token, &user_id, "instructor").await;
    let token = login(app, username, "password123").await;
    (user_id, token)
}

async fn create_classroom(app: &Router, token: &str, name: &str) -> String {
    let (status, body) = send(
        app,
        json_request("POST", "/classrooms/classrooms", Some(token), json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create classroom failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

async fn create_lesson(app: &Router, token: &str, classroom_id: &str, title: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            "POST",
            "/lessons/",
            Some(token),
            json!({ "title": title, "content": "intro", "classroom_id": classroom_id }),
        ),
    )
    .await
}

#[tokio::test]
async fn student_cannot_create_classroom() {
    let (app, _db) = test_app();

    register(&app, "alice").await;
    let token = login(&app, "alice", "password123").await;

    let (status, body) = send(
        &app,
        json_request("POST", "/classrooms/classrooms", Some(&token), json!({ "name": "Math101" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient permissions");
}

#[tokio::test]
async fn enrolled_student_reads_lesson() {
    let (app, _db) = test_app();

    let admin_token = setup_admin(&app).await;
    let (_, bob_token) = setup_instructor(&app, &admin_token, "bob").await;

    let classroom_id = create_classroom(&app, &bob_token, "Math101").await;
    let (status, lesson) = create_lesson(&app, &bob_token, &classroom_id, "Fractions").await;
    assert_eq!(status, StatusCode::OK);
    let lesson_id = lesson["id"].as_str().unwrap();

    register(&app, "carol").await;
    let carol_token = login(&app, "carol", "password123").await;

    // Not yet enrolled: read is forbidden
    let (status, _) = send(
        &app,
        bare_request("GET", &format!("/lessons/{}", lesson_id), Some(&carol_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        bare_request(
            "POST",
            &format!("/classrooms/{}/join", classroom_id),
            Some(&carol_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        bare_request("GET", &format!("/lessons/{}", lesson_id), Some(&carol_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Fractions");
}

#[tokio::test]
async fn instructor_cannot_touch_other_instructors_classroom() {
    let (app, _db) = test_app();

    let admin_token = setup_admin(&app).await;
    let (_, a_token) = setup_instructor(&app, &admin_token, "instructor_a").await;
    let (_, b_token) = setup_instructor(&app, &admin_token, "instructor_b").await;

    let classroom_id = create_classroom(&app, &a_token, "Math101").await;

    let (status, body) = create_lesson(&app, &b_token, &classroom_id, "Hijack").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You are not the instructor of this classroom");

    // The owner still can
    let (status, _) = create_lesson(&app, &a_token, &classroom_id, "Fractions").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn bootstrap_admin_is_one_time() {
    let (app, _db) = test_app();

    let (status, body) = send(&app, bare_request("POST", "/roles/bootstrap-admin", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "admin");

    let (status, body) = send(&app, bare_request("POST", "/roles/bootstrap-admin", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Admin role already exists");

    // The admin user still exists exactly once and can log in
    login(&app, "admin", "admin123").await;
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let (app, _db) = test_app();

    let (status, _) = send(&app, bare_request("GET", "/lessons/", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, bare_request("GET", "/lessons/", Some("not.a.token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A well-formed token signed with another secret is also rejected
    let forged = JwtIssuer::new("other-secret".to_string(), 30)
        .issue("alice")
        .unwrap();
    let (status, _) = send(&app, bare_request("GET", "/lessons/", Some(&forged))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A valid token for a user that no longer exists fails identity lookup
    let orphan = JwtIssuer::new(TEST_SECRET.to_string(), 30)
        .issue("ghost")
        .unwrap();
    let (status, _) = send(&app, bare_request("GET", "/lessons/", Some(&orphan))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _db) = test_app();

    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/users/",
            None,
            json!({
                "username": "alice",
                "email": "alice2@example.com",
                "password": "password123",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already registered");
}

#[tokio::test]
async fn session_lifecycle_with_ownership_checks() {
    let (app, _db) = test_app();

    let admin_token = setup_admin(&app).await;
    let (_, bob_token) = setup_instructor(&app, &admin_token, "bob").await;
    let (_, eve_token) = setup_instructor(&app, &admin_token, "eve").await;

    let classroom_id = create_classroom(&app, &bob_token, "Math101").await;
    let (_, lesson) = create_lesson(&app, &bob_token, &classroom_id, "Fractions").await;
    let lesson_id = lesson["id"].as_str().unwrap().to_string();

    // Owner creates a session
    let (status, session) = send(
        &app,
        json_request(
            "POST",
            "/sessions/",
            Some(&bob_token),
            json!({ "lesson_id": lesson_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["is_active"], true);
    let session_id = session["id"].as_str().unwrap().to_string();

    // A non-owner instructor cannot update or delete it
    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/sessions/{}", session_id),
            Some(&eve_token),
            json!({ "is_active": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        bare_request("DELETE", &format!("/sessions/{}", session_id), Some(&eve_token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The owner can
    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            &format!("/sessions/{}", session_id),
            Some(&bob_token),
            json!({ "is_active": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["is_active"], false);

    // Enrolled student starts their own session
    register(&app, "carol").await;
    let carol_token = login(&app, "carol", "password123").await;
    send(
        &app,
        bare_request(
            "POST",
            &format!("/classrooms/{}/join", classroom_id),
            Some(&carol_token),
        ),
    )
    .await;

    let (status, started) = send(
        &app,
        bare_request(
            "POST",
            &format!("/sessions/start/{}", lesson_id),
            Some(&carol_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["is_active"], true);

    // Scoped listings: bob sees his lesson's sessions, carol hers, and
    // the admin view requires the admin role
    let (status, sessions) = send(&app, bare_request("GET", "/sessions/", Some(&bob_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions.as_array().unwrap().len(), 2);

    let (status, sessions) = send(&app, bare_request("GET", "/sessions/", Some(&eve_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sessions.as_array().unwrap().is_empty());

    let (status, _) = send(&app, bare_request("GET", "/sessions/all", Some(&bob_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, sessions) = send(&app, bare_request("GET", "/sessions/all", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn assign_student_requires_ownership() {
    let (app, _db) = test_app();

    let admin_token = setup_admin(&app).await;
    let (_, bob_token) = setup_instructor(&app, &admin_token, "bob").await;
    let (_, eve_token) = setup_instructor(&app, &admin_token, "eve").await;

    let classroom_id = create_classroom(&app, &bob_token, "Math101").await;

    let carol = register(&app, "carol").await;
    let carol_id = carol["id"].as_str().unwrap();

    // Eve does not own Math101
    let (status, _) = send(
        &app,
        bare_request(
            "POST",
            &format!("/classrooms/{}/assign-student/{}", classroom_id, carol_id),
            Some(&eve_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob does
    let (status, _) = send(
        &app,
        bare_request(
            "POST",
            &format!("/classrooms/{}/assign-student/{}", classroom_id, carol_id),
            Some(&bob_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // An unknown student id reports not-found, not forbidden
    let (status, _) = send(
        &app,
        bare_request(
            "POST",
            &format!(
                "/classrooms/{}/assign-student/{}",
                classroom_id,
                uuid::Uuid::new_v4()
            ),
            Some(&bob_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lesson_listing_is_scoped_by_role() {
    let (app, _db) = test_app();

    let admin_token = setup_admin(&app).await;
    let (_, bob_token) = setup_instructor(&app, &admin_token, "bob").await;
    let (_, eve_token) = setup_instructor(&app, &admin_token, "eve").await;

    let math = create_classroom(&app, &bob_token, "Math101").await;
    let art = create_classroom(&app, &eve_token, "Art201").await;
    create_lesson(&app, &bob_token, &math, "Fractions").await;
    create_lesson(&app, &eve_token, &art, "Color Theory").await;

    // Each instructor sees only their own classroom's lessons
    let (status, lessons) = send(&app, bare_request("GET", "/lessons/", Some(&bob_token))).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = lessons
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Fractions"]);

    // A student enrolled nowhere sees an empty list, not an error
    register(&app, "carol").await;
    let carol_token = login(&app, "carol", "password123").await;
    let (status, lessons) = send(&app, bare_request("GET", "/lessons/", Some(&carol_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(lessons.as_array().unwrap().is_empty());

    // Enrolling flips the scope
    send(
        &app,
        bare_request("POST", &format!("/classrooms/{}/join", math), Some(&carol_token)),
    )
    .await;
    let (_, lessons) = send(&app, bare_request("GET", "/lessons/", Some(&carol_token))).await;
    assert_eq!(lessons.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn open_user_surface_matches_observed_design() {
    let (app, _db) = test_app();

    let alice = register(&app, "alice").await;
    let alice_id = alice["id"].as_str().unwrap();

    // Listing and deletion are unauthenticated, as shipped
    let (status, users) = send(&app, bare_request("GET", "/users/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);
    // Password hashes never appear on the wire
    assert!(users[0].get("password_hash").is_none());

    let (status, body) = send(
        &app,
        bare_request("DELETE", &format!("/users/{}", alice_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = send(
        &app,
        bare_request("DELETE", &format!("/users/{}", alice_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
