//! End-to-end tests driving the router with in-memory storage and
//! collaborator doubles.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use roost_api::geocode::Geocoder;
use roost_api::storage::{ObjectStorage, StoredObject};
use roost_api::tokens::TokenManager;
use roost_api::{AppState, AppStateInner, router};
use roost_db::Database;
use roost_types::models::Geometry;

const BOUNDARY: &str = "roost-test-boundary";
const PASSWORD: &str = "correct horse battery";

/// Object-storage double that records calls instead of talking to a gateway.
#[derive(Default)]
struct RecordingStorage {
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn upload(&self, local_path: &Path) -> anyhow::Result<StoredObject> {
        let _ = tokio::fs::remove_file(local_path).await;
        let public_id = Uuid::new_v4().to_string();
        self.uploads.lock().unwrap().push(public_id.clone());
        Ok(StoredObject {
            url: format!("https://cdn.test/{}.png", public_id),
            public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> anyhow::Result<()> {
        self.deletes.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

struct FixedGeocoder;

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn forward(&self, _query: &str) -> anyhow::Result<Geometry> {
        Ok(Geometry::point(-9.14, 38.72))
    }
}

fn test_state() -> (AppState, Arc<RecordingStorage>) {
    let storage = Arc::new(RecordingStorage::default());
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        tokens: TokenManager::new("test-access-secret", "test-refresh-secret", 15, 10),
        storage: storage.clone(),
        geocoder: Arc::new(FixedGeocoder),
        upload_dir: std::env::temp_dir().join(format!("roost-test-{}", Uuid::new_v4())),
    });
    (state, storage)
}

fn app(state: AppState) -> Router {
    router::router(state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value, axum::http::HeaderMap) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body, headers)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart_body(fields: &[(&str, &str)], file_field: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(name) = file_field {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"pic.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"not-really-a-png");
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    file_field: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(multipart_body(fields, file_field)))
        .unwrap()
}

async fn register(app: &Router, username: &str) -> (StatusCode, Value) {
    let email = format!("{}@example.com", username);
    let req = multipart_request(
        Method::POST,
        "/users/register",
        None,
        &[
            ("fullName", "Test User"),
            ("email", &email),
            ("username", username),
            ("password", PASSWORD),
        ],
        Some("image"),
    );
    let (status, body, _) = send(app, req).await;
    (status, body)
}

/// Register + login; returns (access, refresh).
async fn login(app: &Router, username: &str) -> (String, String) {
    let (status, _) = register(app, username).await;
    assert_eq!(status, StatusCode::CREATED);

    let req = json_request(
        Method::POST,
        "/users/login",
        None,
        json!({"username": username, "password": PASSWORD}),
    );
    let (status, body, _) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    (
        body["data"]["accessToken"].as_str().unwrap().to_string(),
        body["data"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

async fn create_listing(app: &Router, token: &str, title: &str, description: &str) -> Value {
    let req = multipart_request(
        Method::POST,
        "/listings",
        Some(token),
        &[
            ("title", title),
            ("description", description),
            ("location", "Lisbon"),
            ("price", "120.5"),
            ("country", "Portugal"),
        ],
        Some("image"),
    );
    let (status, body, _) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "create listing failed: {}", body);
    body["data"].clone()
}

// -- users --

#[tokio::test]
async fn register_excludes_credential_fields() {
    let (state, _) = test_state();
    let app = app(state);

    let (status, body) = register(&app, "ada").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));

    let data = body["data"].as_object().unwrap();
    assert_eq!(data["username"], "ada");
    assert!(!data.contains_key("password"));
    assert!(!data.contains_key("refreshToken"));
}

#[tokio::test]
async fn register_without_image_is_rejected() {
    let (state, _) = test_state();
    let app = app(state);

    let req = multipart_request(
        Method::POST,
        "/users/register",
        None,
        &[
            ("fullName", "Test User"),
            ("email", "noimg@example.com"),
            ("username", "noimg"),
            ("password", PASSWORD),
        ],
        None,
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (state, _) = test_state();
    let app = app(state);

    let (status, _) = register(&app, "ada").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = register(&app, "ada").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn duplicate_registration_is_case_insensitive() {
    let (state, _) = test_state();
    let app = app(state);
    let (status, _) = register(&app, "ada").await;
    assert_eq!(status, StatusCode::CREATED);

    // Same username in different casing, distinct email.
    let req = multipart_request(
        Method::POST,
        "/users/register",
        None,
        &[
            ("fullName", "Test User"),
            ("email", "other@example.com"),
            ("username", "Ada"),
            ("password", PASSWORD),
        ],
        Some("image"),
    );
    let (status, body, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
}

#[tokio::test]
async fn malformed_json_body_gets_the_error_envelope() {
    let (state, _) = test_state();
    let app = app(state);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body, headers) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        headers
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/json")
    );
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_query_string_gets_the_error_envelope() {
    let (state, _) = test_state();
    let app = app(state);

    let (status, body, _) = send(&app, get_request("/listings?page=abc", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn extreme_pagination_values_return_an_empty_page() {
    let (state, _) = test_state();
    let app = app(state);

    let uri = "/listings?page=4294967295&limit=4294967295";
    let (status, body, _) = send(&app, get_request(uri, None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn early_rejections_do_not_strand_spooled_uploads() {
    let (state, _) = test_state();
    let upload_dir = state.upload_dir.clone();
    let app = app(state);

    // Registration with an image but no password.
    let req = multipart_request(
        Method::POST,
        "/users/register",
        None,
        &[
            ("fullName", "Test User"),
            ("email", "ada@example.com"),
            ("username", "ada"),
        ],
        Some("image"),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Listing with an image but no title.
    let (access, _) = login(&app, "bea").await;
    let req = multipart_request(
        Method::POST,
        "/listings",
        Some(&access),
        &[("location", "Lisbon"), ("price", "120.5")],
        Some("image"),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let leftovers = std::fs::read_dir(&upload_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0, "spool files left behind");
}

#[tokio::test]
async fn wrong_password_login_sets_no_cookies() {
    let (state, _) = test_state();
    let app = app(state);
    let (status, _) = register(&app, "ada").await;
    assert_eq!(status, StatusCode::CREATED);

    let req = json_request(
        Method::POST,
        "/users/login",
        None,
        json!({"username": "ada", "password": "wrong"}),
    );
    let (status, body, headers) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
    assert!(headers.get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn login_sets_secure_cookie_pair() {
    let (state, _) = test_state();
    let app = app(state);
    let _ = login(&app, "ada").await;

    let req = json_request(
        Method::POST,
        "/users/login",
        None,
        json!({"username": "ada", "password": PASSWORD}),
    );
    let (status, body, headers) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["user"].is_object());

    let cookies: Vec<&str> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("accessToken=")));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));
    for cookie in cookies {
        assert!(cookie.contains("HttpOnly"), "{}", cookie);
        assert!(cookie.contains("Secure"), "{}", cookie);
    }
}

#[tokio::test]
async fn refresh_rotates_and_rejects_reuse() {
    let (state, _) = test_state();
    let app = app(state);
    let (_, old_refresh) = login(&app, "ada").await;

    let req = json_request(
        Method::POST,
        "/users/refresh",
        None,
        json!({"refreshToken": old_refresh}),
    );
    let (status, body, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let new_refresh = body["data"]["refreshToken"].as_str().unwrap();
    assert_ne!(new_refresh, old_refresh);

    // The rotated-out token is dead.
    let req = json_request(
        Method::POST,
        "/users/refresh",
        None,
        json!({"refreshToken": old_refresh}),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_reads_the_cookie() {
    let (state, _) = test_state();
    let app = app(state);
    let (_, refresh) = login(&app, "ada").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/users/refresh")
        .header(header::COOKIE, format!("refreshToken={}", refresh))
        .body(Body::empty())
        .unwrap();
    let (status, body, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() {
    let (state, _) = test_state();
    let app = app(state);
    let (access, refresh) = login(&app, "ada").await;

    let req = json_request(Method::POST, "/users/logout", Some(&access), json!({}));
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let req = json_request(
        Method::POST,
        "/users/refresh",
        None,
        json!({"refreshToken": refresh}),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_requires_a_token() {
    let (state, _) = test_state();
    let app = app(state);

    let (status, body, _) = send(&app, get_request("/users/current-user", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn change_password_requires_the_old_one() {
    let (state, _) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;

    let req = json_request(
        Method::PATCH,
        "/users/change-password",
        Some(&access),
        json!({"oldPassword": "wrong", "newPassword": "brand new pw"}),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = json_request(
        Method::PATCH,
        "/users/change-password",
        Some(&access),
        json!({"oldPassword": PASSWORD, "newPassword": "brand new pw"}),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    // New password works, old one no longer does.
    let req = json_request(
        Method::POST,
        "/users/login",
        None,
        json!({"username": "ada", "password": "brand new pw"}),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_account_removes_the_profile_image() {
    let (state, storage) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;

    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/users/delete-account")
        .header(header::AUTHORIZATION, format!("Bearer {}", access))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(storage.deletes.lock().unwrap().len(), 1);

    // The access token now points at a deleted account.
    let (status, _, _) = send(&app, get_request("/users/current-user", Some(&access))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// -- listings --

#[tokio::test]
async fn listing_pages_are_disjoint_and_projected() {
    let (state, _) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;
    for i in 0..5 {
        create_listing(&app, &access, &format!("cabin {}", i), "plain").await;
    }

    let (status, body, _) = send(&app, get_request("/listings?page=1&limit=2", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let page1 = body["data"].as_array().unwrap().clone();
    assert_eq!(page1.len(), 2);

    let (_, body, _) = send(&app, get_request("/listings?page=2&limit=2", None)).await;
    let page2 = body["data"].as_array().unwrap().clone();
    assert_eq!(page2.len(), 2);

    let ids1: Vec<&str> = page1.iter().map(|l| l["id"].as_str().unwrap()).collect();
    let ids2: Vec<&str> = page2.iter().map(|l| l["id"].as_str().unwrap()).collect();
    assert!(ids1.iter().all(|id| !ids2.contains(id)), "pages overlap");

    // Cards carry the owner projection and nothing more.
    let card = page1[0].as_object().unwrap();
    assert!(card.contains_key("title"));
    assert!(card.contains_key("image"));
    assert!(!card.contains_key("price"));
    assert!(!card.contains_key("geometry"));
    let owner = card["owner"].as_object().unwrap();
    assert_eq!(owner["username"], "ada");
    assert!(!owner.contains_key("password"));
    assert!(!owner.contains_key("refreshToken"));
}

#[tokio::test]
async fn search_filters_by_title_or_description() {
    let (state, _) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;
    create_listing(&app, &access, "Seaside ABC villa", "by the water").await;
    create_listing(&app, &access, "plain cabin", "cozy abc hideout").await;
    create_listing(&app, &access, "mountain hut", "no match here").await;

    let (status, body, _) =
        send(&app, get_request("/listings/search?query=aBc&limit=10", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Empty query matches the same set as the unfiltered list.
    let (_, searched, _) = send(&app, get_request("/listings/search?limit=10", None)).await;
    let (_, listed, _) = send(&app, get_request("/listings?limit=10", None)).await;
    assert_eq!(
        searched["data"].as_array().unwrap().len(),
        listed["data"].as_array().unwrap().len()
    );
}

#[tokio::test]
async fn listing_create_returns_geometry_and_get_round_trips() {
    let (state, _) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;

    let created = create_listing(&app, &access, "Seaside villa", "by the water").await;
    assert_eq!(created["geometry"]["type"], "Point");
    assert_eq!(created["geometry"]["coordinates"][0], -9.14);

    let uri = format!("/listings/{}", created["id"].as_str().unwrap());
    let (status, body, _) = send(&app, get_request(&uri, Some(&access))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Seaside villa");
    assert_eq!(body["data"]["price"], 120.5);
}

#[tokio::test]
async fn malformed_listing_id_is_a_bad_request() {
    let (state, _) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;

    let (status, body, _) = send(&app, get_request("/listings/not-a-uuid", Some(&access))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid listing id");
}

#[tokio::test]
async fn deleting_a_missing_listing_is_404_without_storage_calls() {
    let (state, storage) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;
    storage.deletes.lock().unwrap().clear();

    let uri = format!("/listings/{}", Uuid::new_v4());
    let req = Request::builder()
        .method(Method::DELETE)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", access))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(storage.deletes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn only_the_owner_can_delete_a_listing() {
    let (state, _) = test_state();
    let app = app(state);
    let (owner_access, _) = login(&app, "ada").await;
    let (intruder_access, _) = login(&app, "eve").await;
    let created = create_listing(&app, &owner_access, "cabin", "mine").await;

    let uri = format!("/listings/{}", created["id"].as_str().unwrap());
    let req = Request::builder()
        .method(Method::DELETE)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", intruder_access))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// -- reviews --

#[tokio::test]
async fn review_ratings_are_domain_checked() {
    let (state, _) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;
    let listing = create_listing(&app, &access, "cabin", "plain").await;
    let uri = format!("/reviews/{}", listing["id"].as_str().unwrap());

    for (rating, expected) in [
        (0, StatusCode::BAD_REQUEST),
        (6, StatusCode::BAD_REQUEST),
        (1, StatusCode::OK),
        (5, StatusCode::OK),
    ] {
        let req = json_request(
            Method::POST,
            &uri,
            Some(&access),
            json!({"content": "fine stay", "rating": rating}),
        );
        let (status, body, _) = send(&app, req).await;
        assert_eq!(status, expected, "rating {}: {}", rating, body);
    }
}

#[tokio::test]
async fn review_listing_joins_the_owner_projection() {
    let (state, _) = test_state();
    let app = app(state);
    let (access, _) = login(&app, "ada").await;
    let listing = create_listing(&app, &access, "cabin", "plain").await;
    let uri = format!("/reviews/{}", listing["id"].as_str().unwrap());

    let req = json_request(
        Method::POST,
        &uri,
        Some(&access),
        json!({"content": "lovely", "rating": 4}),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, _) = send(&app, get_request(&uri, Some(&access))).await;
    assert_eq!(status, StatusCode::OK);
    let reviews = body["data"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["content"], "lovely");
    assert_eq!(reviews[0]["owner"]["username"], "ada");
    assert_eq!(reviews[0]["owner"]["fullName"], "Test User");
}

#[tokio::test]
async fn review_update_and_delete_are_owner_guarded() {
    let (state, _) = test_state();
    let app = app(state);
    let (owner_access, _) = login(&app, "ada").await;
    let (intruder_access, _) = login(&app, "eve").await;
    let listing = create_listing(&app, &owner_access, "cabin", "plain").await;

    let uri = format!("/reviews/{}", listing["id"].as_str().unwrap());
    let req = json_request(
        Method::POST,
        &uri,
        Some(&owner_access),
        json!({"content": "first impression", "rating": 3}),
    );
    let (_, body, _) = send(&app, req).await;
    let review_uri = format!("/reviews/c/{}", body["data"]["id"].as_str().unwrap());

    let req = json_request(
        Method::PATCH,
        &review_uri,
        Some(&intruder_access),
        json!({"content": "hijacked"}),
    );
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = json_request(
        Method::PATCH,
        &review_uri,
        Some(&owner_access),
        json!({"rating": 5}),
    );
    let (status, body, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], 5);
    assert_eq!(body["data"]["content"], "first impression");
}
