use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::Filter;

use sitekeeper::auth::credentials::hash_password;
use sitekeeper::auth::identity::{Identity, Role};
use sitekeeper::config::ServerConfig;
use sitekeeper::core::state::AppState;
use sitekeeper::handlers;
use sitekeeper::storage::memory::create_memory_storage;

fn test_state() -> AppState {
    AppState::new(ServerConfig::for_testing(), create_memory_storage())
}

async fn post_json(
    state: &AppState,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let api = handlers::routes(state.clone()).recover(handlers::handle_rejection);
    let mut req = warp::test::request().method("POST").path(path).json(&body);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {}", token));
    }
    let resp = req.reply(&api).await;
    let status = resp.status();
    let body: Value = serde_json::from_slice(resp.body()).unwrap_or(Value::Null);
    (status, body)
}

async fn get(state: &AppState, path: &str, token: Option<&str>) -> (StatusCode, Value) {
    let api = handlers::routes(state.clone()).recover(handlers::handle_rejection);
    let mut req = warp::test::request().path(path);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {}", token));
    }
    let resp = req.reply(&api).await;
    let status = resp.status();
    let body: Value = serde_json::from_slice(resp.body()).unwrap_or(Value::Null);
    (status, body)
}

/// Register an editor account and return its session token
async fn register_editor(state: &AppState, email: &str) -> String {
    let (status, body) = post_json(
        state,
        "/api/auth/register",
        None,
        json!({"name": "User", "email": email, "password": "pw123secure", "role": "editor"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().unwrap().to_string()
}

/// Create a domain for the given token and return its id
async fn create_domain(state: &AppState, token: &str, name: &str) -> String {
    let (status, body) = post_json(
        state,
        "/api/domains",
        Some(token),
        json!({"name": name}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

/// Provision an admin account directly in the store (admins are never
/// self-registered) and return a session token for it
async fn provision_admin(state: &AppState) -> String {
    let admin = Identity::new(
        "Root".to_string(),
        "root@example.com".to_string(),
        hash_password("admin-pw-123").unwrap(),
        Role::Admin,
    );
    let admin = state
        .storage
        .identities()
        .create_identity(admin)
        .await
        .unwrap();
    state.tokens.issue(&admin).unwrap()
}

#[tokio::test]
async fn test_domain_access_is_owner_scoped() {
    let state = test_state();
    let alice = register_editor(&state, "alice@example.com").await;
    let bob = register_editor(&state, "bob@example.com").await;

    let alice_domain = create_domain(&state, &alice, "alice.example").await;
    create_domain(&state, &bob, "bob.example").await;

    // The owner reads their own domain
    let (status, body) = get(&state, &format!("/api/domains/{}", alice_domain), Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alice.example");

    // Another tenant is refused
    let (status, _) = get(&state, &format!("/api/domains/{}", alice_domain), Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Listings only show the caller's own domains
    let (_, domains) = get(&state, "/api/domains", Some(&bob)).await;
    let names: Vec<&str> = domains
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bob.example"]);
}

#[tokio::test]
async fn test_nested_resources_inherit_domain_scoping() {
    let state = test_state();
    let alice = register_editor(&state, "alice@example.com").await;
    let bob = register_editor(&state, "bob@example.com").await;
    let alice_domain = create_domain(&state, &alice, "alice.example").await;

    // Alice creates a page with an inline section
    let (status, page) = post_json(
        &state,
        "/api/pages",
        Some(&alice),
        json!({
            "domain_id": alice_domain,
            "title": "Home",
            "slug": "home",
            "sections": [{"title": "Intro", "content": "Welcome"}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let page_id = page["id"].as_str().unwrap().to_string();
    let section_id = page["sections"][0]["id"].as_str().unwrap().to_string();

    // Bob cannot create pages under Alice's domain
    let (status, _) = post_json(
        &state,
        "/api/pages",
        Some(&bob),
        json!({"domain_id": alice_domain, "title": "Intruder", "slug": "intruder"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob cannot read Alice's page, its sections, or its media
    let (status, _) = get(&state, &format!("/api/pages/{}", page_id), Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get(&state, &format!("/api/pages/{}/sections", page_id), Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get(&state, &format!("/api/sections/{}/media", section_id), Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob cannot attach media to Alice's section
    let (status, _) = post_json(
        &state,
        "/api/media",
        Some(&bob),
        json!({"section_id": section_id, "file_url": "https://cdn.example/x.png"}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob's own listing shows none of Alice's pages
    let (_, pages) = get(&state, "/api/pages", Some(&bob)).await;
    assert_eq!(pages.as_array().unwrap().len(), 0);

    // Alice still reaches everything normally
    let (status, detail) = get(&state, &format!("/api/pages/{}", page_id), Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["sections"][0]["title"], "Intro");
}

#[tokio::test]
async fn test_seo_records_are_owner_scoped() {
    let state = test_state();
    let alice = register_editor(&state, "alice@example.com").await;
    let bob = register_editor(&state, "bob@example.com").await;
    let alice_domain = create_domain(&state, &alice, "alice.example").await;

    let seo_path = format!("/api/domains/{}/seo", alice_domain);
    let seo_body = json!({"meta_title": "Alice", "meta_description": "Alice's site"});

    // Bob cannot write Alice's SEO record
    let api = handlers::routes(state.clone()).recover(handlers::handle_rejection);
    let resp = warp::test::request()
        .method("PUT")
        .path(&seo_path)
        .header("authorization", format!("Bearer {}", bob))
        .json(&seo_body)
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Alice can; a second write replaces rather than duplicates
    let resp = warp::test::request()
        .method("PUT")
        .path(&seo_path)
        .header("authorization", format!("Bearer {}", alice))
        .json(&seo_body)
        .reply(&api)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, record) = get(&state, &seo_path, Some(&alice)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["meta_title"], "Alice");

    let (status, _) = get(&state, &seo_path, Some(&bob)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_role_overrides_ownership() {
    let state = test_state();
    let alice = register_editor(&state, "alice@example.com").await;
    let alice_domain = create_domain(&state, &alice, "alice.example").await;

    let admin = provision_admin(&state).await;

    let (status, _) = get(&state, &format!("/api/domains/{}", alice_domain), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);

    // Admin listings span all tenants
    let (_, domains) = get(&state, "/api/domains", Some(&admin)).await;
    assert_eq!(domains.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_gallery_is_public_and_filters_to_images() {
    let state = test_state();
    let alice = register_editor(&state, "alice@example.com").await;
    let domain = create_domain(&state, &alice, "alice.example").await;

    let (_, page) = post_json(
        &state,
        "/api/pages",
        Some(&alice),
        json!({
            "domain_id": domain,
            "title": "Portfolio",
            "slug": "portfolio",
            "sections": [{"title": "Shots"}]
        }),
    )
    .await;
    let section_id = page["sections"][0]["id"].as_str().unwrap().to_string();

    for (url, kind) in [
        ("https://cdn.example/a.png", "image"),
        ("https://cdn.example/b.png", "image"),
        ("caption text", "text"),
    ] {
        let (status, _) = post_json(
            &state,
            "/api/media",
            Some(&alice),
            json!({"section_id": section_id, "file_url": url, "kind": kind}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // No token required for the public gallery
    let (status, gallery) = get(&state, &format!("/api/gallery/{}", domain), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gallery["domain"], "alice.example");
    let images = gallery["images"].as_array().unwrap();
    assert_eq!(images.len(), 2, "text media stays out of the gallery");
    assert_eq!(images[0]["page_slug"], "portfolio");

    // Unknown domains are a plain 404, not an auth error
    let (status, _) = get(
        &state,
        "/api/gallery/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_routes_require_authentication() {
    let state = test_state();

    let (status, _) = get(&state, "/api/domains", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_json(&state, "/api/domains", None, json!({"name": "x"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&state, "/api/pages", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
