#![allow(dead_code)]

use std::sync::Arc;

use axum::http::header::COOKIE;
use axum_test::{TestResponse, TestServer};
use timer_common::AjaxAction;

use timer_api::auth::nonce::NonceKeys;
use timer_api::config::Config;
use timer_api::db::kv::{KeyValueStore, MemoryStore};
use timer_api::db::posts::StaticCatalog;
use timer_api::models::post::Post;
use timer_api::settings::Settings;
use timer_api::AppState;

pub const SITE_URL: &str = "https://blog.test";

/// Two visitors with well-formed tokens.
pub const VISITOR: &str = "vis_01HZY5R6Q3J7V8W9X0A1B2C3D4";
pub const OTHER_VISITOR: &str = "vis_01HZY5R6Q3J7V8W9X0A1B2C3D5";

pub fn test_config() -> Config {
    Config {
        site_url: SITE_URL.to_string(),
        nonce_secret: "test-nonce-secret".to_string(),
        redis_url: None,
        posts_file: None,
        atomic_tab_lock: false,
        cookie_secure: false,
        port: 0,
    }
}

pub fn post(id: u64) -> Post {
    Post {
        id,
        permalink: format!("{SITE_URL}/?p={id}"),
        published: true,
    }
}

/// Build a test AppState with in-memory KV and a static post catalog.
pub fn test_state(settings: Settings, posts: Vec<Post>) -> AppState {
    let config = test_config();
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    AppState {
        kv,
        posts: Arc::new(StaticCatalog::new(posts)),
        settings: Arc::new(settings),
        nonces: Arc::new(NonceKeys::new(&config.nonce_secret)),
        config: Arc::new(config),
    }
}

/// Build the full application wired to the test state.
pub fn test_app(settings: Settings, posts: Vec<Post>) -> (TestServer, AppState) {
    let state = test_state(settings, posts);
    let server = TestServer::new(timer_api::routes::app(state.clone())).unwrap();
    (server, state)
}

pub fn cookie(visitor: &str) -> String {
    format!("pdt_visitor={visitor}")
}

/// POST an AJAX action as `visitor` with a valid nonce.
pub async fn ajax(
    server: &TestServer,
    state: &AppState,
    visitor: &str,
    action: AjaxAction,
) -> TestResponse {
    let nonce = state.nonces.issue(visitor);
    server
        .post("/ajax")
        .add_header(COOKIE, cookie(visitor))
        .form(&[
            ("action", action.as_str()),
            ("post_id", "1"),
            ("post_timer_nonce", nonce.as_str()),
        ])
        .await
}

/// Follow the "next post" form as `visitor`.
pub async fn navigate(
    server: &TestServer,
    state: &AppState,
    visitor: &str,
    current_post_id: u64,
) -> TestResponse {
    let nonce = state.nonces.issue(visitor);
    server
        .get("/next")
        .add_header(COOKIE, cookie(visitor))
        .add_query_param("action", "next")
        .add_query_param("current_post_id", current_post_id)
        .add_query_param("post_timer_nonce", nonce)
        .await
}
