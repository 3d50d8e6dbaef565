use std::sync::Arc;

use timer_api::auth::nonce::NonceKeys;
use timer_api::config::Config;
use timer_api::db::kv::MemoryStore;
use timer_api::db::posts::StaticCatalog;
use timer_api::settings::Settings;
use timer_api::AppState;
use timer_client::{
    CountdownDriver, DocumentContext, DriverOptions, DriverState, HttpBackend, TimerBackend,
    WidgetView,
};
use tokio::sync::watch;

const VISITOR: &str = "vis_01HZY5R6Q3J7V8W9X0A1B2C3D4";

/// Serve the timer API on a local port. Returns its base URL.
async fn serve(settings: Settings) -> (String, AppState) {
    let config = Config {
        site_url: "https://blog.test".to_string(),
        nonce_secret: "test-nonce-secret".to_string(),
        redis_url: None,
        posts_file: None,
        atomic_tab_lock: false,
        cookie_secure: false,
        port: 0,
    };
    let state = AppState {
        kv: Arc::new(MemoryStore::new()),
        posts: Arc::new(StaticCatalog::empty()),
        settings: Arc::new(settings),
        nonces: Arc::new(NonceKeys::new(&config.nonce_secret)),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = timer_api::routes::app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), state)
}

fn suppressing() -> Settings {
    Settings {
        view_quota: 2,
        completion_code: "STUDY-7781".to_string(),
        suppress_multiple_tabs: true,
        ..Settings::default()
    }
}

#[tokio::test]
async fn new_visitor_adopts_minted_cookie_and_runs_every_action() {
    let (base, _state) = serve(suppressing()).await;

    let (backend, bootstrap) = HttpBackend::bootstrap(&base, 4, None).await.unwrap();
    assert!(bootstrap.render);
    assert_eq!(bootstrap.post_id, 4);
    let cookie = backend.visitor_cookie().expect("minted cookie kept");
    assert!(cookie.starts_with("pdt_visitor=vis_"));

    // Calls only pass the nonce check when they carry the minted cookie.
    assert!(backend.start_countdown(4).await.unwrap());
    assert!(!backend.start_countdown(4).await.unwrap());
    assert!(backend.start_button_click(4).await.unwrap());

    backend.close_current_tab(4).await.unwrap();
    assert!(!backend.start_button_click(4).await.unwrap());

    assert!(backend.start_countdown(4).await.unwrap());
    assert_eq!(backend.end_countdown(4).await.unwrap(), "");
    assert_eq!(backend.visitor_cookie().as_deref(), Some(cookie.as_str()));
}

#[tokio::test]
async fn known_visitor_gets_code_at_quota() {
    let (base, state) = serve(suppressing()).await;
    state.timer(VISITOR).session().set_hit_count(2).await;

    let cookie = format!("pdt_visitor={VISITOR}");
    let (backend, bootstrap) = HttpBackend::bootstrap(&base, 9, Some(&cookie))
        .await
        .unwrap();
    assert_eq!(bootstrap.options.hit_count, 2);
    assert_eq!(backend.visitor_cookie().as_deref(), Some(cookie.as_str()));

    assert_eq!(backend.end_countdown(9).await.unwrap(), "STUDY-7781");
    assert_eq!(state.timer(VISITOR).session().hit_count().await, 0);
}

#[tokio::test]
async fn second_tab_is_suppressed_on_bootstrap() {
    let (base, _state) = serve(suppressing()).await;

    let (first, _) = HttpBackend::bootstrap(&base, 1, None).await.unwrap();
    assert!(first.start_countdown(1).await.unwrap());

    let cookie = first.visitor_cookie().unwrap();
    let (_second, bootstrap) = HttpBackend::bootstrap(&base, 2, Some(&cookie))
        .await
        .unwrap();
    assert!(!bootstrap.render);
}

#[derive(Default)]
struct Recorded {
    codes: Vec<String>,
    next_enabled: bool,
}

impl WidgetView for Recorded {
    fn show_count(&mut self, _remaining: u32) {}
    fn show_message(&mut self, _message: &str) {}
    fn show_code(&mut self, code: &str) {
        self.codes.push(code.to_string());
    }
    fn hide_start_button(&mut self) {}
    fn reveal_next(&mut self) {}
    fn enable_next(&mut self) {
        self.next_enabled = true;
    }
    fn hide_widget(&mut self) {}
}

#[tokio::test]
async fn driver_counts_down_against_live_api() {
    let settings = Settings {
        timer_seconds: 1,
        ..suppressing()
    };
    let (base, state) = serve(settings).await;
    state.timer(VISITOR).session().set_hit_count(2).await;

    let cookie = format!("pdt_visitor={VISITOR}");
    let (backend, bootstrap) = HttpBackend::bootstrap(&base, 3, Some(&cookie))
        .await
        .unwrap();
    let mut driver = CountdownDriver::new(
        Arc::new(backend),
        Arc::new(DocumentContext::new()),
        Recorded::default(),
        DriverOptions::from(&bootstrap),
        bootstrap.post_id,
    );

    assert_eq!(driver.initialize(), DriverState::Counting);
    let (_visibility, hidden) = watch::channel(false);
    driver.run(hidden).await.unwrap();

    assert_eq!(driver.state(), DriverState::Ended);
    assert_eq!(driver.view().codes, vec!["STUDY-7781".to_string()]);
    assert!(driver.view().next_enabled);
    assert!(!state.timer(VISITOR).session().timer_active().await);
}
