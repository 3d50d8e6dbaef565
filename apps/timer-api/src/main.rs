use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use timer_api::auth::nonce::NonceKeys;
use timer_api::config::Config;
use timer_api::db::kv::{KeyValueStore, MemoryStore, RedisStore};
use timer_api::db::posts::{PostCatalog, StaticCatalog};
use timer_api::settings::{EnvOptions, Settings};
use timer_api::AppState;
use std::path::Path;

#[tokio::main]
async fn main() {
    // Env vars may also be set externally, so a missing .env is fine.
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let settings = Settings::load(&EnvOptions)
        .unwrap_or_else(|e| panic!("invalid timer settings: {e}"));

    // Per-visitor state: Redis when configured, otherwise process memory.
    let kv: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisStore::connect(url)
                .await
                .expect("failed to connect to redis"),
        ),
        None => {
            tracing::warn!("REDIS_URL not set; visitor state is kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let posts: Arc<dyn PostCatalog> = match &config.posts_file {
        Some(path) => Arc::new(StaticCatalog::from_json_file(path).expect("failed to load posts")),
        None => Arc::new(StaticCatalog::empty()),
    };

    tracing::info!(
        site_url = %config.site_url,
        timer_seconds = settings.timer_seconds,
        view_quota = settings.view_quota,
        redirect_mode = ?settings.redirect_mode,
        "timer-api configured"
    );

    let state = AppState {
        kv,
        posts,
        settings: Arc::new(settings),
        nonces: Arc::new(NonceKeys::new(&config.nonce_secret)),
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = timer_api::routes::app(state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", timer_api::routes::ApiDoc::openapi()),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "timer-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
