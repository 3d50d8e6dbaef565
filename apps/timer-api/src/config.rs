/// Timer API process configuration, loaded from environment variables.
///
/// Timer behavior itself (durations, quota, completion code) lives in
/// [`Settings`](crate::settings::Settings).
#[derive(Debug, Clone)]
pub struct Config {
    /// Public origin of the site (e.g. `https://blog.example.com`). Used as the
    /// fallback redirect destination.
    pub site_url: String,
    /// Secret keying the anti-forgery tokens.
    pub nonce_secret: String,
    /// Redis connection string. When unset, per-visitor state is kept in memory.
    pub redis_url: Option<String>,
    /// Optional JSON file listing the posts available for random redirects.
    pub posts_file: Option<String>,
    /// Use the store's set-if-absent primitive when starting a countdown.
    pub atomic_tab_lock: bool,
    /// Mark the visitor cookie `Secure`.
    pub cookie_secure: bool,
    /// Port the HTTP server binds to.
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            site_url: required_var("SITE_URL").trim_end_matches('/').to_string(),
            nonce_secret: required_var("NONCE_SECRET"),
            redis_url: optional_var("REDIS_URL"),
            posts_file: optional_var("POSTS_FILE"),
            atomic_tab_lock: flag_var("ATOMIC_TAB_LOCK"),
            cookie_secure: flag_var("COOKIE_SECURE"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4010),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn flag_var(name: &str) -> bool {
    optional_var(name).is_some_and(|v| crate::settings::parse_flag(&v))
}
