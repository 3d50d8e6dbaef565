pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod redirect;
pub mod routes;
pub mod session;
pub mod settings;
pub mod timer;

use std::sync::Arc;

use auth::nonce::NonceKeys;
use config::Config;
use db::kv::KeyValueStore;
use db::posts::PostCatalog;
use settings::Settings;
use timer::TimerMachine;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub kv: Arc<dyn KeyValueStore>,
    pub posts: Arc<dyn PostCatalog>,
    pub settings: Arc<Settings>,
    pub nonces: Arc<NonceKeys>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State machine for one visitor, scoped to a request.
    pub fn timer<'a>(&'a self, visitor: &'a str) -> TimerMachine<'a> {
        TimerMachine::new(
            &self.settings,
            session::VisitorSession::new(self.kv.as_ref(), visitor),
        )
        .with_atomic_lock(self.config.atomic_tab_lock)
    }
}
