//! Picks where the "next" button sends a visitor.

use rand::seq::SliceRandom;
use reqwest::Url;

use crate::db::posts::PostCatalog;
use crate::settings::{RedirectMode, Settings};

/// Size of the random candidate batch requested from the catalog.
pub const RANDOM_BATCH_SIZE: usize = 5;

pub struct RedirectSelector<'a> {
    settings: &'a Settings,
    posts: &'a dyn PostCatalog,
    home_url: &'a str,
}

impl<'a> RedirectSelector<'a> {
    pub fn new(settings: &'a Settings, posts: &'a dyn PostCatalog, home_url: &'a str) -> Self {
        Self {
            settings,
            posts,
            home_url,
        }
    }

    /// Next destination, or `None` when the chosen candidate is not a usable URL
    /// and the visitor should stay where they are.
    pub async fn select_next(&self, current_post_id: u64) -> Option<Url> {
        let candidate = match self.settings.redirect_mode {
            RedirectMode::UrlList => self.pick_from_list()?,
            RedirectMode::Random => self.pick_random_post(current_post_id).await,
        };

        let url = validate_url(&candidate);
        if url.is_none() {
            tracing::warn!(%candidate, current_post_id, "dropping malformed redirect URL");
        }
        url
    }

    /// Uniform pick from the configured list. The current post is not excluded.
    fn pick_from_list(&self) -> Option<String> {
        let picked = self
            .settings
            .url_list
            .choose(&mut rand::thread_rng())
            .cloned();
        if picked.is_none() {
            tracing::warn!("redirect URL list is empty");
        }
        picked
    }

    async fn pick_random_post(&self, current_post_id: u64) -> String {
        let batch = match self.posts.random_published(RANDOM_BATCH_SIZE).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(error = %e, "random post lookup failed; sending visitor home");
                Vec::new()
            }
        };

        let Some(next_id) = batch.into_iter().find(|id| *id != current_post_id) else {
            tracing::info!(current_post_id, "no other published post; sending visitor home");
            return self.home_url.to_string();
        };

        match self.posts.permalink(next_id).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                tracing::warn!(next_id, "post has no permalink; sending visitor home");
                self.home_url.to_string()
            }
            Err(e) => {
                tracing::warn!(next_id, error = %e, "permalink lookup failed; sending visitor home");
                self.home_url.to_string()
            }
        }
    }
}

/// Absolute `http`/`https` URL with a host, or nothing.
pub fn validate_url(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate.trim()).ok()?;
    let web_scheme = matches!(url.scheme(), "http" | "https");
    let has_host = url.host_str().is_some_and(|host| !host.is_empty());
    (web_scheme && has_host).then_some(url)
}
