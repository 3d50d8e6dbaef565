//! "Next post" form target.

use axum::extract::{Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::visitor::Visitor;
use crate::error::{ApiError, ApiErrorBody};
use crate::redirect::RedirectSelector;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(super::timer::NAVIGATE_PATH, get(next_post))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct NextQuery {
    /// Must be `next`.
    pub action: Option<String>,
    pub current_post_id: Option<String>,
    pub post_timer_nonce: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /next?action=next&current_post_id=..&post_timer_nonce=..
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/next",
    tag = "Timer",
    params(NextQuery),
    responses(
        (status = 302, description = "Redirect to the next post, or to the site home"),
        (status = 204, description = "No usable destination; stay on the current page"),
        (status = 400, description = "Missing or invalid parameters", body = ApiErrorBody),
        (status = 403, description = "Invalid anti-forgery token", body = ApiErrorBody),
    ),
)]
pub async fn next_post(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<NextQuery>,
) -> Result<Response, ApiError> {
    if query.action.as_deref() != Some("next") {
        return Err(ApiError::bad_request("Unknown action"));
    }

    let nonce = query.post_timer_nonce.as_deref().unwrap_or_default();
    if !state.nonces.verify(&visitor.token, nonce) {
        tracing::info!(visitor = %visitor.token, "rejected navigation with invalid nonce");
        return Err(ApiError::forbidden("Security check failed"));
    }

    let current_post_id: u64 = query
        .current_post_id
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| ApiError::bad_request("Missing post ID"))?
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid post ID"))?;

    // Counted before the destination is chosen, even if no redirect happens.
    let hits = state.timer(&visitor.token).record_navigation().await;

    let selector = RedirectSelector::new(&state.settings, state.posts.as_ref(), &state.config.site_url);
    match selector.select_next(current_post_id).await {
        Some(url) => {
            tracing::debug!(visitor = %visitor.token, current_post_id, hit_count = hits, %url, "redirecting to next post");
            Ok((StatusCode::FOUND, [(LOCATION, url.to_string())]).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
