//! Widget bootstrap: decides whether a post gets a fresh countdown and hands
//! the widget its options and anti-forgery token.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use timer_common::{TimerBootstrap, TimerOptions};

use crate::auth::visitor::Visitor;
use crate::error::{ApiError, ApiErrorBody};
use crate::AppState;

pub const AJAX_PATH: &str = "/ajax";
pub const NAVIGATE_PATH: &str = "/next";

pub fn router() -> Router<AppState> {
    Router::new().route("/posts/{post_id}/timer", get(get_timer))
}

// ---------------------------------------------------------------------------
// GET /api/v1/posts/:post_id/timer
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/posts/{post_id}/timer",
    tag = "Timer",
    params(("post_id" = u64, Path, description = "Post being displayed")),
    responses(
        (status = 200, description = "Widget bootstrap", body = TimerBootstrap),
        (status = 400, description = "Invalid post id", body = ApiErrorBody),
    ),
)]
pub async fn get_timer(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(post_id): Path<String>,
) -> Result<Json<TimerBootstrap>, ApiError> {
    let post_id: u64 = post_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid post ID"))?;

    let settings = &state.settings;
    let timer = state.timer(&visitor.token);
    let render = timer.should_render().await;
    let hit_count = timer.session().hit_count().await;

    tracing::debug!(visitor = %visitor.token, post_id, render, hit_count, "widget bootstrap");

    Ok(Json(TimerBootstrap {
        render,
        post_id,
        ajax_url: AJAX_PATH.to_string(),
        navigate_url: NAVIGATE_PATH.to_string(),
        nonce: state.nonces.issue(&visitor.token),
        options: TimerOptions {
            timer_seconds: settings.timer_seconds,
            require_start_button: settings.require_start_button,
            pause_on_hidden_tab: settings.pause_on_hidden_tab,
            suppress_multiple_tabs: settings.suppress_multiple_tabs,
            show_visit_counter: settings.show_visit_counter,
            hit_count,
            view_quota: settings.view_quota,
        },
        show_start_button: settings.require_start_button && hit_count <= settings.view_quota,
        show_next_button: hit_count < settings.view_quota,
        visit_counter: settings
            .show_visit_counter
            .then(|| format!("View: {}/{}", hit_count, settings.view_quota)),
    }))
}
