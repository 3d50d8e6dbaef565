//! Single AJAX endpoint dispatching on the form's `action` field.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use timer_common::ajax::{
    ActiveElsewhere, AjaxForm, CountdownConflict, CountdownEnded, CountdownStarted,
    StartCountdownData, TabClosed,
};
use timer_common::{AjaxAction, AjaxEnvelope};

use crate::auth::visitor::Visitor;
use crate::error::{ApiError, ApiErrorBody};
use crate::timer::StartOutcome;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(super::timer::AJAX_PATH, post(dispatch))
}

// ---------------------------------------------------------------------------
// POST /ajax
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/ajax",
    tag = "Timer",
    request_body(content = AjaxForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "`{ success, data }` envelope; `success` is false when another tab holds the timer"),
        (status = 400, description = "Unknown action or missing post ID", body = ApiErrorBody),
        (status = 403, description = "Invalid anti-forgery token", body = ApiErrorBody),
    ),
)]
pub async fn dispatch(
    State(state): State<AppState>,
    visitor: Visitor,
    Form(form): Form<AjaxForm>,
) -> Result<Response, ApiError> {
    let action = form
        .action
        .as_deref()
        .and_then(AjaxAction::parse)
        .ok_or_else(|| ApiError::bad_request("Unknown action"))?;

    let nonce = form.post_timer_nonce.as_deref().unwrap_or_default();
    if !state.nonces.verify(&visitor.token, nonce) {
        tracing::info!(visitor = %visitor.token, action = action.as_str(), "rejected request with invalid nonce");
        return Err(ApiError::forbidden("Invalid nonce"));
    }

    let post_id = form
        .post_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing post ID"))?;

    tracing::debug!(visitor = %visitor.token, action = action.as_str(), post_id, "ajax action");

    let timer = state.timer(&visitor.token);
    let response = match action {
        AjaxAction::StartCountdown => match timer.start_countdown().await {
            StartOutcome::Started => Json(AjaxEnvelope::success(StartCountdownData::Started(
                CountdownStarted::default(),
            )))
            .into_response(),
            StartOutcome::AlreadyActive => Json(AjaxEnvelope::failure(
                StartCountdownData::Conflict(CountdownConflict::default()),
            ))
            .into_response(),
        },
        AjaxAction::StartButtonClick => {
            let status = timer.start_button_click().await;
            Json(AjaxEnvelope::success(ActiveElsewhere { status })).into_response()
        }
        AjaxAction::EndCountdown => {
            let pvt_complete_code = timer.end_countdown().await.unwrap_or_default();
            Json(AjaxEnvelope::success(CountdownEnded { pvt_complete_code })).into_response()
        }
        AjaxAction::CloseCurrentTab => {
            timer.close_current_tab().await;
            Json(AjaxEnvelope::success(TabClosed::default())).into_response()
        }
    };

    Ok(response)
}
