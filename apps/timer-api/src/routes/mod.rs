pub mod ajax;
pub mod health;
pub mod navigation;
pub mod timer;

use axum::middleware;
use axum::Router;
use utoipa::OpenApi;

use crate::auth::visitor::ensure_visitor;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(ajax::router())
        .merge(navigation::router())
        .nest("/api/v1", timer::router())
}

/// Full application: every route behind the visitor cookie middleware.
pub fn app(state: AppState) -> Router {
    router()
        .layer(middleware::from_fn_with_state(state.clone(), ensure_visitor))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Timer
        timer::get_timer,
        ajax::dispatch,
        navigation::next_post,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Route request/response types
            health::HealthResponse,
            timer_common::TimerBootstrap,
            timer_common::TimerOptions,
            timer_common::AjaxAction,
            timer_common::ajax::AjaxForm,
            timer_common::ajax::CountdownStarted,
            timer_common::ajax::CountdownConflict,
            timer_common::ajax::ActiveElsewhere,
            timer_common::ajax::CountdownEnded,
            timer_common::ajax::TabClosed,
        )
    ),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Timer", description = "Countdown widget state machine"),
    )
)]
pub struct ApiDoc;
