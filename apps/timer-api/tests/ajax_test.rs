mod common;

use axum::http::header::COOKIE;
use axum::http::StatusCode;
use timer_api::settings::Settings;
use timer_common::AjaxAction;

fn suppressing(quota: u32) -> Settings {
    Settings {
        view_quota: quota,
        completion_code: "STUDY-7781".to_string(),
        suppress_multiple_tabs: true,
        ..Settings::default()
    }
}

// ---------------------------------------------------------------------------
// Anti-forgery and validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_nonce_is_forbidden_and_mutates_nothing() {
    let (server, state) = common::test_app(suppressing(2), vec![]);

    // Token issued to a different visitor.
    let foreign = state.nonces.issue(common::OTHER_VISITOR);
    let resp = server
        .post("/ajax")
        .add_header(COOKIE, common::cookie(common::VISITOR))
        .form(&[
            ("action", "start_countdown"),
            ("post_id", "1"),
            ("post_timer_nonce", foreign.as_str()),
        ])
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(resp.json::<serde_json::Value>()["error"]["code"], "FORBIDDEN");
    assert!(!state.timer(common::VISITOR).session().timer_active().await);

    // No token at all.
    let resp = server
        .post("/ajax")
        .add_header(COOKIE, common::cookie(common::VISITOR))
        .form(&[("action", "close_current_tab"), ("post_id", "1")])
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_post_id_is_bad_request() {
    let (server, state) = common::test_app(suppressing(2), vec![]);
    let nonce = state.nonces.issue(common::VISITOR);

    let resp = server
        .post("/ajax")
        .add_header(COOKIE, common::cookie(common::VISITOR))
        .form(&[
            ("action", "start_countdown"),
            ("post_timer_nonce", nonce.as_str()),
        ])
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    assert!(!state.timer(common::VISITOR).session().timer_active().await);
}

#[tokio::test]
async fn unknown_action_is_bad_request() {
    let (server, state) = common::test_app(suppressing(2), vec![]);
    let nonce = state.nonces.issue(common::VISITOR);

    let resp = server
        .post("/ajax")
        .add_header(COOKIE, common::cookie(common::VISITOR))
        .form(&[
            ("action", "reset_everything"),
            ("post_id", "1"),
            ("post_timer_nonce", nonce.as_str()),
        ])
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// start_countdown / start_button_click
// ---------------------------------------------------------------------------

#[tokio::test]
async fn start_countdown_then_conflict_in_second_tab() {
    let (server, state) = common::test_app(suppressing(2), vec![]);

    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::StartCountdown).await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["active_status"], true);

    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::StartCountdown).await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], false);
    assert_eq!(body["data"]["message"], "Timer already active in another tab");

    // Other visitors are unaffected.
    let resp =
        common::ajax(&server, &state, common::OTHER_VISITOR, AjaxAction::StartCountdown).await;
    assert_eq!(resp.json::<serde_json::Value>()["success"], true);
}

#[tokio::test]
async fn start_button_two_tab_scenario() {
    let settings = Settings {
        require_start_button: true,
        ..suppressing(2)
    };
    let (server, state) = common::test_app(settings, vec![]);

    // Tab A: nothing running yet, so it starts.
    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::StartButtonClick).await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], false);
    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::StartCountdown).await;
    assert_eq!(resp.json::<serde_json::Value>()["success"], true);

    // Tab B: told a countdown runs elsewhere, and a start attempt conflicts.
    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::StartButtonClick).await;
    assert_eq!(resp.json::<serde_json::Value>()["data"]["status"], true);
    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::StartCountdown).await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["message"], "Timer already active in another tab");
}

// ---------------------------------------------------------------------------
// end_countdown / close_current_tab
// ---------------------------------------------------------------------------

#[tokio::test]
async fn end_countdown_below_quota_returns_empty_code() {
    let (server, state) = common::test_app(suppressing(3), vec![]);
    let timer = state.timer(common::VISITOR);
    timer.session().set_hit_count(2).await;
    timer.session().mark_timer_active().await;

    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::EndCountdown).await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["pvt_complete_code"], "");

    assert!(!timer.session().timer_active().await);
    assert_eq!(timer.session().hit_count().await, 2);
}

#[tokio::test]
async fn end_countdown_at_quota_releases_code_and_resets() {
    let (server, state) = common::test_app(suppressing(3), vec![]);
    let timer = state.timer(common::VISITOR);
    timer.session().set_hit_count(3).await;

    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::EndCountdown).await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"]["pvt_complete_code"], "STUDY-7781");
    assert_eq!(timer.session().hit_count().await, 0);

    // Released once only.
    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::EndCountdown).await;
    assert_eq!(resp.json::<serde_json::Value>()["data"]["pvt_complete_code"], "");
}

#[tokio::test]
async fn close_current_tab_is_idempotent() {
    let (server, state) = common::test_app(suppressing(2), vec![]);

    common::ajax(&server, &state, common::VISITOR, AjaxAction::StartCountdown).await;

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::CloseCurrentTab).await;
        resp.assert_status_ok();
        bodies.push(resp.json::<serde_json::Value>());
        assert!(!state.timer(common::VISITOR).session().timer_active().await);
    }

    assert_eq!(
        bodies[0],
        serde_json::json!({ "success": true, "data": { "message": "Timer state cleared" } })
    );
    assert!(bodies.iter().all(|b| *b == bodies[0]));

    // A new countdown can start after the tab released its timer.
    let resp = common::ajax(&server, &state, common::VISITOR, AjaxAction::StartCountdown).await;
    assert_eq!(resp.json::<serde_json::Value>()["success"], true);
}
