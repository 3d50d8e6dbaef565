//! AJAX action names and payloads exchanged between the countdown widget and
//! the timer API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form field carrying the anti-forgery token on every request.
pub const NONCE_FIELD: &str = "post_timer_nonce";

/// Message returned when a second tab tries to start a countdown.
pub const ALREADY_ACTIVE_MESSAGE: &str = "Timer already active in another tab";

/// Message returned after a tab released its countdown.
pub const TIMER_CLEARED_MESSAGE: &str = "Timer state cleared";

/// The four actions the widget sends to the AJAX endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AjaxAction {
    StartCountdown,
    StartButtonClick,
    EndCountdown,
    CloseCurrentTab,
}

impl AjaxAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartCountdown => "start_countdown",
            Self::StartButtonClick => "start_button_click",
            Self::EndCountdown => "end_countdown",
            Self::CloseCurrentTab => "close_current_tab",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "start_countdown" => Some(Self::StartCountdown),
            "start_button_click" => Some(Self::StartButtonClick),
            "end_countdown" => Some(Self::EndCountdown),
            "close_current_tab" => Some(Self::CloseCurrentTab),
            _ => None,
        }
    }
}

/// Form body posted to the AJAX endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AjaxForm {
    pub action: Option<String>,
    pub post_id: Option<String>,
    pub post_timer_nonce: Option<String>,
}

/// `{ "success": bool, "data": ... }` wrapper around every 200 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AjaxEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> AjaxEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn failure(data: T) -> Self {
        Self {
            success: false,
            data,
        }
    }
}

/// `start_countdown` accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CountdownStarted {
    /// Always `"success"`.
    pub status: String,
    pub message: String,
    pub active_status: bool,
}

impl Default for CountdownStarted {
    fn default() -> Self {
        Self {
            status: "success".to_string(),
            message: "Countdown started".to_string(),
            active_status: true,
        }
    }
}

/// `start_countdown` rejected because another tab holds the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CountdownConflict {
    pub message: String,
    pub status: bool,
}

impl Default for CountdownConflict {
    fn default() -> Self {
        Self {
            message: ALREADY_ACTIVE_MESSAGE.to_string(),
            status: false,
        }
    }
}

/// Either outcome of `start_countdown`; the envelope's `success` tells them apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StartCountdownData {
    Started(CountdownStarted),
    Conflict(CountdownConflict),
}

/// `start_button_click`: `status` is true when a countdown already runs elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActiveElsewhere {
    pub status: bool,
}

/// `end_countdown`: the completion code, empty unless the quota was met.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct CountdownEnded {
    pub pvt_complete_code: String,
}

/// `close_current_tab` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TabClosed {
    pub message: String,
}

impl Default for TabClosed {
    fn default() -> Self {
        Self {
            message: TIMER_CLEARED_MESSAGE.to_string(),
        }
    }
}
