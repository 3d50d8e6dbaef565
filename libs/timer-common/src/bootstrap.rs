//! Data handed to a countdown widget when its post is displayed.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Options the widget needs to drive its countdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimerOptions {
    pub timer_seconds: u32,
    pub require_start_button: bool,
    pub pause_on_hidden_tab: bool,
    pub suppress_multiple_tabs: bool,
    pub show_visit_counter: bool,
    /// Visitor's hit count at the time the page was served.
    pub hit_count: u32,
    pub view_quota: u32,
}

/// Response of the widget bootstrap endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimerBootstrap {
    /// False when the widget must not be shown at all.
    pub render: bool,
    pub post_id: u64,
    pub ajax_url: String,
    pub navigate_url: String,
    pub nonce: String,
    pub options: TimerOptions,
    pub show_start_button: bool,
    pub show_next_button: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_counter: Option<String>,
}
