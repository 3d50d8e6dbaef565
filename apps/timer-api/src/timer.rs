//! Per-visitor countdown state machine.
//!
//! `IDLE -> RUNNING -> COMPLETED -> IDLE`. `RUNNING` is the `timer_active` flag
//! in the visitor session; `hit_count` moves only on navigation and on
//! completion-code release.

use crate::session::VisitorSession;
use crate::settings::Settings;

/// Result of a `start_countdown` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Another tab already runs a countdown for this visitor.
    AlreadyActive,
}

pub struct TimerMachine<'a> {
    settings: &'a Settings,
    session: VisitorSession<'a>,
    atomic_lock: bool,
}

impl<'a> TimerMachine<'a> {
    pub fn new(settings: &'a Settings, session: VisitorSession<'a>) -> Self {
        Self {
            settings,
            session,
            atomic_lock: false,
        }
    }

    /// Take the multi-tab lock with the store's set-if-absent primitive.
    pub fn with_atomic_lock(mut self, atomic_lock: bool) -> Self {
        self.atomic_lock = atomic_lock;
        self
    }

    pub fn session(&self) -> &VisitorSession<'a> {
        &self.session
    }

    /// Whether a fresh widget should be served. False when the timer is off or
    /// another tab already runs one under multi-tab suppression.
    pub async fn should_render(&self) -> bool {
        if !self.settings.timer_enabled {
            return false;
        }
        !(self.settings.suppress_multiple_tabs && self.session.timer_active().await)
    }

    pub async fn start_countdown(&self) -> StartOutcome {
        let visitor = self.session.visitor();

        if !self.settings.suppress_multiple_tabs {
            self.session.mark_timer_active().await;
            tracing::debug!(%visitor, "countdown started");
            return StartOutcome::Started;
        }

        let acquired = if self.atomic_lock {
            self.session.try_mark_timer_active().await
        } else if self.session.timer_active().await {
            false
        } else {
            // Another tab can slip in between the read and this write.
            self.session.mark_timer_active().await;
            true
        };

        if acquired {
            tracing::debug!(%visitor, "countdown started");
            StartOutcome::Started
        } else {
            tracing::info!(%visitor, "countdown already active in another tab");
            StartOutcome::AlreadyActive
        }
    }

    /// Read-only: is a countdown already running elsewhere?
    pub async fn start_button_click(&self) -> bool {
        self.session.timer_active().await
    }

    /// Finish the countdown. Returns the completion code when the quota is met
    /// (the code itself may be empty) and resets the hit count in that case.
    pub async fn end_countdown(&self) -> Option<String> {
        self.session.clear_timer().await;

        let hits = self.session.hit_count().await;
        if hits >= self.settings.view_quota {
            self.session.set_hit_count(0).await;
            tracing::info!(visitor = %self.session.visitor(), hit_count = hits, "quota met; completion code released");
            Some(self.settings.completion_code.clone())
        } else {
            tracing::debug!(visitor = %self.session.visitor(), hit_count = hits, "countdown ended");
            None
        }
    }

    pub async fn close_current_tab(&self) {
        self.session.clear_timer().await;
        tracing::debug!(visitor = %self.session.visitor(), "tab closed; timer cleared");
    }

    /// Count a "next" navigation. Returns the new hit count.
    pub async fn record_navigation(&self) -> u32 {
        let hits = self.session.hit_count().await.saturating_add(1);
        self.session.set_hit_count(hits).await;
        tracing::debug!(visitor = %self.session.visitor(), hit_count = hits, "navigation recorded");
        hits
    }
}
