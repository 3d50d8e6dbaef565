//! One widget's countdown: `NotStarted -> Counting -> Ended`.

use std::sync::Arc;
use std::time::Duration;

use timer_common::{TimerBootstrap, TimerOptions};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::backend::TimerBackend;
use crate::document::DocumentContext;
use crate::error::ClientError;
use crate::view::WidgetView;

pub const DEFAULT_TIMER_SECONDS: u32 = 60;
pub const TICK: Duration = Duration::from_secs(1);
/// How long the "another tab" warning stays up before the widget is hidden.
pub const BLOCKED_WARNING_DELAY: Duration = Duration::from_secs(9);

pub const ALREADY_RUNNING_MESSAGE: &str = "Timer is already running.";
pub const ANOTHER_TAB_WARNING: &str = "It looks like you've already started the timer in another tab. Please close that tab and try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    pub timer_seconds: u32,
    pub require_start_button: bool,
    /// Whether the page actually carries the start button. A required but
    /// missing button means the countdown never starts.
    pub show_start_button: bool,
    pub pause_on_hidden_tab: bool,
    pub suppress_multiple_tabs: bool,
    pub hit_count: u32,
    pub view_quota: u32,
}

impl From<&TimerOptions> for DriverOptions {
    fn from(options: &TimerOptions) -> Self {
        Self {
            timer_seconds: match options.timer_seconds {
                0 => DEFAULT_TIMER_SECONDS,
                n => n,
            },
            require_start_button: options.require_start_button,
            show_start_button: options.require_start_button,
            pause_on_hidden_tab: options.pause_on_hidden_tab,
            suppress_multiple_tabs: options.suppress_multiple_tabs,
            hit_count: options.hit_count,
            view_quota: options.view_quota,
        }
    }
}

impl From<&TimerBootstrap> for DriverOptions {
    /// The server hides the start button once the visitor is past quota.
    fn from(bootstrap: &TimerBootstrap) -> Self {
        Self {
            show_start_button: bootstrap.show_start_button,
            ..Self::from(&bootstrap.options)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    NotStarted,
    Counting,
    Ended,
    /// Another widget in the same document was already running.
    Suppressed,
    /// The server reported a countdown in another tab.
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not counting, or paused while hidden.
    Idle,
    Ticked(u32),
    Finished,
}

/// Drives one widget's countdown.
///
/// Starting a countdown sends `start_countdown` in the background, which needs
/// a Tokio runtime: the one current when the driver was built, the one given
/// to [`with_runtime`](Self::with_runtime), or the one current when the
/// countdown starts. Without any, the request is skipped with a warning and
/// the clock still runs.
pub struct CountdownDriver<V: WidgetView> {
    backend: Arc<dyn TimerBackend>,
    runtime: Option<Handle>,
    document: Arc<DocumentContext>,
    view: V,
    options: DriverOptions,
    post_id: u64,
    remaining: u32,
    state: DriverState,
    ticked: bool,
    paused: bool,
    registered: bool,
}

impl<V: WidgetView> CountdownDriver<V> {
    pub fn new(
        backend: Arc<dyn TimerBackend>,
        document: Arc<DocumentContext>,
        view: V,
        options: DriverOptions,
        post_id: u64,
    ) -> Self {
        Self {
            backend,
            runtime: Handle::try_current().ok(),
            document,
            view,
            remaining: options.timer_seconds,
            options,
            post_id,
            state: DriverState::NotStarted,
            ticked: false,
            paused: false,
            registered: false,
        }
    }

    /// Spawn background requests on `handle`.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Attach the widget to its document.
    ///
    /// Without a start button the countdown begins immediately; otherwise it
    /// waits for [`click_start`](Self::click_start). A required button the
    /// page does not show keeps the widget idle for good.
    pub fn initialize(&mut self) -> DriverState {
        if self.state != DriverState::NotStarted {
            return self.state;
        }

        if self.options.suppress_multiple_tabs && self.document.visible_timers() > 0 {
            self.view.hide_start_button();
            self.view.show_message(ALREADY_RUNNING_MESSAGE);
            self.state = DriverState::Suppressed;
            tracing::debug!(post_id = self.post_id, "timer suppressed in this document");
            return self.state;
        }

        self.document.register_visible();
        self.registered = true;
        self.view.show_count(self.remaining);

        if !self.options.require_start_button {
            self.begin();
        } else if !self.options.show_start_button {
            tracing::debug!(post_id = self.post_id, "start button not shown; countdown stays idle");
        }
        self.state
    }

    /// Handle a press of the start button.
    pub async fn click_start(&mut self) -> Result<DriverState, ClientError> {
        if self.state != DriverState::NotStarted
            || (self.options.require_start_button && !self.options.show_start_button)
        {
            return Ok(self.state);
        }

        let active_elsewhere = self.backend.start_button_click(self.post_id).await?;
        if !active_elsewhere {
            self.begin();
            return Ok(self.state);
        }

        tracing::info!(post_id = self.post_id, "countdown already active in another tab");
        self.state = DriverState::Blocked;
        self.view.hide_start_button();
        self.view.show_message(ANOTHER_TAB_WARNING);
        time::sleep(BLOCKED_WARNING_DELAY).await;
        self.view.hide_widget();
        self.release();
        Ok(self.state)
    }

    fn begin(&mut self) {
        self.view.hide_start_button();
        self.state = DriverState::Counting;

        // Fire and forget: the clock does not wait for the server.
        let post_id = self.post_id;
        match self.runtime.clone().or_else(|| Handle::try_current().ok()) {
            Some(handle) => {
                let backend = Arc::clone(&self.backend);
                handle.spawn(async move {
                    match backend.start_countdown(post_id).await {
                        Ok(true) => {}
                        Ok(false) => {
                            tracing::info!(post_id, "server reports timer active in another tab")
                        }
                        Err(e) => tracing::warn!(post_id, error = %e, "start_countdown failed"),
                    }
                });
            }
            None => tracing::warn!(post_id, "no tokio runtime; start_countdown not sent"),
        }

        self.view.reveal_next();
    }

    /// Advance the clock by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != DriverState::Counting || self.paused {
            return TickOutcome::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        self.ticked = true;
        self.view.show_count(self.remaining);

        if self.remaining == 0 {
            self.state = DriverState::Ended;
            TickOutcome::Finished
        } else {
            TickOutcome::Ticked(self.remaining)
        }
    }

    /// Report the finished countdown and reveal the code if one was released.
    ///
    /// The "next" button is enabled even when the request fails.
    pub async fn finish(&mut self) -> Result<(), ClientError> {
        let result = self.backend.end_countdown(self.post_id).await;
        self.ticked = false;

        if let Ok(code) = &result {
            if self.options.hit_count >= self.options.view_quota && !code.is_empty() {
                self.view.show_code(code);
            }
        }
        self.view.enable_next();

        result.map(|_| ())
    }

    /// Tab visibility changed. Ignored unless pausing on hidden tabs.
    pub fn set_hidden(&mut self, hidden: bool) {
        if self.options.pause_on_hidden_tab {
            self.paused = hidden;
        }
    }

    /// The page is going away. Best effort.
    pub async fn unload(&mut self) {
        if self.ticked {
            if let Err(e) = self.backend.close_current_tab(self.post_id).await {
                tracing::warn!(post_id = self.post_id, error = %e, "close_current_tab failed");
            }
            self.ticked = false;
        }
        self.release();
    }

    fn release(&mut self) {
        if self.registered {
            self.document.release_visible();
            self.registered = false;
        }
    }

    /// Tick once a second until the countdown ends, then finalize it.
    ///
    /// `hidden` carries the tab's visibility. Returns at once unless the
    /// driver is counting.
    pub async fn run(&mut self, mut hidden: watch::Receiver<bool>) -> Result<(), ClientError> {
        let mut interval = time::interval(TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        let mut watching = true;
        while self.state == DriverState::Counting {
            tokio::select! {
                _ = interval.tick() => {
                    if self.tick() == TickOutcome::Finished {
                        return self.finish().await;
                    }
                }
                changed = hidden.changed(), if watching => match changed {
                    Ok(()) => {
                        let was_paused = self.paused;
                        self.set_hidden(*hidden.borrow_and_update());
                        if was_paused && !self.paused {
                            interval.reset();
                        }
                    }
                    Err(_) => watching = false,
                },
            }
        }
        Ok(())
    }
}
