use std::sync::atomic::{AtomicUsize, Ordering};

/// Widgets visible in one document. Used for the multi-tab check when a widget
/// initializes.
#[derive(Debug, Default)]
pub struct DocumentContext {
    visible: AtomicUsize,
}

impl DocumentContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible_timers(&self) -> usize {
        self.visible.load(Ordering::SeqCst)
    }

    pub(crate) fn register_visible(&self) {
        self.visible.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn release_visible(&self) {
        let _ = self
            .visible
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}
