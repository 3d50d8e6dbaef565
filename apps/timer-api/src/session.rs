//! Per-visitor countdown state on top of the key-value store.
//!
//! Store failures never reach the caller: reads fall back to "no state" and
//! failed writes are logged and dropped. The worst outcome is an extra timer.

use crate::db::kv::KeyValueStore;

/// `timer_active` lifetime in seconds.
pub const TIMER_ACTIVE_TTL_SECS: u64 = 5 * 60;

/// `hit_count` lifetime in seconds.
pub const HIT_COUNT_TTL_SECS: u64 = 30 * 60;

pub struct VisitorSession<'a> {
    kv: &'a dyn KeyValueStore,
    visitor: &'a str,
}

impl<'a> VisitorSession<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, visitor: &'a str) -> Self {
        Self { kv, visitor }
    }

    pub fn visitor(&self) -> &str {
        self.visitor
    }

    fn timer_key(&self) -> String {
        format!("pdt:{}:timer_active", self.visitor)
    }

    fn hits_key(&self) -> String {
        format!("pdt:{}:hits", self.visitor)
    }

    pub async fn timer_active(&self) -> bool {
        match self.kv.get(&self.timer_key()).await {
            Ok(value) => value.is_some(),
            Err(e) => {
                tracing::warn!(visitor = %self.visitor, error = %e, "timer flag lookup failed; assuming idle");
                false
            }
        }
    }

    pub async fn mark_timer_active(&self) {
        if let Err(e) = self
            .kv
            .set_ex(&self.timer_key(), "1", TIMER_ACTIVE_TTL_SECS)
            .await
        {
            tracing::warn!(visitor = %self.visitor, error = %e, "failed to store timer flag");
        }
    }

    /// Set the timer flag only if it is absent. A store error counts as acquired.
    pub async fn try_mark_timer_active(&self) -> bool {
        match self
            .kv
            .set_nx_ex(&self.timer_key(), "1", TIMER_ACTIVE_TTL_SECS)
            .await
        {
            Ok(acquired) => acquired,
            Err(e) => {
                tracing::warn!(visitor = %self.visitor, error = %e, "failed to store timer flag");
                true
            }
        }
    }

    pub async fn clear_timer(&self) {
        if let Err(e) = self.kv.del(&self.timer_key()).await {
            tracing::warn!(visitor = %self.visitor, error = %e, "failed to clear timer flag");
        }
    }

    /// Current hit count. Missing, unparsable or unreadable values read as 0.
    pub async fn hit_count(&self) -> u32 {
        match self.kv.get(&self.hits_key()).await {
            Ok(Some(raw)) => raw.parse().unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(visitor = %self.visitor, error = %e, "hit count lookup failed; assuming 0");
                0
            }
        }
    }

    pub async fn set_hit_count(&self, hits: u32) {
        if let Err(e) = self
            .kv
            .set_ex(&self.hits_key(), &hits.to_string(), HIT_COUNT_TTL_SECS)
            .await
        {
            tracing::warn!(visitor = %self.visitor, hits, error = %e, "failed to store hit count");
        }
    }
}
