//! Simulated assistant replies.
//!
//! A [`ReplySimulator`] waits `typing_delay_ms`, spaces reply completions at
//! least `min_gap_ms` apart and adds a fixed `thinking_ms` latency on top.
//! The reply text is the prompt preview wrapped in the configured prefix and
//! suffix.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use gemchat_core::config::ReplyConfig;

/// Rate-shaped canned reply generator.
///
/// Clones share the spacing state, so every clone observes the same
/// "last scheduled completion".
#[derive(Debug, Clone)]
pub struct ReplySimulator {
    config: Arc<ReplyConfig>,
    last_slot: Arc<Mutex<Option<Instant>>>,
}

impl ReplySimulator {
    pub fn new(config: ReplyConfig) -> Self {
        Self {
            config: Arc::new(config),
            last_slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &ReplyConfig {
        &self.config
    }

    /// Builds the reply for `prompt`.
    pub fn build_reply(&self, prompt: &str) -> String {
        let preview: String = prompt.chars().take(self.config.preview_chars).collect();
        format!("{}{}{}", self.config.prefix, preview, self.config.suffix)
    }

    /// Reserves the next completion slot and returns the delay from `now`.
    ///
    /// The slot is `now` plus the typing pause, pushed back to `min_gap`
    /// after the previous slot when that is later. The fixed thinking latency
    /// is added on top.
    pub fn reserve_delay(&self, now: Instant) -> Duration {
        let min_gap = Duration::from_millis(self.config.min_gap_ms);
        let earliest = now + Duration::from_millis(self.config.typing_delay_ms);
        let mut last_slot = self.last_slot.lock().unwrap_or_else(PoisonError::into_inner);

        let slot = match *last_slot {
            Some(last) => std::cmp::max(earliest, last + min_gap),
            None => earliest,
        };
        *last_slot = Some(slot);

        slot.saturating_duration_since(now) + Duration::from_millis(self.config.thinking_ms)
    }

    /// Schedules `on_ready` to run once with the reply for `prompt`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_reply<F>(&self, prompt: &str, on_ready: F) -> ReplyHandle
    where
        F: FnOnce(String) + Send + 'static,
    {
        let delay = self.reserve_delay(Instant::now());
        let reply = self.build_reply(prompt);
        debug!(delay_ms = delay.as_millis() as u64, "Reply scheduled");

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_ready(reply);
        });

        ReplyHandle { handle, delay }
    }
}

impl Default for ReplySimulator {
    fn default() -> Self {
        Self::new(ReplyConfig::default())
    }
}

/// Handle to a pending reply.
///
/// Dropping the handle does not cancel the reply; call [`ReplyHandle::cancel`].
#[derive(Debug)]
pub struct ReplyHandle {
    handle: JoinHandle<()>,
    delay: Duration,
}

impl ReplyHandle {
    /// Prevents the callback from running if it has not run yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Delay computed when the reply was scheduled.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}
