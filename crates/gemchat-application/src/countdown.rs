//! Per-second OTP countdown.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

/// Starts countdown timers.
pub struct OtpCountdown;

impl OtpCountdown {
    /// Ticks once per second with the seconds left, then calls `on_expire`
    /// once when the count reaches zero.
    ///
    /// The returned handle cancels the timer when dropped, so a countdown
    /// never outlives the form that started it.
    pub fn start<T, E>(ttl: Duration, mut on_tick: T, on_expire: E) -> CountdownHandle
    where
        T: FnMut(u64) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let mut remaining = ttl.as_secs();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                on_tick(remaining);
            }
            on_expire();
        });
        CountdownHandle {
            handle: Some(handle),
        }
    }
}

/// Cancelable handle to a running countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    handle: Option<JoinHandle<()>>,
}

impl CountdownHandle {
    /// Stops the countdown; neither callback fires afterwards.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
