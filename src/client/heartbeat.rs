//! Heartbeat pinger.
//!
//! While joined, a background task fires every period with the time elapsed
//! since the previous tick (or since start, for the first one). Dropping or
//! stopping the handle ends the task.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug)]
pub struct Heartbeat {
    handle: JoinHandle<()>,
}

impl Heartbeat {
    /// Start ticking. The first tick happens one full period after start.
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut(i64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut last = Instant::now();
            let mut ticker = interval_at(last + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let now = ticker.tick().await;
                let elapsed_ms = now.saturating_duration_since(last).as_millis() as i64;
                last = now;
                tick(elapsed_ms).await;
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_carry_elapsed_time() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let heartbeat = Heartbeat::spawn(Duration::from_secs(30), move |elapsed| {
            sink.lock().push(elapsed);
            async {}
        });

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(seen.lock().is_empty());

        tokio::time::sleep(Duration::from_secs(62)).await;
        assert_eq!(*seen.lock(), vec![30_000, 30_000, 30_000]);

        heartbeat.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(seen.lock().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticking() {
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let heartbeat = Heartbeat::spawn(Duration::from_secs(30), move |_| {
            *sink.lock() += 1;
            async {}
        });
        drop(heartbeat);

        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(*count.lock(), 0);
    }
}
