//! Periodic task with start/stop/nudge

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runs a cycle on a fixed interval in a background task.
///
/// Cycles never overlap: the next tick is not polled until the current cycle
/// finishes, and ticks missed during a slow cycle are delayed rather than
/// bunched up.
#[derive(Default)]
pub struct Poller {
    handle: Option<JoinHandle<()>>,
    nudge: Arc<Notify>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the loop. The first cycle runs immediately. A running loop is
    /// left untouched.
    pub fn start<F, Fut>(&mut self, interval: Duration, mut cycle: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            return;
        }

        let nudge = self.nudge.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = nudge.notified() => {
                        ticker.reset();
                    }
                }
                cycle().await;
            }
        }));
    }

    /// Stop the loop and wait for the task to wind down. Once this returns
    /// no further cycle runs and no in-flight cycle is still touching the
    /// host.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Request an early cycle. Ignored when stopped.
    pub fn nudge(&self) {
        if self.is_running() {
            self.nudge.notify_one();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
