//! Cancellable periodic tasks.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// A background job run on a fixed period. The first run happens right away.
///
/// The job is aborted by [`ScheduledTask::cancel`] or when the handle is
/// dropped, whichever comes first. Each run is awaited before the next tick
/// is taken, so runs of one task never overlap.
pub struct ScheduledTask {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Spawns `job` on the current tokio runtime.
    pub fn every<F, Fut>(name: &str, period: Duration, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_name = name.to_string();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                debug!(task = %task_name, "Scheduled run");
                job().await;
            }
        });

        Self {
            name: name.to_string(),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(task = %self.name, "Cancelling scheduled task");
            handle.abort();
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
