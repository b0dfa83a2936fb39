//! The scheduled half of history synchronization: a repeating poll task with
//! an explicit lifecycle handle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::ChatEngine;

/// Owns the background poll task. Cancelling stops scheduled polling; the
/// engine stays usable and forced polls still run.
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn the repeating poll. The first tick fires immediately, which doubles
/// as the startup poll.
pub(crate) fn spawn(engine: Arc<ChatEngine>) -> PollHandle {
    let interval_ms = engine.config().sync.interval_ms.max(1);
    let poll_during_submission = engine.config().sync.poll_during_submission;

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
        loop {
            interval.tick().await;
            if !poll_during_submission && engine.submission_in_flight() {
                debug!("scheduled poll deferred: submission in flight");
                continue;
            }
            engine.poll_once().await;
        }
    });

    PollHandle { task }
}
