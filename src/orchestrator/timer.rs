//! Cancelable auto-close continuation.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Fires once after `delay`. Dropping or cancelling it aborts the sleeping task,
/// so a torn-down flow never receives a late close.
pub(crate) struct AutoCloseTimer {
    task: JoinHandle<()>,
    fired: oneshot::Receiver<()>,
    deadline: Instant,
}

impl AutoCloseTimer {
    pub(crate) fn start(delay: Duration) -> Self {
        let (tx, rx) = oneshot::channel();
        let deadline = Instant::now() + delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(());
        });
        Self {
            task,
            fired: rx,
            deadline,
        }
    }

    /// Resolves when the delay has elapsed. Never resolves once cancelled.
    pub(crate) async fn wait(&mut self) {
        if (&mut self.fired).await.is_err() {
            futures::future::pending::<()>().await;
        }
    }

    pub(crate) fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub(crate) fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for AutoCloseTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay_and_not_before() {
        let start = Instant::now();
        let mut timer = AutoCloseTimer::start(Duration::from_millis(3000));

        let early = tokio::time::timeout(Duration::from_millis(2999), timer.wait()).await;
        assert!(early.is_err(), "timer fired before its delay");
        assert!(timer.remaining() <= Duration::from_millis(1));

        timer.wait().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed < Duration::from_millis(3010));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_task_is_aborted() {
        let timer = AutoCloseTimer::start(Duration::from_secs(3));
        let abort = timer.task.abort_handle();
        timer.cancel();
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(abort.is_finished());
    }
}
