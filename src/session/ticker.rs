//! Cancellable periodic task

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Stops a ticker. Cancelling twice is harmless; dropping the handle cancels.
#[derive(Debug)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The task has stopped, by cancellation or because `on_tick` broke out
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Call `on_tick` every `period` until it breaks or the handle is cancelled.
///
/// The first call happens one full period after start. Periods shorter
/// than a millisecond are raised to one. Must be called inside a tokio runtime.
pub fn start_ticker<F>(period: Duration, mut on_tick: F) -> CancelHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    let period = period.max(MIN_PERIOD);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // the first tick of a tokio interval completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if flag.load(Ordering::SeqCst) {
                break;
            }
            if on_tick().is_break() {
                break;
            }
        }
    });

    CancelHandle { cancelled, task }
}
