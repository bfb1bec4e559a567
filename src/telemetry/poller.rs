use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error};

use super::TelemetrySnapshot;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(120);

/// Owns a running count poller. Dropping the handle stops the poller: no
/// fetch starts after the drop, although one already in flight may still
/// deliver its result.
pub struct PollerHandle {
    stopped: Arc<AtomicBool>,
    wake_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

/// Fetch immediately, then once every `interval`, sending each snapshot to
/// `sink`. The poller also ends on its own once `sink` is disconnected.
pub fn start_polling<F>(
    interval: Duration,
    fetch: F,
    sink: Sender<TelemetrySnapshot>,
) -> PollerHandle
where
    F: Fn() -> TelemetrySnapshot + Send + 'static,
{
    let stopped = Arc::new(AtomicBool::new(false));
    let (wake_tx, wake_rx) = mpsc::channel::<()>();

    let worker_stopped = stopped.clone();
    let spawned = thread::Builder::new()
        .name("count-poller".to_string())
        .spawn(move || {
            debug!("Count poller started, interval {:?}", interval);
            loop {
                if worker_stopped.load(Ordering::SeqCst) {
                    break;
                }
                if sink.send(fetch()).is_err() {
                    break;
                }
                match wake_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("Count poller stopped");
        });

    let worker = match spawned {
        Ok(worker) => Some(worker),
        Err(e) => {
            error!("Could not spawn count poller, live count disabled: {}", e);
            None
        }
    };

    PollerHandle {
        stopped,
        wake_tx: Some(wake_tx),
        worker,
    }
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn signal(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
        // dropping the sender wakes the worker out of its wait
        self.wake_tx.take();
    }

    /// Stop the poller and wait for the worker to exit.
    pub fn stop(mut self) {
        self.signal();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Count poller panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.signal();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn counting_fetch(counter: Arc<AtomicUsize>) -> impl Fn() -> TelemetrySnapshot + Send {
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            TelemetrySnapshot { count: n as u64 }
        }
    }

    #[test]
    fn test_fetches_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let handle = start_polling(Duration::from_secs(3600), counting_fetch(counter.clone()), tx);

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.count, 1);
        handle.stop();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fetches_on_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let handle = start_polling(Duration::from_millis(20), counting_fetch(counter.clone()), tx);

        for expected in 1..=3 {
            assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap().count, expected);
        }
        handle.stop();
    }

    #[test]
    fn test_stop_is_prompt_even_with_long_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let handle = start_polling(DEFAULT_POLL_INTERVAL, counting_fetch(counter), tx);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_no_fetch_after_drop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let handle = start_polling(Duration::from_millis(10), counting_fetch(counter.clone()), tx);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        drop(handle);
        // let a fetch that was already in flight land
        thread::sleep(Duration::from_millis(30));
        let after_drop = counter.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(counter.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_disconnected_sink_ends_poller() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let handle = start_polling(Duration::from_millis(10), counting_fetch(counter.clone()), tx);

        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!handle.is_running());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
