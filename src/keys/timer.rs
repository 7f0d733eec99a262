//! Long-press deadline queue
//!
//! Every key-down schedules one deadline. A single timer thread owns the
//! pending deadlines and reports each expiry as `(code, generation)`; the
//! receiver decides whether that press is still current. There is no
//! cancellation: superseded presses simply expire as no-ops.

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

/// A scheduled long-press check
#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    code: u16,
    generation: u64,
    deadline: Instant,
}

/// Handle used by the key path to schedule long-press checks.
///
/// Dropping the handle disconnects the timer thread, which then exits.
#[derive(Debug)]
pub struct LongPressTimer {
    requests: Sender<PendingTimer>,
    threshold: Duration,
}

/// The receiving half, consumed when the timer thread starts
#[derive(Debug)]
pub struct TimerWorker {
    requests: Receiver<PendingTimer>,
}

impl LongPressTimer {
    /// Create a timer handle and the worker that will service it
    pub fn new(threshold: Duration) -> (Self, TimerWorker) {
        let (sender, receiver) = unbounded();
        (
            Self {
                requests: sender,
                threshold,
            },
            TimerWorker {
                requests: receiver,
            },
        )
    }

    /// Schedule a check for the press `(code, generation)` one threshold from now
    pub fn schedule(&self, code: u16, generation: u64) {
        let timer = PendingTimer {
            code,
            generation,
            deadline: Instant::now() + self.threshold,
        };
        if self.requests.send(timer).is_err() {
            tracing::warn!("Long-press timer thread is gone, dropping timer for key {}", code);
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

impl TimerWorker {
    /// Start the timer thread. `on_expire` runs on that thread for every
    /// deadline that passes.
    pub fn spawn<F>(self, on_expire: F) -> std::io::Result<thread::JoinHandle<()>>
    where
        F: Fn(u16, u64) + Send + 'static,
    {
        thread::Builder::new()
            .name("long-press-timer".into())
            .spawn(move || run_timer_loop(self.requests, on_expire))
    }
}

fn run_timer_loop<F>(requests: Receiver<PendingTimer>, on_expire: F)
where
    F: Fn(u16, u64),
{
    // Deadlines share one fixed threshold, so arrival order is expiry order.
    let mut pending: VecDeque<PendingTimer> = VecDeque::new();

    loop {
        let received = match pending.front() {
            Some(next) => requests.recv_deadline(next.deadline),
            None => requests
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(timer) => pending.push_back(timer),
            Err(RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                while pending.front().is_some_and(|t| t.deadline <= now) {
                    if let Some(timer) = pending.pop_front() {
                        on_expire(timer.code, timer.generation);
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    tracing::debug!("Long-press timer thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_timers_fire_in_order() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let (timer, worker) = LongPressTimer::new(Duration::from_millis(20));
        let sink = fired.clone();
        worker
            .spawn(move |code, generation| sink.lock().push((code, generation)))
            .unwrap();

        timer.schedule(115, 1);
        timer.schedule(114, 2);
        thread::sleep(Duration::from_millis(150));

        assert_eq!(*fired.lock(), vec![(115, 1), (114, 2)]);
    }

    #[test]
    fn test_thread_exits_when_handle_dropped() {
        let (timer, worker) = LongPressTimer::new(Duration::from_millis(10));
        let handle = worker.spawn(|_, _| {}).unwrap();
        assert_eq!(timer.threshold(), Duration::from_millis(10));

        drop(timer);
        handle.join().unwrap();
    }
}
