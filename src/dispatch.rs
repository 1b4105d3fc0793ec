use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Queue owned by the UI thread. Background threads get a [`DispatchHandle`]
/// and never touch editor state themselves.
pub struct Dispatcher<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    waker: Option<Waker>,
}

/// Sending half, cheap to clone across threads.
pub struct DispatchHandle<T> {
    tx: Sender<T>,
    waker: Option<Waker>,
}

impl<T> Clone for DispatchHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Dispatcher<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            waker: None,
        }
    }

    /// `waker` runs after every send so an idle UI loop notices the message.
    pub fn with_waker(waker: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            waker: Some(Arc::new(waker)),
            ..Self::new()
        }
    }

    pub fn handle(&self) -> DispatchHandle<T> {
        DispatchHandle {
            tx: self.tx.clone(),
            waker: self.waker.clone(),
        }
    }

    /// Everything queued so far, in send order.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }
}

impl<T> DispatchHandle<T> {
    /// Returns false once the UI side has gone away.
    pub fn send(&self, message: T) -> bool {
        if self.tx.send(message).is_err() {
            return false;
        }
        if let Some(waker) = &self.waker {
            waker();
        }
        true
    }
}

/// Single-shot deferred trigger. Re-arming replaces the pending deadline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before firing, for scheduling the next repaint.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn messages_from_other_threads_arrive_in_order() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let dispatcher = Dispatcher::with_waker(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let handle = dispatcher.handle();
        let worker = thread::spawn(move || {
            for n in 0..3 {
                assert!(handle.send(n));
            }
        });
        worker.join().expect("worker thread");
        assert_eq!(dispatcher.drain(), vec![0, 1, 2]);
        assert_eq!(wakes.load(Ordering::SeqCst), 3);
        assert!(dispatcher.drain().is_empty());
    }

    #[test]
    fn send_fails_after_dispatcher_drops() {
        let dispatcher = Dispatcher::<u8>::new();
        let handle = dispatcher.handle();
        drop(dispatcher);
        assert!(!handle.send(1));
    }

    #[test]
    fn debounce_fires_once_after_delay() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(150));
        assert!(!debounce.fire(start));
        debounce.arm(start);
        assert!(!debounce.fire(start + Duration::from_millis(100)));
        assert_eq!(
            debounce.remaining(start + Duration::from_millis(100)),
            Some(Duration::from_millis(50))
        );
        assert!(debounce.fire(start + Duration::from_millis(150)));
        assert!(!debounce.fire(start + Duration::from_millis(300)));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn rearming_pushes_deadline_back() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(100));
        debounce.arm(start);
        debounce.arm(start + Duration::from_millis(80));
        assert!(!debounce.fire(start + Duration::from_millis(120)));
        assert!(debounce.fire(start + Duration::from_millis(180)));
        debounce.arm(start);
        debounce.cancel();
        assert!(!debounce.fire(start + Duration::from_secs(1)));
    }
}
