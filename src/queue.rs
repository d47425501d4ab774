//! Bounded queue primitive (C2).
//!
//! Storage is a lock-free ring ([`ArrayQueue`]) so the hot push path never
//! takes a lock. A `Mutex`/`Condvar` pair is used purely as a wake signal for
//! `pop`, with a bounded wait as a fallback in case a push's `notify_one`
//! races a consumer that is just about to start waiting.

use crossbeam_queue::ArrayQueue;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const WAKE_POLL: Duration = Duration::from_millis(50);

pub struct BoundedQueue<T> {
    ring: ArrayQueue<T>,
    signal: Mutex<()>,
    condvar: Condvar,
    closed: AtomicBool,
}

impl<T> BoundedQueue<T> {
    /// Capacity 0 is normalized up to 1 so construction never panics or
    /// yields a queue that can hold nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: ArrayQueue::new(capacity.max(1)),
            signal: Mutex::new(()),
            condvar: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Non-blocking. Returns `false` if the queue is full; the item is
    /// dropped by the caller in that case, never retried by the queue.
    pub fn push(&self, item: T) -> bool {
        let accepted = self.ring.push(item).is_ok();
        if accepted {
            self.condvar.notify_one();
        }
        accepted
    }

    /// Blocks until an item is available or the queue is closed and
    /// drained. Draining a closed queue never returns `None` early: every
    /// buffered item is handed out first.
    pub fn pop(&self) -> Option<T> {
        loop {
            if let Some(item) = self.ring.pop() {
                return Some(item);
            }
            if self.closed.load(Ordering::Acquire) {
                return self.ring.pop();
            }
            let mut guard = self.signal.lock();
            if !self.ring.is_empty() || self.closed.load(Ordering::Acquire) {
                continue;
            }
            self.condvar.wait_for(&mut guard, WAKE_POLL);
        }
    }

    pub fn size(&self) -> usize {
        self.ring.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Wakes any blocked `pop` without pushing a synthetic event through the
    /// data path. Idempotent.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.condvar.notify_all();
    }
}
