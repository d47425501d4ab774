//! Subscription slots and the registry that owns them (C3, C5).

use crate::event::Event;
use crate::queue::BoundedQueue;
use crate::topic::Topic;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

pub type SubId = u64;

type Callback = Box<dyn Fn(&Event) + Send + 'static>;

/// Per-subscription state. The queue is `Arc`-shared with the worker
/// thread; the callback is owned outright by the worker closure, not
/// duplicated here, so there is no slot-to-worker back-reference to manage.
pub(crate) struct SubscriptionSlot {
    pub(crate) queue: Arc<BoundedQueue<Event>>,
    worker: Option<JoinHandle<()>>,
}

impl SubscriptionSlot {
    fn spawn(per_sub_cap: usize, cb: Callback, label: SubId) -> Self {
        let queue = Arc::new(BoundedQueue::new(per_sub_cap));
        let worker_queue = queue.clone();
        let worker = std::thread::Builder::new()
            .name(format!("md-bus-sub-{label}"))
            .spawn(move || {
                // `pop` only returns `None` once the queue is closed *and*
                // drained, so this single loop both delivers live events and,
                // on shutdown, drains whatever was still buffered.
                while let Some(event) = worker_queue.pop() {
                    cb(&event);
                }
            })
            .expect("failed to spawn subscriber worker thread");
        Self {
            queue,
            worker: Some(worker),
        }
    }

    /// Closes the queue (delivering any buffered events first) and joins the
    /// worker. Guarantees no further callback invocations once this returns.
    /// Must be called without the registry lock held — a slow callback must
    /// not stall the reactor's next fan-out.
    pub(crate) fn shutdown(mut self) {
        self.queue.close();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

#[derive(Default)]
pub(crate) struct Registry {
    next_id: AtomicU64,
    topic_subs: FxHashMap<SubId, (Topic, SubscriptionSlot)>,
    wildcard_subs: FxHashMap<SubId, SubscriptionSlot>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            topic_subs: FxHashMap::default(),
            wildcard_subs: FxHashMap::default(),
        }
    }

    fn alloc_id(&self) -> SubId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn subscribe(&mut self, topic: Topic, per_sub_cap: usize, cb: Callback) -> SubId {
        let id = self.alloc_id();
        let slot = SubscriptionSlot::spawn(per_sub_cap, cb, id);
        self.topic_subs.insert(id, (topic, slot));
        id
    }

    pub(crate) fn subscribe_all(&mut self, per_sub_cap: usize, cb: Callback) -> SubId {
        let id = self.alloc_id();
        let slot = SubscriptionSlot::spawn(per_sub_cap, cb, id);
        self.wildcard_subs.insert(id, slot);
        id
    }

    /// Removes and returns the slot for `id`, without shutting it down.
    /// Looks the id up in the topic map first; only on a miss does it look
    /// in the wildcard map, via a fresh `remove` call rather than reusing
    /// any iterator from the first lookup. This is the fix for the known
    /// reference-implementation bug where the wildcard branch mistakenly
    /// reused an already-exhausted topic-map iterator.
    ///
    /// The caller is responsible for calling `shutdown()` on the returned
    /// slot *after* releasing the registry lock, so a slow subscriber
    /// callback cannot stall the reactor, which needs the same lock for
    /// every event's fan-out.
    pub(crate) fn take_for_unsubscribe(&mut self, id: SubId) -> Option<SubscriptionSlot> {
        if let Some((_, slot)) = self.topic_subs.remove(&id) {
            return Some(slot);
        }
        self.wildcard_subs.remove(&id)
    }

    pub(crate) fn dispatch(&self, event: &Event) -> usize {
        let mut dropped = 0;
        for (topic, slot) in self.topic_subs.values() {
            if *topic == event.header.topic && !slot.queue.push(event.clone()) {
                dropped += 1;
            }
        }
        for slot in self.wildcard_subs.values() {
            if !slot.queue.push(event.clone()) {
                dropped += 1;
            }
        }
        dropped
    }

    pub(crate) fn all_ids(&self) -> Vec<SubId> {
        self.topic_subs
            .keys()
            .chain(self.wildcard_subs.keys())
            .copied()
            .collect()
    }
}
