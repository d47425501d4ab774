//! Metrics surface (C7): per-topic counters and a log-2 latency histogram.
//!
//! Grounded on the original reference's `Log2Histogram`/`PerfSnapshot` and,
//! for the percentile/snapshot conventions, on the teacher's `PerfMetrics`.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Fixed bucket count; bucket `i` covers latencies in `[2^i, 2^(i+1))`.
const MAX_BUCKETS: usize = 48;

struct Log2Histogram {
    n: u64,
    min_v: u64,
    max_v: u64,
    sum: u64,
    buckets: [u64; MAX_BUCKETS],
}

impl Log2Histogram {
    fn new() -> Self {
        Self {
            n: 0,
            min_v: u64::MAX,
            max_v: 0,
            sum: 0,
            buckets: [0; MAX_BUCKETS],
        }
    }

    fn bucket_of(x: u64) -> usize {
        if x == 0 {
            return 0;
        }
        let floor_log2 = 63 - x.leading_zeros() as usize;
        floor_log2.min(MAX_BUCKETS - 1)
    }

    fn record(&mut self, x: u64) {
        self.n += 1;
        self.min_v = self.min_v.min(x);
        self.max_v = self.max_v.max(x);
        self.sum += x;
        self.buckets[Self::bucket_of(x)] += 1;
    }

    fn avg(&self) -> u64 {
        if self.n == 0 { 0 } else { self.sum / self.n }
    }

    /// Cumulative-count percentile: walk buckets until the running count
    /// reaches `p` of `n`, then report that bucket's lower bound `2^i`
    /// (clamped to observed min/max at the distribution's endpoints).
    fn percentile(&self, p: f64) -> u64 {
        if self.n == 0 {
            return 0;
        }
        if p <= 0.0 {
            return self.min_v;
        }
        if p >= 1.0 {
            return self.max_v;
        }
        let target = (p * self.n as f64).ceil() as u64;
        let mut cumulative = 0u64;
        for (i, count) in self.buckets.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let lower_bound = if i == 0 { 0 } else { 1u64 << i };
                return lower_bound.max(self.min_v).min(self.max_v);
            }
        }
        self.max_v
    }
}

/// Immutable view of the bus's counters at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfSnapshot {
    pub events: u64,
    pub duration_ns: u64,
    pub eps: f64,
    pub lat_min: u64,
    pub lat_avg: u64,
    pub lat_p50: u64,
    pub lat_p95: u64,
    pub lat_p99: u64,
    pub lat_max: u64,
}

pub(crate) struct Metrics {
    started_at: Instant,
    published_total: AtomicU64,
    ingress_popped_total: AtomicU64,
    backpressure_events: AtomicU64,
    topic_counts: [AtomicU64; crate::topic::Topic::COUNT],
    perf_enabled: std::sync::atomic::AtomicBool,
    histogram: Mutex<Log2Histogram>,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self {
            started_at: Instant::now(),
            published_total: AtomicU64::new(0),
            ingress_popped_total: AtomicU64::new(0),
            backpressure_events: AtomicU64::new(0),
            topic_counts: Default::default(),
            perf_enabled: std::sync::atomic::AtomicBool::new(true),
            histogram: Mutex::new(Log2Histogram::new()),
        }
    }

    pub(crate) fn set_perf_enabled(&self, enabled: bool) {
        self.perf_enabled.store(enabled, Ordering::Relaxed);
    }

    pub(crate) fn record_publish(&self) {
        self.published_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ingress_pop(&self, topic: crate::topic::Topic, dispatch_latency_ns: u64) {
        self.ingress_popped_total.fetch_add(1, Ordering::Relaxed);
        self.topic_counts[topic as usize].fetch_add(1, Ordering::Relaxed);
        if self.perf_enabled.load(Ordering::Relaxed) {
            self.histogram.lock().record(dispatch_latency_ns);
        }
    }

    pub(crate) fn record_backpressure(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn topic_count(&self, topic: crate::topic::Topic) -> u64 {
        self.topic_counts[topic as usize].load(Ordering::Relaxed)
    }

    pub(crate) fn published_total(&self) -> u64 {
        self.published_total.load(Ordering::Relaxed)
    }

    pub(crate) fn backpressure_events(&self) -> u64 {
        self.backpressure_events.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self) -> PerfSnapshot {
        let hist = self.histogram.lock();
        let duration_ns = self.started_at.elapsed().as_nanos() as u64;
        let events = self.ingress_popped_total.load(Ordering::Relaxed);
        let eps = if duration_ns == 0 {
            0.0
        } else {
            events as f64 / (duration_ns as f64 / 1e9)
        };
        PerfSnapshot {
            events,
            duration_ns,
            eps,
            lat_min: if hist.n == 0 { 0 } else { hist.min_v },
            lat_avg: hist.avg(),
            lat_p50: hist.percentile(0.50),
            lat_p95: hist.percentile(0.95),
            lat_p99: hist.percentile(0.99),
            lat_max: if hist.n == 0 { 0 } else { hist.max_v },
        }
    }
}
