//! Routing topics for the event bus.

/// Routing key for an [`Event`](crate::event::Event).
///
/// Numeric values are stable: the metrics surface indexes per-topic
/// counters by `Topic as usize`, so reordering variants changes counter
/// slots, not just names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Topic {
    Log = 0,
    MdTick = 1,
    Heartbeat = 2,
    Bar1s = 3,
    Bar1m = 4,
    Order = 5,
    Trade = 6,
    Reject = 7,
    BookUpdate = 8,
    RiskAlert = 9,
}

impl Topic {
    /// Number of topic variants; used to size fixed per-topic counter arrays.
    pub const COUNT: usize = 10;

    pub const ALL: [Topic; Topic::COUNT] = [
        Topic::Log,
        Topic::MdTick,
        Topic::Heartbeat,
        Topic::Bar1s,
        Topic::Bar1m,
        Topic::Order,
        Topic::Trade,
        Topic::Reject,
        Topic::BookUpdate,
        Topic::RiskAlert,
    ];
}
