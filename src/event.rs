//! Event envelope and payload schema (C1).
//!
//! The bus never inspects payloads; it routes purely on `Header::topic`.

use crate::topic::Topic;

pub type SeqNum = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub price: f64,
    pub qty: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub start_ts_ns: u64,
    pub end_ts_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Heartbeat {
    pub t_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub order_id: u64,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderType,
    pub qty: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub order_id: u64,
    pub trade_id: u64,
    pub symbol: String,
    pub side: Side,
    pub qty: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reject {
    pub order_id: u64,
    pub symbol: String,
    pub code: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookUpdate {
    pub symbol: String,
    pub best_bid: f64,
    pub best_ask: f64,
    pub bid_qty: f64,
    pub ask_qty: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskAlert {
    pub symbol: String,
    pub code: u32,
    pub reason: String,
}

/// Tagged union over everything the bus can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Tick(Tick),
    Log(String),
    Bar(Bar),
    Heartbeat(Heartbeat),
    Order(Order),
    Trade(Trade),
    Reject(Reject),
    BookUpdate(BookUpdate),
    RiskAlert(RiskAlert),
}

/// Routing and timing metadata stamped onto every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Assigned by the bus on accepted publish; dense modulo the rare
    /// contended-rollback gap documented on `EventBus::publish`.
    pub seq: SeqNum,
    pub topic: Topic,
    /// Steady-clock time the bus accepted the publish.
    pub ts_ns: u64,
    /// Producer-supplied origin time; the bus never touches this field.
    pub t_pub_ns: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub header: Header,
    pub payload: Payload,
}

/// Build an event with its topic set; `seq`/`ts_ns` are left at zero for the
/// bus to stamp on publish. Mirrors the original reference's free-function
/// `make_event` helper.
pub fn make_event(topic: Topic, payload: Payload) -> Event {
    Event {
        header: Header {
            seq: 0,
            topic,
            ts_ns: 0,
            t_pub_ns: 0,
        },
        payload,
    }
}
