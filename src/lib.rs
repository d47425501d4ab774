//! md-bus - in-process, topic-routed event bus for low-latency
//! market-data / trading pipelines.
//!
//! # Modules
//!
//! - [`topic`] - routing key enumeration
//! - [`event`] - event envelope and payload schema
//! - [`queue`] - bounded queue primitive backing ingress and subscriber
//!   delivery
//! - [`registry`] - subscription slots and the id-keyed registry
//! - [`bus`] - the dispatch engine and its lifecycle
//! - [`metrics`] - per-topic counters and the log-2 latency histogram
//! - [`config`] - typed application configuration for demo binaries
//! - [`logging`] - structured logging setup for demo binaries

pub mod bus;
pub mod config;
pub mod event;
pub mod logging;
pub mod metrics;
pub mod queue;
pub mod registry;
pub mod topic;

pub use bus::EventBus;
pub use config::AppConfig;
pub use event::{
    Bar, BookUpdate, Event, Header, Heartbeat, Order, OrderType, Payload, Reject, RiskAlert,
    SeqNum, Side, Tick, Trade, make_event,
};
pub use metrics::PerfSnapshot;
pub use registry::SubId;
pub use topic::Topic;
