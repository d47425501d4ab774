//! Minimal bus walkthrough: subscribe to a handful of topics, publish a few
//! events, print the resulting stats. Mirrors the original reference's
//! `hello_bus` example.

use md_bus::{AppConfig, EventBus, Heartbeat, Payload, Tick, Topic, make_event};

fn main() {
    let config = AppConfig::default();
    let _guard = md_bus::logging::init_logging(&config);

    let bus = EventBus::new(config.ingress_cap, config.per_sub_cap);

    let tick_sub = bus.subscribe(Topic::MdTick, |event| {
        if let Payload::Tick(tick) = &event.payload {
            tracing::info!(seq = event.header.seq, symbol = %tick.symbol, price = tick.price, "tick");
        }
    });
    let log_sub = bus.subscribe(Topic::Log, |event| {
        if let Payload::Log(line) = &event.payload {
            tracing::info!(seq = event.header.seq, %line, "log event");
        }
    });
    let heartbeat_sub = bus.subscribe(Topic::Heartbeat, |event| {
        if let Payload::Heartbeat(hb) = &event.payload {
            tracing::info!(seq = event.header.seq, t_ms = hb.t_ms, "heartbeat");
        }
    });

    for i in 0..5 {
        bus.publish(make_event(
            Topic::MdTick,
            Payload::Tick(Tick {
                symbol: "BTC-USD".to_string(),
                price: 50_000.0 + i as f64,
                qty: 0.1,
            }),
        ));
        bus.publish(make_event(
            Topic::Log,
            Payload::Log(format!("processed tick {i}")),
        ));
    }
    bus.publish(make_event(
        Topic::Heartbeat,
        Payload::Heartbeat(Heartbeat { t_ms: 1 }),
    ));

    std::thread::sleep(std::time::Duration::from_millis(100));

    bus.unsubscribe(tick_sub);
    bus.unsubscribe(log_sub);
    bus.unsubscribe(heartbeat_sub);

    bus.print_stats();
    bus.stop();
}
