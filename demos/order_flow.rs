//! A minimal order-router client of the bus: tracks last traded price per
//! symbol from `MdTick` events, then accepts or rejects `Order` events by
//! publishing `Trade` or `Reject`. Grounded on the original reference's
//! `OrderRouter` (engine/order/order_router.hpp), reimplemented as a thin
//! bus client rather than a class holding a reference to the bus.

use md_bus::{
    AppConfig, Event, EventBus, Order, OrderType, Payload, Reject, Side, Tick, Topic, Trade,
    make_event,
};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

struct OrderRouter {
    bus: Arc<EventBus>,
    last_price: Mutex<FxHashMap<String, f64>>,
    next_trade_id: AtomicU64,
}

impl OrderRouter {
    fn new(bus: Arc<EventBus>) -> Arc<Self> {
        let router = Arc::new(Self {
            bus,
            last_price: Mutex::new(FxHashMap::default()),
            next_trade_id: AtomicU64::new(1),
        });

        let tick_router = router.clone();
        router.bus.subscribe(Topic::MdTick, move |event: &Event| {
            if let Payload::Tick(tick) = &event.payload {
                tick_router
                    .last_price
                    .lock()
                    .unwrap()
                    .insert(tick.symbol.clone(), tick.price);
            }
        });

        let order_router = router.clone();
        router.bus.subscribe(Topic::Order, move |event: &Event| {
            if let Payload::Order(order) = &event.payload {
                order_router.handle_order(order);
            }
        });

        router
    }

    fn handle_order(&self, order: &Order) {
        if order.qty <= 0.0 {
            self.reject(order, 1001, "non-positive quantity");
            return;
        }
        if order.price < 0.0 {
            self.reject(order, 1002, "negative price");
            return;
        }
        let last_price = match self.last_price.lock().unwrap().get(&order.symbol).copied() {
            Some(p) => p,
            None => {
                self.reject(order, 1003, "no market price available");
                return;
            }
        };

        let marketable = match order.kind {
            OrderType::Market => true,
            OrderType::Limit => match order.side {
                Side::Buy => order.price >= last_price,
                Side::Sell => order.price <= last_price,
            },
        };

        if !marketable {
            self.reject(order, 2001, "order not marketable at last price");
            return;
        }

        let trade_id = self.next_trade_id.fetch_add(1, Ordering::Relaxed);
        self.bus.publish(make_event(
            Topic::Trade,
            Payload::Trade(Trade {
                order_id: order.order_id,
                trade_id,
                symbol: order.symbol.clone(),
                side: order.side,
                qty: order.qty,
                price: last_price,
            }),
        ));
    }

    fn reject(&self, order: &Order, code: u32, reason: &str) {
        self.bus.publish(make_event(
            Topic::Reject,
            Payload::Reject(Reject {
                order_id: order.order_id,
                symbol: order.symbol.clone(),
                code,
                reason: reason.to_string(),
            }),
        ));
    }
}

fn main() {
    let config = AppConfig::default();
    let _guard = md_bus::logging::init_logging(&config);

    let bus = EventBus::new(config.ingress_cap, config.per_sub_cap);
    let _router = OrderRouter::new(bus.clone());

    bus.subscribe(Topic::Trade, |event| {
        if let Payload::Trade(trade) = &event.payload {
            tracing::info!(order_id = trade.order_id, trade_id = trade.trade_id, price = trade.price, "trade executed");
        }
    });
    bus.subscribe(Topic::Reject, |event| {
        if let Payload::Reject(reject) = &event.payload {
            tracing::info!(order_id = reject.order_id, code = reject.code, reason = %reject.reason, "order rejected");
        }
    });

    bus.publish(make_event(
        Topic::MdTick,
        Payload::Tick(Tick {
            symbol: "BTC-USD".to_string(),
            price: 50_000.0,
            qty: 1.0,
        }),
    ));
    std::thread::sleep(std::time::Duration::from_millis(20));

    bus.publish(make_event(
        Topic::Order,
        Payload::Order(Order {
            order_id: 1,
            symbol: "BTC-USD".to_string(),
            side: Side::Buy,
            kind: OrderType::Market,
            qty: 0.5,
            price: 0.0,
        }),
    ));
    bus.publish(make_event(
        Topic::Order,
        Payload::Order(Order {
            order_id: 2,
            symbol: "BTC-USD".to_string(),
            side: Side::Buy,
            kind: OrderType::Limit,
            qty: 0.5,
            price: 10_000.0,
        }),
    ));

    std::thread::sleep(std::time::Duration::from_millis(100));
    bus.print_stats();
    bus.stop();
}
