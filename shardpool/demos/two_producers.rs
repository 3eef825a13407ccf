//! Two producers ticking integers into one deliberately slow consumer.
//!
//! Run with `RUST_LOG=debug` to watch the scheduler publish new sharding
//! configurations: once the consumer's measured cost dominates, it gets a
//! worker thread to itself while both producers share the other.

use std::thread;
use std::time::Duration;

use shardpool::{
    logging, BoxedMessage, Message, MessageProcessor, Origin, Outbox, PoolConfig, ShardPool,
    Topology,
};

#[derive(Debug)]
struct IntMessage(u64);
impl Message for IntMessage {}

#[derive(Default)]
struct ProducerA {
    next: u64,
}

impl MessageProcessor for ProducerA {
    fn tick(&mut self, outbox: &dyn Outbox) -> bool {
        thread::sleep(Duration::from_millis(1));
        self.next += 1;
        outbox.send::<Consumer, _>(IntMessage(self.next)).is_ok()
    }
}

#[derive(Default)]
struct ProducerB {
    next: u64,
}

impl MessageProcessor for ProducerB {
    fn tick(&mut self, outbox: &dyn Outbox) -> bool {
        thread::sleep(Duration::from_millis(1));
        self.next += 1;
        outbox.send::<Consumer, _>(IntMessage(self.next)).is_ok()
    }
}

#[derive(Default)]
struct Consumer {
    received: u64,
}

impl MessageProcessor for Consumer {
    fn receive(&mut self, from: Origin, msg: BoxedMessage, _outbox: &dyn Outbox) {
        thread::sleep(Duration::from_millis(2));
        let Ok(msg) = msg.downcast::<IntMessage>() else {
            return;
        };
        self.received += 1;
        if self.received % 500 == 0 {
            tracing::info!(
                from = from.name(),
                latest = msg.0,
                total = self.received,
                "consumed"
            );
        }
    }
}

fn main() -> Result<(), shardpool::PoolError> {
    logging::init_default();

    let topology = Topology::new()
        .edge::<ProducerA, Consumer, IntMessage>()
        .edge::<ProducerB, Consumer, IntMessage>();

    let pool = ShardPool::new(
        topology,
        PoolConfig {
            max_threads: 2,
            ..Default::default()
        },
    )?;
    pool.run()
}
