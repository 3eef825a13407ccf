//! End-to-end tests: each runs a pool on background threads and observes
//! it through a cloned handle. The pool has no shutdown (by design), so
//! worker threads outlive their test and die with the process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use shardpool::{
    BoxedMessage, Message, MessageProcessor, Origin, Outbox, PoolConfig, ShardPool, Topology,
};

fn fast_config(threads: usize) -> PoolConfig {
    PoolConfig {
        max_threads: threads,
        reshard_interval: Duration::from_millis(100),
        idle_wait: Duration::from_millis(1),
        ..Default::default()
    }
}

fn run_in_background(pool: &ShardPool) {
    let runner = pool.clone();
    thread::Builder::new()
        .name("pool-runner".to_string())
        .spawn(move || runner.run())
        .expect("spawn pool runner");
}

fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

// --- A hot consumer must end up alone on its own thread ---

#[derive(Debug)]
struct Sample(u64);
impl Message for Sample {}

static MILL_RECEIVED: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct FeedA {
    seq: u64,
}
impl MessageProcessor for FeedA {
    fn tick(&mut self, outbox: &dyn Outbox) -> bool {
        thread::sleep(Duration::from_micros(200));
        self.seq += 1;
        outbox.send::<SlowMill, _>(Sample(self.seq)).is_ok()
    }
}

#[derive(Default)]
struct FeedB {
    seq: u64,
}
impl MessageProcessor for FeedB {
    fn tick(&mut self, outbox: &dyn Outbox) -> bool {
        thread::sleep(Duration::from_micros(200));
        self.seq += 1;
        outbox.send::<SlowMill, _>(Sample(self.seq)).is_ok()
    }
}

#[derive(Default)]
struct SlowMill;
impl MessageProcessor for SlowMill {
    fn receive(&mut self, _from: Origin, _msg: BoxedMessage, _outbox: &dyn Outbox) {
        thread::sleep(Duration::from_millis(3));
        MILL_RECEIVED.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn hot_consumer_is_rebalanced_onto_its_own_thread() {
    let topology = Topology::new()
        .edge::<FeedA, SlowMill, Sample>()
        .edge::<FeedB, SlowMill, Sample>();
    let pool = ShardPool::new(topology, fast_config(2)).expect("pool builds");
    assert_eq!(pool.threads_count(), 2);

    let mill = pool.resolve_actor::<SlowMill>().expect("declared");
    let feed_a = pool.resolve_actor::<FeedA>().expect("declared");
    let feed_b = pool.resolve_actor::<FeedB>().expect("declared");

    run_in_background(&pool);

    let isolated = wait_until(Duration::from_secs(30), || {
        if MILL_RECEIVED.load(Ordering::Relaxed) < 50 {
            return false;
        }
        let conf = pool.sharding();
        let Some(mill_slot) = conf.slot_of(mill) else {
            return false;
        };
        conf.slot(mill_slot) == &[mill] && conf.slot_of(feed_a) == conf.slot_of(feed_b)
    });
    assert!(
        isolated,
        "the slow consumer should end up alone on its own thread, got {:?}",
        pool.sharding()
    );
}

// --- Per-edge FIFO survives ownership handoffs ---

#[derive(Debug)]
struct Seq(u64);
impl Message for Seq {}

static SEQ_LAST: AtomicU64 = AtomicU64::new(0);
static SEQ_TOTAL: AtomicU64 = AtomicU64::new(0);
static SEQ_VIOLATIONS: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct Sequencer {
    next: u64,
}
impl MessageProcessor for Sequencer {
    fn tick(&mut self, outbox: &dyn Outbox) -> bool {
        thread::sleep(Duration::from_micros(100));
        self.next += 1;
        outbox.send::<OrderChecker, _>(Seq(self.next)).is_ok()
    }
}

#[derive(Default)]
struct OrderChecker;
impl MessageProcessor for OrderChecker {
    fn receive(&mut self, _from: Origin, msg: BoxedMessage, _outbox: &dyn Outbox) {
        let Ok(seq) = msg.downcast::<Seq>() else {
            return;
        };
        let prev = SEQ_LAST.swap(seq.0, Ordering::Relaxed);
        if seq.0 != prev + 1 {
            SEQ_VIOLATIONS.fetch_add(1, Ordering::Relaxed);
        }
        SEQ_TOTAL.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn fifo_order_is_preserved_across_resharding() {
    let topology = Topology::new().edge::<Sequencer, OrderChecker, Seq>();
    let mut config = fast_config(2);
    // Flip often so delivery keeps changing hands mid-stream.
    config.reshard_interval = Duration::from_millis(50);
    let pool = ShardPool::new(topology, config).expect("pool builds");

    run_in_background(&pool);

    assert!(
        wait_until(Duration::from_secs(30), || {
            SEQ_TOTAL.load(Ordering::Relaxed) > 20_000
        }),
        "expected sustained delivery, got {}",
        SEQ_TOTAL.load(Ordering::Relaxed)
    );
    assert_eq!(
        SEQ_VIOLATIONS.load(Ordering::Relaxed),
        0,
        "messages on one edge must arrive in send order"
    );
}

// --- A persistently panicking processor is contained and cataloged ---

#[derive(Debug)]
struct Nudge;
impl Message for Nudge {}

static STEADY_TICKS: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct Faulty;
impl MessageProcessor for Faulty {
    fn tick(&mut self, _outbox: &dyn Outbox) -> bool {
        panic!("tick exploded");
    }
}

#[derive(Default)]
struct Steady;
impl MessageProcessor for Steady {
    fn tick(&mut self, _outbox: &dyn Outbox) -> bool {
        thread::sleep(Duration::from_micros(100));
        STEADY_TICKS.fetch_add(1, Ordering::Relaxed);
        true
    }
}

#[test]
fn a_panicking_processor_does_not_stop_the_pool() {
    let topology = Topology::new().edge::<Faulty, Steady, Nudge>();
    let pool = ShardPool::new(topology, fast_config(2)).expect("pool builds");
    assert_eq!(pool.threads_count(), 2);

    run_in_background(&pool);

    assert!(
        wait_until(Duration::from_secs(10), || {
            pool.fault_count("tick exploded") >= 3
        }),
        "the panic text must be cataloged with a growing count"
    );

    // The healthy processor keeps making progress regardless.
    let before = STEADY_TICKS.load(Ordering::Relaxed);
    assert!(
        wait_until(Duration::from_secs(10), || {
            STEADY_TICKS.load(Ordering::Relaxed) > before + 1_000
        }),
        "the healthy processor must keep ticking"
    );
}

// --- Every observed configuration is a complete partition ---

#[derive(Debug)]
struct Token;
impl Message for Token {}

macro_rules! relay_node {
    ($name:ident -> $next:ident) => {
        #[derive(Default)]
        struct $name;
        impl MessageProcessor for $name {
            fn tick(&mut self, outbox: &dyn Outbox) -> bool {
                thread::sleep(Duration::from_micros(100));
                outbox.send::<$next, _>(Token).is_ok()
            }
        }
    };
}

relay_node!(RelayA -> RelayB);
relay_node!(RelayB -> RelayC);
relay_node!(RelayC -> RelayD);
relay_node!(RelayD -> RelayE);
relay_node!(RelayE -> RelayF);

#[derive(Default)]
struct RelayF;
impl MessageProcessor for RelayF {}

#[test]
fn observed_configurations_are_always_complete_partitions() {
    let topology = Topology::new()
        .edge::<RelayA, RelayB, Token>()
        .edge::<RelayB, RelayC, Token>()
        .edge::<RelayC, RelayD, Token>()
        .edge::<RelayD, RelayE, Token>()
        .edge::<RelayE, RelayF, Token>();
    let mut config = fast_config(3);
    config.reshard_interval = Duration::from_millis(50);
    let pool = ShardPool::new(topology, config).expect("pool builds");
    let threads = pool.threads_count();
    let actors = pool.graph().actor_count();
    assert_eq!(actors, 6);

    run_in_background(&pool);

    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        let conf = pool.sharding();
        conf.validate(actors, threads)
            .expect("every published configuration is a complete partition");
        let epoch = pool.epoch();
        assert!(
            (epoch.acks as usize) <= threads,
            "ack quorum can never exceed the thread count"
        );
        thread::sleep(Duration::from_millis(20));
    }
}
