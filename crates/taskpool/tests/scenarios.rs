//! End-to-end scenario coverage against the public `Pool` facade. Each test
//! is named after the scenario it exercises.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use taskpool::{Pool, PoolBuilder, SubmitMode, Task};

struct Recording {
    order: Arc<Mutex<Vec<u64>>>,
    id: u64,
}

impl Task for Recording {
    fn run(self: Box<Self>) {
        self.order.lock().unwrap().push(self.id);
    }
}

struct Sleepy {
    duration: Duration,
    then: Option<Box<dyn Task>>,
}

impl Task for Sleepy {
    fn run(self: Box<Self>) {
        std::thread::sleep(self.duration);
        if let Some(then) = self.then {
            then.run();
        }
    }
}

struct SharedPriority {
    priority: Arc<AtomicI64>,
    order: Arc<Mutex<Vec<&'static str>>>,
    label: &'static str,
}

impl Task for SharedPriority {
    fn run(self: Box<Self>) {
        self.order.lock().unwrap().push(self.label);
    }

    fn priority(&self) -> Option<taskpool::Priority> {
        Some(self.priority.load(Ordering::SeqCst))
    }

    fn set_priority(&mut self, priority: taskpool::Priority) {
        self.priority.store(priority, Ordering::SeqCst);
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn s1_empty_shutdown() {
    init_logging();
    let pool = PoolBuilder::new().low_watermark(1).high_watermark(4).build();
    pool.start();
    pool.shutdown();
    assert_eq!(pool.worker_count(), 0);
}

#[test]
fn s2_fifo_single_worker() {
    let pool = PoolBuilder::new().low_watermark(1).high_watermark(1).build();
    let order = Arc::new(Mutex::new(Vec::new()));

    for id in [1, 2, 3] {
        pool.submit(
            Box::new(Recording {
                order: order.clone(),
                id,
            }),
            SubmitMode::Fifo,
        )
        .unwrap();
    }

    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    pool.shutdown();
}

#[test]
fn s3_priority_overtake() {
    let pool = PoolBuilder::new().low_watermark(1).high_watermark(1).build();
    let order = Arc::new(Mutex::new(Vec::new()));

    pool.submit(
        Box::new(Sleepy {
            duration: Duration::from_millis(100),
            then: None,
        }),
        SubmitMode::Fifo,
    )
    .unwrap();

    let a_priority = Arc::new(AtomicI64::new(1));
    let b_priority = Arc::new(AtomicI64::new(5));
    let c_priority = Arc::new(AtomicI64::new(3));

    pool.submit_priority(Box::new(SharedPriority {
        priority: a_priority,
        order: order.clone(),
        label: "A",
    }))
    .unwrap();
    pool.submit_priority(Box::new(SharedPriority {
        priority: b_priority,
        order: order.clone(),
        label: "B",
    }))
    .unwrap();
    pool.submit_priority(Box::new(SharedPriority {
        priority: c_priority,
        order: order.clone(),
        label: "C",
    }))
    .unwrap();

    std::thread::sleep(Duration::from_millis(250));
    assert_eq!(*order.lock().unwrap(), vec!["B", "C", "A"]);
    pool.shutdown();
}

#[test]
fn s4_scale_up_under_load_then_back_down() {
    let pool = PoolBuilder::new().low_watermark(1).high_watermark(8).build();
    pool.start();

    for _ in 0..100 {
        pool.submit(
            Box::new(Sleepy {
                duration: Duration::from_millis(50),
                then: None,
            }),
            SubmitMode::Fifo,
        )
        .unwrap();
    }

    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(pool.worker_count(), pool.high_watermark() as usize);

    std::thread::sleep(Duration::from_secs(2));
    assert_eq!(pool.worker_count(), pool.low_watermark() as usize);

    pool.shutdown();
}

#[test]
fn s5_delayed_promotion_respects_deadline() {
    let pool = PoolBuilder::new().low_watermark(1).high_watermark(1).build();
    pool.start();

    let ran_at = Arc::new(Mutex::new(None::<Instant>));
    let submitted_at = Instant::now();

    struct Stamp {
        ran_at: Arc<Mutex<Option<Instant>>>,
    }
    impl Task for Stamp {
        fn run(self: Box<Self>) {
            *self.ran_at.lock().unwrap() = Some(Instant::now());
        }
    }

    pool.submit_delayed(
        Box::new(Stamp {
            ran_at: ran_at.clone(),
        }),
        submitted_at + Duration::from_millis(200),
    );

    std::thread::sleep(Duration::from_millis(150));
    assert!(ran_at.lock().unwrap().is_none(), "must not run before the deadline");

    std::thread::sleep(Duration::from_millis(250));
    let stamp = ran_at.lock().unwrap().expect("must have run by now");
    assert!(stamp.duration_since(submitted_at) >= Duration::from_millis(200));
    assert!(stamp.duration_since(submitted_at) < Duration::from_millis(400));

    pool.shutdown();
}

#[test]
fn s6_watermark_clamp() {
    let pool = PoolBuilder::new().low_watermark(1).high_watermark(1).build();

    pool.set_low(5);
    assert_eq!(pool.low_watermark(), 1);

    pool.set_high(3);
    assert_eq!(pool.high_watermark(), 3);

    pool.set_low(5);
    assert_eq!(pool.low_watermark(), 3);

    pool.shutdown();
}

#[test]
fn shutdown_drops_unstarted_tasks_without_running_them() {
    let pool = PoolBuilder::new().low_watermark(0).high_watermark(1).build();
    let ran = Arc::new(AtomicU64::new(0));

    struct Counting {
        ran: Arc<AtomicU64>,
    }
    impl Task for Counting {
        fn run(self: Box<Self>) {
            self.ran.fetch_add(1, Ordering::SeqCst);
        }
    }

    // low=0 means no worker is guaranteed to exist to drain this before shutdown.
    for _ in 0..20 {
        pool.submit(
            Box::new(Counting { ran: ran.clone() }),
            SubmitMode::Fifo,
        )
        .unwrap();
    }
    pool.shutdown();
    // Some tasks may have run if a worker from construction picked them up
    // before shutdown; the scenario only asserts that shutdown itself never
    // panics and leaves the pool at zero workers.
    assert_eq!(pool.worker_count(), 0);
}
