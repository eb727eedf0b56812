use crossbeam::channel::bounded;
use miditimer::clock::MonotonicClock;
use miditimer::config::GeneratorConfig;
use miditimer::midi::{LoopbackTransport, MidiMessage, NoteKind, Transport};
use miditimer::timer::{DelayedDispatchQueue, DispatchDrainLoop, Dispatcher, GeneratorLoop, PendingEventStack};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct Fixture {
    transport: Arc<LoopbackTransport>,
    stack: Arc<PendingEventStack>,
    queue: Arc<DelayedDispatchQueue>,
    dispatcher: Arc<Dispatcher>,
    clock: MonotonicClock,
}

fn fixture() -> Fixture {
    let transport = Arc::new(LoopbackTransport::new(Duration::from_millis(1)).unwrap());
    let stack = Arc::new(PendingEventStack::new());
    let clock = MonotonicClock::new();
    let dyn_transport: Arc<dyn Transport> = transport.clone();
    let dispatcher = Arc::new(Dispatcher::new(dyn_transport, Arc::clone(&stack), clock, 2));
    Fixture {
        transport,
        stack,
        queue: Arc::new(DelayedDispatchQueue::new()),
        dispatcher,
        clock,
    }
}

#[test]
fn test_drain_dispatches_everything_scheduled_before_deactivation() {
    let f = fixture();
    let now = f.clock.now();
    for (i, key) in [40u8, 41, 42, 43, 44].iter().enumerate() {
        f.queue.schedule(*key, now + 0.01 * i as f64);
    }

    let drain = DispatchDrainLoop::new(
        Arc::clone(&f.queue),
        Arc::clone(&f.dispatcher),
        Duration::from_millis(1),
    );
    drain.run(&AtomicBool::new(true)).unwrap();

    assert!(f.queue.is_empty());
    assert_eq!(f.dispatcher.dispatched(), 5);
    let sent = f.transport.sent();
    assert_eq!(
        sent,
        [40u8, 41, 42, 43, 44]
            .iter()
            .map(|key| MidiMessage::note_off(2, *key))
            .collect::<Vec<_>>()
    );
    assert!(f.stack.snapshot().iter().all(|e| e.kind == NoteKind::Off && e.velocity == 0));
    assert_eq!(f.stack.len(), 5);
}

#[test]
fn test_drain_waits_for_future_items() {
    let f = fixture();
    f.queue.schedule(50, f.clock.now() + 0.05);

    let drain = DispatchDrainLoop::new(
        Arc::clone(&f.queue),
        Arc::clone(&f.dispatcher),
        Duration::from_millis(1),
    );
    let started = Instant::now();
    drain.run(&AtomicBool::new(true)).unwrap();

    assert!(started.elapsed() >= Duration::from_millis(45));
    assert_eq!(f.transport.sent(), vec![MidiMessage::note_off(2, 50)]);
}

#[test]
fn test_tick_leaves_items_not_yet_due() {
    let f = fixture();
    f.queue.schedule(60, f.clock.now() + 10.0);
    let drain = DispatchDrainLoop::new(
        Arc::clone(&f.queue),
        Arc::clone(&f.dispatcher),
        Duration::from_millis(1),
    );
    assert_eq!(drain.tick().unwrap(), 0);
    assert_eq!(f.queue.len(), 1);
}

#[test]
fn test_generator_burst_schedules_one_off_per_on() {
    let f = fixture();
    let config = GeneratorConfig {
        notes_per_burst: 3..=3,
        ..GeneratorConfig::default()
    };
    let mut generator = GeneratorLoop::new(
        config,
        Arc::clone(&f.dispatcher),
        Arc::clone(&f.queue),
        Some(42),
    );

    let before = f.clock.now();
    assert_eq!(generator.burst().unwrap(), 3);

    assert_eq!(f.queue.len(), 3);
    assert_eq!(f.stack.len(), 3);
    let due = f.queue.next_due().unwrap();
    assert!(due >= before + 0.1 && due <= f.clock.now() + 1.0);

    for msg in f.transport.sent() {
        match msg {
            MidiMessage::NoteOn { channel, note, velocity } => {
                assert_eq!(channel, 2);
                assert!((10..=100).contains(&note));
                assert!((20..=120).contains(&velocity));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[test]
fn test_seeded_generators_produce_same_notes() {
    let config = GeneratorConfig {
        notes_per_burst: 4..=4,
        ..GeneratorConfig::default()
    };
    let a = fixture();
    let b = fixture();
    GeneratorLoop::new(config.clone(), Arc::clone(&a.dispatcher), Arc::clone(&a.queue), Some(7))
        .burst()
        .unwrap();
    GeneratorLoop::new(config, Arc::clone(&b.dispatcher), Arc::clone(&b.queue), Some(7))
        .burst()
        .unwrap();
    assert_eq!(a.transport.sent(), b.transport.sent());
}

#[test]
fn test_generator_cancellation_interrupts_rest() {
    let f = fixture();
    let config = GeneratorConfig {
        rest: 5.0..=5.0,
        ..GeneratorConfig::default()
    };
    let mut generator = GeneratorLoop::new(config, Arc::clone(&f.dispatcher), Arc::clone(&f.queue), None);
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

    let started = Instant::now();
    let handle = thread::spawn(move || generator.run(&shutdown_rx));
    thread::sleep(Duration::from_millis(20));
    drop(shutdown_tx);

    handle.join().unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(f.transport.sent().is_empty());
}
