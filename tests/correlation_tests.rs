use miditimer::midi::{Event, MidiMessage, NoteKind};
use miditimer::timer::{CorrelationEngine, PendingEntry, PendingEventStack, StatisticsSummary};
use std::sync::Arc;

fn dispatched(message: MidiMessage, timestamp: f64) -> PendingEntry {
    PendingEntry::from(&Event::new(message, timestamp))
}

fn engine() -> (Arc<PendingEventStack>, CorrelationEngine) {
    let stack = Arc::new(PendingEventStack::new());
    let engine = CorrelationEngine::new(Arc::clone(&stack));
    (stack, engine)
}

#[test]
fn test_distinct_notes_all_match() {
    let (stack, engine) = engine();
    for key in 10..30u8 {
        stack.push(dispatched(MidiMessage::note_on(0, key, key + 20), key as f64 * 0.01));
    }

    for key in (10..30u8).rev() {
        let echo = Event::new(MidiMessage::note_on(0, key, key + 20), 1.0);
        let sample = engine.on_echo(&echo).expect("echo should match");
        assert!(sample.delta >= 0.0);
        assert_eq!(sample.kind, NoteKind::On);
    }

    assert_eq!(engine.matched(), 20);
    assert_eq!(engine.spurious(), 0);
    assert!(stack.is_empty());
}

#[test]
fn test_duplicate_notes_match_oldest_first() {
    let (stack, engine) = engine();
    stack.push(dispatched(MidiMessage::note_on(0, 60, 100), 1.0));
    stack.push(dispatched(MidiMessage::note_on(0, 60, 100), 2.0));

    let first = engine
        .on_echo(&Event::new(MidiMessage::note_on(0, 60, 100), 2.5))
        .unwrap();
    assert!((first.delta - 1.5).abs() < 1e-9);

    let remaining = stack.snapshot();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].timestamp, 2.0);
}

#[test]
fn test_spurious_echo_leaves_stack_unchanged() {
    let (stack, engine) = engine();
    stack.push(dispatched(MidiMessage::note_on(0, 60, 100), 1.0));
    stack.push(dispatched(MidiMessage::note_off(0, 61), 1.1));

    assert!(engine
        .on_echo(&Event::new(MidiMessage::note_on(0, 60, 99), 1.2))
        .is_none());
    assert!(engine
        .on_echo(&Event::new(MidiMessage::note_off(0, 60), 1.3))
        .is_none());

    assert_eq!(engine.spurious(), 2);
    assert_eq!(engine.matched(), 0);
    assert_eq!(stack.len(), 2);
    assert_eq!(engine.summary(), StatisticsSummary::Empty);
}

#[test]
fn test_sample_category_comes_from_dispatched_kind() {
    let (stack, engine) = engine();
    stack.push(dispatched(MidiMessage::note_off(0, 64), 1.0));

    // Some devices echo Note Off as Note On with velocity 0
    let sample = engine
        .on_echo(&Event::new(MidiMessage::note_on(0, 64, 0), 1.004))
        .unwrap();
    assert_eq!(sample.kind, NoteKind::Off);

    match engine.summary() {
        StatisticsSummary::Gathered { on, off, total } => {
            assert!(on.is_none());
            assert_eq!(off.unwrap().mean_ms, 4.0);
            assert_eq!(total.unwrap().count, 1);
        }
        StatisticsSummary::Empty => panic!("expected statistics"),
    }
}

#[test]
fn test_echo_channel_is_ignored() {
    let (stack, engine) = engine();
    stack.push(dispatched(MidiMessage::note_on(0, 70, 50), 0.5));
    assert!(engine
        .on_echo(&Event::new(MidiMessage::note_on(9, 70, 50), 0.6))
        .is_some());
}
