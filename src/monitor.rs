use crate::midi::{MidiMessage, Result, Transport};
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Prints every incoming note message for `duration`, or until the process
/// is interrupted when `duration` is `None`. Returns how many were seen.
pub fn run(transport: &dyn Transport, duration: Option<Duration>) -> Result<u64> {
    let seen = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&seen);
    transport.subscribe(Box::new(move |msg: MidiMessage| {
        counter.fetch_add(1, Ordering::SeqCst);
        println!("{:?}", msg);
    }))?;
    info!("Monitor listening");

    match duration {
        Some(duration) => thread::sleep(duration),
        None => {
            println!("Control-C to quit...");
            loop {
                thread::park();
            }
        }
    }

    transport.unsubscribe()?;
    let seen = seen.load(Ordering::SeqCst);
    info!("Monitor saw {} note messages", seen);
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::LoopbackTransport;

    #[test]
    fn test_monitor_counts_incoming_notes() {
        let transport = Arc::new(LoopbackTransport::new(Duration::ZERO).unwrap());
        let feeder = Arc::clone(&transport);
        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            feeder.inject(MidiMessage::note_on(0, 60, 90)).unwrap();
            feeder.inject(MidiMessage::note_off(0, 60)).unwrap();
        });

        let seen = run(transport.as_ref(), Some(Duration::from_millis(200))).unwrap();
        sender.join().unwrap();
        assert_eq!(seen, 2);
    }
}
