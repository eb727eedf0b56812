use crate::midi::{EchoHandler, MidiError, MidiMessage, Result, Transport};
use crossbeam::channel::{unbounded, Receiver, Sender};
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

type SharedHandler = Arc<Mutex<Option<EchoHandler>>>;

/// In-process transport that echoes every sent note back to the subscriber
/// after a fixed latency, from its own delivery thread.
pub struct LoopbackTransport {
    deliveries: Sender<(Instant, MidiMessage)>,
    handler: SharedHandler,
    sent: Mutex<Vec<MidiMessage>>,
    latency: Duration,
}

impl LoopbackTransport {
    pub fn new(latency: Duration) -> Result<Self> {
        let (tx, rx) = unbounded();
        let handler: SharedHandler = Arc::new(Mutex::new(None));

        let delivery_handler = Arc::clone(&handler);
        thread::Builder::new()
            .name("loopback".to_string())
            .spawn(move || deliver(rx, delivery_handler))
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        info!("Loopback transport ready with {:?} latency", latency);
        Ok(LoopbackTransport {
            deliveries: tx,
            handler,
            sent: Mutex::new(Vec::new()),
            latency,
        })
    }

    /// Every message passed to `send` so far, in order.
    pub fn sent(&self) -> Vec<MidiMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivers `msg` to the subscriber as if the device had produced it,
    /// without a matching send.
    pub fn inject(&self, msg: MidiMessage) -> Result<()> {
        self.deliveries
            .send((Instant::now() + self.latency, msg))
            .map_err(|e| MidiError::RecvError(e.to_string()))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

// Deliveries share one latency, so the queue is already ordered by due time.
fn deliver(rx: Receiver<(Instant, MidiMessage)>, handler: SharedHandler) {
    for (due, msg) in rx {
        let now = Instant::now();
        if due > now {
            thread::sleep(due - now);
        }
        let mut guard = handler.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(handler) => handler(msg),
            None => debug!("Loopback dropped {:?}: no subscriber", msg),
        }
    }
    debug!("Loopback delivery thread stopping");
}

impl Transport for LoopbackTransport {
    fn send(&self, msg: &MidiMessage) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*msg);
        self.deliveries
            .send((Instant::now() + self.latency, *msg))
            .map_err(|e| MidiError::SendError(e.to_string()))
    }

    fn subscribe(&self, handler: EchoHandler) -> Result<()> {
        let mut slot = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(MidiError::ConnectionError(
                "loopback is already subscribed".to_string(),
            ));
        }
        *slot = Some(handler);
        Ok(())
    }

    fn unsubscribe(&self) -> Result<()> {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
