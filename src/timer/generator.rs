use super::dispatch::Dispatcher;
use super::queue::DelayedDispatchQueue;
use crate::config::GeneratorConfig;
use crate::error::{Result, TimerError};
use crossbeam::channel::{Receiver, RecvTimeoutError};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

pub const GENERATOR_LOOP: &str = "generator";

/// Produces bursts of random Note On events and schedules their Note Offs.
pub struct GeneratorLoop {
    config: GeneratorConfig,
    dispatcher: Arc<Dispatcher>,
    queue: Arc<DelayedDispatchQueue>,
    rng: StdRng,
}

impl GeneratorLoop {
    pub fn new(
        config: GeneratorConfig,
        dispatcher: Arc<Dispatcher>,
        queue: Arc<DelayedDispatchQueue>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        GeneratorLoop {
            config,
            dispatcher,
            queue,
            rng,
        }
    }

    /// Runs until `shutdown` receives a message or is disconnected. The rest
    /// between bursts is a wait on `shutdown`, so cancellation interrupts it.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<()> {
        info!("Generator loop started");
        let mut bursts = 0u64;

        loop {
            let rest = Duration::from_secs_f64(self.rng.gen_range(self.config.rest.clone()));
            match shutdown.recv_timeout(rest) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            self.burst()?;
            bursts += 1;
        }

        info!("Generator loop stopped after {} bursts", bursts);
        Ok(())
    }

    /// Dispatches one burst of notes; returns how many were sent.
    pub fn burst(&mut self) -> Result<u32> {
        let count = self.rng.gen_range(self.config.notes_per_burst.clone());
        for _ in 0..count {
            let key = self.rng.gen_range(self.config.keys.clone());
            let velocity = self.rng.gen_range(self.config.velocities.clone());
            let hold = self.rng.gen_range(self.config.off_delay.clone());

            let now = self.dispatcher.clock().now();
            self.queue.schedule(key, now + hold);
            self.dispatcher
                .note_on(key, velocity)
                .map_err(|e| TimerError::loop_fault(GENERATOR_LOOP, e))?;
            debug!("Scheduled note off for {} in {:.3}s", key, hold);
        }
        Ok(count)
    }
}
