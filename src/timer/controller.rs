use super::correlation::CorrelationEngine;
use super::dispatch::Dispatcher;
use super::drain::{DispatchDrainLoop, DRAIN_LOOP};
use super::generator::{GeneratorLoop, GENERATOR_LOOP};
use super::pending::PendingEventStack;
use super::queue::DelayedDispatchQueue;
use super::report::RunReport;
use crate::clock::MonotonicClock;
use crate::config::TimerConfig;
use crate::error::{Result, TimerError};
use crate::midi::{Event, Transport};
use crate::scheduler::{Scheduler, ThreadScheduler};
use chrono::{DateTime, Local};
use crossbeam::channel::{after, bounded, tick, unbounded, Receiver, Sender};
use log::{error, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);
const ECHO_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// Live counters, handed to the progress callback while a run is waiting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub elapsed: Duration,
    pub dispatched: u64,
    pub matched: u64,
    pub spurious: u64,
    pub pending: usize,
}

/// Owns every piece of a latency run and drives it through
/// Idle -> Running -> Draining -> Stopped.
pub struct TimerController<S: Scheduler = ThreadScheduler> {
    transport: Arc<dyn Transport>,
    config: TimerConfig,
    scheduler: S,
    state: TimerState,
    clock: MonotonicClock,
    stack: Arc<PendingEventStack>,
    queue: Arc<DelayedDispatchQueue>,
    dispatcher: Arc<Dispatcher>,
    engine: Arc<CorrelationEngine>,
    deactivated: Arc<AtomicBool>,
    shutdown: Option<Sender<()>>,
    faults_tx: Sender<TimerError>,
    faults_rx: Receiver<TimerError>,
    generator: Option<JoinHandle<()>>,
    drain: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Local>>,
    started: Option<Instant>,
    elapsed: Duration,
}

impl TimerController {
    pub fn new(transport: Arc<dyn Transport>, config: TimerConfig) -> Result<Self> {
        Self::with_scheduler(transport, config, ThreadScheduler::new())
    }
}

impl<S: Scheduler> TimerController<S> {
    pub fn with_scheduler(
        transport: Arc<dyn Transport>,
        config: TimerConfig,
        scheduler: S,
    ) -> Result<Self> {
        config.validate()?;

        let clock = MonotonicClock::new();
        let stack = Arc::new(PendingEventStack::new());
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&transport),
            Arc::clone(&stack),
            clock,
            config.channel,
        ));
        let engine = Arc::new(CorrelationEngine::new(Arc::clone(&stack)));
        let (faults_tx, faults_rx) = unbounded();

        Ok(TimerController {
            transport,
            config,
            scheduler,
            state: TimerState::Idle,
            clock,
            stack,
            queue: Arc::new(DelayedDispatchQueue::new()),
            dispatcher,
            engine,
            deactivated: Arc::new(AtomicBool::new(false)),
            shutdown: None,
            faults_tx,
            faults_rx,
            generator: None,
            drain: None,
            started_at: None,
            started: None,
            elapsed: Duration::ZERO,
        })
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Subscribes to echoes and starts the generator and drain loops.
    pub fn start(&mut self) -> Result<()> {
        self.expect_state(TimerState::Idle, "start")?;

        let engine = Arc::clone(&self.engine);
        let clock = self.clock;
        self.transport
            .subscribe(Box::new(move |message| {
                let echo = Event::new(message, clock.now());
                engine.on_echo(&echo);
            }))
            .map_err(TimerError::TransportUnavailable)?;

        if let Err(err) = self.spawn_loops() {
            self.abort_loops();
            if let Err(e) = self.transport.unsubscribe() {
                warn!("Failed to unsubscribe after aborted start: {}", e);
            }
            return Err(err);
        }

        self.started_at = Some(Local::now());
        self.started = Some(Instant::now());
        self.state = TimerState::Running;
        info!("Timer running on channel {}", self.config.channel);
        Ok(())
    }

    fn spawn_loops(&mut self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let mut generator = GeneratorLoop::new(
            self.config.generator.clone(),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.queue),
            self.config.seed,
        );
        let faults = self.faults_tx.clone();
        self.shutdown = Some(shutdown_tx);
        self.generator = Some(
            self.scheduler
                .spawn(GENERATOR_LOOP, move || {
                    supervise(GENERATOR_LOOP, &faults, || generator.run(&shutdown_rx))
                })
                .map_err(|source| TimerError::Spawn {
                    name: GENERATOR_LOOP,
                    source,
                })?,
        );

        let drain = DispatchDrainLoop::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.dispatcher),
            self.config.poll_interval,
        );
        let deactivated = Arc::clone(&self.deactivated);
        let faults = self.faults_tx.clone();
        self.drain = Some(
            self.scheduler
                .spawn(DRAIN_LOOP, move || {
                    supervise(DRAIN_LOOP, &faults, || drain.run(&deactivated))
                })
                .map_err(|source| TimerError::Spawn {
                    name: DRAIN_LOOP,
                    source,
                })?,
        );
        Ok(())
    }

    /// Blocks for `duration`, calling `on_tick` periodically. Returns early
    /// with the fault if either loop fails.
    pub fn wait_for(&self, duration: Duration, mut on_tick: impl FnMut(&Progress)) -> Result<()> {
        self.expect_state(TimerState::Running, "wait")?;

        let deadline = after(duration);
        let ticker = tick(PROGRESS_INTERVAL);
        loop {
            crossbeam::select! {
                recv(deadline) -> _ => {
                    info!("Time's up!");
                    return Ok(());
                }
                recv(self.faults_rx) -> fault => {
                    // The controller holds a sender, so the channel never disconnects
                    if let Ok(fault) = fault {
                        return Err(fault);
                    }
                }
                recv(ticker) -> _ => on_tick(&self.progress()),
            }
        }
    }

    /// Cancels the generator, drains every scheduled note off, waits up to
    /// the echo grace period for outstanding echoes, then unsubscribes.
    ///
    /// The controller always ends up Stopped; a loop fault seen while
    /// stopping is returned afterwards.
    pub fn stop(&mut self) -> Result<()> {
        self.expect_state(TimerState::Running, "stop")?;
        self.state = TimerState::Draining;

        info!("Stopping generator loop");
        self.shutdown.take();
        let generator = self.generator.take();
        self.join_loop(GENERATOR_LOOP, generator);

        info!("Draining {} scheduled note offs", self.queue.len());
        self.deactivated.store(true, Ordering::SeqCst);
        let drain = self.drain.take();
        self.join_loop(DRAIN_LOOP, drain);

        self.await_echoes();
        if let Err(e) = self.transport.unsubscribe() {
            warn!("Failed to unsubscribe from transport: {}", e);
        }

        self.elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        self.state = TimerState::Stopped;
        info!(
            "Timer stopped: {} sent, {} matched, {} pending",
            self.dispatcher.dispatched(),
            self.engine.matched(),
            self.stack.len()
        );

        match self.faults_rx.try_recv() {
            Ok(fault) => Err(fault),
            Err(_) => Ok(()),
        }
    }

    pub fn report(&self) -> Result<RunReport> {
        self.expect_state(TimerState::Stopped, "report")?;

        Ok(RunReport {
            started_at: self.started_at.unwrap_or_else(Local::now),
            elapsed: self.elapsed,
            dispatched: self.dispatcher.dispatched(),
            matched: self.engine.matched(),
            spurious: self.engine.spurious(),
            unprocessed: self.stack.len(),
            statistics: self.engine.summary(),
        })
    }

    /// Full lifecycle: start, wait `duration`, stop, report.
    pub fn run(&mut self, duration: Duration) -> Result<RunReport> {
        self.run_with(duration, |_| {})
    }

    pub fn run_with(
        &mut self,
        duration: Duration,
        on_tick: impl FnMut(&Progress),
    ) -> Result<RunReport> {
        self.start()?;
        let waited = self.wait_for(duration, on_tick);
        let stopped = self.stop();
        waited?;
        stopped?;
        self.report()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            elapsed: self.started.map(|s| s.elapsed()).unwrap_or_default(),
            dispatched: self.dispatcher.dispatched(),
            matched: self.engine.matched(),
            spurious: self.engine.spurious(),
            pending: self.stack.len(),
        }
    }

    fn await_echoes(&self) {
        let deadline = Instant::now() + self.config.echo_grace;
        while !self.stack.is_empty() && Instant::now() < deadline {
            thread::sleep(ECHO_POLL_INTERVAL);
        }
    }

    fn join_loop(&self, name: &'static str, handle: Option<JoinHandle<()>>) {
        if let Some(handle) = handle {
            if handle.join().is_err() {
                let _ = self.faults_tx.send(TimerError::LoopFault {
                    name,
                    reason: "thread terminated abnormally".to_string(),
                });
            }
        }
    }

    // Lets any started loop exit on its own; used when start fails midway
    // and on drop.
    fn abort_loops(&mut self) {
        self.shutdown.take();
        self.deactivated.store(true, Ordering::SeqCst);
    }

    fn expect_state(&self, expected: TimerState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(TimerError::InvalidState {
                action,
                state: self.state,
            })
        }
    }
}

impl<S: Scheduler> Drop for TimerController<S> {
    fn drop(&mut self) {
        if matches!(self.state, TimerState::Running | TimerState::Draining) {
            self.abort_loops();
            let _ = self.transport.unsubscribe();
        }
    }
}

/// Runs a loop body, forwarding its error or panic to the controller.
fn supervise(name: &'static str, faults: &Sender<TimerError>, body: impl FnOnce() -> Result<()>) {
    let fault = match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err,
        Err(_) => TimerError::LoopFault {
            name,
            reason: "panicked".to_string(),
        },
    };
    error!("{}", fault);
    let _ = faults.send(fault);
}
