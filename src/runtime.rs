use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Period between countdown evaluations
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Identifies one scheduled periodic callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

/// Arms and cancels the periodic tick that drives a running session
pub trait TickScheduler {
    fn schedule(&mut self, period: Duration) -> TickHandle;

    /// Cancelling a handle that is no longer live is a no-op.
    fn cancel(&mut self, handle: TickHandle);
}

/// Single-threaded schedule shared between the timer and the event loop.
///
/// The timer arms it through [`TickScheduler`]; the loop asks
/// [`IntervalSchedule::is_armed`] before forwarding a tick.
#[derive(Debug, Clone, Default)]
pub struct IntervalSchedule {
    inner: Rc<RefCell<ScheduleState>>,
}

#[derive(Debug, Default)]
struct ScheduleState {
    next_id: u64,
    live: Vec<(TickHandle, Duration)>,
    scheduled_total: usize,
}

impl IntervalSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        !self.inner.borrow().live.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.inner.borrow().live.len()
    }

    /// Number of callbacks ever scheduled on this schedule
    pub fn scheduled_total(&self) -> usize {
        self.inner.borrow().scheduled_total
    }

    pub fn period(&self) -> Option<Duration> {
        self.inner.borrow().live.first().map(|(_, period)| *period)
    }
}

impl TickScheduler for IntervalSchedule {
    fn schedule(&mut self, period: Duration) -> TickHandle {
        let mut inner = self.inner.borrow_mut();
        let handle = TickHandle(inner.next_id);
        inner.next_id += 1;
        inner.scheduled_total += 1;
        inner.live.push((handle, period));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.inner.borrow_mut().live.retain(|(h, _)| *h != handle);
    }
}

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// Ticks keep their cadence while input arrives: each wait only lasts until
/// the next tick deadline.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Cell<Instant>,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Cell::new(Instant::now() + ticker.interval());
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Blocks until the next tick deadline and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        let wait = self
            .next_tick
            .get()
            .saturating_duration_since(Instant::now());

        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.next_tick.set(Instant::now() + self.ticker.interval());
                AppEvent::Tick
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        assert_matches!(runner.step(), AppEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(50));
        let runner = Runner::new(es, ticker);

        assert_matches!(runner.step(), AppEvent::Resize);
    }

    #[test]
    fn schedule_tracks_live_handles() {
        let mut schedule = IntervalSchedule::new();
        let observer = schedule.clone();
        assert!(!observer.is_armed());

        let first = schedule.schedule(TICK_PERIOD);
        assert!(observer.is_armed());
        assert_eq!(observer.period(), Some(TICK_PERIOD));

        schedule.cancel(first);
        assert!(!observer.is_armed());

        // cancelling twice is harmless
        schedule.cancel(first);
        assert_eq!(observer.live_count(), 0);

        let second = schedule.schedule(TICK_PERIOD);
        assert_ne!(first, second);
        assert_eq!(observer.live_count(), 1);
        assert_eq!(observer.scheduled_total(), 2);
    }
}
