use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// What the front end reacts to: operator input, terminal resizes and the
/// periodic poll that drives the countdown and expiry.
#[derive(Clone, Debug)]
pub enum OpenFieldEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal input
pub trait OpenFieldEventSource: Send + 'static {
    /// Wait up to `timeout` for the next input event
    fn recv_timeout(&self, timeout: Duration) -> Result<OpenFieldEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<OpenFieldEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too; zones only react to presses
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    OpenFieldEvent::Key(key)
                }
                Ok(CtEvent::Resize(_, _)) => OpenFieldEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(forwarded).is_err() {
                break;
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

impl OpenFieldEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<OpenFieldEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed source for headless runs and tests
pub struct TestEventSource {
    rx: Receiver<OpenFieldEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<OpenFieldEvent>) -> Self {
        Self { rx }
    }
}

impl OpenFieldEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<OpenFieldEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Polling cadence of the countdown
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

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

/// Interleaves input with polls.
///
/// A `Tick` is due one interval after the previous one and is delivered as
/// soon as it is due, even when input keeps arriving (held keys auto-repeat
/// faster than the poll interval). Expiry is therefore noticed at most one
/// interval late no matter how busy the keyboard is.
pub struct Runner<E: OpenFieldEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Cell<Instant>,
}

impl<E: OpenFieldEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Cell::new(Instant::now() + ticker.interval());
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    /// Next thing to handle: a due tick first, otherwise input that arrives
    /// before the tick falls due, otherwise the tick itself.
    pub fn step(&self) -> OpenFieldEvent {
        let now = Instant::now();
        let due = self.next_tick.get();
        if now >= due {
            return self.tick_at(now);
        }
        match self.event_source.recv_timeout(due - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.tick_at(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                // No more input; keep polling at the regular cadence
                std::thread::sleep(due.saturating_duration_since(Instant::now()));
                self.tick_at(Instant::now())
            }
        }
    }

    fn tick_at(&self, now: Instant) -> OpenFieldEvent {
        self.next_tick.set(now + self.ticker.interval());
        OpenFieldEvent::Tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;
    use std::thread;

    fn key(c: char) -> OpenFieldEvent {
        OpenFieldEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );

        assert!(matches!(runner.step(), OpenFieldEvent::Tick));
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(OpenFieldEvent::Resize).unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_secs(10)),
        );

        assert!(matches!(runner.step(), OpenFieldEvent::Resize));
    }

    #[test]
    fn step_ticks_after_source_disconnects() {
        let (tx, rx) = mpsc::channel::<OpenFieldEvent>();
        drop(tx);
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        assert!(matches!(runner.step(), OpenFieldEvent::Tick));
        assert!(matches!(runner.step(), OpenFieldEvent::Tick));
    }

    #[test]
    fn ticks_keep_coming_while_keys_flood_in() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..20 {
            tx.send(key('c')).unwrap();
        }
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(2)),
        );

        let (mut keys, mut ticks) = (0, 0);
        while keys < 20 {
            match runner.step() {
                OpenFieldEvent::Key(_) => {
                    keys += 1;
                    // Handling each key takes longer than one interval
                    thread::sleep(Duration::from_millis(3));
                }
                OpenFieldEvent::Tick => ticks += 1,
                OpenFieldEvent::Resize => {}
            }
        }

        // Queued keys never starve the poll: a tick follows every slow key
        assert!(ticks >= 19, "only {ticks} ticks for {keys} keys");
    }

    #[test]
    fn queued_input_is_served_before_tick_falls_due() {
        let (tx, rx) = mpsc::channel();
        tx.send(key('c')).unwrap();
        tx.send(key('l')).unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_secs(10)),
        );

        assert!(matches!(runner.step(), OpenFieldEvent::Key(_)));
        assert!(matches!(runner.step(), OpenFieldEvent::Key(_)));
    }
}
