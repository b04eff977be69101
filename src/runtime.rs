use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::timer::{self, Clock, FrameStatus, ManualClock, Timer};

/// Roughly one display refresh at 60Hz.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Frame,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(AppEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
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

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source fed through a channel
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

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that hands out one key event or frame at a time.
///
/// Frames are due on a fixed cadence; a burst of keystrokes cannot hold one
/// back past its deadline.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_frame: Instant,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_frame = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_frame,
        }
    }

    /// Blocks until the next event or the next frame deadline, whichever is first.
    pub fn step(&mut self) -> AppEvent {
        let now = Instant::now();
        if now >= self.next_frame {
            return self.frame_due(now);
        }

        match self.event_source.recv_timeout(self.next_frame - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.frame_due(Instant::now())
            }
        }
    }

    fn frame_due(&mut self, now: Instant) -> AppEvent {
        self.next_frame = now + self.ticker.interval();
        AppEvent::Frame
    }
}

/// Waits for the next frame.
pub trait FrameScheduler {
    fn next_frame(&mut self);
}

/// Sleeps a fixed interval between frames.
#[derive(Clone, Copy, Debug)]
pub struct IntervalScheduler {
    interval: Duration,
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

impl FrameScheduler for IntervalScheduler {
    fn next_frame(&mut self) {
        thread::sleep(self.interval);
    }
}

/// Moves a [`ManualClock`] forward by `step` per frame instead of sleeping.
#[derive(Clone, Debug)]
pub struct SteppedScheduler {
    clock: ManualClock,
    step: Duration,
}

impl SteppedScheduler {
    pub fn new(clock: ManualClock, step: Duration) -> Self {
        Self { clock, step }
    }
}

impl FrameScheduler for SteppedScheduler {
    fn next_frame(&mut self) {
        self.clock.advance(self.step);
    }
}

/// Drive `timer` frame by frame until it stops asking for more.
/// Returns the number of frames delivered.
pub fn run_frames<C, S>(timer: &mut Timer<C>, scheduler: &mut S) -> timer::Result<usize>
where
    C: Clock,
    S: FrameScheduler,
{
    let mut frames = 0;
    loop {
        if !timer.is_running() {
            return Ok(frames);
        }
        scheduler.next_frame();
        frames += 1;
        if timer.frame()? == FrameStatus::Stop {
            return Ok(frames);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::handler;
    use crate::timer::{TimerEvent, TimerSnapshot};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::mpsc;

    #[test]
    fn step_returns_frame_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        match runner.step() {
            AppEvent::Frame => {}
            _ => panic!("expected Frame on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(50));
        let mut runner = Runner::new(es, ticker);

        match runner.step() {
            AppEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn frame_is_not_starved_by_queued_events() {
        let (tx, rx) = mpsc::channel();
        for _ in 0..1000 {
            tx.send(AppEvent::Resize).unwrap();
        }
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        thread::sleep(Duration::from_millis(5));
        match runner.step() {
            AppEvent::Frame => {}
            _ => panic!("expected overdue Frame before queued events"),
        }
    }

    #[test]
    fn run_frames_drives_timer_to_completion() {
        let clock = ManualClock::new();
        let mut timer = Timer::with_clock(Duration::from_millis(1000), clock.clone());
        let mut scheduler = SteppedScheduler::new(clock, Duration::from_millis(100));

        timer.start_timer().unwrap();
        let frames = run_frames(&mut timer, &mut scheduler).unwrap();

        assert_eq!(frames, 10);
        assert!(timer.is_complete());
        assert_eq!(timer.remaining_time(), Duration::ZERO);
    }

    #[test]
    fn run_frames_surfaces_subscriber_errors() {
        let clock = ManualClock::new();
        let mut timer = Timer::with_clock(Duration::from_millis(1000), clock.clone());
        let mut scheduler = SteppedScheduler::new(clock, Duration::from_millis(100));
        let ticks = Rc::new(Cell::new(0));
        {
            let ticks = ticks.clone();
            timer.on(
                TimerEvent::Tick,
                handler(move |_: Option<&TimerSnapshot>| {
                    ticks.set(ticks.get() + 1);
                    if ticks.get() == 3 {
                        return Err("enough".into());
                    }
                    Ok(())
                }),
            );
        }

        timer.start_timer().unwrap();
        assert!(run_frames(&mut timer, &mut scheduler).is_err());
        assert_eq!(ticks.get(), 3);
        assert_eq!(timer.remaining_time(), Duration::from_millis(700));
    }

    #[test]
    fn run_frames_on_idle_timer_is_a_noop() {
        let clock = ManualClock::new();
        let mut timer = Timer::with_clock(Duration::from_millis(1000), clock.clone());
        let mut scheduler = SteppedScheduler::new(clock, Duration::from_millis(100));

        assert_eq!(run_frames(&mut timer, &mut scheduler).unwrap(), 0);
        assert_eq!(timer.remaining_time(), Duration::from_millis(1000));
    }

    #[test]
    fn interval_scheduler_runs_real_time() {
        let mut timer = Timer::new(Duration::from_millis(40));
        let mut scheduler = IntervalScheduler::new(Duration::from_millis(5));

        timer.start_timer().unwrap();
        let frames = run_frames(&mut timer, &mut scheduler).unwrap();

        assert!(frames >= 1);
        assert!(timer.is_complete());
    }
}
