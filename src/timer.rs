use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::event_bus::{EventBus, EventBusError, Handler};

pub type Result<T> = std::result::Result<T, TimerError>;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("invalid duration: {0}ms (must be finite and non-negative)")]
    InvalidDuration(f64),

    #[error(transparent)]
    Event(#[from] EventBusError),
}

/// Lifecycle notifications a [`Timer`] sends to its subscribers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum TimerEvent {
    Started,
    Tick,
    Elapsed,
    Stopped,
}

/// Whether the frame loop should ask for another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Continue,
    Stop,
}

/// Source of "now" for the frame loop.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-cranked clock. Clones share the same offset.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Payload of every `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub is_running: bool,
    pub is_complete: bool,
    #[serde(serialize_with = "as_millis")]
    pub remaining_time: Duration,
    #[serde(serialize_with = "as_millis")]
    pub duration: Duration,
}

pub fn duration_from_millis(ms: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(ms / 1000.0).map_err(|_| TimerError::InvalidDuration(ms))
}

/// Countdown driven one frame at a time.
///
/// Nothing happens on its own: whoever owns the timer calls [`Timer::frame`]
/// once per frame for as long as it returns [`FrameStatus::Continue`].
/// See [`crate::runtime::run_frames`].
#[derive(Debug)]
pub struct Timer<C: Clock = SystemClock> {
    clock: C,
    duration: Duration,
    remaining_time: Duration,
    is_running: bool,
    is_complete: bool,
    last_frame: Option<Instant>,
    events: EventBus<TimerSnapshot>,
}

impl Timer<SystemClock> {
    pub fn new(duration: Duration) -> Self {
        Self::with_clock(duration, SystemClock)
    }

    pub fn from_millis(ms: f64) -> Result<Self> {
        Ok(Self::new(duration_from_millis(ms)?))
    }
}

impl<C: Clock> Timer<C> {
    pub fn with_clock(duration: Duration, clock: C) -> Self {
        Self {
            clock,
            duration,
            remaining_time: duration,
            is_running: false,
            is_complete: false,
            last_frame: None,
            events: EventBus::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining_time(&self) -> Duration {
        self.remaining_time
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            is_running: self.is_running,
            is_complete: self.is_complete,
            remaining_time: self.remaining_time,
            duration: self.duration,
        }
    }

    /// Start or resume. A completed timer is reset first.
    pub fn start_timer(&mut self) -> Result<()> {
        if self.is_complete {
            self.reset_timer()?;
        }
        if self.is_running {
            return Ok(());
        }

        self.is_running = true;
        self.last_frame = Some(self.clock.now());
        debug!(remaining_ms = self.remaining_time.as_millis() as u64, "timer started");
        self.emit(TimerEvent::Started, None)
    }

    pub fn pause_timer(&mut self) -> Result<()> {
        if !self.is_running {
            return Ok(());
        }

        self.is_running = false;
        self.last_frame = None;
        debug!(remaining_ms = self.remaining_time.as_millis() as u64, "timer paused");
        self.emit(TimerEvent::Stopped, None)
    }

    pub fn reset_timer(&mut self) -> Result<()> {
        let was_running = self.is_running;

        self.remaining_time = self.duration;
        self.is_running = false;
        self.is_complete = false;
        self.last_frame = None;

        if was_running {
            self.emit(TimerEvent::Stopped, None)?;
        }
        Ok(())
    }

    /// Changes the target of future resets. The current countdown is untouched.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn set_duration_ms(&mut self, ms: f64) -> Result<()> {
        self.set_duration(duration_from_millis(ms)?);
        Ok(())
    }

    /// Advance by the time since the previous frame.
    pub fn frame(&mut self) -> Result<FrameStatus> {
        if !self.is_running {
            return Ok(FrameStatus::Stop);
        }

        let now = self.clock.now();
        let last = self.last_frame.replace(now).unwrap_or(now);
        let delta = now.saturating_duration_since(last);
        self.remaining_time = self.remaining_time.saturating_sub(delta);

        if self.remaining_time.is_zero() {
            self.is_complete = true;
            self.is_running = false;
            self.last_frame = None;
        }

        let snapshot = self.snapshot();
        self.emit(TimerEvent::Tick, Some(&snapshot))?;

        if self.is_complete {
            debug!(duration_ms = self.duration.as_millis() as u64, "timer elapsed");
            self.emit(TimerEvent::Elapsed, None)?;
            self.emit(TimerEvent::Stopped, None)?;
            return Ok(FrameStatus::Stop);
        }

        Ok(FrameStatus::Continue)
    }

    pub fn on(&self, event: TimerEvent, callback: Handler<TimerSnapshot>) {
        self.events.on(event.as_ref(), callback);
    }

    pub fn off(&self, event: Option<TimerEvent>, callback: Option<&Handler<TimerSnapshot>>) {
        match event {
            Some(event) => self.events.off(Some(event.as_ref()), callback),
            None => self.events.off(None, callback),
        }
    }

    fn emit(&self, event: TimerEvent, payload: Option<&TimerSnapshot>) -> Result<()> {
        self.events.send(event.as_ref(), payload)?;
        Ok(())
    }
}
