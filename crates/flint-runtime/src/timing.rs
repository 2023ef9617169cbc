//! Frame timing: delta time, pacing, FPS and the interval scheduler

use crate::custom_timing::CustomTimingManager;
use flint_core::{FlintError, Result};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// One tick of the loop. Never changes after construction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    number: u64,
    delta: f64,
}

impl Frame {
    pub fn new(number: u64, delta: f64) -> Self {
        Self { number, delta }
    }

    /// Sequence number, starting at 1 for the first completed frame
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Logical seconds covered by this frame (game speed applied)
    pub fn delta(&self) -> f64 {
        self.delta
    }
}

/// Monotonic clock plus a way to wait on it
pub trait TimeSource {
    /// Time since an arbitrary fixed origin
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`]
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Hand-driven clock for tests. Clones share the same time; sleeping
/// advances it instantly.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<Cell<Duration>>,
    slept: Rc<Cell<Duration>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }

    /// Total time spent in `sleep`
    pub fn slept(&self) -> Duration {
        self.slept.get()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        self.advance(duration);
    }
}

/// Tracks the current frame, pacing and FPS.
pub struct Timing {
    source: Box<dyn TimeSource>,
    frame: Frame,
    target_frame_rate: f64,
    game_speed: f64,
    elapsed: f64,
    real_elapsed: f64,
    /// When the previous frame was measured
    last: Duration,
    /// When the current iteration started, after any pacing sleep
    started: Duration,
    period: Option<Duration>,
    fps: f64,
    fps_frames: u32,
    fps_window: Duration,
    custom_timings: Option<CustomTimingManager>,
}

impl Default for Timing {
    fn default() -> Self {
        Self::new()
    }
}

impl Timing {
    /// Uncapped timing on the system clock
    pub fn new() -> Self {
        Self::with_source(SystemTimeSource::new())
    }

    pub fn with_source(source: impl TimeSource + 'static) -> Self {
        let last = source.now();
        Self {
            source: Box::new(source),
            frame: Frame::default(),
            target_frame_rate: 0.0,
            game_speed: 1.0,
            elapsed: 0.0,
            real_elapsed: 0.0,
            last,
            started: last,
            period: None,
            fps: 0.0,
            fps_frames: 0,
            fps_window: Duration::ZERO,
            custom_timings: None,
        }
    }

    /// The most recently completed frame
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Frames per second over the last full one-second window
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn target_frame_rate(&self) -> f64 {
        self.target_frame_rate
    }

    /// Cap the loop at `rate` frames per second. Zero, negative or
    /// non-finite values remove the cap, as do rates so low that one period
    /// does not fit in a [`Duration`].
    pub fn set_target_frame_rate(&mut self, rate: f64) {
        self.period = None;
        self.target_frame_rate = 0.0;
        if rate.is_finite() && rate > 0.0 {
            match Duration::try_from_secs_f64(1.0 / rate) {
                Ok(period) => {
                    self.period = Some(period);
                    self.target_frame_rate = rate;
                }
                Err(_) => log::warn!("Frame rate {} is too low to pace, running uncapped", rate),
            }
        }
        log::debug!("Target frame rate set to {}", self.target_frame_rate);
    }

    pub fn game_speed(&self) -> f64 {
        self.game_speed
    }

    /// Scale applied to wall-clock delta. Zero and non-finite are rejected.
    pub fn set_game_speed(&mut self, speed: f64) -> Result<()> {
        if speed == 0.0 || !speed.is_finite() {
            return Err(FlintError::InvalidArgument(format!(
                "game speed must be non-zero and finite, got {speed}"
            )));
        }
        self.game_speed = speed;
        log::debug!("Game speed set to {}", speed);
        Ok(())
    }

    /// Logical seconds since start (sum of frame deltas)
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Wall-clock seconds since start
    pub fn real_elapsed(&self) -> f64 {
        self.real_elapsed
    }

    /// Turn on the interval scheduler. Fails if it is already on.
    pub fn enable_custom_timings(&mut self) -> Result<&mut CustomTimingManager> {
        if self.custom_timings.is_some() {
            return Err(FlintError::InvalidState(
                "custom timings are already enabled".into(),
            ));
        }
        log::debug!("Custom timings enabled");
        Ok(self.custom_timings.insert(CustomTimingManager::new()))
    }

    pub fn custom_timings(&self) -> Option<&CustomTimingManager> {
        self.custom_timings.as_ref()
    }

    pub fn custom_timings_mut(&mut self) -> Option<&mut CustomTimingManager> {
        self.custom_timings.as_mut()
    }

    /// Measure the next frame from now
    pub fn reset(&mut self) {
        self.last = self.source.now();
        self.started = self.last;
        self.fps_frames = 0;
        self.fps_window = Duration::ZERO;
    }

    /// Finish the current loop iteration.
    ///
    /// The new frame's delta is the wall-clock time since the previous call,
    /// measured on entry and scaled by game speed. If the iteration's own
    /// work took less than the target period, the rest of the period is
    /// slept out; that sleep lands in the next frame's delta. Interval
    /// timings then advance by the unscaled wall-clock time. Timing callback
    /// failures are returned as [`FlintError::Dispatch`] after the frame has
    /// been published.
    pub fn next_frame(&mut self) -> Result<Frame> {
        let now = self.source.now();
        let wall_duration = now.saturating_sub(self.last);
        let wall = wall_duration.as_secs_f64();
        let delta = wall * self.game_speed;
        self.last = now;

        if let Some(period) = self.period {
            let work = now.saturating_sub(self.started);
            if work < period {
                self.source.sleep(period - work);
            }
        }
        self.started = self.source.now();

        let mut failures = Vec::new();
        if let Some(timings) = self.custom_timings.as_mut() {
            timings.advance(wall, &mut failures);
        }
        for failure in &failures {
            log::warn!("Timing callback failed: {}", failure);
        }

        self.frame = Frame::new(self.frame.number + 1, delta);
        self.elapsed += delta;
        self.real_elapsed += wall;

        self.fps_frames += 1;
        self.fps_window += wall_duration;
        if self.fps_window >= Duration::from_secs(1) {
            self.fps = self.fps_frames as f64 / self.fps_window.as_secs_f64();
            log::trace!("{:.1} fps", self.fps);
            self.fps_frames = 0;
            self.fps_window = Duration::ZERO;
        }

        FlintError::from_failures(failures)?;
        Ok(self.frame)
    }
}

impl std::fmt::Debug for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timing")
            .field("frame", &self.frame)
            .field("fps", &self.fps)
            .field("target_frame_rate", &self.target_frame_rate)
            .field("game_speed", &self.game_speed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_uncapped_delta() {
        let clock = ManualTimeSource::new();
        let mut timing = Timing::with_source(clock.clone());

        clock.advance(Duration::from_millis(16));
        let frame = timing.next_frame().unwrap();
        assert_eq!(frame.number(), 1);
        assert!(approx(frame.delta(), 0.016));

        clock.advance(Duration::from_millis(20));
        let frame = timing.next_frame().unwrap();
        assert_eq!(frame.number(), 2);
        assert!(approx(frame.delta(), 0.020));
        assert!(approx(timing.elapsed(), 0.036));
        assert_eq!(clock.slept(), Duration::ZERO);
    }

    #[test]
    fn test_pacing_sleeps_remaining_period() {
        let clock = ManualTimeSource::new();
        let mut timing = Timing::with_source(clock.clone());
        timing.set_target_frame_rate(10.0);

        // The frame reports the work it measured; the sleep comes after
        clock.advance(Duration::from_millis(20));
        let frame = timing.next_frame().unwrap();
        assert_eq!(clock.slept(), Duration::from_millis(80));
        assert!(approx(frame.delta(), 0.02));

        // The next frame covers the sleep plus its own work, and the
        // period is paced from the end of the sleep
        clock.advance(Duration::from_millis(30));
        let frame = timing.next_frame().unwrap();
        assert_eq!(clock.slept(), Duration::from_millis(150));
        assert!(approx(frame.delta(), 0.11));

        // A long frame is not paced
        clock.advance(Duration::from_millis(250));
        let frame = timing.next_frame().unwrap();
        assert_eq!(clock.slept(), Duration::from_millis(150));
        assert!(approx(frame.delta(), 0.32));
    }

    #[test]
    fn test_unrepresentable_period_runs_uncapped() {
        let clock = ManualTimeSource::new();
        let mut timing = Timing::with_source(clock.clone());
        timing.set_target_frame_rate(1e-300);
        assert_eq!(timing.target_frame_rate(), 0.0);

        clock.advance(Duration::from_millis(10));
        let frame = timing.next_frame().unwrap();
        assert!(approx(frame.delta(), 0.01));
        assert_eq!(clock.slept(), Duration::ZERO);

        // A tiny but representable rate still paces
        timing.set_target_frame_rate(1e-6);
        assert_eq!(timing.target_frame_rate(), 1e-6);
    }

    #[test]
    fn test_uncapped_rates() {
        let mut timing = Timing::with_source(ManualTimeSource::new());
        timing.set_target_frame_rate(-5.0);
        assert_eq!(timing.target_frame_rate(), 0.0);
        timing.set_target_frame_rate(f64::INFINITY);
        assert_eq!(timing.target_frame_rate(), 0.0);
    }

    #[test]
    fn test_game_speed_scales_logical_time_only() {
        let clock = ManualTimeSource::new();
        let mut timing = Timing::with_source(clock.clone());
        timing.set_game_speed(2.0).unwrap();

        clock.advance(Duration::from_millis(100));
        let frame = timing.next_frame().unwrap();
        assert!(approx(frame.delta(), 0.2));
        assert!(approx(timing.elapsed(), 0.2));
        assert!(approx(timing.real_elapsed(), 0.1));
    }

    #[test]
    fn test_zero_game_speed_rejected() {
        let mut timing = Timing::with_source(ManualTimeSource::new());
        assert!(matches!(
            timing.set_game_speed(0.0),
            Err(FlintError::InvalidArgument(_))
        ));
        assert!(timing.set_game_speed(f64::NAN).is_err());
        assert_eq!(timing.game_speed(), 1.0);
    }

    #[test]
    fn test_fps_window() {
        let clock = ManualTimeSource::new();
        let mut timing = Timing::with_source(clock.clone());

        for _ in 0..40 {
            clock.advance(Duration::from_millis(25));
            timing.next_frame().unwrap();
        }
        assert!(approx(timing.fps(), 40.0));

        for _ in 0..10 {
            clock.advance(Duration::from_millis(50));
            timing.next_frame().unwrap();
        }
        // Window not complete yet
        assert!(approx(timing.fps(), 40.0));
    }

    #[test]
    fn test_custom_timings_enable_once() {
        let mut timing = Timing::with_source(ManualTimeSource::new());
        assert!(timing.custom_timings().is_none());
        timing.enable_custom_timings().unwrap();
        assert!(matches!(
            timing.enable_custom_timings(),
            Err(FlintError::InvalidState(_))
        ));
    }

    #[test]
    fn test_custom_timings_use_wall_clock() {
        let fired = Rc::new(RefCell::new(0));
        let clock = ManualTimeSource::new();
        let mut timing = Timing::with_source(clock.clone());
        timing.set_game_speed(4.0).unwrap();

        let f = fired.clone();
        timing
            .enable_custom_timings()
            .unwrap()
            .get_or_create(1.0)
            .unwrap()
            .set_callback(move |_| {
                *f.borrow_mut() += 1;
                Ok(())
            });

        clock.advance(Duration::from_millis(500));
        timing.next_frame().unwrap();
        assert_eq!(*fired.borrow(), 0);

        clock.advance(Duration::from_millis(500));
        timing.next_frame().unwrap();
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn test_timing_failure_still_publishes_frame() {
        let clock = ManualTimeSource::new();
        let mut timing = Timing::with_source(clock.clone());
        timing
            .enable_custom_timings()
            .unwrap()
            .get_or_create(0.01)
            .unwrap()
            .set_callback(|_| Err(FlintError::HandlerError("reload".into())));

        clock.advance(Duration::from_millis(16));
        assert!(matches!(timing.next_frame(), Err(FlintError::Dispatch(_))));
        assert_eq!(timing.frame().number(), 1);
    }

    #[test]
    fn test_reset_rebases_clock() {
        let clock = ManualTimeSource::new();
        let mut timing = Timing::with_source(clock.clone());
        clock.advance(Duration::from_secs(5));
        timing.reset();

        clock.advance(Duration::from_millis(10));
        assert!(approx(timing.next_frame().unwrap().delta(), 0.01));
    }
}
