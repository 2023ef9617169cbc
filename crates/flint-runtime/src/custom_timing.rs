//! Interval callbacks advanced once per frame

use crate::observer::{Handler, Observers, SubscriptionToken};
use flint_core::{FlintError, Result};

/// Passed to interval callbacks and tick subscribers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingTick {
    pub interval: f64,
    /// Number of times this timing has fired, including this one
    pub fire_count: u64,
}

/// Fires when accumulated elapsed time reaches its interval.
///
/// On fire the accumulator is reset to zero; any overshoot past the interval
/// is dropped rather than carried into the next period.
pub struct CustomTiming {
    id: u64,
    interval: f64,
    accumulator: f64,
    fire_count: u64,
    callback: Option<Handler<TimingTick>>,
    observers: Observers<TimingTick>,
}

impl CustomTiming {
    fn new(id: u64, interval: f64) -> Self {
        Self {
            id,
            interval,
            accumulator: 0.0,
            fire_count: 0,
            callback: None,
            observers: Observers::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Seconds accumulated since the last fire
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn fire_count(&self) -> u64 {
        self.fire_count
    }

    pub fn set_callback(&mut self, callback: impl FnMut(&TimingTick) -> Result<()> + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    pub fn subscribe(
        &mut self,
        f: impl FnMut(&TimingTick) -> Result<()> + 'static,
    ) -> SubscriptionToken {
        self.observers.subscribe(f)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.observers.unsubscribe(token)
    }

    /// Accumulate `elapsed` seconds. Returns whether the timing fired.
    pub fn update(&mut self, elapsed: f64) -> Result<bool> {
        let mut failures = Vec::new();
        let fired = self.advance(elapsed, &mut failures);
        FlintError::from_failures(failures)?;
        Ok(fired)
    }

    pub(crate) fn advance(&mut self, elapsed: f64, failures: &mut Vec<FlintError>) -> bool {
        self.accumulator += elapsed;
        if self.accumulator < self.interval {
            return false;
        }

        self.accumulator = 0.0;
        self.fire_count += 1;
        let tick = TimingTick {
            interval: self.interval,
            fire_count: self.fire_count,
        };

        if let Some(callback) = self.callback.as_mut() {
            if let Err(err) = callback(&tick) {
                failures.push(err);
            }
        }
        self.observers.notify(&tick, failures);
        true
    }
}

impl std::fmt::Debug for CustomTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomTiming")
            .field("interval", &self.interval)
            .field("accumulator", &self.accumulator)
            .field("fire_count", &self.fire_count)
            .finish()
    }
}

/// One [`CustomTiming`] per distinct interval
#[derive(Debug, Default)]
pub struct CustomTimingManager {
    timings: Vec<CustomTiming>,
    next_id: u64,
}

impl CustomTimingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The timing for `interval` seconds, created on first request.
    /// Rejects non-positive and non-finite intervals.
    pub fn get_or_create(&mut self, interval: f64) -> Result<&mut CustomTiming> {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(FlintError::InvalidArgument(format!(
                "timing interval must be positive and finite, got {interval}"
            )));
        }

        let index = match self.position(interval) {
            Some(index) => index,
            None => {
                self.next_id += 1;
                self.timings.push(CustomTiming::new(self.next_id, interval));
                log::debug!("Created custom timing every {}s", interval);
                self.timings.len() - 1
            }
        };
        Ok(&mut self.timings[index])
    }

    pub fn get(&self, interval: f64) -> Option<&CustomTiming> {
        self.position(interval).map(|i| &self.timings[i])
    }

    pub fn get_mut(&mut self, interval: f64) -> Option<&mut CustomTiming> {
        self.position(interval).map(|i| &mut self.timings[i])
    }

    pub fn remove(&mut self, interval: f64) -> bool {
        match self.position(interval) {
            Some(index) => {
                self.timings.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomTiming> {
        self.timings.iter()
    }

    /// Advance every timing. Returns how many fired.
    pub fn update(&mut self, elapsed: f64) -> Result<usize> {
        let mut failures = Vec::new();
        let fired = self.advance(elapsed, &mut failures);
        FlintError::from_failures(failures)?;
        Ok(fired)
    }

    pub(crate) fn advance(&mut self, elapsed: f64, failures: &mut Vec<FlintError>) -> usize {
        let mut fired = 0;
        for timing in &mut self.timings {
            if timing.advance(elapsed, failures) {
                fired += 1;
            }
        }
        fired
    }

    fn position(&self, interval: f64) -> Option<usize> {
        self.timings.iter().position(|t| t.interval == interval)
    }
}
