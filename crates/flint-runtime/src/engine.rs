//! Engine context and the frame loop

use crate::event::EventType;
use crate::event_manager::{EventManager, EventSource};
use crate::observer::SubscriptionToken;
use crate::timing::{Frame, Timing};
use flint_core::{FlintError, Result};
use flint_scene::{Scene, SceneManager};
use std::cell::Cell;
use std::rc::Rc;

/// Cooperative stop flag. Clones share the flag; the loop checks it only at
/// the top of each iteration.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Rc<Cell<bool>>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.set(true);
    }

    pub fn is_requested(&self) -> bool {
        self.0.get()
    }

    pub fn clear(&self) {
        self.0.set(false);
    }
}

/// The window and rendering layer as seen by the loop
pub trait Platform: EventSource {
    /// Draw the active scene. Called once per frame after the scene update.
    fn render(&mut self, _scene: &Scene) {}
}

/// Owns timing, events and scenes for the lifetime of one engine run
pub struct Engine {
    timing: Timing,
    events: EventManager,
    scenes: SceneManager,
    stop: StopSignal,
}

impl Engine {
    /// Engine on the system clock with `template` as the authoring scene
    pub fn new(template: Scene) -> Self {
        Self::with_timing(Timing::new(), template)
    }

    pub fn with_timing(timing: Timing, template: Scene) -> Self {
        Self {
            timing,
            events: EventManager::new(),
            scenes: SceneManager::new(template),
            stop: StopSignal::new(),
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn timing_mut(&mut self) -> &mut Timing {
        &mut self.timing
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventManager {
        &mut self.events
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    /// A handle that stops the loop when requested
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Request a stop after every window close request
    pub fn stop_on_close_requested(&mut self) -> SubscriptionToken {
        let stop = self.stop.clone();
        self.events
            .subscribe(EventType::WindowCloseRequested, move |event| {
                log::info!("Close requested by {}", event.window);
                stop.request();
                Ok(())
            })
    }

    /// Run one loop iteration: poll and drain events, update the scene with
    /// the last frame's delta, render, then pace and publish the next frame.
    ///
    /// Handler failures from the drain and from timing callbacks do not cut
    /// the frame short; they are returned together as
    /// [`FlintError::Dispatch`] once the frame is complete.
    pub fn frame<P: Platform>(&mut self, platform: &mut P) -> Result<Frame> {
        let mut failures = Vec::new();

        let source: &mut dyn EventSource = &mut *platform;
        collect(self.events.update(Some(source)), &mut failures)?;
        self.scenes.update(self.timing.frame().delta());
        platform.render(self.scenes.active_scene());
        let frame = collect(self.timing.next_frame(), &mut failures)?;

        log::trace!(
            "Frame {} ({:.4}s)",
            self.timing.frame().number(),
            self.timing.frame().delta()
        );
        FlintError::from_failures(failures)?;
        Ok(frame.unwrap_or_else(|| self.timing.frame()))
    }

    /// Loop until the stop signal is raised. Handler failures are logged and
    /// the loop continues; any other error ends it. Returns the number of
    /// frames run.
    pub fn run<P: Platform>(&mut self, platform: &mut P) -> Result<u64> {
        log::info!("Engine loop started");
        self.timing.reset();

        let mut frames = 0;
        while !self.stop.is_requested() {
            match self.frame(platform) {
                Ok(_) => {}
                Err(FlintError::Dispatch(failures)) => {
                    log::debug!("Frame finished with {} handler failure(s)", failures.len());
                }
                Err(err) => return Err(err),
            }
            frames += 1;
        }

        log::info!(
            "Engine loop stopped after {} frames ({:.2}s)",
            frames,
            self.timing.real_elapsed()
        );
        Ok(frames)
    }

    /// Run at most `count` frames, stopping early if the stop signal is
    /// raised. Any error ends the run.
    pub fn run_frames<P: Platform>(&mut self, platform: &mut P, count: u64) -> Result<u64> {
        let mut frames = 0;
        while frames < count && !self.stop.is_requested() {
            self.frame(platform)?;
            frames += 1;
        }
        Ok(frames)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("timing", &self.timing)
            .field("scene_state", &self.scenes.state())
            .field("stop_requested", &self.stop.is_requested())
            .finish()
    }
}

/// Move the failures of a `Dispatch` error into `failures`. Other errors
/// pass through.
fn collect<T>(result: Result<T>, failures: &mut Vec<FlintError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(FlintError::Dispatch(errors)) => {
            failures.extend(errors);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
