//! Scene manager: template scene plus a disposable runtime clone.
//!
//! The template is the authoring state and survives play sessions. Entering
//! [`SceneState::Running`] from [`SceneState::Idle`] deep-clones the template
//! into a runtime scene; stopping discards the clone. Edits made to the
//! runtime scene never reach the template.

use crate::scene::Scene;
use flint_core::{FlintError, Result};

/// Play state of the [`SceneManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneState {
    /// Editing the template; no runtime scene exists.
    #[default]
    Idle,
    /// The runtime scene is ticked every frame.
    Running,
    /// The runtime scene is kept but not ticked.
    Paused,
}

/// Owns the template scene and, while playing, its runtime clone.
#[derive(Debug)]
pub struct SceneManager {
    template: Scene,
    runtime: Option<Scene>,
    state: SceneState,
}

impl SceneManager {
    /// Creates an idle manager around a template scene
    pub fn new(template: Scene) -> Self {
        Self {
            template,
            runtime: None,
            state: SceneState::Idle,
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SceneState::Running
    }

    pub fn template(&self) -> &Scene {
        &self.template
    }

    pub fn template_mut(&mut self) -> &mut Scene {
        &mut self.template
    }

    pub fn runtime(&self) -> Option<&Scene> {
        self.runtime.as_ref()
    }

    pub fn runtime_mut(&mut self) -> Option<&mut Scene> {
        self.runtime.as_mut()
    }

    /// The runtime scene while playing, otherwise the template
    pub fn active_scene(&self) -> &Scene {
        self.runtime.as_ref().unwrap_or(&self.template)
    }

    /// Start or resume play.
    ///
    /// Returns `Ok(false)` when already running. From `Idle` the template is
    /// cloned first; if the clone fails the manager stays `Idle`. From
    /// `Paused` play resumes on the existing runtime scene.
    pub fn run(&mut self) -> Result<bool> {
        match self.state {
            SceneState::Running => Ok(false),
            SceneState::Idle => {
                let runtime = self.template.try_clone()?;
                log::info!(
                    "Scene '{}' running ({} entities)",
                    runtime.name(),
                    runtime.len()
                );
                self.runtime = Some(runtime);
                self.state = SceneState::Running;
                Ok(true)
            }
            SceneState::Paused => {
                log::info!("Scene '{}' resumed", self.template.name());
                self.state = SceneState::Running;
                Ok(true)
            }
        }
    }

    /// Discard the runtime scene and return to `Idle`. Returns false if already idle.
    pub fn stop(&mut self) -> bool {
        if self.state == SceneState::Idle {
            return false;
        }

        self.runtime = None;
        self.state = SceneState::Idle;
        log::info!("Scene '{}' stopped", self.template.name());
        true
    }

    /// Pause the runtime scene. Only legal while running.
    pub fn pause(&mut self) -> Result<()> {
        if self.state != SceneState::Running {
            return Err(FlintError::InvalidState(format!(
                "cannot pause a scene in state {:?}",
                self.state
            )));
        }

        self.state = SceneState::Paused;
        log::info!("Scene '{}' paused", self.template.name());
        Ok(())
    }

    /// Stop and run again with a fresh clone. Only legal while running.
    pub fn restart(&mut self) -> Result<()> {
        if self.state != SceneState::Running {
            return Err(FlintError::InvalidState(format!(
                "cannot restart a scene in state {:?}",
                self.state
            )));
        }

        self.stop();
        self.run()?;
        Ok(())
    }

    /// Replace the template, stopping play first. Returns the old template.
    pub fn set_template(&mut self, template: Scene) -> Scene {
        self.stop();
        std::mem::replace(&mut self.template, template)
    }

    /// Tick the runtime scene. Does nothing unless running.
    pub fn update(&mut self, delta: f64) {
        if self.state != SceneState::Running {
            return;
        }
        if let Some(runtime) = self.runtime.as_mut() {
            runtime.update(delta);
        }
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(Scene::new("untitled"))
    }
}
