//! Engine configuration loaded from TOML
//!
//! ```toml
//! [timing]
//! target_frame_rate = 60.0
//! game_speed = 1.0
//! custom_timings = true
//!
//! [bindings.quit]
//! key = "Escape"
//! modifiers = []
//! ```

use crate::engine::Engine;
use crate::input::{KeyCode, Modifiers};
use crate::input_map::InputMap;
use crate::timing::Timing;
use flint_core::{FlintError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub timing: TimingConfig,
    pub bindings: BTreeMap<String, BindingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Frames per second cap; 0 means uncapped
    pub target_frame_rate: f64,
    pub game_speed: f64,
    /// Enable the interval scheduler
    pub custom_timings: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_frame_rate: 60.0,
            game_speed: 1.0,
            custom_timings: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub key: KeyCode,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl EngineConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.timing.game_speed == 0.0 || !self.timing.game_speed.is_finite() {
            return Err(FlintError::ConfigError(format!(
                "timing.game_speed must be non-zero and finite, got {}",
                self.timing.game_speed
            )));
        }
        Ok(())
    }

    /// Configure timing and (re)bind every listed binding
    pub fn apply(&self, engine: &mut Engine) -> Result<()> {
        self.apply_timing(engine.timing_mut())?;
        self.apply_bindings(engine.events_mut().input_map_mut())
    }

    pub fn apply_timing(&self, timing: &mut Timing) -> Result<()> {
        timing.set_target_frame_rate(self.timing.target_frame_rate);
        timing.set_game_speed(self.timing.game_speed)?;
        if self.timing.custom_timings && timing.custom_timings().is_none() {
            timing.enable_custom_timings()?;
        }
        Ok(())
    }

    pub fn apply_bindings(&self, input_map: &mut InputMap) -> Result<()> {
        for (name, binding) in &self.bindings {
            let id = input_map.get_or_create(name);
            input_map.bind(id, binding.key, binding.modifiers)?;
        }
        log::debug!("Applied {} key bindings", self.bindings.len());
        Ok(())
    }

    /// Replace the stored bindings with the current ones. Unbound bindings
    /// are left out.
    pub fn capture_bindings(&mut self, input_map: &InputMap) {
        self.bindings = input_map
            .bindings()
            .into_iter()
            .filter_map(|(name, chord)| {
                chord.map(|(key, modifiers)| (name, BindingConfig { key, modifiers }))
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[timing]
target_frame_rate = 30.0
game_speed = 0.5
custom_timings = true

[bindings.quit]
key = "Escape"

[bindings.save]
key = "KeyS"
modifiers = ["ctrl"]
"#;

    #[test]
    fn test_parse() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.timing.target_frame_rate, 30.0);
        assert_eq!(config.timing.game_speed, 0.5);
        assert!(config.timing.custom_timings);
        assert_eq!(
            config.bindings["quit"],
            BindingConfig {
                key: KeyCode::Escape,
                modifiers: Modifiers::NONE
            }
        );
        assert_eq!(config.bindings["save"].modifiers, Modifiers::CONTROL);
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.timing.target_frame_rate, 60.0);
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn test_rejects_zero_speed() {
        let err = EngineConfig::from_toml_str("[timing]\ngame_speed = 0.0\n").unwrap_err();
        assert!(matches!(err, FlintError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_unknown_modifier() {
        let err = EngineConfig::from_toml_str(
            "[bindings.x]\nkey = \"KeyX\"\nmodifiers = [\"hyper\"]\n",
        )
        .unwrap_err();
        assert!(matches!(err, FlintError::TomlParseError(_)));
    }

    #[test]
    fn test_apply_and_capture() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        let mut timing = Timing::with_source(crate::timing::ManualTimeSource::new());
        let mut map = InputMap::new();

        config.apply_timing(&mut timing).unwrap();
        config.apply_bindings(&mut map).unwrap();
        assert_eq!(timing.target_frame_rate(), 30.0);
        assert_eq!(timing.game_speed(), 0.5);
        assert!(timing.custom_timings().is_some());

        // Applying twice keeps the scheduler and the same bindings
        config.apply_timing(&mut timing).unwrap();
        config.apply_bindings(&mut map).unwrap();
        assert_eq!(map.key_bindings().len(), 2);

        let quit = map.find("quit").unwrap();
        map.bind(quit, KeyCode::KeyQ, Modifiers::CONTROL).unwrap();
        map.add("unbound").unwrap();

        let mut captured = config.clone();
        captured.capture_bindings(&map);
        assert_eq!(captured.bindings.len(), 2);
        assert_eq!(captured.bindings["quit"].key, KeyCode::KeyQ);
        assert_eq!(captured.bindings["quit"].modifiers, Modifiers::CONTROL);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "flint-config-test-{}.toml",
            std::process::id()
        ));

        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("flint-config-does-not-exist.toml");
        assert!(matches!(
            EngineConfig::load(&path),
            Err(FlintError::IoError(_))
        ));
    }
}
