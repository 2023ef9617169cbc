//! CLI command implementations

pub mod bindings;
pub mod play;

use anyhow::{Context, Result};
use flint_runtime::{BindingConfig, EngineConfig, KeyCode, Modifiers};
use std::path::Path;

/// Name of the binding that ends `flint play`
pub const QUIT_BINDING: &str = "quit";

/// Load the config file if given, otherwise defaults. A `quit` binding on
/// Escape is added when the config does not define one.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config '{}'", path))?,
        None => EngineConfig::default(),
    };

    config
        .bindings
        .entry(QUIT_BINDING.to_string())
        .or_insert(BindingConfig {
            key: KeyCode::Escape,
            modifiers: Modifiers::NONE,
        });
    Ok(config)
}
