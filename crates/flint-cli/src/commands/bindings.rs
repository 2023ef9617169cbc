//! Bindings command - prints the configured key bindings

use super::load_config;
use anyhow::{Context, Result};
use flint_runtime::{format_chord, EngineConfig, InputMap};

pub fn run(config: Option<&str>) -> Result<()> {
    let config = load_config(config)?;
    let mut input_map = InputMap::new();
    config
        .apply_bindings(&mut input_map)
        .context("Failed to apply key bindings")?;

    println!("{}", describe(&config, &input_map));
    Ok(())
}

fn describe(config: &EngineConfig, input_map: &InputMap) -> String {
    let mut lines = vec![
        format!(
            "Timing: {} fps target, speed x{}, custom timings {}",
            if config.timing.target_frame_rate > 0.0 {
                config.timing.target_frame_rate.to_string()
            } else {
                "uncapped".to_string()
            },
            config.timing.game_speed,
            if config.timing.custom_timings { "on" } else { "off" }
        ),
        String::new(),
        "Bindings:".to_string(),
    ];

    for (name, chord) in input_map.bindings() {
        let chord = chord
            .map(|(key, modifiers)| format_chord(key, modifiers))
            .unwrap_or_else(|| "(unbound)".to_string());
        lines.push(format!("  {:<16} {}", name, chord));
    }
    lines.join("\n")
}
