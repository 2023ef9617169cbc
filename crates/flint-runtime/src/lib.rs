//! Flint Runtime - Engine loop infrastructure
//!
//! Provides the pieces one frame of the engine is built from:
//! - `Timing` / `Frame` - delta time, frame pacing, FPS and game speed
//! - `CustomTimingManager` - callbacks fired on fixed wall-clock intervals
//! - `EventManager` - buffered window input raised once per frame
//! - `HotKeyRegistry` / `KeyBindingManager` / `InputMap` - chords and rebindable bindings
//! - `EngineConfig` - TOML configuration for timing and bindings
//! - `Engine` - owns all of the above plus the scene manager and runs the loop

mod config;
mod custom_timing;
mod engine;
mod event;
mod event_manager;
mod hotkey;
mod input;
mod input_map;
mod keybinding;
mod observer;
mod timing;

pub use config::{BindingConfig, EngineConfig, TimingConfig};
pub use custom_timing::{CustomTiming, CustomTimingManager, TimingTick};
pub use engine::{Engine, Platform, StopSignal};
pub use event::{EngineEvent, EventCategory, EventKind, EventType};
pub use event_manager::{EventManager, EventSource};
pub use hotkey::{HotKey, HotKeyEvent, HotKeyId, HotKeyRegistry};
pub use input::{
    format_chord, is_modifier_key, modifier_for_key, ButtonAction, KeyAction, KeyCode, Modifiers,
    MouseButton, WindowHandle,
};
pub use input_map::InputMap;
pub use keybinding::{BindingChange, Chord, KeyBinding, KeyBindingEvent, KeyBindingId, KeyBindingManager};
pub use observer::{Handler, Observers, SubscriptionToken};
pub use timing::{Frame, ManualTimeSource, SystemTimeSource, TimeSource, Timing};
