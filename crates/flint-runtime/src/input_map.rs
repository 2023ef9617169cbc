//! Hotkeys and key bindings wired together
//!
//! [`InputMap`] owns the [`HotKeyRegistry`] and the [`KeyBindingManager`] so a
//! binding can move between hotkeys without either side holding a reference
//! to the other. Bindings subscribe to hotkeys by id; when a hotkey fires, the
//! map forwards to the bound bindings in subscription order.

use crate::hotkey::{HotKeyEvent, HotKeyRegistry};
use crate::input::{format_chord, is_modifier_key, KeyCode, Modifiers, WindowHandle};
use crate::keybinding::{Chord, KeyBindingEvent, KeyBindingId, KeyBindingManager, ListenState};
use flint_core::{FlintError, Result};

#[derive(Default)]
pub struct InputMap {
    hotkeys: HotKeyRegistry,
    bindings: KeyBindingManager,
}

impl InputMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hotkeys(&self) -> &HotKeyRegistry {
        &self.hotkeys
    }

    pub fn hotkeys_mut(&mut self) -> &mut HotKeyRegistry {
        &mut self.hotkeys
    }

    pub fn key_bindings(&self) -> &KeyBindingManager {
        &self.bindings
    }

    pub fn key_bindings_mut(&mut self) -> &mut KeyBindingManager {
        &mut self.bindings
    }

    pub fn add(&mut self, name: impl Into<String>) -> Result<KeyBindingId> {
        self.bindings.add(name)
    }

    pub fn add_with_handler<F>(&mut self, handler: F) -> Result<KeyBindingId>
    where
        F: FnMut(&KeyBindingEvent) -> Result<()> + 'static,
    {
        self.bindings.add_with_handler(handler)
    }

    pub fn get_or_create(&mut self, name: &str) -> KeyBindingId {
        self.bindings.get_or_create(name)
    }

    pub fn get_or_create_with_handler<F>(&mut self, handler: F) -> KeyBindingId
    where
        F: FnMut(&KeyBindingEvent) -> Result<()> + 'static,
    {
        self.bindings.get_or_create_with_handler(handler)
    }

    pub fn find(&self, name: &str) -> Option<KeyBindingId> {
        self.bindings.find(name)
    }

    /// Current chord of a binding
    pub fn chord(&self, id: KeyBindingId) -> Option<Chord> {
        self.bindings.get(id).and_then(|b| b.chord())
    }

    pub fn is_listening(&self, id: KeyBindingId) -> bool {
        self.bindings.get(id).is_some_and(|b| b.is_listening())
    }

    /// Snapshot of every binding as (name, chord)
    pub fn bindings(&self) -> Vec<(String, Option<Chord>)> {
        self.bindings.bindings()
    }

    /// Bind to a chord, leaving any previous hotkey.
    ///
    /// Cancels listening if the binding was listening; the change is then
    /// reported against the chord held before listening started. Change
    /// subscribers are notified when the chord actually changes; their
    /// failures come back as [`FlintError::Dispatch`] after the rebind has
    /// been applied.
    pub fn bind(&mut self, id: KeyBindingId, key: KeyCode, modifiers: Modifiers) -> Result<()> {
        let binding = self.bindings.require_mut(id)?;
        let previous = match binding.listening.take() {
            Some(state) => state.previous,
            None => binding.chord(),
        };

        self.detach(id);
        self.attach(id, (key, modifiers));

        let mut failures = Vec::new();
        if previous != Some((key, modifiers)) {
            self.notify_change(id, previous, &mut failures);
        }
        FlintError::from_failures(failures)
    }

    /// Drop the current chord but keep the binding. Cancels listening, and
    /// the chord held before listening is dropped too. Returns false if
    /// there was no chord to drop.
    pub fn unbind(&mut self, id: KeyBindingId) -> Result<bool> {
        let binding = self.bindings.require_mut(id)?;
        let previous = match binding.listening.take() {
            Some(state) => state.previous,
            None => binding.chord(),
        };
        if previous.is_none() {
            return Ok(false);
        }

        self.detach(id);
        let mut failures = Vec::new();
        self.notify_change(id, previous, &mut failures);
        FlintError::from_failures(failures)?;
        Ok(true)
    }

    /// Stop reacting to the current chord and capture the next non-modifier
    /// key-down instead. Returns `Ok(false)` if already listening.
    pub fn listen(&mut self, id: KeyBindingId) -> Result<bool> {
        let binding = self.bindings.require_mut(id)?;
        if binding.is_listening() {
            return Ok(false);
        }

        binding.listening = Some(ListenState {
            previous: binding.chord(),
        });
        log::debug!("Key binding '{}' listening", binding.name());
        self.detach(id);
        Ok(true)
    }

    /// Cancel listening and restore the chord held before [`listen`](Self::listen).
    pub fn stop_listening(&mut self, id: KeyBindingId) -> Result<()> {
        let binding = self.bindings.require_mut(id)?;
        let Some(state) = binding.listening.take() else {
            return Err(FlintError::InvalidState(format!(
                "key binding '{}' is not listening",
                binding.name()
            )));
        };

        log::debug!("Key binding '{}' stopped listening", binding.name());
        if let Some(chord) = state.previous {
            self.attach(id, chord);
        }
        Ok(())
    }

    /// Fire the hotkey matching this exact chord, if any, and every binding
    /// subscribed to it.
    pub(crate) fn trigger_hotkey(
        &mut self,
        key: KeyCode,
        modifiers: Modifiers,
        window: WindowHandle,
        repeat: bool,
        failures: &mut Vec<FlintError>,
    ) -> Option<HotKeyEvent> {
        let hotkey_id = self.hotkeys.find(key, modifiers)?;
        let hotkey = self.hotkeys.get_mut(hotkey_id)?;
        let bindings = &mut self.bindings;

        let mut fire_binding =
            |id: KeyBindingId, event: &HotKeyEvent, failures: &mut Vec<FlintError>| {
                if let Some(binding) = bindings.get_mut(id) {
                    binding.fire(event, failures);
                }
            };
        let event = hotkey.trigger(window, repeat, failures, &mut fire_binding);
        Some(event)
    }

    /// Hand a key-down to every listening binding. Modifier keys are ignored.
    /// Returns how many bindings captured the chord.
    pub(crate) fn capture(
        &mut self,
        key: KeyCode,
        modifiers: Modifiers,
        failures: &mut Vec<FlintError>,
    ) -> usize {
        if is_modifier_key(key) || !self.bindings.is_any_listening() {
            return 0;
        }

        let mut captured = Vec::new();
        for binding in self.bindings.iter_mut() {
            if let Some(state) = binding.listening.take() {
                log::debug!(
                    "Key binding '{}' captured {}",
                    binding.name(),
                    format_chord(key, modifiers)
                );
                captured.push((binding.id(), state.previous));
            }
        }

        for (id, previous) in &captured {
            self.attach(*id, (key, modifiers));
            self.notify_change(*id, *previous, failures);
        }
        captured.len()
    }

    fn attach(&mut self, id: KeyBindingId, chord: Chord) {
        let (key, modifiers) = chord;
        let hotkey_id = self.hotkeys.get_or_create(key, modifiers);
        let Some(hotkey) = self.hotkeys.get_mut(hotkey_id) else {
            return;
        };
        let token = hotkey.subscribe_binding(id);

        if let Some(binding) = self.bindings.get_mut(id) {
            binding.subscription = Some((hotkey_id, token));
            binding.set_chord(Some(chord));
            log::debug!(
                "Key binding '{}' bound to {}",
                binding.name(),
                format_chord(key, modifiers)
            );
        }
    }

    fn detach(&mut self, id: KeyBindingId) {
        let Some(binding) = self.bindings.get_mut(id) else {
            return;
        };
        binding.set_chord(None);
        if let Some((hotkey_id, token)) = binding.subscription.take() {
            if let Some(hotkey) = self.hotkeys.get_mut(hotkey_id) {
                hotkey.unsubscribe(token);
            }
        }
    }

    fn notify_change(
        &mut self,
        id: KeyBindingId,
        previous: Option<Chord>,
        failures: &mut Vec<FlintError>,
    ) {
        if let Some(binding) = self.bindings.get_mut(id) {
            binding.notify_change(previous, failures);
        }
    }
}
