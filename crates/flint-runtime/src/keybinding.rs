//! Named, rebindable key bindings
//!
//! A [`KeyBinding`] is an indirection over at most one [`HotKey`](crate::HotKey)
//! at a time. Binding, unbinding and listening need the hotkey registry, so
//! those operations live on [`InputMap`](crate::InputMap); this module owns
//! the bindings themselves and the name index.

use crate::hotkey::{HotKeyEvent, HotKeyId};
use crate::input::{format_chord, KeyCode, Modifiers};
use crate::observer::{Handler, Observers, SubscriptionToken};
use flint_core::{FlintError, Result};
use std::collections::HashMap;

/// Identity of a key binding
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct KeyBindingId(usize);

/// A (key, modifiers) pair
pub type Chord = (KeyCode, Modifiers);

/// Raised when a binding's hotkey fires
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyBindingEvent {
    pub binding: KeyBindingId,
    pub hotkey: HotKeyEvent,
}

/// Raised when a binding is bound to a different chord
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BindingChange {
    pub binding: KeyBindingId,
    pub previous: Option<Chord>,
    pub current: Option<Chord>,
}

#[derive(Debug)]
pub(crate) struct ListenState {
    /// Chord to restore if listening is cancelled
    pub(crate) previous: Option<Chord>,
}

pub struct KeyBinding {
    id: KeyBindingId,
    name: String,
    chord: Option<Chord>,
    pub(crate) subscription: Option<(HotKeyId, SubscriptionToken)>,
    pub(crate) listening: Option<ListenState>,
    handler: Option<Handler<KeyBindingEvent>>,
    observers: Observers<KeyBindingEvent>,
    changes: Observers<BindingChange>,
    trigger_count: u64,
}

impl KeyBinding {
    fn new(id: KeyBindingId, name: String) -> Self {
        Self {
            id,
            name,
            chord: None,
            subscription: None,
            listening: None,
            handler: None,
            observers: Observers::new(),
            changes: Observers::new(),
            trigger_count: 0,
        }
    }

    pub fn id(&self) -> KeyBindingId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound chord, or `None` when unbound or listening
    pub fn chord(&self) -> Option<Chord> {
        self.chord
    }

    pub fn hotkey(&self) -> Option<HotKeyId> {
        self.subscription.map(|(hotkey, _)| hotkey)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.is_some()
    }

    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }

    pub fn set_handler(&mut self, handler: impl FnMut(&KeyBindingEvent) -> Result<()> + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Subscribe to trigger notifications
    pub fn subscribe(
        &mut self,
        f: impl FnMut(&KeyBindingEvent) -> Result<()> + 'static,
    ) -> SubscriptionToken {
        self.observers.subscribe(f)
    }

    /// Subscribe to rebind notifications
    pub fn subscribe_changes(
        &mut self,
        f: impl FnMut(&BindingChange) -> Result<()> + 'static,
    ) -> SubscriptionToken {
        self.changes.subscribe(f)
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.observers.unsubscribe(token) || self.changes.unsubscribe(token)
    }

    pub(crate) fn set_chord(&mut self, chord: Option<Chord>) {
        self.chord = chord;
    }

    pub(crate) fn fire(&mut self, hotkey: &HotKeyEvent, failures: &mut Vec<FlintError>) {
        self.trigger_count += 1;
        let event = KeyBindingEvent {
            binding: self.id,
            hotkey: *hotkey,
        };

        if let Some(handler) = self.handler.as_mut() {
            if let Err(err) = handler(&event) {
                failures.push(err);
            }
        }
        self.observers.notify(&event, failures);
    }

    pub(crate) fn notify_change(
        &mut self,
        previous: Option<Chord>,
        failures: &mut Vec<FlintError>,
    ) {
        let change = BindingChange {
            binding: self.id,
            previous,
            current: self.chord,
        };
        self.changes.notify(&change, failures);
    }
}

impl std::fmt::Debug for KeyBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyBinding")
            .field("name", &self.name)
            .field("chord", &self.chord.map(|(k, m)| format_chord(k, m)))
            .field("listening", &self.is_listening())
            .finish()
    }
}

/// Owns every [`KeyBinding`], indexed by name
#[derive(Default)]
pub struct KeyBindingManager {
    bindings: Vec<KeyBinding>,
    by_name: HashMap<String, KeyBindingId>,
}

impl KeyBindingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a binding. Fails if the name is taken.
    pub fn add(&mut self, name: impl Into<String>) -> Result<KeyBindingId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(FlintError::DuplicateKeyBinding(name));
        }
        Ok(self.insert(name))
    }

    /// Create a binding named after the handler's type. Fails if that handler
    /// type already has a binding.
    pub fn add_with_handler<F>(&mut self, handler: F) -> Result<KeyBindingId>
    where
        F: FnMut(&KeyBindingEvent) -> Result<()> + 'static,
    {
        let id = self.add(std::any::type_name::<F>())?;
        self.bindings[id.0].set_handler(handler);
        Ok(id)
    }

    /// Existing binding with this name, or a new unbound one
    pub fn get_or_create(&mut self, name: &str) -> KeyBindingId {
        match self.by_name.get(name) {
            Some(id) => *id,
            None => self.insert(name.to_string()),
        }
    }

    /// Existing binding for this handler type, or a new one using `handler`.
    /// An existing binding keeps its original handler.
    pub fn get_or_create_with_handler<F>(&mut self, handler: F) -> KeyBindingId
    where
        F: FnMut(&KeyBindingEvent) -> Result<()> + 'static,
    {
        let name = std::any::type_name::<F>();
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = self.insert(name.to_string());
        self.bindings[id.0].set_handler(handler);
        id
    }

    pub fn find(&self, name: &str) -> Option<KeyBindingId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: KeyBindingId) -> Option<&KeyBinding> {
        self.bindings.get(id.0)
    }

    pub fn get_mut(&mut self, id: KeyBindingId) -> Option<&mut KeyBinding> {
        self.bindings.get_mut(id.0)
    }

    pub(crate) fn require_mut(&mut self, id: KeyBindingId) -> Result<&mut KeyBinding> {
        self.bindings
            .get_mut(id.0)
            .ok_or_else(|| FlintError::KeyBindingNotFound(format!("{id:?}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyBinding> {
        self.bindings.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut KeyBinding> {
        self.bindings.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Snapshot of every binding as (name, chord)
    pub fn bindings(&self) -> Vec<(String, Option<Chord>)> {
        self.bindings
            .iter()
            .map(|b| (b.name.clone(), b.chord))
            .collect()
    }

    pub fn is_any_listening(&self) -> bool {
        self.bindings.iter().any(KeyBinding::is_listening)
    }

    fn insert(&mut self, name: String) -> KeyBindingId {
        let id = KeyBindingId(self.bindings.len());
        log::debug!("Created key binding '{}'", name);
        self.by_name.insert(name.clone(), id);
        self.bindings.push(KeyBinding::new(id, name));
        id
    }
}
