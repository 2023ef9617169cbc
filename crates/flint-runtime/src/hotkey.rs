//! HotKey registry - interned (key, modifiers) chords with subscribers

use crate::input::{format_chord, KeyCode, Modifiers, WindowHandle};
use crate::keybinding::KeyBindingId;
use crate::observer::{Handler, SubscriptionToken};
use flint_core::{FlintError, Result};
use std::collections::HashMap;

/// Identity of an interned hotkey
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct HotKeyId(usize);

/// Passed to hotkey actions and subscribers when the chord is pressed
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HotKeyEvent {
    pub hotkey: HotKeyId,
    pub key: KeyCode,
    pub modifiers: Modifiers,
    pub window: WindowHandle,
    /// True when triggered by OS key auto-repeat
    pub repeat: bool,
}

enum Subscriber {
    Handler(Handler<HotKeyEvent>),
    /// A key binding currently bound to this hotkey
    Binding(KeyBindingId),
}

/// A (key, modifiers) chord. One instance exists per distinct chord.
pub struct HotKey {
    id: HotKeyId,
    key: KeyCode,
    modifiers: Modifiers,
    action: Option<Handler<HotKeyEvent>>,
    subscribers: Vec<(SubscriptionToken, Subscriber)>,
    trigger_count: u64,
}

impl HotKey {
    fn new(id: HotKeyId, key: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            id,
            key,
            modifiers,
            action: None,
            subscribers: Vec::new(),
            trigger_count: 0,
        }
    }

    pub fn id(&self) -> HotKeyId {
        self.id
    }

    pub fn key(&self) -> KeyCode {
        self.key
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// How many times this hotkey has fired
    pub fn trigger_count(&self) -> u64 {
        self.trigger_count
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Number of subscribers, bindings included
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Bindings subscribed to this hotkey, in subscription order
    pub fn bindings(&self) -> Vec<KeyBindingId> {
        self.subscribers
            .iter()
            .filter_map(|(_, s)| match s {
                Subscriber::Binding(id) => Some(*id),
                Subscriber::Handler(_) => None,
            })
            .collect()
    }

    /// Set the action that runs before any subscriber
    pub fn set_action(&mut self, action: impl FnMut(&HotKeyEvent) -> Result<()> + 'static) {
        self.action = Some(Box::new(action));
    }

    pub fn clear_action(&mut self) {
        self.action = None;
    }

    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&HotKeyEvent) -> Result<()> + 'static,
    ) -> SubscriptionToken {
        let token = SubscriptionToken::next();
        self.subscribers
            .push((token, Subscriber::Handler(Box::new(handler))));
        token
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(t, _)| *t != token);
        self.subscribers.len() != before
    }

    pub(crate) fn subscribe_binding(&mut self, binding: KeyBindingId) -> SubscriptionToken {
        let token = SubscriptionToken::next();
        self.subscribers.push((token, Subscriber::Binding(binding)));
        token
    }

    /// Run the action, then every subscriber in order.
    ///
    /// Binding subscribers are forwarded to `fire_binding` at their position
    /// in the list.
    pub(crate) fn trigger(
        &mut self,
        window: WindowHandle,
        repeat: bool,
        failures: &mut Vec<FlintError>,
        fire_binding: &mut dyn FnMut(KeyBindingId, &HotKeyEvent, &mut Vec<FlintError>),
    ) -> HotKeyEvent {
        self.trigger_count += 1;
        let event = HotKeyEvent {
            hotkey: self.id,
            key: self.key,
            modifiers: self.modifiers,
            window,
            repeat,
        };

        if let Some(action) = self.action.as_mut() {
            if let Err(err) = action(&event) {
                failures.push(err);
            }
        }

        for (_, subscriber) in &mut self.subscribers {
            match subscriber {
                Subscriber::Handler(handler) => {
                    if let Err(err) = handler(&event) {
                        failures.push(err);
                    }
                }
                Subscriber::Binding(binding) => fire_binding(*binding, &event, failures),
            }
        }

        event
    }
}

impl std::fmt::Debug for HotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotKey")
            .field("id", &self.id)
            .field("chord", &format_chord(self.key, self.modifiers))
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Interning store: one [`HotKey`] per distinct (key, modifiers)
#[derive(Default)]
pub struct HotKeyRegistry {
    hotkeys: Vec<HotKey>,
    index: HashMap<(KeyCode, Modifiers), HotKeyId>,
}

impl HotKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the hotkey for this chord, creating it on first request
    pub fn get_or_create(&mut self, key: KeyCode, modifiers: Modifiers) -> HotKeyId {
        if let Some(id) = self.index.get(&(key, modifiers)) {
            return *id;
        }

        let id = HotKeyId(self.hotkeys.len());
        self.hotkeys.push(HotKey::new(id, key, modifiers));
        self.index.insert((key, modifiers), id);
        log::debug!("Registered hotkey {}", format_chord(key, modifiers));
        id
    }

    /// Exact-match lookup; never creates
    pub fn find(&self, key: KeyCode, modifiers: Modifiers) -> Option<HotKeyId> {
        self.index.get(&(key, modifiers)).copied()
    }

    pub fn get(&self, id: HotKeyId) -> Option<&HotKey> {
        self.hotkeys.get(id.0)
    }

    pub fn get_mut(&mut self, id: HotKeyId) -> Option<&mut HotKey> {
        self.hotkeys.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HotKey> {
        self.hotkeys.iter()
    }

    pub fn len(&self) -> usize {
        self.hotkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotkeys.is_empty()
    }

    /// Shorthand for `get_or_create` followed by `set_action`
    pub fn register(
        &mut self,
        key: KeyCode,
        modifiers: Modifiers,
        action: impl FnMut(&HotKeyEvent) -> Result<()> + 'static,
    ) -> HotKeyId {
        let id = self.get_or_create(key, modifiers);
        self.hotkeys[id.0].set_action(action);
        id
    }
}
