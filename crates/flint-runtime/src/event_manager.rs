//! Buffered event dispatch
//!
//! Raw window callbacks are converted into [`EngineEvent`]s and queued; nothing
//! is dispatched at callback time. [`EventManager::update`] optionally polls an
//! [`EventSource`], then drains the queue in FIFO order and raises each event
//! exactly once.

use crate::event::{EngineEvent, EventCategory, EventKind, EventType};
use crate::input::{ButtonAction, KeyAction, KeyCode, Modifiers, MouseButton, WindowHandle};
use crate::input_map::InputMap;
use crate::observer::{Handler, Observers, SubscriptionToken};
use flint_core::{FlintError, Result};
use std::collections::{HashMap, VecDeque};

/// Something that produces raw input when polled, usually the window layer
pub trait EventSource {
    /// Push any raw input received since the last poll into `events`
    fn poll(&mut self, events: &mut EventManager);
}

pub struct EventManager {
    queue: VecDeque<EngineEvent>,
    by_type: HashMap<EventType, Observers<EngineEvent>>,
    by_category: Vec<(SubscriptionToken, EventCategory, Handler<EngineEvent>)>,
    input_map: InputMap,
    cursors: HashMap<WindowHandle, (f64, f64)>,
    modifiers: HashMap<WindowHandle, Modifiers>,
    raised: u64,
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            by_type: HashMap::new(),
            by_category: Vec::new(),
            input_map: InputMap::new(),
            cursors: HashMap::new(),
            modifiers: HashMap::new(),
            raised: 0,
        }
    }

    pub fn input_map(&self) -> &InputMap {
        &self.input_map
    }

    pub fn input_map_mut(&mut self) -> &mut InputMap {
        &mut self.input_map
    }

    /// Queue an already-typed event
    pub fn push(&mut self, event: EngineEvent) {
        self.queue.push_back(event);
    }

    /// Number of queued events
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_events(&self) -> impl Iterator<Item = &EngineEvent> {
        self.queue.iter()
    }

    /// Drop queued events without raising them
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Total number of events raised since creation
    pub fn raised_count(&self) -> u64 {
        self.raised
    }

    /// Last known cursor position for a window
    pub fn cursor_position(&self, window: WindowHandle) -> Option<(f64, f64)> {
        self.cursors.get(&window).copied()
    }

    // Raw callbacks

    pub fn on_key(
        &mut self,
        window: WindowHandle,
        key: KeyCode,
        action: KeyAction,
        modifiers: Modifiers,
    ) {
        let kind = match action {
            KeyAction::Press => EventKind::KeyDown { key, modifiers },
            KeyAction::Repeat => EventKind::KeyRepeat { key, modifiers },
            KeyAction::Release => EventKind::KeyUp { key, modifiers },
        };
        self.push(EngineEvent::new(window, kind));
    }

    /// Mouse button press or release at the window's last cursor position
    pub fn on_mouse_button(
        &mut self,
        window: WindowHandle,
        button: MouseButton,
        action: ButtonAction,
        modifiers: Modifiers,
    ) {
        let position = self.cursor_position(window).unwrap_or((0.0, 0.0));
        let kind = match action {
            ButtonAction::Press => EventKind::MouseButtonDown {
                button,
                modifiers,
                position,
            },
            ButtonAction::Release => EventKind::MouseButtonUp {
                button,
                modifiers,
                position,
            },
        };
        self.push(EngineEvent::new(window, kind));
    }

    /// Cursor moved. The delta is relative to the previous position reported
    /// for the same window, and zero for the first one.
    pub fn on_cursor_position(&mut self, window: WindowHandle, x: f64, y: f64) {
        let previous = self.cursors.insert(window, (x, y)).unwrap_or((x, y));
        let delta = (x - previous.0, y - previous.1);
        self.push(EngineEvent::new(
            window,
            EventKind::MouseMoved {
                position: (x, y),
                delta,
            },
        ));
    }

    pub fn on_scroll(&mut self, window: WindowHandle, dx: f64, dy: f64) {
        self.push(EngineEvent::new(
            window,
            EventKind::MouseScrolled { offset: (dx, dy) },
        ));
    }

    pub fn on_cursor_enter(&mut self, window: WindowHandle, entered: bool) {
        let kind = if entered {
            EventKind::CursorEntered
        } else {
            EventKind::CursorLeft
        };
        self.push(EngineEvent::new(window, kind));
    }

    pub fn on_resize(&mut self, window: WindowHandle, width: u32, height: u32) {
        self.push(EngineEvent::new(window, EventKind::Resized { width, height }));
    }

    pub fn on_focus(&mut self, window: WindowHandle, focused: bool) {
        let kind = if focused {
            EventKind::Focused
        } else {
            EventKind::Unfocused
        };
        self.push(EngineEvent::new(window, kind));
    }

    pub fn on_close_requested(&mut self, window: WindowHandle) {
        self.push(EngineEvent::new(window, EventKind::CloseRequested));
    }

    pub fn on_error(&mut self, window: WindowHandle, message: impl Into<String>) {
        self.push(EngineEvent::new(
            window,
            EventKind::Error {
                message: message.into(),
            },
        ));
    }

    /// Translate a winit window event. Returns false for events with no
    /// engine counterpart.
    pub fn on_window_event(
        &mut self,
        window: WindowHandle,
        event: &winit::event::WindowEvent,
    ) -> bool {
        use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
        use winit::keyboard::PhysicalKey;

        let modifiers = self.modifiers.get(&window).copied().unwrap_or_default();
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return false;
                };
                let action = match (event.state, event.repeat) {
                    (ElementState::Pressed, false) => KeyAction::Press,
                    (ElementState::Pressed, true) => KeyAction::Repeat,
                    (ElementState::Released, _) => KeyAction::Release,
                };
                self.on_key(window, key, action, modifiers);
            }
            WindowEvent::ModifiersChanged(mods) => {
                self.modifiers
                    .insert(window, Modifiers::from_winit(mods.state()));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let action = match state {
                    ElementState::Pressed => ButtonAction::Press,
                    ElementState::Released => ButtonAction::Release,
                };
                self.on_mouse_button(window, *button, action, modifiers);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_cursor_position(window, position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (dx, dy) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x as f64, *y as f64),
                    MouseScrollDelta::PixelDelta(p) => (p.x, p.y),
                };
                self.on_scroll(window, dx, dy);
            }
            WindowEvent::CursorEntered { .. } => self.on_cursor_enter(window, true),
            WindowEvent::CursorLeft { .. } => self.on_cursor_enter(window, false),
            WindowEvent::Resized(size) => self.on_resize(window, size.width, size.height),
            WindowEvent::Focused(focused) => self.on_focus(window, *focused),
            WindowEvent::CloseRequested => self.on_close_requested(window),
            _ => return false,
        }
        true
    }

    // Subscriptions

    /// Subscribe to one event type
    pub fn subscribe(
        &mut self,
        event_type: EventType,
        handler: impl FnMut(&EngineEvent) -> Result<()> + 'static,
    ) -> SubscriptionToken {
        self.by_type.entry(event_type).or_default().subscribe(handler)
    }

    /// Subscribe to every event belonging to any of the given categories
    pub fn subscribe_category(
        &mut self,
        category: EventCategory,
        handler: impl FnMut(&EngineEvent) -> Result<()> + 'static,
    ) -> SubscriptionToken {
        let token = SubscriptionToken::next();
        self.by_category.push((token, category, Box::new(handler)));
        token
    }

    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        if self.by_type.values_mut().any(|obs| obs.unsubscribe(token)) {
            return true;
        }
        let before = self.by_category.len();
        self.by_category.retain(|(t, _, _)| *t != token);
        self.by_category.len() != before
    }

    /// Poll `source` if given, then raise every queued event in order and
    /// empty the queue.
    ///
    /// Returns the number of events raised. Every subscriber runs even when
    /// an earlier one fails; failures are returned together as
    /// [`FlintError::Dispatch`] once the whole queue has been drained.
    pub fn update(&mut self, source: Option<&mut dyn EventSource>) -> Result<usize> {
        if let Some(source) = source {
            source.poll(self);
        }

        let events: Vec<EngineEvent> = self.queue.drain(..).collect();
        let mut failures = Vec::new();
        for event in &events {
            self.raise(event, &mut failures);
        }

        if !events.is_empty() {
            log::trace!("Raised {} events", events.len());
        }
        for failure in &failures {
            log::warn!("Event handler failed: {}", failure);
        }
        FlintError::from_failures(failures)?;
        Ok(events.len())
    }

    fn raise(&mut self, event: &EngineEvent, failures: &mut Vec<FlintError>) {
        self.raised += 1;

        let Some((key, modifiers, repeat)) = event.key_down() else {
            self.notify(event.event_type(), event, failures);
            return;
        };

        // Key-down and key-repeat share the key-down surface
        if repeat {
            self.notify_type(EventType::KeyRepeat, event, failures);
        }
        self.notify_type(EventType::KeyDown, event, failures);
        self.notify_categories(event, failures);

        if let Some(hotkey) =
            self.input_map
                .trigger_hotkey(key, modifiers, event.window, repeat, failures)
        {
            let triggered = EngineEvent::new(
                event.window,
                EventKind::HotKey {
                    hotkey: hotkey.hotkey,
                    key,
                    modifiers,
                    repeat,
                },
            );
            self.notify(EventType::HotKeyTriggered, &triggered, failures);
        }

        if !repeat {
            self.input_map.capture(key, modifiers, failures);
        }
    }

    fn notify(&mut self, event_type: EventType, event: &EngineEvent, failures: &mut Vec<FlintError>) {
        self.notify_type(event_type, event, failures);
        self.notify_categories(event, failures);
    }

    fn notify_type(
        &mut self,
        event_type: EventType,
        event: &EngineEvent,
        failures: &mut Vec<FlintError>,
    ) {
        if let Some(observers) = self.by_type.get_mut(&event_type) {
            observers.notify(event, failures);
        }
    }

    fn notify_categories(&mut self, event: &EngineEvent, failures: &mut Vec<FlintError>) {
        let categories = event.categories();
        for (_, category, handler) in &mut self.by_category {
            if categories.intersects(*category) {
                if let Err(err) = handler(event) {
                    failures.push(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const WIN: WindowHandle = WindowHandle(1);

    fn recorder(
        events: &mut EventManager,
        event_type: EventType,
    ) -> Rc<RefCell<Vec<EngineEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        events.subscribe(event_type, move |e| {
            s.borrow_mut().push(e.clone());
            Ok(())
        });
        seen
    }

    #[test]
    fn test_callbacks_buffer_until_update() {
        let mut events = EventManager::new();
        let seen = recorder(&mut events, EventType::KeyUp);

        events.on_key(WIN, KeyCode::KeyW, KeyAction::Release, Modifiers::NONE);
        assert_eq!(events.pending(), 1);
        assert!(seen.borrow().is_empty());

        assert_eq!(events.update(None).unwrap(), 1);
        assert_eq!(events.pending(), 0);
        assert_eq!(seen.borrow().len(), 1);

        // Never raised twice
        assert_eq!(events.update(None).unwrap(), 0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_fifo_order() {
        let mut events = EventManager::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        events.subscribe_category(EventCategory::WINDOW, move |e| {
            s.borrow_mut().push(e.event_type());
            Ok(())
        });

        events.on_resize(WIN, 640, 480);
        events.on_focus(WIN, true);
        events.on_close_requested(WIN);
        events.update(None).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                EventType::WindowResized,
                EventType::WindowFocused,
                EventType::WindowCloseRequested
            ]
        );
    }

    #[test]
    fn test_repeat_raised_through_key_down() {
        let mut events = EventManager::new();
        let downs = recorder(&mut events, EventType::KeyDown);
        let repeats = recorder(&mut events, EventType::KeyRepeat);

        events.on_key(WIN, KeyCode::KeyD, KeyAction::Press, Modifiers::NONE);
        events.on_key(WIN, KeyCode::KeyD, KeyAction::Repeat, Modifiers::NONE);
        events.update(None).unwrap();

        assert_eq!(downs.borrow().len(), 2);
        assert_eq!(repeats.borrow().len(), 1);
        assert_eq!(repeats.borrow()[0].event_type(), EventType::KeyRepeat);
    }

    #[test]
    fn test_cursor_delta_per_window() {
        let mut events = EventManager::new();
        let seen = recorder(&mut events, EventType::MouseMoved);

        events.on_cursor_position(WIN, 10.0, 10.0);
        events.on_cursor_position(WindowHandle(2), 100.0, 100.0);
        events.on_cursor_position(WIN, 15.0, 8.0);
        events.update(None).unwrap();

        let seen = seen.borrow();
        let deltas: Vec<_> = seen
            .iter()
            .map(|e| match e.kind {
                EventKind::MouseMoved { delta, .. } => delta,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(deltas, vec![(0.0, 0.0), (0.0, 0.0), (5.0, -2.0)]);
    }

    #[test]
    fn test_mouse_button_uses_last_cursor() {
        let mut events = EventManager::new();
        let seen = recorder(&mut events, EventType::MouseButtonDown);

        events.on_cursor_position(WIN, 3.0, 4.0);
        events.on_mouse_button(WIN, MouseButton::Left, ButtonAction::Press, Modifiers::SHIFT);
        events.update(None).unwrap();

        assert_eq!(
            seen.borrow()[0].kind,
            EventKind::MouseButtonDown {
                button: MouseButton::Left,
                modifiers: Modifiers::SHIFT,
                position: (3.0, 4.0),
            }
        );
    }

    #[test]
    fn test_failing_subscriber_does_not_block_others() {
        let mut events = EventManager::new();
        events.subscribe(EventType::WindowFocused, |_| {
            Err(FlintError::HandlerError("focus handler".into()))
        });
        let seen = recorder(&mut events, EventType::WindowFocused);
        let later = recorder(&mut events, EventType::WindowUnfocused);

        events.on_focus(WIN, true);
        events.on_focus(WIN, false);

        match events.update(None) {
            Err(FlintError::Dispatch(failures)) => assert_eq!(failures.len(), 1),
            other => panic!("expected dispatch error, got {other:?}"),
        }
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(later.borrow().len(), 1);
        assert_eq!(events.pending(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let mut events = EventManager::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let token = events.subscribe(EventType::WindowCloseRequested, move |_| {
            *h.borrow_mut() += 1;
            Ok(())
        });
        let category = events.subscribe_category(EventCategory::WINDOW, |_| Ok(()));

        assert!(events.unsubscribe(token));
        assert!(events.unsubscribe(category));
        assert!(!events.unsubscribe(token));

        events.on_close_requested(WIN);
        events.update(None).unwrap();
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_hotkey_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventManager::new();

        let o = order.clone();
        events.subscribe(EventType::KeyDown, move |_| {
            o.borrow_mut().push("key_down");
            Ok(())
        });
        let o = order.clone();
        events.subscribe_category(EventCategory::KEYBOARD, move |e| {
            if e.event_type() == EventType::KeyDown {
                o.borrow_mut().push("category");
            }
            Ok(())
        });
        let o = order.clone();
        events.subscribe(EventType::HotKeyTriggered, move |_| {
            o.borrow_mut().push("hotkey_event");
            Ok(())
        });

        let o = order.clone();
        let hotkey = events.input_map_mut().hotkeys_mut().register(
            KeyCode::KeyS,
            Modifiers::CONTROL,
            move |_| {
                o.borrow_mut().push("action");
                Ok(())
            },
        );
        let o = order.clone();
        events
            .input_map_mut()
            .hotkeys_mut()
            .get_mut(hotkey)
            .unwrap()
            .subscribe(move |_| {
                o.borrow_mut().push("subscriber");
                Ok(())
            });

        events.on_key(WIN, KeyCode::KeyS, KeyAction::Press, Modifiers::CONTROL);
        events.update(None).unwrap();

        assert_eq!(
            *order.borrow(),
            vec!["key_down", "category", "action", "subscriber", "hotkey_event"]
        );
    }

    #[test]
    fn test_hotkey_requires_exact_modifiers() {
        let mut events = EventManager::new();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        events
            .input_map_mut()
            .hotkeys_mut()
            .register(KeyCode::KeyS, Modifiers::CONTROL, move |_| {
                *h.borrow_mut() += 1;
                Ok(())
            });

        events.on_key(WIN, KeyCode::KeyS, KeyAction::Press, Modifiers::CONTROL | Modifiers::SHIFT);
        events.on_key(WIN, KeyCode::KeyS, KeyAction::Press, Modifiers::NONE);
        events.on_key(WIN, KeyCode::KeyS, KeyAction::Press, Modifiers::CONTROL);
        events.on_key(WIN, KeyCode::KeyS, KeyAction::Repeat, Modifiers::CONTROL);
        events.on_key(WIN, KeyCode::KeyS, KeyAction::Release, Modifiers::CONTROL);
        events.update(None).unwrap();

        // Press and auto-repeat both fire; release and other chords do not
        assert_eq!(*hits.borrow(), 2);
    }

    #[test]
    fn test_listen_captures_through_update() {
        let mut events = EventManager::new();
        let quit = events.input_map_mut().add("quit").unwrap();
        events.input_map_mut().listen(quit).unwrap();

        events.on_key(WIN, KeyCode::ShiftLeft, KeyAction::Press, Modifiers::SHIFT);
        events.on_key(WIN, KeyCode::KeyQ, KeyAction::Repeat, Modifiers::SHIFT);
        events.update(None).unwrap();
        assert!(events.input_map().is_listening(quit));

        events.on_key(WIN, KeyCode::KeyQ, KeyAction::Press, Modifiers::SHIFT);
        events.update(None).unwrap();
        assert_eq!(
            events.input_map().chord(quit),
            Some((KeyCode::KeyQ, Modifiers::SHIFT))
        );
    }

    struct Scripted(Vec<(KeyCode, KeyAction)>);

    impl EventSource for Scripted {
        fn poll(&mut self, events: &mut EventManager) {
            for (key, action) in self.0.drain(..) {
                events.on_key(WIN, key, action, Modifiers::NONE);
            }
        }
    }

    #[test]
    fn test_update_polls_source_first() {
        let mut events = EventManager::new();
        let seen = recorder(&mut events, EventType::KeyDown);
        events.on_key(WIN, KeyCode::Digit1, KeyAction::Press, Modifiers::NONE);

        let mut source = Scripted(vec![(KeyCode::Digit2, KeyAction::Press)]);
        assert_eq!(events.update(Some(&mut source as &mut dyn EventSource)).unwrap(), 2);

        let keys: Vec<_> = seen.borrow().iter().filter_map(|e| e.key_down()).map(|k| k.0).collect();
        assert_eq!(keys, vec![KeyCode::Digit1, KeyCode::Digit2]);
    }

    #[test]
    fn test_winit_adapter() {
        use winit::dpi::PhysicalSize;
        use winit::event::WindowEvent;

        let mut events = EventManager::new();
        assert!(events.on_window_event(WIN, &WindowEvent::Resized(PhysicalSize::new(800, 600))));
        assert!(events.on_window_event(WIN, &WindowEvent::Focused(false)));
        assert!(events.on_window_event(WIN, &WindowEvent::CloseRequested));
        assert!(!events.on_window_event(WIN, &WindowEvent::Destroyed));

        let kinds: Vec<_> = events.pending_events().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::Resized {
                    width: 800,
                    height: 600
                },
                EventKind::Unfocused,
                EventKind::CloseRequested,
            ]
        );
    }
}
