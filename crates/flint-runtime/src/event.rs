//! Typed engine events

use crate::hotkey::HotKeyId;
use crate::input::{KeyCode, Modifiers, MouseButton, WindowHandle};
use std::fmt;
use std::ops::BitOr;

/// Bitset of broad event categories, used to filter subscriptions
#[derive(Clone, Copy, Default, Hash, Eq, PartialEq)]
pub struct EventCategory(u16);

impl EventCategory {
    pub const NONE: Self = Self(0);
    pub const WINDOW: Self = Self(1 << 0);
    pub const INPUT: Self = Self(1 << 1);
    pub const KEYBOARD: Self = Self(1 << 2);
    pub const MOUSE: Self = Self(1 << 3);
    pub const BUTTON: Self = Self(1 << 4);
    pub const POSITION: Self = Self(1 << 5);
    pub const HOVER: Self = Self(1 << 6);
    pub const RESIZE: Self = Self(1 << 7);
    pub const FOCUS: Self = Self(1 << 8);
    pub const SCROLL: Self = Self(1 << 9);
    pub const ERROR: Self = Self(1 << 10);
    pub const HOTKEY: Self = Self(1 << 11);

    pub fn bits(&self) -> u16 {
        self.0
    }

    /// True if every flag in `other` is set
    pub fn contains(&self, other: EventCategory) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set
    pub fn intersects(&self, other: EventCategory) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for EventCategory {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl fmt::Debug for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventCategory({:#06x})", self.0)
    }
}

/// The specific type tag of an event
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum EventType {
    KeyDown,
    KeyRepeat,
    KeyUp,
    MouseButtonDown,
    MouseButtonUp,
    MouseMoved,
    MouseScrolled,
    CursorEntered,
    CursorLeft,
    WindowResized,
    WindowFocused,
    WindowUnfocused,
    WindowCloseRequested,
    WindowError,
    HotKeyTriggered,
}

impl EventType {
    /// Categories every event of this type belongs to
    pub fn categories(self) -> EventCategory {
        use EventCategory as C;
        match self {
            EventType::KeyDown | EventType::KeyRepeat | EventType::KeyUp => C::INPUT | C::KEYBOARD,
            EventType::MouseButtonDown | EventType::MouseButtonUp => {
                C::INPUT | C::MOUSE | C::BUTTON
            }
            EventType::MouseMoved => C::INPUT | C::MOUSE | C::POSITION,
            EventType::MouseScrolled => C::INPUT | C::MOUSE | C::SCROLL,
            EventType::CursorEntered | EventType::CursorLeft => C::WINDOW | C::MOUSE | C::HOVER,
            EventType::WindowResized => C::WINDOW | C::RESIZE,
            EventType::WindowFocused | EventType::WindowUnfocused => C::WINDOW | C::FOCUS,
            EventType::WindowCloseRequested => C::WINDOW,
            EventType::WindowError => C::WINDOW | C::ERROR,
            EventType::HotKeyTriggered => C::INPUT | C::KEYBOARD | C::HOTKEY,
        }
    }
}

/// Type-specific event payload
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    KeyDown {
        key: KeyCode,
        modifiers: Modifiers,
    },
    KeyRepeat {
        key: KeyCode,
        modifiers: Modifiers,
    },
    KeyUp {
        key: KeyCode,
        modifiers: Modifiers,
    },
    MouseButtonDown {
        button: MouseButton,
        modifiers: Modifiers,
        position: (f64, f64),
    },
    MouseButtonUp {
        button: MouseButton,
        modifiers: Modifiers,
        position: (f64, f64),
    },
    MouseMoved {
        position: (f64, f64),
        delta: (f64, f64),
    },
    MouseScrolled {
        offset: (f64, f64),
    },
    CursorEntered,
    CursorLeft,
    Resized {
        width: u32,
        height: u32,
    },
    Focused,
    Unfocused,
    CloseRequested,
    Error {
        message: String,
    },
    HotKey {
        hotkey: HotKeyId,
        key: KeyCode,
        modifiers: Modifiers,
        repeat: bool,
    },
}

/// An event bound to the window it originated from
#[derive(Clone, Debug, PartialEq)]
pub struct EngineEvent {
    pub window: WindowHandle,
    pub kind: EventKind,
}

impl EngineEvent {
    pub fn new(window: WindowHandle, kind: EventKind) -> Self {
        Self { window, kind }
    }

    pub fn event_type(&self) -> EventType {
        match self.kind {
            EventKind::KeyDown { .. } => EventType::KeyDown,
            EventKind::KeyRepeat { .. } => EventType::KeyRepeat,
            EventKind::KeyUp { .. } => EventType::KeyUp,
            EventKind::MouseButtonDown { .. } => EventType::MouseButtonDown,
            EventKind::MouseButtonUp { .. } => EventType::MouseButtonUp,
            EventKind::MouseMoved { .. } => EventType::MouseMoved,
            EventKind::MouseScrolled { .. } => EventType::MouseScrolled,
            EventKind::CursorEntered => EventType::CursorEntered,
            EventKind::CursorLeft => EventType::CursorLeft,
            EventKind::Resized { .. } => EventType::WindowResized,
            EventKind::Focused => EventType::WindowFocused,
            EventKind::Unfocused => EventType::WindowUnfocused,
            EventKind::CloseRequested => EventType::WindowCloseRequested,
            EventKind::Error { .. } => EventType::WindowError,
            EventKind::HotKey { .. } => EventType::HotKeyTriggered,
        }
    }

    pub fn categories(&self) -> EventCategory {
        self.event_type().categories()
    }

    /// True if the event belongs to any of the given categories
    pub fn is_in_category(&self, category: EventCategory) -> bool {
        self.categories().intersects(category)
    }

    /// Key and modifiers for key-down and key-repeat events
    pub fn key_down(&self) -> Option<(KeyCode, Modifiers, bool)> {
        match self.kind {
            EventKind::KeyDown { key, modifiers } => Some((key, modifiers, false)),
            EventKind::KeyRepeat { key, modifiers } => Some((key, modifiers, true)),
            _ => None,
        }
    }
}
