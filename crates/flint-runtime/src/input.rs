//! Raw input primitives shared by events, hotkeys and bindings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Opaque handle identifying the window an event came from
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Set of held modifier keys.
///
/// Hotkeys compare modifier sets for exact equality: Ctrl+S does not match
/// Ctrl+Shift+S.
#[derive(Clone, Copy, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1 << 0);
    pub const CONTROL: Self = Self(1 << 1);
    pub const ALT: Self = Self(1 << 2);
    pub const SUPER: Self = Self(1 << 3);

    const NAMED: [(Self, &'static str); 4] = [
        (Self::SHIFT, "shift"),
        (Self::CONTROL, "ctrl"),
        (Self::ALT, "alt"),
        (Self::SUPER, "super"),
    ];

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }

    /// Convert winit's modifier state
    pub fn from_winit(state: winit::keyboard::ModifiersState) -> Self {
        let mut mods = Self::NONE;
        if state.shift_key() {
            mods |= Self::SHIFT;
        }
        if state.control_key() {
            mods |= Self::CONTROL;
        }
        if state.alt_key() {
            mods |= Self::ALT;
        }
        if state.super_key() {
            mods |= Self::SUPER;
        }
        mods
    }

    /// Lowercase names of the set modifiers, in a fixed order
    pub fn names(&self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Parse one modifier name (case-insensitive; "control" and "cmd" accepted)
    pub fn parse_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "shift" => Some(Self::SHIFT),
            "ctrl" | "control" => Some(Self::CONTROL),
            "alt" | "option" => Some(Self::ALT),
            "super" | "cmd" | "meta" | "win" => Some(Self::SUPER),
            _ => None,
        }
    }
}

impl BitOr for Modifiers {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({})", self)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        write!(f, "{}", self.names().join("+"))
    }
}

impl TryFrom<Vec<String>> for Modifiers {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let mut mods = Self::NONE;
        for name in &names {
            mods |= Self::parse_name(name).ok_or_else(|| format!("unknown modifier '{name}'"))?;
        }
        Ok(mods)
    }
}

impl From<Modifiers> for Vec<String> {
    fn from(mods: Modifiers) -> Self {
        mods.names().into_iter().map(String::from).collect()
    }
}

/// What happened to a key
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum KeyAction {
    Press,
    Release,
    /// OS auto-repeat while the key is held
    Repeat,
}

/// What happened to a mouse button
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ButtonAction {
    Press,
    Release,
}

/// The modifier flag a key contributes, if it is a modifier key
pub fn modifier_for_key(key: KeyCode) -> Option<Modifiers> {
    match key {
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Modifiers::SHIFT),
        KeyCode::ControlLeft | KeyCode::ControlRight => Some(Modifiers::CONTROL),
        KeyCode::AltLeft | KeyCode::AltRight => Some(Modifiers::ALT),
        KeyCode::SuperLeft | KeyCode::SuperRight | KeyCode::Meta | KeyCode::Hyper => {
            Some(Modifiers::SUPER)
        }
        _ => None,
    }
}

/// Whether a key only modifies other keys (never bound on its own)
pub fn is_modifier_key(key: KeyCode) -> bool {
    modifier_for_key(key).is_some()
}

/// Human-readable chord, e.g. `ctrl+shift+KeyS`
pub fn format_chord(key: KeyCode, modifiers: Modifiers) -> String {
    if modifiers.is_empty() {
        format!("{key:?}")
    } else {
        format!("{modifiers}+{key:?}")
    }
}
