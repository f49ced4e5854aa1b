//! Pointer input as delivered by the window server.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::model::{Point, WindowId};

bitflags! {
    /// Keyboard modifiers held during a pointer event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u16 {
        const SHIFT = 1 << 0;
        const LOCK = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1 = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD3 = 1 << 5;
        const MOD4 = 1 << 6;
        const MOD5 = 1 << 7;
    }
}

bitflags! {
    /// Pointer buttons held at the time of an event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ButtonMask: u16 {
        const BUTTON1 = 1 << 8;
        const BUTTON2 = 1 << 9;
        const BUTTON3 = 1 << 10;
        const BUTTON4 = 1 << 11;
        const BUTTON5 = 1 << 12;
    }
}

impl ButtonMask {
    pub fn for_button(button: u8) -> ButtonMask {
        match button {
            1 => ButtonMask::BUTTON1,
            2 => ButtonMask::BUTTON2,
            3 => ButtonMask::BUTTON3,
            4 => ButtonMask::BUTTON4,
            5 => ButtonMask::BUTTON5,
            _ => ButtonMask::empty(),
        }
    }

    pub fn holds(self, button: u8) -> bool {
        let mask = ButtonMask::for_button(button);
        !mask.is_empty() && self.contains(mask)
    }
}

/// Modifier names accepted in the configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModifierName {
    #[default]
    Shift,
    Control,
    Mod1,
    Mod4,
}

impl From<ModifierName> for Modifiers {
    fn from(name: ModifierName) -> Modifiers {
        match name {
            ModifierName::Shift => Modifiers::SHIFT,
            ModifierName::Control => Modifiers::CONTROL,
            ModifierName::Mod1 => Modifiers::MOD1,
            ModifierName::Mod4 => Modifiers::MOD4,
        }
    }
}

/// A pointer button or motion event.
///
/// `window` is the server handle the event was reported on (a frame, a client
/// or the root window); `root` is the pointer position in root coordinates.
/// For motion events `button` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub window: WindowId,
    pub root: Point,
    pub button: u8,
    pub modifiers: Modifiers,
    pub buttons: ButtonMask,
}

impl PointerEvent {
    pub fn press(window: WindowId, root: Point, button: u8) -> PointerEvent {
        PointerEvent {
            window,
            root,
            button,
            modifiers: Modifiers::empty(),
            buttons: ButtonMask::empty(),
        }
    }

    pub fn motion(window: WindowId, root: Point, buttons: ButtonMask) -> PointerEvent {
        PointerEvent {
            window,
            root,
            button: 0,
            modifiers: Modifiers::empty(),
            buttons,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> PointerEvent {
        self.modifiers = modifiers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_only_the_named_button() {
        let mask = ButtonMask::BUTTON1 | ButtonMask::BUTTON3;
        assert!(mask.holds(1));
        assert!(!mask.holds(2));
        assert!(mask.holds(3));
        assert!(!mask.holds(9));
    }
}
