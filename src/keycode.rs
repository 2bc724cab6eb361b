//! Virtual key codes and the modifier-aware [`KeyCode`] value.

use crate::modifiers::{
    MASK_ALL_MODIFIERS, MASK_ALT, MASK_ALTGR, MASK_CONTROL, MASK_SHIFT, ModifierState,
};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Windows virtual-key codes used by the interceptor.
pub mod vk {
    pub const BACK: u8 = 0x08;
    pub const TAB: u8 = 0x09;
    pub const RETURN: u8 = 0x0D;
    pub const SHIFT: u8 = 0x10;
    pub const CONTROL: u8 = 0x11;
    pub const MENU: u8 = 0x12;
    pub const PAUSE: u8 = 0x13;
    pub const CAPITAL: u8 = 0x14;
    pub const ESCAPE: u8 = 0x1B;
    pub const SPACE: u8 = 0x20;
    pub const PRIOR: u8 = 0x21;
    pub const NEXT: u8 = 0x22;
    pub const END: u8 = 0x23;
    pub const HOME: u8 = 0x24;
    pub const LEFT: u8 = 0x25;
    pub const UP: u8 = 0x26;
    pub const RIGHT: u8 = 0x27;
    pub const DOWN: u8 = 0x28;
    pub const SNAPSHOT: u8 = 0x2C;
    pub const INSERT: u8 = 0x2D;
    pub const DELETE: u8 = 0x2E;
    pub const KEY_0: u8 = 0x30;
    pub const KEY_9: u8 = 0x39;
    pub const KEY_A: u8 = 0x41;
    pub const KEY_E: u8 = 0x45;
    pub const KEY_Z: u8 = 0x5A;
    pub const LWIN: u8 = 0x5B;
    pub const RWIN: u8 = 0x5C;
    pub const APPS: u8 = 0x5D;
    pub const NUMPAD0: u8 = 0x60;
    pub const NUMPAD9: u8 = 0x69;
    pub const MULTIPLY: u8 = 0x6A;
    pub const ADD: u8 = 0x6B;
    pub const SUBTRACT: u8 = 0x6D;
    pub const DECIMAL: u8 = 0x6E;
    pub const DIVIDE: u8 = 0x6F;
    pub const F1: u8 = 0x70;
    pub const F24: u8 = 0x87;
    pub const NUMLOCK: u8 = 0x90;
    pub const SCROLL: u8 = 0x91;
    pub const LSHIFT: u8 = 0xA0;
    pub const RSHIFT: u8 = 0xA1;
    pub const LCONTROL: u8 = 0xA2;
    pub const RCONTROL: u8 = 0xA3;
    pub const LMENU: u8 = 0xA4;
    pub const RMENU: u8 = 0xA5;
    /// OEM key producing `^`/`´` style dead keys on many European layouts.
    pub const OEM_6: u8 = 0xDD;
    pub const OEM_7: u8 = 0xDE;
}

/// Mask selecting the virtual-key part of a [`KeyCode`].
pub const KEY_CODE_MASK: u32 = 0xFFFF;

/// A virtual-key code bitwise-combined with modifier flags.
///
/// The low 16 bits hold the virtual key, the modifier flags occupy the bits
/// described in [`crate::modifiers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// A key code without modifiers.
    pub const fn new(virtual_key: u32) -> Self {
        Self(virtual_key & KEY_CODE_MASK)
    }

    /// Combine a virtual key with the given modifier state.
    pub fn with_modifiers(virtual_key: u32, modifiers: ModifierState) -> Self {
        Self((virtual_key & KEY_CODE_MASK) | modifiers.flags())
    }

    /// The raw virtual-key code.
    pub fn virtual_key(self) -> u32 {
        self.0 & KEY_CODE_MASK
    }

    /// The modifier flags carried by this code.
    pub fn modifiers(self) -> ModifierState {
        ModifierState::from_flags(self.0 & MASK_ALL_MODIFIERS)
    }

    pub fn has_control(self) -> bool {
        self.0 & MASK_CONTROL != 0
    }

    pub fn has_shift(self) -> bool {
        self.0 & MASK_SHIFT != 0
    }

    pub fn has_alt(self) -> bool {
        self.0 & MASK_ALT != 0
    }

    pub fn has_altgr(self) -> bool {
        self.0 & MASK_ALTGR != 0
    }
}

impl From<u32> for KeyCode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<KeyCode> for u32 {
    fn from(code: KeyCode) -> Self {
        code.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mods = self.modifiers();
        if mods.control {
            f.write_str("Ctrl+")?;
        }
        if mods.shift {
            f.write_str("Shift+")?;
        }
        if mods.alt {
            f.write_str("Alt+")?;
        }
        if mods.altgr {
            f.write_str("AltGr+")?;
        }
        match key_name(self.virtual_key()) {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", KeyName(self.virtual_key())),
        }
    }
}

/// Fallback rendering for keys without a static name.
struct KeyName(u32);

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.0;
        match u8::try_from(code) {
            Ok(c @ (vk::KEY_0..=vk::KEY_9 | vk::KEY_A..=vk::KEY_Z)) => {
                write!(f, "{}", c as char)
            }
            Ok(c @ vk::NUMPAD0..=vk::NUMPAD9) => write!(f, "NumPad{}", c - vk::NUMPAD0),
            Ok(c @ vk::F1..=vk::F24) => write!(f, "F{}", c - vk::F1 + 1),
            _ => write!(f, "0x{:02X}", code),
        }
    }
}

/// Static names for non-alphanumeric keys.
pub fn key_name(virtual_key: u32) -> Option<&'static str> {
    let code = u8::try_from(virtual_key).ok()?;
    let name = match code {
        vk::BACK => "Back",
        vk::TAB => "Tab",
        vk::RETURN => "Enter",
        vk::SHIFT => "Shift",
        vk::CONTROL => "Control",
        vk::MENU => "Menu",
        vk::PAUSE => "Pause",
        vk::CAPITAL => "CapsLock",
        vk::ESCAPE => "Escape",
        vk::SPACE => "Space",
        vk::PRIOR => "PageUp",
        vk::NEXT => "PageDown",
        vk::END => "End",
        vk::HOME => "Home",
        vk::LEFT => "Left",
        vk::UP => "Up",
        vk::RIGHT => "Right",
        vk::DOWN => "Down",
        vk::SNAPSHOT => "PrintScreen",
        vk::INSERT => "Insert",
        vk::DELETE => "Delete",
        vk::LWIN => "LWin",
        vk::RWIN => "RWin",
        vk::APPS => "Apps",
        vk::MULTIPLY => "Multiply",
        vk::ADD => "Add",
        vk::SUBTRACT => "Subtract",
        vk::DECIMAL => "Decimal",
        vk::DIVIDE => "Divide",
        vk::NUMLOCK => "NumLock",
        vk::SCROLL => "Scroll",
        vk::LSHIFT => "LShiftKey",
        vk::RSHIFT => "RShiftKey",
        vk::LCONTROL => "LControlKey",
        vk::RCONTROL => "RControlKey",
        vk::LMENU => "LMenu",
        vk::RMENU => "RMenu",
        _ => return None,
    };
    Some(name)
}
