//! Modifier reader.
//!
//! Modifiers are sampled from the live key state every time an event is
//! processed; nothing is cached between events.

use crate::backend::KeyStateSource;
use crate::keycode::vk;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Modifier masks, laid out above the 16 virtual-key bits of a key code.
/// Shift key mask.
pub const MASK_SHIFT: u32 = 1 << 16;
/// Control key mask.
pub const MASK_CONTROL: u32 = 1 << 17;
/// Alt key mask.
pub const MASK_ALT: u32 = 1 << 18;
/// AltGr combination mask (right Alt together with left Control).
pub const MASK_ALTGR: u32 = 1 << 19;

/// All modifier masks combined.
pub const MASK_ALL_MODIFIERS: u32 = MASK_SHIFT | MASK_CONTROL | MASK_ALT | MASK_ALTGR;

/// Modifier keys held at the instant an event was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModifierState {
    pub control: bool,
    pub shift: bool,
    pub alt: bool,
    pub altgr: bool,
}

impl ModifierState {
    /// Encode as key code flag bits.
    pub fn flags(&self) -> u32 {
        let mut flags = 0;
        if self.control {
            flags |= MASK_CONTROL;
        }
        if self.shift {
            flags |= MASK_SHIFT;
        }
        if self.alt {
            flags |= MASK_ALT;
        }
        if self.altgr {
            flags |= MASK_ALTGR;
        }
        flags
    }

    /// Decode from key code flag bits. Bits outside the modifier masks are ignored.
    pub fn from_flags(flags: u32) -> Self {
        Self {
            control: flags & MASK_CONTROL != 0,
            shift: flags & MASK_SHIFT != 0,
            alt: flags & MASK_ALT != 0,
            altgr: flags & MASK_ALTGR != 0,
        }
    }

    /// No modifier held.
    pub fn is_empty(&self) -> bool {
        !(self.control || self.shift || self.alt || self.altgr)
    }
}

/// Sample all modifiers from the live key state.
pub fn compose_modifiers<S: KeyStateSource + ?Sized>(source: &S) -> ModifierState {
    let pressed = |key| source.is_pressed(key);

    ModifierState {
        control: pressed(vk::LCONTROL) || pressed(vk::RCONTROL),
        shift: pressed(vk::LSHIFT) || pressed(vk::RSHIFT),
        // LMENU/RMENU are the left and right Alt keys
        alt: pressed(vk::LMENU) || pressed(vk::RMENU),
        altgr: is_altgr_combo(source),
    }
}

/// Right Alt held together with left Control.
///
/// Layouts with an AltGr key synthesize it as LControl+RMenu, so this is the
/// only way to tell AltGr apart from a real Ctrl+Alt chord at hook level.
pub fn is_altgr_combo<S: KeyStateSource + ?Sized>(source: &S) -> bool {
    source.is_pressed(vk::RMENU) && source.is_pressed(vk::LCONTROL)
}
