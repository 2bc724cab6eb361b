//! Event types for the keyboard interceptor.

use crate::keycode::KeyCode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// `WM_KEYDOWN`
pub const WM_KEYDOWN: u32 = 0x0100;
/// `WM_KEYUP`
pub const WM_KEYUP: u32 = 0x0101;
/// `WM_SYSKEYDOWN`, sent instead of `WM_KEYDOWN` while Alt is held.
pub const WM_SYSKEYDOWN: u32 = 0x0104;
/// `WM_SYSKEYUP`
pub const WM_SYSKEYUP: u32 = 0x0105;

/// Extended key (right-hand modifiers, arrow block, numpad Enter).
pub const LLKHF_EXTENDED: u32 = 0x01;
/// Injected from a lower integrity level process.
pub const LLKHF_LOWER_IL_INJECTED: u32 = 0x02;
/// Synthesized by `SendInput` or similar.
pub const LLKHF_INJECTED: u32 = 0x10;
/// Alt was down when the event was generated.
pub const LLKHF_ALTDOWN: u32 = 0x20;
/// Transition state: set for key releases.
pub const LLKHF_UP: u32 = 0x80;

/// Classification of a low-level keyboard message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
    /// Key down while Alt is held (or F10).
    SysKeyDown,
    /// Key up while Alt is held.
    SysKeyUp,
    /// Any other message code.
    Other(u32),
}

impl KeyEventKind {
    /// Classify a hook message identifier.
    pub fn from_message(message: u32) -> Self {
        match message {
            WM_KEYDOWN => KeyEventKind::KeyDown,
            WM_KEYUP => KeyEventKind::KeyUp,
            WM_SYSKEYDOWN => KeyEventKind::SysKeyDown,
            WM_SYSKEYUP => KeyEventKind::SysKeyUp,
            other => KeyEventKind::Other(other),
        }
    }

    /// The message identifier this kind was classified from.
    pub fn message(self) -> u32 {
        match self {
            KeyEventKind::KeyDown => WM_KEYDOWN,
            KeyEventKind::KeyUp => WM_KEYUP,
            KeyEventKind::SysKeyDown => WM_SYSKEYDOWN,
            KeyEventKind::SysKeyUp => WM_SYSKEYUP,
            KeyEventKind::Other(message) => message,
        }
    }

    /// Key down, including the system variant.
    pub fn is_down(self) -> bool {
        matches!(self, KeyEventKind::KeyDown | KeyEventKind::SysKeyDown)
    }

    /// Key up, including the system variant.
    pub fn is_up(self) -> bool {
        matches!(self, KeyEventKind::KeyUp | KeyEventKind::SysKeyUp)
    }
}

/// A raw low-level keyboard event, as delivered to the hook callback.
///
/// Only valid for the duration of a single callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RawKeyEvent {
    /// Virtual-key code.
    pub vk_code: u32,
    /// Hardware scan code.
    pub scan_code: u32,
    /// `LLKHF_*` flags.
    pub flags: u32,
    /// Milliseconds since system start.
    pub time: u32,
    /// Extra information tag attached by the event source.
    pub extra_info: usize,
    /// Message classification.
    pub kind: KeyEventKind,
}

impl RawKeyEvent {
    /// Convenience constructor for a plain key event.
    pub fn new(kind: KeyEventKind, vk_code: u32, scan_code: u32) -> Self {
        Self {
            vk_code,
            scan_code,
            flags: if kind.is_up() { LLKHF_UP } else { 0 },
            time: 0,
            extra_info: 0,
            kind,
        }
    }

    pub fn with_time(mut self, time: u32) -> Self {
        self.time = time;
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_extended(&self) -> bool {
        self.flags & LLKHF_EXTENDED != 0
    }

    /// Synthesized rather than typed on a physical keyboard.
    pub fn is_injected(&self) -> bool {
        self.flags & (LLKHF_INJECTED | LLKHF_LOWER_IL_INJECTED) != 0
    }

    pub fn is_alt_down(&self) -> bool {
        self.flags & LLKHF_ALTDOWN != 0
    }
}

/// Key down/up notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeyEvent {
    /// Virtual key combined with the modifiers held at the time.
    pub key_code: KeyCode,
    /// Milliseconds since system start, copied from the raw event.
    pub time: u32,
}

/// Any of the three notifications, for consumers reading a single stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InterceptorEvent {
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    /// A character as the user would see it typed.
    KeyPress(char),
}

impl InterceptorEvent {
    /// Key code for down/up notifications.
    pub fn key_code(&self) -> Option<KeyCode> {
        match self {
            InterceptorEvent::KeyDown(event) | InterceptorEvent::KeyUp(event) => {
                Some(event.key_code)
            }
            InterceptorEvent::KeyPress(_) => None,
        }
    }

    /// Character for key press notifications.
    pub fn char(&self) -> Option<char> {
        match self {
            InterceptorEvent::KeyPress(ch) => Some(*ch),
            _ => None,
        }
    }
}
