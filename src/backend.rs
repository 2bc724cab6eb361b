//! Interfaces to the operating system collaborators.
//!
//! The interceptor never calls the OS directly. Everything it needs from the
//! platform (key state, keyboard layout, Unicode translation and hook
//! registration) goes through the traits in this module, so the processing
//! pipeline can be driven by fakes in tests.

use crate::error::{Error, Result};
use crate::event::RawKeyEvent;
use std::fmt;
use std::sync::Arc;

/// Value of a key state entry when the key is held down.
pub const KEY_PRESSED: u8 = 0x80;
/// Low bit of a key state entry: the key is toggled (Caps Lock and friends).
pub const KEY_TOGGLED: u8 = 0x01;

/// Pressed/toggled state of all 256 virtual keys.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyboardState(pub [u8; 256]);

impl KeyboardState {
    /// All keys up and untoggled.
    pub const fn empty() -> Self {
        Self([0; 256])
    }

    /// Mark a key as held down.
    pub fn press(&mut self, vk: u8) {
        self.0[vk as usize] = KEY_PRESSED;
    }

    /// Update the pressed bit, keeping the toggle bit.
    pub fn set_pressed(&mut self, vk: u8, pressed: bool) {
        self.set_bit(vk, KEY_PRESSED, pressed);
    }

    /// Update the toggle bit, keeping the pressed bit.
    pub fn set_toggled(&mut self, vk: u8, toggled: bool) {
        self.set_bit(vk, KEY_TOGGLED, toggled);
    }

    fn set_bit(&mut self, vk: u8, bit: u8, on: bool) {
        let entry = &mut self.0[vk as usize];
        if on {
            *entry |= bit;
        } else {
            *entry &= !bit;
        }
    }

    pub fn is_down(&self, vk: u8) -> bool {
        self.0[vk as usize] & KEY_PRESSED != 0
    }

    pub fn is_toggled(&self, vk: u8) -> bool {
        self.0[vk as usize] & KEY_TOGGLED != 0
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for KeyboardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let down: Vec<String> = (0..=255u8)
            .filter(|&vk| self.is_down(vk))
            .map(|vk| format!("0x{:02X}", vk))
            .collect();
        f.debug_struct("KeyboardState").field("down", &down).finish()
    }
}

/// Opaque keyboard layout handle (an `HKL` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayoutHandle(pub isize);

impl LayoutHandle {
    /// No layout could be determined.
    pub const NONE: LayoutHandle = LayoutHandle(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Output of a single call to the Unicode translation primitive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTranslation {
    /// Positive: characters written. Zero: nothing to translate.
    /// Negative: the key is a dead key and the primitive buffered it.
    pub count: i32,
    /// Produced text; empty unless `count` is positive.
    pub text: String,
}

impl RawTranslation {
    pub fn new(count: i32, text: impl Into<String>) -> Self {
        Self {
            count,
            text: text.into(),
        }
    }

    pub fn is_dead_key(&self) -> bool {
        self.count < 0
    }
}

/// Instantaneous key state queries.
pub trait KeyStateSource: Send + Sync {
    /// Whether the key is physically held at this moment.
    fn is_pressed(&self, vk: u8) -> bool;

    /// Snapshot the full 256-entry keyboard state.
    ///
    /// A failed query is reported as an error, never as "all keys up".
    fn keyboard_state(&self) -> Result<KeyboardState>;
}

/// Keyboard layout and translation primitives on top of the key state.
pub trait Keyboard: KeyStateSource {
    /// Layout of the thread owning the foreground window, or
    /// [`LayoutHandle::NONE`] when there is no foreground window.
    fn foreground_layout(&self) -> LayoutHandle;

    /// Translate a key into Unicode using the given state and layout.
    ///
    /// Stateful: a dead key is buffered by the primitive and combined with
    /// the next translated key.
    fn to_unicode(
        &self,
        vk: u32,
        scan_code: u32,
        state: &KeyboardState,
        layout: LayoutHandle,
    ) -> RawTranslation;

    /// Hardware scan code for a virtual key.
    fn scan_code(&self, vk: u32) -> u32;
}

impl<T: KeyStateSource + ?Sized> KeyStateSource for Arc<T> {
    fn is_pressed(&self, vk: u8) -> bool {
        (**self).is_pressed(vk)
    }

    fn keyboard_state(&self) -> Result<KeyboardState> {
        (**self).keyboard_state()
    }
}

impl<T: Keyboard + ?Sized> Keyboard for Arc<T> {
    fn foreground_layout(&self) -> LayoutHandle {
        (**self).foreground_layout()
    }

    fn to_unicode(
        &self,
        vk: u32,
        scan_code: u32,
        state: &KeyboardState,
        layout: LayoutHandle,
    ) -> RawTranslation {
        (**self).to_unicode(vk, scan_code, state, layout)
    }

    fn scan_code(&self, vk: u32) -> u32 {
        (**self).scan_code(vk)
    }
}

/// Callback invoked by a hook backend for every keyboard event.
///
/// `next` forwards the event to the next hook in the chain and must be
/// called exactly once. Implementations must return promptly: the OS
/// silently removes hooks that take too long.
pub trait HookProc: Send + Sync {
    fn call(&self, code: i32, event: &RawKeyEvent, next: &mut dyn FnMut() -> isize) -> isize;
}

/// Installs and removes the system-wide keyboard hook.
pub trait HookBackend: Send + Sync {
    /// Registration handle, owned by exactly one capture session.
    type Handle: Send;

    /// Install the hook. Events are delivered to `proc` until [`uninstall`].
    ///
    /// [`uninstall`]: HookBackend::uninstall
    fn install(&self, proc: Arc<dyn HookProc>) -> Result<Self::Handle>;

    /// Remove a previously installed hook.
    ///
    /// When removal fails while the hook is still installed, the error hands
    /// the handle back so the owner can keep it and retry.
    fn uninstall(
        &self,
        handle: Self::Handle,
    ) -> std::result::Result<(), UninstallError<Self::Handle>>;
}

/// Failure to remove a hook.
#[derive(Debug)]
pub struct UninstallError<T> {
    pub error: Error,
    /// The handle of a hook that is still installed. `None` once the
    /// registration is gone anyway.
    pub handle: Option<T>,
}

impl<T> UninstallError<T> {
    /// The hook is still installed.
    pub fn installed(error: Error, handle: T) -> Self {
        Self {
            error,
            handle: Some(handle),
        }
    }

    /// The hook is gone despite the error.
    pub fn removed(error: Error) -> Self {
        Self {
            error,
            handle: None,
        }
    }
}

impl<T> From<Error> for UninstallError<T> {
    fn from(error: Error) -> Self {
        Self::removed(error)
    }
}
